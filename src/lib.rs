//! A streaming VT/ANSI escape-sequence parser core for terminal emulators.
//!
//! `vtparse` turns a byte stream into calls against a [`Screen`] — draw
//! runs, cursor motion, SGR attribute changes, mode toggles, OSC/DCS/APC
//! payloads — the same split `rio-backend`'s `Processor`/`Performer` pair
//! uses, except the byte buffer, UTF-8 decoding, and CSI/SGR sub-parsing
//! that `rio-backend` leans on `vte` for are implemented directly in this
//! crate (see [`parser`] for the outer state machine).
//!
//! The entry point is [`ParserCore`]: feed it bytes through
//! [`ParserCore::acquire_write_buffer`], then drive it with
//! [`ParserCore::parse`] against any [`Screen`] implementation. Malformed
//! input is never a `Result` — every recognised failure mode flows through
//! a [`Reporter`] (see [`report`]) so a caller can log it, collect it, or
//! ignore it without the parser ever bailing out of a session.
//!
//! ```
//! use std::time::Instant;
//! use vtparse::{NullScreen, ParserCore};
//!
//! let mut parser = ParserCore::new(0);
//! let mut screen = NullScreen;
//!
//! if let Some(mut write) = parser.acquire_write_buffer() {
//!     let src = b"hello \x1b[1mworld\x1b[0m";
//!     write.bytes()[..src.len()].copy_from_slice(src);
//!     write.commit(src.len());
//! }
//! let report = parser.parse(&mut screen, Instant::now(), true);
//! assert!(report.bytes_processed > 0);
//! ```

mod buffer;
mod config;
mod csi;
mod dispatch;
mod esc_search;
mod parser;
mod pending;
mod report;
mod screen;
mod sgr;
mod strescape;
mod utf8;

pub use buffer::WriteGuard;
pub use config::{
    ParserConfig, BUF_EXTRA, BUF_SZ, DEFAULT_INPUT_DELAY, DEFAULT_MAX_CSI_DIGITS,
    DEFAULT_MAX_CSI_PARAMETERS, DEFAULT_MAX_ESCAPE_CODE_LENGTH, DEFAULT_PENDING_WAIT_TIME,
};
pub use parser::{ParseReport, ParserCore};
pub use report::{NullReporter, ParseError, Reporter, Severity, TracingReporter};
pub use screen::{NullScreen, Payload, PendingToken, Region, Screen};
pub use sgr::{parse_sgr, SgrGroup};

#[cfg(any(test, feature = "test-util"))]
pub use report::VecReporter;

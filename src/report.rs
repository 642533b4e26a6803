//! The single diagnostic sink every malformed-input condition flows through.
//!
//! Malformed *input* is never a `Result` in this crate — it is data the
//! parser must survive, not an exceptional condition a caller can handle
//! differently. Instead every recognised failure mode is reported through a
//! [`Reporter`], matching how `rio-backend`'s performer logs unhandled
//! escapes with `tracing` rather than bubbling an error up through `Perform`.

use core::fmt;

/// One malformed-input condition, with just enough context to format a
/// one-line diagnostic without allocating unless the sink actually uses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError<'a> {
    /// A byte could not be interpreted as part of a valid UTF-8 sequence.
    InvalidUtf8 { byte: u8 },
    /// A CSI body grew past `max_escape_code_length`; the sequence was
    /// truncated and aborted.
    CsiTooLong { max: usize },
    /// More than `max_csi_parameters` parameters were supplied.
    TooManyCsiParameters { max: usize },
    /// A single parameter accumulated more than `max_csi_digits` digits.
    CsiDigitOverflow { max: usize },
    /// A byte was illegal for the current CSI sub-state (for example a
    /// second `-` within one parameter slot).
    InvalidCsiByte { byte: u8 },
    /// A syntactically valid CSI sequence had no registered handler for its
    /// prefix/secondary/trailer combination.
    UnknownCsiFinal {
        prefix: u8,
        secondary: u8,
        trailer: u8,
    },
    /// An SGR/DECCARA color sub-run used a format type other than `2` or `5`.
    InvalidSgrColorType { kind: u16 },
    /// An OSC/DCS/APC/PM/SOS payload exceeded `max_escape_code_length` and
    /// was discarded (OSC 52 is streamed instead of discarded; see
    /// [`crate::strescape`]).
    EscapeCodeTooLong { kind: &'static str, len: usize },
    /// An OSC code with no registered handler.
    UnknownOscCode { code: Option<u32> },
    /// A *recognised* but deliberately ignored vendor OSC code (the
    /// empirically-enumerated list in the OSC dispatch table). Distinct from
    /// [`Self::UnknownOscCode`]: the source material conflates "unknown"
    /// with "ignored known", and this crate preserves that ignore-and-report
    /// behaviour exactly rather than silently dropping it.
    IgnoredOscCode { code: u32 },
    /// A DCS, APC, PM, or SOS payload with no registered handler. Carries
    /// up to the first 64 bytes of the payload, per the "log the first 64
    /// bytes" policy in the error-handling design.
    UnknownStringCode { kind: &'static str, payload: &'a [u8] },
    /// `CSI ? 2026 l` / `DCS = 2 s` arrived while pending mode was not
    /// active.
    PendingStopWithoutStart,
}

impl fmt::Display for ParseError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ParseError::InvalidUtf8 { byte } => {
                write!(f, "invalid UTF-8 byte 0x{byte:02x}, emitting U+FFFD")
            }
            ParseError::CsiTooLong { max } => {
                write!(f, "CSI sequence exceeded {max} bytes, truncated")
            }
            ParseError::TooManyCsiParameters { max } => {
                write!(f, "CSI sequence exceeded {max} parameters, aborted")
            }
            ParseError::CsiDigitOverflow { max } => {
                write!(f, "CSI parameter exceeded {max} digits, aborted")
            }
            ParseError::InvalidCsiByte { byte } => {
                write!(f, "invalid byte 0x{byte:02x} in CSI sequence, aborted")
            }
            ParseError::UnknownCsiFinal {
                prefix,
                secondary,
                trailer,
            } => write!(
                f,
                "unrecognised CSI final (prefix={prefix:?}, secondary={secondary:?}, trailer={:?})",
                trailer as char
            ),
            ParseError::InvalidSgrColorType { kind } => {
                write!(f, "unknown SGR color sub-type {kind}, SGR aborted")
            }
            ParseError::EscapeCodeTooLong { kind, len } => {
                write!(f, "{kind} payload of {len} bytes exceeded cap, discarded")
            }
            ParseError::UnknownOscCode { code } => match code {
                Some(code) => write!(f, "unknown OSC code {code}"),
                None => write!(f, "unparsable OSC code"),
            },
            ParseError::IgnoredOscCode { code } => {
                write!(f, "ignored vendor OSC code {code}")
            }
            ParseError::UnknownStringCode { kind, payload } => {
                let shown = &payload[..payload.len().min(64)];
                write!(f, "unknown {kind} payload: {shown:?}")
            }
            ParseError::PendingStopWithoutStart => {
                write!(f, "pending-mode stop sentinel seen without a start")
            }
        }
    }
}

/// Severity bucket a [`ParseError`] is reported at, used by
/// [`TracingReporter`] to pick a `tracing` level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Trace,
    Debug,
    Warn,
}

impl ParseError<'_> {
    /// Matches the severities called out in the error-handling design:
    /// malformed UTF-8 and unknown vendor codes are routine noise, CSI
    /// overflow/invalid bytes are worth a closer look, and anything that
    /// could confuse a user-visible session is a warning.
    pub fn severity(&self) -> Severity {
        match self {
            ParseError::InvalidUtf8 { .. }
            | ParseError::UnknownOscCode { .. }
            | ParseError::IgnoredOscCode { .. } => Severity::Trace,
            ParseError::CsiTooLong { .. }
            | ParseError::TooManyCsiParameters { .. }
            | ParseError::CsiDigitOverflow { .. }
            | ParseError::InvalidCsiByte { .. }
            | ParseError::UnknownCsiFinal { .. }
            | ParseError::InvalidSgrColorType { .. }
            | ParseError::UnknownStringCode { .. } => Severity::Debug,
            ParseError::EscapeCodeTooLong { .. } | ParseError::PendingStopWithoutStart => {
                Severity::Warn
            }
        }
    }
}

/// The single sink every [`ParseError`] is delivered through. Implementations
/// choose what to do with it: log it, collect it for a test assertion, or
/// ignore it.
pub trait Reporter {
    fn report(&mut self, error: ParseError<'_>);
}

/// Default [`Reporter`]: formats each error and emits it through `tracing`,
/// matching the rest of this workspace's logging idiom
/// (`rio-backend`'s performer reaches for `tracing::{debug, warn}` rather
/// than `log` or `eprintln!`).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&mut self, error: ParseError<'_>) {
        match error.severity() {
            Severity::Trace => tracing::trace!("{error}"),
            Severity::Debug => tracing::debug!("{error}"),
            Severity::Warn => tracing::warn!("{error}"),
        }
    }
}

/// A no-op sink, for callers who would rather pay nothing for diagnostics.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&mut self, _error: ParseError<'_>) {}
}

/// Test double that records a formatted line per error, for asserting exact
/// error sequences (see the invariants in the crate's test suite).
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct VecReporter {
    pub messages: Vec<String>,
}

#[cfg(any(test, feature = "test-util"))]
impl Reporter for VecReporter {
    fn report(&mut self, error: ParseError<'_>) {
        self.messages.push(error.to_string());
    }
}

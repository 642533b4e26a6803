//! OSC/DCS/APC/PM/SOS payload accumulation, up to the String Terminator.
//!
//! Grounded in `rio-backend`'s `XtgettcapState` (`performer/handler.rs`),
//! which already buffers a string-escape payload (hex-encoded capability
//! names) across repeated `put` calls until a terminating `unhook`, and in
//! `copa`'s `osc_raw: Vec<u8>` accumulator in this crate's own pre-rewrite
//! history. This module generalises both into the scan-based accumulator
//! §4.6 describes: rather than being fed one byte at a time, it is handed the
//! entire currently-readable tail of [`crate::buffer::ByteBuffer`] and uses
//! [`crate::esc_search::find_st`] to jump straight to the terminator, only
//! falling back to per-byte buffering for the bytes that turn out to be
//! payload.

use crate::config::ParserConfig;
use crate::esc_search;

/// Result of one [`StringEscAccumulator::accumulate`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringOutcome {
    /// No terminator yet in this chunk; `consumed` bytes were buffered (or
    /// held back, for a trailing lone `ESC` that might start the
    /// terminator).
    Pending { consumed: usize },
    /// The String Terminator was found. `consumed` includes the terminator
    /// itself; the payload is available via [`StringEscAccumulator::payload`]
    /// until the next [`StringEscAccumulator::start`].
    Complete { consumed: usize, bell_terminated: bool },
    /// An OSC 52 payload exceeded `max_escape_code_length`. The accumulator
    /// has already rewound itself to the synthetic `"52;;"` continuation
    /// prefix (§4.6's exception); the caller should dispatch
    /// [`StringEscAccumulator::payload`] (taken *before* this call mutated
    /// it — callers must read it from the returned outcome's perspective,
    /// i.e. immediately after receiving this variant and before accumulating
    /// further) with `is_partial = true`.
    PartialOsc52 { consumed: usize, partial_payload: Vec<u8> },
    /// A non-OSC-52 payload exceeded the cap; discarded entirely.
    TooLong { consumed: usize, len: usize },
}

/// Accumulates one OSC/DCS/APC/PM/SOS payload. One instance lives inside
/// `ParserCore` and is reused across escapes via [`Self::start`].
#[derive(Debug, Default)]
pub struct StringEscAccumulator {
    buf: Vec<u8>,
}

impl StringEscAccumulator {
    pub fn new() -> Self {
        StringEscAccumulator { buf: Vec::new() }
    }

    /// Begin accumulating a new payload (called on `ESC ]`/`ESC P`/`ESC
    /// _`/`ESC ^`/`ESC X`).
    pub fn start(&mut self) {
        self.buf.clear();
    }

    /// The bytes accumulated so far for the in-progress (or just-completed)
    /// payload.
    pub fn payload(&self) -> &[u8] {
        &self.buf
    }

    fn is_osc_52(&self) -> bool {
        self.buf.starts_with(b"52;") || self.buf == b"52"
    }

    /// Feed the currently-readable tail of the buffer. `is_osc` tells the
    /// accumulator whether the OSC-52 streaming exception can apply at all
    /// (DCS/APC/PM/SOS payloads are always discarded on overflow).
    pub fn accumulate(&mut self, bytes: &[u8], cfg: &ParserConfig, is_osc: bool) -> StringOutcome {
        if let Some((start, term_len)) = esc_search::find_st(bytes) {
            self.buf.extend_from_slice(&bytes[..start]);
            return StringOutcome::Complete {
                consumed: start + term_len,
                bell_terminated: term_len == 1,
            };
        }

        // A trailing lone ESC might be the start of `ESC \`; hold it back so
        // the next call can resolve it together with the following byte.
        let trailing_lone_esc = bytes.last() == Some(&0x1B);
        let take = if trailing_lone_esc {
            bytes.len().saturating_sub(1)
        } else {
            bytes.len()
        };
        self.buf.extend_from_slice(&bytes[..take]);

        if self.buf.len() > cfg.max_escape_code_length() {
            if is_osc && self.is_osc_52() {
                let partial_payload = core::mem::take(&mut self.buf);
                self.buf.extend_from_slice(b"52;;");
                return StringOutcome::PartialOsc52 {
                    consumed: take,
                    partial_payload,
                };
            }
            let len = self.buf.len();
            self.buf.clear();
            return StringOutcome::TooLong { consumed: take, len };
        }

        StringOutcome::Pending { consumed: take }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bell_terminated_payload_completes() {
        let cfg = ParserConfig::new();
        let mut acc = StringEscAccumulator::new();
        acc.start();
        let outcome = acc.accumulate(b"2;title\x07trailing", &cfg, true);
        assert_eq!(
            outcome,
            StringOutcome::Complete { consumed: 9, bell_terminated: true }
        );
        assert_eq!(acc.payload(), b"2;title");
    }

    #[test]
    fn st_terminated_payload_completes() {
        let cfg = ParserConfig::new();
        let mut acc = StringEscAccumulator::new();
        acc.start();
        let outcome = acc.accumulate(b"2;x\x1b\\", &cfg, true);
        assert_eq!(
            outcome,
            StringOutcome::Complete { consumed: 5, bell_terminated: false }
        );
        assert_eq!(acc.payload(), b"2;x");
    }

    #[test]
    fn split_across_two_calls_still_completes() {
        let cfg = ParserConfig::new();
        let mut acc = StringEscAccumulator::new();
        acc.start();
        let first = acc.accumulate(b"2;hello", &cfg, true);
        assert_eq!(first, StringOutcome::Pending { consumed: 7 });
        let second = acc.accumulate(b" world\x07", &cfg, true);
        assert_eq!(
            second,
            StringOutcome::Complete { consumed: 7, bell_terminated: true }
        );
        assert_eq!(acc.payload(), b"2;hello world");
    }

    #[test]
    fn trailing_lone_escape_is_held_back() {
        let cfg = ParserConfig::new();
        let mut acc = StringEscAccumulator::new();
        acc.start();
        let outcome = acc.accumulate(b"2;abc\x1b", &cfg, true);
        assert_eq!(outcome, StringOutcome::Pending { consumed: 5 });
        assert_eq!(acc.payload(), b"2;abc");
    }

    #[test]
    fn non_osc52_overflow_is_discarded() {
        let cfg = ParserConfig::new().with_max_escape_code_length(8);
        let mut acc = StringEscAccumulator::new();
        acc.start();
        let outcome = acc.accumulate(b"2;0123456789", &cfg, true);
        match outcome {
            StringOutcome::TooLong { len, .. } => assert!(len > 8),
            other => panic!("expected TooLong, got {other:?}"),
        }
        assert!(acc.payload().is_empty());
    }

    #[test]
    fn osc52_overflow_streams_a_partial_and_continues() {
        let cfg = ParserConfig::new().with_max_escape_code_length(8);
        let mut acc = StringEscAccumulator::new();
        acc.start();
        let outcome = acc.accumulate(b"52;c;0123456789", &cfg, true);
        match outcome {
            StringOutcome::PartialOsc52 { partial_payload, .. } => {
                assert_eq!(partial_payload, b"52;c;0123456789");
            }
            other => panic!("expected PartialOsc52, got {other:?}"),
        }
        // Accumulator rewound to the synthetic continuation prefix.
        assert_eq!(acc.payload(), b"52;;");
    }

    #[test]
    fn dcs_overflow_never_streams_even_if_it_looks_like_osc52() {
        let cfg = ParserConfig::new().with_max_escape_code_length(8);
        let mut acc = StringEscAccumulator::new();
        acc.start();
        let outcome = acc.accumulate(b"52;c;0123456789", &cfg, false);
        assert!(matches!(outcome, StringOutcome::TooLong { .. }));
    }
}

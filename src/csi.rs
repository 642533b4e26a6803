//! CSI parameter accumulation.
//!
//! `copa`'s existing state machine (kept in this crate's history as the
//! direct ancestor of [`crate::parser::ParserCore`]) already threads CSI
//! bytes through explicit `match` arms per byte class rather than a
//! macro-generated jump table, for the outer ESC/CSI/OSC state machine.
//! This module applies the same match-per-byte-class style one level deeper, to the CSI
//! parameter body itself, and additionally tracks which parameters are
//! sub-parameters (joined with `:`) so [`crate::sgr`] does not need to
//! re-scan the raw bytes.

use crate::config::ParserConfig;

/// A fully- or partially-accumulated CSI sequence.
#[derive(Debug, Clone, Default)]
pub struct ParsedCsi {
    /// `0` or one of `? > < =`; only legal as the first byte of the body.
    pub prefix: u8,
    /// `0` or the last intermediate byte (`0x20..=0x2F`) collected.
    pub secondary: u8,
    /// The final trailer byte, once known.
    pub trailer: u8,
    /// Parameter values, in order.
    pub params: Vec<i32>,
    /// Parallel bit: `sub_param[i]` is true when `params[i]` was joined to
    /// `params[i - 1]` with `:` rather than `;`.
    pub sub_param: Vec<bool>,
    /// Whether this sequence reached a trailer without being aborted.
    pub is_valid: bool,
}

impl ParsedCsi {
    fn clear(&mut self) {
        self.prefix = 0;
        self.secondary = 0;
        self.trailer = 0;
        self.params.clear();
        self.sub_param.clear();
        self.is_valid = false;
    }

    /// Parameter `index`, or `default` if absent or explicitly zero — the
    /// convention every CSI trailer in §4.7 uses ("allow a default value
    /// when no parameter is given").
    pub fn param_or(&self, index: usize, default: i32) -> i32 {
        match self.params.get(index) {
            Some(&0) | None => default,
            Some(&v) => v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Body,
    PostSecondary,
}

/// Why a CSI sequence was aborted mid-parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsiAbort {
    TooManyParameters,
    DigitOverflow,
    TooLong,
    InvalidByte(u8),
}

/// The result of feeding one byte to a [`CsiAccumulator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsiStep {
    /// Byte consumed, sequence still in progress.
    Continue,
    /// A control byte embedded inside the CSI body should be executed
    /// inline without leaving the CSI state.
    Execute(u8),
    /// The trailer byte arrived; read the result from
    /// [`CsiAccumulator::csi`].
    Finished,
    /// The sequence was aborted; bytes up to and including the eventual
    /// trailer are still consumed (to resynchronise) but nothing should be
    /// dispatched.
    Aborted(CsiAbort),
}

fn is_inline_control(byte: u8) -> bool {
    matches!(byte, 0x07 | 0x08 | 0x09 | 0x0A | 0x0B | 0x0C | 0x0D | 0x0E | 0x0F)
}

fn is_trailer(byte: u8) -> bool {
    matches!(byte, b'@' | b'`' | b'{' | b'|' | b'}' | b'~') || byte.is_ascii_alphabetic()
}

/// Parses one CSI parameter list: digits, `;`, `:`, private prefixes,
/// intermediate bytes, and the final trailer byte.
pub struct CsiAccumulator {
    state: State,
    csi: ParsedCsi,
    digit_acc: i64,
    digit_count: usize,
    negative: bool,
    has_digits: bool,
    pending_sub: bool,
    body_len: usize,
    aborted: bool,
}

impl Default for CsiAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl CsiAccumulator {
    pub fn new() -> Self {
        CsiAccumulator {
            state: State::Start,
            csi: ParsedCsi::default(),
            digit_acc: 0,
            digit_count: 0,
            negative: false,
            has_digits: false,
            pending_sub: false,
            body_len: 0,
            aborted: false,
        }
    }

    /// Begin accumulating a new CSI sequence (called on `ESC [`).
    pub fn reset(&mut self) {
        self.state = State::Start;
        self.csi.clear();
        self.digit_acc = 0;
        self.digit_count = 0;
        self.negative = false;
        self.has_digits = false;
        self.pending_sub = false;
        self.body_len = 0;
        self.aborted = false;
    }

    /// The parsed result; only meaningful after [`CsiStep::Finished`].
    pub fn csi(&self) -> &ParsedCsi {
        &self.csi
    }

    fn commit_param(&mut self, cfg: &ParserConfig) -> Result<(), CsiAbort> {
        if self.csi.params.len() >= cfg.max_csi_parameters() {
            return Err(CsiAbort::TooManyParameters);
        }
        let value = if self.has_digits {
            let signed = if self.negative {
                -self.digit_acc
            } else {
                self.digit_acc
            };
            signed.clamp(i32::MIN as i64, i32::MAX as i64) as i32
        } else {
            0
        };
        self.csi.params.push(value);
        self.csi.sub_param.push(self.pending_sub);
        self.digit_acc = 0;
        self.digit_count = 0;
        self.has_digits = false;
        self.negative = false;
        Ok(())
    }

    fn finish(&mut self, trailer: u8, cfg: &ParserConfig) -> CsiStep {
        if let Err(abort) = self.commit_param(cfg) {
            self.aborted = true;
            return CsiStep::Aborted(abort);
        }
        self.csi.trailer = trailer;
        self.csi.is_valid = !self.aborted;
        CsiStep::Finished
    }

    /// Feed one byte. `cfg` supplies the overflow policy thresholds.
    pub fn feed(&mut self, byte: u8, cfg: &ParserConfig) -> CsiStep {
        self.body_len += 1;

        if self.aborted {
            // Resynchronising: just wait for the trailer. Checked before the
            // length cap below so a body that overflowed once keeps watching
            // for a trailer/control byte instead of re-aborting on every
            // subsequent byte forever.
            if is_inline_control(byte) {
                return CsiStep::Execute(byte);
            }
            if is_trailer(byte) {
                self.csi.trailer = byte;
                self.csi.is_valid = false;
                return CsiStep::Finished;
            }
            return CsiStep::Continue;
        }

        if self.body_len > cfg.max_escape_code_length() {
            self.aborted = true;
            return CsiStep::Aborted(CsiAbort::TooLong);
        }

        if is_inline_control(byte) {
            return CsiStep::Execute(byte);
        }

        match self.state {
            State::Start => self.feed_start(byte, cfg),
            State::Body => self.feed_body(byte, cfg),
            State::PostSecondary => self.feed_post_secondary(byte),
        }
    }

    fn feed_start(&mut self, byte: u8, cfg: &ParserConfig) -> CsiStep {
        match byte {
            b'0'..=b'9' => {
                self.push_digit(byte, cfg);
                self.state = State::Body;
                self.digit_step(cfg)
            }
            b';' => {
                self.state = State::Body;
                self.commit_or_abort(cfg, false)
            }
            b':' => {
                self.state = State::Body;
                self.commit_or_abort(cfg, true)
            }
            b'?' | b'>' | b'<' | b'=' => {
                self.csi.prefix = byte;
                self.state = State::Body;
                CsiStep::Continue
            }
            b'-' => {
                self.negative = true;
                self.state = State::Body;
                CsiStep::Continue
            }
            0x20..=0x2F => {
                self.csi.secondary = byte;
                self.state = State::PostSecondary;
                CsiStep::Continue
            }
            b if is_trailer(b) => self.finish(b, cfg),
            other => {
                self.aborted = true;
                CsiStep::Aborted(CsiAbort::InvalidByte(other))
            }
        }
    }

    fn feed_body(&mut self, byte: u8, cfg: &ParserConfig) -> CsiStep {
        match byte {
            b'0'..=b'9' => {
                self.push_digit(byte, cfg);
                self.digit_step(cfg)
            }
            b'-' => {
                // Only legal as the first character of a parameter slot.
                if self.has_digits || self.negative {
                    self.aborted = true;
                    CsiStep::Aborted(CsiAbort::InvalidByte(byte))
                } else {
                    self.negative = true;
                    CsiStep::Continue
                }
            }
            b';' => self.commit_or_abort(cfg, false),
            b':' => self.commit_or_abort(cfg, true),
            0x20..=0x2F => {
                self.csi.secondary = byte;
                self.state = State::PostSecondary;
                CsiStep::Continue
            }
            b if is_trailer(b) => self.finish(b, cfg),
            other => {
                self.aborted = true;
                CsiStep::Aborted(CsiAbort::InvalidByte(other))
            }
        }
    }

    fn feed_post_secondary(&mut self, byte: u8) -> CsiStep {
        if is_trailer(byte) {
            self.csi.trailer = byte;
            self.csi.is_valid = true;
            return CsiStep::Finished;
        }
        self.aborted = true;
        CsiStep::Aborted(CsiAbort::InvalidByte(byte))
    }

    fn commit_or_abort(&mut self, cfg: &ParserConfig, next_pending_sub: bool) -> CsiStep {
        match self.commit_param(cfg) {
            Ok(()) => {
                self.pending_sub = next_pending_sub;
                CsiStep::Continue
            }
            Err(abort) => {
                self.aborted = true;
                CsiStep::Aborted(abort)
            }
        }
    }

    fn push_digit(&mut self, byte: u8, cfg: &ParserConfig) {
        self.has_digits = true;
        self.digit_count += 1;
        if self.digit_count <= cfg.max_csi_digits() {
            self.digit_acc = self.digit_acc * 10 + i64::from(byte - b'0');
        }
    }

    /// Called immediately after [`Self::push_digit`]; turns a digit count
    /// that just crossed `max_csi_digits` into an abort so the overflow is
    /// reported the instant it happens rather than waiting for the trailer.
    fn digit_step(&mut self, cfg: &ParserConfig) -> CsiStep {
        if self.digit_count > cfg.max_csi_digits() {
            self.aborted = true;
            CsiStep::Aborted(CsiAbort::DigitOverflow)
        } else {
            CsiStep::Continue
        }
    }
}

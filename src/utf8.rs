//! Streaming UTF-8 decoder that stops at the first ESC byte.
//!
//! Adapted from this workspace's own `copa` parser, which already batches
//! ground-state decoding through `simdutf8::basic::from_utf8` for the common
//! case and falls back to `simdutf8::compat::from_utf8` only when the fast
//! path rejects the slice, so the detailed error (valid-prefix length,
//! whether the tail is merely incomplete vs genuinely invalid) is only
//! computed when needed. `copa` folded this directly into its `advance`
//! loop; here it is pulled out into a standalone decoder that fills a
//! reusable burst buffer instead of calling a performer inline, so
//! `ParserCore` can decide what to do with a batch of code points (including
//! handing them to [`crate::dispatch::ground_dispatch`]) independently of
//! how the bytes were decoded.

const REPLACEMENT_CHAR: char = '\u{FFFD}';

/// A small table-driven UTF-8 decoder with a bounded output burst.
///
/// Control bytes other than ESC are *not* filtered out here — they are
/// emitted into the burst as single-byte code points, exactly as they arrive,
/// so `Screen` can tell `draw_text` runs from control dispatches by numeric
/// value the same way `copa`'s `ground_dispatch` does today.
pub struct Utf8Decoder {
    partial: [u8; 4],
    partial_len: usize,
    burst: Vec<char>,
    invalid: Vec<u8>,
}

impl Default for Utf8Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Utf8Decoder {
            partial: [0; 4],
            partial_len: 0,
            burst: Vec::with_capacity(256),
            invalid: Vec::new(),
        }
    }

    /// Clears burst and in-flight partial codepoint state. Called on parser
    /// reset and whenever the parser leaves Normal state for an escape
    /// sequence (a partial codepoint cannot span an ESC boundary).
    pub fn reset(&mut self) {
        self.partial_len = 0;
        self.burst.clear();
        self.invalid.clear();
    }

    /// The code points decoded by the most recent [`Self::decode_to_esc`]
    /// call.
    pub fn burst(&self) -> &[char] {
        &self.burst
    }

    /// The raw bytes the most recent [`Self::decode_to_esc`] call had to
    /// substitute `U+FFFD` for, in order, so the caller can report one
    /// [`crate::report::ParseError::InvalidUtf8`] per offending byte.
    pub fn invalid_bytes(&self) -> &[u8] {
        &self.invalid
    }

    /// Decode as much of `bytes` as forms complete UTF-8 (or passes through
    /// as raw control bytes), stopping at the first ESC (`0x1B`) byte or at
    /// the end of input.
    ///
    /// Returns `(bytes_consumed, sentinel_found)`. When `sentinel_found` is
    /// true, `bytes[bytes_consumed - 1] == 0x1B`. A decoder that ends the
    /// call with a dangling partial codepoint (not yet invalid, just
    /// incomplete) reports `bytes_consumed == bytes.len()` and
    /// `sentinel_found == false`; the caller must feed more bytes before the
    /// codepoint can resolve.
    pub fn decode_to_esc(&mut self, bytes: &[u8]) -> (usize, bool) {
        self.burst.clear();
        self.invalid.clear();

        if self.partial_len != 0 {
            let (consumed, resolved) = self.advance_partial(bytes);
            if !resolved {
                return (consumed, false);
            }
            let (more, sentinel) = self.decode_plain(&bytes[consumed..]);
            return (consumed + more, sentinel);
        }

        self.decode_plain(bytes)
    }

    fn decode_plain(&mut self, bytes: &[u8]) -> (usize, bool) {
        let num_bytes = bytes.len();
        let plain = memchr::memchr(0x1B, bytes).unwrap_or(num_bytes);

        if plain == 0 {
            // ESC is the very next byte; it is swallowed (not emitted) so the
            // caller can transition straight to Escape state.
            return (usize::from(num_bytes != 0), num_bytes != 0);
        }

        match simdutf8::basic::from_utf8(&bytes[..plain]) {
            Ok(parsed) => {
                self.burst.extend(parsed.chars());
                if plain < num_bytes {
                    (plain + 1, true)
                } else {
                    (plain, false)
                }
            }
            Err(_) => {
                let compat_err = simdutf8::compat::from_utf8(&bytes[..plain]).unwrap_err();
                let valid_bytes = compat_err.valid_up_to();
                // SAFETY: `valid_bytes` is the length simdutf8 itself
                // reported as validated UTF-8.
                let parsed = unsafe { core::str::from_utf8_unchecked(&bytes[..valid_bytes]) };
                self.burst.extend(parsed.chars());

                match compat_err.error_len() {
                    Some(len) => {
                        self.invalid.push(bytes[valid_bytes]);
                        self.burst.push(REPLACEMENT_CHAR);
                        (valid_bytes + len, false)
                    }
                    None if plain < num_bytes => {
                        // Cut off by ESC before the codepoint could complete.
                        self.invalid.push(bytes[valid_bytes]);
                        self.burst.push(REPLACEMENT_CHAR);
                        (plain + 1, true)
                    }
                    None => {
                        // Cut off by end of input; stash for the next call.
                        let extra = num_bytes - valid_bytes;
                        self.partial[..extra].copy_from_slice(&bytes[valid_bytes..valid_bytes + extra]);
                        self.partial_len = extra;
                        (num_bytes, false)
                    }
                }
            }
        }
    }

    /// Returns `(bytes_consumed_from_the_new_slice, codepoint_resolved)`.
    fn advance_partial(&mut self, bytes: &[u8]) -> (usize, bool) {
        let old_len = self.partial_len;
        let to_copy = bytes.len().min(self.partial.len() - old_len);
        self.partial[old_len..old_len + to_copy].copy_from_slice(&bytes[..to_copy]);
        self.partial_len += to_copy;

        match simdutf8::basic::from_utf8(&self.partial[..self.partial_len]) {
            Ok(parsed) => {
                // SAFETY: a valid, non-empty UTF-8 slice always yields a
                // first `char`.
                let c = unsafe { parsed.chars().next().unwrap_unchecked() };
                self.burst.push(c);
                let used = c.len_utf8() - old_len;
                self.partial_len = 0;
                (used, true)
            }
            Err(_) => {
                let compat_err =
                    simdutf8::compat::from_utf8(&self.partial[..self.partial_len]).unwrap_err();
                let valid_bytes = compat_err.valid_up_to();

                if valid_bytes > 0 {
                    // SAFETY: `valid_bytes` bounds validated UTF-8.
                    let c = unsafe {
                        core::str::from_utf8_unchecked(&self.partial[..valid_bytes])
                            .chars()
                            .next()
                            .unwrap_unchecked()
                    };
                    self.burst.push(c);
                    self.partial_len = 0;
                    return (valid_bytes - old_len, true);
                }

                match compat_err.error_len() {
                    Some(invalid_len) => {
                        self.invalid.push(self.partial[0]);
                        self.burst.push(REPLACEMENT_CHAR);
                        self.partial_len = 0;
                        (invalid_len - old_len, true)
                    }
                    None => (to_copy, false),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_ascii_burst() {
        let mut d = Utf8Decoder::new();
        let (consumed, sentinel) = d.decode_to_esc(b"hello");
        assert_eq!(consumed, 5);
        assert!(!sentinel);
        assert_eq!(d.burst(), &['h', 'e', 'l', 'l', 'o']);
    }

    #[test]
    fn stops_before_escape() {
        let mut d = Utf8Decoder::new();
        let input = b"ab\x1b[1m";
        let (consumed, sentinel) = d.decode_to_esc(input);
        assert_eq!(consumed, 3);
        assert!(sentinel);
        assert_eq!(d.burst(), &['a', 'b']);
    }

    #[test]
    fn multi_byte_codepoint_round_trips() {
        let mut d = Utf8Decoder::new();
        let s = "héllo wörld";
        let (consumed, _) = d.decode_to_esc(s.as_bytes());
        assert_eq!(consumed, s.len());
        let got: String = d.burst().iter().collect();
        assert_eq!(got, s);
    }

    #[test]
    fn split_codepoint_across_two_calls() {
        let mut d = Utf8Decoder::new();
        let bytes = "é".as_bytes();
        assert_eq!(bytes.len(), 2);
        let (consumed, sentinel) = d.decode_to_esc(&bytes[..1]);
        assert_eq!(consumed, 1);
        assert!(!sentinel);
        assert!(d.burst().is_empty());

        let (consumed2, _) = d.decode_to_esc(&bytes[1..]);
        assert_eq!(consumed2, 1);
        assert_eq!(d.burst(), &['é']);
    }

    #[test]
    fn invalid_byte_emits_replacement() {
        let mut d = Utf8Decoder::new();
        let (consumed, _) = d.decode_to_esc(&[0xFF, b'A']);
        assert!(consumed >= 1);
        assert_eq!(d.burst()[0], REPLACEMENT_CHAR);
        assert_eq!(d.invalid_bytes(), &[0xFF]);
    }

    #[test]
    fn invalid_byte_split_across_calls_is_still_reported() {
        let mut d = Utf8Decoder::new();
        // 0xC2 alone looks like the start of a two-byte sequence; fed with no
        // continuation byte before end of input it is stashed as partial...
        let (consumed, sentinel) = d.decode_to_esc(&[0xC2]);
        assert_eq!(consumed, 1);
        assert!(!sentinel);
        assert!(d.invalid_bytes().is_empty());

        // ...and a non-continuation byte next resolves it as invalid.
        let (_, _) = d.decode_to_esc(b"A");
        assert_eq!(d.invalid_bytes(), &[0xC2]);
    }

    #[test]
    fn control_bytes_pass_through_as_code_points() {
        let mut d = Utf8Decoder::new();
        let (_, _) = d.decode_to_esc(b"a\nb");
        assert_eq!(d.burst(), &['a', '\n', 'b']);
    }
}

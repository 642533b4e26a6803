//! Synchronized-update ("pending mode") controller.
//!
//! Grounded in `rio-backend`'s `SyncState`/`advance_sync_csi`
//! (`performer/handler.rs`): it already buffers bytes during a
//! synchronized update, scans backwards for the exact `\x1b[?2026h` /
//! `\x1b[?2026l` byte strings with `memchr::memchr_iter`, and drains on a
//! timeout (`SYNC_UPDATE_TIMEOUT`) or a size cap (`SYNC_BUFFER_SIZE`). This
//! module generalises that into a time-*and*-size-bounded scanner,
//! additionally recognising the DCS spelling (`DCS = 1 s` / `DCS = 2 s`)
//! that narrower CSI-only scan does not handle, and taking an injected
//! clock so tests can advance time deterministically instead of reading
//! `Instant::now()` directly.

use core::time::Duration;
use std::time::Instant;

use crate::config::ParserConfig;

/// Which stop sentinel a scan step is currently hunting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    Esc,
    /// Scanning a CSI body for `?2026l`.
    Csi,
    /// Scanning a DCS body for `=2s` then its terminator.
    Dcs,
    /// Scanning for the String Terminator (`ESC \` or BEL) that closes an
    /// OSC/APC/PM sequence encountered while draining. Unrelated to the stop
    /// sentinel itself; once found, scanning simply resumes from `Normal`.
    StSkip,
    /// Scanning for the String Terminator that closes the `DCS = 2 s`
    /// spelling of the stop sentinel, once `=2s` itself has already matched.
    /// Unlike `StSkip`, finding this terminator *is* the stop event.
    StDcsStop,
}

/// Outcome of feeding one input chunk to [`PendingMode::scan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStep {
    /// No stop sentinel found yet; keep scanning on the next chunk.
    StillPending,
    /// The stop sentinel was found at the given offset (exclusive end of the
    /// sentinel bytes within the scanned slice).
    Stopped { sentinel_end: usize },
}

/// Why pending mode drained, used to decide whether to rewind to the
/// pre-activation offset or resume exactly where the sentinel left off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainReason {
    StopSentinel,
    Timeout,
    BufferNearFull,
}

/// The synchronized-update controller described in §4.8: activation records
/// a start time and switches the parser into scan-only mode; `scan` advances
/// a small state machine hunting for the matching stop sequence; `should_drain`
/// applies the three drain conditions (time, sentinel, size).
pub struct PendingMode {
    activated_at: Option<Instant>,
    wait_time: Duration,
    scan_state: ScanState,
    /// Offset (relative to the start of the scan) where the in-progress
    /// CSI/DCS body began, so a false-start scan can resync.
    esc_code_start: usize,
    bytes_since_activation: usize,
}

impl PendingMode {
    pub fn new(cfg: &ParserConfig) -> Self {
        PendingMode {
            activated_at: None,
            wait_time: cfg.pending_wait_time(),
            scan_state: ScanState::Normal,
            esc_code_start: 0,
            bytes_since_activation: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.activated_at.is_some()
    }

    pub fn activated_at(&self) -> Option<Instant> {
        self.activated_at
    }

    pub fn wait_time(&self) -> Duration {
        self.wait_time
    }

    /// Enter scan mode. Called on `CSI ? 2026 h` or `DCS = 1 s ST`.
    pub fn activate(&mut self, now: Instant) {
        self.activated_at = Some(now);
        self.scan_state = ScanState::Normal;
        self.esc_code_start = 0;
        self.bytes_since_activation = 0;
    }

    /// Clear activation state after a drain. The caller is responsible for
    /// rewinding the buffer position and telling `Screen` to resume.
    pub fn deactivate(&mut self) {
        self.activated_at = None;
        self.scan_state = ScanState::Normal;
        self.bytes_since_activation = 0;
    }

    /// Feed one byte while in scan mode. Returns whether the stop sentinel
    /// completed on this byte.
    pub fn feed(&mut self, byte: u8) -> bool {
        self.bytes_since_activation += 1;
        match self.scan_state {
            ScanState::Normal => {
                if byte == 0x1B {
                    self.scan_state = ScanState::Esc;
                }
                false
            }
            ScanState::Esc => {
                match byte {
                    b'[' => {
                        self.scan_state = ScanState::Csi;
                        self.esc_code_start = 0;
                    }
                    b'P' => {
                        self.scan_state = ScanState::Dcs;
                        self.esc_code_start = 0;
                    }
                    b']' | b'_' | b'^' | b'X' => self.scan_state = ScanState::StSkip,
                    _ => self.scan_state = ScanState::Normal,
                }
                false
            }
            ScanState::Csi => self.feed_csi(byte),
            ScanState::Dcs => self.feed_dcs(byte),
            ScanState::StSkip => {
                if byte == 0x07 || byte == 0x1B {
                    // Could be the ESC of an ESC-\ terminator; `Esc` handles
                    // the ambiguity on the next byte via the same table, but
                    // here it simply ends the opaque payload either way.
                    self.scan_state = ScanState::Normal;
                }
                false
            }
            ScanState::StDcsStop => {
                if byte == 0x07 {
                    self.scan_state = ScanState::Normal;
                    return true;
                }
                if byte == 0x1B {
                    self.scan_state = ScanState::Normal;
                    return true;
                }
                false
            }
        }
    }

    fn feed_csi(&mut self, byte: u8) -> bool {
        const WANT: &[u8] = b"?2026l";
        let idx = self.esc_code_start;
        if idx < WANT.len() && byte == WANT[idx] {
            self.esc_code_start += 1;
            if self.esc_code_start == WANT.len() {
                self.scan_state = ScanState::Normal;
                return true;
            }
            return false;
        }
        // Mismatch: this CSI isn't the stop sequence. If it's a final byte,
        // the CSI ends here; otherwise keep consuming it.
        if byte.is_ascii_alphabetic() || matches!(byte, b'@'..=b'~') {
            self.scan_state = ScanState::Normal;
        }
        false
    }

    fn feed_dcs(&mut self, byte: u8) -> bool {
        const WANT: &[u8] = b"=2s";
        let idx = self.esc_code_start;
        if idx < WANT.len() && byte == WANT[idx] {
            self.esc_code_start += 1;
            if self.esc_code_start == WANT.len() {
                self.scan_state = ScanState::StDcsStop;
                self.esc_code_start = 0;
            }
            return false;
        }
        if byte == 0x1B {
            self.scan_state = ScanState::Esc;
        }
        false
    }

    /// Any of the three drain conditions from §4.8.
    pub fn should_drain(&self, now: Instant, buffered_since_activation: usize, margin: usize, capacity: usize) -> Option<DrainReason> {
        let Some(activated_at) = self.activated_at else {
            return None;
        };
        if now.duration_since(activated_at) >= self.wait_time {
            return Some(DrainReason::Timeout);
        }
        if buffered_since_activation + margin >= capacity {
            return Some(DrainReason::BufferNearFull);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_enters_scan_mode() {
        let cfg = ParserConfig::new();
        let mut pending = PendingMode::new(&cfg);
        assert!(!pending.is_active());
        pending.activate(Instant::now());
        assert!(pending.is_active());
    }

    #[test]
    fn csi_stop_sentinel_is_detected() {
        let cfg = ParserConfig::new();
        let mut pending = PendingMode::new(&cfg);
        pending.activate(Instant::now());
        let mut stopped = false;
        for &b in b"garbage\x1b[?2026l" {
            if pending.feed(b) {
                stopped = true;
            }
        }
        assert!(stopped);
    }

    #[test]
    fn dcs_stop_sentinel_requires_st_after_2s() {
        let cfg = ParserConfig::new();
        let mut pending = PendingMode::new(&cfg);
        pending.activate(Instant::now());
        let mut stopped = false;
        for &b in b"X\x1bP=2s" {
            if pending.feed(b) {
                stopped = true;
            }
        }
        assert!(!stopped, "stop sentinel is only complete once the closing ST arrives");
        assert_eq!(pending.scan_state, ScanState::StDcsStop);

        assert!(pending.feed(0x1B), "ESC half of the closing ST must signal stop");
    }

    #[test]
    fn embedded_osc_during_scan_does_not_signal_stop() {
        let cfg = ParserConfig::new();
        let mut pending = PendingMode::new(&cfg);
        pending.activate(Instant::now());
        let mut stopped = false;
        for &b in b"\x1b]0;title\x07" {
            if pending.feed(b) {
                stopped = true;
            }
        }
        assert!(!stopped, "an embedded OSC's own terminator is not the pending stop sentinel");
        assert_eq!(pending.scan_state, ScanState::Normal);
    }

    #[test]
    fn timeout_drain_condition_fires_after_wait_time() {
        let cfg = ParserConfig::new().with_pending_wait_time(Duration::from_millis(0));
        let mut pending = PendingMode::new(&cfg);
        let now = Instant::now();
        pending.activate(now);
        let later = now + Duration::from_millis(1);
        assert_eq!(
            pending.should_drain(later, 0, 4096, 1024 * 1024),
            Some(DrainReason::Timeout)
        );
    }

    #[test]
    fn size_drain_condition_fires_when_near_capacity() {
        let cfg = ParserConfig::new().with_pending_wait_time(Duration::from_secs(60));
        let mut pending = PendingMode::new(&cfg);
        let now = Instant::now();
        pending.activate(now);
        assert_eq!(
            pending.should_drain(now, 1_000_000, 4096, 1_000_000),
            Some(DrainReason::BufferNearFull)
        );
    }

    #[test]
    fn inactive_controller_never_reports_drain() {
        let cfg = ParserConfig::new();
        let pending = PendingMode::new(&cfg);
        assert_eq!(
            pending.should_drain(Instant::now(), 0, 0, 0),
            None
        );
    }
}

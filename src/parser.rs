//! `ParserCore`: the top-level state machine tying the byte buffer, UTF-8
//! decoder, CSI/string accumulators, dispatch table, and pending-mode
//! controller into one streaming parser.
//!
//! Grounded in `rio-backend`'s `Processor::advance` (`performer/mod.rs`),
//! which already drives a single outer ESC/CSI/OSC state machine over a byte
//! slice and forwards decoded runs to a `vte`-style performer. This module
//! keeps that outer shape — one `match` over a small state enum, each arm
//! consuming as much of the remaining slice as it can in one step — but
//! replaces `vte::Parser`'s macro-generated table with the explicit
//! accumulators this crate already built (`CsiAccumulator`,
//! `StringEscAccumulator`, `Utf8Decoder`), and adds the producer/consumer
//! buffer and the pending-mode scan for synchronized updates, which
//! `Processor::advance` (single-threaded, no synchronized-update support)
//! has no equivalent of.

use std::time::{Duration, Instant};

use crate::buffer::{ByteBuffer, WriteGuard};
use crate::config::{ParserConfig, BUF_SZ};
use crate::csi::{CsiAbort, CsiAccumulator, CsiStep};
use crate::dispatch::{
    dispatch_apc, dispatch_control_byte, dispatch_csi, dispatch_dcs, dispatch_esc, dispatch_osc,
    dispatch_pm_or_sos, ground_dispatch, payload_after_code, CsiOutcome, DcsOutcome,
};
use crate::pending::PendingMode;
use crate::report::{ParseError, Reporter, TracingReporter};
use crate::screen::{PendingToken, Screen};
use crate::strescape::{StringEscAccumulator, StringOutcome};
use crate::utf8::Utf8Decoder;

/// Margin (in bytes) `ParserCore` leaves free in the buffer before forcing a
/// pending-mode drain, matching the value exercised in
/// [`crate::pending`]'s own drain-condition tests.
const PENDING_DRAIN_MARGIN: usize = 4096;

/// Which composite (ESC-introduced) escape is currently being accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringKind {
    Osc,
    Dcs,
    Apc,
    Pm,
    Sos,
}

impl StringKind {
    fn label(self) -> &'static str {
        match self {
            StringKind::Osc => "OSC",
            StringKind::Dcs => "DCS",
            StringKind::Apc => "APC",
            StringKind::Pm => "PM",
            StringKind::Sos => "SOS",
        }
    }

    fn is_osc(self) -> bool {
        matches!(self, StringKind::Osc)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    Ground,
    Esc,
    Csi,
    DcsHeader,
    /// Accumulating the payload of whichever [`StringKind`] is currently set
    /// (covers DCS, OSC, APC, PM, and SOS bodies — they share one
    /// accumulator since at most one can be in flight at a time).
    StringBody,
}

fn csi_abort_error(abort: CsiAbort, cfg: &ParserConfig) -> ParseError<'static> {
    match abort {
        CsiAbort::TooManyParameters => ParseError::TooManyCsiParameters {
            max: cfg.max_csi_parameters(),
        },
        CsiAbort::DigitOverflow => ParseError::CsiDigitOverflow {
            max: cfg.max_csi_digits(),
        },
        CsiAbort::TooLong => ParseError::CsiTooLong {
            max: cfg.max_escape_code_length(),
        },
        CsiAbort::InvalidByte(byte) => ParseError::InvalidCsiByte { byte },
    }
}

/// Strips the `"52;"` (or bare `"52"`) prefix [`StringOutcome::PartialOsc52`]
/// guarantees, leaving the same `selection;data` remainder
/// [`crate::dispatch::dispatch_osc`] would hand a complete OSC 52 payload.
fn strip_osc52_code(partial_payload: &[u8]) -> &[u8] {
    payload_after_code(partial_payload)
}

/// Outcome of one [`ParserCore::parse`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseReport {
    /// Bytes moved from `consumed` to a new position during this call
    /// (dispatched bytes, not bytes merely scanned while pending mode
    /// buffers them).
    pub bytes_processed: usize,
    /// Whether a buffer [`ByteBuffer::reclaim`] compaction found the writer
    /// had been blocked (no space) just before this call, i.e. the producer
    /// may now resume.
    pub write_space_created: bool,
    /// Whether unread input remained in the buffer when this call returned
    /// (either because it declined to flush, or because pending mode is
    /// still scanning for its stop sentinel).
    pub has_pending_input: bool,
    /// How long ago new bytes first arrived in an otherwise-drained buffer,
    /// if any are still outstanding.
    pub time_since_new_input: Option<Duration>,
    /// When pending (synchronized update) mode was activated, if it still is.
    pub pending_activated_at: Option<Instant>,
    /// The configured pending-mode hold time, echoed back for convenience.
    pub pending_wait_time: Duration,
    /// Whether pending (synchronized update) mode is still active when this
    /// call returned.
    pub pending_active: bool,
}

/// The streaming parser. Owns the shared byte buffer a writer thread feeds
/// via [`ParserCore::acquire_write_buffer`], and drives a [`Screen`]
/// implementation by repeatedly calling [`ParserCore::parse`].
///
/// Generic over the [`Reporter`] malformed input is sent to, defaulting to
/// [`TracingReporter`] so a caller who does not care about diagnostics does
/// not need to name a type parameter.
pub struct ParserCore<R: Reporter = TracingReporter> {
    buffer: ByteBuffer,
    config: ParserConfig,
    reporter: R,
    state: ParserState,
    utf8: Utf8Decoder,
    csi_acc: CsiAccumulator,
    dcs_intro: CsiAccumulator,
    string_acc: StringEscAccumulator,
    string_kind: StringKind,
    /// Set once a string payload overflows `max_escape_code_length`; the
    /// accumulator keeps scanning for the terminator (so the state machine
    /// can resynchronise) but the eventual payload is not dispatched.
    discarding: bool,
    /// The single `0x20..=0x2F` intermediate byte collected before a plain
    /// `ESC` final byte, if any. `rio-backend`'s own ESC dispatch never
    /// needs more than one; this crate keeps that simplification rather
    /// than tracking a `Vec` of intermediates nothing in §4 uses.
    esc_intermediate: u8,
    pending: PendingMode,
    /// Which wire spelling activated pending mode, so a forced (timeout or
    /// size) drain can report the matching token to `Screen`.
    pending_token: Option<PendingToken>,
    window_id: u32,
}

impl ParserCore<TracingReporter> {
    /// A parser with the default buffer capacity and configuration,
    /// reporting through [`TracingReporter`]. `window_id` tags this parser
    /// for a multi-window embedder's `tracing` spans; purely advisory, never
    /// consulted by the parser itself.
    pub fn new(window_id: u32) -> Self {
        Self::with_config(window_id, ParserConfig::new())
    }

    pub fn with_config(window_id: u32, config: ParserConfig) -> Self {
        Self::with_reporter_and_config(window_id, TracingReporter, config)
    }
}

impl Default for ParserCore<TracingReporter> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<R: Reporter> ParserCore<R> {
    pub fn with_reporter(window_id: u32, reporter: R) -> Self {
        Self::with_reporter_and_config(window_id, reporter, ParserConfig::new())
    }

    pub fn with_reporter_and_config(window_id: u32, reporter: R, config: ParserConfig) -> Self {
        let pending = PendingMode::new(&config);
        ParserCore {
            buffer: ByteBuffer::new(BUF_SZ),
            config,
            reporter,
            state: ParserState::Ground,
            utf8: Utf8Decoder::new(),
            csi_acc: CsiAccumulator::new(),
            dcs_intro: CsiAccumulator::new(),
            string_acc: StringEscAccumulator::new(),
            string_kind: StringKind::Osc,
            discarding: false,
            esc_intermediate: 0,
            pending,
            pending_token: None,
            window_id,
        }
    }

    pub fn window_id(&self) -> u32 {
        self.window_id
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Returns the parser to the ground state and drops any in-flight
    /// accumulation. The byte buffer itself is untouched — this is for
    /// recovering from a caller-detected desync, not for clearing input.
    pub fn reset(&mut self) {
        self.state = ParserState::Ground;
        self.utf8.reset();
        self.csi_acc.reset();
        self.dcs_intro.reset();
        self.string_acc.start();
        self.discarding = false;
        self.esc_intermediate = 0;
        self.pending = PendingMode::new(&self.config);
        self.pending_token = None;
    }

    /// Acquire the shared buffer's unused tail for a producer thread to
    /// write into; see [`ByteBuffer::acquire_write`].
    pub fn acquire_write_buffer(&self) -> Option<WriteGuard<'_>> {
        self.buffer.acquire_write()
    }

    pub fn has_space_for_input(&self) -> bool {
        self.buffer.has_space()
    }

    /// Drives `screen` with buffered input, alternating between ordinary
    /// dispatch and the pending-mode scan as `CSI ? 2026 h`/`l` (or its DCS
    /// spelling) comes and goes. `now` is injected rather than read from the
    /// clock so pending-mode's time-bounded drain can be driven
    /// deterministically in tests.
    ///
    /// `flush` mirrors §4.9's driving algorithm: a caller that wants to
    /// batch small writer bursts can pass `false` and rely on `input_delay`
    /// (or pending mode's own drain conditions, or the buffer nearing
    /// capacity) to decide when a drain is actually warranted; a caller that
    /// wants every buffered byte dispatched immediately passes `true`.
    pub fn parse(&mut self, screen: &mut dyn Screen, now: Instant, flush: bool) -> ParseReport {
        let mut total = 0usize;
        let mut write_space_created = false;

        let first = self.buffer.snapshot(now);
        let has_pending_input = first.sz > first.pos;
        let time_since_new_input = first.new_input_at.map(|at| now.saturating_duration_since(at));
        let margin = PENDING_DRAIN_MARGIN;
        let near_full = first.sz + margin >= self.buffer.capacity();
        let input_delay_elapsed = time_since_new_input
            .map(|elapsed| elapsed >= self.config.input_delay())
            .unwrap_or(false);
        let should_drain =
            flush || self.pending.is_active() || input_delay_elapsed || near_full;

        if !should_drain {
            return ParseReport {
                bytes_processed: 0,
                write_space_created: false,
                has_pending_input,
                time_since_new_input,
                pending_activated_at: self.pending.activated_at(),
                pending_wait_time: self.pending.wait_time(),
                pending_active: self.pending.is_active(),
            };
        }

        loop {
            let snap = self.buffer.snapshot(now);

            if self.pending.is_active() {
                let unread = self.buffer.readable(snap.pos, snap.sz);
                let mut scanned = unread.len();
                let mut stopped = false;
                for (i, &b) in unread.iter().enumerate() {
                    if self.pending.feed(b) {
                        scanned = i + 1;
                        stopped = true;
                        break;
                    }
                }
                let new_pos = snap.pos + scanned;

                if stopped {
                    self.buffer.advance(snap.consumed, new_pos);
                    let (cursor, _) = self.run_normal(screen, snap.consumed, new_pos, now);
                    self.buffer.advance(cursor, cursor);
                    total += cursor.saturating_sub(snap.consumed);
                    continue;
                }

                let buffered_since_activation = new_pos - snap.consumed;
                let drain = self.pending.should_drain(
                    now,
                    buffered_since_activation,
                    PENDING_DRAIN_MARGIN,
                    self.buffer.capacity(),
                );
                // `should_drain` only ever yields `Timeout`/`BufferNearFull`
                // here — the stop-sentinel case was already handled above,
                // via `stopped`, before this is reached.
                if drain.is_some() {
                    self.buffer.advance(snap.consumed, snap.sz);
                    let (cursor, _) = self.run_normal(screen, snap.consumed, snap.sz, now);
                    if self.pending.is_active() {
                        let token = self.pending_token.unwrap_or(PendingToken::Csi);
                        self.pending.deactivate();
                        screen.pause_rendering(false, token);
                    }
                    self.buffer.advance(cursor, cursor);
                    total += cursor.saturating_sub(snap.consumed);
                    continue;
                }
                self.buffer.advance(snap.consumed, new_pos);
                break;
            }

            if snap.sz == snap.pos {
                break;
            }
            let (new_pos, just_activated) = self.run_normal(screen, snap.pos, snap.sz, now);
            self.buffer.advance(new_pos, new_pos);
            total += new_pos.saturating_sub(snap.pos);
            if just_activated {
                continue;
            }
            break;
        }
        if self.buffer.reclaim() {
            write_space_created = true;
        }
        let final_snap = self.buffer.snapshot(now);
        ParseReport {
            bytes_processed: total,
            write_space_created,
            has_pending_input: final_snap.sz > final_snap.pos,
            time_since_new_input: final_snap
                .new_input_at
                .map(|at| now.saturating_duration_since(at)),
            pending_activated_at: self.pending.activated_at(),
            pending_wait_time: self.pending.wait_time(),
            pending_active: self.pending.is_active(),
        }
    }

    /// Drives the outer state machine over `[start, end)`. Returns the
    /// cursor it reached (always `end`, except when pending mode activates
    /// mid-range — dispatch must stop there so the bytes that follow are
    /// only scanned, never executed) and whether that early stop happened.
    fn run_normal(
        &mut self,
        screen: &mut dyn Screen,
        start: usize,
        end: usize,
        now: Instant,
    ) -> (usize, bool) {
        let mut cursor = start;
        while cursor < end {
            let remaining = self.buffer.readable(cursor, end);
            match self.state {
                ParserState::Ground => {
                    let (consumed, sentinel) = self.utf8.decode_to_esc(remaining);
                    for &byte in self.utf8.invalid_bytes() {
                        self.reporter.report(ParseError::InvalidUtf8 { byte });
                    }
                    ground_dispatch(self.utf8.burst(), screen);
                    cursor += consumed;
                    if sentinel {
                        self.state = ParserState::Esc;
                        self.esc_intermediate = 0;
                    }
                    if consumed == 0 {
                        break;
                    }
                }
                ParserState::Esc => {
                    let byte = remaining[0];
                    cursor += 1;
                    match byte {
                        b'[' => {
                            self.csi_acc.reset();
                            self.state = ParserState::Csi;
                        }
                        b'P' => {
                            self.dcs_intro.reset();
                            self.state = ParserState::DcsHeader;
                        }
                        b']' => self.begin_string(StringKind::Osc),
                        b'_' => self.begin_string(StringKind::Apc),
                        b'^' => self.begin_string(StringKind::Pm),
                        b'X' => self.begin_string(StringKind::Sos),
                        0x20..=0x2F => self.esc_intermediate = byte,
                        _ => {
                            dispatch_esc(self.esc_intermediate, byte, screen);
                            self.state = ParserState::Ground;
                        }
                    }
                }
                ParserState::Csi => {
                    let byte = remaining[0];
                    cursor += 1;
                    match self.csi_acc.feed(byte, &self.config) {
                        CsiStep::Continue => {}
                        CsiStep::Execute(b) => dispatch_control_byte(b, screen),
                        CsiStep::Finished => {
                            self.state = ParserState::Ground;
                            if self.csi_acc.csi().is_valid {
                                let csi = self.csi_acc.csi().clone();
                                let outcome = dispatch_csi(
                                    &csi,
                                    screen,
                                    &mut self.reporter,
                                    self.pending.is_active(),
                                );
                                if self.handle_csi_outcome(outcome, screen, now) {
                                    return (cursor, true);
                                }
                            }
                        }
                        CsiStep::Aborted(abort) => {
                            let error = csi_abort_error(abort, &self.config);
                            self.reporter.report(error);
                        }
                    }
                }
                ParserState::DcsHeader => {
                    let byte = remaining[0];
                    cursor += 1;
                    match self.dcs_intro.feed(byte, &self.config) {
                        CsiStep::Continue => {}
                        CsiStep::Execute(b) => dispatch_control_byte(b, screen),
                        CsiStep::Finished => self.begin_string(StringKind::Dcs),
                        CsiStep::Aborted(abort) => {
                            let error = csi_abort_error(abort, &self.config);
                            self.reporter.report(error);
                        }
                    }
                }
                ParserState::StringBody => {
                    let is_osc = self.string_kind.is_osc();
                    match self.string_acc.accumulate(remaining, &self.config, is_osc) {
                        StringOutcome::Pending { consumed } => {
                            cursor += consumed;
                            if consumed == 0 {
                                break;
                            }
                        }
                        StringOutcome::Complete { consumed, .. } => {
                            cursor += consumed;
                            let discarded = self.discarding;
                            self.state = ParserState::Ground;
                            if !discarded && self.finish_string(screen, now) {
                                return (cursor, true);
                            }
                        }
                        StringOutcome::PartialOsc52 {
                            consumed,
                            partial_payload,
                        } => {
                            cursor += consumed;
                            screen.clipboard_control(-52, strip_osc52_code(&partial_payload));
                        }
                        StringOutcome::TooLong { consumed, len } => {
                            cursor += consumed;
                            self.reporter.report(ParseError::EscapeCodeTooLong {
                                kind: self.string_kind.label(),
                                len,
                            });
                            self.discarding = true;
                        }
                    }
                }
            }
        }
        (cursor, false)
    }

    fn begin_string(&mut self, kind: StringKind) {
        self.string_acc.start();
        self.string_kind = kind;
        self.discarding = false;
        self.state = ParserState::StringBody;
    }

    /// Dispatches the just-completed string payload. Returns whether pending
    /// mode was just activated (only the DCS `=1s` spelling can do this from
    /// here; `dispatch_osc`/`dispatch_apc`/PM/SOS never do).
    fn finish_string(&mut self, screen: &mut dyn Screen, now: Instant) -> bool {
        match self.string_kind {
            StringKind::Osc => {
                dispatch_osc(self.string_acc.payload(), screen, &mut self.reporter);
                false
            }
            StringKind::Dcs => {
                let intro = self.dcs_intro.csi().clone();
                let payload = self.string_acc.payload();
                let outcome =
                    dispatch_dcs(&intro, payload, screen, &mut self.reporter, self.pending.is_active());
                self.handle_dcs_outcome(outcome, screen, now)
            }
            StringKind::Apc => {
                dispatch_apc(self.string_acc.payload(), screen, &mut self.reporter);
                false
            }
            StringKind::Pm => {
                dispatch_pm_or_sos("PM", self.string_acc.payload(), &mut self.reporter);
                false
            }
            StringKind::Sos => {
                dispatch_pm_or_sos("SOS", self.string_acc.payload(), &mut self.reporter);
                false
            }
        }
    }

    fn handle_csi_outcome(&mut self, outcome: CsiOutcome, screen: &mut dyn Screen, now: Instant) -> bool {
        match outcome {
            CsiOutcome::Dispatched => false,
            CsiOutcome::ActivatePending => {
                self.pending.activate(now);
                self.pending_token = Some(PendingToken::Csi);
                screen.pause_rendering(true, PendingToken::Csi);
                true
            }
            CsiOutcome::DeactivatePending => {
                self.pending.deactivate();
                screen.pause_rendering(false, PendingToken::Csi);
                false
            }
        }
    }

    fn handle_dcs_outcome(&mut self, outcome: DcsOutcome, screen: &mut dyn Screen, now: Instant) -> bool {
        match outcome {
            DcsOutcome::Dispatched => false,
            DcsOutcome::ActivatePending => {
                self.pending.activate(now);
                self.pending_token = Some(PendingToken::Dcs);
                screen.pause_rendering(true, PendingToken::Dcs);
                true
            }
            DcsOutcome::DeactivatePending => {
                self.pending.deactivate();
                screen.pause_rendering(false, PendingToken::Dcs);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::NullReporter;
    use crate::screen::Region;

    #[derive(Default)]
    struct Recording {
        text: Vec<String>,
        cursor_ups: Vec<i32>,
        titles: Vec<String>,
        sgr_groups: Vec<Vec<i32>>,
        pause_events: Vec<(bool, PendingToken)>,
    }

    impl Screen for Recording {
        fn draw_text(&mut self, codepoints: &[char]) {
            self.text.push(codepoints.iter().collect());
        }
        fn cursor_up(&mut self, n: i32) {
            self.cursor_ups.push(n);
        }
        fn set_title(&mut self, title: &str) {
            self.titles.push(title.to_string());
        }
        fn apply_sgr(&mut self, params: &[i32], _is_sub_group: bool, _region: Option<Region>) {
            self.sgr_groups.push(params.to_vec());
        }
        fn pause_rendering(&mut self, on: bool, token: PendingToken) -> bool {
            self.pause_events.push((on, token));
            true
        }
    }

    fn feed(core: &mut ParserCore<NullReporter>, bytes: &[u8]) {
        let mut w = core.acquire_write_buffer().unwrap();
        w.bytes()[..bytes.len()].copy_from_slice(bytes);
        w.commit(bytes.len());
    }

    fn new_core() -> ParserCore<NullReporter> {
        ParserCore::with_reporter(0, NullReporter)
    }

    #[test]
    fn new_accepts_window_id_directly() {
        let core = ParserCore::new(7);
        assert_eq!(core.window_id(), 7);
    }

    #[test]
    fn draws_plain_text() {
        let mut core = new_core();
        let mut screen = Recording::default();
        feed(&mut core, b"hello");
        let report = core.parse(&mut screen, Instant::now(), true);
        assert_eq!(screen.text, vec!["hello".to_string()]);
        assert_eq!(report.bytes_processed, 5);
        assert!(!report.pending_active);
    }

    #[test]
    fn flush_false_defers_until_input_delay_elapses() {
        let cfg = ParserConfig::new().with_input_delay(std::time::Duration::from_millis(10));
        let mut core = ParserCore::with_reporter_and_config(0, NullReporter, cfg);
        let mut screen = Recording::default();
        let t0 = Instant::now();
        feed(&mut core, b"hello");

        let report = core.parse(&mut screen, t0, false);
        assert_eq!(report.bytes_processed, 0);
        assert!(report.has_pending_input);
        assert!(screen.text.is_empty());

        let later = t0 + std::time::Duration::from_millis(11);
        let report = core.parse(&mut screen, later, false);
        assert_eq!(report.bytes_processed, 5);
        assert_eq!(screen.text, vec!["hello".to_string()]);
    }

    #[test]
    fn dispatches_a_csi_sequence() {
        let mut core = new_core();
        let mut screen = Recording::default();
        feed(&mut core, b"\x1b[5A");
        core.parse(&mut screen, Instant::now(), true);
        assert_eq!(screen.cursor_ups, vec![5]);
    }

    #[test]
    fn dispatches_an_osc_title() {
        let mut core = new_core();
        let mut screen = Recording::default();
        feed(&mut core, b"\x1b]2;hello\x07");
        core.parse(&mut screen, Instant::now(), true);
        assert_eq!(screen.titles, vec!["hello".to_string()]);
    }

    #[test]
    fn csi_sequence_split_across_two_parse_calls() {
        let mut core = new_core();
        let mut screen = Recording::default();
        feed(&mut core, b"\x1b[1");
        core.parse(&mut screen, Instant::now(), true);
        assert!(screen.cursor_ups.is_empty());

        feed(&mut core, b"2A");
        core.parse(&mut screen, Instant::now(), true);
        assert_eq!(screen.cursor_ups, vec![12]);
    }

    #[test]
    fn sgr_text_and_csi_share_one_parse_call() {
        let mut core = new_core();
        let mut screen = Recording::default();
        feed(&mut core, b"hi\x1b[1mbye");
        core.parse(&mut screen, Instant::now(), true);
        assert_eq!(screen.text, vec!["hi".to_string(), "bye".to_string()]);
        assert_eq!(screen.sgr_groups, vec![vec![1]]);
    }

    #[test]
    fn pending_mode_activates_and_drains_on_stop_sentinel() {
        let mut core = new_core();
        let mut screen = Recording::default();
        let t0 = Instant::now();
        feed(&mut core, b"\x1b[?2026h");
        let report = core.parse(&mut screen, t0, true);
        assert!(report.pending_active);
        assert_eq!(screen.pause_events, vec![(true, PendingToken::Csi)]);

        feed(&mut core, b"garbage\x1b[5A\x1b[?2026l");
        let report = core.parse(&mut screen, t0, true);
        assert!(!report.pending_active);
        assert_eq!(screen.cursor_ups, vec![5]);
        assert_eq!(
            screen.pause_events,
            vec![(true, PendingToken::Csi), (false, PendingToken::Csi)]
        );
    }

    #[test]
    fn pending_mode_activates_and_drains_on_dcs_stop_sentinel() {
        let mut core = new_core();
        let mut screen = Recording::default();
        let t0 = Instant::now();
        feed(&mut core, b"\x1bP=1s\x1b\\");
        let report = core.parse(&mut screen, t0, true);
        assert!(report.pending_active);
        assert_eq!(screen.pause_events, vec![(true, PendingToken::Dcs)]);

        feed(&mut core, b"hi\x1bP=2s\x1b\\");
        let report = core.parse(&mut screen, t0, true);
        assert!(!report.pending_active);
        assert_eq!(screen.text, vec!["hi".to_string()]);
        assert_eq!(
            screen.pause_events,
            vec![(true, PendingToken::Dcs), (false, PendingToken::Dcs)]
        );
    }

    #[test]
    fn pending_mode_force_drains_on_timeout() {
        let cfg = ParserConfig::new().with_pending_wait_time(std::time::Duration::from_millis(0));
        let mut core = ParserCore::with_reporter_and_config(0, NullReporter, cfg);
        let mut screen = Recording::default();
        let t0 = Instant::now();
        feed(&mut core, b"\x1b[?2026h");
        core.parse(&mut screen, t0, true);
        assert!(core.pending.is_active());

        feed(&mut core, b"\x1b[5Astill buffered, never stops");
        let later = t0 + std::time::Duration::from_millis(1);
        let report = core.parse(&mut screen, later, true);
        assert!(!report.pending_active);
        assert_eq!(screen.cursor_ups, vec![5]);
        assert_eq!(
            screen.pause_events,
            vec![(true, PendingToken::Csi), (false, PendingToken::Csi)]
        );
    }

    #[test]
    fn malformed_utf8_in_ground_state_is_reported() {
        use std::cell::RefCell;
        use std::rc::Rc;

        struct Recorder(Rc<RefCell<Vec<String>>>);
        impl Reporter for Recorder {
            fn report(&mut self, error: ParseError<'_>) {
                self.0.borrow_mut().push(error.to_string());
            }
        }

        let messages = Rc::new(RefCell::new(Vec::new()));
        let mut core = ParserCore::with_reporter(0, Recorder(messages.clone()));
        let mut screen = Recording::default();
        let mut w = core.acquire_write_buffer().unwrap();
        w.bytes()[..3].copy_from_slice(&[b'h', 0xFF, b'i']);
        w.commit(3);
        core.parse(&mut screen, Instant::now(), true);
        assert_eq!(screen.text, vec!["h\u{FFFD}i".to_string()]);
        assert_eq!(messages.borrow().len(), 1);
        assert!(messages.borrow()[0].contains("invalid UTF-8"));
    }

    #[test]
    fn oversized_csi_recovers_and_resumes_dispatch() {
        let cfg = ParserConfig::new().with_max_escape_code_length(4);
        let mut core = ParserCore::with_reporter_and_config(0, NullReporter, cfg);
        let mut screen = Recording::default();
        let mut body = b"\x1b[".to_vec();
        body.extend(std::iter::repeat(b'1').take(32));
        body.push(b'H');
        body.extend_from_slice(b"after");
        feed(&mut core, &body);
        core.parse(&mut screen, Instant::now(), true);
        assert!(screen.cursor_ups.is_empty());
        assert_eq!(screen.text, vec!["after".to_string()]);
    }

    #[test]
    fn reset_clears_in_flight_csi_state() {
        let mut core = new_core();
        let mut screen = Recording::default();
        feed(&mut core, b"\x1b[1");
        core.parse(&mut screen, Instant::now(), true);
        core.reset();

        feed(&mut core, b"2A");
        core.parse(&mut screen, Instant::now(), true);
        // The abandoned "1" parameter is gone; "2A" parses as a fresh ESC-less
        // byte run in Ground state, not a CSI trailer.
        assert!(screen.cursor_ups.is_empty());
        assert_eq!(screen.text, vec!["2A".to_string()]);
    }
}

//! The `DispatchTable`: routes a fully-parsed CSI, or an accumulated
//! OSC/DCS/APC/PM/SOS payload, to the matching [`Screen`] method.
//!
//! Grounded in `rio-backend`'s `csi_dispatch`/`osc_dispatch`/`esc_dispatch`
//! (`performer/handler.rs`): it already matches `(action, intermediates)`
//! tuples for CSI and `params[0]` byte-string literals for OSC, falling
//! through to a logged `unhandled(...)` call. This module keeps both shapes
//! but drives them off [`crate::csi::ParsedCsi`] and a `;`-split payload
//! slice rather than `vte::Params`/`&[&[u8]]`, and reports the fallthrough
//! through a [`Reporter`] instead of `tracing::warn!` directly so callers
//! can choose what "unhandled" means for them.

use crate::csi::ParsedCsi;
use crate::report::{ParseError, Reporter};
use crate::screen::{Region, Screen};
use crate::sgr;

/// OSC code used by the file-transfer-over-DCS convention some terminals
/// layer on top of OSC.
pub const FILE_TRANSFER_CODE: u32 = 5113;

/// Vendor/application OSC codes this crate recognises but deliberately does
/// not forward to `Screen` — the same "yes, we saw that, no, we don't act on
/// it" bucket `rio-backend`'s `osc_dispatch` falls into for codes it matches
/// only to silently return early.
const IGNORED_OSC_CODES: &[u32] = &[
    46, 50, 51, 60, 61, 440, 633, 666, 697, 701, 3008, 7704, 7750, 7770, 7771, 7777, 9001,
];

/// Outcome of [`dispatch_csi`] that `ParserCore` must act on itself, because
/// it changes which state machine owns subsequent bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsiOutcome {
    /// Ordinary dispatch; no state-machine change.
    Dispatched,
    /// `CSI ? 2026 h`: enter pending (synchronized update) mode.
    ActivatePending,
    /// `CSI ? 2026 l` seen while pending mode was active (either live or
    /// being replayed out of the drain): leave pending mode.
    DeactivatePending,
}

/// Outcome of [`dispatch_dcs`], mirroring [`CsiOutcome`] for the `DCS = 1 s`
/// / `DCS = 2 s` spelling of the same start/stop pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DcsOutcome {
    Dispatched,
    ActivatePending,
    DeactivatePending,
}

fn csi_param_or(csi: &ParsedCsi, index: usize, default: i32) -> i32 {
    csi.param_or(index, default)
}

/// Dispatches a complete CSI sequence. `$r`/`m` (DECCARA/SGR) are routed
/// through [`sgr::parse_sgr`] first; every other trailer is looked up in the
/// `(prefix, secondary, trailer)` table below.
///
/// `CSI ? 2026 l` arriving here (rather than being consumed by
/// [`crate::pending::PendingMode`]'s own scan) means pending mode was never
/// activated; that's reported as [`ParseError::PendingStopWithoutStart`]
/// rather than dispatched, matching §7's stop-without-start row.
pub fn dispatch_csi(
    csi: &ParsedCsi,
    screen: &mut dyn Screen,
    reporter: &mut dyn Reporter,
    pending_active: bool,
) -> CsiOutcome {
    let p = csi.prefix;
    let s = csi.secondary;
    let t = csi.trailer;

    if p == b'?' && s == 0 && csi.params.first().copied() == Some(2026) {
        if t == b'h' {
            return CsiOutcome::ActivatePending;
        }
        if t == b'l' {
            if pending_active {
                return CsiOutcome::DeactivatePending;
            }
            reporter.report(ParseError::PendingStopWithoutStart);
            return CsiOutcome::Dispatched;
        }
    }

    if s == b'$' && t == b'r' {
        let (region, groups, err) = sgr::parse_sgr(csi, true);
        for group in &groups {
            screen.apply_sgr(&group.params, group.is_sub_group, region);
        }
        if let Some(err) = err {
            reporter.report(err);
        }
        return CsiOutcome::Dispatched;
    }
    if s == 0 && p == 0 && t == b'm' {
        let (_, groups, err) = sgr::parse_sgr(csi, false);
        for group in &groups {
            screen.apply_sgr(&group.params, group.is_sub_group, None);
        }
        if let Some(err) = err {
            reporter.report(err);
        }
        return CsiOutcome::Dispatched;
    }

    match (p, s, t) {
        (0, 0, b'@') => screen.insert_characters(csi_param_or(csi, 0, 1)),
        (0, 0, b'b') => screen.repeat_character(csi_param_or(csi, 0, 1)),
        (0, 0, b'A') => screen.cursor_up(csi_param_or(csi, 0, 1)),
        (0, 0, b'B') | (0, 0, b'e') => screen.cursor_down(csi_param_or(csi, 0, 1)),
        (0, 0, b'C') | (0, 0, b'a') => screen.cursor_forward(csi_param_or(csi, 0, 1)),
        (0, 0, b'D') => screen.cursor_back(csi_param_or(csi, 0, 1)),
        (0, 0, b'E') => screen.cursor_down1(csi_param_or(csi, 0, 1)),
        (0, 0, b'F') => screen.cursor_up1(csi_param_or(csi, 0, 1)),
        (0, 0, b'G') | (0, 0, b'`') => screen.cursor_to_column(csi_param_or(csi, 0, 1)),
        (0, 0, b'd') => screen.cursor_to_line(csi_param_or(csi, 0, 1)),
        (0, 0, b'Z') => screen.backtab(csi_param_or(csi, 0, 1)),
        (0, 0, b'I') => screen.tab_n(csi_param_or(csi, 0, 1)),
        (0, 0, b'H') | (0, 0, b'f') => {
            screen.cursor_position(csi_param_or(csi, 0, 1), csi_param_or(csi, 1, 1))
        }
        (0, 0, b'J') => screen.erase_in_display(csi_param_or(csi, 0, 0), false),
        (b'?', 0, b'J') => screen.erase_in_display(csi_param_or(csi, 0, 0), true),
        (0, 0, b'K') => screen.erase_in_line(csi_param_or(csi, 0, 0), false),
        (b'?', 0, b'K') => screen.erase_in_line(csi_param_or(csi, 0, 0), true),
        (0, 0, b'L') => screen.insert_lines(csi_param_or(csi, 0, 1)),
        (0, 0, b'M') => screen.delete_lines(csi_param_or(csi, 0, 1)),
        (0, b'#', b'P') => screen.push_colors(csi_param_or(csi, 0, 0)),
        (0, 0, b'P') => screen.delete_characters(csi_param_or(csi, 0, 1)),
        (0, b'#', b'Q') => screen.pop_colors(csi_param_or(csi, 0, 0)),
        (0, b'#', b'R') => screen.report_color_stack(),
        (0, b'*', b'x') => screen.decsace(csi_param_or(csi, 0, 0)),
        (0, 0, b'X') => screen.erase_characters(csi_param_or(csi, 0, 1)),
        (p, sec, b'c') if csi_param_or(csi, 0, 0) == 0 => {
            screen.report_device_attributes(p as i32, sec)
        }
        (0, 0, b'g') => screen.clear_tab_stop(csi_param_or(csi, 0, 0)),
        (0, 0, b'h') => {
            for &code in &csi.params {
                screen.set_mode(code);
            }
        }
        (b'?', 0, b'h') => {
            for &code in &csi.params {
                screen.set_mode(code << 5);
            }
        }
        (0, 0, b'l') => {
            for &code in &csi.params {
                screen.reset_mode(code);
            }
        }
        (b'?', 0, b'l') => {
            for &code in &csi.params {
                screen.reset_mode(code << 5);
            }
        }
        (0, 0, b'n') => screen.report_device_status(csi_param_or(csi, 0, 0), false),
        (b'?', 0, b'n') => screen.report_device_status(csi_param_or(csi, 0, 0), true),
        (0, b'$', b'p') => screen.report_mode_status(csi_param_or(csi, 0, 0), false),
        (b'?', b'$', b'p') => screen.report_mode_status(csi_param_or(csi, 0, 0), true),
        (b'>', 0, b'q') if csi_param_or(csi, 0, 0) == 0 => screen.xtversion(0),
        (0, b' ', b'q') => screen.set_cursor_style(csi_param_or(csi, 0, 0), b'q'),
        (0, 0, b'r') => {
            screen.set_margins(csi_param_or(csi, 0, 1), csi_param_or(csi, 1, 0))
        }
        (b'?', 0, b's') => {
            if csi.params.is_empty() {
                screen.save_modes();
            } else {
                for &code in &csi.params {
                    screen.save_mode(code);
                }
            }
        }
        (b'?', 0, b'r') => {
            if csi.params.is_empty() {
                screen.restore_modes();
            } else {
                for &code in &csi.params {
                    screen.restore_mode(code);
                }
            }
        }
        (0, 0, b's') => screen.save_cursor(),
        (0, 0, b'S') => screen.scroll(csi_param_or(csi, 0, 1)),
        (0, 0, b'T') => screen.reverse_scroll(csi_param_or(csi, 0, 1)),
        (0, b'+', b'T') => screen.reverse_scroll_and_fill_from_scrollback(csi_param_or(csi, 0, 1)),
        (0, 0, b't') => match csi_param_or(csi, 0, 1) {
            kind @ (14 | 16 | 18) => screen.report_size(kind),
            op @ (22 | 23) => screen.manipulate_title_stack(op, csi_param_or(csi, 1, 0)),
            _ => reporter.report(ParseError::UnknownCsiFinal { prefix: p, secondary: s, trailer: t }),
        },
        (b'?', 0, b'u') => screen.report_key_encoding_flags(),
        (b'=', 0, b'u') => {
            screen.set_key_encoding_flags(csi_param_or(csi, 0, 0), csi_param_or(csi, 1, 0))
        }
        (b'>', 0, b'u') => screen.push_key_encoding_flags(csi_param_or(csi, 0, 0)),
        (b'<', 0, b'u') => screen.pop_key_encoding_flags(csi_param_or(csi, 0, 1)),
        (0, 0, b'u') => screen.restore_cursor(),
        (b'>', 0, b'm') => screen.modify_other_keys(csi_param_or(csi, 0, 0)),
        _ => reporter.report(ParseError::UnknownCsiFinal { prefix: p, secondary: s, trailer: t }),
    }

    CsiOutcome::Dispatched
}

fn parse_osc_code(field: &[u8]) -> Option<u32> {
    if field.is_empty() || field.len() > 5 || !field.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let mut value: u32 = 0;
    for &b in field {
        value = value * 10 + u32::from(b - b'0');
    }
    Some(value)
}

fn split_osc_fields(payload: &[u8]) -> Vec<&[u8]> {
    payload.split(|&b| b == b';').collect()
}

fn join_fields_lossy(fields: &[&[u8]]) -> String {
    fields
        .iter()
        .map(|f| String::from_utf8_lossy(f))
        .collect::<Vec<_>>()
        .join(";")
}

/// Dispatches one accumulated OSC payload (the bytes between `ESC ]` and the
/// String Terminator, not including either).
pub fn dispatch_osc(payload: &[u8], screen: &mut dyn Screen, reporter: &mut dyn Reporter) {
    let fields = split_osc_fields(payload);
    let Some(&code_field) = fields.first() else {
        reporter.report(ParseError::UnknownOscCode { code: None });
        return;
    };
    let Some(code) = parse_osc_code(code_field) else {
        reporter.report(ParseError::UnknownOscCode { code: None });
        return;
    };
    let rest = &fields[1..];

    match code {
        0 => {
            let title = join_fields_lossy(rest);
            screen.set_title(title.trim());
            screen.set_icon(title.trim());
        }
        1 => screen.set_icon(join_fields_lossy(rest).trim()),
        2 => screen.set_title(join_fields_lossy(rest).trim()),
        4 | 104 => screen.set_color_table_color(code as i32, payload_after_code(payload)),
        7 => screen.process_cwd_notification(7, payload_after_code(payload)),
        8 => {
            let id = rest.first().and_then(|params| {
                params
                    .split(|&b| b == b':')
                    .find_map(|kv| kv.strip_prefix(b"id="))
                    .and_then(|kv| core::str::from_utf8(kv).ok())
            });
            let url = rest.get(1).and_then(|u| core::str::from_utf8(u).ok());
            match url {
                Some(url) if !url.is_empty() => screen.set_active_hyperlink(id, Some(url)),
                _ => screen.set_active_hyperlink(None, None),
            }
        }
        9 | 99 | 777 | 1337 => screen.desktop_notify(code as i32, payload_after_code(payload)),
        10..=19 | 22 | 110..=119 => screen.set_dynamic_color(code as i32, payload_after_code(payload)),
        21 => screen.color_control(21, payload_after_code(payload)),
        52 | 5522 => screen.clipboard_control(code as i32, payload_after_code(payload)),
        66 => screen.apply_multicell_command(payload_after_code(payload)),
        133 => screen.shell_prompt_marking(&String::from_utf8_lossy(payload_after_code(payload))),
        30001 | 30101 => screen.color_control(code as i32, payload_after_code(payload)),
        FILE_TRANSFER_CODE => screen.file_transmission(payload_after_code(payload)),
        _ if IGNORED_OSC_CODES.contains(&code) => {
            reporter.report(ParseError::IgnoredOscCode { code });
        }
        _ => reporter.report(ParseError::UnknownOscCode { code: Some(code) }),
    }
}

pub(crate) fn payload_after_code(payload: &[u8]) -> &[u8] {
    match payload.iter().position(|&b| b == b';') {
        Some(idx) => &payload[idx + 1..],
        None => &[],
    }
}

/// Dispatches a DCS payload, given the parsed introducer (`prefix`,
/// `secondary`, `trailer`, `params` — parsed with the same
/// [`crate::csi::CsiAccumulator`] grammar as a CSI) and the accumulated
/// string body.
pub fn dispatch_dcs(
    intro: &ParsedCsi,
    payload: &[u8],
    screen: &mut dyn Screen,
    reporter: &mut dyn Reporter,
    pending_active: bool,
) -> DcsOutcome {
    let p = intro.prefix;
    let s = intro.secondary;
    let t = intro.trailer;

    if p == b'=' && s == 0 && t == b's' {
        match intro.params.first().copied() {
            Some(1) => return DcsOutcome::ActivatePending,
            Some(2) => {
                if pending_active {
                    return DcsOutcome::DeactivatePending;
                }
                reporter.report(ParseError::PendingStopWithoutStart);
                return DcsOutcome::Dispatched;
            }
            _ => {}
        }
    }

    match (p, s, t) {
        (b'+', 0, b'q') | (0, b'$', b'q') => screen.request_capabilities(s as i32, payload),
        (0, 0, b'q') => {
            screen.hook_sixel(&intro.params);
            for &b in payload {
                screen.put_sixel(b);
            }
            screen.unhook_sixel();
        }
        _ if payload.starts_with(b"@kitty-") || payload.starts_with(b"@kitty-cmd{") => {
            let (name, rest) = kitty_dcs_name(payload);
            screen.handle_kitty_dcs(name, rest);
        }
        _ => reporter.report(ParseError::UnknownStringCode { kind: "DCS", payload }),
    }
    DcsOutcome::Dispatched
}

fn kitty_dcs_name(payload: &[u8]) -> (&str, &[u8]) {
    if let Some(rest) = payload.strip_prefix(b"@kitty-") {
        if let Some(idx) = rest.iter().position(|&b| b == b'|') {
            let name = core::str::from_utf8(&rest[..idx]).unwrap_or("");
            return (name, &rest[idx + 1..]);
        }
        return (core::str::from_utf8(rest).unwrap_or(""), &[]);
    }
    ("cmd", payload)
}

/// Dispatches an APC payload: `G` (graphics) forwards the remainder to
/// `Screen`, anything else is reported as unknown.
pub fn dispatch_apc(payload: &[u8], screen: &mut dyn Screen, reporter: &mut dyn Reporter) {
    match payload.split_first() {
        Some((b'G', rest)) => screen.apply_graphics_command(rest),
        _ => reporter.report(ParseError::UnknownStringCode { kind: "APC", payload }),
    }
}

/// PM and SOS have no registered handlers at all; both are always reported
/// as unknown.
pub fn dispatch_pm_or_sos(kind: &'static str, payload: &[u8], reporter: &mut dyn Reporter) {
    reporter.report(ParseError::UnknownStringCode { kind, payload });
}

/// Routes a burst of decoded codepoints to `Screen`, splitting control bytes
/// (C0 and DEL) out of the run of printable text so each gets its own
/// dedicated call rather than landing inside [`Screen::draw_text`].
pub fn ground_dispatch(burst: &[char], screen: &mut dyn Screen) {
    let mut run_start = 0;
    for (i, &ch) in burst.iter().enumerate() {
        let control = (ch as u32) < 0x20 || ch as u32 == 0x7F;
        if control {
            if run_start < i {
                screen.draw_text(&burst[run_start..i]);
            }
            if let Ok(byte) = u8::try_from(ch as u32) {
                dispatch_control_byte(byte, screen);
            }
            run_start = i + 1;
        }
    }
    if run_start < burst.len() {
        screen.draw_text(&burst[run_start..]);
    }
}

/// Executes one C0 control byte directly against `Screen`, whether it
/// arrived in the ground state (via [`ground_dispatch`]) or inline inside a
/// CSI/DCS body (via [`crate::csi::CsiStep::Execute`]).
pub(crate) fn dispatch_control_byte(byte: u8, screen: &mut dyn Screen) {
    match byte {
        0x07 => screen.bell(),
        0x08 => screen.backspace(),
        0x09 => screen.tab(),
        0x0A | 0x0B | 0x0C => screen.linefeed(),
        0x0D => screen.carriage_return(),
        _ => {}
    }
}

/// Dispatches a simple `ESC` sequence — one that is neither CSI, DCS, OSC,
/// APC, PM, nor SOS. `intermediate` is `0` unless one `0x20..=0x2F` byte was
/// collected before the final byte.
pub fn dispatch_esc(intermediate: u8, final_byte: u8, screen: &mut dyn Screen) {
    match (intermediate, final_byte) {
        (0, b'D') => screen.index(),
        (0, b'M') => screen.reverse_index(),
        (0, b'E') => screen.nel(),
        (0, b'H') => screen.set_tab_stop(),
        (0, b'7') => screen.save_cursor(),
        (0, b'8') => screen.restore_cursor(),
        (b'#', b'8') => screen.align(),
        (slot @ (b'(' | b')' | b'*' | b'+'), charset) => {
            let index = match slot {
                b'(' => 0,
                b')' => 1,
                b'*' => 2,
                _ => 3,
            };
            screen.change_charset(index, charset);
        }
        _ => {}
    }
}

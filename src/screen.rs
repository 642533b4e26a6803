//! The `Screen` capability bundle: every operation `ParserCore` can dispatch.
//!
//! Grounded in `rio-backend`'s `performer::handler::Handler` trait
//! (`examples/raphamorim-rio/rio-backend/src/performer/handler.rs`) — a
//! single trait with a few hundred default-no-op methods, one per
//! escape-sequence action, that a terminal model implements selectively.
//! This crate keeps that shape (a capability bundle, not individual
//! function pointers) but narrows and renames the methods to this crate's
//! own dispatch contract rather than `Handler`'s Crosswords-specific
//! vocabulary (`Line`/`Column`/`Attr`/...). Every method defaults to a
//! no-op so implementors only override what their screen model cares
//! about, exactly like `Handler`.
//!
//! This crate ships the trait and [`NullScreen`] only — no renderer, no
//! grid, no sprite cache, no PTY transport, no font stack. Those are all
//! out-of-scope collaborators a real terminal emulator would wire in.

/// One parsed OSC/DCS/APC code paired with its raw payload, passed through
/// uninterpreted so `Screen` implementations can apply their own semantics.
pub type Payload<'a> = &'a [u8];

/// A DECCARA rectangle (`CSI Pt;Pl;Pb;Pr $r`), or `None` for a plain SGR `m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Region {
    pub top: i32,
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
}

/// Every operation `ParserCore` dispatches to the terminal model.
///
/// Every method has a default no-op body, matching `Handler`'s own
/// shape — implementors override only the subset their screen model cares
/// about. Grouping (drawing / cursor / erase+scroll / modes / colors /
/// ...) mirrors how `Handler` itself is organised into commented sections.
pub trait Screen {
    // --- Drawing ---------------------------------------------------------
    fn draw_text(&mut self, _codepoints: &[char]) {}
    fn bell(&mut self) {}
    fn backspace(&mut self) {}
    fn tab(&mut self) {}
    fn linefeed(&mut self) {}
    fn carriage_return(&mut self) {}
    fn index(&mut self) {}
    fn reverse_index(&mut self) {}
    fn nel(&mut self) {}
    fn align(&mut self) {}
    fn change_charset(&mut self, _slot: u8, _charset: u8) {}

    // --- Cursor ------------------------------------------------------------
    fn cursor_up(&mut self, _n: i32) {}
    fn cursor_down(&mut self, _n: i32) {}
    fn cursor_forward(&mut self, _n: i32) {}
    fn cursor_back(&mut self, _n: i32) {}
    fn cursor_up1(&mut self, _n: i32) {}
    fn cursor_down1(&mut self, _n: i32) {}
    fn cursor_position(&mut self, _row: i32, _col: i32) {}
    fn cursor_to_column(&mut self, _col: i32) {}
    fn cursor_to_line(&mut self, _line: i32) {}
    fn backtab(&mut self, _n: i32) {}
    fn tab_n(&mut self, _n: i32) {}
    fn save_cursor(&mut self) {}
    fn restore_cursor(&mut self) {}
    fn set_cursor_style(&mut self, _n: i32, _trailer_byte: u8) {}
    fn set_tab_stop(&mut self) {}
    fn clear_tab_stop(&mut self, _mode: i32) {}

    // --- Erase / scroll ------------------------------------------------------
    fn erase_in_display(&mut self, _mode: i32, _private: bool) {}
    fn erase_in_line(&mut self, _mode: i32, _private: bool) {}
    fn erase_characters(&mut self, _n: i32) {}
    fn insert_characters(&mut self, _n: i32) {}
    fn delete_characters(&mut self, _n: i32) {}
    fn insert_lines(&mut self, _n: i32) {}
    fn delete_lines(&mut self, _n: i32) {}
    fn scroll(&mut self, _n: i32) {}
    fn reverse_scroll(&mut self, _n: i32) {}
    fn reverse_scroll_and_fill_from_scrollback(&mut self, _n: i32) {}
    fn set_margins(&mut self, _top: i32, _bottom: i32) {}
    fn repeat_character(&mut self, _n: i32) {}

    // --- Modes -----------------------------------------------------------
    fn set_mode(&mut self, _code: i32) {}
    fn reset_mode(&mut self, _code: i32) {}
    fn save_modes(&mut self) {}
    fn restore_modes(&mut self) {}
    fn save_mode(&mut self, _code: i32) {}
    fn restore_mode(&mut self, _code: i32) {}
    fn report_mode_status(&mut self, _code: i32, _private: bool) {}
    fn report_device_attributes(&mut self, _kind: i32, _primary: u8) {}
    fn report_device_status(&mut self, _kind: i32, _private: bool) {}

    // --- Colors / palette --------------------------------------------------
    fn set_dynamic_color(&mut self, _code: i32, _payload: Payload<'_>) {}
    fn set_color_table_color(&mut self, _code: i32, _payload: Payload<'_>) {}
    fn color_control(&mut self, _code: i32, _payload: Payload<'_>) {}
    fn push_colors(&mut self, _n: i32) {}
    fn pop_colors(&mut self, _n: i32) {}
    fn report_color_stack(&mut self) {}

    // --- Graphics rendition ------------------------------------------------
    /// Applies one SGR/DECCARA parameter group, as produced by
    /// [`crate::sgr::parse_sgr`]. `is_sub_group` marks a group that arrived
    /// joined by `:` (e.g. `38:2:10:20:30`) rather than split across `;`.
    fn apply_sgr(&mut self, _params: &[i32], _is_sub_group: bool, _region: Option<Region>) {}
    fn decsace(&mut self, _mode: i32) {}

    // --- Keyboard encoding ---------------------------------------------------
    fn report_key_encoding_flags(&mut self) {}
    fn set_key_encoding_flags(&mut self, _value: i32, _how: i32) {}
    fn push_key_encoding_flags(&mut self, _value: i32) {}
    fn pop_key_encoding_flags(&mut self, _n: i32) {}
    fn modify_other_keys(&mut self, _value: i32) {}

    // --- Window ------------------------------------------------------------
    fn report_size(&mut self, _kind: i32) {}
    fn manipulate_title_stack(&mut self, _op: i32, _slot: i32) {}
    fn xtversion(&mut self, _kind: i32) {}

    // --- Title / icon / cwd --------------------------------------------------
    fn set_title(&mut self, _title: &str) {}
    fn set_icon(&mut self, _icon: &str) {}
    fn process_cwd_notification(&mut self, _code: i32, _payload: Payload<'_>) {}

    // --- Hyperlink ---------------------------------------------------------
    fn set_active_hyperlink(&mut self, _id: Option<&str>, _url: Option<&str>) {}

    // --- Capabilities / notifications ----------------------------------------
    fn request_capabilities(&mut self, _kind: i32, _payload: Payload<'_>) {}
    fn desktop_notify(&mut self, _code: i32, _payload: Payload<'_>) {}
    fn clipboard_control(&mut self, _code_or_neg: i32, _payload: Payload<'_>) {}
    fn file_transmission(&mut self, _payload: Payload<'_>) {}
    fn shell_prompt_marking(&mut self, _payload: &str) {}

    // --- Pending rendering ---------------------------------------------------
    /// Called when pending (synchronized update) mode activates (`on =
    /// true`) or drains (`on = false`). `token` distinguishes the CSI and DCS
    /// spellings of the start/stop sequence. Returns whether the Screen
    /// accepted the request; a `false` return from an activation is purely
    /// informational — the parser still scans for the stop sentinel either
    /// way, since the wire protocol itself has no rejection path.
    fn pause_rendering(&mut self, _on: bool, _token: PendingToken) -> bool {
        true
    }

    // --- Vendor DCS (kitty) --------------------------------------------------
    /// A `DCS @kitty-<name>|...` or `@kitty-cmd{...` payload, forwarded with
    /// a subkind name such as `remote_cmd`, `overlay_ready`,
    /// `kitten_result`, `remote_print`, `remote_echo`, `remote_ssh`,
    /// `remote_askpass`, `remote_clone`, `remote_edit`, or
    /// `restore_cursor_appearance`.
    fn handle_kitty_dcs(&mut self, _name: &str, _payload: Payload<'_>) {}

    // --- Sixel (DCS `q`) -----------------------------------------------------
    // Grounded in `rio-backend`'s `sixel_graphic_start/put/reset/finish`
    // quadruple, hung off the same DCS hook/put/unhook triad as XTGETTCAP.
    fn hook_sixel(&mut self, _params: &[i32]) {}
    fn put_sixel(&mut self, _byte: u8) {}
    fn unhook_sixel(&mut self) {}

    // --- Graphics (APC `G`) --------------------------------------------------
    fn apply_graphics_command(&mut self, _payload: Payload<'_>) {}

    // --- Multicell (OSC 66) --------------------------------------------------
    fn apply_multicell_command(&mut self, _payload: Payload<'_>) {}
}

/// Which wire spelling of pending mode triggered [`Screen::pause_rendering`]:
/// `CSI ? 2026 h/l` or `DCS = 1 s` / `DCS = 2 s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingToken {
    Csi,
    Dcs,
}

/// A `Screen` that discards every call. Useful for fuzzing the parser itself,
/// for benchmarks, and as the default in tests that only care about a
/// sub-slice of dispatched operations (pair with a recording wrapper).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullScreen;

impl Screen for NullScreen {}

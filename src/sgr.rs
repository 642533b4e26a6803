//! SGR / DECCARA parameter-run decoding.
//!
//! Grounded in `rio-backend`'s `attrs_from_sgr_parameters` and
//! `parse_sgr_color`/`handle_colon_rgb` helpers
//! (`performer/handler.rs`), which already walk a `ParamsIter` distinguishing
//! the colon (sub-parameter) and semicolon (legacy) spellings of `38`/`48`
//! color parameters. This module generalises that into a pure function,
//! `parse_sgr(params, is_deccara) -> (Option<Region>, Vec<SgrGroup>,
//! Option<ParseError>)`, with no `Screen` dependency, so the re-entrant
//! call path `rio-backend`'s cross-file design has (`Screen` calling back
//! into the SGR parser mid-dispatch) cannot occur here.
//!
//! Parameters already joined with `:` arrive pre-grouped (the
//! [`crate::csi::ParsedCsi::sub_param`] bit set by [`crate::csi`]); this
//! module's job is purely to additionally fold the *legacy*, semicolon-joined
//! spelling of an extended color (`38;2;r;g;b`, `38;5;idx`) into the same
//! grouped shape, so [`crate::screen::Screen::apply_sgr`] never has to care
//! which spelling produced a given group.

use crate::csi::ParsedCsi;
use crate::report::ParseError;
use crate::screen::Region;

/// One flush of [`crate::screen::Screen::apply_sgr`]: a batch of SGR
/// parameters plus whether they arrived as one colon-joined sub-parameter
/// run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SgrGroup {
    pub params: Vec<i32>,
    pub is_sub_group: bool,
}

/// Splits `csi.params` into top-level groups using `csi.sub_param`: a new
/// group starts at every index where `sub_param[i]` is false (or `i == 0`);
/// subsequent `true` entries are absorbed into the current group. This is the
/// "superparam" shape `;` and `:` jointly describe — `38:2::10:20:30` is one
/// group of five, `38;2;10;20;30` is five groups of one.
fn group_by_subparam(csi: &ParsedCsi) -> Vec<Vec<i32>> {
    let mut groups: Vec<Vec<i32>> = Vec::new();
    for (i, &value) in csi.params.iter().enumerate() {
        let starts_new = i == 0 || !csi.sub_param[i];
        if starts_new {
            groups.push(vec![value]);
        } else if let Some(last) = groups.last_mut() {
            last.push(value);
        }
    }
    groups
}

/// Extracts the DECCARA rectangle (`Pt;Pl;Pb;Pr`) from the first four
/// top-level groups, leaving the remainder for SGR parsing. Absent
/// coordinates default to `0`, which `Screen` implementations treat as "use
/// the current selection/full screen", matching how every other CSI default
/// in §4.7 is "no parameter given".
fn take_region(groups: &[Vec<i32>]) -> (Region, &[Vec<i32>]) {
    let get = |i: usize| groups.get(i).and_then(|g| g.first()).copied().unwrap_or(0);
    let region = Region {
        top: get(0),
        left: get(1),
        bottom: get(2),
        right: get(3),
    };
    let rest = if groups.len() >= 4 {
        &groups[4..]
    } else {
        &[]
    };
    (region, rest)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    /// Saw a bare `38`/`48`/`58`; waiting for the legacy `;`-separated format
    /// selector.
    Color { base: i32 },
    /// Format selector `5` seen; waiting for one more legacy param.
    Color1 { base: i32 },
    /// Format selector `2` seen; waiting for three more legacy params.
    Color3 { base: i32, collected: Vec<i32> },
}

/// `true` for the three parameter values that open an extended-color
/// sub-run: foreground (`38`), background (`48`), and underline/decoration
/// color (`58`).
fn opens_color_run(value: i32) -> bool {
    matches!(value, 38 | 48 | 58)
}

/// Parses one SGR (`m`) or DECCARA (`$r`) parameter list into the batched
/// groups `Screen::apply_sgr` expects, per §4.5's `{Normal, SubParams, Color,
/// Color1, Color3}` state machine — `SubParams` needs no state here because
/// [`group_by_subparam`] already performs that folding up front.
///
/// Returns `(region, groups, error)`: `region` is `None` unless
/// `is_deccara`; `error` is `Some` exactly when an unknown color sub-type
/// aborted the whole sequence partway (the groups flushed before the abort
/// are still returned, matching "Each flush calls Screen's apply_sgr" — a
/// partial application is the documented behaviour for this error, not a
/// rollback).
pub fn parse_sgr(
    csi: &ParsedCsi,
    is_deccara: bool,
) -> (Option<Region>, Vec<SgrGroup>, Option<ParseError<'static>>) {
    let all_groups = group_by_subparam(csi);
    let (region, groups) = if is_deccara {
        let (region, rest) = take_region(&all_groups);
        (Some(region), rest)
    } else {
        (None, &all_groups[..])
    };

    let mut out = Vec::with_capacity(groups.len());
    let mut state = State::Normal;
    let mut error = None;

    for group in groups {
        // A group with more than one value already arrived colon-joined;
        // per §4.5 it is re-emitted as a single sub-group without entering
        // the legacy Color/Color1/Color3 states.
        if group.len() > 1 {
            out.push(SgrGroup {
                params: group.clone(),
                is_sub_group: true,
            });
            state = State::Normal;
            continue;
        }
        let value = group[0];

        state = match state {
            State::Normal => {
                if opens_color_run(value) {
                    State::Color { base: value }
                } else {
                    out.push(SgrGroup {
                        params: vec![value],
                        is_sub_group: false,
                    });
                    State::Normal
                }
            }
            State::Color { base } => match value {
                5 => State::Color1 { base },
                2 => State::Color3 {
                    base,
                    collected: Vec::with_capacity(3),
                },
                other => {
                    error = Some(ParseError::InvalidSgrColorType { kind: other as u16 });
                    break;
                }
            },
            State::Color1 { base } => {
                out.push(SgrGroup {
                    params: vec![base, 5, value],
                    is_sub_group: false,
                });
                State::Normal
            }
            State::Color3 { base, mut collected } => {
                collected.push(value);
                if collected.len() == 3 {
                    let mut params = vec![base, 2];
                    params.extend(collected);
                    out.push(SgrGroup {
                        params,
                        is_sub_group: false,
                    });
                    State::Normal
                } else {
                    State::Color3 { base, collected }
                }
            }
        };
    }

    (region, out, error)
}

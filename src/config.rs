//! Tunables for the parser, gathered in one place.
//!
//! None of this is a file format — the crate has no on-disk configuration of
//! its own. `ParserConfig` is a plain struct with a `Default` impl carrying
//! the documented defaults, plus a small builder in the style this
//! workspace's own config crate favors: explicit `with_*` setters rather than
//! a derive-heavy builder macro.

use core::time::Duration;

/// Capacity of the shared byte buffer, absent an explicit override.
pub const BUF_SZ: usize = 1024 * 1024;

/// Alignment padding appended past `BUF_SZ` so a vectorised scan (memchr,
/// simdutf8) may read past the logical tail without bounds-checking every
/// lane.
pub const BUF_EXTRA: usize = 64;

/// Default ceiling on OSC/DCS/APC/PM/SOS payload length: a quarter of the
/// buffer, so one pathological escape code cannot starve ordinary input.
pub const DEFAULT_MAX_ESCAPE_CODE_LENGTH: usize = BUF_SZ / 4;

/// Default ceiling on the number of `;`/`:`-separated CSI parameters.
pub const DEFAULT_MAX_CSI_PARAMETERS: usize = 256;

/// Default ceiling on the number of decimal digits in a single CSI parameter.
pub const DEFAULT_MAX_CSI_DIGITS: usize = 16;

/// Default synchronized-update ("pending mode") hold time.
pub const DEFAULT_PENDING_WAIT_TIME: Duration = Duration::from_millis(2_000);

/// Default lower bound `ParserCore::parse` waits for more input before
/// flushing a partially-filled buffer.
pub const DEFAULT_INPUT_DELAY: Duration = Duration::from_millis(1);

/// Tunables consulted by [`crate::parser::ParserCore`] and its collaborators.
///
/// Every field has a documented default (see the `DEFAULT_*` constants in
/// this module); construct with [`ParserConfig::new`] and adjust with the
/// `with_*` builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    pending_wait_time: Duration,
    input_delay: Duration,
    max_escape_code_length: usize,
    max_csi_parameters: usize,
    max_csi_digits: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            pending_wait_time: DEFAULT_PENDING_WAIT_TIME,
            input_delay: DEFAULT_INPUT_DELAY,
            max_escape_code_length: DEFAULT_MAX_ESCAPE_CODE_LENGTH,
            max_csi_parameters: DEFAULT_MAX_CSI_PARAMETERS,
            max_csi_digits: DEFAULT_MAX_CSI_DIGITS,
        }
    }
}

impl ParserConfig {
    /// Defaults matching the values above.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pending_wait_time(mut self, wait_time: Duration) -> Self {
        self.pending_wait_time = wait_time;
        self
    }

    pub fn with_input_delay(mut self, delay: Duration) -> Self {
        self.input_delay = delay;
        self
    }

    pub fn with_max_escape_code_length(mut self, max: usize) -> Self {
        self.max_escape_code_length = max;
        self
    }

    pub fn with_max_csi_parameters(mut self, max: usize) -> Self {
        self.max_csi_parameters = max;
        self
    }

    pub fn with_max_csi_digits(mut self, max: usize) -> Self {
        self.max_csi_digits = max;
        self
    }

    pub fn pending_wait_time(&self) -> Duration {
        self.pending_wait_time
    }

    pub fn input_delay(&self) -> Duration {
        self.input_delay
    }

    pub fn max_escape_code_length(&self) -> usize {
        self.max_escape_code_length
    }

    pub fn max_csi_parameters(&self) -> usize {
        self.max_csi_parameters
    }

    pub fn max_csi_digits(&self) -> usize {
        self.max_csi_digits
    }
}

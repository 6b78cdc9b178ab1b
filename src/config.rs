//! Runtime knobs of the interpreter.
//!
//! Defaults reproduce the classic behaviour; the binary maps its command-line
//! flags onto these structs.

/// Longest accepted input line, newline excluded.
pub const MAX_LINE_LENGTH: usize = 512;

/// What happens to the rest of a line when a `>` target already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExistingTargetPolicy {
    /// Report and drop every remaining segment of the line.
    #[default]
    AbortLine,
    /// Report and continue with the next segment, like any other error.
    SkipSegment,
}

/// Rules whose classic behaviour is surprising, kept switchable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    pub existing_target: ExistingTargetPolicy,
    /// When a line holds several `;`-separated commands, `cd` may be given
    /// extra arguments; only the first one is used.
    pub cd_multi_command_exemption: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            existing_target: ExistingTargetPolicy::AbortLine,
            cd_multi_command_exemption: true,
        }
    }
}

/// Interpreter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Lines longer than this are echoed and rejected.
    pub max_line_length: usize,
    /// Print every non-blank line before running it (batch mode).
    pub echo_lines: bool,
    pub policy: Policy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_line_length: MAX_LINE_LENGTH,
            echo_lines: false,
            policy: Policy::default(),
        }
    }
}

impl Config {
    /// Configuration for running a batch file.
    pub fn batch() -> Self {
        Self {
            echo_lines: true,
            ..Self::default()
        }
    }
}

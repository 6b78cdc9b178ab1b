//! Error types of the interpreter.
//!
//! Every failure the user can see is reported with the same text,
//! [`ERROR_MESSAGE`], written to standard output. The variants below carry the
//! detail that only ends up in the logs.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// The one message printed for every failure.
pub const ERROR_MESSAGE: &str = "An error has occurred\n";

/// Malformed command text. Always skips the offending segment only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// More than one `>` / `>+` operator in a single command.
    #[error("more than one output redirection in a command")]
    MultipleRedirection,
    /// The command consists of nothing but a redirection operator.
    #[error("redirection operator without command or target")]
    BareRedirection,
    /// `cmd >` with nothing after the operator.
    #[error("redirection without a target file")]
    MissingTarget,
    /// `> file` with nothing before the operator.
    #[error("redirection without a command")]
    MissingCommand,
    /// `cd`, `pwd` or `exit` combined with a redirection.
    #[error("builtin `{0}` cannot be redirected")]
    BuiltinRedirection(&'static str),
    /// Wrong arguments for a builtin.
    #[error("{0}")]
    BuiltinUsage(String),
}

/// Step of the append-preserving swap that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapStage {
    Capture,
    Copy,
    Remove,
    Rename,
}

impl fmt::Display for SwapStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            SwapStage::Capture => "reading captured output from",
            SwapStage::Copy => "copying previous content of",
            SwapStage::Remove => "removing",
            SwapStage::Rename => "renaming staging file onto",
        };
        f.write_str(stage)
    }
}

/// Failure while running one segment.
///
/// Most variants are recoverable: the interpreter prints [`ERROR_MESSAGE`] and
/// moves on. [`ShellError::is_fatal`] singles out the ones that end the session.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("redirection target `{}` already exists", .0.display())]
    TargetExists(PathBuf),

    #[error("cd: HOME is not set")]
    HomeNotSet,

    #[error("cd: can't chdir to {}: {source}", .path.display())]
    ChangeDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("pwd: can't read the current directory: {0}")]
    CurrentDir(#[source] io::Error),

    #[error("command not found: {0}")]
    NotFound(String),

    #[error("can't open redirection target {}: {source}", .path.display())]
    OpenTarget {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` did not exit normally: {status}")]
    AbnormalExit { program: String, status: ExitStatus },

    #[error("append swap failed while {stage} {}: {source}", .path.display())]
    Swap {
        stage: SwapStage,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write to standard output: {0}")]
    Output(#[from] io::Error),
}

impl ShellError {
    /// Errors after which the interpreter can't safely continue.
    ///
    /// A failed swap may leave the redirection target half written, and a
    /// broken standard output means nothing can be reported anymore.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ShellError::Swap { .. } | ShellError::Output(_))
    }
}

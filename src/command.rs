use crate::builtin::BuiltinVerdict;
use crate::error::ParseError;
use std::path::PathBuf;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// Program name followed by its arguments. Never empty, no element contains
/// whitespace.
pub type ArgumentVector = Vec<String>;

/// How a redirection target receives the program's standard output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    /// `>`: the target is created and must not exist beforehand.
    Overwrite,
    /// `>+`: output goes after the target's existing content; the target is
    /// created if missing.
    AppendPreserving,
}

/// Where the standard output of one launch goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectionSpec {
    pub target: PathBuf,
    pub mode: RedirectMode,
}

/// A segment after classification; consumed once by the interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Nothing but whitespace.
    Empty,
    /// `cd`, `pwd` or `exit` with valid arguments.
    Builtin(BuiltinVerdict),
    /// External program with its output redirected.
    Redirected {
        argv: ArgumentVector,
        redirect: RedirectionSpec,
    },
    /// External program writing to the interpreter's standard output.
    Plain(ArgumentVector),
    /// The segment can't be run.
    Invalid(ParseError),
}

/// What the session does after a segment or a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Go on with the next segment.
    Continue,
    /// Skip the remaining segments of the current line.
    AbortLine,
    /// Terminate the interpreter with status 0.
    Exit,
}

//! A small command-line interpreter.
//!
//! Input lines are split on `;` into commands that run strictly one after
//! another. `cd`, `pwd` and `exit` are built in; anything else is launched as
//! a child process, optionally with its standard output redirected:
//!
//! - `cmd > file` writes to `file`, which must not exist yet;
//! - `cmd >+ file` appends to `file`, keeping its previous content.
//!
//! Every failure prints the same line, `An error has occurred`, on standard
//! output.
//!
//! The main entry point is [`Interpreter`], fed by a [`source::LineSource`].

mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
mod external;
mod interpreter;
pub mod lexer;
pub mod logging;
pub mod parser;
mod redirect;
pub mod source;

#[cfg(test)]
mod test_support;

pub use builtin::BuiltinVerdict;
pub use command::Flow;
pub use error::{ERROR_MESSAGE, ParseError, ShellError};
/// Just a convenient re-export of the command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;

use crate::command::Flow;
use crate::env::Environment;
use crate::error::ShellError;
use argh::{EarlyExit, FromArgs};
use std::io::Write;
use std::path::PathBuf;

/// Outcome of looking at a command's words for a builtin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuiltinVerdict {
    /// First word is not `cd`, `pwd` or `exit`.
    NotBuiltin,
    Exit,
    Pwd,
    /// `cd` with an optional target; `None` means `$HOME`.
    Cd(Option<String>),
    /// A builtin called with arguments it doesn't accept.
    BuiltinError(String),
}

/// Built-in commands known to the shell at compile time.
///
/// Arguments are validated with the [`argh`] crate (`FromArgs`); the commands
/// run in-process without spawning a child.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "pwd" or "cd".
    fn name() -> &'static str;

    /// The verdict for a successfully parsed invocation.
    fn into_verdict(self) -> BuiltinVerdict;

    /// Executes the command, writing any output to `stdout`.
    fn execute(self, stdout: &mut dyn Write, env: &Environment) -> Result<Flow, ShellError>;
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn into_verdict(self) -> BuiltinVerdict {
        BuiltinVerdict::Pwd
    }

    fn execute(self, stdout: &mut dyn Write, env: &Environment) -> Result<Flow, ShellError> {
        let cwd = env.current_dir().map_err(ShellError::CurrentDir)?;
        #[cfg(unix)]
        {
            use std::os::unix::ffi::OsStrExt;
            stdout.write_all(cwd.as_os_str().as_bytes())?;
            stdout.write_all(b"\n")?;
        }
        #[cfg(not(unix))]
        writeln!(stdout, "{}", cwd.display())?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory. Defaults to $HOME when omitted.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn into_verdict(self) -> BuiltinVerdict {
        BuiltinVerdict::Cd(self.target)
    }

    fn execute(self, _stdout: &mut dyn Write, env: &Environment) -> Result<Flow, ShellError> {
        let target = match self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => match env.get_var("HOME") {
                Some(home) => PathBuf::from(home),
                None => return Err(ShellError::HomeNotSet),
            },
        };

        env.set_current_dir(&target)
            .map_err(|source| ShellError::ChangeDir {
                path: target,
                source,
            })?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Exit the shell process.
pub struct Exit {}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn into_verdict(self) -> BuiltinVerdict {
        BuiltinVerdict::Exit
    }

    fn execute(self, _stdout: &mut dyn Write, _env: &Environment) -> Result<Flow, ShellError> {
        Ok(Flow::Exit)
    }
}

/// Canonical name of the builtin invoked by `word`, if it is one.
pub fn builtin_name(word: &str) -> Option<&'static str> {
    [Exit::name(), Pwd::name(), Cd::name()]
        .into_iter()
        .find(|name| *name == word)
}

fn judge_as<T: BuiltinCommand>(args: &[&str]) -> BuiltinVerdict {
    match T::from_args(&[T::name()], args) {
        Ok(cmd) => cmd.into_verdict(),
        Err(EarlyExit { output, .. }) => BuiltinVerdict::BuiltinError(output.trim_end().to_string()),
    }
}

/// Decide whether `argv` invokes a builtin and whether its arguments are legal.
///
/// `exit` and `pwd` take no arguments. `cd` takes at most one, except that
/// with `cd_exemption` set (a segment of a multi-command line) any extra
/// arguments are ignored.
pub fn judge(argv: &[&str], cd_exemption: bool) -> BuiltinVerdict {
    let Some((&name, args)) = argv.split_first() else {
        return BuiltinVerdict::NotBuiltin;
    };
    match builtin_name(name) {
        Some("exit") => judge_as::<Exit>(args),
        Some("pwd") => judge_as::<Pwd>(args),
        Some("cd") => {
            let args = if cd_exemption {
                &args[..args.len().min(1)]
            } else {
                args
            };
            // "--" keeps directory names starting with '-' positional
            let mut cd_args = Vec::with_capacity(args.len() + 1);
            cd_args.push("--");
            cd_args.extend_from_slice(args);
            judge_as::<Cd>(&cd_args)
        }
        _ => BuiltinVerdict::NotBuiltin,
    }
}

impl BuiltinVerdict {
    /// Run a valid builtin.
    ///
    /// `NotBuiltin` is a no-op; `BuiltinError` is reported as a usage error.
    pub(crate) fn execute(
        self,
        stdout: &mut dyn Write,
        env: &Environment,
    ) -> Result<Flow, ShellError> {
        match self {
            BuiltinVerdict::Exit => Exit {}.execute(stdout, env),
            BuiltinVerdict::Pwd => Pwd {}.execute(stdout, env),
            BuiltinVerdict::Cd(target) => Cd { target }.execute(stdout, env),
            BuiltinVerdict::BuiltinError(detail) => {
                Err(crate::error::ParseError::BuiltinUsage(detail).into())
            }
            BuiltinVerdict::NotBuiltin => Ok(Flow::Continue),
        }
    }
}

use crate::command::{ArgumentVector, ExitCode, RedirectionSpec};
use crate::env::Environment;
use crate::error::ShellError;
use crate::redirect;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tracing::debug;

/// Search path used when `PATH` is not set.
const DEFAULT_PATH: &str = "/usr/local/bin:/usr/bin:/bin";

/// Command that is not a builtin.
#[derive(Debug)]
pub struct ExternalCommand {
    program: PathBuf,
    argv: ArgumentVector,
}

impl ExternalCommand {
    /// Locate the program named by `argv[0]`.
    pub fn resolve(argv: ArgumentVector, env: &Environment) -> Result<Self, ShellError> {
        let Some(name) = argv.first() else {
            return Err(ShellError::NotFound(String::new()));
        };
        let search_paths = env
            .get_var("PATH")
            .unwrap_or_else(|| DEFAULT_PATH.to_string());
        let program = find_command_path(OsStr::new(&search_paths), Path::new(name))
            .map(Cow::into_owned)
            .ok_or_else(|| ShellError::NotFound(name.clone()))?;
        Ok(Self { program, argv })
    }

    fn name(&self) -> String {
        self.argv.first().cloned().unwrap_or_default()
    }

    /// Spawn the program and block until it terminates.
    ///
    /// A non-zero exit code is a normal outcome; only a child that did not
    /// exit on its own (e.g. killed by a signal) is an error.
    pub fn run(&self, stdout: Stdio, env: &Environment) -> Result<ExitCode, ShellError> {
        let mut cmd = std::process::Command::new(&self.program);
        cmd.args(self.argv.iter().skip(1))
            .stdin(Stdio::inherit())
            .stdout(stdout)
            .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.arg0(self.name());
        }

        let mut child = cmd.spawn().map_err(|source| ShellError::Spawn {
            program: self.name(),
            source,
        })?;
        debug!(program = %self.program.display(), pid = child.id(), "spawned");

        let exit_status = child.wait().map_err(|source| ShellError::Wait {
            program: self.name(),
            source,
        })?;
        match exit_status.code() {
            Some(code) => Ok(code),
            None => {
                debug!(code = terminated_by_signal(exit_status), "child terminated abnormally");
                Err(ShellError::AbnormalExit {
                    program: self.name(),
                    status: exit_status,
                })
            }
        }
    }
}

/// Launch `argv`, with its output optionally redirected, and wait for it.
///
/// For `>` the target is checked before anything else happens, so an
/// existing file is reported even when the program doesn't exist. For `>+`
/// the swap runs only after a normal exit; otherwise the captured output is
/// thrown away.
pub(crate) fn execute(
    argv: ArgumentVector,
    redirect: Option<&RedirectionSpec>,
    env: &Environment,
) -> Result<ExitCode, ShellError> {
    if let Some(spec) = redirect {
        redirect::check_target(spec)?;
    }
    let command = ExternalCommand::resolve(argv, env)?;

    let Some(spec) = redirect else {
        return command.run(Stdio::inherit(), env);
    };

    let prepared = redirect::open_output(spec)?;
    let result = command.run(Stdio::from(prepared.file), env);
    match (result, prepared.swap) {
        (Ok(code), Some(swap)) => {
            swap.commit()?;
            Ok(code)
        }
        (Err(err), Some(swap)) => {
            swap.discard();
            Err(err)
        }
        (result, None) => result,
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    exit_status.signal().map_or(-1, |signal| 128 + signal)
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - Relative with multiple components (e.g., `bin/sh`): returns it if it exists.
/// - `./foo` on Unix or any `./`-prefixed path on other platforms: returns it if it exists.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   and return the first existing match.
/// - Empty path: returns `None`.
///
/// Returns either a borrowed reference to the provided `path` or an owned `PathBuf`
/// when the result is discovered via PATH lookup.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let search_in_current_dir = cfg!(not(unix)) || path.starts_with("./");
    if search_in_current_dir && path.is_file() {
        return Some(Cow::Borrowed(path));
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (None, None) => None,
        // Single component -> search in PATH
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        // Multiple components -> relative to the current dir
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|path| find_by_path(path).is_some())
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.is_file() { Some(path) } else { None }
}

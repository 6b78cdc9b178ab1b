use crate::command::{ArgumentVector, Command, Flow, RedirectionSpec};
use crate::config::{Config, ExistingTargetPolicy};
use crate::env::Environment;
use crate::error::{ERROR_MESSAGE, ShellError};
use crate::external;
use crate::lexer;
use crate::parser::{self, Segment};
use crate::source::{Line, LineSource};
use std::io::Write;
use tracing::{debug, error};

/// A minimal command-line interpreter.
///
/// Lines are split into `;`-separated segments that run one after another:
/// builtins in-process, everything else as a child process the interpreter
/// waits for. Whatever goes wrong in a segment is reported on `out` with
/// [`ERROR_MESSAGE`].
///
/// Example
/// ```
/// use shell_interpreter::{Flow, Interpreter};
/// use shell_interpreter::config::Config;
///
/// let mut sh = Interpreter::new(Config::default(), Vec::new());
/// assert_eq!(sh.run_line("exit now").unwrap(), Flow::Continue);
/// assert_eq!(sh.into_output(), b"An error has occurred\n");
/// ```
pub struct Interpreter<W: Write> {
    env: Environment,
    config: Config,
    out: W,
}

impl<W: Write> Interpreter<W> {
    /// Create an interpreter writing its own output to `out`.
    pub fn new(config: Config, out: W) -> Self {
        Self::with_environment(config, Environment::new(), out)
    }

    pub fn with_environment(config: Config, env: Environment, out: W) -> Self {
        Self { env, config, out }
    }

    /// Consume the interpreter, returning its output sink.
    pub fn into_output(self) -> W {
        self.out
    }

    /// Read and run lines until input ends or `exit` runs.
    ///
    /// Returns an error only for failures that end the session: a broken
    /// line source or a fatal [`ShellError`].
    pub fn run(&mut self, source: &mut dyn LineSource) -> anyhow::Result<()> {
        loop {
            let prompt = self.prompt();
            let Some(line) = source.next_line(&prompt)? else {
                debug!("end of input");
                return Ok(());
            };
            if self.run_input(line)? == Flow::Exit {
                debug!("exit requested");
                return Ok(());
            }
        }
    }

    fn prompt(&self) -> String {
        match self.env.current_dir() {
            Ok(cwd) => format!("{}$ ", cwd.display()),
            Err(_) => "$ ".to_string(),
        }
    }

    /// Run one line handed over by a [`LineSource`].
    pub fn run_input(&mut self, line: Line) -> Result<Flow, ShellError> {
        match line {
            Line::Text(text) => self.run_line(&text),
            Line::Overlong(text) => {
                debug!(len = text.len(), "rejecting overlong line");
                self.out.write_all(text.as_bytes())?;
                self.out.write_all(b"\n")?;
                self.out.write_all(ERROR_MESSAGE.as_bytes())?;
                self.out.flush()?;
                Ok(Flow::Continue)
            }
        }
    }

    /// Run every segment of `line` in order.
    ///
    /// Returns [`Flow::Exit`] if a segment ran `exit`; an aborted line is
    /// reported as [`Flow::Continue`] since the session goes on.
    pub fn run_line(&mut self, line: &str) -> Result<Flow, ShellError> {
        if self.config.echo_lines && !lexer::is_blank(line) {
            self.out.write_all(line.as_bytes())?;
            if !line.ends_with('\n') {
                self.out.write_all(b"\n")?;
            }
        }

        for segment in parser::split_commands(line) {
            match self.run_segment(&segment)? {
                Flow::Continue => {}
                Flow::AbortLine => {
                    debug!(index = segment.index, "dropping the rest of the line");
                    break;
                }
                Flow::Exit => {
                    self.out.flush()?;
                    return Ok(Flow::Exit);
                }
            }
        }
        self.out.flush()?;
        Ok(Flow::Continue)
    }

    /// Classify and run a single segment.
    ///
    /// Recoverable errors are reported here and turned into a [`Flow`]. A
    /// fatal error is reported too, then returned.
    pub fn run_segment(&mut self, segment: &Segment<'_>) -> Result<Flow, ShellError> {
        let command = parser::classify(segment, &self.config.policy);
        debug!(
            index = segment.index,
            offset = segment.offset,
            ?command,
            "classified segment"
        );

        match self.dispatch(command) {
            Ok(flow) => Ok(flow),
            Err(err) if err.is_fatal() => {
                error!(%err, "fatal error");
                let _ = self.report();
                Err(err)
            }
            Err(err @ ShellError::TargetExists(_)) => {
                debug!(%err, "segment failed");
                self.report()?;
                Ok(match self.config.policy.existing_target {
                    ExistingTargetPolicy::AbortLine => Flow::AbortLine,
                    ExistingTargetPolicy::SkipSegment => Flow::Continue,
                })
            }
            Err(err) => {
                debug!(%err, "segment failed");
                self.report()?;
                Ok(Flow::Continue)
            }
        }
    }

    fn dispatch(&mut self, command: Command) -> Result<Flow, ShellError> {
        match command {
            Command::Empty => Ok(Flow::Continue),
            Command::Invalid(err) => Err(err.into()),
            Command::Builtin(verdict) => verdict.execute(&mut self.out, &self.env),
            Command::Plain(argv) => self.launch(argv, None),
            Command::Redirected { argv, redirect } => self.launch(argv, Some(&redirect)),
        }
    }

    fn launch(
        &mut self,
        argv: ArgumentVector,
        redirect: Option<&RedirectionSpec>,
    ) -> Result<Flow, ShellError> {
        // children write straight to the inherited stdout
        self.out.flush()?;
        let code = external::execute(argv, redirect, &self.env)?;
        debug!(code, "child exited");
        Ok(Flow::Continue)
    }

    fn report(&mut self) -> Result<(), ShellError> {
        self.out.write_all(ERROR_MESSAGE.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Policy;
    use crate::source::BatchSource;
    use crate::test_support::{lock_current_dir, make_unique_temp_dir};
    use std::env as stdenv;
    use std::fs;
    use std::io::Cursor;
    use std::path::Path;

    fn interpreter() -> Interpreter<Vec<u8>> {
        Interpreter::new(Config::default(), Vec::new())
    }

    fn output(sh: Interpreter<Vec<u8>>) -> String {
        String::from_utf8(sh.into_output()).unwrap()
    }

    fn errors(n: usize) -> String {
        ERROR_MESSAGE.repeat(n)
    }

    #[test]
    fn test_pwd_cd_pwd_scenario() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let temp = make_unique_temp_dir("scenario").unwrap();
        let canonical = fs::canonicalize(&temp).unwrap();

        let mut sh = interpreter();
        let line = format!("pwd; cd {}; pwd\n", canonical.display());
        let flow = sh.run_line(&line);
        stdenv::set_current_dir(&orig).expect("failed to restore cwd");

        assert_eq!(flow.unwrap(), Flow::Continue);
        assert_eq!(
            output(sh),
            format!("{}\n{}\n", orig.display(), canonical.display())
        );
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_bare_cd_goes_home() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let temp = make_unique_temp_dir("home").unwrap();
        let canonical = fs::canonicalize(&temp).unwrap();

        let mut env = Environment::new();
        env.set_var("HOME", canonical.to_string_lossy());
        let mut sh = Interpreter::with_environment(Config::default(), env, Vec::new());
        let flow = sh.run_line("cd\n");
        let after = stdenv::current_dir().unwrap();
        stdenv::set_current_dir(&orig).expect("failed to restore cwd");

        assert_eq!(flow.unwrap(), Flow::Continue);
        assert_eq!(fs::canonicalize(after).unwrap(), canonical);
        assert_eq!(output(sh), "");
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_unknown_program_reports_once_and_continues() {
        let mut sh = interpreter();
        assert_eq!(sh.run_line("lsxyz\n").unwrap(), Flow::Continue);
        assert_eq!(sh.run_line("   \n").unwrap(), Flow::Continue);
        assert_eq!(output(sh), errors(1));
    }

    #[test]
    fn test_exit_with_argument_does_not_terminate() {
        let mut sh = interpreter();
        assert_eq!(sh.run_line("exit now\n").unwrap(), Flow::Continue);
        assert_eq!(output(sh), errors(1));
    }

    #[test]
    fn test_exit_abandons_remaining_segments() {
        let mut sh = interpreter();
        assert_eq!(sh.run_line("exit; pwd\n").unwrap(), Flow::Exit);
        assert_eq!(output(sh), "");
    }

    #[test]
    fn test_blank_segments_are_silent() {
        let mut sh = interpreter();
        assert_eq!(sh.run_line(";; ;\t;\n").unwrap(), Flow::Continue);
        assert_eq!(output(sh), "");
    }

    #[test]
    fn test_builtin_with_redirection_never_runs() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();

        let mut sh = interpreter();
        let flow = sh.run_line("cd / > out.txt\n");
        let after = stdenv::current_dir().unwrap();
        stdenv::set_current_dir(&orig).expect("failed to restore cwd");

        assert_eq!(flow.unwrap(), Flow::Continue);
        assert_eq!(after, orig);
        assert!(!Path::new("out.txt").exists());
        assert_eq!(output(sh), errors(1));
    }

    #[test]
    fn test_each_bad_segment_reports_independently() {
        let mut sh = interpreter();
        sh.run_line("> ; ls > a > b; pwd x; exit 1\n").unwrap();
        assert_eq!(output(sh), errors(4));
    }

    #[test]
    fn test_existing_target_aborts_rest_of_line() {
        let dir = make_unique_temp_dir("abort").unwrap();
        let existing = dir.join("existing");
        fs::write(&existing, "original\n").unwrap();
        let later = dir.join("later.txt");

        let mut sh = interpreter();
        let line = format!(
            "echo hi > {}; echo later > {}\n",
            existing.display(),
            later.display()
        );
        assert_eq!(sh.run_line(&line).unwrap(), Flow::Continue);

        assert_eq!(output(sh), errors(1));
        assert_eq!(fs::read_to_string(&existing).unwrap(), "original\n");
        assert!(!later.exists());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_existing_target_can_skip_only_the_segment() {
        let dir = make_unique_temp_dir("skip").unwrap();
        let existing = dir.join("existing");
        fs::write(&existing, "original\n").unwrap();
        let later = dir.join("later.txt");

        let config = Config {
            policy: Policy {
                existing_target: ExistingTargetPolicy::SkipSegment,
                ..Policy::default()
            },
            ..Config::default()
        };
        let mut sh = Interpreter::new(config, Vec::new());
        let line = format!(
            "echo hi > {}; echo later > {}\n",
            existing.display(),
            later.display()
        );
        sh.run_line(&line).unwrap();

        assert_eq!(output(sh), errors(1));
        assert_eq!(fs::read_to_string(&existing).unwrap(), "original\n");
        assert_eq!(fs::read_to_string(&later).unwrap(), "later\n");
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_append_preserving_twice() {
        let dir = make_unique_temp_dir("append").unwrap();
        let target = dir.join("f");

        let mut sh = interpreter();
        let line = format!("echo B >+ {}\n", target.display());
        sh.run_line(&line).unwrap();
        sh.run_line(&line).unwrap();

        assert_eq!(output(sh), "");
        assert_eq!(fs::read_to_string(&target).unwrap(), "B\nB\n");
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_failed_append_swap_ends_the_session() {
        let dir = make_unique_temp_dir("swap_fatal").unwrap();
        let target = dir.join("sub");
        fs::create_dir(&target).unwrap();
        let after = dir.join("after.txt");

        let mut sh = interpreter();
        let line = format!(
            "echo x >+ {}; echo after > {}\n",
            target.display(),
            after.display()
        );
        let err = sh.run_line(&line).unwrap_err();

        assert!(matches!(err, ShellError::Swap { .. }));
        assert!(err.is_fatal());
        assert_eq!(output(sh), errors(1));
        assert!(!after.exists());
        assert!(target.is_dir());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_overlong_line_is_echoed_and_rejected() {
        let mut sh = interpreter();
        let long = format!("echo {}", "a".repeat(600));
        assert_eq!(
            sh.run_input(Line::Overlong(long.clone())).unwrap(),
            Flow::Continue
        );
        assert_eq!(output(sh), format!("{}\n{}", long, ERROR_MESSAGE));
    }

    #[test]
    fn test_batch_mode_echoes_lines() {
        let mut sh = Interpreter::new(Config::batch(), Vec::new());
        let mut source = BatchSource::new(Cursor::new("\nexit now\n  \nexit\npwd\n"), 512);
        sh.run(&mut source).unwrap();
        assert_eq!(
            output(sh),
            format!("exit now\n{}exit\n", ERROR_MESSAGE)
        );
    }

    #[test]
    fn test_run_stops_at_end_of_input() {
        let mut sh = interpreter();
        let mut source = BatchSource::new(Cursor::new("lsxyz\nlsxyz"), 512);
        sh.run(&mut source).unwrap();
        assert_eq!(output(sh), errors(2));
    }
}

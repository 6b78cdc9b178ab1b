use argh::{EarlyExit, FromArgs};
use shell_interpreter::config::{Config, ExistingTargetPolicy, MAX_LINE_LENGTH};
use shell_interpreter::source::{BatchSource, InteractiveSource};
use shell_interpreter::{ERROR_MESSAGE, Interpreter, logging};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(FromArgs)]
/// Run commands typed at the terminal, or read from a batch file.
struct Args {
    #[argh(positional)]
    /// file to read commands from; reads from the terminal when omitted.
    batch_file: Option<PathBuf>,

    #[argh(option, default = "MAX_LINE_LENGTH")]
    /// longest accepted line in bytes, newline excluded.
    max_line_length: usize,

    #[argh(switch)]
    /// when a `>` target already exists, skip only that command instead of the rest of the line.
    skip_on_existing_target: bool,

    #[argh(switch)]
    /// reject extra `cd` arguments even on lines holding several commands.
    strict_cd: bool,
}

impl Args {
    fn config(&self) -> Config {
        let mut config = if self.batch_file.is_some() {
            Config::batch()
        } else {
            Config::default()
        };
        config.max_line_length = self.max_line_length;
        if self.skip_on_existing_target {
            config.policy.existing_target = ExistingTargetPolicy::SkipSegment;
        }
        config.policy.cd_multi_command_exemption = !self.strict_cd;
        config
    }
}

fn print_error() {
    let mut stdout = io::stdout();
    let _ = stdout.write_all(ERROR_MESSAGE.as_bytes());
    let _ = stdout.flush();
}

fn parse_args() -> Result<Args, ExitCode> {
    let strings: Vec<String> = std::env::args().collect();
    let strs: Vec<&str> = strings.iter().map(String::as_str).collect();
    let (command, rest) = match strs.split_first() {
        Some((command, rest)) => (*command, rest),
        None => ("shell_interpreter", &[][..]),
    };

    match Args::from_args(&[command], rest) {
        Ok(args) => Ok(args),
        Err(EarlyExit {
            output,
            status: Ok(()),
        }) => {
            println!("{}", output);
            Err(ExitCode::SUCCESS)
        }
        Err(EarlyExit { output, .. }) => {
            tracing::error!(%output, "invalid arguments");
            print_error();
            Err(ExitCode::FAILURE)
        }
    }
}

fn main() -> ExitCode {
    logging::init_tracing();

    let args = match parse_args() {
        Ok(args) => args,
        Err(code) => return code,
    };
    let config = args.config();
    let max_line_length = config.max_line_length;
    let mut interpreter = Interpreter::new(config, io::stdout());

    let result = match &args.batch_file {
        Some(path) => match File::open(path) {
            Ok(file) => interpreter.run(&mut BatchSource::new(BufReader::new(file), max_line_length)),
            Err(err) => {
                tracing::error!(path = %path.display(), %err, "can't open batch file");
                print_error();
                return ExitCode::FAILURE;
            }
        },
        None => InteractiveSource::new(max_line_length)
            .and_then(|mut source| interpreter.run(&mut source)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

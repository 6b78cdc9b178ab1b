use tracing_subscriber::EnvFilter;

/// Variable holding the log filter, e.g. `debug` or `shell_interpreter=trace`.
pub const LOG_ENV: &str = "SHELL_INTERPRETER_LOG";

/// Initialize tracing on standard error.
///
/// Logging is disabled unless `SHELL_INTERPRETER_LOG` is set. Standard output
/// is never used since it carries the interpreter's own output.
pub fn init_tracing() {
    let Ok(directives) = std::env::var(LOG_ENV) else {
        return;
    };

    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .try_init();
}

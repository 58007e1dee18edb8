use localshell::config::{ShellConfig, DEFAULT_LOG_FILTER, LOG_VAR};
use std::process::ExitCode;

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter =
        EnvFilter::try_from_env(LOG_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();

    match localshell::run_shell(ShellConfig::from_env()) {
        // Statuses wrap modulo 256 like any process exit code.
        Ok(status) => ExitCode::from(status as u8),
        Err(err) => {
            eprintln!("localshell: {}", err);
            ExitCode::FAILURE
        }
    }
}

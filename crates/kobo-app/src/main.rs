use std::env;
use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::EnvFilter;

use kobo_app::config::ConfigError;
use kobo_app::{cli, AppError};

fn main() -> ExitCode {
    init_tracing();
    let args = env::args().skip(1).collect::<Vec<_>>();
    let result = cli::parse(&args)
        .map_err(AppError::from)
        .and_then(kobo_app::run);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if matches!(err, AppError::Config(ConfigError::Usage(_))) {
                eprintln!("{err}");
            } else {
                error!(error = %err, "kobo_failed");
            }
            ExitCode::from(err.exit_status())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

//! CLI binary for `task_reminders`.
//!
//! This binary is a thin wrapper that parses arguments and delegates to the
//! library.

use std::process::ExitCode;

use clap::Parser;
use task_reminders::cli::Cli;
use task_reminders::config::AppConfig;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = AppConfig::load_or_default(cli.config.as_deref())
        .map_or_else(|_| "info".to_string(), |config| config.log_level);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(std::io::stderr).init();

    let output = task_reminders::cli::run(cli);

    for msg in output.stdout {
        println!("{msg}");
    }
    for msg in output.stderr {
        eprintln!("{msg}");
    }

    output.exit_code
}

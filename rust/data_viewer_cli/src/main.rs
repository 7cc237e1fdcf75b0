#![forbid(unsafe_code)]

use std::process::ExitCode;

use clap::Parser;
use data_viewer_cli::{run_session, Cli};
use data_viewer_core::ViewerCore;
use tracing_subscriber::EnvFilter;

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = match cli.viewer_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let mut core = ViewerCore::with_config(config);

    if let Some(path) = &cli.file {
        if let Err(e) = core.load_file(path) {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    }

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    match run_session(&mut core, stdin.lock(), stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

//! `stmtwrap` binary: run one prepared statement and print the result.

use std::process::ExitCode;

use clap::Parser;
use stmtwrap_cli::args::{Cli, Invocation};
use stmtwrap_cli::{config, init_tracing, run};

fn resolve_config_path(explicit: Option<&str>) -> (String, &'static str) {
    if let Some(path) = explicit.filter(|value| !value.trim().is_empty()) {
        return (path.to_string(), "cli-arg");
    }

    if let Ok(path) = std::env::var("STMTWRAP_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (path, "env-var");
        }
    }

    ("stmtwrap.toml".to_string(), "default")
}

fn main() -> ExitCode {
    // Usage errors exit with status 2 from inside clap.
    let invocation = Invocation::from(Cli::parse());

    let (config_path, config_source) = resolve_config_path(invocation.config_path.as_deref());
    let config = match config::load_config(Some(&config_path)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("stmtwrap: {err}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.logging);

    tracing::info!(
        source = config_source,
        path = %config_path,
        mode = %config.wrapper.error_mode,
        "resolved startup configuration path"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match run(&config, &invocation, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "statement failed");
            eprintln!("stmtwrap: {err}");
            ExitCode::FAILURE
        }
    }
}

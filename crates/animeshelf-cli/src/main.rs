//! Animeshelf CLI - a terminal client for the animeshelf catalog.
//!
//! Runs an interactive shell whose lifetime is the session's lifetime: the
//! session cookies live in memory only, so every start begins
//! unauthenticated and probes the backend for a surviving session.

mod commands;

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use animeshelf_core::config::Config;
use animeshelf_core::AuthContext;

use commands::{Command, Shell};

/// Log file name inside the configured log directory
const LOG_FILE_NAME: &str = "animeshelf.log";

/// Open the log file inside `dir`, creating the directory if needed.
fn log_file_appender(dir: &Path) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE_NAME)
        .build(dir)
}

/// Initialize the tracing subscriber for logging.
///
/// The returned guard flushes the file writer and must be held until exit.
/// A log directory that cannot be used leaves logging on stderr only.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let mut file_error = None;
    let (file_layer, guard) = match log_dir.map(|dir| (dir, log_file_appender(dir))) {
        Some((_, Ok(appender))) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        Some((dir, Err(e))) => {
            file_error = Some((dir.display().to_string(), e));
            (None, None)
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    if let Some((dir, e)) = file_error {
        warn!(log_dir = %dir, error = %e, "File logging disabled");
    }

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config, using defaults: {}", e);
            Config::default()
        }
    };

    let _log_guard = init_tracing(config.log_dir.as_deref());
    info!(api = %config.api_base_url, "Animeshelf CLI starting");

    let context = AuthContext::from_config(&config)?;

    // A session cookie from an earlier run cannot survive a restart, but an
    // OAuth return or a shared cookie jar can; the probe settles it either way.
    if let Err(e) = context.actions.fetch_current_user().await {
        info!(error = %e, "No existing session");
    }

    let mut shell = Shell::new(context, config);
    let result = run_shell(&mut shell).await;

    info!("Animeshelf CLI shutting down");
    result
}

async fn run_shell(shell: &mut Shell) -> Result<()> {
    println!("animeshelf - type `help` for commands");
    let stdin = io::stdin();

    loop {
        print!("{}", shell.prompt());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF
            return Ok(());
        }

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        match shell.execute(command).await {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, "Command failed");
                println!("Error: {}", e);
            }
        }
    }
}

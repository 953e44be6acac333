use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod admin;
pub mod catalog;
pub mod checklist;
pub mod cli;
mod commands;
pub mod convert;
pub mod error;
pub mod storage;
pub mod util;

pub use error::{FailureClass, GuideError, Result};

const LOG_ENV: &str = "HEARTOPIA_LOG";

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_logging() {
    let default_level = "warn";
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(serde::Serialize)]
struct ErrorReport<'a> {
    error: &'a GuideError,
    class: FailureClass,
}

pub fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_logging();
    let json = cli.global.json;

    // One user action at a time; nothing here needs worker threads.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match runtime.block_on(commands::dispatch(cli)) {
        Ok(()) => Ok(()),
        Err(e) => {
            if json {
                let report = ErrorReport {
                    error: &e,
                    class: e.class(),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Err(e.into())
        }
    }
}

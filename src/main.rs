mod classify;
mod cli;
mod engine;
mod form;
mod logging;
mod model;
mod orchestrator;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the environment and flags still apply.
    let _ = dotenvy::dotenv();
    let args = cli::Cli::parse();

    let log_guard = match logging::init(args.log_file.as_deref(), args.is_interactive()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("warning: logging disabled: {e}");
            None
        }
    };

    match cli::run(args).await {
        Ok(true) => Ok(()),
        // The report or summary already describes the failure.
        Ok(false) => {
            // `exit` skips destructors; flush buffered log lines first.
            drop(log_guard);
            std::process::exit(1)
        }
        Err(e) => Err(e),
    }
}

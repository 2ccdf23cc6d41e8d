//! tincan chat endpoint binary.
//!
//! Runs the transport core with a minimal terminal front end: inbound
//! peers connect to the well-known port, outbound chat goes through
//! `/connect`, and delivered events are printed as they drain.

mod cli;
mod console;

use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Set up logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    tracing::info!("tincan node v{}", env!("CARGO_PKG_VERSION"));

    console::run(cli).await
}

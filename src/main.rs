//! smartsend - Entry point for the command line client

use clap::Parser;
use smartsend::app::Cli;
use smartsend::App;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(smartsend::app::render::log_writer)
        .init();

    let cli = Cli::parse();
    tracing::debug!(command = ?cli.command, "Starting smartsend");

    if let Err(e) = App::run(cli).await {
        tracing::error!("Application error: {:#}", e);
        std::process::exit(1);
    }
}

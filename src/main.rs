use clap::Parser;
use tally::cli::commands::Cli;
use tally::cli::handlers;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = handlers::dispatch(cli).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr; `RUST_LOG=tally=debug` shows index activity.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();
}

//! follower-ingest CLI
//!
//! Installs the log formatter, turns SIGINT/SIGTERM into cancellation and
//! maps the run outcome to the process exit status.

use clap::Parser;
use follower_ingest::cli::{cancel_on_signal, Cli, LogFormat, Runner};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_format, cli.verbose);

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    let runner = Runner::new(cli);
    match runner.run(cancel).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!(error = %e, "Ingestion aborted");
            std::process::exit(1);
        }
    }
}

/// Install the global subscriber; logs go to stderr so stdout stays clean
fn init_tracing(format: LogFormat, verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

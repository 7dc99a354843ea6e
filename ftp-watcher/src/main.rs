use anyhow::Result;
use clap::Parser;
use ftp_watcher::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // FTP_USER / FTP_PASSWORD may live in a local .env
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt::init();
    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "ftp-watcher stopped with an error");
        return Err(e);
    }
    Ok(())
}

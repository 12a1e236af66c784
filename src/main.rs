use clap::Parser;

mod analysis;
mod app;
mod cli;
mod config;
mod diet;
mod error;
mod pages;
mod profile;
mod state;
mod storage;
mod upload;

use crate::{cli::Cli, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "greenscan=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    // stdout carries command output
    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let cli = Cli::parse();
    let app_state = AppState::init().await?;
    tracing::debug!(
        server = %app_state.config.server_url,
        storage = %app_state.config.storage_path.display(),
        "starting"
    );

    app::run(app_state, cli.command).await
}

// server/src/main.rs
use anyhow::Result;
use clap::Parser;

use simrs_server::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    run(Cli::parse()).await
}

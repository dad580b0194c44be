// server/src/cli/commands.rs
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[clap(name = "simrs", version, about = "Hospital capacity and scheduling service")]
pub struct Cli {
    /// YAML configuration file; `simrs.yaml` is used when present.
    #[clap(long, short = 'c', global = true, env = "SIMRS_CONFIG")]
    pub config: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, PartialEq)]
pub enum Command {
    /// Run the REST API until interrupted.
    Serve {
        #[clap(long, short = 'p')]
        port: Option<u16>,
    },
    /// Bootstrap a SUPER_ADMIN account.
    CreateAdmin {
        #[clap(long)]
        username: String,
        #[clap(long)]
        email: String,
        #[clap(long, env = "SIMRS_ADMIN_PASSWORD")]
        password: String,
    },
    /// Print the effective configuration with secrets redacted.
    ShowConfig,
}

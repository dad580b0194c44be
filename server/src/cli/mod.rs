// server/src/cli/mod.rs
pub mod commands;
pub mod handlers;

pub use commands::{Cli, Command};

use anyhow::Result;

pub async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Serve { port } => handlers::handle_serve(config_path, port).await,
        Command::CreateAdmin { username, email, password } => {
            handlers::handle_create_admin(config_path, &username, &email, &password).await
        }
        Command::ShowConfig => handlers::handle_show_config(config_path),
    }
}

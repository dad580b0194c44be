// server/src/cli/handlers.rs
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use tokio::sync::{broadcast, oneshot};

use simrs_core::{create_storage, load_app_config, AppConfig, HospitalEngine};
use simrs_rest_api::{start_server, AppState};
use simrs_security::RolesConfig;

const REDACTED: &str = "<redacted>";

/// The capability table from `security.roles_file`, or the built-in one.
pub fn load_roles(config: &AppConfig) -> Result<RolesConfig> {
    match &config.security.roles_file {
        Some(path) => {
            let path = path.to_string_lossy();
            info!("Loading role capabilities from {}", path);
            RolesConfig::from_yaml_file(&path)
        }
        None => Ok(RolesConfig::builtin()),
    }
}

/// Opens the configured store and loads the engine over it.
pub async fn open_engine(config: &AppConfig) -> Result<Arc<HospitalEngine>> {
    let store = create_storage(&config.storage)?;
    let roles = Arc::new(load_roles(config)?);
    let engine = HospitalEngine::open(store, roles, config.scheduling.clone())
        .await
        .context("Failed to load hospital state")?;
    Ok(Arc::new(engine))
}

/// Logs every committed mutation until the engine's channel closes.
fn spawn_audit_log(engine: &HospitalEngine) -> tokio::task::JoinHandle<()> {
    let mut events = engine.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => info!(target: "simrs::audit", "{}", event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(target: "simrs::audit", "Audit log fell behind, {} event(s) skipped", skipped)
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

pub async fn handle_serve(config_path: Option<&Path>, port: Option<u16>) -> Result<()> {
    let mut config = load_app_config(config_path)?;
    if let Some(port) = port {
        config.rest.port = port;
    }
    if config.security.uses_default_secret() {
        warn!("security.jwt_secret is the built-in default; set SIMRS__SECURITY__JWT_SECRET before deploying");
    }
    if config.security.gateway_key.is_none() {
        warn!("security.gateway_key is unset; payment gateway callbacks will be refused");
    }
    debug!("Effective configuration: {:?}", config);

    let engine = open_engine(&config).await?;
    let audit = spawn_audit_log(&engine);
    let state = AppState::new(engine.clone(), config);

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let server = tokio::spawn(start_server(state, shutdown_rx));

    tokio::signal::ctrl_c().await.context("Failed to listen for ctrl-c")?;
    info!("Interrupt received, shutting down");
    let _ = shutdown_tx.send(());
    server.await.context("REST API task panicked")??;

    engine.flush().await.context("Failed to flush record store")?;
    audit.abort();
    info!("Shutdown complete");
    Ok(())
}

pub async fn handle_create_admin(config_path: Option<&Path>, username: &str, email: &str, password: &str) -> Result<()> {
    let config = load_app_config(config_path)?;
    let engine = open_engine(&config).await?;
    let profile = engine
        .create_superuser(username, email, password)
        .await
        .with_context(|| format!("Failed to create administrator '{}'", username))?;
    engine.flush().await?;
    println!("Created SUPER_ADMIN {} ({})", profile.username, profile.id);
    Ok(())
}

/// `config` as YAML with secrets masked.
pub fn redacted_yaml(config: &AppConfig) -> Result<String> {
    let mut shown = config.clone();
    shown.security.jwt_secret = REDACTED.to_string();
    if shown.security.gateway_key.is_some() {
        shown.security.gateway_key = Some(REDACTED.to_string());
    }
    serde_yaml::to_string(&shown).context("Failed to render configuration")
}

pub fn handle_show_config(config_path: Option<&Path>) -> Result<()> {
    let config = load_app_config(config_path)?;
    print!("{}", redacted_yaml(&config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use simrs_core::config::StorageConfig;

    #[test]
    fn should_mask_secrets_in_rendered_config() {
        let mut config = AppConfig::default();
        config.security.jwt_secret = "super-secret-value".into();
        config.security.gateway_key = Some("gateway-secret".into());

        let yaml = redacted_yaml(&config).unwrap();
        assert!(!yaml.contains("super-secret-value"));
        assert!(!yaml.contains("gateway-secret"));
        assert!(yaml.contains(REDACTED));
    }

    #[tokio::test]
    async fn should_bootstrap_admin_into_sled_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.storage = StorageConfig { data_directory: dir.path().join("data"), ..StorageConfig::default() };

        let engine = open_engine(&config).await.unwrap();
        let admin = engine.create_superuser("root", "root@rs.local", "changeme123").await.unwrap();
        engine.flush().await.unwrap();
        drop(engine);

        let reopened = open_engine(&config).await.unwrap();
        let actor = reopened.resolve_actor(admin.id).await.unwrap();
        assert_eq!(actor.role, simrs_models::Role::SuperAdmin);
    }

    #[test]
    fn should_fall_back_to_builtin_roles() {
        let roles = load_roles(&AppConfig::default()).unwrap();
        assert!(roles.get_role_config(simrs_models::Role::Doctor).is_some());
    }
}

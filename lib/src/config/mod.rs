// lib/src/config/mod.rs
use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use log::{debug, info};

pub mod config_defaults;
pub mod config_structs;

pub use config_defaults::*;
pub use config_structs::{
    AppConfig, RestConfig, SchedulingConfig, SecurityConfig, StorageConfig, StorageEngineType,
};

/// Loads configuration from an optional YAML file, then `SIMRS__SECTION__KEY`
/// environment overrides. Missing keys fall back to their defaults.
///
/// An explicitly named file must exist; without one, `simrs.yaml` in the
/// working directory is used when present.
pub fn load_app_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut builder = Config::builder();
    match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml).required(true));
        }
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            info!("Loading configuration from {}", DEFAULT_CONFIG_FILE);
            builder = builder.add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml));
        }
        None => debug!("No configuration file found, using defaults"),
    }
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build().context("Failed to load configuration")?;
    let app_config: AppConfig = config
        .try_deserialize()
        .context("Failed to parse configuration")?;
    validate(&app_config)?;
    Ok(app_config)
}

fn validate(config: &AppConfig) -> Result<()> {
    if config.scheduling.administration_fee < 0 {
        anyhow::bail!("scheduling.administration_fee must not be negative");
    }
    if config.scheduling.default_page_size == 0 {
        anyhow::bail!("scheduling.default_page_size must be at least 1");
    }
    if !config.rest.api_prefix.is_empty() && !config.rest.api_prefix.starts_with('/') {
        anyhow::bail!("rest.api_prefix must start with '/'");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn should_fill_missing_sections_with_defaults() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "rest:\n  port: 9100\nscheduling:\n  administration_fee: 75000").unwrap();

        let config = load_app_config(Some(file.path())).unwrap();
        assert_eq!(config.rest.port, 9100);
        assert_eq!(config.rest.host, "127.0.0.1");
        assert_eq!(config.scheduling.administration_fee, 75_000);
        assert_eq!(config.scheduling.default_page_size, 20);
        assert_eq!(config.storage.engine_type, StorageEngineType::Sled);
        assert!(config.security.uses_default_secret());
    }

    #[test]
    fn should_parse_in_memory_engine_type() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "storage:\n  engine_type: in_memory\n  data_directory: /tmp/simrs-test").unwrap();

        let config = load_app_config(Some(file.path())).unwrap();
        assert_eq!(config.storage.engine_type, StorageEngineType::InMemory);
        assert_eq!(config.storage.data_directory.to_str(), Some("/tmp/simrs-test"));
    }

    #[test]
    fn should_reject_negative_fee() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "scheduling:\n  administration_fee: -1").unwrap();
        assert!(load_app_config(Some(file.path())).is_err());
    }

    #[test]
    fn should_redact_secrets_in_debug_output() {
        let mut security = SecurityConfig::default();
        security.gateway_key = Some("gateway-secret".into());
        let rendered = format!("{:?}", security);
        assert!(!rendered.contains("gateway-secret"));
        assert!(!rendered.contains(DEFAULT_JWT_SECRET));
    }
}

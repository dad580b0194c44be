// lib/src/config/config_structs.rs
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::config_defaults::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageEngineType {
    Sled,
    InMemory,
}

impl fmt::Display for StorageEngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageEngineType::Sled => write!(f, "sled"),
            StorageEngineType::InMemory => write!(f, "in_memory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
}

impl Default for RestConfig {
    fn default() -> Self {
        RestConfig {
            host: default_host(),
            port: default_port(),
            api_prefix: default_api_prefix(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_engine_type")]
    pub engine_type: StorageEngineType,
    #[serde(default = "default_data_directory")]
    pub data_directory: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            engine_type: default_storage_engine_type(),
            data_directory: default_data_directory(),
        }
    }
}

impl StorageConfig {
    pub fn in_memory() -> Self {
        StorageConfig {
            engine_type: StorageEngineType::InMemory,
            ..Default::default()
        }
    }
}

/// Workflow knobs read by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// Charged with every appointment request. Client-supplied fees are ignored.
    #[serde(default = "default_administration_fee")]
    pub administration_fee: i64,
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    /// Length of the "recent" lists on dashboards.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        SchedulingConfig {
            administration_fee: default_administration_fee(),
            default_page_size: default_page_size(),
            recent_limit: default_recent_limit(),
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: i64,
    #[serde(default)]
    pub roles_file: Option<PathBuf>,
    /// Shared secret the payment gateway presents on callbacks. Callbacks are
    /// refused while unset.
    #[serde(default)]
    pub gateway_key: Option<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        SecurityConfig {
            jwt_secret: default_jwt_secret(),
            token_ttl_minutes: default_token_ttl_minutes(),
            roles_file: None,
            gateway_key: None,
        }
    }
}

impl SecurityConfig {
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

// Secrets stay out of logs and `show-config` output.
impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("roles_file", &self.roles_file)
            .field("gateway_key", &self.gateway_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub rest: RestConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub scheduling: SchedulingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

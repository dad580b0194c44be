// lib/src/config/config_defaults.rs
use std::path::PathBuf;

use super::config_structs::StorageEngineType;

pub const DEFAULT_CONFIG_FILE: &str = "simrs.yaml";
pub const DEFAULT_DATA_DIRECTORY: &str = "./data/simrs";
pub const DEFAULT_REST_API_PORT: u16 = 8000;
pub const DEFAULT_ADMINISTRATION_FEE: i64 = 50_000;
/// Development-only signing secret; the server warns when it is still in use.
pub const DEFAULT_JWT_SECRET: &str = "simrs-development-secret-change-me-before-deploying";
pub const ENV_PREFIX: &str = "SIMRS";

pub fn default_host() -> String {
    "127.0.0.1".to_string()
}
pub fn default_port() -> u16 { DEFAULT_REST_API_PORT }
pub fn default_api_prefix() -> String {
    "/api".to_string()
}

pub fn default_storage_engine_type() -> StorageEngineType { StorageEngineType::Sled }
pub fn default_data_directory() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIRECTORY)
}

pub fn default_administration_fee() -> i64 { DEFAULT_ADMINISTRATION_FEE }
pub fn default_page_size() -> usize { 20 }
pub fn default_recent_limit() -> usize { 10 }

pub fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}
pub fn default_token_ttl_minutes() -> i64 { 24 * 60 }

// lib/src/storage_engine/mod.rs

pub mod inmemory_storage;
pub mod sled_storage;
pub mod storage_engine;

pub use inmemory_storage::InMemoryStorage;
pub use sled_storage::SledStorage;
pub use storage_engine::{Collection, RecordStore, StoreOp};

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use crate::config::{StorageConfig, StorageEngineType};

/// Creates the record store selected by the configuration.
pub fn create_storage(config: &StorageConfig) -> Result<Arc<dyn RecordStore>> {
    let store: Arc<dyn RecordStore> = match config.engine_type {
        StorageEngineType::Sled => Arc::new(
            SledStorage::open(&config.data_directory)
                .with_context(|| format!("Failed to open sled store at {}", config.data_directory.display()))?,
        ),
        StorageEngineType::InMemory => Arc::new(InMemoryStorage::new()),
    };
    info!("Using {} record store", store.get_type());
    Ok(store)
}

// lib/src/storage_engine/sled_storage.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info};
use sled::{Batch, Db};
use uuid::Uuid;

use simrs_models::{HospitalError, HospitalResult};

use super::storage_engine::{Collection, RecordStore, StoreOp};

/// Sled-backed store. Keys are `<collection>/<uuid bytes>` in the default
/// tree, so one `Batch` covers writes across collections atomically.
#[derive(Debug)]
pub struct SledStorage {
    db: Db,
    path: PathBuf,
}

/// sled drops its directory lock on a background thread after the last handle
/// goes away, so an immediate reopen can still see it held.
const LOCK_RETRY_ATTEMPTS: u32 = 10;
const LOCK_RETRY_BASE_DELAY: Duration = Duration::from_millis(10);

fn is_lock_contention(err: &sled::Error) -> bool {
    matches!(err, sled::Error::Io(io) if io.to_string().contains("could not acquire lock"))
}

fn open_db(path: &Path) -> sled::Result<Db> {
    let mut delay = LOCK_RETRY_BASE_DELAY;
    let mut attempt = 1;
    loop {
        match sled::Config::new().path(path).open() {
            Err(e) if is_lock_contention(&e) && attempt < LOCK_RETRY_ATTEMPTS => {
                debug!("Sled lock at {:?} still held (attempt {}), retrying in {:?}", path, attempt, delay);
                thread::sleep(delay);
                delay *= 2;
                attempt += 1;
            }
            result => return result,
        }
    }
}

fn collection_prefix(collection: Collection) -> Vec<u8> {
    let mut prefix = collection.as_str().as_bytes().to_vec();
    prefix.push(b'/');
    prefix
}

fn record_key(collection: Collection, key: &Uuid) -> Vec<u8> {
    let mut bytes = collection_prefix(collection);
    bytes.extend_from_slice(key.as_bytes());
    bytes
}

impl SledStorage {
    pub fn open(path: &Path) -> HospitalResult<Self> {
        if !path.exists() {
            info!("Creating database directory at {:?}", path);
            fs::create_dir_all(path).map_err(|e| {
                error!("Failed to create database directory at {:?}: {}", path, e);
                HospitalError::Storage(format!("Failed to create database directory at {:?}: {}", path, e))
            })?;
        } else if !path.is_dir() {
            return Err(HospitalError::Storage(format!("Path {:?} is not a directory", path)));
        }

        let db = open_db(path).map_err(|e| {
            error!("Failed to open Sled database at {:?}: {}", path, e);
            HospitalError::Storage(format!("Failed to open Sled database at {:?}: {}", path, e))
        })?;
        info!("Opened Sled database at {:?}", path);
        Ok(SledStorage { db, path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordStore for SledStorage {
    async fn apply(&self, batch: Vec<StoreOp>) -> HospitalResult<()> {
        let mut sled_batch = Batch::default();
        let size = batch.len();
        for op in batch {
            match op {
                StoreOp::Put { collection, key, value } => {
                    sled_batch.insert(record_key(collection, &key), value);
                }
                StoreOp::Remove { collection, key } => {
                    sled_batch.remove(record_key(collection, &key));
                }
            }
        }
        self.db.apply_batch(sled_batch)?;
        debug!("Applied batch of {} record(s)", size);
        Ok(())
    }

    async fn load_all(&self, collection: Collection) -> HospitalResult<Vec<Vec<u8>>> {
        let mut values = Vec::new();
        for item in self.db.scan_prefix(collection_prefix(collection)) {
            let (_, value) = item?;
            values.push(value.to_vec());
        }
        Ok(values)
    }

    async fn flush(&self) -> HospitalResult<()> {
        let bytes = self.db.flush_async().await?;
        debug!("Flushed {} byte(s) to {:?}", bytes, self.path);
        Ok(())
    }

    fn get_type(&self) -> &'static str {
        "Sled"
    }
}

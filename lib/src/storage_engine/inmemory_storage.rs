// lib/src/storage_engine/inmemory_storage.rs
use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use simrs_models::HospitalResult;

use super::storage_engine::{Collection, RecordStore, StoreOp};

/// Volatile store for tests and throwaway runs. Records survive only as long
/// as the store value, which lets tests reopen an engine over the same store.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    records: RwLock<BTreeMap<(Collection, Uuid), Vec<u8>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for InMemoryStorage {
    async fn apply(&self, batch: Vec<StoreOp>) -> HospitalResult<()> {
        let mut records = self.records.write().await;
        for op in batch {
            match op {
                StoreOp::Put { collection, key, value } => {
                    records.insert((collection, key), value);
                }
                StoreOp::Remove { collection, key } => {
                    records.remove(&(collection, key));
                }
            }
        }
        Ok(())
    }

    async fn load_all(&self, collection: Collection) -> HospitalResult<Vec<Vec<u8>>> {
        let records = self.records.read().await;
        Ok(records
            .range((collection, Uuid::nil())..=(collection, Uuid::from_u128(u128::MAX)))
            .map(|(_, value)| value.clone())
            .collect())
    }

    async fn flush(&self) -> HospitalResult<()> {
        Ok(())
    }

    fn get_type(&self) -> &'static str {
        "InMemory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_scope_records_to_their_collection() {
        let store = InMemoryStorage::new();
        let key = Uuid::new_v4();
        store
            .apply(vec![
                StoreOp::Put { collection: Collection::Beds, key, value: b"bed".to_vec() },
                StoreOp::Put { collection: Collection::Rooms, key, value: b"room".to_vec() },
            ])
            .await
            .unwrap();

        assert_eq!(store.load_all(Collection::Beds).await.unwrap(), vec![b"bed".to_vec()]);
        assert!(store.load_all(Collection::Wards).await.unwrap().is_empty());

        store.apply(vec![StoreOp::Remove { collection: Collection::Beds, key }]).await.unwrap();
        assert!(store.load_all(Collection::Beds).await.unwrap().is_empty());
        assert_eq!(store.len().await, 1);
    }
}

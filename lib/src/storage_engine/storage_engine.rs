// lib/src/storage_engine/storage_engine.rs

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use simrs_models::HospitalResult;

/// Named record families. Each entity kind persists under its own collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Users,
    Wards,
    Rooms,
    Beds,
    Allocations,
    Appointments,
    Payments,
    EmergencyCases,
}

impl Collection {
    pub const ALL: [Collection; 8] = [
        Collection::Users,
        Collection::Wards,
        Collection::Rooms,
        Collection::Beds,
        Collection::Allocations,
        Collection::Appointments,
        Collection::Payments,
        Collection::EmergencyCases,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Wards => "wards",
            Collection::Rooms => "rooms",
            Collection::Beds => "beds",
            Collection::Allocations => "allocations",
            Collection::Appointments => "appointments",
            Collection::Payments => "payments",
            Collection::EmergencyCases => "emergency_cases",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single write within a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    Put {
        collection: Collection,
        key: Uuid,
        value: Vec<u8>,
    },
    Remove {
        collection: Collection,
        key: Uuid,
    },
}

impl StoreOp {
    pub fn collection(&self) -> Collection {
        match self {
            StoreOp::Put { collection, .. } | StoreOp::Remove { collection, .. } => *collection,
        }
    }
}

/// Durable record storage behind the engine. A batch is applied entirely or
/// not at all.
#[async_trait]
pub trait RecordStore: Send + Sync + fmt::Debug {
    async fn apply(&self, batch: Vec<StoreOp>) -> HospitalResult<()>;
    /// Every stored value of one collection, in key order.
    async fn load_all(&self, collection: Collection) -> HospitalResult<Vec<Vec<u8>>>;
    async fn flush(&self) -> HospitalResult<()>;
    fn get_type(&self) -> &'static str;
}

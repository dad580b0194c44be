// models/src/medical/bed_allocation.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identifiers::{AllocationId, BedId, UserId};

/// One patient assigned to one bed. Open while `discharged_at` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BedAllocation {
    pub id: AllocationId,
    pub bed: BedId,
    pub patient: UserId,
    pub attending_staff: Option<UserId>,
    pub admitted_at: DateTime<Utc>,
    pub discharged_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_by: UserId,
}

impl BedAllocation {
    pub fn is_open(&self) -> bool {
        self.discharged_at.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAllocation {
    pub bed: BedId,
    pub patient: UserId,
    #[serde(default)]
    pub attending_staff: Option<UserId>,
    /// Defaults to the time the request is handled.
    #[serde(default)]
    pub admitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// `PATCH` body: a `discharged_at` value triggers the discharge transition,
/// the other fields edit an open allocation in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationPatch {
    #[serde(default)]
    pub discharged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub attending_staff: Option<UserId>,
}

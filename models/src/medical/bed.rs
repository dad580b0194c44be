// models/src/medical/bed.rs
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::room::RoomType;
use crate::identifiers::{BedId, EmergencyCaseId, RoomId, WardId};

/// Bed lifecycle: `AVAILABLE -> OCCUPIED -> CLEANING -> AVAILABLE`, with
/// `MAINTENANCE` entered from `AVAILABLE` or `CLEANING` and left only back to
/// `AVAILABLE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BedStatus {
    Available,
    Occupied,
    Maintenance,
    Cleaning,
}

impl BedStatus {
    pub fn can_transition_to(self, next: BedStatus) -> bool {
        use BedStatus::*;
        matches!(
            (self, next),
            (Available, Occupied)
                | (Occupied, Cleaning)
                | (Cleaning, Available)
                | (Available, Maintenance)
                | (Cleaning, Maintenance)
                | (Maintenance, Available)
        )
    }
}

impl fmt::Display for BedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BedStatus::Available => "AVAILABLE",
            BedStatus::Occupied => "OCCUPIED",
            BedStatus::Maintenance => "MAINTENANCE",
            BedStatus::Cleaning => "CLEANING",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bed {
    pub id: BedId,
    pub room: RoomId,
    pub bed_number: String,
    pub status: BedStatus,
    pub supports_elderly: bool,
    pub equipment: BTreeMap<String, String>,
    /// Set while the bed is held for an incoming triage case.
    pub reserved_for_triage: Option<EmergencyCaseId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bed {
    pub fn is_allocatable(&self) -> bool {
        self.status == BedStatus::Available
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBed {
    pub room: RoomId,
    pub bed_number: String,
    #[serde(default)]
    pub status: Option<BedStatus>,
    #[serde(default)]
    pub supports_elderly: bool,
    #[serde(default)]
    pub equipment: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BedCreated {
    #[serde(flatten)]
    pub bed: Bed,
    pub capacity_warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BedWardSummary {
    pub id: WardId,
    pub name: String,
    pub department: String,
    pub floor: i32,
    pub has_elderly_support: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BedRoomSummary {
    pub id: RoomId,
    pub room_number: String,
    pub room_type: RoomType,
    pub accessibility_notes: Option<String>,
    pub ward: BedWardSummary,
}

/// Availability listing entry: the bed with its room and ward nested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BedAvailability {
    pub id: BedId,
    pub bed_number: String,
    pub supports_elderly: bool,
    pub status: BedStatus,
    pub equipment: BTreeMap<String, String>,
    pub room: BedRoomSummary,
}

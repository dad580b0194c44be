// models/src/medical/room.rs
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identifiers::{RoomId, WardId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomType {
    General,
    Icu,
    Isolation,
    Vip,
    Nicu,
    Maternity,
    ErObservation,
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoomType::General => "GENERAL",
            RoomType::Icu => "ICU",
            RoomType::Isolation => "ISOLATION",
            RoomType::Vip => "VIP",
            RoomType::Nicu => "NICU",
            RoomType::Maternity => "MATERNITY",
            RoomType::ErObservation => "ER_OBSERVATION",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub ward: WardId,
    pub room_number: String,
    pub room_type: RoomType,
    /// Advisory bed limit; exceeding it is reported, never blocked.
    pub capacity: u32,
    pub accessibility_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRoom {
    pub ward: WardId,
    pub room_number: String,
    pub room_type: RoomType,
    pub capacity: u32,
    #[serde(default)]
    pub accessibility_notes: Option<String>,
}

/// Room listing entry with its current bed count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomView {
    #[serde(flatten)]
    pub room: Room,
    pub bed_count: usize,
    pub over_capacity: bool,
}

// models/src/medical/ward.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identifiers::WardId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ward {
    pub id: WardId,
    pub name: String,
    pub code: String,
    pub floor: i32,
    pub department: String,
    pub has_elderly_support: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWard {
    pub name: String,
    pub code: String,
    pub floor: i32,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub has_elderly_support: bool,
}

/// Partial edit. `code` and `floor` are structural and only editable while no
/// bed sits under the ward.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WardUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub floor: Option<i32>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub has_elderly_support: Option<bool>,
}

impl WardUpdate {
    pub fn touches_structure(&self) -> bool {
        self.code.is_some() || self.floor.is_some()
    }
}

// models/src/medical/emergency_case.rs
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identifiers::{EmergencyCaseId, UserId};

/// Triage severity, most urgent first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriageSeverity {
    Resuscitation,
    Emergent,
    Urgent,
    LessUrgent,
    NonUrgent,
}

impl fmt::Display for TriageSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TriageSeverity::Resuscitation => "RESUSCITATION",
            TriageSeverity::Emergent => "EMERGENT",
            TriageSeverity::Urgent => "URGENT",
            TriageSeverity::LessUrgent => "LESS_URGENT",
            TriageSeverity::NonUrgent => "NON_URGENT",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyCase {
    pub id: EmergencyCaseId,
    pub patient_name: String,
    /// Linked account, when the arrival is already registered.
    pub patient: Option<UserId>,
    pub severity: TriageSeverity,
    pub arrival_time: DateTime<Utc>,
    pub attending_physician: Option<UserId>,
    pub complaint: Option<String>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEmergencyCase {
    pub patient_name: String,
    #[serde(default)]
    pub patient: Option<UserId>,
    pub severity: TriageSeverity,
    #[serde(default)]
    pub arrival_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attending_physician: Option<UserId>,
    #[serde(default)]
    pub complaint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageReservation {
    pub case: EmergencyCaseId,
}

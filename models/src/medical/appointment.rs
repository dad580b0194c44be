// models/src/medical/appointment.rs
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identifiers::{AppointmentId, PaymentId, UserId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentType {
    Polyclinic,
    Control,
    Telemedicine,
    HomeVisit,
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AppointmentType::Polyclinic => "POLYCLINIC",
            AppointmentType::Control => "CONTROL",
            AppointmentType::Telemedicine => "TELEMEDICINE",
            AppointmentType::HomeVisit => "HOME_VISIT",
        };
        f.write_str(name)
    }
}

/// `PENDING -> CONFIRMED -> CHECKED_IN -> COMPLETED`, and `CANCELLED` from
/// `PENDING` or `CONFIRMED`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    CheckedIn,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn can_transition_to(self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, CheckedIn)
                | (CheckedIn, Completed)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::CheckedIn => "CHECKED_IN",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Cancelled => "CANCELLED",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub patient: UserId,
    pub doctor: Option<UserId>,
    pub appointment_type: AppointmentType,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub purpose: Option<String>,
    pub location: Option<String>,
    pub administration_fee: i64,
    /// The WAITING transaction created with the request; must be PAID before
    /// a doctor can be assigned.
    pub administration_payment: PaymentId,
    pub notes_for_patient: Option<String>,
    pub cancelled_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Patient request body. A client-supplied `administration_fee` is accepted
/// for compatibility but ignored: the fee comes from server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentRequest {
    pub appointment_type: AppointmentType,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub administration_fee: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorAssignment {
    pub doctor: UserId,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes_for_patient: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::AppointmentStatus::*;

    #[test]
    fn cancellation_only_before_check_in() {
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!CheckedIn.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Cancelled));
    }

    #[test]
    fn workflow_moves_forward_one_step_at_a_time() {
        assert!(Pending.can_transition_to(Confirmed));
        assert!(!Pending.can_transition_to(CheckedIn));
        assert!(!Confirmed.can_transition_to(Completed));
        assert!(Cancelled.is_terminal() && Completed.is_terminal());
    }
}

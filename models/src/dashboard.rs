// models/src/dashboard.rs
//! Read-side projections returned by `GET /dashboard/{role}`. Names are
//! resolved to display strings so the client renders them as-is.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::HospitalError;
use crate::identifiers::{AllocationId, AppointmentId, BedId, EmergencyCaseId, PaymentId};
use crate::medical::{AppointmentStatus, AppointmentType, BedStatus, PaymentStatus, Role, TriageSeverity};

/// The dashboard families addressable under `/dashboard/{kind}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DashboardKind {
    SuperAdmin,
    HospitalAdmin,
    Doctor,
    Nurse,
    Receptionist,
    Emergency,
    Patient,
}

impl DashboardKind {
    /// Landing dashboard for each role.
    pub fn for_role(role: Role) -> DashboardKind {
        match role {
            Role::SuperAdmin => DashboardKind::SuperAdmin,
            Role::HospitalAdmin | Role::ItSupport => DashboardKind::HospitalAdmin,
            Role::MedicalDirector | Role::Doctor => DashboardKind::Doctor,
            Role::Nurse | Role::Midwife => DashboardKind::Nurse,
            Role::Triage | Role::Ambulance => DashboardKind::Emergency,
            Role::Patient | Role::Caregiver => DashboardKind::Patient,
            Role::CustomerService
            | Role::Finance
            | Role::Pharmacist
            | Role::LabTech
            | Role::Radiology
            | Role::Cleaning
            | Role::Security => DashboardKind::Receptionist,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DashboardKind::SuperAdmin => "superadmin",
            DashboardKind::HospitalAdmin => "hospitaladmin",
            DashboardKind::Doctor => "doctor",
            DashboardKind::Nurse => "nurse",
            DashboardKind::Receptionist => "receptionist",
            DashboardKind::Emergency => "emergency",
            DashboardKind::Patient => "patient",
        }
    }
}

impl fmt::Display for DashboardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DashboardKind {
    type Err = HospitalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_end_matches('/').to_ascii_lowercase().as_str() {
            "superadmin" => Ok(DashboardKind::SuperAdmin),
            "hospitaladmin" => Ok(DashboardKind::HospitalAdmin),
            "doctor" => Ok(DashboardKind::Doctor),
            "nurse" => Ok(DashboardKind::Nurse),
            "receptionist" => Ok(DashboardKind::Receptionist),
            "emergency" => Ok(DashboardKind::Emergency),
            "patient" => Ok(DashboardKind::Patient),
            other => Err(HospitalError::not_found("dashboard", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorAppointment {
    pub id: AppointmentId,
    pub patient: String,
    pub appointment_type: AppointmentType,
    pub start: DateTime<Utc>,
    pub location: Option<String>,
    pub status: AppointmentStatus,
}

/// Pending request awaiting a doctor, shown to the medical director.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAssignment {
    pub id: AppointmentId,
    pub patient: String,
    pub appointment_type: AppointmentType,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub purpose: Option<String>,
    pub administration_fee_paid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorBedAllocation {
    pub allocation_id: AllocationId,
    pub patient: String,
    pub bed: String,
    pub room: String,
    pub ward: String,
    pub status: BedStatus,
    pub admitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorDashboard {
    pub upcoming_appointments: Vec<DoctorAppointment>,
    pub pending_assignments: Vec<PendingAssignment>,
    pub active_bed_allocations: Vec<DoctorBedAllocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NurseAllocation {
    pub allocation_id: AllocationId,
    pub patient: String,
    pub bed: String,
    pub room: String,
    pub ward: String,
    pub attending_staff: Option<String>,
    pub status: BedStatus,
    pub admitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NurseDashboard {
    pub active_allocations: Vec<NurseAllocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyCaseSummary {
    pub id: EmergencyCaseId,
    pub patient: String,
    pub severity: TriageSeverity,
    pub arrival_time: DateTime<Utc>,
    pub attending_physician: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservedBedSummary {
    pub bed_id: BedId,
    pub bed: String,
    pub room: String,
    pub ward: String,
    pub case: Option<EmergencyCaseId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyDashboard {
    pub recent_cases: Vec<EmergencyCaseSummary>,
    pub reserved_beds: Vec<ReservedBedSummary>,
    pub cases_last_24h: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub id: PaymentId,
    pub order_id: String,
    pub patient: String,
    pub amount: i64,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceptionistDashboard {
    pub pending_activation_requests: usize,
    pub payments_waiting: Vec<PaymentSummary>,
    pub recent_payments: Vec<PaymentSummary>,
}

/// Shared by the super-admin and hospital-admin dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminDashboard {
    pub users_by_role: BTreeMap<String, usize>,
    /// Transaction count per payment status.
    pub payments: BTreeMap<String, usize>,
    /// Summed amount per payment status.
    pub payment_totals: BTreeMap<String, i64>,
    pub pending_activation_requests: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientAppointment {
    pub id: AppointmentId,
    pub doctor: Option<String>,
    pub appointment_type: AppointmentType,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location: Option<String>,
    pub status: AppointmentStatus,
    pub purpose: Option<String>,
    pub notes_for_patient: Option<String>,
    pub administration_fee: i64,
    pub administration_fee_paid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientBedAllocation {
    pub allocation_id: AllocationId,
    pub bed: String,
    pub room: String,
    pub ward: String,
    pub admitted_at: DateTime<Utc>,
    pub attending_staff: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientPayment {
    pub id: PaymentId,
    pub order_id: String,
    pub amount: i64,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientDashboard {
    pub upcoming_appointments: Vec<PatientAppointment>,
    pub active_bed_allocation: Option<PatientBedAllocation>,
    pub recent_payments: Vec<PatientPayment>,
}

/// Any dashboard, serialized without a wrapper tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DashboardView {
    Doctor(DoctorDashboard),
    Nurse(NurseDashboard),
    Emergency(EmergencyDashboard),
    Receptionist(ReceptionistDashboard),
    Admin(AdminDashboard),
    Patient(PatientDashboard),
}

// models/src/medical/role.rs
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::HospitalError;

/// Closed set of actor roles. The role decides which dashboard an actor lands
/// on and which mutations the capability table grants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    HospitalAdmin,
    MedicalDirector,
    Doctor,
    Nurse,
    Midwife,
    CustomerService,
    Finance,
    Triage,
    Ambulance,
    ItSupport,
    Security,
    Patient,
    Caregiver,
    Pharmacist,
    LabTech,
    Radiology,
    Cleaning,
}

impl Role {
    pub const ALL: [Role; 18] = [
        Role::SuperAdmin,
        Role::HospitalAdmin,
        Role::MedicalDirector,
        Role::Doctor,
        Role::Nurse,
        Role::Midwife,
        Role::CustomerService,
        Role::Finance,
        Role::Triage,
        Role::Ambulance,
        Role::ItSupport,
        Role::Security,
        Role::Patient,
        Role::Caregiver,
        Role::Pharmacist,
        Role::LabTech,
        Role::Radiology,
        Role::Cleaning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::HospitalAdmin => "HOSPITAL_ADMIN",
            Role::MedicalDirector => "MEDICAL_DIRECTOR",
            Role::Doctor => "DOCTOR",
            Role::Nurse => "NURSE",
            Role::Midwife => "MIDWIFE",
            Role::CustomerService => "CUSTOMER_SERVICE",
            Role::Finance => "FINANCE",
            Role::Triage => "TRIAGE",
            Role::Ambulance => "AMBULANCE",
            Role::ItSupport => "IT_SUPPORT",
            Role::Security => "SECURITY",
            Role::Patient => "PATIENT",
            Role::Caregiver => "CAREGIVER",
            Role::Pharmacist => "PHARMACIST",
            Role::LabTech => "LAB_TECH",
            Role::Radiology => "RADIOLOGY",
            Role::Cleaning => "CLEANING",
        }
    }

    /// Hospital staff, as opposed to patients and their caregivers.
    pub fn is_staff(&self) -> bool {
        !matches!(self, Role::Patient | Role::Caregiver)
    }

    /// Roles that can be bound to an appointment or act as attending physician.
    pub fn is_physician(&self) -> bool {
        matches!(self, Role::Doctor | Role::MedicalDirector)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = HospitalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == wanted)
            .ok_or_else(|| HospitalError::InvalidData(format!("Unknown role: {}", s)))
    }
}

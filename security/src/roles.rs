// security/src/roles.rs
use std::collections::HashMap;
use std::fmt;
use std::fs;

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use simrs_models::dashboard::DashboardKind;
use simrs_models::{HospitalError, HospitalResult, Role};

use crate::session::Actor;

/// Grants every permission when present in a role's list.
pub const SUPERUSER: &str = "superuser";

/// Operations gated by the capability table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewInventory,
    ManageInventory,
    AllocateBed,
    DischargeBed,
    ReclaimBed,
    RequestAppointment,
    AssignDoctor,
    CancelAnyAppointment,
    CheckInAppointment,
    CompleteAppointment,
    ViewAllAppointments,
    CreatePayment,
    ViewPayments,
    ManageUsers,
    ViewDirectory,
    RegisterEmergencyCase,
    ReserveTriageBed,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewInventory => "view_inventory",
            Permission::ManageInventory => "manage_inventory",
            Permission::AllocateBed => "allocate_bed",
            Permission::DischargeBed => "discharge_bed",
            Permission::ReclaimBed => "reclaim_bed",
            Permission::RequestAppointment => "request_appointment",
            Permission::AssignDoctor => "assign_doctor",
            Permission::CancelAnyAppointment => "cancel_any_appointment",
            Permission::CheckInAppointment => "check_in_appointment",
            Permission::CompleteAppointment => "complete_appointment",
            Permission::ViewAllAppointments => "view_all_appointments",
            Permission::CreatePayment => "create_payment",
            Permission::ViewPayments => "view_payments",
            Permission::ManageUsers => "manage_users",
            Permission::ViewDirectory => "view_directory",
            Permission::RegisterEmergencyCase => "register_emergency_case",
            Permission::ReserveTriageBed => "reserve_triage_bed",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct RoleConfig {
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Role to permission-set lookup. Roles absent from the table hold nothing.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RolesConfig {
    pub roles: HashMap<Role, RoleConfig>,
}

impl RolesConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: RolesConfig = serde_yaml::from_str(content).context("invalid roles YAML")?;
        Ok(config)
    }

    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path).with_context(|| format!("failed to read roles file {}", path))?;
        Self::from_yaml_str(&content)
    }

    /// The capability table used when no roles file is configured.
    pub fn builtin() -> Self {
        use Permission::*;
        use Role::*;

        let staff: Vec<Role> = Role::ALL.iter().copied().filter(|r| r.is_staff()).collect();
        let grants: Vec<(Permission, Vec<Role>)> = vec![
            (ViewInventory, Role::ALL.to_vec()),
            (ManageInventory, vec![SuperAdmin, HospitalAdmin]),
            (AllocateBed, vec![Doctor, Nurse, Midwife, MedicalDirector]),
            (DischargeBed, vec![Doctor, Nurse, Midwife, MedicalDirector]),
            (ReclaimBed, vec![Cleaning, ItSupport, HospitalAdmin]),
            (RequestAppointment, vec![Patient]),
            (AssignDoctor, vec![MedicalDirector]),
            (CancelAnyAppointment, vec![MedicalDirector]),
            (CheckInAppointment, vec![CustomerService, Nurse, Midwife, Doctor, MedicalDirector]),
            (CompleteAppointment, vec![Doctor, MedicalDirector]),
            (
                ViewAllAppointments,
                vec![MedicalDirector, CustomerService, Nurse, Midwife, HospitalAdmin, SuperAdmin],
            ),
            (CreatePayment, vec![CustomerService, Finance, HospitalAdmin, SuperAdmin]),
            (ViewPayments, vec![CustomerService, Finance, HospitalAdmin, SuperAdmin]),
            (ManageUsers, vec![SuperAdmin, HospitalAdmin]),
            (ViewDirectory, staff),
            (RegisterEmergencyCase, vec![Triage, Ambulance]),
            (ReserveTriageBed, vec![Triage]),
        ];

        let mut roles: HashMap<Role, RoleConfig> = HashMap::new();
        for (permission, holders) in grants {
            for role in holders {
                roles
                    .entry(role)
                    .or_default()
                    .permissions
                    .push(permission.as_str().to_string());
            }
        }
        RolesConfig { roles }
    }

    pub fn get_role_config(&self, role: Role) -> Option<&RoleConfig> {
        self.roles.get(&role)
    }

    pub fn has_permission(&self, role: Role, permission: Permission) -> bool {
        self.get_role_config(role).map_or(false, |role_cfg| {
            role_cfg
                .permissions
                .iter()
                .any(|p| p == permission.as_str() || p == SUPERUSER)
        })
    }

    pub fn authorize(&self, actor: &Actor, permission: Permission) -> HospitalResult<()> {
        if self.has_permission(actor.role, permission) {
            Ok(())
        } else {
            debug!("{} ({}) denied {}", actor.user_id, actor.role, permission);
            Err(HospitalError::Forbidden(format!(
                "role {} may not {}",
                actor.role,
                permission.as_str().replace('_', " ")
            )))
        }
    }

    /// Each role reads its own dashboard; super admins read all of them.
    pub fn authorize_dashboard(&self, actor: &Actor, kind: DashboardKind) -> HospitalResult<()> {
        if actor.role == Role::SuperAdmin || DashboardKind::for_role(actor.role) == kind {
            Ok(())
        } else {
            Err(HospitalError::Forbidden(format!(
                "role {} may not read the {} dashboard",
                actor.role, kind
            )))
        }
    }
}

impl Default for RolesConfig {
    fn default() -> Self {
        RolesConfig::builtin()
    }
}

// lib/src/events.rs
use std::fmt;

use serde::{Deserialize, Serialize};

use simrs_models::{
    AllocationId, AppointmentId, AppointmentStatus, BedId, BedStatus, EmergencyCaseId, PaymentId,
    PaymentStatus, Role, RoomId, TriageSeverity, UserId, WardId,
};

/// Published after every committed mutation. Subscribers see events in commit
/// order; a lagging subscriber loses the oldest ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    WardCreated { ward: WardId, code: String },
    WardUpdated { ward: WardId },
    WardDeleted { ward: WardId },
    RoomCreated { room: RoomId, ward: WardId },
    BedCreated { bed: BedId, room: RoomId, over_capacity: bool },
    BedStatusChanged { bed: BedId, from: BedStatus, to: BedStatus },
    BedReserved { bed: BedId, case: EmergencyCaseId },
    BedReservationReleased { bed: BedId },
    PatientAdmitted { allocation: AllocationId, bed: BedId, patient: UserId },
    PatientDischarged { allocation: AllocationId, bed: BedId },
    AllocationUpdated { allocation: AllocationId },
    AppointmentRequested { appointment: AppointmentId, payment: PaymentId },
    DoctorAssigned { appointment: AppointmentId, doctor: UserId },
    AppointmentStatusChanged { appointment: AppointmentId, from: AppointmentStatus, to: AppointmentStatus },
    PaymentCreated { payment: PaymentId, order_id: String, amount: i64 },
    PaymentStatusChanged { payment: PaymentId, order_id: String, from: PaymentStatus, to: PaymentStatus },
    UserCreated { user: UserId, role: Role },
    UserUpdated { user: UserId },
    UserLoggedIn { user: UserId },
    EmergencyCaseRegistered { case: EmergencyCaseId, severity: TriageSeverity },
}

impl fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineEvent::WardCreated { ward, code } => write!(f, "ward {} created ({})", ward, code),
            EngineEvent::WardUpdated { ward } => write!(f, "ward {} updated", ward),
            EngineEvent::WardDeleted { ward } => write!(f, "ward {} deleted", ward),
            EngineEvent::RoomCreated { room, ward } => write!(f, "room {} created in ward {}", room, ward),
            EngineEvent::BedCreated { bed, room, over_capacity } => {
                write!(f, "bed {} created in room {}", bed, room)?;
                if *over_capacity {
                    write!(f, " (over capacity)")?;
                }
                Ok(())
            }
            EngineEvent::BedStatusChanged { bed, from, to } => write!(f, "bed {} {} -> {}", bed, from, to),
            EngineEvent::BedReserved { bed, case } => write!(f, "bed {} reserved for triage case {}", bed, case),
            EngineEvent::BedReservationReleased { bed } => write!(f, "bed {} reservation released", bed),
            EngineEvent::PatientAdmitted { allocation, bed, patient } => {
                write!(f, "patient {} admitted to bed {} (allocation {})", patient, bed, allocation)
            }
            EngineEvent::PatientDischarged { allocation, bed } => {
                write!(f, "allocation {} discharged, bed {} to cleaning", allocation, bed)
            }
            EngineEvent::AllocationUpdated { allocation } => write!(f, "allocation {} updated", allocation),
            EngineEvent::AppointmentRequested { appointment, payment } => {
                write!(f, "appointment {} requested, fee payment {}", appointment, payment)
            }
            EngineEvent::DoctorAssigned { appointment, doctor } => {
                write!(f, "doctor {} assigned to appointment {}", doctor, appointment)
            }
            EngineEvent::AppointmentStatusChanged { appointment, from, to } => {
                write!(f, "appointment {} {} -> {}", appointment, from, to)
            }
            EngineEvent::PaymentCreated { payment, order_id, amount } => {
                write!(f, "payment {} created (order {}, amount {})", payment, order_id, amount)
            }
            EngineEvent::PaymentStatusChanged { payment, order_id, from, to } => {
                write!(f, "payment {} (order {}) {} -> {}", payment, order_id, from, to)
            }
            EngineEvent::UserCreated { user, role } => write!(f, "user {} created as {}", user, role),
            EngineEvent::UserUpdated { user } => write!(f, "user {} updated", user),
            EngineEvent::UserLoggedIn { user } => write!(f, "user {} logged in", user),
            EngineEvent::EmergencyCaseRegistered { case, severity } => {
                write!(f, "emergency case {} registered ({})", case, severity)
            }
        }
    }
}

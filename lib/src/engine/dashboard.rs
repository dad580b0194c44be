// lib/src/engine/dashboard.rs
//! Per-role read projections. Each view is built under a single read guard,
//! so every panel of one response reflects the same committed state.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use simrs_models::{
    AdminDashboard, AppointmentStatus, BedAllocation, DashboardKind, DashboardView, DoctorAppointment,
    DoctorBedAllocation, DoctorDashboard, EmergencyCaseSummary, EmergencyDashboard, HospitalResult, NurseAllocation,
    NurseDashboard, PatientAppointment, PatientBedAllocation, PatientDashboard, PatientPayment, PaymentId, PaymentStatus,
    PaymentSummary, PaymentTransaction, PendingAssignment, ReceptionistDashboard, ReservedBedSummary, Role, WardId,
};
use simrs_security::Actor;

use super::appointment::by_schedule;
use super::state::HospitalState;
use super::HospitalEngine;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DashboardFilter {
    #[serde(default)]
    pub ward: Option<WardId>,
}

const ALL_PAYMENT_STATUSES: [PaymentStatus; 3] = [PaymentStatus::Waiting, PaymentStatus::Paid, PaymentStatus::Failed];

fn fee_paid(state: &HospitalState, payment: PaymentId) -> bool {
    state
        .payments
        .get(&payment)
        .map_or(false, |p| p.status == PaymentStatus::Paid)
}

fn open_allocations(state: &HospitalState) -> Vec<&BedAllocation> {
    let mut open: Vec<&BedAllocation> = state.allocations.values().filter(|a| a.is_open()).collect();
    open.sort_by(|a, b| a.admitted_at.cmp(&b.admitted_at).then_with(|| a.id.cmp(&b.id)));
    open
}

fn payment_summary(state: &HospitalState, payment: &PaymentTransaction) -> PaymentSummary {
    PaymentSummary {
        id: payment.id,
        order_id: payment.order_id.clone(),
        patient: state.display_name(payment.patient),
        amount: payment.amount,
        status: payment.status,
        created_at: payment.created_at,
    }
}

fn newest_payments<'a>(payments: impl Iterator<Item = &'a PaymentTransaction>, limit: usize) -> Vec<&'a PaymentTransaction> {
    let mut payments: Vec<&PaymentTransaction> = payments.collect();
    payments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.order_id.cmp(&b.order_id)));
    payments.truncate(limit);
    payments
}

impl HospitalEngine {
    /// Reads the `kind` dashboard as of `at`.
    pub async fn dashboard(
        &self,
        actor: &Actor,
        kind: DashboardKind,
        at: DateTime<Utc>,
        filter: &DashboardFilter,
    ) -> HospitalResult<DashboardView> {
        self.roles.authorize_dashboard(actor, kind)?;
        let state = self.state.read().await;
        let view = match kind {
            DashboardKind::Doctor => DashboardView::Doctor(self.doctor_view(&state, actor, at)),
            DashboardKind::Nurse => DashboardView::Nurse(nurse_view(&state, filter)),
            DashboardKind::Emergency => DashboardView::Emergency(self.emergency_view(&state, at)),
            DashboardKind::Receptionist => DashboardView::Receptionist(self.receptionist_view(&state)),
            DashboardKind::HospitalAdmin | DashboardKind::SuperAdmin => DashboardView::Admin(admin_view(&state)),
            DashboardKind::Patient => DashboardView::Patient(self.patient_view(&state, actor, at)),
        };
        Ok(view)
    }

    fn doctor_view(&self, state: &HospitalState, actor: &Actor, at: DateTime<Utc>) -> DoctorDashboard {
        let mut own: Vec<_> = state
            .appointments
            .values()
            .filter(|a| a.doctor == Some(actor.user_id))
            .filter(|a| match a.status {
                AppointmentStatus::Confirmed => a.scheduled_start >= at,
                AppointmentStatus::CheckedIn => true,
                _ => false,
            })
            .collect();
        own.sort_by(|a, b| by_schedule(a, b));
        let upcoming_appointments = own
            .into_iter()
            .map(|a| DoctorAppointment {
                id: a.id,
                patient: state.display_name(a.patient),
                appointment_type: a.appointment_type,
                start: a.scheduled_start,
                location: a.location.clone(),
                status: a.status,
            })
            .collect();

        let pending_assignments = if matches!(actor.role, Role::MedicalDirector | Role::SuperAdmin) {
            let mut pending: Vec<_> = state
                .appointments
                .values()
                .filter(|a| a.status == AppointmentStatus::Pending)
                .collect();
            pending.sort_by(|a, b| by_schedule(a, b));
            pending
                .into_iter()
                .map(|a| PendingAssignment {
                    id: a.id,
                    patient: state.display_name(a.patient),
                    appointment_type: a.appointment_type,
                    start: a.scheduled_start,
                    end: a.scheduled_end,
                    purpose: a.purpose.clone(),
                    administration_fee_paid: fee_paid(state, a.administration_payment),
                })
                .collect()
        } else {
            Vec::new()
        };

        let active_bed_allocations = open_allocations(state)
            .into_iter()
            .filter(|a| a.attending_staff == Some(actor.user_id))
            .filter_map(|a| {
                let bed = state.beds.get(&a.bed)?;
                let (bed_number, room, ward) = state.bed_location(a.bed);
                Some(DoctorBedAllocation {
                    allocation_id: a.id,
                    patient: state.display_name(a.patient),
                    bed: bed_number,
                    room,
                    ward,
                    status: bed.status,
                    admitted_at: a.admitted_at,
                })
            })
            .collect();

        DoctorDashboard { upcoming_appointments, pending_assignments, active_bed_allocations }
    }

    fn emergency_view(&self, state: &HospitalState, at: DateTime<Utc>) -> EmergencyDashboard {
        let window_start = at - Duration::hours(24);
        let cases_last_24h = state
            .emergency_cases
            .values()
            .filter(|c| c.arrival_time > window_start && c.arrival_time <= at)
            .count();

        let mut cases: Vec<_> = state.emergency_cases.values().collect();
        cases.sort_by(|a, b| b.arrival_time.cmp(&a.arrival_time).then_with(|| a.id.cmp(&b.id)));
        let recent_cases = cases
            .into_iter()
            .take(self.settings.recent_limit)
            .map(|c| EmergencyCaseSummary {
                id: c.id,
                patient: c.patient_name.clone(),
                severity: c.severity,
                arrival_time: c.arrival_time,
                attending_physician: c.attending_physician.map(|p| state.display_name(p)),
            })
            .collect();

        let mut reserved_beds: Vec<ReservedBedSummary> = state
            .beds
            .values()
            .filter(|b| b.reserved_for_triage.is_some())
            .map(|b| {
                let (bed, room, ward) = state.bed_location(b.id);
                ReservedBedSummary { bed_id: b.id, bed, room, ward, case: b.reserved_for_triage }
            })
            .collect();
        reserved_beds.sort_by(|a, b| (&a.ward, &a.room, &a.bed).cmp(&(&b.ward, &b.room, &b.bed)));

        EmergencyDashboard { recent_cases, reserved_beds, cases_last_24h }
    }

    fn receptionist_view(&self, state: &HospitalState) -> ReceptionistDashboard {
        let pending_activation_requests = state.users.values().filter(|u| u.awaiting_activation()).count();

        let mut waiting: Vec<&PaymentTransaction> = state
            .payments
            .values()
            .filter(|p| p.status == PaymentStatus::Waiting)
            .collect();
        waiting.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.order_id.cmp(&b.order_id)));
        let payments_waiting = waiting.into_iter().map(|p| payment_summary(state, p)).collect();

        let recent_payments = newest_payments(state.payments.values(), self.settings.recent_limit)
            .into_iter()
            .map(|p| payment_summary(state, p))
            .collect();

        ReceptionistDashboard { pending_activation_requests, payments_waiting, recent_payments }
    }

    fn patient_view(&self, state: &HospitalState, actor: &Actor, at: DateTime<Utc>) -> PatientDashboard {
        let mut own: Vec<_> = state
            .appointments
            .values()
            .filter(|a| a.patient == actor.user_id)
            .filter(|a| !a.status.is_terminal() && a.scheduled_end >= at)
            .collect();
        own.sort_by(|a, b| by_schedule(a, b));
        let upcoming_appointments = own
            .into_iter()
            .map(|a| PatientAppointment {
                id: a.id,
                doctor: a.doctor.map(|d| state.display_name(d)),
                appointment_type: a.appointment_type,
                start: a.scheduled_start,
                end: a.scheduled_end,
                location: a.location.clone(),
                status: a.status,
                purpose: a.purpose.clone(),
                notes_for_patient: a.notes_for_patient.clone(),
                administration_fee: a.administration_fee,
                administration_fee_paid: fee_paid(state, a.administration_payment),
            })
            .collect();

        let active_bed_allocation = state.open_allocation_for_patient(actor.user_id).map(|a| {
            let (bed, room, ward) = state.bed_location(a.bed);
            PatientBedAllocation {
                allocation_id: a.id,
                bed,
                room,
                ward,
                admitted_at: a.admitted_at,
                attending_staff: a.attending_staff.map(|s| state.display_name(s)),
            }
        });

        let recent_payments = newest_payments(
            state.payments.values().filter(|p| p.patient == actor.user_id),
            self.settings.recent_limit,
        )
        .into_iter()
        .map(|p| PatientPayment {
            id: p.id,
            order_id: p.order_id.clone(),
            amount: p.amount,
            status: p.status,
            created_at: p.created_at,
            description: p.description.clone(),
        })
        .collect();

        PatientDashboard { upcoming_appointments, active_bed_allocation, recent_payments }
    }
}

fn nurse_view(state: &HospitalState, filter: &DashboardFilter) -> NurseDashboard {
    let active_allocations = open_allocations(state)
        .into_iter()
        .filter_map(|a| {
            let bed = state.beds.get(&a.bed)?;
            if filter.ward.is_some() && state.ward_of_bed(bed) != filter.ward {
                return None;
            }
            let (bed_number, room, ward) = state.bed_location(a.bed);
            Some(NurseAllocation {
                allocation_id: a.id,
                patient: state.display_name(a.patient),
                bed: bed_number,
                room,
                ward,
                attending_staff: a.attending_staff.map(|s| state.display_name(s)),
                status: bed.status,
                admitted_at: a.admitted_at,
            })
        })
        .collect();
    NurseDashboard { active_allocations }
}

fn admin_view(state: &HospitalState) -> AdminDashboard {
    let mut users_by_role: BTreeMap<String, usize> =
        Role::ALL.iter().map(|r| (r.as_str().to_string(), 0)).collect();
    for user in state.users.values() {
        *users_by_role.entry(user.role.as_str().to_string()).or_default() += 1;
    }

    let mut payments: BTreeMap<String, usize> =
        ALL_PAYMENT_STATUSES.iter().map(|s| (s.to_string(), 0)).collect();
    let mut payment_totals: BTreeMap<String, i64> =
        ALL_PAYMENT_STATUSES.iter().map(|s| (s.to_string(), 0)).collect();
    for payment in state.payments.values() {
        *payments.entry(payment.status.to_string()).or_default() += 1;
        let total = payment_totals.entry(payment.status.to_string()).or_default();
        *total = total.saturating_add(payment.amount);
    }

    AdminDashboard {
        users_by_role,
        payments,
        payment_totals,
        pending_activation_requests: state.users.values().filter(|u| u.awaiting_activation()).count(),
    }
}

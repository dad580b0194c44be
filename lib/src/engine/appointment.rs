// lib/src/engine/appointment.rs
use chrono::Utc;
use log::debug;
use serde::Deserialize;

use simrs_models::{
    Appointment, AppointmentId, AppointmentRequest, AppointmentStatus, DoctorAssignment, HospitalError,
    HospitalResult, PaymentId, PaymentStatus, PaymentTransaction, Role, UserId,
};
use simrs_security::{Actor, Permission};

use super::payment::{ensure_unique_order, new_order_id};
use super::state::{Changeset, HospitalState, Record};
use super::HospitalEngine;
use crate::events::EngineEvent;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppointmentFilter {
    #[serde(default)]
    pub status: Option<AppointmentStatus>,
    #[serde(default)]
    pub doctor: Option<UserId>,
    #[serde(default)]
    pub patient: Option<UserId>,
}

fn merge_text(target: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        *target = Some(value);
    }
}

/// Earliest intended service time first, then request order.
pub(crate) fn by_schedule(a: &Appointment, b: &Appointment) -> std::cmp::Ordering {
    a.scheduled_start
        .cmp(&b.scheduled_start)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

impl HospitalEngine {
    fn appointment_visible(&self, actor: &Actor, appointment: &Appointment) -> bool {
        self.can(actor, Permission::ViewAllAppointments)
            || appointment.patient == actor.user_id
            || appointment.doctor == Some(actor.user_id)
    }

    /// Creates a PENDING appointment together with its WAITING administration
    /// fee. The fee comes from configuration; a client-supplied amount is
    /// ignored. An empty or inverted interval creates nothing.
    pub async fn request_appointment(&self, actor: &Actor, request: AppointmentRequest) -> HospitalResult<Appointment> {
        self.authorize(actor, Permission::RequestAppointment)?;
        if request.scheduled_start >= request.scheduled_end {
            return Err(HospitalError::InvalidRange(format!(
                "scheduled_start {} must be before scheduled_end {}",
                request.scheduled_start, request.scheduled_end
            )));
        }
        if let Some(offered) = request.administration_fee {
            if offered != self.settings.administration_fee {
                debug!("Ignoring client-supplied administration fee {}", offered);
            }
        }
        {
            let state = self.state.read().await;
            state.patient(actor.user_id)?;
        }

        let fee = self.settings.administration_fee;
        let order_id = new_order_id("ADM");
        let description = format!(
            "Administration fee for {} appointment on {}",
            request.appointment_type,
            request.scheduled_start.format("%Y-%m-%d %H:%M")
        );
        let charge = self.gateway.open_charge(&order_id, fee, &description).await?;

        let mut state = self.state.write().await;
        let patient = state.patient(actor.user_id)?.id;
        ensure_unique_order(&state, &order_id)?;

        let now = Utc::now();
        let appointment_id = AppointmentId::generate();
        let payment = PaymentTransaction {
            id: PaymentId::generate(),
            patient,
            order_id,
            amount: fee,
            status: PaymentStatus::Waiting,
            description,
            appointment: Some(appointment_id),
            snap_token: charge.snap_token,
            redirect_url: charge.redirect_url,
            payment_type: None,
            created_at: now,
            updated_at: now,
        };
        let mut appointment = Appointment {
            id: appointment_id,
            patient,
            doctor: None,
            appointment_type: request.appointment_type,
            scheduled_start: request.scheduled_start,
            scheduled_end: request.scheduled_end,
            status: AppointmentStatus::Pending,
            purpose: None,
            location: None,
            administration_fee: fee,
            administration_payment: payment.id,
            notes_for_patient: None,
            cancelled_by: None,
            created_at: now,
            updated_at: now,
        };
        merge_text(&mut appointment.purpose, request.purpose);
        merge_text(&mut appointment.location, request.location);

        let event = EngineEvent::AppointmentRequested { appointment: appointment.id, payment: payment.id };
        let changes = Changeset::new()
            .put(Record::Payment(payment))
            .put(Record::Appointment(appointment.clone()));
        self.commit(&mut state, changes, event).await?;
        Ok(appointment)
    }

    /// Binds a doctor and confirms the appointment. Checked in order: the
    /// appointment exists, it is PENDING, the doctor exists, the fee is PAID.
    pub async fn assign_doctor(
        &self,
        actor: &Actor,
        id: AppointmentId,
        assignment: DoctorAssignment,
    ) -> HospitalResult<Appointment> {
        self.authorize(actor, Permission::AssignDoctor)?;
        let mut state = self.state.write().await;
        let mut appointment = state.appointment(id)?.clone();
        if appointment.status != AppointmentStatus::Pending {
            return Err(HospitalError::InvalidState(format!(
                "Appointment {} is {}; only PENDING appointments can be assigned",
                id, appointment.status
            )));
        }
        let doctor = state.physician(assignment.doctor)?.id;
        let fee = state.payment(appointment.administration_payment)?;
        if fee.status != PaymentStatus::Paid {
            debug!("Assignment of appointment {} blocked: fee {} is {}", id, fee.order_id, fee.status);
            return Err(HospitalError::PaymentRequired(format!(
                "Administration fee {} is {}; it must be PAID before a doctor is assigned",
                fee.order_id, fee.status
            )));
        }

        appointment.doctor = Some(doctor);
        appointment.status = AppointmentStatus::Confirmed;
        merge_text(&mut appointment.location, assignment.location);
        merge_text(&mut appointment.notes_for_patient, assignment.notes_for_patient);
        appointment.updated_at = Utc::now();

        let event = EngineEvent::DoctorAssigned { appointment: id, doctor };
        self.commit(&mut state, Changeset::new().put(Record::Appointment(appointment.clone())), event)
            .await?;
        Ok(appointment)
    }

    pub async fn check_in(&self, actor: &Actor, id: AppointmentId) -> HospitalResult<Appointment> {
        self.authorize(actor, Permission::CheckInAppointment)?;
        let mut state = self.state.write().await;
        let appointment = state.appointment(id)?.clone();
        self.transition_appointment(&mut state, appointment, AppointmentStatus::CheckedIn, None)
            .await
    }

    /// Doctors complete their own appointments; the medical director any.
    pub async fn complete(&self, actor: &Actor, id: AppointmentId) -> HospitalResult<Appointment> {
        self.authorize(actor, Permission::CompleteAppointment)?;
        let mut state = self.state.write().await;
        let appointment = state.appointment(id)?.clone();
        if actor.role == Role::Doctor && appointment.doctor != Some(actor.user_id) {
            return Err(HospitalError::Forbidden(format!("appointment {} is assigned to another doctor", id)));
        }
        self.transition_appointment(&mut state, appointment, AppointmentStatus::Completed, None)
            .await
    }

    /// The owning patient or a scheduling authority may cancel before check-in.
    /// Any fee already paid stays paid; refunds are handled by finance.
    pub async fn cancel(&self, actor: &Actor, id: AppointmentId) -> HospitalResult<Appointment> {
        let mut state = self.state.write().await;
        let appointment = state.appointment(id)?.clone();
        let owner = actor.role == Role::Patient && appointment.patient == actor.user_id;
        if !owner {
            self.authorize(actor, Permission::CancelAnyAppointment)?;
        }
        self.transition_appointment(&mut state, appointment, AppointmentStatus::Cancelled, Some(actor.user_id))
            .await
    }

    async fn transition_appointment(
        &self,
        state: &mut HospitalState,
        mut appointment: Appointment,
        to: AppointmentStatus,
        cancelled_by: Option<UserId>,
    ) -> HospitalResult<Appointment> {
        let from = appointment.status;
        if !from.can_transition_to(to) {
            return Err(HospitalError::InvalidState(format!(
                "Appointment {} cannot move from {} to {}",
                appointment.id, from, to
            )));
        }
        appointment.status = to;
        if cancelled_by.is_some() {
            appointment.cancelled_by = cancelled_by;
        }
        appointment.updated_at = Utc::now();
        let event = EngineEvent::AppointmentStatusChanged { appointment: appointment.id, from, to };
        self.commit(state, Changeset::new().put(Record::Appointment(appointment.clone())), event)
            .await?;
        Ok(appointment)
    }

    pub async fn get_appointment(&self, actor: &Actor, id: AppointmentId) -> HospitalResult<Appointment> {
        let state = self.state.read().await;
        let appointment = state.appointment(id)?;
        if !self.appointment_visible(actor, appointment) {
            return Err(HospitalError::Forbidden(format!("appointment {} is not yours", id)));
        }
        Ok(appointment.clone())
    }

    /// Patients see their own, doctors those assigned to them, and scheduling
    /// or front-office roles everything.
    pub async fn list_appointments(&self, actor: &Actor, filter: &AppointmentFilter) -> HospitalResult<Vec<Appointment>> {
        let see_all = self.can(actor, Permission::ViewAllAppointments);
        if !see_all && !actor.role.is_physician() && actor.role != Role::Patient {
            return Err(HospitalError::Forbidden(format!("role {} may not list appointments", actor.role)));
        }
        let state = self.state.read().await;
        let mut appointments: Vec<Appointment> = state
            .appointments
            .values()
            .filter(|a| self.appointment_visible(actor, a))
            .filter(|a| filter.status.map_or(true, |s| a.status == s))
            .filter(|a| filter.doctor.map_or(true, |d| a.doctor == Some(d)))
            .filter(|a| filter.patient.map_or(true, |p| a.patient == p))
            .cloned()
            .collect();
        appointments.sort_by(by_schedule);
        Ok(appointments)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::super::payment::PaymentFilter;
    use super::super::testing::{engine, seed_user};
    use super::*;
    use chrono::{DateTime, Duration, TimeZone};
    use simrs_models::{AppointmentType, GatewayNotification};

    pub(crate) fn slot(hour: u32, minutes: i64) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = Utc.with_ymd_and_hms(2030, 3, 4, hour, 0, 0).unwrap();
        (start, start + Duration::minutes(minutes))
    }

    pub(crate) fn polyclinic(start: DateTime<Utc>, end: DateTime<Utc>) -> AppointmentRequest {
        AppointmentRequest {
            appointment_type: AppointmentType::Polyclinic,
            scheduled_start: start,
            scheduled_end: end,
            purpose: Some("Annual check-up".into()),
            location: None,
            administration_fee: None,
        }
    }

    pub(crate) fn assignment(doctor: UserId) -> DoctorAssignment {
        DoctorAssignment { doctor, location: Some("Poli Umum 3".into()), notes_for_patient: None }
    }

    pub(crate) async fn settle(engine: &HospitalEngine, appointment: &Appointment) {
        let state = engine.state.read().await;
        let order_id = state.payment(appointment.administration_payment).unwrap().order_id.clone();
        drop(state);
        engine
            .apply_gateway_notification(GatewayNotification {
                order_id,
                transaction_status: "settlement".into(),
                payment_type: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn should_reject_inverted_range_without_side_effects() {
        let engine = engine().await;
        let patient = seed_user(&engine, "pasien", Role::Patient).await;
        let (start, end) = slot(10, 30);

        let err = engine.request_appointment(&patient, polyclinic(end, start)).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_RANGE");
        let err = engine.request_appointment(&patient, polyclinic(start, start)).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_RANGE");

        assert!(engine.list_appointments(&patient, &AppointmentFilter::default()).await.unwrap().is_empty());
        assert!(engine.list_payments(&patient, &PaymentFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_ignore_client_supplied_fee() {
        let engine = engine().await;
        let patient = seed_user(&engine, "pasien", Role::Patient).await;
        let (start, end) = slot(10, 30);
        let mut request = polyclinic(start, end);
        request.administration_fee = Some(1);

        let appointment = engine.request_appointment(&patient, request).await.unwrap();
        assert_eq!(appointment.administration_fee, 50_000);
        let payments = engine.list_payments(&patient, &PaymentFilter::default()).await.unwrap();
        assert_eq!(payments[0].amount, 50_000);
        assert_eq!(payments[0].appointment, Some(appointment.id));
    }

    #[tokio::test]
    async fn should_gate_assignment_on_paid_fee() {
        let engine = engine().await;
        let patient = seed_user(&engine, "pasien", Role::Patient).await;
        let director = seed_user(&engine, "direktur", Role::MedicalDirector).await;
        let doctor = seed_user(&engine, "dr-andi", Role::Doctor).await;
        let (start, end) = slot(10, 30);
        let appointment = engine.request_appointment(&patient, polyclinic(start, end)).await.unwrap();

        let err = engine
            .assign_doctor(&director, appointment.id, assignment(doctor.user_id))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "PAYMENT_REQUIRED");

        settle(&engine, &appointment).await;
        let confirmed = engine
            .assign_doctor(&director, appointment.id, assignment(doctor.user_id))
            .await
            .unwrap();
        assert_eq!(confirmed.status, AppointmentStatus::Confirmed);
        assert_eq!(confirmed.doctor, Some(doctor.user_id));
        assert_eq!(confirmed.location.as_deref(), Some("Poli Umum 3"));

        let err = engine
            .assign_doctor(&director, appointment.id, assignment(doctor.user_id))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");
    }

    #[tokio::test]
    async fn should_check_assignment_preconditions_in_order() {
        let engine = engine().await;
        let patient = seed_user(&engine, "pasien", Role::Patient).await;
        let director = seed_user(&engine, "direktur", Role::MedicalDirector).await;
        let nurse = seed_user(&engine, "nurse", Role::Nurse).await;
        let (start, end) = slot(9, 15);
        let appointment = engine.request_appointment(&patient, polyclinic(start, end)).await.unwrap();

        let err = engine
            .assign_doctor(&director, AppointmentId::generate(), assignment(nurse.user_id))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
        // A nurse is not a doctor, even before the fee is settled.
        let err = engine
            .assign_doctor(&director, appointment.id, assignment(nurse.user_id))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");

        let doctor = seed_user(&engine, "dr-andi", Role::Doctor).await;
        let err = engine.assign_doctor(&doctor, appointment.id, assignment(doctor.user_id)).await.unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");
    }

    #[tokio::test]
    async fn should_walk_the_visit_workflow() {
        let engine = engine().await;
        let patient = seed_user(&engine, "pasien", Role::Patient).await;
        let director = seed_user(&engine, "direktur", Role::MedicalDirector).await;
        let doctor = seed_user(&engine, "dr-andi", Role::Doctor).await;
        let other_doctor = seed_user(&engine, "dr-budi", Role::Doctor).await;
        let front_desk = seed_user(&engine, "cs", Role::CustomerService).await;
        let (start, end) = slot(10, 30);
        let appointment = engine.request_appointment(&patient, polyclinic(start, end)).await.unwrap();

        let err = engine.check_in(&front_desk, appointment.id).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");

        settle(&engine, &appointment).await;
        engine.assign_doctor(&director, appointment.id, assignment(doctor.user_id)).await.unwrap();
        engine.check_in(&front_desk, appointment.id).await.unwrap();

        let err = engine.cancel(&patient, appointment.id).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");
        let err = engine.complete(&other_doctor, appointment.id).await.unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");

        let done = engine.complete(&doctor, appointment.id).await.unwrap();
        assert_eq!(done.status, AppointmentStatus::Completed);
    }

    #[tokio::test]
    async fn should_let_only_owner_or_director_cancel() {
        let engine = engine().await;
        let siti = seed_user(&engine, "siti", Role::Patient).await;
        let budi = seed_user(&engine, "budi", Role::Patient).await;
        let director = seed_user(&engine, "direktur", Role::MedicalDirector).await;
        let (start, end) = slot(11, 30);
        let first = engine.request_appointment(&siti, polyclinic(start, end)).await.unwrap();
        let second = engine.request_appointment(&siti, polyclinic(start, end)).await.unwrap();

        let err = engine.cancel(&budi, first.id).await.unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");

        let cancelled = engine.cancel(&siti, first.id).await.unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        assert_eq!(cancelled.cancelled_by, Some(siti.user_id));

        let by_director = engine.cancel(&director, second.id).await.unwrap();
        assert_eq!(by_director.cancelled_by, Some(director.user_id));
    }

    #[tokio::test]
    async fn should_order_listing_by_scheduled_start() {
        let engine = engine().await;
        let patient = seed_user(&engine, "pasien", Role::Patient).await;
        let director = seed_user(&engine, "direktur", Role::MedicalDirector).await;
        let (late_start, late_end) = slot(15, 30);
        let (early_start, early_end) = slot(8, 30);

        let late = engine.request_appointment(&patient, polyclinic(late_start, late_end)).await.unwrap();
        let early = engine.request_appointment(&patient, polyclinic(early_start, early_end)).await.unwrap();

        let pending = AppointmentFilter { status: Some(AppointmentStatus::Pending), ..Default::default() };
        let listed = engine.list_appointments(&director, &pending).await.unwrap();
        let ids: Vec<AppointmentId> = listed.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![early.id, late.id]);

        let pharmacist = seed_user(&engine, "pharm", Role::Pharmacist).await;
        let err = engine.list_appointments(&pharmacist, &pending).await.unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");
    }
}

// lib/src/engine/emergency.rs
use chrono::Utc;
use log::debug;

use simrs_models::{
    Bed, BedId, BedStatus, EmergencyCase, EmergencyCaseId, HospitalError, HospitalResult, NewEmergencyCase,
    TriageReservation,
};
use simrs_security::{Actor, Permission};

use super::state::{Changeset, Record};
use super::HospitalEngine;
use crate::events::EngineEvent;

impl HospitalEngine {
    pub async fn register_case(&self, actor: &Actor, new_case: NewEmergencyCase) -> HospitalResult<EmergencyCase> {
        self.authorize(actor, Permission::RegisterEmergencyCase)?;
        let patient_name = new_case.patient_name.trim().to_string();
        if patient_name.is_empty() {
            return Err(HospitalError::InvalidData("patient_name must not be empty".into()));
        }

        let mut state = self.state.write().await;
        if let Some(patient) = new_case.patient {
            state.patient(patient)?;
        }
        if let Some(physician) = new_case.attending_physician {
            state.physician(physician)?;
        }
        let now = Utc::now();
        let case = EmergencyCase {
            id: EmergencyCaseId::generate(),
            patient_name,
            patient: new_case.patient,
            severity: new_case.severity,
            arrival_time: new_case.arrival_time.unwrap_or(now),
            attending_physician: new_case.attending_physician,
            complaint: new_case.complaint.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
            created_by: actor.user_id,
            created_at: now,
        };
        let event = EngineEvent::EmergencyCaseRegistered { case: case.id, severity: case.severity };
        self.commit(&mut state, Changeset::new().put(Record::EmergencyCase(case.clone())), event)
            .await?;
        Ok(case)
    }

    /// Most recent arrival first.
    pub async fn list_cases(&self, actor: &Actor) -> HospitalResult<Vec<EmergencyCase>> {
        if !actor.role.is_staff() {
            return Err(HospitalError::Forbidden(format!("role {} may not view emergency cases", actor.role)));
        }
        let state = self.state.read().await;
        let mut cases: Vec<EmergencyCase> = state.emergency_cases.values().cloned().collect();
        cases.sort_by(|a, b| b.arrival_time.cmp(&a.arrival_time).then_with(|| a.id.cmp(&b.id)));
        Ok(cases)
    }

    /// Holds an AVAILABLE bed for an incoming case. A case holds at most one bed.
    pub async fn reserve_bed(&self, actor: &Actor, id: BedId, reservation: TriageReservation) -> HospitalResult<Bed> {
        self.authorize(actor, Permission::ReserveTriageBed)?;
        let mut state = self.state.write().await;
        let mut bed = state.bed(id)?.clone();
        let case = state.emergency_case(reservation.case)?.id;

        if let Some(holder) = bed.reserved_for_triage {
            return Err(HospitalError::Conflict(format!("Bed {} is already reserved for case {}", id, holder)));
        }
        if bed.status != BedStatus::Available {
            debug!("Reservation of bed {} rejected: bed is {}", id, bed.status);
            return Err(HospitalError::Conflict(format!("Bed {} is {} and cannot be reserved", id, bed.status)));
        }
        if let Some(other) = state.beds.values().find(|b| b.reserved_for_triage == Some(case)) {
            return Err(HospitalError::Conflict(format!("Case {} already holds bed {}", case, other.id)));
        }

        bed.reserved_for_triage = Some(case);
        bed.updated_at = Utc::now();
        let event = EngineEvent::BedReserved { bed: id, case };
        self.commit(&mut state, Changeset::new().put(Record::Bed(bed.clone())), event)
            .await?;
        Ok(bed)
    }

    pub async fn release_reservation(&self, actor: &Actor, id: BedId) -> HospitalResult<Bed> {
        self.authorize(actor, Permission::ReserveTriageBed)?;
        let mut state = self.state.write().await;
        let mut bed = state.bed(id)?.clone();
        if bed.reserved_for_triage.is_none() {
            return Err(HospitalError::InvalidState(format!("Bed {} is not reserved", id)));
        }
        bed.reserved_for_triage = None;
        bed.updated_at = Utc::now();
        let event = EngineEvent::BedReservationReleased { bed: id };
        self.commit(&mut state, Changeset::new().put(Record::Bed(bed.clone())), event)
            .await?;
        Ok(bed)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::super::allocation::tests::{admission, mawar_ward};
    use super::super::testing::{engine, seed_user};
    use super::*;
    use crate::engine::AvailabilityFilter;
    use chrono::{DateTime, Duration};
    use simrs_models::{Role, TriageSeverity};

    pub(crate) fn arrival(name: &str, severity: TriageSeverity, at: Option<DateTime<Utc>>) -> NewEmergencyCase {
        NewEmergencyCase {
            patient_name: name.into(),
            patient: None,
            severity,
            arrival_time: at,
            attending_physician: None,
            complaint: Some("chest pain".into()),
        }
    }

    #[tokio::test]
    async fn should_register_cases_newest_first() {
        let engine = engine().await;
        let triage = seed_user(&engine, "triage", Role::Triage).await;
        let ambulance = seed_user(&engine, "ambulance", Role::Ambulance).await;
        let earlier = Utc::now() - Duration::hours(2);

        engine.register_case(&ambulance, arrival("Budi", TriageSeverity::Urgent, Some(earlier))).await.unwrap();
        let latest = engine.register_case(&triage, arrival("Ani", TriageSeverity::Emergent, None)).await.unwrap();
        assert_eq!(latest.created_by, triage.user_id);

        let cases = engine.list_cases(&triage).await.unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].id, latest.id);

        let patient = seed_user(&engine, "pasien", Role::Patient).await;
        assert_eq!(engine.list_cases(&patient).await.unwrap_err().code(), "FORBIDDEN");
        let err = engine.register_case(&triage, arrival("  ", TriageSeverity::Urgent, None)).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_DATA");
    }

    #[tokio::test]
    async fn should_reject_unknown_attending_physician() {
        let engine = engine().await;
        let triage = seed_user(&engine, "triage", Role::Triage).await;
        let nurse = seed_user(&engine, "nurse", Role::Nurse).await;
        let mut case = arrival("Budi", TriageSeverity::Urgent, None);
        case.attending_physician = Some(nurse.user_id);
        assert_eq!(engine.register_case(&triage, case).await.unwrap_err().code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn should_hide_reserved_beds_and_consume_reservation_on_admission() {
        let engine = engine().await;
        let beds = mawar_ward(&engine, 2).await;
        let triage = seed_user(&engine, "triage", Role::Triage).await;
        let nurse = seed_user(&engine, "nurse", Role::Nurse).await;
        let patient = seed_user(&engine, "pasien", Role::Patient).await;
        let case = engine.register_case(&triage, arrival("Budi", TriageSeverity::Emergent, None)).await.unwrap();

        let reserved = engine.reserve_bed(&triage, beds[0], TriageReservation { case: case.id }).await.unwrap();
        assert_eq!(reserved.reserved_for_triage, Some(case.id));
        let available = engine.list_available_beds(&nurse, &AvailabilityFilter::default()).await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, beds[1]);

        let err = engine.reserve_bed(&triage, beds[1], TriageReservation { case: case.id }).await.unwrap_err();
        assert_eq!(err.code(), "CONFLICT");

        engine.allocate(&nurse, admission(beds[0], patient.user_id)).await.unwrap();
        let bed = engine.get_bed(&nurse, beds[0]).await.unwrap();
        assert_eq!(bed.status, BedStatus::Occupied);
        assert_eq!(bed.reserved_for_triage, None);
    }

    #[tokio::test]
    async fn should_only_reserve_available_beds() {
        let engine = engine().await;
        let beds = mawar_ward(&engine, 1).await;
        let triage = seed_user(&engine, "triage", Role::Triage).await;
        let ambulance = seed_user(&engine, "ambulance", Role::Ambulance).await;
        let nurse = seed_user(&engine, "nurse", Role::Nurse).await;
        let patient = seed_user(&engine, "pasien", Role::Patient).await;
        let case = engine.register_case(&triage, arrival("Budi", TriageSeverity::Urgent, None)).await.unwrap();

        let err = engine.reserve_bed(&ambulance, beds[0], TriageReservation { case: case.id }).await.unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");
        let err = engine.release_reservation(&triage, beds[0]).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");

        engine.allocate(&nurse, admission(beds[0], patient.user_id)).await.unwrap();
        let err = engine.reserve_bed(&triage, beds[0], TriageReservation { case: case.id }).await.unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
        let err = engine
            .reserve_bed(&triage, beds[0], TriageReservation { case: EmergencyCaseId::generate() })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }
}

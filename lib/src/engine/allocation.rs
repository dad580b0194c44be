// lib/src/engine/allocation.rs
use chrono::{DateTime, Utc};
use log::debug;
use serde::Deserialize;

use simrs_models::{
    AllocationId, AllocationPatch, BedAllocation, BedId, BedStatus, HospitalError, HospitalResult,
    NewAllocation, Role, UserId,
};
use simrs_security::{Actor, Permission};

use super::state::{Changeset, HospitalState, Record};
use super::HospitalEngine;
use crate::events::EngineEvent;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AllocationFilter {
    /// `true` for open allocations, `false` for discharged ones.
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub patient: Option<UserId>,
    #[serde(default)]
    pub bed: Option<BedId>,
}

fn visible_to(actor: &Actor, allocation: &BedAllocation) -> bool {
    actor.role.is_staff() || (actor.role == Role::Patient && allocation.patient == actor.user_id)
}

impl HospitalEngine {
    /// Admits a patient. The availability check and the AVAILABLE -> OCCUPIED
    /// transition happen under one write guard, so two admissions racing for
    /// the same bed cannot both pass.
    pub async fn allocate(&self, actor: &Actor, request: NewAllocation) -> HospitalResult<BedAllocation> {
        self.authorize(actor, Permission::AllocateBed)?;
        let mut state = self.state.write().await;

        let mut bed = state.bed(request.bed)?.clone();
        let patient = state.patient(request.patient)?.id;
        let attending_staff = match request.attending_staff {
            Some(staff) => Some(state.staff(staff)?.id),
            None if actor.role.is_physician() => Some(actor.user_id),
            None => None,
        };

        if !bed.is_allocatable() {
            debug!("Rejected admission to bed {} in {}", bed.id, bed.status);
            return Err(HospitalError::Conflict(format!(
                "Bed {} is {} and cannot take a new admission",
                bed.bed_number, bed.status
            )));
        }
        if let Some(open) = state.open_allocation_for_bed(bed.id) {
            return Err(HospitalError::Conflict(format!(
                "Bed {} already has open allocation {}",
                bed.bed_number, open.id
            )));
        }
        if let Some(open) = state.open_allocation_for_patient(patient) {
            return Err(HospitalError::Conflict(format!(
                "Patient {} is already admitted (allocation {})",
                state.display_name(patient),
                open.id
            )));
        }

        let now = Utc::now();
        let allocation = BedAllocation {
            id: AllocationId::generate(),
            bed: bed.id,
            patient,
            attending_staff,
            admitted_at: request.admitted_at.unwrap_or(now),
            discharged_at: None,
            notes: request.notes.filter(|n| !n.trim().is_empty()),
            created_by: actor.user_id,
        };
        if let Some(case) = bed.reserved_for_triage.take() {
            debug!("Admission to bed {} consumes triage reservation for case {}", bed.id, case);
        }
        bed.status = BedStatus::Occupied;
        bed.updated_at = now;

        let event = EngineEvent::PatientAdmitted { allocation: allocation.id, bed: bed.id, patient };
        let changes = Changeset::new()
            .put(Record::Bed(bed))
            .put(Record::Allocation(allocation.clone()));
        self.commit(&mut state, changes, event).await?;
        Ok(allocation)
    }

    /// Closes an open allocation and sends its bed to CLEANING. A second
    /// discharge of the same allocation is a `Conflict`.
    pub async fn discharge(
        &self,
        actor: &Actor,
        id: AllocationId,
        discharged_at: Option<DateTime<Utc>>,
    ) -> HospitalResult<BedAllocation> {
        self.update_allocation(
            actor,
            id,
            AllocationPatch {
                discharged_at: Some(discharged_at.unwrap_or_else(Utc::now)),
                ..Default::default()
            },
        )
        .await
    }

    /// `PATCH` semantics: a `discharged_at` discharges, otherwise notes and
    /// attending staff are edited on the open allocation.
    pub async fn update_allocation(
        &self,
        actor: &Actor,
        id: AllocationId,
        patch: AllocationPatch,
    ) -> HospitalResult<BedAllocation> {
        let discharging = patch.discharged_at.is_some();
        let permission = if discharging { Permission::DischargeBed } else { Permission::AllocateBed };
        self.authorize(actor, permission)?;

        let mut state = self.state.write().await;
        let mut allocation = state.allocation(id)?.clone();
        if !allocation.is_open() {
            return Err(HospitalError::Conflict(format!("Allocation {} is already discharged", id)));
        }
        if let Some(staff) = patch.attending_staff {
            allocation.attending_staff = Some(state.staff(staff)?.id);
        }
        if let Some(notes) = patch.notes {
            allocation.notes = Some(notes).filter(|n| !n.trim().is_empty());
        }

        match patch.discharged_at {
            Some(at) => self.commit_discharge(&mut state, allocation, at).await,
            None => {
                let event = EngineEvent::AllocationUpdated { allocation: id };
                self.commit(&mut state, Changeset::new().put(Record::Allocation(allocation.clone())), event)
                    .await?;
                Ok(allocation)
            }
        }
    }

    async fn commit_discharge(
        &self,
        state: &mut HospitalState,
        mut allocation: BedAllocation,
        at: DateTime<Utc>,
    ) -> HospitalResult<BedAllocation> {
        if at < allocation.admitted_at {
            return Err(HospitalError::InvalidRange(format!(
                "discharged_at {} is before admitted_at {}",
                at, allocation.admitted_at
            )));
        }
        let mut bed = state.bed(allocation.bed)?.clone();
        if !bed.status.can_transition_to(BedStatus::Cleaning) {
            return Err(HospitalError::InvalidState(format!(
                "Bed {} is {} while allocation {} is open",
                bed.bed_number, bed.status, allocation.id
            )));
        }
        bed.status = BedStatus::Cleaning;
        bed.updated_at = Utc::now();
        allocation.discharged_at = Some(at);

        let event = EngineEvent::PatientDischarged { allocation: allocation.id, bed: bed.id };
        let changes = Changeset::new()
            .put(Record::Bed(bed))
            .put(Record::Allocation(allocation.clone()));
        self.commit(state, changes, event).await?;
        Ok(allocation)
    }

    pub async fn get_allocation(&self, actor: &Actor, id: AllocationId) -> HospitalResult<BedAllocation> {
        let state = self.state.read().await;
        let allocation = state.allocation(id)?;
        if !visible_to(actor, allocation) {
            return Err(HospitalError::Forbidden(format!("allocation {} belongs to another patient", id)));
        }
        Ok(allocation.clone())
    }

    /// Staff see every allocation, patients only their own. Newest admission first.
    pub async fn list_allocations(
        &self,
        actor: &Actor,
        filter: &AllocationFilter,
    ) -> HospitalResult<Vec<BedAllocation>> {
        if !actor.role.is_staff() && actor.role != Role::Patient {
            return Err(HospitalError::Forbidden(format!("role {} may not list bed allocations", actor.role)));
        }
        let state = self.state.read().await;
        let mut allocations: Vec<BedAllocation> = state
            .allocations
            .values()
            .filter(|a| visible_to(actor, a))
            .filter(|a| filter.active.map_or(true, |active| a.is_open() == active))
            .filter(|a| filter.patient.map_or(true, |p| a.patient == p))
            .filter(|a| filter.bed.map_or(true, |b| a.bed == b))
            .cloned()
            .collect();
        allocations.sort_by(|a, b| b.admitted_at.cmp(&a.admitted_at).then_with(|| a.id.cmp(&b.id)));
        Ok(allocations)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::super::testing::{engine, seed_user};
    use super::super::HospitalEngine;
    use super::*;
    use chrono::Duration;
    use simrs_models::{NewBed, NewRoom, NewWard, RoomType};

    /// Ward "Mawar" with room 201 and `beds` beds; returns the bed ids.
    pub(crate) async fn mawar_ward(engine: &HospitalEngine, beds: usize) -> Vec<BedId> {
        let admin = seed_user(engine, "ward-admin", Role::HospitalAdmin).await;
        let ward = engine
            .create_ward(
                &admin,
                NewWard {
                    name: "Mawar".into(),
                    code: "MW".into(),
                    floor: 2,
                    department: String::new(),
                    has_elderly_support: false,
                },
            )
            .await
            .unwrap();
        let room = engine
            .create_room(
                &admin,
                NewRoom {
                    ward: ward.id,
                    room_number: "201".into(),
                    room_type: RoomType::General,
                    capacity: 2,
                    accessibility_notes: None,
                },
            )
            .await
            .unwrap();
        let mut ids = Vec::new();
        for n in 1..=beds {
            let created = engine
                .create_bed(
                    &admin,
                    NewBed {
                        room: room.id,
                        bed_number: n.to_string(),
                        status: None,
                        supports_elderly: false,
                        equipment: Default::default(),
                    },
                )
                .await
                .unwrap();
            ids.push(created.bed.id);
        }
        ids
    }

    pub(crate) fn admission(bed: BedId, patient: UserId) -> NewAllocation {
        NewAllocation { bed, patient, attending_staff: None, admitted_at: None, notes: None }
    }

    #[tokio::test]
    async fn should_occupy_bed_and_default_attending_to_physician() {
        let engine = engine().await;
        let beds = mawar_ward(&engine, 1).await;
        let doctor = seed_user(&engine, "dr-andi", Role::Doctor).await;
        let patient = seed_user(&engine, "pasien", Role::Patient).await;

        let allocation = engine.allocate(&doctor, admission(beds[0], patient.user_id)).await.unwrap();
        assert_eq!(allocation.attending_staff, Some(doctor.user_id));
        assert_eq!(engine.get_bed(&doctor, beds[0]).await.unwrap().status, BedStatus::Occupied);
    }

    #[tokio::test]
    async fn should_keep_one_open_allocation_per_patient() {
        let engine = engine().await;
        let beds = mawar_ward(&engine, 2).await;
        let nurse = seed_user(&engine, "nurse", Role::Nurse).await;
        let patient = seed_user(&engine, "pasien", Role::Patient).await;

        engine.allocate(&nurse, admission(beds[0], patient.user_id)).await.unwrap();
        let err = engine.allocate(&nurse, admission(beds[1], patient.user_id)).await.unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
        // The second bed is untouched by the rejected admission.
        assert_eq!(engine.get_bed(&nurse, beds[1]).await.unwrap().status, BedStatus::Available);
    }

    #[tokio::test]
    async fn should_reject_unknown_or_non_patient_accounts() {
        let engine = engine().await;
        let beds = mawar_ward(&engine, 1).await;
        let nurse = seed_user(&engine, "nurse", Role::Nurse).await;

        let err = engine.allocate(&nurse, admission(beds[0], UserId::generate())).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
        let err = engine.allocate(&nurse, admission(beds[0], nurse.user_id)).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn should_discharge_once_then_conflict() {
        let engine = engine().await;
        let beds = mawar_ward(&engine, 1).await;
        let nurse = seed_user(&engine, "nurse", Role::Nurse).await;
        let patient = seed_user(&engine, "pasien", Role::Patient).await;
        let allocation = engine.allocate(&nurse, admission(beds[0], patient.user_id)).await.unwrap();

        let discharged = engine.discharge(&nurse, allocation.id, None).await.unwrap();
        assert!(discharged.discharged_at.is_some());
        assert_eq!(engine.get_bed(&nurse, beds[0]).await.unwrap().status, BedStatus::Cleaning);

        let err = engine.discharge(&nurse, allocation.id, None).await.unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
        assert_eq!(engine.get_bed(&nurse, beds[0]).await.unwrap().status, BedStatus::Cleaning);

        let err = engine.allocate(&nurse, admission(beds[0], patient.user_id)).await.unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
    }

    #[tokio::test]
    async fn should_reject_discharge_before_admission() {
        let engine = engine().await;
        let beds = mawar_ward(&engine, 1).await;
        let nurse = seed_user(&engine, "nurse", Role::Nurse).await;
        let patient = seed_user(&engine, "pasien", Role::Patient).await;
        let allocation = engine.allocate(&nurse, admission(beds[0], patient.user_id)).await.unwrap();

        let too_early = allocation.admitted_at - Duration::hours(1);
        let err = engine.discharge(&nurse, allocation.id, Some(too_early)).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_RANGE");
        let still_open = engine.get_allocation(&nurse, allocation.id).await.unwrap();
        assert!(still_open.is_open());
    }

    #[tokio::test]
    async fn should_edit_notes_without_discharging() {
        let engine = engine().await;
        let beds = mawar_ward(&engine, 1).await;
        let nurse = seed_user(&engine, "nurse", Role::Nurse).await;
        let doctor = seed_user(&engine, "dr-andi", Role::Doctor).await;
        let patient = seed_user(&engine, "pasien", Role::Patient).await;
        let allocation = engine.allocate(&nurse, admission(beds[0], patient.user_id)).await.unwrap();
        assert_eq!(allocation.attending_staff, None);

        let patch = AllocationPatch {
            discharged_at: None,
            notes: Some("post-op observation".into()),
            attending_staff: Some(doctor.user_id),
        };
        let updated = engine.update_allocation(&nurse, allocation.id, patch).await.unwrap();
        assert!(updated.is_open());
        assert_eq!(updated.attending_staff, Some(doctor.user_id));
        assert_eq!(updated.notes.as_deref(), Some("post-op observation"));
    }

    #[tokio::test]
    async fn should_scope_allocation_listing_for_patients() {
        let engine = engine().await;
        let beds = mawar_ward(&engine, 2).await;
        let nurse = seed_user(&engine, "nurse", Role::Nurse).await;
        let siti = seed_user(&engine, "siti", Role::Patient).await;
        let budi = seed_user(&engine, "budi", Role::Patient).await;
        engine.allocate(&nurse, admission(beds[0], siti.user_id)).await.unwrap();
        let budi_allocation = engine.allocate(&nurse, admission(beds[1], budi.user_id)).await.unwrap();

        let all = engine.list_allocations(&nurse, &AllocationFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        let own = engine.list_allocations(&siti, &AllocationFilter::default()).await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].patient, siti.user_id);

        let err = engine.get_allocation(&siti, budi_allocation.id).await.unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");

        engine.discharge(&nurse, budi_allocation.id, None).await.unwrap();
        let active = AllocationFilter { active: Some(true), ..Default::default() };
        assert_eq!(engine.list_allocations(&nurse, &active).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_deny_allocation_to_housekeeping() {
        let engine = engine().await;
        let beds = mawar_ward(&engine, 1).await;
        let cleaner = seed_user(&engine, "cleaner", Role::Cleaning).await;
        let patient = seed_user(&engine, "pasien", Role::Patient).await;
        let err = engine.allocate(&cleaner, admission(beds[0], patient.user_id)).await.unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");
    }
}

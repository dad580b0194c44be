// lib/src/engine/inventory.rs
use chrono::Utc;
use log::{debug, warn};
use serde::Deserialize;

use simrs_models::{
    Bed, BedAvailability, BedCreated, BedId, BedRoomSummary, BedStatus, BedWardSummary, HospitalError,
    HospitalResult, NewBed, NewRoom, NewWard, Room, RoomId, RoomType, RoomView, Ward, WardId, WardUpdate,
};
use simrs_security::{Actor, Permission};

use super::state::{Changeset, HospitalState, Record};
use super::HospitalEngine;
use crate::events::EngineEvent;
use crate::storage_engine::Collection;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BedFilter {
    #[serde(default)]
    pub status: Option<BedStatus>,
    #[serde(default)]
    pub room: Option<RoomId>,
    #[serde(default)]
    pub ward: Option<WardId>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AvailabilityFilter {
    #[serde(default)]
    pub ward: Option<WardId>,
    #[serde(default)]
    pub room_type: Option<RoomType>,
    #[serde(default)]
    pub supports_elderly: Option<bool>,
}

fn required(field: &str, value: &str) -> HospitalResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(HospitalError::InvalidData(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

fn ensure_unique_ward_code(state: &HospitalState, code: &str, except: Option<WardId>) -> HospitalResult<()> {
    let taken = state
        .wards
        .values()
        .any(|w| Some(w.id) != except && w.code.eq_ignore_ascii_case(code));
    if taken {
        return Err(HospitalError::Conflict(format!("Ward code '{}' is already in use", code)));
    }
    Ok(())
}

fn room_view(state: &HospitalState, room: &Room) -> RoomView {
    let bed_count = state.beds_in_room(room.id).count();
    RoomView {
        room: room.clone(),
        bed_count,
        over_capacity: bed_count > room.capacity as usize,
    }
}

/// Sort key placing beds in ward, room, bed order.
fn bed_sort_key(state: &HospitalState, bed: &Bed) -> (String, String, String) {
    let (bed_number, room_number, ward_name) = state.bed_location(bed.id);
    (ward_name, room_number, bed_number)
}

fn availability_entry(state: &HospitalState, bed: &Bed) -> Option<BedAvailability> {
    let room = state.rooms.get(&bed.room)?;
    let ward = state.wards.get(&room.ward)?;
    Some(BedAvailability {
        id: bed.id,
        bed_number: bed.bed_number.clone(),
        supports_elderly: bed.supports_elderly,
        status: bed.status,
        equipment: bed.equipment.clone(),
        room: BedRoomSummary {
            id: room.id,
            room_number: room.room_number.clone(),
            room_type: room.room_type,
            accessibility_notes: room.accessibility_notes.clone(),
            ward: BedWardSummary {
                id: ward.id,
                name: ward.name.clone(),
                department: ward.department.clone(),
                floor: ward.floor,
                has_elderly_support: ward.has_elderly_support,
            },
        },
    })
}

impl HospitalEngine {
    pub async fn create_ward(&self, actor: &Actor, new_ward: NewWard) -> HospitalResult<Ward> {
        self.authorize(actor, Permission::ManageInventory)?;
        let name = required("name", &new_ward.name)?;
        let code = required("code", &new_ward.code)?;

        let mut state = self.state.write().await;
        ensure_unique_ward_code(&state, &code, None)?;

        let now = Utc::now();
        let ward = Ward {
            id: WardId::generate(),
            name,
            code,
            floor: new_ward.floor,
            department: new_ward.department.trim().to_string(),
            has_elderly_support: new_ward.has_elderly_support,
            created_at: now,
            updated_at: now,
        };
        let event = EngineEvent::WardCreated { ward: ward.id, code: ward.code.clone() };
        self.commit(&mut state, Changeset::new().put(Record::Ward(ward.clone())), event)
            .await?;
        Ok(ward)
    }

    /// Name, department and the elderly flag are always editable. Code and
    /// floor only change while no bed sits under the ward.
    pub async fn update_ward(&self, actor: &Actor, id: WardId, update: WardUpdate) -> HospitalResult<Ward> {
        self.authorize(actor, Permission::ManageInventory)?;
        let mut state = self.state.write().await;
        let mut ward = state.ward(id)?.clone();

        let code = update.code.as_deref().map(|c| required("code", c)).transpose()?;
        let structural_change = code.as_deref().map_or(false, |c| c != ward.code)
            || update.floor.map_or(false, |f| f != ward.floor);
        if structural_change {
            let has_beds = state
                .rooms_in_ward(id)
                .any(|room| state.beds_in_room(room.id).next().is_some());
            if has_beds {
                debug!("Rejected structural edit of ward {}: beds present", id);
                return Err(HospitalError::Conflict(format!(
                    "Ward {} has beds; its code and floor can no longer change",
                    ward.code
                )));
            }
        }
        if let Some(code) = code {
            ensure_unique_ward_code(&state, &code, Some(id))?;
            ward.code = code;
        }
        if let Some(floor) = update.floor {
            ward.floor = floor;
        }
        if let Some(name) = update.name {
            ward.name = required("name", &name)?;
        }
        if let Some(department) = update.department {
            ward.department = department.trim().to_string();
        }
        if let Some(flag) = update.has_elderly_support {
            ward.has_elderly_support = flag;
        }
        ward.updated_at = Utc::now();

        self.commit(
            &mut state,
            Changeset::new().put(Record::Ward(ward.clone())),
            EngineEvent::WardUpdated { ward: id },
        )
        .await?;
        Ok(ward)
    }

    pub async fn delete_ward(&self, actor: &Actor, id: WardId) -> HospitalResult<()> {
        self.authorize(actor, Permission::ManageInventory)?;
        let mut state = self.state.write().await;
        let ward = state.ward(id)?;
        let rooms = state.rooms_in_ward(id).count();
        if rooms > 0 {
            return Err(HospitalError::Conflict(format!(
                "Ward {} still has {} room(s)",
                ward.code, rooms
            )));
        }
        self.commit(
            &mut state,
            Changeset::new().remove(Collection::Wards, id.0),
            EngineEvent::WardDeleted { ward: id },
        )
        .await
    }

    pub async fn list_wards(&self, actor: &Actor) -> HospitalResult<Vec<Ward>> {
        self.authorize(actor, Permission::ViewInventory)?;
        let state = self.state.read().await;
        let mut wards: Vec<Ward> = state.wards.values().cloned().collect();
        wards.sort_by(|a, b| (a.floor, &a.code).cmp(&(b.floor, &b.code)));
        Ok(wards)
    }

    pub async fn get_ward(&self, actor: &Actor, id: WardId) -> HospitalResult<Ward> {
        self.authorize(actor, Permission::ViewInventory)?;
        let state = self.state.read().await;
        state.ward(id).cloned()
    }

    pub async fn create_room(&self, actor: &Actor, new_room: NewRoom) -> HospitalResult<Room> {
        self.authorize(actor, Permission::ManageInventory)?;
        let room_number = required("room_number", &new_room.room_number)?;
        if new_room.capacity < 1 {
            return Err(HospitalError::InvalidData("capacity must be at least 1".into()));
        }

        let mut state = self.state.write().await;
        let ward = state.ward(new_room.ward)?;
        if state
            .rooms_in_ward(ward.id)
            .any(|r| r.room_number.eq_ignore_ascii_case(&room_number))
        {
            return Err(HospitalError::Conflict(format!(
                "Room {} already exists in ward {}",
                room_number, ward.code
            )));
        }

        let room = Room {
            id: RoomId::generate(),
            ward: ward.id,
            room_number,
            room_type: new_room.room_type,
            capacity: new_room.capacity,
            accessibility_notes: new_room.accessibility_notes.filter(|n| !n.trim().is_empty()),
            created_at: Utc::now(),
        };
        let event = EngineEvent::RoomCreated { room: room.id, ward: room.ward };
        self.commit(&mut state, Changeset::new().put(Record::Room(room.clone())), event)
            .await?;
        Ok(room)
    }

    pub async fn list_rooms(&self, actor: &Actor, ward: Option<WardId>) -> HospitalResult<Vec<RoomView>> {
        self.authorize(actor, Permission::ViewInventory)?;
        let state = self.state.read().await;
        let mut rooms: Vec<&Room> = state
            .rooms
            .values()
            .filter(|r| ward.map_or(true, |w| r.ward == w))
            .collect();
        rooms.sort_by(|a, b| {
            let ward_a = state.wards.get(&a.ward).map(|w| w.code.as_str());
            let ward_b = state.wards.get(&b.ward).map(|w| w.code.as_str());
            (ward_a, &a.room_number).cmp(&(ward_b, &b.room_number))
        });
        Ok(rooms.into_iter().map(|r| room_view(&state, r)).collect())
    }

    /// Capacity is advisory: a bed beyond it is created and the response
    /// carries a warning.
    pub async fn create_bed(&self, actor: &Actor, new_bed: NewBed) -> HospitalResult<BedCreated> {
        self.authorize(actor, Permission::ManageInventory)?;
        let bed_number = required("bed_number", &new_bed.bed_number)?;
        let status = new_bed.status.unwrap_or(BedStatus::Available);
        if status == BedStatus::Occupied {
            return Err(HospitalError::InvalidState(
                "A bed cannot be created as OCCUPIED; admit a patient instead".into(),
            ));
        }

        let mut state = self.state.write().await;
        let room = state.room(new_bed.room)?;
        if state
            .beds_in_room(room.id)
            .any(|b| b.bed_number.eq_ignore_ascii_case(&bed_number))
        {
            return Err(HospitalError::Conflict(format!(
                "Bed {} already exists in room {}",
                bed_number, room.room_number
            )));
        }

        let bed_count = state.beds_in_room(room.id).count() + 1;
        let capacity_warning = if bed_count > room.capacity as usize {
            warn!(
                "Room {} holds {} bed(s), above its capacity of {}",
                room.id, bed_count, room.capacity
            );
            Some(format!(
                "Room {} now holds {} beds, above its capacity of {}",
                room.room_number, bed_count, room.capacity
            ))
        } else {
            None
        };

        let now = Utc::now();
        let bed = Bed {
            id: BedId::generate(),
            room: room.id,
            bed_number,
            status,
            supports_elderly: new_bed.supports_elderly,
            equipment: new_bed.equipment,
            reserved_for_triage: None,
            created_at: now,
            updated_at: now,
        };
        let event = EngineEvent::BedCreated {
            bed: bed.id,
            room: bed.room,
            over_capacity: capacity_warning.is_some(),
        };
        self.commit(&mut state, Changeset::new().put(Record::Bed(bed.clone())), event)
            .await?;
        Ok(BedCreated { bed, capacity_warning })
    }

    pub async fn get_bed(&self, actor: &Actor, id: BedId) -> HospitalResult<Bed> {
        self.authorize(actor, Permission::ViewInventory)?;
        let state = self.state.read().await;
        state.bed(id).cloned()
    }

    pub async fn list_beds(&self, actor: &Actor, filter: &BedFilter) -> HospitalResult<Vec<Bed>> {
        self.authorize(actor, Permission::ViewInventory)?;
        let state = self.state.read().await;
        let mut beds: Vec<&Bed> = state
            .beds
            .values()
            .filter(|b| filter.status.map_or(true, |s| b.status == s))
            .filter(|b| filter.room.map_or(true, |r| b.room == r))
            .filter(|b| filter.ward.map_or(true, |w| state.ward_of_bed(b) == Some(w)))
            .collect();
        beds.sort_by_key(|b| bed_sort_key(&state, b));
        Ok(beds.into_iter().cloned().collect())
    }

    /// AVAILABLE beds not held for triage, with room and ward nested.
    pub async fn list_available_beds(
        &self,
        actor: &Actor,
        filter: &AvailabilityFilter,
    ) -> HospitalResult<Vec<BedAvailability>> {
        self.authorize(actor, Permission::ViewInventory)?;
        let state = self.state.read().await;
        let mut beds: Vec<&Bed> = state
            .beds
            .values()
            .filter(|b| b.is_allocatable() && b.reserved_for_triage.is_none())
            .filter(|b| filter.supports_elderly.map_or(true, |e| b.supports_elderly == e))
            .filter(|b| {
                let room = state.rooms.get(&b.room);
                filter.ward.map_or(true, |w| room.map(|r| r.ward) == Some(w))
                    && filter.room_type.map_or(true, |t| room.map(|r| r.room_type) == Some(t))
            })
            .collect();
        beds.sort_by_key(|b| bed_sort_key(&state, b));
        Ok(beds.into_iter().filter_map(|b| availability_entry(&state, b)).collect())
    }

    pub async fn start_maintenance(&self, actor: &Actor, id: BedId) -> HospitalResult<Bed> {
        self.authorize(actor, Permission::ManageInventory)?;
        let mut state = self.state.write().await;
        if state.bed(id)?.reserved_for_triage.is_some() {
            return Err(HospitalError::Conflict(format!(
                "Bed {} is reserved for triage; release the reservation first",
                id
            )));
        }
        self.transition_bed(&mut state, id, BedStatus::Maintenance).await
    }

    pub async fn release_maintenance(&self, actor: &Actor, id: BedId) -> HospitalResult<Bed> {
        self.authorize(actor, Permission::ManageInventory)?;
        let mut state = self.state.write().await;
        if state.bed(id)?.status != BedStatus::Maintenance {
            return Err(HospitalError::InvalidState(format!("Bed {} is not under maintenance", id)));
        }
        self.transition_bed(&mut state, id, BedStatus::Available).await
    }

    /// Housekeeping: returns a CLEANING bed to service.
    pub async fn reclaim_bed(&self, actor: &Actor, id: BedId) -> HospitalResult<Bed> {
        self.authorize(actor, Permission::ReclaimBed)?;
        let mut state = self.state.write().await;
        let status = state.bed(id)?.status;
        if status != BedStatus::Cleaning {
            debug!("Rejected reclaim of bed {} in {}", id, status);
            return Err(HospitalError::InvalidState(format!(
                "Bed {} is {}; only CLEANING beds can be reclaimed",
                id, status
            )));
        }
        self.transition_bed(&mut state, id, BedStatus::Available).await
    }

    async fn transition_bed(&self, state: &mut HospitalState, id: BedId, to: BedStatus) -> HospitalResult<Bed> {
        let mut bed = state.bed(id)?.clone();
        let from = bed.status;
        if !from.can_transition_to(to) {
            return Err(HospitalError::InvalidState(format!("Bed {} cannot move from {} to {}", id, from, to)));
        }
        bed.status = to;
        bed.updated_at = Utc::now();
        self.commit(
            state,
            Changeset::new().put(Record::Bed(bed.clone())),
            EngineEvent::BedStatusChanged { bed: id, from, to },
        )
        .await?;
        Ok(bed)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{engine, seed_user};
    use super::*;
    use simrs_models::Role;

    fn ward(name: &str, code: &str) -> NewWard {
        NewWard {
            name: name.into(),
            code: code.into(),
            floor: 2,
            department: "Internal Medicine".into(),
            has_elderly_support: true,
        }
    }

    fn room(ward: WardId, number: &str, capacity: u32) -> NewRoom {
        NewRoom {
            ward,
            room_number: number.into(),
            room_type: RoomType::General,
            capacity,
            accessibility_notes: None,
        }
    }

    fn bed(room: RoomId, number: &str) -> NewBed {
        NewBed {
            room,
            bed_number: number.into(),
            status: None,
            supports_elderly: false,
            equipment: Default::default(),
        }
    }

    #[tokio::test]
    async fn should_reject_duplicate_local_identifiers() {
        let engine = engine().await;
        let admin = seed_user(&engine, "admin", Role::HospitalAdmin).await;

        let mawar = engine.create_ward(&admin, ward("Mawar", "MW")).await.unwrap();
        let err = engine.create_ward(&admin, ward("Melati", "mw")).await.unwrap_err();
        assert_eq!(err.code(), "CONFLICT");

        let r201 = engine.create_room(&admin, room(mawar.id, "201", 2)).await.unwrap();
        let err = engine.create_room(&admin, room(mawar.id, "201", 4)).await.unwrap_err();
        assert_eq!(err.code(), "CONFLICT");

        engine.create_bed(&admin, bed(r201.id, "1")).await.unwrap();
        let err = engine.create_bed(&admin, bed(r201.id, "1")).await.unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
    }

    #[tokio::test]
    async fn should_fail_with_not_found_for_missing_parent() {
        let engine = engine().await;
        let admin = seed_user(&engine, "admin", Role::SuperAdmin).await;

        let err = engine.create_room(&admin, room(WardId::generate(), "1", 1)).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
        let err = engine.create_bed(&admin, bed(RoomId::generate(), "1")).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn should_warn_but_not_block_over_capacity() {
        let engine = engine().await;
        let admin = seed_user(&engine, "admin", Role::HospitalAdmin).await;
        let ward = engine.create_ward(&admin, ward("Mawar", "MW")).await.unwrap();
        let room = engine.create_room(&admin, room(ward.id, "201", 1)).await.unwrap();

        let first = engine.create_bed(&admin, bed(room.id, "1")).await.unwrap();
        assert!(first.capacity_warning.is_none());
        let second = engine.create_bed(&admin, bed(room.id, "2")).await.unwrap();
        assert!(second.capacity_warning.is_some());

        let rooms = engine.list_rooms(&admin, Some(ward.id)).await.unwrap();
        assert_eq!(rooms[0].bed_count, 2);
        assert!(rooms[0].over_capacity);
    }

    #[tokio::test]
    async fn should_refuse_inventory_changes_from_clinical_roles() {
        let engine = engine().await;
        let nurse = seed_user(&engine, "nurse", Role::Nurse).await;
        let err = engine.create_ward(&nurse, ward("Mawar", "MW")).await.unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");
        assert!(engine.list_wards(&nurse).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_not_create_occupied_bed() {
        let engine = engine().await;
        let admin = seed_user(&engine, "admin", Role::HospitalAdmin).await;
        let ward = engine.create_ward(&admin, ward("Mawar", "MW")).await.unwrap();
        let room = engine.create_room(&admin, room(ward.id, "201", 2)).await.unwrap();

        let mut occupied = bed(room.id, "1");
        occupied.status = Some(BedStatus::Occupied);
        let err = engine.create_bed(&admin, occupied).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");

        let mut cleaning = bed(room.id, "2");
        cleaning.status = Some(BedStatus::Cleaning);
        assert_eq!(engine.create_bed(&admin, cleaning).await.unwrap().bed.status, BedStatus::Cleaning);
    }

    #[tokio::test]
    async fn should_lock_ward_structure_once_beds_exist() {
        let engine = engine().await;
        let admin = seed_user(&engine, "admin", Role::HospitalAdmin).await;
        let ward = engine.create_ward(&admin, ward("Mawar", "MW")).await.unwrap();
        let room = engine.create_room(&admin, room(ward.id, "201", 2)).await.unwrap();

        let moved = engine
            .update_ward(&admin, ward.id, WardUpdate { floor: Some(3), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(moved.floor, 3);

        engine.create_bed(&admin, bed(room.id, "1")).await.unwrap();
        let err = engine
            .update_ward(&admin, ward.id, WardUpdate { code: Some("MX".into()), ..Default::default() })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CONFLICT");

        let renamed = engine
            .update_ward(&admin, ward.id, WardUpdate { name: Some("Mawar Timur".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(renamed.name, "Mawar Timur");
        assert_eq!(renamed.code, "MW");

        let err = engine.delete_ward(&admin, ward.id).await.unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
    }

    #[tokio::test]
    async fn should_list_only_allocatable_beds_as_available() {
        let engine = engine().await;
        let admin = seed_user(&engine, "admin", Role::HospitalAdmin).await;
        let ward = engine.create_ward(&admin, ward("Mawar", "MW")).await.unwrap();
        let room = engine.create_room(&admin, room(ward.id, "201", 3)).await.unwrap();
        let b1 = engine.create_bed(&admin, bed(room.id, "1")).await.unwrap().bed;
        let b2 = engine.create_bed(&admin, bed(room.id, "2")).await.unwrap().bed;
        engine.start_maintenance(&admin, b2.id).await.unwrap();

        let available = engine.list_available_beds(&admin, &AvailabilityFilter::default()).await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, b1.id);
        assert_eq!(available[0].room.ward.name, "Mawar");

        let icu_only = AvailabilityFilter { room_type: Some(RoomType::Icu), ..Default::default() };
        assert!(engine.list_available_beds(&admin, &icu_only).await.unwrap().is_empty());

        let err = engine.reclaim_bed(&admin, b2.id).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");
        let released = engine.release_maintenance(&admin, b2.id).await.unwrap();
        assert_eq!(released.status, BedStatus::Available);
    }
}

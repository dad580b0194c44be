// lib/src/engine/state.rs
use std::collections::HashMap;

use serde::de::DeserializeOwned;
use uuid::Uuid;

use simrs_models::{
    AllocationId, Appointment, AppointmentId, Bed, BedAllocation, BedId, EmergencyCase, EmergencyCaseId,
    HospitalError, HospitalResult, PaymentId, PaymentTransaction, Role, Room, RoomId, User, UserId, Ward,
    WardId,
};

use crate::storage_engine::{Collection, RecordStore, StoreOp};

/// One entity as written to the store.
#[derive(Debug, Clone)]
pub(crate) enum Record {
    User(User),
    Ward(Ward),
    Room(Room),
    Bed(Bed),
    Allocation(BedAllocation),
    Appointment(Appointment),
    Payment(PaymentTransaction),
    EmergencyCase(EmergencyCase),
}

impl Record {
    fn collection(&self) -> Collection {
        match self {
            Record::User(_) => Collection::Users,
            Record::Ward(_) => Collection::Wards,
            Record::Room(_) => Collection::Rooms,
            Record::Bed(_) => Collection::Beds,
            Record::Allocation(_) => Collection::Allocations,
            Record::Appointment(_) => Collection::Appointments,
            Record::Payment(_) => Collection::Payments,
            Record::EmergencyCase(_) => Collection::EmergencyCases,
        }
    }

    fn key(&self) -> Uuid {
        match self {
            Record::User(r) => r.id.0,
            Record::Ward(r) => r.id.0,
            Record::Room(r) => r.id.0,
            Record::Bed(r) => r.id.0,
            Record::Allocation(r) => r.id.0,
            Record::Appointment(r) => r.id.0,
            Record::Payment(r) => r.id.0,
            Record::EmergencyCase(r) => r.id.0,
        }
    }

    fn to_bytes(&self) -> HospitalResult<Vec<u8>> {
        let bytes = match self {
            Record::User(r) => serde_json::to_vec(r)?,
            Record::Ward(r) => serde_json::to_vec(r)?,
            Record::Room(r) => serde_json::to_vec(r)?,
            Record::Bed(r) => serde_json::to_vec(r)?,
            Record::Allocation(r) => serde_json::to_vec(r)?,
            Record::Appointment(r) => serde_json::to_vec(r)?,
            Record::Payment(r) => serde_json::to_vec(r)?,
            Record::EmergencyCase(r) => serde_json::to_vec(r)?,
        };
        Ok(bytes)
    }
}

/// The records a mutation writes. Nothing touches the tables until the whole
/// set has been persisted.
#[derive(Debug, Default)]
pub(crate) struct Changeset {
    puts: Vec<Record>,
    removals: Vec<(Collection, Uuid)>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(mut self, record: Record) -> Self {
        self.puts.push(record);
        self
    }

    pub fn remove(mut self, collection: Collection, key: Uuid) -> Self {
        self.removals.push((collection, key));
        self
    }

    pub fn to_store_ops(&self) -> HospitalResult<Vec<StoreOp>> {
        let mut ops = Vec::with_capacity(self.puts.len() + self.removals.len());
        for record in &self.puts {
            ops.push(StoreOp::Put {
                collection: record.collection(),
                key: record.key(),
                value: record.to_bytes()?,
            });
        }
        for (collection, key) in &self.removals {
            ops.push(StoreOp::Remove { collection: *collection, key: *key });
        }
        Ok(ops)
    }
}

/// In-memory tables for every entity kind.
#[derive(Debug, Default)]
pub(crate) struct HospitalState {
    pub users: HashMap<UserId, User>,
    pub wards: HashMap<WardId, Ward>,
    pub rooms: HashMap<RoomId, Room>,
    pub beds: HashMap<BedId, Bed>,
    pub allocations: HashMap<AllocationId, BedAllocation>,
    pub appointments: HashMap<AppointmentId, Appointment>,
    pub payments: HashMap<PaymentId, PaymentTransaction>,
    pub emergency_cases: HashMap<EmergencyCaseId, EmergencyCase>,
}

async fn load_collection<T: DeserializeOwned>(
    store: &dyn RecordStore,
    collection: Collection,
) -> HospitalResult<Vec<T>> {
    store
        .load_all(collection)
        .await?
        .iter()
        .map(|bytes| {
            serde_json::from_slice(bytes).map_err(|e| {
                HospitalError::Storage(format!("Corrupt record in {}: {}", collection, e))
            })
        })
        .collect()
}

impl HospitalState {
    pub async fn rehydrate(store: &dyn RecordStore) -> HospitalResult<Self> {
        let mut state = HospitalState::default();
        for user in load_collection::<User>(store, Collection::Users).await? {
            state.users.insert(user.id, user);
        }
        for ward in load_collection::<Ward>(store, Collection::Wards).await? {
            state.wards.insert(ward.id, ward);
        }
        for room in load_collection::<Room>(store, Collection::Rooms).await? {
            state.rooms.insert(room.id, room);
        }
        for bed in load_collection::<Bed>(store, Collection::Beds).await? {
            state.beds.insert(bed.id, bed);
        }
        for allocation in load_collection::<BedAllocation>(store, Collection::Allocations).await? {
            state.allocations.insert(allocation.id, allocation);
        }
        for appointment in load_collection::<Appointment>(store, Collection::Appointments).await? {
            state.appointments.insert(appointment.id, appointment);
        }
        for payment in load_collection::<PaymentTransaction>(store, Collection::Payments).await? {
            state.payments.insert(payment.id, payment);
        }
        for case in load_collection::<EmergencyCase>(store, Collection::EmergencyCases).await? {
            state.emergency_cases.insert(case.id, case);
        }
        Ok(state)
    }

    pub fn apply(&mut self, changes: Changeset) {
        for record in changes.puts {
            match record {
                Record::User(r) => {
                    self.users.insert(r.id, r);
                }
                Record::Ward(r) => {
                    self.wards.insert(r.id, r);
                }
                Record::Room(r) => {
                    self.rooms.insert(r.id, r);
                }
                Record::Bed(r) => {
                    self.beds.insert(r.id, r);
                }
                Record::Allocation(r) => {
                    self.allocations.insert(r.id, r);
                }
                Record::Appointment(r) => {
                    self.appointments.insert(r.id, r);
                }
                Record::Payment(r) => {
                    self.payments.insert(r.id, r);
                }
                Record::EmergencyCase(r) => {
                    self.emergency_cases.insert(r.id, r);
                }
            }
        }
        for (collection, key) in changes.removals {
            match collection {
                Collection::Users => {
                    self.users.remove(&UserId(key));
                }
                Collection::Wards => {
                    self.wards.remove(&WardId(key));
                }
                Collection::Rooms => {
                    self.rooms.remove(&RoomId(key));
                }
                Collection::Beds => {
                    self.beds.remove(&BedId(key));
                }
                Collection::Allocations => {
                    self.allocations.remove(&AllocationId(key));
                }
                Collection::Appointments => {
                    self.appointments.remove(&AppointmentId(key));
                }
                Collection::Payments => {
                    self.payments.remove(&PaymentId(key));
                }
                Collection::EmergencyCases => {
                    self.emergency_cases.remove(&EmergencyCaseId(key));
                }
            }
        }
    }

    pub fn ward(&self, id: WardId) -> HospitalResult<&Ward> {
        self.wards.get(&id).ok_or_else(|| HospitalError::not_found(WardId::label(), id))
    }

    pub fn room(&self, id: RoomId) -> HospitalResult<&Room> {
        self.rooms.get(&id).ok_or_else(|| HospitalError::not_found(RoomId::label(), id))
    }

    pub fn bed(&self, id: BedId) -> HospitalResult<&Bed> {
        self.beds.get(&id).ok_or_else(|| HospitalError::not_found(BedId::label(), id))
    }

    pub fn allocation(&self, id: AllocationId) -> HospitalResult<&BedAllocation> {
        self.allocations
            .get(&id)
            .ok_or_else(|| HospitalError::not_found(AllocationId::label(), id))
    }

    pub fn appointment(&self, id: AppointmentId) -> HospitalResult<&Appointment> {
        self.appointments
            .get(&id)
            .ok_or_else(|| HospitalError::not_found(AppointmentId::label(), id))
    }

    pub fn payment(&self, id: PaymentId) -> HospitalResult<&PaymentTransaction> {
        self.payments.get(&id).ok_or_else(|| HospitalError::not_found(PaymentId::label(), id))
    }

    pub fn emergency_case(&self, id: EmergencyCaseId) -> HospitalResult<&EmergencyCase> {
        self.emergency_cases
            .get(&id)
            .ok_or_else(|| HospitalError::not_found(EmergencyCaseId::label(), id))
    }

    pub fn user(&self, id: UserId) -> HospitalResult<&User> {
        self.users.get(&id).ok_or_else(|| HospitalError::not_found(UserId::label(), id))
    }

    /// A known account holding the PATIENT role.
    pub fn patient(&self, id: UserId) -> HospitalResult<&User> {
        self.users
            .get(&id)
            .filter(|u| u.role == Role::Patient)
            .ok_or_else(|| HospitalError::not_found("patient", id))
    }

    pub fn staff(&self, id: UserId) -> HospitalResult<&User> {
        self.users
            .get(&id)
            .filter(|u| u.role.is_staff())
            .ok_or_else(|| HospitalError::not_found("staff member", id))
    }

    pub fn physician(&self, id: UserId) -> HospitalResult<&User> {
        self.users
            .get(&id)
            .filter(|u| u.role.is_physician())
            .ok_or_else(|| HospitalError::not_found("doctor", id))
    }

    pub fn display_name(&self, id: UserId) -> String {
        self.users
            .get(&id)
            .map(|u| u.display_name())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn find_user_by_username(&self, username: &str) -> Option<&User> {
        let wanted = username.trim();
        self.users.values().find(|u| u.username.eq_ignore_ascii_case(wanted))
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<&User> {
        let wanted = email.trim();
        self.users.values().find(|u| u.email.eq_ignore_ascii_case(wanted))
    }

    pub fn find_payment_by_order(&self, order_id: &str) -> Option<&PaymentTransaction> {
        self.payments.values().find(|p| p.order_id == order_id)
    }

    pub fn beds_in_room(&self, room: RoomId) -> impl Iterator<Item = &Bed> + '_ {
        self.beds.values().filter(move |b| b.room == room)
    }

    pub fn rooms_in_ward(&self, ward: WardId) -> impl Iterator<Item = &Room> + '_ {
        self.rooms.values().filter(move |r| r.ward == ward)
    }

    pub fn ward_of_bed(&self, bed: &Bed) -> Option<WardId> {
        self.rooms.get(&bed.room).map(|r| r.ward)
    }

    pub fn open_allocation_for_bed(&self, bed: BedId) -> Option<&BedAllocation> {
        self.allocations.values().find(|a| a.bed == bed && a.is_open())
    }

    pub fn open_allocation_for_patient(&self, patient: UserId) -> Option<&BedAllocation> {
        self.allocations.values().find(|a| a.patient == patient && a.is_open())
    }

    /// `(bed number, room number, ward name)` for display.
    pub fn bed_location(&self, bed_id: BedId) -> (String, String, String) {
        let Some(bed) = self.beds.get(&bed_id) else {
            return (bed_id.to_string(), String::new(), String::new());
        };
        let room = self.rooms.get(&bed.room);
        let ward = room.and_then(|r| self.wards.get(&r.ward));
        (
            bed.bed_number.clone(),
            room.map(|r| r.room_number.clone()).unwrap_or_default(),
            ward.map(|w| w.name.clone()).unwrap_or_default(),
        )
    }
}

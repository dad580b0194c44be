// models/src/lib.rs

pub mod dashboard;
pub mod errors;
pub mod identifiers;
pub mod medical;
pub mod pagination;

pub use dashboard::*;
pub use errors::{HospitalError, HospitalResult};
pub use identifiers::{
    AllocationId, AppointmentId, BedId, EmergencyCaseId, PaymentId, RoomId, UserId, WardId,
};
pub use medical::*;
pub use pagination::{paginate, Listing, Page};

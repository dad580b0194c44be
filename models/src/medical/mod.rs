// models/src/medical/mod.rs
pub mod appointment;
pub mod bed;
pub mod bed_allocation;
pub mod emergency_case;
pub mod payment;
pub mod role;
pub mod room;
pub mod user;
pub mod ward;

pub use appointment::{Appointment, AppointmentRequest, AppointmentStatus, AppointmentType, DoctorAssignment};
pub use bed::{Bed, BedAvailability, BedCreated, BedRoomSummary, BedStatus, BedWardSummary, NewBed};
pub use bed_allocation::{AllocationPatch, BedAllocation, NewAllocation};
pub use emergency_case::{EmergencyCase, NewEmergencyCase, TriageReservation, TriageSeverity};
pub use payment::{GatewayNotification, NewPayment, PaymentStatus, PaymentTransaction};
pub use role::Role;
pub use room::{NewRoom, Room, RoomType, RoomView};
pub use user::{CreatedUser, Login, NewUser, User, UserProfile, UserUpdate};
pub use ward::{NewWard, Ward, WardUpdate};

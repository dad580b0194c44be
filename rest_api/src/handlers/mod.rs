// rest_api/src/handlers/mod.rs
pub mod allocations;
pub mod appointments;
pub mod dashboard;
pub mod emergency;
pub mod identity;
pub mod inventory;
pub mod payments;

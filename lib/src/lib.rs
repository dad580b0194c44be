// lib/src/lib.rs
//! Core of the SIMRS capacity and scheduling service.

pub mod config;
pub mod engine;
pub mod events;
pub mod storage_engine;

pub use config::{load_app_config, AppConfig};
pub use engine::{
    AllocationFilter, AppointmentFilter, AvailabilityFilter, BedFilter, DashboardFilter, GatewayCharge,
    HospitalEngine, OfflineGateway, PaymentFilter, PaymentGateway,
};
pub use events::EngineEvent;
pub use storage_engine::{create_storage, InMemoryStorage, RecordStore, SledStorage};

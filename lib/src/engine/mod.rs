// lib/src/engine/mod.rs
//! The capacity and scheduling engine.
//!
//! All tables live behind one `tokio::sync::RwLock`. Every mutation runs its
//! precondition checks and its writes under the write guard: the new records
//! are persisted first and only then applied to the tables, so a rejected
//! check or a failed write leaves nothing behind. Reads take the read guard
//! and therefore always see a single committed state.

use std::sync::Arc;

use log::{error, info};
use tokio::sync::{broadcast, RwLock};

use simrs_models::HospitalResult;
use simrs_security::{Actor, Permission, RolesConfig};

use crate::config::SchedulingConfig;
use crate::events::EngineEvent;
use crate::storage_engine::RecordStore;

mod allocation;
mod appointment;
mod dashboard;
mod directory;
mod emergency;
mod inventory;
mod payment;
pub(crate) mod state;

pub use allocation::AllocationFilter;
pub use appointment::AppointmentFilter;
pub use dashboard::DashboardFilter;
pub use inventory::{AvailabilityFilter, BedFilter};
pub use payment::{GatewayCharge, OfflineGateway, PaymentFilter, PaymentGateway};

use state::{Changeset, HospitalState};

const EVENT_CHANNEL_CAPACITY: usize = 256;

pub struct HospitalEngine {
    state: RwLock<HospitalState>,
    store: Arc<dyn RecordStore>,
    roles: Arc<RolesConfig>,
    gateway: Arc<dyn PaymentGateway>,
    settings: SchedulingConfig,
    events: broadcast::Sender<EngineEvent>,
}

impl HospitalEngine {
    /// Opens the engine over `store`, loading every persisted record.
    pub async fn open(
        store: Arc<dyn RecordStore>,
        roles: Arc<RolesConfig>,
        settings: SchedulingConfig,
    ) -> HospitalResult<Self> {
        let state = HospitalState::rehydrate(store.as_ref()).await?;
        info!(
            "Engine loaded {} user(s), {} ward(s), {} bed(s), {} appointment(s) from {} store",
            state.users.len(),
            state.wards.len(),
            state.beds.len(),
            state.appointments.len(),
            store.get_type()
        );
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(HospitalEngine {
            state: RwLock::new(state),
            store,
            roles,
            gateway: Arc::new(OfflineGateway),
            settings,
            events,
        })
    }

    pub fn with_gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.gateway = gateway;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub fn settings(&self) -> &SchedulingConfig {
        &self.settings
    }

    pub fn roles(&self) -> &RolesConfig {
        &self.roles
    }

    pub async fn flush(&self) -> HospitalResult<()> {
        self.store.flush().await
    }

    fn authorize(&self, actor: &Actor, permission: Permission) -> HospitalResult<()> {
        self.roles.authorize(actor, permission)
    }

    fn can(&self, actor: &Actor, permission: Permission) -> bool {
        self.roles.has_permission(actor.role, permission)
    }

    /// Persists `changes`, applies them to `state`, then publishes `event`.
    /// Must be called with the write guard held.
    async fn commit(&self, state: &mut HospitalState, changes: Changeset, event: EngineEvent) -> HospitalResult<()> {
        let ops = changes.to_store_ops()?;
        if let Err(e) = self.store.apply(ops).await {
            error!("Failed to persist change ({}): {}", event, e);
            return Err(e);
        }
        state.apply(changes);
        info!("{}", event);
        // No subscribers is fine.
        let _ = self.events.send(event);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::storage_engine::InMemoryStorage;
    use chrono::Utc;
    use simrs_models::{NewUser, Role, User};

    pub(crate) async fn engine() -> HospitalEngine {
        engine_over(Arc::new(InMemoryStorage::new())).await
    }

    pub(crate) async fn engine_over(store: Arc<dyn RecordStore>) -> HospitalEngine {
        HospitalEngine::open(store, Arc::new(RolesConfig::builtin()), SchedulingConfig::default())
            .await
            .unwrap()
    }

    /// Inserts an account directly, skipping password hashing.
    pub(crate) async fn seed_user(engine: &HospitalEngine, username: &str, role: Role) -> Actor {
        let new_user = NewUser {
            username: username.to_string(),
            email: format!("{}@hospital.test", username),
            password: None,
            first_name: username.to_string(),
            last_name: String::new(),
            role,
            phone_number: String::new(),
            national_id: String::new(),
            date_of_birth: None,
            gender: String::new(),
            requires_support_activation: false,
        };
        let user = User::from_new_user(new_user, "unused-hash".to_string(), Utc::now());
        let actor = Actor::new(user.id, role);
        let mut state = engine.state.write().await;
        engine
            .commit(
                &mut state,
                Changeset::new().put(state::Record::User(user)),
                EngineEvent::UserCreated { user: actor.user_id, role },
            )
            .await
            .unwrap();
        actor
    }
}

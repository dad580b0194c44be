// lib/src/engine/payment.rs
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use serde::Deserialize;
use uuid::Uuid;

use simrs_models::{
    GatewayNotification, HospitalError, HospitalResult, NewPayment, PaymentId, PaymentStatus,
    PaymentTransaction, Role, UserId,
};
use simrs_security::{Actor, Permission};

use super::state::{Changeset, HospitalState, Record};
use super::HospitalEngine;
use crate::events::EngineEvent;

/// What the gateway hands back when a charge is opened.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GatewayCharge {
    pub snap_token: Option<String>,
    pub redirect_url: Option<String>,
}

/// Outbound side of the payment gateway. Status updates arrive separately
/// through `apply_gateway_notification`.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn open_charge(&self, order_id: &str, amount: i64, description: &str) -> HospitalResult<GatewayCharge>;
}

/// Records charges locally without contacting a gateway.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGateway;

#[async_trait]
impl PaymentGateway for OfflineGateway {
    async fn open_charge(&self, order_id: &str, amount: i64, _description: &str) -> HospitalResult<GatewayCharge> {
        debug!("Offline gateway: charge {} for {} recorded locally", order_id, amount);
        Ok(GatewayCharge::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PaymentFilter {
    #[serde(default)]
    pub status: Option<PaymentStatus>,
    #[serde(default)]
    pub patient: Option<UserId>,
}

/// `<prefix>-<yyyymmdd>-<12 hex>`, e.g. `ADM-20240101-3F2A9C1B44D0`.
pub(crate) fn new_order_id(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..12].to_uppercase();
    format!("{}-{}-{}", prefix, Utc::now().format("%Y%m%d"), suffix)
}

/// Upper bound for a single charge, in rupiah.
pub const MAX_PAYMENT_AMOUNT: i64 = 1_000_000_000_000;

pub(crate) fn ensure_unique_order(state: &HospitalState, order_id: &str) -> HospitalResult<()> {
    if state.find_payment_by_order(order_id).is_some() {
        return Err(HospitalError::Conflict(format!("Order id {} is already in use", order_id)));
    }
    Ok(())
}

impl HospitalEngine {
    /// Opens a WAITING charge for a patient.
    pub async fn create_payment(&self, actor: &Actor, request: NewPayment) -> HospitalResult<PaymentTransaction> {
        self.authorize(actor, Permission::CreatePayment)?;
        if request.amount <= 0 {
            return Err(HospitalError::InvalidData("amount must be positive".into()));
        }
        if request.amount > MAX_PAYMENT_AMOUNT {
            return Err(HospitalError::InvalidData(format!("amount must not exceed {}", MAX_PAYMENT_AMOUNT)));
        }
        let description = request
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "Hospital payment".to_string());
        {
            let state = self.state.read().await;
            state.patient(request.patient_id)?;
        }

        let order_id = new_order_id("PAY");
        let charge = self.gateway.open_charge(&order_id, request.amount, &description).await?;

        let mut state = self.state.write().await;
        // Re-checked: the account may have changed while the gateway was called.
        let patient = state.patient(request.patient_id)?.id;
        ensure_unique_order(&state, &order_id)?;

        let now = Utc::now();
        let payment = PaymentTransaction {
            id: PaymentId::generate(),
            patient,
            order_id,
            amount: request.amount,
            status: PaymentStatus::Waiting,
            description,
            appointment: None,
            snap_token: charge.snap_token,
            redirect_url: charge.redirect_url,
            payment_type: None,
            created_at: now,
            updated_at: now,
        };
        let event = EngineEvent::PaymentCreated {
            payment: payment.id,
            order_id: payment.order_id.clone(),
            amount: payment.amount,
        };
        self.commit(&mut state, Changeset::new().put(Record::Payment(payment.clone())), event)
            .await?;
        Ok(payment)
    }

    /// Payment staff see every transaction, patients their own. Newest first.
    pub async fn list_payments(&self, actor: &Actor, filter: &PaymentFilter) -> HospitalResult<Vec<PaymentTransaction>> {
        let see_all = self.can(actor, Permission::ViewPayments);
        if !see_all && actor.role != Role::Patient {
            return Err(HospitalError::Forbidden(format!("role {} may not view payments", actor.role)));
        }
        let state = self.state.read().await;
        let mut payments: Vec<PaymentTransaction> = state
            .payments
            .values()
            .filter(|p| see_all || p.patient == actor.user_id)
            .filter(|p| filter.status.map_or(true, |s| p.status == s))
            .filter(|p| filter.patient.map_or(true, |id| p.patient == id))
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.order_id.cmp(&b.order_id)));
        Ok(payments)
    }

    /// Applies an asynchronous gateway callback. The caller authenticates the
    /// gateway; this only enforces the status rules: WAITING moves to PAID or
    /// FAILED once, a repeated identical notification is a no-op, and
    /// `pending` changes nothing.
    pub async fn apply_gateway_notification(
        &self,
        notification: GatewayNotification,
    ) -> HospitalResult<PaymentTransaction> {
        let target = notification.resolved_status()?;
        let mut state = self.state.write().await;
        let mut payment = state
            .find_payment_by_order(&notification.order_id)
            .cloned()
            .ok_or_else(|| HospitalError::not_found("payment order", &notification.order_id))?;

        let Some(target) = target else {
            debug!("Order {} still pending at the gateway", payment.order_id);
            return Ok(payment);
        };
        if payment.status == target {
            debug!("Duplicate {} notification for order {}", target, payment.order_id);
            return Ok(payment);
        }
        if payment.status != PaymentStatus::Waiting {
            warn!(
                "Ignoring {} notification for order {} already {}",
                target, payment.order_id, payment.status
            );
            return Err(HospitalError::Conflict(format!(
                "Payment {} is already {}",
                payment.order_id, payment.status
            )));
        }

        let from = payment.status;
        payment.status = target;
        if notification.payment_type.is_some() {
            payment.payment_type = notification.payment_type;
        }
        payment.updated_at = Utc::now();
        let event = EngineEvent::PaymentStatusChanged {
            payment: payment.id,
            order_id: payment.order_id.clone(),
            from,
            to: target,
        };
        self.commit(&mut state, Changeset::new().put(Record::Payment(payment.clone())), event)
            .await?;
        Ok(payment)
    }
}

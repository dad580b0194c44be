// models/src/medical/payment.rs
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{HospitalError, HospitalResult};
use crate::identifiers::{AppointmentId, PaymentId, UserId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Waiting,
    Paid,
    Failed,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaymentStatus::Waiting => "WAITING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub id: PaymentId,
    pub patient: UserId,
    pub order_id: String,
    pub amount: i64,
    pub status: PaymentStatus,
    pub description: String,
    pub appointment: Option<AppointmentId>,
    pub snap_token: Option<String>,
    pub redirect_url: Option<String>,
    pub payment_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPayment {
    pub patient_id: UserId,
    pub amount: i64,
    #[serde(default)]
    pub description: Option<String>,
}

/// Asynchronous status callback posted by the payment gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayNotification {
    pub order_id: String,
    pub transaction_status: String,
    #[serde(default)]
    pub payment_type: Option<String>,
}

impl GatewayNotification {
    /// Maps the gateway's transaction status onto ours. `None` means the
    /// gateway reports the charge as still pending.
    pub fn resolved_status(&self) -> HospitalResult<Option<PaymentStatus>> {
        match self.transaction_status.trim().to_ascii_lowercase().as_str() {
            "settlement" | "capture" => Ok(Some(PaymentStatus::Paid)),
            "deny" | "cancel" | "expire" | "failure" => Ok(Some(PaymentStatus::Failed)),
            "pending" => Ok(None),
            other => Err(HospitalError::InvalidData(format!(
                "Unknown gateway transaction status: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GatewayNotification, PaymentStatus};

    fn notification(status: &str) -> GatewayNotification {
        GatewayNotification {
            order_id: "ORDER-1".into(),
            transaction_status: status.into(),
            payment_type: None,
        }
    }

    #[test]
    fn gateway_statuses_map_onto_payment_statuses() {
        assert_eq!(notification("settlement").resolved_status().unwrap(), Some(PaymentStatus::Paid));
        assert_eq!(notification("CAPTURE").resolved_status().unwrap(), Some(PaymentStatus::Paid));
        assert_eq!(notification("expire").resolved_status().unwrap(), Some(PaymentStatus::Failed));
        assert_eq!(notification("pending").resolved_status().unwrap(), None);
        assert!(notification("refund").resolved_status().is_err());
    }
}

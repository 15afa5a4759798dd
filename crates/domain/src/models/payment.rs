//! Payment transaction domain models.
//!
//! A transaction row is created locally before any gateway contact and
//! moves through `initiated -> pending -> {success|failed|cancelled|timeout}`.
//! Success is terminal and immutable except audit fields.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTransaction {
    pub id: Uuid,
    /// Gateway-facing transaction id, generated locally.
    pub transaction_id: String,
    #[serde(skip_serializing)]
    pub idempotency_key: String,
    pub user_id: Uuid,
    pub course_id: Uuid,
    /// Charged amount. Fixed at creation, never recomputed.
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub gateway_payment_id: Option<String>,
    pub gateway_txn_id: Option<String>,
    /// Outbound request signature.
    #[serde(skip_serializing)]
    pub hash: Option<String>,
    /// Signature actually received on the callback.
    #[serde(skip_serializing)]
    pub response_hash: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub initiated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Closed status set for the transaction state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Initiated,
    Pending,
    Success,
    Failed,
    Cancelled,
    Timeout,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Initiated => "initiated",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Success => "success",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Cancelled => "cancelled",
            TransactionStatus::Timeout => "timeout",
        }
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Success
                | TransactionStatus::Failed
                | TransactionStatus::Cancelled
                | TransactionStatus::Timeout
        )
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initiated" => Ok(TransactionStatus::Initiated),
            "pending" => Ok(TransactionStatus::Pending),
            "success" => Ok(TransactionStatus::Success),
            "failed" => Ok(TransactionStatus::Failed),
            "cancelled" => Ok(TransactionStatus::Cancelled),
            "timeout" => Ok(TransactionStatus::Timeout),
            _ => Err(format!("Invalid transaction status: {}", s)),
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentRequest {
    pub course_id: Uuid,
}

/// Redirect parameters the client posts to the gateway. Ordered map so
/// serialized output is stable.
pub type PaymentParams = BTreeMap<String, String>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentResponse {
    pub transaction_id: String,
    pub payment_url: String,
    pub payment_params: PaymentParams,
    pub merchant_key: String,
}

/// Url-encoded fields the gateway posts back to the callback endpoint.
/// The five user-defined fields carry our user id (udf1) and course id
/// (udf2) and participate in the response signature.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayCallback {
    pub txnid: String,
    pub status: String,
    pub hash: String,
    #[serde(default)]
    pub mihpayid: String,
    #[serde(default)]
    pub bank_ref_num: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub productinfo: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub udf1: String,
    #[serde(default)]
    pub udf2: String,
    #[serde(default)]
    pub udf3: String,
    #[serde(default)]
    pub udf4: String,
    #[serde(default)]
    pub udf5: String,
    #[serde(default)]
    pub error: String,
    #[serde(default, rename = "error_Message")]
    pub error_message: String,
}

/// Result of processing a gateway callback.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackOutcome {
    pub transaction_id: String,
    pub status: TransactionStatus,
    pub gateway_payment_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!TransactionStatus::Initiated.is_terminal());
        assert!(!TransactionStatus::Pending.is_terminal());
        assert!(TransactionStatus::Success.is_terminal());
        assert!(TransactionStatus::Failed.is_terminal());
        assert!(TransactionStatus::Cancelled.is_terminal());
        assert!(TransactionStatus::Timeout.is_terminal());
    }

    #[test]
    fn test_status_round_trip() {
        for s in ["initiated", "pending", "success", "failed", "cancelled", "timeout"] {
            assert_eq!(TransactionStatus::from_str(s).unwrap().as_str(), s);
        }
        assert!(TransactionStatus::from_str("refunded").is_err());
    }

    #[test]
    fn test_sensitive_fields_never_serialized() {
        let txn = PaymentTransaction {
            id: Uuid::new_v4(),
            transaction_id: "TXN1700000000000123456".to_string(),
            idempotency_key: "deadbeef".to_string(),
            user_id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            amount: Decimal::new(90000, 2),
            status: TransactionStatus::Initiated,
            gateway_payment_id: None,
            gateway_txn_id: None,
            hash: Some("outbound-hash".to_string()),
            response_hash: None,
            error_code: None,
            error_message: None,
            initiated_at: Utc::now(),
            completed_at: None,
        };
        let json = serde_json::to_string(&txn).unwrap();
        assert!(!json.contains("deadbeef"));
        assert!(!json.contains("outbound-hash"));
        assert!(json.contains("\"status\":\"initiated\""));
    }
}

//! Entitlements: the right of a user to access a purchased course.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// One row per successful purchase. Insert-only; created inside the same
/// storage transaction that marks the payment successful.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub amount: Decimal,
    pub gateway_payment_id: Option<String>,
    /// `None` means perpetual access.
    pub expiry_date: Option<DateTime<Utc>>,
    pub granted_at: DateTime<Utc>,
}

impl Entitlement {
    /// Access requires `expiry_date` strictly in the future. An expiry
    /// equal to `now` counts as expired.
    pub fn grants_access(&self, now: DateTime<Utc>) -> bool {
        match self.expiry_date {
            None => true,
            Some(expiry) => expiry > now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entitlement(expiry: Option<DateTime<Utc>>) -> Entitlement {
        Entitlement {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            amount: Decimal::new(90000, 2),
            gateway_payment_id: Some("403993715531".to_string()),
            expiry_date: expiry,
            granted_at: Utc::now(),
        }
    }

    #[test]
    fn test_perpetual_access() {
        assert!(entitlement(None).grants_access(Utc::now()));
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let now = Utc::now();
        assert!(!entitlement(Some(now)).grants_access(now));
        assert!(entitlement(Some(now + Duration::seconds(1))).grants_access(now));
        assert!(!entitlement(Some(now - Duration::seconds(1))).grants_access(now));
    }
}

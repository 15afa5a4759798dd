//! Amount arithmetic, transaction ids and idempotency keys.

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use shared::crypto::sha256_hex;

/// Final charge: `price - price * discount / 100`, rounded to 2 decimals
/// half away from zero. The result feeds both the persisted amount and
/// the gateway hash string.
pub fn final_amount(price: Decimal, discount_percent: Decimal) -> Decimal {
    let discounted = price - price * discount_percent / Decimal::ONE_HUNDRED;
    discounted.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Exact 2-decimal wire formatting. `900` becomes `"900.00"`.
pub fn format_amount(amount: Decimal) -> String {
    format!(
        "{:.2}",
        amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

/// Gateway-facing transaction id: `TXN` + unix millis + 6 random digits.
pub fn new_transaction_id(now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("TXN{}{:06}", now.timestamp_millis(), suffix)
}

/// Deduplication key for a purchase attempt. The timestamp is truncated
/// to a minute-wide bucket so rapid resubmissions collapse into one
/// transaction row.
pub fn idempotency_key(user_id: Uuid, course_id: Uuid, at: DateTime<Utc>) -> String {
    let bucket = at.timestamp() / 60;
    sha256_hex(&format!("{}|{}|{}", user_id, course_id, bucket))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_discount_arithmetic() {
        let amount = final_amount(Decimal::from(1000), Decimal::from(10));
        assert_eq!(format_amount(amount), "900.00");
    }

    #[test]
    fn test_no_discount_keeps_price() {
        let amount = final_amount(Decimal::new(49950, 2), Decimal::ZERO);
        assert_eq!(format_amount(amount), "499.50");
    }

    #[test]
    fn test_fractional_discount_rounds_half_away_from_zero() {
        // 100.01 * 0.005 leaves 99.50995, which rounds to 99.51.
        let amount = final_amount(Decimal::new(10001, 2), Decimal::new(5, 1));
        assert_eq!(format_amount(amount), "99.51");
    }

    #[test]
    fn test_whole_number_formats_with_two_decimals() {
        assert_eq!(format_amount(Decimal::from(900)), "900.00");
    }

    #[test]
    fn test_transaction_id_shape() {
        let id = new_transaction_id(Utc::now());
        assert!(id.starts_with("TXN"));
        assert!(id[3..].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(id.len(), 3 + 13 + 6);
    }

    #[test]
    fn test_idempotency_key_is_stable_within_a_minute_bucket() {
        let user = Uuid::new_v4();
        let course = Uuid::new_v4();
        let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 5).unwrap();
        let t1 = t0 + Duration::seconds(40);
        let next_bucket = t0 + Duration::seconds(60);

        assert_eq!(
            idempotency_key(user, course, t0),
            idempotency_key(user, course, t1)
        );
        assert_ne!(
            idempotency_key(user, course, t0),
            idempotency_key(user, course, next_bucket)
        );
    }

    #[test]
    fn test_idempotency_key_varies_by_user_and_course() {
        let at = Utc::now();
        let user = Uuid::new_v4();
        let course = Uuid::new_v4();
        assert_ne!(
            idempotency_key(user, course, at),
            idempotency_key(Uuid::new_v4(), course, at)
        );
        assert_ne!(
            idempotency_key(user, course, at),
            idempotency_key(user, Uuid::new_v4(), at)
        );
    }
}

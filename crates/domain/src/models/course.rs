//! Course catalog domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    /// List price. Fixed-point; never a float.
    pub price: Decimal,
    /// Discount in percent, 0 to 100.
    pub discount_percent: Decimal,
    /// Days of access after purchase. `None` means perpetual access.
    pub expiry_days: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// True when the course can be purchased at all.
    pub fn is_purchasable(&self) -> bool {
        self.is_active && self.price > Decimal::ZERO
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    #[validate(length(min = 2, max = 200, message = "Title must be between 2 and 200 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    pub category_id: Option<Uuid>,

    pub price: Decimal,

    #[serde(default)]
    pub discount_percent: Decimal,

    #[validate(range(min = 1, message = "Expiry must be at least one day"))]
    pub expiry_days: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    #[validate(length(min = 2, max = 200, message = "Title must be between 2 and 200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    pub category_id: Option<Uuid>,
    pub price: Option<Decimal>,
    pub discount_percent: Option<Decimal>,
    pub expiry_days: Option<i32>,
    pub is_active: Option<bool>,
}

/// Catalog listing filters, combined with pagination at the API layer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseFilter {
    /// Case-insensitive substring match on title and description.
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(price: Decimal, active: bool) -> Course {
        Course {
            id: Uuid::new_v4(),
            title: "Algebra Basics".to_string(),
            description: None,
            category_id: None,
            price,
            discount_percent: Decimal::ZERO,
            expiry_days: Some(365),
            is_active: active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_purchasable_requires_active_and_priced() {
        assert!(course(Decimal::new(99900, 2), true).is_purchasable());
        assert!(!course(Decimal::ZERO, true).is_purchasable());
        assert!(!course(Decimal::new(99900, 2), false).is_purchasable());
    }
}

//! Entity definitions (database row mappings).

pub mod catalog;
pub mod entitlement;
pub mod otp;
pub mod payment;
pub mod user;

pub use catalog::{CategoryEntity, CourseEntity, PdfEntity, VideoEntity};
pub use entitlement::EntitlementEntity;
pub use otp::OtpEntity;
pub use payment::PaymentTransactionEntity;
pub use user::{UserEntity, UserSessionEntity};

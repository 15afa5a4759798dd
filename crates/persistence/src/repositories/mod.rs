//! Repository implementations for database operations.

pub mod category;
pub mod content;
pub mod course;
pub mod entitlement;
pub mod otp;
pub mod payment_transaction;
pub mod user;

pub use category::CategoryRepository;
pub use content::ContentRepository;
pub use course::{CourseQuery, CourseRepository};
pub use entitlement::{EntitlementGrant, EntitlementRepository};
pub use otp::OtpRepository;
pub use payment_transaction::{CallbackUpdate, NewTransaction, PaymentTransactionRepository};
pub use user::UserRepository;

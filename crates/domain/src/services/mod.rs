//! Domain services for CourseMart.
//!
//! Services contain business logic that operates on domain models.

pub mod collaborators;
pub mod gateway;
pub mod pricing;

pub use collaborators::{BlobStore, CollaboratorError, OtpSender, Watermarker};

pub use gateway::{GatewayAdapter, GatewayConfig, GatewayError, PaymentRequestFields};

pub use pricing::{final_amount, format_amount, idempotency_key, new_transaction_id};

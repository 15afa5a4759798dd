pub mod auth;
pub mod blob_store;
pub mod content;
pub mod otp_sender;
pub mod payment;
pub mod watermark;

pub use auth::{AuthError, AuthService};
pub use blob_store::LocalBlobStore;
pub use content::{ContentError, ContentService};
pub use otp_sender::ConsoleOtpSender;
pub use payment::{PaymentError, PaymentService};
pub use watermark::TextStamper;

//! Domain models for the CourseMart backend.

pub mod category;
pub mod content;
pub mod course;
pub mod entitlement;
pub mod otp;
pub mod payment;
pub mod user;

pub use category::*;
pub use content::*;
pub use course::*;
pub use entitlement::*;
pub use otp::*;
pub use payment::*;
pub use user::*;

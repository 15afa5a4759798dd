//! Domain layer for the CourseMart backend.
//!
//! This crate contains:
//! - Domain models (User, Course, PaymentTransaction, Entitlement)
//! - Business logic services (gateway adapter, pricing)
//! - Collaborator contracts (blob storage, OTP delivery, watermarking)

pub mod models;
pub mod services;

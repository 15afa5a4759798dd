//! CourseMart API crate.
//!
//! HTTP surface for the course marketplace: authentication, catalog
//! management, content delivery and the payment flow. Binds the
//! domain and persistence crates together behind an axum router.

pub mod app;
pub mod config;
pub mod error;
pub mod extractors;
pub mod jobs;
pub mod middleware;
pub mod routes;
pub mod services;

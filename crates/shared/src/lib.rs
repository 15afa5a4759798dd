//! Shared utilities used across the CourseMart workspace:
//! - hashing helpers for gateway signatures and token fingerprints
//! - Argon2id password hashing
//! - JWT issuing and verification
//! - request validation helpers
//! - pagination primitives for catalog listings

pub mod crypto;
pub mod jwt;
pub mod pagination;
pub mod password;
pub mod validation;

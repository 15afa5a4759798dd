pub mod auth;
pub mod categories;
pub mod content;
pub mod courses;
pub mod health;
pub mod payments;

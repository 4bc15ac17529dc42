//! API endpoint handlers.

pub mod analyze;
pub mod guidelines;
pub mod health;

//! HTTP handlers.

pub mod extract;
pub mod meetings;

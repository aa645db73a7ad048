// ============================
// campus-backend/src/auth/mod.rs
// ============================
//! Viewer identity.
//!
//! Authentication is owned by the upstream gateway. This module only asks the
//! identity collaborator who a viewer is and whether a host id exists.

mod service;
mod service_impl;
pub mod viewer;

pub use service::{Directory, UserProfile};
pub use service_impl::{InMemoryDirectory, PassthroughDirectory};
pub use viewer::{Viewer, USER_ID_HEADER};

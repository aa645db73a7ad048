// crates/backend-lib/src/middleware/mod.rs

//! Middleware for the campus meetings HTTP surface.

pub mod rate_limit;

pub use rate_limit::{rate_limit, spawn_cleanup, RateLimiter};

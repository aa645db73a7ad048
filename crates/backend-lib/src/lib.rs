// ============================
// campus-backend/src/lib.rs
// ============================
//! Meeting lifecycle and access engine for the campus portal.
//!
//! Phase is always derived from the stored record and the clock
//! ([`status`]), permissions from phase and viewer ([`permissions`]), and
//! every write goes through the meeting's single writer ([`meet_actor`]).

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod meet;
pub mod meet_actor;
pub mod metrics;
pub mod middleware;
pub mod permissions;
pub mod query;
pub mod recording;
pub mod roster;
pub mod router;
pub mod service;
pub mod status;
pub mod storage;
pub mod validation;

use std::sync::Arc;
use std::time::Duration;

use crate::auth::Directory;
use crate::clock::Clock;
use crate::config::Settings;
use crate::middleware::RateLimiter;
use crate::service::MeetingService;
use crate::storage::Storage;

/// Application state shared across all handlers
pub struct AppState {
    /// Meeting operations
    pub service: MeetingService,
    /// Account lookups for the viewer extractor
    pub directory: Arc<dyn Directory>,
    pub settings: Arc<Settings>,
    /// Shared with the background sweep
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(
        storage: Arc<dyn Storage>,
        clock: Arc<dyn Clock>,
        directory: Arc<dyn Directory>,
        settings: Settings,
    ) -> Self {
        let service = MeetingService::new(storage, clock, directory.clone(), &settings);
        let rate_limiter = Arc::new(RateLimiter::new(
            Duration::from_secs(settings.rate_limit.window_secs),
            settings.rate_limit.max_requests,
        ));

        Self {
            service,
            directory,
            settings: Arc::new(settings),
            rate_limiter,
        }
    }
}

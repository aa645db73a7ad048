//! Shared setup for the integration tests.
//!
//! Every environment runs on a [`ManualClock`] pinned to [`t0`] so phase
//! boundaries can be crossed deterministically.
#![allow(dead_code)]

use std::sync::Arc;

use campus_backend::{
    auth::InMemoryDirectory,
    clock::ManualClock,
    config::Settings,
    service::MeetingService,
    storage::MemoryStorage,
    AppState,
};
use campus_common::{CatalogTags, ScheduleRequest};
use chrono::{DateTime, Duration, TimeZone, Utc};

pub const HOST: &str = "host";
pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";
pub const CAROL: &str = "carol";

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 1, 9, 0, 0).unwrap()
}

pub fn directory() -> Arc<InMemoryDirectory> {
    let directory = InMemoryDirectory::new();
    directory.register(HOST, "Ada Lovelace");
    directory.register(ALICE, "Alice");
    directory.register(BOB, "Bob");
    directory.register(CAROL, "Carol");
    Arc::new(directory)
}

/// A meeting starting `start_in` minutes after the clock's current time
pub fn schedule_request(title: &str, start_in: i64, duration_minutes: u32) -> ScheduleRequest {
    ScheduleRequest {
        title: title.to_string(),
        description: format!("{title} study session"),
        tags: CatalogTags {
            degree: Some("BSc Computer Science".to_string()),
            year: Some("Year 2".to_string()),
            semester: Some("Semester 1".to_string()),
            module: Some("COMP2041 Software Construction".to_string()),
            labels: vec!["revision".to_string()],
        },
        scheduled_start: t0() + Duration::minutes(start_in),
        duration_minutes,
        max_participants: None,
        allow_recording: None,
    }
}

pub struct TestEnv {
    pub service: Arc<MeetingService>,
    pub storage: Arc<MemoryStorage>,
    pub clock: ManualClock,
}

pub fn setup() -> TestEnv {
    setup_with(Settings::default())
}

pub fn setup_with(settings: Settings) -> TestEnv {
    let storage = Arc::new(MemoryStorage::new());
    let clock = ManualClock::new(t0());
    let service = MeetingService::new(
        storage.clone(),
        Arc::new(clock.clone()),
        directory(),
        &settings,
    );
    TestEnv {
        service: Arc::new(service),
        storage,
        clock,
    }
}

/// Application state for router tests
pub fn app_state(settings: Settings) -> (Arc<AppState>, ManualClock) {
    let clock = ManualClock::new(t0());
    let state = AppState::new(
        Arc::new(MemoryStorage::new()),
        Arc::new(clock.clone()),
        directory(),
        settings,
    );
    (Arc::new(state), clock)
}

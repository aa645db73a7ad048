// ============================
// campus-backend/src/status.rs
// ============================
//! Phase derivation: (meeting, now) -> phase. Pure, no I/O.
use campus_common::{ExplicitState, Meeting, Phase};
use chrono::{DateTime, Duration, Utc};

/// Derives the display phase of a meeting at a given instant
#[derive(Debug, Clone, Copy)]
pub struct StatusDeriver {
    starting_soon: Duration,
}

impl StatusDeriver {
    pub fn new(starting_soon: Duration) -> Self {
        Self { starting_soon }
    }

    pub fn starting_soon_window(&self) -> Duration {
        self.starting_soon
    }

    /// Explicit `cancelled`/`ended` and explicit `in-progress` always win.
    /// A `scheduled` meeting follows the clock, including auto-expiry once its window passes.
    pub fn derive(&self, meeting: &Meeting, now: DateTime<Utc>) -> Phase {
        match meeting.explicit_state {
            ExplicitState::Cancelled | ExplicitState::Ended => Phase::Ended,
            // An explicitly started meeting stays live past its window until ended
            ExplicitState::InProgress => Phase::InProgress,
            ExplicitState::Scheduled => {
                let start = meeting.scheduled_start;
                let opens = start
                    .checked_sub_signed(self.starting_soon)
                    .unwrap_or(DateTime::<Utc>::MIN_UTC);
                if now < opens {
                    Phase::Upcoming
                } else if now < start {
                    Phase::StartingSoon
                } else if now < meeting.scheduled_end() {
                    Phase::InProgress
                } else {
                    Phase::Ended
                }
            },
        }
    }
}

impl Default for StatusDeriver {
    fn default() -> Self {
        Self::new(Duration::minutes(15))
    }
}

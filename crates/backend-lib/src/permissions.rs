// ============================
// campus-backend/src/permissions.rs
// ============================
//! Per-viewer permissions derived from a meeting and its current phase.
use campus_common::{ExplicitState, Meeting, Phase};

/// What one viewer may do with one meeting right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permissions {
    pub is_host: bool,
    pub can_start: bool,
    pub can_join: bool,
}

/// Resolve permissions. `phase` must come from the status deriver for the same instant.
pub fn resolve(meeting: &Meeting, phase: Phase, viewer_id: &str) -> Permissions {
    let is_host = meeting.is_host(viewer_id);

    // Starting early is allowed
    let can_start = is_host
        && matches!(phase, Phase::Upcoming | Phase::StartingSoon)
        && meeting.explicit_state == ExplicitState::Scheduled;

    let can_join = matches!(phase, Phase::StartingSoon | Phase::InProgress)
        && meeting.explicit_state != ExplicitState::Cancelled;

    Permissions {
        is_host,
        can_start,
        can_join,
    }
}

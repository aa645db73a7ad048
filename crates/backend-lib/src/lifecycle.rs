// ============================
// campus-backend/src/lifecycle.rs
// ============================
//! Host-driven lifecycle transitions.
//!
//! Legal moves of the explicit state:
//!
//! ```text
//! scheduled --start--> in-progress --end--> ended
//!     |                                       ^
//!     +--end (once the join window opened)----+
//!     |
//!     +--cancel--> cancelled
//! ```
//!
//! Repeating a transition whose target is already reached succeeds without
//! changes so that clients can retry after a dropped response. Leaving the
//! live window (end, cancel) also stops a running recording.
use campus_common::{ExplicitState, Meeting, Phase, UpdateDetailsRequest};
use chrono::{DateTime, Utc};

use crate::{error::AppError, permissions, recording, validation::ValidationError};

/// Outcome of a lifecycle operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The record changed and must be persisted
    Applied,
    /// Already in the requested state
    AlreadyInState,
}

pub(crate) fn require_host(meeting: &Meeting, actor_id: &str, action: &str) -> Result<(), AppError> {
    if meeting.is_host(actor_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "only the host can {action} this meeting"
        )))
    }
}

fn touch(meeting: &mut Meeting, now: DateTime<Utc>) {
    meeting.updated_at = now;
}

/// `scheduled -> in-progress`. Hosts may start early.
pub fn start(
    meeting: &mut Meeting,
    phase: Phase,
    host_id: &str,
    now: DateTime<Utc>,
) -> Result<Transition, AppError> {
    require_host(meeting, host_id, "start")?;

    match meeting.explicit_state {
        ExplicitState::InProgress => Ok(Transition::AlreadyInState),
        ExplicitState::Ended | ExplicitState::Cancelled => Err(AppError::InvalidTransition {
            from: meeting.explicit_state.as_str(),
            action: "start",
        }),
        ExplicitState::Scheduled => {
            if !permissions::resolve(meeting, phase, host_id).can_start {
                return Err(AppError::InvalidTransition {
                    from: phase.as_str(),
                    action: "start",
                });
            }
            meeting.explicit_state = ExplicitState::InProgress;
            meeting.started_at = Some(now);
            touch(meeting, now);
            Ok(Transition::Applied)
        },
    }
}

/// `-> ended`. Allowed from `in-progress`, and from `scheduled` once the
/// join window has opened (starting-soon, time-inferred live, or expired).
pub fn end(
    meeting: &mut Meeting,
    phase: Phase,
    host_id: &str,
    now: DateTime<Utc>,
) -> Result<Transition, AppError> {
    require_host(meeting, host_id, "end")?;

    match meeting.explicit_state {
        ExplicitState::Ended => Ok(Transition::AlreadyInState),
        ExplicitState::Cancelled => Err(AppError::InvalidTransition {
            from: ExplicitState::Cancelled.as_str(),
            action: "end",
        }),
        ExplicitState::Scheduled if phase == Phase::Upcoming => Err(AppError::InvalidTransition {
            from: phase.as_str(),
            action: "end",
        }),
        ExplicitState::Scheduled | ExplicitState::InProgress => {
            meeting.explicit_state = ExplicitState::Ended;
            meeting.ended_at = Some(now);
            recording::halt(meeting, now);
            touch(meeting, now);
            Ok(Transition::Applied)
        },
    }
}

/// `scheduled -> cancelled`
pub fn cancel(
    meeting: &mut Meeting,
    host_id: &str,
    now: DateTime<Utc>,
) -> Result<Transition, AppError> {
    require_host(meeting, host_id, "cancel")?;

    match meeting.explicit_state {
        ExplicitState::Cancelled => Ok(Transition::AlreadyInState),
        ExplicitState::Scheduled => {
            meeting.explicit_state = ExplicitState::Cancelled;
            recording::halt(meeting, now);
            touch(meeting, now);
            Ok(Transition::Applied)
        },
        ExplicitState::InProgress | ExplicitState::Ended => Err(AppError::InvalidTransition {
            from: meeting.explicit_state.as_str(),
            action: "cancel",
        }),
    }
}

/// Move the scheduled window. The roster is untouched.
/// Field validation (future start, duration bounds) happens before this call.
pub fn reschedule(
    meeting: &mut Meeting,
    host_id: &str,
    scheduled_start: DateTime<Utc>,
    duration_minutes: u32,
    now: DateTime<Utc>,
) -> Result<Transition, AppError> {
    require_host(meeting, host_id, "reschedule")?;

    if meeting.explicit_state != ExplicitState::Scheduled {
        return Err(AppError::InvalidTransition {
            from: meeting.explicit_state.as_str(),
            action: "reschedule",
        });
    }

    if meeting.scheduled_start == scheduled_start && meeting.duration_minutes == duration_minutes {
        return Ok(Transition::AlreadyInState);
    }

    meeting.scheduled_start = scheduled_start;
    meeting.duration_minutes = duration_minutes;
    touch(meeting, now);
    Ok(Transition::Applied)
}

/// Edit descriptive fields. `details` must already be validated.
pub fn update_details(
    meeting: &mut Meeting,
    host_id: &str,
    details: UpdateDetailsRequest,
    now: DateTime<Utc>,
) -> Result<Transition, AppError> {
    require_host(meeting, host_id, "edit")?;

    if meeting.explicit_state.is_terminal() {
        return Err(AppError::InvalidTransition {
            from: meeting.explicit_state.as_str(),
            action: "edit",
        });
    }

    if let Some(capacity) = details.max_participants {
        if (capacity as usize) < meeting.participants.len() {
            return Err(ValidationError::CapacityBelowRoster {
                requested: capacity,
                roster: meeting.participants.len(),
            }
            .into());
        }
        meeting.max_participants = capacity;
    }
    if let Some(title) = details.title {
        meeting.title = title;
    }
    if let Some(description) = details.description {
        meeting.description = description;
    }
    if let Some(tags) = details.tags {
        meeting.tags = tags;
    }
    if let Some(allowed) = details.allow_recording {
        meeting.recording.allowed = allowed;
    }
    touch(meeting, now);
    Ok(Transition::Applied)
}

/// Deletion is refused while the meeting is explicitly live
pub fn ensure_deletable(meeting: &Meeting, host_id: &str) -> Result<(), AppError> {
    require_host(meeting, host_id, "delete")?;

    if meeting.explicit_state == ExplicitState::InProgress {
        return Err(AppError::InvalidTransition {
            from: ExplicitState::InProgress.as_str(),
            action: "delete",
        });
    }
    Ok(())
}

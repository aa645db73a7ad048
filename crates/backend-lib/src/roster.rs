// ============================
// campus-backend/src/roster.rs
// ============================
//! Roster mutation rules.
//!
//! These functions only decide and apply a change to an in-memory record.
//! Callers run them inside the meeting's single writer (see `meet_actor`),
//! after reloading the record and deriving the phase for the current instant.
use campus_common::{Meeting, Participant, Phase};
use chrono::{DateTime, Utc};

use crate::{error::AppError, lifecycle::require_host, permissions};

/// Result of a roster change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterChange {
    /// The record was modified and must be persisted
    Applied,
    /// Nothing to do; the roster already had the requested shape
    Unchanged,
}

/// Add `viewer_id` to the roster.
///
/// A repeat join keeps the original entry and succeeds. The host is never added.
pub fn join(
    meeting: &mut Meeting,
    phase: Phase,
    viewer_id: &str,
    now: DateTime<Utc>,
) -> Result<RosterChange, AppError> {
    let perms = permissions::resolve(meeting, phase, viewer_id);
    if !perms.can_join {
        return Err(AppError::NotJoinable { phase });
    }

    if perms.is_host || meeting.is_participant(viewer_id) {
        return Ok(RosterChange::Unchanged);
    }

    if meeting.participants.len() >= meeting.max_participants as usize {
        return Err(AppError::MeetingFull {
            capacity: meeting.max_participants,
        });
    }

    meeting.participants.push(Participant {
        user_id: viewer_id.to_string(),
        joined_at: now,
    });
    Ok(RosterChange::Applied)
}

/// Remove `user_id` from the roster. Absent users are a no-op.
pub fn leave(meeting: &mut Meeting, user_id: &str) -> RosterChange {
    let before = meeting.participants.len();
    meeting.participants.retain(|p| p.user_id != user_id);
    if meeting.participants.len() == before {
        RosterChange::Unchanged
    } else {
        RosterChange::Applied
    }
}

/// Host-only eviction of a participant
pub fn evict(
    meeting: &mut Meeting,
    host_id: &str,
    participant_id: &str,
) -> Result<RosterChange, AppError> {
    if !meeting.is_host(host_id) {
        return Err(AppError::Forbidden(
            "only the host can remove participants".to_string(),
        ));
    }
    Ok(leave(meeting, participant_id))
}

/// Host places users on the roster ahead of or during the meeting.
///
/// The host and users already present are skipped. Either every new user fits
/// under the capacity or nobody is added. Returns how many were added.
pub fn add_participants(
    meeting: &mut Meeting,
    phase: Phase,
    host_id: &str,
    user_ids: &[String],
    now: DateTime<Utc>,
) -> Result<usize, AppError> {
    require_host(meeting, host_id, "add participants to")?;
    if phase == Phase::Ended {
        return Err(AppError::InvalidTransition {
            from: phase.as_str(),
            action: "add participants to",
        });
    }

    let mut fresh: Vec<&String> = Vec::new();
    for id in user_ids {
        if meeting.is_host(id) || meeting.is_participant(id) || fresh.contains(&id) {
            continue;
        }
        fresh.push(id);
    }

    if meeting.participants.len() + fresh.len() > meeting.max_participants as usize {
        return Err(AppError::MeetingFull {
            capacity: meeting.max_participants,
        });
    }

    let added = fresh.len();
    meeting
        .participants
        .extend(fresh.into_iter().map(|id| Participant {
            user_id: id.clone(),
            joined_at: now,
        }));
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_common::{CatalogTags, ExplicitState};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, 1, 9, 0, 0).unwrap()
    }

    fn meeting(capacity: u32) -> Meeting {
        Meeting {
            id: "m".to_string(),
            title: "Databases".to_string(),
            description: String::new(),
            tags: CatalogTags::default(),
            scheduled_start: now(),
            duration_minutes: 60,
            explicit_state: ExplicitState::Scheduled,
            host_id: "host".to_string(),
            host_display_name: "Host".to_string(),
            participants: vec![],
            join_link: String::new(),
            max_participants: capacity,
            created_at: now(),
            updated_at: now(),
            started_at: None,
            ended_at: None,
            recording: Default::default(),
        }
    }

    #[test]
    fn test_join_is_idempotent() {
        let mut m = meeting(10);
        assert_eq!(
            join(&mut m, Phase::InProgress, "a", now()).unwrap(),
            RosterChange::Applied
        );
        let later = now() + Duration::minutes(5);
        assert_eq!(
            join(&mut m, Phase::InProgress, "a", later).unwrap(),
            RosterChange::Unchanged
        );
        assert_eq!(m.participants.len(), 1);
        assert_eq!(m.participants[0].joined_at, now());
    }

    #[test]
    fn test_join_outside_window_fails() {
        let mut m = meeting(10);
        assert!(matches!(
            join(&mut m, Phase::Upcoming, "a", now()),
            Err(AppError::NotJoinable {
                phase: Phase::Upcoming
            })
        ));
        assert!(matches!(
            join(&mut m, Phase::Ended, "a", now()),
            Err(AppError::NotJoinable { .. })
        ));
        assert!(m.participants.is_empty());
    }

    #[test]
    fn test_host_is_never_on_roster() {
        let mut m = meeting(10);
        assert_eq!(
            join(&mut m, Phase::InProgress, "host", now()).unwrap(),
            RosterChange::Unchanged
        );
        assert!(m.participants.is_empty());
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut m = meeting(1);
        join(&mut m, Phase::InProgress, "a", now()).unwrap();
        assert!(matches!(
            join(&mut m, Phase::InProgress, "b", now()),
            Err(AppError::MeetingFull { capacity: 1 })
        ));
        // Already present viewers are not rejected by a full roster
        assert_eq!(
            join(&mut m, Phase::InProgress, "a", now()).unwrap(),
            RosterChange::Unchanged
        );
    }

    #[test]
    fn test_join_leave_join_leaves_one_entry() {
        let mut m = meeting(10);
        join(&mut m, Phase::InProgress, "a", now()).unwrap();
        assert_eq!(leave(&mut m, "a"), RosterChange::Applied);
        assert_eq!(leave(&mut m, "a"), RosterChange::Unchanged);
        join(&mut m, Phase::InProgress, "a", now()).unwrap();
        assert_eq!(m.participants.len(), 1);
    }

    #[test]
    fn test_evict_requires_host() {
        let mut m = meeting(10);
        join(&mut m, Phase::InProgress, "a", now()).unwrap();
        assert!(matches!(
            evict(&mut m, "b", "a"),
            Err(AppError::Forbidden(_))
        ));
        assert_eq!(evict(&mut m, "host", "a").unwrap(), RosterChange::Applied);
        assert!(m.participants.is_empty());
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_add_participants_skips_host_and_members() {
        let mut m = meeting(10);
        join(&mut m, Phase::InProgress, "a", now()).unwrap();

        let added =
            add_participants(&mut m, Phase::Upcoming, "host", &ids(&["a", "b", "host", "b"]), now())
                .unwrap();
        assert_eq!(added, 1);
        let roster: Vec<&str> = m.participants.iter().map(|p| p.user_id.as_str()).collect();
        assert_eq!(roster, vec!["a", "b"]);
    }

    #[test]
    fn test_add_participants_is_all_or_nothing() {
        let mut m = meeting(2);
        join(&mut m, Phase::InProgress, "a", now()).unwrap();
        assert!(matches!(
            add_participants(&mut m, Phase::InProgress, "host", &ids(&["b", "c"]), now()),
            Err(AppError::MeetingFull { capacity: 2 })
        ));
        assert_eq!(m.participants.len(), 1);
    }

    #[test]
    fn test_add_participants_rules() {
        let mut m = meeting(10);
        assert!(matches!(
            add_participants(&mut m, Phase::Upcoming, "a", &ids(&["b"]), now()),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            add_participants(&mut m, Phase::Ended, "host", &ids(&["b"]), now()),
            Err(AppError::InvalidTransition { from: "ended", .. })
        ));
        assert!(m.participants.is_empty());
    }
}

// ============================
// campus-backend/src/query.rs
// ============================
//! Read views: a stored record annotated for one viewer at one instant.
use campus_common::{Meeting, MeetingStats, MeetingView, Phase, PublicListQuery};
use chrono::{DateTime, Utc};

use crate::{permissions, status::StatusDeriver};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Annotate a record with phase, permissions and roster size.
/// Roster identities are only exposed to the host.
pub fn annotate(
    deriver: &StatusDeriver,
    meeting: Meeting,
    viewer_id: &str,
    now: DateTime<Utc>,
) -> MeetingView {
    let phase = deriver.derive(&meeting, now);
    let perms = permissions::resolve(&meeting, phase, viewer_id);
    let scheduled_end = meeting.scheduled_end();
    let participant_count = meeting.participant_count();

    MeetingView {
        id: meeting.id,
        title: meeting.title,
        description: meeting.description,
        tags: meeting.tags,
        scheduled_start: meeting.scheduled_start,
        scheduled_end,
        duration_minutes: meeting.duration_minutes,
        explicit_state: meeting.explicit_state,
        host_id: meeting.host_id,
        host_display_name: meeting.host_display_name,
        join_link: meeting.join_link,
        max_participants: meeting.max_participants,
        created_at: meeting.created_at,
        updated_at: meeting.updated_at,
        started_at: meeting.started_at,
        ended_at: meeting.ended_at,
        phase,
        is_host: perms.is_host,
        can_start: perms.can_start,
        can_join: perms.can_join,
        participant_count,
        allow_recording: meeting.recording.allowed,
        is_recording: meeting.recording.is_recording,
        participants: perms.is_host.then_some(meeting.participants),
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Whether a meeting passes the public-list filters
pub fn matches_public(view: &MeetingView, query: &PublicListQuery) -> bool {
    if view.phase == Phase::Ended && !query.include_ended {
        return false;
    }
    if let Some(year) = blank(&query.year) {
        if view.tags.year.as_deref() != Some(year) {
            return false;
        }
    }
    if let Some(semester) = blank(&query.semester) {
        if view.tags.semester.as_deref() != Some(semester) {
            return false;
        }
    }
    if let Some(module) = blank(&query.module) {
        if !view.tags.module.as_deref().is_some_and(|m| contains_ci(m, module)) {
            return false;
        }
    }
    if let Some(search) = blank(&query.search) {
        let hit = contains_ci(&view.title, search)
            || contains_ci(&view.description, search)
            || contains_ci(&view.host_display_name, search);
        if !hit {
            return false;
        }
    }
    true
}

/// Apply 1-based `page`/`limit` to an already ordered list
pub fn paginate<T>(items: Vec<T>, page: Option<u32>, limit: Option<u32>) -> Vec<T> {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE) as usize;
    let page = page.unwrap_or(1).max(1) as usize;
    items
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .collect()
}

/// Attendance summary
pub fn stats(deriver: &StatusDeriver, meeting: &Meeting, now: DateTime<Utc>) -> MeetingStats {
    let phase = deriver.derive(meeting, now);
    let count = meeting.participant_count();
    let elapsed_minutes = meeting.started_at.map(|started| {
        let until = meeting.ended_at.unwrap_or(now);
        (until - started).num_minutes()
    });

    MeetingStats {
        meeting_id: meeting.id.clone(),
        phase,
        participant_count: count,
        capacity: meeting.max_participants,
        remaining_slots: meeting
            .max_participants
            .saturating_sub(u32::try_from(count).unwrap_or(u32::MAX)),
        minutes_until_start: (meeting.scheduled_start - now).num_minutes(),
        elapsed_minutes,
    }
}

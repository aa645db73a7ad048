// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! used for communication between the campus meetings engine and its callers.
//! This module defines the stored meeting record and the JSON shapes of the HTTP surface.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Opaque meeting identifier
pub type MeetingId = String;

/// Opaque account identifier, owned by the identity collaborator
pub type UserId = String;

/// Authoritative lifecycle flag, changed only by host actions
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ExplicitState {
    Scheduled,
    InProgress,
    Ended,
    Cancelled,
}

impl ExplicitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExplicitState::Scheduled => "scheduled",
            ExplicitState::InProgress => "in-progress",
            ExplicitState::Ended => "ended",
            ExplicitState::Cancelled => "cancelled",
        }
    }

    /// `ended` and `cancelled` can never be left
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExplicitState::Ended | ExplicitState::Cancelled)
    }
}

impl fmt::Display for ExplicitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived, display-facing lifecycle label. Never persisted.
///
/// Variants are declared in lifecycle order so `Ord` follows time.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Upcoming,
    StartingSoon,
    InProgress,
    Ended,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Upcoming => "upcoming",
            Phase::StartingSoon => "starting-soon",
            Phase::InProgress => "in-progress",
            Phase::Ended => "ended",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog tags attached to a meeting. Opaque to the engine apart from list filtering.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogTags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semester: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Free-form labels
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// A roster entry
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub user_id: UserId,
    pub joined_at: DateTime<Utc>,
}

/// Meeting record as persisted by the store
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: MeetingId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: CatalogTags,
    pub scheduled_start: DateTime<Utc>,
    pub duration_minutes: u32,
    pub explicit_state: ExplicitState,
    pub host_id: UserId,
    pub host_display_name: String,
    /// Unique per `user_id`; never contains the host
    #[serde(default)]
    pub participants: Vec<Participant>,
    pub join_link: String,
    pub max_participants: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recording: RecordingState,
}

impl Meeting {
    /// End of the scheduled window, saturating at the latest representable instant
    pub fn scheduled_end(&self) -> DateTime<Utc> {
        self.scheduled_start
            .checked_add_signed(Duration::minutes(i64::from(self.duration_minutes)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_host(&self, user_id: &str) -> bool {
        self.host_id == user_id
    }

    pub fn is_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p.user_id == user_id)
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }
}

/// Processing state of an uploaded recording file
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RecordingFileStatus {
    Processing,
    #[default]
    Completed,
    Failed,
}

/// Metadata of one recording file. Media lives elsewhere; only the pointer is kept.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecordingFile {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
    pub recorded_by: UserId,
    pub recorded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default)]
    pub status: RecordingFileStatus,
}

fn default_true() -> bool {
    true
}

/// Recording flag and file list of a meeting
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecordingState {
    /// Host setting; a recording cannot be started while this is off
    #[serde(default = "default_true")]
    pub allowed: bool,
    #[serde(default)]
    pub is_recording: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_by: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<DateTime<Utc>>,
    /// Length of the last finished recording
    #[serde(default)]
    pub duration_seconds: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<RecordingFile>,
}

impl Default for RecordingState {
    fn default() -> Self {
        Self {
            allowed: true,
            is_recording: false,
            started_by: None,
            started_at: None,
            stopped_at: None,
            duration_seconds: 0,
            files: Vec::new(),
        }
    }
}

/// A meeting as seen by one viewer: stored fields plus derived phase and permissions
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MeetingView {
    pub id: MeetingId,
    pub title: String,
    pub description: String,
    pub tags: CatalogTags,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub duration_minutes: u32,
    pub explicit_state: ExplicitState,
    pub host_id: UserId,
    pub host_display_name: String,
    pub join_link: String,
    pub max_participants: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    pub phase: Phase,
    pub is_host: bool,
    pub can_start: bool,
    pub can_join: bool,
    pub participant_count: usize,
    pub allow_recording: bool,
    pub is_recording: bool,
    /// Full roster, only present for the host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<Participant>>,
}

/// Body of `POST /meetings`
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: CatalogTags,
    pub scheduled_start: DateTime<Utc>,
    pub duration_minutes: u32,
    /// Roster capacity; the configured default applies when absent
    #[serde(default)]
    pub max_participants: Option<u32>,
    /// Defaults to allowed
    #[serde(default)]
    pub allow_recording: Option<bool>,
}

/// Body of `PUT /meetings/{id}/schedule`
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleRequest {
    pub scheduled_start: DateTime<Utc>,
    pub duration_minutes: u32,
}

/// Body of `PATCH /meetings/{id}`. Absent fields are left untouched.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDetailsRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<CatalogTags>,
    #[serde(default)]
    pub max_participants: Option<u32>,
    #[serde(default)]
    pub allow_recording: Option<bool>,
}

/// Body of `POST /meetings/{id}/participants`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct AddParticipantsRequest {
    pub user_ids: Vec<UserId>,
}

/// Body of `POST /meetings/{id}/recordings`
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AddRecordingRequest {
    pub filename: String,
    #[serde(default)]
    pub file_size_bytes: Option<u64>,
    #[serde(default)]
    pub duration_seconds: Option<u64>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub status: Option<RecordingFileStatus>,
}

/// Query string of `GET /meetings/public`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct PublicListQuery {
    /// Show meetings whose phase is `ended` (this includes cancelled ones)
    #[serde(default)]
    pub include_ended: bool,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub semester: Option<String>,
    /// Case-insensitive substring match on the module tag
    #[serde(default)]
    pub module: Option<String>,
    /// Case-insensitive substring match on title, description and host name
    #[serde(default)]
    pub search: Option<String>,
    /// 1-based page number
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Acknowledgement for operations without a meeting body
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    pub success: bool,
    pub message: String,
}

impl Ack {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Attendance summary visible to the host and current participants
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MeetingStats {
    pub meeting_id: MeetingId,
    pub phase: Phase,
    pub participant_count: usize,
    pub capacity: u32,
    pub remaining_slots: u32,
    /// Negative once the scheduled start has passed
    pub minutes_until_start: i64,
    /// Minutes between explicit start and end (or now, while live)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_minutes: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Meeting {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        Meeting {
            id: "m-1".to_string(),
            title: "Data Structures revision".to_string(),
            description: String::new(),
            tags: CatalogTags::default(),
            scheduled_start: start,
            duration_minutes: 90,
            explicit_state: ExplicitState::Scheduled,
            host_id: "host".to_string(),
            host_display_name: "Host".to_string(),
            participants: vec![],
            join_link: "http://localhost:3000/meeting/m-1".to_string(),
            max_participants: 50,
            created_at: start,
            updated_at: start,
            started_at: None,
            ended_at: None,
            recording: RecordingState::default(),
        }
    }

    #[test]
    fn test_scheduled_end() {
        let meeting = sample();
        assert_eq!(
            meeting.scheduled_end(),
            Utc.with_ymd_and_hms(2026, 3, 2, 11, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_scheduled_end_saturates_at_max_instant() {
        let mut meeting = sample();
        meeting.scheduled_start = DateTime::<Utc>::MAX_UTC - Duration::minutes(10);
        meeting.duration_minutes = 480;
        assert_eq!(meeting.scheduled_end(), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_records_without_recording_block_still_load() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json.as_object_mut().unwrap().remove("recording");
        let meeting: Meeting = serde_json::from_value(json).unwrap();
        assert!(meeting.recording.allowed);
        assert!(!meeting.recording.is_recording);
        assert!(meeting.recording.files.is_empty());
    }

    #[test]
    fn test_state_wire_names() {
        assert_eq!(
            serde_json::to_string(&ExplicitState::InProgress).unwrap(),
            "\"in-progress\""
        );
        assert_eq!(
            serde_json::to_string(&Phase::StartingSoon).unwrap(),
            "\"starting-soon\""
        );
        let state: ExplicitState = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(state, ExplicitState::Cancelled);
    }

    #[test]
    fn test_phase_order_follows_time() {
        assert!(Phase::Upcoming < Phase::StartingSoon);
        assert!(Phase::StartingSoon < Phase::InProgress);
        assert!(Phase::InProgress < Phase::Ended);
    }

    #[test]
    fn test_meeting_json_is_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["hostId"], "host");
        assert_eq!(json["durationMinutes"], 90);
        assert_eq!(json["explicitState"], "scheduled");
        assert!(json.get("startedAt").is_none());
    }

    #[test]
    fn test_schedule_request_defaults() {
        let req: ScheduleRequest = serde_json::from_str(
            r#"{"title":"t","scheduledStart":"2026-03-02T10:00:00Z","durationMinutes":30}"#,
        )
        .unwrap();
        assert_eq!(req.description, "");
        assert_eq!(req.tags, CatalogTags::default());
        assert!(req.max_participants.is_none());
    }
}

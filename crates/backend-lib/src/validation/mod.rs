// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Validation of scheduling fields and identifiers.

use campus_common::{
    AddRecordingRequest, RescheduleRequest, ScheduleRequest, UpdateDetailsRequest, UserId,
};
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::config::MeetingSettings;

const MAX_ID_LENGTH: usize = 64;
const MAX_DESCRIPTION_LENGTH: usize = 4000;
const MAX_TAG_LENGTH: usize = 120;
const MAX_FILENAME_LENGTH: usize = 255;
const MAX_URL_LENGTH: usize = 2048;

/// Most accounts a single add-participants request may name
pub const MAX_BATCH_SIZE: usize = MAX_PARTICIPANTS_LIMIT as usize;

/// Hard upper bound on roster capacity
pub const MAX_PARTICIPANTS_LIMIT: u32 = 100;

/// Possible validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid meeting ID: {0}")]
    InvalidMeetingId(String),

    #[error("Invalid user ID: {0}")]
    InvalidUserId(String),

    #[error("Title must not be empty")]
    EmptyTitle,

    #[error("Title cannot exceed {max} characters")]
    TitleTooLong { max: usize },

    #[error("Description cannot exceed {MAX_DESCRIPTION_LENGTH} characters")]
    DescriptionTooLong,

    #[error("Tag values cannot exceed {MAX_TAG_LENGTH} characters")]
    TagTooLong,

    #[error("Scheduled start must be in the future")]
    StartInPast,

    #[error("Scheduled start cannot be more than {max_days} days ahead")]
    StartTooFar { max_days: u32 },

    #[error("Duration must be between {min} and {max} minutes, got {got}")]
    DurationOutOfRange { min: u32, max: u32, got: u32 },

    #[error("Participant limit must be between 1 and {MAX_PARTICIPANTS_LIMIT}, got {0}")]
    InvalidCapacity(u32),

    #[error("Participant limit {requested} is below the current roster size {roster}")]
    CapacityBelowRoster { requested: u32, roster: usize },

    #[error("Recording filename must be 1-{MAX_FILENAME_LENGTH} characters")]
    InvalidFilename,

    #[error("Download URL cannot exceed {MAX_URL_LENGTH} characters")]
    UrlTooLong,

    #[error("Between 1 and {MAX_BATCH_SIZE} user IDs are required")]
    InvalidBatch,

    #[error("Malformed request: {0}")]
    MalformedRequest(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Validate a meeting ID. IDs double as file names, so only `[A-Za-z0-9_-]` is accepted.
pub fn validate_meeting_id(meeting_id: &str) -> ValidationResult<&str> {
    if meeting_id.is_empty() || meeting_id.len() > MAX_ID_LENGTH {
        return Err(ValidationError::InvalidMeetingId(format!(
            "Meeting ID must be between 1 and {MAX_ID_LENGTH} characters"
        )));
    }

    if !meeting_id.chars().all(is_id_char) {
        return Err(ValidationError::InvalidMeetingId(
            "Meeting ID must contain only alphanumeric characters, hyphens and underscores"
                .to_string(),
        ));
    }

    Ok(meeting_id)
}

/// Validate a viewer/host identity as handed over by the auth layer
pub fn validate_user_id(user_id: &str) -> ValidationResult<&str> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_ID_LENGTH || trimmed.len() != user_id.len() {
        return Err(ValidationError::InvalidUserId(
            "User ID must be 1-64 characters without surrounding whitespace".to_string(),
        ));
    }
    Ok(user_id)
}

/// Validate and normalise a title
pub fn validate_title(title: &str, max_len: usize) -> ValidationResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if title.chars().count() > max_len {
        return Err(ValidationError::TitleTooLong { max: max_len });
    }
    Ok(title.to_string())
}

/// Validate and normalise a description
pub fn validate_description(description: &str) -> ValidationResult<String> {
    let description = description.trim();
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::DescriptionTooLong);
    }
    Ok(description.to_string())
}

fn validate_tags(tags: &campus_common::CatalogTags) -> ValidationResult<()> {
    let fields = [&tags.degree, &tags.year, &tags.semester, &tags.module];
    let too_long = fields
        .iter()
        .filter_map(|f| f.as_deref())
        .chain(tags.labels.iter().map(String::as_str))
        .any(|v| v.chars().count() > MAX_TAG_LENGTH);
    if too_long {
        return Err(ValidationError::TagTooLong);
    }
    Ok(())
}

/// Validate a scheduling window: start strictly after `now` and at most
/// `max_lead_days` ahead, duration within the configured bounds
pub fn validate_window(
    scheduled_start: DateTime<Utc>,
    duration_minutes: u32,
    now: DateTime<Utc>,
    rules: &MeetingSettings,
) -> ValidationResult<()> {
    if duration_minutes == 0
        || duration_minutes < rules.min_duration_minutes
        || duration_minutes > rules.max_duration_minutes
    {
        return Err(ValidationError::DurationOutOfRange {
            min: rules.min_duration_minutes.max(1),
            max: rules.max_duration_minutes,
            got: duration_minutes,
        });
    }

    if scheduled_start <= now {
        return Err(ValidationError::StartInPast);
    }

    let horizon = now.checked_add_signed(Duration::days(i64::from(rules.max_lead_days)));
    if horizon.map_or(true, |latest| scheduled_start > latest) {
        return Err(ValidationError::StartTooFar {
            max_days: rules.max_lead_days,
        });
    }

    Ok(())
}

/// Validate a roster capacity
pub fn validate_capacity(max_participants: u32) -> ValidationResult<u32> {
    if max_participants == 0 || max_participants > MAX_PARTICIPANTS_LIMIT {
        return Err(ValidationError::InvalidCapacity(max_participants));
    }
    Ok(max_participants)
}

/// Fields of a schedule request after validation
#[derive(Debug, Clone)]
pub struct ValidSchedule {
    pub title: String,
    pub description: String,
    pub max_participants: u32,
}

/// Validate a full schedule request
pub fn validate_schedule(
    req: &ScheduleRequest,
    now: DateTime<Utc>,
    rules: &MeetingSettings,
) -> ValidationResult<ValidSchedule> {
    let title = validate_title(&req.title, rules.max_title_len)?;
    let description = validate_description(&req.description)?;
    validate_tags(&req.tags)?;
    validate_window(req.scheduled_start, req.duration_minutes, now, rules)?;
    let max_participants =
        validate_capacity(req.max_participants.unwrap_or(rules.default_max_participants))?;

    Ok(ValidSchedule {
        title,
        description,
        max_participants,
    })
}

/// Validate a reschedule request
pub fn validate_reschedule(
    req: &RescheduleRequest,
    now: DateTime<Utc>,
    rules: &MeetingSettings,
) -> ValidationResult<()> {
    validate_window(req.scheduled_start, req.duration_minutes, now, rules)
}

/// Validate the fields present in a details update
pub fn validate_details(
    req: &UpdateDetailsRequest,
    rules: &MeetingSettings,
) -> ValidationResult<UpdateDetailsRequest> {
    Ok(UpdateDetailsRequest {
        title: req
            .title
            .as_deref()
            .map(|t| validate_title(t, rules.max_title_len))
            .transpose()?,
        description: req.description.as_deref().map(validate_description).transpose()?,
        tags: match &req.tags {
            Some(tags) => {
                validate_tags(tags)?;
                Some(tags.clone())
            },
            None => None,
        },
        max_participants: req.max_participants.map(validate_capacity).transpose()?,
        allow_recording: req.allow_recording,
    })
}

/// Validate the account list of an add-participants request.
/// Duplicates are dropped, first occurrence wins.
pub fn validate_user_batch(user_ids: &[UserId]) -> ValidationResult<Vec<UserId>> {
    if user_ids.is_empty() || user_ids.len() > MAX_BATCH_SIZE {
        return Err(ValidationError::InvalidBatch);
    }
    let mut unique: Vec<UserId> = Vec::with_capacity(user_ids.len());
    for id in user_ids {
        validate_user_id(id)?;
        if !unique.contains(id) {
            unique.push(id.clone());
        }
    }
    Ok(unique)
}

/// Validate recording file metadata
pub fn validate_recording_file(req: &AddRecordingRequest) -> ValidationResult<()> {
    let name = req.filename.trim();
    if name.is_empty() || name.chars().count() > MAX_FILENAME_LENGTH {
        return Err(ValidationError::InvalidFilename);
    }
    if req
        .download_url
        .as_deref()
        .is_some_and(|url| url.len() > MAX_URL_LENGTH)
    {
        return Err(ValidationError::UrlTooLong);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 8, 0, 0).unwrap()
    }

    fn request(title: &str, start_in: i64, duration: u32) -> ScheduleRequest {
        ScheduleRequest {
            title: title.to_string(),
            description: String::new(),
            tags: Default::default(),
            scheduled_start: now() + Duration::minutes(start_in),
            duration_minutes: duration,
            max_participants: None,
            allow_recording: None,
        }
    }

    #[test]
    fn test_validate_meeting_id() {
        assert!(validate_meeting_id("4f1c2e7a-0b9d-4c51-9a3e-2f7d1b6c8e90").is_ok());
        assert!(validate_meeting_id("").is_err());
        assert!(validate_meeting_id("../etc/passwd").is_err());
        assert!(validate_meeting_id(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_user_id() {
        assert!(validate_user_id("student-42").is_ok());
        assert!(validate_user_id("   ").is_err());
        assert!(validate_user_id(" padded").is_err());
    }

    #[test]
    fn test_validate_schedule_accepts_good_request() {
        let rules = MeetingSettings::default();
        let valid = validate_schedule(&request("  Algorithms  ", 60, 60), now(), &rules).unwrap();
        assert_eq!(valid.title, "Algorithms");
        assert_eq!(valid.max_participants, rules.default_max_participants);
    }

    #[test]
    fn test_validate_schedule_rejects_bad_fields() {
        let rules = MeetingSettings::default();
        assert_eq!(
            validate_schedule(&request("   ", 60, 60), now(), &rules).unwrap_err(),
            ValidationError::EmptyTitle
        );
        assert_eq!(
            validate_schedule(&request("t", 0, 60), now(), &rules).unwrap_err(),
            ValidationError::StartInPast
        );
        assert!(matches!(
            validate_schedule(&request("t", 60, 0), now(), &rules).unwrap_err(),
            ValidationError::DurationOutOfRange { got: 0, .. }
        ));
        assert!(matches!(
            validate_schedule(&request("t", 60, rules.max_duration_minutes + 1), now(), &rules)
                .unwrap_err(),
            ValidationError::DurationOutOfRange { .. }
        ));

        let mut req = request("t", 60, 60);
        req.max_participants = Some(0);
        assert_eq!(
            validate_schedule(&req, now(), &rules).unwrap_err(),
            ValidationError::InvalidCapacity(0)
        );
    }

    #[test]
    fn test_validate_details_only_checks_present_fields() {
        let rules = MeetingSettings::default();
        let ok = validate_details(&UpdateDetailsRequest::default(), &rules).unwrap();
        assert!(ok.title.is_none());

        let bad = UpdateDetailsRequest {
            title: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(
            validate_details(&bad, &rules).unwrap_err(),
            ValidationError::EmptyTitle
        );
    }

    #[test]
    fn test_far_future_start_is_rejected() {
        let rules = MeetingSettings::default();
        let limit = i64::from(rules.max_lead_days) * 24 * 60;
        assert!(validate_schedule(&request("t", limit, 60), now(), &rules).is_ok());
        assert_eq!(
            validate_schedule(&request("t", limit + 1, 60), now(), &rules).unwrap_err(),
            ValidationError::StartTooFar {
                max_days: rules.max_lead_days
            }
        );

        let mut req = request("t", 60, 480);
        req.scheduled_start = DateTime::<Utc>::MAX_UTC - Duration::minutes(1);
        assert!(matches!(
            validate_schedule(&req, now(), &rules).unwrap_err(),
            ValidationError::StartTooFar { .. }
        ));
        let reschedule = RescheduleRequest {
            scheduled_start: req.scheduled_start,
            duration_minutes: 60,
        };
        assert!(matches!(
            validate_reschedule(&reschedule, now(), &rules).unwrap_err(),
            ValidationError::StartTooFar { .. }
        ));
    }

    #[test]
    fn test_validate_user_batch() {
        let ids = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        assert_eq!(validate_user_batch(&ids).unwrap(), vec!["a", "b"]);
        assert_eq!(validate_user_batch(&[]).unwrap_err(), ValidationError::InvalidBatch);
        assert!(matches!(
            validate_user_batch(&[" x".to_string()]).unwrap_err(),
            ValidationError::InvalidUserId(_)
        ));
    }

    #[test]
    fn test_validate_recording_file() {
        let mut req = AddRecordingRequest {
            filename: "lecture-01.mp4".to_string(),
            file_size_bytes: Some(1024),
            duration_seconds: Some(3600),
            download_url: None,
            status: None,
        };
        assert!(validate_recording_file(&req).is_ok());
        req.filename = "  ".to_string();
        assert_eq!(
            validate_recording_file(&req).unwrap_err(),
            ValidationError::InvalidFilename
        );
    }
}

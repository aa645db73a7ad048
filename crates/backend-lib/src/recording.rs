// ============================
// campus-backend/src/recording.rs
// ============================
//! Recording metadata rules.
//!
//! Capture and storage of media happen outside the engine. These functions
//! track whether a recording is running, who started it and which files it
//! produced. Like the roster rules they run inside the meeting's writer.
use campus_common::{AddRecordingRequest, Meeting, Phase, RecordingFile};
use chrono::{DateTime, Utc};

use crate::{error::AppError, lifecycle::require_host};

/// Begin recording. Only the host, only while live, one at a time.
pub fn start(
    meeting: &mut Meeting,
    phase: Phase,
    host_id: &str,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    require_host(meeting, host_id, "record")?;

    if meeting.recording.is_recording {
        return Err(AppError::Recording("Recording is already in progress"));
    }
    if !meeting.recording.allowed {
        return Err(AppError::Recording("Recording is not allowed for this meeting"));
    }
    if phase != Phase::InProgress {
        return Err(AppError::InvalidTransition {
            from: phase.as_str(),
            action: "record",
        });
    }

    let rec = &mut meeting.recording;
    rec.is_recording = true;
    rec.started_by = Some(host_id.to_string());
    rec.started_at = Some(now);
    rec.stopped_at = None;
    meeting.updated_at = now;
    Ok(())
}

/// Stop the running recording
pub fn stop(meeting: &mut Meeting, host_id: &str, now: DateTime<Utc>) -> Result<(), AppError> {
    require_host(meeting, host_id, "record")?;

    if !halt(meeting, now) {
        return Err(AppError::Recording("No recording in progress"));
    }
    Ok(())
}

/// Close a running recording. Returns whether one was running.
pub fn halt(meeting: &mut Meeting, now: DateTime<Utc>) -> bool {
    let rec = &mut meeting.recording;
    if !rec.is_recording {
        return false;
    }
    rec.is_recording = false;
    rec.stopped_at = Some(now);
    rec.duration_seconds = rec
        .started_at
        .map_or(0, |started| (now - started).num_seconds().max(0));
    meeting.updated_at = now;
    true
}

/// Attach file metadata. `req` must already be validated.
pub fn add_file(
    meeting: &mut Meeting,
    host_id: &str,
    req: AddRecordingRequest,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    require_host(meeting, host_id, "add recordings to")?;

    meeting.recording.files.push(RecordingFile {
        filename: req.filename.trim().to_string(),
        file_size_bytes: req.file_size_bytes,
        duration_seconds: req.duration_seconds,
        recorded_by: host_id.to_string(),
        recorded_at: now,
        download_url: req.download_url,
        status: req.status.unwrap_or_default(),
    });
    meeting.updated_at = now;
    Ok(())
}

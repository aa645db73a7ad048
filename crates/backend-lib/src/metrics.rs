// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for Prometheus metric keys
pub const MEETING_SCHEDULED: &str = "meeting.scheduled";
pub const MEETING_STARTED: &str = "meeting.started";
pub const MEETING_ENDED: &str = "meeting.ended";
pub const MEETING_CANCELLED: &str = "meeting.cancelled";
pub const MEETING_RESCHEDULED: &str = "meeting.rescheduled";
pub const MEETING_EDITED: &str = "meeting.edited";
pub const MEETING_DELETED: &str = "meeting.deleted";
pub const MEETING_JOINED: &str = "meeting.joined";
pub const MEETING_LEFT: &str = "meeting.left";
pub const MEETING_REJECTED: &str = "meeting.rejected";
pub const ACTORS_ACTIVE: &str = "meeting.actors.active";
pub const MEETING_PARTICIPANTS_ADDED: &str = "meeting.participants_added";
pub const RECORDING_STARTED: &str = "meeting.recording.started";
pub const RECORDING_STOPPED: &str = "meeting.recording.stopped";
pub const RECORDING_FILE_ADDED: &str = "meeting.recording.file_added";
pub const ACTORS_RETIRED: &str = "meeting.actors.retired";
pub const HTTP_RATE_LIMITED: &str = "http.rate_limited";

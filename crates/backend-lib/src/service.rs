// ============================
// campus-backend/src/service.rs
// ============================
//! Meeting operations offered to the HTTP layer (and to any other caller).
//!
//! Reads go straight to the store and are annotated for the viewer.
//! Writes are routed to the meeting's actor, which re-derives status itself;
//! nothing the client believes about phase or permissions is trusted.
use std::sync::Arc;

use campus_common::{
    Ack, AddParticipantsRequest, AddRecordingRequest, Meeting, MeetingStats, MeetingView,
    PublicListQuery, RecordingState, RescheduleRequest, ScheduleRequest, UpdateDetailsRequest,
    UserId,
};
use metrics::counter;
use tracing::instrument;

use crate::{
    auth::Directory,
    clock::Clock,
    config::{MeetingSettings, Settings},
    error::AppError,
    meet::MeetingManager,
    meet_actor::{ActorContext, Command, Outcome},
    metrics as keys,
    query,
    status::StatusDeriver,
    storage::Storage,
    validation,
};

pub struct MeetingService {
    storage: Arc<dyn Storage>,
    manager: MeetingManager,
    clock: Arc<dyn Clock>,
    deriver: StatusDeriver,
    directory: Arc<dyn Directory>,
    rules: MeetingSettings,
    link_base_url: String,
}

impl MeetingService {
    pub fn new(
        storage: Arc<dyn Storage>,
        clock: Arc<dyn Clock>,
        directory: Arc<dyn Directory>,
        settings: &Settings,
    ) -> Self {
        let deriver = StatusDeriver::new(settings.meetings.starting_soon_window());
        let manager = MeetingManager::new(ActorContext {
            storage: storage.clone(),
            clock: clock.clone(),
            deriver,
            idle_timeout: settings.meetings.writer_idle_timeout(),
        });
        Self {
            storage,
            manager,
            clock,
            deriver,
            directory,
            rules: settings.meetings.clone(),
            link_base_url: settings.link_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn deriver(&self) -> &StatusDeriver {
        &self.deriver
    }

    /// Writers currently registered, one per recently written meeting
    pub fn active_writers(&self) -> usize {
        self.manager.active_count()
    }

    fn view(&self, meeting: Meeting, viewer_id: &str) -> MeetingView {
        query::annotate(&self.deriver, meeting, viewer_id, self.clock.now())
    }

    async fn load(&self, meeting_id: &str) -> Result<Meeting, AppError> {
        validation::validate_meeting_id(meeting_id)?;
        self.storage
            .get_meeting(meeting_id)
            .await?
            .ok_or(AppError::MeetingNotFound)
    }

    async fn execute(&self, meeting_id: &str, command: Command) -> Result<Outcome, AppError> {
        validation::validate_meeting_id(meeting_id)?;
        self.manager.execute(meeting_id, command).await
    }

    async fn execute_for_record(
        &self,
        meeting_id: &str,
        command: Command,
    ) -> Result<Meeting, AppError> {
        match self.execute(meeting_id, command).await? {
            Outcome::Updated(meeting) | Outcome::Unchanged(meeting) => Ok(meeting),
            Outcome::Deleted => Err(AppError::MeetingNotFound),
        }
    }

    async fn execute_for_view(
        &self,
        meeting_id: &str,
        viewer_id: &str,
        command: Command,
    ) -> Result<MeetingView, AppError> {
        let meeting = self.execute_for_record(meeting_id, command).await?;
        Ok(self.view(meeting, viewer_id))
    }

    /// Meetings hosted by others, joinable-or-upcoming by default
    #[instrument(skip(self, filter))]
    pub async fn list_public_meetings(
        &self,
        viewer_id: &str,
        filter: &PublicListQuery,
    ) -> Result<Vec<MeetingView>, AppError> {
        let now = self.clock.now();
        let mut meetings = self.storage.list_meetings().await?;
        meetings.retain(|m| !m.is_host(viewer_id));
        meetings.sort_by(|a, b| a.scheduled_start.cmp(&b.scheduled_start).then(a.id.cmp(&b.id)));

        let views: Vec<MeetingView> = meetings
            .into_iter()
            .map(|m| query::annotate(&self.deriver, m, viewer_id, now))
            .filter(|v| query::matches_public(v, filter))
            .collect();

        Ok(query::paginate(views, filter.page, filter.limit))
    }

    /// Every meeting the viewer hosts, in all phases
    #[instrument(skip(self))]
    pub async fn list_my_meetings(&self, host_id: &str) -> Result<Vec<MeetingView>, AppError> {
        let now = self.clock.now();
        let mut meetings = self.storage.list_meetings().await?;
        meetings.retain(|m| m.is_host(host_id));
        meetings.sort_by(|a, b| a.scheduled_start.cmp(&b.scheduled_start).then(a.id.cmp(&b.id)));

        Ok(meetings
            .into_iter()
            .map(|m| query::annotate(&self.deriver, m, host_id, now))
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_meeting(
        &self,
        meeting_id: &str,
        viewer_id: &str,
    ) -> Result<MeetingView, AppError> {
        let meeting = self.load(meeting_id).await?;
        Ok(self.view(meeting, viewer_id))
    }

    #[instrument(skip(self, req), fields(title = %req.title))]
    pub async fn schedule_meeting(
        &self,
        host_id: &str,
        req: ScheduleRequest,
    ) -> Result<MeetingView, AppError> {
        validation::validate_user_id(host_id)?;
        let host = self
            .directory
            .lookup(host_id)
            .await
            .ok_or_else(|| AppError::Auth(format!("unknown host {host_id}")))?;

        let now = self.clock.now();
        let valid = validation::validate_schedule(&req, now, &self.rules)?;

        let id = uuid::Uuid::new_v4().to_string();
        let meeting = Meeting {
            join_link: format!("{}/meeting/{id}", self.link_base_url),
            id,
            title: valid.title,
            description: valid.description,
            tags: req.tags,
            scheduled_start: req.scheduled_start,
            duration_minutes: req.duration_minutes,
            explicit_state: campus_common::ExplicitState::Scheduled,
            host_id: host.user_id,
            host_display_name: host.display_name,
            participants: Vec::new(),
            max_participants: valid.max_participants,
            created_at: now,
            updated_at: now,
            started_at: None,
            ended_at: None,
            recording: RecordingState {
                allowed: req.allow_recording.unwrap_or(true),
                ..RecordingState::default()
            },
        };

        self.storage.insert_meeting(&meeting).await?;
        counter!(keys::MEETING_SCHEDULED).increment(1);
        tracing::info!(meeting_id = %meeting.id, start = %meeting.scheduled_start, "meeting scheduled");

        Ok(self.view(meeting, host_id))
    }

    #[instrument(skip(self, req))]
    pub async fn reschedule_meeting(
        &self,
        meeting_id: &str,
        host_id: &str,
        req: RescheduleRequest,
    ) -> Result<MeetingView, AppError> {
        validation::validate_reschedule(&req, self.clock.now(), &self.rules)?;
        self.execute_for_view(
            meeting_id,
            host_id,
            Command::Reschedule {
                host_id: host_id.to_string(),
                scheduled_start: req.scheduled_start,
                duration_minutes: req.duration_minutes,
            },
        )
        .await
    }

    #[instrument(skip(self, req))]
    pub async fn update_meeting_details(
        &self,
        meeting_id: &str,
        host_id: &str,
        req: UpdateDetailsRequest,
    ) -> Result<MeetingView, AppError> {
        let details = validation::validate_details(&req, &self.rules)?;
        self.execute_for_view(
            meeting_id,
            host_id,
            Command::UpdateDetails {
                host_id: host_id.to_string(),
                details,
            },
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn start_meeting(
        &self,
        meeting_id: &str,
        host_id: &str,
    ) -> Result<MeetingView, AppError> {
        let host_id: UserId = host_id.to_string();
        self.execute_for_view(meeting_id, &host_id, Command::Start { host_id: host_id.clone() })
            .await
    }

    #[instrument(skip(self))]
    pub async fn end_meeting(&self, meeting_id: &str, host_id: &str) -> Result<MeetingView, AppError> {
        let host_id: UserId = host_id.to_string();
        self.execute_for_view(meeting_id, &host_id, Command::End { host_id: host_id.clone() })
            .await
    }

    #[instrument(skip(self))]
    pub async fn cancel_meeting(
        &self,
        meeting_id: &str,
        host_id: &str,
    ) -> Result<MeetingView, AppError> {
        let host_id: UserId = host_id.to_string();
        self.execute_for_view(meeting_id, &host_id, Command::Cancel { host_id: host_id.clone() })
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete_meeting(&self, meeting_id: &str, host_id: &str) -> Result<Ack, AppError> {
        self.execute(
            meeting_id,
            Command::Delete {
                host_id: host_id.to_string(),
            },
        )
        .await?;
        Ok(Ack::ok("meeting deleted"))
    }

    #[instrument(skip(self))]
    pub async fn join_participation(
        &self,
        meeting_id: &str,
        viewer_id: &str,
    ) -> Result<Ack, AppError> {
        let outcome = self
            .execute(
                meeting_id,
                Command::Join {
                    viewer_id: viewer_id.to_string(),
                },
            )
            .await?;
        Ok(match outcome {
            Outcome::Updated(_) => Ack::ok("joined"),
            _ => Ack::ok("already joined"),
        })
    }

    #[instrument(skip(self))]
    pub async fn leave_participation(
        &self,
        meeting_id: &str,
        viewer_id: &str,
    ) -> Result<Ack, AppError> {
        let outcome = self
            .execute(
                meeting_id,
                Command::Leave {
                    viewer_id: viewer_id.to_string(),
                },
            )
            .await?;
        Ok(match outcome {
            Outcome::Updated(_) => Ack::ok("left"),
            _ => Ack::ok("not a participant"),
        })
    }

    /// Host removes someone from the roster
    #[instrument(skip(self))]
    pub async fn remove_participant(
        &self,
        meeting_id: &str,
        host_id: &str,
        participant_id: &str,
    ) -> Result<Ack, AppError> {
        self.execute(
            meeting_id,
            Command::Evict {
                host_id: host_id.to_string(),
                participant_id: participant_id.to_string(),
            },
        )
        .await?;
        Ok(Ack::ok("participant removed"))
    }

    /// Attendance summary for the host and current participants
    #[instrument(skip(self))]
    pub async fn meeting_stats(
        &self,
        meeting_id: &str,
        viewer_id: &str,
    ) -> Result<MeetingStats, AppError> {
        let meeting = self.load(meeting_id).await?;
        if !meeting.is_host(viewer_id) && !meeting.is_participant(viewer_id) {
            return Err(AppError::Forbidden(
                "only the host and participants can view statistics".to_string(),
            ));
        }
        Ok(query::stats(&self.deriver, &meeting, self.clock.now()))
    }

    /// Host puts known users on the roster. Unknown ids are skipped.
    #[instrument(skip(self, req), fields(count = req.user_ids.len()))]
    pub async fn add_participants(
        &self,
        meeting_id: &str,
        host_id: &str,
        req: AddParticipantsRequest,
    ) -> Result<MeetingView, AppError> {
        let requested = validation::validate_user_batch(&req.user_ids)?;

        let mut user_ids = Vec::with_capacity(requested.len());
        for user_id in requested {
            match self.directory.lookup(&user_id).await {
                Some(profile) => user_ids.push(profile.user_id),
                None => tracing::debug!(%user_id, "skipping unknown user"),
            }
        }

        self.execute_for_view(
            meeting_id,
            host_id,
            Command::AddParticipants {
                host_id: host_id.to_string(),
                user_ids,
            },
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn start_recording(
        &self,
        meeting_id: &str,
        host_id: &str,
    ) -> Result<RecordingState, AppError> {
        let meeting = self
            .execute_for_record(
                meeting_id,
                Command::StartRecording {
                    host_id: host_id.to_string(),
                },
            )
            .await?;
        Ok(meeting.recording)
    }

    #[instrument(skip(self))]
    pub async fn stop_recording(
        &self,
        meeting_id: &str,
        host_id: &str,
    ) -> Result<RecordingState, AppError> {
        let meeting = self
            .execute_for_record(
                meeting_id,
                Command::StopRecording {
                    host_id: host_id.to_string(),
                },
            )
            .await?;
        Ok(meeting.recording)
    }

    /// Attach metadata of a produced recording file
    #[instrument(skip(self, req), fields(filename = %req.filename))]
    pub async fn add_recording(
        &self,
        meeting_id: &str,
        host_id: &str,
        req: AddRecordingRequest,
    ) -> Result<RecordingState, AppError> {
        validation::validate_recording_file(&req)?;
        let meeting = self
            .execute_for_record(
                meeting_id,
                Command::AddRecording {
                    host_id: host_id.to_string(),
                    file: req,
                },
            )
            .await?;
        Ok(meeting.recording)
    }

    /// Recording state and files, for the host and current participants
    #[instrument(skip(self))]
    pub async fn list_recordings(
        &self,
        meeting_id: &str,
        viewer_id: &str,
    ) -> Result<RecordingState, AppError> {
        let meeting = self.load(meeting_id).await?;
        if !meeting.is_host(viewer_id) && !meeting.is_participant(viewer_id) {
            return Err(AppError::Forbidden(
                "only the host and participants can view recordings".to_string(),
            ));
        }
        Ok(meeting.recording)
    }
}

// ============================
// campus-backend/src/meet_actor.rs
// ============================
//! Per-meeting single writer.
//!
//! Every mutation of a meeting (roster, lifecycle or recording) is a
//! [`Command`] sent to that meeting's actor. The actor handles one command at
//! a time: it reloads the record, derives the phase from the clock, applies
//! the rule, persists, then replies. That sequence is the meeting's critical
//! section.
//!
//! Actors retire once the record is gone, once it reaches a terminal state,
//! or after sitting idle. A retiring actor stops accepting, answers whatever
//! is already queued, then signals its successor (if one was spawned) that it
//! may begin.
use std::sync::Arc;
use std::time::Duration;

use campus_common::{AddRecordingRequest, Meeting, UpdateDetailsRequest, UserId};
use chrono::{DateTime, Utc};
use metrics::counter;
use tokio::sync::{mpsc, oneshot, watch};

use crate::{
    clock::Clock,
    error::AppError,
    lifecycle::{self, Transition},
    metrics as keys,
    recording,
    roster::{self, RosterChange},
    status::StatusDeriver,
    storage::Storage,
};

/// A mutation request
#[derive(Debug)]
pub enum Command {
    Join {
        viewer_id: UserId,
    },
    Leave {
        viewer_id: UserId,
    },
    Evict {
        host_id: UserId,
        participant_id: UserId,
    },
    AddParticipants {
        host_id: UserId,
        user_ids: Vec<UserId>,
    },
    Start {
        host_id: UserId,
    },
    End {
        host_id: UserId,
    },
    Cancel {
        host_id: UserId,
    },
    Reschedule {
        host_id: UserId,
        scheduled_start: DateTime<Utc>,
        duration_minutes: u32,
    },
    UpdateDetails {
        host_id: UserId,
        details: UpdateDetailsRequest,
    },
    Delete {
        host_id: UserId,
    },
    StartRecording {
        host_id: UserId,
    },
    StopRecording {
        host_id: UserId,
    },
    AddRecording {
        host_id: UserId,
        file: AddRecordingRequest,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Join { .. } => "join",
            Command::Leave { .. } => "leave",
            Command::Evict { .. } => "evict",
            Command::AddParticipants { .. } => "add_participants",
            Command::Start { .. } => "start",
            Command::End { .. } => "end",
            Command::Cancel { .. } => "cancel",
            Command::Reschedule { .. } => "reschedule",
            Command::UpdateDetails { .. } => "update",
            Command::Delete { .. } => "delete",
            Command::StartRecording { .. } => "start_recording",
            Command::StopRecording { .. } => "stop_recording",
            Command::AddRecording { .. } => "add_recording",
        }
    }

    /// Metric bumped when the command changed the record
    fn metric(&self) -> &'static str {
        match self {
            Command::Join { .. } => keys::MEETING_JOINED,
            Command::Leave { .. } | Command::Evict { .. } => keys::MEETING_LEFT,
            Command::AddParticipants { .. } => keys::MEETING_PARTICIPANTS_ADDED,
            Command::Start { .. } => keys::MEETING_STARTED,
            Command::End { .. } => keys::MEETING_ENDED,
            Command::Cancel { .. } => keys::MEETING_CANCELLED,
            Command::Reschedule { .. } => keys::MEETING_RESCHEDULED,
            Command::UpdateDetails { .. } => keys::MEETING_EDITED,
            Command::Delete { .. } => keys::MEETING_DELETED,
            Command::StartRecording { .. } => keys::RECORDING_STARTED,
            Command::StopRecording { .. } => keys::RECORDING_STOPPED,
            Command::AddRecording { .. } => keys::RECORDING_FILE_ADDED,
        }
    }
}

/// What a command did
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The record changed; carries the persisted version
    Updated(Meeting),
    /// Nothing to change (retry or no-op); carries the current version
    Unchanged(Meeting),
    /// The record is gone
    Deleted,
}

/// Message sent *into* the actor
#[derive(Debug)]
pub struct ActorMsg {
    pub command: Command,
    pub resp_tx: oneshot::Sender<Result<Outcome, AppError>>,
}

/// Pending answer to a sent command
pub type Reply = oneshot::Receiver<Result<Outcome, AppError>>;

/// What every actor needs, shared by the registry
#[derive(Clone)]
pub struct ActorContext {
    pub storage: Arc<dyn Storage>,
    pub clock: Arc<dyn Clock>,
    pub deriver: StatusDeriver,
    /// Retire after this long without a command
    pub idle_timeout: Duration,
}

/// Handle that other components keep
#[derive(Clone)]
pub struct MeetHandle {
    cmd_tx: mpsc::UnboundedSender<ActorMsg>,
    generation: u64,
    stopped: watch::Receiver<()>,
}

impl MeetHandle {
    /// Queue a command. A retired actor hands the command back.
    pub fn send(&self, command: Command) -> Result<Reply, Command> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.cmd_tx
            .send(ActorMsg { command, resp_tx })
            .map(|()| resp_rx)
            .map_err(|e| e.0.command)
    }

    /// Run a command inside the meeting's critical section
    pub async fn execute(&self, command: Command) -> Result<Outcome, AppError> {
        let reply = self
            .send(command)
            .map_err(|_| AppError::Internal("meeting writer stopped".to_string()))?;
        reply
            .await
            .map_err(|_| AppError::Internal("meeting writer dropped the request".to_string()))?
    }

    /// Whether the actor has stopped accepting commands
    pub fn is_closed(&self) -> bool {
        self.cmd_tx.is_closed()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Resolves once the actor has answered its last command and exited
    pub async fn stopped(&self) {
        let mut stopped = self.stopped.clone();
        // The sender is never written to; this returns when it is dropped
        let _ = stopped.changed().await;
    }
}

pub struct MeetActor {
    meeting_id: String,
    ctx: ActorContext,
}

impl MeetActor {
    pub fn new(meeting_id: String, ctx: ActorContext) -> Self {
        MeetActor { meeting_id, ctx }
    }

    /// Apply one command against a freshly loaded record
    pub async fn handle(&self, command: Command) -> Result<Outcome, AppError> {
        // Existence is re-checked inside the critical section
        let mut meeting = self
            .ctx
            .storage
            .get_meeting(&self.meeting_id)
            .await?
            .ok_or(AppError::MeetingNotFound)?;
        let now = self.ctx.clock.now();
        let phase = self.ctx.deriver.derive(&meeting, now);

        let changed = match &command {
            Command::Join { viewer_id } => {
                roster::join(&mut meeting, phase, viewer_id, now)? == RosterChange::Applied
            },
            Command::Leave { viewer_id } => {
                roster::leave(&mut meeting, viewer_id) == RosterChange::Applied
            },
            Command::Evict {
                host_id,
                participant_id,
            } => roster::evict(&mut meeting, host_id, participant_id)? == RosterChange::Applied,
            Command::AddParticipants { host_id, user_ids } => {
                roster::add_participants(&mut meeting, phase, host_id, user_ids, now)? > 0
            },
            Command::Start { host_id } => {
                lifecycle::start(&mut meeting, phase, host_id, now)? == Transition::Applied
            },
            Command::End { host_id } => {
                lifecycle::end(&mut meeting, phase, host_id, now)? == Transition::Applied
            },
            Command::Cancel { host_id } => {
                lifecycle::cancel(&mut meeting, host_id, now)? == Transition::Applied
            },
            Command::Reschedule {
                host_id,
                scheduled_start,
                duration_minutes,
            } => {
                lifecycle::reschedule(&mut meeting, host_id, *scheduled_start, *duration_minutes, now)?
                    == Transition::Applied
            },
            Command::UpdateDetails { host_id, details } => {
                lifecycle::update_details(&mut meeting, host_id, details.clone(), now)?
                    == Transition::Applied
            },
            Command::StartRecording { host_id } => {
                recording::start(&mut meeting, phase, host_id, now)?;
                true
            },
            Command::StopRecording { host_id } => {
                recording::stop(&mut meeting, host_id, now)?;
                true
            },
            Command::AddRecording { host_id, file } => {
                recording::add_file(&mut meeting, host_id, file.clone(), now)?;
                true
            },
            Command::Delete { host_id } => {
                lifecycle::ensure_deletable(&meeting, host_id)?;
                if !self.ctx.storage.delete_meeting(&self.meeting_id).await? {
                    return Err(AppError::MeetingNotFound);
                }
                counter!(keys::MEETING_DELETED).increment(1);
                tracing::info!(meeting_id = %self.meeting_id, "meeting deleted");
                return Ok(Outcome::Deleted);
            },
        };

        if !changed {
            tracing::debug!(meeting_id = %self.meeting_id, command = command.name(), "no change");
            return Ok(Outcome::Unchanged(meeting));
        }

        self.ctx.storage.put_meeting(&meeting).await?;
        counter!(command.metric()).increment(1);
        tracing::info!(
            meeting_id = %self.meeting_id,
            command = command.name(),
            state = %meeting.explicit_state,
            participants = meeting.participants.len(),
            recording = meeting.recording.is_recording,
            "meeting updated"
        );
        Ok(Outcome::Updated(meeting))
    }

    /// Handle and answer one message. Returns whether the actor should retire.
    async fn process(&self, msg: ActorMsg) -> bool {
        let ActorMsg { command, resp_tx } = msg;
        let name = command.name();
        let result = self.handle(command).await;

        if let Err(e) = &result {
            counter!(keys::MEETING_REJECTED, "reason" => e.error_code()).increment(1);
            tracing::warn!(meeting_id = %self.meeting_id, command = name, error = %e, "command rejected");
        }

        let retire = match &result {
            Ok(Outcome::Deleted) | Err(AppError::MeetingNotFound) => true,
            Ok(Outcome::Updated(m)) | Ok(Outcome::Unchanged(m)) => m.explicit_state.is_terminal(),
            Err(_) => false,
        };
        let _ = resp_tx.send(result);
        retire
    }

    pub async fn run(
        self,
        mut rx: mpsc::UnboundedReceiver<ActorMsg>,
        previous: Option<watch::Receiver<()>>,
    ) {
        // Never write alongside a predecessor that is still draining
        if let Some(mut previous) = previous {
            let _ = previous.changed().await;
        }

        loop {
            match tokio::time::timeout(self.ctx.idle_timeout, rx.recv()).await {
                Ok(Some(msg)) => {
                    if self.process(msg).await {
                        break;
                    }
                },
                Ok(None) => break,
                Err(_) => {
                    tracing::debug!(meeting_id = %self.meeting_id, "meeting actor idle");
                    break;
                },
            }
        }

        rx.close();
        while let Some(msg) = rx.recv().await {
            self.process(msg).await;
        }
        counter!(keys::ACTORS_RETIRED).increment(1);
        tracing::debug!(meeting_id = %self.meeting_id, "meeting actor stopped");
    }
}

/// Spawn a new meeting actor and return its handle.
///
/// The actor waits for `previous` to exit before taking commands. `on_stop`
/// runs after the actor has answered everything queued to it.
pub fn spawn_meet_actor<F>(
    meeting_id: &str,
    ctx: ActorContext,
    generation: u64,
    previous: Option<&MeetHandle>,
    on_stop: F,
) -> MeetHandle
where
    F: FnOnce() + Send + 'static,
{
    let (cmd_tx, rx_cmd) = mpsc::unbounded_channel();
    let (stopped_tx, stopped_rx) = watch::channel(());
    let actor = MeetActor::new(meeting_id.to_string(), ctx);
    let previous = previous.map(|p| p.stopped.clone());

    tokio::spawn(async move {
        actor.run(rx_cmd, previous).await;
        on_stop();
        drop(stopped_tx);
    });

    MeetHandle {
        cmd_tx,
        generation,
        stopped: stopped_rx,
    }
}

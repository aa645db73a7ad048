// ============================
// campus-backend/src/meet.rs
// ============================
//! Meeting actor registry.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use metrics::gauge;

use crate::error::AppError;
use crate::meet_actor::{spawn_meet_actor, ActorContext, Command, MeetHandle, Outcome};
use crate::metrics as keys;

pub type MeetingId = String;

/// Attempts to reach a live writer before giving up
const SEND_ATTEMPTS: usize = 3;

/// Keeps one writer per meeting. Actors are spawned lazily on the first write
/// and remove themselves when they retire.
pub struct MeetingManager {
    meets: Arc<DashMap<MeetingId, MeetHandle>>,
    ctx: ActorContext,
    generation: AtomicU64,
}

impl MeetingManager {
    pub fn new(ctx: ActorContext) -> Self {
        MeetingManager {
            meets: Arc::new(DashMap::new()),
            ctx,
            generation: AtomicU64::new(0),
        }
    }

    /// Get the writer for a meeting, spawning one if none is running.
    ///
    /// The shard lock held by `entry` guarantees at most one accepting actor
    /// per id. A replacement waits for a retiring predecessor to drain.
    pub fn handle(&self, meeting_id: &str) -> MeetHandle {
        let mut entry = self
            .meets
            .entry(meeting_id.to_string())
            .or_insert_with(|| self.spawn(meeting_id, None));

        if entry.is_closed() {
            let next = self.spawn(meeting_id, Some(entry.value()));
            *entry = next;
        }
        let handle = entry.clone();
        drop(entry);

        gauge!(keys::ACTORS_ACTIVE).set(self.meets.len() as f64);
        handle
    }

    fn spawn(&self, meeting_id: &str, previous: Option<&MeetHandle>) -> MeetHandle {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let registry = Arc::clone(&self.meets);
        let key = meeting_id.to_string();

        spawn_meet_actor(meeting_id, self.ctx.clone(), generation, previous, move || {
            // A successor may already own the slot
            registry.remove_if(&key, |_, h| h.generation() == generation);
            gauge!(keys::ACTORS_ACTIVE).set(registry.len() as f64);
        })
    }

    /// Run a command on the meeting's writer, following it across retirement
    pub async fn execute(&self, meeting_id: &str, mut command: Command) -> Result<Outcome, AppError> {
        for _ in 0..SEND_ATTEMPTS {
            match self.handle(meeting_id).send(command) {
                Ok(reply) => {
                    return reply.await.map_err(|_| {
                        AppError::Internal("meeting writer dropped the request".to_string())
                    })?;
                },
                Err(returned) => {
                    tracing::debug!(meeting_id, "writer retired before send, retrying");
                    command = returned;
                },
            }
        }
        Err(AppError::Internal("meeting writer unavailable".to_string()))
    }

    /// Number of registered writers
    pub fn active_count(&self) -> usize {
        self.meets.len()
    }
}

// ============================
// campus-backend/src/storage.rs
// ============================
//! Meeting record store: trait plus flat-file and in-memory implementations.
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use campus_common::Meeting;
use dashmap::DashMap;
use tokio::fs as tokio_fs;

use crate::error::AppError;

/// Trait for storage backends.
///
/// The store does no locking of its own; writers are serialised per meeting
/// by the meeting actor. Readers must always observe a whole record.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Insert a new record; fails if the id is taken
    async fn insert_meeting(&self, meeting: &Meeting) -> Result<(), AppError>;

    /// Overwrite an existing record
    async fn put_meeting(&self, meeting: &Meeting) -> Result<(), AppError>;

    /// Fetch one record
    async fn get_meeting(&self, meeting_id: &str) -> Result<Option<Meeting>, AppError>;

    /// Remove a record. Returns whether it existed.
    async fn delete_meeting(&self, meeting_id: &str) -> Result<bool, AppError>;

    /// Snapshot of every record
    async fn list_meetings(&self) -> Result<Vec<Meeting>, AppError>;
}

/// Flat-file implementation of the Storage trait: one JSON document per meeting
#[derive(Clone)]
pub struct FlatFileStorage {
    root: PathBuf,
}

impl FlatFileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("meetings"))?;
        Ok(Self { root })
    }

    fn meetings_dir(&self) -> PathBuf {
        self.root.join("meetings")
    }

    fn meeting_path(&self, meeting_id: &str) -> PathBuf {
        self.meetings_dir().join(format!("{meeting_id}.json"))
    }

    /// Write to a temp file and rename over the target so readers never see a partial record
    async fn write_atomic(&self, meeting: &Meeting) -> Result<(), AppError> {
        let path = self.meeting_path(&meeting.id);
        let tmp = self
            .meetings_dir()
            .join(format!(".{}.{}.tmp", meeting.id, uuid::Uuid::new_v4()));

        let json = serde_json::to_string_pretty(meeting)?;
        tokio_fs::write(&tmp, json).await?;
        if let Err(e) = tokio_fs::rename(&tmp, &path).await {
            let _ = tokio_fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for FlatFileStorage {
    async fn insert_meeting(&self, meeting: &Meeting) -> Result<(), AppError> {
        if tokio_fs::try_exists(self.meeting_path(&meeting.id)).await? {
            return Err(AppError::Internal(format!(
                "meeting {} already exists",
                meeting.id
            )));
        }
        self.write_atomic(meeting).await
    }

    async fn put_meeting(&self, meeting: &Meeting) -> Result<(), AppError> {
        self.write_atomic(meeting).await
    }

    async fn get_meeting(&self, meeting_id: &str) -> Result<Option<Meeting>, AppError> {
        match tokio_fs::read_to_string(self.meeting_path(meeting_id)).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_meeting(&self, meeting_id: &str) -> Result<bool, AppError> {
        match tokio_fs::remove_file(self.meeting_path(meeting_id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_meetings(&self) -> Result<Vec<Meeting>, AppError> {
        let mut entries = tokio_fs::read_dir(self.meetings_dir()).await?;
        let mut meetings = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_record = path.extension().is_some_and(|ext| ext == "json")
                && !entry.file_name().to_string_lossy().starts_with('.');
            if !is_record {
                continue;
            }

            let content = match tokio_fs::read_to_string(&path).await {
                Ok(content) => content,
                // Deleted between read_dir and read
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            match serde_json::from_str::<Meeting>(&content) {
                Ok(meeting) => meetings.push(meeting),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable meeting record"),
            }
        }

        Ok(meetings)
    }
}

/// In-memory implementation, for tests and ephemeral runs
#[derive(Clone, Default)]
pub struct MemoryStorage {
    meetings: Arc<DashMap<String, Meeting>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn insert_meeting(&self, meeting: &Meeting) -> Result<(), AppError> {
        match self.meetings.entry(meeting.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(AppError::Internal(format!(
                "meeting {} already exists",
                meeting.id
            ))),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(meeting.clone());
                Ok(())
            },
        }
    }

    async fn put_meeting(&self, meeting: &Meeting) -> Result<(), AppError> {
        self.meetings.insert(meeting.id.clone(), meeting.clone());
        Ok(())
    }

    async fn get_meeting(&self, meeting_id: &str) -> Result<Option<Meeting>, AppError> {
        Ok(self.meetings.get(meeting_id).map(|m| m.value().clone()))
    }

    async fn delete_meeting(&self, meeting_id: &str) -> Result<bool, AppError> {
        Ok(self.meetings.remove(meeting_id).is_some())
    }

    async fn list_meetings(&self) -> Result<Vec<Meeting>, AppError> {
        Ok(self.meetings.iter().map(|m| m.value().clone()).collect())
    }
}

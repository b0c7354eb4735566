//! Private free-text journal kept next to a user's screening history.

pub mod router;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::UserId;
use crate::error::RepositoryError;

pub use router::journal_router;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JournalEntryId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: JournalEntryId,
    pub owner_id: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Storage for journal entries, partitioned by owner.
pub trait JournalRepository: Send + Sync {
    /// Persist with a server-assigned id and timestamp.
    fn insert(&self, owner: &UserId, text: String) -> Result<JournalEntry, RepositoryError>;
    /// Newest first.
    fn list(&self, owner: &UserId) -> Result<Vec<JournalEntry>, RepositoryError>;
    /// `NotFound` unless `owner` holds an entry with `id`.
    fn delete(&self, owner: &UserId, id: &JournalEntryId) -> Result<(), RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("journal entry is empty")]
    EmptyEntry,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub struct JournalService<J> {
    repository: Arc<J>,
}

impl<J> JournalService<J>
where
    J: JournalRepository + 'static,
{
    pub fn new(repository: Arc<J>) -> Self {
        Self { repository }
    }

    /// Whitespace-only text is refused; anything else is stored exactly as written.
    pub fn add(&self, owner: &UserId, text: String) -> Result<JournalEntry, JournalError> {
        if text.trim().is_empty() {
            return Err(JournalError::EmptyEntry);
        }

        let entry = self.repository.insert(owner, text)?;
        info!(user = %owner, entry = %entry.id.0, "journal entry saved");
        Ok(entry)
    }

    pub fn entries(&self, owner: &UserId) -> Result<Vec<JournalEntry>, JournalError> {
        Ok(self.repository.list(owner)?)
    }

    pub fn remove(&self, owner: &UserId, id: &JournalEntryId) -> Result<(), JournalError> {
        self.repository.delete(owner, id)?;
        info!(user = %owner, entry = %id.0, "journal entry deleted");
        Ok(())
    }
}

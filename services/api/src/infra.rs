use chrono::{FixedOffset, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use mindcheck::auth::{Role, UserDirectory, UserId, UserProfile};
use mindcheck::config::parse_utc_offset;
use mindcheck::error::RepositoryError;
use mindcheck::journal::{JournalEntry, JournalEntryId, JournalRepository};
use mindcheck::live::{LiveFeed, Subscription};
use mindcheck::screening::{
    sort_newest_first, NewScreeningResult, ScreeningId, ScreeningRepository, ScreeningResult,
    ScreeningScope,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Screening store kept in process memory. Every write republishes the full, ordered result
/// set to live watchers.
#[derive(Clone)]
pub(crate) struct InMemoryScreeningRepository {
    records: Arc<Mutex<Vec<ScreeningResult>>>,
    feed: LiveFeed<Vec<ScreeningResult>>,
    sequence: Arc<AtomicU64>,
    revision: Arc<AtomicU64>,
}

impl Default for InMemoryScreeningRepository {
    fn default() -> Self {
        let feed = LiveFeed::new();
        feed.publish_revision(1, Vec::new());
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            feed,
            sequence: Arc::new(AtomicU64::new(1)),
            revision: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl InMemoryScreeningRepository {
    fn snapshot(&self) -> Vec<ScreeningResult> {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .clone()
    }

    /// Must be called with the records lock held, so revisions follow write order.
    fn next_revision(&self) -> u64 {
        self.revision.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl ScreeningRepository for InMemoryScreeningRepository {
    fn insert(&self, result: NewScreeningResult) -> Result<ScreeningResult, RepositoryError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        let stored = ScreeningResult::stored(
            ScreeningId(format!("screening-{id:06}")),
            result,
            Utc::now(),
        );

        let (revision, snapshot) = {
            let mut guard = self.records.lock().expect("repository mutex poisoned");
            guard.push(stored.clone());
            sort_newest_first(&mut guard);
            (self.next_revision(), guard.clone())
        };
        self.feed.publish_revision(revision, snapshot);
        Ok(stored)
    }

    fn for_owner(&self, owner: &UserId) -> Result<Vec<ScreeningResult>, RepositoryError> {
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|result| &result.owner_id == owner)
            .collect())
    }

    fn all(&self) -> Result<Vec<ScreeningResult>, RepositoryError> {
        Ok(self.snapshot())
    }

    fn delete(&self, id: &ScreeningId) -> Result<(), RepositoryError> {
        let (revision, snapshot) = {
            let mut guard = self.records.lock().expect("repository mutex poisoned");
            let before = guard.len();
            guard.retain(|result| &result.id != id);
            if guard.len() == before {
                return Err(RepositoryError::NotFound);
            }
            (self.next_revision(), guard.clone())
        };
        self.feed.publish_revision(revision, snapshot);
        Ok(())
    }

    fn watch(
        &self,
        scope: ScreeningScope,
        mut on_snapshot: Box<dyn FnMut(&[ScreeningResult]) + Send>,
        on_error: Box<dyn FnOnce(RepositoryError) + Send>,
    ) -> Subscription {
        self.feed.subscribe(
            move |all: &Vec<ScreeningResult>| {
                let scoped: Vec<ScreeningResult> = all
                    .iter()
                    .filter(|result| scope.includes(result))
                    .cloned()
                    .collect();
                on_snapshot(&scoped);
            },
            on_error,
        )
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryUserDirectory {
    profiles: Arc<Mutex<HashMap<UserId, UserProfile>>>,
}

impl InMemoryUserDirectory {
    pub(crate) fn with_admins(admins: &[UserId]) -> Self {
        let directory = Self::default();
        {
            let mut guard = directory
                .profiles
                .lock()
                .expect("directory mutex poisoned");
            for uid in admins {
                guard.insert(
                    uid.clone(),
                    UserProfile {
                        identity: mindcheck::auth::Identity::new(uid.as_str()),
                        role: Role::Admin,
                    },
                );
            }
        }
        directory
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn upsert(&self, profile: UserProfile) -> Result<(), RepositoryError> {
        self.profiles
            .lock()
            .expect("directory mutex poisoned")
            .insert(profile.identity.uid.clone(), profile);
        Ok(())
    }

    fn role(&self, uid: &UserId) -> Result<Option<Role>, RepositoryError> {
        Ok(self
            .profiles
            .lock()
            .expect("directory mutex poisoned")
            .get(uid)
            .map(|profile| profile.role))
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self
            .profiles
            .lock()
            .expect("directory mutex poisoned")
            .len())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryJournalRepository {
    entries: Arc<Mutex<Vec<JournalEntry>>>,
    sequence: Arc<AtomicU64>,
}

impl JournalRepository for InMemoryJournalRepository {
    fn insert(&self, owner: &UserId, text: String) -> Result<JournalEntry, RepositoryError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let entry = JournalEntry {
            id: JournalEntryId(format!("journal-{id:06}")),
            owner_id: owner.clone(),
            text,
            created_at: Utc::now(),
        };
        self.entries
            .lock()
            .expect("journal mutex poisoned")
            .push(entry.clone());
        Ok(entry)
    }

    fn list(&self, owner: &UserId) -> Result<Vec<JournalEntry>, RepositoryError> {
        let guard = self.entries.lock().expect("journal mutex poisoned");
        // Appended in creation order.
        Ok(guard
            .iter()
            .rev()
            .filter(|entry| &entry.owner_id == owner)
            .cloned()
            .collect())
    }

    fn delete(&self, owner: &UserId, id: &JournalEntryId) -> Result<(), RepositoryError> {
        let mut guard = self.entries.lock().expect("journal mutex poisoned");
        let position = guard
            .iter()
            .position(|entry| &entry.owner_id == owner && &entry.id == id)
            .ok_or(RepositoryError::NotFound)?;
        guard.remove(position);
        Ok(())
    }
}

pub(crate) fn parse_offset(raw: &str) -> Result<FixedOffset, String> {
    parse_utc_offset(raw).ok_or_else(|| format!("failed to parse '{raw}' as +HH:MM, Z or UTC"))
}

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{Duration, TimeZone, Utc};
use serde_json::Value;

use crate::auth::{Identity, Role, UserDirectory, UserId, UserProfile};
use crate::config::ReportingConfig;
use crate::error::RepositoryError;
use crate::live::{LiveFeed, Subscription};
use crate::screening::{
    sort_newest_first, AnswerStore, NewScreeningResult, ScreeningId, ScreeningPolicy,
    ScreeningRepository, ScreeningResult, ScreeningScope, ScreeningService,
};

pub(super) const WEIGHTED: [(&str, &str); 8] = [
    ("q1", "stressed"),
    ("q2", "very often"),
    ("q3", "yes_lost_interest"),
    ("q4", "feel_hopeless"),
    ("q5", "feel_nervous"),
    ("q6", "worry_a_lot"),
    ("q7", "cannot_focus"),
    ("q8", "feel_strain"),
];

pub(super) const CALM: [(&str, &str); 8] = [
    ("q1", "relaxed"),
    ("q2", "rarely"),
    ("q3", "no_interest"),
    ("q4", "feel_okay"),
    ("q5", "feel_calm"),
    ("q6", "manage_worries"),
    ("q7", "can_focus"),
    ("q8", "feel_relaxed"),
];

/// Complete answer set whose first `weighted` questions carry weight 1.
pub(super) fn answers_scoring(weighted: usize) -> AnswerStore {
    WEIGHTED
        .iter()
        .zip(CALM.iter())
        .enumerate()
        .map(|(index, (heavy, light))| if index < weighted { *heavy } else { *light })
        .collect()
}

/// Scenario A: every question answered, only q1 with a weight-1 choice.
pub(super) fn scenario_a() -> AnswerStore {
    [
        ("q1", "stressed"),
        ("q2", "rarely"),
        ("q3", "no_interest"),
        ("q4", "feel_okay"),
        ("q5", "feel_calm"),
        ("q6", "manage_worries"),
        ("q7", "can_focus"),
        ("q8", "feel_relaxed"),
    ]
    .into_iter()
    .collect()
}

/// Scenario B: four weight-1 answers followed by four weight-0 answers.
pub(super) fn scenario_b() -> AnswerStore {
    answers_scoring(4)
}

/// Partial pass: q1 answered and nothing else.
pub(super) fn stress_only() -> AnswerStore {
    [("q1", "stressed")].into_iter().collect()
}

pub(super) fn member() -> Identity {
    Identity::new("member-1").with_display_name("Asha")
}

pub(super) fn admin() -> Identity {
    Identity::new("admin-1").with_display_name("Dr. Rao")
}

#[derive(Clone)]
pub(super) struct MemoryRepository {
    records: Arc<Mutex<Vec<ScreeningResult>>>,
    feed: LiveFeed<Vec<ScreeningResult>>,
    sequence: Arc<AtomicU64>,
    revision: Arc<AtomicU64>,
}

impl Default for MemoryRepository {
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

impl MemoryRepository {
    pub(super) fn records(&self) -> Vec<ScreeningResult> {
        self.records.lock().expect("repository mutex poisoned").clone()
    }

    pub(super) fn fail_watchers(&self, error: RepositoryError) {
        self.feed.fail(error);
    }

    pub(super) fn subscriber_count(&self) -> usize {
        self.feed.subscriber_count()
    }

    pub(super) fn latest_snapshot(&self) -> Option<Vec<ScreeningResult>> {
        self.feed.latest()
    }

    fn next_revision(&self) -> u64 {
        self.revision.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl ScreeningRepository for MemoryRepository {
    fn insert(&self, result: NewScreeningResult) -> Result<ScreeningResult, RepositoryError> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        // Deterministic, strictly increasing timestamps keep ordering assertions stable.
        let created_at = Utc
            .with_ymd_and_hms(2025, 10, 1, 9, 0, 0)
            .single()
            .expect("valid base timestamp")
            + Duration::days(sequence as i64);
        let stored = ScreeningResult::stored(
            ScreeningId(format!("screening-{sequence:04}")),
            result,
            created_at,
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
        let scope = ScreeningScope::Owner(owner.clone());
        Ok(self
            .records()
            .into_iter()
            .filter(|result| scope.includes(result))
            .collect())
    }

    fn all(&self) -> Result<Vec<ScreeningResult>, RepositoryError> {
        Ok(self.records())
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

pub(super) struct UnavailableRepository;

impl ScreeningRepository for UnavailableRepository {
    fn insert(&self, _result: NewScreeningResult) -> Result<ScreeningResult, RepositoryError> {
        Err(RepositoryError::Unavailable("datastore offline".to_string()))
    }

    fn for_owner(&self, _owner: &UserId) -> Result<Vec<ScreeningResult>, RepositoryError> {
        Err(RepositoryError::Unavailable("datastore offline".to_string()))
    }

    fn all(&self) -> Result<Vec<ScreeningResult>, RepositoryError> {
        Err(RepositoryError::Unavailable("datastore offline".to_string()))
    }

    fn delete(&self, _id: &ScreeningId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("datastore offline".to_string()))
    }

    fn watch(
        &self,
        _scope: ScreeningScope,
        _on_snapshot: Box<dyn FnMut(&[ScreeningResult]) + Send>,
        on_error: Box<dyn FnOnce(RepositoryError) + Send>,
    ) -> Subscription {
        on_error(RepositoryError::Unavailable("datastore offline".to_string()));
        Subscription::inert()
    }
}

pub(super) struct DeniedRepository;

impl ScreeningRepository for DeniedRepository {
    fn insert(&self, _result: NewScreeningResult) -> Result<ScreeningResult, RepositoryError> {
        Err(RepositoryError::PermissionDenied("rules reject write".to_string()))
    }

    fn for_owner(&self, _owner: &UserId) -> Result<Vec<ScreeningResult>, RepositoryError> {
        Err(RepositoryError::PermissionDenied("rules reject read".to_string()))
    }

    fn all(&self) -> Result<Vec<ScreeningResult>, RepositoryError> {
        Err(RepositoryError::PermissionDenied("rules reject read".to_string()))
    }

    fn delete(&self, _id: &ScreeningId) -> Result<(), RepositoryError> {
        Err(RepositoryError::PermissionDenied("rules reject delete".to_string()))
    }

    fn watch(
        &self,
        _scope: ScreeningScope,
        _on_snapshot: Box<dyn FnMut(&[ScreeningResult]) + Send>,
        on_error: Box<dyn FnOnce(RepositoryError) + Send>,
    ) -> Subscription {
        on_error(RepositoryError::PermissionDenied("rules reject read".to_string()));
        Subscription::inert()
    }
}

#[derive(Default)]
pub(super) struct MemoryDirectory {
    roles: Mutex<HashMap<UserId, Role>>,
}

impl MemoryDirectory {
    pub(super) fn with_admin_and_member() -> Self {
        let directory = Self::default();
        directory
            .upsert(UserProfile {
                identity: admin(),
                role: Role::Admin,
            })
            .expect("upsert admin");
        directory
            .upsert(UserProfile {
                identity: member(),
                role: Role::Member,
            })
            .expect("upsert member");
        directory
    }
}

impl UserDirectory for MemoryDirectory {
    fn upsert(&self, profile: UserProfile) -> Result<(), RepositoryError> {
        self.roles
            .lock()
            .expect("directory mutex poisoned")
            .insert(profile.identity.uid, profile.role);
        Ok(())
    }

    fn role(&self, uid: &UserId) -> Result<Option<Role>, RepositoryError> {
        Ok(self
            .roles
            .lock()
            .expect("directory mutex poisoned")
            .get(uid)
            .copied())
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.roles.lock().expect("directory mutex poisoned").len())
    }
}

pub(super) fn build_service() -> (
    ScreeningService<MemoryRepository, MemoryDirectory>,
    Arc<MemoryRepository>,
) {
    build_service_with(ScreeningPolicy::default())
}

pub(super) fn build_service_with(
    policy: ScreeningPolicy,
) -> (
    ScreeningService<MemoryRepository, MemoryDirectory>,
    Arc<MemoryRepository>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let directory = Arc::new(MemoryDirectory::with_admin_and_member());
    let service = ScreeningService::new(
        repository.clone(),
        directory,
        policy,
        ReportingConfig::default(),
    );
    (service, repository)
}

pub(super) fn service_over<R: ScreeningRepository + 'static>(
    repository: R,
) -> ScreeningService<R, MemoryDirectory> {
    ScreeningService::new(
        Arc::new(repository),
        Arc::new(MemoryDirectory::with_admin_and_member()),
        ScreeningPolicy::default(),
        ReportingConfig::default(),
    )
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

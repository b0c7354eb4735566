use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::answers::AnswerStore;
use super::config::{ScreeningPolicy, SessionError};
use super::engine::TriageEngine;
use super::questionnaire::Questionnaire;
use super::repository::ScreeningRepository;
use super::result::{NewScreeningResult, ScreeningResult, SubjectProfile};
use super::routing::RoutingDecision;
use crate::auth::{require_admin, AuthError, Identity, UserDirectory, UserId};
use crate::config::ReportingConfig;
use crate::error::RepositoryError;
use crate::history::{AdminOverview, UserJourney};

/// Service composing the triage engine, submission policy, result store and user directory.
pub struct ScreeningService<R, U> {
    repository: Arc<R>,
    directory: Arc<U>,
    engine: TriageEngine,
    policy: ScreeningPolicy,
    reporting: ReportingConfig,
}

/// What the caller gets back from a successful submission: the stored result and where to go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreeningReceipt {
    pub result: ScreeningResult,
    pub routing: RoutingDecision,
}

impl<R, U> ScreeningService<R, U>
where
    R: ScreeningRepository + 'static,
    U: UserDirectory + 'static,
{
    pub fn new(
        repository: Arc<R>,
        directory: Arc<U>,
        policy: ScreeningPolicy,
        reporting: ReportingConfig,
    ) -> Self {
        Self::with_engine(
            TriageEngine::default(),
            repository,
            directory,
            policy,
            reporting,
        )
    }

    pub fn with_engine(
        engine: TriageEngine,
        repository: Arc<R>,
        directory: Arc<U>,
        policy: ScreeningPolicy,
        reporting: ReportingConfig,
    ) -> Self {
        Self {
            repository,
            directory,
            engine,
            policy,
            reporting,
        }
    }

    pub fn questionnaire(&self) -> &'static Questionnaire {
        self.engine.questionnaire()
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn reporting(&self) -> &ReportingConfig {
        &self.reporting
    }

    /// Score, classify and persist one completed questionnaire pass.
    ///
    /// Exactly one result is written on success. `answers` is only borrowed, so the caller
    /// still holds them if the write fails and can retry.
    pub fn submit(
        &self,
        identity: &Identity,
        subject: SubjectProfile,
        answers: &AnswerStore,
    ) -> Result<ScreeningReceipt, ScreeningServiceError> {
        if let Err(error) = self.policy.admit(self.engine.questionnaire(), answers) {
            warn!(user = %identity.uid, error = %error, "screening submission rejected");
            return Err(error.into());
        }

        let outcome = self.engine.evaluate(answers);
        let pending = NewScreeningResult::from_outcome(identity, subject, &outcome);

        let stored = self.repository.insert(pending).map_err(|error| {
            warn!(
                user = %identity.uid,
                retryable = error.is_retryable(),
                error = %error,
                "screening result not stored"
            );
            error
        })?;

        info!(
            user = %stored.owner_id,
            screening = %stored.id.0,
            score = stored.score,
            tier = stored.tier.label(),
            destination = outcome.routing.destination.label(),
            "screening result stored"
        );

        Ok(ScreeningReceipt {
            result: stored,
            routing: outcome.routing,
        })
    }

    /// A user's own history and score trend.
    pub fn journey(&self, owner: &UserId) -> Result<UserJourney, ScreeningServiceError> {
        let results = self.repository.for_owner(owner)?;
        Ok(UserJourney::from_results(
            owner.clone(),
            results,
            self.reporting.utc_offset,
        ))
    }

    /// Organisation-wide analytics. Only administrators may read them.
    pub fn overview(&self, requester: &UserId) -> Result<AdminOverview, ScreeningServiceError> {
        require_admin(self.directory.as_ref(), requester)?;

        let total_users = self.directory.count()?;
        let results = self.repository.all()?;
        Ok(AdminOverview::build(total_users, &results, &self.reporting))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScreeningServiceError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ScreeningServiceError {
    /// Storage failure underneath, whether raised directly or through the admin gate.
    pub fn repository_error(&self) -> Option<&RepositoryError> {
        match self {
            ScreeningServiceError::Repository(error)
            | ScreeningServiceError::Auth(AuthError::Directory(error)) => Some(error),
            _ => None,
        }
    }
}

use super::result::{NewScreeningResult, ScreeningId, ScreeningResult};
use crate::auth::UserId;
use crate::error::RepositoryError;
use crate::live::Subscription;

/// Which results a query or live watch covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreeningScope {
    Owner(UserId),
    All,
}

impl ScreeningScope {
    pub fn includes(&self, result: &ScreeningResult) -> bool {
        match self {
            ScreeningScope::Owner(owner) => &result.owner_id == owner,
            ScreeningScope::All => true,
        }
    }
}

/// Document store holding screening results. Reads are ordered newest first.
pub trait ScreeningRepository: Send + Sync {
    /// Persist with a server-assigned id and timestamp.
    fn insert(&self, result: NewScreeningResult) -> Result<ScreeningResult, RepositoryError>;
    fn for_owner(&self, owner: &UserId) -> Result<Vec<ScreeningResult>, RepositoryError>;
    fn all(&self) -> Result<Vec<ScreeningResult>, RepositoryError>;
    fn delete(&self, id: &ScreeningId) -> Result<(), RepositoryError>;

    /// Live query. `on_snapshot` gets the full, ordered result set for `scope` on every change;
    /// `on_error` fires at most once and ends the subscription.
    fn watch(
        &self,
        scope: ScreeningScope,
        on_snapshot: Box<dyn FnMut(&[ScreeningResult]) + Send>,
        on_error: Box<dyn FnOnce(RepositoryError) + Send>,
    ) -> Subscription;
}

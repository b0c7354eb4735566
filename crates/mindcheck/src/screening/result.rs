use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::engine::TriageOutcome;
use super::tier::RiskTier;
use crate::auth::{Identity, UserId};

/// Identifier assigned by the repository when a result is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScreeningId(pub String);

/// Self-reported demographics captured next to a screening.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectProfile {
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub gender: Option<String>,
}

/// Result ready to persist; the repository assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewScreeningResult {
    pub owner_id: UserId,
    #[serde(default)]
    pub owner_name: Option<String>,
    pub score: u32,
    pub tier: RiskTier,
    #[serde(default)]
    pub subject: SubjectProfile,
}

impl NewScreeningResult {
    pub fn from_outcome(
        identity: &Identity,
        subject: SubjectProfile,
        outcome: &TriageOutcome,
    ) -> Self {
        Self {
            owner_id: identity.uid.clone(),
            owner_name: identity.display_name.clone(),
            score: outcome.score,
            tier: outcome.tier,
            subject,
        }
    }
}

/// Stored outcome of one completed questionnaire pass. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningResult {
    pub id: ScreeningId,
    pub owner_id: UserId,
    #[serde(default)]
    pub owner_name: Option<String>,
    pub score: u32,
    #[serde(alias = "result")]
    pub tier: RiskTier,
    #[serde(default)]
    pub subject: SubjectProfile,
    /// `None` while the server timestamp is pending or when an import had no date.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ScreeningResult {
    pub fn stored(id: ScreeningId, new: NewScreeningResult, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            owner_id: new.owner_id,
            owner_name: new.owner_name,
            score: new.score,
            tier: new.tier,
            subject: new.subject,
            created_at: Some(created_at),
        }
    }
}

/// Store delivery order: newest first, undated last.
pub fn sort_newest_first(results: &mut [ScreeningResult]) {
    results.sort_by_key(|result| (result.created_at.is_none(), Reverse(result.created_at)));
}

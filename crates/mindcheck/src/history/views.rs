use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;

use super::aggregate::{aggregate_in, MonthlyBucket, TierTotals};
use crate::auth::UserId;
use crate::config::ReportingConfig;
use crate::screening::{sort_newest_first, RiskTier, ScreeningResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierShare {
    pub tier: RiskTier,
    pub label: &'static str,
    pub count: usize,
}

/// Admin analytics: headline counts, recent screenings, monthly trend and tier breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminOverview {
    pub total_users: usize,
    pub screenings_completed: usize,
    pub high_risk: usize,
    pub recent: Vec<ScreeningResult>,
    pub monthly: Vec<MonthlyBucket>,
    pub tier_totals: TierTotals,
    pub breakdown: Vec<TierShare>,
}

impl AdminOverview {
    pub fn build(total_users: usize, results: &[ScreeningResult], config: &ReportingConfig) -> Self {
        let mut ordered = results.to_vec();
        sort_newest_first(&mut ordered);

        let aggregate = aggregate_in(&ordered, config.utc_offset);
        let breakdown = RiskTier::ordered()
            .into_iter()
            .map(|tier| TierShare {
                tier,
                label: tier.label(),
                count: aggregate.tier_totals.get(tier),
            })
            .collect();

        ordered.truncate(config.recent_limit);

        Self {
            total_users,
            screenings_completed: results.len(),
            high_risk: aggregate.tier_totals.high,
            recent: ordered,
            monthly: aggregate.monthly_buckets,
            tier_totals: aggregate.tier_totals,
            breakdown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub date: Option<NaiveDate>,
    pub label: String,
    pub score: u32,
    pub tier: RiskTier,
}

/// A single user's screenings: newest-first history and an oldest-first score trend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserJourney {
    pub owner_id: UserId,
    pub history: Vec<ScreeningResult>,
    pub trend: Vec<TrendPoint>,
    /// A trend line needs at least two points.
    pub chart_ready: bool,
}

impl UserJourney {
    pub fn from_results(
        owner_id: UserId,
        mut results: Vec<ScreeningResult>,
        offset: FixedOffset,
    ) -> Self {
        sort_newest_first(&mut results);

        let trend = results
            .iter()
            .rev()
            .map(|result| {
                let date = result
                    .created_at
                    .map(|created_at| created_at.with_timezone(&offset).date_naive());
                TrendPoint {
                    date,
                    label: date
                        .map(|date| date.format("%-d %b").to_string())
                        .unwrap_or_else(|| "N/A".to_string()),
                    score: result.score,
                    tier: result.tier,
                }
            })
            .collect::<Vec<_>>();

        Self {
            owner_id,
            chart_ready: trend.len() >= 2,
            history: results,
            trend,
        }
    }
}

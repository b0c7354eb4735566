use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, Utc};
use serde::Serialize;

use crate::screening::{RiskTier, ScreeningResult};

/// Calendar month used as the grouping key. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(timestamp: DateTime<Utc>, offset: FixedOffset) -> Self {
        let local = timestamp.with_timezone(&offset);
        Self {
            year: local.year(),
            month: local.month(),
        }
    }

    /// Short month plus two-digit year, e.g. `Oct 25`.
    pub fn label(self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|first| first.format("%b %y").to_string())
            .unwrap_or_else(|| format!("{:04}-{:02}", self.year, self.month))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierTotals {
    pub high: usize,
    pub moderate: usize,
    pub mild: usize,
}

impl TierTotals {
    pub fn get(&self, tier: RiskTier) -> usize {
        match tier {
            RiskTier::High => self.high,
            RiskTier::Moderate => self.moderate,
            RiskTier::Mild => self.mild,
        }
    }

    pub fn record(&mut self, tier: RiskTier) {
        match tier {
            RiskTier::High => self.high += 1,
            RiskTier::Moderate => self.moderate += 1,
            RiskTier::Mild => self.mild += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.high + self.moderate + self.mild
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyBucket {
    pub month: MonthKey,
    pub label: String,
    pub high: usize,
    pub moderate: usize,
    pub mild: usize,
}

impl MonthlyBucket {
    pub fn count(&self, tier: RiskTier) -> usize {
        match tier {
            RiskTier::High => self.high,
            RiskTier::Moderate => self.moderate,
            RiskTier::Mild => self.mild,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistoryAggregate {
    /// Chronological, oldest month first.
    pub monthly_buckets: Vec<MonthlyBucket>,
    /// Every result, dated or not.
    pub tier_totals: TierTotals,
    /// Results left out of the monthly buckets for lack of a timestamp.
    pub undated: usize,
}

/// Month buckets in UTC.
pub fn aggregate(results: &[ScreeningResult]) -> HistoryAggregate {
    aggregate_in(results, Utc.fix())
}

/// Recomputed from the full snapshot on every call; input order does not matter.
pub fn aggregate_in(results: &[ScreeningResult], offset: FixedOffset) -> HistoryAggregate {
    let mut months: BTreeMap<MonthKey, TierTotals> = BTreeMap::new();
    let mut tier_totals = TierTotals::default();
    let mut undated = 0;

    for result in results {
        tier_totals.record(result.tier);
        match result.created_at {
            Some(created_at) => months
                .entry(MonthKey::of(created_at, offset))
                .or_default()
                .record(result.tier),
            None => undated += 1,
        }
    }

    let monthly_buckets = months
        .into_iter()
        .map(|(month, counts)| MonthlyBucket {
            month,
            label: month.label(),
            high: counts.high,
            moderate: counts.moderate,
            mild: counts.mild,
        })
        .collect();

    HistoryAggregate {
        monthly_buckets,
        tier_totals,
        undated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::UserId;
    use crate::screening::{ScreeningId, SubjectProfile};
    use chrono::TimeZone;

    fn result(id: &str, tier: RiskTier, created_at: Option<DateTime<Utc>>) -> ScreeningResult {
        ScreeningResult {
            id: ScreeningId(id.to_string()),
            owner_id: UserId::new("u-1"),
            owner_name: None,
            score: match tier {
                RiskTier::Mild => 1,
                RiskTier::Moderate => 4,
                RiskTier::High => 7,
            },
            tier,
            subject: SubjectProfile::default(),
            created_at,
        }
    }

    fn at(year: i32, month: u32, day: u32, hour: u32) -> Option<DateTime<Utc>> {
        Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).single()
    }

    #[test]
    fn empty_input_yields_nothing() {
        let aggregate = aggregate(&[]);

        assert!(aggregate.monthly_buckets.is_empty());
        assert_eq!(aggregate.tier_totals, TierTotals::default());
        assert_eq!(aggregate.undated, 0);
    }

    #[test]
    fn descending_input_comes_out_chronological() {
        let results = vec![
            result("d", RiskTier::High, at(2025, 11, 2, 8)),
            result("c", RiskTier::Mild, at(2025, 10, 20, 8)),
            result("b", RiskTier::Moderate, at(2025, 10, 3, 8)),
            result("a", RiskTier::Mild, at(2024, 12, 31, 8)),
        ];

        let aggregate = aggregate(&results);

        let labels: Vec<&str> = aggregate
            .monthly_buckets
            .iter()
            .map(|bucket| bucket.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Dec 24", "Oct 25", "Nov 25"]);

        let october = &aggregate.monthly_buckets[1];
        assert_eq!((october.high, october.moderate, october.mild), (0, 1, 1));
        assert_eq!(aggregate.tier_totals.total(), 4);
    }

    #[test]
    fn same_month_in_different_years_stays_separate() {
        let results = vec![
            result("a", RiskTier::High, at(2024, 3, 1, 8)),
            result("b", RiskTier::High, at(2025, 3, 1, 8)),
        ];

        let aggregate = aggregate(&results);

        assert_eq!(aggregate.monthly_buckets.len(), 2);
        assert_eq!(aggregate.monthly_buckets[0].month, MonthKey { year: 2024, month: 3 });
    }

    #[test]
    fn undated_results_count_in_totals_only() {
        let results = vec![
            result("a", RiskTier::High, None),
            result("b", RiskTier::Moderate, at(2025, 5, 5, 12)),
        ];

        let aggregate = aggregate(&results);

        assert_eq!(aggregate.undated, 1);
        assert_eq!(aggregate.tier_totals.high, 1);
        assert_eq!(aggregate.tier_totals.moderate, 1);
        assert_eq!(aggregate.monthly_buckets.len(), 1);
        assert_eq!(aggregate.monthly_buckets[0].high, 0);
    }

    #[test]
    fn offset_moves_results_across_month_boundaries() {
        let results = vec![result("a", RiskTier::Mild, at(2025, 1, 31, 22))];
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).expect("valid offset");

        let utc = aggregate(&results);
        let local = aggregate_in(&results, ist);

        assert_eq!(utc.monthly_buckets[0].label, "Jan 25");
        assert_eq!(local.monthly_buckets[0].label, "Feb 25");
    }

    #[test]
    fn rerunning_on_the_same_snapshot_is_stable() {
        let results = vec![
            result("a", RiskTier::High, at(2025, 6, 1, 8)),
            result("b", RiskTier::Mild, None),
        ];

        assert_eq!(aggregate(&results), aggregate(&results));
    }
}

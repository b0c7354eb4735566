use serde::{Deserialize, Serialize};

/// Highest score still classified as [`RiskTier::Mild`].
pub const MILD_CEILING: u32 = 2;
/// Highest score still classified as [`RiskTier::Moderate`].
pub const MODERATE_CEILING: u32 = 5;

/// Ordinal risk classification derived from a questionnaire score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskTier {
    Mild,
    Moderate,
    High,
}

impl RiskTier {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Mild => "Mild",
            Self::Moderate => "Moderate",
            Self::High => "High",
        }
    }

    /// Dashboard order, most severe first.
    pub const fn ordered() -> [RiskTier; 3] {
        [Self::High, Self::Moderate, Self::Mild]
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mild" => Some(Self::Mild),
            "moderate" => Some(Self::Moderate),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Monotonic step function over all scores.
pub fn classify(score: u32) -> RiskTier {
    if score <= MILD_CEILING {
        RiskTier::Mild
    } else if score <= MODERATE_CEILING {
        RiskTier::Moderate
    } else {
        RiskTier::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_fall_on_the_documented_side() {
        assert_eq!(classify(0), RiskTier::Mild);
        assert_eq!(classify(2), RiskTier::Mild);
        assert_eq!(classify(3), RiskTier::Moderate);
        assert_eq!(classify(5), RiskTier::Moderate);
        assert_eq!(classify(6), RiskTier::High);
        assert_eq!(classify(u32::MAX), RiskTier::High);
    }

    #[test]
    fn classification_never_decreases_with_score() {
        let tiers: Vec<RiskTier> = (0..=12).map(classify).collect();
        assert!(tiers.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn parses_stored_labels() {
        for tier in RiskTier::ordered() {
            assert_eq!(RiskTier::parse(tier.label()), Some(tier));
        }
        assert_eq!(RiskTier::parse(" HIGH "), Some(RiskTier::High));
        assert_eq!(RiskTier::parse("severe"), None);
    }
}

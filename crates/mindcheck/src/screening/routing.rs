use serde::{Deserialize, Serialize};

use super::tier::RiskTier;

/// Downstream flow a completed screening sends the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    Resources,
    ChatCoach,
    Booking,
}

impl Destination {
    pub const fn path(self) -> &'static str {
        match self {
            Self::Resources => "/resources",
            Self::ChatCoach => "/chatbot",
            Self::Booking => "/booking",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Resources => "Self-serve resources",
            Self::ChatCoach => "AI chat coach",
            Self::Booking => "Professional booking",
        }
    }
}

pub fn route(tier: RiskTier) -> Destination {
    match tier {
        RiskTier::Mild => Destination::Resources,
        RiskTier::Moderate => Destination::ChatCoach,
        RiskTier::High => Destination::Booking,
    }
}

/// Context handed to the chat coach so it can open with the screening outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachContext {
    pub score: u32,
    pub tier: RiskTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoutingDecision {
    pub destination: Destination,
    pub path: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<CoachContext>,
}

impl RoutingDecision {
    pub fn for_outcome(score: u32, tier: RiskTier) -> Self {
        let destination = route(tier);
        let context = match destination {
            Destination::ChatCoach => Some(CoachContext { score, tier }),
            Destination::Resources | Destination::Booking => None,
        };

        Self {
            destination,
            path: destination.path(),
            context,
        }
    }
}

use serde::Serialize;

use super::answers::AnswerStore;
use super::questionnaire::Questionnaire;
use super::routing::RoutingDecision;
use super::scoring::{score_components, ScoreComponent};
use super::tier::{classify, RiskTier};

/// Stateless scorer, classifier and router over one instrument.
#[derive(Debug, Clone, Copy)]
pub struct TriageEngine {
    questionnaire: &'static Questionnaire,
}

impl Default for TriageEngine {
    fn default() -> Self {
        Self::new(Questionnaire::standard())
    }
}

impl TriageEngine {
    pub fn new(questionnaire: &'static Questionnaire) -> Self {
        Self { questionnaire }
    }

    pub fn questionnaire(&self) -> &'static Questionnaire {
        self.questionnaire
    }

    pub fn evaluate(&self, answers: &AnswerStore) -> TriageOutcome {
        let (components, score) = score_components(self.questionnaire, answers);
        let tier = classify(score);
        let answered = components
            .iter()
            .filter(|component| component.chosen.is_some())
            .count();

        TriageOutcome {
            score,
            tier,
            routing: RoutingDecision::for_outcome(score, tier),
            answered,
            components,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriageOutcome {
    pub score: u32,
    pub tier: RiskTier,
    pub routing: RoutingDecision,
    pub answered: usize,
    pub components: Vec<ScoreComponent>,
}

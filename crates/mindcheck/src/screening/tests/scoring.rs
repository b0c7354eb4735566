use super::common::*;
use crate::screening::{
    classify, route, score, AnswerStore, CoachContext, Destination, RiskTier, TriageEngine,
};

#[test]
fn single_weighted_answer_routes_to_resources() {
    let outcome = TriageEngine::default().evaluate(&scenario_a());

    assert_eq!(outcome.score, 1);
    assert_eq!(outcome.tier, RiskTier::Mild);
    assert_eq!(outcome.routing.destination, Destination::Resources);
    assert_eq!(outcome.routing.path, "/resources");
    assert!(outcome.routing.context.is_none());
    assert_eq!(outcome.answered, 8);
}

#[test]
fn four_weighted_answers_open_the_chat_coach_with_context() {
    let outcome = TriageEngine::default().evaluate(&scenario_b());

    assert_eq!(outcome.score, 4);
    assert_eq!(outcome.tier, RiskTier::Moderate);
    assert_eq!(outcome.routing.destination, Destination::ChatCoach);
    assert_eq!(
        outcome.routing.context,
        Some(CoachContext {
            score: 4,
            tier: RiskTier::Moderate,
        })
    );
}

#[test]
fn every_weighted_answer_routes_to_booking() {
    let answers: AnswerStore = WEIGHTED.iter().copied().collect();

    let outcome = TriageEngine::default().evaluate(&answers);

    assert_eq!(outcome.score, 8);
    assert_eq!(outcome.tier, RiskTier::High);
    assert_eq!(outcome.routing.destination, Destination::Booking);
    assert_eq!(outcome.routing.path, "/booking");
}

#[test]
fn score_sums_only_answers_present() {
    for weighted in 0..=8 {
        assert_eq!(score(&answers_scoring(weighted)), weighted as u32);
    }
    assert_eq!(score(&AnswerStore::new()), 0);
}

#[test]
fn unknown_values_score_zero_instead_of_failing() {
    let answers: AnswerStore = [("q1", "stressed"), ("q2", "sometimes")].into_iter().collect();

    let outcome = TriageEngine::default().evaluate(&answers);

    assert_eq!(outcome.score, 1);
    let q2 = outcome
        .components
        .iter()
        .find(|component| component.question_id == "q2")
        .expect("q2 component");
    assert_eq!(q2.weight, 0);
    assert_eq!(q2.chosen.as_deref(), Some("sometimes"));
}

#[test]
fn tier_boundaries_drive_destinations() {
    let cases = [
        (2, Destination::Resources),
        (3, Destination::ChatCoach),
        (5, Destination::ChatCoach),
        (6, Destination::Booking),
    ];

    for (score, expected) in cases {
        assert_eq!(route(classify(score)), expected, "score {score}");
        let outcome = TriageEngine::default().evaluate(&answers_scoring(score as usize));
        assert_eq!(outcome.routing.destination, expected, "evaluated score {score}");
    }
}

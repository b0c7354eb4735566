use serde::Serialize;
use tracing::warn;

use super::answers::AnswerStore;
use super::questionnaire::Questionnaire;

/// Per-question contribution, kept so a result can be audited after the fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreComponent {
    pub question_id: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chosen: Option<String>,
    pub weight: u8,
}

/// Sum of table weights over the standard instrument.
pub fn score(answers: &AnswerStore) -> u32 {
    score_with(Questionnaire::standard(), answers)
}

pub fn score_with(questionnaire: &Questionnaire, answers: &AnswerStore) -> u32 {
    score_components(questionnaire, answers).1
}

/// Missing answers and values absent from the weight table both count as 0. Answers keyed by
/// ids outside the instrument are ignored.
pub(crate) fn score_components(
    questionnaire: &Questionnaire,
    answers: &AnswerStore,
) -> (Vec<ScoreComponent>, u32) {
    let mut components = Vec::with_capacity(questionnaire.len());
    let mut total = 0u32;

    for question in questionnaire.questions {
        let chosen = answers.get(question.id);
        let weight = match chosen {
            Some(value) => questionnaire.weight_of(value).unwrap_or_else(|| {
                warn!(
                    question_id = question.id,
                    value, "answer value not in weight table, scored as 0"
                );
                0
            }),
            None => 0,
        };

        total += u32::from(weight);
        components.push(ScoreComponent {
            question_id: question.id,
            chosen: chosen.map(str::to_string),
            weight,
        });
    }

    (components, total)
}

use serde::Serialize;

use super::answers::{AnswerError, AnswerStore};

/// One selectable option. `weight` is the option's contribution to the risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
    pub weight: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: &'static str,
    pub prompt: &'static str,
    pub choices: &'static [Choice],
}

impl Question {
    pub fn choice(&self, value: &str) -> Option<&'static Choice> {
        self.choices.iter().find(|choice| choice.value == value)
    }
}

/// Fixed screening instrument. Built at compile time and never mutated.
#[derive(Debug, Serialize)]
pub struct Questionnaire {
    pub questions: &'static [Question],
}

static STANDARD: Questionnaire = Questionnaire {
    questions: &[
        Question {
            id: "q1",
            prompt: "Over the past week, have you felt unable to relax due to work/school pressure?",
            choices: &[
                Choice { value: "stressed", label: "Stressed", weight: 1 },
                Choice { value: "relaxed", label: "Relaxed", weight: 0 },
            ],
        },
        Question {
            id: "q2",
            prompt: "How often do you feel nervous or anxious in social situations?",
            choices: &[
                Choice { value: "very often", label: "Very Often", weight: 1 },
                Choice { value: "rarely", label: "Rarely", weight: 0 },
            ],
        },
        Question {
            id: "q3",
            prompt: "Little interest or pleasure in doing things?",
            choices: &[
                Choice { value: "no_interest", label: "No, I enjoy activities.", weight: 0 },
                Choice { value: "yes_lost_interest", label: "Yes, I've lost interest.", weight: 1 },
            ],
        },
        Question {
            id: "q4",
            prompt: "Feeling down, depressed, or hopeless?",
            choices: &[
                Choice { value: "feel_okay", label: "No, I feel okay.", weight: 0 },
                Choice { value: "feel_hopeless", label: "Yes, I often feel hopeless.", weight: 1 },
            ],
        },
        Question {
            id: "q5",
            prompt: "Feeling nervous, anxious, or on edge?",
            choices: &[
                Choice { value: "feel_calm", label: "No, I feel calm.", weight: 0 },
                Choice { value: "feel_nervous", label: "Yes, I feel nervous often.", weight: 1 },
            ],
        },
        Question {
            id: "q6",
            prompt: "Worrying too much about different things?",
            choices: &[
                Choice { value: "manage_worries", label: "No, I manage worries well.", weight: 0 },
                Choice { value: "worry_a_lot", label: "Yes, I worry a lot.", weight: 1 },
            ],
        },
        Question {
            id: "q7",
            prompt: "Have you recently been able to concentrate on what you're doing?",
            choices: &[
                Choice { value: "can_focus", label: "Yes, I can focus.", weight: 0 },
                Choice { value: "cannot_focus", label: "No, I find it hard to concentrate.", weight: 1 },
            ],
        },
        Question {
            id: "q8",
            prompt: "Have you recently felt constantly under strain?",
            choices: &[
                Choice { value: "feel_relaxed", label: "No, I feel relaxed.", weight: 0 },
                Choice { value: "feel_strain", label: "Yes, I feel under pressure.", weight: 1 },
            ],
        },
    ],
};

impl Questionnaire {
    pub fn standard() -> &'static Questionnaire {
        &STANDARD
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn question(&self, id: &str) -> Option<&'static Question> {
        self.questions.iter().find(|question| question.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.questions.iter().position(|question| question.id == id)
    }

    /// Static value -> weight table across every question's choices.
    pub fn weight_of(&self, value: &str) -> Option<u8> {
        self.questions
            .iter()
            .flat_map(|question| question.choices.iter())
            .find(|choice| choice.value == value)
            .map(|choice| choice.weight)
    }

    /// Highest score the instrument can produce.
    pub fn max_score(&self) -> u32 {
        self.questions
            .iter()
            .map(|question| {
                question
                    .choices
                    .iter()
                    .map(|choice| u32::from(choice.weight))
                    .max()
                    .unwrap_or(0)
            })
            .sum()
    }

    pub fn validate(&self, question_id: &str, value: &str) -> Result<(), AnswerError> {
        let question = self
            .question(question_id)
            .ok_or_else(|| AnswerError::UnknownQuestion {
                question_id: question_id.to_string(),
            })?;

        if question.choice(value).is_none() {
            return Err(AnswerError::UnknownChoice {
                question_id: question_id.to_string(),
                value: value.to_string(),
            });
        }

        Ok(())
    }

    /// Checks every entry of a bulk-delivered store. Reports the first offending entry.
    pub fn validate_all(&self, answers: &AnswerStore) -> Result<(), AnswerError> {
        answers
            .iter()
            .try_for_each(|(question_id, value)| self.validate(question_id, value))
    }
}

use super::answers::{AnswerError, AnswerStore};
use super::config::{ScreeningPolicy, SessionError};
use super::engine::{TriageEngine, TriageOutcome};
use super::questionnaire::{Question, Questionnaire};

/// One in-progress pass through the instrument. Owns its answers exclusively; dropping the
/// session discards them.
#[derive(Debug, Clone)]
pub struct ScreeningSession {
    questionnaire: &'static Questionnaire,
    answers: AnswerStore,
    step: usize,
}

impl Default for ScreeningSession {
    fn default() -> Self {
        Self::new(Questionnaire::standard())
    }
}

impl ScreeningSession {
    pub fn new(questionnaire: &'static Questionnaire) -> Self {
        Self {
            questionnaire,
            answers: AnswerStore::new(),
            step: 0,
        }
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn current_question(&self) -> Option<&'static Question> {
        self.questionnaire.questions.get(self.step)
    }

    pub fn current_answer(&self) -> Option<&str> {
        self.current_question()
            .and_then(|question| self.answers.get(question.id))
    }

    /// Record a choice for the question on screen.
    pub fn select(&mut self, value: &str) -> Result<Option<String>, AnswerError> {
        let question = self
            .current_question()
            .ok_or_else(|| AnswerError::UnknownQuestion {
                question_id: format!("#{}", self.step + 1),
            })?;
        self.answers.select(self.questionnaire, question.id, value)
    }

    pub fn select_for(
        &mut self,
        question_id: &str,
        value: &str,
    ) -> Result<Option<String>, AnswerError> {
        self.answers.select(self.questionnaire, question_id, value)
    }

    /// Advance one question. Returns false when already on the last one.
    pub fn next(&mut self) -> bool {
        if self.step + 1 < self.questionnaire.len() {
            self.step += 1;
            true
        } else {
            false
        }
    }

    pub fn previous(&mut self) -> bool {
        if self.step > 0 {
            self.step -= 1;
            true
        } else {
            false
        }
    }

    pub fn is_last_step(&self) -> bool {
        self.step + 1 >= self.questionnaire.len()
    }

    pub fn progress_pct(&self) -> f32 {
        if self.questionnaire.is_empty() {
            return 100.0;
        }
        (self.step + 1) as f32 / self.questionnaire.len() as f32 * 100.0
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    pub fn missing(&self) -> Vec<&'static str> {
        self.answers.missing(self.questionnaire)
    }

    /// Score the session. Borrowing keeps the answers around when a later submit fails.
    pub fn finish(
        &self,
        engine: &TriageEngine,
        policy: ScreeningPolicy,
    ) -> Result<TriageOutcome, SessionError> {
        policy.admit(self.questionnaire, &self.answers)?;
        Ok(engine.evaluate(&self.answers))
    }
}

//! Mental-health screening: the fixed questionnaire, answer capture, scoring, risk tiers and
//! the routing decision that sends a user to resources, the chat coach or booking.
//!
//! Everything up to [`TriageEngine::evaluate`] is pure. Persistence sits behind
//! [`ScreeningRepository`] and [`ScreeningService`] composes the two.

mod answers;
mod config;
mod engine;
mod questionnaire;
pub mod repository;
mod result;
pub mod router;
mod routing;
mod scoring;
pub mod service;
mod session;
mod tier;

#[cfg(test)]
mod tests;

pub use answers::{AnswerError, AnswerStore};
pub use config::{IncompletePolicy, ScreeningPolicy, SessionError};
pub use engine::{TriageEngine, TriageOutcome};
pub use questionnaire::{Choice, Question, Questionnaire};
pub use repository::{ScreeningRepository, ScreeningScope};
pub use result::{
    sort_newest_first, NewScreeningResult, ScreeningId, ScreeningResult, SubjectProfile,
};
pub use router::{screening_router, SubmitScreeningRequest, USER_ID_HEADER};
pub use routing::{route, CoachContext, Destination, RoutingDecision};
pub use scoring::{score, score_with, ScoreComponent};
pub use service::{ScreeningReceipt, ScreeningService, ScreeningServiceError};
pub use session::ScreeningSession;
pub use tier::{classify, RiskTier, MILD_CEILING, MODERATE_CEILING};

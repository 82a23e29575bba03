//! The two unrecoverable error kinds (malformed input, unsupported feature).
//! Everything else the core can report (grounding-time unsolvability, search
//! outcomes, resource exhaustion) is a status code, not an `Err`: see
//! [`crate::task::StripsTask::unsolvable`] and [`crate::search::SearchOutcome`].

use strips_utils::input::Span;

/// Raised by [`crate::lifted::LiftedProblemBuilder::build`] when the lifted
/// problem cannot be compiled into a task at all.
#[derive(thiserror::Error, Debug)]
pub enum PlanningError {
    #[error("malformed input: {message}{}", display_span(*span))]
    MalformedInput { message: String, span: Option<Span> },

    #[error("unsupported input feature: {0}")]
    Unsupported(String),
}

fn display_span(span: Option<Span>) -> String {
    match span {
        Some(s) => format!(" (at {}:{}..{}:{})", s.start.line, s.start.column, s.end.line, s.end.column),
        None => String::new(),
    }
}

impl PlanningError {
    pub fn malformed(message: impl Into<String>) -> Self {
        PlanningError::MalformedInput { message: message.into(), span: None }
    }

    pub fn malformed_at(message: impl Into<String>, span: Span) -> Self {
        PlanningError::MalformedInput { message: message.into(), span: Some(span) }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        PlanningError::Unsupported(message.into())
    }
}

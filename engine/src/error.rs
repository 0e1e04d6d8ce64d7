//! Error taxonomy for the execution engine.
//!
//! Four kinds of failure, matching the engine's error handling design:
//! invariant violations (`Bug`), the recoverable `EngineError` family
//! surfaced by the activity lifecycle, user-facing model-construction
//! problems (`UserError`), and the cooperative `Terminate` signal, which is
//! not an error at all but ordinary control flow.

use thiserror::Error;

/// An invariant violation in the engine itself. Always fatal; unwinds the
/// main loop. Carries the `to_string` of the offending element where one
/// is available.
#[derive(Debug, Error)]
#[error("bug (engine invariant violated): {0}")]
pub struct Bug(pub String);

impl Bug {
    pub fn new(msg: impl Into<String>) -> Self {
        Bug(msg.into())
    }
}

/// Errors recoverable by the caller of the activity lifecycle, but not by
/// the main loop itself — they invalidate the transition in question.
#[derive(Debug, Error)]
pub enum EngineError {
    /// `end_activity` was asked to retire a grounding that has no entry in
    /// the activity map.
    #[error("lost transition: no running activity for {0}")]
    LostTransition(String),
    /// `end_activity`'s hook does not match the activity's current state.
    #[error("inconsistent transition: {0}")]
    InconsistentTransition(String),
}

/// Model-construction problems surfaced while wiring up or running a
/// program.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("type error: {0}")]
    TypeError(String),
    #[error("expression type mismatch: {0}")]
    ExpressionTypeMismatch(String),
    #[error("redefinition error: {0} is already defined")]
    RedefinitionError(String),
    #[error("cannot start {0} while it is already running")]
    AlreadyRunning(String),
    #[error("{0} is not reachable from the enclosing scope chain")]
    UnresolvedReference(String),
}

/// The union of everything that can abort a `run()` call with an error.
/// `Terminate` (see below) is deliberately *not* a variant here: it is
/// cooperative control flow, not a failure.
#[derive(Debug, Error)]
pub enum GologError {
    #[error(transparent)]
    Bug(#[from] Bug),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    User(#[from] UserError),
}

pub type Result<T> = std::result::Result<T, GologError>;

/// How a `run()` call ended: normal program termination (`final` became
/// true) or a cooperative `terminate()` request. Neither is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Terminated,
}

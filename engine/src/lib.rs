//! Execution engine for a Golog-family agent programming language: the AST
//! and data model, the pluggable transition/final semantics driver, the
//! activity lifecycle, and the exogenous-event loop.
//!
//! The surface parser, the concrete reasoning backend (how `trans`/`final`
//! actually decide things), platform I/O drivers, and build packaging are
//! all external collaborators — this crate only supplies the machinery they
//! plug into.

pub mod activity;
pub mod backend;
pub mod context;
pub mod error;
pub mod exog;
pub mod history;
pub mod lang;
pub mod semantics;
pub mod time;

pub use activity::{Activity, ActivityState};
pub use backend::{ComponentBackend, DummyComponentBackend, PlatformBackend};
pub use context::{ComponentMapping, EngineConfig, ExecutionContext};
pub use error::{Bug, EngineError, GologError, Result, RunOutcome, UserError};
pub use exog::{ExogInput, ExogQueue, ExogSender};
pub use history::{History, HistoryEvent};
pub use semantics::{Binding, Plan, PlanElement, SemanticsFactory};

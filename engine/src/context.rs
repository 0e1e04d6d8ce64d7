//! The execution loop, grounded in
//! `examples/original_source/model/execution.cpp`'s `ExecutionContext::run`:
//! drain pending exogenous input, try to make progress, dispatch whatever
//! transition results, and block for more input only when the program is
//! stuck but not yet legally final.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, info};

use crate::backend::PlatformBackend;
use crate::error::{Bug, Result, RunOutcome};
use crate::exog::{Drained, ExogInput, ExogQueue, ExogSender};
use crate::history::{History, HistoryEvent};
use crate::lang::program::Stmt;
use crate::lang::scope::Scope;
use crate::lang::transition::{Hook, Transition};
use crate::semantics::{Binding, Plan, SemanticsFactory};
use crate::time::now;

/// Runtime knobs the caller controls instead of the engine hard-coding them
/// (`spec.md` §4.7's "backend defined" history watermark gets a concrete,
/// overridable home here).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Event-count threshold past which `should_progress()` reports true.
    pub history_watermark: usize,
    /// Suppresses the `tracing::info!` lifecycle narration this context
    /// emits by default; unit tests that don't install a subscriber usually
    /// don't care either way, but a quiet embedder can ask for it.
    pub start_silent: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            history_watermark: 500,
            start_silent: false,
        }
    }
}

/// Maps an action's name to the component backend responsible for carrying
/// it out. The engine has no opinion on this mapping; a model with a 1:1
/// action-to-component correspondence can just use the identity function.
pub type ComponentMapping = Box<dyn Fn(&str) -> String>;

pub struct ExecutionContext {
    history: History,
    backend: Arc<PlatformBackend>,
    exog: ExogQueue,
    factory: Rc<dyn SemanticsFactory>,
    config: EngineConfig,
    component_for: ComponentMapping,
    /// Mutable per-run counterpart of `EngineConfig.start_silent`: seeded
    /// from it, but cleared the first time a non-silent exogenous event or
    /// activity-end is drained. Mirrors
    /// `examples/original_source/src/model/execution.cpp`'s
    /// `AExecutionContext::silent_` member and its `set_silent(false)` call
    /// inside `drain_exog_queue`.
    silent_mode: Cell<bool>,
}

impl ExecutionContext {
    pub fn new(
        backend: Arc<PlatformBackend>,
        factory: Rc<dyn SemanticsFactory>,
        config: EngineConfig,
        component_for: ComponentMapping,
    ) -> Self {
        let silent_mode = Cell::new(config.start_silent);
        ExecutionContext {
            history: History::new(),
            backend,
            exog: ExogQueue::new(),
            factory,
            config,
            component_for,
            silent_mode,
        }
    }

    /// Whether the context is currently suppressing lifecycle narration.
    /// Starts at `EngineConfig.start_silent` and clears permanently the
    /// first time a non-silent exogenous occurrence or activity-end is
    /// drained.
    pub fn is_silent(&self) -> bool {
        self.silent_mode.get()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn backend(&self) -> &Arc<PlatformBackend> {
        &self.backend
    }

    /// A cloneable handle backend threads use to push exogenous occurrences
    /// and activity-end callbacks back into the loop.
    pub fn exog_sender(&self) -> ExogSender {
        self.exog.sender()
    }

    /// Requests cooperative shutdown: the next blocking wait (or the very
    /// next loop iteration, if already blocked) returns
    /// `RunOutcome::Terminated` instead of continuing.
    pub fn terminate(&self) {
        self.exog.terminate();
    }

    /// Runs `program` to completion or until `terminate()` is called.
    ///
    /// Performs the same orchestration as
    /// `examples/original_source/src/model/execution.cpp`'s
    /// `ExecutionContext::run` before entering the loop: attach semantics to
    /// the history, then to every global reachable from `program`'s scope
    /// (`precompile` / attach / `compile_global` per global / `postcompile`,
    /// matching `model/scope.cpp`'s `Scope::implement_globals`), then to the
    /// program tree itself. Each step is idempotent, so calling `run` again
    /// on a context that already ran is safe.
    pub fn run(&self, mut program: Box<Stmt>) -> Result<RunOutcome> {
        self.history.attach_semantics(self.factory.as_ref());

        let root_scope = Scope::root_of(program.scope());
        self.factory.precompile()?;
        Scope::attach_all_globals(&root_scope, self.factory.as_ref());
        for global in Scope::all_globals(&root_scope) {
            self.factory.compile_global(&global)?;
        }
        self.factory.postcompile()?;

        program.attach_semantics(self.factory.as_ref());
        let mut binding = Binding::empty();

        loop {
            let drained = self.exog.drain_nonblocking();
            for input in drained {
                self.apply_exog_input(input)?;
            }
            self.maybe_progress();

            let stmt_eval = program
                .semantics()
                .ok_or_else(|| Bug::new("program statement has no attached semantics"))?;
            let mut alternatives = stmt_eval.trans(&binding, &self.history)?;
            if !alternatives.is_empty() {
                // No search/backtracking over non-deterministic alternatives
                // (out of scope per the Non-goals): the first one offered
                // by `trans` is taken.
                let (plan, continuation, next_binding) = alternatives.remove(0);
                self.dispatch_plan(&plan)?;
                program = continuation;
                binding = next_binding;
                continue;
            }

            if stmt_eval.is_final(&binding, &self.history)? {
                if !self.is_silent() {
                    info!("program reached a final configuration");
                }
                return Ok(RunOutcome::Completed);
            }

            match self.exog.wait_until_ready() {
                Drained::Terminated => {
                    if !self.is_silent() {
                        info!("execution context terminated while blocked on exogenous input");
                    }
                    return Ok(RunOutcome::Terminated);
                }
                Drained::Events(events) => {
                    for input in events {
                        self.apply_exog_input(input)?;
                    }
                }
            }
        }
    }

    fn maybe_progress(&self) {
        if self.history.should_progress(self.config.history_watermark) {
            debug!(len = self.history.len(), "progressing history");
            self.history.progress();
        }
    }

    fn dispatch_plan(&self, plan: &Plan) -> Result<()> {
        for element in &plan.elements {
            self.dispatch_transition(&element.transition)?;
        }
        Ok(())
    }

    fn dispatch_transition(&self, transition: &Transition) -> Result<()> {
        let component = (self.component_for)(transition.grounding.action.name());
        let resolved_state = match transition.hook {
            Hook::Start => {
                let activity = self.backend.start_activity(&component, transition.grounding.clone())?;
                activity.state()
            }
            Hook::Stop | Hook::Fail | Hook::Finish => {
                let activity = self.backend.end_activity(&transition.key(), transition.hook, None, None)?;
                activity.state()
            }
            Hook::End => {
                return Err(Bug::new("the execution loop must never construct a Hook::End transition").into());
            }
        };
        let recorded = Transition::new(transition.grounding.clone(), transition.hook, resolved_state);
        self.history.append(HistoryEvent::Transition(recorded), now())
    }

    /// Records a drained exogenous occurrence or activity-end callback,
    /// attaching semantics to the acting global and clearing `silent_mode`
    /// on any non-silent one — the Rust counterpart of
    /// `examples/original_source/src/model/execution.cpp`'s
    /// `drain_exog_queue` body.
    fn apply_exog_input(&self, input: ExogInput) -> Result<()> {
        match input {
            ExogInput::Occurrence(grounding) => {
                grounding.action.attach_semantics(self.factory.as_ref());
                if !grounding.action.is_silent() {
                    info!(action = grounding.action.name(), "exogenous event");
                    self.silent_mode.set(false);
                }
                self.history.append(HistoryEvent::Exogenous(grounding), now())
            }
            ExogInput::ActivityEnded {
                key,
                resolved_state,
                sensing_result,
            } => {
                let activity = self.backend.end_activity(&key, Hook::End, Some(resolved_state), sensing_result)?;
                activity.grounding.action.attach_semantics(self.factory.as_ref());
                if !activity.grounding.action.is_silent() {
                    self.silent_mode.set(false);
                }
                let transition = Transition::new(activity.grounding.clone(), Hook::End, activity.state());
                self.history.append(HistoryEvent::Transition(transition), now())
            }
        }
    }
}

impl Drop for ExecutionContext {
    fn drop(&mut self) {
        self.backend.terminate_components();
    }
}

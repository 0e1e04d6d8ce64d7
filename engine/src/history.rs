//! The append-only execution log plus its compacted fluent state.
//!
//! Grounded in `examples/original_source/semantics/readylog/history.h` and
//! `spec.md` §3/§4.7: a `History` records every primitive transition and
//! exogenous event in order, and exposes `should_progress`/`progress` to
//! fold an initial prefix into updated fluent values so the raw log doesn't
//! grow without bound.
//!
//! Effect application happens eagerly, at `append` time, rather than being
//! deferred to `progress`: every transition that resolves to
//! `ActivityState::Final` (whether via `Hook::Finish` or a backend's
//! `Hook::End` callback) and every exogenous event folds its action's
//! effect axioms into the fluent table immediately. `progress` then only
//! has to truncate the raw event vector —
//! the fluent table it would otherwise have to recompute is already
//! current. This keeps `evaluate_fluent` O(1) instead of replaying the
//! whole suffix on every query, and sidesteps a reentrant-borrow hazard that
//! a lazy-fold design would hit (folding an effect condition needs to read
//! the very state being folded). Observationally this is equivalent: no
//! query's answer depends on whether a prefix has been progressed yet.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::activity::ActivityState;
use crate::error::Result;
use crate::lang::value::Value;
use crate::semantics::{grounding_binding, Binding, HistoryEval, SemanticsFactory};
use crate::time::Time;

#[derive(Debug, Clone)]
pub enum HistoryEvent {
    Transition(crate::lang::transition::Transition),
    Exogenous(crate::lang::reference::Grounding),
}

#[derive(Debug, Clone)]
pub struct TimestampedEvent {
    pub event: HistoryEvent,
    pub at: Time,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FluentKey(String, Vec<Value>);

#[derive(Default)]
pub struct History {
    events: RefCell<Vec<TimestampedEvent>>,
    fluent_values: RefCell<HashMap<FluentKey, Value>>,
    semantics: RefCell<Option<Rc<dyn HistoryEval>>>,
}

impl History {
    pub fn new() -> Self {
        History::default()
    }

    /// Idempotently attaches semantics to the history itself, ahead of
    /// attaching any global or the program tree — matches the call order in
    /// `examples/original_source/src/model/execution.cpp`'s `run()`.
    pub fn attach_semantics(&self, factory: &dyn SemanticsFactory) {
        if self.semantics.borrow().is_none() {
            *self.semantics.borrow_mut() = Some(factory.make_history_semantics(self));
        }
    }

    pub fn semantics(&self) -> Option<Rc<dyn HistoryEval>> {
        self.semantics.borrow().clone()
    }

    /// Seeds the fluent table from a fluent's declared initial-value axioms.
    /// Called once per fluent during model construction, before any
    /// transition is appended.
    pub fn seed_fluent(&self, fluent_name: &str, args: Vec<Value>, value: Value) {
        self.fluent_values
            .borrow_mut()
            .insert(FluentKey(fluent_name.to_string(), args), value);
    }

    pub fn append(&self, event: HistoryEvent, at: Time) -> Result<()> {
        self.fold_if_applicable(&event)?;
        self.events.borrow_mut().push(TimestampedEvent { event, at });
        Ok(())
    }

    pub fn events(&self) -> Vec<TimestampedEvent> {
        self.events.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn evaluate_fluent(&self, name: &str, args: &[Value]) -> Option<Value> {
        self.fluent_values
            .borrow()
            .get(&FluentKey(name.to_string(), args.to_vec()))
            .cloned()
    }

    /// An event-count threshold: `ExecutionContext` checks this after every
    /// appended event against `EngineConfig.history_watermark`.
    pub fn should_progress(&self, watermark: usize) -> bool {
        self.len() >= watermark
    }

    /// Compacts the raw log. A no-op if there is nothing to compact — safe
    /// to call unconditionally, and idempotent when called back to back.
    pub fn progress(&self) {
        self.events.borrow_mut().clear();
    }

    fn fold_if_applicable(&self, event: &HistoryEvent) -> Result<()> {
        let grounding = match event {
            HistoryEvent::Exogenous(g) => g,
            HistoryEvent::Transition(t) if t.resolved_state == ActivityState::Final => &t.grounding,
            HistoryEvent::Transition(_) => return Ok(()),
        };
        let param_names = grounding.action.param_names();
        let binding = grounding_binding(&param_names, &grounding.args);

        match &grounding.action {
            crate::lang::reference::ActionHandle::Durative(action) => {
                action.with_effects(|effects| {
                    for axiom in effects {
                        self.apply_effect(axiom, &binding)?;
                    }
                    Ok(())
                })
            }
            crate::lang::reference::ActionHandle::Exogenous(exog) => {
                exog.with_effects(|effects| {
                    for axiom in effects {
                        self.apply_effect(axiom, &binding)?;
                    }
                    Ok(())
                })
            }
        }
    }

    fn apply_effect(&self, axiom: &crate::lang::effect::EffectAxiom, binding: &Binding) -> Result<()> {
        let cond_eval = axiom
            .condition
            .semantics()
            .expect("effect condition semantics must be attached before execution");
        if !cond_eval.evaluate(binding, self)?.as_bool()? {
            return Ok(());
        }
        let value_eval = axiom
            .value
            .semantics()
            .expect("effect value semantics must be attached before execution");
        let value = value_eval.evaluate(binding, self)?;
        let mut args = Vec::with_capacity(axiom.fluent_args.len());
        for a in &axiom.fluent_args {
            let eval = a
                .semantics()
                .expect("effect fluent-argument semantics must be attached before execution");
            args.push(eval.evaluate(binding, self)?);
        }
        self.fluent_values
            .borrow_mut()
            .insert(FluentKey(axiom.fluent.name.clone(), args), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_on_empty_history_is_a_no_op() {
        let h = History::new();
        assert!(!h.should_progress(1));
        h.progress();
        assert_eq!(h.len(), 0);
    }

    #[test]
    fn seeded_fluent_values_are_visible() {
        let h = History::new();
        h.seed_fluent("door_open", vec![], Value::Bool(false));
        assert_eq!(h.evaluate_fluent("door_open", &[]), Some(Value::Bool(false)));
    }
}

//! The activity lifecycle and component registry, grounded in
//! `examples/original_source/execution/platform_backend.cpp`'s
//! `PlatformBackend`: one mutex guards both the activity map and the
//! component registry (`spec.md` §4.5), `start_activity` rejects a
//! grounding that is already running, `end_activity` rejects a hook that
//! doesn't match the activity's current state, and a lookup for a
//! component with no registered backend lazily substitutes
//! `DummyComponentBackend` while logging a warning (replacing the
//! original's `log(LogLevel::WRN)`).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::activity::{Activity, ActivityState};
use crate::error::{EngineError, GologError, Result, UserError};
use crate::lang::reference::{Grounding, GroundingKey};
use crate::lang::transition::Hook;
use crate::lang::value::Value;

/// The component-specific half of dispatching a transition into the real
/// world (or a simulation of it). Implemented once per component by the
/// embedder; `PlatformBackend` only tracks bookkeeping.
///
/// Not `Send`/`Sync`: a component reports completion through an
/// `ExogSender`, which carries a `Grounding` built on `Rc` and so can't
/// cross a thread boundary. A component backed by real hardware or an async
/// service still runs its own work off-thread, but hands only `Send`-safe
/// data back across that boundary and calls back into `start`/`cancel` (or
/// pushes through its own `ExogSender`, reconstructed on the interpreter's
/// thread) from there.
pub trait ComponentBackend {
    fn name(&self) -> &str;
    fn start(&self, grounding: &Grounding) -> Result<()>;
    fn cancel(&self, grounding: &Grounding) -> Result<()>;
}

/// Stands in for a component that was referenced but never registered.
/// `start`/`cancel` are no-ops; this exists so a model with an unmapped
/// action can still run to exercise everything else, at the cost of a
/// logged warning every time it's reached for.
pub struct DummyComponentBackend {
    name: String,
}

impl DummyComponentBackend {
    pub fn new(name: impl Into<String>) -> Self {
        DummyComponentBackend { name: name.into() }
    }
}

impl ComponentBackend for DummyComponentBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self, _grounding: &Grounding) -> Result<()> {
        Ok(())
    }

    fn cancel(&self, _grounding: &Grounding) -> Result<()> {
        Ok(())
    }
}

struct BackendInner {
    activities: HashMap<GroundingKey, Arc<Activity>>,
    components: HashMap<String, Box<dyn ComponentBackend>>,
}

/// Tracks every activity the loop has started and every component backend
/// registered to carry them out. One `Mutex` covers both maps, so a caller
/// holding it for, say, `start_activity` can never race a concurrent
/// `register_component_backend`.
pub struct PlatformBackend {
    inner: Mutex<BackendInner>,
}

impl Default for PlatformBackend {
    fn default() -> Self {
        PlatformBackend {
            inner: Mutex::new(BackendInner {
                activities: HashMap::new(),
                components: HashMap::new(),
            }),
        }
    }
}

impl PlatformBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_component_backend(&self, backend: Box<dyn ComponentBackend>) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let name = backend.name().to_string();
        if inner.components.contains_key(&name) {
            return Err(UserError::RedefinitionError(name).into());
        }
        inner.components.insert(name, backend);
        Ok(())
    }

    /// Starts an activity for `grounding`, dispatched through the component
    /// named `component`. Fails with a user error if an activity for the
    /// same grounding is already tracked and not yet terminal — starting a
    /// second instance of a running grounded action is a model-construction
    /// mistake, not an engine invariant violation.
    pub fn start_activity(&self, component: &str, grounding: Grounding) -> Result<Arc<Activity>> {
        let mut inner = self.inner.lock().unwrap();
        let key = grounding.key();
        if let Some(existing) = inner.activities.get(&key) {
            if !existing.state().is_terminal() {
                return Err(UserError::AlreadyRunning(format!("{}{:?}", key.0, key.1)).into());
            }
        }
        let activity = Arc::new(Activity::new(grounding));
        let component = Self::component_or_dummy(&mut inner, component);
        component.start(&activity.grounding)?;
        activity.set_state(ActivityState::Running);
        inner.activities.insert(activity.grounding.key(), activity.clone());
        Ok(activity)
    }

    pub fn cancel_activity(&self, component: &str, key: &GroundingKey) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let grounding = inner
            .activities
            .get(key)
            .ok_or_else(|| GologError::from(EngineError::LostTransition(format!("{}{:?}", key.0, key.1))))?
            .grounding
            .clone();
        let component = Self::component_or_dummy(&mut inner, component);
        component.cancel(&grounding)?;
        Ok(())
    }

    /// Records the outcome of a transition against its activity, validating
    /// that `hook` is a legal continuation of the activity's current state.
    /// `Hook::End` accepts any terminal state, matching the backend-issued
    /// wildcard semantics described in `DESIGN.md`. On success the entry is
    /// removed from the activity map and returned for history recording —
    /// a terminal activity has nothing left to track.
    pub fn end_activity(
        &self,
        key: &GroundingKey,
        hook: Hook,
        resolved_state: Option<ActivityState>,
        sensing_result: Option<Value>,
    ) -> Result<Arc<Activity>> {
        let mut inner = self.inner.lock().unwrap();
        let activity = inner
            .activities
            .get(key)
            .ok_or_else(|| GologError::from(EngineError::LostTransition(format!("{}{:?}", key.0, key.1))))?
            .clone();

        if hook == Hook::Start {
            return Err(EngineError::InconsistentTransition(format!(
                "{}{:?}: START is reported through start_activity, not end_activity",
                key.0, key.1
            ))
            .into());
        }
        let new_state = match hook {
            Hook::End => resolved_state.ok_or_else(|| {
                GologError::from(EngineError::InconsistentTransition(format!(
                    "{}{:?}: END requires a resolved terminal state",
                    key.0, key.1
                )))
            })?,
            other => other.target_state().expect("non-Start hooks always have a target state"),
        };
        if activity.state() != ActivityState::Running {
            return Err(EngineError::InconsistentTransition(format!(
                "{}{:?}: {:?} is not a valid transition from {:?}",
                key.0,
                key.1,
                hook,
                activity.state()
            ))
            .into());
        }
        if let Some(sensed) = sensing_result {
            activity.set_sensing_result(sensed);
        }
        activity.set_state(new_state);
        inner.activities.remove(key);
        Ok(activity)
    }

    pub fn current_state(&self, key: &GroundingKey) -> Option<ActivityState> {
        self.inner.lock().unwrap().activities.get(key).map(|a| a.state())
    }

    /// How many activities are currently tracked — zero once every started
    /// activity has run to a terminal state and been retired through
    /// `end_activity`.
    pub fn tracked_activity_count(&self) -> usize {
        self.inner.lock().unwrap().activities.len()
    }

    /// Best-effort shutdown hook: asks every registered component to cancel
    /// whatever it's running. Individual component failures are logged and
    /// swallowed — termination must not get stuck on a single misbehaving
    /// component.
    pub fn terminate_components(&self) {
        let inner = self.inner.lock().unwrap();
        for (running_key, activity) in inner.activities.iter() {
            if activity.state().is_terminal() {
                continue;
            }
            if let Some(component) = inner.components.values().next() {
                if let Err(e) = component.cancel(&activity.grounding) {
                    warn!(grounding = %running_key.0, error = %e, "component failed to cancel during terminate");
                }
            }
        }
    }

    fn component_or_dummy<'a>(inner: &'a mut BackendInner, name: &str) -> &'a dyn ComponentBackend {
        if !inner.components.contains_key(name) {
            warn!(component = name, "no component backend registered, substituting DummyComponentBackend");
            inner
                .components
                .insert(name.to_string(), Box::new(DummyComponentBackend::new(name)));
        }
        inner.components.get(name).unwrap().as_ref()
    }
}

//! The activity lifecycle state machine, grounded in
//! `examples/original_source/execution/platform_backend.cpp`:
//! `IDLE -> RUNNING -> {FINAL, FAILED, PREEMPTED}`, with `CANCELLED` reached
//! from `IDLE` or `RUNNING` via an explicit cancel request rather than a
//! hook.

use std::sync::Mutex;

use crate::lang::reference::Grounding;
use crate::lang::transition::Hook;
use crate::lang::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityState {
    Idle,
    Running,
    Final,
    Failed,
    Preempted,
    Cancelled,
}

impl ActivityState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ActivityState::Final | ActivityState::Failed | ActivityState::Cancelled | ActivityState::Preempted
        )
    }
}

impl Hook {
    /// The state a successful application of this hook drives an activity
    /// to. `End` has no fixed target — it is a wildcard over the terminal
    /// states, resolved by whatever terminal state the backend actually
    /// reports.
    pub fn target_state(self) -> Option<ActivityState> {
        match self {
            Hook::Start => Some(ActivityState::Running),
            Hook::Stop => Some(ActivityState::Preempted),
            Hook::Fail => Some(ActivityState::Failed),
            Hook::Finish => Some(ActivityState::Final),
            Hook::End => None,
        }
    }
}

/// A durative action that has been started: tracks its grounding and
/// current lifecycle state. Always reached through `Arc<Activity>` behind
/// `PlatformBackend`'s single activity-map mutex — the `Mutex` here guards
/// only against the degenerate case of a caller holding a clone outside
/// that map.
#[derive(Debug)]
pub struct Activity {
    pub grounding: Grounding,
    state: Mutex<ActivityState>,
    sensing_result: Mutex<Option<Value>>,
}

impl Activity {
    pub fn new(grounding: Grounding) -> Self {
        Activity {
            grounding,
            state: Mutex::new(ActivityState::Idle),
            sensing_result: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ActivityState {
        *self.state.lock().unwrap()
    }

    pub fn set_state(&self, state: ActivityState) {
        *self.state.lock().unwrap() = state;
    }

    /// The value reported back by the grounding's sensing fluent, if its
    /// action senses and the backend has reported one. `None` for an
    /// activity whose action doesn't sense, or one that hasn't resolved yet.
    pub fn sensing_result(&self) -> Option<Value> {
        self.sensing_result.lock().unwrap().clone()
    }

    pub fn set_sensing_result(&self, value: Value) {
        *self.sensing_result.lock().unwrap() = Some(value);
    }
}

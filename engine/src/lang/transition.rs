//! Primitive transitions: a grounding paired with one of the five
//! lifecycle hooks, grounded in `examples/original_source/gologpp/Action.h`'s
//! `AbstractTransition`/`Transition`/`ExogTransition` hierarchy.

use crate::activity::ActivityState;
use crate::lang::reference::{Grounding, GroundingKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    Start,
    Stop,
    Fail,
    Finish,
    /// A wildcard over the terminal states, issued only by backend-side
    /// state-change callbacks — the execution loop never constructs one
    /// itself (see `DESIGN.md`'s resolution of the corresponding Open
    /// Question).
    End,
}

/// A dispatched hook plus the activity state it actually resolved to.
/// `resolved_state` is what `History::append`'s effect folding keys off of
/// (an action's effects fire when it reaches `ActivityState::Final`,
/// regardless of whether that arrived via `Hook::Finish` or a backend's
/// `Hook::End` callback that happened to resolve to `Final`).
#[derive(Debug, Clone)]
pub struct Transition {
    pub grounding: Grounding,
    pub hook: Hook,
    pub resolved_state: ActivityState,
}

impl Transition {
    pub fn new(grounding: Grounding, hook: Hook, resolved_state: ActivityState) -> Self {
        Transition {
            grounding,
            hook,
            resolved_state,
        }
    }

    pub fn key(&self) -> GroundingKey {
        self.grounding.key()
    }
}

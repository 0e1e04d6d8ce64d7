//! A component backend that reports every activity it starts as instantly
//! `Final` — stands in for a real platform driver so the CLI can run without
//! any actual hardware or service behind it.

use golog_engine::activity::ActivityState;
use golog_engine::backend::ComponentBackend;
use golog_engine::error::Result;
use golog_engine::exog::ExogSender;
use golog_engine::lang::reference::Grounding;

pub struct InstantComponent {
    name: String,
    sender: ExogSender,
}

impl InstantComponent {
    pub fn new(name: impl Into<String>, sender: ExogSender) -> Self {
        InstantComponent { name: name.into(), sender }
    }
}

impl ComponentBackend for InstantComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self, grounding: &Grounding) -> Result<()> {
        tracing::info!(action = grounding.action.name(), "instant component completing activity");
        self.sender.push_activity_ended(grounding.key(), ActivityState::Final);
        Ok(())
    }

    fn cancel(&self, _grounding: &Grounding) -> Result<()> {
        Ok(())
    }
}

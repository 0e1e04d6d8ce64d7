//! Runs the door model to completion: `open_door()` blocks on its `unlocked`
//! precondition until a `press_button` occurrence flips it, at which point
//! the instant-finishing component backend carries the action out and the
//! program reaches its final configuration.
//!
//! `Grounding` carries `Rc` handles into the AST (the engine is
//! single-threaded by design), so a real deployment's sensor/operator-input
//! thread would marshal a `Send`-safe payload across and reconstruct the
//! `Grounding` on the interpreter's own thread before pushing it; this demo
//! has only one thread, so that hand-off collapses to pushing the
//! occurrence directly before calling `run`.

mod backend;
mod model;
mod semantics;

use std::rc::Rc;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use golog_engine::backend::PlatformBackend;
use golog_engine::context::{EngineConfig, ExecutionContext};
use golog_engine::error::RunOutcome;
use golog_engine::lang::reference::Grounding;
use golog_engine::time;

use backend::InstantComponent;
use model::DoorModel;
use semantics::TreeWalkFactory;

const DOOR_COMPONENT: &str = "door";

/// Drives golog-engine's execution loop over a tiny door model.
#[derive(Debug, Parser)]
#[command(name = "toy-backend")]
struct Opt {
    /// Never push the unlocking occurrence — demonstrates `terminate()`
    /// cutting a run short instead of letting it complete.
    #[arg(long)]
    no_unlock: bool,

    /// Increase log verbosity; repeatable (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();
}

fn main() -> Result<()> {
    let opt = Opt::parse();
    init_tracing(opt.verbose);
    time::set_real_clock().expect("process-wide clock registered exactly once, at startup");

    let backend = Arc::new(PlatformBackend::new());
    let factory = Rc::new(TreeWalkFactory);
    let ctx = ExecutionContext::new(
        backend.clone(),
        factory.clone(),
        EngineConfig::default(),
        Box::new(|_action_name: &str| DOOR_COMPONENT.to_string()),
    );

    let model = DoorModel::build(factory.as_ref());
    model.seed_history(ctx.history());
    backend.register_component_backend(Box::new(InstantComponent::new(DOOR_COMPONENT, ctx.exog_sender())))?;

    if opt.no_unlock {
        tracing::info!("no_unlock set: terminating instead of waiting for the unlocking occurrence");
        ctx.terminate();
    } else {
        ctx.exog_sender()
            .push_occurrence(Grounding::exogenous(model.press_button.clone(), vec![]));
    }

    let outcome = ctx.run(model.open_door_program())?;
    match outcome {
        RunOutcome::Completed => {
            let door_open = ctx.history().evaluate_fluent("door_open", &[]);
            println!("program completed; door_open = {door_open:?}");
        }
        RunOutcome::Terminated => {
            println!("program was terminated before reaching a final configuration");
        }
    }
    Ok(())
}

//! A two-fluent door model: `unlocked` guards `open_door`'s precondition,
//! `press_button` (an exogenous, observation-only action) is the only way
//! to flip it.

use std::rc::Rc;

use golog_engine::history::History;
use golog_engine::lang::effect::EffectAxiom;
use golog_engine::lang::expr::{Expr, ExprKind};
use golog_engine::lang::global::{Action, ExogAction, Fluent, InitialValue};
use golog_engine::lang::program::{Stmt, StmtKind};
use golog_engine::lang::reference::Reference;
use golog_engine::lang::scope::{GlobalRef, Scope, ScopeHandle};
use golog_engine::lang::types::Type;
use golog_engine::lang::value::Value;
use golog_engine::semantics::SemanticsFactory;

pub struct DoorModel {
    pub root: ScopeHandle,
    pub door_open: Rc<Fluent>,
    pub unlocked: Rc<Fluent>,
    pub open_door: Rc<Action>,
    pub press_button: Rc<ExogAction>,
}

fn bool_lit(root: &ScopeHandle, b: bool) -> Box<Expr> {
    Expr::new(ExprKind::BoolLit(b), root.clone(), Some(Type::Bool))
}

fn fluent_ref(root: &ScopeHandle, fluent: &Rc<Fluent>) -> Box<Expr> {
    Expr::new(
        ExprKind::FluentRef(Reference {
            target: fluent.clone(),
            args: vec![],
        }),
        root.clone(),
        Some(fluent.return_ty.clone()),
    )
}

impl DoorModel {
    pub fn build(factory: &dyn SemanticsFactory) -> Self {
        let root = Scope::new_root();

        let door_open = Fluent::new("door_open", vec![], Type::Bool, &root);
        door_open
            .define(vec![InitialValue {
                args: vec![],
                value: Value::Bool(false),
            }])
            .expect("door_open's own initial value always matches its declared type");
        Scope::declare_global(&root, GlobalRef::Fluent(door_open.clone())).expect("door_open declared once");

        let unlocked = Fluent::new("unlocked", vec![], Type::Bool, &root);
        unlocked
            .define(vec![InitialValue {
                args: vec![],
                value: Value::Bool(false),
            }])
            .expect("unlocked's own initial value always matches its declared type");
        Scope::declare_global(&root, GlobalRef::Fluent(unlocked.clone())).expect("unlocked declared once");

        let open_door = Action::new("open_door", vec![], &root);
        open_door.set_precondition(fluent_ref(&root, &unlocked));
        open_door.add_effect(EffectAxiom {
            condition: bool_lit(&root, true),
            fluent: door_open.clone(),
            fluent_args: vec![],
            value: bool_lit(&root, true),
        });
        Scope::declare_global(&root, GlobalRef::Action(open_door.clone())).expect("open_door declared once");

        let press_button = ExogAction::new("press_button", vec![], &root);
        press_button.add_effect(EffectAxiom {
            condition: bool_lit(&root, true),
            fluent: unlocked.clone(),
            fluent_args: vec![],
            value: bool_lit(&root, true),
        });
        Scope::declare_global(&root, GlobalRef::ExogAction(press_button.clone())).expect("press_button declared once");

        // Globals are attached independently of any call site referencing
        // them: a call's own `attach_semantics` only walks its argument
        // expressions, not the global's body/precondition/effects.
        door_open.attach_semantics(factory);
        unlocked.attach_semantics(factory);
        open_door.attach_semantics(factory);
        press_button.attach_semantics(factory);

        DoorModel {
            root,
            door_open,
            unlocked,
            open_door,
            press_button,
        }
    }

    /// `open_door()` alone — blocks until something external unlocks the
    /// door.
    pub fn open_door_program(&self) -> Box<Stmt> {
        Stmt::new(
            StmtKind::ActionCall(Reference {
                target: self.open_door.clone(),
                args: vec![],
            }),
            self.root.clone(),
        )
    }

    pub fn seed_history(&self, history: &History) {
        for iv in self.door_open.initial_values() {
            history.seed_fluent(&self.door_open.name, iv.args, iv.value);
        }
        for iv in self.unlocked.initial_values() {
            history.seed_fluent(&self.unlocked.name, iv.args, iv.value);
        }
    }
}

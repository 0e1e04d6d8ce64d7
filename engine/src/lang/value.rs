//! Runtime values: the literal forms a `Type` classifies.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{GologError, UserError};
use crate::lang::types::Type;

#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Symbol(String),
    String(String),
    List(Vec<Value>),
    Compound(BTreeMap<String, Value>),
}

impl Value {
    pub fn type_of(&self) -> Type {
        match self {
            Value::Bool(_) => Type::Bool,
            Value::Int(_) | Value::Float(_) => Type::Number,
            Value::Symbol(_) => Type::Symbol,
            Value::String(_) => Type::String,
            Value::List(items) => {
                let elem = items.first().map(Value::type_of).unwrap_or(Type::Number);
                Type::list_of(elem)
            }
            Value::Compound(fields) => Type::Compound(crate::lang::types::CompoundType {
                name: "compound".into(),
                fields: fields.iter().map(|(k, v)| (k.clone(), v.type_of())).collect(),
            }),
        }
    }

    pub fn as_bool(&self) -> Result<bool, GologError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(UserError::TypeError(format!("expected bool, got {other}")).into()),
        }
    }

    pub fn as_f64(&self) -> Result<f64, GologError> {
        match self {
            Value::Int(i) => Ok(*i as f64),
            Value::Float(f) => Ok(*f),
            other => Err(UserError::TypeError(format!("expected number, got {other}")).into()),
        }
    }

    pub fn as_i64(&self) -> Result<i64, GologError> {
        match self {
            Value::Int(i) => Ok(*i),
            other => Err(UserError::TypeError(format!("expected integer, got {other}")).into()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Compound(fields) => {
                write!(f, "{{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

// Values key the activity/history maps, so they need `Eq`/`Hash`. Floats are
// compared and hashed by bit pattern rather than IEEE equality — fine for a
// domain where values come from literals and discrete effect assignment, not
// accumulated arithmetic.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Compound(a), Value::Compound(b)) => a == b,
            _ => false,
        }
    }
}
impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Symbol(s) | Value::String(s) => s.hash(state),
            Value::List(items) => items.hash(state),
            Value::Compound(fields) => {
                for (k, v) in fields {
                    k.hash(state);
                    v.hash(state);
                }
            }
        }
    }
}

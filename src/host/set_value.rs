use std::{
    collections::HashSet,
    fmt::Display,
    hash::{DefaultHasher, Hash, Hasher},
    sync::Arc,
};

use ordered_float::OrderedFloat;

use crate::{error::HostError, host::value::Value};

/// Enum representing values allowed in sets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SetValue {
    /// An integer such as `-4` or `42`.
    Integer(i64),
    /// A boolean such as `true`.
    Bool(bool),
    /// A real such as `3.141592653589793`.
    Real(OrderedFloat<f64>),
    /// A string such as `"abc"`.
    Str(Arc<str>),
    /// An array such as `[1, 2, 2]`.
    Array(Vec<SetValue>),
    /// A set such as `{1, 2, true}`.
    Set(HashSet<SetValue>),
}

impl TryFrom<&Value> for SetValue {
    type Error = HostError;

    fn try_from(v: &Value) -> Result<Self, HostError> {
        match v {
            Value::Integer(i) => Ok(Self::Integer(*i)),
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Real(r) => Ok(Self::Real(OrderedFloat(*r))),
            Value::Str(s) => Ok(Self::Str(Arc::clone(s))),
            Value::Array(arr) => {
                Ok(Self::Array(arr.iter()
                                  .map(Self::try_from)
                                  .collect::<Result<Vec<_>, _>>()?))
            },
            Value::Set(set) => Ok(Self::Set(set.iter().cloned().collect())),
            _ => {
                Err(HostError::TypeMismatch { details: format!("values of type {} cannot be set elements",
                                                               v.type_name()), })
            },
        }
    }
}

impl From<SetValue> for Value {
    fn from(s: SetValue) -> Self {
        match s {
            SetValue::Integer(i) => Self::Integer(i),
            SetValue::Bool(b) => Self::Bool(b),
            SetValue::Real(r) => Self::Real(r.into_inner()),
            SetValue::Str(s) => Self::Str(s),
            SetValue::Array(arr) => {
                Self::Array(Arc::new(arr.into_iter().map(Self::from).collect()))
            },
            SetValue::Set(set) => Self::Set(Arc::new(set.into_iter().collect())),
        }
    }
}

impl SetValue {
    /// A deterministic sort key so set contents print in a stable order.
    #[must_use]
    pub(crate) fn print_key(
        &self)
        -> (u8, Option<i128>, Option<OrderedFloat<f64>>, Option<bool>, String) {
        match self {
            Self::Bool(b) => (0, None, None, Some(*b), String::new()),
            Self::Integer(n) => (1, Some(i128::from(*n)), None, None, String::new()),
            Self::Real(r) => (2, None, Some(*r), None, String::new()),
            Self::Str(_) => (3, None, None, None, format!("{self}")),
            Self::Array(_) => (4, None, None, None, format!("{self}")),
            Self::Set(_) => (5, None, None, None, format!("{self}")),
        }
    }
}

impl Hash for SetValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);

        match self {
            Self::Integer(i) => i.hash(state),
            Self::Bool(b) => b.hash(state),
            Self::Real(r) => r.hash(state),
            Self::Str(s) => s.hash(state),
            Self::Array(arr) => arr.hash(state),
            Self::Set(set) => {
                // Equal sets must hash equally whatever their iteration
                // order; XOR of the element hashes is order-independent.
                let mut combined = 0u64;
                for item in set {
                    let mut hasher = DefaultHasher::new();
                    item.hash(&mut hasher);
                    combined ^= hasher.finish();
                }
                combined.hash(state);
            },
        }
    }
}

impl Display for SetValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Real(r) => write!(f, "{}", r.into_inner()),
            Self::Str(s) => write!(f, "{s}"),
            Self::Array(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            },
            Self::Set(items) => {
                let mut elems: Vec<&Self> = items.iter().collect();
                elems.sort_by(|a, b| a.print_key().cmp(&b.print_key()));

                write!(f, "{{")?;
                for (index, item) in elems.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "}}")
            },
        }
    }
}

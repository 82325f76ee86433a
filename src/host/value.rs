use std::{collections::HashSet, sync::Arc};

use crate::{
    error::HostError,
    host::{object::ObjectValue, sequence::NumericSequence, set_value::SetValue},
    util::num::i64_to_f64_checked,
};

/// Represents a runtime value produced by reduction or a host call.
///
/// This enum models all the possible types that can appear as operands,
/// member targets, call arguments and reduction results.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The canonical null value. Member access on null propagates null.
    Null,
    /// An integer value (64 bit integer).
    Integer(i64),
    /// A numeric value (double precision floating-point).
    Real(f64),
    /// A boolean value (`true` or `false`).
    /// Produced by comparison operators (`<`, `==`, `!=`, etc.) and consumed
    /// by conditions and the short-circuit connectives.
    Bool(bool),
    /// An immutable string.
    Str(Arc<str>),
    /// An array of `Value` elements.
    Array(Arc<Vec<Self>>),
    /// A set of unique values.
    Set(Arc<HashSet<SetValue>>),
    /// A lazy numeric sequence produced by a generator expression.
    Seq(Arc<NumericSequence>),
    /// An opaque host object dispatched through the host registry.
    Object(ObjectValue),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(Arc::from(v.as_str()))
    }
}

impl From<Vec<Self>> for Value {
    fn from(v: Vec<Self>) -> Self {
        Self::Array(Arc::new(v))
    }
}

impl From<HashSet<SetValue>> for Value {
    fn from(v: HashSet<SetValue>) -> Self {
        Self::Set(Arc::new(v))
    }
}

impl From<NumericSequence> for Value {
    fn from(v: NumericSequence) -> Self {
        Self::Seq(Arc::new(v))
    }
}

impl From<ObjectValue> for Value {
    fn from(v: ObjectValue) -> Self {
        Self::Object(v)
    }
}

impl Value {
    /// The type name used for member dispatch and diagnostics.
    ///
    /// Primitive values use fixed names; objects report the name their type
    /// was registered under.
    ///
    /// ## Example
    /// ```
    /// use residua::host::value::Value;
    ///
    /// assert_eq!(Value::Integer(1).type_name(), "integer");
    /// assert_eq!(Value::from("hi").type_name(), "string");
    /// ```
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Null => "null",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Bool(_) => "bool",
            Self::Str(_) => "string",
            Self::Array(_) => "array",
            Self::Set(_) => "set",
            Self::Seq(_) => "sequence",
            Self::Object(obj) => obj.type_name(),
        }
    }

    /// Converts the value to an `f64`, or returns an error if not numeric.
    ///
    /// Accepts `Value::Real` and `Value::Integer`. For integers, conversion
    /// fails if the value is too large to be represented as `f64` exactly.
    ///
    /// ## Example
    /// ```
    /// use residua::host::value::Value;
    ///
    /// let x = Value::Integer(10);
    /// assert_eq!(x.as_real().unwrap(), 10.0);
    /// ```
    pub fn as_real(&self) -> Result<f64, HostError> {
        match self {
            Self::Real(r) => Ok(*r),
            Self::Integer(n) => Ok(i64_to_f64_checked(*n, HostError::Overflow)?),
            _ => {
                Err(HostError::TypeMismatch { details: format!("expected a number, found {}",
                                                               self.type_name()), })
            },
        }
    }

    /// Converts the value to `i64`, or returns an error if not an integer.
    pub fn as_integer(&self) -> Result<i64, HostError> {
        match self {
            Self::Integer(n) => Ok(*n),
            _ => {
                Err(HostError::TypeMismatch { details: format!("expected an integer, found {}",
                                                               self.type_name()), })
            },
        }
    }

    /// Converts the value to `bool`, or returns an error if not boolean.
    pub fn as_bool(&self) -> Result<bool, HostError> {
        match self {
            Self::Bool(b) => Ok(*b),
            _ => {
                Err(HostError::TypeMismatch { details: format!("expected a boolean, found {}",
                                                               self.type_name()), })
            },
        }
    }

    /// Borrows the string contents, or returns an error if not a string.
    pub fn as_str(&self) -> Result<&str, HostError> {
        match self {
            Self::Str(s) => Ok(s),
            _ => {
                Err(HostError::TypeMismatch { details: format!("expected a string, found {}",
                                                               self.type_name()), })
            },
        }
    }

    /// Borrows the array elements, or returns an error if not an array.
    pub fn as_vec(&self) -> Result<&Vec<Self>, HostError> {
        match self {
            Self::Array(v) => Ok(v),
            _ => {
                Err(HostError::TypeMismatch { details: format!("expected an array, found {}",
                                                               self.type_name()), })
            },
        }
    }

    /// Promotes an integer to a real value for mixed math, or returns values
    /// as-is if already matching.
    ///
    /// ## Example
    /// ```
    /// use residua::host::value::Value;
    ///
    /// let (l, r) = Value::Integer(2).promote_to_real(&Value::Real(0.5)).unwrap();
    /// assert_eq!(l, Value::Real(2.0));
    /// assert_eq!(r, Value::Real(0.5));
    /// ```
    pub fn promote_to_real(self, other: &Self) -> Result<(Self, Self), HostError> {
        use Value::{Integer, Real};

        match (&self, other) {
            (Real(_), Integer(_)) => Ok((self, Real(other.as_real()?))),
            (Integer(_), Real(_)) => Ok((Real(self.as_real()?), other.clone())),
            _ => Ok((self, other.clone())),
        }
    }

    /// Returns `true` if the value is [`Null`].
    ///
    /// [`Null`]: Value::Null
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` if the value is [`Integer`].
    ///
    /// [`Integer`]: Value::Integer
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Self::Integer(..))
    }

    /// Returns `true` if the value is [`Real`].
    ///
    /// [`Real`]: Value::Real
    #[must_use]
    pub const fn is_real(&self) -> bool {
        matches!(self, Self::Real(..))
    }

    /// Returns `true` if the value is [`Array`].
    ///
    /// [`Array`]: Value::Array
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Self::Array(..))
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Real(r) => write!(f, "{r}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Array(a) => {
                write!(f, "[")?;

                for (index, value) in a.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }

                    write!(f, "{value}")?;
                }

                write!(f, "]")
            },
            Self::Set(s) => {
                let mut elems: Vec<&SetValue> = s.iter().collect();
                elems.sort_by(|a, b| a.print_key().cmp(&b.print_key()));

                write!(f, "{{")?;
                for (i, v) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "}}")
            },
            Self::Seq(seq) => write!(f, "{seq}"),
            Self::Object(obj) => write!(f, "<{}>", obj.type_name()),
        }
    }
}

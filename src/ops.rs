use std::cmp::Ordering;

use crate::{
    ast::{InfixOp, PostfixOp, PrefixOp},
    error::HostError,
    host::value::Value,
    util::num::i64_to_f64_checked,
};

/// A pair of operands promoted to a common numeric kind.
enum NumPair {
    Integers(i64, i64),
    Reals(f64, f64),
}

/// Promotes two operands for arithmetic. Integer pairs stay integral;
/// anything else is converted through `as_real`, which rejects non-numeric
/// operands.
fn numeric_pair(left: &Value, right: &Value) -> Result<NumPair, HostError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Ok(NumPair::Integers(*a, *b)),
        _ => Ok(NumPair::Reals(left.as_real()?, right.as_real()?)),
    }
}

/// Adds two numbers, or concatenates two strings.
pub fn add(left: &Value, right: &Value) -> Result<Value, HostError> {
    if let (Value::Str(a), Value::Str(b)) = (left, right) {
        let mut joined = String::with_capacity(a.len() + b.len());
        joined.push_str(a);
        joined.push_str(b);
        return Ok(Value::from(joined));
    }

    match numeric_pair(left, right)? {
        NumPair::Integers(a, b) => {
            a.checked_add(b).map(Value::Integer).ok_or(HostError::Overflow)
        },
        NumPair::Reals(a, b) => Ok(Value::Real(a + b)),
    }
}

/// Subtracts the right number from the left.
pub fn subtract(left: &Value, right: &Value) -> Result<Value, HostError> {
    match numeric_pair(left, right)? {
        NumPair::Integers(a, b) => {
            a.checked_sub(b).map(Value::Integer).ok_or(HostError::Overflow)
        },
        NumPair::Reals(a, b) => Ok(Value::Real(a - b)),
    }
}

/// Multiplies two numbers.
pub fn multiply(left: &Value, right: &Value) -> Result<Value, HostError> {
    match numeric_pair(left, right)? {
        NumPair::Integers(a, b) => {
            a.checked_mul(b).map(Value::Integer).ok_or(HostError::Overflow)
        },
        NumPair::Reals(a, b) => Ok(Value::Real(a * b)),
    }
}

/// Divides the left number by the right. Integer division truncates;
/// division by zero is checked for both numeric kinds.
pub fn divide(left: &Value, right: &Value) -> Result<Value, HostError> {
    match numeric_pair(left, right)? {
        NumPair::Integers(_, 0) => Err(HostError::DivisionByZero),
        NumPair::Integers(a, b) => {
            a.checked_div(b).map(Value::Integer).ok_or(HostError::Overflow)
        },
        NumPair::Reals(a, b) => {
            if b == 0.0 {
                return Err(HostError::DivisionByZero);
            }
            Ok(Value::Real(a / b))
        },
    }
}

/// Computes the remainder of dividing the left number by the right.
pub fn modulo(left: &Value, right: &Value) -> Result<Value, HostError> {
    match numeric_pair(left, right)? {
        NumPair::Integers(_, 0) => Err(HostError::DivisionByZero),
        NumPair::Integers(a, b) => {
            a.checked_rem(b).map(Value::Integer).ok_or(HostError::Overflow)
        },
        NumPair::Reals(a, b) => {
            if b == 0.0 {
                return Err(HostError::DivisionByZero);
            }
            Ok(Value::Real(a % b))
        },
    }
}

/// Raises the left number to the right. Integer bases with non-negative
/// integer exponents stay integral; everything else goes through `f64`.
pub fn power(left: &Value, right: &Value) -> Result<Value, HostError> {
    match numeric_pair(left, right)? {
        NumPair::Integers(a, b) => {
            if let Ok(exponent) = u32::try_from(b) {
                return a.checked_pow(exponent)
                        .map(Value::Integer)
                        .ok_or(HostError::Overflow);
            }
            let base = i64_to_f64_checked(a, HostError::Overflow)?;
            let exponent = i64_to_f64_checked(b, HostError::Overflow)?;
            Ok(Value::Real(base.powf(exponent)))
        },
        NumPair::Reals(a, b) => Ok(Value::Real(a.powf(b))),
    }
}

/// Compares two operands, accepting numbers (with promotion) and strings.
fn ordered(left: &Value,
           right: &Value,
           test: fn(Ordering) -> bool)
           -> Result<Value, HostError> {
    if let (Value::Str(a), Value::Str(b)) = (left, right) {
        return Ok(Value::Bool(test(a.cmp(b))));
    }

    let ordering = match numeric_pair(left, right)? {
        NumPair::Integers(a, b) => a.cmp(&b),
        NumPair::Reals(a, b) => {
            a.partial_cmp(&b)
             .ok_or_else(|| HostError::InvalidArgument { details: "cannot order against NaN".to_string(), })?
        },
    };

    Ok(Value::Bool(test(ordering)))
}

/// Less-than comparison.
pub fn less(left: &Value, right: &Value) -> Result<Value, HostError> {
    ordered(left, right, |o| o == Ordering::Less)
}

/// Greater-than comparison.
pub fn greater(left: &Value, right: &Value) -> Result<Value, HostError> {
    ordered(left, right, |o| o == Ordering::Greater)
}

/// Less-than-or-equal comparison.
pub fn less_equal(left: &Value, right: &Value) -> Result<Value, HostError> {
    ordered(left, right, |o| o != Ordering::Greater)
}

/// Greater-than-or-equal comparison.
pub fn greater_equal(left: &Value, right: &Value) -> Result<Value, HostError> {
    ordered(left, right, |o| o != Ordering::Less)
}

/// Checks strict equality between two values, performing minimal promotion.
///
/// Mixed integer/real pairs are promoted and compared numerically; all other
/// pairs compare structurally, so mismatched types are unequal rather than
/// an error.
fn values_equal(left: &Value, right: &Value) -> Result<bool, HostError> {
    match (left, right) {
        (Value::Integer(_) | Value::Real(_), Value::Integer(_) | Value::Real(_)) => {
            match numeric_pair(left, right)? {
                NumPair::Integers(a, b) => Ok(a == b),
                NumPair::Reals(a, b) => Ok(a == b),
            }
        },
        _ => Ok(left == right),
    }
}

/// Equality comparison.
pub fn equal(left: &Value, right: &Value) -> Result<Value, HostError> {
    Ok(Value::Bool(values_equal(left, right)?))
}

/// Inequality comparison.
pub fn not_equal(left: &Value, right: &Value) -> Result<Value, HostError> {
    Ok(Value::Bool(!values_equal(left, right)?))
}

/// Arithmetic negation.
pub fn negate(value: &Value) -> Result<Value, HostError> {
    match value {
        Value::Integer(n) => n.checked_neg().map(Value::Integer).ok_or(HostError::Overflow),
        Value::Real(r) => Ok(Value::Real(-r)),
        _ => {
            Err(HostError::TypeMismatch { details: format!("expected a number, found {}",
                                                           value.type_name()), })
        },
    }
}

/// Boolean negation.
pub fn not(value: &Value) -> Result<Value, HostError> {
    Ok(Value::Bool(!value.as_bool()?))
}

/// Factorial of a non-negative integer, with checked multiplication.
pub fn factorial(value: &Value) -> Result<Value, HostError> {
    let n = value.as_integer()?;
    if n < 0 {
        return Err(HostError::InvalidArgument { details: format!("factorial is not defined for negative integer {n}"), });
    }

    let mut result: i64 = 1;
    let mut current = n;
    while current > 1 {
        result = result.checked_mul(current).ok_or(HostError::Overflow)?;
        current -= 1;
    }
    Ok(Value::Integer(result))
}

/// Defines the standard infix operators by generating a lookup table and a
/// name list.
///
/// Each entry provides a spelling, a precedence (smaller binds tighter; ties
/// associate to the left) and a function pointer implementing the operator.
macro_rules! infix_operators {
    (
        $(
            $symbol:literal => {
                precedence: $prec:expr,
                apply: $func:expr $(,)?
            }
        ),* $(,)?
    ) => {
        static INFIX_TABLE: &[InfixOp] = &[
            $(
                InfixOp { symbol: $symbol, precedence: $prec, apply: $func },
            )*
        ];
        /// Spellings of the standard infix operators.
        pub const INFIX_SYMBOLS: &[&str] = &[
            $($symbol,)*
        ];
    };
}

/// Defines the standard prefix operators.
macro_rules! prefix_operators {
    ( $( $symbol:literal => $func:expr ),* $(,)? ) => {
        static PREFIX_TABLE: &[PrefixOp] = &[
            $(
                PrefixOp { symbol: $symbol, apply: $func },
            )*
        ];
    };
}

/// Defines the standard postfix operators.
macro_rules! postfix_operators {
    ( $( $symbol:literal => $func:expr ),* $(,)? ) => {
        static POSTFIX_TABLE: &[PostfixOp] = &[
            $(
                PostfixOp { symbol: $symbol, apply: $func },
            )*
        ];
    };
}

infix_operators! {
    "^"  => { precedence: 2, apply: power },
    "*"  => { precedence: 3, apply: multiply },
    "/"  => { precedence: 3, apply: divide },
    "%"  => { precedence: 3, apply: modulo },
    "+"  => { precedence: 4, apply: add },
    "-"  => { precedence: 4, apply: subtract },
    "<"  => { precedence: 6, apply: less },
    ">"  => { precedence: 6, apply: greater },
    "<=" => { precedence: 6, apply: less_equal },
    ">=" => { precedence: 6, apply: greater_equal },
    "==" => { precedence: 7, apply: equal },
    "!=" => { precedence: 7, apply: not_equal },
}

prefix_operators! {
    "-" => negate,
    "!" => not,
}

postfix_operators! {
    "!" => factorial,
}

/// Looks up a standard infix operator by spelling.
///
/// ## Example
/// ```
/// use residua::ops;
///
/// let times = ops::infix("*").unwrap();
/// let plus = ops::infix("+").unwrap();
///
/// // `*` binds tighter than `+`.
/// assert!(times.precedence < plus.precedence);
/// ```
#[must_use]
pub fn infix(symbol: &str) -> Option<InfixOp> {
    INFIX_TABLE.iter().find(|op| op.symbol == symbol).copied()
}

/// Looks up a standard prefix operator by spelling.
#[must_use]
pub fn prefix(symbol: &str) -> Option<PrefixOp> {
    PREFIX_TABLE.iter().find(|op| op.symbol == symbol).copied()
}

/// Looks up a standard postfix operator by spelling.
#[must_use]
pub fn postfix(symbol: &str) -> Option<PostfixOp> {
    POSTFIX_TABLE.iter().find(|op| op.symbol == symbol).copied()
}

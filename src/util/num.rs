/// Largest signed integer exactly representable as an `f64` (`2^53 - 1`).
pub const MAX_SAFE_I64_INT: i64 = 9_007_199_254_740_991;

/// Safely converts an `i64` to `f64` if and only if it is exactly
/// representable.
///
/// ## Errors
/// Returns `Err(error)` if the value exceeds `MAX_SAFE_I64_INT` in absolute
/// value.
///
/// ## Example
/// ```
/// use residua::util::num::{MAX_SAFE_I64_INT, i64_to_f64_checked};
///
/// // Works for safe values
/// let result = i64_to_f64_checked(42, "too big!");
/// assert_eq!(result.unwrap(), 42.0);
///
/// // Fails for values outside the safe range
/// let big = MAX_SAFE_I64_INT + 1;
/// assert!(i64_to_f64_checked(big, "too big!").is_err());
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn i64_to_f64_checked<E>(value: i64, error: E) -> Result<f64, E> {
    if value.unsigned_abs() > MAX_SAFE_I64_INT.unsigned_abs() {
        return Err(error);
    }
    Ok(value as f64)
}

/// Safely converts an `i64` to a `usize` if and only if it can be
/// represented exactly.
///
/// ## Errors
/// Returns `Err(error)` if the value is negative or exceeds the maximum
/// representable `usize`.
///
/// ## Example
/// ```
/// use residua::util::num::i64_to_usize_checked;
///
/// assert_eq!(i64_to_usize_checked(42, "bad index"), Ok(42));
/// assert!(i64_to_usize_checked(-1, "bad index").is_err());
/// ```
pub fn i64_to_usize_checked<E>(value: i64, error: E) -> Result<usize, E> {
    usize::try_from(value).map_err(|_| error)
}

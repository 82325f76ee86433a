/// Host-side call failures.
///
/// Defines the errors a host operation can raise on its own: arithmetic
/// faults, type mismatches, missing members, failed overload selection and
/// indexing faults. Host errors carry no source location; the reducer attaches
/// the span of the offending operand when it surfaces them.
pub mod host_error;
/// Reduction errors.
///
/// Contains all error kinds the reducer can raise, from unresolved names in a
/// final pass to precedence and dispatch faults. Every variant carries the
/// offset and length of the narrowest responsible node in the original
/// source.
pub mod reduce_error;

pub use host_error::HostError;
pub use reduce_error::ReduceError;

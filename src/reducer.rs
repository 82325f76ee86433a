/// The binding environment.
///
/// Maps names to binding contents: values promised for a later pass, node
/// factories that stamp the use site's span, and weak lambda self-references
/// for recursive `let` bindings.
pub mod bindings;
/// Core reduction logic and the list walker.
///
/// Contains the reducer state and the driver that walks a node list with a
/// LIFO left stack and a FIFO right queue, trying single-node, pairwise and
/// precedence rewrites in order.
pub mod core;
/// Final-result extraction.
///
/// Turns the residual of a finished final reduction into a host value, or
/// reports what was left over.
pub mod extract;
/// Pairwise rewrite rules.
///
/// Rewrites two adjacent nodes into one based on their shapes: operator
/// application, member dispatch, invocation, construction, indexing and
/// partial application.
pub mod pairwise;
/// Reduction settings.
///
/// Enumerated options controlling global binding, catch-all strictness,
/// namespace search and seeded bindings.
pub mod settings;
/// Single-node rewrite rules.
///
/// Rewrites one node in isolation: environment lookup, container
/// normalization, generator expansion, conditional selection, short-circuit
/// connectives and lambda execution.
pub mod single;
/// The precedence triple rewrite.
///
/// Folds `value op value` once the upcoming operator no longer binds
/// tighter. Active only in final reduction.
pub mod triple;

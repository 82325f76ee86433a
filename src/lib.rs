//! # residua
//!
//! residua is a partial-evaluation reducer for a small embedded expression
//! language. It consumes an already-parsed expression tree plus a binding
//! environment and repeatedly rewrites the tree toward a single value, or
//! toward a residual tree when some inputs are still to come. The language
//! covers method, property and constructor invocation against a host object
//! model, operators with precedence, short-circuit connectives, conditional
//! expressions, numeric generator sequences, lambdas with partial application
//! and recursion, `let` bindings with lexical scoping, tuples, arrays, sets
//! and indexed access.

#![warn(
    clippy::redundant_clone,
    clippy::needless_pass_by_value,
    clippy::similar_names,
    clippy::large_enum_variant,
    clippy::string_lit_as_bytes,
    clippy::match_same_arms,
    clippy::cargo,
    clippy::nursery,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    clippy::correctness,
    clippy::complexity,
    clippy::pedantic,
    //missing_docs,
)]
#![allow(clippy::missing_errors_doc)]

use crate::{
    ast::Node,
    host::{object::HostInterop, value::Value},
    reducer::{
        bindings::Bindings,
        core::{ReduceResult, Reducer},
        extract::extract_result,
        settings::ReduceSettings,
    },
};

/// Defines the structure of reducible expressions.
///
/// This module declares the `Node` type and the `ExprKind` sum that
/// represent expressions as a tree of rewritable nodes. Every node carries
/// the offset and length of its source span, preserved across rewrites for
/// diagnostics.
///
/// # Responsibilities
/// - Defines node kinds for all language constructs, dispatch markers and
///   host-member handles.
/// - Attaches source spans to nodes and extends them monotonically across
///   rewrites.
/// - Defines lambda records with captured environments and weak recursive
///   self-references.
pub mod ast;
/// Compiled expressions.
///
/// Couples the residual of a non-final template pass with its environment so
/// the expression can be invoked repeatedly, and concurrently, with
/// per-invocation inputs.
///
/// # Responsibilities
/// - Runs the template pass over declared inputs and seed bindings.
/// - Copies the environment per invocation and runs the final pass.
/// - Extracts the final value.
pub mod compile;
/// Provides unified error types for reduction and host calls.
///
/// This module defines all errors that can be raised while reducing an
/// expression tree or calling into the host object model. It standardizes
/// error reporting and carries detailed information about failures,
/// including error kinds, descriptions, and source spans for debugging and
/// user feedback.
///
/// # Responsibilities
/// - Defines error enums for reduction failures and host-side failures.
/// - Attaches source offsets and lengths for context.
/// - Supports integration with standard error handling traits.
pub mod error;
/// The host object model.
///
/// Declares runtime values, lazy sequences, set elements, member handles,
/// the interop contract the reducer dispatches through, and a registry-based
/// implementation of that contract.
///
/// # Responsibilities
/// - Defines the `Value` enum and supporting value types.
/// - Declares the `HostInterop` collaborator interface.
/// - Provides the type registry with cached member resolution.
pub mod host;
/// Standard operator tables.
///
/// Host-supplied operator functions for the standard arithmetic, comparison
/// and logical spellings, with precedences. The reducer consumes whatever
/// operator nodes the tree carries; these tables are the stock set a
/// frontend would put there.
///
/// # Responsibilities
/// - Implements the standard operator semantics over host values.
/// - Declares precedence so ties associate left and `*` binds before `+`.
/// - Exposes lookup by spelling.
pub mod ops;
/// Orchestrates the reduction of expression trees.
///
/// This module ties together the binding environment, the single-node,
/// pairwise and precedence rewrite rules, and the list walker that drives
/// them to a fixpoint. It exposes the reducer for both tolerant template
/// passes and strict final passes.
///
/// # Responsibilities
/// - Coordinates all rewrite rules over a LIFO/FIFO node zipper.
/// - Manages environments, lexical scoping and recursive bindings.
/// - Surfaces reduction errors with source spans.
pub mod reducer;
/// General utilities for safe numeric conversion.
///
/// This module provides reusable helpers and conversion routines used
/// throughout the reducer and the host model.
///
/// # Responsibilities
/// - Safely convert between `i64`, `usize`, and `f64` without silent data
///   loss.
pub mod util;

/// Reduces an expression tree to a value in one final pass.
///
/// This is the convenience entry point for trees with no deferred inputs:
/// seed bindings from the settings are applied, the tree is reduced in final
/// mode, and the result is extracted. Use [`compile::CompiledExpr`] when
/// some inputs arrive later or the expression is evaluated more than once.
///
/// # Errors
/// Returns an error if any name fails to resolve, a host call fails, or the
/// reduction does not end in a single value.
///
/// # Examples
/// ```
/// use residua::{
///     ast::{ExprKind, Node},
///     host::{registry::HostRegistry, value::Value},
///     ops,
///     reducer::settings::ReduceSettings,
/// };
///
/// // 1 + 2 * 3
/// let plus = ops::infix("+").unwrap();
/// let times = ops::infix("*").unwrap();
/// let root =
///     Node::new(0,
///               9,
///               ExprKind::SubExpression(vec![Node::obj(0, 1, 1i64),
///                                            Node::new(2, 1, ExprKind::Infix(plus)),
///                                            Node::obj(4, 1, 2i64),
///                                            Node::new(6, 1, ExprKind::Infix(times)),
///                                            Node::obj(8, 1, 3i64)]));
///
/// let registry = HostRegistry::with_standard_types();
/// let result = residua::evaluate(root, &registry, &ReduceSettings::default()).unwrap();
///
/// assert_eq!(result, Value::Integer(7));
/// ```
pub fn evaluate(root: Node,
                host: &dyn HostInterop,
                settings: &ReduceSettings)
                -> ReduceResult<Value> {
    let mut bindings = Bindings::new();
    for (name, value) in &settings.additional_bindings {
        bindings.define_value(name, value.clone());
    }

    let reducer = Reducer::new(host, settings, true);
    let reduced = reducer.reduce(vec![root], &bindings)?;

    extract_result(&reduced)
}

use std::collections::VecDeque;

use log::trace;

use crate::{
    ast::{ExprKind, Node, Resolution},
    error::ReduceError,
    host::object::HostInterop,
    reducer::{bindings::Bindings, settings::ReduceSettings, triple::resolve_triple},
};

/// Result type used by the reducer.
///
/// All reduction functions return either a value of type `T` or a
/// `ReduceError` describing the failure.
pub type ReduceResult<T> = Result<T, ReduceError>;

/// Drives the reduction of expression node lists.
///
/// A reducer borrows the host it dispatches through, the settings of the
/// surrounding compilation, and a finality flag. Non-final reductions
/// tolerate promised-but-missing names and produce residual trees for later
/// passes; final reductions must resolve every name and raise diagnostics
/// when they cannot.
///
/// ## Usage
///
/// A `Reducer` is cheap to construct per pass. The same node list can be
/// reduced any number of times: reduction is deterministic, and reducing an
/// already-reduced residual with the same environment makes no further
/// progress.
pub struct Reducer<'h> {
    pub(crate) host:            &'h dyn HostInterop,
    pub(crate) settings:        &'h ReduceSettings,
    pub(crate) final_reduction: bool,
}

impl<'h> Reducer<'h> {
    /// Creates a reducer over a host and settings. `final_reduction` selects
    /// between the tolerant template pass and the strict final pass.
    #[must_use]
    pub const fn new(host: &'h dyn HostInterop,
                     settings: &'h ReduceSettings,
                     final_reduction: bool)
                     -> Self {
        Self { host,
               settings,
               final_reduction }
    }

    /// Reduces a node list under an environment until no rewrite applies.
    ///
    /// The walker keeps a LIFO stack of already-inspected nodes on its left
    /// and a queue of pending nodes on its right. Each step tries, in order:
    /// flattening trivial groupings, lifting pending nodes, expanding `let`
    /// bindings, the single-node resolver, the pairwise reducer, and (in
    /// final reduction) the precedence triple. When nothing applies, one
    /// node shifts from right to left. The walk ends when the right side is
    /// empty; the left stack, reversed, is the result in source order.
    ///
    /// The walk is iterative over the list, so list length never grows the
    /// call stack; only nesting depth recurses.
    ///
    /// # Parameters
    /// - `nodes`: The nodes to reduce, in source order.
    /// - `bindings`: The environment names resolve against.
    ///
    /// # Returns
    /// The residual nodes. A fully-reduced expression leaves exactly one
    /// `Obj` node.
    pub fn reduce(&self, nodes: Vec<Node>, bindings: &Bindings) -> ReduceResult<Vec<Node>> {
        let mut right: VecDeque<Node> = nodes.into_iter().map(Node::reopened).collect();
        let mut left: Vec<Node> = Vec::new();

        while let Some(node) = right.pop_front() {
            // Trivial groupings unwrap at both ends of the zipper.
            if let ExprKind::SubExpression(items) = &node.kind
               && items.len() == 1
            {
                right.push_front(items[0].clone());
                continue;
            }
            while let Some(top) = left.last()
                  && let ExprKind::SubExpression(items) = &top.kind
                  && items.len() == 1
            {
                let inner = items[0].clone();
                left.pop();
                left.push(inner);
            }

            // A node still pending from this pass moves left untouched; a
            // later pass reopens it.
            if matches!(node.resolution, Resolution::Unresolved) {
                trace!("lift: {}", node.kind_name());
                left.push(node);
                continue;
            }

            if let ExprKind::BVar { name, value, scope } = node.kind {
                trace!("binding: {name}");
                let scope_nodes = self.reduce_binding(&name, *value, *scope, bindings)?;
                for piece in scope_nodes.into_iter().rev() {
                    right.push_front(piece);
                }
                continue;
            }

            // A name right after a dispatch token is a member or type name,
            // not a variable reference; the pairwise rules own it.
            let names_a_member = matches!(node.kind, ExprKind::Unknown(_))
                                 && matches!(left.last().map(|top| &top.kind),
                                             Some(ExprKind::Invoke | ExprKind::New));

            if !names_a_member && let Some(stepped) = self.resolve_single(&node, bindings)? {
                trace!("single: {} -> {}", node.kind_name(), stepped.kind_name());
                right.push_front(stepped);
                continue;
            }

            if let Some(top) = left.last() {
                if let Some(merged) = self.resolve_pair(top, &node)? {
                    trace!("pair: ({}, {}) -> {}",
                           top.kind_name(),
                           node.kind_name(),
                           merged.kind_name());
                    left.pop();
                    right.push_front(merged);
                    continue;
                }
            }

            if self.final_reduction && left.len() >= 2 {
                let op = &left[left.len() - 1];
                let lhs = &left[left.len() - 2];
                if let Some(folded) = resolve_triple(lhs, op, &node, right.front())? {
                    trace!("triple: folded {}", folded.kind_name());
                    left.pop();
                    left.pop();
                    right.push_front(folded);
                    continue;
                }
            }

            left.push(node);
        }

        left.reverse();

        // The terminal catch-all: non-final reduction always hands residual
        // nodes back; final reduction does too unless the caller opted into
        // strictness.
        if self.final_reduction && self.settings.fail_on_catch_all && left.len() > 1 {
            let offset = left.iter().map(|n| n.offset).min().unwrap_or(0);
            let end = left.iter().map(Node::end).max().unwrap_or(offset);
            return Err(ReduceError::UnexpectedCase { trace: describe_nodes(&left),
                                                     offset,
                                                     length: end - offset });
        }

        Ok(left)
    }

    /// Expands a `let name = value in scope` binding.
    ///
    /// The bound expression reduces in the current environment, then the
    /// scope reduces with the binding added; the outer environment is left
    /// unchanged, so the binding is lexical. A non-final pass that binds a
    /// lambda additionally pre-reduces the lambda body (with parameter
    /// shadows stripped) and installs a self-reference so recursive calls in
    /// the body resolve to the lambda itself.
    fn reduce_binding(&self,
                      name: &str,
                      value: Node,
                      scope: Node,
                      bindings: &Bindings)
                      -> ReduceResult<Vec<Node>> {
        let (value_offset, value_length) = (value.offset, value.length);
        let reduced_value = self.reduce(vec![value], bindings)?;
        let bound = collapse(reduced_value, value_offset, value_length);

        if !self.final_reduction
           && let ExprKind::Lambda(lambda) = &bound.kind
        {
            let stripped = bindings.without_params(lambda.params());
            let body = lambda.body().clone();
            let (body_offset, body_length) = (body.offset, body.length);
            let reduced_body = self.reduce(vec![body], &stripped)?;
            let recursive = lambda.with_body(collapse(reduced_body, body_offset, body_length));
            recursive.install_self(name);

            let mut scoped = bindings.clone();
            scoped.define_node(name,
                               Node { offset:     bound.offset,
                                      length:     bound.length,
                                      resolution: bound.resolution,
                                      kind:       ExprKind::Lambda(recursive), });
            return self.reduce(vec![scope], &scoped);
        }

        let mut scoped = bindings.clone();
        scoped.define_node(name, bound);
        self.reduce(vec![scope], &scoped)
    }
}

/// Collapses a reduction result into one node: a singleton is itself,
/// anything else becomes a pending grouping spanning the original input.
pub(crate) fn collapse(mut nodes: Vec<Node>, offset: u32, length: u32) -> Node {
    if nodes.len() == 1 {
        return nodes.remove(0);
    }
    Node::new(offset, length, ExprKind::SubExpression(nodes)).unresolved()
}

/// Renders a node list as a compact kind listing for diagnostics.
pub(crate) fn describe_nodes(nodes: &[Node]) -> String {
    nodes.iter()
         .map(Node::kind_name)
         .collect::<Vec<_>>()
         .join(" ")
}

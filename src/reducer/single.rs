use std::collections::HashSet;

use crate::{
    ast::{ExprKind, LambdaExpr, Node, Resolution},
    error::ReduceError,
    host::{sequence::NumericSequence, set_value::SetValue, value::Value},
    reducer::{
        bindings::Bindings,
        core::{Reducer, ReduceResult, collapse},
    },
};

impl Reducer<'_> {
    /// Rewrites one node in isolation, or returns `None` when no rule
    /// applies.
    ///
    /// The span of the output equals the input's span unless a container
    /// expands. Already-resolved nodes are final and never rewritten again.
    pub(crate) fn resolve_single(&self,
                                 node: &Node,
                                 bindings: &Bindings)
                                 -> ReduceResult<Option<Node>> {
        if matches!(node.resolution, Resolution::Resolved) {
            return Ok(None);
        }

        match &node.kind {
            // Host-call output normalizes before any other rule can see it.
            ExprKind::Returned(value) => {
                let normalized = self.host.normalize(value.clone());
                Ok(Some(Node::obj(node.offset, node.length, normalized)))
            },

            ExprKind::SubExpression(items) => {
                let reduced = self.reduce(items.clone(), bindings)?;
                if reduced.len() == 1 {
                    return Ok(Some(collapse(reduced, node.offset, node.length)));
                }
                Ok(Some(Node::new(node.offset,
                                  node.length,
                                  ExprKind::SubExpression(reduced)).unresolved()))
            },

            ExprKind::Tuple(items) => self.resolve_container(node, items, bindings, |children| {
                                              ExprKind::Tuple(children)
                                          }),
            ExprKind::IndexArgs(items) => {
                self.resolve_container(node, items, bindings, |children| {
                        ExprKind::IndexArgs(children)
                    })
            },

            ExprKind::ArrayBuilder(items) => self.resolve_array(node, items, bindings),
            ExprKind::SetBuilder(items) => self.resolve_set(node, items, bindings),

            ExprKind::Unknown(name) => self.resolve_unknown(node, name, bindings),

            ExprKind::Generator { start, step, end } => {
                self.resolve_generator(node, start, step, end, bindings)
            },

            ExprKind::IfThenElse { condition,
                                   then_branch,
                                   else_branch, } => {
                self.resolve_conditional(node, condition, then_branch, else_branch, bindings)
            },

            ExprKind::Lambda(lambda) if lambda.is_saturated() => {
                self.execute_lambda(lambda, bindings)
            },

            ExprKind::And { left, right } => {
                self.resolve_connective(node, left, right, bindings, true)
            },
            ExprKind::Or { left, right } => {
                self.resolve_connective(node, left, right, bindings, false)
            },

            ExprKind::AppliedProperty(target, property) => {
                let value = property.read(target)
                                    .map_err(|error| ReduceError::HostCall { error,
                                                                             offset: node.offset,
                                                                             length: node.length })?;
                Ok(Some(Node::new(node.offset, node.length, ExprKind::Returned(value))))
            },

            ExprKind::AppliedMultiProperty(targets) => {
                let mut values = Vec::with_capacity(targets.len());
                for (target, property) in targets {
                    let value =
                        property.read(target)
                                .map_err(|error| ReduceError::HostCall { error,
                                                                         offset: node.offset,
                                                                         length: node.length })?;
                    values.push(self.host.normalize(value));
                }
                Ok(Some(Node::new(node.offset,
                                  node.length,
                                  ExprKind::Returned(Value::from(values)))))
            },

            _ => Ok(None),
        }
    }

    /// Reduces one child expression to a single node.
    fn reduce_child(&self, child: Node, bindings: &Bindings) -> ReduceResult<Node> {
        let (offset, length) = (child.offset, child.length);
        let reduced = self.reduce(vec![child], bindings)?;
        Ok(collapse(reduced, offset, length))
    }

    /// Reduces every child of a tuple-like container and tags the rebuilt
    /// container `Resolved` when each child became a value.
    fn resolve_container(&self,
                         node: &Node,
                         items: &[Node],
                         bindings: &Bindings,
                         rebuild: impl FnOnce(Vec<Node>) -> ExprKind)
                         -> ReduceResult<Option<Node>> {
        let mut children = Vec::with_capacity(items.len());
        for child in items {
            children.push(self.reduce_child(child.clone(), bindings)?);
        }

        let all_values = children.iter().all(Node::is_obj);
        let rebuilt = Node::new(node.offset, node.length, rebuild(children));
        Ok(Some(if all_values { rebuilt.resolved() } else { rebuilt.unresolved() }))
    }

    /// Reduces an array literal. Fully-reduced children collapse into a host
    /// array; anything pending re-emits the builder for a later pass.
    fn resolve_array(&self,
                     node: &Node,
                     items: &[Node],
                     bindings: &Bindings)
                     -> ReduceResult<Option<Node>> {
        let mut children = Vec::with_capacity(items.len());
        for child in items {
            children.push(self.reduce_child(child.clone(), bindings)?);
        }

        if children.iter().all(Node::is_obj) {
            let values: Vec<Value> = children.iter()
                                             .filter_map(|child| child.as_obj().cloned())
                                             .collect();
            return Ok(Some(Node::obj(node.offset, node.length, values)));
        }

        Ok(Some(Node::new(node.offset,
                          node.length,
                          ExprKind::ArrayBuilder(children)).unresolved()))
    }

    /// Reduces a set literal, mirroring arrays. Duplicate elements collapse.
    fn resolve_set(&self,
                   node: &Node,
                   items: &[Node],
                   bindings: &Bindings)
                   -> ReduceResult<Option<Node>> {
        let mut children = Vec::with_capacity(items.len());
        for child in items {
            children.push(self.reduce_child(child.clone(), bindings)?);
        }

        if children.iter().all(Node::is_obj) {
            let mut set = HashSet::with_capacity(children.len());
            for child in &children {
                if let Some(value) = child.as_obj() {
                    let element =
                        SetValue::try_from(value).map_err(|error| ReduceError::HostCall { error,
                                                                                          offset:
                                                                                              child.offset,
                                                                                          length:
                                                                                              child.length })?;
                    set.insert(element);
                }
            }
            return Ok(Some(Node::obj(node.offset, node.length, set)));
        }

        Ok(Some(Node::new(node.offset,
                          node.length,
                          ExprKind::SetBuilder(children)).unresolved()))
    }

    /// Looks a name up in the environment.
    ///
    /// Promised names stay in place during non-final passes and are an error
    /// in final reduction. Absent names are likewise a final-reduction error
    /// unless the name denotes a constructible type, which the pairwise
    /// rules handle.
    fn resolve_unknown(&self,
                       node: &Node,
                       name: &str,
                       bindings: &Bindings)
                       -> ReduceResult<Option<Node>> {
        match bindings.get(name) {
            Some(contents) => match contents.materialize(node.offset, node.length) {
                // A binding that reproduces the reference verbatim cannot
                // make progress; leave it for the residual.
                Some(found) if found.kind == node.kind => Ok(None),
                Some(found) => Ok(Some(found)),
                None if self.final_reduction => {
                    Err(ReduceError::UnboundName { name:   name.to_string(),
                                                   offset: node.offset,
                                                   length: node.length, })
                },
                None => Ok(None),
            },
            None if self.final_reduction
                    && !self.host.is_known_type(&self.settings.namespaces, name) =>
            {
                Err(ReduceError::UnknownName { name:   name.to_string(),
                                               offset: node.offset,
                                               length: node.length, })
            },
            None => Ok(None),
        }
    }

    /// Expands a generator into a lazy numeric sequence once all three
    /// bounds are values of the same numeric kind.
    fn resolve_generator(&self,
                         node: &Node,
                         start: &Node,
                         step: &Node,
                         end: &Node,
                         bindings: &Bindings)
                         -> ReduceResult<Option<Node>> {
        let start = self.reduce_child(start.clone(), bindings)?;
        let step = self.reduce_child(step.clone(), bindings)?;
        let end = self.reduce_child(end.clone(), bindings)?;

        if let (Some(from), Some(stride), Some(until)) =
            (start.as_obj(), step.as_obj(), end.as_obj())
        {
            let sequence = match (from, stride, until) {
                (Value::Integer(s), Value::Integer(st), Value::Integer(e)) => {
                    if *st == 0 {
                        return Err(ReduceError::GeneratorZeroStep { offset: node.offset,
                                                                    length: node.length, });
                    }
                    NumericSequence::integers(*s, *st, *e)
                },
                (Value::Real(s), Value::Real(st), Value::Real(e)) => {
                    if *st == 0.0 {
                        return Err(ReduceError::GeneratorZeroStep { offset: node.offset,
                                                                    length: node.length, });
                    }
                    NumericSequence::reals(*s, *st, *e)
                },
                (from, stride, until) => {
                    return Err(ReduceError::GeneratorTypeMismatch { details: format!("bounds are {}, {} and {}",
                                                                                     from.type_name(),
                                                                                     stride.type_name(),
                                                                                     until.type_name()),
                                                                    offset:  node.offset,
                                                                    length:  node.length, });
                },
            };
            return Ok(Some(Node::obj(node.offset, node.length, sequence)));
        }

        if self.final_reduction {
            return Err(ReduceError::GeneratorArgUnresolved { offset: node.offset,
                                                             length: node.length, });
        }

        Ok(Some(Node::new(node.offset,
                          node.length,
                          ExprKind::Generator { start: Box::new(start),
                                                step:  Box::new(step),
                                                end:   Box::new(end), }).unresolved()))
    }

    /// Selects a conditional branch once the condition is a boolean. The
    /// untaken branch is never evaluated.
    fn resolve_conditional(&self,
                           node: &Node,
                           condition: &Node,
                           then_branch: &Node,
                           else_branch: &Node,
                           bindings: &Bindings)
                           -> ReduceResult<Option<Node>> {
        let condition = self.reduce_child(condition.clone(), bindings)?;

        match condition.as_obj() {
            Some(Value::Bool(true)) => {
                Ok(Some(self.reduce_child(then_branch.clone(), bindings)?))
            },
            Some(Value::Bool(false)) => {
                Ok(Some(self.reduce_child(else_branch.clone(), bindings)?))
            },
            Some(_) => {
                Err(ReduceError::IfConditionNotBool { offset: condition.offset,
                                                      length: condition.length, })
            },
            None => {
                let then_branch = self.reduce_child(then_branch.clone(), bindings)?;
                let else_branch = self.reduce_child(else_branch.clone(), bindings)?;
                Ok(Some(Node::new(node.offset,
                                  node.length,
                                  ExprKind::IfThenElse { condition:   Box::new(condition),
                                                         then_branch: Box::new(then_branch),
                                                         else_branch: Box::new(else_branch), })
                        .unresolved()))
            },
        }
    }

    /// Executes a fully-applied lambda: the body reduces under the outer
    /// environment extended with the lambda's captured bindings (captures
    /// win). A body that does not collapse leaves the lambda pending.
    fn execute_lambda(&self,
                      lambda: &LambdaExpr,
                      bindings: &Bindings)
                      -> ReduceResult<Option<Node>> {
        let merged = bindings.merged(&lambda.bindings());
        let body = lambda.body().clone();
        let mut reduced = self.reduce(vec![body], &merged)?;

        if reduced.len() == 1 {
            return Ok(Some(reduced.remove(0)));
        }

        Ok(None)
    }

    /// Resolves a short-circuit connective. `conjunction` selects between
    /// `and` and `or`; the two are mirror images with null propagating
    /// through both.
    fn resolve_connective(&self,
                          node: &Node,
                          left: &Node,
                          right: &Node,
                          bindings: &Bindings,
                          conjunction: bool)
                          -> ReduceResult<Option<Node>> {
        let lhs = self.reduce_child(left.clone(), bindings)?;

        // The boolean that decides the result without looking right.
        let deciding = !conjunction;

        match lhs.as_obj() {
            Some(Value::Null) => Ok(Some(Node::obj(node.offset, node.length, Value::Null))),
            Some(Value::Bool(b)) if *b == deciding => {
                Ok(Some(Node::obj(node.offset, node.length, Value::Bool(*b))))
            },
            Some(Value::Bool(_)) => {
                let rhs = self.reduce_child(right.clone(), bindings)?;
                match rhs.as_obj() {
                    Some(Value::Bool(_) | Value::Null) => Ok(Some(rhs)),
                    Some(_) => Err(self.connective_rhs_error(conjunction, &rhs)),
                    None if self.final_reduction => {
                        Err(self.connective_rhs_error(conjunction, &rhs))
                    },
                    None => Ok(Some(self.rebuild_connective(node, lhs, rhs, conjunction))),
                }
            },
            Some(_) if self.final_reduction => {
                Err(self.connective_lhs_error(conjunction, &lhs))
            },
            None if self.final_reduction => Err(self.connective_lhs_error(conjunction, &lhs)),
            _ => {
                let rhs = self.reduce_child(right.clone(), bindings)?;
                Ok(Some(self.rebuild_connective(node, lhs, rhs, conjunction)))
            },
        }
    }

    fn rebuild_connective(&self, node: &Node, lhs: Node, rhs: Node, conjunction: bool) -> Node {
        let kind = if conjunction {
            ExprKind::And { left:  Box::new(lhs),
                            right: Box::new(rhs), }
        } else {
            ExprKind::Or { left:  Box::new(lhs),
                           right: Box::new(rhs), }
        };
        Node::new(node.offset, node.length, kind).unresolved()
    }

    fn connective_lhs_error(&self, conjunction: bool, operand: &Node) -> ReduceError {
        if conjunction {
            ReduceError::AndLhsNotBool { offset: operand.offset,
                                         length: operand.length, }
        } else {
            ReduceError::OrLhsNotBool { offset: operand.offset,
                                        length: operand.length, }
        }
    }

    fn connective_rhs_error(&self, conjunction: bool, operand: &Node) -> ReduceError {
        if conjunction {
            ReduceError::AndRhsNotBool { offset: operand.offset,
                                         length: operand.length, }
        } else {
            ReduceError::OrRhsNotBool { offset: operand.offset,
                                        length: operand.length, }
        }
    }
}

use crate::{
    ast::{ExprKind, InvokableExpr, Node, Resolution},
    error::{HostError, ReduceError},
    host::{
        object::{MethodHandle, ResolvedMember, StaticResolution},
        value::Value,
    },
    reducer::core::{Reducer, ReduceResult},
};

impl Reducer<'_> {
    /// Rewrites two adjacent nodes into one based on their shapes, or
    /// returns `None` when no rule applies.
    ///
    /// `left` is the newest node on the walker's left stack; `right` is the
    /// head of its pending queue. Every rewrite spans both inputs. Host-call
    /// failures surface with the span of the right-hand operand.
    pub(crate) fn resolve_pair(&self, left: &Node, right: &Node) -> ReduceResult<Option<Node>> {
        let globals_visible = self.final_reduction || self.settings.bind_globals_when_reducing;

        match (&left.kind, &right.kind) {
            (ExprKind::Obj(value), ExprKind::Postfix(op)) => {
                let result =
                    (op.apply)(value).map_err(|error| host_call(error, right))?;
                Ok(Some(Node::spanning(left, right, ExprKind::Returned(result))))
            },

            (ExprKind::Prefix(op), ExprKind::Obj(value)) => {
                let result =
                    (op.apply)(value).map_err(|error| host_call(error, right))?;
                Ok(Some(Node::spanning(left, right, ExprKind::Returned(result))))
            },

            (ExprKind::Invokable(InvokableExpr::AppliedMethod(target, overloads)), _) => {
                let Some(args) = call_args(right) else {
                    return Ok(None);
                };
                let result = invoke_overloads(target, overloads, &args, right)?;
                Ok(Some(Node::spanning(left, right, ExprKind::Returned(result))))
            },

            (ExprKind::Invokable(InvokableExpr::AppliedMultiMethod(targets)), _) => {
                let Some(args) = call_args(right) else {
                    return Ok(None);
                };
                let mut children = Vec::with_capacity(targets.len());
                for (target, overloads) in targets {
                    let result = invoke_overloads(target, overloads, &args, right)?;
                    children.push(Node::spanning(left,
                                                 right,
                                                 ExprKind::Obj(self.host.normalize(result))));
                }
                Ok(Some(Node::spanning(left, right, ExprKind::ArrayBuilder(children))))
            },

            (ExprKind::Unknown(type_name), ExprKind::AppliedInvoke { depth: 0, name })
                if globals_visible =>
            {
                self.resolve_static_member(type_name, name, left, right)
            },

            (ExprKind::Unknown(type_name), ExprKind::AppliedInvoke { depth, .. })
                if *depth > 0 && self.final_reduction =>
            {
                Err(ReduceError::StaticDepthUnsupported { name:   type_name.clone(),
                                                          offset: left.offset,
                                                          length: left.length, })
            },

            // `new T(...)` is sugar for `T(...)`.
            (ExprKind::New, ExprKind::Unknown(name)) => {
                Ok(Some(Node::spanning(left, right, ExprKind::Unknown(name.clone()))))
            },

            (ExprKind::Invoke, ExprKind::Unknown(name)) => {
                Ok(Some(Node::spanning(left,
                                       right,
                                       ExprKind::AppliedInvoke { depth: 0,
                                                                 name:  name.clone(), })))
            },

            // Dot-index syntax: the dot passes through to the indexing rule.
            (ExprKind::Invoke, ExprKind::IndexArgs(items)) => {
                let mut merged =
                    Node::spanning(left, right, ExprKind::IndexArgs(items.clone()));
                merged.resolution = right.resolution;
                Ok(Some(merged))
            },

            // A nested dot deepens the pending access.
            (ExprKind::Invoke, ExprKind::AppliedInvoke { depth, name }) => {
                Ok(Some(Node::spanning(left,
                                       right,
                                       ExprKind::AppliedInvoke { depth: depth + 1,
                                                                 name:  name.clone(), })))
            },

            // Member access on null propagates null without dispatch.
            (ExprKind::Obj(Value::Null), ExprKind::AppliedInvoke { .. }) => {
                Ok(Some(Node::spanning(left, right, ExprKind::Obj(Value::Null))))
            },

            (ExprKind::Obj(target), ExprKind::AppliedInvoke { depth: 0, name }) => {
                self.resolve_instance_member(target, name, left, right)
            },

            (ExprKind::Obj(target), ExprKind::AppliedInvoke { depth, name }) => {
                self.resolve_collection_member(*depth, target, name, left, right)
            },

            (ExprKind::AppliedIndexedProperty(target, handles), ExprKind::IndexArgs(items))
                if matches!(right.resolution, Resolution::Resolved) =>
            {
                let args = resolved_values(items);
                let handle = handles.iter()
                                    .find(|h| h.accepts(args.len()))
                                    .ok_or_else(|| {
                                        let name = handles.first()
                                                          .map_or("?", |h| h.name())
                                                          .to_string();
                                        host_call(HostError::NoMatchingOverload { name,
                                                                                  supplied:
                                                                                      args.len(), },
                                                  right)
                                    })?;
                let result = handle.call(target, &args)
                                   .map_err(|error| host_call(error, right))?;
                Ok(Some(Node::spanning(left, right, ExprKind::Returned(result))))
            },

            (ExprKind::Obj(target), ExprKind::IndexArgs(items))
                if matches!(right.resolution, Resolution::Resolved) =>
            {
                let args = resolved_values(items);
                let result = self.host
                                 .index(target, &args)
                                 .map_err(|error| host_call(error, right))?;
                Ok(Some(Node::spanning(left, right, ExprKind::Returned(result))))
            },

            (ExprKind::Unknown(type_name), ExprKind::Obj(value)) if globals_visible => {
                self.construct(type_name, &[value.clone()], left, right)
            },

            (ExprKind::Unknown(type_name), ExprKind::Tuple(items))
                if matches!(right.resolution, Resolution::Resolved) && globals_visible =>
            {
                self.construct(type_name, &resolved_values(items), left, right)
            },

            // Partial application: one argument binds the head parameter.
            (ExprKind::Lambda(lambda), ExprKind::Obj(value)) if !lambda.is_saturated() => {
                Ok(lambda.apply(value.clone())
                         .map(|applied| {
                             Node::spanning(left, right, ExprKind::Lambda(applied))
                         }))
            },

            _ => Ok(None),
        }
    }

    /// Resolves `Type.member` against the configured namespaces. Exactly one
    /// resolution is expected; several is an ambiguity, none is an error
    /// only in final reduction.
    fn resolve_static_member(&self,
                             type_name: &str,
                             member: &str,
                             left: &Node,
                             right: &Node)
                             -> ReduceResult<Option<Node>> {
        let found = self.host
                        .resolve_static(&self.settings.namespaces, type_name, member)
                        .map_err(|error| host_call(error, right))?;

        match found.as_slice() {
            [] => {
                if self.final_reduction {
                    return Err(ReduceError::UnknownName { name:   format!("{type_name}.{member}"),
                                                          offset: left.offset,
                                                          length: right.end() - left.offset, });
                }
                Ok(None)
            },
            [StaticResolution::Constant(value)] => {
                Ok(Some(Node::spanning(left, right, ExprKind::Returned(value.clone()))))
            },
            [StaticResolution::Methods(overloads)] => {
                let invokable =
                    InvokableExpr::AppliedMethod(Value::Null, overloads.clone());
                Ok(Some(Node::spanning(left, right, ExprKind::Invokable(invokable))))
            },
            _ => {
                Err(ReduceError::AmbiguousStatic { type_name: type_name.to_string(),
                                                   member:    member.to_string(),
                                                   offset:    left.offset,
                                                   length:    right.end() - left.offset, })
            },
        }
    }

    /// Resolves an instance member into the matching handle node.
    fn resolve_instance_member(&self,
                               target: &Value,
                               member: &str,
                               left: &Node,
                               right: &Node)
                               -> ReduceResult<Option<Node>> {
        let resolved = self.host
                           .resolve_instance_member(target, member)
                           .map_err(|error| host_call(error, right))?;

        let kind = match resolved {
            Some(ResolvedMember::Field(value)) => ExprKind::Obj(value),
            Some(ResolvedMember::Property(property)) => {
                ExprKind::AppliedProperty(target.clone(), property)
            },
            Some(ResolvedMember::IndexedProperty(handles)) => {
                ExprKind::AppliedIndexedProperty(target.clone(), handles)
            },
            Some(ResolvedMember::Methods(overloads)) => {
                ExprKind::Invokable(InvokableExpr::AppliedMethod(target.clone(), overloads))
            },
            None => {
                return Err(ReduceError::MemberNotFound { type_name: target.type_name()
                                                                          .to_string(),
                                                         member:    member.to_string(),
                                                         offset:    right.offset,
                                                         length:    right.length, });
            },
        };

        Ok(Some(Node::spanning(left, right, kind)))
    }

    /// Resolves a member `depth` collection levels down, broadcasting into a
    /// multi-target handle. Mixing properties and methods across elements is
    /// an error.
    fn resolve_collection_member(&self,
                                 depth: u32,
                                 target: &Value,
                                 member: &str,
                                 left: &Node,
                                 right: &Node)
                                 -> ReduceResult<Option<Node>> {
        let resolved = self.host
                           .resolve_depth_members(depth, target, member)
                           .map_err(|error| host_call(error, right))?;

        let mut properties = Vec::new();
        let mut methods = Vec::new();

        for (element, resolved_member) in resolved {
            match resolved_member {
                ResolvedMember::Property(property) => properties.push((element, property)),
                ResolvedMember::Methods(overloads) => methods.push((element, overloads)),
                ResolvedMember::Field(_) | ResolvedMember::IndexedProperty(_) => {
                    return Err(host_call(HostError::TypeMismatch { details: format!("member '{member}' cannot be broadcast across a collection"), },
                                         right));
                },
            }
        }

        let kind = match (properties.is_empty(), methods.is_empty()) {
            (false, true) | (true, true) => ExprKind::AppliedMultiProperty(properties),
            (true, false) => {
                ExprKind::Invokable(InvokableExpr::AppliedMultiMethod(methods))
            },
            (false, false) => {
                return Err(ReduceError::MixedMemberKinds { name:   member.to_string(),
                                                           offset: right.offset,
                                                           length: right.length, });
            },
        };

        Ok(Some(Node::spanning(left, right, kind)))
    }

    /// Dispatches a constructor call. An unknown type is only an error in
    /// final reduction; a non-final pass leaves the pair for a later one.
    fn construct(&self,
                 type_name: &str,
                 args: &[Value],
                 left: &Node,
                 right: &Node)
                 -> ReduceResult<Option<Node>> {
        let constructed = self.host
                              .construct(&self.settings.namespaces, type_name, args)
                              .map_err(|error| host_call(error, right))?;

        match constructed {
            Some(value) => Ok(Some(Node::spanning(left, right, ExprKind::Returned(value)))),
            None if self.final_reduction => {
                Err(ReduceError::ConstructorNotFound { type_name: type_name.to_string(),
                                                       offset:    left.offset,
                                                       length:    left.length, })
            },
            None => Ok(None),
        }
    }
}

/// Extracts call arguments from the node to the right of an invokable:
/// `Unit` is an empty call, a value is a single argument, a resolved tuple
/// spreads its values. Anything else is not yet callable.
fn call_args(right: &Node) -> Option<Vec<Value>> {
    match &right.kind {
        ExprKind::Unit => Some(Vec::new()),
        ExprKind::Obj(value) => Some(vec![value.clone()]),
        ExprKind::Tuple(items) if matches!(right.resolution, Resolution::Resolved) => {
            Some(resolved_values(items))
        },
        _ => None,
    }
}

/// Clones the values out of a resolved container. Resolved containers hold
/// only `Obj` children.
fn resolved_values(items: &[Node]) -> Vec<Value> {
    items.iter().filter_map(|item| item.as_obj().cloned()).collect()
}

/// Picks the overload matching the argument count and invokes it.
fn invoke_overloads(target: &Value,
                    overloads: &[MethodHandle],
                    args: &[Value],
                    right: &Node)
                    -> ReduceResult<Value> {
    let Some(handle) = overloads.iter().find(|m| m.accepts(args.len())) else {
        let name = overloads.first().map_or("?", MethodHandle::name).to_string();
        return Err(host_call(HostError::NoMatchingOverload { name,
                                                             supplied: args.len() },
                             right));
    };

    handle.call(target, args).map_err(|error| host_call(error, right))
}

/// Wraps a host failure with the span of the operand that triggered it.
fn host_call(error: HostError, operand: &Node) -> ReduceError {
    ReduceError::HostCall { error,
                            offset: operand.offset,
                            length: operand.length }
}

use std::{collections::HashMap, sync::Arc};

use crate::{
    ast::{ExprKind, LambdaExpr, Node, WeakLambda},
    host::value::Value,
};

/// A closure that reconstructs a bound node at a use site.
///
/// The factory receives the offset and length of the *use* site so that
/// errors raised through the binding point at the reference, not at the
/// definition.
pub type NodeFactory = Arc<dyn Fn(u32, u32) -> Node + Send + Sync>;

/// The contents of one environment entry.
#[derive(Clone)]
pub enum BindingContents {
    /// The name is promised but not yet supplied. Tolerated in non-final
    /// passes; a hard error in final reduction.
    ComingLater,
    /// The name is bound; the factory rebuilds the bound node with the use
    /// site's span.
    Existing(NodeFactory),
    /// A weak reference back to the lambda the entry lives in, installed to
    /// tie the knot for recursive `let` bindings.
    SelfLambda(WeakLambda),
}

impl BindingContents {
    /// Produces the bound node with the given use-site span, or `None` for
    /// promises and dead self-references.
    #[must_use]
    pub fn materialize(&self, offset: u32, length: u32) -> Option<Node> {
        match self {
            Self::ComingLater => None,
            Self::Existing(factory) => Some(factory(offset, length)),
            Self::SelfLambda(weak) => {
                weak.upgrade().map(|inner| {
                                  Node::new(offset,
                                            length,
                                            ExprKind::Lambda(LambdaExpr::from_inner(inner)))
                              })
            },
        }
    }
}

impl PartialEq for BindingContents {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::ComingLater, Self::ComingLater) => true,
            (Self::Existing(a), Self::Existing(b)) => Arc::ptr_eq(a, b),
            (Self::SelfLambda(a), Self::SelfLambda(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for BindingContents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ComingLater => write!(f, "ComingLater"),
            Self::Existing(_) => write!(f, "Existing(<factory>)"),
            Self::SelfLambda(_) => write!(f, "SelfLambda(<weak>)"),
        }
    }
}

/// The binding environment: an immutable-by-convention name map.
///
/// Environments are cheap to copy and are copied whenever a scope extends
/// them, so a binding is visible exactly where the language says it is.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Bindings {
    entries: HashMap<String, BindingContents>,
}

impl Bindings {
    /// Creates an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bound names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no names are bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BindingContents> {
        self.entries.get(name)
    }

    /// `true` when the name is bound or promised.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Binds a name to arbitrary contents.
    pub fn insert(&mut self, name: &str, contents: BindingContents) {
        self.entries.insert(name.to_string(), contents);
    }

    /// Promises a name for a later pass.
    pub fn declare_coming(&mut self, name: &str) {
        self.insert(name, BindingContents::ComingLater);
    }

    /// Binds a name to a host value.
    pub fn define_value(&mut self, name: &str, value: Value) {
        let factory: NodeFactory =
            Arc::new(move |offset, length| Node::obj(offset, length, value.clone()));
        self.insert(name, BindingContents::Existing(factory));
    }

    /// Binds a name to an already-reduced node. The node's kind and
    /// resolution are kept; the span is replaced with the use site's.
    pub fn define_node(&mut self, name: &str, node: Node) {
        let kind = node.kind;
        let resolution = node.resolution;
        let factory: NodeFactory = Arc::new(move |offset, length| {
            Node { offset,
                   length,
                   resolution,
                   kind: kind.clone() }
        });
        self.insert(name, BindingContents::Existing(factory));
    }

    /// Installs a weak lambda self-reference under `name`.
    pub fn define_self_lambda(&mut self, name: &str, weak: WeakLambda) {
        self.insert(name, BindingContents::SelfLambda(weak));
    }

    /// Returns a copy extended with every entry of `overlay`; entries in
    /// `overlay` win on conflict.
    #[must_use]
    pub fn merged(&self, overlay: &Self) -> Self {
        let mut merged = self.clone();
        for (name, contents) in &overlay.entries {
            merged.entries.insert(name.clone(), contents.clone());
        }
        merged
    }

    /// Returns a copy with every entry named by `params` removed. Used to
    /// strip parameter shadows before pre-reducing a lambda body.
    #[must_use]
    pub fn without_params(&self, params: &[String]) -> Self {
        let mut stripped = self.clone();
        for param in params {
            stripped.entries.remove(param);
        }
        stripped
    }

    /// Returns a copy with weak self-references upgraded into regular
    /// bindings. Dead references are dropped.
    ///
    /// Partial application snapshots its parent's environment through this,
    /// which keeps the parent lambda alive for as long as the derived lambda
    /// can still call it.
    #[must_use]
    pub fn strengthened(&self) -> Self {
        let mut strengthened = Self::new();

        for (name, contents) in &self.entries {
            match contents {
                BindingContents::SelfLambda(weak) => {
                    if let Some(inner) = weak.upgrade() {
                        let lambda = LambdaExpr::from_inner(inner);
                        strengthened.define_node(name,
                                                 Node::new(0, 0, ExprKind::Lambda(lambda)));
                    }
                },
                other => strengthened.insert(name, other.clone()),
            }
        }

        strengthened
    }
}

use std::sync::{Arc, RwLock, Weak};

use crate::{
    error::HostError,
    host::{
        object::{IndexerHandle, MethodHandle, PropertyHandle},
        value::Value,
    },
    reducer::bindings::Bindings,
};

/// Signature of a host-supplied unary operator function.
pub type UnaryFn = fn(&Value) -> Result<Value, HostError>;
/// Signature of a host-supplied binary operator function.
pub type BinaryFn = fn(&Value, &Value) -> Result<Value, HostError>;

/// A prefix operator token carrying its host function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixOp {
    /// The operator spelling, used in diagnostics.
    pub symbol: &'static str,
    /// The host function applied to the operand.
    pub apply:  UnaryFn,
}

/// A postfix operator token carrying its host function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostfixOp {
    /// The operator spelling, used in diagnostics.
    pub symbol: &'static str,
    /// The host function applied to the operand.
    pub apply:  UnaryFn,
}

/// An infix operator token carrying its precedence and host function.
///
/// A smaller precedence value binds tighter. Operators of equal precedence
/// associate to the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfixOp {
    /// The operator spelling, used in diagnostics.
    pub symbol:     &'static str,
    /// Binding strength; smaller binds tighter.
    pub precedence: i32,
    /// The host function applied to the operands.
    pub apply:      BinaryFn,
}

/// Resolution state of a node across reduction passes.
///
/// The reducer tags container nodes instead of wrapping them: a `Resolved`
/// container's immediate children are all host values, while an `Unresolved`
/// node was attempted during the current pass and still depends on inputs
/// that have not arrived yet. Unresolved input is reopened at the start of
/// every pass, which is what makes residual trees reducible later without
/// looping within a single pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    /// Not yet attempted in the current pass.
    #[default]
    Open,
    /// Fully resolved; container children are all `Obj`.
    Resolved,
    /// Attempted this pass; still depends on unresolved inputs.
    Unresolved,
}

/// An expression node: a kind plus the source span it was parsed from.
///
/// The span is preserved across rewrites so that errors raised late in
/// reduction still point at the original source. A rewrite of two adjacent
/// nodes into one spans from the earlier offset through the later end.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Byte offset of the node in the original source.
    pub offset:     u32,
    /// Byte length of the node in the original source.
    pub length:     u32,
    /// Resolution state; see [`Resolution`].
    pub resolution: Resolution,
    /// The node kind.
    pub kind:       ExprKind,
}

impl Node {
    /// Creates a node with the given span and kind, in the `Open` state.
    ///
    /// ## Example
    /// ```
    /// use residua::ast::{ExprKind, Node, Resolution};
    ///
    /// let node = Node::new(3, 4, ExprKind::Unit);
    ///
    /// assert_eq!(node.offset, 3);
    /// assert_eq!(node.length, 4);
    /// assert_eq!(node.resolution, Resolution::Open);
    /// ```
    #[must_use]
    pub const fn new(offset: u32, length: u32, kind: ExprKind) -> Self {
        Self { offset,
               length,
               resolution: Resolution::Open,
               kind }
    }

    /// Creates an `Obj` node holding a host value.
    ///
    /// ## Example
    /// ```
    /// use residua::{ast::Node, host::value::Value};
    ///
    /// let node = Node::obj(0, 2, 42i64);
    /// assert_eq!(node.as_obj(), Some(&Value::Integer(42)));
    /// ```
    #[must_use]
    pub fn obj(offset: u32, length: u32, value: impl Into<Value>) -> Self {
        Self::new(offset, length, ExprKind::Obj(value.into()))
    }

    /// Creates a node covering the spans of two adjacent nodes.
    ///
    /// The result starts at the earlier offset and ends at the later end, so
    /// rewrites extend spans monotonically.
    #[must_use]
    pub fn spanning(left: &Self, right: &Self, kind: ExprKind) -> Self {
        let offset = left.offset.min(right.offset);
        let end = left.end().max(right.end());
        Self::new(offset, end - offset, kind)
    }

    /// One past the last source byte covered by this node.
    #[must_use]
    pub const fn end(&self) -> u32 {
        self.offset + self.length
    }

    /// Tags the node as fully resolved.
    #[must_use]
    pub const fn resolved(mut self) -> Self {
        self.resolution = Resolution::Resolved;
        self
    }

    /// Tags the node as attempted-but-pending for the current pass.
    #[must_use]
    pub const fn unresolved(mut self) -> Self {
        self.resolution = Resolution::Unresolved;
        self
    }

    /// Clears a pending marker so a new pass may attempt the node again.
    /// Resolved nodes stay resolved.
    #[must_use]
    pub fn reopened(mut self) -> Self {
        if matches!(self.resolution, Resolution::Unresolved) {
            self.resolution = Resolution::Open;
        }
        self
    }

    /// Returns the held host value if this is an `Obj` node.
    #[must_use]
    pub const fn as_obj(&self) -> Option<&Value> {
        match &self.kind {
            ExprKind::Obj(value) => Some(value),
            _ => None,
        }
    }

    /// Returns `true` if this is an `Obj` node.
    #[must_use]
    pub const fn is_obj(&self) -> bool {
        matches!(self.kind, ExprKind::Obj(_))
    }

    /// A short name for the node kind, used in traces and diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match &self.kind {
            ExprKind::Unit => "unit",
            ExprKind::Obj(_) => "value",
            ExprKind::Unknown(_) => "unknown",
            ExprKind::Returned(_) => "returned",
            ExprKind::Invoke => "invoke",
            ExprKind::New => "new",
            ExprKind::AppliedInvoke { .. } => "applied-invoke",
            ExprKind::Prefix(_) => "prefix-op",
            ExprKind::Postfix(_) => "postfix-op",
            ExprKind::Infix(_) => "infix-op",
            ExprKind::IndexArgs(_) => "index-args",
            ExprKind::AppliedProperty(..) => "applied-property",
            ExprKind::AppliedMultiProperty(_) => "applied-multi-property",
            ExprKind::AppliedIndexedProperty(..) => "applied-indexed-property",
            ExprKind::Invokable(_) => "invokable",
            ExprKind::SubExpression(_) => "sub-expression",
            ExprKind::Tuple(_) => "tuple",
            ExprKind::ArrayBuilder(_) => "array-builder",
            ExprKind::SetBuilder(_) => "set-builder",
            ExprKind::BVar { .. } => "binding",
            ExprKind::Lambda(_) => "lambda",
            ExprKind::IfThenElse { .. } => "if-then-else",
            ExprKind::Generator { .. } => "generator",
            ExprKind::And { .. } => "and",
            ExprKind::Or { .. } => "or",
        }
    }
}

/// The closed sum of expression node kinds.
///
/// Leaves, dispatch markers, host-member handles and composites all live in
/// one enum so that the pairwise reducer can match on adjacent shapes
/// directly.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Empty argument marker produced by `()` call syntax.
    Unit,
    /// A fully-resolved host value.
    Obj(Value),
    /// An identifier not yet resolved from the environment.
    Unknown(String),
    /// Raw output of a host call; normalized to `Obj` by the resolver before
    /// any other rule inspects it.
    Returned(Value),
    /// The `.` dispatch token.
    Invoke,
    /// The constructor keyword token; purely syntactic sugar.
    New,
    /// A pending `.name` suffix waiting for a left-hand target.
    AppliedInvoke {
        /// How many nested-collection levels to descend before applying the
        /// member on each element.
        depth: u32,
        /// The member name.
        name:  String,
    },
    /// A host-supplied prefix operator.
    Prefix(PrefixOp),
    /// A host-supplied postfix operator.
    Postfix(PostfixOp),
    /// A host-supplied infix operator with precedence.
    Infix(InfixOp),
    /// Bracketed index arguments, unresolved form.
    IndexArgs(Vec<Node>),
    /// A resolved property handle bound to its target.
    AppliedProperty(Value, PropertyHandle),
    /// Property handles bound per element of a descended collection.
    AppliedMultiProperty(Vec<(Value, PropertyHandle)>),
    /// An indexed property bound to its target, awaiting index arguments.
    AppliedIndexedProperty(Value, Vec<IndexerHandle>),
    /// A resolved but not-yet-called method handle.
    Invokable(InvokableExpr),
    /// A parenthesised or synthetic grouping.
    SubExpression(Vec<Node>),
    /// A tuple of expressions, e.g. call arguments.
    Tuple(Vec<Node>),
    /// An array literal under construction.
    ArrayBuilder(Vec<Node>),
    /// A set literal under construction.
    SetBuilder(Vec<Node>),
    /// A lexical `let name = value in scope` binding.
    BVar {
        /// The bound name.
        name:  String,
        /// The bound expression.
        value: Box<Node>,
        /// The expression the binding is visible in.
        scope: Box<Node>,
    },
    /// A lambda abstraction; see [`LambdaExpr`].
    Lambda(LambdaExpr),
    /// A conditional expression. Only the selected branch is evaluated.
    IfThenElse {
        /// The condition; must reduce to a boolean.
        condition:   Box<Node>,
        /// Evaluated when the condition is true.
        then_branch: Box<Node>,
        /// Evaluated when the condition is false.
        else_branch: Box<Node>,
    },
    /// A numeric generator `{start .. step .. end}` producing a lazy
    /// sequence.
    Generator {
        /// First value of the sequence.
        start: Box<Node>,
        /// Stride between values; its sign sets the direction.
        step:  Box<Node>,
        /// Bound the sequence must not pass.
        end:   Box<Node>,
    },
    /// Short-circuit conjunction. The right side is not evaluated when the
    /// left side decides the result.
    And {
        /// Left operand.
        left:  Box<Node>,
        /// Right operand.
        right: Box<Node>,
    },
    /// Short-circuit disjunction. The right side is not evaluated when the
    /// left side decides the result.
    Or {
        /// Left operand.
        left:  Box<Node>,
        /// Right operand.
        right: Box<Node>,
    },
}

/// A resolved method handle awaiting its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum InvokableExpr {
    /// One target and its overload set.
    AppliedMethod(Value, Vec<MethodHandle>),
    /// One overload set per element of a descended collection; the eventual
    /// call is broadcast across all of them.
    AppliedMultiMethod(Vec<(Value, Vec<MethodHandle>)>),
}

/// A lambda abstraction with captured bindings.
///
/// The record is shared: partial application produces a new lambda with one
/// parameter fewer and an extended environment, while the original is left
/// untouched. Recursive `let` bindings install a weak self-reference into the
/// captured environment after construction, so there is no strong reference
/// cycle to leak; partial application strengthens that entry into a regular
/// binding, which keeps the parent lambda alive for as long as any derived
/// lambda can still call it.
#[derive(Debug, Clone)]
pub struct LambdaExpr {
    inner: Arc<LambdaInner>,
}

/// Shared lambda state behind [`LambdaExpr`].
#[derive(Debug)]
pub struct LambdaInner {
    params:   Vec<String>,
    bindings: RwLock<Bindings>,
    body:     Node,
}

impl LambdaExpr {
    /// Creates a lambda from its parameter list, captured bindings and body.
    #[must_use]
    pub fn new(params: Vec<String>, bindings: Bindings, body: Node) -> Self {
        Self { inner: Arc::new(LambdaInner { params,
                                             bindings: RwLock::new(bindings),
                                             body }), }
    }

    /// The remaining (not yet applied) parameter names.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.inner.params
    }

    /// The lambda body.
    #[must_use]
    pub fn body(&self) -> &Node {
        &self.inner.body
    }

    /// `true` once every parameter has been applied.
    #[must_use]
    pub fn is_saturated(&self) -> bool {
        self.inner.params.is_empty()
    }

    /// A snapshot of the captured bindings.
    #[must_use]
    pub fn bindings(&self) -> Bindings {
        self.inner
            .bindings
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Applies one argument, producing a lambda with one parameter fewer.
    ///
    /// The head parameter is bound to `value` in the copied environment. Weak
    /// self-references are strengthened in the copy so the parent lambda
    /// outlives every partial application derived from it.
    ///
    /// Returns `None` when the lambda is already saturated.
    #[must_use]
    pub fn apply(&self, value: Value) -> Option<Self> {
        let (param, rest) = self.inner.params.split_first()?;

        let mut bindings = self.bindings().strengthened();
        bindings.define_value(param, value);

        Some(Self::new(rest.to_vec(), bindings, self.inner.body.clone()))
    }

    /// Replaces the body, keeping parameters and bindings.
    #[must_use]
    pub fn with_body(&self, body: Node) -> Self {
        Self::new(self.inner.params.clone(), self.bindings(), body)
    }

    /// Installs a weak self-reference under `name` in the captured bindings,
    /// tying the knot for recursive `let` bindings.
    pub fn install_self(&self, name: &str) {
        let weak = Arc::downgrade(&self.inner);
        self.inner
            .bindings
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .define_self_lambda(name, weak);
    }

    /// Rebuilds a lambda from shared inner state. Used when a weak
    /// self-reference is looked up from the environment.
    #[must_use]
    pub(crate) fn from_inner(inner: Arc<LambdaInner>) -> Self {
        Self { inner }
    }
}

impl PartialEq for LambdaExpr {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
        || (self.params() == other.params()
            && self.body() == other.body()
            && self.bindings() == other.bindings())
    }
}

/// A non-owning reference to shared lambda state. Environments hold these
/// for recursive self-references so lambdas never form a strong cycle.
pub type WeakLambda = Weak<LambdaInner>;

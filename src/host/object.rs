use std::{any::Any, collections::HashSet, sync::Arc};

use crate::{error::HostError, host::value::Value};

/// Signature of a property getter.
pub type GetterFn = Arc<dyn Fn(&Value) -> Result<Value, HostError> + Send + Sync>;
/// Signature of a method implementation. Receives the target and the
/// evaluated arguments.
pub type MethodFn = Arc<dyn Fn(&Value, &[Value]) -> Result<Value, HostError> + Send + Sync>;
/// Signature of a constructor. Receives the evaluated arguments.
pub type CtorFn = Arc<dyn Fn(&[Value]) -> Result<Value, HostError> + Send + Sync>;
/// Signature of an indexer. Receives the target and the index arguments.
pub type IndexFn = Arc<dyn Fn(&Value, &[Value]) -> Result<Value, HostError> + Send + Sync>;

/// An opaque host instance: a registered type name plus shared state.
///
/// The state is downcast by the getters and methods registered for the type;
/// the reducer never looks inside it.
///
/// ## Example
/// ```
/// use residua::host::object::ObjectValue;
///
/// let object = ObjectValue::new("point", (3i64, 4i64));
///
/// assert_eq!(object.type_name(), "point");
/// assert_eq!(object.downcast_ref::<(i64, i64)>(), Some(&(3, 4)));
/// ```
#[derive(Clone)]
pub struct ObjectValue {
    type_name: Arc<str>,
    state:     Arc<dyn Any + Send + Sync>,
}

impl ObjectValue {
    /// Wraps host state under a registered type name.
    #[must_use]
    pub fn new<T: Any + Send + Sync>(type_name: &str, state: T) -> Self {
        Self { type_name: Arc::from(type_name),
               state:     Arc::new(state), }
    }

    /// The name the object's type was registered under.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Borrows the state as a concrete type, if it is one.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.state.downcast_ref::<T>()
    }
}

impl PartialEq for ObjectValue {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && Arc::ptr_eq(&self.state, &other.state)
    }
}

impl std::fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectValue")
         .field("type_name", &self.type_name)
         .finish_non_exhaustive()
    }
}

/// The span of argument counts a callable accepts, as an inclusive range.
///
/// ## Example
/// ```
/// use residua::host::object::Arity;
///
/// assert!(Arity::exactly(2).admits(2));
/// assert!(!Arity::exactly(2).admits(3));
/// assert!(Arity::between(1, 2).admits(1));
/// assert!(Arity::at_least(1).admits(40));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Arity {
    min: usize,
    max: usize,
}

impl Arity {
    /// Exactly `count` arguments.
    #[must_use]
    pub const fn exactly(count: usize) -> Self {
        Self { min: count,
               max: count }
    }

    /// Anywhere from `min` through `max` arguments.
    #[must_use]
    pub const fn between(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// `min` or more arguments, unbounded above.
    #[must_use]
    pub const fn at_least(min: usize) -> Self {
        Self { min,
               max: usize::MAX }
    }

    /// Whether a call supplying `supplied` arguments fits this arity.
    #[must_use]
    pub const fn admits(&self, supplied: usize) -> bool {
        self.min <= supplied && supplied <= self.max
    }
}

/// A resolved property getter bound to a type definition.
///
/// Handles compare by identity: resolving the same member through the same
/// registry twice yields equal handles.
#[derive(Clone)]
pub struct PropertyHandle {
    def: Arc<PropertyDef>,
}

/// The shared definition behind a [`PropertyHandle`].
pub struct PropertyDef {
    pub(crate) name:   String,
    pub(crate) getter: GetterFn,
}

impl PropertyHandle {
    /// Creates a handle from a name and a getter.
    #[must_use]
    pub fn new(name: &str, getter: GetterFn) -> Self {
        Self { def: Arc::new(PropertyDef { name: name.to_string(),
                                           getter }), }
    }

    /// The property name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Reads the property from a target value.
    pub fn read(&self, target: &Value) -> Result<Value, HostError> {
        (self.def.getter)(target)
    }
}

impl PartialEq for PropertyHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.def, &other.def)
    }
}

impl std::fmt::Debug for PropertyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PropertyHandle({})", self.def.name)
    }
}

/// A resolved method overload bound to a type definition.
///
/// Handles compare by identity, like [`PropertyHandle`].
#[derive(Clone)]
pub struct MethodHandle {
    def: Arc<MethodDef>,
}

/// The shared definition behind a [`MethodHandle`].
pub struct MethodDef {
    pub(crate) name:   String,
    pub(crate) arity:  Arity,
    pub(crate) invoke: MethodFn,
}

impl MethodHandle {
    /// Creates a handle from a name, arity constraint and implementation.
    #[must_use]
    pub fn new(name: &str, arity: Arity, invoke: MethodFn) -> Self {
        Self { def: Arc::new(MethodDef { name: name.to_string(),
                                         arity,
                                         invoke }), }
    }

    /// The method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Whether this overload accepts `n` arguments.
    #[must_use]
    pub fn accepts(&self, n: usize) -> bool {
        self.def.arity.admits(n)
    }

    /// Invokes the method on a target with evaluated arguments.
    pub fn call(&self, target: &Value, args: &[Value]) -> Result<Value, HostError> {
        (self.def.invoke)(target, args)
    }
}

impl PartialEq for MethodHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.def, &other.def)
    }
}

impl std::fmt::Debug for MethodHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MethodHandle({})", self.def.name)
    }
}

/// A resolved indexed property bound to a type definition.
///
/// An indexed property reads like a property but takes bracketed arguments,
/// e.g. `table.cell[2, 3]`.
#[derive(Clone)]
pub struct IndexerHandle {
    def: Arc<IndexerDef>,
}

/// The shared definition behind an [`IndexerHandle`].
pub struct IndexerDef {
    pub(crate) name:   String,
    pub(crate) arity:  Arity,
    pub(crate) invoke: IndexFn,
}

impl IndexerHandle {
    /// Creates a handle from a name, arity constraint and implementation.
    #[must_use]
    pub fn new(name: &str, arity: Arity, invoke: IndexFn) -> Self {
        Self { def: Arc::new(IndexerDef { name: name.to_string(),
                                          arity,
                                          invoke }), }
    }

    /// The indexed property name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Whether this overload accepts `n` index arguments.
    #[must_use]
    pub fn accepts(&self, n: usize) -> bool {
        self.def.arity.admits(n)
    }

    /// Reads the indexed property from a target with index arguments.
    pub fn call(&self, target: &Value, args: &[Value]) -> Result<Value, HostError> {
        (self.def.invoke)(target, args)
    }
}

impl PartialEq for IndexerHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.def, &other.def)
    }
}

impl std::fmt::Debug for IndexerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IndexerHandle({})", self.def.name)
    }
}

/// The outcome of resolving an instance member by name.
#[derive(Clone, Debug)]
pub enum ResolvedMember {
    /// An immediate value: the member needed no handle.
    Field(Value),
    /// A readable property.
    Property(PropertyHandle),
    /// An indexed property awaiting bracketed arguments.
    IndexedProperty(Vec<IndexerHandle>),
    /// A method overload set awaiting call arguments.
    Methods(Vec<MethodHandle>),
}

/// The outcome of resolving a static member in one namespace.
#[derive(Clone, Debug)]
pub enum StaticResolution {
    /// A constant value.
    Constant(Value),
    /// A static method overload set. Static methods ignore their target.
    Methods(Vec<MethodHandle>),
}

/// The collaborator interface through which the reducer touches the host
/// object model.
///
/// Implementations must be safe for concurrent readers; the reducer itself
/// is single-threaded but compiled expressions may be reduced from several
/// threads against one shared host.
pub trait HostInterop: Send + Sync {
    /// Resolves a member on a concrete instance. `Ok(None)` means the type
    /// has no such member.
    fn resolve_instance_member(&self,
                               target: &Value,
                               name: &str)
                               -> Result<Option<ResolvedMember>, HostError>;

    /// Resolves a static member of `type_name` across the configured
    /// namespaces. One entry per namespace that knows the member.
    fn resolve_static(&self,
                      namespaces: &HashSet<String>,
                      type_name: &str,
                      member: &str)
                      -> Result<Vec<StaticResolution>, HostError>;

    /// Whether `type_name` is registered in any of the given namespaces.
    fn is_known_type(&self, namespaces: &HashSet<String>, type_name: &str) -> bool;

    /// Constructs an instance of `type_name`. `Ok(None)` means no matching
    /// type or constructor exists in the given namespaces.
    fn construct(&self,
                 namespaces: &HashSet<String>,
                 type_name: &str,
                 args: &[Value])
                 -> Result<Option<Value>, HostError>;

    /// Indexes into a value with evaluated index arguments.
    fn index(&self, target: &Value, args: &[Value]) -> Result<Value, HostError>;

    /// Normalizes a raw host-call result into a canonical value. The default
    /// is the identity; hosts with sentinel null representations map them to
    /// [`Value::Null`] here.
    fn normalize(&self, value: Value) -> Value {
        value
    }

    /// Resolves a member `depth` collection levels below `target`, pairing
    /// each reached element with its resolved member.
    ///
    /// The default implementation descends arrays and resolves through
    /// [`resolve_instance_member`](Self::resolve_instance_member). Immediate
    /// field members cannot be broadcast and are reported as a type
    /// mismatch.
    fn resolve_depth_members(&self,
                             depth: u32,
                             target: &Value,
                             name: &str)
                             -> Result<Vec<(Value, ResolvedMember)>, HostError> {
        let Value::Array(items) = target else {
            return Err(HostError::TypeMismatch { details: format!("expected a collection to descend into, found {}",
                                                                  target.type_name()), });
        };

        let mut resolved = Vec::with_capacity(items.len());

        for item in items.iter() {
            if depth > 1 {
                resolved.extend(self.resolve_depth_members(depth - 1, item, name)?);
                continue;
            }

            match self.resolve_instance_member(item, name)? {
                Some(ResolvedMember::Field(_)) => {
                    return Err(HostError::TypeMismatch { details: format!("field member '{name}' cannot be broadcast across a collection"), });
                },
                Some(member) => resolved.push((item.clone(), member)),
                None => {
                    return Err(HostError::UnknownMember { type_name: item.type_name()
                                                                         .to_string(),
                                                          member:    name.to_string(), });
                },
            }
        }

        Ok(resolved)
    }
}

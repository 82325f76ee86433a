use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, RwLock},
};

use crate::{
    error::HostError,
    host::{
        object::{
            Arity, CtorFn, HostInterop, IndexFn, IndexerHandle, MethodHandle, PropertyHandle,
            ResolvedMember, StaticResolution,
        },
        value::Value,
    },
    util::num::i64_to_usize_checked,
};

/// A namespaced host type definition.
///
/// A type bundles an optional constructor, static members, instance
/// properties, indexed properties, method overloads and an optional default
/// indexer. Definitions are built fluently and registered into a
/// [`HostRegistry`].
///
/// ## Example
/// ```
/// use residua::host::{registry::TypeDef, value::Value};
///
/// let origin = TypeDef::new("", "origin").with_property("x", |_target| {
///                                            Ok(Value::Integer(0))
///                                        });
/// ```
pub struct TypeDef {
    namespace:   String,
    name:        String,
    constructor: Option<CtorFn>,
    statics:     HashMap<String, StaticResolution>,
    properties:  HashMap<String, PropertyHandle>,
    indexed:     HashMap<String, Vec<IndexerHandle>>,
    methods:     HashMap<String, Vec<MethodHandle>>,
    indexer:     Option<IndexFn>,
}

impl TypeDef {
    /// Creates an empty definition under a namespace. The empty string is
    /// the unqualified namespace.
    #[must_use]
    pub fn new(namespace: &str, name: &str) -> Self {
        Self { namespace:   namespace.to_string(),
               name:        name.to_string(),
               constructor: None,
               statics:     HashMap::new(),
               properties:  HashMap::new(),
               indexed:     HashMap::new(),
               methods:     HashMap::new(),
               indexer:     None, }
    }

    /// Sets the constructor.
    #[must_use]
    pub fn with_constructor(mut self,
                            ctor: impl Fn(&[Value]) -> Result<Value, HostError>
                                + Send
                                + Sync
                                + 'static)
                            -> Self {
        self.constructor = Some(Arc::new(ctor));
        self
    }

    /// Adds a readable instance property.
    #[must_use]
    pub fn with_property(mut self,
                         name: &str,
                         getter: impl Fn(&Value) -> Result<Value, HostError>
                             + Send
                             + Sync
                             + 'static)
                         -> Self {
        self.properties
            .insert(name.to_string(), PropertyHandle::new(name, Arc::new(getter)));
        self
    }

    /// Adds an indexed instance property overload.
    #[must_use]
    pub fn with_indexed_property(mut self,
                                 name: &str,
                                 arity: Arity,
                                 read: impl Fn(&Value, &[Value]) -> Result<Value, HostError>
                                     + Send
                                     + Sync
                                     + 'static)
                                 -> Self {
        self.indexed
            .entry(name.to_string())
            .or_default()
            .push(IndexerHandle::new(name, arity, Arc::new(read)));
        self
    }

    /// Adds an instance method overload.
    #[must_use]
    pub fn with_method(mut self,
                       name: &str,
                       arity: Arity,
                       invoke: impl Fn(&Value, &[Value]) -> Result<Value, HostError>
                           + Send
                           + Sync
                           + 'static)
                       -> Self {
        self.methods
            .entry(name.to_string())
            .or_default()
            .push(MethodHandle::new(name, arity, Arc::new(invoke)));
        self
    }

    /// Adds a static constant.
    #[must_use]
    pub fn with_static_value(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.statics
            .insert(name.to_string(), StaticResolution::Constant(value.into()));
        self
    }

    /// Adds a static method. Static methods receive a null target.
    #[must_use]
    pub fn with_static_method(mut self,
                              name: &str,
                              arity: Arity,
                              invoke: impl Fn(&Value, &[Value]) -> Result<Value, HostError>
                                  + Send
                                  + Sync
                                  + 'static)
                              -> Self {
        let handle = MethodHandle::new(name, arity, Arc::new(invoke));
        match self.statics.get_mut(name) {
            Some(StaticResolution::Methods(overloads)) => overloads.push(handle),
            _ => {
                self.statics
                    .insert(name.to_string(), StaticResolution::Methods(vec![handle]));
            },
        }
        self
    }

    /// Sets the default indexer applied by bracket access on instances.
    #[must_use]
    pub fn with_indexer(mut self,
                        index: impl Fn(&Value, &[Value]) -> Result<Value, HostError>
                            + Send
                            + Sync
                            + 'static)
                        -> Self {
        self.indexer = Some(Arc::new(index));
        self
    }
}

/// The concrete host object model: registered type definitions plus a
/// read-mostly cache for static member resolution.
///
/// A registry is built once, shared behind an `Arc` and read concurrently by
/// every reduction. The cache uses a coarse `RwLock`: lookups take the read
/// lock, the first resolution of a member takes the write lock to memoize.
pub struct HostRegistry {
    by_name:      HashMap<String, Vec<Arc<TypeDef>>>,
    qualified:    HashMap<(String, String), Arc<TypeDef>>,
    static_cache: RwLock<HashMap<(String, String), Vec<StaticResolution>>>,
}

impl Default for HostRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HostRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { by_name:      HashMap::new(),
               qualified:    HashMap::new(),
               static_cache: RwLock::new(HashMap::new()), }
    }

    /// Creates a registry preloaded with members for the primitive value
    /// types and a small `std` namespace.
    ///
    /// ## Example
    /// ```
    /// use residua::host::{object::HostInterop, registry::HostRegistry, value::Value};
    ///
    /// let registry = HostRegistry::with_standard_types();
    /// let member = registry.resolve_instance_member(&Value::from("abc"), "length")
    ///                      .unwrap();
    ///
    /// assert!(member.is_some());
    /// ```
    #[must_use]
    pub fn with_standard_types() -> Self {
        let mut registry = Self::new();

        registry.register(
            TypeDef::new("", "string")
                .with_property("length", |target| {
                    let s = target.as_str()?;
                    i64::try_from(s.len()).map(Value::Integer)
                                          .map_err(|_| HostError::Overflow)
                })
                .with_method("contains", Arity::exactly(1), |target, args| {
                    let s = target.as_str()?;
                    let needle = args[0].as_str()?;
                    Ok(Value::Bool(s.contains(needle)))
                })
                .with_method("to_upper", Arity::exactly(0), |target, _| {
                    Ok(Value::from(target.as_str()?.to_uppercase()))
                })
                .with_method("to_lower", Arity::exactly(0), |target, _| {
                    Ok(Value::from(target.as_str()?.to_lowercase()))
                }),
        );

        registry.register(
            TypeDef::new("", "array")
                .with_property("length", |target| {
                    let items = target.as_vec()?;
                    i64::try_from(items.len()).map(Value::Integer)
                                              .map_err(|_| HostError::Overflow)
                })
                .with_method("contains", Arity::exactly(1), |target, args| {
                    Ok(Value::Bool(target.as_vec()?.contains(&args[0])))
                }),
        );

        registry.register(TypeDef::new("", "sequence").with_method("to_array",
                                                                   Arity::exactly(0),
                                                                   |target, _| {
                                                                       match target {
                    Value::Seq(seq) => Ok(Value::from(seq.iter().collect::<Vec<_>>())),
                    _ => {
                        Err(HostError::TypeMismatch { details: format!("expected a sequence, found {}",
                                                                       target.type_name()), })
                    },
                }
                                                                   }));

        registry.register(
            TypeDef::new("std", "Math")
                .with_static_value("pi", std::f64::consts::PI)
                .with_static_value("e", std::f64::consts::E)
                .with_static_method("abs", Arity::exactly(1), |_, args| match &args[0] {
                    Value::Integer(n) => n.checked_abs()
                                          .map(Value::Integer)
                                          .ok_or(HostError::Overflow),
                    Value::Real(r) => Ok(Value::Real(r.abs())),
                    other => {
                        Err(HostError::TypeMismatch { details: format!("expected a number, found {}",
                                                                       other.type_name()), })
                    },
                })
                .with_static_method("min", Arity::exactly(2), |_, args| {
                    numeric_extreme(&args[0], &args[1], true)
                })
                .with_static_method("max", Arity::exactly(2), |_, args| {
                    numeric_extreme(&args[0], &args[1], false)
                })
                .with_static_method("sqrt", Arity::exactly(1), |_, args| {
                    Ok(Value::Real(args[0].as_real()?.sqrt()))
                }),
        );

        registry
    }

    /// Registers a type definition. A later registration under the same
    /// namespace and name replaces the earlier one for qualified lookups.
    pub fn register(&mut self, def: TypeDef) {
        let def = Arc::new(def);
        self.by_name
            .entry(def.name.clone())
            .or_default()
            .push(Arc::clone(&def));
        self.qualified
            .insert((def.namespace.clone(), def.name.clone()), def);
    }

    fn defs_for(&self, type_name: &str) -> &[Arc<TypeDef>] {
        self.by_name
            .get(type_name)
            .map_or(&[], Vec::as_slice)
    }
}

impl HostInterop for HostRegistry {
    fn resolve_instance_member(&self,
                               target: &Value,
                               name: &str)
                               -> Result<Option<ResolvedMember>, HostError> {
        for def in self.defs_for(target.type_name()) {
            if let Some(property) = def.properties.get(name) {
                return Ok(Some(ResolvedMember::Property(property.clone())));
            }
            if let Some(indexed) = def.indexed.get(name) {
                return Ok(Some(ResolvedMember::IndexedProperty(indexed.clone())));
            }
            if let Some(overloads) = def.methods.get(name) {
                return Ok(Some(ResolvedMember::Methods(overloads.clone())));
            }
        }
        Ok(None)
    }

    fn resolve_static(&self,
                      namespaces: &HashSet<String>,
                      type_name: &str,
                      member: &str)
                      -> Result<Vec<StaticResolution>, HostError> {
        let key = (type_name.to_string(), member.to_string());

        if let Some(cached) = self.static_cache
                                  .read()
                                  .unwrap_or_else(std::sync::PoisonError::into_inner)
                                  .get(&key)
        {
            return Ok(cached.clone());
        }

        let mut found = Vec::new();

        for namespace in sorted_namespaces(namespaces) {
            if let Some(def) = self.qualified
                                   .get(&(namespace.clone(), type_name.to_string()))
               && let Some(resolution) = def.statics.get(member)
            {
                found.push(resolution.clone());
            }
        }

        self.static_cache
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key, found.clone());

        Ok(found)
    }

    fn is_known_type(&self, namespaces: &HashSet<String>, type_name: &str) -> bool {
        namespaces.iter()
                  .any(|ns| {
                      self.qualified
                          .contains_key(&(ns.clone(), type_name.to_string()))
                  })
    }

    fn construct(&self,
                 namespaces: &HashSet<String>,
                 type_name: &str,
                 args: &[Value])
                 -> Result<Option<Value>, HostError> {
        for namespace in sorted_namespaces(namespaces) {
            if let Some(def) = self.qualified
                                   .get(&(namespace.clone(), type_name.to_string()))
               && let Some(ctor) = &def.constructor
            {
                return ctor(args).map(Some);
            }
        }

        Ok(None)
    }

    fn index(&self, target: &Value, args: &[Value]) -> Result<Value, HostError> {
        match target {
            Value::Array(items) => {
                let [index] = args else {
                    return Err(HostError::InvalidArgument { details: format!("array indexing takes one argument, found {}",
                                                                             args.len()), });
                };
                let raw = index.as_integer()?;
                let position = i64_to_usize_checked(raw,
                                                    HostError::IndexOutOfBounds { max:   items.len()
                                                                                             .saturating_sub(1),
                                                                                  found: raw, })?;

                items.get(position)
                     .cloned()
                     .ok_or(HostError::IndexOutOfBounds { max:   items.len().saturating_sub(1),
                                                          found: raw, })
            },
            Value::Str(s) => {
                let [index] = args else {
                    return Err(HostError::InvalidArgument { details: format!("string indexing takes one argument, found {}",
                                                                             args.len()), });
                };
                let raw = index.as_integer()?;
                let max = s.chars().count().saturating_sub(1);
                let position =
                    i64_to_usize_checked(raw, HostError::IndexOutOfBounds { max, found: raw })?;

                s.chars()
                 .nth(position)
                 .map(|c| Value::from(c.to_string()))
                 .ok_or(HostError::IndexOutOfBounds { max, found: raw })
            },
            Value::Object(_) => {
                for def in self.defs_for(target.type_name()) {
                    if let Some(indexer) = &def.indexer {
                        return indexer(target, args);
                    }
                }
                Err(HostError::NotIndexable { type_name: target.type_name().to_string(), })
            },
            _ => Err(HostError::NotIndexable { type_name: target.type_name().to_string(), }),
        }
    }
}

/// Namespaces come in as a hash set; searching them in sorted order keeps
/// resolution and tie-breaking stable across runs.
fn sorted_namespaces(namespaces: &HashSet<String>) -> Vec<&String> {
    let mut ordered: Vec<&String> = namespaces.iter().collect();
    ordered.sort();
    ordered
}

/// Picks the smaller or larger of two numbers, preserving integer-ness when
/// both sides are integers.
fn numeric_extreme(a: &Value, b: &Value, smaller: bool) -> Result<Value, HostError> {
    if let (Value::Integer(x), Value::Integer(y)) = (a, b) {
        let picked = if smaller { x.min(y) } else { x.max(y) };
        return Ok(Value::Integer(*picked));
    }

    let x = a.as_real()?;
    let y = b.as_real()?;
    Ok(Value::Real(if smaller { x.min(y) } else { x.max(y) }))
}

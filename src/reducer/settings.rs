use std::collections::{HashMap, HashSet};

use crate::host::value::Value;

/// Namespaces searched by default: the unqualified namespace plus the
/// standard host namespace.
pub const DEFAULT_NAMESPACES: &[&str] = &["", "std"];

/// Options controlling a reduction.
///
/// ## Example
/// ```
/// use residua::reducer::settings::ReduceSettings;
///
/// let settings = ReduceSettings::default().with_namespace("geometry");
///
/// assert!(settings.bind_globals_when_reducing);
/// assert!(settings.namespaces.contains("geometry"));
/// ```
#[derive(Debug, Clone)]
pub struct ReduceSettings {
    /// If true, static namespace lookups may occur in non-final passes,
    /// enabling constant folding of host constants. Defaults to true.
    pub bind_globals_when_reducing: bool,
    /// If true, a final reduction that leaves more than one residual node
    /// raises an error instead of returning the residual. Defaults to false.
    pub fail_on_catch_all: bool,
    /// Namespaces searched for static lookups and constructors.
    pub namespaces: HashSet<String>,
    /// Seed values injected into the environment before reduction.
    pub additional_bindings: HashMap<String, Value>,
}

impl Default for ReduceSettings {
    fn default() -> Self {
        Self { bind_globals_when_reducing: true,
               fail_on_catch_all:          false,
               namespaces:                 DEFAULT_NAMESPACES.iter()
                                                             .map(ToString::to_string)
                                                             .collect(),
               additional_bindings:        HashMap::new(), }
    }
}

impl ReduceSettings {
    /// Sets whether static lookups run in non-final passes.
    #[must_use]
    pub const fn with_bind_globals(mut self, enabled: bool) -> Self {
        self.bind_globals_when_reducing = enabled;
        self
    }

    /// Sets whether a multi-node final residual is an error.
    #[must_use]
    pub const fn with_fail_on_catch_all(mut self, enabled: bool) -> Self {
        self.fail_on_catch_all = enabled;
        self
    }

    /// Adds a namespace to search.
    #[must_use]
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespaces.insert(namespace.to_string());
        self
    }

    /// Seeds a value binding.
    #[must_use]
    pub fn with_binding(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.additional_bindings.insert(name.to_string(), value.into());
        self
    }
}

use std::collections::HashMap;

use log::debug;

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

/// A compiled expression: residual nodes plus the template environment.
///
/// Compiling runs one non-final pass with the declared inputs promised but
/// absent, which specializes everything that does not depend on them.
/// Invoking copies the environment, fills the inputs in, and runs a final
/// pass. A compiled expression is immutable and may be invoked concurrently
/// from several threads against a shared host.
///
/// ## Example
/// ```
/// use std::collections::HashMap;
///
/// use residua::{
///     ast::{ExprKind, Node},
///     compile::CompiledExpr,
///     host::{registry::HostRegistry, value::Value},
///     ops,
///     reducer::settings::ReduceSettings,
/// };
///
/// // x + 1, with `x` supplied per invocation.
/// let plus = ops::infix("+").unwrap();
/// let root =
///     Node::new(0,
///               5,
///               ExprKind::SubExpression(vec![Node::new(0,
///                                                      1,
///                                                      ExprKind::Unknown("x".to_string())),
///                                            Node::new(2, 1, ExprKind::Infix(plus)),
///                                            Node::obj(4, 1, 1i64)]));
///
/// let registry = HostRegistry::with_standard_types();
/// let compiled =
///     CompiledExpr::compile(root, &["x"], &registry, ReduceSettings::default()).unwrap();
///
/// let inputs = HashMap::from([("x".to_string(), Value::Integer(4))]);
/// assert_eq!(compiled.invoke(&registry, &inputs).unwrap(), Value::Integer(5));
/// ```
pub struct CompiledExpr {
    roots:    Vec<Node>,
    bindings: Bindings,
    settings: ReduceSettings,
}

impl CompiledExpr {
    /// Compiles an expression tree against declared input names.
    ///
    /// Seed values from the settings are bound immediately; each declared
    /// input is promised for invocation time. The non-final pass reduces
    /// everything else as far as it can go.
    ///
    /// # Errors
    /// Returns any error the template pass raises; unresolved inputs are not
    /// errors at this stage.
    pub fn compile(root: Node,
                   inputs: &[&str],
                   host: &dyn HostInterop,
                   settings: ReduceSettings)
                   -> ReduceResult<Self> {
        let mut bindings = Bindings::new();
        for (name, value) in &settings.additional_bindings {
            bindings.define_value(name, value.clone());
        }
        for name in inputs {
            bindings.declare_coming(name);
        }

        let reducer = Reducer::new(host, &settings, false);
        let roots = reducer.reduce(vec![root], &bindings)?;
        debug!("compiled to {} residual node(s)", roots.len());

        Ok(Self { roots,
                  bindings,
                  settings })
    }

    /// Reduces the compiled expression to a value with the given inputs.
    ///
    /// The template environment is copied, so concurrent invocations do not
    /// observe each other.
    ///
    /// # Errors
    /// Returns an error when an input is still missing, when a host call
    /// fails, or when the residual is not a single value.
    pub fn invoke(&self,
                  host: &dyn HostInterop,
                  inputs: &HashMap<String, Value>)
                  -> ReduceResult<Value> {
        let mut bindings = self.bindings.clone();
        for (name, value) in inputs {
            bindings.define_value(name, value.clone());
        }

        let reducer = Reducer::new(host, &self.settings, true);
        let reduced = reducer.reduce(self.roots.clone(), &bindings)?;
        debug!("invocation reduced to {} node(s)", reduced.len());

        extract_result(&reduced)
    }

    /// The residual nodes the template pass produced.
    #[must_use]
    pub fn roots(&self) -> &[Node] {
        &self.roots
    }
}

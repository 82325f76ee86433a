use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use residua::{
    ast::{ExprKind, LambdaExpr, Node, Resolution},
    compile::CompiledExpr,
    error::{HostError, ReduceError},
    host::{
        object::{Arity, ObjectValue},
        registry::{HostRegistry, TypeDef},
        sequence::NumericSequence,
        value::Value,
    },
    ops,
    reducer::{bindings::Bindings, core::Reducer, settings::ReduceSettings},
};

fn obj(offset: u32, value: impl Into<Value>) -> Node {
    Node::obj(offset, 1, value)
}

fn unknown(offset: u32, name: &str) -> Node {
    Node::new(offset, 1, ExprKind::Unknown(name.to_string()))
}

fn infix(offset: u32, symbol: &str) -> Node {
    Node::new(offset, 1, ExprKind::Infix(ops::infix(symbol).unwrap()))
}

fn invoke(offset: u32) -> Node {
    Node::new(offset, 1, ExprKind::Invoke)
}

fn unit(offset: u32) -> Node {
    Node::new(offset, 1, ExprKind::Unit)
}

fn subexpr(nodes: Vec<Node>) -> Node {
    let offset = nodes.iter().map(|n| n.offset).min().unwrap_or(0);
    let end = nodes.iter().map(Node::end).max().unwrap_or(offset);
    Node::new(offset, end - offset, ExprKind::SubExpression(nodes))
}

fn lambda(offset: u32, params: &[&str], body: Node) -> Node {
    let params = params.iter().map(ToString::to_string).collect();
    Node::new(offset,
              body.end().saturating_sub(offset),
              ExprKind::Lambda(LambdaExpr::new(params, Bindings::new(), body)))
}

fn eval(root: Node, registry: &HostRegistry) -> Value {
    residua::evaluate(root, registry, &ReduceSettings::default()).expect("evaluation failed")
}

fn eval_err(root: Node, registry: &HostRegistry) -> ReduceError {
    residua::evaluate(root, registry, &ReduceSettings::default())
        .expect_err("evaluation unexpectedly succeeded")
}

fn final_reduce(nodes: Vec<Node>, registry: &HostRegistry, bindings: &Bindings) -> Vec<Node> {
    let settings = ReduceSettings::default();
    Reducer::new(registry, &settings, true).reduce(nodes, bindings)
                                           .expect("reduction failed")
}

fn template_reduce(nodes: Vec<Node>, registry: &HostRegistry, bindings: &Bindings) -> Vec<Node> {
    let settings = ReduceSettings::default();
    Reducer::new(registry, &settings, false).reduce(nodes, bindings)
                                            .expect("reduction failed")
}

/// A registry with a `probe` type whose `boom` method counts invocations,
/// for observing which expressions actually run.
fn probe_registry(counter: &Arc<AtomicUsize>) -> HostRegistry {
    let mut registry = HostRegistry::with_standard_types();
    let hits = Arc::clone(counter);
    registry.register(TypeDef::new("", "probe").with_method("boom",
                                                            Arity::exactly(0),
                                                            move |_, _| {
                                                                hits.fetch_add(1,
                                                                               Ordering::SeqCst);
                                                                Ok(Value::Integer(0))
                                                            }));
    registry
}

fn probe_call(offset: u32) -> Node {
    subexpr(vec![obj(offset, Value::Object(ObjectValue::new("probe", ()))),
                 invoke(offset + 1),
                 unknown(offset + 2, "boom"),
                 unit(offset + 3)])
}

fn point_registry() -> HostRegistry {
    let mut registry = HostRegistry::with_standard_types();
    registry.register(
        TypeDef::new("", "point")
            .with_constructor(|args| match args {
                [Value::Integer(x), Value::Integer(y)] => {
                    Ok(Value::Object(ObjectValue::new("point", (*x, *y))))
                },
                _ => {
                    Err(HostError::ConstructorFailed { type_name: "point".to_string(),
                                                       details:   "expected two integers"
                                                                  .to_string(), })
                },
            })
            .with_property("x", |target| point_coord(target, 0))
            .with_property("y", |target| point_coord(target, 1)),
    );
    registry
}

fn point_coord(target: &Value, which: usize) -> Result<Value, HostError> {
    let Value::Object(object) = target else {
        return Err(HostError::TypeMismatch { details: "expected a point".to_string(), });
    };
    let (x, y) = object.downcast_ref::<(i64, i64)>()
                       .ok_or_else(|| HostError::TypeMismatch { details: "expected a point"
                                                                         .to_string(), })?;
    Ok(Value::Integer(if which == 0 { *x } else { *y }))
}

#[test]
fn operator_precedence_binds_multiplication_first() {
    let registry = HostRegistry::with_standard_types();

    // 1 + 2 * 3
    let root = subexpr(vec![obj(0, 1i64), infix(2, "+"), obj(4, 2i64), infix(6, "*"),
                            obj(8, 3i64)]);
    assert_eq!(eval(root, &registry), Value::Integer(7));

    // 2 * 3 + 1
    let root = subexpr(vec![obj(0, 2i64), infix(2, "*"), obj(4, 3i64), infix(6, "+"),
                            obj(8, 1i64)]);
    assert_eq!(eval(root, &registry), Value::Integer(7));
}

#[test]
fn equal_precedence_associates_left() {
    let registry = HostRegistry::with_standard_types();

    // 10 - 3 + 2 must be (10 - 3) + 2, not 10 - (3 + 2).
    let root = subexpr(vec![obj(0, 10i64), infix(2, "-"), obj(4, 3i64), infix(6, "+"),
                            obj(8, 2i64)]);
    assert_eq!(eval(root, &registry), Value::Integer(9));
}

#[test]
fn reduction_result_spans_the_whole_input() {
    let registry = HostRegistry::with_standard_types();
    let nodes = vec![obj(0, 1i64), infix(2, "+"), obj(4, 2i64), infix(6, "*"), obj(8, 3i64)];

    let reduced = final_reduce(nodes, &registry, &Bindings::new());

    assert_eq!(reduced.len(), 1);
    assert_eq!(reduced[0].offset, 0);
    assert_eq!(reduced[0].end(), 9);
    assert_eq!(reduced[0].as_obj(), Some(&Value::Integer(7)));
}

#[test]
fn let_bindings_nest_lexically() {
    let registry = HostRegistry::with_standard_types();

    // let x = 10 in let y = x + 1 in y * 2
    let inner_scope = subexpr(vec![unknown(30, "y"), infix(32, "*"), obj(34, 2i64)]);
    let inner = Node::new(14,
                          21,
                          ExprKind::BVar { name:  "y".to_string(),
                                           value: Box::new(subexpr(vec![unknown(22, "x"),
                                                                        infix(24, "+"),
                                                                        obj(26, 1i64)])),
                                           scope: Box::new(inner_scope), });
    let root = Node::new(0,
                         35,
                         ExprKind::BVar { name:  "x".to_string(),
                                          value: Box::new(obj(8, 10i64)),
                                          scope: Box::new(inner), });

    assert_eq!(eval(root, &registry), Value::Integer(22));
}

#[test]
fn conditional_takes_only_the_selected_branch() {
    let counter = Arc::new(AtomicUsize::new(0));
    let registry = probe_registry(&counter);

    // if true then "a" else probe.boom()
    let root = Node::new(0,
                         30,
                         ExprKind::IfThenElse { condition:   Box::new(obj(3, true)),
                                                then_branch: Box::new(obj(10, "a")),
                                                else_branch: Box::new(probe_call(20)), });

    assert_eq!(eval(root, &registry), Value::from("a"));
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn probe_method_actually_counts_when_called() {
    let counter = Arc::new(AtomicUsize::new(0));
    let registry = probe_registry(&counter);

    assert_eq!(eval(probe_call(0), &registry), Value::Integer(0));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn conjunction_short_circuits_without_touching_the_right_side() {
    let counter = Arc::new(AtomicUsize::new(0));
    let registry = probe_registry(&counter);

    let root = Node::new(0,
                         30,
                         ExprKind::And { left:  Box::new(obj(0, false)),
                                         right: Box::new(probe_call(10)), });

    assert_eq!(eval(root, &registry), Value::Bool(false));
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn connectives_propagate_null_and_decide_early() {
    let registry = HostRegistry::with_standard_types();

    let and_null = Node::new(0,
                             10,
                             ExprKind::And { left:  Box::new(obj(0, Value::Null)),
                                             right: Box::new(obj(5, true)), });
    assert_eq!(eval(and_null, &registry), Value::Null);

    let or_true = Node::new(0,
                            10,
                            ExprKind::Or { left:  Box::new(obj(0, true)),
                                           right: Box::new(obj(5, false)), });
    assert_eq!(eval(or_true, &registry), Value::Bool(true));

    let or_takes_rhs = Node::new(0,
                                 10,
                                 ExprKind::Or { left:  Box::new(obj(0, false)),
                                                right: Box::new(obj(5, true)), });
    assert_eq!(eval(or_takes_rhs, &registry), Value::Bool(true));
}

#[test]
fn conjunction_rejects_non_boolean_left_side() {
    let registry = HostRegistry::with_standard_types();

    let root = Node::new(0,
                         10,
                         ExprKind::And { left:  Box::new(obj(2, 3i64)),
                                         right: Box::new(obj(6, true)), });

    assert!(matches!(eval_err(root, &registry),
                     ReduceError::AndLhsNotBool { offset: 2, .. }));
}

#[test]
fn lambda_applies_arguments_one_at_a_time() {
    let registry = HostRegistry::with_standard_types();

    // (fun a b -> a + b) 3 4
    let body = subexpr(vec![unknown(10, "a"), infix(12, "+"), unknown(14, "b")]);
    let root = subexpr(vec![lambda(0, &["a", "b"], body), obj(16, 3i64), obj(18, 4i64)]);

    assert_eq!(eval(root, &registry), Value::Integer(7));
}

#[test]
fn partial_application_leaves_a_smaller_lambda() {
    let registry = HostRegistry::with_standard_types();

    let body = subexpr(vec![unknown(10, "a"), infix(12, "+"), unknown(14, "b")]);
    let partial = final_reduce(vec![lambda(0, &["a", "b"], body), obj(16, 3i64)],
                               &registry,
                               &Bindings::new());

    assert_eq!(partial.len(), 1);
    let ExprKind::Lambda(remaining) = &partial[0].kind else {
        panic!("expected a lambda residual, found {}", partial[0].kind_name());
    };
    assert_eq!(remaining.params(), ["b".to_string()]);

    // Feeding the final argument matches applying both at once.
    let finished = final_reduce(vec![partial[0].clone(), obj(18, 4i64)],
                                &registry,
                                &Bindings::new());
    assert_eq!(finished[0].as_obj(), Some(&Value::Integer(7)));
}

fn factorial_body() -> Node {
    // if n <= 0 then 1 else n * fact (n - 1)
    let recurse = subexpr(vec![unknown(40, "fact"),
                               subexpr(vec![unknown(46, "n"), infix(48, "-"), obj(50, 1i64)])]);
    let multiply = subexpr(vec![unknown(34, "n"), infix(36, "*"), recurse]);
    Node::new(10,
              42,
              ExprKind::IfThenElse { condition:   Box::new(subexpr(vec![unknown(13, "n"),
                                                                        infix(15, "<="),
                                                                        obj(18, 0i64)])),
                                     then_branch: Box::new(obj(25, 1i64)),
                                     else_branch: Box::new(multiply), })
}

#[test]
fn recursive_factorial_reduces_in_a_final_pass() {
    let registry = HostRegistry::with_standard_types();

    // let fact = fun n -> ... in fact 5
    let root = Node::new(0,
                         60,
                         ExprKind::BVar { name:  "fact".to_string(),
                                          value: Box::new(lambda(10, &["n"], factorial_body())),
                                          scope:
                                              Box::new(subexpr(vec![unknown(55, "fact"),
                                                                    obj(58, 5i64)])), });

    assert_eq!(eval(root, &registry), Value::Integer(120));
}

#[test]
fn recursive_lambda_survives_template_and_invocation() {
    let registry = HostRegistry::with_standard_types();

    // let fact = fun n -> ... in fact n0, with n0 supplied at invocation.
    let root = Node::new(0,
                         60,
                         ExprKind::BVar { name:  "fact".to_string(),
                                          value: Box::new(lambda(10, &["n"], factorial_body())),
                                          scope:
                                              Box::new(subexpr(vec![unknown(55, "fact"),
                                                                    unknown(58, "n0")])), });

    let compiled = CompiledExpr::compile(root, &["n0"], &registry, ReduceSettings::default())
        .expect("template pass failed");

    let inputs = HashMap::from([("n0".to_string(), Value::Integer(5))]);
    assert_eq!(compiled.invoke(&registry, &inputs).unwrap(), Value::Integer(120));

    // The compiled template is reusable.
    let inputs = HashMap::from([("n0".to_string(), Value::Integer(3))]);
    assert_eq!(compiled.invoke(&registry, &inputs).unwrap(), Value::Integer(6));
}

#[test]
fn generator_expands_into_a_lazy_sequence() {
    let registry = HostRegistry::with_standard_types();

    let root = Node::new(0,
                         12,
                         ExprKind::Generator { start: Box::new(obj(1, 1i64)),
                                               step:  Box::new(obj(5, 2i64)),
                                               end:   Box::new(obj(9, 7i64)), });

    let Value::Seq(sequence) = eval(root, &registry) else {
        panic!("expected a sequence");
    };
    let values: Vec<Value> = sequence.iter().collect();
    assert_eq!(values,
               vec![Value::Integer(1),
                    Value::Integer(3),
                    Value::Integer(5),
                    Value::Integer(7)]);
}

#[test]
fn generator_respects_step_direction() {
    let descending = NumericSequence::integers(7, -2, 1);
    let values: Vec<Value> = descending.iter().collect();
    assert_eq!(values,
               vec![Value::Integer(7),
                    Value::Integer(5),
                    Value::Integer(3),
                    Value::Integer(1)]);

    // A stride pointing away from the bound yields nothing.
    let empty = NumericSequence::integers(7, 2, 1);
    assert_eq!(empty.iter().count(), 0);
}

#[test]
fn generator_rejects_zero_step_and_mixed_kinds() {
    let registry = HostRegistry::with_standard_types();

    let zero_step = Node::new(0,
                              12,
                              ExprKind::Generator { start: Box::new(obj(1, 1i64)),
                                                    step:  Box::new(obj(5, 0i64)),
                                                    end:   Box::new(obj(9, 7i64)), });
    assert!(matches!(eval_err(zero_step, &registry),
                     ReduceError::GeneratorZeroStep { .. }));

    let mixed = Node::new(0,
                          12,
                          ExprKind::Generator { start: Box::new(obj(1, 1i64)),
                                                step:  Box::new(obj(5, 2.0f64)),
                                                end:   Box::new(obj(9, 7i64)), });
    assert!(matches!(eval_err(mixed, &registry),
                     ReduceError::GeneratorTypeMismatch { .. }));
}

#[test]
fn two_phase_reduction_leaves_a_residual_then_finishes() {
    let registry = HostRegistry::with_standard_types();

    // x + 1 with x promised for later.
    let root = subexpr(vec![unknown(0, "x"), infix(2, "+"), obj(4, 1i64)]);
    let compiled = CompiledExpr::compile(root, &["x"], &registry, ReduceSettings::default())
        .expect("template pass failed");

    let roots = compiled.roots();
    assert_eq!(roots.len(), 1);
    assert!(matches!(roots[0].kind, ExprKind::SubExpression(_)));
    assert_eq!(roots[0].resolution, Resolution::Unresolved);
    assert_eq!(roots[0].offset, 0);
    assert_eq!(roots[0].end(), 5);

    let inputs = HashMap::from([("x".to_string(), Value::Integer(4))]);
    assert_eq!(compiled.invoke(&registry, &inputs).unwrap(), Value::Integer(5));
}

#[test]
fn missing_input_is_an_unbound_name_in_the_final_pass() {
    let registry = HostRegistry::with_standard_types();

    let root = subexpr(vec![unknown(0, "x"), infix(2, "+"), obj(4, 1i64)]);
    let compiled = CompiledExpr::compile(root, &["x"], &registry, ReduceSettings::default())
        .expect("template pass failed");

    let error = compiled.invoke(&registry, &HashMap::new())
                        .expect_err("invocation should fail");
    assert!(matches!(error, ReduceError::UnboundName { ref name, .. } if name == "x"));
}

#[test]
fn unknown_name_is_an_error_in_the_final_pass() {
    let registry = HostRegistry::with_standard_types();
    let error = eval_err(unknown(3, "mystery"), &registry);
    assert!(matches!(error,
                     ReduceError::UnknownName { ref name, offset: 3, .. } if name == "mystery"));
}

#[test]
fn reduction_is_deterministic() {
    let registry = HostRegistry::with_standard_types();

    let build = || subexpr(vec![unknown(0, "x"), infix(2, "+"), obj(4, 1i64)]);
    let first = CompiledExpr::compile(build(), &["x"], &registry, ReduceSettings::default())
        .unwrap();
    let second = CompiledExpr::compile(build(), &["x"], &registry, ReduceSettings::default())
        .unwrap();

    assert_eq!(first.roots(), second.roots());

    let inputs = HashMap::from([("x".to_string(), Value::Integer(4))]);
    assert_eq!(first.invoke(&registry, &inputs).unwrap(),
               second.invoke(&registry, &inputs).unwrap());
}

#[test]
fn nonfinal_reduction_is_idempotent() {
    let registry = HostRegistry::with_standard_types();
    let mut bindings = Bindings::new();
    bindings.declare_coming("x");

    let nodes = vec![subexpr(vec![unknown(0, "x"), infix(2, "+"), obj(4, 1i64)])];
    let once = template_reduce(nodes, &registry, &bindings);
    let twice = template_reduce(once.clone(), &registry, &bindings);

    assert_eq!(once, twice);
}

#[test]
fn a_value_reduces_to_itself() {
    let registry = HostRegistry::with_standard_types();
    let reduced = final_reduce(vec![obj(0, 7i64)], &registry, &Bindings::new());

    assert_eq!(reduced, vec![obj(0, 7i64)]);
}

#[test]
fn beta_reduction_matches_direct_substitution() {
    let registry = HostRegistry::with_standard_types();

    // (fun x -> x + 1) 9
    let body = || subexpr(vec![unknown(10, "x"), infix(12, "+"), obj(14, 1i64)]);
    let applied = subexpr(vec![lambda(0, &["x"], body()), obj(16, 9i64)]);
    let via_application = eval(applied, &registry);

    let mut bindings = Bindings::new();
    bindings.define_value("x", Value::Integer(9));
    let direct = final_reduce(vec![body()], &registry, &bindings);

    assert_eq!(Some(&via_application), direct[0].as_obj());
}

#[test]
fn member_access_on_null_propagates_null() {
    let registry = HostRegistry::with_standard_types();

    let root = subexpr(vec![obj(0, Value::Null), invoke(1), unknown(2, "length")]);
    assert_eq!(eval(root, &registry), Value::Null);
}

#[test]
fn string_properties_and_methods_dispatch() {
    let registry = HostRegistry::with_standard_types();

    let length = subexpr(vec![obj(0, "hello"), invoke(1), unknown(2, "length")]);
    assert_eq!(eval(length, &registry), Value::Integer(5));

    // "hello".contains("ell")
    let contains = subexpr(vec![obj(0, "hello"),
                                invoke(1),
                                unknown(2, "contains"),
                                obj(4, "ell")]);
    assert_eq!(eval(contains, &registry), Value::Bool(true));

    // "hello".to_upper()
    let upper = subexpr(vec![obj(0, "hello"), invoke(1), unknown(2, "to_upper"), unit(4)]);
    assert_eq!(eval(upper, &registry), Value::from("HELLO"));
}

#[test]
fn nested_invoke_broadcasts_across_a_collection() {
    let registry = HostRegistry::with_standard_types();

    // ["ab", "abc"]..length
    let strings = Value::from(vec![Value::from("ab"), Value::from("abc")]);
    let root = subexpr(vec![obj(0, strings), invoke(1), invoke(2), unknown(3, "length")]);

    assert_eq!(eval(root, &registry),
               Value::from(vec![Value::Integer(2), Value::Integer(3)]));
}

#[test]
fn mixed_member_kinds_across_a_collection_are_rejected() {
    let mut registry = HostRegistry::with_standard_types();
    registry.register(TypeDef::new("", "gadget").with_method("length",
                                                             Arity::exactly(0),
                                                             |_, _| Ok(Value::Integer(9))));

    let mixed = Value::from(vec![Value::from("ab"),
                                 Value::Object(ObjectValue::new("gadget", ()))]);
    let root = subexpr(vec![obj(0, mixed), invoke(1), invoke(2), unknown(3, "length")]);

    assert!(matches!(eval_err(root, &registry), ReduceError::MixedMemberKinds { .. }));
}

#[test]
fn static_constants_and_methods_resolve_in_namespaces() {
    let registry = HostRegistry::with_standard_types();

    // Math.pi
    let pi = subexpr(vec![unknown(0, "Math"), invoke(4), unknown(5, "pi")]);
    assert_eq!(eval(pi, &registry), Value::Real(std::f64::consts::PI));

    // Math.max(3, 4)
    let arguments = Node::new(9,
                              5,
                              ExprKind::Tuple(vec![obj(10, 3i64), obj(13, 4i64)]));
    let max = subexpr(vec![unknown(0, "Math"), invoke(4), unknown(5, "max"), arguments]);
    assert_eq!(eval(max, &registry), Value::Integer(4));
}

#[test]
fn ambiguous_static_resolution_is_an_error() {
    let mut registry = HostRegistry::with_standard_types();
    registry.register(TypeDef::new("", "dup").with_static_value("k", 1i64));
    registry.register(TypeDef::new("std", "dup").with_static_value("k", 2i64));

    let root = subexpr(vec![unknown(0, "dup"), invoke(3), unknown(4, "k")]);
    assert!(matches!(eval_err(root, &registry), ReduceError::AmbiguousStatic { .. }));
}

#[test]
fn nested_invoke_on_a_static_name_is_unsupported() {
    let registry = HostRegistry::with_standard_types();

    // Math..pi
    let root = subexpr(vec![unknown(0, "Math"), invoke(4), invoke(5), unknown(6, "pi")]);
    assert!(matches!(eval_err(root, &registry),
                     ReduceError::StaticDepthUnsupported { .. }));
}

#[test]
fn constructors_dispatch_through_namespaces() {
    let registry = point_registry();

    // new point(1, 2) . x
    let arguments = Node::new(10,
                              5,
                              ExprKind::Tuple(vec![obj(11, 1i64), obj(13, 2i64)]));
    let construct = subexpr(vec![Node::new(0, 3, ExprKind::New),
                                 unknown(4, "point"),
                                 arguments]);
    let root = subexpr(vec![construct, invoke(16), unknown(17, "x")]);

    assert_eq!(eval(root, &registry), Value::Integer(1));
}

#[test]
fn single_value_constructor_arguments_work_without_a_tuple() {
    let mut registry = HostRegistry::with_standard_types();
    registry.register(TypeDef::new("", "boxed").with_constructor(|args| match args {
                                                   [value] => Ok(value.clone()),
                                                   _ => {
                                                       Err(HostError::ConstructorFailed {
                            type_name: "boxed".to_string(),
                            details:   "expected one value".to_string(),
                        })
                                                   },
                                               }));

    let root = subexpr(vec![unknown(0, "boxed"), obj(6, 42i64)]);
    assert_eq!(eval(root, &registry), Value::Integer(42));
}

#[test]
fn arrays_index_by_integer() {
    let registry = HostRegistry::with_standard_types();
    let array = Value::from(vec![Value::Integer(10), Value::Integer(20), Value::Integer(30)]);

    let direct = subexpr(vec![obj(0, array.clone()),
                              Node::new(1, 3, ExprKind::IndexArgs(vec![obj(2, 1i64)]))]);
    assert_eq!(eval(direct, &registry), Value::Integer(20));

    // Dot-index syntax routes through the same rule.
    let dotted = subexpr(vec![obj(0, array.clone()),
                              invoke(1),
                              Node::new(2, 3, ExprKind::IndexArgs(vec![obj(3, 2i64)]))]);
    assert_eq!(eval(dotted, &registry), Value::Integer(30));

    let out_of_bounds = subexpr(vec![obj(0, array),
                                     Node::new(1, 3, ExprKind::IndexArgs(vec![obj(2, 9i64)]))]);
    assert!(matches!(eval_err(out_of_bounds, &registry),
                     ReduceError::HostCall { error: HostError::IndexOutOfBounds { .. }, .. }));
}

#[test]
fn indexed_properties_take_bracketed_arguments() {
    let mut registry = HostRegistry::with_standard_types();
    registry.register(TypeDef::new("", "table").with_indexed_property("cell",
                                                                      Arity::exactly(1),
                                                                      |_, args| {
                                                                          let index =
                                                                              args[0].as_integer()?;
                                                                          Ok(Value::Integer(index * 100))
                                                                      }));

    let root = subexpr(vec![obj(0, Value::Object(ObjectValue::new("table", ()))),
                            invoke(1),
                            unknown(2, "cell"),
                            Node::new(6, 3, ExprKind::IndexArgs(vec![obj(7, 3i64)]))]);

    assert_eq!(eval(root, &registry), Value::Integer(300));
}

#[test]
fn array_builder_collapses_when_every_element_is_a_value() {
    let registry = HostRegistry::with_standard_types();

    let uniform = Node::new(0,
                            9,
                            ExprKind::ArrayBuilder(vec![obj(1, 1i64),
                                                        subexpr(vec![obj(3, 2i64),
                                                                     infix(5, "+"),
                                                                     obj(7, 3i64)])]));
    assert_eq!(eval(uniform, &registry),
               Value::from(vec![Value::Integer(1), Value::Integer(5)]));

    // Mixed element types still build one array.
    let mixed = Node::new(0,
                          6,
                          ExprKind::ArrayBuilder(vec![obj(1, 1i64), obj(3, "a")]));
    assert_eq!(eval(mixed, &registry),
               Value::from(vec![Value::Integer(1), Value::from("a")]));

    let empty = Node::new(0, 2, ExprKind::ArrayBuilder(Vec::new()));
    assert_eq!(eval(empty, &registry), Value::from(Vec::<Value>::new()));
}

#[test]
fn array_builder_stays_residual_while_elements_are_pending() {
    let registry = HostRegistry::with_standard_types();
    let mut bindings = Bindings::new();
    bindings.declare_coming("x");

    let nodes = vec![Node::new(0,
                               6,
                               ExprKind::ArrayBuilder(vec![obj(1, 1i64), unknown(3, "x")]))];
    let residual = template_reduce(nodes, &registry, &bindings);

    assert_eq!(residual.len(), 1);
    assert_eq!(residual[0].resolution, Resolution::Unresolved);
    assert!(matches!(residual[0].kind, ExprKind::ArrayBuilder(_)));
}

#[test]
fn set_builder_drops_duplicates() {
    let registry = HostRegistry::with_standard_types();

    let root = Node::new(0,
                         9,
                         ExprKind::SetBuilder(vec![obj(1, 1i64), obj(3, 1i64), obj(5, 2i64)]));

    let Value::Set(set) = eval(root, &registry) else {
        panic!("expected a set");
    };
    assert_eq!(set.len(), 2);
}

#[test]
fn tuples_of_values_extract_as_a_sequence_of_values() {
    let registry = HostRegistry::with_standard_types();

    let root = Node::new(0, 5, ExprKind::Tuple(vec![obj(1, 1i64), obj(3, 2i64)]));
    assert_eq!(eval(root, &registry),
               Value::from(vec![Value::Integer(1), Value::Integer(2)]));
}

#[test]
fn resolved_containers_hold_only_values() {
    let registry = HostRegistry::with_standard_types();

    let nodes = vec![Node::new(0,
                               9,
                               ExprKind::Tuple(vec![obj(1, 1i64),
                                                    subexpr(vec![obj(3, 2i64),
                                                                 infix(5, "+"),
                                                                 obj(7, 3i64)])]))];
    let reduced = final_reduce(nodes, &registry, &Bindings::new());

    assert_eq!(reduced.len(), 1);
    assert_eq!(reduced[0].resolution, Resolution::Resolved);
    let ExprKind::Tuple(items) = &reduced[0].kind else {
        panic!("expected a tuple");
    };
    assert!(items.iter().all(Node::is_obj));
}

#[test]
fn sequences_materialize_through_their_method() {
    let registry = HostRegistry::with_standard_types();

    let sequence = Value::from(NumericSequence::integers(1, 1, 3));
    let root = subexpr(vec![obj(0, sequence), invoke(1), unknown(2, "to_array"), unit(4)]);

    assert_eq!(eval(root, &registry),
               Value::from(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]));
}

#[test]
fn leftover_nodes_are_reported() {
    let registry = HostRegistry::with_standard_types();
    let settings = ReduceSettings::default();
    let bindings = Bindings::new();

    // Two values side by side can never merge.
    let nodes = vec![obj(0, 1i64), obj(2, 2i64)];
    let residual = Reducer::new(&registry, &settings, true).reduce(nodes.clone(), &bindings)
                                                           .expect("tolerant walk succeeds");
    assert_eq!(residual.len(), 2);

    let strict = ReduceSettings::default().with_fail_on_catch_all(true);
    let error = Reducer::new(&registry, &strict, true).reduce(nodes, &bindings)
                                                      .expect_err("strict walk fails");
    assert!(matches!(error, ReduceError::UnexpectedCase { .. }));
}

#[test]
fn seeded_bindings_resolve_like_any_other_name() {
    let registry = HostRegistry::with_standard_types();
    let settings = ReduceSettings::default().with_binding("answer", 41i64);

    let root = subexpr(vec![unknown(0, "answer"), infix(7, "+"), obj(9, 1i64)]);
    assert_eq!(residua::evaluate(root, &registry, &settings).unwrap(),
               Value::Integer(42));
}

#[test]
fn postfix_and_prefix_operators_apply() {
    let registry = HostRegistry::with_standard_types();

    // 5!
    let fact = subexpr(vec![obj(0, 5i64),
                            Node::new(1, 1, ExprKind::Postfix(ops::postfix("!").unwrap()))]);
    assert_eq!(eval(fact, &registry), Value::Integer(120));

    // -5
    let neg = subexpr(vec![Node::new(0, 1, ExprKind::Prefix(ops::prefix("-").unwrap())),
                           obj(1, 5i64)]);
    assert_eq!(eval(neg, &registry), Value::Integer(-5));
}

#[test]
fn compiled_expressions_are_shareable_across_threads() {
    let registry = HostRegistry::with_standard_types();

    let root = subexpr(vec![unknown(0, "x"), infix(2, "+"), obj(4, 1i64)]);
    let compiled = CompiledExpr::compile(root, &["x"], &registry, ReduceSettings::default())
        .expect("template pass failed");

    std::thread::scope(|scope| {
        for base in 0..4i64 {
            let compiled = &compiled;
            let registry = &registry;
            scope.spawn(move || {
                let inputs = HashMap::from([("x".to_string(), Value::Integer(base))]);
                assert_eq!(compiled.invoke(registry, &inputs).unwrap(),
                           Value::Integer(base + 1));
            });
        }
    });
}

#[test]
fn division_by_zero_surfaces_with_the_operand_span() {
    let registry = HostRegistry::with_standard_types();

    let root = subexpr(vec![obj(0, 1i64), infix(2, "/"), obj(4, 0i64)]);
    let error = eval_err(root, &registry);

    assert!(matches!(error,
                     ReduceError::HostCall { error: HostError::DivisionByZero,
                                             offset: 4,
                                             .. }));
}

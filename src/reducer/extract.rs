use crate::{
    ast::{ExprKind, Node},
    error::ReduceError,
    host::value::Value,
    reducer::core::{ReduceResult, describe_nodes},
};

/// Extracts the final value from a finished reduction.
///
/// Exactly one node should remain. A value node yields its value; a tuple of
/// values yields the sequence of values as an array. Anything else reports
/// the residual.
///
/// ## Example
/// ```
/// use residua::{ast::Node, host::value::Value, reducer::extract::extract_result};
///
/// let nodes = vec![Node::obj(0, 1, 7i64)];
/// assert_eq!(extract_result(&nodes).unwrap(), Value::Integer(7));
/// ```
pub fn extract_result(nodes: &[Node]) -> ReduceResult<Value> {
    match nodes {
        [node] => match &node.kind {
            ExprKind::Obj(value) => Ok(value.clone()),
            ExprKind::Tuple(items) if items.iter().all(Node::is_obj) => {
                let values: Vec<Value> = items.iter()
                                              .filter_map(|item| item.as_obj().cloned())
                                              .collect();
                Ok(Value::from(values))
            },
            _ => {
                Err(ReduceError::UnexpectedResult { found:  node.kind_name().to_string(),
                                                    offset: node.offset,
                                                    length: node.length, })
            },
        },
        [] => {
            Err(ReduceError::UnexpectedResult { found:  "an empty result".to_string(),
                                                offset: 0,
                                                length: 0, })
        },
        residual => {
            let offset = residual.iter().map(|n| n.offset).min().unwrap_or(0);
            let end = residual.iter().map(Node::end).max().unwrap_or(offset);
            Err(ReduceError::UnexpectedResult { found: describe_nodes(residual),
                                                offset,
                                                length: end - offset, })
        },
    }
}

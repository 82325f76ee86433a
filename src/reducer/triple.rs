use crate::{
    ast::{ExprKind, Node},
    error::ReduceError,
    reducer::core::ReduceResult,
};

/// Folds `value op value` into one value, honoring operator precedence with
/// left-to-right associativity on ties.
///
/// `lhs` and `op` are the two newest nodes on the walker's left stack, `rhs`
/// is the head of the pending queue and `lookahead` the node after it. The
/// fold applies when the list ends after `rhs`, or when the upcoming infix
/// operator does not bind tighter than `op` (smaller precedence binds
/// tighter, so equal precedence folds the left operator first). Any other
/// lookahead defers the fold until the right-hand side has finished
/// reducing.
///
/// Only final reductions call this; non-final passes leave operators in the
/// residual.
pub(crate) fn resolve_triple(lhs: &Node,
                             op: &Node,
                             rhs: &Node,
                             lookahead: Option<&Node>)
                             -> ReduceResult<Option<Node>> {
    let (ExprKind::Obj(a), ExprKind::Infix(infix), ExprKind::Obj(b)) =
        (&lhs.kind, &op.kind, &rhs.kind)
    else {
        return Ok(None);
    };

    let binds_now = match lookahead {
        None => true,
        Some(next) => match &next.kind {
            ExprKind::Infix(upcoming) => infix.precedence <= upcoming.precedence,
            _ => false,
        },
    };

    if !binds_now {
        return Ok(None);
    }

    let value = (infix.apply)(a, b).map_err(|error| ReduceError::HostCall { error,
                                                                            offset: rhs.offset,
                                                                            length: rhs.length })?;

    Ok(Some(Node::spanning(lhs, rhs, ExprKind::Obj(value))))
}

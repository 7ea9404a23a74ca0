use crate::definitions::builtin::Dependence;
use crate::expression::ast::{BindingId, CallOp, ExprKind, Expression};

/// `true` when no node below `expr` reads the zoom level.
pub(crate) fn is_zoom_constant(expr: &Expression) -> bool {
    !depends_on(expr, |d| d.zoom)
}

/// `true` when no node below `expr` reads feature properties, geometry, id or state.
pub(crate) fn is_feature_constant(expr: &Expression) -> bool {
    !depends_on(expr, |d| d.feature)
}

fn depends_on(expr: &Expression, pick: fn(Dependence) -> bool) -> bool {
    match &expr.kind {
        ExprKind::Let { bindings, body } => {
            depends_on(body, pick)
                || bindings
                    .iter()
                    .any(|b| reads(body, b.binding) && depends_on(&b.value, pick))
        }
        ExprKind::Call {
            op: CallOp::Builtin(b),
            ..
        } if pick(b.dependence()) => true,
        _ => expr.children().into_iter().any(|c| depends_on(c, pick)),
    }
}

/// `true` when a `var` reachable from `expr` resolves to `binding`.
///
/// Bound values nobody reads are never evaluated, so they are skipped.
fn reads(expr: &Expression, binding: BindingId) -> bool {
    match &expr.kind {
        ExprKind::Var { binding: b, .. } => *b == binding,
        ExprKind::Let { bindings, body } => {
            reads(body, binding)
                || bindings
                    .iter()
                    .any(|b| reads(body, b.binding) && reads(&b.value, binding))
        }
        _ => expr.children().into_iter().any(|c| reads(c, binding)),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/classify.rs"]
mod tests;

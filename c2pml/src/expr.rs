// expr.rs - Expression rendering
//
// Pointers are slot indices, so `p->f` becomes `<pool>_mem[p].f` and `*p`
// becomes `<pool>_mem[p]`. Everything else is printed as written, apart from
// Promela spellings of NULL, casts, sizeof and the conditional operator.

use crate::ast::{Expr, UnaryOp};
use crate::context::{FieldKind, TranslationContext};
use crate::memory::Pool;

/// Render `expr` as a Promela expression
pub fn render(cx: &mut TranslationContext, expr: &Expr) -> String {
    match expr {
        Expr::Ident(name) => name.clone(),
        Expr::Literal(text) => text.clone(),
        Expr::Null => "0".to_string(),
        Expr::Member { base, field, arrow } => render_member(cx, base, field, *arrow),
        Expr::Index { base, index } => {
            format!("{}[{}]", render(cx, base), render(cx, index))
        }
        // Value calls to known processes are hoisted before rendering
        Expr::Call { callee, args } => {
            cx.note(format!(
                "call to {} inside an expression is not modeled",
                callee
            ));
            format!("{}({})", callee, render_args(cx, args).join(", "))
        }
        Expr::Unary {
            op: UnaryOp::Deref,
            operand,
        } => render_deref(cx, operand),
        Expr::Unary {
            op: UnaryOp::AddrOf,
            operand,
        } => {
            let operand = render(cx, operand);
            cx.note(format!("address of {} has no slot index", operand));
            format!("&{}", operand)
        }
        Expr::Unary { op, operand } => format!("{}{}", op.as_str(), render(cx, operand)),
        Expr::Update { op, operand } => {
            let operand = render(cx, operand);
            let sign = if op.is_increment() { "++" } else { "--" };
            let written = if op.is_prefix() {
                format!("{}{}", sign, operand)
            } else {
                format!("{}{}", operand, sign)
            };
            cx.note(format!(
                "value of {} used in an expression; side effect dropped",
                written
            ));
            operand
        }
        Expr::Binary { op, lhs, rhs } => {
            format!("{} {} {}", render(cx, lhs), op.as_str(), render(cx, rhs))
        }
        Expr::Assign { target, .. } => {
            let target = render(cx, target);
            cx.note(format!("assignment to {} used as a value", target));
            target
        }
        Expr::Ternary {
            cond,
            then_value,
            else_value,
        } => format!(
            "({} -> {} : {})",
            render_cond(cx, cond),
            render(cx, then_value),
            render(cx, else_value)
        ),
        Expr::Paren(inner) => format!("({})", render(cx, inner)),
        Expr::Cast { expr, .. } => render(cx, expr),
        // Pools count slots, not bytes
        Expr::SizeOf(_) => "1".to_string(),
        Expr::InitList(items) => {
            cx.note("initializer list outside a declaration".to_string());
            format!("{{ {} }}", render_args(cx, items).join(", "))
        }
        Expr::Verbatim(text) => text.clone(),
    }
}

/// Render a guard: outer parentheses are dropped since the caller adds its own
pub fn render_cond(cx: &mut TranslationContext, expr: &Expr) -> String {
    render(cx, expr.peel())
}

pub fn render_args(cx: &mut TranslationContext, args: &[Expr]) -> Vec<String> {
    args.iter().map(|a| render(cx, a)).collect()
}

/// Operand of a compound operator: parenthesized unless atomic
pub fn render_operand(cx: &mut TranslationContext, expr: &Expr) -> String {
    let text = render(cx, expr);
    match expr {
        Expr::Binary { .. } | Expr::Ternary { .. } | Expr::Assign { .. } => format!("({})", text),
        _ => text,
    }
}

fn render_member(cx: &mut TranslationContext, base: &Expr, field: &str, arrow: bool) -> String {
    if arrow {
        let pool = cx
            .type_of(base)
            .and_then(|ty| cx.pointee_pool(&ty))
            .unwrap_or_else(|| cx.default_pool());
        return format!("{}[{}].{}", pool.mem(), render(cx, base), field);
    }

    // `a.inner.f` where `inner` is a nested struct stored as an index
    let base_kind = cx.member_field(base.peel()).map(|f| f.kind.clone());
    if let Some(FieldKind::NestedIndex(owner)) = base_kind {
        let pool = Pool::Record(owner);
        return format!("{}[{}].{}", pool.mem(), render(cx, base), field);
    }

    format!("{}.{}", render(cx, base), field)
}

fn render_deref(cx: &mut TranslationContext, operand: &Expr) -> String {
    let pool = cx.type_of(operand).and_then(|ty| cx.pointee_pool(&ty));
    let text = render(cx, operand);
    match pool {
        Some(pool) => {
            if let Pool::Scalar(kind) = &pool {
                cx.require_scalar_pool(*kind);
            }
            format!("{}[{}]", pool.mem(), text)
        }
        None => {
            cx.note(format!("dereference of {} with unknown pointee", text));
            format!("*{}", text)
        }
    }
}

/// Pool named by the `sizeof` inside an allocation size, e.g. `sizeof(node)`
/// or `n * sizeof(struct node)`
pub fn sizeof_pool(cx: &TranslationContext, expr: &Expr) -> Option<Pool> {
    match expr {
        Expr::SizeOf(ty) => cx.pool_for(ty),
        Expr::Paren(inner) | Expr::Cast { expr: inner, .. } => sizeof_pool(cx, inner),
        Expr::Binary { lhs, rhs, .. } => sizeof_pool(cx, lhs).or_else(|| sizeof_pool(cx, rhs)),
        _ => None,
    }
}

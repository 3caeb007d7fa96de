// control.rs - Statement and control-flow translation
//
// Structured C control flow maps onto Promela guarded commands:
//
//   if (c) A else B      ->  if :: (c) -> A :: else -> B fi;
//   while (c) B          ->  do :: (c) -> B :: else -> break od;
//   for (i; c; s) B      ->  i; do :: (c) -> B; s :: else -> break od;
//   switch (x) { ... }   ->  if :: (x == v) -> ... :: else -> ... fi;
//
// Promela has no `continue`. A branch that continues is restructured so the
// statements after it only run on the paths that did not continue: they are
// appended to every arm, and translation of an arm stops at its `continue`.
// An arm that continues only on some of its own paths carries its copy of
// the tail further down, so each such branch doubles the tail it precedes.
// A `break` inside a case ends the case and is resolved the same way.

use crate::ast::{AssignOp, Expr, Stmt, SwitchCase, VarDecl};
use crate::context::TranslationContext;
use crate::emit::OutputBuffer;
use crate::expr;
use crate::function;
use crate::memory::{self, ALLOC_RESULT};
use crate::structs;

/// Emit the notes raised while rendering the current statement
pub fn flush_notes(cx: &mut TranslationContext, out: &mut OutputBuffer, indent: usize) {
    for note in cx.take_notes() {
        out.unsupported(indent, &note);
    }
}

/// Emit a statement line, preceded by any pending notes
pub fn emit_line(
    cx: &mut TranslationContext,
    out: &mut OutputBuffer,
    indent: usize,
    text: impl Into<String>,
) {
    flush_notes(cx, out, indent);
    out.emit(indent, text);
}

pub fn translate_block(
    cx: &mut TranslationContext,
    out: &mut OutputBuffer,
    indent: usize,
    stmts: &[Stmt],
) {
    let seq: Vec<&Stmt> = stmts.iter().collect();
    translate_seq(cx, out, indent, &seq);
}

/// Translate a statement sequence. Returns early once a `continue` has been
/// emitted, or once a continuing branch has absorbed the rest.
fn translate_seq(cx: &mut TranslationContext, out: &mut OutputBuffer, indent: usize, stmts: &[&Stmt]) {
    for (i, stmt) in stmts.iter().enumerate() {
        let rest = &stmts[i + 1..];
        match stmt {
            Stmt::Continue => {
                emit_line(cx, out, indent, "skip;");
                return;
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } if !rest.is_empty()
                && (contains_continue(then_branch)
                    || else_branch.as_deref().is_some_and(contains_continue)) =>
            {
                translate_if(cx, out, indent, cond, then_branch, else_branch.as_deref(), rest);
                return;
            }
            Stmt::Block(inner) if !rest.is_empty() && contains_continue(inner) => {
                let merged: Vec<&Stmt> = inner.iter().chain(rest.iter().copied()).collect();
                translate_seq(cx, out, indent, &merged);
                return;
            }
            Stmt::Switch { scrutinee, cases }
                if !rest.is_empty() && cases.iter().any(|c| contains_continue(&c.body)) =>
            {
                translate_switch(cx, out, indent, scrutinee, cases, rest);
                return;
            }
            other => translate_stmt(cx, out, indent, other),
        }
    }
}

/// Whether `stmts` continue the enclosing loop. Nested loops own their
/// `continue`s and are not searched.
pub fn contains_continue(stmts: &[Stmt]) -> bool {
    stmts.iter().any(|stmt| match stmt {
        Stmt::Continue => true,
        Stmt::Block(inner) => contains_continue(inner),
        Stmt::If {
            then_branch,
            else_branch,
            ..
        } => contains_continue(then_branch) || else_branch.as_deref().is_some_and(contains_continue),
        Stmt::Switch { cases, .. } => cases.iter().any(|c| contains_continue(&c.body)),
        _ => false,
    })
}

/// Translate one statement with no trailing context
pub fn translate_stmt(cx: &mut TranslationContext, out: &mut OutputBuffer, indent: usize, stmt: &Stmt) {
    match stmt {
        Stmt::Decl(decl) => translate_decl(cx, out, indent, decl),
        Stmt::Expr(e) => translate_expr_stmt(cx, out, indent, e),
        Stmt::Block(inner) => translate_block(cx, out, indent, inner),
        Stmt::If {
            cond,
            then_branch,
            else_branch,
        } => translate_if(cx, out, indent, cond, then_branch, else_branch.as_deref(), &[]),
        Stmt::While { cond, body } => translate_loop(cx, out, indent, Some(cond), body, &[]),
        Stmt::For {
            init,
            cond,
            step,
            body,
        } => {
            for s in init {
                translate_stmt(cx, out, indent, s);
            }
            translate_loop(cx, out, indent, cond.as_ref(), body, step);
        }
        Stmt::Switch { scrutinee, cases } => translate_switch(cx, out, indent, scrutinee, cases, &[]),
        Stmt::Break => emit_line(cx, out, indent, "break;"),
        Stmt::Continue => emit_line(cx, out, indent, "skip;"),
        Stmt::Return(value) => function::translate_return(cx, out, indent, value.as_ref()),
        Stmt::Empty => {}
        Stmt::Unsupported(what) => {
            cx.warn(&format!("statement {}", what));
            flush_notes(cx, out, indent);
            out.unsupported(indent, what);
        }
    }
}

/// One alternative of an `if`/`do`. An arm must hold at least one
/// statement, so an empty one becomes `skip;`.
fn translate_arm(cx: &mut TranslationContext, out: &mut OutputBuffer, indent: usize, stmts: &[&Stmt]) {
    let mark = out.len();
    translate_seq(cx, out, indent, stmts);
    if !out.emitted_code_since(mark) {
        out.emit(indent, "skip;");
    }
}

fn translate_if(
    cx: &mut TranslationContext,
    out: &mut OutputBuffer,
    indent: usize,
    cond: &Expr,
    then_branch: &[Stmt],
    else_branch: Option<&[Stmt]>,
    rest: &[&Stmt],
) {
    let cond = function::hoist_calls(cx, out, indent, cond);
    let guard = expr::render_cond(cx, &cond);
    flush_notes(cx, out, indent);
    out.emit(indent, "if");
    out.emit(indent, format!(":: ({}) ->", guard));
    let then_seq: Vec<&Stmt> = then_branch.iter().chain(rest.iter().copied()).collect();
    translate_arm(cx, out, indent + 1, &then_seq);

    match else_branch {
        None if rest.is_empty() => out.emit(indent, ":: else -> skip"),
        _ => {
            out.emit(indent, ":: else ->");
            let else_seq: Vec<&Stmt> = else_branch
                .unwrap_or_default()
                .iter()
                .chain(rest.iter().copied())
                .collect();
            translate_arm(cx, out, indent + 1, &else_seq);
        }
    }
    out.emit(indent, "fi;");
}

/// `while` and `for` loops. `step` runs at the end of every iteration that
/// did not break.
fn translate_loop(
    cx: &mut TranslationContext,
    out: &mut OutputBuffer,
    indent: usize,
    cond: Option<&Expr>,
    body: &[Stmt],
    step: &[Expr],
) {
    let guard = match cond {
        Some(cond) => expr::render_cond(cx, cond),
        None => "true".to_string(),
    };
    flush_notes(cx, out, indent);
    out.emit(indent, "do");
    out.emit(indent, format!(":: ({}) ->", guard));

    let mark = out.len();
    translate_block(cx, out, indent + 1, body);
    for s in step {
        translate_expr_stmt(cx, out, indent + 1, s);
    }
    if !out.emitted_code_since(mark) {
        out.emit(indent + 1, "skip;");
    }

    out.emit(indent, ":: else -> break");
    out.emit(indent, "od;");
}

/// Each case runs its statements until a `break` ends it. Cases without
/// statements share the guard of the next case; other fall-through is not
/// modeled.
fn translate_switch(
    cx: &mut TranslationContext,
    out: &mut OutputBuffer,
    indent: usize,
    scrutinee: &Expr,
    cases: &[SwitchCase],
    rest: &[&Stmt],
) {
    let scrutinee = function::hoist_calls(cx, out, indent, scrutinee);
    let subject = expr::render_operand(cx, scrutinee.peel());
    flush_notes(cx, out, indent);
    out.emit(indent, "if");

    let mut has_default = false;
    let mut pending: Vec<String> = Vec::new();
    let mut grouped_default = false;
    for (i, case) in cases.iter().enumerate() {
        match &case.value {
            Some(value) => pending.push(format!("{} == {}", subject, expr::render(cx, value))),
            None => grouped_default = true,
        }
        if case.body.is_empty() && i + 1 < cases.len() {
            continue;
        }

        flush_notes(cx, out, indent);
        if grouped_default {
            has_default = true;
            out.emit(indent, ":: else ->");
        } else {
            out.emit(indent, format!(":: ({}) ->", pending.join(" || ")));
        }
        pending.clear();
        grouped_default = false;

        let resolved = case_body(&case.body);
        let body: Vec<&Stmt> = resolved.iter().chain(rest.iter().copied()).collect();
        translate_arm(cx, out, indent + 1, &body);
    }

    if !has_default {
        if rest.is_empty() {
            out.emit(indent, ":: else -> skip");
        } else {
            out.emit(indent, ":: else ->");
            translate_arm(cx, out, indent + 1, rest);
        }
    }
    out.emit(indent, "fi;");
}

/// The statements of a case with its `break`s removed. Whatever follows a
/// `break` on the same path is dropped; a conditional that breaks takes the
/// following statements into both of its arms.
fn case_body(stmts: &[Stmt]) -> Vec<Stmt> {
    let mut body = Vec::new();
    for (i, stmt) in stmts.iter().enumerate() {
        let after = &stmts[i + 1..];
        match stmt {
            Stmt::Break => return body,
            Stmt::Block(inner) if contains_break(inner) => {
                let merged: Vec<Stmt> = inner.iter().chain(after).cloned().collect();
                body.extend(case_body(&merged));
                return body;
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } if contains_break(then_branch) || else_branch.as_deref().is_some_and(contains_break) => {
                let arm = |branch: &[Stmt]| {
                    let merged: Vec<Stmt> = branch.iter().chain(after).cloned().collect();
                    case_body(&merged)
                };
                let then_branch = arm(then_branch.as_slice());
                let else_branch = arm(else_branch.as_deref().unwrap_or_default());
                body.push(Stmt::If {
                    cond: cond.clone(),
                    then_branch,
                    else_branch: (!else_branch.is_empty()).then_some(else_branch),
                });
                return body;
            }
            other => body.push(other.clone()),
        }
    }
    body
}

/// Whether `stmts` break out of the enclosing case. Loops and nested
/// switches own their `break`s.
fn contains_break(stmts: &[Stmt]) -> bool {
    stmts.iter().any(|stmt| match stmt {
        Stmt::Break => true,
        Stmt::Block(inner) => contains_break(inner),
        Stmt::If {
            then_branch,
            else_branch,
            ..
        } => contains_break(then_branch) || else_branch.as_deref().is_some_and(contains_break),
        _ => false,
    })
}

fn translate_decl(cx: &mut TranslationContext, out: &mut OutputBuffer, indent: usize, decl: &VarDecl) {
    structs::declare_local(cx, out, indent, decl);
    match &decl.init {
        None => {}
        Some(Expr::InitList(items)) => translate_init_list(cx, out, indent, decl, items),
        Some(init) => assign_value(cx, out, indent, &Expr::ident(&decl.name), init),
    }
}

/// `int a[2] = {1, 2}` and `struct node n = {1, 0}` become element and
/// field assignments
fn translate_init_list(
    cx: &mut TranslationContext,
    out: &mut OutputBuffer,
    indent: usize,
    decl: &VarDecl,
    items: &[Expr],
) {
    let fields: Option<Vec<String>> = cx.struct_name_of(&decl.ty).and_then(|name| {
        cx.struct_descriptor(&name)
            .map(|s| s.fields.iter().map(|f| f.name.clone()).collect())
    });
    let is_array = matches!(cx.resolve(&decl.ty), crate::ast::CType::Array { .. });

    for (i, item) in items.iter().enumerate() {
        let target = match &fields {
            Some(fields) => match fields.get(i) {
                Some(field) => format!("{}.{}", decl.name, field),
                None => {
                    out.unsupported(indent, &format!("excess initializer of {}", decl.name));
                    break;
                }
            },
            None if is_array => format!("{}[{}]", decl.name, i),
            None => {
                cx.warn(&format!("initializer list of {}", decl.name));
                out.unsupported(indent, &format!("initializer list of {}", decl.name));
                return;
            }
        };
        if let Expr::InitList(_) = item {
            out.unsupported(indent, &format!("nested initializer of {}", target));
            continue;
        }
        let value = expr::render(cx, item);
        emit_line(cx, out, indent, format!("{} = {};", target, value));
    }
}

/// Expression statements: assignments, increments and calls
pub fn translate_expr_stmt(cx: &mut TranslationContext, out: &mut OutputBuffer, indent: usize, e: &Expr) {
    match e.peel() {
        Expr::Assign { op, target, value } => assign(cx, out, indent, *op, target, value),
        Expr::Update { op, operand } => {
            let target = expr::render(cx, operand);
            let sign = if op.is_increment() { "+" } else { "-" };
            emit_line(cx, out, indent, format!("{} = {} {} 1;", target, target, sign));
        }
        Expr::Call { callee, args } => function::translate_call_stmt(cx, out, indent, callee, args),
        Expr::Cast { expr: inner, .. } => translate_expr_stmt(cx, out, indent, inner),
        other => {
            let text = expr::render(cx, other);
            cx.warn(&format!("expression statement {} has no effect", text));
            flush_notes(cx, out, indent);
            out.unsupported(indent, &format!("expression statement {}", text));
        }
    }
}

fn assign(
    cx: &mut TranslationContext,
    out: &mut OutputBuffer,
    indent: usize,
    op: AssignOp,
    target: &Expr,
    value: &Expr,
) {
    match op {
        AssignOp::Assign => assign_value(cx, out, indent, target, value),
        AssignOp::Compound(bin) => {
            let value = function::hoist_calls(cx, out, indent, value);
            let target = expr::render(cx, target);
            let value = expr::render_operand(cx, &value);
            emit_line(
                cx,
                out,
                indent,
                format!("{} = {} {} {};", target, target, bin.as_str(), value),
            );
        }
    }
}

/// `target = value`, lowering allocations, process calls, conditionals and
/// chained assignments into statement sequences
pub fn assign_value(
    cx: &mut TranslationContext,
    out: &mut OutputBuffer,
    indent: usize,
    target: &Expr,
    value: &Expr,
) {
    match value.strip() {
        Expr::Call { callee, args } if callee == "malloc" => {
            let pool = args
                .first()
                .and_then(|size| expr::sizeof_pool(cx, size))
                .or_else(|| cx.type_of(target).and_then(|ty| cx.pointee_pool(&ty)))
                .unwrap_or_else(|| cx.default_pool());
            flush_notes(cx, out, indent);
            memory::emit_alloc(cx, out, indent, &pool);
            let target = expr::render(cx, target);
            emit_line(cx, out, indent, format!("{} = {};", target, ALLOC_RESULT));
        }
        Expr::Call { callee, args } if function::takes_reply_channel(cx, callee) => {
            let target = expr::render(cx, target);
            function::emit_value_call(cx, out, indent, callee, args, &target);
        }
        Expr::Ternary {
            cond,
            then_value,
            else_value,
        } => {
            let cond = function::hoist_calls(cx, out, indent, cond);
            let target = expr::render(cx, target);
            let guard = expr::render_cond(cx, &cond);
            let a = expr::render(cx, then_value);
            let b = expr::render(cx, else_value);
            flush_notes(cx, out, indent);
            out.emit(indent, "if");
            out.emit(indent, format!(":: ({}) -> {} = {};", guard, target, a));
            out.emit(indent, format!(":: else -> {} = {};", target, b));
            out.emit(indent, "fi;");
        }
        Expr::Assign {
            op,
            target: inner_target,
            value: inner_value,
        } => {
            assign(cx, out, indent, *op, inner_target, inner_value);
            let target = expr::render(cx, target);
            let inner = expr::render(cx, inner_target);
            emit_line(cx, out, indent, format!("{} = {};", target, inner));
        }
        _ => {
            let value = function::hoist_calls(cx, out, indent, value);
            let target = expr::render(cx, target);
            let value = expr::render(cx, &value);
            emit_line(cx, out, indent, format!("{} = {};", target, value));
        }
    }
}

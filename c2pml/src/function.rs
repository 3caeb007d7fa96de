// function.rs - Functions as processes
//
// Each C function becomes a `proctype`. A function that produces a value (and
// `main`, so that `init` can wait for it) takes a reply channel `in_<name>`
// as its first parameter:
//
//   proctype sum(chan in_sum; int a; int b) {
//       in_sum ! a + b;
//       goto end;
//   end:
//       printf("End of sum\n");
//   }
//
// Calls become `run`. A value call creates a rendezvous channel, starts the
// callee on it and receives the result. A value call nested in a larger
// expression is run first, into a temporary the expression then reads.

use crate::ast::{BinaryOp, CType, Expr, FunctionDef};
use crate::context::TranslationContext;
use crate::control::{self, emit_line, flush_notes};
use crate::emit::OutputBuffer;
use crate::expr;
use crate::memory::{self, ALLOC_RESULT};
use crate::types::{self, PmlType};

/// Label every return jumps to
pub const END_LABEL: &str = "end";

/// Reply channel parameter of `name`
pub fn reply_channel(name: &str) -> String {
    format!("in_{}", name)
}

/// Whether calls to `callee` must pass a reply channel
pub fn takes_reply_channel(cx: &TranslationContext, callee: &str) -> bool {
    cx.function(callee)
        .is_some_and(|f| f.returns_value || f.name == "main")
}

fn param_type(cx: &TranslationContext, ty: &CType) -> Option<PmlType> {
    match cx.resolve(ty) {
        CType::Named(name) if !cx.has_struct(name) => Some(types::map_scalar(name)),
        CType::Pointer(_) | CType::Array { .. } => Some(PmlType::Int),
        _ => None,
    }
}

fn signature(cx: &mut TranslationContext, def: &FunctionDef) -> String {
    let mut params = Vec::new();
    if def.returns_value() || def.name == "main" {
        params.push(format!("chan {}", reply_channel(&def.name)));
    }
    for param in &def.params {
        match param_type(cx, &param.ty) {
            Some(kind) => params.push(format!("{} {}", kind, param.name)),
            None => {
                cx.note(format!(
                    "parameter {} of {} passed by value as a slot index",
                    param.name, def.name
                ));
                params.push(format!("int {}", param.name));
            }
        }
    }
    format!("proctype {}({}) {{", def.name, params.join("; "))
}

/// Emit the process for `def`
pub fn translate_function(cx: &mut TranslationContext, out: &mut OutputBuffer, def: &FunctionDef) {
    cx.enter_function(def);
    tracing::debug!(
        name = %def.name,
        params = def.params.len(),
        returns_value = def.returns_value(),
        "process"
    );

    let header = signature(cx, def);
    flush_notes(cx, out, 0);
    out.emit(0, header);
    control::translate_block(cx, out, 1, &def.body);
    flush_notes(cx, out, 1);

    out.emit(0, format!("{}:", END_LABEL));
    out.emit(1, format!("printf(\"End of {}\\n\");", def.name));
    if def.name == "main" && !def.returns_value() {
        out.emit(1, format!("{} ! 0;", reply_channel(&def.name)));
    }
    out.emit(0, "}");
    out.blank();
    cx.leave_function();
}

/// `return [value];` sends the value on the reply channel, then leaves
pub fn translate_return(
    cx: &mut TranslationContext,
    out: &mut OutputBuffer,
    indent: usize,
    value: Option<&Expr>,
) {
    let current = cx.current_function().map(str::to_string);
    let returns_value = current
        .as_deref()
        .and_then(|name| cx.function(name))
        .is_some_and(|f| f.returns_value);

    match (current, value) {
        (Some(current), Some(value)) if returns_value => {
            let reply = reply_channel(&current);
            match value.strip() {
                Expr::Call { callee, args } if callee == "malloc" => {
                    let pool = args
                        .first()
                        .and_then(|size| expr::sizeof_pool(cx, size))
                        .or_else(|| {
                            cx.function(&current)
                                .and_then(|f| cx.pointee_pool(&f.return_type))
                        })
                        .unwrap_or_else(|| cx.default_pool());
                    flush_notes(cx, out, indent);
                    memory::emit_alloc(cx, out, indent, &pool);
                    emit_line(cx, out, indent, format!("{} ! {};", reply, ALLOC_RESULT));
                }
                Expr::Call { callee, args } if takes_reply_channel(cx, callee) => {
                    if cx.declare(ALLOC_RESULT, CType::named("int")) {
                        out.emit(indent, format!("int {};", ALLOC_RESULT));
                    }
                    emit_value_call(cx, out, indent, callee, args, ALLOC_RESULT);
                    emit_line(cx, out, indent, format!("{} ! {};", reply, ALLOC_RESULT));
                }
                _ => {
                    let value = hoist_calls(cx, out, indent, value);
                    let value = expr::render(cx, &value);
                    emit_line(cx, out, indent, format!("{} ! {};", reply, value));
                }
            }
        }
        (Some(current), None) if returns_value => {
            cx.note(format!("return without a value in {}", current));
            emit_line(cx, out, indent, format!("{} ! 0;", reply_channel(&current)));
        }
        (_, Some(value)) => {
            // Value of a void function: keep the side effect only
            if let Expr::Call { callee, args } = value.strip() {
                translate_call_stmt(cx, out, indent, callee, args);
            } else {
                let value = expr::render(cx, value);
                cx.note(format!("returned value {} of a void function", value));
            }
        }
        (_, None) => {}
    }
    emit_line(cx, out, indent, format!("goto {};", END_LABEL));
}

/// Run `callee` on a fresh reply channel and receive its result into `target`
pub fn emit_value_call(
    cx: &mut TranslationContext,
    out: &mut OutputBuffer,
    indent: usize,
    callee: &str,
    args: &[Expr],
    target: &str,
) {
    let args = hoist_all(cx, out, indent, args);
    let chan = cx.fresh_reply_channel(callee);
    let mut actuals = vec![chan.clone()];
    actuals.extend(expr::render_args(cx, &args));
    emit_line(cx, out, indent, format!("chan {} = [0] of {{ int }};", chan));
    out.emit(indent, format!("run {}({});", callee, actuals.join(", ")));
    out.emit(indent, format!("{} ? {};", chan, target));
}

/// A call used as a statement
pub fn translate_call_stmt(
    cx: &mut TranslationContext,
    out: &mut OutputBuffer,
    indent: usize,
    callee: &str,
    args: &[Expr],
) {
    match callee {
        "malloc" => {
            let pool = args
                .first()
                .and_then(|size| expr::sizeof_pool(cx, size))
                .unwrap_or_else(|| cx.default_pool());
            cx.note("result of malloc discarded".to_string());
            flush_notes(cx, out, indent);
            memory::emit_alloc(cx, out, indent, &pool);
        }
        "free" => {
            let Some(ptr) = args.first() else {
                cx.warn("free without an argument");
                out.unsupported(indent, "free without an argument");
                return;
            };
            let pool = cx
                .type_of(ptr)
                .and_then(|ty| cx.pointee_pool(&ty))
                .unwrap_or_else(|| cx.default_pool());
            let slot = expr::render(cx, ptr);
            flush_notes(cx, out, indent);
            memory::emit_free(cx, out, indent, &pool, &slot);
        }
        _ if takes_reply_channel(cx, callee) => emit_value_call(cx, out, indent, callee, args, "_"),
        _ if cx.has_function(callee) => {
            let args = hoist_all(cx, out, indent, args);
            let args = expr::render_args(cx, &args);
            emit_line(cx, out, indent, format!("run {}({});", callee, args.join(", ")));
        }
        _ => {
            tracing::debug!(callee, "call to unknown function kept literally");
            let args = hoist_all(cx, out, indent, args);
            let args = expr::render_args(cx, &args);
            emit_line(cx, out, indent, format!("{}({});", callee, args.join(", ")));
        }
    }
}

/// Run every value call to a known process inside `value`, innermost first,
/// and return `value` reading the results from temporaries. Operands C may
/// skip (ternary arms, the right side of `&&` and `||`) keep their calls.
pub fn hoist_calls(
    cx: &mut TranslationContext,
    out: &mut OutputBuffer,
    indent: usize,
    value: &Expr,
) -> Expr {
    match value {
        Expr::Call { callee, args } if takes_reply_channel(cx, callee) => {
            let args = hoist_all(cx, out, indent, args);
            let result = cx.fresh_call_result(callee);
            if cx.declare(&result, CType::named("int")) {
                out.emit(indent, format!("int {};", result));
            }
            emit_value_call(cx, out, indent, callee, &args, &result);
            Expr::Ident(result)
        }
        Expr::Call { callee, args } => Expr::Call {
            callee: callee.clone(),
            args: hoist_all(cx, out, indent, args),
        },
        Expr::Member { base, field, arrow } => Expr::Member {
            base: boxed(cx, out, indent, base),
            field: field.clone(),
            arrow: *arrow,
        },
        Expr::Index { base, index } => Expr::Index {
            base: boxed(cx, out, indent, base),
            index: boxed(cx, out, indent, index),
        },
        Expr::Unary { op, operand } => Expr::Unary {
            op: *op,
            operand: boxed(cx, out, indent, operand),
        },
        Expr::Binary {
            op: op @ (BinaryOp::And | BinaryOp::Or),
            lhs,
            rhs,
        } => Expr::Binary {
            op: *op,
            lhs: boxed(cx, out, indent, lhs),
            rhs: rhs.clone(),
        },
        Expr::Binary { op, lhs, rhs } => Expr::Binary {
            op: *op,
            lhs: boxed(cx, out, indent, lhs),
            rhs: boxed(cx, out, indent, rhs),
        },
        Expr::Ternary {
            cond,
            then_value,
            else_value,
        } => Expr::Ternary {
            cond: boxed(cx, out, indent, cond),
            then_value: then_value.clone(),
            else_value: else_value.clone(),
        },
        Expr::Paren(inner) => Expr::Paren(boxed(cx, out, indent, inner)),
        Expr::Cast { ty, expr } => Expr::Cast {
            ty: ty.clone(),
            expr: boxed(cx, out, indent, expr),
        },
        other => other.clone(),
    }
}

fn boxed(cx: &mut TranslationContext, out: &mut OutputBuffer, indent: usize, e: &Expr) -> Box<Expr> {
    Box::new(hoist_calls(cx, out, indent, e))
}

fn hoist_all(cx: &mut TranslationContext, out: &mut OutputBuffer, indent: usize, args: &[Expr]) -> Vec<Expr> {
    args.iter().map(|a| hoist_calls(cx, out, indent, a)).collect()
}

/// `init` starts `main` and waits for it to finish
pub fn emit_init(cx: &TranslationContext, out: &mut OutputBuffer) {
    let Some(main) = cx.function("main") else {
        tracing::info!("no main function; init omitted");
        return;
    };
    let kind = if main.returns_value { "int" } else { "bit" };
    let mut actuals = vec!["ret_main".to_string()];
    actuals.extend(main.params.iter().map(|_| "0".to_string()));

    out.emit(0, "init {");
    out.emit(1, format!("chan ret_main = [0] of {{ {} }};", kind));
    out.emit(1, format!("run main({});", actuals.join(", ")));
    out.emit(1, "ret_main ? _;");
    out.emit(0, "}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, Param, Stmt};

    fn sum_def() -> FunctionDef {
        FunctionDef {
            name: "sum".into(),
            return_type: CType::named("int"),
            params: vec![
                Param {
                    name: "a".into(),
                    ty: CType::named("int"),
                },
                Param {
                    name: "b".into(),
                    ty: CType::named("int"),
                },
            ],
            body: vec![Stmt::Return(Some(Expr::binary(
                BinaryOp::Add,
                Expr::ident("a"),
                Expr::ident("b"),
            )))],
        }
    }

    #[test]
    fn test_value_function() {
        let mut cx = TranslationContext::new();
        let mut out = OutputBuffer::new();
        translate_function(&mut cx, &mut out, &sum_def());
        assert_eq!(
            out.render(4),
            "proctype sum(chan in_sum; int a; int b) {\n    in_sum ! a + b;\n    goto end;\nend:\n    printf(\"End of sum\\n\");\n}\n\n"
        );
    }

    #[test]
    fn test_void_function_has_no_channel() {
        let mut cx = TranslationContext::new();
        let mut out = OutputBuffer::new();
        let def = FunctionDef {
            name: "tick".into(),
            return_type: CType::Void,
            params: vec![],
            body: vec![Stmt::Return(None)],
        };
        translate_function(&mut cx, &mut out, &def);
        let text = out.render(4);
        assert!(text.starts_with("proctype tick() {\n    goto end;\nend:\n"));
        assert!(!text.contains(" ! "));
    }

    #[test]
    fn test_value_call_assignment() {
        let mut cx = TranslationContext::new();
        translate_function(&mut cx, &mut OutputBuffer::new(), &sum_def());

        let mut out = OutputBuffer::new();
        let call = Expr::call("sum", vec![Expr::lit("1"), Expr::lit("2")]);
        control::assign_value(&mut cx, &mut out, 0, &Expr::ident("r"), &call);
        control::assign_value(&mut cx, &mut out, 0, &Expr::ident("s"), &call);
        assert_eq!(
            out.render(4),
            "chan ret_sum = [0] of { int };\nrun sum(ret_sum, 1, 2);\nret_sum ? r;\nchan ret_sum1 = [0] of { int };\nrun sum(ret_sum1, 1, 2);\nret_sum1 ? s;\n"
        );
    }

    #[test]
    fn test_call_statements() {
        let mut cx = TranslationContext::new();
        translate_function(&mut cx, &mut OutputBuffer::new(), &sum_def());
        translate_function(
            &mut cx,
            &mut OutputBuffer::new(),
            &FunctionDef {
                name: "tick".into(),
                return_type: CType::Void,
                params: vec![],
                body: vec![],
            },
        );

        let mut out = OutputBuffer::new();
        translate_call_stmt(&mut cx, &mut out, 0, "tick", &[]);
        translate_call_stmt(&mut cx, &mut out, 0, "sum", &[Expr::lit("1"), Expr::lit("2")]);
        translate_call_stmt(&mut cx, &mut out, 0, "printf", &[Expr::lit("\"hi\\n\"")]);
        assert_eq!(
            out.render(4),
            "run tick();\nchan ret_sum = [0] of { int };\nrun sum(ret_sum, 1, 2);\nret_sum ? _;\nprintf(\"hi\\n\");\n"
        );
    }

    #[test]
    fn test_return_of_call() {
        let mut cx = TranslationContext::new();
        translate_function(&mut cx, &mut OutputBuffer::new(), &sum_def());
        let mut out = OutputBuffer::new();
        translate_function(
            &mut cx,
            &mut out,
            &FunctionDef {
                name: "twice".into(),
                return_type: CType::named("int"),
                params: vec![],
                body: vec![Stmt::Return(Some(Expr::call(
                    "sum",
                    vec![Expr::lit("1"), Expr::lit("1")],
                )))],
            },
        );
        let text = out.render(4);
        assert!(text.contains(
            "    int tmp;\n    chan ret_sum = [0] of { int };\n    run sum(ret_sum, 1, 1);\n    ret_sum ? tmp;\n    in_twice ! tmp;\n    goto end;\n"
        ));
    }

    #[test]
    fn test_recursive_call_in_return_value() {
        let mut cx = TranslationContext::new();
        let mut out = OutputBuffer::new();
        let fact = FunctionDef {
            name: "fact".into(),
            return_type: CType::named("int"),
            params: vec![Param {
                name: "n".into(),
                ty: CType::named("int"),
            }],
            body: vec![Stmt::Return(Some(Expr::binary(
                BinaryOp::Mul,
                Expr::ident("n"),
                Expr::call(
                    "fact",
                    vec![Expr::binary(BinaryOp::Sub, Expr::ident("n"), Expr::lit("1"))],
                ),
            )))],
        };
        translate_function(&mut cx, &mut out, &fact);
        assert_eq!(
            out.render(4),
            "proctype fact(chan in_fact; int n) {\n    int val_fact;\n    chan ret_fact = [0] of { int };\n    run fact(ret_fact, n - 1);\n    ret_fact ? val_fact;\n    in_fact ! n * val_fact;\n    goto end;\nend:\n    printf(\"End of fact\\n\");\n}\n\n"
        );
    }

    #[test]
    fn test_nested_value_calls_run_innermost_first() {
        let mut cx = TranslationContext::new();
        translate_function(&mut cx, &mut OutputBuffer::new(), &sum_def());
        let mut out = OutputBuffer::new();
        let inner = Expr::call("sum", vec![Expr::lit("1"), Expr::lit("2")]);
        let value = Expr::binary(
            BinaryOp::Add,
            Expr::call("sum", vec![inner, Expr::lit("3")]),
            Expr::lit("1"),
        );
        let hoisted = hoist_calls(&mut cx, &mut out, 0, &value);
        assert_eq!(expr::render(&mut cx, &hoisted), "val_sum1 + 1");
        assert_eq!(
            out.render(4),
            "int val_sum;\nchan ret_sum = [0] of { int };\nrun sum(ret_sum, 1, 2);\nret_sum ? val_sum;\nint val_sum1;\nchan ret_sum1 = [0] of { int };\nrun sum(ret_sum1, val_sum, 3);\nret_sum1 ? val_sum1;\n"
        );
    }

    #[test]
    fn test_short_circuit_operand_keeps_call() {
        let mut cx = TranslationContext::new();
        translate_function(&mut cx, &mut OutputBuffer::new(), &sum_def());
        let mut out = OutputBuffer::new();
        let value = Expr::binary(
            BinaryOp::And,
            Expr::ident("ok"),
            Expr::call("sum", vec![Expr::lit("1"), Expr::lit("2")]),
        );
        let hoisted = hoist_calls(&mut cx, &mut out, 0, &value);
        assert!(out.is_empty());
        assert_eq!(hoisted, value);
    }

    #[test]
    fn test_free_record() {
        let mut cx = TranslationContext::new();
        cx.declare("p", CType::Struct("item".into()).pointer_to());
        let mut out = OutputBuffer::new();
        translate_call_stmt(&mut cx, &mut out, 0, "free", &[Expr::ident("p")]);
        let text = out.render(4);
        assert!(text.starts_with("d_step {\n    item_valid[p] = 0;\n"));
    }

    #[test]
    fn test_init_block() {
        let mut cx = TranslationContext::new();
        translate_function(
            &mut cx,
            &mut OutputBuffer::new(),
            &FunctionDef {
                name: "main".into(),
                return_type: CType::named("int"),
                params: vec![Param {
                    name: "argc".into(),
                    ty: CType::named("int"),
                }],
                body: vec![Stmt::Return(Some(Expr::lit("0")))],
            },
        );
        let mut out = OutputBuffer::new();
        emit_init(&cx, &mut out);
        assert_eq!(
            out.render(4),
            "init {\n    chan ret_main = [0] of { int };\n    run main(ret_main, 0);\n    ret_main ? _;\n}\n"
        );
    }

    #[test]
    fn test_no_main_no_init() {
        let cx = TranslationContext::new();
        let mut out = OutputBuffer::new();
        emit_init(&cx, &mut out);
        assert!(out.is_empty());
    }
}

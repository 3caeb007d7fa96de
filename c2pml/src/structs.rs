// structs.rs - Records, backing stores and variable declarations
//
// A C struct becomes a Promela `typedef` in which pointers and nested
// structs are plain `int` slot indices, followed by its pool arrays.
// Variable declarations (locals and globals) are rendered here as well.

use crate::ast::{CType, Expr, StructDef, VarDecl};
use crate::context::{FieldDescriptor, FieldKind, StructDescriptor, TranslationContext};
use crate::emit::OutputBuffer;
use crate::expr;
use crate::memory::{self, Pool};
use crate::types::{self, PmlType};

/// Build the descriptor for `def` without emitting anything
pub fn describe_struct(cx: &mut TranslationContext, def: &StructDef) -> StructDescriptor {
    let fields = def
        .fields
        .iter()
        .map(|field| FieldDescriptor {
            name: field.name.clone(),
            kind: field_kind(cx, &field.ty),
            ty: field.ty.clone(),
        })
        .collect();
    StructDescriptor {
        name: def.name.clone(),
        fields,
    }
}

fn field_kind(cx: &mut TranslationContext, ty: &CType) -> FieldKind {
    if let Some(name) = cx.struct_name_of(ty) {
        return FieldKind::NestedIndex(name);
    }
    match cx.resolve(ty).clone() {
        CType::Named(name) => FieldKind::Scalar(types::map_scalar(&name)),
        CType::Pointer(_) => FieldKind::PointerIndex,
        CType::Array { elem, len } => {
            let elem = match cx.resolve(&elem).clone() {
                CType::Named(name) if !cx.has_struct(&name) => types::map_scalar(&name),
                CType::Pointer(_) | CType::Struct(_) | CType::Named(_) => PmlType::Int,
                _ => return FieldKind::Unsupported,
            };
            match len {
                Some(len) if is_constant(&len) => FieldKind::Array {
                    elem,
                    len: expr::render(cx, &len),
                },
                _ => FieldKind::Unsupported,
            }
        }
        CType::Struct(name) => FieldKind::NestedIndex(name),
        CType::Void | CType::Unsupported(_) => FieldKind::Unsupported,
    }
}

/// Emit the record type of `def` and its pool, and register it
pub fn translate_struct(cx: &mut TranslationContext, out: &mut OutputBuffer, def: &StructDef) {
    let descriptor = describe_struct(cx, def);
    tracing::debug!(name = %def.name, fields = descriptor.fields.len(), "struct");

    if descriptor.fields.is_empty() {
        out.unsupported(0, &format!("struct {} without fields", def.name));
        out.blank();
        cx.add_struct(descriptor);
        return;
    }

    out.emit(0, format!("typedef {} {{", def.name));
    for field in &descriptor.fields {
        match &field.kind {
            FieldKind::Scalar(kind) => out.emit(1, format!("{} {};", kind, field.name)),
            FieldKind::PointerIndex | FieldKind::NestedIndex(_) => {
                out.emit(1, format!("int {};", field.name))
            }
            FieldKind::Array { elem, len } => {
                out.emit(1, format!("{} {}[{}];", elem, field.name, len))
            }
            FieldKind::Unsupported => {
                cx.warn(&format!("field {} of struct {}", field.name, def.name));
                out.unsupported(1, &format!("field {}", field.name));
            }
        }
    }
    out.emit(0, "}");
    memory::emit_pool_arrays(out, 0, &Pool::Record(def.name.clone()));
    out.blank();
    cx.add_struct(descriptor);
}

/// Whether an array bound can be used as a Promela array size
pub fn is_constant(expr: &Expr) -> bool {
    match expr {
        Expr::Literal(text) => text.chars().next().is_some_and(|c| c.is_ascii_digit()),
        Expr::SizeOf(_) => true,
        Expr::Paren(inner) | Expr::Cast { expr: inner, .. } => is_constant(inner),
        Expr::Unary { operand, .. } => is_constant(operand),
        Expr::Binary { lhs, rhs, .. } => is_constant(lhs) && is_constant(rhs),
        _ => false,
    }
}

/// Declaration text for a variable, or why it cannot be declared
pub fn declaration(cx: &mut TranslationContext, name: &str, ty: &CType) -> Result<String, String> {
    if let Some(record) = cx.struct_name_of(ty) {
        return Ok(format!("{} {}", record, name));
    }
    match cx.resolve(ty).clone() {
        CType::Named(scalar) => Ok(format!("{} {}", types::map_scalar(&scalar), name)),
        CType::Pointer(_) => Ok(format!("int {}", name)),
        CType::Struct(record) => Ok(format!("{} {}", record, name)),
        CType::Array { elem, len } => {
            let elem_name = if let Some(record) = cx.struct_name_of(&elem) {
                record
            } else {
                match cx.resolve(&elem) {
                    CType::Named(scalar) => types::map_scalar(scalar).to_string(),
                    CType::Pointer(_) => "int".to_string(),
                    CType::Array { .. } => {
                        return Err(format!("multi-dimensional array {}", name))
                    }
                    _ => return Err(format!("array element type of {}", name)),
                }
            };
            match len {
                Some(len) if is_constant(&len) => {
                    Ok(format!("{} {}[{}]", elem_name, name, expr::render(cx, &len)))
                }
                Some(_) => Err(format!("non-constant array bound of {}", name)),
                None => Err(format!("array {} without a bound", name)),
            }
        }
        CType::Void => Err(format!("void variable {}", name)),
        CType::Unsupported(what) => Err(format!("type of {} ({})", name, what)),
    }
}

/// Declare a process-local variable unless it is already declared.
/// The initializer is left to the caller.
pub fn declare_local(
    cx: &mut TranslationContext,
    out: &mut OutputBuffer,
    indent: usize,
    decl: &VarDecl,
) {
    if cx.is_declared(&decl.name) {
        return;
    }
    match declaration(cx, &decl.name, &decl.ty) {
        Ok(text) => out.emit(indent, format!("{};", text)),
        Err(reason) => {
            cx.warn(&reason);
            out.unsupported(indent, &reason);
        }
    }
    cx.declare(&decl.name, decl.ty.clone());
}

/// Emit a global variable, with its initializer when it has one
pub fn translate_global(cx: &mut TranslationContext, out: &mut OutputBuffer, decl: &VarDecl) {
    if !cx.declare_global(&decl.name, decl.ty.clone()) {
        return;
    }
    tracing::debug!(name = %decl.name, "global");
    let text = match declaration(cx, &decl.name, &decl.ty) {
        Ok(text) => text,
        Err(reason) => {
            cx.warn(&reason);
            out.unsupported(0, &reason);
            return;
        }
    };
    match &decl.init {
        None => out.emit(0, format!("{};", text)),
        Some(Expr::InitList(_)) => {
            cx.warn(&format!("initializer list of global {}", decl.name));
            out.emit(0, format!("{};", text));
            out.unsupported(0, &format!("initializer list of {}", decl.name));
        }
        Some(init) => {
            let value = expr::render(cx, init);
            for note in cx.take_notes() {
                out.unsupported(0, &note);
            }
            out.emit(0, format!("{} = {};", text, value));
        }
    }
}

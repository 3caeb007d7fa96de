// translate.rs - Program to Promela model
//
// Every function is registered first, so a call may precede the callee's
// definition. Items are then visited in source order. Record types, typedefs
// and globals go to the declaration section, functions to the process
// section; scalar pools are only known once every process has been
// translated, so they are placed between the two when the model is rendered.

use crate::ast::{Item, Program};
use crate::context::TranslationContext;
use crate::emit::OutputBuffer;
use crate::function;
use crate::memory;
use crate::structs;

/// Rendering options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Spaces per nesting level
    pub indent_width: usize,
    /// Emit the `init` block that starts `main`
    pub emit_init: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            indent_width: 4,
            emit_init: true,
        }
    }
}

/// A translated model, section by section
#[derive(Debug, Default)]
pub struct PmlModel {
    /// Record types, pools of record types and globals
    pub declarations: OutputBuffer,
    /// Pools backing pointers to primitive values
    pub scalar_pools: OutputBuffer,
    /// One `proctype` per function
    pub processes: OutputBuffer,
    pub init: OutputBuffer,
    pub process_count: usize,
    pub struct_count: usize,
}

impl PmlModel {
    pub fn render(&self, indent_width: usize) -> String {
        let mut out = String::new();
        for section in [
            &self.declarations,
            &self.scalar_pools,
            &self.processes,
            &self.init,
        ] {
            out.push_str(&section.render(indent_width));
        }
        out
    }

    /// Number of constructs marked unsupported in the output
    pub fn unsupported_count(&self) -> usize {
        [
            &self.declarations,
            &self.scalar_pools,
            &self.processes,
            &self.init,
        ]
        .iter()
        .flat_map(|section| section.lines())
        .filter(|line| line.text.starts_with("/* unsupported:"))
        .count()
    }
}

/// Translate `program` into its model sections
pub fn build(program: &Program, options: &Options) -> PmlModel {
    let mut cx = TranslationContext::new();
    let mut model = PmlModel::default();

    for item in &program.items {
        if let Item::Function(def) = item {
            cx.register_function(def);
        }
    }

    for item in &program.items {
        match item {
            Item::Struct(def) => {
                structs::translate_struct(&mut cx, &mut model.declarations, def);
                model.struct_count += 1;
            }
            Item::Typedef { name, ty } => {
                tracing::debug!(alias = %name, "typedef");
                cx.add_typedef(name, ty.clone());
            }
            Item::Global(decl) => structs::translate_global(&mut cx, &mut model.declarations, decl),
            Item::Function(def) => {
                function::translate_function(&mut cx, &mut model.processes, def);
                model.process_count += 1;
            }
            Item::Unsupported(what) => {
                cx.warn(&format!("top-level {}", what));
                model.declarations.unsupported(0, what);
            }
        }
    }

    // Keep globals apart from what follows
    if model
        .declarations
        .lines()
        .last()
        .is_some_and(|line| !line.text.is_empty())
    {
        model.declarations.blank();
    }

    memory::emit_scalar_pools(&cx, &mut model.scalar_pools);

    if options.emit_init {
        function::emit_init(&cx, &mut model.init);
    }

    tracing::info!(
        processes = model.process_count,
        structs = model.struct_count,
        unsupported = model.unsupported_count(),
        "translation finished"
    );
    model
}

/// Translate `program` into Promela text
pub fn translate(program: &Program, options: &Options) -> String {
    build(program, options).render(options.indent_width)
}

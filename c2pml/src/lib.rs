// c2pml - C subset to Promela translator
//
// This library turns sequential, pointer- and struct-using C into a Promela
// model that the SPIN model checker can explore exhaustively.
//
// # Architecture
//
// The translator works in several phases:
//
// 1. **Front-end** (`frontend/`): C text via tree-sitter, or a serialized
//    tree via serde, lowered into the closed syntax tree in `ast.rs`
// 2. **Declarations** (`structs.rs`, `types.rs`): record types, backing
//    pools and variables
// 3. **Processes** (`function.rs`, `control.rs`, `expr.rs`): one `proctype`
//    per function, control flow as guarded commands
// 4. **Emission** (`emit.rs`, `translate.rs`): indented text, section order
//
// # Memory Model
//
// The heap is replaced by a fixed pool per pointee type (`memory.rs`):
// - `<T>_mem[9]` holds the records, `<T>_valid[9]` marks live slots
// - A pointer is a slot index; slot 0 is NULL
// - Allocation is a first-fit scan in `atomic`, asserting the pool is not
//   exhausted
//
// # Calls
//
// Functions run as separate processes. A call that produces a value passes a
// fresh rendezvous channel and blocks on `? result`; the callee sends its
// return value on that channel and jumps to its `end:` label.

pub mod ast;
pub mod context;
pub mod control;
pub mod emit;
pub mod error;
pub mod expr;
pub mod frontend;
pub mod function;
pub mod memory;
pub mod structs;
pub mod translate;
pub mod types;

pub use ast::Program;
pub use error::FrontendError;
pub use translate::{Options, PmlModel};

/// Translate C source text to Promela
#[cfg(feature = "c-frontend")]
pub fn compile(source: &str, options: &Options) -> anyhow::Result<String> {
    // Parse and lower
    let program = frontend::c::parse(source)?;

    // Translate
    Ok(translate::translate(&program, options))
}

/// Translate a JSON-serialized syntax tree to Promela
pub fn compile_json(text: &str, options: &Options) -> anyhow::Result<String> {
    let program = frontend::json::parse(text)?;
    Ok(translate::translate(&program, options))
}

// json.rs - Trees exchanged as JSON
//
// The format is the serde form of `ast::Program`, so a tree produced by any
// front-end, or by hand, can be translated without tree-sitter.

use crate::ast::Program;
use crate::error::FrontendResult;

/// Decode a program from its JSON form
pub fn parse(text: &str) -> FrontendResult<Program> {
    let program: Program = serde_json::from_str(text)?;
    tracing::debug!(items = program.items.len(), "decoded AST document");
    Ok(program)
}

/// Encode a program, e.g. to feed `--ast-json` or the browser build
pub fn to_string(program: &Program) -> FrontendResult<String> {
    Ok(serde_json::to_string_pretty(program)?)
}

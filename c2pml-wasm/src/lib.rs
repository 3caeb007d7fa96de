// c2pml-wasm: C to Promela translation in the browser
//
// This crate wraps the c2pml translator for use from JavaScript. It compiles
// to wasm32-unknown-unknown via wasm-bindgen. The C front-end (tree-sitter)
// is native code and is left out; the page hands over the syntax tree as
// JSON and gets the Promela text back.

use wasm_bindgen::prelude::*;

/// Translate a JSON syntax tree to Promela.
///
/// `indent_width` is the number of spaces per nesting level; `emit_init`
/// controls the trailing `init` block that starts `main`.
#[wasm_bindgen]
pub fn translate_ast(ast_json: &str, indent_width: u32, emit_init: bool) -> Result<String, JsValue> {
    translate_ast_inner(ast_json, indent_width as usize, emit_init)
        .map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}

fn translate_ast_inner(ast_json: &str, indent_width: usize, emit_init: bool) -> anyhow::Result<String> {
    let options = c2pml::Options {
        indent_width,
        emit_init,
    };
    c2pml::compile_json(ast_json, &options)
}

/// Get version string
#[wasm_bindgen]
pub fn version() -> String {
    format!("c2pml-wasm {}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN_ONLY: &str = r#"{
        "items": [
            { "function": { "name": "main", "return_type": "void", "params": [], "body": [] } }
        ]
    }"#;

    #[test]
    fn test_translate_tree() {
        let pml = translate_ast_inner(MAIN_ONLY, 2, true).unwrap();
        assert!(pml.starts_with("proctype main(chan in_main) {\n"));
        assert!(pml.contains("  in_main ! 0;\n"));
        assert!(pml.ends_with("  ret_main ? _;\n}\n"));
    }

    #[test]
    fn test_without_init() {
        let pml = translate_ast_inner(MAIN_ONLY, 4, false).unwrap();
        assert!(!pml.contains("init {"));
    }

    #[test]
    fn test_bad_document() {
        let err = translate_ast_inner("[1, 2", 4, true).unwrap_err();
        assert!(format!("{:#}", err).contains("invalid AST document"));
    }

    #[test]
    fn test_version() {
        assert!(version().starts_with("c2pml-wasm "));
    }
}

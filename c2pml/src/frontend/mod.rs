// frontend - Sources of `ast::Program`
//
// The translator core only sees the tree in `ast`. It is built either from
// C text (`c`, tree-sitter) or from a serialized tree (`json`), which lets
// other tools and the browser build hand the translator a tree directly.

#[cfg(feature = "c-frontend")]
pub mod c;
pub mod json;

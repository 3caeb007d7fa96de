// error.rs - Front-end errors
//
// Only failures to obtain a syntax tree are errors. Everything after that is
// best effort and reported through marker comments and logs.

use thiserror::Error;

/// Failure to obtain a syntax tree. Constructs that parse but cannot be
/// modeled are not errors; they are marked in the output instead.
#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("failed to load the C grammar: {0}")]
    Language(String),

    #[error("parser produced no tree")]
    NoTree,

    #[error("syntax error at {line}:{column}: unexpected `{found}`")]
    Syntax {
        /// 1-based
        line: usize,
        /// 1-based
        column: usize,
        found: String,
    },

    #[error("invalid UTF-8 in source node `{node}`")]
    Utf8 { node: String },

    #[error("invalid AST document: {0}")]
    Json(#[from] serde_json::Error),
}

pub type FrontendResult<T> = Result<T, FrontendError>;

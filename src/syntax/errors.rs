use crate::syntax::tree::SourceSpan;
use thiserror::Error;

/// Input text does not parse cleanly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("syntax error at line {line}, column {column}")]
pub struct SyntaxError {
    pub span: SourceSpan,
    pub line: usize,
    pub column: usize,
}

/// A fragment parsed, but could not be located inside its synthetic wrapper.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no node in the wrapped fragment has text {fragment:?}")]
    NotFound { fragment: String },

    #[error("{count} distinct nodes in the wrapped fragment have text {fragment:?}")]
    Ambiguous { fragment: String, count: usize },
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("failed to set language for parser")]
    LanguageSet,

    #[error("failed to parse source code")]
    ParseFailed,

    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

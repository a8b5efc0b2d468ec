use crate::syntax::{ExtractionError, ParseError, SyntaxError};
use thiserror::Error;

/// A pattern or replacement template is malformed.
///
/// These are configuration bugs: they surface when a catalog is loaded,
/// never while a file is being rewritten.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("pattern {pattern:?} does not parse: {source}")]
    Syntax {
        pattern: String,
        #[source]
        source: SyntaxError,
    },

    #[error("pattern {pattern:?} cannot be located in its wrapper: {source}")]
    Extraction {
        pattern: String,
        #[source]
        source: ExtractionError,
    },

    #[error("malformed placeholder in {pattern:?} at byte {offset}")]
    InvalidPlaceholder { pattern: String, offset: usize },

    #[error("placeholder '#{name}#' in {pattern:?} is not a whole syntax node")]
    DetachedPlaceholder { pattern: String, name: String },

    #[error("replacement {replacement:?} uses '#{name}#', which the pattern never binds")]
    UnboundPlaceholder { replacement: String, name: String },

    #[error(transparent)]
    Parser(#[from] ParseError),
}

//! Kotlin syntax trees built on tree-sitter.
//!
//! Source text is parsed with the Kotlin grammar bundled in
//! `ast-grep-language` and lowered into an owned arena ([`SyntaxTree`]) whose
//! node kinds form the closed [`SyntaxKind`] enum. Spans are byte offsets into
//! the original text, so comments and formatting are never lost.

pub mod errors;
pub mod kind;
pub mod parser;
pub mod tree;

pub use errors::{ExtractionError, ParseError, SyntaxError};
pub use kind::SyntaxKind;
pub use parser::{Fragment, FragmentKind, KotlinParser};
pub use tree::{Node, NodeId, Preorder, SourceSpan, SyntaxTree};

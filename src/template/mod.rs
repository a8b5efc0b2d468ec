//! Structural templates with `#name#` placeholders.
//!
//! A template is a Kotlin fragment compiled into a node-shaped pattern.
//! Matching walks a [`SyntaxTree`](crate::syntax::SyntaxTree) and unifies
//! each node with the pattern, binding placeholders to whole subtrees; the
//! renderer then turns a match into replacement text.

pub mod compiler;
pub mod errors;
pub mod matcher;
pub mod render;
pub mod rule;

pub use compiler::{Match, Template};
pub use errors::TemplateError;
pub use matcher::{find_matches, Matches};
pub use render::{
    is_atomic, needs_parentheses, operand_text, parenthesize_operand, receiver_text, substitute,
    Replacement,
};
pub use rule::Rule;

use crate::syntax::{Node, SyntaxKind};
use crate::template::compiler::{placeholder_tokens, Match};
use std::fmt;

type ContextFn = dyn Fn(&Match<'_>) -> String + Send + Sync;

/// How the text for a match is produced.
pub enum Replacement {
    /// Flat template: every `#name#` is replaced by the bound node's text,
    /// verbatim and without re-indentation.
    Template(String),
    /// Arbitrary function of the match, for idioms whose output depends on
    /// where the matched node sits.
    Context(Box<ContextFn>),
}

impl Replacement {
    pub fn template(text: impl Into<String>) -> Self {
        Replacement::Template(text.into())
    }

    pub fn context<F>(render: F) -> Self
    where
        F: Fn(&Match<'_>) -> String + Send + Sync + 'static,
    {
        Replacement::Context(Box::new(render))
    }

    /// Template for an equality-level expression.
    ///
    /// Each binding that binds looser than `==` is parenthesized before
    /// substitution, and the result is parenthesized when the match is an
    /// operand of a larger expression.
    pub fn operand_template(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::context(move |m| parenthesize_operand(m, substitute_with(&text, m, operand_text)))
    }

    /// Compute the replacement text for `m`.
    pub fn render(&self, m: &Match<'_>) -> String {
        match self {
            Replacement::Template(text) => substitute(text, m),
            Replacement::Context(render) => render(m),
        }
    }

    /// The flat template text, if this is a flat replacement.
    pub fn template_text(&self) -> Option<&str> {
        match self {
            Replacement::Template(text) => Some(text),
            Replacement::Context(_) => None,
        }
    }
}

impl fmt::Debug for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Replacement::Template(text) => f.debug_tuple("Template").field(text).finish(),
            Replacement::Context(_) => f.write_str("Context(..)"),
        }
    }
}

/// Replace each bound `#name#` in `template` with the text bound to `name`.
///
/// Tokens naming a placeholder the match does not bind are kept verbatim.
pub fn substitute(template: &str, m: &Match<'_>) -> String {
    substitute_with(template, m, |node| node.text().to_string())
}

fn substitute_with(
    template: &str,
    m: &Match<'_>,
    text_of: impl Fn(Node<'_>) -> String,
) -> String {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for (range, name) in placeholder_tokens(template) {
        out.push_str(&template[last..range.start]);
        match m.binding(name) {
            Some(node) => out.push_str(&text_of(node)),
            None => out.push_str(&template[range.clone()]),
        }
        last = range.end;
    }
    out.push_str(&template[last..]);
    out
}

/// Whether an expression replacing `node` must be parenthesized to keep
/// binding to the same operand position.
pub fn needs_parentheses(node: Node<'_>) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    match parent.kind() {
        SyntaxKind::AdditiveExpression
        | SyntaxKind::MultiplicativeExpression
        | SyntaxKind::ComparisonExpression
        | SyntaxKind::EqualityExpression
        | SyntaxKind::ConjunctionExpression
        | SyntaxKind::DisjunctionExpression
        | SyntaxKind::ElvisExpression
        | SyntaxKind::InfixExpression
        | SyntaxKind::RangeExpression
        | SyntaxKind::CheckExpression
        | SyntaxKind::PrefixExpression
        | SyntaxKind::PostfixExpression
        | SyntaxKind::AsExpression => true,
        // Only the receiver side of `a.b` binds tighter than the replacement.
        SyntaxKind::NavigationExpression | SyntaxKind::CallExpression => {
            parent.significant_children().next() == Some(node)
        }
        _ => false,
    }
}

/// Whether `node` can be used as a receiver or operand without parentheses.
pub fn is_atomic(node: Node<'_>) -> bool {
    match node.kind() {
        SyntaxKind::SimpleIdentifier
        | SyntaxKind::ThisExpression
        | SyntaxKind::ParenthesizedExpression
        | SyntaxKind::CallExpression
        | SyntaxKind::NavigationExpression
        | SyntaxKind::StringLiteral
        | SyntaxKind::IntegerLiteral
        | SyntaxKind::RealLiteral
        | SyntaxKind::BooleanLiteral
        | SyntaxKind::CharacterLiteral => true,
        // A single-child wrapper is as atomic as what it wraps.
        SyntaxKind::ValueArgument | SyntaxKind::DirectlyAssignableExpression => {
            let mut children = node.significant_children();
            match (children.next(), children.next()) {
                (Some(only), None) => is_atomic(only),
                _ => false,
            }
        }
        _ => false,
    }
}

/// Text of `node` ready to be used as an operand of `==`.
///
/// Expressions that bind at least as loosely as equality (`||`, `&&`,
/// `==`, `if`, ...) are parenthesized.
pub fn operand_text(node: Node<'_>) -> String {
    if binds_tighter_than_equality(node) {
        node.text().to_string()
    } else {
        format!("({})", node.text())
    }
}

fn binds_tighter_than_equality(node: Node<'_>) -> bool {
    match node.kind() {
        SyntaxKind::ComparisonExpression
        | SyntaxKind::InfixExpression
        | SyntaxKind::ElvisExpression
        | SyntaxKind::RangeExpression
        | SyntaxKind::AdditiveExpression
        | SyntaxKind::MultiplicativeExpression
        | SyntaxKind::AsExpression
        | SyntaxKind::PrefixExpression
        | SyntaxKind::PostfixExpression
        | SyntaxKind::CheckExpression
        | SyntaxKind::LambdaLiteral => true,
        SyntaxKind::ValueArgument => {
            let mut children = node.significant_children();
            match (children.next(), children.next()) {
                (Some(only), None) => binds_tighter_than_equality(only),
                _ => false,
            }
        }
        _ => is_atomic(node),
    }
}

/// Wrap `text` in parentheses when the match is an operand.
pub fn parenthesize_operand(m: &Match<'_>, text: String) -> String {
    if needs_parentheses(m.root()) {
        format!("({text})")
    } else {
        text
    }
}

/// Text of `node` ready to be used as a method receiver.
pub fn receiver_text(node: Node<'_>) -> String {
    if is_atomic(node) {
        node.text().to_string()
    } else {
        format!("({})", node.text())
    }
}

use crate::syntax::{Fragment, FragmentKind, KotlinParser, Node, NodeId, ParseError};
use crate::template::errors::TemplateError;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use std::ops::Range;

/// A compiled structural pattern.
///
/// # Placeholder Syntax
///
/// - `#name#` - matches any single node and binds it to `name`
/// - a name may appear more than once; every occurrence must then bind to
///   nodes with identical text
///
/// # Example Patterns
///
/// ```text
/// Lib.equals(#a#, #b#)          // two-argument static call
/// Strings.isNullOrEmpty(#s#)    // single argument
/// #x#.equals(#x#)               // comparison of an expression with itself
/// ```
#[derive(Debug, Clone)]
pub struct Template {
    pattern: String,
    fragment: Fragment,
    placeholders: IndexSet<String>,
    holes: HashMap<NodeId, String>,
}

impl Template {
    /// Compile an expression pattern.
    pub fn compile(parser: &mut KotlinParser, pattern: &str) -> Result<Self, TemplateError> {
        Self::compile_as(parser, FragmentKind::Expression, pattern)
    }

    /// Compile a pattern in an explicit syntactic context.
    pub fn compile_as(
        parser: &mut KotlinParser,
        kind: FragmentKind,
        pattern: &str,
    ) -> Result<Self, TemplateError> {
        let mut placeholders = IndexSet::new();
        let mut source = String::with_capacity(pattern.len() + 16);
        let mut last = 0;

        for (range, name) in placeholder_tokens(pattern) {
            push_literal(&mut source, pattern, last..range.start)?;
            source.push_str(&hole_identifier(name));
            placeholders.insert(name.to_string());
            last = range.end;
        }
        push_literal(&mut source, pattern, last..pattern.len())?;

        let fragment = parser
            .parse_fragment_as(kind, &source)
            .map_err(|error| match error {
                ParseError::Syntax(source) => TemplateError::Syntax {
                    pattern: pattern.to_string(),
                    source,
                },
                ParseError::Extraction(source) => TemplateError::Extraction {
                    pattern: pattern.to_string(),
                    source,
                },
                other => TemplateError::Parser(other),
            })?;

        let by_identifier: HashMap<String, &String> = placeholders
            .iter()
            .map(|name| (hole_identifier(name), name))
            .collect();
        let holes: HashMap<NodeId, String> = fragment
            .node()
            .descendants()
            .filter(|node| node.is_leaf())
            .filter_map(|node| {
                by_identifier
                    .get(node.text())
                    .map(|name| (node.id(), (*name).clone()))
            })
            .collect();

        for name in &placeholders {
            if !holes.values().any(|bound| bound == name) {
                return Err(TemplateError::DetachedPlaceholder {
                    pattern: pattern.to_string(),
                    name: name.clone(),
                });
            }
        }

        Ok(Self {
            pattern: pattern.to_string(),
            fragment,
            placeholders,
            holes,
        })
    }

    /// The pattern text as written, with `#name#` tokens.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Distinct placeholder names in order of first appearance.
    pub fn placeholders(&self) -> &IndexSet<String> {
        &self.placeholders
    }

    /// The node-shaped pattern tree.
    pub fn shape(&self) -> Node<'_> {
        self.fragment.node()
    }

    /// Try to unify the template with `candidate`.
    ///
    /// Returns `None` on any structural mismatch, when a repeated
    /// placeholder would bind to nodes with different text, or when the
    /// candidate carries a comment outside every bound subtree. A rewrite
    /// would drop such a comment.
    pub fn match_node<'t>(&self, candidate: Node<'t>) -> Option<Match<'t>> {
        let mut bindings = IndexMap::new();
        self.unify(self.shape(), candidate, &mut bindings)?;
        Some(Match {
            root: candidate,
            bindings,
        })
    }

    fn unify<'t>(
        &self,
        pattern: Node<'_>,
        candidate: Node<'t>,
        bindings: &mut IndexMap<String, Node<'t>>,
    ) -> Option<()> {
        if let Some(name) = self.holes.get(&pattern.id()) {
            return match bindings.get(name) {
                Some(bound) if bound.text() != candidate.text() => None,
                Some(_) => Some(()),
                None => {
                    bindings.insert(name.clone(), candidate);
                    Some(())
                }
            };
        }

        if pattern.kind() != candidate.kind() {
            return None;
        }
        if candidate.children().any(|child| child.kind().is_trivia()) {
            return None;
        }

        let mut pattern_children = pattern.significant_children().peekable();
        if pattern_children.peek().is_none() {
            return (pattern.text() == candidate.text()).then_some(());
        }

        let pattern_children: Vec<_> = pattern_children.collect();
        let candidate_children: Vec<_> = candidate.significant_children().collect();
        if pattern_children.len() != candidate_children.len() {
            return None;
        }
        for (pattern_child, candidate_child) in pattern_children.into_iter().zip(candidate_children) {
            self.unify(pattern_child, candidate_child, bindings)?;
        }
        Some(())
    }
}

/// A successful unification of a template with one node.
#[derive(Debug, Clone)]
pub struct Match<'t> {
    root: Node<'t>,
    bindings: IndexMap<String, Node<'t>>,
}

impl<'t> Match<'t> {
    /// The matched node.
    pub fn root(&self) -> Node<'t> {
        self.root
    }

    /// The node bound to `name`, if the template has that placeholder.
    pub fn binding(&self, name: &str) -> Option<Node<'t>> {
        self.bindings.get(name).copied()
    }

    /// Text bound to `name`.
    pub fn text(&self, name: &str) -> Option<&'t str> {
        self.binding(name).map(|node| node.text())
    }

    /// All bindings, in order of first binding.
    pub fn bindings(&self) -> &IndexMap<String, Node<'t>> {
        &self.bindings
    }
}

/// Reserved identifier standing in for a placeholder while parsing.
fn hole_identifier(name: &str) -> String {
    format!("__hole_{name}__")
}

fn push_literal(
    out: &mut String,
    pattern: &str,
    range: Range<usize>,
) -> Result<(), TemplateError> {
    let literal = &pattern[range.clone()];
    if let Some(offset) = literal.find('#') {
        return Err(TemplateError::InvalidPlaceholder {
            pattern: pattern.to_string(),
            offset: range.start + offset,
        });
    }
    out.push_str(literal);
    Ok(())
}

/// Well-formed `#name#` tokens in `text`, left to right.
pub(crate) fn placeholder_tokens(text: &str) -> impl Iterator<Item = (Range<usize>, &str)> {
    let mut position = 0;
    std::iter::from_fn(move || loop {
        let open = position + text[position..].find('#')?;
        let close = open + 1 + text[open + 1..].find('#')?;
        let name = &text[open + 1..close];
        if is_placeholder_name(name) {
            position = close + 1;
            return Some((open..close + 1, name));
        }
        position = open + 1;
    })
}

fn is_placeholder_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_ascii_alphabetic() => {
            chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        }
        _ => false,
    }
}

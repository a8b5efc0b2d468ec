use crate::syntax::errors::{ExtractionError, ParseError};
use crate::syntax::kind::SyntaxKind;
use crate::syntax::tree::{Node, NodeId, SourceSpan, SyntaxTree};
use ast_grep_language::{LanguageExt, SupportLang};
use tree_sitter::Parser;

/// Syntactic context a fragment is parsed in.
///
/// Each context wraps the fragment in the smallest Kotlin compilation unit
/// that accepts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FragmentKind {
    /// A complete top-level declaration.
    File,
    /// A member of a class body.
    ClassBody,
    /// A statement inside a function body.
    FunctionBody,
    /// An expression.
    #[default]
    Expression,
    /// A parenthesized parameter list, e.g. `(a: Int, b: String)`.
    ParameterList,
    /// An annotation, e.g. `@Deprecated("x")`.
    Decorator,
}

impl FragmentKind {
    fn wrap(self, fragment: &str) -> String {
        match self {
            FragmentKind::File => fragment.to_string(),
            FragmentKind::ClassBody => format!("class __Wrapper__ {{\n{fragment}\n}}\n"),
            FragmentKind::FunctionBody => format!("fun __wrapper__() {{\n{fragment}\n}}\n"),
            FragmentKind::Expression => format!("val __wrapper__ = {fragment}\n"),
            FragmentKind::ParameterList => format!("fun __wrapper__{fragment} {{}}\n"),
            FragmentKind::Decorator => format!("{fragment} fun __wrapper__() {{}}\n"),
        }
    }
}

/// Tree-sitter parser wrapper for Kotlin source code.
///
/// A parser is not thread-safe: each thread that parses needs its own
/// instance, and callers that share one must serialize access.
pub struct KotlinParser {
    parser: Parser,
}

impl KotlinParser {
    pub fn new() -> Result<Self, ParseError> {
        let mut parser = Parser::new();
        // Get the tree-sitter Language from ast-grep-language
        let ts_lang = SupportLang::Kotlin.get_ts_language();
        parser
            .set_language(&ts_lang)
            .map_err(|_| ParseError::LanguageSet)?;

        Ok(Self { parser })
    }

    /// Parse a complete source file.
    pub fn parse(&mut self, source: &str) -> Result<SyntaxTree, ParseError> {
        let ts_tree = self
            .parser
            .parse(source, None)
            .ok_or(ParseError::ParseFailed)?;
        Ok(SyntaxTree::lower(&ts_tree, source.to_string())?)
    }

    /// Parse `fragment` inside the synthetic context for `kind` and locate it.
    ///
    /// The located node is the unique node (other than the wrapper's root)
    /// whose text equals the trimmed fragment. When several nested nodes
    /// share that exact span, the outermost one is returned.
    pub fn parse_fragment_as(
        &mut self,
        kind: FragmentKind,
        fragment: &str,
    ) -> Result<Fragment, ParseError> {
        let tree = self.parse(&kind.wrap(fragment))?;
        let node = extract(&tree, fragment.trim())?;
        Ok(Fragment { tree, node, kind })
    }
}

fn extract(tree: &SyntaxTree, wanted: &str) -> Result<NodeId, ExtractionError> {
    let root = tree.root().id();
    let mut found: Vec<(SourceSpan, NodeId)> = Vec::new();

    for node in tree.preorder() {
        if node.id() == root || node.text() != wanted {
            continue;
        }
        // A lone statement shares its span with the enclosing `statements`
        // list; the statement itself is the fragment.
        if node.kind() == SyntaxKind::Statements {
            continue;
        }
        // Pre-order visits the outermost node of a same-span chain first.
        if !found.iter().any(|(span, _)| *span == node.span()) {
            found.push((node.span(), node.id()));
        }
    }

    match found.as_slice() {
        [] => Err(ExtractionError::NotFound {
            fragment: wanted.to_string(),
        }),
        [(_, id)] => Ok(*id),
        many => Err(ExtractionError::Ambiguous {
            fragment: wanted.to_string(),
            count: many.len(),
        }),
    }
}

/// A fragment parsed in its synthetic context.
#[derive(Debug, Clone)]
pub struct Fragment {
    tree: SyntaxTree,
    node: NodeId,
    kind: FragmentKind,
}

impl Fragment {
    /// The node whose text is the fragment.
    pub fn node(&self) -> Node<'_> {
        self.tree.node(self.node)
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn kind(&self) -> FragmentKind {
        self.kind
    }
}

//! Rewrite passes over a single file.
//!
//! A pass takes the current text of a file and returns its new text. Every
//! pass parses the text it is given, so a pass always sees the output of the
//! one before it.

use crate::insert::StructuralEdit;
use crate::patch::{apply_patches, Patch, PatchError, PatchSet};
use crate::syntax::{KotlinParser, Node, ParseError, SyntaxKind, SyntaxTree};
use crate::template::{receiver_text, Replacement, Rule, Template, TemplateError};
use log::{debug, warn};
use thiserror::Error;

/// Upper bound on match-and-replace rounds for one rewrite pass.
const MAX_ROUNDS: usize = 16;

#[derive(Error, Debug)]
pub enum PassError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error("rewrite by '{pass}' produced text that does not parse: {source}")]
    Rewrite {
        pass: String,
        #[source]
        source: ParseError,
    },

    #[error("pass '{pass}' still matched after {rounds} rounds")]
    Unsettled { pass: String, rounds: usize },
}

/// One step of idiom cleanup.
pub trait Pass {
    fn id(&self) -> &str;

    /// Rewrite `source`, returning the new text (equal to `source` when
    /// nothing applies). Running a pass on its own output changes nothing.
    fn run(&self, parser: &mut KotlinParser, source: &str) -> Result<String, PassError>;
}

/// Replace every match of a [`Rule`].
///
/// Matches nested in another match are picked up by a further round on the
/// re-parsed output, until the rule no longer matches.
#[derive(Debug)]
pub struct RewritePass {
    rule: Rule,
}

impl RewritePass {
    pub fn new(rule: Rule) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }
}

impl Pass for RewritePass {
    fn id(&self) -> &str {
        self.rule.id()
    }

    fn run(&self, parser: &mut KotlinParser, source: &str) -> Result<String, PassError> {
        let mut text = source.to_string();

        for round in 0..=MAX_ROUNDS {
            let tree = match parser.parse(&text) {
                Ok(tree) => tree,
                Err(error) if round == 0 => return Err(error.into()),
                Err(source) => {
                    return Err(PassError::Rewrite {
                        pass: self.id().to_string(),
                        source,
                    })
                }
            };

            let patches = self.rule.patches(&tree);
            if patches.is_empty() {
                return Ok(text);
            }
            if round == MAX_ROUNDS {
                break;
            }

            debug!(
                "{}: round {} replaces {} match(es)",
                self.id(),
                round + 1,
                patches.len()
            );
            text = PatchSet::new(patches)?.apply(&text)?;
        }

        Err(PassError::Unsettled {
            pass: self.id().to_string(),
            rounds: MAX_ROUNDS,
        })
    }
}

/// Declaration kinds a structural pass can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Class,
    Object,
    Function,
    Property,
}

/// Which declarations a structural pass edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationSelector {
    pub kind: DeclarationKind,
    /// Exact declared name; `None` selects every declaration of `kind`.
    pub name: Option<String>,
}

impl DeclarationSelector {
    pub fn matches(&self, node: Node<'_>) -> bool {
        let kind_matches = match (self.kind, node.kind()) {
            (DeclarationKind::Class, SyntaxKind::ClassDeclaration)
            | (DeclarationKind::Object, SyntaxKind::ObjectDeclaration)
            | (DeclarationKind::Object, SyntaxKind::CompanionObject)
            | (DeclarationKind::Function, SyntaxKind::FunctionDeclaration)
            | (DeclarationKind::Property, SyntaxKind::PropertyDeclaration) => true,
            _ => false,
        };
        kind_matches
            && self
                .name
                .as_deref()
                .map_or(true, |name| declaration_name(node) == Some(name))
    }
}

/// Name a declaration introduces, if it has one.
pub fn declaration_name<'t>(decl: Node<'t>) -> Option<&'t str> {
    let name = match decl.kind() {
        SyntaxKind::PropertyDeclaration => decl
            .child_of_kind(SyntaxKind::VariableDeclaration)?
            .child_of_kind(SyntaxKind::SimpleIdentifier)?,
        SyntaxKind::ClassDeclaration
        | SyntaxKind::ObjectDeclaration
        | SyntaxKind::CompanionObject
        | SyntaxKind::TypeAlias => decl.child_of_kind(SyntaxKind::TypeIdentifier)?,
        SyntaxKind::FunctionDeclaration => decl.child_of_kind(SyntaxKind::SimpleIdentifier)?,
        _ => return None,
    };
    Some(name.text())
}

/// Apply one [`StructuralEdit`] to every selected declaration.
///
/// An edit that fails is logged and skipped; the other declarations are
/// still edited.
#[derive(Debug)]
pub struct StructuralPass {
    id: String,
    selector: DeclarationSelector,
    edit: StructuralEdit,
}

impl StructuralPass {
    pub fn new(id: impl Into<String>, selector: DeclarationSelector, edit: StructuralEdit) -> Self {
        Self {
            id: id.into(),
            selector,
            edit,
        }
    }

    fn already_has_member(&self, decl: Node<'_>) -> bool {
        let StructuralEdit::Member(member) = &self.edit else {
            return false;
        };
        let member = member.trim();
        decl.children()
            .filter(|child| {
                matches!(child.kind(), SyntaxKind::ClassBody | SyntaxKind::EnumClassBody)
            })
            .flat_map(|body| body.children())
            .any(|child| child.text() == member)
    }
}

impl Pass for StructuralPass {
    fn id(&self) -> &str {
        &self.id
    }

    /// Declarations are edited one at a time, last in pre-order first, on a
    /// fresh parse of the text so far. An edit only touches text inside or
    /// after its own declaration, so the declarations before it keep their
    /// pre-order position.
    fn run(&self, parser: &mut KotlinParser, source: &str) -> Result<String, PassError> {
        let selected = parser
            .parse(source)?
            .preorder()
            .filter(|node| self.selector.matches(*node))
            .count();
        let mut text = source.to_string();
        let mut edits = 0;

        for index in (0..selected).rev() {
            let tree = parser.parse(&text).map_err(|source| PassError::Rewrite {
                pass: self.id.clone(),
                source,
            })?;
            let Some(decl) = tree
                .preorder()
                .filter(|node| self.selector.matches(*node))
                .nth(index)
            else {
                break;
            };
            // Exact member already present.
            if self.already_has_member(decl) {
                continue;
            }
            match self.edit.apply(parser, decl) {
                Ok(Some(patch)) => {
                    text = apply_patches(&text, vec![patch])?;
                    edits += 1;
                }
                Ok(None) => {}
                Err(error) => warn!("{}: skipped declaration at {}: {}", self.id, decl.span(), error),
            }
        }

        if edits > 0 {
            debug!("{}: {} insertion(s)", self.id, edits);
        }
        Ok(text)
    }
}

/// Turn local `var`s that are never written after initialization into `val`s.
#[derive(Debug, Default)]
pub struct RedundantVarPass;

impl RedundantVarPass {
    pub const ID: &'static str = "redundant-var";

    fn patch_for(decl: Node<'_>) -> Option<Patch> {
        // The keyword may sit under a `binding_pattern_kind` wrapper.
        let keyword = decl
            .descendants()
            .take_while(|node| node.kind() != SyntaxKind::VariableDeclaration)
            .find(|node| node.kind() == SyntaxKind::Token("var"))?;
        decl.child_of_kind(SyntaxKind::Token("="))?;
        let name = declaration_name(decl)?;
        let scope = decl.ancestors().find(|node| {
            matches!(
                node.kind(),
                SyntaxKind::FunctionBody
                    | SyntaxKind::ClassBody
                    | SyntaxKind::EnumClassBody
                    | SyntaxKind::SourceFile
            )
        })?;
        if scope.kind() != SyntaxKind::FunctionBody {
            return None;
        }
        if scope.descendants().any(|node| writes_to(node, name)) {
            return None;
        }
        Some(Patch::replace(keyword, "val"))
    }
}

impl Pass for RedundantVarPass {
    fn id(&self) -> &str {
        Self::ID
    }

    fn run(&self, parser: &mut KotlinParser, source: &str) -> Result<String, PassError> {
        let tree: SyntaxTree = parser.parse(source)?;
        let patches: Vec<Patch> = tree
            .preorder()
            .filter(|node| node.kind() == SyntaxKind::PropertyDeclaration)
            .filter_map(Self::patch_for)
            .collect();

        if patches.is_empty() {
            return Ok(source.to_string());
        }
        debug!("{}: {} declaration(s)", Self::ID, patches.len());
        Ok(PatchSet::new(patches)?.apply(source)?)
    }
}

/// Whether `node` assigns to, or increments/decrements, the variable `name`.
fn writes_to(node: Node<'_>, name: &str) -> bool {
    match node.kind() {
        SyntaxKind::Assignment => node
            .significant_children()
            .next()
            .is_some_and(|target| target.text().trim() == name),
        SyntaxKind::PrefixExpression | SyntaxKind::PostfixExpression => {
            let mut step = false;
            let mut operand = None;
            for child in node.significant_children() {
                match child.kind() {
                    SyntaxKind::Token("++") | SyntaxKind::Token("--") => step = true,
                    _ => operand = Some(child),
                }
            }
            step && operand.is_some_and(|operand| operand.text() == name)
        }
        _ => false,
    }
}

/// Idioms shipped with the tool.
pub fn builtin_passes(parser: &mut KotlinParser) -> Result<Vec<Box<dyn Pass>>, TemplateError> {
    let lib_equals = Rule::new(
        "lib-equals",
        Template::compile(parser, "Lib.equals(#a#, #b#)")?,
        Replacement::operand_template("#a# == #b#"),
    )?;
    let strings = is_null_or_empty(parser, "strings-is-null-or-empty", "Strings.isNullOrEmpty(#s#)")?;
    let text_utils = is_null_or_empty(parser, "text-utils-is-empty", "TextUtils.isEmpty(#s#)")?;

    let passes: Vec<Box<dyn Pass>> = vec![
        Box::new(RewritePass::new(lib_equals)),
        Box::new(RewritePass::new(strings)),
        Box::new(RewritePass::new(text_utils)),
        Box::new(RedundantVarPass),
    ];
    Ok(passes)
}

/// `Helper.check(s)` to `s.isNullOrEmpty()`, parenthesizing compound receivers.
fn is_null_or_empty(parser: &mut KotlinParser, id: &str, pattern: &str) -> Result<Rule, TemplateError> {
    Rule::new(
        id,
        Template::compile(parser, pattern)?,
        Replacement::context(|m| match m.binding("s") {
            Some(receiver) => format!("{}.isNullOrEmpty()", receiver_text(receiver)),
            None => m.root().text().to_string(),
        }),
    )
}

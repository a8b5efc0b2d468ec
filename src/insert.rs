//! Formatting-preserving insertion into existing declarations.
//!
//! Each operation computes a minimal insertion [`Patch`] against the file the
//! declaration was parsed from. Before the patch is returned, the edited
//! declaration text is re-parsed in the declaration's own context and must
//! come back as the same declaration kind with the new fragment as one of its
//! nodes. Patches are insertions, except that filling a body holding only
//! whitespace replaces that whitespace. Edits on a class and on a class
//! nested inside it may land on the same offset, so callers applying several
//! edits re-parse between them.

use crate::patch::{apply_patches, Patch};
use crate::syntax::{FragmentKind, KotlinParser, Node, SourceSpan, SyntaxKind};
use thiserror::Error;

const MEMBER_INDENT: &str = "    ";

#[derive(Error, Debug)]
pub enum StructuralEditError {
    #[error("{kind} is not a declaration")]
    NotADeclaration { kind: SyntaxKind },

    #[error("cannot insert a {edit} into a {kind}")]
    Unsupported { kind: SyntaxKind, edit: &'static str },

    #[error("{fragment:?} is not a valid {edit}: {reason}")]
    InvalidFragment {
        fragment: String,
        edit: &'static str,
        reason: String,
    },

    #[error("edited {kind} does not re-parse as {kind}: {reason}")]
    Reparse { kind: SyntaxKind, reason: String },
}

/// A structural edit applied to one declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralEdit {
    Decorator(String),
    Supertype(String),
    Member(String),
}

impl StructuralEdit {
    pub fn apply(
        &self,
        parser: &mut KotlinParser,
        decl: Node<'_>,
    ) -> Result<Option<Patch>, StructuralEditError> {
        match self {
            StructuralEdit::Decorator(text) => insert_decorator(parser, decl, text),
            StructuralEdit::Supertype(text) => insert_supertype(parser, decl, text),
            StructuralEdit::Member(text) => insert_member(parser, decl, text),
        }
    }
}

/// Add an annotation to `decl` unless one with the same short name exists.
///
/// The annotation goes after a leading doc comment, on its own line, or at
/// the start of the declaration followed by a space.
pub fn insert_decorator(
    parser: &mut KotlinParser,
    decl: Node<'_>,
    decorator: &str,
) -> Result<Option<Patch>, StructuralEditError> {
    if !decl.kind().is_declaration() {
        return Err(StructuralEditError::NotADeclaration { kind: decl.kind() });
    }
    let decorator = decorator.trim();
    let new_name = {
        let fragment = parser
            .parse_fragment_as(FragmentKind::Decorator, decorator)
            .map_err(|error| invalid_fragment(decorator, "decorator", error.to_string()))?;
        let annotation = fragment
            .node()
            .descendants()
            .find(|node| node.kind() == SyntaxKind::Annotation)
            .ok_or_else(|| invalid_fragment(decorator, "decorator", "no annotation found"))?;
        annotation_name(annotation)
            .map(str::to_string)
            .ok_or_else(|| invalid_fragment(decorator, "decorator", "annotation has no type"))?
    };

    let annotations: Vec<Node<'_>> = decl
        .child_of_kind(SyntaxKind::Modifiers)
        .map(|modifiers| modifiers.children_of_kind(SyntaxKind::Annotation).collect())
        .unwrap_or_default();
    if annotations
        .iter()
        .filter_map(|annotation| annotation_name(*annotation))
        .any(|name| name == new_name)
    {
        return Ok(None);
    }

    let inner_doc = decl.children().next().filter(|child| child.kind().is_trivia());
    let outer_doc = leading_sibling_comment(decl);
    let offset = match inner_doc {
        Some(_) => decl
            .significant_children()
            .next()
            .map_or(decl.span().end, |child| child.span().start),
        None => decl.span().start,
    };

    let own_line = inner_doc.is_some()
        || outer_doc.is_some()
        || annotations.first().is_some_and(|first| followed_by_newline(*first));
    let separator = if own_line {
        format!("\n{}", decl.line_indent())
    } else {
        " ".to_string()
    };

    let patch = Patch::insert(offset, format!("{decorator}{separator}"));
    verify(parser, decl, patch, decorator)
}

/// Add a supertype to a class-like declaration unless one with the same
/// leading type name is already listed.
pub fn insert_supertype(
    parser: &mut KotlinParser,
    decl: Node<'_>,
    supertype: &str,
) -> Result<Option<Patch>, StructuralEditError> {
    require_class_like(decl, "supertype")?;
    let supertype = supertype.trim();
    let new_name = short_type_name(supertype)
        .ok_or_else(|| invalid_fragment(supertype, "supertype", "no leading type name"))?;

    let entries = supertype_entries(decl);
    if entries
        .iter()
        .filter_map(|entry| short_type_name(entry.text()))
        .any(|name| name == new_name)
    {
        return Ok(None);
    }

    let patch = if let Some(last) = entries.last() {
        Patch::insert(last.span().end, format!(", {supertype}"))
    } else if let Some(body) = class_body(decl) {
        let source = decl.tree().source();
        let start = body.span().start;
        let spaced = source[..start].ends_with(|c: char| c.is_whitespace());
        let text = if spaced {
            format!(": {supertype} ")
        } else {
            format!(" : {supertype} ")
        };
        Patch::insert(start, text)
    } else {
        Patch::insert(decl.span().end, format!(" : {supertype}"))
    };

    verify(parser, decl, patch, supertype)
}

/// Append a member to a class-like declaration.
///
/// The member goes after the last existing member. A missing body is
/// created; a body with only whitespace between its braces has that
/// whitespace replaced, so `class A { }` becomes a normally indented
/// block; a body with only comments keeps them and gets the member before
/// its closing brace. Members are always inserted, even when an identical
/// one exists.
pub fn insert_member(
    parser: &mut KotlinParser,
    decl: Node<'_>,
    member: &str,
) -> Result<Option<Patch>, StructuralEditError> {
    require_class_like(decl, "member")?;
    let member = member.trim();
    let indent = decl.line_indent();

    let patch = match class_body(decl) {
        None => Patch::insert(
            decl.span().end,
            format!(" {{\n{indent}{MEMBER_INDENT}{member}\n{indent}}}"),
        ),
        Some(body) => {
            let members: Vec<Node<'_>> = body
                .significant_children()
                .filter(|child| !matches!(child.kind(), SyntaxKind::Token(_)))
                .collect();
            match members.last() {
                Some(last) => Patch::insert(
                    last.span().end,
                    format!("\n\n{}{member}", last.line_indent()),
                ),
                None => {
                    let inner = body_interior(body);
                    let filler = &decl.tree().source()[inner.start..inner.end];
                    let text = format!("\n{indent}{MEMBER_INDENT}{member}\n{indent}");
                    if filler.trim().is_empty() {
                        Patch::new(inner, text)
                    } else {
                        // Only comments inside: keep them and add after.
                        Patch::insert(inner.end, text)
                    }
                }
            }
        }
    };

    verify(parser, decl, patch, member)
}

/// Re-parse `decl` with `patch` applied and confirm it is still the same
/// kind of declaration and contains `fragment`.
fn verify(
    parser: &mut KotlinParser,
    decl: Node<'_>,
    patch: Patch,
    fragment: &str,
) -> Result<Option<Patch>, StructuralEditError> {
    let kind = decl.kind();
    let reparse_error = |reason: String| StructuralEditError::Reparse { kind, reason };

    let span = decl.span();
    let local = Patch::new(
        SourceSpan::new(patch.span.start - span.start, patch.span.end - span.start),
        patch.replacement.clone(),
    );
    let edited =
        apply_patches(decl.text(), vec![local]).map_err(|error| reparse_error(error.to_string()))?;

    let reparsed = parser
        .parse_fragment_as(context_of(decl), &edited)
        .map_err(|error| reparse_error(error.to_string()))?;
    let node = reparsed.node();
    if node.kind() != kind {
        return Err(reparse_error(format!("parsed as {}", node.kind())));
    }
    if !node.descendants().any(|child| child.text() == fragment) {
        return Err(reparse_error(format!("{fragment:?} is not a node of the result")));
    }

    Ok(Some(patch))
}

/// Syntactic context `decl` lives in.
fn context_of(decl: Node<'_>) -> FragmentKind {
    match decl.parent().map(|parent| parent.kind()) {
        None | Some(SyntaxKind::SourceFile) => FragmentKind::File,
        Some(SyntaxKind::ClassBody) | Some(SyntaxKind::EnumClassBody) => FragmentKind::ClassBody,
        Some(_) => FragmentKind::FunctionBody,
    }
}

fn require_class_like(decl: Node<'_>, edit: &'static str) -> Result<(), StructuralEditError> {
    match decl.kind() {
        SyntaxKind::ClassDeclaration
        | SyntaxKind::ObjectDeclaration
        | SyntaxKind::CompanionObject => Ok(()),
        kind if kind.is_declaration() => Err(StructuralEditError::Unsupported { kind, edit }),
        kind => Err(StructuralEditError::NotADeclaration { kind }),
    }
}

fn class_body<'t>(decl: Node<'t>) -> Option<Node<'t>> {
    decl.children()
        .find(|child| matches!(child.kind(), SyntaxKind::ClassBody | SyntaxKind::EnumClassBody))
}

/// Delegation specifiers of a class header, in source order.
fn supertype_entries<'t>(decl: Node<'t>) -> Vec<Node<'t>> {
    let mut entries = Vec::new();
    for child in decl.children() {
        match child.kind() {
            SyntaxKind::DelegationSpecifier => entries.push(child),
            // Some grammar versions group the list under one node.
            SyntaxKind::Other("delegation_specifiers") => {
                entries.extend(child.children_of_kind(SyntaxKind::DelegationSpecifier))
            }
            _ => {}
        }
    }
    entries
}

/// Byte range between a body's braces.
fn body_interior(body: Node<'_>) -> SourceSpan {
    let span = body.span();
    let open = body
        .children()
        .find(|child| child.kind() == SyntaxKind::Token("{"))
        .map_or(span.start + 1, |brace| brace.span().end);
    let close = body
        .children()
        .rev()
        .find(|child| child.kind() == SyntaxKind::Token("}"))
        .map_or(span.end.saturating_sub(1), |brace| brace.span().start);
    SourceSpan::new(open, close.max(open))
}

/// A comment directly above `decl`, separated from it by whitespace only.
fn leading_sibling_comment<'t>(decl: Node<'t>) -> Option<Node<'t>> {
    let previous = decl.prev_sibling().filter(|node| node.kind().is_trivia())?;
    let gap = &decl.tree().source()[previous.span().end..decl.span().start];
    (gap.trim().is_empty() && gap.contains('\n')).then_some(previous)
}

fn followed_by_newline(node: Node<'_>) -> bool {
    let rest = &node.tree().source()[node.span().end..];
    let gap = &rest[..rest.len() - rest.trim_start().len()];
    gap.contains('\n')
}

/// Short name of the type an annotation refers to (`@kotlin.Deprecated("x")` → `Deprecated`).
fn annotation_name<'t>(annotation: Node<'t>) -> Option<&'t str> {
    let user_type = annotation
        .descendants()
        .find(|node| node.kind() == SyntaxKind::UserType)?;
    short_type_name(user_type.text())
}

/// Last segment of the leading type name in `text`
/// (`java.io.Serializable` → `Serializable`, `Base<T>(x)` → `Base`).
fn short_type_name(text: &str) -> Option<&str> {
    let text = text.trim().trim_start_matches('@');
    let end = text
        .find(|c: char| c == '(' || c == '<' || c == '{' || c.is_whitespace())
        .unwrap_or(text.len());
    let name = text[..end].rsplit('.').next().unwrap_or_default();
    (!name.is_empty()).then_some(name)
}

fn invalid_fragment(
    fragment: &str,
    edit: &'static str,
    reason: impl Into<String>,
) -> StructuralEditError {
    StructuralEditError::InvalidFragment {
        fragment: fragment.to_string(),
        edit,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SyntaxTree;

    fn find_decl<'t>(tree: &'t SyntaxTree, kind: SyntaxKind, name: &str) -> Node<'t> {
        tree.preorder()
            .find(|node| {
                node.kind() == kind
                    && node.children().any(|child| {
                        matches!(
                            child.kind(),
                            SyntaxKind::SimpleIdentifier | SyntaxKind::TypeIdentifier
                        ) && child.text() == name
                    })
            })
            .unwrap()
    }

    fn edit(
        source: &str,
        kind: SyntaxKind,
        name: &str,
        edit: StructuralEdit,
    ) -> Result<String, StructuralEditError> {
        let mut parser = KotlinParser::new().unwrap();
        let tree = parser.parse(source).unwrap();
        let decl = find_decl(&tree, kind, name);
        let patches = edit.apply(&mut parser, decl)?.into_iter().collect();
        Ok(apply_patches(source, patches).unwrap())
    }

    #[test]
    fn short_names() {
        assert_eq!(short_type_name("java.io.Serializable"), Some("Serializable"));
        assert_eq!(short_type_name("Comparable<User>"), Some("Comparable"));
        assert_eq!(short_type_name("Base(1, 2)"), Some("Base"));
        assert_eq!(short_type_name("@kotlin.Deprecated(\"x\")"), Some("Deprecated"));
        assert_eq!(short_type_name("  "), None);
    }

    #[test]
    fn decorator_on_plain_function() {
        let output = edit(
            "fun f() = 1",
            SyntaxKind::FunctionDeclaration,
            "f",
            StructuralEdit::Decorator("@Foo".into()),
        )
        .unwrap();
        assert_eq!(output, "@Foo fun f() = 1");
    }

    #[test]
    fn decorator_is_idempotent() {
        let output = edit(
            "@Foo fun f() = 1",
            SyntaxKind::FunctionDeclaration,
            "f",
            StructuralEdit::Decorator("@Foo".into()),
        )
        .unwrap();
        assert_eq!(output, "@Foo fun f() = 1");
    }

    #[test]
    fn decorator_same_short_name_is_noop() {
        let output = edit(
            "@kotlin.Deprecated(\"old\") fun f() = 1",
            SyntaxKind::FunctionDeclaration,
            "f",
            StructuralEdit::Decorator("@Deprecated(\"new\")".into()),
        )
        .unwrap();
        assert_eq!(output, "@kotlin.Deprecated(\"old\") fun f() = 1");
    }

    #[test]
    fn decorator_after_doc_comment() {
        let source = "class A {\n    /** Docs. */\n    fun f() = 1\n}\n";
        let output = edit(
            source,
            SyntaxKind::FunctionDeclaration,
            "f",
            StructuralEdit::Decorator("@JvmStatic".into()),
        )
        .unwrap();
        assert_eq!(
            output,
            "class A {\n    /** Docs. */\n    @JvmStatic\n    fun f() = 1\n}\n"
        );
    }

    #[test]
    fn decorator_before_existing_modifiers() {
        let output = edit(
            "private fun f() = 1\n",
            SyntaxKind::FunctionDeclaration,
            "f",
            StructuralEdit::Decorator("@Foo".into()),
        )
        .unwrap();
        assert_eq!(output, "@Foo private fun f() = 1\n");
    }

    #[test]
    fn decorator_on_local_function() {
        let output = edit(
            "fun outer() {\n    fun inner() = 1\n    return\n}\n",
            SyntaxKind::FunctionDeclaration,
            "inner",
            StructuralEdit::Decorator("@Foo".into()),
        )
        .unwrap();
        assert_eq!(output, "fun outer() {\n    @Foo fun inner() = 1\n    return\n}\n");
    }

    #[test]
    fn member_into_local_class() {
        let output = edit(
            "fun outer() {\n    class Local\n}\n",
            SyntaxKind::ClassDeclaration,
            "Local",
            StructuralEdit::Member("val x = 1".into()),
        )
        .unwrap();
        assert_eq!(
            output,
            "fun outer() {\n    class Local {\n        val x = 1\n    }\n}\n"
        );
    }

    #[test]
    fn decorator_rejects_non_declaration() {
        let mut parser = KotlinParser::new().unwrap();
        let tree = parser.parse("val x = 1\n").unwrap();
        let literal = tree
            .preorder()
            .find(|node| node.kind() == SyntaxKind::IntegerLiteral)
            .unwrap();

        assert!(matches!(
            insert_decorator(&mut parser, literal, "@Foo"),
            Err(StructuralEditError::NotADeclaration { .. })
        ));
    }

    #[test]
    fn supertype_appended_to_list() {
        let output = edit(
            "class A : Base(), Runnable {\n}\n",
            SyntaxKind::ClassDeclaration,
            "A",
            StructuralEdit::Supertype("java.io.Serializable".into()),
        )
        .unwrap();
        assert_eq!(
            output,
            "class A : Base(), Runnable, java.io.Serializable {\n}\n"
        );
    }

    #[test]
    fn supertype_before_body() {
        let output = edit(
            "class A {\n}\n",
            SyntaxKind::ClassDeclaration,
            "A",
            StructuralEdit::Supertype("Serializable".into()),
        )
        .unwrap();
        assert_eq!(output, "class A : Serializable {\n}\n");
    }

    #[test]
    fn supertype_without_body() {
        let output = edit(
            "class A(val x: Int)\n",
            SyntaxKind::ClassDeclaration,
            "A",
            StructuralEdit::Supertype("Serializable".into()),
        )
        .unwrap();
        assert_eq!(output, "class A(val x: Int) : Serializable\n");
    }

    #[test]
    fn supertype_with_same_leading_name_is_noop() {
        let source = "class A : Comparable<A> {\n}\n";
        let output = edit(
            source,
            SyntaxKind::ClassDeclaration,
            "A",
            StructuralEdit::Supertype("Comparable<B>".into()),
        )
        .unwrap();
        assert_eq!(output, source);
    }

    #[test]
    fn supertype_rejected_on_function() {
        let result = edit(
            "fun f() = 1\n",
            SyntaxKind::FunctionDeclaration,
            "f",
            StructuralEdit::Supertype("Serializable".into()),
        );
        assert!(matches!(
            result,
            Err(StructuralEditError::Unsupported { edit: "supertype", .. })
        ));
    }

    #[test]
    fn member_into_missing_body() {
        let output = edit(
            "class A\n",
            SyntaxKind::ClassDeclaration,
            "A",
            StructuralEdit::Member("fun g() = 2".into()),
        )
        .unwrap();
        assert_eq!(output, "class A {\n    fun g() = 2\n}\n");
    }

    #[test]
    fn member_into_empty_body() {
        let output = edit(
            "class A { }\n",
            SyntaxKind::ClassDeclaration,
            "A",
            StructuralEdit::Member("fun g() = 2".into()),
        )
        .unwrap();
        assert_eq!(output, "class A {\n    fun g() = 2\n}\n");
    }

    #[test]
    fn member_into_comment_only_body() {
        let output = edit(
            "class A {\n    // note\n}\n",
            SyntaxKind::ClassDeclaration,
            "A",
            StructuralEdit::Member("val x = 1".into()),
        )
        .unwrap();
        assert_eq!(output, "class A {\n    // note\n\n    val x = 1\n}\n");
    }

    #[test]
    fn member_after_last_member() {
        let source = "class A {\n    val x = 1\n}\n";
        let output = edit(
            source,
            SyntaxKind::ClassDeclaration,
            "A",
            StructuralEdit::Member("fun g() = 2".into()),
        )
        .unwrap();
        assert_eq!(output, "class A {\n    val x = 1\n\n    fun g() = 2\n}\n");
    }

    #[test]
    fn member_duplicates_are_inserted() {
        let source = "class A {\n    fun g() = 2\n}\n";
        let output = edit(
            source,
            SyntaxKind::ClassDeclaration,
            "A",
            StructuralEdit::Member("fun g() = 2".into()),
        )
        .unwrap();
        assert_eq!(
            output,
            "class A {\n    fun g() = 2\n\n    fun g() = 2\n}\n"
        );
    }

    #[test]
    fn invalid_member_fails_reparse() {
        let result = edit(
            "class A {\n}\n",
            SyntaxKind::ClassDeclaration,
            "A",
            StructuralEdit::Member("fun (".into()),
        );
        assert!(matches!(result, Err(StructuralEditError::Reparse { .. })));
    }

    #[test]
    fn nested_class_edits_do_not_overlap() {
        let source = "class Outer {\n    class Inner\n}\n";
        let mut parser = KotlinParser::new().unwrap();
        let tree = parser.parse(source).unwrap();
        let outer = find_decl(&tree, SyntaxKind::ClassDeclaration, "Outer");
        let inner = find_decl(&tree, SyntaxKind::ClassDeclaration, "Inner");

        let patches: Vec<Patch> = [outer, inner]
            .into_iter()
            .filter_map(|decl| insert_supertype(&mut parser, decl, "Marker").unwrap())
            .collect();
        let output = apply_patches(source, patches).unwrap();

        assert_eq!(
            output,
            "class Outer : Marker {\n    class Inner : Marker\n}\n"
        );
    }
}

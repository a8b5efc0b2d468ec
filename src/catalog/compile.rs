//! Turning catalog entries into runnable passes.

use crate::catalog::loader::{load_from_path, CatalogError};
use crate::catalog::schema::{Action, Catalog, IdiomDefinition, ValidationError, ValidationIssue};
use crate::insert::StructuralEdit;
use crate::pass::{DeclarationSelector, Pass, RedundantVarPass, RewritePass, StructuralPass};
use crate::syntax::KotlinParser;
use crate::template::compiler::placeholder_tokens;
use crate::template::{Replacement, Rule, Template, TemplateError};
use log::debug;
use std::path::Path;

impl Catalog {
    /// Compile every idiom, in catalog order.
    ///
    /// Fails on the first idiom whose pattern does not compile or whose
    /// replacement uses a placeholder the pattern does not bind.
    pub fn compile(&self, parser: &mut KotlinParser) -> Result<Vec<Box<dyn Pass>>, CatalogError> {
        let passes = self
            .idioms
            .iter()
            .map(|idiom| compile_idiom(parser, idiom))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "compiled {} idiom(s) from catalog '{}'",
            passes.len(),
            self.meta.name
        );
        Ok(passes)
    }
}

/// Load, validate and compile the catalog at `path`.
///
/// Errors from any stage name the catalog file.
pub fn compile_file(
    parser: &mut KotlinParser,
    path: impl AsRef<Path>,
) -> Result<Vec<Box<dyn Pass>>, CatalogError> {
    let path = path.as_ref();
    load_from_path(path)?
        .compile(parser)
        .map_err(|error| error.with_path(path))
}

fn compile_idiom(
    parser: &mut KotlinParser,
    idiom: &IdiomDefinition,
) -> Result<Box<dyn Pass>, CatalogError> {
    let template_error = |source| CatalogError::Template {
        id: idiom.id.clone(),
        path: None,
        source,
    };

    let edit = match &idiom.action {
        Action::Rewrite {
            pattern,
            replacement,
            parenthesize,
            context,
        } => {
            let template =
                Template::compile_as(parser, (*context).into(), pattern).map_err(template_error)?;
            check_bound(&template, replacement).map_err(template_error)?;
            let replacement = if *parenthesize {
                Replacement::operand_template(replacement.as_str())
            } else {
                Replacement::template(replacement.as_str())
            };
            let rule = Rule::new(idiom.id.clone(), template, replacement).map_err(template_error)?;
            return Ok(Box::new(RewritePass::new(rule)));
        }
        Action::RedundantVar => return Ok(Box::new(RedundantVarPass)),
        Action::InsertDecorator { text } => StructuralEdit::Decorator(text.clone()),
        Action::InsertSupertype { text } => StructuralEdit::Supertype(text.clone()),
        Action::InsertMember { text } => StructuralEdit::Member(text.clone()),
    };

    // Validation guarantees a target for insertions.
    let selector = idiom
        .target
        .as_ref()
        .map(DeclarationSelector::from)
        .ok_or_else(|| missing_target(idiom))?;
    Ok(Box::new(StructuralPass::new(idiom.id.clone(), selector, edit)))
}

/// [`Rule::new`] only sees flat templates; parenthesized replacements are
/// checked here.
fn check_bound(template: &Template, replacement: &str) -> Result<(), TemplateError> {
    for (_, name) in placeholder_tokens(replacement) {
        if !template.placeholders().contains(name) {
            return Err(TemplateError::UnboundPlaceholder {
                replacement: replacement.to_string(),
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

fn missing_target(idiom: &IdiomDefinition) -> CatalogError {
    CatalogError::Validation {
        path: None,
        source: ValidationError {
            issues: vec![ValidationIssue::MissingField {
                idiom_id: Some(idiom.id.clone()),
                field: "target",
            }],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::load_from_str;
    use std::fs;
    use tempfile::TempDir;

    const CATALOG: &str = r##"
[meta]
name = "java-cleanup"

[[idioms]]
id = "lib-equals"
[idioms.action]
type = "rewrite"
pattern = "Lib.equals(#a#, #b#)"
replacement = "#a# == #b#"
parenthesize = true

[[idioms]]
id = "serializable-dto"
[idioms.action]
type = "insert-supertype"
text = "java.io.Serializable"
[idioms.target]
kind = "class"
name = "UserDto"

[[idioms]]
id = "redundant-var"
[idioms.action]
type = "redundant-var"
"##;

    #[test]
    fn compiles_in_catalog_order() {
        let mut parser = KotlinParser::new().unwrap();
        let catalog = load_from_str(CATALOG).unwrap();
        let passes = catalog.compile(&mut parser).unwrap();
        let ids: Vec<_> = passes.iter().map(|pass| pass.id()).collect();

        assert_eq!(ids, vec!["lib-equals", "serializable-dto", "redundant-var"]);
    }

    #[test]
    fn parenthesize_flag_selects_operand_rendering() {
        let mut parser = KotlinParser::new().unwrap();
        let passes = load_from_str(CATALOG).unwrap().compile(&mut parser).unwrap();
        let output = passes[0]
            .run(&mut parser, "val ok = Lib.equals(x, y) && ready\n")
            .unwrap();

        assert_eq!(output, "val ok = (x == y) && ready\n");
    }

    #[test]
    fn bad_pattern_names_the_idiom() {
        let input = r##"
[[idioms]]
id = "broken"
[idioms.action]
type = "rewrite"
pattern = "Lib.equals(#a#,"
replacement = "#a#"
"##;
        let mut parser = KotlinParser::new().unwrap();
        let error = load_from_str(input)
            .unwrap()
            .compile(&mut parser)
            .err()
            .unwrap();

        match error {
            CatalogError::Template { id, path, source } => {
                assert!(path.is_none());
                assert_eq!(id, "broken");
                assert!(matches!(source, TemplateError::Syntax { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unbound_placeholder_rejected_even_when_parenthesized() {
        let input = r##"
[[idioms]]
id = "typo"
[idioms.action]
type = "rewrite"
pattern = "Lib.equals(#a#, #b#)"
replacement = "#a# == #c#"
parenthesize = true
"##;
        let mut parser = KotlinParser::new().unwrap();
        let error = load_from_str(input)
            .unwrap()
            .compile(&mut parser)
            .err()
            .unwrap();

        assert!(matches!(
            error,
            CatalogError::Template {
                source: TemplateError::UnboundPlaceholder { .. },
                ..
            }
        ));
    }

    #[test]
    fn compile_file_names_the_catalog() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cleanup.toml");
        fs::write(
            &path,
            r##"
[[idioms]]
id = "half-pattern"
[idioms.action]
type = "rewrite"
pattern = "Lib.equals(#a#,"
replacement = "#a#"
"##,
        )
        .unwrap();
        let mut parser = KotlinParser::new().unwrap();

        let error = compile_file(&mut parser, &path).err().unwrap();

        assert!(matches!(error, CatalogError::Template { ref id, .. } if id == "half-pattern"));
        assert_eq!(error.path(), Some(path.as_path()));
        let message = error.to_string();
        assert!(message.contains("'half-pattern'"));
        assert!(message.contains("cleanup.toml"));
    }

    #[test]
    fn statement_context_rewrites_assignments() {
        let input = r##"
[[idioms]]
id = "increment"
[idioms.action]
type = "rewrite"
pattern = "#x# = #x# + 1"
replacement = "#x#++"
context = "statement"
"##;
        let mut parser = KotlinParser::new().unwrap();
        let passes = load_from_str(input).unwrap().compile(&mut parser).unwrap();
        let output = passes[0]
            .run(&mut parser, "fun f() {\n    i = i + 1\n    j = i + 1\n}\n")
            .unwrap();

        assert_eq!(output, "fun f() {\n    i++\n    j = i + 1\n}\n");
    }
}

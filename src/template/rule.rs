use crate::patch::Patch;
use crate::syntax::{KotlinParser, SourceSpan, SyntaxTree};
use crate::template::compiler::{placeholder_tokens, Template};
use crate::template::errors::TemplateError;
use crate::template::matcher::find_matches;
use crate::template::render::Replacement;

/// One idiom: a pattern and the text its matches are replaced with.
#[derive(Debug)]
pub struct Rule {
    id: String,
    template: Template,
    replacement: Replacement,
}

impl Rule {
    /// Build a rule, checking that a flat replacement only uses placeholders
    /// the pattern binds.
    pub fn new(
        id: impl Into<String>,
        template: Template,
        replacement: Replacement,
    ) -> Result<Self, TemplateError> {
        if let Some(text) = replacement.template_text() {
            for (_, name) in placeholder_tokens(text) {
                if !template.placeholders().contains(name) {
                    return Err(TemplateError::UnboundPlaceholder {
                        replacement: text.to_string(),
                        name: name.to_string(),
                    });
                }
            }
        }

        Ok(Self {
            id: id.into(),
            template,
            replacement,
        })
    }

    /// Compile `pattern` as an expression and build a rule from it.
    pub fn compile(
        parser: &mut KotlinParser,
        id: impl Into<String>,
        pattern: &str,
        replacement: Replacement,
    ) -> Result<Self, TemplateError> {
        let template = Template::compile(parser, pattern)?;
        Self::new(id, template, replacement)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn replacement(&self) -> &Replacement {
        &self.replacement
    }

    /// One patch per outermost match in `tree`.
    ///
    /// Matches nested inside an earlier match are left for a later round:
    /// their text is still part of the enclosing match's bindings.
    pub fn patches(&self, tree: &SyntaxTree) -> Vec<Patch> {
        let mut patches: Vec<Patch> = Vec::new();
        let mut last_span: Option<SourceSpan> = None;

        for m in find_matches(tree, &self.template) {
            let span = m.root().span();
            if last_span.is_some_and(|outer| outer.contains(span)) {
                continue;
            }
            let text = self.replacement.render(&m);
            if text != m.root().text() {
                patches.push(Patch::new(span, text));
            }
            last_span = Some(span);
        }

        patches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::apply_patches;

    #[test]
    fn unbound_replacement_placeholder_rejected() {
        let mut parser = KotlinParser::new().unwrap();
        let result = Rule::compile(
            &mut parser,
            "bad",
            "Lib.equals(#a#, #b#)",
            Replacement::template("#a# == #c#"),
        );

        assert!(matches!(
            result,
            Err(TemplateError::UnboundPlaceholder { ref name, .. }) if name == "c"
        ));
    }

    #[test]
    fn outermost_matches_only() {
        let mut parser = KotlinParser::new().unwrap();
        let rule = Rule::compile(
            &mut parser,
            "lib-equals",
            "Lib.equals(#a#, #b#)",
            Replacement::template("#a# == #b#"),
        )
        .unwrap();
        let source = "val r = Lib.equals(Lib.equals(a, b), c)\nval s = Lib.equals(d, e)\n";
        let tree = parser.parse(source).unwrap();
        let patches = rule.patches(&tree);

        assert_eq!(patches.len(), 2);
        let output = apply_patches(source, patches).unwrap();
        assert_eq!(output, "val r = Lib.equals(a, b) == c\nval s = d == e\n");
    }
}

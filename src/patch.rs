use crate::syntax::{Node, SourceSpan};
use thiserror::Error;

/// The fundamental edit primitive: replace one byte span with new text.
///
/// All rewrites (template replacements, fragment insertions) compile down to
/// patches. An insertion is a patch with an empty span.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a Patch does nothing until applied through a PatchSet"]
pub struct Patch {
    pub span: SourceSpan,
    pub replacement: String,
}

impl Patch {
    pub fn new(span: SourceSpan, replacement: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
        }
    }

    /// Replace the full text of `node`.
    pub fn replace(node: Node<'_>, replacement: impl Into<String>) -> Self {
        Self::new(node.span(), replacement)
    }

    /// Insert `text` at `offset` without removing anything.
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::new(SourceSpan::empty(offset), text)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("patches overlap: {first} and {second}")]
    Overlap {
        first: SourceSpan,
        second: SourceSpan,
    },

    #[error("invalid byte range {span} in text of length {text_len}")]
    OutOfRange { span: SourceSpan, text_len: usize },

    #[error("byte range {span} does not fall on character boundaries")]
    CharBoundary { span: SourceSpan },
}

/// A validated collection of pairwise non-overlapping patches.
///
/// Adjacent spans (one ending where the next starts) are allowed. Applying a
/// set whose spans are disjoint and in range gives exactly one result,
/// whatever order the individual replacements are performed in. Several
/// insertions at the same offset are applied in the order they were given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchSet {
    patches: Vec<Patch>,
}

impl PatchSet {
    /// Validate and sort `patches`.
    ///
    /// Fails with [`PatchError::Overlap`] naming the first colliding pair in
    /// (start, end) order.
    pub fn new(mut patches: Vec<Patch>) -> Result<Self, PatchError> {
        for patch in &patches {
            if patch.span.start > patch.span.end {
                return Err(PatchError::OutOfRange {
                    span: patch.span,
                    text_len: 0,
                });
            }
        }

        // Stable: equal spans keep their input order.
        patches.sort_by_key(|patch| (patch.span.start, patch.span.end));

        for window in patches.windows(2) {
            let (earlier, later) = (&window[0], &window[1]);
            if later.span.start < earlier.span.end {
                return Err(PatchError::Overlap {
                    first: earlier.span,
                    second: later.span,
                });
            }
        }

        Ok(Self { patches })
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    /// Patches in (start, end) order.
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    /// Produce the patched text.
    ///
    /// `text` must be the text the patch spans were computed against.
    pub fn apply(&self, text: &str) -> Result<String, PatchError> {
        for patch in &self.patches {
            let span = patch.span;
            if span.end > text.len() {
                return Err(PatchError::OutOfRange {
                    span,
                    text_len: text.len(),
                });
            }
            if !text.is_char_boundary(span.start) || !text.is_char_boundary(span.end) {
                return Err(PatchError::CharBoundary { span });
            }
        }

        let growth: usize = self.patches.iter().map(|p| p.replacement.len()).sum();
        let mut output = String::with_capacity(text.len() + growth);
        output.push_str(text);

        // Bottom-to-top keeps every earlier offset valid.
        for patch in self.patches.iter().rev() {
            output.replace_range(patch.span.start..patch.span.end, &patch.replacement);
        }

        Ok(output)
    }
}

/// Validate `patches` and apply them to `text` in one step.
pub fn apply_patches(text: &str, patches: Vec<Patch>) -> Result<String, PatchError> {
    PatchSet::new(patches)?.apply(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(start: usize, end: usize, text: &str) -> Patch {
        Patch::new(SourceSpan::new(start, end), text)
    }

    #[test]
    fn adjacent_patches_apply() {
        let output = apply_patches("abcdef", vec![patch(0, 3, "X"), patch(3, 6, "YY")]).unwrap();
        assert_eq!(output, "XYY");
    }

    #[test]
    fn input_order_does_not_matter() {
        let source = "const answer = 41;";
        let forward = apply_patches(source, vec![patch(6, 12, "value"), patch(15, 17, "42")]);
        let backward = apply_patches(source, vec![patch(15, 17, "42"), patch(6, 12, "value")]);

        assert_eq!(forward.unwrap(), "const value = 42;");
        assert_eq!(backward.unwrap(), "const value = 42;");
    }

    #[test]
    fn overlapping_patches_rejected() {
        let result = PatchSet::new(vec![patch(2, 3, "y"), patch(1, 4, "x")]);
        assert_eq!(
            result,
            Err(PatchError::Overlap {
                first: SourceSpan::new(1, 4),
                second: SourceSpan::new(2, 3),
            })
        );
    }

    #[test]
    fn shared_single_offset_is_overlap() {
        let result = PatchSet::new(vec![patch(0, 3, "a"), patch(2, 5, "b")]);
        assert!(matches!(result, Err(PatchError::Overlap { .. })));
    }

    #[test]
    fn insertions_keep_given_order() {
        let output = apply_patches(
            "fun f() = 1",
            vec![Patch::insert(0, "@A "), Patch::insert(0, "@B ")],
        )
        .unwrap();
        assert_eq!(output, "@A @B fun f() = 1");
    }

    #[test]
    fn insertion_next_to_replacement() {
        let output = apply_patches("abc", vec![patch(1, 2, "B"), Patch::insert(1, "+")]).unwrap();
        assert_eq!(output, "a+Bc");
    }

    #[test]
    fn out_of_range_rejected() {
        let set = PatchSet::new(vec![patch(5, 20, "x")]).unwrap();
        assert!(matches!(
            set.apply("hello world"),
            Err(PatchError::OutOfRange { text_len: 11, .. })
        ));
    }

    #[test]
    fn inverted_range_rejected() {
        let result = PatchSet::new(vec![patch(10, 5, "x")]);
        assert!(matches!(result, Err(PatchError::OutOfRange { .. })));
    }

    #[test]
    fn char_boundary_rejected() {
        let set = PatchSet::new(vec![patch(1, 2, "x")]).unwrap();
        assert!(matches!(
            set.apply("é!"),
            Err(PatchError::CharBoundary { .. })
        ));
    }

    #[test]
    fn empty_set_is_identity() {
        let set = PatchSet::new(Vec::new()).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.apply("unchanged").unwrap(), "unchanged");
    }
}

//! Property tests for patch application.

use idiom_patcher::{apply_patches, Patch, PatchError, PatchSet, SourceSpan};
use proptest::prelude::*;

/// Disjoint patches over an ASCII text, as (text, patches in span order).
fn text_and_disjoint_patches() -> impl Strategy<Value = (String, Vec<Patch>)> {
    "[a-z \n]{0,64}".prop_flat_map(|text| {
        let len = text.len();
        let cuts = proptest::collection::vec(0..=len, 0..12);
        let replacements = proptest::collection::vec("[A-Z]{0,4}", 12);
        (Just(text), cuts, replacements).prop_map(|(text, mut cuts, replacements)| {
            cuts.sort_unstable();
            cuts.dedup();
            // Consecutive cut pairs give disjoint, possibly adjacent spans.
            let patches = cuts
                .chunks_exact(2)
                .zip(replacements)
                .map(|(pair, replacement)| Patch::new(SourceSpan::new(pair[0], pair[1]), replacement))
                .collect();
            (text, patches)
        })
    })
}

/// Apply patches in span order, building the result left to right.
fn apply_left_to_right(text: &str, patches: &[Patch]) -> String {
    let mut output = String::new();
    let mut cursor = 0;
    for patch in patches {
        output.push_str(&text[cursor..patch.span.start]);
        output.push_str(&patch.replacement);
        cursor = patch.span.end;
    }
    output.push_str(&text[cursor..]);
    output
}

proptest! {
    #[test]
    fn result_matches_left_to_right_reference((text, patches) in text_and_disjoint_patches()) {
        let expected = apply_left_to_right(&text, &patches);
        prop_assert_eq!(apply_patches(&text, patches).unwrap(), expected);
    }

    #[test]
    fn result_is_independent_of_input_order(
        (text, patches, shuffled) in text_and_disjoint_patches().prop_flat_map(|(text, patches)| {
            let shuffled = Just(patches.clone()).prop_shuffle();
            (Just(text), Just(patches), shuffled)
        }),
    ) {
        let forward = apply_patches(&text, patches).unwrap();
        let backward = apply_patches(&text, shuffled).unwrap();
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn overlapping_spans_never_apply(start in 0usize..20, len in 2usize..10, shift in 1usize..10) {
        prop_assume!(shift < len);
        let first = Patch::new(SourceSpan::new(start, start + len), "x");
        let second = Patch::new(SourceSpan::new(start + shift, start + shift + len), "y");

        let result = PatchSet::new(vec![second, first]);
        let is_overlap = matches!(result, Err(PatchError::Overlap { .. }));
        prop_assert!(is_overlap);
    }
}

use crate::syntax::{Preorder, SyntaxTree};
use crate::template::compiler::{Match, Template};

/// Lazily yield every match of `template` in `tree`.
///
/// Candidates are visited in pre-order, depth-first, left-to-right, so the
/// sequence is deterministic and an enclosing match always precedes the
/// matches nested inside it.
pub fn find_matches<'t, 'p>(tree: &'t SyntaxTree, template: &'p Template) -> Matches<'t, 'p> {
    Matches {
        template,
        candidates: tree.preorder(),
    }
}

/// Iterator returned by [`find_matches`].
pub struct Matches<'t, 'p> {
    template: &'p Template,
    candidates: Preorder<'t>,
}

impl<'t> Iterator for Matches<'t, '_> {
    type Item = Match<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        self.candidates
            .by_ref()
            .find_map(|candidate| self.template.match_node(candidate))
    }
}

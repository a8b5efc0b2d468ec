use crate::syntax::errors::SyntaxError;
use crate::syntax::kind::SyntaxKind;
use std::fmt;

/// Half-open byte range `[start, end)` into one source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
}

impl SourceSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Empty span at `offset`, used for pure insertions.
    pub fn empty(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// True when `other` lies entirely within `self`.
    pub fn contains(&self, other: SourceSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Index of a node inside its [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: SyntaxKind,
    span: SourceSpan,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A parsed source text together with its node arena.
///
/// The tree owns its text; [`Node`] handles borrow the tree, so a node can
/// never outlive the text its span points into. Trees are never updated in
/// place: rewriting the text means parsing again.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: String,
    nodes: Vec<NodeData>,
}

impl SyntaxTree {
    /// Lower a tree-sitter tree into an owned arena.
    ///
    /// Fails with the first ERROR or MISSING node in pre-order.
    pub(crate) fn lower(ts_tree: &tree_sitter::Tree, source: String) -> Result<Self, SyntaxError> {
        let mut nodes: Vec<NodeData> = Vec::new();
        let mut ancestors: Vec<NodeId> = Vec::new();
        let mut first_error: Option<SyntaxError> = None;
        let mut cursor = ts_tree.walk();

        'walk: loop {
            let node = cursor.node();
            let kind = SyntaxKind::of(&node);
            if kind == SyntaxKind::Error && first_error.is_none() {
                let position = node.start_position();
                first_error = Some(SyntaxError {
                    span: SourceSpan::new(node.start_byte(), node.end_byte()),
                    line: position.row + 1,
                    column: position.column + 1,
                });
            }

            let id = NodeId(nodes.len() as u32);
            let parent = ancestors.last().copied();
            nodes.push(NodeData {
                kind,
                span: SourceSpan::new(node.start_byte(), node.end_byte()),
                parent,
                children: Vec::new(),
            });
            if let Some(parent) = parent {
                nodes[parent.index()].children.push(id);
            }

            if cursor.goto_first_child() {
                ancestors.push(id);
                continue;
            }
            while !cursor.goto_next_sibling() {
                if !cursor.goto_parent() {
                    break 'walk;
                }
                ancestors.pop();
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(Self { source, nodes }),
        }
    }

    /// The text this tree was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> Node<'_> {
        Node {
            tree: self,
            id: NodeId(0),
        }
    }

    /// Resolve an id previously taken from a node of this tree.
    pub fn node(&self, id: NodeId) -> Node<'_> {
        debug_assert!(id.index() < self.nodes.len());
        Node { tree: self, id }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in pre-order, depth-first, left-to-right.
    pub fn preorder(&self) -> Preorder<'_> {
        self.root().descendants()
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }
}

/// Handle to one node of a [`SyntaxTree`].
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl<'t> Node<'t> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn kind(&self) -> SyntaxKind {
        self.tree.data(self.id).kind
    }

    pub fn span(&self) -> SourceSpan {
        self.tree.data(self.id).span
    }

    pub fn text(&self) -> &'t str {
        let span = self.span();
        &self.tree.source[span.start..span.end]
    }

    pub fn parent(&self) -> Option<Node<'t>> {
        self.tree
            .data(self.id)
            .parent
            .map(|id| Node { tree: self.tree, id })
    }

    /// All children, including comments and anonymous tokens.
    pub fn children(&self) -> impl DoubleEndedIterator<Item = Node<'t>> + 't {
        let tree = self.tree;
        tree.data(self.id)
            .children
            .iter()
            .map(move |&id| Node { tree, id })
    }

    /// Children that take part in structural comparison (everything but comments).
    pub fn significant_children(&self) -> impl DoubleEndedIterator<Item = Node<'t>> + 't {
        self.children().filter(|child| !child.kind().is_trivia())
    }

    pub fn child_count(&self) -> usize {
        self.tree.data(self.id).children.len()
    }

    pub fn is_leaf(&self) -> bool {
        self.child_count() == 0
    }

    /// First child of the given kind.
    pub fn child_of_kind(&self, kind: SyntaxKind) -> Option<Node<'t>> {
        self.children().find(|child| child.kind() == kind)
    }

    /// Children of the given kind, in source order.
    pub fn children_of_kind(&self, kind: SyntaxKind) -> impl Iterator<Item = Node<'t>> + 't {
        self.children().filter(move |child| child.kind() == kind)
    }

    pub fn prev_sibling(&self) -> Option<Node<'t>> {
        let parent = self.parent()?;
        let siblings = &self.tree.data(parent.id).children;
        let position = siblings.iter().position(|&id| id == self.id)?;
        position.checked_sub(1).map(|index| Node {
            tree: self.tree,
            id: siblings[index],
        })
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = Node<'t>> + 't {
        std::iter::successors(self.parent(), |node| node.parent())
    }

    /// This node and everything below it, in pre-order.
    pub fn descendants(&self) -> Preorder<'t> {
        Preorder {
            tree: self.tree,
            stack: vec![self.id],
        }
    }

    /// Indentation of the line this node starts on.
    pub fn line_indent(&self) -> &'t str {
        let source = self.tree.source();
        let start = self.span().start;
        let line_start = source[..start].rfind('\n').map_or(0, |index| index + 1);
        let line = &source[line_start..start];
        let width = line.len() - line.trim_start_matches([' ', '\t']).len();
        &line[..width]
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} {:?}", self.kind(), self.span(), self.text())
    }
}

/// Pre-order iterator over a subtree.
pub struct Preorder<'t> {
    tree: &'t SyntaxTree,
    stack: Vec<NodeId>,
}

impl<'t> Iterator for Preorder<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.data(id).children.iter().rev().copied());
        Some(Node {
            tree: self.tree,
            id,
        })
    }
}

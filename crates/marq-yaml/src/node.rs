//! Node types for YAML documents.

use marq_tokenizer::Position;

/// Identifies a node within its document, stable across mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// The structural kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A mapping; children alternate key, value.
    Mapping,
    /// A sequence of items.
    Sequence,
    /// A scalar leaf.
    Scalar,
}

/// How a scalar was written in the source, for faithful re-emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalarStyle {
    #[default]
    Plain,
    Single,
    Double,
    /// A `|` block scalar.
    Literal,
    /// A flow collection carried verbatim as text.
    Flow,
}

/// One node of a YAML document.
///
/// Comments attach to the node they describe: `head_comment` is the comment
/// block above it, `line_comment` the trailing comment on its line, and
/// `foot_comment` the comment block that closes its section. Comment text is
/// stored verbatim, including the `#`.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    /// The resolved tag: `!!str`, `!!int`, `!!bool`, `!!float`, `!!null`,
    /// `!!map`, `!!seq`, or `!!var` once a transform rewrites the node.
    pub tag: String,
    /// The scalar value; empty for mappings and sequences.
    pub value: String,
    /// Mapping entries (alternating key, value) or sequence items.
    pub children: Vec<Node>,
    pub head_comment: String,
    pub line_comment: String,
    pub foot_comment: String,
    pub style: ScalarStyle,
    /// Where the node started in the source.
    pub position: Position,
}

impl Node {
    pub(crate) fn new(id: NodeId, kind: NodeKind, position: Position) -> Self {
        let tag = match kind {
            NodeKind::Mapping => "!!map",
            NodeKind::Sequence => "!!seq",
            NodeKind::Scalar => "!!str",
        };
        Self {
            id,
            kind,
            tag: tag.to_string(),
            value: String::new(),
            children: Vec::new(),
            head_comment: String::new(),
            line_comment: String::new(),
            foot_comment: String::new(),
            style: ScalarStyle::Plain,
            position,
        }
    }

    /// Whether this node is a scalar leaf.
    pub fn is_scalar(&self) -> bool {
        self.kind == NodeKind::Scalar
    }

    /// The (key, value) pairs of a mapping node.
    pub fn mapping_pairs(&self) -> impl Iterator<Item = (&Node, &Node)> {
        self.children
            .chunks_exact(2)
            .map(|pair| (&pair[0], &pair[1]))
    }

    /// Look up the value node for a key in a mapping.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.mapping_pairs()
            .find(|(k, _)| k.value == key)
            .map(|(_, v)| v)
    }

    /// The node's three comment slots, for uniform rewriting.
    pub fn comments_mut(&mut self) -> [&mut String; 3] {
        [
            &mut self.head_comment,
            &mut self.line_comment,
            &mut self.foot_comment,
        ]
    }

    /// Find a node by id, depth first.
    pub fn find(&self, id: NodeId) -> Option<&Node> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Find a node by id, depth first, mutably.
    pub fn find_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if self.id == id {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_mut(id))
    }
}

/// A parsed YAML document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: Node,
}

impl Document {
    /// Find a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.root.find(id)
    }

    /// Find a node by id, mutably.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.root.find_mut(id)
    }
}

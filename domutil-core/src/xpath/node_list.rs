//! Ordered node results of an XPath query

use xot::Node;

/// Nodes returned by an XPath query, in the order the engine yielded them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeList {
    nodes: Vec<Node>,
}

impl NodeList {
    /// Create a node list from already collected nodes
    pub fn new(nodes: Vec<Node>) -> Self {
        NodeList { nodes }
    }

    /// Number of nodes in the list
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node at `index`, if any
    pub fn item(&self, index: usize) -> Option<Node> {
        self.nodes.get(index).copied()
    }

    /// First node of the list
    pub fn first(&self) -> Option<Node> {
        self.item(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = Node> + '_ {
        self.nodes.iter().copied()
    }

    pub fn as_slice(&self) -> &[Node] {
        &self.nodes
    }

    pub fn into_vec(self) -> Vec<Node> {
        self.nodes
    }
}

impl From<Vec<Node>> for NodeList {
    fn from(nodes: Vec<Node>) -> Self {
        NodeList::new(nodes)
    }
}

impl IntoIterator for NodeList {
    type Item = Node;
    type IntoIter = std::vec::IntoIter<Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

//! Arena-backed thought tree.
//!
//! Every node lives in a single `Vec` owned by [`ThoughtTree`] and is addressed
//! by a [`NodeId`]. Ownership flows root -> children only; the parent link is a
//! plain index used for upward traversal and trajectory reconstruction.
//!
//! Nodes are never removed. Arena order is creation order, which is also the
//! tie-break order used when pruning.

use crate::tree::content::Content;

/// Index of a node inside its [`ThoughtTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One reasoning step
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Text of this step alone
    pub(crate) content: String,
    /// Root-to-here text with step markers, fixed at creation
    pub(crate) trajectory: String,
    pub(crate) depth: usize,
    /// Score from the path scorer, `None` until scored
    pub(crate) value: Option<f64>,
    /// Number of times this node was selected into an active beam
    pub(crate) visits: usize,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn trajectory(&self) -> &str {
        &self.trajectory
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn visits(&self) -> usize {
        self.visits
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Trajectory preamble for the root question
pub fn root_trajectory(question: &str) -> String {
    format!("# Question:\n{}\n---\n", question)
}

/// Text appended to the parent trajectory for a step at `depth`
pub fn step_line(depth: usize, content: &str) -> String {
    format!("Step {}: {}\n", depth, content)
}

/// A tree of thoughts with exactly one root
#[derive(Debug, Clone, PartialEq)]
pub struct ThoughtTree {
    nodes: Vec<Node>,
}

impl ThoughtTree {
    /// Creates a tree holding only the root question.
    pub fn new(question: impl Into<Content>) -> Self {
        let content = question.into().normalize();
        let trajectory = root_trajectory(&content);
        ThoughtTree {
            nodes: vec![Node {
                content,
                trajectory,
                depth: 0,
                value: None,
                visits: 0,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Builds a tree from nodes already laid out in arena order.
    /// Structural checks are the caller's job (see the codec).
    pub(crate) fn from_nodes(nodes: Vec<Node>) -> Self {
        ThoughtTree { nodes }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn root_node(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree owns at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// # Panics
    /// Panics if `id` does not belong to this tree.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Iterates `(id, node)` pairs in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Appends a new child to `parent` and returns its id.
    ///
    /// The child inherits the parent trajectory plus its own step line, has
    /// `depth = parent.depth + 1`, no children, no value and zero visits.
    pub fn create_child(&mut self, parent: NodeId, content: impl Into<Content>) -> NodeId {
        let content = content.into().normalize();
        let parent_node = &self.nodes[parent.0];
        let depth = parent_node.depth + 1;
        let mut trajectory = parent_node.trajectory.clone();
        trajectory.push_str(&step_line(depth, &content));

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            content,
            trajectory,
            depth,
            value: None,
            visits: 0,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub(crate) fn set_value(&mut self, id: NodeId, value: f64) {
        let node = &mut self.nodes[id.0];
        debug_assert!(node.value.is_none(), "value of {} written twice", id);
        node.value = Some(value);
    }

    pub(crate) fn record_visit(&mut self, id: NodeId) {
        self.nodes[id.0].visits += 1;
    }

    /// Ids from the root down to `id`, inclusive.
    pub fn path_to_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut current = self.nodes[id.0].parent;
        while let Some(parent) = current {
            path.push(parent);
            current = self.nodes[parent.0].parent;
        }
        path.reverse();
        path
    }

    /// Rebuilds the trajectory of `id` from contents along the parent chain.
    pub fn reconstruct_trajectory(&self, id: NodeId) -> String {
        let path = self.path_to_root(id);
        let mut trajectory = root_trajectory(&self.nodes[path[0].0].content);
        for step in &path[1..] {
            let node = &self.nodes[step.0];
            trajectory.push_str(&step_line(node.depth, &node.content));
        }
        trajectory
    }

    /// Depth-first ids from the root, children in generation order.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev());
        }
        order
    }

    pub fn leaves(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| node.is_leaf())
            .map(|(id, _)| id)
            .collect()
    }

    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Highest value among the scored leaves under `id` (itself included when
    /// it is a leaf). `None` when no leaf in the subtree is scored.
    pub fn best_leaf_value(&self, id: NodeId) -> Option<f64> {
        let node = &self.nodes[id.0];
        if node.is_leaf() {
            return node.value;
        }
        node.children
            .iter()
            .filter_map(|&child| self.best_leaf_value(child))
            .max_by(f64::total_cmp)
    }
}

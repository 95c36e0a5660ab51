use super::{FragmentList, InstanceTree};
use crate::bounding_volume::{Aabb, BoundingVolume};

#[derive(Clone, Debug)]
struct PartNode {
    parent: u32,
    depth: u32,
    children: Vec<u32>,
    fragments: Vec<u32>,
    aabb: Aabb,
}

impl PartNode {
    fn new(parent: u32, depth: u32) -> Self {
        Self {
            parent,
            depth,
            children: Vec::new(),
            fragments: Vec::new(),
            aabb: Aabb::new_invalid(),
        }
    }
}

/// A part hierarchy stored as a flat array of nodes.
///
/// Node 0 is the root. A node is always created after its parent, so a node index is
/// always greater than the index of its parent.
#[derive(Clone, Debug)]
pub struct SimpleInstanceTree {
    nodes: Vec<PartNode>,
}

impl Default for SimpleInstanceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SimpleInstanceTree {
    /// The id of the root node.
    pub const ROOT: u32 = 0;

    /// A hierarchy made of a single root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![PartNode::new(Self::ROOT, 0)],
        }
    }

    /// Adds a child to the node `parent` and returns its id.
    pub fn add_node(&mut self, parent: u32) -> u32 {
        let id = self.nodes.len() as u32;
        let depth = self.nodes[parent as usize].depth + 1;
        self.nodes[parent as usize].children.push(id);
        self.nodes.push(PartNode::new(parent, depth));
        id
    }

    /// Attaches the fragment `fragment` to the node `node`.
    pub fn add_fragment(&mut self, node: u32, fragment: u32) {
        self.nodes[node as usize].fragments.push(fragment);
    }

    /// The number of nodes, the root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Does this tree contain only its root?
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// The parent of `node`. The root is its own parent.
    pub fn parent(&self, node: u32) -> u32 {
        self.nodes[node as usize].parent
    }

    /// Recomputes the box of every node from the un-animated boxes of `fragments`.
    ///
    /// Must be called whenever fragments are attached or moved.
    pub fn update_aabbs(&mut self, fragments: &dyn FragmentList) {
        for node in &mut self.nodes {
            node.aabb = node
                .fragments
                .iter()
                .fold(Aabb::new_invalid(), |acc, fragment| {
                    acc.merged(&fragments.fragment_aabb(*fragment))
                });
        }

        // Children come after their parent, so a reverse sweep sees each child completed.
        for id in (1..self.nodes.len()).rev() {
            let aabb = self.nodes[id].aabb;
            let parent = self.nodes[id].parent as usize;
            self.nodes[parent].aabb.merge(&aabb);
        }
    }
}

impl InstanceTree for SimpleInstanceTree {
    fn root_id(&self) -> u32 {
        Self::ROOT
    }

    fn max_depth(&self) -> u32 {
        self.nodes.iter().map(|node| node.depth + 1).max().unwrap_or(1)
    }

    fn node_aabb(&self, node: u32) -> Aabb {
        self.nodes[node as usize].aabb
    }

    fn for_each_child(&self, node: u32, f: &mut dyn FnMut(u32)) {
        self.nodes[node as usize].children.iter().for_each(|child| f(*child))
    }

    fn for_each_fragment(&self, node: u32, f: &mut dyn FnMut(u32)) {
        self.nodes[node as usize]
            .fragments
            .iter()
            .for_each(|fragment| f(*fragment))
    }
}

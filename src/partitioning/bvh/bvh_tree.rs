use super::bvh_binned_build::{BvhBuildOptions, BvhWorkspace};
use super::PrimitiveSet;
use crate::bounding_volume::Aabb;
use crate::math::{Point, Real, Vector};
use core::mem::size_of;
use core::ops::Range;
use smallvec::SmallVec;

bitflags::bitflags! {
    /// Flags attached to each [`BvhNode`].
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
    pub struct BvhNodeFlags: u8 {
        /// The right child lies at lower coordinates than the left child along the split axis.
        const SPLIT_NEGATIVE = 1 << 0;
        /// The node belongs to the transparent subtree.
        const TRANSPARENT = 1 << 1;
    }
}

/// A node (internal or leaf) of a [`Bvh`].
///
/// Nodes are plain records stored in a flat array and reference each other by index only.
/// The children of an internal node are always allocated next to each other: the right
/// child index is the left child index plus one.
///
/// Both leaves and internal nodes own a contiguous range of the BVH primitive order:
/// - a leaf owns `prim_count` primitives starting at `prim_start`,
/// - an internal node may own a few "fattened" primitives starting at `prim_start`, and its
///   children own the primitives right after them.
#[derive(Copy, Clone, Debug, PartialEq)]
#[repr(C)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct BvhNode {
    pub(super) mins: Point<Real>,
    /// Index of the left child, or 0 for a leaf. Node 0 is a root and never a child.
    pub(super) left_child: u32,
    pub(super) maxs: Point<Real>,
    pub(super) prim_start: u32,
    pub(super) prim_count: u32,
    pub(super) split_axis: u8,
    pub(super) flags: BvhNodeFlags,
}

#[cfg(feature = "f32")]
static_assertions::const_assert_eq!(core::mem::size_of::<BvhNode>(), 40);

impl BvhNode {
    #[inline(always)]
    pub(super) fn empty(flags: BvhNodeFlags, prim_start: u32) -> Self {
        let aabb = Aabb::new_invalid();
        Self {
            mins: aabb.mins,
            left_child: 0,
            maxs: aabb.maxs,
            prim_start,
            prim_count: 0,
            split_axis: 0,
            flags,
        }
    }

    #[inline(always)]
    pub(super) fn set_aabb(&mut self, aabb: &Aabb) {
        self.mins = aabb.mins;
        self.maxs = aabb.maxs;
    }

    /// Is this node a leaf?
    #[inline(always)]
    pub fn is_leaf(&self) -> bool {
        self.left_child == 0
    }

    /// Does this node belong to the transparent subtree?
    #[inline(always)]
    pub fn is_transparent(&self) -> bool {
        self.flags.contains(BvhNodeFlags::TRANSPARENT)
    }

    /// The flags of this node.
    #[inline(always)]
    pub fn flags(&self) -> BvhNodeFlags {
        self.flags
    }

    /// The indices of the left and right children, if this node is not a leaf.
    #[inline]
    pub fn children(&self) -> Option<[u32; 2]> {
        (!self.is_leaf()).then_some([self.left_child, self.left_child + 1])
    }

    /// The children ordered from the nearest to the farthest when looking along `view_dir`.
    #[inline]
    pub fn children_near_to_far(&self, view_dir: &Vector<Real>) -> Option<[u32; 2]> {
        let [left, right] = self.children()?;
        let left_on_min_side = !self.flags.contains(BvhNodeFlags::SPLIT_NEGATIVE);
        let looking_toward_max = view_dir[self.split_axis as usize] >= 0.0;

        if left_on_min_side == looking_toward_max {
            Some([left, right])
        } else {
            Some([right, left])
        }
    }

    /// The axis this node was split along. Meaningless for leaves.
    #[inline]
    pub fn split_axis(&self) -> usize {
        self.split_axis as usize
    }

    /// The primitive-order positions owned directly by this node.
    ///
    /// For a leaf these are all its primitives. For an internal node these are the
    /// fattened primitives kept at this level (usually none).
    #[inline]
    pub fn primitive_range(&self) -> Range<usize> {
        self.prim_start as usize..(self.prim_start + self.prim_count) as usize
    }

    /// The number of primitives owned directly by this node.
    #[inline]
    pub fn primitive_count(&self) -> u32 {
        self.prim_count
    }

    /// The min corner of this node’s AABB.
    #[inline]
    pub fn mins(&self) -> Point<Real> {
        self.mins
    }

    /// The max corner of this node’s AABB.
    #[inline]
    pub fn maxs(&self) -> Point<Real> {
        self.maxs
    }

    /// This node’s AABB.
    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.mins, self.maxs)
    }

    /// The center of this node’s AABB.
    #[inline]
    pub fn center(&self) -> Point<Real> {
        na::center(&self.mins, &self.maxs)
    }
}

/// A bounding volume hierarchy over the primitives of one model.
///
/// The hierarchy is made of two trees sharing a single node array:
/// - node [`Bvh::OPAQUE_ROOT`] is the root of every opaque primitive,
/// - node [`Bvh::TRANSPARENT_ROOT`] is the root of every transparent primitive.
///
/// The primitive order is a permutation of the input primitive indices laid out as
/// `[opaque..., transparent...]`. Every node refers to a contiguous range of it.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Bvh {
    pub(super) nodes: Vec<BvhNode>,
    pub(super) primitive_order: Vec<u32>,
    pub(super) first_transparent: usize,
    pub(super) scene_epsilon: Real,
}

impl Bvh {
    /// Index of the root of the opaque subtree.
    pub const OPAQUE_ROOT: u32 = 0;
    /// Index of the root of the transparent subtree.
    pub const TRANSPARENT_ROOT: u32 = 1;

    /// An empty BVH.
    ///
    /// Unlike a BVH built from zero primitives, this has no root nodes at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a BVH over the given primitives.
    pub fn build(primitives: &PrimitiveSet, options: &BvhBuildOptions) -> Self {
        let mut result = Self::new();
        let mut workspace = BvhWorkspace::default();
        result.rebuild(&mut workspace, primitives, options);
        result
    }

    /// All the nodes of this tree.
    #[inline]
    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// The node with the given index.
    #[inline]
    pub fn node(&self, id: u32) -> &BvhNode {
        &self.nodes[id as usize]
    }

    /// The reordered primitive indices, opaque primitives first.
    #[inline]
    pub fn primitive_order(&self) -> &[u32] {
        &self.primitive_order
    }

    /// Position, in [`Bvh::primitive_order`], of the first transparent primitive.
    ///
    /// Equal to the number of primitives if there are no transparent primitives.
    #[inline]
    pub fn first_transparent(&self) -> usize {
        self.first_transparent
    }

    /// The number of primitives indexed by this tree.
    #[inline]
    pub fn primitive_count(&self) -> usize {
        self.primitive_order.len()
    }

    /// Does this tree index no primitive at all?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.primitive_order.is_empty()
    }

    /// The distance below which centroid extents are considered degenerate.
    ///
    /// This is `1.0e-5` times the largest extent of the opaque primitives’ bounding box.
    #[inline]
    pub fn scene_epsilon(&self) -> Real {
        self.scene_epsilon
    }

    /// The primitive indices owned directly by the node `id`.
    #[inline]
    pub fn primitives_of(&self, id: u32) -> &[u32] {
        &self.primitive_order[self.nodes[id as usize].primitive_range()]
    }

    /// The range of [`Bvh::primitive_order`] covered by the whole subtree rooted at `id`.
    pub fn subtree_range(&self, id: u32) -> Range<usize> {
        let start = self.nodes[id as usize].prim_start as usize;
        let mut curr = id;

        // The right-most descendant owns the end of the range.
        while let Some([_, right]) = self.nodes[curr as usize].children() {
            curr = right;
        }

        start..self.nodes[curr as usize].primitive_range().end
    }

    /// The AABB bounding everything contained by this BVH.
    pub fn root_aabb(&self) -> Aabb {
        use crate::bounding_volume::BoundingVolume;

        self.nodes
            .iter()
            .take(2)
            .fold(Aabb::new_invalid(), |acc, root| acc.merged(&root.aabb()))
    }

    /// The number of leaves of this tree, both subtrees included.
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    /// The depth of the deepest of the two subtrees, 0 if the tree has no node.
    ///
    /// A root that is a leaf has a depth of 1.
    pub fn depth(&self) -> u32 {
        let mut max_depth = 0;
        let mut stack: SmallVec<[(u32, u32); 32]> = SmallVec::new();

        for root in [Self::OPAQUE_ROOT, Self::TRANSPARENT_ROOT] {
            if (root as usize) < self.nodes.len() {
                stack.push((root, 1));
            }
        }

        while let Some((id, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);

            if let Some([left, right]) = self.nodes[id as usize].children() {
                stack.push((left, depth + 1));
                stack.push((right, depth + 1));
            }
        }

        max_depth
    }

    /// An approximation of the memory dynamically-allocated by this struct.
    pub fn heap_memory_size(&self) -> usize {
        let Self {
            nodes,
            primitive_order,
            first_transparent: _,
            scene_epsilon: _,
        } = self;
        nodes.capacity() * size_of::<BvhNode>() + primitive_order.capacity() * size_of::<u32>()
    }
}

use super::bvh_tree::{BvhNode, BvhNodeFlags};
use super::{Bvh, PrimitiveSet};
use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::math::{Point, Real};
use arrayvec::ArrayVec;
use core::ops::Range;

/// The maximum number of bins evaluated for a single split.
const MAX_BINS: usize = 16;
/// Shrinks the bin mapping so the largest centroid never lands one past the last bin.
const BIN_EPSILON: Real = 1.0e-5;
/// Ratio between the scene epsilon and the largest extent of the opaque primitives.
const SCENE_EPSILON_SCALE: Real = 1.0e-5;

/// Options controlling the shape of a [`Bvh`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct BvhBuildOptions {
    /// Opaque nodes with at most this many primitives become leaves.
    pub frags_per_leaf_node: u32,
    /// Transparent nodes with at most this many primitives become leaves.
    pub frags_per_leaf_node_transparent: u32,
    /// The number of primitives kept directly inside each internal node ("fattening").
    ///
    /// The first primitives of a node’s range are kept, so primitives are expected to be
    /// sorted largest-first. Set to zero to disable fattening.
    pub frags_per_inner_node: u32,
    /// Nodes totaling fewer polygons than this become leaves.
    ///
    /// Only applies when polygon counts are given to the builder.
    pub max_polys_per_node: u64,
    /// Nodes deeper than this become leaves.
    pub max_depth: u32,
}

impl Default for BvhBuildOptions {
    fn default() -> Self {
        Self {
            frags_per_leaf_node: 32,
            frags_per_leaf_node_transparent: 32,
            frags_per_inner_node: 0,
            max_polys_per_node: 10_000,
            max_depth: 15,
        }
    }
}

impl BvhBuildOptions {
    /// The default options, with every threshold halved for memory-constrained devices.
    pub fn for_weak_device() -> Self {
        Self::default().halved()
    }

    /// These options with the leaf thresholds, fattening count and polygon limit halved.
    ///
    /// Leaf thresholds never go below one.
    pub fn halved(self) -> Self {
        Self {
            frags_per_leaf_node: (self.frags_per_leaf_node / 2).max(1),
            frags_per_leaf_node_transparent: (self.frags_per_leaf_node_transparent / 2).max(1),
            frags_per_inner_node: self.frags_per_inner_node / 2,
            max_polys_per_node: self.max_polys_per_node / 2,
            max_depth: self.max_depth,
        }
    }
}

/// Workspace data for building a [`Bvh`].
///
/// This is all temporary data that can be freed at any time without affecting results.
/// Reusing the same instance across builds lowers the cost of internal allocations, and
/// giving each thread its own instance lets several models be built concurrently.
#[derive(Clone, Debug, Default)]
pub struct BvhWorkspace {
    centroids: Vec<Point<Real>>,
    bin_ids: Vec<u8>,
    right_buffer: Vec<u32>,
    stack: Vec<SubdivideTask>,
}

/// A pending subdivision of a node.
#[derive(Copy, Clone, Debug)]
struct SubdivideTask {
    node: u32,
    start: u32,
    end: u32,
    depth: u32,
    aabb: Aabb,
    centroid_aabb: Aabb,
    polygon_count: u64,
}

impl SubdivideTask {
    #[inline]
    fn range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    #[inline]
    fn len(&self) -> u32 {
        self.end - self.start
    }
}

/// Aggregate of the primitives falling into one bin (or into a run of bins).
#[derive(Copy, Clone, Debug)]
struct BvhBin {
    aabb: Aabb,
    centroid_aabb: Aabb,
    count: u32,
    polygon_count: u64,
}

impl Default for BvhBin {
    fn default() -> Self {
        Self {
            aabb: Aabb::new_invalid(),
            centroid_aabb: Aabb::new_invalid(),
            count: 0,
            polygon_count: 0,
        }
    }
}

impl BvhBin {
    #[inline]
    fn add(&mut self, aabb: &Aabb, centroid: Point<Real>, polygon_count: u32) {
        self.aabb.merge(aabb);
        self.centroid_aabb.take_point(centroid);
        self.count += 1;
        self.polygon_count += polygon_count as u64;
    }

    #[inline]
    fn merge(&mut self, other: &Self) {
        self.aabb.merge(&other.aabb);
        self.centroid_aabb.merge(&other.centroid_aabb);
        self.count += other.count;
        self.polygon_count += other.polygon_count;
    }

    #[inline]
    fn sah_cost(&self) -> Real {
        self.aabb.surface_area() * self.count as Real
    }
}

/// The best split found for a node.
#[derive(Copy, Clone, Debug)]
struct SplitInfo {
    axis: usize,
    /// Primitives with a bin id lower than or equal to this go to the left child.
    last_left_bin: u8,
    cost: Real,
    left: BvhBin,
    right: BvhBin,
}

/// The number of bins to evaluate for a node with `count` primitives.
///
/// This follows the `4 + 2 * floor(sqrt(count))` rule from Wald’s binned SAH paper.
#[inline]
fn bin_count(count: u32) -> usize {
    (4 + 2 * (count as f64).sqrt() as usize).min(MAX_BINS)
}

impl Bvh {
    /// Fully rebuilds this BVH over the given primitives.
    ///
    /// The node and primitive-order buffers of `self` are reused, so rebuilding a tree with
    /// the same primitive count (for example after a placement transform moved every box)
    /// doesn’t allocate.
    ///
    /// This never fails: empty sets, single primitives and coincident primitives all end
    /// up in valid leaves after a bounded number of subdivisions.
    pub fn rebuild(
        &mut self,
        workspace: &mut BvhWorkspace,
        primitives: &PrimitiveSet,
        options: &BvhBuildOptions,
    ) {
        let count = primitives.len();
        self.nodes.clear();
        self.first_transparent = primitives.stable_partition(&mut self.primitive_order);

        workspace.centroids.clear();
        workspace
            .centroids
            .extend((0..count as u32).map(|i| primitives.centroid(i)));
        workspace.bin_ids.clear();
        workspace.bin_ids.resize(count, 0);
        workspace.stack.clear();

        let opaque_range = 0..self.first_transparent;
        let transparent_range = self.first_transparent..count;

        let mut opaque_aabb = Aabb::new_invalid();
        for &prim in &self.primitive_order[opaque_range.clone()] {
            opaque_aabb.merge(primitives.aabb(prim));
        }

        let reference_aabb = if opaque_aabb.is_empty() {
            self.range_aabbs(primitives, &workspace.centroids, transparent_range.clone())
                .0
        } else {
            opaque_aabb
        };
        self.scene_epsilon = SCENE_EPSILON_SCALE * reference_aabb.largest_extent();

        self.nodes.reserve(count.max(1) * 2);
        self.nodes.push(BvhNode::empty(BvhNodeFlags::empty(), 0));
        self.nodes.push(BvhNode::empty(
            BvhNodeFlags::TRANSPARENT,
            self.first_transparent as u32,
        ));

        // Pushed in reverse so the opaque tree gets the lowest node indices.
        for (root, range) in [
            (Bvh::TRANSPARENT_ROOT, transparent_range),
            (Bvh::OPAQUE_ROOT, opaque_range),
        ] {
            if range.is_empty() {
                continue;
            }

            let (aabb, centroid_aabb) =
                self.range_aabbs(primitives, &workspace.centroids, range.clone());
            let polygon_count = self.primitive_order[range.clone()]
                .iter()
                .map(|prim| primitives.polygon_count(*prim) as u64)
                .sum();

            workspace.stack.push(SubdivideTask {
                node: root,
                start: range.start as u32,
                end: range.end as u32,
                depth: 0,
                aabb,
                centroid_aabb,
                polygon_count,
            });
        }

        while let Some(task) = workspace.stack.pop() {
            self.subdivide(workspace, primitives, options, task);
        }

        log::debug!(
            "Built a BVH with {} nodes, {} leaves and a depth of {} over {} primitives ({} transparent).",
            self.nodes.len(),
            self.leaf_count(),
            self.depth(),
            count,
            count - self.first_transparent
        );
    }

    fn range_aabbs(
        &self,
        primitives: &PrimitiveSet,
        centroids: &[Point<Real>],
        range: Range<usize>,
    ) -> (Aabb, Aabb) {
        let mut aabb = Aabb::new_invalid();
        let mut centroid_aabb = Aabb::new_invalid();

        for &prim in &self.primitive_order[range] {
            aabb.merge(primitives.aabb(prim));
            centroid_aabb.take_point(centroids[prim as usize]);
        }

        (aabb, centroid_aabb)
    }

    fn subdivide(
        &mut self,
        workspace: &mut BvhWorkspace,
        primitives: &PrimitiveSet,
        options: &BvhBuildOptions,
        task: SubdivideTask,
    ) {
        let node_id = task.node as usize;
        self.nodes[node_id].set_aabb(&task.aabb);
        self.nodes[node_id].prim_start = task.start;

        let transparent = self.nodes[node_id].is_transparent();
        let leaf_threshold = if transparent {
            options.frags_per_leaf_node_transparent
        } else {
            options.frags_per_leaf_node
        };

        let count = task.len();
        let axis = task.centroid_aabb.largest_axis();
        let few_polygons =
            primitives.has_polygon_counts() && task.polygon_count < options.max_polys_per_node;

        if count <= 1
            || count <= leaf_threshold
            || few_polygons
            || task.depth > options.max_depth
            || task.centroid_aabb.extents()[axis] < self.scene_epsilon
        {
            self.nodes[node_id].prim_count = count;
            return;
        }

        // Keep the first primitives of the range (expected to be the largest) in this node.
        let inline_count = options.frags_per_inner_node.min(count);
        let remaining = task.start + inline_count..task.end;
        let (centroid_aabb, axis) = if inline_count > 0 {
            let mut centroid_aabb = Aabb::new_invalid();
            for &prim in &self.primitive_order[remaining.start as usize..remaining.end as usize] {
                centroid_aabb.take_point(workspace.centroids[prim as usize]);
            }
            (centroid_aabb, centroid_aabb.largest_axis())
        } else {
            (task.centroid_aabb, axis)
        };

        let split = self.find_split(
            workspace,
            primitives,
            remaining.start as usize..remaining.end as usize,
            &centroid_aabb,
            axis,
        );

        let Some(split) = split else {
            log::debug!(
                "No finite SAH split for node {} ({} primitives): keeping them in an oversized leaf.",
                node_id,
                count
            );
            self.nodes[node_id].prim_count = count;
            return;
        };

        let mid = self.partition(
            workspace,
            remaining.start as usize..remaining.end as usize,
            split.last_left_bin,
        );
        debug_assert_eq!(mid - remaining.start as usize, split.left.count as usize);

        let left_id = self.nodes.len() as u32;
        let child_flags = self.nodes[node_id].flags & BvhNodeFlags::TRANSPARENT;
        self.nodes.push(BvhNode::empty(child_flags, remaining.start));
        self.nodes.push(BvhNode::empty(child_flags, mid as u32));

        let node = &mut self.nodes[node_id];
        node.left_child = left_id;
        node.prim_count = inline_count;
        node.split_axis = split.axis as u8;
        node.flags.set(
            BvhNodeFlags::SPLIT_NEGATIVE,
            split.right.aabb.center()[split.axis] < split.left.aabb.center()[split.axis],
        );

        // Right first so the left subtree is built (and laid out) first.
        workspace.stack.push(SubdivideTask {
            node: left_id + 1,
            start: mid as u32,
            end: remaining.end,
            depth: task.depth + 1,
            aabb: split.right.aabb,
            centroid_aabb: split.right.centroid_aabb,
            polygon_count: split.right.polygon_count,
        });
        workspace.stack.push(SubdivideTask {
            node: left_id,
            start: remaining.start,
            end: mid as u32,
            depth: task.depth + 1,
            aabb: split.left.aabb,
            centroid_aabb: split.left.centroid_aabb,
            polygon_count: split.left.polygon_count,
        });
    }

    /// Bins the primitives of `range` along `axis` and selects the cheapest SAH split.
    ///
    /// The bin of every primitive is written to the workspace so the partition doesn’t
    /// recompute it. Returns `None` if no split with a finite cost exists.
    fn find_split(
        &self,
        workspace: &mut BvhWorkspace,
        primitives: &PrimitiveSet,
        range: Range<usize>,
        centroid_aabb: &Aabb,
        axis: usize,
    ) -> Option<SplitInfo> {
        let count = range.len() as u32;
        let extent = centroid_aabb.extents()[axis];

        if count < 2 || centroid_aabb.is_empty() || !(extent > 0.0) || extent < self.scene_epsilon {
            return None;
        }

        let num_bins = bin_count(count);
        let mut bins: ArrayVec<BvhBin, MAX_BINS> =
            (0..num_bins).map(|_| BvhBin::default()).collect();

        let k1 = num_bins as Real * (1.0 - BIN_EPSILON) / extent;
        let k0 = centroid_aabb.mins[axis];

        for (pos, &prim) in self.primitive_order[range].iter().enumerate() {
            let centroid = workspace.centroids[prim as usize];
            let bin_id = ((k1 * (centroid[axis] - k0)) as usize).min(num_bins - 1);
            workspace.bin_ids[pos] = bin_id as u8;
            bins[bin_id].add(primitives.aabb(prim), centroid, primitives.polygon_count(prim));
        }

        // Suffix accumulation: right_merges[i] aggregates bins[i..].
        let mut right_merges = bins.clone();
        for i in (0..num_bins - 1).rev() {
            let next = right_merges[i + 1];
            right_merges[i].merge(&next);
        }

        let mut best: Option<SplitInfo> = None;
        let mut left_merge = BvhBin::default();

        for i in 0..num_bins - 1 {
            left_merge.merge(&bins[i]);
            let right = &right_merges[i + 1];

            if left_merge.count == 0 || right.count == 0 {
                continue;
            }

            let cost = left_merge.sah_cost() + right.sah_cost();
            if best.map_or(true, |best| cost < best.cost) {
                best = Some(SplitInfo {
                    axis,
                    last_left_bin: i as u8,
                    cost,
                    left: left_merge,
                    right: *right,
                });
            }
        }

        best.filter(|split| split.cost.is_finite())
    }

    /// Stable two-way partition of `range` using the bin ids computed by `find_split`.
    ///
    /// Returns the position of the first primitive of the right side.
    fn partition(
        &mut self,
        workspace: &mut BvhWorkspace,
        range: Range<usize>,
        last_left_bin: u8,
    ) -> usize {
        workspace.right_buffer.clear();
        let mut write = range.start;

        for pos in 0..range.len() {
            let prim = self.primitive_order[range.start + pos];

            if workspace.bin_ids[pos] <= last_left_bin {
                self.primitive_order[write] = prim;
                write += 1;
            } else {
                workspace.right_buffer.push(prim);
            }
        }

        self.primitive_order[write..range.end].copy_from_slice(&workspace.right_buffer);
        write
    }
}

use super::{BatchId, Camera, DrawMode, RenderBatch};
use crate::bounding_volume::Aabb;
use crate::math::{Point, Real};
use crate::partitioning::Bvh;
use crate::query::Frustum;
use core::cmp::Ordering;
use ordered_float::OrderedFloat;
use std::collections::BinaryHeap;

/// The batch produced for one node of a [`Bvh`].
///
/// A batch covers the primitives owned directly by its node: all the primitives of a
/// leaf, or the fattened primitives of an internal node.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BvhBatch {
    node: u32,
    importance: Real,
    avg_frame_time: Option<f64>,
}

impl BvhBatch {
    /// The BVH node this batch draws.
    #[inline]
    pub fn node(&self) -> u32 {
        self.node
    }
}

impl RenderBatch for BvhBatch {
    fn render_importance(&self) -> Real {
        self.importance
    }

    fn avg_frame_time(&self) -> Option<f64> {
        self.avg_frame_time
    }

    fn set_avg_frame_time(&mut self, time_ms: f64) {
        self.avg_frame_time = Some(time_ms);
    }
}

#[derive(Copy, Clone, Debug)]
struct NodeEntry {
    importance: OrderedFloat<Real>,
    id: u32,
}

impl PartialOrd for NodeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NodeEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Lower node ids first among equally important nodes.
        self.importance
            .cmp(&other.importance)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialEq for NodeEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NodeEntry {}

/// The importance of a box seen from `eye`: its surface area over its squared distance.
///
/// A box containing the eye has the maximum importance.
pub fn screen_importance(aabb: &Aabb, eye: &Point<Real>) -> Real {
    if aabb.contains_local_point(eye) {
        return Real::MAX;
    }

    let dist_sq = na::distance_squared(&aabb.center(), eye).max(Real::EPSILON);
    aabb.surface_area() / dist_sq
}

/// Walks a [`Bvh`] from the most to the least important visible node.
///
/// The opaque subtree is fully served before the transparent one so transparent geometry
/// is drawn over everything else. Nodes outside of the view frustum are skipped together
/// with their whole subtree.
#[derive(Clone, Debug)]
pub struct BvhIterator {
    batches: Vec<BvhBatch>,
    heap: BinaryHeap<NodeEntry>,
    transparent_pending: bool,
    eye: Point<Real>,
    frustum: Option<Frustum>,
}

impl Default for BvhIterator {
    fn default() -> Self {
        Self::new()
    }
}

impl BvhIterator {
    /// An iterator that yields nothing until it is reset.
    pub fn new() -> Self {
        Self {
            batches: Vec::new(),
            heap: BinaryHeap::new(),
            transparent_pending: false,
            eye: Point::origin(),
            frustum: None,
        }
    }

    /// Restarts the walk of `bvh` for a new traversal.
    ///
    /// Batches keep their average draw time across resets unless the number of nodes
    /// of `bvh` changed since the previous reset.
    pub fn reset(&mut self, bvh: &Bvh, camera: &Camera, frustum: &Frustum, draw_mode: DrawMode) {
        if self.batches.len() != bvh.nodes().len() {
            self.batches.clear();
            self.batches
                .extend((0..bvh.nodes().len() as u32).map(|node| BvhBatch {
                    node,
                    ..BvhBatch::default()
                }));
        }

        self.heap.clear();
        self.eye = camera.position();
        self.frustum = Some(*frustum);
        self.transparent_pending = false;

        if draw_mode == DrawMode::Hidden || bvh.nodes().is_empty() {
            return;
        }

        self.push_node(bvh, Bvh::OPAQUE_ROOT);
        self.transparent_pending = true;
    }

    /// The next batch, or `None` once every visible node was served.
    pub fn next_batch(&mut self, bvh: &Bvh) -> Option<BatchId> {
        loop {
            let Some(entry) = self.heap.pop() else {
                if core::mem::take(&mut self.transparent_pending) {
                    self.push_node(bvh, Bvh::TRANSPARENT_ROOT);
                    continue;
                }
                return None;
            };

            let node = bvh.node(entry.id);
            if let Some([left, right]) = node.children() {
                self.push_node(bvh, left);
                self.push_node(bvh, right);
            }

            if node.primitive_count() > 0 {
                self.batches[entry.id as usize].importance = entry.importance.0;
                return Some(entry.id);
            }
        }
    }

    /// The batch with the given id.
    #[inline]
    pub fn batch(&self, id: BatchId) -> &BvhBatch {
        &self.batches[id as usize]
    }

    /// The batch with the given id.
    #[inline]
    pub fn batch_mut(&mut self, id: BatchId) -> &mut BvhBatch {
        &mut self.batches[id as usize]
    }

    fn push_node(&mut self, bvh: &Bvh, id: u32) {
        let aabb = bvh.node(id).aabb();

        if aabb.is_empty() {
            return;
        }

        if let Some(frustum) = &self.frustum {
            if !frustum.overlaps_aabb(&aabb) {
                return;
            }
        }

        self.heap.push(NodeEntry {
            importance: OrderedFloat(screen_importance(&aabb, &self.eye)),
            id,
        });
    }
}

use super::{BatchId, Camera, DrawMode, RenderBatch};
use crate::bounding_volume::Aabb;
use crate::math::{Point, Real, Vector};
use crate::query::{Frustum, Ray};
use downcast_rs::{impl_downcast, DowncastSync};

/// Identifies a model registered to a [`RenderScene`](super::RenderScene).
pub type ModelId = u32;

/// The outcome of a model’s paging step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PagingStatus {
    /// Nothing needed to be paged.
    Idle,
    /// Geometry was paged in or out successfully.
    Success,
    /// Paging could not complete. The scene should be rendered again.
    Failed,
}

/// The closest intersection between a ray and a model.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayHit {
    /// The model that was hit.
    pub model_id: ModelId,
    /// The fragment that was hit.
    pub fragment: u32,
    /// The database id of the fragment that was hit.
    pub db_id: u32,
    /// The distance along the ray, in units of the ray direction length.
    pub distance: Real,
    /// The hit point.
    pub point: Point<Real>,
}

/// A part hierarchy over the fragments of a model.
pub trait InstanceTree {
    /// The id of the root node.
    fn root_id(&self) -> u32;

    /// The number of levels of the hierarchy, the root level included.
    fn max_depth(&self) -> u32;

    /// The bounding box of the node `node` and all its descendants.
    fn node_aabb(&self, node: u32) -> Aabb;

    /// Calls `f` on every direct child of `node`.
    fn for_each_child(&self, node: u32, f: &mut dyn FnMut(u32));

    /// Calls `f` on every fragment attached directly to `node`.
    fn for_each_fragment(&self, node: u32, f: &mut dyn FnMut(u32));
}

/// Per-fragment access needed to explode a model.
pub trait FragmentList {
    /// The number of fragments.
    fn fragment_count(&self) -> usize;

    /// The world-space box of the fragment `fragment`, ignoring its animation offset.
    fn fragment_aabb(&self, fragment: u32) -> Aabb;

    /// Replaces the animation offset of the fragment `fragment`.
    fn set_anim_offset(&mut self, fragment: u32, offset: Vector<Real>);
}

/// What a model exposes to [`explode`](super::explode).
pub struct ExplodeTargets<'a> {
    /// The part hierarchy, if the model has one.
    pub tree: Option<&'a dyn InstanceTree>,
    /// The fragments to move.
    pub fragments: &'a mut dyn FragmentList,
}

/// A model driven by a [`RenderScene`](super::RenderScene).
///
/// Each model owns exactly one batch iterator. The scheduler resets it once per traversal
/// and then pulls batches one at a time, so at most one batch per model is pending.
pub trait RenderModel: DowncastSync {
    /// The unique id of this model.
    fn model_id(&self) -> ModelId;

    /// Is this a 2-D model (a sheet)? 2-D models are ignored by ray intersection.
    fn is_2d(&self) -> bool {
        false
    }

    /// Restarts this model’s batch iterator for a new traversal.
    fn reset_iterator(
        &mut self,
        camera: &Camera,
        frustum: &Frustum,
        draw_mode: DrawMode,
        moved: bool,
    );

    /// The next batch of the current traversal, or `None` once it is exhausted.
    fn next_batch(&mut self) -> Option<BatchId>;

    /// The batch with the given id.
    fn batch(&self, id: BatchId) -> &dyn RenderBatch;

    /// The batch with the given id.
    fn batch_mut(&mut self, id: BatchId) -> &mut dyn RenderBatch;

    /// Pages geometry in or out after a `render_some` step.
    fn frame_update_paging(&mut self, _is_begin_frame: bool) -> PagingStatus {
        PagingStatus::Idle
    }

    /// The bounds of everything this model displays.
    fn visible_bounds(&self, include_ghosted: bool) -> Aabb;

    /// The closest hit between `ray` and this model.
    ///
    /// If `db_ids` is given, only fragments with one of these database ids are tested.
    fn ray_intersect(
        &self,
        ray: &Ray,
        ignore_transparent: bool,
        db_ids: Option<&[u32]>,
    ) -> Option<RayHit>;

    /// Advances this model’s animations to `timestamp`.
    ///
    /// Returns `true` if the model must be redrawn.
    fn update(&mut self, _timestamp: f64) -> bool {
        false
    }

    /// The fragments (and part hierarchy) moved by [`explode`](super::explode).
    fn explode_targets(&mut self) -> Option<ExplodeTargets<'_>> {
        None
    }
}

impl_downcast!(sync RenderModel);

use super::{
    BatchId, BvhIterator, Camera, DrawMode, ExplodeTargets, FragmentList, InstanceTree, ModelId,
    RayHit, RenderBatch, RenderModel, SimpleInstanceTree,
};
use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::math::{Real, Translation, Vector};
use crate::partitioning::{Bvh, BvhBuildOptions, BvhWorkspace, PrimitiveSet};
use crate::query::{Frustum, Ray, RayCast};

/// The placed geometry instances of a model.
///
/// Each fragment has a world-space box, a database id, a polygon count, a transparency flag,
/// a ghosting flag and an animation offset (set by [`explode`](super::explode)).
#[derive(Clone, Debug, Default)]
pub struct Fragments {
    aabbs: Vec<Aabb>,
    db_ids: Vec<u32>,
    polygon_counts: Vec<u32>,
    transparent: Vec<bool>,
    ghosted: Vec<bool>,
    anim_offsets: Vec<Vector<Real>>,
}

impl Fragments {
    /// An empty fragment list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a fragment and returns its index.
    pub fn push(&mut self, aabb: Aabb, db_id: u32, polygon_count: u32, transparent: bool) -> u32 {
        let id = self.aabbs.len() as u32;
        self.aabbs.push(aabb);
        self.db_ids.push(db_id);
        self.polygon_counts.push(polygon_count);
        self.transparent.push(transparent);
        self.ghosted.push(false);
        self.anim_offsets.push(Vector::zeros());
        id
    }

    /// The number of fragments.
    #[inline]
    pub fn len(&self) -> usize {
        self.aabbs.len()
    }

    /// Is this list empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.aabbs.is_empty()
    }

    /// The world-space boxes of all the fragments, ignoring animation offsets.
    #[inline]
    pub fn aabbs(&self) -> &[Aabb] {
        &self.aabbs
    }

    /// The box of `fragment` moved by its animation offset.
    #[inline]
    pub fn animated_aabb(&self, fragment: u32) -> Aabb {
        self.aabbs[fragment as usize].translated(&self.anim_offsets[fragment as usize])
    }

    /// The database id of `fragment`.
    #[inline]
    pub fn db_id(&self, fragment: u32) -> u32 {
        self.db_ids[fragment as usize]
    }

    /// Is `fragment` transparent?
    #[inline]
    pub fn is_transparent(&self, fragment: u32) -> bool {
        self.transparent[fragment as usize]
    }

    /// Is `fragment` ghosted?
    #[inline]
    pub fn is_ghosted(&self, fragment: u32) -> bool {
        self.ghosted[fragment as usize]
    }

    /// Marks `fragment` as ghosted (drawn faded and excluded from the visible bounds).
    pub fn set_ghosted(&mut self, fragment: u32, ghosted: bool) {
        self.ghosted[fragment as usize] = ghosted;
    }

    /// The animation offset of `fragment`.
    #[inline]
    pub fn anim_offset(&self, fragment: u32) -> Vector<Real> {
        self.anim_offsets[fragment as usize]
    }

    /// Does any fragment have a non-zero animation offset?
    pub fn is_animated(&self) -> bool {
        self.anim_offsets.iter().any(|offset| *offset != Vector::zeros())
    }

    fn translate(&mut self, shift: &Vector<Real>) {
        for aabb in &mut self.aabbs {
            *aabb = aabb.translated(shift);
        }
    }
}

impl FragmentList for Fragments {
    fn fragment_count(&self) -> usize {
        self.len()
    }

    fn fragment_aabb(&self, fragment: u32) -> Aabb {
        self.aabbs[fragment as usize]
    }

    fn set_anim_offset(&mut self, fragment: u32, offset: Vector<Real>) {
        self.anim_offsets[fragment as usize] = offset;
    }
}

/// A [`RenderModel`] whose batches are the nodes of a [`Bvh`] over its fragments.
#[derive(Clone, Debug)]
pub struct BvhModel {
    id: ModelId,
    is_2d: bool,
    fragments: Fragments,
    tree: Option<SimpleInstanceTree>,
    bvh: Bvh,
    workspace: BvhWorkspace,
    options: BvhBuildOptions,
    iterator: BvhIterator,
}

impl BvhModel {
    /// Builds the BVH of `fragments` and wraps them into a model.
    pub fn new(id: ModelId, fragments: Fragments, options: BvhBuildOptions) -> Self {
        let mut result = Self {
            id,
            is_2d: false,
            fragments,
            tree: None,
            bvh: Bvh::new(),
            workspace: BvhWorkspace::default(),
            options,
            iterator: BvhIterator::new(),
        };
        result.rebuild();
        result
    }

    /// Attaches a part hierarchy, used by [`explode`](super::explode).
    pub fn with_instance_tree(mut self, mut tree: SimpleInstanceTree) -> Self {
        tree.update_aabbs(&self.fragments);
        self.tree = Some(tree);
        self
    }

    /// Flags this model as a 2-D sheet.
    pub fn with_2d(mut self, is_2d: bool) -> Self {
        self.is_2d = is_2d;
        self
    }

    /// The fragments of this model.
    #[inline]
    pub fn fragments(&self) -> &Fragments {
        &self.fragments
    }

    /// Marks `fragment` as ghosted (drawn faded and excluded from the visible bounds).
    pub fn set_ghosted(&mut self, fragment: u32, ghosted: bool) {
        self.fragments.set_ghosted(fragment, ghosted);
    }

    /// The BVH over the fragments of this model.
    #[inline]
    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    /// The fragments drawn by the batch `id`.
    #[inline]
    pub fn batch_fragments(&self, id: BatchId) -> &[u32] {
        self.bvh.primitives_of(id)
    }

    /// Moves every fragment by `placement` and rebuilds the BVH.
    ///
    /// The BVH buffers are reused, so this doesn’t allocate.
    pub fn set_placement(&mut self, placement: &Translation<Real>) {
        self.fragments.translate(&placement.vector);
        if let Some(tree) = &mut self.tree {
            tree.update_aabbs(&self.fragments);
        }
        self.rebuild();
    }

    fn rebuild(&mut self) {
        let primitives = PrimitiveSet::new(&self.fragments.aabbs)
            .with_polygon_counts(&self.fragments.polygon_counts)
            .with_transparency(&self.fragments.transparent);
        self.bvh
            .rebuild(&mut self.workspace, &primitives, &self.options);
    }

    fn make_hit(&self, ray: &Ray, fragment: u32, distance: Real) -> RayHit {
        RayHit {
            model_id: self.id,
            fragment,
            db_id: self.fragments.db_id(fragment),
            distance,
            point: ray.point_at(distance),
        }
    }
}

impl RenderModel for BvhModel {
    fn model_id(&self) -> ModelId {
        self.id
    }

    fn is_2d(&self) -> bool {
        self.is_2d
    }

    fn reset_iterator(
        &mut self,
        camera: &Camera,
        frustum: &Frustum,
        draw_mode: DrawMode,
        _moved: bool,
    ) {
        self.iterator.reset(&self.bvh, camera, frustum, draw_mode);
    }

    fn next_batch(&mut self) -> Option<BatchId> {
        self.iterator.next_batch(&self.bvh)
    }

    fn batch(&self, id: BatchId) -> &dyn RenderBatch {
        self.iterator.batch(id)
    }

    fn batch_mut(&mut self, id: BatchId) -> &mut dyn RenderBatch {
        self.iterator.batch_mut(id)
    }

    fn visible_bounds(&self, include_ghosted: bool) -> Aabb {
        (0..self.fragments.len() as u32)
            .filter(|fragment| include_ghosted || !self.fragments.is_ghosted(*fragment))
            .fold(Aabb::new_invalid(), |acc, fragment| {
                acc.merged(&self.fragments.animated_aabb(fragment))
            })
    }

    fn ray_intersect(
        &self,
        ray: &Ray,
        ignore_transparent: bool,
        db_ids: Option<&[u32]>,
    ) -> Option<RayHit> {
        let accept = |fragment: u32| {
            !(ignore_transparent && self.fragments.is_transparent(fragment))
                && db_ids.map_or(true, |ids| ids.contains(&self.fragments.db_id(fragment)))
        };
        let cast = |fragment: u32, max_toi: Real| {
            self.fragments
                .animated_aabb(fragment)
                .cast_local_ray(ray, max_toi, true)
        };

        // Animation offsets move fragments out of their BVH nodes.
        if self.fragments.is_animated() {
            let mut best: Option<(u32, Real)> = None;
            for fragment in (0..self.fragments.len() as u32).filter(|f| accept(*f)) {
                let max_toi = best.map_or(Real::MAX, |(_, toi)| toi);
                if let Some(toi) = cast(fragment, max_toi) {
                    if toi < max_toi {
                        best = Some((fragment, toi));
                    }
                }
            }
            return best.map(|(fragment, toi)| self.make_hit(ray, fragment, toi));
        }

        self.bvh
            .cast_ray(ray, Real::MAX, accept, cast)
            .map(|(fragment, toi)| self.make_hit(ray, fragment, toi))
    }

    fn update(&mut self, _timestamp: f64) -> bool {
        self.fragments.is_animated()
    }

    fn explode_targets(&mut self) -> Option<ExplodeTargets<'_>> {
        Some(ExplodeTargets {
            tree: self.tree.as_ref().map(|tree| tree as &dyn InstanceTree),
            fragments: &mut self.fragments,
        })
    }
}

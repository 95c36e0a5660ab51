use super::{Bvh, BvhNode, TraversalAction};
use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::math::Real;
use crate::query::{Frustum, Ray, RayCast};

impl BvhNode {
    /// Casts a ray on this node’s AABB.
    ///
    /// Returns `Real::MAX` if there is no hit within `max_time_of_impact`.
    #[inline]
    pub fn cast_ray(&self, ray: &Ray, max_time_of_impact: Real) -> Real {
        self.aabb()
            .cast_local_ray(ray, max_time_of_impact, true)
            .unwrap_or(Real::MAX)
    }
}

impl Bvh {
    /// Iterates through the primitives of every node with an AABB intersecting `aabb`.
    ///
    /// Both subtrees are visited, opaque primitives first.
    pub fn intersect_aabb(&self, aabb: &Aabb, mut callback: impl FnMut(u32)) {
        for root in [Self::OPAQUE_ROOT, Self::TRANSPARENT_ROOT] {
            self.traverse(root, |id, node| {
                if !node.aabb().intersects(aabb) {
                    return TraversalAction::Prune;
                }

                for &prim in self.primitives_of(id) {
                    callback(prim);
                }

                TraversalAction::Continue
            });
        }
    }

    /// Iterates through the primitives of every node overlapping the given view frustum.
    pub fn intersect_frustum(&self, frustum: &Frustum, mut callback: impl FnMut(u32)) {
        for root in [Self::OPAQUE_ROOT, Self::TRANSPARENT_ROOT] {
            self.traverse(root, |id, node| {
                if !frustum.overlaps_aabb(&node.aabb()) {
                    return TraversalAction::Prune;
                }

                for &prim in self.primitives_of(id) {
                    callback(prim);
                }

                TraversalAction::Continue
            });
        }
    }

    /// Casts a ray on this BVH using the provided primitive ray-cast function.
    ///
    /// The `primitive_check` delegates the ray-casting task to an external function that
    /// maps a primitive index to an actual geometry to cast the ray on. The `Real` argument
    /// given to that closure is the time of impact of the closest hit found so far (or
    /// `max_time_of_impact` if nothing was hit yet).
    ///
    /// Primitives whose index is rejected by `filter` are skipped, which is how callers ignore
    /// transparent primitives or restrict the query to a subset of ids.
    ///
    /// Returns the closest primitive hit and its time of impact.
    pub fn cast_ray(
        &self,
        ray: &Ray,
        max_time_of_impact: Real,
        filter: impl Fn(u32) -> bool,
        primitive_check: impl Fn(u32, Real) -> Option<Real>,
    ) -> Option<(u32, Real)> {
        let mut best: Option<(u32, Real)> = None;
        let mut best_toi = max_time_of_impact;

        for root in [Self::OPAQUE_ROOT, Self::TRANSPARENT_ROOT] {
            self.traverse(root, |id, node| {
                // Nodes entered at or beyond the best hit can't contain a closer one.
                if node.cast_ray(ray, best_toi) >= best_toi {
                    return TraversalAction::Prune;
                }

                for &prim in self.primitives_of(id) {
                    if !filter(prim) {
                        continue;
                    }

                    if let Some(toi) = primitive_check(prim, best_toi) {
                        if toi < best_toi {
                            best_toi = toi;
                            best = Some((prim, toi));
                        }
                    }
                }

                TraversalAction::Continue
            });
        }

        best
    }
}

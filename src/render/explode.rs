use super::ExplodeTargets;
use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::math::{Point, Real, Vector};
use smallvec::SmallVec;

/// Pushes every fragment away from the center of its parent part, scaled by `scale`.
///
/// `scale` is clamped to `[0, 1]`. A scale of zero resets every animation offset to zero.
/// Fragments attached to no part of the hierarchy are not moved.
///
/// With a part hierarchy, offsets accumulate from the root down to a cutoff depth that
/// grows with `scale`. The contribution of the cutoff level is weighted by the fractional
/// part of the scaled depth so the motion stays continuous as `scale` crosses a level.
/// Without a hierarchy, each fragment moves away from the center of the whole model.
pub fn explode(targets: ExplodeTargets, scale: Real) {
    let scale = scale.clamp(0.0, 1.0);
    let fragments = targets.fragments;

    // Fragments outside the part hierarchy stay in place.
    for fragment in 0..fragments.fragment_count() as u32 {
        fragments.set_anim_offset(fragment, Vector::zeros());
    }

    if scale == 0.0 {
        return;
    }

    let Some(tree) = targets.tree else {
        let model_center = (0..fragments.fragment_count() as u32)
            .fold(Aabb::new_invalid(), |acc, fragment| {
                acc.merged(&fragments.fragment_aabb(fragment))
            })
            .center();

        for fragment in 0..fragments.fragment_count() as u32 {
            let aabb = fragments.fragment_aabb(fragment);
            let offset = if aabb.is_empty() {
                Vector::zeros()
            } else {
                (aabb.center() - model_center) * scale
            };
            fragments.set_anim_offset(fragment, offset);
        }
        return;
    };

    let scaled_depth = scale * (tree.max_depth().max(1) - 1) as Real + 1.0;
    let cutoff = scaled_depth.floor() as u32;
    let cutoff_fraction = scaled_depth - cutoff as Real;

    let root = tree.root_id();
    let root_center = center_or(&tree.node_aabb(root), Point::origin());
    let mut stack: SmallVec<[(u32, u32, Point<Real>, Vector<Real>); 32]> = SmallVec::new();
    stack.push((root, 0, root_center, Vector::zeros()));

    while let Some((node, depth, parent_center, mut offset)) = stack.pop() {
        // Parts without geometry don't move relative to their parent.
        let center = center_or(&tree.node_aabb(node), parent_center);

        if depth > 0 && depth <= cutoff {
            let mut level_scale = scale * 2.0;
            if depth == cutoff {
                level_scale *= cutoff_fraction;
            }
            offset += (center - parent_center) * level_scale;
        }

        tree.for_each_fragment(node, &mut |fragment| {
            fragments.set_anim_offset(fragment, offset)
        });
        tree.for_each_child(node, &mut |child| {
            stack.push((child, depth + 1, center, offset))
        });
    }
}

#[inline]
fn center_or(aabb: &Aabb, fallback: Point<Real>) -> Point<Real> {
    if aabb.is_empty() {
        fallback
    } else {
        aabb.center()
    }
}

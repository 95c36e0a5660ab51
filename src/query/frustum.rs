//! View frustum extracted from a view-projection matrix.

use crate::bounding_volume::Aabb;
use crate::math::{Matrix4, Point, Real, Vector, DIM};
use na::Vector4;

/// A plane of a [`Frustum`], stored as `normal · p + offset = 0`.
///
/// Points with a positive signed distance lie inside the frustum.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct FrustumPlane {
    /// The unit normal of the plane, pointing toward the inside of the frustum.
    pub normal: Vector<Real>,
    /// The plane offset.
    pub offset: Real,
}

impl FrustumPlane {
    fn from_row_combination(coeffs: Vector4<Real>) -> Self {
        let normal = Vector::new(coeffs.x, coeffs.y, coeffs.z);
        let norm = normal.norm();

        if norm > Real::EPSILON {
            Self {
                normal: normal / norm,
                offset: coeffs.w / norm,
            }
        } else {
            // Degenerate projection. Keep a plane that rejects nothing.
            Self {
                normal: Vector::zeros(),
                offset: 1.0,
            }
        }
    }

    /// The signed distance between `point` and this plane.
    #[inline]
    pub fn signed_distance(&self, point: &Point<Real>) -> Real {
        self.normal.dot(&point.coords) + self.offset
    }
}

/// The result of classifying an AABB against a [`Frustum`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrustumIntersection {
    /// The AABB is completely outside of the frustum.
    Outside,
    /// The AABB straddles at least one frustum plane.
    Intersects,
    /// The AABB is completely inside of the frustum.
    Contains,
}

/// A view frustum made of six inward-facing planes (left, right, bottom, top, near, far).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Frustum {
    /// The six planes of this frustum.
    pub planes: [FrustumPlane; 6],
}

impl Frustum {
    /// Extracts the frustum planes of a view-projection matrix mapping world space to clip
    /// space with `-w ≤ x, y, z ≤ w`.
    pub fn from_view_projection(view_proj: &Matrix4<Real>) -> Self {
        let row = |i: usize| {
            Vector4::new(
                view_proj[(i, 0)],
                view_proj[(i, 1)],
                view_proj[(i, 2)],
                view_proj[(i, 3)],
            )
        };
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        Self {
            planes: [
                FrustumPlane::from_row_combination(r3 + r0),
                FrustumPlane::from_row_combination(r3 - r0),
                FrustumPlane::from_row_combination(r3 + r1),
                FrustumPlane::from_row_combination(r3 - r1),
                FrustumPlane::from_row_combination(r3 + r2),
                FrustumPlane::from_row_combination(r3 - r2),
            ],
        }
    }

    /// Classifies `aabb` against this frustum.
    ///
    /// The test is conservative: boxes near a frustum corner may be reported as
    /// [`FrustumIntersection::Intersects`] even though they are outside.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> FrustumIntersection {
        if aabb.is_empty() {
            return FrustumIntersection::Outside;
        }

        let mut result = FrustumIntersection::Contains;

        for plane in &self.planes {
            let mut farthest = aabb.mins;
            let mut nearest = aabb.maxs;

            for i in 0..DIM {
                if plane.normal[i] >= 0.0 {
                    farthest[i] = aabb.maxs[i];
                    nearest[i] = aabb.mins[i];
                }
            }

            if plane.signed_distance(&farthest) < 0.0 {
                return FrustumIntersection::Outside;
            }

            if plane.signed_distance(&nearest) < 0.0 {
                result = FrustumIntersection::Intersects;
            }
        }

        result
    }

    /// Does `aabb` overlap this frustum at least partially?
    #[inline]
    pub fn overlaps_aabb(&self, aabb: &Aabb) -> bool {
        self.intersects_aabb(aabb) != FrustumIntersection::Outside
    }
}

#[cfg(test)]
mod test {
    use super::{Frustum, FrustumIntersection};
    use crate::bounding_volume::Aabb;
    use crate::math::{Isometry, Point, Real, Vector};
    use na::Perspective3;

    fn looking_down_negative_z() -> Frustum {
        let view = Isometry::look_at_rh(&Point::origin(), &Point::new(0.0, 0.0, -1.0), &Vector::y());
        let proj = Perspective3::new(1.0, core::f64::consts::FRAC_PI_2 as Real, 0.1, 100.0);
        Frustum::from_view_projection(&(proj.as_matrix() * view.to_homogeneous()))
    }

    #[test]
    fn box_in_front_is_contained() {
        let frustum = looking_down_negative_z();
        let aabb = Aabb::from_array([-1.0, -1.0, -11.0, 1.0, 1.0, -9.0]);
        assert_eq!(frustum.intersects_aabb(&aabb), FrustumIntersection::Contains);
    }

    #[test]
    fn box_behind_is_outside() {
        let frustum = looking_down_negative_z();
        let aabb = Aabb::from_array([-1.0, -1.0, 9.0, 1.0, 1.0, 11.0]);
        assert_eq!(frustum.intersects_aabb(&aabb), FrustumIntersection::Outside);
        assert!(!frustum.overlaps_aabb(&Aabb::new_invalid()));
    }

    #[test]
    fn box_straddling_near_plane_intersects() {
        let frustum = looking_down_negative_z();
        let aabb = Aabb::from_array([-1.0, -1.0, -1.0, 1.0, 1.0, 1.0]);
        assert_eq!(
            frustum.intersects_aabb(&aabb),
            FrustumIntersection::Intersects
        );
    }
}

//! Axis Aligned Bounding Box.

use crate::bounding_volume::BoundingVolume;
use crate::math::{Point, Real, Vector, DIM};
use approx::{AbsDiffEq, RelativeEq};
use na;

/// An Axis-Aligned Bounding Box (AABB).
///
/// An AABB is defined by its minimum and maximum corners. Every primitive handed to the
/// BVH builder, every BVH node and every model's visible bounds are expressed as an `Aabb`.
///
/// # Empty boxes
///
/// The empty box (see [`Aabb::new_invalid`]) has `mins = (+inf, +inf, +inf)` and
/// `maxs = (-inf, -inf, -inf)`. Merging anything into it yields that thing, which makes it
/// the natural starting value for accumulations. Once non-empty, `mins ≤ maxs` holds
/// componentwise.
///
/// # Example
///
/// ```rust
/// # #[cfg(feature = "f32")] {
/// use vista3d::bounding_volume::{Aabb, BoundingVolume};
/// use nalgebra::Point3;
///
/// let mut aabb = Aabb::new_invalid();
/// assert!(aabb.is_empty());
///
/// aabb.merge(&Aabb::new(Point3::new(1.0, 2.0, 3.0), Point3::new(2.0, 3.0, 4.0)));
/// assert_eq!(aabb.center(), Point3::new(1.5, 2.5, 3.5));
/// assert_eq!(aabb.surface_area(), 6.0);
/// # }
/// ```
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Copy, Clone)]
#[repr(C)]
pub struct Aabb {
    /// The point with minimum coordinates.
    pub mins: Point<Real>,
    /// The point with maximum coordinates.
    pub maxs: Point<Real>,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::new_invalid()
    }
}

impl Aabb {
    /// Creates a new AABB.
    ///
    /// # Arguments:
    ///   * `mins` - position of the point with the smallest coordinates.
    ///   * `maxs` - position of the point with the highest coordinates. Each component of `mins`
    ///     must be smaller than the related components of `maxs`.
    #[inline]
    pub fn new(mins: Point<Real>, maxs: Point<Real>) -> Aabb {
        Aabb { mins, maxs }
    }

    /// Creates the empty AABB, with `mins` at `+inf` and `maxs` at `-inf`.
    #[inline]
    pub fn new_invalid() -> Self {
        Self::new(
            Vector::repeat(Real::INFINITY).into(),
            Vector::repeat(-Real::INFINITY).into(),
        )
    }

    /// Creates an AABB from the six packed floats `[minx, miny, minz, maxx, maxy, maxz]`.
    #[inline]
    pub fn from_array(packed: [Real; 6]) -> Self {
        Self::new(
            Point::new(packed[0], packed[1], packed[2]),
            Point::new(packed[3], packed[4], packed[5]),
        )
    }

    /// This AABB as six packed floats `[minx, miny, minz, maxx, maxy, maxz]`.
    #[inline]
    pub fn to_array(&self) -> [Real; 6] {
        [
            self.mins.x,
            self.mins.y,
            self.mins.z,
            self.maxs.x,
            self.maxs.y,
            self.maxs.z,
        ]
    }

    /// Creates a new AABB from its center and its half-extents.
    #[inline]
    pub fn from_half_extents(center: Point<Real>, half_extents: Vector<Real>) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Creates a new AABB that tightly encloses a set of points.
    ///
    /// Returns the empty AABB if `pts` yields nothing.
    pub fn from_points<I>(pts: I) -> Self
    where
        I: IntoIterator<Item = Point<Real>>,
    {
        let mut result = Self::new_invalid();
        for pt in pts {
            result.take_point(pt);
        }
        result
    }

    /// Does this AABB contain nothing at all?
    ///
    /// A degenerate AABB reduced to a single point is not empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        (0..DIM).any(|i| self.mins[i] > self.maxs[i])
    }

    /// The center of this AABB.
    #[inline]
    pub fn center(&self) -> Point<Real> {
        na::center(&self.mins, &self.maxs)
    }

    /// The half extents of this AABB.
    #[inline]
    pub fn half_extents(&self) -> Vector<Real> {
        (self.maxs - self.mins) * 0.5
    }

    /// The extents of this AABB.
    #[inline]
    pub fn extents(&self) -> Vector<Real> {
        self.maxs - self.mins
    }

    /// The axis along which this AABB is the widest.
    ///
    /// Ties are resolved toward the smallest axis index.
    #[inline]
    pub fn largest_axis(&self) -> usize {
        self.extents().imax()
    }

    /// The largest of the three extents of this AABB, or zero if it is empty.
    #[inline]
    pub fn largest_extent(&self) -> Real {
        if self.is_empty() {
            0.0
        } else {
            self.extents().max()
        }
    }

    /// The surface area of this AABB, or zero if it is empty.
    #[inline]
    pub fn surface_area(&self) -> Real {
        if self.is_empty() {
            return 0.0;
        }

        let e = self.extents();
        2.0 * (e.x * e.y + e.y * e.z + e.z * e.x)
    }

    /// The volume of this AABB, or zero if it is empty.
    #[inline]
    pub fn volume(&self) -> Real {
        if self.is_empty() {
            return 0.0;
        }

        let e = self.extents();
        e.x * e.y * e.z
    }

    /// Enlarges this AABB so it also encloses `pt`.
    #[inline]
    pub fn take_point(&mut self, pt: Point<Real>) {
        self.mins = self.mins.inf(&pt);
        self.maxs = self.maxs.sup(&pt);
    }

    /// Does this AABB contain the given point?
    #[inline]
    pub fn contains_local_point(&self, point: &Point<Real>) -> bool {
        (0..DIM).all(|i| point[i] >= self.mins[i] && point[i] <= self.maxs[i])
    }

    /// This AABB moved by `shift`.
    ///
    /// The empty AABB stays empty.
    #[inline]
    pub fn translated(&self, shift: &Vector<Real>) -> Self {
        if self.is_empty() {
            return *self;
        }

        Self::new(self.mins + shift, self.maxs + shift)
    }
}

impl BoundingVolume for Aabb {
    #[inline]
    fn center(&self) -> Point<Real> {
        self.center()
    }

    #[inline]
    fn intersects(&self, other: &Aabb) -> bool {
        na::partial_le(&self.mins, &other.maxs) && na::partial_ge(&self.maxs, &other.mins)
    }

    #[inline]
    fn contains(&self, other: &Aabb) -> bool {
        other.is_empty()
            || (na::partial_le(&self.mins, &other.mins) && na::partial_ge(&self.maxs, &other.maxs))
    }

    #[inline]
    fn merge(&mut self, other: &Aabb) {
        self.mins = self.mins.inf(&other.mins);
        self.maxs = self.maxs.sup(&other.maxs);
    }

    #[inline]
    fn merged(&self, other: &Aabb) -> Aabb {
        Aabb {
            mins: self.mins.inf(&other.mins),
            maxs: self.maxs.sup(&other.maxs),
        }
    }
}

impl AbsDiffEq for Aabb {
    type Epsilon = Real;
    fn default_epsilon() -> Self::Epsilon {
        Real::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.mins.abs_diff_eq(&other.mins, epsilon) && self.maxs.abs_diff_eq(&other.maxs, epsilon)
    }
}

impl RelativeEq for Aabb {
    fn default_max_relative() -> Self::Epsilon {
        Real::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.mins.relative_eq(&other.mins, epsilon, max_relative)
            && self.maxs.relative_eq(&other.maxs, epsilon, max_relative)
    }
}

#[cfg(test)]
mod test {
    use super::Aabb;
    use crate::bounding_volume::BoundingVolume;
    use crate::math::{Point, Vector};

    #[test]
    fn empty_aabb_is_merge_identity() {
        let unit = Aabb::from_array([0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        let empty = Aabb::new_invalid();

        assert!(empty.is_empty());
        assert_eq!(empty.merged(&unit), unit);
        assert_eq!(unit.merged(&empty), unit);
        assert_eq!(empty.surface_area(), 0.0);
        assert_eq!(empty.largest_extent(), 0.0);
    }

    #[test]
    fn point_aabb_is_not_empty() {
        let aabb = Aabb::from_points([Point::new(1.0, 2.0, 3.0)]);
        assert!(!aabb.is_empty());
        assert_eq!(aabb.surface_area(), 0.0);
        assert!(aabb.contains_local_point(&Point::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn surface_area_and_axis() {
        let aabb = Aabb::from_array([0.0, 0.0, 0.0, 4.0, 2.0, 1.0]);
        assert_relative_eq!(aabb.surface_area(), 2.0 * (8.0 + 2.0 + 4.0));
        assert_eq!(aabb.largest_axis(), 0);
        assert_eq!(aabb.largest_extent(), 4.0);
        assert_eq!(aabb.to_array(), [0.0, 0.0, 0.0, 4.0, 2.0, 1.0]);
    }

    #[test]
    fn containment_ignores_empty_boxes() {
        let aabb = Aabb::from_half_extents(Point::origin(), Vector::repeat(1.0));
        assert!(aabb.contains(&Aabb::new_invalid()));
        assert!(aabb.contains(&aabb));
        assert!(!aabb.contains(&aabb.translated(&Vector::x())));
        assert!(aabb.intersects(&aabb.translated(&Vector::x())));
    }

    #[test]
    fn approximate_comparison() {
        let aabb = Aabb::from_array([0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        let shifted = aabb.translated(&Vector::repeat(1.0e-7));
        assert_relative_eq!(aabb, shifted, epsilon = 1.0e-5);
        assert_relative_ne!(aabb, aabb.translated(&Vector::x()));
    }
}

use crate::bounding_volume::Aabb;
use crate::math::{Point, Real};

/// The primitives a [`Bvh`](super::Bvh) is built over.
///
/// Each primitive is identified by its index in `boxes`. Polygon counts and transparency
/// flags are optional: without polygon counts the polygon-per-node limit is ignored, and
/// without transparency flags every primitive is opaque.
#[derive(Copy, Clone, Debug)]
pub struct PrimitiveSet<'a> {
    boxes: &'a [Aabb],
    polygon_counts: Option<&'a [u32]>,
    transparent: Option<&'a [bool]>,
}

impl<'a> PrimitiveSet<'a> {
    /// A set of opaque primitives with unknown polygon counts.
    pub fn new(boxes: &'a [Aabb]) -> Self {
        debug_assert!(boxes.len() <= u32::MAX as usize);
        Self {
            boxes,
            polygon_counts: None,
            transparent: None,
        }
    }

    /// Attaches one polygon count to each primitive.
    pub fn with_polygon_counts(mut self, polygon_counts: &'a [u32]) -> Self {
        debug_assert_eq!(polygon_counts.len(), self.boxes.len());
        self.polygon_counts = Some(polygon_counts);
        self
    }

    /// Attaches one transparency flag to each primitive.
    ///
    /// See [`transparency_from_materials`] to derive them from per-primitive materials.
    pub fn with_transparency(mut self, transparent: &'a [bool]) -> Self {
        debug_assert_eq!(transparent.len(), self.boxes.len());
        self.transparent = Some(transparent);
        self
    }

    /// The number of primitives.
    #[inline]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Is this set empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// The AABB of the `i`-th primitive.
    #[inline]
    pub fn aabb(&self, i: u32) -> &Aabb {
        &self.boxes[i as usize]
    }

    /// The center of the AABB of the `i`-th primitive.
    #[inline]
    pub fn centroid(&self, i: u32) -> Point<Real> {
        self.boxes[i as usize].center()
    }

    /// Were polygon counts attached to this set?
    #[inline]
    pub fn has_polygon_counts(&self) -> bool {
        self.polygon_counts.is_some()
    }

    /// The polygon count of the `i`-th primitive, zero if unknown.
    #[inline]
    pub fn polygon_count(&self, i: u32) -> u32 {
        self.polygon_counts.map_or(0, |counts| counts[i as usize])
    }

    /// Is the `i`-th primitive transparent?
    #[inline]
    pub fn is_transparent(&self, i: u32) -> bool {
        self.transparent.is_some_and(|flags| flags[i as usize])
    }

    /// Fills `order` with all the primitive indices, opaque primitives first.
    ///
    /// The relative order within each group is preserved, so transparent primitives keep a
    /// deterministic draw order. Returns the position of the first transparent primitive.
    pub(crate) fn stable_partition(&self, order: &mut Vec<u32>) -> usize {
        order.clear();
        order.reserve(self.len());

        let count = self.len() as u32;
        order.extend((0..count).filter(|i| !self.is_transparent(*i)));
        let first_transparent = order.len();
        order.extend((0..count).filter(|i| self.is_transparent(*i)));

        first_transparent
    }
}

/// Derives per-primitive transparency flags from per-primitive material ids.
///
/// `is_transparent_material` maps a material id to whether that material is transparent.
pub fn transparency_from_materials(
    material_ids: &[u32],
    is_transparent_material: impl Fn(u32) -> bool,
) -> Vec<bool> {
    material_ids
        .iter()
        .map(|material| is_transparent_material(*material))
        .collect()
}

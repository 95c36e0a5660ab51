//! Spatial partitioning tools.

pub use self::bvh::{
    transparency_from_materials, Bvh, BvhBuildOptions, BvhNode, BvhNodeFlags, BvhWorkspace,
    PrimitiveSet, TraversalAction,
};

pub mod bvh;

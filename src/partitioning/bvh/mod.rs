//! SAH bounding-volume hierarchy split into an opaque and a transparent subtree.

pub use bvh_binned_build::{BvhBuildOptions, BvhWorkspace};
pub use bvh_primitives::{transparency_from_materials, PrimitiveSet};
pub use bvh_traverse::TraversalAction;
pub use bvh_tree::{Bvh, BvhNode, BvhNodeFlags};

mod bvh_binned_build;
mod bvh_primitives;
mod bvh_queries;
mod bvh_traverse;
mod bvh_tree;
mod bvh_validation;

//! Progressive, time-budgeted rendering of several models.
//!
//! A [`RenderScene`] owns a set of [`RenderModel`]s. Each model walks its own batch
//! iterator (see [`BvhIterator`] for the BVH-driven one) and the scene interleaves them,
//! drawing the most important batch first until the time budget of a call is spent.

pub use self::batch::{BatchId, RenderBatch, FRAME_TIME_SMOOTHING};
pub use self::bvh_iterator::{screen_importance, BvhBatch, BvhIterator};
pub use self::bvh_model::{BvhModel, Fragments};
pub use self::camera::{Camera, DrawMode};
pub use self::clock::{FrameClock, InstantClock};
pub use self::explode::explode;
pub use self::instance_tree::SimpleInstanceTree;
pub use self::model::{
    ExplodeTargets, FragmentList, InstanceTree, ModelId, PagingStatus, RayHit, RenderModel,
};
pub use self::render_scene::{RenderScene, SceneError};

mod batch;
mod bvh_iterator;
mod bvh_model;
mod camera;
mod clock;
mod explode;
mod instance_tree;
mod model;
mod render_scene;

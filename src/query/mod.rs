//! Non-persistent geometric queries.
//!
//! Ray-casting is achieved by importing the [`RayCast`] trait. View-frustum culling relies
//! on [`Frustum`].

pub use self::frustum::{Frustum, FrustumIntersection, FrustumPlane};
pub use self::ray::{Ray, RayCast};

mod frustum;
pub mod ray;

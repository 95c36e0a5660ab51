use crate::math::{Isometry, Matrix4, Point, Real, Vector};
use crate::query::Frustum;
use na::Perspective3;

/// Selects which geometry a traversal produces.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum DrawMode {
    /// Regular rendering.
    #[default]
    Normal,
    /// Nothing is drawn.
    Hidden,
}

/// The viewpoint a traversal is reset against.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Camera {
    position: Point<Real>,
    view_proj: Matrix4<Real>,
}

impl Camera {
    /// A camera at `position` with the given world-to-clip matrix.
    pub fn new(position: Point<Real>, view_proj: Matrix4<Real>) -> Self {
        Self {
            position,
            view_proj,
        }
    }

    /// A right-handed perspective camera at `eye` looking at `target`.
    ///
    /// Returns `None` if `eye` and `target` coincide.
    pub fn look_at(
        eye: Point<Real>,
        target: Point<Real>,
        up: Vector<Real>,
        fovy: Real,
        aspect: Real,
        znear: Real,
        zfar: Real,
    ) -> Option<Self> {
        if (target - eye).norm() <= Real::EPSILON {
            return None;
        }

        let view = Isometry::look_at_rh(&eye, &target, &up);
        let proj = Perspective3::new(aspect, fovy, znear, zfar);
        Some(Self::new(eye, proj.as_matrix() * view.to_homogeneous()))
    }

    /// The eye position.
    #[inline]
    pub fn position(&self) -> Point<Real> {
        self.position
    }

    /// The world-to-clip matrix.
    #[inline]
    pub fn view_proj(&self) -> &Matrix4<Real> {
        &self.view_proj
    }

    /// The view frustum of this camera.
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_proj)
    }
}

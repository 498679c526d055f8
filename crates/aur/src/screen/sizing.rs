use crate::video::CameraIntrinsics;
use glam::Vec3;

/// Edge length of the screen quad's geometry, in its local space.
pub const DEFAULT_QUAD_UNIT: f32 = 100.0;

/// World space size of a screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenSize {
    pub width: f32,
    pub height: f32,
}

impl ScreenSize {
    /// Size of a plane at `distance` from the camera that exactly covers its view frustum.
    ///
    /// The height comes from the camera's aspect ratio rather than its resolution.
    pub fn from_frustum(intrinsics: &CameraIntrinsics, distance: f32) -> Self {
        let width = 2.0 * distance * intrinsics.fov_horizontal.half().to_radians().tan();
        Self {
            width,
            height: width / intrinsics.aspect_ratio,
        }
    }

    /// Local scale that stretches a `quad_unit × quad_unit` quad to this size.
    pub fn local_scale(&self, quad_unit: f32) -> Vec3 {
        Vec3::new(self.width / quad_unit, self.height / quad_unit, 1.0)
    }
}

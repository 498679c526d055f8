use glam::{Quat, Vec3};

/// Placement of an object relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformComponent {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl TransformComponent {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Distance between this object's origin and its parent's origin.
    #[inline]
    pub fn distance_from_parent(&self) -> f32 {
        self.translation.length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_ignores_rotation_and_scale() {
        let transform = TransformComponent {
            translation: Vec3::new(0.0, 30.0, 40.0),
            rotation: Quat::from_rotation_y(1.0),
            scale: Vec3::splat(3.0),
        };
        assert!((transform.distance_from_parent() - 50.0).abs() < 1e-5);
    }
}

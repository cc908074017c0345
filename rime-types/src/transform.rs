use glam::{Mat3, Mat4, Vec3};

/// Translate / rotate / scale, composed as `T · Rx · Ry · Rz · S`.
///
/// Rotation angles are Euler angles in degrees, applied in XYZ order.
/// Both models and standalone meshes carry one of these; which one feeds
/// the `model` uniform is decided by the draw call, never by composing
/// the two.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub translate: Vec3,
    /// Euler rotation in degrees, applied X then Y then Z.
    pub rotate: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translate: Vec3::ZERO,
            rotate: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_translation(translate: Vec3) -> Self {
        Self {
            translate,
            ..Self::default()
        }
    }

    fn rotation_matrix(&self) -> Mat4 {
        Mat4::from_rotation_x(self.rotate.x.to_radians())
            * Mat4::from_rotation_y(self.rotate.y.to_radians())
            * Mat4::from_rotation_z(self.rotate.z.to_radians())
    }

    /// The model matrix for this transform.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translate) * self.rotation_matrix() * Mat4::from_scale(self.scale)
    }

    /// The transpose-inverse of [`Transform::matrix`], for transforming
    /// normals under non-uniform scale.
    pub fn normal_matrix(&self) -> Mat3 {
        Mat3::from_mat4(self.matrix().inverse().transpose())
    }

    /// The facing direction: local +Z rotated by this transform's Euler
    /// rotation. At zero rotation this is `(0, 0, 1)`.
    pub fn forward(&self) -> Vec3 {
        self.rotation_matrix().transform_vector3(Vec3::Z)
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};

    use super::Transform;

    #[test]
    fn matrix_composes_translate_rotate_scale_in_order() {
        let transform = Transform {
            translate: Vec3::new(1.0, 2.0, 3.0),
            rotate: Vec3::new(0.0, 90.0, 0.0),
            scale: Vec3::splat(2.0),
        };

        let expected = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0))
            * Mat4::from_rotation_y(90.0_f32.to_radians())
            * Mat4::from_scale(Vec3::splat(2.0));

        assert_eq!(transform.matrix(), expected);
    }

    #[test]
    fn forward_at_zero_rotation_is_positive_z() {
        assert_eq!(Transform::default().forward(), Vec3::Z);
    }

    #[test]
    fn forward_tracks_yaw() {
        let transform = Transform {
            rotate: Vec3::new(0.0, 90.0, 0.0),
            ..Transform::default()
        };
        let forward = transform.forward();
        // +Z rotated 90° about Y lands on +X.
        assert!((forward - Vec3::X).length() < 1e-6);
    }
}

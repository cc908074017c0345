use glam::{Mat4, Vec3};

/// Pitch is clamped here after every mouse-driven update to avoid the
/// look-at basis degenerating at straight up/down.
pub const PITCH_LIMIT_DEGREES: f32 = 89.0;

/// Where the camera's facing direction comes from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DirectionSource {
    /// Recompute `direction` from `pitch`/`yaw` on every view-matrix build.
    #[default]
    EulerAngles,
    /// Use `direction` exactly as stored. First-person mode sets this: the
    /// direction is derived from the controlled model's rotation, not from
    /// mouse-driven camera angles.
    External,
}

/// How the world is projected into the camera.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Projection {
    Perspective {
        /// Vertical field of view in degrees.
        fovy: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    },
}

impl Default for Projection {
    fn default() -> Self {
        Self::Perspective {
            fovy: 70.0,
            aspect: 1.0,
            near: 0.01,
            far: 100.0,
        }
    }
}

/// View and projection state, used both for the viewer and for the
/// shadow-casting light (which wants `Projection::Orthographic` and a
/// position at the light, aimed at the scene).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Facing direction. Authoritative in `DirectionSource::External`
    /// mode; recomputed from `pitch`/`yaw` otherwise.
    pub direction: Vec3,
    /// Fixed world up.
    pub up: Vec3,
    /// Euler angles in degrees.
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    pub direction_source: DirectionSource,
    pub projection: Projection,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            up: Vec3::Y,
            pitch: 0.0,
            yaw: 0.0,
            roll: 0.0,
            direction_source: DirectionSource::default(),
            projection: Projection::default(),
        }
    }
}

impl Camera {
    /// Recomputes `direction` from the Euler angles when in
    /// `EulerAngles` mode. Zero pitch and yaw looks down -Z.
    pub fn update_direction(&mut self) {
        if self.direction_source == DirectionSource::EulerAngles {
            let (pitch, yaw) = (self.pitch.to_radians(), self.yaw.to_radians());
            self.direction = Vec3::new(
                pitch.cos() * yaw.sin(),
                pitch.sin(),
                -pitch.cos() * yaw.cos(),
            );
        }
    }

    /// The right-handed look-at matrix from position along `direction`.
    pub fn view_matrix(&mut self) -> Mat4 {
        self.update_direction();
        Mat4::look_at_rh(self.position, self.position + self.direction, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Perspective { fovy, aspect, near, far } => {
                Mat4::perspective_rh(fovy.to_radians(), aspect, near, far)
            }
            Projection::Orthographic {
                left,
                right,
                bottom,
                top,
                near,
                far,
            } => Mat4::orthographic_rh(left, right, bottom, top, near, far),
        }
    }

    /// `projection · view` in one call, the matrix a shadow pass publishes
    /// as `shadowVP`.
    pub fn view_projection(&mut self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Integrates a mouse movement delta into yaw/pitch. Pitch is clamped
    /// to ±[`PITCH_LIMIT_DEGREES`] afterwards, always.
    pub fn apply_mouse_delta(&mut self, dx: f32, dy: f32, sensitivity: f32) {
        self.yaw += dx * sensitivity;
        self.pitch += dy * sensitivity;
        self.pitch = self.pitch.clamp(-PITCH_LIMIT_DEGREES, PITCH_LIMIT_DEGREES);
    }

    /// Updates the aspect ratio of a perspective projection; orthographic
    /// projections are unaffected by window resizes.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        if let Projection::Perspective { ref mut aspect, .. } = self.projection {
            *aspect = aspect_ratio;
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3, Vec4};

    use super::{Camera, DirectionSource, Projection};

    #[test]
    fn euler_default_looks_down_negative_z() {
        let mut camera = Camera::default();
        camera.view_matrix();
        assert!((camera.direction - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn external_direction_is_left_untouched() {
        let mut camera = Camera {
            direction_source: DirectionSource::External,
            direction: Vec3::X,
            pitch: 45.0,
            yaw: 45.0,
            ..Camera::default()
        };
        camera.view_matrix();
        assert_eq!(camera.direction, Vec3::X);
    }

    #[test]
    fn pitch_clamps_at_89_degrees() {
        let mut camera = Camera::default();
        // 2400 × 0.05 = 120 degrees of cumulative upward delta.
        for _ in 0..2400 {
            camera.apply_mouse_delta(0.0, 1.0, 0.05);
        }
        assert_eq!(camera.pitch, 89.0);

        for _ in 0..4800 {
            camera.apply_mouse_delta(0.0, -1.0, 0.05);
        }
        assert_eq!(camera.pitch, -89.0);
    }

    #[test]
    fn orthographic_matches_standard_formula() {
        let (l, r, b, t, n, f) = (-25.0_f32, 25.0_f32, -25.0_f32, 25.0_f32, 0.5_f32, 60.0_f32);
        let camera = Camera {
            projection: Projection::Orthographic {
                left: l,
                right: r,
                bottom: b,
                top: t,
                near: n,
                far: f,
            },
            ..Camera::default()
        };

        let rcp_width = 1.0 / (r - l);
        let rcp_height = 1.0 / (t - b);
        let rcp_depth = 1.0 / (n - f);
        let expected = Mat4::from_cols(
            Vec4::new(2.0 * rcp_width, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 2.0 * rcp_height, 0.0, 0.0),
            Vec4::new(0.0, 0.0, rcp_depth, 0.0),
            Vec4::new(
                -(l + r) * rcp_width,
                -(t + b) * rcp_height,
                n * rcp_depth,
                1.0,
            ),
        );

        let proj = camera.projection_matrix();
        assert_eq!(proj, expected);
        // No perspective divide term: w row is (0, 0, 0, 1).
        assert_eq!(proj.row(3), Vec4::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn resize_only_touches_perspective() {
        let mut camera = Camera::default();
        camera.set_aspect_ratio(16.0 / 9.0);
        match camera.projection {
            Projection::Perspective { aspect, .. } => assert_eq!(aspect, 16.0 / 9.0),
            _ => unreachable!(),
        }

        let ortho = Projection::Orthographic {
            left: -1.0,
            right: 1.0,
            bottom: -1.0,
            top: 1.0,
            near: 0.1,
            far: 10.0,
        };
        let mut shadow = Camera {
            projection: ortho,
            ..Camera::default()
        };
        shadow.set_aspect_ratio(2.0);
        assert_eq!(shadow.projection, ortho);
    }
}

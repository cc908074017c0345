use glam::Vec3;

/// The kind of a light source, matching the shader's branching.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum LightKind {
    Sun = 0,
    #[default]
    Point = 1,
    Spot = 2,
    Flash = 3,
}

/// A single scene light. The demo drives one of these; it doubles as the
/// shadow caster (an orthographic [`Camera`] is parked at `position` and
/// aimed at the scene origin).
///
/// [`Camera`]: crate::Camera
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub position: Vec3,
    pub direction: Vec3,
    /// Cosine of the inner spot cone angle, in [0, 1].
    pub inner_cutoff: f32,
    /// Cosine of the outer spot cone angle, in [0, 1].
    pub outer_cutoff: f32,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            kind: LightKind::default(),
            position: Vec3::ZERO,
            direction: Vec3::ZERO,
            inner_cutoff: 1.0,
            outer_cutoff: 1.0,
            ambient: Vec3::splat(0.1),
            diffuse: Vec3::ONE,
            specular: Vec3::ONE,
        }
    }
}

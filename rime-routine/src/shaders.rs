//! WGSL sources implementing the draw contract.
//!
//! All mesh-drawing shaders share the bind group interface defined by
//! `rime::ShaderInterfaces`: group 0 is the frame uniforms and samplers,
//! group 1 the per-object uniforms, group 2 the mesh textures (color
//! slots 0..8 and the shadow map at binding 8). Vertex inputs sit at
//! location 0 (position), 1 (normal), and 8 + N (texture coordinate
//! layer N).

/// Blinn-Phong lit forward shader sampling the shadow map.
pub const DEFAULT: &str = include_str!("shaders/default.wgsl");
/// Unlit marker shader tinting geometry with the light's color.
pub const EMISSIVE: &str = include_str!("shaders/emissive.wgsl");
/// Depth-only vertex shader for the shadow pass.
pub const SHADOW: &str = include_str!("shaders/shadow.wgsl");
/// Fullscreen-triangle cubemap background.
pub const SKYBOX: &str = include_str!("shaders/skybox.wgsl");

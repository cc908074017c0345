//! Render passes for the rime demo renderer.
//!
//! Each frame runs the shadow pass strictly before the forward pass: the
//! forward pass samples the depth texture the shadow pass just wrote.
//! Within the forward pass the order is skybox, opaque geometry, then
//! alpha-blended geometry sorted back to front.
//!
//! The scene driver owns the objects; routines own the pass targets, the
//! per-pass frame uniforms, and (for the skybox) the pipeline. A frame
//! looks like:
//!
//! ```text
//! shadow.ready(..); casters.prepare_draw(.., shadow.shader(), ..);
//! { let mut rpass = shadow.begin(&mut encoder); casters.encode(&mut rpass); }
//! forward.ready(..); scene.prepare_draw(.., &lit_shader, ..);
//! { let mut rpass = forward.begin(&mut encoder, &surface_view);
//!   skybox.encode(&mut rpass); scene.encode(&mut rpass); }
//! ```

mod forward;
mod shadow;
mod skybox;
mod sorting;
mod uniforms;

pub use forward::*;
pub use shadow::*;
pub use skybox::*;
pub use sorting::*;
pub use uniforms::*;

pub mod shaders;

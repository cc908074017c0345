//! Small shadow-mapped scene renderer built on wgpu.
//!
//! The crate owns the GPU resource lifecycle: shader programs, textures,
//! mesh geometry with its per-shader binding cache, and models that group
//! meshes under one transform. Render passes live in `rime-routine`;
//! asset import lives in `rime-gltf`.
//!
//! The central design decision is the per-mesh [`BindingCache`]: pipeline
//! state wiring a mesh's vertex buffer into a shader's inputs is built
//! lazily, at most once per (mesh, shader) pair, and looked up by shader
//! identity on every subsequent draw. See [`Mesh::prepare_draw`].

mod cache;
mod interfaces;
mod mesh;
mod model;
mod renderer;
mod shader;
mod texture;

pub use cache::*;
pub use interfaces::*;
pub use mesh::*;
pub use model::*;
pub use renderer::*;
pub use shader::*;
pub use texture::*;

/// Reexport of the type definitions crate.
pub use rime_types as types;

use rustc_hash::FxHashMap;

/// Hash map designed for small keys.
pub type FastHashMap<K, V> = FxHashMap<K, V>;

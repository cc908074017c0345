use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use wgpu::RenderPass;

use rime_types::Transform;

use crate::{Mesh, Renderer, Shader, TextureResource};

/// A group of meshes loaded from one asset file, drawn under a single
/// transform.
///
/// The model's transform and each mesh's own transform are independent:
/// when a model drives the draw, the MODEL transform is what reaches the
/// `model` uniform, passed to every mesh as an explicit override. A mesh
/// drawn standalone uses its own transform. The two are never composed.
///
/// `Model` is deliberately not `Clone`: a copy would either alias GPU
/// buffers or silently re-upload them. Duplicate a model by running the
/// loader again against [`Model::source`], which makes the cost visible
/// at the call site.
pub struct Model {
    pub transform: Transform,
    pub meshes: Vec<Mesh>,
    source: Option<PathBuf>,
}

impl Model {
    pub fn new(meshes: Vec<Mesh>) -> Self {
        Self {
            transform: Transform::default(),
            meshes,
            source: None,
        }
    }

    pub fn from_source(meshes: Vec<Mesh>, source: PathBuf) -> Self {
        Self {
            transform: Transform::default(),
            meshes,
            source: Some(source),
        }
    }

    /// The asset path this model was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Appends a shared texture reference to every mesh. Used to hand the
    /// scene's shadow map to asset-loaded geometry.
    pub fn add_texture(&mut self, texture: &Arc<TextureResource>) {
        for mesh in &mut self.meshes {
            mesh.add_texture(Arc::clone(texture));
        }
    }

    /// Prepares every mesh for a draw with `shader`, with the model's
    /// transform as the model-matrix override.
    pub fn prepare_draw(&mut self, renderer: &Renderer, shader: &Shader) {
        let model = self.transform.matrix();
        for mesh in &mut self.meshes {
            mesh.prepare_draw(renderer, shader, Some(model));
        }
    }

    /// Records every mesh's draw. Must follow [`Model::prepare_draw`]
    /// this frame.
    pub fn encode<'rpass>(&'rpass self, rpass: &mut RenderPass<'rpass>) {
        for mesh in &self.meshes {
            mesh.encode(rpass);
        }
    }

    /// World-space translation used for transparency distance sorting.
    pub fn location(&self) -> glam::Vec3 {
        self.transform.translate
    }
}

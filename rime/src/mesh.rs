use std::sync::Arc;

use arrayvec::ArrayVec;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::{
    util::{BufferInitDescriptor, DeviceExt},
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindingResource, Buffer, BufferDescriptor, BufferUsages,
    IndexFormat, RenderPass, RenderPipeline, TextureView, VertexAttribute, VertexBufferLayout, VertexFormat,
    VertexStepMode,
};

use rime_types::{
    texcoord_offset, MeshData, MeshValidationError, TextureKind, Transform, VERTEX_LOCATION_NORMAL,
    VERTEX_LOCATION_POSITION, VERTEX_LOCATION_TEXCOORD_BASE,
};

use crate::{
    BindingCache, BindingDisposition, Renderer, Shader, TextureResource, MESH_SHADOW_TEXTURE_BINDING,
    OBJECT_BIND_GROUP, TEXTURE_BIND_GROUP,
};

/// Per-draw uniforms, written before every prepared draw.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ObjectUniforms {
    model: Mat4,
    /// Transpose-inverse of `model`, padded out to a mat4 for WGSL
    /// uniform layout.
    normal: Mat4,
}

/// One cached binding: the pipeline wiring this mesh's vertex buffer into
/// a shader, plus whether draws through it bind the texture group.
struct MeshBinding {
    pipeline: RenderPipeline,
    uses_textures: bool,
}

/// The GPU half of a mesh: one static vertex buffer and one static index
/// buffer, uploaded once at setup.
///
/// Reference counted so `share()`d meshes reuse the buffers; the buffers
/// are released when the last referencing mesh drops.
pub struct GpuGeometry {
    pub vertex_buffer: Buffer,
    pub index_buffer: Buffer,
    pub index_count: u32,
    pub stride: u64,
    pub layer_count: u32,
}

/// Slot assignment for one mesh texture within the texture bind group.
///
/// Each [`TextureKind`] owns a contiguous slot range and an independent
/// counter, which is what produces the shader-visible naming contract:
/// `texture_diffuse0`, `texture_diffuse1`, `texture_specular0`,
/// `texture_shadow0`, ...
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PlannedBinding {
    pub slot: u32,
    pub kind: TextureKind,
    /// Index within this texture's kind, not within the whole list.
    pub index: u32,
}

impl PlannedBinding {
    /// The WGSL-side name this texture is bound under.
    pub fn name(&self) -> String {
        format!("texture_{}{}", self.kind.name(), self.index)
    }
}

fn slot_range(kind: TextureKind) -> Option<(u32, u32)> {
    // (first slot, capacity) per kind.
    match kind {
        TextureKind::Diffuse => Some((0, 4)),
        TextureKind::Specular => Some((4, 2)),
        TextureKind::Alpha => Some((6, 2)),
        TextureKind::Shadow => Some((MESH_SHADOW_TEXTURE_BINDING, 1)),
        TextureKind::Unknown => None,
    }
}

/// Assigns a bind group slot to each texture in insertion order. Returns
/// one entry per input; `None` marks a texture that cannot be bound
/// (unknown kind, or more textures of a kind than the interface has
/// slots for).
pub fn plan_texture_bindings(kinds: &[TextureKind]) -> Vec<Option<PlannedBinding>> {
    let mut counters = [0u32; 5];

    kinds
        .iter()
        .map(|&kind| {
            let (base, capacity) = slot_range(kind)?;
            let counter = &mut counters[kind as usize];
            if *counter >= capacity {
                return None;
            }
            let planned = PlannedBinding {
                slot: base + *counter,
                kind,
                index: *counter,
            };
            *counter += 1;
            Some(planned)
        })
        .collect()
}

/// Geometry, textures, a transform, and the per-shader binding cache.
///
/// A mesh can be drawn with any number of different shader programs over
/// its lifetime; the cache guarantees the pipeline wiring its vertex
/// buffer into a given program is built at most once.
pub struct Mesh {
    pub transform: Transform,
    data: MeshData,
    textures: Vec<Arc<TextureResource>>,
    geometry: Option<Arc<GpuGeometry>>,
    bindings: BindingCache<MeshBinding>,
    object_buffer: Option<Buffer>,
    object_bind_group: Option<BindGroup>,
    texture_bind_group: Option<BindGroup>,
    textures_dirty: bool,
    set_up: bool,
}

impl Mesh {
    pub fn new(data: MeshData) -> Result<Self, MeshValidationError> {
        data.validate()?;
        Ok(Self {
            transform: Transform::default(),
            data,
            textures: Vec::new(),
            geometry: None,
            bindings: BindingCache::new(),
            object_buffer: None,
            object_bind_group: None,
            texture_bind_group: None,
            textures_dirty: false,
            set_up: false,
        })
    }

    pub fn with_textures(
        data: MeshData,
        textures: Vec<Arc<TextureResource>>,
    ) -> Result<Self, MeshValidationError> {
        let mut mesh = Self::new(data)?;
        mesh.textures = textures;
        mesh.textures_dirty = !mesh.textures.is_empty();
        Ok(mesh)
    }

    /// Appends a shared texture reference. Never invalidates cached
    /// shader bindings; only the texture bind group is rebuilt on the
    /// next prepared draw.
    pub fn add_texture(&mut self, texture: Arc<TextureResource>) {
        self.textures.push(texture);
        self.textures_dirty = true;
    }

    pub fn textures(&self) -> &[Arc<TextureResource>] {
        &self.textures
    }

    /// A new mesh sharing this mesh's geometry buffers and texture
    /// references. The share is cheap once the mesh is set up; the new
    /// mesh gets its own transform, uniforms, and binding cache.
    pub fn share(&self) -> Self {
        Self {
            transform: self.transform,
            data: self.data.clone(),
            textures: self.textures.clone(),
            geometry: self.geometry.clone(),
            bindings: BindingCache::new(),
            object_buffer: None,
            object_bind_group: None,
            texture_bind_group: None,
            textures_dirty: !self.textures.is_empty(),
            set_up: false,
        }
    }

    /// The number of distinct shaders this mesh has built bindings for.
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Uploads geometry and allocates the per-object uniform buffer.
    /// Idempotent: re-invocation after the first run is a no-op, not an
    /// error.
    pub fn setup(&mut self, renderer: &Renderer) {
        if self.set_up {
            return;
        }
        self.set_up = true;

        profiling::scope!("Mesh::setup");

        if self.data.vertices.is_empty() || self.data.indices.is_empty() {
            log::debug!("Skipping GPU upload for empty mesh");
            return;
        }

        let packed = self.data.pack();

        let vertex_buffer = renderer.device.create_buffer_init(&BufferInitDescriptor {
            label: Some("mesh vertex buffer"),
            contents: &packed.bytes,
            usage: BufferUsages::VERTEX,
        });
        let index_buffer = renderer.device.create_buffer_init(&BufferInitDescriptor {
            label: Some("mesh index buffer"),
            contents: bytemuck::cast_slice(&self.data.indices),
            usage: BufferUsages::INDEX,
        });

        self.geometry = Some(Arc::new(GpuGeometry {
            vertex_buffer,
            index_buffer,
            index_count: self.data.indices.len() as u32,
            stride: packed.stride,
            layer_count: packed.layer_count,
        }));

        self.ensure_object_state(renderer);
    }

    fn ensure_object_state(&mut self, renderer: &Renderer) {
        if self.object_buffer.is_some() {
            return;
        }

        let buffer = renderer.device.create_buffer(&BufferDescriptor {
            label: Some("object uniforms"),
            size: std::mem::size_of::<ObjectUniforms>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = renderer.device.create_bind_group(&BindGroupDescriptor {
            label: Some("object bind group"),
            layout: &renderer.interfaces.object_bgl,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        self.object_buffer = Some(buffer);
        self.object_bind_group = Some(bind_group);
    }

    fn rebuild_texture_bind_group(&mut self, renderer: &Renderer) {
        let kinds: Vec<_> = self.textures.iter().map(|t| t.kind).collect();
        let plan = plan_texture_bindings(&kinds);

        let mut color_slots: [&TextureView; MESH_SHADOW_TEXTURE_BINDING as usize] =
            [&renderer.null_color_view; MESH_SHADOW_TEXTURE_BINDING as usize];
        let mut shadow_slot: &TextureView = &renderer.null_shadow_view;

        for (texture, planned) in self.textures.iter().zip(&plan) {
            match planned {
                Some(planned) if planned.kind == TextureKind::Shadow => shadow_slot = &texture.view,
                Some(planned) => color_slots[planned.slot as usize] = &texture.view,
                None => log::warn!(
                    "Mesh texture {:?} ({:?}) has no free binding slot and will not be bound",
                    texture.source,
                    texture.kind
                ),
            }
        }

        let mut entries: ArrayVec<BindGroupEntry<'_>, { MESH_SHADOW_TEXTURE_BINDING as usize + 1 }> =
            ArrayVec::new();
        for (slot, view) in color_slots.iter().enumerate() {
            entries.push(BindGroupEntry {
                binding: slot as u32,
                resource: BindingResource::TextureView(view),
            });
        }
        entries.push(BindGroupEntry {
            binding: MESH_SHADOW_TEXTURE_BINDING,
            resource: BindingResource::TextureView(shadow_slot),
        });

        self.texture_bind_group = Some(renderer.device.create_bind_group(&BindGroupDescriptor {
            label: Some("mesh textures"),
            layout: &renderer.interfaces.texture_bgl,
            entries: &entries,
        }));
        self.textures_dirty = false;
    }

    /// Readies this mesh for one draw with `shader`: runs setup if it has
    /// not happened, writes the object uniforms (from `model_override`
    /// when a [`Model`](crate::Model) is driving the draw, this mesh's
    /// own transform otherwise), and selects the cached pipeline for the
    /// shader, building it on first encounter.
    ///
    /// If the shader was passed on the previous prepare of this mesh the
    /// cache returns immediately on an identity check; this is the hot
    /// path when one shader draws every mesh in sequence, as the shadow
    /// pass does.
    ///
    /// Returns `false` when the mesh cannot be drawn with this shader
    /// (empty geometry, invalid program, or fewer UV layers than the
    /// program consumes); the draw is skipped and the scene renders
    /// without it.
    pub fn prepare_draw(&mut self, renderer: &Renderer, shader: &Shader, model_override: Option<Mat4>) -> bool {
        self.setup(renderer);

        let Some(geometry) = self.geometry.clone() else {
            return false;
        };

        if !shader.is_valid() {
            log::debug!("Skipping draw with invalid shader \"{}\"", shader.label());
            return false;
        }

        let wanted_layers = shader.vertex_interface.texcoord_layers;
        if geometry.layer_count < wanted_layers {
            log::warn!(
                "Mesh has {} texture coordinate layers but shader \"{}\" consumes {}; skipping draw",
                geometry.layer_count,
                shader.label(),
                wanted_layers,
            );
            return false;
        }

        let model = model_override.unwrap_or_else(|| self.transform.matrix());
        let uniforms = ObjectUniforms {
            model,
            normal: model.inverse().transpose(),
        };
        // ensure_object_state ran during setup for non-empty meshes.
        if let Some(buffer) = &self.object_buffer {
            renderer.queue.write_buffer(buffer, 0, bytemuck::bytes_of(&uniforms));
        }

        if self.textures_dirty || self.texture_bind_group.is_none() {
            self.rebuild_texture_bind_group(renderer);
        }

        let mut attributes: ArrayVec<VertexAttribute, 10> = ArrayVec::new();
        attributes.push(VertexAttribute {
            format: VertexFormat::Float32x3,
            offset: 0,
            shader_location: VERTEX_LOCATION_POSITION,
        });
        if shader.vertex_interface.normal {
            attributes.push(VertexAttribute {
                format: VertexFormat::Float32x3,
                offset: 12,
                shader_location: VERTEX_LOCATION_NORMAL,
            });
        }
        for layer in 0..wanted_layers {
            attributes.push(VertexAttribute {
                format: VertexFormat::Float32x2,
                offset: texcoord_offset(layer as usize),
                shader_location: VERTEX_LOCATION_TEXCOORD_BASE + layer,
            });
        }

        let layout = VertexBufferLayout {
            array_stride: geometry.stride,
            step_mode: VertexStepMode::Vertex,
            attributes: &attributes,
        };

        let disposition = self.bindings.prepare(shader.id(), || {
            profiling::scope!("Mesh binding build");
            MeshBinding {
                pipeline: shader
                    .build_pipeline(renderer, &layout)
                    .expect("validated shader always yields a pipeline"),
                uses_textures: shader.uses_textures(),
            }
        });
        if disposition == BindingDisposition::Created {
            log::debug!(
                "Built binding #{} for mesh with shader \"{}\"",
                self.bindings.len(),
                shader.label()
            );
        }

        true
    }

    /// Records this mesh's draw into a render pass. Must follow a
    /// successful [`Mesh::prepare_draw`] this frame; encodes nothing if
    /// the mesh has no prepared state.
    pub fn encode<'rpass>(&'rpass self, rpass: &mut RenderPass<'rpass>) {
        let (Some(geometry), Some(binding), Some(object_bg), Some(texture_bg)) = (
            self.geometry.as_deref(),
            self.bindings.current(),
            self.object_bind_group.as_ref(),
            self.texture_bind_group.as_ref(),
        ) else {
            return;
        };

        rpass.set_pipeline(&binding.pipeline);
        rpass.set_bind_group(OBJECT_BIND_GROUP, object_bg, &[]);
        if binding.uses_textures {
            rpass.set_bind_group(TEXTURE_BIND_GROUP, texture_bg, &[]);
        }
        rpass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
        rpass.set_index_buffer(geometry.index_buffer.slice(..), IndexFormat::Uint32);
        rpass.draw_indexed(0..geometry.index_count, 0, 0..1);
    }

    /// World-space translation used for transparency distance sorting.
    pub fn location(&self) -> glam::Vec3 {
        self.transform.translate
    }
}

#[cfg(test)]
mod tests {
    use rime_types::TextureKind;

    use super::plan_texture_bindings;

    #[test]
    fn counters_are_independent_per_kind() {
        let plan = plan_texture_bindings(&[
            TextureKind::Diffuse,
            TextureKind::Diffuse,
            TextureKind::Specular,
            TextureKind::Shadow,
        ]);

        let names: Vec<_> = plan.iter().map(|p| p.unwrap().name()).collect();
        assert_eq!(
            names,
            ["texture_diffuse0", "texture_diffuse1", "texture_specular0", "texture_shadow0"]
        );
    }

    #[test]
    fn slots_are_sequential_within_a_kind() {
        let plan = plan_texture_bindings(&[
            TextureKind::Specular,
            TextureKind::Diffuse,
            TextureKind::Specular,
        ]);

        assert_eq!(plan[0].unwrap().slot, 4);
        assert_eq!(plan[1].unwrap().slot, 0);
        assert_eq!(plan[2].unwrap().slot, 5);
    }

    #[test]
    fn interleaved_kinds_keep_their_own_counts() {
        let plan = plan_texture_bindings(&[
            TextureKind::Diffuse,
            TextureKind::Specular,
            TextureKind::Diffuse,
            TextureKind::Alpha,
            TextureKind::Diffuse,
        ]);

        let indices: Vec<_> = plan.iter().map(|p| p.unwrap().index).collect();
        assert_eq!(indices, [0, 0, 1, 0, 2]);
    }

    #[test]
    fn overflow_and_unknown_go_unbound() {
        let plan = plan_texture_bindings(&[
            TextureKind::Shadow,
            TextureKind::Shadow,
            TextureKind::Unknown,
        ]);

        assert!(plan[0].is_some());
        assert_eq!(plan[1], None);
        assert_eq!(plan[2], None);
    }
}

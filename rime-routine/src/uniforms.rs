use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindingResource, Buffer, BufferDescriptor, BufferUsages,
};

use rime::Renderer;
use rime_types::{Camera, Light};

/// GPU mirror of [`Light`], padded to uniform layout rules.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct GpuLight {
    pub position: Vec4,
    pub direction: Vec4,
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    pub kind: u32,
    pub inner_cutoff: f32,
    pub outer_cutoff: f32,
    pub _padding: f32,
}

impl From<&Light> for GpuLight {
    fn from(light: &Light) -> Self {
        Self {
            position: light.position.extend(1.0),
            direction: light.direction.extend(0.0),
            ambient: light.ambient.extend(1.0),
            diffuse: light.diffuse.extend(1.0),
            specular: light.specular.extend(1.0),
            kind: light.kind as u32,
            inner_cutoff: light.inner_cutoff,
            outer_cutoff: light.outer_cutoff,
            _padding: 0.0,
        }
    }
}

/// The per-pass uniform block: camera matrices, the shadow projector's
/// view-projection, the viewer position, and the scene light.
///
/// Field names are the draw contract shared with the WGSL sources in
/// [`crate::shaders`].
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view: Mat4,
    pub projection: Mat4,
    /// Inverse of `projection · view-without-translation`; the skybox
    /// reconstructs world-space view rays from it.
    pub origin_view_proj_inv: Mat4,
    pub shadow_vp: Mat4,
    pub camera_pos: Vec4,
    pub light: GpuLight,
    pub shadow_near: f32,
    pub shadow_far: f32,
    pub _padding: [f32; 2],
}

impl FrameUniforms {
    /// Builds the block from the pass's camera plus the shadow projector
    /// state the forward shaders sample with.
    pub fn new(camera: &mut Camera, light: &Light, shadow_vp: Mat4, shadow_near: f32, shadow_far: f32) -> Self {
        let view = camera.view_matrix();
        let projection = camera.projection_matrix();

        let mut origin_view = view;
        origin_view.w_axis = Vec4::W;

        Self {
            view,
            projection,
            origin_view_proj_inv: (projection * origin_view).inverse(),
            shadow_vp,
            camera_pos: camera.position.extend(1.0),
            light: GpuLight::from(light),
            shadow_near,
            shadow_far,
            _padding: [0.0; 2],
        }
    }
}

/// One uniform buffer plus the group-0 bind group (uniforms + the two
/// shared samplers). Each routine owns one and rewrites it every frame.
pub struct FrameUniformBuffer {
    buffer: Buffer,
    pub bind_group: BindGroup,
}

impl FrameUniformBuffer {
    pub fn new(renderer: &Renderer, label: &str) -> Self {
        let buffer = renderer.device.create_buffer(&BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = renderer.device.create_bind_group(&BindGroupDescriptor {
            label: Some(label),
            layout: &renderer.interfaces.frame_bgl,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: BindingResource::Sampler(&renderer.color_sampler),
                },
                BindGroupEntry {
                    binding: 2,
                    resource: BindingResource::Sampler(&renderer.shadow_sampler),
                },
            ],
        });

        Self { buffer, bind_group }
    }

    pub fn write(&self, renderer: &Renderer, uniforms: &FrameUniforms) {
        renderer.queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(uniforms));
    }
}

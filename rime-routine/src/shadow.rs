use std::sync::Arc;

use glam::Mat4;
use wgpu::{
    CommandEncoder, LoadOp, Operations, RenderPass, RenderPassDepthStencilAttachment, RenderPassDescriptor, StoreOp,
};

use rime::{Renderer, Shader, ShaderConfig, TextureResource, VertexInterface, FRAME_BIND_GROUP};
use rime_types::{Camera, Light, Projection};

use crate::{shaders, FrameUniformBuffer, FrameUniforms};

pub const DEFAULT_SHADOW_RESOLUTION: u32 = 4096;

/// The depth-only pass rendered from the light's camera.
///
/// Owns the shadow map and the depth-only shader program. Every frame it
/// runs strictly before the forward pass, which samples the map this pass
/// wrote.
pub struct ShadowRoutine {
    shader: Shader,
    map: Arc<TextureResource>,
    uniforms: FrameUniformBuffer,
    shadow_vp: Mat4,
    near: f32,
    far: f32,
}

impl ShadowRoutine {
    pub fn new(renderer: &Renderer, resolution: u32) -> Self {
        profiling::scope!("ShadowRoutine::new");

        let shader = Shader::from_wgsl(
            renderer,
            "shadow",
            shaders::SHADOW,
            ShaderConfig::shadow(),
            VertexInterface::POSITION_ONLY,
        );
        log::debug!("Shadow map resolution {resolution}x{resolution}");

        Self {
            shader,
            map: TextureResource::shadow_target(renderer, resolution),
            uniforms: FrameUniformBuffer::new(renderer, "shadow frame uniforms"),
            shadow_vp: Mat4::IDENTITY,
            near: 0.0,
            far: 0.0,
        }
    }

    /// The depth-only program shadow casters are prepared with.
    pub fn shader(&self) -> &Shader {
        &self.shader
    }

    /// The shadow map. Add it to any mesh that should receive shadows.
    pub fn map(&self) -> &Arc<TextureResource> {
        &self.map
    }

    /// The light camera's view-projection from the last `ready` call,
    /// published to forward shaders as `shadow_vp`.
    pub fn shadow_vp(&self) -> Mat4 {
        self.shadow_vp
    }

    pub fn depth_range(&self) -> (f32, f32) {
        (self.near, self.far)
    }

    /// Writes this pass's frame uniforms from the light's camera.
    pub fn ready(&mut self, renderer: &Renderer, light_camera: &mut Camera, light: &Light) {
        self.shadow_vp = light_camera.view_projection();
        (self.near, self.far) = match light_camera.projection {
            Projection::Perspective { near, far, .. } => (near, far),
            Projection::Orthographic { near, far, .. } => (near, far),
        };

        let uniforms = FrameUniforms::new(light_camera, light, self.shadow_vp, self.near, self.far);
        self.uniforms.write(renderer, &uniforms);
    }

    /// Begins the depth-only pass targeting the shadow map, with the
    /// frame bind group already set.
    pub fn begin<'pass>(&'pass self, encoder: &'pass mut CommandEncoder) -> RenderPass<'pass> {
        let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("shadow pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                view: &self.map.view,
                depth_ops: Some(Operations {
                    load: LoadOp::Clear(1.0),
                    store: StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        rpass.set_bind_group(FRAME_BIND_GROUP, &self.uniforms.bind_group, &[]);
        rpass
    }
}

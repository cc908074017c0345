use wgpu::{
    Color, CommandEncoder, Extent3d, LoadOp, Operations, RenderPass, RenderPassColorAttachment,
    RenderPassDepthStencilAttachment, RenderPassDescriptor, StoreOp, TextureDescriptor, TextureDimension,
    TextureFormat, TextureUsages, TextureView, TextureViewDescriptor,
};

use rime::{Renderer, FRAME_BIND_GROUP};
use rime_types::{Camera, Light};

use crate::{FrameUniformBuffer, FrameUniforms, ShadowRoutine};

/// The color pass. Within it the draw order is skybox, opaque geometry,
/// then alpha-blended geometry back to front; the pass samples the
/// shadow map written by the [`ShadowRoutine`] earlier in the same frame.
pub struct ForwardRoutine {
    uniforms: FrameUniformBuffer,
    depth_view: TextureView,
    pub clear_color: Color,
}

impl ForwardRoutine {
    pub fn new(renderer: &Renderer, width: u32, height: u32) -> Self {
        Self {
            uniforms: FrameUniformBuffer::new(renderer, "forward frame uniforms"),
            depth_view: create_depth_view(renderer, width, height),
            clear_color: Color {
                r: 0.2,
                g: 0.3,
                b: 0.3,
                a: 1.0,
            },
        }
    }

    /// Recreates the depth buffer for a resized surface.
    pub fn resize(&mut self, renderer: &Renderer, width: u32, height: u32) {
        self.depth_view = create_depth_view(renderer, width, height);
    }

    /// Writes this pass's frame uniforms from the viewer camera, carrying
    /// over the shadow projector state the shadow routine computed.
    pub fn ready(&self, renderer: &Renderer, camera: &mut Camera, light: &Light, shadow: &ShadowRoutine) {
        let (near, far) = shadow.depth_range();
        let uniforms = FrameUniforms::new(camera, light, shadow.shadow_vp(), near, far);
        self.uniforms.write(renderer, &uniforms);
    }

    /// Begins the color pass targeting `target`, clearing color and
    /// depth, with the frame bind group already set.
    pub fn begin<'pass>(&'pass self, encoder: &'pass mut CommandEncoder, target: &'pass TextureView) -> RenderPass<'pass> {
        let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("forward pass"),
            color_attachments: &[Some(RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: Operations {
                    load: LoadOp::Clear(self.clear_color),
                    store: StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                view: &self.depth_view,
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

fn create_depth_view(renderer: &Renderer, width: u32, height: u32) -> TextureView {
    let texture = renderer.device.create_texture(&TextureDescriptor {
        label: Some("forward depth buffer"),
        size: Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: TextureFormat::Depth32Float,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&TextureViewDescriptor::default())
}

use std::sync::Arc;

use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry,
    BindingResource, BindingType, ColorTargetState, ColorWrites, CompareFunction, DepthBiasState, DepthStencilState,
    FragmentState, FrontFace, MultisampleState, PipelineLayoutDescriptor, PolygonMode, PrimitiveState,
    PrimitiveTopology, RenderPass, RenderPipeline, RenderPipelineDescriptor, ShaderModuleDescriptor, ShaderSource,
    ShaderStages, StencilState, TextureFormat, TextureSampleType, TextureViewDimension, VertexState,
};

use rime::{Renderer, TextureResource};

use crate::shaders;

struct StoredSkybox {
    bg: Option<BindGroup>,
    texture: Option<Arc<TextureResource>>,
}

/// Renders a cubemap as the scene background.
///
/// Drawn first in the forward pass as a single fullscreen triangle at the
/// far plane with depth writes off, so all scene geometry lands in front
/// of it.
pub struct SkyboxRoutine {
    pipeline: RenderPipeline,
    bgl: BindGroupLayout,
    current: StoredSkybox,
}

impl SkyboxRoutine {
    pub fn new(renderer: &Renderer, surface_format: TextureFormat) -> Self {
        profiling::scope!("SkyboxRoutine::new");

        let bgl = renderer.device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("skybox bgl"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Texture {
                    sample_type: TextureSampleType::Float { filterable: true },
                    view_dimension: TextureViewDimension::Cube,
                    multisampled: false,
                },
                count: None,
            }],
        });

        let module = renderer.device.create_shader_module(ShaderModuleDescriptor {
            label: Some("skybox"),
            source: ShaderSource::Wgsl(shaders::SKYBOX.into()),
        });

        let pll = renderer.device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("skybox pass"),
            bind_group_layouts: &[&renderer.interfaces.frame_bgl, &bgl],
            push_constant_ranges: &[],
        });

        let pipeline = renderer.device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("skybox pass"),
            layout: Some(&pll),
            vertex: VertexState {
                module: &module,
                entry_point: "vs_main",
                buffers: &[],
            },
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(DepthStencilState {
                format: TextureFormat::Depth32Float,
                depth_write_enabled: false,
                depth_compare: CompareFunction::LessEqual,
                stencil: StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: MultisampleState::default(),
            fragment: Some(FragmentState {
                module: &module,
                entry_point: "fs_main",
                targets: &[Some(ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: ColorWrites::all(),
                })],
            }),
            multiview: None,
        });

        Self {
            pipeline,
            bgl,
            current: StoredSkybox { bg: None, texture: None },
        }
    }

    /// Sets the background cubemap. Pass a texture made with
    /// [`TextureResource::cube_from_encoded`]; `None` disables the skybox.
    pub fn set_background_texture(&mut self, texture: Option<Arc<TextureResource>>) {
        self.current.texture = texture;
        self.current.bg = None;
    }

    /// Rebuilds the bind group if the background changed since last frame.
    pub fn ready(&mut self, renderer: &Renderer) {
        if let Some(ref texture) = self.current.texture {
            if self.current.bg.is_none() {
                self.current.bg = Some(renderer.device.create_bind_group(&BindGroupDescriptor {
                    label: Some("skybox"),
                    layout: &self.bgl,
                    entries: &[BindGroupEntry {
                        binding: 0,
                        resource: BindingResource::TextureView(&texture.view),
                    }],
                }));
            }
        }
    }

    /// Draws the skybox. Expects the forward pass's frame bind group to
    /// already be set at group 0.
    pub fn encode<'rpass>(&'rpass self, rpass: &mut RenderPass<'rpass>) {
        if let Some(ref bg) = self.current.bg {
            rpass.set_pipeline(&self.pipeline);
            rpass.set_bind_group(1, bg, &[]);
            rpass.draw(0..3, 0..1);
        }
    }
}

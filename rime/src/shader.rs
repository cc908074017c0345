use wgpu::{
    BlendState, ColorTargetState, ColorWrites, CompareFunction, DepthBiasState, DepthStencilState, ErrorFilter, Face,
    FragmentState, FrontFace, MultisampleState, PipelineLayout, PipelineLayoutDescriptor, PolygonMode, PrimitiveState,
    PrimitiveTopology, RenderPipeline, RenderPipelineDescriptor, ShaderModule, ShaderModuleDescriptor, ShaderSource,
    StencilState, TextureFormat, VertexBufferLayout, VertexState,
};

use crate::{Renderer, ShaderId};

/// Which vertex attributes a shader program consumes.
///
/// Position is always consumed. The shadow program takes position only;
/// the lit programs add the normal and one or more texture coordinate
/// layers (layer N is declared at shader location 8 + N).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VertexInterface {
    pub normal: bool,
    pub texcoord_layers: u32,
}

impl VertexInterface {
    pub const POSITION_ONLY: Self = Self {
        normal: false,
        texcoord_layers: 0,
    };

    pub const LIT: Self = Self {
        normal: true,
        texcoord_layers: 1,
    };
}

/// Fixed-function state a program is built against. Two programs with the
/// same WGSL but different target state are different shaders as far as
/// mesh binding caches are concerned, which is exactly right: they need
/// distinct pipelines.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShaderConfig {
    /// `None` for depth-only programs (the shadow pass has no color
    /// attachment).
    pub color_format: Option<TextureFormat>,
    pub blend: Option<BlendState>,
    pub depth_format: Option<TextureFormat>,
    pub depth_write: bool,
    pub depth_compare: CompareFunction,
    pub cull_mode: Option<Face>,
}

impl ShaderConfig {
    /// Opaque color-pass state.
    pub fn forward(surface_format: TextureFormat) -> Self {
        Self {
            color_format: Some(surface_format),
            blend: None,
            depth_format: Some(TextureFormat::Depth32Float),
            depth_write: true,
            depth_compare: CompareFunction::Less,
            cull_mode: Some(Face::Back),
        }
    }

    /// Alpha-blended color-pass state: blending on, both faces drawn,
    /// depth test on but depth write off so stacked transparents don't
    /// occlude each other.
    pub fn transparent(surface_format: TextureFormat) -> Self {
        Self {
            blend: Some(BlendState::ALPHA_BLENDING),
            depth_write: false,
            cull_mode: None,
            ..Self::forward(surface_format)
        }
    }

    /// Depth-only shadow-pass state.
    pub fn shadow() -> Self {
        Self {
            color_format: None,
            blend: None,
            depth_format: Some(TextureFormat::Depth32Float),
            depth_write: true,
            depth_compare: CompareFunction::Less,
            // Front-face culling while rendering the shadow map reduces
            // peter-panning on closed meshes.
            cull_mode: Some(Face::Front),
        }
    }
}

/// A linked shader program: one WGSL module holding the vertex/fragment
/// pair, plus the fixed-function state pipelines are built with.
///
/// Compile diagnostics are logged, not returned; a program that failed
/// validation never yields pipelines, so draws through it are skipped
/// rather than crashing (the scene renders degraded).
pub struct Shader {
    id: ShaderId,
    label: String,
    module: Option<ShaderModule>,
    pub config: ShaderConfig,
    pub vertex_interface: VertexInterface,
    pipeline_layout: PipelineLayout,
}

impl Shader {
    pub fn from_wgsl(
        renderer: &Renderer,
        label: &str,
        source: &str,
        config: ShaderConfig,
        vertex_interface: VertexInterface,
    ) -> Self {
        profiling::scope!("Shader::from_wgsl");

        renderer.device.push_error_scope(ErrorFilter::Validation);
        let module = renderer.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(label),
            source: ShaderSource::Wgsl(source.into()),
        });
        let module = match pollster::block_on(renderer.device.pop_error_scope()) {
            None => Some(module),
            Some(error) => {
                log::error!("Shader \"{label}\" failed validation: {error}");
                None
            }
        };

        // Depth-only programs get no texture group: the shadow pass must
        // not bind the shadow map it is rendering into.
        let mut bind_group_layouts = vec![&renderer.interfaces.frame_bgl, &renderer.interfaces.object_bgl];
        if config.color_format.is_some() {
            bind_group_layouts.push(&renderer.interfaces.texture_bgl);
        }
        let pipeline_layout = renderer.device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &bind_group_layouts,
            push_constant_ranges: &[],
        });

        Self {
            id: ShaderId::allocate(),
            label: label.to_owned(),
            module,
            config,
            vertex_interface,
            pipeline_layout,
        }
    }

    pub fn id(&self) -> ShaderId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_valid(&self) -> bool {
        self.module.is_some()
    }

    /// Whether draws with this program bind the per-mesh texture group.
    /// Depth-only programs do not sample, and must not bind the shadow
    /// map while it is the pass's depth attachment.
    pub fn uses_textures(&self) -> bool {
        self.config.color_format.is_some()
    }

    /// Builds the pipeline wiring `vertex_layout` into this program.
    /// Returns `None` (and the caller skips the draw) if the module
    /// failed validation.
    pub(crate) fn build_pipeline(
        &self,
        renderer: &Renderer,
        vertex_layout: &VertexBufferLayout<'_>,
    ) -> Option<RenderPipeline> {
        profiling::scope!("Shader::build_pipeline");

        let module = self.module.as_ref()?;

        let targets;
        let fragment = match self.config.color_format {
            Some(format) => {
                targets = [Some(ColorTargetState {
                    format,
                    blend: self.config.blend,
                    write_mask: ColorWrites::all(),
                })];
                Some(FragmentState {
                    module,
                    entry_point: "fs_main",
                    targets: &targets,
                })
            }
            None => None,
        };

        Some(renderer.device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(&self.label),
            layout: Some(&self.pipeline_layout),
            vertex: VertexState {
                module,
                entry_point: "vs_main",
                buffers: std::slice::from_ref(vertex_layout),
            },
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: FrontFace::Ccw,
                cull_mode: self.config.cull_mode,
                unclipped_depth: false,
                polygon_mode: PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: self.config.depth_format.map(|format| DepthStencilState {
                format,
                depth_write_enabled: self.config.depth_write,
                depth_compare: self.config.depth_compare,
                stencil: StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: MultisampleState::default(),
            fragment,
            multiview: None,
        }))
    }
}

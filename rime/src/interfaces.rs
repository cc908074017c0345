use wgpu::{
    BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType, BufferBindingType, Device,
    SamplerBindingType, ShaderStages, TextureSampleType, TextureViewDimension,
};

/// Number of color texture slots in the per-mesh texture bind group.
/// The shadow map sits in its own depth-typed binding after these.
pub const MESH_COLOR_TEXTURE_SLOTS: u32 = 8;
/// Binding index of the shadow map within the per-mesh texture group.
pub const MESH_SHADOW_TEXTURE_BINDING: u32 = MESH_COLOR_TEXTURE_SLOTS;

/// Bind group indices of the draw contract. Shaders declare these groups;
/// routines bind group 0, meshes bind groups 1 and 2.
pub const FRAME_BIND_GROUP: u32 = 0;
pub const OBJECT_BIND_GROUP: u32 = 1;
pub const TEXTURE_BIND_GROUP: u32 = 2;

/// The bind group layouts every mesh-drawing shader shares.
///
/// Keeping these mesh-independent (unused texture slots are filled with
/// null views) is what lets a pipeline depend only on the (shader, vertex
/// layout) pair, so the per-mesh binding cache never has to invalidate
/// when textures are added.
pub struct ShaderInterfaces {
    /// Group 0: frame uniforms + the two shared samplers.
    pub frame_bgl: BindGroupLayout,
    /// Group 1: per-object uniforms (model / normal matrices).
    pub object_bgl: BindGroupLayout,
    /// Group 2: per-mesh textures, color slots then the shadow map.
    pub texture_bgl: BindGroupLayout,
}

impl ShaderInterfaces {
    pub fn new(device: &Device) -> Self {
        profiling::scope!("ShaderInterfaces::new");

        let frame_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("frame bgl"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::VERTEX_FRAGMENT,
                    ty: BindingType::Buffer {
                        ty: BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Filtering),
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 2,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let object_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("object bgl"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let mut texture_entries = Vec::with_capacity(MESH_COLOR_TEXTURE_SLOTS as usize + 1);
        for binding in 0..MESH_COLOR_TEXTURE_SLOTS {
            texture_entries.push(BindGroupLayoutEntry {
                binding,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Texture {
                    sample_type: TextureSampleType::Float { filterable: true },
                    view_dimension: TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
        }
        texture_entries.push(BindGroupLayoutEntry {
            binding: MESH_SHADOW_TEXTURE_BINDING,
            visibility: ShaderStages::FRAGMENT,
            ty: BindingType::Texture {
                sample_type: TextureSampleType::Depth,
                view_dimension: TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        });

        let texture_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("mesh texture bgl"),
            entries: &texture_entries,
        });

        Self {
            frame_bgl,
            object_bgl,
            texture_bgl,
        }
    }
}

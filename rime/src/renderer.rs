use thiserror::Error;
use wgpu::{
    Adapter, AddressMode, CompareFunction, Device, DeviceDescriptor, Extent3d, Features, FilterMode, Instance, Limits,
    PowerPreference, Queue, RequestAdapterOptions, RequestDeviceError, Sampler, SamplerDescriptor, Surface,
    TextureDescriptor, TextureDimension, TextureFormat, TextureUsages, TextureView, TextureViewDescriptor,
};

use crate::ShaderInterfaces;

#[derive(Debug, Error)]
pub enum RendererInitializationError {
    #[error("No compatible graphics adapter was found")]
    MissingAdapter,
    #[error("Failed to acquire a device from the adapter")]
    RequestDevice(#[from] RequestDeviceError),
}

/// The GPU context everything else hangs off: device, queue, the shared
/// bind group layouts, samplers, and the null views that fill unused
/// texture slots.
pub struct Renderer {
    pub adapter: Adapter,
    pub device: Device,
    pub queue: Queue,
    pub interfaces: ShaderInterfaces,
    /// Black 1×1 view bound to color texture slots no mesh texture fills.
    pub null_color_view: TextureView,
    /// Zeroed 1×1 depth view bound when a mesh carries no shadow map.
    pub null_shadow_view: TextureView,
    pub color_sampler: Sampler,
    pub shadow_sampler: Sampler,
}

impl Renderer {
    /// Picks an adapter (compatible with `surface` when given) and builds
    /// the device-level shared state. Blocks on the async wgpu requests;
    /// adapter or device failure is unrecoverable for a renderer, so it
    /// surfaces as an error the caller is expected to abort on.
    pub fn new(
        instance: &Instance,
        compatible_surface: Option<&Surface<'_>>,
    ) -> Result<Self, RendererInitializationError> {
        profiling::scope!("Renderer::new");

        let adapter = pollster::block_on(instance.request_adapter(&RequestAdapterOptions {
            power_preference: PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface,
        }))
        .ok_or(RendererInitializationError::MissingAdapter)?;

        let info = adapter.get_info();
        log::info!("Using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &DeviceDescriptor {
                label: Some("rime device"),
                required_features: Features::empty(),
                required_limits: Limits::downlevel_defaults().using_resolution(adapter.limits()),
            },
            None,
        ))?;

        let interfaces = ShaderInterfaces::new(&device);

        let null_color_view = create_null_view(&device, TextureFormat::Rgba8UnormSrgb, "null color texture");
        let null_shadow_view = create_null_view(&device, TextureFormat::Depth32Float, "null shadow texture");

        let color_sampler = device.create_sampler(&SamplerDescriptor {
            label: Some("color sampler"),
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::Repeat,
            address_mode_w: AddressMode::Repeat,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mipmap_filter: FilterMode::Linear,
            ..SamplerDescriptor::default()
        });

        let shadow_sampler = device.create_sampler(&SamplerDescriptor {
            label: Some("shadow sampler"),
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            compare: Some(CompareFunction::LessEqual),
            ..SamplerDescriptor::default()
        });

        Ok(Self {
            adapter,
            device,
            queue,
            interfaces,
            null_color_view,
            null_shadow_view,
            color_sampler,
            shadow_sampler,
        })
    }
}

fn create_null_view(device: &Device, format: TextureFormat, label: &str) -> TextureView {
    // wgpu zero-initializes texture contents, so these read as black /
    // zero depth without an explicit clear.
    let texture = device.create_texture(&TextureDescriptor {
        label: Some(label),
        size: Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format,
        usage: TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    texture.create_view(&TextureViewDescriptor::default())
}

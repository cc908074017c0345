use std::{path::Path, sync::Arc};

use image::DynamicImage;
use thiserror::Error;
use wgpu::{
    Extent3d, ImageCopyTexture, ImageDataLayout, Origin3d, TextureAspect, TextureDescriptor, TextureDimension,
    TextureFormat, TextureUsages, TextureView, TextureViewDescriptor, TextureViewDimension,
};

use rime_types::TextureKind;

use crate::Renderer;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("Failed to read image file")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image data")]
    Decode(#[from] image::ImageError),
}

/// One GPU texture (2D or cubemap) plus the tag that drives its binding
/// name and an optional source path for diagnostics.
///
/// Resources are shared: every mesh referencing a texture holds an `Arc`,
/// and the GPU texture is released when the last owner drops. The shadow
/// map and skybox in particular are referenced by many meshes.
pub struct TextureResource {
    pub texture: wgpu::Texture,
    pub view: TextureView,
    pub kind: TextureKind,
    pub source: Option<String>,
}

impl TextureResource {
    /// Loads and decodes an image file. On any failure the error is
    /// logged and the blank placeholder is returned instead, so the scene
    /// renders visibly degraded rather than aborting.
    pub fn from_file(renderer: &Renderer, path: impl AsRef<Path>, kind: TextureKind) -> Arc<Self> {
        let path = path.as_ref();
        let source = path.display().to_string();

        match Self::try_from_file(renderer, path, kind) {
            Ok(texture) => Arc::new(texture),
            Err(error) => {
                log::error!("Failed to load texture {source}: {error}");
                Self::blank(renderer, kind)
            }
        }
    }

    fn try_from_file(renderer: &Renderer, path: &Path, kind: TextureKind) -> Result<Self, TextureError> {
        profiling::scope!("TextureResource::from_file");
        let bytes = std::fs::read(path)?;
        let decoded = image::load_from_memory(&bytes)?;
        Ok(Self::from_image(
            renderer,
            &decoded,
            kind,
            Some(path.display().to_string()),
        ))
    }

    /// Decodes an in-memory encoded image (an embedded asset blob).
    /// Falls back to the blank placeholder on decode failure.
    pub fn from_encoded(renderer: &Renderer, bytes: &[u8], kind: TextureKind, label: &str) -> Arc<Self> {
        match image::load_from_memory(bytes) {
            Ok(decoded) => Arc::new(Self::from_image(renderer, &decoded, kind, Some(label.to_owned()))),
            Err(error) => {
                log::error!("Failed to decode embedded texture {label}: {error}");
                Self::blank(renderer, kind)
            }
        }
    }

    /// Uploads a decoded image. Channel count picks the GPU format:
    /// one channel maps to `R8Unorm`, three channels are expanded to four
    /// (wgpu has no three-channel format), four map to `Rgba8UnormSrgb`.
    pub fn from_image(renderer: &Renderer, image: &DynamicImage, kind: TextureKind, source: Option<String>) -> Self {
        profiling::scope!("TextureResource::from_image");

        match image {
            DynamicImage::ImageLuma8(gray) => Self::upload_2d(
                renderer,
                gray.width(),
                gray.height(),
                gray.as_raw(),
                TextureFormat::R8Unorm,
                1,
                kind,
                source,
            ),
            other => {
                let rgba = other.to_rgba8();
                Self::upload_2d(
                    renderer,
                    rgba.width(),
                    rgba.height(),
                    rgba.as_raw(),
                    TextureFormat::Rgba8UnormSrgb,
                    4,
                    kind,
                    source,
                )
            }
        }
    }

    /// Uploads raw RGBA8 pixels.
    pub fn from_rgba(
        renderer: &Renderer,
        width: u32,
        height: u32,
        data: &[u8],
        kind: TextureKind,
        label: &str,
    ) -> Arc<Self> {
        Arc::new(Self::upload_2d(
            renderer,
            width,
            height,
            data,
            TextureFormat::Rgba8UnormSrgb,
            4,
            kind,
            Some(label.to_owned()),
        ))
    }

    /// The 1×1 white placeholder standing in for anything that failed to
    /// load.
    pub fn blank(renderer: &Renderer, kind: TextureKind) -> Arc<Self> {
        Arc::new(Self::upload_2d(
            renderer,
            1,
            1,
            &[255, 255, 255, 255],
            TextureFormat::Rgba8UnormSrgb,
            4,
            kind,
            None,
        ))
    }

    /// A square depth texture the shadow pass renders into and the color
    /// pass samples through a comparison sampler.
    pub fn shadow_target(renderer: &Renderer, resolution: u32) -> Arc<Self> {
        profiling::scope!("TextureResource::shadow_target");

        let texture = renderer.device.create_texture(&TextureDescriptor {
            label: Some("shadow map"),
            size: Extent3d {
                width: resolution,
                height: resolution,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TextureFormat::Depth32Float,
            usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&TextureViewDescriptor::default());

        Arc::new(Self {
            texture,
            view,
            kind: TextureKind::Shadow,
            source: None,
        })
    }

    /// An offscreen color target for alpha/compositing passes.
    pub fn alpha_target(renderer: &Renderer, width: u32, height: u32) -> Arc<Self> {
        let texture = renderer.device.create_texture(&TextureDescriptor {
            label: Some("alpha target"),
            size: Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TextureFormat::Rgba8UnormSrgb,
            usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&TextureViewDescriptor::default());

        Arc::new(Self {
            texture,
            view,
            kind: TextureKind::Alpha,
            source: None,
        })
    }

    /// Decodes six face images (+X, -X, +Y, -Y, +Z, -Z) into a cubemap.
    /// Any decode failure or face-size mismatch degrades to a 1×1 black
    /// cube with a logged error.
    pub fn cube_from_encoded(renderer: &Renderer, faces: &[Vec<u8>; 6], label: &str) -> Arc<Self> {
        profiling::scope!("TextureResource::cube_from_encoded");

        let mut decoded = Vec::with_capacity(6);
        for (index, bytes) in faces.iter().enumerate() {
            match image::load_from_memory(bytes) {
                Ok(face) => decoded.push(face.to_rgba8()),
                Err(error) => {
                    log::error!("Failed to decode cubemap {label} face {index}: {error}");
                    return Self::blank_cube(renderer, label);
                }
            }
        }

        let (width, height) = (decoded[0].width(), decoded[0].height());
        if decoded.iter().any(|face| face.width() != width || face.height() != height) {
            log::error!("Cubemap {label} has mismatched face sizes");
            return Self::blank_cube(renderer, label);
        }

        let texture = renderer.device.create_texture(&TextureDescriptor {
            label: Some(label),
            size: Extent3d {
                width,
                height,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TextureFormat::Rgba8UnormSrgb,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (layer, face) in decoded.iter().enumerate() {
            renderer.queue.write_texture(
                ImageCopyTexture {
                    texture: &texture,
                    mip_level: 0,
                    origin: Origin3d {
                        x: 0,
                        y: 0,
                        z: layer as u32,
                    },
                    aspect: TextureAspect::All,
                },
                face.as_raw(),
                ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * width),
                    rows_per_image: None,
                },
                Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&TextureViewDescriptor {
            dimension: Some(TextureViewDimension::Cube),
            ..TextureViewDescriptor::default()
        });

        Arc::new(Self {
            texture,
            view,
            kind: TextureKind::Unknown,
            source: Some(label.to_owned()),
        })
    }

    fn blank_cube(renderer: &Renderer, label: &str) -> Arc<Self> {
        let texture = renderer.device.create_texture(&TextureDescriptor {
            label: Some(label),
            size: Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TextureFormat::Rgba8UnormSrgb,
            usage: TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&TextureViewDescriptor {
            dimension: Some(TextureViewDimension::Cube),
            ..TextureViewDescriptor::default()
        });
        Arc::new(Self {
            texture,
            view,
            kind: TextureKind::Unknown,
            source: Some(label.to_owned()),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn upload_2d(
        renderer: &Renderer,
        width: u32,
        height: u32,
        data: &[u8],
        format: TextureFormat,
        bytes_per_pixel: u32,
        kind: TextureKind,
        source: Option<String>,
    ) -> Self {
        let size = Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = renderer.device.create_texture(&TextureDescriptor {
            label: source.as_deref(),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });

        renderer.queue.write_texture(
            ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: Origin3d::ZERO,
                aspect: TextureAspect::All,
            },
            data,
            ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_pixel * width),
                rows_per_image: None,
            },
            size,
        );

        let view = texture.create_view(&TextureViewDescriptor::default());

        Self {
            texture,
            view,
            kind,
            source,
        }
    }
}

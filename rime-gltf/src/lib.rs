//! glTF model loader for the rime rendering demo.
//!
//! Produces one [`Mesh`] per glTF primitive, carrying positions, normals,
//! every UV layer the primitive provides, and the material's diffuse and
//! specular textures. Textures are deduplicated per load: all meshes of a
//! model that reference the same source image share one
//! [`TextureResource`].
//!
//! Decode failures degrade rather than abort: a bad image becomes the
//! blank placeholder, a bad primitive is skipped, and a model that fails
//! to parse surfaces as [`GltfLoadError`] (or an empty model through
//! [`load_model_or_empty`]).

use std::{path::Path, sync::Arc};

use gltf::image::Format;
use image::DynamicImage;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use thiserror::Error;

use rime::{Mesh, Model, Renderer, TextureResource};
use rime_types::{
    glam::{Vec2, Vec3},
    MeshData, MeshValidationError, TextureKind, Vertex,
};

#[derive(Debug, Error)]
pub enum GltfLoadError {
    #[error("Failed to import glTF file {path}")]
    Import {
        path: String,
        #[source]
        inner: gltf::Error,
    },
    #[error("Loaded mesh failed validation")]
    InvalidMesh(#[from] MeshValidationError),
}

/// Per-load texture cache: one GPU texture per (source image, kind) pair,
/// shared by every mesh of the model.
type TextureCache = FxHashMap<(usize, TextureKind), Arc<TextureResource>>;

/// Loads a glTF/GLB file into a [`Model`].
///
/// Primitives are imported flat; node transforms are left to the model's
/// own [`Transform`](rime_types::Transform), which the scene driver sets.
pub fn load_model(renderer: &Renderer, path: impl AsRef<Path>) -> Result<Model, GltfLoadError> {
    profiling::scope!("rime_gltf::load_model");

    let path = path.as_ref();
    let (document, buffers, images) = gltf::import(path).map_err(|inner| GltfLoadError::Import {
        path: path.display().to_string(),
        inner,
    })?;

    let mut cache = TextureCache::default();
    let mut meshes = Vec::new();

    for gltf_mesh in document.meshes() {
        for primitive in gltf_mesh.primitives() {
            let Some(data) = read_primitive(&primitive, &buffers) else {
                log::warn!(
                    "Skipping primitive of mesh {:?} in {}: no vertex positions",
                    gltf_mesh.name(),
                    path.display()
                );
                continue;
            };

            let textures = load_material_textures(renderer, &primitive.material(), &images, &mut cache);
            meshes.push(Mesh::with_textures(data, textures)?);
        }
    }

    if meshes.is_empty() {
        log::warn!("Model {} contained no drawable primitives", path.display());
    }

    Ok(Model::from_source(meshes, path.to_owned()))
}

/// Like [`load_model`], but logs failures and returns an empty model so
/// the scene keeps rendering without the asset.
pub fn load_model_or_empty(renderer: &Renderer, path: impl AsRef<Path>) -> Model {
    let path = path.as_ref();
    match load_model(renderer, path) {
        Ok(model) => model,
        Err(error) => {
            log::error!("Failed to load model {}: {error}", path.display());
            Model::from_source(Vec::new(), path.to_owned())
        }
    }
}

fn read_primitive(primitive: &gltf::Primitive<'_>, buffers: &[gltf::buffer::Data]) -> Option<MeshData> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));

    let positions: Vec<Vec3> = reader.read_positions()?.map(Vec3::from).collect();

    let normals: Vec<Vec3> = match reader.read_normals() {
        Some(normals) => normals.map(Vec3::from).collect(),
        None => {
            log::warn!("Primitive has no normals; lighting will be flat");
            vec![Vec3::Y; positions.len()]
        }
    };

    let mut layers: Vec<Vec<Vec2>> = Vec::new();
    while let Some(coords) = reader.read_tex_coords(layers.len() as u32) {
        layers.push(coords.into_f32().map(Vec2::from).collect());
    }

    let indices = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let vertices = positions
        .into_iter()
        .enumerate()
        .map(|(i, position)| {
            let tex_coords: SmallVec<[Vec2; 2]> = layers
                .iter()
                .filter_map(|layer| layer.get(i).copied())
                .collect();
            Vertex {
                position,
                normal: normals.get(i).copied().unwrap_or(Vec3::Y),
                tex_coords,
            }
        })
        .collect();

    Some(MeshData::new(vertices, indices))
}

fn load_material_textures(
    renderer: &Renderer,
    material: &gltf::Material<'_>,
    images: &[gltf::image::Data],
    cache: &mut TextureCache,
) -> Vec<Arc<TextureResource>> {
    let mut textures = Vec::new();
    let pbr = material.pbr_metallic_roughness();

    if let Some(info) = pbr.base_color_texture() {
        textures.push(load_texture(renderer, &info.texture(), TextureKind::Diffuse, images, cache));
    }
    // Blinn-Phong has no metalness; the metallic-roughness map stands in
    // as the specular intensity source.
    if let Some(info) = pbr.metallic_roughness_texture() {
        textures.push(load_texture(renderer, &info.texture(), TextureKind::Specular, images, cache));
    }

    textures
}

fn load_texture(
    renderer: &Renderer,
    texture: &gltf::Texture<'_>,
    kind: TextureKind,
    images: &[gltf::image::Data],
    cache: &mut TextureCache,
) -> Arc<TextureResource> {
    let image_index = texture.source().index();

    if let Some(cached) = cache.get(&(image_index, kind)) {
        return Arc::clone(cached);
    }

    let label = match texture.source().source() {
        gltf::image::Source::Uri { uri, .. } => uri.to_owned(),
        gltf::image::Source::View { .. } => format!("embedded image {image_index}"),
    };

    let resource = match images.get(image_index) {
        Some(data) => match decode_pixels(data.format, data.width, data.height, &data.pixels) {
            Some(decoded) => Arc::new(TextureResource::from_image(renderer, &decoded, kind, Some(label))),
            None => {
                log::error!("Texture {label} has unsupported pixel format {:?}", data.format);
                TextureResource::blank(renderer, kind)
            }
        },
        None => {
            log::error!("Texture {label} references a missing image");
            TextureResource::blank(renderer, kind)
        }
    };

    cache.insert((image_index, kind), Arc::clone(&resource));
    resource
}

/// Reassembles glTF's raw pixel data into a decoded image. Returns `None`
/// for formats the renderer does not upload (16- and 32-bit channels).
fn decode_pixels(format: Format, width: u32, height: u32, pixels: &[u8]) -> Option<DynamicImage> {
    match format {
        Format::R8 => image::GrayImage::from_raw(width, height, pixels.to_vec()).map(DynamicImage::ImageLuma8),
        Format::R8G8 => {
            image::GrayAlphaImage::from_raw(width, height, pixels.to_vec()).map(DynamicImage::ImageLumaA8)
        }
        Format::R8G8B8 => image::RgbImage::from_raw(width, height, pixels.to_vec()).map(DynamicImage::ImageRgb8),
        Format::R8G8B8A8 => image::RgbaImage::from_raw(width, height, pixels.to_vec()).map(DynamicImage::ImageRgba8),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use gltf::image::Format;

    use super::decode_pixels;

    #[test]
    fn rgb_pixels_decode_with_matching_dimensions() {
        let pixels = vec![0u8; 2 * 2 * 3];
        let decoded = decode_pixels(Format::R8G8B8, 2, 2, &pixels).unwrap();
        assert_eq!(decoded.to_rgba8().dimensions(), (2, 2));
    }

    #[test]
    fn truncated_pixel_data_is_rejected() {
        let pixels = vec![0u8; 5];
        assert!(decode_pixels(Format::R8G8B8A8, 2, 2, &pixels).is_none());
    }

    #[test]
    fn wide_channel_formats_are_unsupported() {
        let pixels = vec![0u8; 2 * 2 * 8];
        assert!(decode_pixels(Format::R16G16B16A16, 2, 2, &pixels).is_none());
    }
}

//! Type declarations for the rime rendering demo.
//!
//! This is reexported in the rime crate proper and contains all the plain
//! data the renderer operates on: vertices and mesh data with their packed
//! GPU form, transforms, cameras, and lights.

use bytemuck::cast_slice;
use glam::{Vec2, Vec3};
use smallvec::SmallVec;
use thiserror::Error;

mod camera;
mod light;
mod transform;

pub use camera::*;
pub use light::*;
pub use transform::*;

/// Reexport of the glam version rime is using.
pub use glam;

/// The maximum amount of vertices any one mesh can have.
pub const MAX_VERTEX_COUNT: u32 = (1 << 24) - 1;
/// The maximum amount of indices any one mesh can have.
pub const MAX_INDEX_COUNT: u32 = u32::MAX;
/// The maximum amount of texture coordinate layers a vertex can carry.
///
/// Layers occupy shader locations [`VERTEX_LOCATION_TEXCOORD_BASE`]`..16`,
/// so eight is a hard limit of the vertex interface, not a tunable.
pub const MAX_TEXCOORD_LAYERS: usize = 8;

/// Shader location of the position attribute.
pub const VERTEX_LOCATION_POSITION: u32 = 0;
/// Shader location of the normal attribute.
pub const VERTEX_LOCATION_NORMAL: u32 = 1;
/// Shader location of texture coordinate layer 0. Layer N sits at base + N.
pub const VERTEX_LOCATION_TEXCOORD_BASE: u32 = 8;

/// A single vertex with a variable count of texture coordinate layers.
///
/// Asset importers may hand a mesh vertices whose layer counts disagree;
/// [`MeshData::pack`] normalizes them to the mesh-wide maximum before the
/// data ever reaches a GPU buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coords: SmallVec<[Vec2; 2]>,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position,
            normal,
            tex_coords: SmallVec::new(),
        }
    }

    pub fn with_uv(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            normal,
            tex_coords: smallvec::smallvec![uv],
        }
    }
}

/// Error returned from mesh validation.
#[derive(Debug, Error)]
pub enum MeshValidationError {
    #[error("Mesh has {count} vertices when the vertex limit is {MAX_VERTEX_COUNT}")]
    ExceededMaxVertexCount { count: usize },
    #[error("Mesh has {count} indices when maximum index count is {MAX_INDEX_COUNT}")]
    ExceededMaxIndexCount { count: usize },
    #[error("Mesh has {count} indices which is not a multiple of three. Meshes are always composed of triangles")]
    IndexCountNotMultipleOfThree { count: usize },
    #[error("Index at position {index} has the value {value} which is out of bounds for vertex buffers of {max} length")]
    IndexOutOfBounds { index: usize, value: u32, max: u32 },
    #[error("Vertex {vertex} carries {layers} texture coordinate layers when the limit is {MAX_TEXCOORD_LAYERS}")]
    ExceededMaxTexcoordLayers { vertex: usize, layers: usize },
}

/// CPU-side geometry: a vertex list and a triangle index list.
///
/// This is the mesh as importers and scene code see it. The GPU form is
/// produced by [`MeshData::pack`], which fixes the per-vertex stride.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Validates index bounds, triangle-list shape, and size limits.
    pub fn validate(&self) -> Result<(), MeshValidationError> {
        let vertex_count = self.vertices.len();
        let index_count = self.indices.len();

        if vertex_count > MAX_VERTEX_COUNT as usize {
            return Err(MeshValidationError::ExceededMaxVertexCount { count: vertex_count });
        }

        if index_count >= MAX_INDEX_COUNT as usize {
            return Err(MeshValidationError::ExceededMaxIndexCount { count: index_count });
        }

        if index_count % 3 != 0 {
            return Err(MeshValidationError::IndexCountNotMultipleOfThree { count: index_count });
        }

        for (index, &value) in self.indices.iter().enumerate() {
            if value as usize >= vertex_count {
                return Err(MeshValidationError::IndexOutOfBounds {
                    index,
                    value,
                    max: vertex_count as u32,
                });
            }
        }

        for (vertex, v) in self.vertices.iter().enumerate() {
            if v.tex_coords.len() > MAX_TEXCOORD_LAYERS {
                return Err(MeshValidationError::ExceededMaxTexcoordLayers {
                    vertex,
                    layers: v.tex_coords.len(),
                });
            }
        }

        Ok(())
    }

    /// The mesh-wide texture coordinate layer count: the maximum over all
    /// vertices.
    pub fn texcoord_layers(&self) -> usize {
        self.vertices.iter().map(|v| v.tex_coords.len()).max().unwrap_or(0)
    }

    /// Normalizes every vertex to the mesh-wide layer count and packs the
    /// vertices into a single fixed-stride byte buffer.
    ///
    /// Vertices short of the maximum layer count are padded in place with
    /// `(0, 0)` coordinates. The packed record is position (12 bytes),
    /// normal (12 bytes), then `layer_count` two-float coordinate pairs,
    /// contiguous with no trailing padding.
    pub fn pack(&mut self) -> PackedVertexData {
        let layer_count = self.texcoord_layers();

        for vertex in &mut self.vertices {
            while vertex.tex_coords.len() < layer_count {
                vertex.tex_coords.push(Vec2::ZERO);
            }
        }

        let stride = vertex_stride(layer_count);
        let mut bytes = Vec::with_capacity(self.vertices.len() * stride as usize);
        for vertex in &self.vertices {
            bytes.extend_from_slice(cast_slice(&[vertex.position]));
            bytes.extend_from_slice(cast_slice(&[vertex.normal]));
            bytes.extend_from_slice(cast_slice(&vertex.tex_coords));
        }

        PackedVertexData {
            bytes,
            stride,
            layer_count: layer_count as u32,
            vertex_count: self.vertices.len() as u32,
        }
    }
}

/// Byte stride of one packed vertex with the given layer count.
pub const fn vertex_stride(layer_count: usize) -> u64 {
    12 + 12 + 8 * layer_count as u64
}

/// Byte offset of texture coordinate layer `layer` within a packed vertex.
pub const fn texcoord_offset(layer: usize) -> u64 {
    24 + 8 * layer as u64
}

/// The GPU-uploadable form of a mesh's vertices.
///
/// Produced once per mesh by [`MeshData::pack`]; the stride and offsets
/// here are what vertex buffer layouts are built from.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedVertexData {
    pub bytes: Vec<u8>,
    pub stride: u64,
    pub layer_count: u32,
    pub vertex_count: u32,
}

/// What a texture is used as. Determines the name the texture is bound
/// under in shaders: each kind keeps an independent counter, so a mesh's
/// textures surface as `texture_diffuse0`, `texture_diffuse1`,
/// `texture_specular0`, `texture_shadow0`, ...
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Diffuse,
    Specular,
    Shadow,
    Alpha,
    Unknown,
}

impl TextureKind {
    pub fn name(self) -> &'static str {
        match self {
            TextureKind::Diffuse => "diffuse",
            TextureKind::Specular => "specular",
            TextureKind::Shadow => "shadow",
            TextureKind::Alpha => "alpha",
            TextureKind::Unknown => "unknown",
        }
    }
}

/// A flat `[-1, 1]²` plane in the XZ plane, facing +Y, with one UV layer.
pub fn plane() -> MeshData {
    MeshData {
        vertices: vec![
            Vertex::with_uv(Vec3::new(-1.0, 0.0, -1.0), Vec3::Y, Vec2::new(0.0, 1.0)),
            Vertex::with_uv(Vec3::new(-1.0, 0.0, 1.0), Vec3::Y, Vec2::new(0.0, 0.0)),
            Vertex::with_uv(Vec3::new(1.0, 0.0, 1.0), Vec3::Y, Vec2::new(1.0, 0.0)),
            Vertex::with_uv(Vec3::new(1.0, 0.0, -1.0), Vec3::Y, Vec2::new(1.0, 1.0)),
        ],
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

/// A `[-1, 1]²` quad in the XY plane for screen-space draws.
pub fn fullscreen_quad() -> MeshData {
    MeshData {
        vertices: vec![
            Vertex::with_uv(Vec3::new(-1.0, -1.0, 0.0), Vec3::Z, Vec2::new(0.0, 0.0)),
            Vertex::with_uv(Vec3::new(1.0, -1.0, 0.0), Vec3::Z, Vec2::new(1.0, 0.0)),
            Vertex::with_uv(Vec3::new(-1.0, 1.0, 0.0), Vec3::Z, Vec2::new(0.0, 1.0)),
            Vertex::with_uv(Vec3::new(1.0, 1.0, 0.0), Vec3::Z, Vec2::new(1.0, 1.0)),
        ],
        indices: vec![0, 1, 2, 2, 1, 3],
    }
}

/// A unit cube centered on the origin with per-face normals and UVs.
pub fn cube() -> MeshData {
    // (face normal, face tangent u, face tangent v)
    const FACES: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (face, &(normal, u, v)) in FACES.iter().enumerate() {
        let base = (face * 4) as u32;
        let center = normal * 0.5;
        for (du, dv, uv) in [
            (-0.5, -0.5, Vec2::new(0.0, 0.0)),
            (0.5, -0.5, Vec2::new(1.0, 0.0)),
            (0.5, 0.5, Vec2::new(1.0, 1.0)),
            (-0.5, 0.5, Vec2::new(0.0, 1.0)),
        ] {
            vertices.push(Vertex::with_uv(center + u * du + v * dv, normal, uv));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshData { vertices, indices }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};
    use smallvec::smallvec;

    use super::{cube, plane, MeshData, MeshValidationError, Vertex};

    fn mixed_layer_mesh() -> MeshData {
        MeshData {
            vertices: vec![
                Vertex {
                    position: Vec3::ZERO,
                    normal: Vec3::Y,
                    tex_coords: smallvec![Vec2::new(0.25, 0.75)],
                },
                Vertex {
                    position: Vec3::X,
                    normal: Vec3::Y,
                    tex_coords: smallvec![Vec2::ONE, Vec2::new(0.5, 0.5), Vec2::new(0.125, 0.875)],
                },
                Vertex::new(Vec3::Z, Vec3::Y),
            ],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn pack_normalizes_layers_to_mesh_maximum() {
        let mut mesh = mixed_layer_mesh();
        let packed = mesh.pack();

        assert_eq!(packed.layer_count, 3);
        for vertex in &mesh.vertices {
            assert_eq!(vertex.tex_coords.len(), 3);
        }
        // Padded layers are exactly (0, 0).
        assert_eq!(mesh.vertices[0].tex_coords[1], Vec2::ZERO);
        assert_eq!(mesh.vertices[0].tex_coords[2], Vec2::ZERO);
        assert_eq!(mesh.vertices[2].tex_coords.as_slice(), &[Vec2::ZERO; 3]);
        // Original data survives.
        assert_eq!(mesh.vertices[0].tex_coords[0], Vec2::new(0.25, 0.75));
        assert_eq!(mesh.vertices[1].tex_coords[2], Vec2::new(0.125, 0.875));
    }

    #[test]
    fn pack_uses_fixed_stride_with_no_padding() {
        let mut mesh = mixed_layer_mesh();
        let packed = mesh.pack();

        assert_eq!(packed.stride, 12 + 12 + 8 * 3);
        assert_eq!(packed.bytes.len() as u64, packed.stride * 3);
        assert_eq!(packed.vertex_count, 3);

        // Vertex 1's position sits exactly one stride in.
        let offset = packed.stride as usize;
        let x = f32::from_le_bytes(packed.bytes[offset..offset + 4].try_into().unwrap());
        assert_eq!(x, 1.0);
    }

    #[test]
    fn pack_without_texcoords_is_position_normal_only() {
        let mut mesh = MeshData {
            vertices: vec![Vertex::new(Vec3::ZERO, Vec3::Y); 3],
            indices: vec![0, 1, 2],
        };
        let packed = mesh.pack();
        assert_eq!(packed.layer_count, 0);
        assert_eq!(packed.stride, 24);
    }

    #[test]
    fn validate_rejects_out_of_bounds_indices() {
        let mesh = MeshData {
            vertices: vec![Vertex::new(Vec3::ZERO, Vec3::Y); 3],
            indices: vec![0, 1, 3],
        };
        assert!(matches!(
            mesh.validate(),
            Err(MeshValidationError::IndexOutOfBounds { index: 2, value: 3, max: 3 })
        ));
    }

    #[test]
    fn validate_rejects_partial_triangles() {
        let mesh = MeshData {
            vertices: vec![Vertex::new(Vec3::ZERO, Vec3::Y); 4],
            indices: vec![0, 1, 2, 3],
        };
        assert!(matches!(
            mesh.validate(),
            Err(MeshValidationError::IndexCountNotMultipleOfThree { count: 4 })
        ));
    }

    #[test]
    fn builtin_shapes_validate() {
        assert!(plane().validate().is_ok());
        assert!(cube().validate().is_ok());
        assert_eq!(cube().indices.len(), 36);
    }
}

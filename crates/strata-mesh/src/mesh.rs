//! Mesh output containers: flat attribute arrays per tileset, plus an
//! interleaved vertex view for direct GPU upload.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use rustc_hash::FxHashMap;

/// One interleaved vertex, laid out for direct buffer upload.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    /// Position relative to the chunk origin.
    pub position: [f32; 3],
    /// Unit face normal.
    pub normal: [f32; 3],
    /// Atlas texture coordinates.
    pub uv: [f32; 2],
}

/// Triangle geometry sharing one tileset texture.
///
/// Attributes are stored as parallel flat arrays; [`interleaved`]
/// (MeshBatch::interleaved) produces the packed form when a renderer wants a
/// single vertex buffer.
#[derive(Clone, Debug, Default)]
pub struct MeshBatch {
    /// Vertex positions relative to the chunk origin.
    pub positions: Vec<[f32; 3]>,
    /// Per-vertex unit normals.
    pub normals: Vec<[f32; 3]>,
    /// Per-vertex atlas texture coordinates.
    pub uvs: Vec<[f32; 2]>,
    /// Triangle indices into the attribute arrays.
    pub indices: Vec<u32>,
}

impl MeshBatch {
    /// Appends one face's geometry, offsetting its indices past the vertices
    /// already present.
    pub fn push_face(
        &mut self,
        positions: &[Vec3],
        normal: Vec3,
        uvs: &[Vec2],
        indices: &[u32],
    ) {
        debug_assert_eq!(positions.len(), uvs.len());
        let base = self.positions.len() as u32;
        for (position, uv) in positions.iter().zip(uvs) {
            self.positions.push(position.to_array());
            self.normals.push(normal.to_array());
            self.uvs.push(uv.to_array());
        }
        self.indices.extend(indices.iter().map(|i| base + i));
    }

    /// Number of vertices in this batch.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles in this batch.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns `true` if the batch holds no geometry.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Packs the flat attribute arrays into interleaved vertices.
    pub fn interleaved(&self) -> Vec<MeshVertex> {
        self.positions
            .iter()
            .zip(&self.normals)
            .zip(&self.uvs)
            .map(|((&position, &normal), &uv)| MeshVertex {
                position,
                normal,
                uv,
            })
            .collect()
    }
}

/// The rebuilt mesh of one chunk: one batch per tileset that contributed
/// geometry. An empty map means the chunk renders nothing.
#[derive(Clone, Debug, Default)]
pub struct ChunkMesh {
    /// Batches keyed by tileset id.
    pub batches: FxHashMap<String, MeshBatch>,
}

impl ChunkMesh {
    /// The batch for a tileset, created on first use.
    pub fn batch_mut(&mut self, tileset: &str) -> &mut MeshBatch {
        if !self.batches.contains_key(tileset) {
            self.batches.insert(tileset.to_string(), MeshBatch::default());
        }
        self.batches.get_mut(tileset).unwrap()
    }

    /// Total vertices across all batches.
    pub fn vertex_count(&self) -> usize {
        self.batches.values().map(MeshBatch::vertex_count).sum()
    }

    /// Total triangles across all batches.
    pub fn triangle_count(&self) -> usize {
        self.batches.values().map(MeshBatch::triangle_count).sum()
    }

    /// Returns `true` if no batch holds geometry.
    pub fn is_empty(&self) -> bool {
        self.batches.values().all(MeshBatch::is_empty)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_face_offsets_indices() {
        let mut batch = MeshBatch::default();
        let quad = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let uvs = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        batch.push_face(&quad, Vec3::Z, &uvs, &[0, 1, 2, 0, 2, 3]);
        batch.push_face(&quad, Vec3::Z, &uvs, &[0, 1, 2, 0, 2, 3]);

        assert_eq!(batch.vertex_count(), 8);
        assert_eq!(batch.triangle_count(), 4);
        assert_eq!(&batch.indices[6..], &[4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn test_interleaved_preserves_order() {
        let mut batch = MeshBatch::default();
        batch.push_face(
            &[Vec3::X, Vec3::Y, Vec3::Z],
            Vec3::Y,
            &[Vec2::ZERO, Vec2::X, Vec2::Y],
            &[0, 1, 2],
        );

        let vertices = batch.interleaved();
        assert_eq!(vertices.len(), 3);
        assert_eq!(vertices[0].position, [1.0, 0.0, 0.0]);
        assert_eq!(vertices[0].normal, [0.0, 1.0, 0.0]);
        assert_eq!(vertices[2].uv, [0.0, 1.0]);
        // Pod layout: 8 floats per vertex.
        assert_eq!(std::mem::size_of::<MeshVertex>(), 32);
    }

    #[test]
    fn test_chunk_mesh_batches_by_tileset() {
        let mut mesh = ChunkMesh::default();
        mesh.batch_mut("terrain").push_face(
            &[Vec3::ZERO, Vec3::X, Vec3::Y],
            Vec3::Z,
            &[Vec2::ZERO, Vec2::X, Vec2::Y],
            &[0, 1, 2],
        );
        mesh.batch_mut("props");

        assert_eq!(mesh.batches.len(), 2);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(!mesh.is_empty());
        assert!(ChunkMesh::default().is_empty());
    }
}

//! Chunk mesh construction: turns chunk voxel data into per-tileset triangle
//! batches, culling faces hidden by occluding neighbors (including neighbors
//! in other layers and other chunks) and applying per-voxel rotation and
//! mirror transforms to the shape geometry.

pub mod builder;
pub mod mesh;

pub use builder::{
    CollisionMesh, MeshError, MeshUpdate, build_chunk_collision_mesh, build_chunk_mesh,
    inverse_transform_dir, rebuild_dirty, transform_dir, transform_point,
};
pub use mesh::{ChunkMesh, MeshBatch, MeshVertex};

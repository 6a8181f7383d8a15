//! Sparse voxel storage: chunks with dirty tracking, named compositing layers,
//! and the layer-composited world with mutation events.

pub mod chunk;
pub mod coords;
pub mod events;
pub mod layer;
pub mod transform;
pub mod world;

pub use chunk::{Chunk, DEFAULT_CHUNK_SIZE, from_linear_index, linear_index};
pub use coords::{ChunkCoord, VoxelCoord};
pub use events::{WorldEvent, WorldEventBuffer};
pub use layer::Layer;
pub use transform::{BlockId, VoxelEntry, VoxelTransform};
pub use world::{World, WorldError};

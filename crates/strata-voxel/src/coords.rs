//! Integer voxel and chunk coordinates with floor-division routing.

use serde::{Deserialize, Serialize};

/// A voxel position in integer voxel units. No fractional values.
///
/// Depending on context this is either world-space or layer-local
/// (world = layer-local + the layer's offset).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoxelCoord {
    /// X component.
    pub x: i32,
    /// Y component.
    pub y: i32,
    /// Z component.
    pub z: i32,
}

impl VoxelCoord {
    /// Creates a new coordinate.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Component-wise addition.
    pub const fn offset(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }

    /// Component-wise subtraction.
    pub const fn minus(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

/// Identifies a chunk's position on the chunk grid within one layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    /// Chunk-grid X coordinate.
    pub x: i32,
    /// Chunk-grid Y coordinate.
    pub y: i32,
    /// Chunk-grid Z coordinate.
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the chunk containing the given voxel coordinate.
    ///
    /// Uses floor division so negative voxel coordinates route to the
    /// correct chunk (e.g. voxel −1 lives in chunk −1, not chunk 0).
    pub fn containing(voxel: VoxelCoord, chunk_size: u32) -> Self {
        let s = chunk_size as i32;
        Self {
            x: voxel.x.div_euclid(s),
            y: voxel.y.div_euclid(s),
            z: voxel.z.div_euclid(s),
        }
    }

    /// Returns the voxel coordinate of this chunk's minimum corner.
    pub fn origin(self, chunk_size: u32) -> VoxelCoord {
        let s = chunk_size as i32;
        VoxelCoord::new(self.x * s, self.y * s, self.z * s)
    }
}

/// Converts a voxel coordinate to its local position within its chunk.
///
/// Each returned component is in `[0, chunk_size)`.
pub fn local_in_chunk(voxel: VoxelCoord, chunk_size: u32) -> (u32, u32, u32) {
    let s = chunk_size as i32;
    (
        voxel.x.rem_euclid(s) as u32,
        voxel.y.rem_euclid(s) as u32,
        voxel.z.rem_euclid(s) as u32,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

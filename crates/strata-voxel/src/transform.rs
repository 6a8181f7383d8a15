//! Block identifiers and the packed per-voxel orientation byte.
//!
//! The transform byte packs a Y-axis rotation (0–3 steps of 90°) and three
//! mirror flags into a single `u8`, keeping per-voxel memory at three bytes
//! total and making entry equality/hashing cheap.

use serde::{Deserialize, Serialize};

/// Numeric block identifier stored inside every voxel entry.
///
/// Id 0 is reserved for air and is never stored in a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub u16);

impl BlockId {
    /// The reserved air id.
    pub const AIR: Self = Self(0);

    /// Returns `true` if this is the reserved air id.
    pub fn is_air(self) -> bool {
        self.0 == 0
    }
}

/// Packed per-voxel orientation.
///
/// Bit layout: bits 0–1 Y-rotation steps (0–3, each 90°), bit 2 flip-X,
/// bit 3 flip-Z, bit 4 flip-Y (mirror about the horizontal mid-plane).
/// The upper three bits are unused and preserved as zero by the encoders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoxelTransform(pub u8);

const ROTATION_MASK: u8 = 0b0000_0011;
const FLIP_X_BIT: u8 = 0b0000_0100;
const FLIP_Z_BIT: u8 = 0b0000_1000;
const FLIP_Y_BIT: u8 = 0b0001_0000;

impl VoxelTransform {
    /// The identity transform (no rotation, no mirroring).
    pub const IDENTITY: Self = Self(0);

    /// Encodes a transform from its components. Rotation is taken modulo 4.
    pub fn encode(rotation: u8, flip_x: bool, flip_z: bool, flip_y: bool) -> Self {
        let mut bits = rotation % 4;
        if flip_x {
            bits |= FLIP_X_BIT;
        }
        if flip_z {
            bits |= FLIP_Z_BIT;
        }
        if flip_y {
            bits |= FLIP_Y_BIT;
        }
        Self(bits)
    }

    /// Y-axis rotation in 90° steps (0–3).
    pub fn rotation(self) -> u8 {
        self.0 & ROTATION_MASK
    }

    /// Mirror about the X mid-plane.
    pub fn flip_x(self) -> bool {
        self.0 & FLIP_X_BIT != 0
    }

    /// Mirror about the Z mid-plane.
    pub fn flip_z(self) -> bool {
        self.0 & FLIP_Z_BIT != 0
    }

    /// Mirror about the horizontal (Y) mid-plane.
    pub fn flip_y(self) -> bool {
        self.0 & FLIP_Y_BIT != 0
    }

    /// Returns a copy with the rotation replaced (taken modulo 4).
    pub fn with_rotation(self, rotation: u8) -> Self {
        Self((self.0 & !ROTATION_MASK) | (rotation % 4))
    }
}

/// One placed voxel: a non-air block id plus its orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoxelEntry {
    /// The block this voxel is an instance of. Never [`BlockId::AIR`].
    pub block: BlockId,
    /// Packed orientation.
    pub transform: VoxelTransform,
}

impl VoxelEntry {
    /// Creates an entry with the identity transform.
    pub fn new(block: BlockId) -> Self {
        Self {
            block,
            transform: VoxelTransform::IDENTITY,
        }
    }

    /// Creates an entry with an explicit transform.
    pub fn with_transform(block: BlockId, transform: VoxelTransform) -> Self {
        Self { block, transform }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

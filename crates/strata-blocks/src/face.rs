//! The six axis-aligned face directions and their symmetry mappings.
//!
//! Rotation and mirror mappings here must agree with the vertex transforms
//! applied by the mesh builder: one Y-rotation step carries a point
//! `(x, y, z)` to `(z, y, 1 − x)` about the cell center, so the `+X` normal
//! lands on `−Z`.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use strata_voxel::VoxelCoord;

/// One of the six axis-aligned directions a block face can point.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FaceDirection {
    /// Toward `+X`.
    PosX,
    /// Toward `−X`.
    NegX,
    /// Toward `+Y` (up).
    PosY,
    /// Toward `−Y` (down).
    NegY,
    /// Toward `+Z`.
    PosZ,
    /// Toward `−Z`.
    NegZ,
}

/// All six directions, in [`FaceDirection::index`] order.
pub const ALL_DIRECTIONS: [FaceDirection; 6] = [
    FaceDirection::PosX,
    FaceDirection::NegX,
    FaceDirection::PosY,
    FaceDirection::NegY,
    FaceDirection::PosZ,
    FaceDirection::NegZ,
];

impl FaceDirection {
    /// Stable index in `0..6`, for per-direction tables.
    pub fn index(self) -> usize {
        match self {
            Self::PosX => 0,
            Self::NegX => 1,
            Self::PosY => 2,
            Self::NegY => 3,
            Self::PosZ => 4,
            Self::NegZ => 5,
        }
    }

    /// The opposite direction.
    pub fn opposite(self) -> Self {
        match self {
            Self::PosX => Self::NegX,
            Self::NegX => Self::PosX,
            Self::PosY => Self::NegY,
            Self::NegY => Self::PosY,
            Self::PosZ => Self::NegZ,
            Self::NegZ => Self::PosZ,
        }
    }

    /// Unit step toward the neighboring cell in this direction.
    pub fn step(self) -> VoxelCoord {
        match self {
            Self::PosX => VoxelCoord::new(1, 0, 0),
            Self::NegX => VoxelCoord::new(-1, 0, 0),
            Self::PosY => VoxelCoord::new(0, 1, 0),
            Self::NegY => VoxelCoord::new(0, -1, 0),
            Self::PosZ => VoxelCoord::new(0, 0, 1),
            Self::NegZ => VoxelCoord::new(0, 0, -1),
        }
    }

    /// Outward unit normal.
    pub fn normal(self) -> Vec3 {
        match self {
            Self::PosX => Vec3::X,
            Self::NegX => Vec3::NEG_X,
            Self::PosY => Vec3::Y,
            Self::NegY => Vec3::NEG_Y,
            Self::PosZ => Vec3::Z,
            Self::NegZ => Vec3::NEG_Z,
        }
    }

    /// Rotates this direction by `steps` quarter turns about `+Y`.
    ///
    /// One step: `+X → −Z → −X → +Z → +X`; the vertical axes are fixed.
    pub fn rotated_y(self, steps: u8) -> Self {
        let mut dir = self;
        for _ in 0..(steps & 0b11) {
            dir = match dir {
                Self::PosX => Self::NegZ,
                Self::NegZ => Self::NegX,
                Self::NegX => Self::PosZ,
                Self::PosZ => Self::PosX,
                vertical => vertical,
            };
        }
        dir
    }

    /// Mirrors this direction across the `x = 0.5` plane.
    pub fn flipped_x(self) -> Self {
        match self {
            Self::PosX => Self::NegX,
            Self::NegX => Self::PosX,
            other => other,
        }
    }

    /// Mirrors this direction across the `y = 0.5` plane.
    pub fn flipped_y(self) -> Self {
        match self {
            Self::PosY => Self::NegY,
            Self::NegY => Self::PosY,
            other => other,
        }
    }

    /// Mirrors this direction across the `z = 0.5` plane.
    pub fn flipped_z(self) -> Self {
        match self {
            Self::PosZ => Self::NegZ,
            Self::NegZ => Self::PosZ,
            other => other,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_four_rotations_are_identity() {
        for dir in ALL_DIRECTIONS {
            assert_eq!(dir.rotated_y(4), dir);
            assert_eq!(dir.rotated_y(1).rotated_y(3), dir);
        }
    }

    #[test]
    fn test_rotation_cycle_matches_vertex_map() {
        // (x, y, z) → (z, y, 1 − x) sends the +X normal to −Z.
        assert_eq!(FaceDirection::PosX.rotated_y(1), FaceDirection::NegZ);
        assert_eq!(FaceDirection::NegZ.rotated_y(1), FaceDirection::NegX);
        assert_eq!(FaceDirection::NegX.rotated_y(1), FaceDirection::PosZ);
        assert_eq!(FaceDirection::PosZ.rotated_y(1), FaceDirection::PosX);
        assert_eq!(FaceDirection::PosY.rotated_y(1), FaceDirection::PosY);
    }

    #[test]
    fn test_opposite_is_involutive() {
        for dir in ALL_DIRECTIONS {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_ne!(dir.opposite(), dir);
        }
    }

    #[test]
    fn test_step_matches_normal() {
        for dir in ALL_DIRECTIONS {
            let step = dir.step();
            let normal = dir.normal();
            assert_eq!(step.x as f32, normal.x);
            assert_eq!(step.y as f32, normal.y);
            assert_eq!(step.z as f32, normal.z);
        }
    }

    #[test]
    fn test_serde_camel_case_names() {
        let json = serde_json::to_string(&FaceDirection::NegZ).unwrap();
        assert_eq!(json, "\"negZ\"");
    }
}

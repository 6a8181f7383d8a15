//! Block shape geometry: per-face vertex data, occlusion metadata used for
//! cross-voxel face culling, and the collision strategy hint.

use std::sync::Arc;

use glam::{Vec2, Vec3};

use crate::face::FaceDirection;

// ---------------------------------------------------------------------------
// Faces
// ---------------------------------------------------------------------------

/// One face of a block shape, in unit-cell coordinates (`[0, 1]³`).
///
/// `positions`, `uvs`, and `indices` describe an indexed triangle fan or
/// strip local to this face; `uvs` are in tile-local space and later mapped
/// into the atlas. A face is `cullable` only when it lies flat on the cell
/// boundary plane of its `direction` — those are the faces a fully occluding
/// neighbor can hide. Interior and sloped faces are never culled.
#[derive(Clone, Debug)]
pub struct FaceDef {
    /// Direction this face belongs to, for texture overrides and culling.
    pub direction: FaceDirection,
    /// Vertex positions in unit-cell space.
    pub positions: Vec<Vec3>,
    /// Tile-local texture coordinates, one per position (`v = 0` at bottom).
    pub uvs: Vec<Vec2>,
    /// Triangle indices into `positions`.
    pub indices: Vec<u32>,
    /// Whether a fully occluding neighbor may suppress this face.
    pub cullable: bool,
}

impl FaceDef {
    /// A quad face with the standard tile-filling UVs.
    ///
    /// Vertices are given counter-clockwise from outside, starting at the
    /// face's bottom-left corner.
    pub fn quad(direction: FaceDirection, positions: [Vec3; 4], cullable: bool) -> Self {
        Self::quad_uv(
            direction,
            positions,
            [
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.0, 1.0),
            ],
            cullable,
        )
    }

    /// A quad face with explicit UVs, for partial-tile faces.
    pub fn quad_uv(
        direction: FaceDirection,
        positions: [Vec3; 4],
        uvs: [Vec2; 4],
        cullable: bool,
    ) -> Self {
        Self {
            direction,
            positions: positions.to_vec(),
            uvs: uvs.to_vec(),
            indices: vec![0, 1, 2, 0, 2, 3],
            cullable,
        }
    }

    /// A single triangle face.
    pub fn tri(
        direction: FaceDirection,
        positions: [Vec3; 3],
        uvs: [Vec2; 3],
        cullable: bool,
    ) -> Self {
        Self {
            direction,
            positions: positions.to_vec(),
            uvs: uvs.to_vec(),
            indices: vec![0, 1, 2],
            cullable,
        }
    }
}

// ---------------------------------------------------------------------------
// Occlusion
// ---------------------------------------------------------------------------

/// How a shape covers its cell boundary planes, as seen by neighbors.
///
/// A neighbor's face in direction `d` may be culled only when this shape
/// occludes `d.opposite()` in this shape's own local frame (the caller maps
/// through the voxel's transform first).
#[derive(Clone)]
pub enum Occlusion {
    /// Covers no boundary plane; never hides neighbor faces.
    None,
    /// Covers all six boundary planes (a full cube).
    Full,
    /// Per-direction coverage, indexed by [`FaceDirection::index`].
    Faces([bool; 6]),
    /// Computed coverage, for shapes with configuration-dependent bounds.
    Custom(Arc<dyn Fn(FaceDirection) -> bool + Send + Sync>),
}

impl Occlusion {
    /// Whether this shape fully covers the boundary plane in `direction`.
    pub fn occludes(&self, direction: FaceDirection) -> bool {
        match self {
            Self::None => false,
            Self::Full => true,
            Self::Faces(faces) => faces[direction.index()],
            Self::Custom(f) => f(direction),
        }
    }

    /// Coverage on a single direction only.
    pub fn only(direction: FaceDirection) -> Self {
        let mut faces = [false; 6];
        faces[direction.index()] = true;
        Self::Faces(faces)
    }
}

impl std::fmt::Debug for Occlusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "Occlusion::None"),
            Self::Full => write!(f, "Occlusion::Full"),
            Self::Faces(faces) => f.debug_tuple("Occlusion::Faces").field(faces).finish(),
            Self::Custom(_) => write!(f, "Occlusion::Custom(..)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Collision
// ---------------------------------------------------------------------------

/// How the collider builder should represent a voxel of this shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollisionHint {
    /// A unit cuboid is a good-enough approximation.
    Box,
    /// The render geometry must be collided exactly (ramps, stairs).
    Trimesh,
    /// No collision at all (decorative shapes).
    None,
}

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

/// A named block shape: geometry plus occlusion and collision metadata.
#[derive(Clone, Debug)]
pub struct BlockShape {
    /// Registry name, referenced by block definitions.
    pub name: String,
    /// Face geometry in unit-cell coordinates.
    pub faces: Vec<FaceDef>,
    /// Boundary coverage for neighbor-face culling.
    pub occlusion: Occlusion,
    /// Collider construction strategy.
    pub collision: CollisionHint,
}

impl BlockShape {
    /// Whether this shape fully covers the boundary plane in `direction`.
    pub fn occludes(&self, direction: FaceDirection) -> bool {
        self.occlusion.occludes(direction)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

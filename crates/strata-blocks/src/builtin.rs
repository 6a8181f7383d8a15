//! The built-in shape library: cube, slabs, pole, ramps, and stairs.
//!
//! All geometry lives in unit-cell coordinates with winding counter-clockwise
//! from outside. Mirrored variants are derived from their base shape by
//! reflecting across the `x = 0.5` plane, which keeps the two definitions
//! from drifting apart.

use glam::{Vec2, Vec3};

use crate::face::FaceDirection;
use crate::shape::{BlockShape, CollisionHint, FaceDef, Occlusion};

const V: fn(f32, f32, f32) -> Vec3 = Vec3::new;
const T: fn(f32, f32) -> Vec2 = Vec2::new;

/// All built-in shapes, in registration order.
pub fn builtin_shapes() -> Vec<BlockShape> {
    let corner = corner_ramp();
    let stairs = stairs();
    let corner_mirrored = mirror_x(&corner, "corner_ramp_mirrored");
    let stairs_mirrored = mirror_x(&stairs, "stairs_mirrored");
    vec![
        cube(),
        slab(),
        slab_top(),
        pole(),
        ramp(),
        corner,
        corner_mirrored,
        stairs,
        stairs_mirrored,
    ]
}

// ---------------------------------------------------------------------------
// Primitive shapes
// ---------------------------------------------------------------------------

/// The full unit cube. Occludes every neighbor face it touches.
pub fn cube() -> BlockShape {
    BlockShape {
        name: "cube".to_string(),
        faces: vec![
            FaceDef::quad(
                FaceDirection::PosX,
                [V(1.0, 0.0, 1.0), V(1.0, 0.0, 0.0), V(1.0, 1.0, 0.0), V(1.0, 1.0, 1.0)],
                true,
            ),
            FaceDef::quad(
                FaceDirection::NegX,
                [V(0.0, 0.0, 0.0), V(0.0, 0.0, 1.0), V(0.0, 1.0, 1.0), V(0.0, 1.0, 0.0)],
                true,
            ),
            FaceDef::quad(
                FaceDirection::PosY,
                [V(0.0, 1.0, 1.0), V(1.0, 1.0, 1.0), V(1.0, 1.0, 0.0), V(0.0, 1.0, 0.0)],
                true,
            ),
            FaceDef::quad(
                FaceDirection::NegY,
                [V(0.0, 0.0, 0.0), V(1.0, 0.0, 0.0), V(1.0, 0.0, 1.0), V(0.0, 0.0, 1.0)],
                true,
            ),
            FaceDef::quad(
                FaceDirection::PosZ,
                [V(0.0, 0.0, 1.0), V(1.0, 0.0, 1.0), V(1.0, 1.0, 1.0), V(0.0, 1.0, 1.0)],
                true,
            ),
            FaceDef::quad(
                FaceDirection::NegZ,
                [V(1.0, 0.0, 0.0), V(0.0, 0.0, 0.0), V(0.0, 1.0, 0.0), V(1.0, 1.0, 0.0)],
                true,
            ),
        ],
        occlusion: Occlusion::Full,
        collision: CollisionHint::Box,
    }
}

/// Bottom half-block. Only its underside covers a boundary plane.
pub fn slab() -> BlockShape {
    let half_v = [T(0.0, 0.0), T(1.0, 0.0), T(1.0, 0.5), T(0.0, 0.5)];
    BlockShape {
        name: "slab".to_string(),
        faces: vec![
            FaceDef::quad(
                FaceDirection::NegY,
                [V(0.0, 0.0, 0.0), V(1.0, 0.0, 0.0), V(1.0, 0.0, 1.0), V(0.0, 0.0, 1.0)],
                true,
            ),
            // Top surface sits mid-cell; a block above never touches it.
            FaceDef::quad(
                FaceDirection::PosY,
                [V(0.0, 0.5, 1.0), V(1.0, 0.5, 1.0), V(1.0, 0.5, 0.0), V(0.0, 0.5, 0.0)],
                false,
            ),
            FaceDef::quad_uv(
                FaceDirection::PosX,
                [V(1.0, 0.0, 1.0), V(1.0, 0.0, 0.0), V(1.0, 0.5, 0.0), V(1.0, 0.5, 1.0)],
                half_v,
                true,
            ),
            FaceDef::quad_uv(
                FaceDirection::NegX,
                [V(0.0, 0.0, 0.0), V(0.0, 0.0, 1.0), V(0.0, 0.5, 1.0), V(0.0, 0.5, 0.0)],
                half_v,
                true,
            ),
            FaceDef::quad_uv(
                FaceDirection::PosZ,
                [V(0.0, 0.0, 1.0), V(1.0, 0.0, 1.0), V(1.0, 0.5, 1.0), V(0.0, 0.5, 1.0)],
                half_v,
                true,
            ),
            FaceDef::quad_uv(
                FaceDirection::NegZ,
                [V(1.0, 0.0, 0.0), V(0.0, 0.0, 0.0), V(0.0, 0.5, 0.0), V(1.0, 0.5, 0.0)],
                half_v,
                true,
            ),
        ],
        occlusion: Occlusion::only(FaceDirection::NegY),
        collision: CollisionHint::Box,
    }
}

/// Top half-block, the ceiling-mounted counterpart of [`slab`].
pub fn slab_top() -> BlockShape {
    let half_v = [T(0.0, 0.5), T(1.0, 0.5), T(1.0, 1.0), T(0.0, 1.0)];
    BlockShape {
        name: "slab_top".to_string(),
        faces: vec![
            FaceDef::quad(
                FaceDirection::PosY,
                [V(0.0, 1.0, 1.0), V(1.0, 1.0, 1.0), V(1.0, 1.0, 0.0), V(0.0, 1.0, 0.0)],
                true,
            ),
            FaceDef::quad(
                FaceDirection::NegY,
                [V(0.0, 0.5, 0.0), V(1.0, 0.5, 0.0), V(1.0, 0.5, 1.0), V(0.0, 0.5, 1.0)],
                false,
            ),
            FaceDef::quad_uv(
                FaceDirection::PosX,
                [V(1.0, 0.5, 1.0), V(1.0, 0.5, 0.0), V(1.0, 1.0, 0.0), V(1.0, 1.0, 1.0)],
                half_v,
                true,
            ),
            FaceDef::quad_uv(
                FaceDirection::NegX,
                [V(0.0, 0.5, 0.0), V(0.0, 0.5, 1.0), V(0.0, 1.0, 1.0), V(0.0, 1.0, 0.0)],
                half_v,
                true,
            ),
            FaceDef::quad_uv(
                FaceDirection::PosZ,
                [V(0.0, 0.5, 1.0), V(1.0, 0.5, 1.0), V(1.0, 1.0, 1.0), V(0.0, 1.0, 1.0)],
                half_v,
                true,
            ),
            FaceDef::quad_uv(
                FaceDirection::NegZ,
                [V(1.0, 0.5, 0.0), V(0.0, 0.5, 0.0), V(0.0, 1.0, 0.0), V(1.0, 1.0, 0.0)],
                half_v,
                true,
            ),
        ],
        occlusion: Occlusion::only(FaceDirection::PosY),
        collision: CollisionHint::Box,
    }
}

/// A slender centered column, `x, z ∈ [0.375, 0.625]`, full height.
pub fn pole() -> BlockShape {
    let (lo, hi) = (0.375, 0.625);
    let side_uv = [T(lo, 0.0), T(hi, 0.0), T(hi, 1.0), T(lo, 1.0)];
    let cap_uv = [T(lo, lo), T(hi, lo), T(hi, hi), T(lo, hi)];
    BlockShape {
        name: "pole".to_string(),
        faces: vec![
            FaceDef::quad_uv(
                FaceDirection::PosX,
                [V(hi, 0.0, hi), V(hi, 0.0, lo), V(hi, 1.0, lo), V(hi, 1.0, hi)],
                side_uv,
                false,
            ),
            FaceDef::quad_uv(
                FaceDirection::NegX,
                [V(lo, 0.0, lo), V(lo, 0.0, hi), V(lo, 1.0, hi), V(lo, 1.0, lo)],
                side_uv,
                false,
            ),
            FaceDef::quad_uv(
                FaceDirection::PosZ,
                [V(lo, 0.0, hi), V(hi, 0.0, hi), V(hi, 1.0, hi), V(lo, 1.0, hi)],
                side_uv,
                false,
            ),
            FaceDef::quad_uv(
                FaceDirection::NegZ,
                [V(hi, 0.0, lo), V(lo, 0.0, lo), V(lo, 1.0, lo), V(hi, 1.0, lo)],
                side_uv,
                false,
            ),
            // End caps sit on the cell boundary and can be hidden.
            FaceDef::quad_uv(
                FaceDirection::PosY,
                [V(lo, 1.0, hi), V(hi, 1.0, hi), V(hi, 1.0, lo), V(lo, 1.0, lo)],
                cap_uv,
                true,
            ),
            FaceDef::quad_uv(
                FaceDirection::NegY,
                [V(lo, 0.0, lo), V(hi, 0.0, lo), V(hi, 0.0, hi), V(lo, 0.0, hi)],
                cap_uv,
                true,
            ),
        ],
        occlusion: Occlusion::None,
        collision: CollisionHint::Box,
    }
}

/// A wedge rising from `y = 0` at `z = 0` to `y = 1` at `z = 1`.
pub fn ramp() -> BlockShape {
    BlockShape {
        name: "ramp".to_string(),
        faces: vec![
            FaceDef::quad(
                FaceDirection::NegY,
                [V(0.0, 0.0, 0.0), V(1.0, 0.0, 0.0), V(1.0, 0.0, 1.0), V(0.0, 0.0, 1.0)],
                true,
            ),
            FaceDef::quad(
                FaceDirection::PosZ,
                [V(0.0, 0.0, 1.0), V(1.0, 0.0, 1.0), V(1.0, 1.0, 1.0), V(0.0, 1.0, 1.0)],
                true,
            ),
            // The walkable slope. Never culled, whatever sits behind it.
            FaceDef::quad_uv(
                FaceDirection::PosY,
                [V(1.0, 0.0, 0.0), V(0.0, 0.0, 0.0), V(0.0, 1.0, 1.0), V(1.0, 1.0, 1.0)],
                [T(1.0, 0.0), T(0.0, 0.0), T(0.0, 1.0), T(1.0, 1.0)],
                false,
            ),
            FaceDef::tri(
                FaceDirection::PosX,
                [V(1.0, 0.0, 1.0), V(1.0, 0.0, 0.0), V(1.0, 1.0, 1.0)],
                [T(0.0, 0.0), T(1.0, 0.0), T(0.0, 1.0)],
                true,
            ),
            FaceDef::tri(
                FaceDirection::NegX,
                [V(0.0, 0.0, 0.0), V(0.0, 0.0, 1.0), V(0.0, 1.0, 1.0)],
                [T(0.0, 0.0), T(1.0, 0.0), T(1.0, 1.0)],
                true,
            ),
        ],
        occlusion: {
            let mut faces = [false; 6];
            faces[FaceDirection::NegY.index()] = true;
            faces[FaceDirection::PosZ.index()] = true;
            Occlusion::Faces(faces)
        },
        collision: CollisionHint::Trimesh,
    }
}

/// An outer-corner wedge with its apex at `(1, 1, 1)`.
pub fn corner_ramp() -> BlockShape {
    BlockShape {
        name: "corner_ramp".to_string(),
        faces: vec![
            FaceDef::quad(
                FaceDirection::NegY,
                [V(0.0, 0.0, 0.0), V(1.0, 0.0, 0.0), V(1.0, 0.0, 1.0), V(0.0, 0.0, 1.0)],
                true,
            ),
            FaceDef::tri(
                FaceDirection::PosX,
                [V(1.0, 0.0, 1.0), V(1.0, 0.0, 0.0), V(1.0, 1.0, 1.0)],
                [T(0.0, 0.0), T(1.0, 0.0), T(0.0, 1.0)],
                true,
            ),
            FaceDef::tri(
                FaceDirection::PosZ,
                [V(0.0, 0.0, 1.0), V(1.0, 0.0, 1.0), V(1.0, 1.0, 1.0)],
                [T(0.0, 0.0), T(1.0, 0.0), T(1.0, 1.0)],
                true,
            ),
            FaceDef::tri(
                FaceDirection::PosY,
                [V(1.0, 0.0, 0.0), V(0.0, 0.0, 0.0), V(1.0, 1.0, 1.0)],
                [T(1.0, 0.0), T(0.0, 0.0), T(1.0, 1.0)],
                false,
            ),
            FaceDef::tri(
                FaceDirection::PosY,
                [V(0.0, 0.0, 0.0), V(0.0, 0.0, 1.0), V(1.0, 1.0, 1.0)],
                [T(0.0, 0.0), T(0.0, 1.0), T(1.0, 1.0)],
                false,
            ),
        ],
        occlusion: Occlusion::only(FaceDirection::NegY),
        collision: CollisionHint::Trimesh,
    }
}

/// Two-step stairs ascending toward `+X`.
pub fn stairs() -> BlockShape {
    BlockShape {
        name: "stairs".to_string(),
        faces: vec![
            FaceDef::quad(
                FaceDirection::NegY,
                [V(0.0, 0.0, 0.0), V(1.0, 0.0, 0.0), V(1.0, 0.0, 1.0), V(0.0, 0.0, 1.0)],
                true,
            ),
            FaceDef::quad(
                FaceDirection::PosX,
                [V(1.0, 0.0, 1.0), V(1.0, 0.0, 0.0), V(1.0, 1.0, 0.0), V(1.0, 1.0, 1.0)],
                true,
            ),
            FaceDef::quad_uv(
                FaceDirection::NegX,
                [V(0.0, 0.0, 0.0), V(0.0, 0.0, 1.0), V(0.0, 0.5, 1.0), V(0.0, 0.5, 0.0)],
                [T(0.0, 0.0), T(1.0, 0.0), T(1.0, 0.5), T(0.0, 0.5)],
                true,
            ),
            // Lower tread.
            FaceDef::quad_uv(
                FaceDirection::PosY,
                [V(0.0, 0.5, 1.0), V(0.5, 0.5, 1.0), V(0.5, 0.5, 0.0), V(0.0, 0.5, 0.0)],
                [T(0.0, 0.0), T(0.5, 0.0), T(0.5, 1.0), T(0.0, 1.0)],
                false,
            ),
            // Riser between the treads.
            FaceDef::quad_uv(
                FaceDirection::NegX,
                [V(0.5, 0.5, 0.0), V(0.5, 0.5, 1.0), V(0.5, 1.0, 1.0), V(0.5, 1.0, 0.0)],
                [T(0.0, 0.5), T(1.0, 0.5), T(1.0, 1.0), T(0.0, 1.0)],
                false,
            ),
            // Upper tread, flush with the cell top.
            FaceDef::quad_uv(
                FaceDirection::PosY,
                [V(0.5, 1.0, 1.0), V(1.0, 1.0, 1.0), V(1.0, 1.0, 0.0), V(0.5, 1.0, 0.0)],
                [T(0.5, 0.0), T(1.0, 0.0), T(1.0, 1.0), T(0.5, 1.0)],
                true,
            ),
            // Side profiles, split into the step rectangles.
            FaceDef::quad_uv(
                FaceDirection::PosZ,
                [V(0.0, 0.0, 1.0), V(1.0, 0.0, 1.0), V(1.0, 0.5, 1.0), V(0.0, 0.5, 1.0)],
                [T(0.0, 0.0), T(1.0, 0.0), T(1.0, 0.5), T(0.0, 0.5)],
                true,
            ),
            FaceDef::quad_uv(
                FaceDirection::PosZ,
                [V(0.5, 0.5, 1.0), V(1.0, 0.5, 1.0), V(1.0, 1.0, 1.0), V(0.5, 1.0, 1.0)],
                [T(0.5, 0.5), T(1.0, 0.5), T(1.0, 1.0), T(0.5, 1.0)],
                true,
            ),
            FaceDef::quad_uv(
                FaceDirection::NegZ,
                [V(1.0, 0.0, 0.0), V(0.0, 0.0, 0.0), V(0.0, 0.5, 0.0), V(1.0, 0.5, 0.0)],
                [T(0.0, 0.0), T(1.0, 0.0), T(1.0, 0.5), T(0.0, 0.5)],
                true,
            ),
            FaceDef::quad_uv(
                FaceDirection::NegZ,
                [V(1.0, 0.5, 0.0), V(0.5, 0.5, 0.0), V(0.5, 1.0, 0.0), V(1.0, 1.0, 0.0)],
                [T(0.0, 0.5), T(0.5, 0.5), T(0.5, 1.0), T(0.0, 1.0)],
                true,
            ),
        ],
        occlusion: {
            let mut faces = [false; 6];
            faces[FaceDirection::NegY.index()] = true;
            faces[FaceDirection::PosX.index()] = true;
            Occlusion::Faces(faces)
        },
        collision: CollisionHint::Trimesh,
    }
}

// ---------------------------------------------------------------------------
// Mirroring
// ---------------------------------------------------------------------------

/// Reflects a shape across the `x = 0.5` plane under a new name.
///
/// Positions and UVs are mirrored, triangle winding is reversed to keep
/// faces front-facing, and occlusion metadata has `+X`/`−X` swapped.
pub fn mirror_x(shape: &BlockShape, name: &str) -> BlockShape {
    let faces = shape
        .faces
        .iter()
        .map(|face| {
            let mut indices = face.indices.clone();
            for tri in indices.chunks_exact_mut(3) {
                tri.swap(1, 2);
            }
            FaceDef {
                direction: face.direction.flipped_x(),
                positions: face
                    .positions
                    .iter()
                    .map(|p| Vec3::new(1.0 - p.x, p.y, p.z))
                    .collect(),
                uvs: face.uvs.iter().map(|t| Vec2::new(1.0 - t.x, t.y)).collect(),
                indices,
                cullable: face.cullable,
            }
        })
        .collect();

    let occlusion = match &shape.occlusion {
        Occlusion::None => Occlusion::None,
        Occlusion::Full => Occlusion::Full,
        Occlusion::Faces(faces) => {
            let mut mirrored = [false; 6];
            for dir in crate::face::ALL_DIRECTIONS {
                mirrored[dir.flipped_x().index()] = faces[dir.index()];
            }
            Occlusion::Faces(mirrored)
        }
        Occlusion::Custom(f) => {
            let f = f.clone();
            Occlusion::Custom(std::sync::Arc::new(move |dir| f(dir.flipped_x())))
        }
    };

    BlockShape {
        name: name.to_string(),
        faces,
        occlusion,
        collision: shape.collision,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::ALL_DIRECTIONS;

    fn triangle_normals(face: &FaceDef) -> Vec<Vec3> {
        face.indices
            .chunks_exact(3)
            .map(|tri| {
                let [a, b, c] = [
                    face.positions[tri[0] as usize],
                    face.positions[tri[1] as usize],
                    face.positions[tri[2] as usize],
                ];
                (b - a).cross(c - a)
            })
            .collect()
    }

    #[test]
    fn test_every_triangle_faces_its_direction() {
        for shape in builtin_shapes() {
            for face in &shape.faces {
                for normal in triangle_normals(face) {
                    assert!(
                        normal.dot(face.direction.normal()) > 0.0,
                        "{}: {:?} face has a back-facing or degenerate triangle",
                        shape.name,
                        face.direction
                    );
                }
            }
        }
    }

    #[test]
    fn test_cullable_faces_lie_on_boundary_planes() {
        for shape in builtin_shapes() {
            for face in shape.faces.iter().filter(|f| f.cullable) {
                let n = face.direction.normal();
                // Boundary plane coordinate is 1 on positive axes, 0 on negative.
                let plane = if n.x + n.y + n.z > 0.0 { 1.0 } else { 0.0 };
                for p in &face.positions {
                    let along = p.x * n.x.abs() + p.y * n.y.abs() + p.z * n.z.abs();
                    assert_eq!(
                        along, plane,
                        "{}: cullable {:?} face leaves the boundary plane",
                        shape.name, face.direction
                    );
                }
            }
        }
    }

    #[test]
    fn test_cube_occludes_everything() {
        let cube = cube();
        for dir in ALL_DIRECTIONS {
            assert!(cube.occludes(dir));
        }
    }

    #[test]
    fn test_slab_occludes_only_downward() {
        let slab = slab();
        assert!(slab.occludes(FaceDirection::NegY));
        assert!(!slab.occludes(FaceDirection::PosY));
        assert!(!slab.occludes(FaceDirection::PosX));
    }

    #[test]
    fn test_ramp_slope_is_never_cullable() {
        let ramp = ramp();
        let slope = ramp
            .faces
            .iter()
            .find(|f| f.direction == FaceDirection::PosY)
            .unwrap();
        assert!(!slope.cullable);
        assert!(ramp.occludes(FaceDirection::NegY));
        assert!(ramp.occludes(FaceDirection::PosZ));
        assert!(!ramp.occludes(FaceDirection::NegZ));
    }

    #[test]
    fn test_mirrored_stairs_occlusion_swaps_x() {
        let mirrored = mirror_x(&stairs(), "stairs_mirrored");
        assert!(mirrored.occludes(FaceDirection::NegX));
        assert!(!mirrored.occludes(FaceDirection::PosX));
        assert!(mirrored.occludes(FaceDirection::NegY));
    }

    #[test]
    fn test_mirrored_corner_apex_moves() {
        let mirrored = mirror_x(&corner_ramp(), "corner_ramp_mirrored");
        let apex_found = mirrored
            .faces
            .iter()
            .flat_map(|f| f.positions.iter())
            .any(|p| *p == Vec3::new(0.0, 1.0, 1.0));
        assert!(apex_found);
    }

    #[test]
    fn test_builtin_names_are_unique() {
        let shapes = builtin_shapes();
        let mut names: Vec<_> = shapes.iter().map(|s| s.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), shapes.len());
    }
}

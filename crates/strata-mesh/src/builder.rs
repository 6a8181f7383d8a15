//! Chunk mesh building with cross-chunk, cross-layer face culling.
//!
//! A cullable face is suppressed when the composited neighbor cell holds a
//! block whose shape covers the facing boundary plane. Both voxels may be
//! rotated or mirrored, so the check maps the face direction out through this
//! voxel's transform and back in through the neighbor's inverse transform
//! before consulting the neighbor shape's occlusion table.
//!
//! Vertex pipeline per face: mirror about the cell mid-planes, rotate about
//! `+Y` around the cell center, translate to the cell. An odd number of
//! active mirror flags reverses triangle winding to keep faces front-facing.
//!
//! The same emission path feeds both the render mesh and the collision
//! surface, so physics sees exactly the culled geometry the renderer draws.

use glam::{Vec2, Vec3};
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::warn;

use strata_blocks::{
    BlockDefinition, BlockRegistry, BlockShape, CollisionHint, FaceDef, FaceDirection,
    ShapeRegistry,
};
use strata_tileset::{TilesetError, TilesetManager};
use strata_voxel::{ChunkCoord, VoxelCoord, VoxelTransform, World, from_linear_index};

use crate::mesh::ChunkMesh;

/// Errors from mesh construction.
///
/// Sparse content (missing chunks, unregistered blocks) never errors; these
/// cover caller setup bugs and tileset misconfiguration.
#[derive(Debug, Error)]
pub enum MeshError {
    /// The named layer does not exist.
    #[error("unknown layer: {0}")]
    UnknownLayer(String),
    /// A tile reference could not be resolved to UVs.
    #[error(transparent)]
    Tileset(#[from] TilesetError),
}

// ---------------------------------------------------------------------------
// Transform application
// ---------------------------------------------------------------------------

/// Applies a voxel transform to a point in unit-cell space: mirrors first,
/// then rotation steps of `(x, y, z) → (z, y, 1 − x)` about the cell center.
pub fn transform_point(mut p: Vec3, t: VoxelTransform) -> Vec3 {
    if t.flip_x() {
        p.x = 1.0 - p.x;
    }
    if t.flip_y() {
        p.y = 1.0 - p.y;
    }
    if t.flip_z() {
        p.z = 1.0 - p.z;
    }
    for _ in 0..t.rotation() {
        p = Vec3::new(p.z, p.y, 1.0 - p.x);
    }
    p
}

/// Maps a shape-local face direction into world space through a transform.
pub fn transform_dir(dir: FaceDirection, t: VoxelTransform) -> FaceDirection {
    let mut dir = dir;
    if t.flip_x() {
        dir = dir.flipped_x();
    }
    if t.flip_y() {
        dir = dir.flipped_y();
    }
    if t.flip_z() {
        dir = dir.flipped_z();
    }
    dir.rotated_y(t.rotation())
}

/// Maps a world-space direction into a voxel's shape-local frame.
pub fn inverse_transform_dir(dir: FaceDirection, t: VoxelTransform) -> FaceDirection {
    let mut dir = dir.rotated_y(4 - t.rotation());
    if t.flip_z() {
        dir = dir.flipped_z();
    }
    if t.flip_y() {
        dir = dir.flipped_y();
    }
    if t.flip_x() {
        dir = dir.flipped_x();
    }
    dir
}

/// Whether the neighbor in the face's world direction hides this face.
fn face_occluded(
    world: &World,
    world_coord: VoxelCoord,
    world_dir: FaceDirection,
    blocks: &BlockRegistry,
    shapes: &ShapeRegistry,
) -> bool {
    let Some(neighbor) = world.get_voxel_neighbour(world_coord, world_dir.step()) else {
        return false;
    };
    let Some(def) = blocks.get(neighbor.block) else {
        return false;
    };
    let Some(shape) = shapes.get(&def.shape) else {
        return false;
    };
    let facing = inverse_transform_dir(world_dir.opposite(), neighbor.transform);
    shape.occludes(facing)
}

// ---------------------------------------------------------------------------
// Face emission
// ---------------------------------------------------------------------------

/// Walks a chunk's voxels and hands every face that survives occlusion
/// culling to `emit`, with transformed positions and winding-corrected
/// indices. Voxels rejected by `accept` contribute nothing, as do voxels
/// whose block id or shape is unregistered (logged once per id).
fn emit_visible_faces<F>(
    world: &World,
    layer_name: &str,
    coord: ChunkCoord,
    blocks: &BlockRegistry,
    shapes: &ShapeRegistry,
    accept: impl Fn(&BlockDefinition, &BlockShape) -> bool,
    mut emit: F,
) -> Result<(), MeshError>
where
    F: FnMut(&BlockDefinition, &FaceDef, VoxelTransform, &[Vec3], &[u32]) -> Result<(), MeshError>,
{
    let layer = world
        .layer(layer_name)
        .ok_or_else(|| MeshError::UnknownLayer(layer_name.to_string()))?;
    if !layer.visible() {
        return Ok(());
    }
    let Some(chunk) = layer.chunk(coord) else {
        return Ok(());
    };

    let size = layer.chunk_size();
    let origin = coord.origin(size);
    let mut unknown_blocks = FxHashSet::default();
    let mut unknown_shapes = FxHashSet::default();

    for (index, entry) in chunk.entries() {
        let (lx, ly, lz) = from_linear_index(size, index);
        let local = VoxelCoord::new(
            origin.x + lx as i32,
            origin.y + ly as i32,
            origin.z + lz as i32,
        );
        let world_coord = local.offset(layer.offset());

        let Some(def) = blocks.get(entry.block) else {
            unknown_blocks.insert(entry.block);
            continue;
        };
        let Some(shape) = shapes.get(&def.shape) else {
            unknown_shapes.insert(def.shape.clone());
            continue;
        };
        if !accept(def, shape.as_ref()) {
            continue;
        }

        let t = entry.transform;
        let reverse_winding = t.flip_x() ^ t.flip_y() ^ t.flip_z();
        let cell = Vec3::new(lx as f32, ly as f32, lz as f32);

        for face in &shape.faces {
            if face.cullable {
                let world_dir = transform_dir(face.direction, t);
                if face_occluded(world, world_coord, world_dir, blocks, shapes) {
                    continue;
                }
            }

            let positions: Vec<Vec3> = face
                .positions
                .iter()
                .map(|&p| cell + transform_point(p, t))
                .collect();
            let mut indices = face.indices.clone();
            if reverse_winding {
                for tri in indices.chunks_exact_mut(3) {
                    tri.swap(1, 2);
                }
            }
            emit(def, face, t, &positions, &indices)?;
        }
    }

    for id in unknown_blocks {
        warn!(block = id.0, layer = layer_name, "skipping voxels with unregistered block id");
    }
    for name in unknown_shapes {
        warn!(shape = %name, layer = layer_name, "skipping voxels with unregistered shape");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Render mesh
// ---------------------------------------------------------------------------

/// Builds the render mesh for one chunk of one layer.
///
/// Vertex positions are relative to the chunk origin in layer-local space;
/// [`rebuild_dirty`] reports the matching world-space origin with each
/// rebuilt mesh. A missing chunk or an invisible layer yields an empty mesh.
pub fn build_chunk_mesh(
    world: &World,
    layer_name: &str,
    coord: ChunkCoord,
    blocks: &BlockRegistry,
    shapes: &ShapeRegistry,
    tilesets: &TilesetManager,
) -> Result<ChunkMesh, MeshError> {
    let mut mesh = ChunkMesh::default();
    emit_visible_faces(
        world,
        layer_name,
        coord,
        blocks,
        shapes,
        |_, _| true,
        |def, face, t, positions, indices| {
            // Overrides key on the shape-local direction, so textures stay
            // with their face under rotation.
            let tile = def.tile_for(face.direction);
            let tileset_id = tilesets.resolve_id(tile)?.to_string();
            let tile_uv = tilesets.tile_uv(tile)?;

            let uvs: Vec<Vec2> = face
                .uvs
                .iter()
                .map(|&uv| tile_uv.offset + uv * tile_uv.scale)
                .collect();
            let normal = triangle_normal(positions, indices)
                .unwrap_or_else(|| transform_dir(face.direction, t).normal());
            mesh.batch_mut(&tileset_id)
                .push_face(positions, normal, &uvs, indices);
            Ok(())
        },
    )?;
    Ok(mesh)
}

/// Unit normal of the first triangle, or `None` if degenerate.
fn triangle_normal(positions: &[Vec3], indices: &[u32]) -> Option<Vec3> {
    let [a, b, c] = [
        positions[indices[0] as usize],
        positions[indices[1] as usize],
        positions[indices[2] as usize],
    ];
    let n = (b - a).cross(c - a);
    (n.length_squared() > 0.0).then(|| n.normalize())
}

// ---------------------------------------------------------------------------
// Collision surface
// ---------------------------------------------------------------------------

/// A chunk's collision surface, in the same chunk-relative coordinates as
/// the render mesh.
#[derive(Clone, Debug, Default)]
pub struct CollisionMesh {
    /// Vertex positions relative to the chunk origin.
    pub positions: Vec<Vec3>,
    /// Triangle index triples.
    pub indices: Vec<[u32; 3]>,
}

impl CollisionMesh {
    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Returns `true` if no triangles were emitted.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Builds the collision surface for one chunk: the same culled face geometry
/// the render mesh emits, restricted to collidable blocks whose shape carries
/// a collision hint. Interior faces between adjacent solid voxels never
/// reach the buffers, so physics is spared coincident opposite-winding
/// triangles.
pub fn build_chunk_collision_mesh(
    world: &World,
    layer_name: &str,
    coord: ChunkCoord,
    blocks: &BlockRegistry,
    shapes: &ShapeRegistry,
) -> Result<CollisionMesh, MeshError> {
    let mut mesh = CollisionMesh::default();
    emit_visible_faces(
        world,
        layer_name,
        coord,
        blocks,
        shapes,
        |def, shape| def.collidable && shape.collision != CollisionHint::None,
        |_, _, _, positions, indices| {
            let base = mesh.positions.len() as u32;
            mesh.positions.extend_from_slice(positions);
            for tri in indices.chunks_exact(3) {
                mesh.indices.push([base + tri[0], base + tri[1], base + tri[2]]);
            }
            Ok(())
        },
    )?;
    Ok(mesh)
}

// ---------------------------------------------------------------------------
// Dirty rebuild
// ---------------------------------------------------------------------------

/// One rebuilt chunk mesh, tagged with where it belongs in the world.
#[derive(Debug)]
pub struct MeshUpdate {
    /// Owning layer's name.
    pub layer: String,
    /// Chunk address within the layer.
    pub coord: ChunkCoord,
    /// World-space position of the mesh: chunk origin plus layer offset.
    pub origin: Vec3,
    /// The rebuilt geometry, with vertices relative to `origin`.
    pub mesh: ChunkMesh,
}

/// Rebuilds every dirty chunk in every layer and clears their dirty flags.
///
/// Each update carries the world-space origin to place the mesh at, so a
/// renderer needs no further world queries. Invisible layers' dirty chunks
/// still produce (empty) updates so callers can drop stale render meshes.
/// Meshing reads the whole world, so flags are cleared only after all builds
/// complete.
pub fn rebuild_dirty(
    world: &mut World,
    blocks: &BlockRegistry,
    shapes: &ShapeRegistry,
    tilesets: &TilesetManager,
) -> Result<Vec<MeshUpdate>, MeshError> {
    let dirty: Vec<(String, ChunkCoord, Vec3)> = world
        .layers()
        .iter()
        .flat_map(|layer| {
            layer
                .dirty_chunks()
                .map(|coord| {
                    let origin = coord.origin(layer.chunk_size()).offset(layer.offset());
                    (
                        layer.name().to_string(),
                        coord,
                        Vec3::new(origin.x as f32, origin.y as f32, origin.z as f32),
                    )
                })
                .collect::<Vec<_>>()
        })
        .collect();

    let mut rebuilt = Vec::with_capacity(dirty.len());
    for (layer, coord, origin) in dirty {
        let mesh = build_chunk_mesh(world, &layer, coord, blocks, shapes, tilesets)?;
        rebuilt.push(MeshUpdate {
            layer,
            coord,
            origin,
            mesh,
        });
    }
    for update in &rebuilt {
        if let Some(chunk) = world
            .layer_mut(&update.layer)
            .and_then(|l| l.chunk_mut(update.coord))
        {
            chunk.clear_dirty();
        }
    }
    Ok(rebuilt)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use strata_blocks::BlockDefinition;
    use strata_tileset::{TileRef, TilesetDefinition};
    use strata_voxel::{BlockId, VoxelEntry};

    fn tilesets() -> TilesetManager {
        let mut mgr = TilesetManager::new();
        mgr.register(
            TilesetDefinition {
                id: "terrain".to_string(),
                src: "terrain.png".to_string(),
                tile_size: 16,
                cols: Some(4),
                rows: Some(4),
            },
            None,
        )
        .unwrap();
        mgr
    }

    fn registries() -> (BlockRegistry, ShapeRegistry) {
        let mut blocks = BlockRegistry::new();
        blocks
            .register(BlockDefinition::new(BlockId(1), "stone", "cube", TileRef::new(0, 0)))
            .unwrap();
        blocks
            .register(BlockDefinition::new(BlockId(2), "ramp", "ramp", TileRef::new(1, 0)))
            .unwrap();
        blocks
            .register(
                BlockDefinition::new(BlockId(3), "fern", "cube", TileRef::new(2, 0))
                    .non_collidable(),
            )
            .unwrap();
        (blocks, ShapeRegistry::new())
    }

    fn one_layer_world() -> World {
        let mut world = World::new();
        world.create_layer("ground", 0).unwrap();
        world
    }

    fn place(world: &mut World, layer: &str, x: i32, y: i32, z: i32, id: u16) {
        world
            .set_voxel(layer, VoxelCoord::new(x, y, z), VoxelEntry::new(BlockId(id)))
            .unwrap();
    }

    fn build(world: &World, layer: &str, chunk: ChunkCoord) -> ChunkMesh {
        let (blocks, shapes) = registries();
        build_chunk_mesh(world, layer, chunk, &blocks, &shapes, &tilesets()).unwrap()
    }

    #[test]
    fn test_single_cube_has_six_faces() {
        let mut world = one_layer_world();
        place(&mut world, "ground", 0, 0, 0, 1);
        let mesh = build(&world, "ground", ChunkCoord::new(0, 0, 0));
        assert_eq!(mesh.triangle_count(), 12);
        assert_eq!(mesh.vertex_count(), 24);
    }

    #[test]
    fn test_adjacent_cubes_cull_shared_faces() {
        let mut world = one_layer_world();
        place(&mut world, "ground", 0, 0, 0, 1);
        place(&mut world, "ground", 1, 0, 0, 1);
        let mesh = build(&world, "ground", ChunkCoord::new(0, 0, 0));
        // 12 faces minus the 2 shared ones.
        assert_eq!(mesh.triangle_count(), 20);
    }

    #[test]
    fn test_culling_crosses_chunk_borders() {
        let mut world = one_layer_world();
        place(&mut world, "ground", 15, 0, 0, 1);
        place(&mut world, "ground", 16, 0, 0, 1);
        let mesh = build(&world, "ground", ChunkCoord::new(0, 0, 0));
        assert_eq!(mesh.triangle_count(), 10);
    }

    #[test]
    fn test_culling_crosses_layers() {
        let mut world = one_layer_world();
        world.create_layer("overlay", 1).unwrap();
        place(&mut world, "ground", 0, 0, 0, 1);
        place(&mut world, "overlay", 1, 0, 0, 1);
        let mesh = build(&world, "ground", ChunkCoord::new(0, 0, 0));
        assert_eq!(mesh.triangle_count(), 10);
    }

    #[test]
    fn test_invisible_layer_neither_culls_nor_meshes() {
        let mut world = one_layer_world();
        world.create_layer("overlay", 1).unwrap();
        place(&mut world, "ground", 0, 0, 0, 1);
        place(&mut world, "overlay", 1, 0, 0, 1);
        world.set_layer_visible("overlay", false).unwrap();

        let mesh = build(&world, "ground", ChunkCoord::new(0, 0, 0));
        assert_eq!(mesh.triangle_count(), 12);
        let overlay = build(&world, "overlay", ChunkCoord::new(0, 0, 0));
        assert!(overlay.is_empty());
    }

    #[test]
    fn test_ramp_and_cube_cull_mutually_at_the_back() {
        let mut world = one_layer_world();
        place(&mut world, "ground", 0, 0, 0, 2); // ramp rises toward +Z
        place(&mut world, "ground", 0, 0, 1, 1); // cube behind it
        let mesh = build(&world, "ground", ChunkCoord::new(0, 0, 0));
        // Ramp: 8 triangles − 2 (its back quad). Cube: 12 − 2 (its −Z quad).
        assert_eq!(mesh.triangle_count(), 16);
    }

    #[test]
    fn test_ramp_front_does_not_cull_cube() {
        let mut world = one_layer_world();
        place(&mut world, "ground", 0, 0, 1, 2); // ramp, open side toward cube
        place(&mut world, "ground", 0, 0, 0, 1);
        let mesh = build(&world, "ground", ChunkCoord::new(0, 0, 0));
        // Cube keeps all 12 triangles; the ramp has no −Z face to cull.
        assert_eq!(mesh.triangle_count(), 20);
    }

    #[test]
    fn test_rotated_ramp_occludes_rotated_direction() {
        let mut world = one_layer_world();
        // One rotation step carries the ramp's back from +Z to +X.
        world
            .set_voxel(
                "ground",
                VoxelCoord::new(0, 0, 0),
                VoxelEntry::with_transform(BlockId(2), VoxelTransform::encode(1, false, false, false)),
            )
            .unwrap();
        place(&mut world, "ground", 1, 0, 0, 1);
        let mesh = build(&world, "ground", ChunkCoord::new(0, 0, 0));
        // Same mutual culling as the unrotated back-to-back case.
        assert_eq!(mesh.triangle_count(), 16);
    }

    #[test]
    fn test_mirrored_cube_winding_stays_outward() {
        let mut world = one_layer_world();
        world
            .set_voxel(
                "ground",
                VoxelCoord::new(0, 0, 0),
                VoxelEntry::with_transform(BlockId(1), VoxelTransform::encode(0, true, false, false)),
            )
            .unwrap();
        let mesh = build(&world, "ground", ChunkCoord::new(0, 0, 0));

        let center = Vec3::splat(0.5);
        for batch in mesh.batches.values() {
            for tri in batch.indices.chunks_exact(3) {
                let [a, b, c] = [
                    Vec3::from(batch.positions[tri[0] as usize]),
                    Vec3::from(batch.positions[tri[1] as usize]),
                    Vec3::from(batch.positions[tri[2] as usize]),
                ];
                let normal = (b - a).cross(c - a);
                let outward = (a + b + c) / 3.0 - center;
                assert!(normal.dot(outward) > 0.0, "inward-facing triangle after mirror");
            }
        }
    }

    #[test]
    fn test_transform_point_round_trips_and_stays_in_cell() {
        let corners = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(0.25, 0.5, 0.75),
        ];
        for rotation in 0u8..4 {
            let t = VoxelTransform::encode(rotation, false, false, false);
            for &p in &corners {
                let q = transform_point(p, t);
                assert!((0.0..=1.0).contains(&q.x));
                assert!((0.0..=1.0).contains(&q.z));
                assert_eq!(q.y, p.y);
            }
        }
        // Four steps are the identity.
        let one = VoxelTransform::encode(1, false, false, false);
        for &p in &corners {
            let mut q = p;
            for _ in 0..4 {
                q = transform_point(q, one);
            }
            assert!((q - p).length() < 1e-6);
        }
    }

    #[test]
    fn test_cell_center_is_fixed_under_all_transforms() {
        let center = Vec3::splat(0.5);
        for rotation in 0u8..4 {
            for flips in 0u8..8 {
                let t = VoxelTransform::encode(
                    rotation,
                    flips & 1 != 0,
                    flips & 2 != 0,
                    flips & 4 != 0,
                );
                assert!(
                    (transform_point(center, t) - center).length() < 1e-6,
                    "center moved under rotation={rotation} flips={flips:03b}"
                );
            }
        }
    }

    #[test]
    fn test_direction_transform_inverse() {
        for rotation in 0u8..4 {
            for flips in 0u8..8 {
                let t = VoxelTransform::encode(rotation, flips & 1 != 0, flips & 2 != 0, flips & 4 != 0);
                for dir in strata_blocks::face::ALL_DIRECTIONS {
                    assert_eq!(inverse_transform_dir(transform_dir(dir, t), t), dir);
                }
            }
        }
    }

    #[test]
    fn test_unknown_block_skipped_silently() {
        let mut world = one_layer_world();
        place(&mut world, "ground", 0, 0, 0, 99);
        let mesh = build(&world, "ground", ChunkCoord::new(0, 0, 0));
        assert!(mesh.is_empty());
    }

    #[test]
    fn test_uvs_land_in_tile_rect() {
        let mut world = one_layer_world();
        place(&mut world, "ground", 0, 0, 0, 1);
        let mesh = build(&world, "ground", ChunkCoord::new(0, 0, 0));

        let batch = &mesh.batches["terrain"];
        // Tile (0, 0) of a 4×4 grid of 16px tiles.
        let (off_u, off_v, scale) = (0.0078125, 0.7578125, 0.234375);
        for &[u, v] in &batch.uvs {
            assert!(u >= off_u - 1e-6 && u <= off_u + scale + 1e-6);
            assert!(v >= off_v - 1e-6 && v <= off_v + scale + 1e-6);
        }
    }

    #[test]
    fn test_collision_mesh_matches_render_culling() {
        let (blocks, shapes) = registries();
        let mut world = one_layer_world();
        place(&mut world, "ground", 0, 0, 0, 1);
        place(&mut world, "ground", 1, 0, 0, 1);
        let surface =
            build_chunk_collision_mesh(&world, "ground", ChunkCoord::new(0, 0, 0), &blocks, &shapes)
                .unwrap();
        // Same 20 triangles the render mesh keeps for two adjacent cubes.
        assert_eq!(surface.triangle_count(), 20);
        assert_eq!(surface.positions.len(), 40);
    }

    #[test]
    fn test_collision_mesh_skips_non_collidable_blocks() {
        let (blocks, shapes) = registries();
        let mut world = one_layer_world();
        place(&mut world, "ground", 0, 0, 0, 1);
        place(&mut world, "ground", 0, 0, 2, 3);
        let surface =
            build_chunk_collision_mesh(&world, "ground", ChunkCoord::new(0, 0, 0), &blocks, &shapes)
                .unwrap();
        assert_eq!(surface.triangle_count(), 12);
        // The decorative block still renders.
        let mesh = build(&world, "ground", ChunkCoord::new(0, 0, 0));
        assert_eq!(mesh.triangle_count(), 24);
    }

    #[test]
    fn test_rebuild_dirty_clears_flags() {
        let (blocks, shapes) = registries();
        let tilesets = tilesets();
        let mut world = one_layer_world();
        place(&mut world, "ground", 0, 0, 0, 1);
        place(&mut world, "ground", 20, 0, 0, 1);

        let rebuilt = rebuild_dirty(&mut world, &blocks, &shapes, &tilesets).unwrap();
        assert_eq!(rebuilt.len(), 2);
        assert_eq!(world.layer("ground").unwrap().dirty_chunks().count(), 0);

        let rebuilt = rebuild_dirty(&mut world, &blocks, &shapes, &tilesets).unwrap();
        assert!(rebuilt.is_empty());
    }

    #[test]
    fn test_rebuild_reports_world_origin() {
        let (blocks, shapes) = registries();
        let tilesets = tilesets();
        let mut world = one_layer_world();
        place(&mut world, "ground", 20, 0, 0, 1);
        world
            .set_layer_offset("ground", VoxelCoord::new(0, 4, 0))
            .unwrap();

        let rebuilt = rebuild_dirty(&mut world, &blocks, &shapes, &tilesets).unwrap();
        let update = rebuilt
            .iter()
            .find(|u| u.coord == ChunkCoord::new(1, 0, 0))
            .unwrap();
        assert_eq!(update.layer, "ground");
        assert_eq!(update.origin, Vec3::new(16.0, 4.0, 0.0));
    }
}

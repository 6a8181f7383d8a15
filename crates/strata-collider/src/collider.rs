//! Chunk collider descriptors and their Rapier insertion/refresh lifecycle.
//!
//! Each chunk with solid content gets exactly one fixed rigid body placed at
//! the chunk's world origin (chunk origin plus layer offset). Attached to it
//! is either a set of unit cuboids (one per solid voxel) or a single triangle
//! mesh reusing the chunk's culled collision surface — the trimesh path wins
//! as soon as any voxel in the chunk hints it.

use glam::Vec3;
use rapier3d::prelude::*;
use rustc_hash::FxHashMap;
use tracing::warn;

use strata_blocks::{BlockRegistry, CollisionHint, ShapeRegistry};
use strata_mesh::build_chunk_collision_mesh;
use strata_voxel::{ChunkCoord, VoxelCoord, World, from_linear_index};

use crate::PhysicsWorld;

const CHUNK_FRICTION: f32 = 0.7;

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// The collision shape chosen for one chunk, in chunk-local coordinates.
#[derive(Clone, Debug)]
pub enum ChunkColliderDesc {
    /// One unit cuboid per solid voxel; coordinates are chunk-local cells.
    Boxes(Vec<VoxelCoord>),
    /// A single triangle mesh over the chunk's culled collision surface.
    Trimesh {
        /// Vertex positions relative to the chunk origin.
        vertices: Vec<Vector>,
        /// Triangle index triples.
        indices: Vec<[u32; 3]>,
    },
}

/// Builds the collider descriptor for one chunk of one layer.
///
/// Returns `None` when the chunk is missing, the layer is invisible, or no
/// voxel has collidable geometry. Voxels with unregistered blocks or shapes,
/// blocks marked non-collidable, and voxels hinted [`CollisionHint::None`]
/// contribute nothing.
pub fn build_chunk_collider_desc(
    world: &World,
    layer_name: &str,
    coord: ChunkCoord,
    blocks: &BlockRegistry,
    shapes: &ShapeRegistry,
) -> Option<ChunkColliderDesc> {
    let layer = world.layer(layer_name)?;
    if !layer.visible() {
        return None;
    }
    let chunk = layer.chunk(coord)?;
    let size = layer.chunk_size();

    // First pass decides the representation: one trimesh-hinted voxel makes
    // the whole chunk a trimesh, since the two cannot mix under one body
    // without seams at shared edges.
    let mut any_trimesh = false;
    let mut any_box = false;
    for (_, entry) in chunk.entries() {
        let Some(shape) = blocks
            .get(entry.block)
            .filter(|d| d.collidable)
            .and_then(|d| shapes.get(&d.shape))
        else {
            continue;
        };
        match shape.collision {
            CollisionHint::Trimesh => any_trimesh = true,
            CollisionHint::Box => any_box = true,
            CollisionHint::None => {}
        }
    }

    if any_trimesh {
        // The mesh builder already culled interior faces between adjacent
        // solid voxels, so the buffers carry no coincident opposite-winding
        // triangles.
        let surface = build_chunk_collision_mesh(world, layer_name, coord, blocks, shapes).ok()?;
        if surface.is_empty() {
            return None;
        }
        let vertices = surface
            .positions
            .iter()
            .map(|p| Vector::new(p.x, p.y, p.z))
            .collect();
        return Some(ChunkColliderDesc::Trimesh {
            vertices,
            indices: surface.indices,
        });
    }

    if any_box {
        let mut cells = Vec::new();
        for (index, entry) in chunk.entries() {
            let Some(shape) = blocks
                .get(entry.block)
                .filter(|d| d.collidable)
                .and_then(|d| shapes.get(&d.shape))
            else {
                continue;
            };
            if shape.collision != CollisionHint::Box {
                continue;
            }
            let (lx, ly, lz) = from_linear_index(size, index);
            cells.push(VoxelCoord::new(lx as i32, ly as i32, lz as i32));
        }
        return Some(ChunkColliderDesc::Boxes(cells));
    }

    None
}

// ---------------------------------------------------------------------------
// Insertion
// ---------------------------------------------------------------------------

/// Inserts a chunk collider into the physics world.
///
/// `origin` is the chunk's world-space origin in meters. Returns the handle
/// of the fixed body carrying all of the chunk's colliders.
pub fn insert_chunk_collider(
    physics: &mut PhysicsWorld,
    desc: &ChunkColliderDesc,
    origin: Vec3,
) -> RigidBodyHandle {
    let body = RigidBodyBuilder::fixed()
        .translation(Vector::new(origin.x, origin.y, origin.z))
        .build();
    let body_handle = physics.rigid_body_set.insert(body);

    match desc {
        ChunkColliderDesc::Boxes(cells) => {
            for cell in cells {
                let collider = ColliderBuilder::cuboid(0.5, 0.5, 0.5)
                    .translation(Vector::new(
                        cell.x as f32 + 0.5,
                        cell.y as f32 + 0.5,
                        cell.z as f32 + 0.5,
                    ))
                    .friction(CHUNK_FRICTION)
                    .restitution(0.0)
                    .build();
                physics.collider_set.insert_with_parent(
                    collider,
                    body_handle,
                    &mut physics.rigid_body_set,
                );
            }
        }
        ChunkColliderDesc::Trimesh { vertices, indices } => {
            match SharedShape::trimesh(vertices.clone(), indices.clone()) {
                Ok(shape) => {
                    let collider = ColliderBuilder::new(shape)
                        .friction(CHUNK_FRICTION)
                        .restitution(0.0)
                        .build();
                    physics.collider_set.insert_with_parent(
                        collider,
                        body_handle,
                        &mut physics.rigid_body_set,
                    );
                }
                Err(err) => {
                    warn!(error = %err, "chunk trimesh rejected by rapier; chunk left non-solid");
                }
            }
        }
    }
    body_handle
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Maps `(layer, chunk)` keys to their active fixed-body handles.
#[derive(Debug, Default)]
pub struct ChunkColliderMap {
    map: FxHashMap<(String, ChunkCoord), RigidBodyHandle>,
}

impl ChunkColliderMap {
    /// Creates a new empty collider map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a mapping for a chunk's body handle.
    pub fn insert(&mut self, layer: &str, coord: ChunkCoord, handle: RigidBodyHandle) {
        self.map.insert((layer.to_string(), coord), handle);
    }

    /// Removes and returns the body handle for a chunk.
    pub fn remove(&mut self, layer: &str, coord: ChunkCoord) -> Option<RigidBodyHandle> {
        self.map.remove(&(layer.to_string(), coord))
    }

    /// Returns `true` if the chunk has a tracked body.
    pub fn contains(&self, layer: &str, coord: ChunkCoord) -> bool {
        self.map.contains_key(&(layer.to_string(), coord))
    }

    /// Number of tracked chunk bodies.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Rebuilds the colliders of the listed chunks from current voxel data.
///
/// Pairs with the mesh rebuild pass: feed it the same dirty `(layer, chunk)`
/// list. Old bodies (and their attached colliders) are removed first; chunks
/// that no longer have solid content end up with no body at all.
pub fn refresh_chunk_colliders(
    physics: &mut PhysicsWorld,
    world: &World,
    blocks: &BlockRegistry,
    shapes: &ShapeRegistry,
    collider_map: &mut ChunkColliderMap,
    dirty: &[(String, ChunkCoord)],
) {
    for (layer_name, coord) in dirty {
        if let Some(old) = collider_map.remove(layer_name, *coord) {
            remove_body(physics, old);
        }

        let Some(desc) = build_chunk_collider_desc(world, layer_name, *coord, blocks, shapes)
        else {
            continue;
        };
        let Some(layer) = world.layer(layer_name) else {
            continue;
        };
        let origin = coord.origin(layer.chunk_size()).offset(layer.offset());
        let origin = Vec3::new(origin.x as f32, origin.y as f32, origin.z as f32);
        let handle = insert_chunk_collider(physics, &desc, origin);
        collider_map.insert(layer_name, *coord, handle);
    }
}

/// Removes the bodies of chunks that no longer exist (layer removed, chunks
/// discarded).
pub fn remove_chunk_colliders(
    physics: &mut PhysicsWorld,
    collider_map: &mut ChunkColliderMap,
    gone: &[(String, ChunkCoord)],
) {
    for (layer_name, coord) in gone {
        if let Some(handle) = collider_map.remove(layer_name, *coord) {
            remove_body(physics, handle);
        }
    }
}

fn remove_body(physics: &mut PhysicsWorld, handle: RigidBodyHandle) {
    physics.rigid_body_set.remove(
        handle,
        &mut physics.island_manager,
        &mut physics.collider_set,
        &mut physics.impulse_joint_set,
        &mut physics.multibody_joint_set,
        true,
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

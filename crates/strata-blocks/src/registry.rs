//! Registries for block definitions and shapes.
//!
//! Block id 0 is the air sentinel and can never be registered. Re-registering
//! an existing id or shape name replaces the previous entry (content packs
//! override built-ins), with a warning so accidental collisions are visible.

use std::collections::HashMap;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use strata_tileset::TileRef;
use strata_voxel::BlockId;

use crate::builtin::builtin_shapes;
use crate::face::FaceDirection;
use crate::shape::BlockShape;

/// Errors from block registration.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Block id 0 is reserved for air.
    #[error("block id 0 is reserved for air")]
    ReservedId,
}

// ---------------------------------------------------------------------------
// Block definitions
// ---------------------------------------------------------------------------

/// A registered block type: shape, default tile, and per-face overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDefinition {
    /// Numeric id stored in voxel data.
    pub id: BlockId,
    /// Human-readable name, for editors and logs.
    pub name: String,
    /// Shape name resolved against the [`ShapeRegistry`].
    pub shape: String,
    /// Whether voxels of this block participate in collision at all; the
    /// shape's hint then picks the collider strategy.
    #[serde(default = "default_collidable")]
    pub collidable: bool,
    /// Tile applied to faces without an override.
    pub tile: TileRef,
    /// Per-face tile overrides, keyed by the face's shape-local direction.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub face_tiles: HashMap<FaceDirection, TileRef>,
}

fn default_collidable() -> bool {
    true
}

impl BlockDefinition {
    /// A collidable definition with no per-face overrides.
    pub fn new(id: BlockId, name: impl Into<String>, shape: impl Into<String>, tile: TileRef) -> Self {
        Self {
            id,
            name: name.into(),
            shape: shape.into(),
            collidable: true,
            tile,
            face_tiles: HashMap::new(),
        }
    }

    /// Disables collision for this block (builder style).
    pub fn non_collidable(mut self) -> Self {
        self.collidable = false;
        self
    }

    /// Adds a per-face tile override (builder style).
    pub fn with_face_tile(mut self, direction: FaceDirection, tile: TileRef) -> Self {
        self.face_tiles.insert(direction, tile);
        self
    }

    /// The tile for a face, honoring overrides.
    ///
    /// Overrides key on the shape-local direction, before any per-voxel
    /// rotation: a rotated block keeps its texture assignment.
    pub fn tile_for(&self, direction: FaceDirection) -> &TileRef {
        self.face_tiles.get(&direction).unwrap_or(&self.tile)
    }
}

/// Maps block ids to definitions.
#[derive(Debug, Default)]
pub struct BlockRegistry {
    blocks: FxHashMap<BlockId, BlockDefinition>,
}

impl BlockRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a block definition, replacing any previous one with this id.
    ///
    /// # Errors
    ///
    /// [`RegistryError::ReservedId`] for id 0.
    pub fn register(&mut self, definition: BlockDefinition) -> Result<(), RegistryError> {
        if definition.id.is_air() {
            return Err(RegistryError::ReservedId);
        }
        if let Some(previous) = self.blocks.insert(definition.id, definition) {
            warn!(id = previous.id.0, name = %previous.name, "block definition replaced");
        }
        Ok(())
    }

    /// Looks up a definition by id. Unregistered ids yield `None`; callers
    /// decide whether that means skip (meshing) or report (validation).
    pub fn get(&self, id: BlockId) -> Option<&BlockDefinition> {
        self.blocks.get(&id)
    }

    /// Number of registered blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterates over all definitions (unordered).
    pub fn iter(&self) -> impl Iterator<Item = &BlockDefinition> {
        self.blocks.values()
    }
}

// ---------------------------------------------------------------------------
// Shapes
// ---------------------------------------------------------------------------

/// Maps shape names to geometry. Starts populated with the built-ins.
#[derive(Debug)]
pub struct ShapeRegistry {
    shapes: HashMap<String, Arc<BlockShape>>,
}

impl Default for ShapeRegistry {
    fn default() -> Self {
        let mut registry = Self {
            shapes: HashMap::new(),
        };
        for shape in builtin_shapes() {
            registry.register(shape);
        }
        registry
    }
}

impl ShapeRegistry {
    /// A registry pre-loaded with the built-in shape library.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with no shapes at all, for fully custom content.
    pub fn empty() -> Self {
        Self {
            shapes: HashMap::new(),
        }
    }

    /// Registers a shape, replacing any previous one with the same name.
    pub fn register(&mut self, shape: BlockShape) {
        let name = shape.name.clone();
        if self.shapes.insert(name.clone(), Arc::new(shape)).is_some() {
            warn!(shape = %name, "shape definition replaced");
        }
    }

    /// Looks up a shape by name.
    pub fn get(&self, name: &str) -> Option<&Arc<BlockShape>> {
        self.shapes.get(name)
    }

    /// Number of registered shapes.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Returns `true` if no shapes are registered.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn stone() -> BlockDefinition {
        BlockDefinition::new(BlockId(1), "stone", "cube", TileRef::new(0, 0))
    }

    #[test]
    fn test_air_id_rejected() {
        let mut registry = BlockRegistry::new();
        let result = registry.register(BlockDefinition::new(
            BlockId::AIR,
            "bogus",
            "cube",
            TileRef::new(0, 0),
        ));
        assert!(matches!(result, Err(RegistryError::ReservedId)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = BlockRegistry::new();
        registry.register(stone()).unwrap();
        registry
            .register(BlockDefinition::new(
                BlockId(1),
                "granite",
                "cube",
                TileRef::new(1, 0),
            ))
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(BlockId(1)).unwrap().name, "granite");
    }

    #[test]
    fn test_unregistered_id_is_none() {
        let registry = BlockRegistry::new();
        assert!(registry.get(BlockId(42)).is_none());
    }

    #[test]
    fn test_face_tile_override() {
        let grass = stone()
            .with_face_tile(FaceDirection::PosY, TileRef::new(2, 0))
            .with_face_tile(FaceDirection::NegY, TileRef::new(3, 0));

        assert_eq!(grass.tile_for(FaceDirection::PosY), &TileRef::new(2, 0));
        assert_eq!(grass.tile_for(FaceDirection::NegY), &TileRef::new(3, 0));
        assert_eq!(grass.tile_for(FaceDirection::PosX), &TileRef::new(0, 0));
    }

    #[test]
    fn test_builtin_shapes_preloaded() {
        let shapes = ShapeRegistry::new();
        for name in [
            "cube",
            "slab",
            "slab_top",
            "pole",
            "ramp",
            "corner_ramp",
            "corner_ramp_mirrored",
            "stairs",
            "stairs_mirrored",
        ] {
            assert!(shapes.get(name).is_some(), "missing builtin {name}");
        }
        assert!(ShapeRegistry::empty().is_empty());
    }

    #[test]
    fn test_definition_serde_round_trip() {
        let def = stone().with_face_tile(FaceDirection::PosY, TileRef::new(2, 0));
        let json = serde_json::to_string(&def).unwrap();
        assert!(json.contains("\"faceTiles\""));
        let back: BlockDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, def);
    }
}

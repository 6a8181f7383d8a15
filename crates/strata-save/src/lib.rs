//! World snapshots: a JSON-safe representation of all layers, their voxels,
//! and the registered tileset definitions (metadata only, never pixels).
//!
//! Voxels are keyed by world coordinate rather than linear index, so a
//! snapshot survives chunk-size changes. Loading restores voxel and layer
//! state first and treats tileset re-registration as a best-effort follow-up
//! reported to the caller, never rolled back.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use strata_tileset::{TilesetDefinition, TilesetManager};
use strata_voxel::{BlockId, VoxelCoord, VoxelEntry, VoxelTransform, World, WorldError};

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// The durable snapshot format.
///
/// `object_layers` is opaque data owned by the embedding editor (entity
/// placements and the like); it rides through save/load untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldSnapshot {
    /// Layers in ascending compositing order.
    pub layers: Vec<LayerSnapshot>,
    /// Opaque editor data, passed through untouched.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub object_layers: Vec<Value>,
    /// Registered tileset definitions (no pixel data).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tilesets: Vec<TilesetDefinition>,
}

/// One layer's metadata and voxels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSnapshot {
    /// Layer name, unique within the world.
    pub name: String,
    /// Compositing priority.
    pub order: i32,
    /// World-space offset.
    pub offset: VoxelCoord,
    /// Visibility flag.
    pub visible: bool,
    /// Placed voxels, keyed by world coordinate.
    #[serde(default)]
    pub voxels: Vec<VoxelSnapshot>,
    /// Arbitrary property bag.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub properties: serde_json::Map<String, Value>,
}

/// One placed voxel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoxelSnapshot {
    /// World-space position (layer offset already applied).
    pub position: VoxelCoord,
    /// Numeric block id (never 0).
    pub block_id: u16,
    /// Packed orientation byte.
    pub transform: u8,
}

/// Errors from snapshot parsing and restore.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot is not valid JSON for the schema.
    #[error("snapshot parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// Restoring layers hit a world-level conflict (duplicate layer name).
    #[error(transparent)]
    World(#[from] WorldError),
}

/// What happened during the best-effort half of a load.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadReport {
    /// Opaque editor data from the snapshot, for the caller to re-own.
    pub object_layers: Vec<Value>,
    /// Tileset ids skipped because they were already registered.
    pub tilesets_skipped: Vec<String>,
    /// Tilesets that failed to register, with the reason.
    pub tilesets_failed: Vec<(String, String)>,
}

// ---------------------------------------------------------------------------
// Save
// ---------------------------------------------------------------------------

/// Captures the whole world into a snapshot.
///
/// Voxels are written in world coordinates (layer-local plus offset) and
/// sorted for deterministic output. `object_layers` is whatever opaque data
/// the embedding editor wants carried alongside.
pub fn save(
    world: &World,
    tilesets: &TilesetManager,
    object_layers: Vec<Value>,
) -> WorldSnapshot {
    let layers = world
        .layers()
        .iter()
        .map(|layer| {
            let offset = layer.offset();
            let mut voxels: Vec<VoxelSnapshot> = layer
                .voxels()
                .map(|(local, entry)| VoxelSnapshot {
                    position: local.offset(offset),
                    block_id: entry.block.0,
                    transform: entry.transform.0,
                })
                .collect();
            voxels.sort_by_key(|v| (v.position.x, v.position.y, v.position.z));
            LayerSnapshot {
                name: layer.name().to_string(),
                order: layer.order(),
                offset,
                visible: layer.visible(),
                voxels,
                properties: layer.properties().clone(),
            }
        })
        .collect();

    WorldSnapshot {
        layers,
        object_layers,
        tilesets: tilesets.definitions().cloned().collect(),
    }
}

/// Serializes a snapshot to a JSON string.
pub fn to_json(snapshot: &WorldSnapshot) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string(snapshot)?)
}

/// Parses a snapshot from a JSON string.
pub fn from_json(json: &str) -> Result<WorldSnapshot, SnapshotError> {
    Ok(serde_json::from_str(json)?)
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Restores a snapshot into the world.
///
/// The world is cleared, layers are recreated in saved order, and voxel
/// placements are replayed — all before tilesets are touched, so a tileset
/// failure never corrupts restored voxel data. Tilesets already registered
/// are skipped; ones that fail to register are reported, not fatal.
pub fn load(
    snapshot: &WorldSnapshot,
    world: &mut World,
    tilesets: &mut TilesetManager,
) -> Result<LoadReport, SnapshotError> {
    world.clear();

    for layer_snap in &snapshot.layers {
        world.create_layer(&layer_snap.name, layer_snap.order)?;
        world.set_layer_offset(&layer_snap.name, layer_snap.offset)?;
        world.set_layer_visible(&layer_snap.name, layer_snap.visible)?;
        if let Some(layer) = world.layer_mut(&layer_snap.name) {
            *layer.properties_mut() = layer_snap.properties.clone();
        }
        for voxel in &layer_snap.voxels {
            if voxel.block_id == 0 {
                warn!(position = ?voxel.position, "snapshot holds an air voxel entry; skipped");
                continue;
            }
            world.set_voxel(
                &layer_snap.name,
                voxel.position,
                VoxelEntry::with_transform(
                    BlockId(voxel.block_id),
                    VoxelTransform(voxel.transform),
                ),
            )?;
        }
    }

    let mut report = LoadReport {
        object_layers: snapshot.object_layers.clone(),
        ..LoadReport::default()
    };
    for definition in &snapshot.tilesets {
        if tilesets.contains(&definition.id) {
            report.tilesets_skipped.push(definition.id.clone());
            continue;
        }
        if let Err(err) = tilesets.register(definition.clone(), None) {
            warn!(tileset = %definition.id, error = %err, "tileset failed to re-register on load");
            report
                .tilesets_failed
                .push((definition.id.clone(), err.to_string()));
        }
    }
    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

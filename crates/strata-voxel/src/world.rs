//! The voxel world: owns all layers, routes mutations, and resolves
//! composited reads across layers.
//!
//! Composited reads scan layers from highest to lowest order and return the
//! first placed voxel at the world cell, so higher layers override lower ones
//! without mutating their data. All mutation paths emit [`WorldEvent`]s.

use thiserror::Error;

use crate::coords::VoxelCoord;
use crate::chunk::DEFAULT_CHUNK_SIZE;
use crate::events::{WorldEvent, WorldEventBuffer};
use crate::layer::Layer;
use crate::transform::VoxelEntry;

/// Errors from world-level configuration mistakes.
///
/// Content-sparse conditions (reading air, removing a missing voxel) are
/// `Option`s, not errors; these variants indicate caller setup bugs.
#[derive(Debug, Error)]
pub enum WorldError {
    /// A layer with this name already exists.
    #[error("duplicate layer name: {0}")]
    DuplicateLayer(String),
    /// No layer with this name exists.
    #[error("unknown layer: {0}")]
    UnknownLayer(String),
}

/// Owns all layers and the mutation event buffer.
///
/// Single-threaded by design: the embedding application serializes edits and
/// drives the per-frame rebuild pass from one logical thread.
#[derive(Debug, Default)]
pub struct World {
    chunk_size: u32,
    /// Kept sorted by ascending order; composited reads scan in reverse.
    layers: Vec<Layer>,
    events: WorldEventBuffer,
}

impl World {
    /// Creates an empty world with the default chunk size (16).
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// Creates an empty world with an explicit chunk side length.
    pub fn with_chunk_size(chunk_size: u32) -> Self {
        Self {
            chunk_size,
            layers: Vec::new(),
            events: WorldEventBuffer::new(),
        }
    }

    /// Chunk side length used by all layers of this world.
    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    // -----------------------------------------------------------------------
    // Layer management
    // -----------------------------------------------------------------------

    /// Creates a new layer and returns a mutable reference to it.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateLayer`] if the name is taken.
    pub fn create_layer(&mut self, name: &str, order: i32) -> Result<&mut Layer, WorldError> {
        if self.layer_index(name).is_some() {
            return Err(WorldError::DuplicateLayer(name.to_string()));
        }
        let layer = Layer::new(name, order, self.chunk_size);
        // Insert keeping ascending order; ties keep insertion order.
        let at = self.layers.partition_point(|l| l.order() <= order);
        self.layers.insert(at, layer);
        self.events.send(WorldEvent::LayerAdded {
            name: name.to_string(),
        });
        Ok(&mut self.layers[at])
    }

    /// Removes a layer, discarding all its chunks.
    pub fn remove_layer(&mut self, name: &str) -> Result<Layer, WorldError> {
        let index = self
            .layer_index(name)
            .ok_or_else(|| WorldError::UnknownLayer(name.to_string()))?;
        let layer = self.layers.remove(index);
        self.events.send(WorldEvent::LayerRemoved {
            name: name.to_string(),
        });
        Ok(layer)
    }

    /// Immutable access to a layer by name.
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name() == name)
    }

    /// Mutable access to a layer by name.
    pub fn layer_mut(&mut self, name: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.name() == name)
    }

    /// All layers in ascending compositing order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Changes a layer's compositing order.
    ///
    /// Any chunk's composited visibility may change, so every chunk in every
    /// layer is marked dirty (coarse but correct).
    pub fn set_layer_order(&mut self, name: &str, order: i32) -> Result<(), WorldError> {
        let index = self
            .layer_index(name)
            .ok_or_else(|| WorldError::UnknownLayer(name.to_string()))?;
        let mut layer = self.layers.remove(index);
        layer.set_order(order);
        let at = self.layers.partition_point(|l| l.order() <= order);
        self.layers.insert(at, layer);
        self.mark_all_dirty();
        self.events.send(WorldEvent::LayerReordered {
            name: name.to_string(),
            order,
        });
        Ok(())
    }

    /// Replaces a layer's world-space offset.
    ///
    /// Voxel data does not move; only the read/write mapping shifts. Every
    /// chunk whose composited visibility could change must be invalidated,
    /// which this implements as a full dirty pass over all layers.
    pub fn set_layer_offset(&mut self, name: &str, offset: VoxelCoord) -> Result<(), WorldError> {
        let layer = self
            .layers
            .iter_mut()
            .find(|l| l.name() == name)
            .ok_or_else(|| WorldError::UnknownLayer(name.to_string()))?;
        layer.set_offset(offset);
        self.mark_all_dirty();
        self.events.send(WorldEvent::LayerOffsetChanged {
            name: name.to_string(),
            offset,
        });
        Ok(())
    }

    /// Shifts a layer's offset by a delta. Same invalidation as
    /// [`set_layer_offset`](Self::set_layer_offset).
    pub fn translate_layer(&mut self, name: &str, delta: VoxelCoord) -> Result<(), WorldError> {
        let current = self
            .layer(name)
            .ok_or_else(|| WorldError::UnknownLayer(name.to_string()))?
            .offset();
        self.set_layer_offset(name, current.offset(delta))
    }

    /// Shows or hides a layer, invalidating all chunks on change.
    pub fn set_layer_visible(&mut self, name: &str, visible: bool) -> Result<(), WorldError> {
        let layer = self
            .layers
            .iter_mut()
            .find(|l| l.name() == name)
            .ok_or_else(|| WorldError::UnknownLayer(name.to_string()))?;
        if layer.visible() == visible {
            return Ok(());
        }
        layer.set_visible(visible);
        self.mark_all_dirty();
        self.events.send(WorldEvent::LayerVisibilityChanged {
            name: name.to_string(),
            visible,
        });
        Ok(())
    }

    /// Marks every chunk in every layer dirty.
    ///
    /// Also the hook for registry live-edits: after redefining a block, call
    /// this to force re-meshing of chunks containing it (the registry has no
    /// chunk awareness).
    pub fn mark_all_dirty(&mut self) {
        for layer in &mut self.layers {
            layer.mark_all_dirty();
        }
    }

    /// Removes all layers and pending events.
    pub fn clear(&mut self) {
        self.layers.clear();
        self.events.clear();
    }

    // -----------------------------------------------------------------------
    // Voxel mutation
    // -----------------------------------------------------------------------

    /// Places a voxel at a world coordinate in the named layer.
    ///
    /// The layer's offset is subtracted before routing to the owning chunk.
    /// An air block id routes to [`remove_voxel`](Self::remove_voxel) so that
    /// id 0 is never stored.
    pub fn set_voxel(
        &mut self,
        layer_name: &str,
        coord: VoxelCoord,
        entry: VoxelEntry,
    ) -> Result<(), WorldError> {
        if entry.block.is_air() {
            self.remove_voxel(layer_name, coord)?;
            return Ok(());
        }
        let layer = self
            .layers
            .iter_mut()
            .find(|l| l.name() == layer_name)
            .ok_or_else(|| WorldError::UnknownLayer(layer_name.to_string()))?;
        let local = coord.minus(layer.offset());
        layer.set(local, entry);
        self.events.send(WorldEvent::VoxelSet {
            layer: layer_name.to_string(),
            coord,
            entry,
        });
        Ok(())
    }

    /// Removes the voxel at a world coordinate in the named layer.
    pub fn remove_voxel(
        &mut self,
        layer_name: &str,
        coord: VoxelCoord,
    ) -> Result<Option<VoxelEntry>, WorldError> {
        let layer = self
            .layers
            .iter_mut()
            .find(|l| l.name() == layer_name)
            .ok_or_else(|| WorldError::UnknownLayer(layer_name.to_string()))?;
        let local = coord.minus(layer.offset());
        let removed = layer.remove(local);
        if let Some(old) = removed {
            self.events.send(WorldEvent::VoxelRemoved {
                layer: layer_name.to_string(),
                coord,
                old,
            });
        }
        Ok(removed)
    }

    /// Places many voxels in one layer, returning the number that changed.
    ///
    /// A throughput shortcut over repeated [`set_voxel`](Self::set_voxel):
    /// each touched chunk is marked dirty at most once regardless of how many
    /// of its voxels changed.
    pub fn set_voxel_bulk(
        &mut self,
        layer_name: &str,
        voxels: &[(VoxelCoord, VoxelEntry)],
    ) -> Result<usize, WorldError> {
        let layer_offset = self
            .layer(layer_name)
            .ok_or_else(|| WorldError::UnknownLayer(layer_name.to_string()))?
            .offset();
        let mut changed = 0;
        for &(coord, entry) in voxels {
            if entry.block.is_air() {
                if self.remove_voxel(layer_name, coord)?.is_some() {
                    changed += 1;
                }
                continue;
            }
            let local = coord.minus(layer_offset);
            let layer = self.layer_mut(layer_name).expect("layer checked above");
            if layer.get(local) == Some(entry) {
                continue;
            }
            layer.set(local, entry);
            self.events.send(WorldEvent::VoxelSet {
                layer: layer_name.to_string(),
                coord,
                entry,
            });
            changed += 1;
        }
        Ok(changed)
    }

    /// Removes many voxels in one layer, returning the number removed.
    pub fn remove_voxel_bulk(
        &mut self,
        layer_name: &str,
        coords: &[VoxelCoord],
    ) -> Result<usize, WorldError> {
        let mut removed = 0;
        for &coord in coords {
            if self.remove_voxel(layer_name, coord)?.is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Composited reads
    // -----------------------------------------------------------------------

    /// Composited read: the first placed voxel at this world cell, scanning
    /// visible layers from highest to lowest order.
    pub fn get_voxel(&self, coord: VoxelCoord) -> Option<VoxelEntry> {
        for layer in self.layers.iter().rev() {
            if !layer.visible() {
                continue;
            }
            let local = coord.minus(layer.offset());
            if let Some(entry) = layer.get(local) {
                return Some(entry);
            }
        }
        None
    }

    /// Composited read one step away from `coord`.
    ///
    /// `step` is a unit axis offset; the mesh builder calls this for every
    /// candidate face, so neighbors in adjacent chunks and adjacent layers
    /// resolve through the same path.
    pub fn get_voxel_neighbour(&self, coord: VoxelCoord, step: VoxelCoord) -> Option<VoxelEntry> {
        self.get_voxel(coord.offset(step))
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Read access to the mutation event buffer.
    pub fn events(&self) -> &WorldEventBuffer {
        &self.events
    }

    /// Advances the event buffer by one frame.
    pub fn swap_events(&mut self) {
        self.events.swap();
    }

    fn layer_index(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.name() == name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{BlockId, VoxelTransform};

    fn entry(id: u16) -> VoxelEntry {
        VoxelEntry::new(BlockId(id))
    }

    fn two_layer_world() -> World {
        let mut world = World::new();
        world.create_layer("ground", 0).unwrap();
        world.create_layer("overlay", 1).unwrap();
        world
    }

    #[test]
    fn test_duplicate_layer_rejected() {
        let mut world = World::new();
        world.create_layer("ground", 0).unwrap();
        assert!(matches!(
            world.create_layer("ground", 5),
            Err(WorldError::DuplicateLayer(_))
        ));
    }

    #[test]
    fn test_set_get_roundtrip_through_world() {
        let mut world = two_layer_world();
        let v = VoxelCoord::new(3, 4, 5);
        world.set_voxel("ground", v, entry(1)).unwrap();
        assert_eq!(world.get_voxel(v), Some(entry(1)));
    }

    #[test]
    fn test_higher_layer_overrides_lower() {
        let mut world = two_layer_world();
        let v = VoxelCoord::new(0, 0, 0);
        world.set_voxel("ground", v, entry(1)).unwrap();
        world.set_voxel("overlay", v, entry(2)).unwrap();

        assert_eq!(world.get_voxel(v), Some(entry(2)));

        // Lower layer data is untouched underneath.
        world.remove_voxel("overlay", v).unwrap();
        assert_eq!(world.get_voxel(v), Some(entry(1)));
    }

    #[test]
    fn test_composited_read_falls_through_air() {
        let mut world = two_layer_world();
        world
            .set_voxel("ground", VoxelCoord::new(1, 0, 0), entry(1))
            .unwrap();
        // Overlay has nothing at this cell.
        assert_eq!(world.get_voxel(VoxelCoord::new(1, 0, 0)), Some(entry(1)));
        assert_eq!(world.get_voxel(VoxelCoord::new(2, 0, 0)), None);
    }

    #[test]
    fn test_invisible_layer_skipped_in_composite() {
        let mut world = two_layer_world();
        let v = VoxelCoord::new(0, 0, 0);
        world.set_voxel("ground", v, entry(1)).unwrap();
        world.set_voxel("overlay", v, entry(2)).unwrap();

        world.set_layer_visible("overlay", false).unwrap();
        assert_eq!(world.get_voxel(v), Some(entry(1)));
    }

    #[test]
    fn test_layer_offset_shifts_reads_without_moving_data() {
        let mut world = two_layer_world();
        let v = VoxelCoord::new(5, 0, 0);
        world.set_voxel("ground", v, entry(1)).unwrap();

        world
            .set_layer_offset("ground", VoxelCoord::new(10, 0, 0))
            .unwrap();

        // The stored cell now reads back 10 voxels over.
        assert_eq!(world.get_voxel(VoxelCoord::new(15, 0, 0)), Some(entry(1)));
        assert_eq!(world.get_voxel(v), None);
        // Layer-local storage is unchanged.
        assert_eq!(
            world.layer("ground").unwrap().get(VoxelCoord::new(5, 0, 0)),
            Some(entry(1))
        );
    }

    #[test]
    fn test_offset_change_marks_all_chunks_dirty() {
        let mut world = two_layer_world();
        world
            .set_voxel("ground", VoxelCoord::new(0, 0, 0), entry(1))
            .unwrap();
        world
            .set_voxel("overlay", VoxelCoord::new(40, 0, 0), entry(2))
            .unwrap();
        for name in ["ground", "overlay"] {
            let layer = world.layer_mut(name).unwrap();
            let coords: Vec<_> = layer.dirty_chunks().collect();
            for c in coords {
                layer.chunk_mut(c).unwrap().clear_dirty();
            }
        }

        world
            .translate_layer("overlay", VoxelCoord::new(0, 1, 0))
            .unwrap();

        assert_eq!(world.layer("ground").unwrap().dirty_chunks().count(), 1);
        assert_eq!(world.layer("overlay").unwrap().dirty_chunks().count(), 1);
    }

    #[test]
    fn test_bulk_set_dirties_each_chunk_once_and_counts_changes() {
        let mut world = two_layer_world();
        let voxels: Vec<_> = (0..8)
            .map(|i| (VoxelCoord::new(i, 0, 0), entry(1)))
            .collect();
        let changed = world.set_voxel_bulk("ground", &voxels).unwrap();
        assert_eq!(changed, 8);
        assert_eq!(world.layer("ground").unwrap().dirty_chunks().count(), 1);

        // Re-applying identical values changes nothing.
        let changed = world.set_voxel_bulk("ground", &voxels).unwrap();
        assert_eq!(changed, 0);
    }

    #[test]
    fn test_set_air_removes() {
        let mut world = two_layer_world();
        let v = VoxelCoord::new(2, 2, 2);
        world.set_voxel("ground", v, entry(1)).unwrap();
        world
            .set_voxel(
                "ground",
                v,
                VoxelEntry::with_transform(BlockId::AIR, VoxelTransform::IDENTITY),
            )
            .unwrap();
        assert_eq!(world.get_voxel(v), None);
    }

    #[test]
    fn test_unknown_layer_is_hard_error() {
        let mut world = World::new();
        assert!(matches!(
            world.set_voxel("nope", VoxelCoord::new(0, 0, 0), entry(1)),
            Err(WorldError::UnknownLayer(_))
        ));
    }

    #[test]
    fn test_neighbour_lookup_crosses_layers() {
        let mut world = two_layer_world();
        world
            .set_voxel("overlay", VoxelCoord::new(1, 0, 0), entry(2))
            .unwrap();
        let got = world.get_voxel_neighbour(VoxelCoord::new(0, 0, 0), VoxelCoord::new(1, 0, 0));
        assert_eq!(got, Some(entry(2)));
    }

    #[test]
    fn test_mutations_emit_events() {
        let mut world = two_layer_world();
        world.swap_events();
        world.swap_events(); // drop layer-creation events

        world
            .set_voxel("ground", VoxelCoord::new(0, 0, 0), entry(1))
            .unwrap();
        world.remove_voxel("ground", VoxelCoord::new(0, 0, 0)).unwrap();

        let events: Vec<_> = world.events().read().collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], WorldEvent::VoxelSet { .. }));
        assert!(matches!(events[1], WorldEvent::VoxelRemoved { .. }));
    }

    #[test]
    fn test_reorder_changes_composite_winner() {
        let mut world = two_layer_world();
        let v = VoxelCoord::new(0, 0, 0);
        world.set_voxel("ground", v, entry(1)).unwrap();
        world.set_voxel("overlay", v, entry(2)).unwrap();
        assert_eq!(world.get_voxel(v), Some(entry(2)));

        world.set_layer_order("ground", 5).unwrap();
        assert_eq!(world.get_voxel(v), Some(entry(1)));
    }

    #[test]
    fn test_remove_layer_discards_chunks() {
        let mut world = two_layer_world();
        let v = VoxelCoord::new(0, 0, 0);
        world.set_voxel("overlay", v, entry(2)).unwrap();
        world.remove_layer("overlay").unwrap();
        assert_eq!(world.get_voxel(v), None);
        assert!(world.layer("overlay").is_none());
    }
}

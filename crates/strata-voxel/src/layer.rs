//! A named, ordered collection of chunks sharing a world-space offset.
//!
//! Layers composite by priority order: higher layers' voxels win composited
//! reads at the same world cell without ever touching lower layers' data.
//! Chunks are created lazily on first write and persist once emptied (an
//! empty chunk simply yields no geometry).

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::chunk::Chunk;
use crate::coords::{ChunkCoord, VoxelCoord, local_in_chunk};
use crate::transform::VoxelEntry;

/// One compositing layer of the voxel world.
#[derive(Clone, Debug)]
pub struct Layer {
    name: String,
    order: i32,
    offset: VoxelCoord,
    visible: bool,
    properties: serde_json::Map<String, Value>,
    chunks: FxHashMap<ChunkCoord, Chunk>,
    chunk_size: u32,
}

impl Layer {
    /// Creates an empty, visible layer at offset zero.
    pub fn new(name: impl Into<String>, order: i32, chunk_size: u32) -> Self {
        Self {
            name: name.into(),
            order,
            offset: VoxelCoord::default(),
            visible: true,
            properties: serde_json::Map::new(),
            chunks: FxHashMap::default(),
            chunk_size,
        }
    }

    /// Layer name, unique within a world.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Compositing priority; higher orders override lower ones.
    pub fn order(&self) -> i32 {
        self.order
    }

    pub(crate) fn set_order(&mut self, order: i32) {
        self.order = order;
    }

    /// World-space offset applied to every voxel in this layer.
    pub fn offset(&self) -> VoxelCoord {
        self.offset
    }

    pub(crate) fn set_offset(&mut self, offset: VoxelCoord) {
        self.offset = offset;
    }

    /// Whether this layer participates in compositing and meshing.
    pub fn visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Arbitrary JSON property bag carried through save/load untouched.
    pub fn properties(&self) -> &serde_json::Map<String, Value> {
        &self.properties
    }

    /// Mutable access to the property bag.
    pub fn properties_mut(&mut self) -> &mut serde_json::Map<String, Value> {
        &mut self.properties
    }

    /// Chunk side length used by this layer.
    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// Stores an entry at a layer-local voxel coordinate.
    ///
    /// The owning chunk is computed by floor division and created lazily.
    pub fn set(&mut self, local: VoxelCoord, entry: VoxelEntry) {
        let size = self.chunk_size;
        let coord = ChunkCoord::containing(local, size);
        let chunk = self.chunks.entry(coord).or_insert_with(|| Chunk::new(size));
        let (lx, ly, lz) = local_in_chunk(local, size);
        chunk.set(lx, ly, lz, entry);
    }

    /// Returns the entry at a layer-local voxel coordinate, or `None` for air.
    pub fn get(&self, local: VoxelCoord) -> Option<VoxelEntry> {
        let coord = ChunkCoord::containing(local, self.chunk_size);
        let chunk = self.chunks.get(&coord)?;
        let (lx, ly, lz) = local_in_chunk(local, self.chunk_size);
        chunk.get(lx, ly, lz)
    }

    /// Removes the entry at a layer-local voxel coordinate.
    ///
    /// A missing chunk or missing entry is a no-op (no dirty flag change).
    pub fn remove(&mut self, local: VoxelCoord) -> Option<VoxelEntry> {
        let coord = ChunkCoord::containing(local, self.chunk_size);
        let chunk = self.chunks.get_mut(&coord)?;
        let (lx, ly, lz) = local_in_chunk(local, self.chunk_size);
        chunk.remove(lx, ly, lz)
    }

    /// Immutable access to a chunk by chunk coordinate.
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// Mutable access to a chunk by chunk coordinate.
    pub fn chunk_mut(&mut self, coord: ChunkCoord) -> Option<&mut Chunk> {
        self.chunks.get_mut(&coord)
    }

    /// Iterates over all `(coord, chunk)` pairs.
    pub fn chunks(&self) -> impl Iterator<Item = (&ChunkCoord, &Chunk)> {
        self.chunks.iter()
    }

    /// Coordinates of all chunks with a pending rebuild.
    pub fn dirty_chunks(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.chunks
            .iter()
            .filter(|(_, c)| c.is_dirty())
            .map(|(&coord, _)| coord)
    }

    /// Marks every chunk dirty, forcing a full rebuild pass.
    pub fn mark_all_dirty(&mut self) {
        for chunk in self.chunks.values_mut() {
            chunk.mark_dirty();
        }
    }

    /// Iterates over all placed voxels as `(layer-local coord, entry)` pairs.
    pub fn voxels(&self) -> impl Iterator<Item = (VoxelCoord, VoxelEntry)> + '_ {
        self.chunks.iter().flat_map(move |(coord, chunk)| {
            let origin = coord.origin(self.chunk_size);
            chunk.entries().map(move |(index, entry)| {
                let (lx, ly, lz) = crate::chunk::from_linear_index(self.chunk_size, index);
                (
                    VoxelCoord::new(
                        origin.x + lx as i32,
                        origin.y + ly as i32,
                        origin.z + lz as i32,
                    ),
                    entry,
                )
            })
        })
    }

    /// Total number of placed voxels across all chunks.
    pub fn voxel_count(&self) -> usize {
        self.chunks.values().map(Chunk::voxel_count).sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::BlockId;

    fn entry(id: u16) -> VoxelEntry {
        VoxelEntry::new(BlockId(id))
    }

    #[test]
    fn test_set_creates_chunk_lazily() {
        let mut layer = Layer::new("ground", 0, 16);
        assert_eq!(layer.chunks().count(), 0);

        layer.set(VoxelCoord::new(0, 0, 0), entry(1));
        layer.set(VoxelCoord::new(17, 0, 0), entry(2));
        assert_eq!(layer.chunks().count(), 2);
        assert!(layer.chunk(ChunkCoord::new(1, 0, 0)).is_some());
    }

    #[test]
    fn test_negative_coordinates_route_correctly() {
        let mut layer = Layer::new("ground", 0, 16);
        let v = VoxelCoord::new(-1, -16, 5);
        layer.set(v, entry(7));
        assert_eq!(layer.get(v), Some(entry(7)));
        assert!(layer.chunk(ChunkCoord::new(-1, -1, 0)).is_some());
    }

    #[test]
    fn test_emptied_chunk_persists() {
        let mut layer = Layer::new("ground", 0, 16);
        let v = VoxelCoord::new(3, 3, 3);
        layer.set(v, entry(1));
        layer.remove(v);

        let chunk = layer.chunk(ChunkCoord::new(0, 0, 0)).expect("chunk persists");
        assert!(chunk.is_empty());
        assert!(chunk.is_dirty());
    }

    #[test]
    fn test_voxels_iterates_layer_local_coords() {
        let mut layer = Layer::new("ground", 0, 16);
        layer.set(VoxelCoord::new(-1, 0, 0), entry(1));
        layer.set(VoxelCoord::new(20, 2, 3), entry(2));

        let mut got: Vec<_> = layer.voxels().collect();
        got.sort_by_key(|(c, _)| (c.x, c.y, c.z));
        assert_eq!(got[0], (VoxelCoord::new(-1, 0, 0), entry(1)));
        assert_eq!(got[1], (VoxelCoord::new(20, 2, 3), entry(2)));
        assert_eq!(layer.voxel_count(), 2);
    }

    #[test]
    fn test_mark_all_dirty() {
        let mut layer = Layer::new("ground", 0, 16);
        layer.set(VoxelCoord::new(0, 0, 0), entry(1));
        layer.set(VoxelCoord::new(40, 0, 0), entry(1));
        layer.chunk_mut(ChunkCoord::new(0, 0, 0)).unwrap().clear_dirty();
        layer.chunk_mut(ChunkCoord::new(2, 0, 0)).unwrap().clear_dirty();

        layer.mark_all_dirty();
        assert_eq!(layer.dirty_chunks().count(), 2);
    }
}

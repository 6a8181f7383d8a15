//! Fixed-size cubic sparse chunk with a single mesh/collider dirty flag.
//!
//! Voxels are stored in a hash map keyed by the packed linear index, so an
//! empty or nearly-empty chunk costs almost nothing. The dirty flag is set on
//! any effective mutation and cleared by the rebuild pass once geometry has
//! been regenerated.

use rustc_hash::FxHashMap;

use crate::transform::VoxelEntry;

/// Default chunk side length in voxels.
pub const DEFAULT_CHUNK_SIZE: u32 = 16;

/// Packs in-range local coordinates into a linear index.
///
/// The mapping is `lx + ly*size + lz*size²`, an exact bijection over
/// `[0, size³)` together with [`from_linear_index`].
pub fn linear_index(size: u32, lx: u32, ly: u32, lz: u32) -> u32 {
    debug_assert!(lx < size && ly < size && lz < size);
    lx + ly * size + lz * size * size
}

/// Inverse of [`linear_index`].
pub fn from_linear_index(size: u32, index: u32) -> (u32, u32, u32) {
    let lx = index % size;
    let ly = (index / size) % size;
    let lz = index / (size * size);
    (lx, ly, lz)
}

/// A cubic sparse voxel container of side `size`.
///
/// Local coordinates are `[0, size)` per axis. Out-of-range coordinates are a
/// caller contract violation: reads return "absent", writes are rejected, and
/// both log a warning — coordinates are never silently wrapped.
#[derive(Clone, Debug)]
pub struct Chunk {
    size: u32,
    voxels: FxHashMap<u32, VoxelEntry>,
    dirty: bool,
}

impl Chunk {
    /// Creates an empty chunk of the given side length.
    pub fn new(size: u32) -> Self {
        Self {
            size,
            voxels: FxHashMap::default(),
            dirty: false,
        }
    }

    /// Side length in voxels.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Stores an entry at the given local coordinates.
    ///
    /// Marks the chunk dirty unless an identical entry was already present.
    pub fn set(&mut self, lx: u32, ly: u32, lz: u32, entry: VoxelEntry) {
        if !self.in_bounds(lx, ly, lz) {
            tracing::warn!("Chunk::set out of bounds: ({}, {}, {})", lx, ly, lz);
            return;
        }
        let index = linear_index(self.size, lx, ly, lz);
        if self.voxels.get(&index) == Some(&entry) {
            return;
        }
        self.voxels.insert(index, entry);
        self.dirty = true;
    }

    /// Returns the entry at the given local coordinates, or `None` for air.
    ///
    /// Has no side effects.
    pub fn get(&self, lx: u32, ly: u32, lz: u32) -> Option<VoxelEntry> {
        if !self.in_bounds(lx, ly, lz) {
            tracing::warn!("Chunk::get out of bounds: ({}, {}, {})", lx, ly, lz);
            return None;
        }
        self.voxels
            .get(&linear_index(self.size, lx, ly, lz))
            .copied()
    }

    /// Removes and returns the entry at the given local coordinates.
    ///
    /// Marks the chunk dirty only if an entry existed; removing an absent
    /// voxel is an idempotent no-op.
    pub fn remove(&mut self, lx: u32, ly: u32, lz: u32) -> Option<VoxelEntry> {
        if !self.in_bounds(lx, ly, lz) {
            tracing::warn!("Chunk::remove out of bounds: ({}, {}, {})", lx, ly, lz);
            return None;
        }
        let removed = self.voxels.remove(&linear_index(self.size, lx, ly, lz));
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    /// Yields all `(linear_index, entry)` pairs in unspecified order.
    pub fn entries(&self) -> impl Iterator<Item = (u32, VoxelEntry)> + '_ {
        self.voxels.iter().map(|(&i, &e)| (i, e))
    }

    /// Number of placed voxels.
    pub fn voxel_count(&self) -> usize {
        self.voxels.len()
    }

    /// Returns `true` if no voxels are placed.
    ///
    /// An empty chunk must produce no geometry and no collider.
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// Returns `true` if the chunk has pending geometry changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Forces the dirty flag, e.g. after a registry or layer-offset change.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clears the dirty flag after a successful rebuild.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    fn in_bounds(&self, lx: u32, ly: u32, lz: u32) -> bool {
        lx < self.size && ly < self.size && lz < self.size
    }
}

impl Default for Chunk {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{BlockId, VoxelTransform};

    fn stone() -> VoxelEntry {
        VoxelEntry::new(BlockId(1))
    }

    #[test]
    fn test_linear_index_bijection() {
        for size in [1u32, 4, 16, 32] {
            for lz in 0..size {
                for ly in 0..size {
                    for lx in 0..size {
                        let index = linear_index(size, lx, ly, lz);
                        assert!(index < size * size * size);
                        assert_eq!(from_linear_index(size, index), (lx, ly, lz));
                    }
                }
            }
        }
    }

    #[test]
    fn test_new_chunk_is_empty_and_clean() {
        let chunk = Chunk::default();
        assert!(chunk.is_empty());
        assert_eq!(chunk.voxel_count(), 0);
        assert!(!chunk.is_dirty());
    }

    #[test]
    fn test_set_then_get_roundtrip() {
        let mut chunk = Chunk::default();
        let entry = VoxelEntry::with_transform(BlockId(3), VoxelTransform::encode(2, true, false, false));
        chunk.set(5, 10, 15, entry);
        assert_eq!(chunk.get(5, 10, 15), Some(entry));
        assert_eq!(chunk.get(4, 10, 15), None);
        assert!(chunk.is_dirty());
        assert_eq!(chunk.voxel_count(), 1);
    }

    #[test]
    fn test_set_identical_entry_does_not_dirty() {
        let mut chunk = Chunk::default();
        chunk.set(1, 2, 3, stone());
        chunk.clear_dirty();

        chunk.set(1, 2, 3, stone());
        assert!(!chunk.is_dirty());

        // A different transform is a new value and must dirty.
        chunk.set(
            1,
            2,
            3,
            VoxelEntry::with_transform(BlockId(1), VoxelTransform::encode(1, false, false, false)),
        );
        assert!(chunk.is_dirty());
    }

    #[test]
    fn test_remove_missing_is_idempotent() {
        let mut chunk = Chunk::default();
        assert_eq!(chunk.remove(0, 0, 0), None);
        assert!(!chunk.is_dirty());

        chunk.set(0, 0, 0, stone());
        chunk.clear_dirty();
        assert_eq!(chunk.remove(0, 0, 0), Some(stone()));
        assert!(chunk.is_dirty());
        assert!(chunk.is_empty());

        chunk.clear_dirty();
        assert_eq!(chunk.remove(0, 0, 0), None);
        assert!(!chunk.is_dirty());
    }

    #[test]
    fn test_out_of_bounds_never_wraps() {
        let mut chunk = Chunk::new(16);
        chunk.set(16, 0, 0, stone());
        chunk.set(0, 99, 0, stone());
        assert!(chunk.is_empty());
        assert!(!chunk.is_dirty());
        assert_eq!(chunk.get(16, 0, 0), None);
        assert_eq!(chunk.remove(0, 0, 16), None);
    }

    #[test]
    fn test_entries_yields_all_pairs() {
        let mut chunk = Chunk::new(4);
        chunk.set(0, 0, 0, stone());
        chunk.set(3, 3, 3, VoxelEntry::new(BlockId(2)));

        let mut got: Vec<_> = chunk.entries().collect();
        got.sort_by_key(|(i, _)| *i);
        assert_eq!(got.len(), 2);
        assert_eq!(got[0], (linear_index(4, 0, 0, 0), stone()));
        assert_eq!(got[1], (linear_index(4, 3, 3, 3), VoxelEntry::new(BlockId(2))));
    }
}

//! World mutation events for downstream listeners (editor UI, physics sync).
//!
//! Events are collected into a double-buffered [`WorldEventBuffer`]: events
//! written this frame stay readable through the next frame, then drop. Call
//! [`swap`](WorldEventBuffer::swap) once per frame.

use crate::coords::VoxelCoord;
use crate::transform::VoxelEntry;

/// Emitted by the world after each structural or voxel mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorldEvent {
    /// A layer was created.
    LayerAdded {
        /// Name of the new layer.
        name: String,
    },
    /// A layer (and all its chunks) was removed.
    LayerRemoved {
        /// Name of the removed layer.
        name: String,
    },
    /// A layer's compositing order changed.
    LayerReordered {
        /// Name of the layer.
        name: String,
        /// New order value.
        order: i32,
    },
    /// A layer's world-space offset changed.
    LayerOffsetChanged {
        /// Name of the layer.
        name: String,
        /// New offset.
        offset: VoxelCoord,
    },
    /// A layer's visibility flag changed.
    LayerVisibilityChanged {
        /// Name of the layer.
        name: String,
        /// New visibility.
        visible: bool,
    },
    /// A voxel was placed or replaced.
    VoxelSet {
        /// Owning layer.
        layer: String,
        /// World-space coordinate of the voxel.
        coord: VoxelCoord,
        /// The entry now at this cell.
        entry: VoxelEntry,
    },
    /// A voxel was removed.
    VoxelRemoved {
        /// Owning layer.
        layer: String,
        /// World-space coordinate of the voxel.
        coord: VoxelCoord,
        /// The entry that was removed.
        old: VoxelEntry,
    },
}

/// Double-buffered event storage for world mutations.
#[derive(Debug, Default)]
pub struct WorldEventBuffer {
    prev: Vec<WorldEvent>,
    current: Vec<WorldEvent>,
}

impl WorldEventBuffer {
    /// Creates a new empty event buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an event in the current frame.
    pub fn send(&mut self, event: WorldEvent) {
        self.current.push(event);
    }

    /// Returns all readable events (previous + current frame).
    pub fn read(&self) -> impl Iterator<Item = &WorldEvent> {
        self.prev.iter().chain(self.current.iter())
    }

    /// Number of readable events.
    pub fn len(&self) -> usize {
        self.prev.len() + self.current.len()
    }

    /// Returns `true` if there are no readable events.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Advances the frame: previous events drop, current becomes previous.
    pub fn swap(&mut self) {
        self.prev.clear();
        std::mem::swap(&mut self.prev, &mut self.current);
    }

    /// Drops all events from both frames.
    pub fn clear(&mut self) {
        self.prev.clear();
        self.current.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

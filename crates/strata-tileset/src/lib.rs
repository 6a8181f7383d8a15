//! Tileset management: maps `(tileset, col, row)` tile references to
//! normalized UV rectangles within a shared texture atlas.
//!
//! The UV rectangle is inset by half a texel on all sides so that linear
//! filtering at tile borders never bleeds neighboring tiles:
//! `offset = tile_index / grid + half_texel`, `scale = (tile_px − 1) / image_px`.
//! The V origin is at the bottom of the image, matching the renderer's
//! texture coordinate convention.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from tileset registration and UV lookup.
///
/// These are configuration mistakes, not content-sparse conditions: a missing
/// tileset on lookup means the embedding application forgot to load one, so
/// it surfaces as a hard error rather than a silent skip.
#[derive(Debug, Error)]
pub enum TilesetError {
    /// A UV lookup was made before any tileset was registered.
    #[error("no tilesets registered")]
    NoTilesets,
    /// A tile reference named a tileset that is not registered.
    #[error("unknown tileset: {0}")]
    UnknownTileset(String),
    /// A tileset with this id is already registered.
    #[error("duplicate tileset id: {0}")]
    DuplicateTileset(String),
    /// The definition cannot produce a tile grid.
    #[error("invalid tileset definition: {0}")]
    InvalidDefinition(String),
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// A tileset as supplied by the embedding application and persisted in
/// snapshots: an image reference plus tile addressing metadata (no pixels).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TilesetDefinition {
    /// Unique tileset id.
    pub id: String,
    /// Source image reference (path or URL); transport is the caller's concern.
    pub src: String,
    /// Square tile side length in pixels.
    pub tile_size: u32,
    /// Explicit column count; derived from image width when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cols: Option<u32>,
    /// Explicit row count; derived from image height when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
}

/// Reference to one tile: `(col, row)` within a tileset.
///
/// A `None` tileset means "the default tileset" — the first one registered.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRef {
    /// Explicit tileset id, or `None` for the default tileset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tileset: Option<String>,
    /// Tile column (0-based, left to right).
    pub col: u32,
    /// Tile row (0-based, top to bottom).
    pub row: u32,
}

impl TileRef {
    /// Tile `(col, row)` in the default tileset.
    pub fn new(col: u32, row: u32) -> Self {
        Self {
            tileset: None,
            col,
            row,
        }
    }

    /// Tile `(col, row)` in a named tileset.
    pub fn in_tileset(tileset: impl Into<String>, col: u32, row: u32) -> Self {
        Self {
            tileset: Some(tileset.into()),
            col,
            row,
        }
    }
}

/// A normalized UV rectangle: `uv = offset + unit_uv * scale`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileUv {
    /// Bottom-left corner of the (inset) tile rectangle.
    pub offset: Vec2,
    /// Extent of the (inset) tile rectangle.
    pub scale: Vec2,
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// A registered tileset with its grid resolved.
#[derive(Clone, Debug)]
struct ResolvedTileset {
    definition: TilesetDefinition,
    cols: u32,
    rows: u32,
    image_width: u32,
    image_height: u32,
}

/// Registers tilesets and answers UV lookups.
///
/// The first registered tileset becomes the implicit default for tile
/// references without an explicit id; this default never changes once set.
#[derive(Debug, Default)]
pub struct TilesetManager {
    tilesets: HashMap<String, ResolvedTileset>,
    /// Registration order, for deterministic snapshot output.
    order: Vec<String>,
    default_id: Option<String>,
}

impl TilesetManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tileset.
    ///
    /// The grid is taken from explicit `cols`/`rows` when present, otherwise
    /// derived from `image_size` (pixel dimensions of the loaded image).
    ///
    /// # Errors
    ///
    /// [`TilesetError::DuplicateTileset`] if the id is taken,
    /// [`TilesetError::InvalidDefinition`] if no grid can be derived or the
    /// tile size is zero.
    pub fn register(
        &mut self,
        definition: TilesetDefinition,
        image_size: Option<(u32, u32)>,
    ) -> Result<(), TilesetError> {
        if self.tilesets.contains_key(&definition.id) {
            return Err(TilesetError::DuplicateTileset(definition.id));
        }
        if definition.tile_size == 0 {
            return Err(TilesetError::InvalidDefinition(format!(
                "tileset {} has zero tile size",
                definition.id
            )));
        }

        let (cols, rows) = match (definition.cols, definition.rows, image_size) {
            (Some(c), Some(r), _) => (c, r),
            (_, _, Some((w, h))) => (
                definition.cols.unwrap_or(w / definition.tile_size),
                definition.rows.unwrap_or(h / definition.tile_size),
            ),
            _ => {
                return Err(TilesetError::InvalidDefinition(format!(
                    "tileset {} has neither cols/rows nor image dimensions",
                    definition.id
                )));
            }
        };
        if cols == 0 || rows == 0 {
            return Err(TilesetError::InvalidDefinition(format!(
                "tileset {} resolves to an empty grid",
                definition.id
            )));
        }

        let (image_width, image_height) = image_size.unwrap_or((
            cols * definition.tile_size,
            rows * definition.tile_size,
        ));

        let id = definition.id.clone();
        self.tilesets.insert(
            id.clone(),
            ResolvedTileset {
                definition,
                cols,
                rows,
                image_width,
                image_height,
            },
        );
        self.order.push(id.clone());
        if self.default_id.is_none() {
            self.default_id = Some(id);
        }
        Ok(())
    }

    /// Returns `true` if a tileset with this id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.tilesets.contains_key(id)
    }

    /// The implicit default tileset id (first registered), if any.
    pub fn default_id(&self) -> Option<&str> {
        self.default_id.as_deref()
    }

    /// Number of registered tilesets.
    pub fn len(&self) -> usize {
        self.tilesets.len()
    }

    /// Returns `true` if no tilesets are registered.
    pub fn is_empty(&self) -> bool {
        self.tilesets.is_empty()
    }

    /// Definitions in registration order (for snapshots).
    pub fn definitions(&self) -> impl Iterator<Item = &TilesetDefinition> {
        self.order
            .iter()
            .filter_map(|id| self.tilesets.get(id))
            .map(|t| &t.definition)
    }

    /// Resolves a tile reference to the concrete tileset id it addresses.
    pub fn resolve_id<'a>(&'a self, tile: &'a TileRef) -> Result<&'a str, TilesetError> {
        match &tile.tileset {
            Some(id) => {
                if self.tilesets.contains_key(id) {
                    Ok(id)
                } else {
                    Err(TilesetError::UnknownTileset(id.clone()))
                }
            }
            None => self.default_id.as_deref().ok_or(TilesetError::NoTilesets),
        }
    }

    /// Computes the inset UV rectangle for a tile reference.
    ///
    /// # Errors
    ///
    /// [`TilesetError::NoTilesets`] with no tilesets loaded, or
    /// [`TilesetError::UnknownTileset`] for an explicit unknown id — both
    /// configuration bugs, distinct from the mesh builder's silent-skip
    /// policy for unregistered blocks.
    pub fn tile_uv(&self, tile: &TileRef) -> Result<TileUv, TilesetError> {
        let id = self.resolve_id(tile)?;
        let ts = &self.tilesets[id];

        let half_texel_u = 0.5 / ts.image_width as f32;
        let half_texel_v = 0.5 / ts.image_height as f32;

        // Clamp out-of-grid references onto the grid edge; the content may
        // simply not be drawn yet during live editing.
        let col = tile.col.min(ts.cols - 1);
        let row = tile.row.min(ts.rows - 1);

        let offset = Vec2::new(
            col as f32 / ts.cols as f32 + half_texel_u,
            1.0 - (row + 1) as f32 / ts.rows as f32 + half_texel_v,
        );
        let scale = Vec2::new(
            (ts.definition.tile_size - 1) as f32 / ts.image_width as f32,
            (ts.definition.tile_size - 1) as f32 / ts.image_height as f32,
        );

        Ok(TileUv { offset, scale })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

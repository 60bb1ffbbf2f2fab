use hashbrown::HashMap;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Largest chunk edge length; every request copies `size²` cells.
pub const MAX_CHUNK_SIZE: Coord = 256;

/// Chunk edge length and the translation between chunk-local and global coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkLayout {
    size: Coord,
}

impl ChunkLayout {
    pub fn new(size: Coord) -> Result<Self> {
        if (1..=MAX_CHUNK_SIZE).contains(&size) {
            Ok(Self { size })
        } else {
            Err(WorldError::InvalidChunkSize)
        }
    }

    pub const fn size(&self) -> Coord {
        self.size
    }

    /// `(cx·S + x, cy·S + y)`. Locals are not range checked; anything that overflows saturates,
    /// which lands it outside every world.
    pub const fn to_global(&self, chunk: Coord2, local: Coord2) -> Coord2 {
        (
            chunk.0.saturating_mul(self.size).saturating_add(local.0),
            chunk.1.saturating_mul(self.size).saturating_add(local.1),
        )
    }

    /// Chunk coordinate and in-chunk offset of a global coordinate.
    pub const fn locate(&self, global: Coord2) -> (Coord2, Coord2) {
        (
            (
                global.0.div_euclid(self.size),
                global.1.div_euclid(self.size),
            ),
            (
                global.0.rem_euclid(self.size),
                global.1.rem_euclid(self.size),
            ),
        )
    }
}

/// Read-only value snapshot of one chunk of the world.
///
/// Slots outside the world hold [`Cell::placeholder`]s. Nothing here is written back, and the
/// snapshot is stale as soon as the world mutates again.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    coord: Coord2,
    cells: Array2<Cell>,
}

impl Chunk {
    /// Copies the current state of every cell covered by `chunk`. Never fails.
    pub fn extract(world: &WorldGrid, chunk: Coord2, layout: ChunkLayout) -> Self {
        let size = layout.size() as usize;
        let cells = Array2::from_shape_fn([size, size], |(lx, ly)| {
            let global = layout.to_global(chunk, (lx as Coord, ly as Coord));
            world
                .get(global)
                .copied()
                .unwrap_or_else(|| Cell::placeholder(global))
        });
        Self {
            coord: chunk,
            cells,
        }
    }

    pub fn coord(&self) -> Coord2 {
        self.coord
    }

    pub fn size(&self) -> Coord {
        // square, built from a positive `Coord`
        self.cells.dim().0 as Coord
    }

    pub fn get(&self, local: Coord2) -> Option<&Cell> {
        let size = self.size();
        in_bounds(local, (size, size)).then(|| &self.cells[local.to_nd_index()])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }
}

/// Bounded memoization of extracted chunks.
///
/// Entries are stamped with the world version they were extracted at; a lookup against any other
/// version misses, so a cached chunk is never older than the last mutation. Extraction itself
/// happens outside the cache, callers look up, extract on a miss, then insert.
#[derive(Clone, Debug)]
pub struct ChunkCache {
    capacity: usize,
    entries: HashMap<Coord2, (u64, Chunk)>,
}

impl ChunkCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, chunk: Coord2, version: u64) -> Option<Chunk> {
        match self.entries.get(&chunk) {
            Some((stamp, cached)) if *stamp == version => Some(cached.clone()),
            _ => None,
        }
    }

    /// Stores `chunk` as extracted at `version`, evicting stale entries first when full.
    pub fn insert(&mut self, version: u64, chunk: Chunk) {
        if self.capacity == 0 {
            return;
        }

        let coord = chunk.coord();
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&coord) {
            self.entries.retain(|_, (stamp, _)| *stamp == version);
            if self.entries.len() >= self.capacity {
                log::trace!("Chunk cache full, dropping {} entries", self.entries.len());
                self.entries.clear();
            }
        }
        self.entries.insert(coord, (version, chunk));
    }
}

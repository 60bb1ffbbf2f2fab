use serde::{Deserialize, Serialize};
use vastsweeper_core::{Cell, Chunk, ChunkLayout, Coord2};

use crate::Result;

/// A cell addressed the way clients see the world: a chunk plus an offset inside it.
///
/// The offset is not checked against the chunk edge length, an oversized one just points into a
/// neighboring chunk or off the world.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellTarget {
    pub chunk: Coord2,
    pub local: Coord2,
}

impl CellTarget {
    pub const fn new(chunk: Coord2, local: Coord2) -> Self {
        Self { chunk, local }
    }

    pub const fn global(&self, layout: ChunkLayout) -> Coord2 {
        layout.to_global(self.chunk, self.local)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRequest {
    pub chunk: Coord2,
}

/// Everything a client may ask of the world.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    Reveal(CellTarget),
    Flag(CellTarget),
    Chord(CellTarget),
    Chunk(ChunkRequest),
}

impl Request {
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|err| {
            log::warn!("Rejected request: {}", err);
            err.into()
        })
    }

    pub const fn is_mutation(&self) -> bool {
        !matches!(self, Self::Chunk(_))
    }
}

/// One changed cell, addressed for broadcast.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellUpdate {
    pub chunk: Coord2,
    pub local: Coord2,
    pub cell: Cell,
}

impl CellUpdate {
    pub const fn new(layout: ChunkLayout, cell: Cell) -> Self {
        let (chunk, local) = layout.locate(cell.position());
        Self { chunk, local, cell }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    /// Fanned out to every observer; empty when nothing changed.
    Updates { updates: Vec<CellUpdate> },
    /// Sent only to the observer that asked.
    Chunk { chunk: Chunk },
}

impl Reply {
    pub fn updates(layout: ChunkLayout, cells: impl IntoIterator<Item = Cell>) -> Self {
        Self::Updates {
            updates: cells
                .into_iter()
                .map(|cell| CellUpdate::new(layout, cell))
                .collect(),
        }
    }

    pub const fn is_broadcast(&self) -> bool {
        matches!(self, Self::Updates { .. })
    }

    /// Whether there is anything to send at all.
    pub fn has_update(&self) -> bool {
        match self {
            Self::Updates { updates } => !updates.is_empty(),
            Self::Chunk { .. } => true,
        }
    }
}

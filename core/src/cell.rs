use serde::{Deserialize, Serialize};

use crate::*;

/// Authoritative state of one world cell.
///
/// Mine and adjacency data are fixed once the world is generated; only `revealed` (monotonic) and
/// `flagged` (while hidden) ever change, and only through the [`RevealEngine`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    position: Coord2,
    has_mine: bool,
    adjacent_mines: u8,
    revealed: bool,
    flagged: bool,
}

impl Cell {
    pub(crate) const fn new(position: Coord2, has_mine: bool, adjacent_mines: u8) -> Self {
        Self {
            position,
            has_mine,
            adjacent_mines,
            revealed: false,
            flagged: false,
        }
    }

    /// Stand-in for a chunk slot that falls outside the world.
    pub const fn placeholder(position: Coord2) -> Self {
        Self::new(position, false, 0)
    }

    pub const fn position(&self) -> Coord2 {
        self.position
    }

    pub const fn has_mine(&self) -> bool {
        self.has_mine
    }

    pub const fn adjacent_mines(&self) -> u8 {
        self.adjacent_mines
    }

    pub const fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub const fn is_flagged(&self) -> bool {
        self.flagged
    }

    /// Neither revealed nor flagged, i.e. still open to a reveal.
    pub const fn is_hidden(&self) -> bool {
        !self.revealed && !self.flagged
    }

    pub(crate) fn reveal(&mut self) {
        self.revealed = true;
    }

    pub(crate) fn toggle_flag(&mut self) {
        self.flagged = !self.flagged;
    }
}

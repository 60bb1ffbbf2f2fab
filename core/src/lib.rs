#![no_std]

extern crate alloc;

use core::ops::Index;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use cell::*;
pub use chunk::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use types::*;
pub use world::*;

mod cell;
mod chunk;
mod engine;
mod error;
mod generator;
mod types;
mod world;

/// Fixed parameters of a world, supplied once at initialization (or reset).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    pub width: Coord,
    pub height: Coord,
    /// Fraction of cells holding a mine, within `[0, 1)`.
    pub mine_density: f64,
}

impl WorldConfig {
    pub const fn new(width: Coord, height: Coord, mine_density: f64) -> Self {
        Self {
            width,
            height,
            mine_density,
        }
    }

    pub const fn size(&self) -> Coord2 {
        (self.width, self.height)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width <= 0 || self.height <= 0 {
            return Err(WorldError::InvalidDimensions);
        }
        // rejects NaN as well
        if !(0.0..1.0).contains(&self.mine_density) {
            return Err(WorldError::InvalidMinePercentage);
        }
        self.total_cells().map(|_| ())
    }

    pub fn total_cells(&self) -> Result<CellCount> {
        let width = CellCount::try_from(self.width).map_err(|_| WorldError::InvalidDimensions)?;
        let height = CellCount::try_from(self.height).map_err(|_| WorldError::InvalidDimensions)?;
        width
            .checked_mul(height)
            .ok_or(WorldError::InvalidDimensions)
    }

    /// `round(width * height * mine_density)`, rounding halves up.
    pub fn target_mines(&self) -> Result<CellCount> {
        self.validate()?;
        let total = self.total_cells()?;
        let mines = (f64::from(total) * self.mine_density + 0.5) as CellCount;
        Ok(mines.min(total))
    }
}

/// Final mine placement of a world, before any adjacency is derived from it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MineLayout {
    mine_mask: Array2<bool>,
    mine_count: CellCount,
}

impl MineLayout {
    pub fn from_mine_mask(mine_mask: Array2<bool>) -> Result<Self> {
        let (width, height) = mine_mask.dim();
        if Coord::try_from(width).is_err() || Coord::try_from(height).is_err() {
            return Err(WorldError::InvalidDimensions);
        }
        let mine_count = mine_mask
            .iter()
            .filter(|&&is_mine| is_mine)
            .count()
            .try_into()
            .map_err(|_| WorldError::InvalidDimensions)?;
        Ok(Self {
            mine_mask,
            mine_count,
        })
    }

    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        WorldConfig::new(size.0, size.1, 0.0).validate()?;
        let mut mine_mask: Array2<bool> = Array2::default(size.to_nd_index());

        for &coords in mine_coords {
            if !in_bounds(coords, size) {
                return Err(WorldError::InvalidMineLayout);
            }
            mine_mask[coords.to_nd_index()] = true;
        }

        Self::from_mine_mask(mine_mask)
    }

    pub fn size(&self) -> Coord2 {
        let (width, height) = self.mine_mask.dim();
        // checked on construction
        (width as Coord, height as Coord)
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn contains_mine(&self, coords: Coord2) -> bool {
        in_bounds(coords, self.size()) && self[coords]
    }

    pub fn adjacent_mine_count(&self, coords: Coord2) -> u8 {
        // at most 8 neighbors
        self.iter_neighbors(coords).filter(|&pos| self[pos]).count() as u8
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        NeighborIter::new(coords, self.size())
    }
}

impl Index<Coord2> for MineLayout {
    type Output = bool;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.mine_mask[coords.to_nd_index()]
    }
}

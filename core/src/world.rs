use ndarray::Array2;
use serde::Serialize;

use crate::*;

/// The authoritative, bounded cell store.
///
/// Every cell is allocated up front; mines and adjacency counts are fixed at construction and only
/// change through a full [`WorldGrid::reset`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WorldGrid {
    cells: Array2<Cell>,
    mine_count: CellCount,
    version: u64,
}

impl WorldGrid {
    /// Allocates the grid, places mines by rejection sampling and derives adjacency counts.
    pub fn initialize(config: WorldConfig, seed: u64) -> Result<Self> {
        let layout = RandomMineGenerator::new(seed).generate(&config)?;
        let world = Self::from_layout(&layout);
        log::info!(
            "Initialized {}x{} world with {} mines",
            config.width,
            config.height,
            world.mine_count
        );
        Ok(world)
    }

    /// Builds the grid from a finished layout; adjacency is only ever computed against the
    /// complete mine set.
    pub fn from_layout(layout: &MineLayout) -> Self {
        let cells = Array2::from_shape_fn(layout.size().to_nd_index(), |(x, y)| {
            let position = (x as Coord, y as Coord);
            Cell::new(
                position,
                layout[position],
                layout.adjacent_mine_count(position),
            )
        });
        Self {
            cells,
            mine_count: layout.mine_count(),
            version: 0,
        }
    }

    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        MineLayout::from_mine_coords(size, mine_coords).map(|layout| Self::from_layout(&layout))
    }

    /// Re-generates the world in place, discarding all reveal and flag state.
    ///
    /// The replacement is fully built before it is swapped in, a failed reset leaves the grid
    /// untouched.
    pub fn reset(&mut self, config: WorldConfig, seed: u64) -> Result<()> {
        let mut fresh = Self::initialize(config, seed)?;
        fresh.version = self.version + 1;
        *self = fresh;
        Ok(())
    }

    pub fn size(&self) -> Coord2 {
        let (width, height) = self.cells.dim();
        // bounded by the layout it was built from
        (width as Coord, height as Coord)
    }

    pub fn total_cells(&self) -> CellCount {
        self.cells.len() as CellCount
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    /// Bumped by every mutation that changed at least one cell, and by every reset.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn contains(&self, coords: Coord2) -> bool {
        in_bounds(coords, self.size())
    }

    pub fn cell_at(&self, coords: Coord2) -> Result<&Cell> {
        self.get(coords).ok_or(WorldError::OutOfBounds)
    }

    pub fn get(&self, coords: Coord2) -> Option<&Cell> {
        self.contains(coords)
            .then(|| &self.cells[coords.to_nd_index()])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        NeighborIter::new(coords, self.size())
    }

    pub(crate) fn get_mut(&mut self, coords: Coord2) -> Option<&mut Cell> {
        if self.contains(coords) {
            Some(&mut self.cells[coords.to_nd_index()])
        } else {
            None
        }
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }
}

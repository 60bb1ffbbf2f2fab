use alloc::collections::VecDeque;
use alloc::vec::Vec;
use hashbrown::HashSet;
use smallvec::SmallVec;

use crate::*;

/// The only writer of reveal and flag state.
///
/// Every operation returns the cells whose observable state changed, in the order they changed.
/// Out-of-bounds coordinates and business-rule rejections (flagging a revealed cell, revealing a
/// flagged one, chording on a wrong flag count) are not errors, they just change nothing.
///
/// There is no game over: hitting a mine reveals it, counts it, and play continues.
#[derive(Clone, Debug, PartialEq)]
pub struct RevealEngine {
    world: WorldGrid,
    exploded_mines: u64,
}

impl RevealEngine {
    pub fn new(world: WorldGrid) -> Self {
        Self {
            world,
            exploded_mines: 0,
        }
    }

    pub fn world(&self) -> &WorldGrid {
        &self.world
    }

    /// Mines revealed since the engine was created, across resets.
    pub fn exploded_mines(&self) -> u64 {
        self.exploded_mines
    }

    pub fn extract_chunk(&self, chunk: Coord2, layout: ChunkLayout) -> Chunk {
        Chunk::extract(&self.world, chunk, layout)
    }

    pub fn reset(&mut self, config: WorldConfig, seed: u64) -> Result<()> {
        self.world.reset(config, seed)
    }

    pub fn reveal(&mut self, coords: Coord2) -> Vec<Cell> {
        let Some(&cell) = self.world.get(coords) else {
            return Vec::new();
        };
        if !cell.is_hidden() {
            return Vec::new();
        }

        let mut changed = Vec::new();
        if cell.has_mine() {
            self.explode(coords, &mut changed);
        } else {
            self.flood_reveal(coords, &mut HashSet::new(), &mut changed);
        }
        self.finish(changed)
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Option<Cell> {
        let cell = self.world.get_mut(coords)?;
        if cell.is_revealed() {
            return None;
        }
        cell.toggle_flag();
        let cell = *cell;
        self.world.bump_version();
        Some(cell)
    }

    pub fn chord_reveal(&mut self, coords: Coord2) -> Vec<Cell> {
        let Some(&cell) = self.world.get(coords) else {
            return Vec::new();
        };
        if !cell.is_revealed() || cell.has_mine() || cell.adjacent_mines() == 0 {
            return Vec::new();
        }

        let mut accounted: u8 = 0;
        let mut candidates: SmallVec<[Coord2; 8]> = SmallVec::new();
        for pos in self.world.iter_neighbors(coords) {
            let Some(neighbor) = self.world.get(pos) else {
                continue;
            };
            if neighbor.is_flagged() || (neighbor.is_revealed() && neighbor.has_mine()) {
                accounted += 1;
            } else if !neighbor.is_revealed() {
                candidates.push(pos);
            }
        }

        if accounted != cell.adjacent_mines() {
            log::trace!(
                "Chord at {:?} ignored, {} of {} mines accounted for",
                coords,
                accounted,
                cell.adjacent_mines()
            );
            return Vec::new();
        }

        let mut visited = HashSet::new();
        let mut changed = Vec::new();
        for pos in candidates {
            match self.world.get(pos).copied() {
                // an earlier candidate's flood may have already opened it
                Some(neighbor) if !neighbor.is_hidden() => {}
                Some(neighbor) if neighbor.has_mine() => self.explode(pos, &mut changed),
                Some(_) => self.flood_reveal(pos, &mut visited, &mut changed),
                None => {}
            }
        }
        log::debug!("Chord at {:?} changed {} cells", coords, changed.len());
        self.finish(changed)
    }

    fn explode(&mut self, coords: Coord2, changed: &mut Vec<Cell>) {
        if let Some(cell) = self.world.get_mut(coords) {
            cell.reveal();
            changed.push(*cell);
            self.exploded_mines += 1;
            log::debug!("Mine exploded at {:?}", coords);
        }
    }

    /// Reveals `start` and, while the revealed cells have no adjacent mines, their whole
    /// 8-connected region. Numbered cells on the border are revealed but not expanded.
    fn flood_reveal(
        &mut self,
        start: Coord2,
        visited: &mut HashSet<Coord2>,
        changed: &mut Vec<Cell>,
    ) {
        let first = changed.len();
        let mut frontier = VecDeque::from([start]);

        while let Some(coords) = frontier.pop_front() {
            if !visited.insert(coords) {
                continue;
            }

            let Some(cell) = self.world.get_mut(coords) else {
                continue;
            };
            if !cell.is_hidden() || cell.has_mine() {
                continue;
            }

            cell.reveal();
            changed.push(*cell);

            if cell.adjacent_mines() == 0 {
                frontier.extend(
                    self.world
                        .iter_neighbors(coords)
                        .filter(|pos| !visited.contains(pos)),
                );
            }
        }

        if changed.len() - first > 1 {
            log::debug!(
                "Flood fill from {:?} revealed {} cells",
                start,
                changed.len() - first
            );
        }
    }

    fn finish(&mut self, changed: Vec<Cell>) -> Vec<Cell> {
        if !changed.is_empty() {
            self.world.bump_version();
        }
        changed
    }
}

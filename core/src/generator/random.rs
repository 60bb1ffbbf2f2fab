use ndarray::Array2;
use rand::prelude::*;
use rand::rngs::SmallRng;

use super::*;

/// Uniform rejection sampling: draw a random cell, place a mine if it is still free, repeat until
/// the target count is reached.
///
/// Deterministic for a given seed. Inherently sequential, every draw depends on the mask left by
/// the previous ones.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RandomMineGenerator {
    seed: u64,
}

impl RandomMineGenerator {
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl MineGenerator for RandomMineGenerator {
    fn generate(self, config: &WorldConfig) -> Result<MineLayout> {
        let target = config.target_mines()?;
        let (width, height) = config.size();

        let mut mine_mask: Array2<bool> = Array2::default(config.size().to_nd_index());
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut mines_placed: CellCount = 0;
        let mut draws: u64 = 0;

        while mines_placed < target {
            let coords = (rng.random_range(0..width), rng.random_range(0..height));
            draws += 1;
            let slot = &mut mine_mask[coords.to_nd_index()];
            if !*slot {
                *slot = true;
                mines_placed += 1;
            }
        }

        log::debug!(
            "Placed {} mines on {}x{} in {} draws (seed {})",
            mines_placed,
            width,
            height,
            draws,
            self.seed
        );

        MineLayout::from_mine_mask(mine_mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn places_exact_target_count() {
        for (config, seed) in [
            (WorldConfig::new(10, 10, 0.2), 1),
            (WorldConfig::new(7, 13, 0.5), 2),
            (WorldConfig::new(1, 1, 0.0), 3),
            (WorldConfig::new(4, 4, 0.99), 4),
        ] {
            let layout = RandomMineGenerator::new(seed).generate(&config).unwrap();
            assert_eq!(layout.mine_count(), config.target_mines().unwrap());
            assert_eq!(layout.size(), config.size());
        }
    }

    #[test]
    fn same_seed_same_layout() {
        let config = WorldConfig::new(32, 16, 0.15);
        let a = RandomMineGenerator::new(42).generate(&config).unwrap();
        let b = RandomMineGenerator::new(42).generate(&config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert_eq!(
            RandomMineGenerator::new(0).generate(&WorldConfig::new(0, 5, 0.1)),
            Err(WorldError::InvalidDimensions)
        );
        assert_eq!(
            RandomMineGenerator::new(0).generate(&WorldConfig::new(5, 5, 1.0)),
            Err(WorldError::InvalidMinePercentage)
        );
    }
}

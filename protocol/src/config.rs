use serde::{Deserialize, Serialize};
use vastsweeper_core::{ChunkLayout, Coord, WorldConfig};
use web_time::{SystemTime, UNIX_EPOCH};

use crate::Result;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub world: WorldSettings,
}

impl Settings {
    /// Parses and validates a TOML settings document; missing keys take their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let settings: Self = toml::from_str(input)?;
        settings.world.validate()?;
        Ok(settings)
    }
}

/// World parameters, fixed for the lifetime of a world except through an explicit reset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    pub width: Coord,
    pub height: Coord,
    pub chunk_size: Coord,
    pub mine_density: f64,
    /// Fixed mine layout seed; derived from the clock when absent.
    pub seed: Option<u64>,
    /// Chunks kept by the extraction cache, 0 disables it.
    pub chunk_cache: usize,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            chunk_size: 32,
            mine_density: 0.15,
            seed: None,
            chunk_cache: 256,
        }
    }
}

impl WorldSettings {
    pub const fn world_config(&self) -> WorldConfig {
        WorldConfig::new(self.width, self.height, self.mine_density)
    }

    pub fn chunk_layout(&self) -> Result<ChunkLayout> {
        Ok(ChunkLayout::new(self.chunk_size)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.world_config().validate()?;
        self.chunk_layout()?;
        Ok(())
    }

    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(clock_seed)
    }
}

fn clock_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    // fold the high bits in, the low ones alone repeat every ~584 years
    (nanos as u64) ^ ((nanos >> 64) as u64)
}

//! # Demo Layouts
//!
//! Pool layouts of both scenes. The files under `data/pools/` are compiled
//! in so the binary runs from any directory; [`DemoLayouts::from_dir`] loads
//! edited copies instead.

use std::path::Path;

use fcpool_core::{PoolSettings, SingleSettings};

use crate::error::DemoResult;

const OBSTACLES: &str = include_str!("../../../data/pools/obstacles.toml");
const CLOUDS: &str = include_str!("../../../data/pools/clouds.toml");
const CHESTS: &str = include_str!("../../../data/pools/chests.toml");
const CHEST_COINS: &str = include_str!("../../../data/pools/chest_coins.toml");

/// Every pool layout the demo needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DemoLayouts {
    /// Runner obstacles.
    pub obstacles: PoolSettings,
    /// Runner background clouds.
    pub clouds: PoolSettings,
    /// Chest spawner.
    pub chests: SingleSettings,
    /// Coins inside one chest.
    pub chest_coins: PoolSettings,
}

impl DemoLayouts {
    /// The layouts shipped with the demo.
    ///
    /// # Errors
    ///
    /// Returns an error if a shipped layout does not validate.
    pub fn embedded() -> DemoResult<Self> {
        Ok(Self {
            obstacles: PoolSettings::from_toml_str(OBSTACLES)?,
            clouds: PoolSettings::from_toml_str(CLOUDS)?,
            chests: SingleSettings::from_toml_str(CHESTS)?,
            chest_coins: PoolSettings::from_toml_str(CHEST_COINS)?,
        })
    }

    /// Loads the four layout files from `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if a file is missing or does not validate.
    pub fn from_dir(dir: impl AsRef<Path>) -> DemoResult<Self> {
        let dir = dir.as_ref();
        Ok(Self {
            obstacles: PoolSettings::from_toml_file(dir.join("obstacles.toml"))?,
            clouds: PoolSettings::from_toml_file(dir.join("clouds.toml"))?,
            chests: SingleSettings::from_toml_file(dir.join("chests.toml"))?,
            chest_coins: PoolSettings::from_toml_file(dir.join("chest_coins.toml"))?,
        })
    }

    /// Pins every multi-type layout to a seed, for reproducible runs.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.obstacles.seed = Some(seed);
        self.clouds.seed = Some(seed.wrapping_add(1));
        self.chest_coins.seed = Some(seed.wrapping_add(2));
        self
    }
}

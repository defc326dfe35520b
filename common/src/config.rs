//! Configuration for a bot game.

use anyhow::Context;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Board parameters and bot pacing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub height: usize,
    pub width: usize,
    pub mines: usize,
    /// Seed for mine placement and random moves. `None` draws from the OS.
    pub seed: Option<u64>,
    /// Pause between moves so a game can be watched.
    pub move_delay_ms: u64,
    /// Stop after this many probes. `None` allows one per cell.
    pub max_moves: Option<usize>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            height: 8,
            width: 8,
            mines: 8,
            seed: None,
            move_delay_ms: 0,
            max_moves: None,
        }
    }
}

impl GameConfig {
    pub fn new(height: usize, width: usize, mines: usize) -> Self {
        Self {
            height,
            width,
            mines,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of cells on the board, or `None` if the size overflows.
    pub fn cells(&self) -> Option<usize> {
        self.height.checked_mul(self.width)
    }

    pub fn move_limit(&self) -> usize {
        self.max_moves.or(self.cells()).unwrap_or(usize::MAX)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let cells = self
            .cells()
            .with_context(|| format!("board size {} x {} overflows", self.height, self.width))?;
        anyhow::ensure!(
            cells > 0,
            "board has zero cells ({} x {})",
            self.height,
            self.width
        );
        anyhow::ensure!(
            self.mines < cells,
            "total mines ({}) must be less than the number of cells ({})",
            self.mines,
            cells
        );
        Ok(())
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_default_config() {
        let config = GameConfig::default();
        assert_eq!((config.height, config.width, config.mines), (8, 8, 8));
        assert_eq!(config.move_limit(), 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_boards() {
        assert!(GameConfig::new(0, 5, 0).validate().is_err());
        assert!(GameConfig::new(3, 3, 9).validate().is_err());
        assert!(GameConfig::new(3, 3, 8).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_overflowing_size() {
        let config = GameConfig::new(usize::MAX, 2, 1);
        assert_eq!(config.cells(), None);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_round_trips_through_bcs() {
        let config = GameConfig {
            max_moves: Some(20),
            move_delay_ms: 250,
            ..GameConfig::new(9, 12, 15).with_seed(77)
        };
        let bytes = bcs::to_bytes(&config).unwrap();
        let restored: GameConfig = bcs::from_bytes(&bytes).unwrap();
        assert_eq!(restored, config);
        restored.validate().unwrap();
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let config = GameConfig::default().with_seed(9);
        let a: u64 = config.rng().random();
        let b: u64 = config.rng().random();
        assert_eq!(a, b);
    }
}

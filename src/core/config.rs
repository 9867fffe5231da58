/// Session configuration — grid size, seed and generation knobs, loadable from RON.
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Knobs for one generation session. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub width: usize,
    pub height: usize,
    pub seed: u64,
    /// Probability that a free cell becomes an obstacle (0.0..=1.0).
    pub obstacle_density: f64,
    /// Wholesale layout rebuilds allowed before falling back to an open grid.
    pub layout_attempts: u32,
    /// Length of the side-quest chain behind the main quest.
    pub side_quests: usize,
    /// Alternative layouts produced by `layout_variations`.
    pub variations: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            seed: 0,
            obstacle_density: 0.15,
            layout_attempts: 8,
            side_quests: 3,
            variations: 2,
        }
    }
}

impl SessionConfig {
    pub fn load_from_ron(path: &Path) -> Result<SessionConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<SessionConfig, ConfigError> {
        let config: SessionConfig = ron::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "grid must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }
        let max = i32::MAX as usize;
        if self.width > max || self.height > max {
            return Err(ConfigError::Invalid(format!(
                "grid dimensions must fit in i32, got {}x{}",
                self.width, self.height
            )));
        }
        if !(0.0..=1.0).contains(&self.obstacle_density) {
            return Err(ConfigError::Invalid(format!(
                "obstacle_density must be within 0.0..=1.0, got {}",
                self.obstacle_density
            )));
        }
        if self.layout_attempts == 0 {
            return Err(ConfigError::Invalid(
                "layout_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

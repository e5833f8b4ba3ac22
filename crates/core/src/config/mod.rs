use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ExerciseKind, FormCoachError, Result};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.session.validate()?;
        Ok(config)
    }
}

/// What the user chose before pressing start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub exercise: ExerciseKind,
    pub target_reps: u32,
    pub total_sets: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            exercise: ExerciseKind::Pushups,
            target_reps: 12,
            total_sets: 3,
        }
    }
}

impl SessionConfig {
    pub fn new(exercise: ExerciseKind, target_reps: u32, total_sets: u32) -> Self {
        Self {
            exercise,
            target_reps,
            total_sets,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_reps == 0 {
            return Err(FormCoachError::InvalidConfig("target_reps must be at least 1"));
        }
        if self.total_sets == 0 {
            return Err(FormCoachError::InvalidConfig("total_sets must be at least 1"));
        }
        Ok(())
    }
}

/// Tuning constants for the frame pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Landmarks at or below this visibility are dropped.
    pub visibility_threshold: f32,
    /// Weight of the previous smoothed position.
    pub smoothing_alpha: f32,
    pub min_correct_streak: u32,
    pub rep_debounce_ms: u64,
    pub set_pause_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            visibility_threshold: 0.3,
            smoothing_alpha: 0.5,
            min_correct_streak: 2,
            rep_debounce_ms: 1200,
            set_pause_ms: 3000,
        }
    }
}

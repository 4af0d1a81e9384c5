//! Game balance
//!
//! Every number that shapes a session lives here. The shipped game only ever
//! plays with `Tuning::default()`; other values exist for tests and tooling.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Reasons a `Tuning` cannot drive a session
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuningError {
    #[error("goal must be at least one can")]
    ZeroGoal,
    #[error("session duration must be at least one second")]
    ZeroDuration,
    #[error("grid must have at least one cell")]
    EmptyGrid,
    #[error("cans per spawn range {start}..={max} is empty or starts at zero")]
    BadSpawnRange { start: u32, max: u32 },
    #[error("max cans per spawn ({max}) exceeds grid size ({cells})")]
    SpawnExceedsGrid { max: u32, cells: usize },
    #[error("spawn interval floor {min}ms is above start {start}ms or zero")]
    BadIntervalRange { start: u32, min: u32 },
    #[error("timer period `{0}` must be non-zero")]
    ZeroPeriod(&'static str),
    #[error("hazard chance {0} is outside [0, 1]")]
    BadHazardChance(f64),
}

/// Game balance knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Win / lose ===
    /// Cans collected to win
    pub goal: u32,
    /// Countdown start in seconds
    pub duration_secs: u32,

    // === Grid ===
    pub grid_cells: usize,

    // === Difficulty ramp ===
    pub start_cans_per_spawn: u32,
    pub max_cans_per_spawn: u32,
    pub start_spawn_interval_ms: u32,
    pub min_spawn_interval_ms: u32,
    pub spawn_interval_step_ms: u32,

    // === Timers ===
    pub countdown_period_ms: u32,
    pub difficulty_period_ms: u32,

    // === Spawns ===
    /// Probability (0.0 - 1.0) that a spawned can is a hazard
    pub hazard_chance: f64,

    // === Feedback ===
    pub feedback_duration_ms: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            goal: GOAL_CANS,
            duration_secs: GAME_TIME_SECS,

            grid_cells: GRID_CELLS,

            start_cans_per_spawn: START_CANS_PER_SPAWN,
            max_cans_per_spawn: MAX_CANS_PER_SPAWN,
            start_spawn_interval_ms: START_SPAWN_INTERVAL_MS,
            min_spawn_interval_ms: MIN_SPAWN_INTERVAL_MS,
            spawn_interval_step_ms: SPAWN_INTERVAL_STEP_MS,

            countdown_period_ms: COUNTDOWN_PERIOD_MS,
            difficulty_period_ms: DIFFICULTY_PERIOD_MS,

            hazard_chance: HAZARD_CHANCE,

            feedback_duration_ms: FEEDBACK_DURATION_MS,
        }
    }
}

impl Tuning {
    /// Check that the values describe a playable session
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.goal == 0 {
            return Err(TuningError::ZeroGoal);
        }
        if self.duration_secs == 0 {
            return Err(TuningError::ZeroDuration);
        }
        if self.grid_cells == 0 {
            return Err(TuningError::EmptyGrid);
        }
        if self.start_cans_per_spawn == 0 || self.start_cans_per_spawn > self.max_cans_per_spawn {
            return Err(TuningError::BadSpawnRange {
                start: self.start_cans_per_spawn,
                max: self.max_cans_per_spawn,
            });
        }
        if self.max_cans_per_spawn as usize > self.grid_cells {
            return Err(TuningError::SpawnExceedsGrid {
                max: self.max_cans_per_spawn,
                cells: self.grid_cells,
            });
        }
        if self.min_spawn_interval_ms == 0 || self.min_spawn_interval_ms > self.start_spawn_interval_ms {
            return Err(TuningError::BadIntervalRange {
                start: self.start_spawn_interval_ms,
                min: self.min_spawn_interval_ms,
            });
        }
        if self.countdown_period_ms == 0 {
            return Err(TuningError::ZeroPeriod("countdown_period_ms"));
        }
        if self.difficulty_period_ms == 0 {
            return Err(TuningError::ZeroPeriod("difficulty_period_ms"));
        }
        if !(0.0..=1.0).contains(&self.hazard_chance) {
            return Err(TuningError::BadHazardChance(self.hazard_chance));
        }
        Ok(())
    }

    /// Next cans-per-spawn value after one difficulty step
    pub fn escalate_cans(&self, current: u32) -> u32 {
        if current < self.max_cans_per_spawn {
            current + 1
        } else {
            current
        }
    }

    /// Next spawn interval after one difficulty step
    pub fn escalate_interval(&self, current: u32) -> u32 {
        current
            .saturating_sub(self.spawn_interval_step_ms)
            .max(self.min_spawn_interval_ms)
            .min(current)
    }
}

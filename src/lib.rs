//! Can Grid - A timed click-the-can arcade game
//!
//! Core modules:
//! - `sim`: Deterministic session engine (spawns, scoring, timers)
//! - `platform`: Display surfaces (browser DOM and headless recorder)
//! - `tuning`: Built-in game balance constants

pub mod platform;
pub mod sim;
pub mod tuning;

pub use platform::{DisplaySurface, FeedbackKind, PlayerInput, RecordingSurface};
pub use sim::{GameEngine, GameSession, SessionOutcome, SpawnKind, SpawnTarget};
pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Grid is a fixed 3x3 square
    pub const GRID_SIDE: usize = 3;
    pub const GRID_CELLS: usize = GRID_SIDE * GRID_SIDE;

    /// Cans needed to win
    pub const GOAL_CANS: u32 = 25;
    /// Session length in seconds
    pub const GAME_TIME_SECS: u32 = 30;

    /// Spawn density ramp (cans per spawn tick)
    pub const START_CANS_PER_SPAWN: u32 = 1;
    pub const MAX_CANS_PER_SPAWN: u32 = 3;

    /// Spawn interval ramp (ms)
    pub const START_SPAWN_INTERVAL_MS: u32 = 900;
    pub const MIN_SPAWN_INTERVAL_MS: u32 = 800;
    pub const SPAWN_INTERVAL_STEP_MS: u32 = 100;

    /// Fixed timer periods (ms)
    pub const COUNTDOWN_PERIOD_MS: u32 = 1000;
    pub const DIFFICULTY_PERIOD_MS: u32 = 10_000;

    /// Chance that a spawned can is a red (hazard) can
    pub const HAZARD_CHANCE: f64 = 0.2;

    /// How long a feedback message stays on screen (ms)
    pub const FEEDBACK_DURATION_MS: u32 = 1200;

    /// Longest frame delta fed into the scheduler (ms)
    pub const MAX_FRAME_MS: u64 = 1000;
}

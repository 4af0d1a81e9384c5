//! Session state and entity types
//!
//! Everything the engine mutates during a session lives in `GameSession`.

use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

/// What a spawned can is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnKind {
    /// Blue water can, +1 when clicked
    Collectible,
    /// Red can, -1 when clicked (floored at zero)
    Hazard,
}

/// Unique id of one spawned can instance
pub type SpawnId = u32;

/// A can occupying a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spawnable {
    pub id: SpawnId,
    pub kind: SpawnKind,
}

/// Identifies one spawned instance in one cell.
///
/// Surfaces hand this back on click; the engine only acts while the same
/// instance still occupies the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpawnTarget {
    pub cell: usize,
    pub id: SpawnId,
}

/// How a session finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionOutcome {
    /// Goal reached before the countdown ran out
    Won,
    /// Countdown hit zero
    TimedOut { collected: u32 },
}

/// One play-through, from start to win or time-out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    /// Cans collected so far
    pub collected: u32,
    /// Seconds left on the countdown
    pub time_left_secs: u32,
    /// Whether the session still accepts input and timer ticks
    pub active: bool,
    /// Cans placed per spawn tick
    pub cans_per_spawn: u32,
    /// Current spawn timer period (ms)
    pub spawn_interval_ms: u32,
    /// Grid contents, indexed by cell
    pub grid: Vec<Option<Spawnable>>,
    /// Thresholds already announced this session
    pub milestones_hit: Vec<u32>,
    /// Set once the session ends
    pub outcome: Option<SessionOutcome>,
}

impl GameSession {
    /// Idle state before the first start (nothing running)
    pub fn idle(tuning: &Tuning) -> Self {
        Self {
            collected: 0,
            time_left_secs: tuning.duration_secs,
            active: false,
            cans_per_spawn: tuning.start_cans_per_spawn,
            spawn_interval_ms: tuning.start_spawn_interval_ms,
            grid: vec![None; tuning.grid_cells],
            milestones_hit: Vec::new(),
            outcome: None,
        }
    }

    /// Fresh active session
    pub fn fresh(tuning: &Tuning) -> Self {
        Self {
            active: true,
            ..Self::idle(tuning)
        }
    }

    /// Returns the spawnable at `target` if that exact instance is still there
    pub fn live(&self, target: SpawnTarget) -> Option<Spawnable> {
        self.grid
            .get(target.cell)
            .copied()
            .flatten()
            .filter(|s| s.id == target.id)
    }

    /// Indices of occupied cells
    pub fn occupied_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.grid
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.map(|_| i))
    }

    /// Targets of every can currently on the grid
    pub fn visible(&self) -> Vec<(SpawnTarget, SpawnKind)> {
        self.grid
            .iter()
            .enumerate()
            .filter_map(|(cell, c)| c.map(|s| (SpawnTarget { cell, id: s.id }, s.kind)))
            .collect()
    }
}

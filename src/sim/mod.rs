//! Deterministic session module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Virtual clock only (platforms feed elapsed time in)
//! - Seeded RNG only
//! - All drawing goes through `DisplaySurface`

pub mod engine;
pub mod milestone;
pub mod state;
pub mod timers;

pub use engine::{ClickOutcome, GameEngine};
pub use milestone::{MILESTONES, Milestone};
pub use state::{GameSession, SessionOutcome, SpawnId, SpawnKind, SpawnTarget, Spawnable};
pub use timers::{Scheduler, TimerKind};

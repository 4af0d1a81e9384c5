//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Drawing the grid, cans, score, timer and feedback
//! - Forwarding clicks back into the engine
//! - Time (frame deltas on web, synthetic time when headless)

pub mod headless;
#[cfg(target_arch = "wasm32")]
pub mod dom;

pub use headless::{RecordingSurface, SurfaceCall};

use crate::sim::{SpawnKind, SpawnTarget};

/// Tone of a feedback message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Good,
    Bad,
}

/// Input forwarded from the page to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerInput {
    /// Start button pressed
    Start,
    /// A rendered can was clicked
    Click(SpawnTarget),
}

/// Everything the engine draws goes through this trait.
///
/// A surface that renders a can must forward a click on it as
/// `PlayerInput::Click(target)` with the exact target it was given.
pub trait DisplaySurface {
    /// (Re)draw an empty grid of `cells` slots
    fn render_grid(&mut self, cells: usize);
    /// Draw a can in `target.cell`
    fn render_spawnable(&mut self, target: SpawnTarget, kind: SpawnKind);
    fn clear_cell(&mut self, cell: usize);
    fn set_score_display(&mut self, value: u32);
    fn set_timer_display(&mut self, seconds: u32);
    /// Transient message; a newer message replaces an older one
    fn show_feedback(&mut self, message: &str, kind: FeedbackKind);
    fn clear_feedback(&mut self);
}

//! Headless display surface
//!
//! Records every call and mirrors what a page would show. Used by tests and
//! the native autoplay demo.

use super::{DisplaySurface, FeedbackKind};
use crate::sim::{SpawnKind, SpawnTarget};

/// One recorded surface call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    RenderGrid(usize),
    RenderSpawnable(SpawnTarget, SpawnKind),
    ClearCell(usize),
    Score(u32),
    Timer(u32),
    Feedback(String, FeedbackKind),
    ClearFeedback,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    /// Full call log, oldest first
    pub calls: Vec<SurfaceCall>,
    /// What each cell currently shows
    pub cells: Vec<Option<(SpawnTarget, SpawnKind)>>,
    pub score: Option<u32>,
    pub timer: Option<u32>,
    pub feedback: Option<(String, FeedbackKind)>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every feedback message shown so far, in order
    pub fn feedback_log(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SurfaceCall::Feedback(msg, _) => Some(msg.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Targets currently drawn on the grid
    pub fn drawn(&self) -> Vec<(SpawnTarget, SpawnKind)> {
        self.cells.iter().flatten().copied().collect()
    }

    /// First drawn can of the given kind
    pub fn find(&self, kind: SpawnKind) -> Option<SpawnTarget> {
        self.drawn()
            .into_iter()
            .find(|(_, k)| *k == kind)
            .map(|(t, _)| t)
    }
}

impl DisplaySurface for RecordingSurface {
    fn render_grid(&mut self, cells: usize) {
        self.cells = vec![None; cells];
        self.calls.push(SurfaceCall::RenderGrid(cells));
    }

    fn render_spawnable(&mut self, target: SpawnTarget, kind: SpawnKind) {
        if let Some(slot) = self.cells.get_mut(target.cell) {
            *slot = Some((target, kind));
        }
        self.calls.push(SurfaceCall::RenderSpawnable(target, kind));
    }

    fn clear_cell(&mut self, cell: usize) {
        if let Some(slot) = self.cells.get_mut(cell) {
            *slot = None;
        }
        self.calls.push(SurfaceCall::ClearCell(cell));
    }

    fn set_score_display(&mut self, value: u32) {
        self.score = Some(value);
        self.calls.push(SurfaceCall::Score(value));
    }

    fn set_timer_display(&mut self, seconds: u32) {
        self.timer = Some(seconds);
        self.calls.push(SurfaceCall::Timer(seconds));
    }

    fn show_feedback(&mut self, message: &str, kind: FeedbackKind) {
        self.feedback = Some((message.to_string(), kind));
        self.calls
            .push(SurfaceCall::Feedback(message.to_string(), kind));
    }

    fn clear_feedback(&mut self) {
        self.feedback = None;
        self.calls.push(SurfaceCall::ClearFeedback);
    }
}

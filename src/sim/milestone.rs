//! Collection milestones and feedback text.
//! Thresholds fire on an exact match only, once per session.

pub struct Milestone {
    pub count: u32,
    pub message: &'static str,
}

// Ordered small → large
pub const MILESTONES: &[Milestone] = &[
    Milestone {
        count: 5,
        message: "Great start! 5 cans!",
    },
    Milestone {
        count: 15,
        message: "Halfway there!",
    },
    Milestone {
        count: 25,
        message: "You did it! All cans collected!",
    },
];

pub const HAZARD_MESSAGE: &str = "Oops! That was a bad can!";
pub const WIN_MESSAGE: &str = "Congratulations! You collected all the cans!";

pub fn timeout_message(collected: u32) -> String {
    format!("Time's up! You collected {} cans.", collected)
}

/// Milestone whose threshold is exactly `collected`, if any
pub fn milestone_at(collected: u32) -> Option<&'static Milestone> {
    MILESTONES.iter().find(|m| m.count == collected)
}

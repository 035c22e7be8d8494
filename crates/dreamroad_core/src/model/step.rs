//! Flattened day-level step used for progress tracking.
//!
//! # Invariants
//! - `day` is the 1-based position inside the owning map's step list.
//! - `completed` is monotonic: once set it is never cleared.

use serde::{Deserialize, Serialize};

/// One day-level unit of progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Breakdown leaf id, or `step-{n}` for generated fallback steps.
    pub id: String,
    pub day: u32,
    pub title: String,
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub completed: bool,
}

impl StepRecord {
    /// Creates a step that is not completed yet.
    pub fn new(
        id: impl Into<String>,
        day: u32,
        title: impl Into<String>,
        task: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            day,
            title: title.into(),
            task: task.into(),
            completed: false,
        }
    }

    /// Marks this step completed. Returns `false` when it already was.
    pub fn complete(&mut self) -> bool {
        let changed = !self.completed;
        self.completed = true;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::StepRecord;

    #[test]
    fn complete_is_monotonic() {
        let mut step = StepRecord::new("day--0", 1, "День 1", "");
        assert!(!step.completed);
        assert!(step.complete());
        assert!(!step.complete());
        assert!(step.completed);
    }
}

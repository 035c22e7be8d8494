//! Goal map entity: one user goal with its ordered step list.
//!
//! # Responsibility
//! - Hold the persisted plan created from a finalized breakdown.
//! - Track progress through the step list.
//!
//! # Invariants
//! - `steps` is non-empty and `day` runs `1..=steps.len()` without gaps.
//! - Steps before `current_step` are completed; steps from `current_step` on
//!   are not. Progress only moves forward.

use crate::model::period::Breakdown;
use crate::model::step::StepRecord;
use crate::planner::duration::PeriodChoice;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one goal map.
pub type MapId = Uuid;

/// Input for creating a map, produced by a finished planning session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMapRequest {
    pub goal: String,
    pub description: String,
    pub period: PeriodChoice,
    /// `None` means no breakdown was prepared; generic day steps are used.
    pub breakdown: Option<Breakdown>,
}

/// Persisted goal plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalMap {
    pub uuid: MapId,
    pub goal: String,
    #[serde(default)]
    pub description: String,
    pub period: PeriodChoice,
    /// Requested duration in days.
    pub period_days: u32,
    /// Index of the next step to complete; equals the completed count.
    pub current_step: u32,
    pub steps: Vec<StepRecord>,
    /// Epoch ms; assigned by storage.
    pub created_at: Option<i64>,
    /// Epoch ms; assigned by storage.
    pub updated_at: Option<i64>,
    pub is_deleted: bool,
}

/// Snapshot of map progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapProgress {
    pub current_step: u32,
    pub total_steps: u32,
    /// `0.0..=100.0`.
    pub percent: f64,
}

impl MapProgress {
    pub fn is_finished(&self) -> bool {
        self.current_step >= self.total_steps
    }
}

impl GoalMap {
    /// Creates a map with a generated id and no progress.
    ///
    /// # Errors
    /// Returns `MapValidationError` when goal or steps violate map invariants.
    pub fn new(
        goal: impl Into<String>,
        description: impl Into<String>,
        period: PeriodChoice,
        period_days: u32,
        steps: Vec<StepRecord>,
    ) -> Result<Self, MapValidationError> {
        let map = Self {
            uuid: Uuid::new_v4(),
            goal: goal.into().trim().to_string(),
            description: description.into().trim().to_string(),
            period,
            period_days,
            current_step: 0,
            steps,
            created_at: None,
            updated_at: None,
            is_deleted: false,
        };
        map.validate()?;
        Ok(map)
    }

    pub fn total_steps(&self) -> u32 {
        self.steps.len() as u32
    }

    /// Next step to complete, `None` once every step is done.
    pub fn current(&self) -> Option<&StepRecord> {
        self.steps.get(self.current_step as usize)
    }

    pub fn progress(&self) -> MapProgress {
        let total_steps = self.total_steps();
        let percent = if total_steps == 0 {
            0.0
        } else {
            f64::from(self.current_step) * 100.0 / f64::from(total_steps)
        };
        MapProgress {
            current_step: self.current_step,
            total_steps,
            percent,
        }
    }

    /// Completes the current step and advances.
    ///
    /// Returns the completed step's `day`, or `None` when all steps are done.
    pub fn complete_current_step(&mut self) -> Option<u32> {
        let step = self.steps.get_mut(self.current_step as usize)?;
        step.complete();
        self.current_step += 1;
        Some(step.day)
    }

    /// Checks map invariants.
    pub fn validate(&self) -> Result<(), MapValidationError> {
        if self.goal.trim().is_empty() {
            return Err(MapValidationError::BlankGoal);
        }
        if self.steps.is_empty() {
            return Err(MapValidationError::NoSteps);
        }
        if self.current_step > self.total_steps() {
            return Err(MapValidationError::CurrentStepOutOfRange {
                current_step: self.current_step,
                total_steps: self.total_steps(),
            });
        }
        for (index, step) in self.steps.iter().enumerate() {
            let expected_day = index as u32 + 1;
            if step.day != expected_day {
                return Err(MapValidationError::NonContiguousDay {
                    expected: expected_day,
                    actual: step.day,
                });
            }
            if step.completed != (index < self.current_step as usize) {
                return Err(MapValidationError::ProgressMismatch { day: step.day });
            }
        }
        Ok(())
    }
}

/// Goal map invariant violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapValidationError {
    BlankGoal,
    NoSteps,
    NonContiguousDay { expected: u32, actual: u32 },
    CurrentStepOutOfRange { current_step: u32, total_steps: u32 },
    /// Completion flag disagrees with `current_step` for this day.
    ProgressMismatch { day: u32 },
}

impl Display for MapValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankGoal => write!(f, "goal title must not be blank"),
            Self::NoSteps => write!(f, "goal map must contain at least one step"),
            Self::NonContiguousDay { expected, actual } => {
                write!(f, "step day {actual} found where day {expected} was expected")
            }
            Self::CurrentStepOutOfRange {
                current_step,
                total_steps,
            } => write!(
                f,
                "current step {current_step} is beyond {total_steps} steps"
            ),
            Self::ProgressMismatch { day } => {
                write!(f, "completion state of day {day} disagrees with map progress")
            }
        }
    }
}

impl Error for MapValidationError {}

#[cfg(test)]
mod tests {
    use super::{GoalMap, MapValidationError};
    use crate::model::step::StepRecord;
    use crate::planner::duration::{PeriodChoice, PeriodPreset};
    use crate::planner::flatten::fallback_steps;

    fn week() -> PeriodChoice {
        PeriodChoice::Preset {
            preset: PeriodPreset::Week,
        }
    }

    #[test]
    fn new_trims_goal_and_starts_without_progress() {
        let map = GoalMap::new("  Марафон ", "", week(), 7, fallback_steps(7)).unwrap();
        assert_eq!(map.goal, "Марафон");
        assert_eq!(map.current_step, 0);
        assert_eq!(map.total_steps(), 7);
        assert!(!map.is_deleted);
    }

    #[test]
    fn new_rejects_blank_goal_and_gaps() {
        assert_eq!(
            GoalMap::new("  ", "", week(), 7, fallback_steps(7)).unwrap_err(),
            MapValidationError::BlankGoal
        );

        let steps = vec![
            StepRecord::new("a", 1, "День 1", ""),
            StepRecord::new("b", 3, "День 3", ""),
        ];
        assert_eq!(
            GoalMap::new("Цель", "", week(), 2, steps).unwrap_err(),
            MapValidationError::NonContiguousDay {
                expected: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn complete_current_step_advances_until_done() {
        let mut map = GoalMap::new("Цель", "", week(), 2, fallback_steps(2)).unwrap();
        assert_eq!(map.complete_current_step(), Some(1));
        assert_eq!(map.complete_current_step(), Some(2));
        assert_eq!(map.complete_current_step(), None);

        let progress = map.progress();
        assert!(progress.is_finished());
        assert_eq!(progress.percent, 100.0);
        assert!(map.steps.iter().all(|step| step.completed));
        assert!(map.validate().is_ok());
    }
}

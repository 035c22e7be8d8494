//! Tree to list conversions.
//!
//! Both modes walk depth-first, left-to-right, so list order matches the
//! chronological order of the tree.

use crate::model::period::{Breakdown, PeriodKind};
use crate::model::step::StepRecord;
use log::warn;
use serde::{Deserialize, Serialize};

/// One entry of the all-nodes listing sent to the advice service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatPeriod {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PeriodKind,
    pub title: String,
    pub days: u32,
    pub task: String,
    /// Always empty; part of the service request schema.
    #[serde(default)]
    pub description: String,
}

/// Flattens leaves into the ordered step list used for progress tracking.
///
/// A tree without leaves falls back to one generic step per requested day,
/// so the result is never empty.
pub fn flatten_steps(breakdown: &Breakdown) -> Vec<StepRecord> {
    let steps = breakdown
        .iter()
        .filter(|node| node.is_leaf())
        .zip(1u32..)
        .map(|(node, day)| {
            StepRecord::new(
                node.id.as_str(),
                day,
                node.title.as_str(),
                node.task.as_str(),
            )
        })
        .collect::<Vec<_>>();

    if !steps.is_empty() {
        return steps;
    }

    warn!(
        "event=steps_fallback module=planner status=ok total_days={}",
        breakdown.total_days
    );
    fallback_steps(breakdown.total_days.get())
}

/// Generic `step-{n}` list used when no breakdown leaves are available.
pub fn fallback_steps(total_days: u32) -> Vec<StepRecord> {
    (0..total_days)
        .map(|index| {
            StepRecord::new(
                format!("step-{index}"),
                index + 1,
                format!("День {}", index + 1),
                "",
            )
        })
        .collect()
}

/// Flattens every node, inner nodes included.
pub fn flatten_periods(breakdown: &Breakdown) -> Vec<FlatPeriod> {
    breakdown
        .iter()
        .map(|node| FlatPeriod {
            id: node.id.to_string(),
            kind: node.kind,
            title: node.title.clone(),
            days: node.days,
            task: node.task.clone(),
            description: String::new(),
        })
        .collect()
}

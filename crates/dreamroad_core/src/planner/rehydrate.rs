//! Merge of externally suggested node updates back into a breakdown.
//!
//! # Responsibility
//! - Decode override records from the advice payload, best effort.
//! - Apply title/task/days overrides to nodes matched by id.
//!
//! # Invariants
//! - Malformed override entries are skipped; decoding never fails.
//! - Unknown ids leave the tree untouched.
//! - Merge is shallow: a `days` override does not re-balance ancestors or
//!   siblings, so `days == sum(children.days)` may no longer hold afterwards.

use crate::model::period::{Breakdown, PeriodNode};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Suggested update for one node.
///
/// `description` is a fallback for `task` and never stored on the node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodOverride {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PeriodOverride {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// Counts of changes made by one `apply_overrides` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RehydrateSummary {
    /// Nodes whose id had an override record.
    pub matched: usize,
    pub titles: usize,
    pub tasks: usize,
    pub days: usize,
}

/// Decodes override records from a JSON array.
///
/// Non-array input yields no overrides. Entries that are not objects, lack a
/// string `id`, or carry a wrongly typed field are skipped. `null` fields
/// count as absent.
pub fn parse_overrides(value: &Value) -> Vec<PeriodOverride> {
    let Some(entries) = value.as_array() else {
        return Vec::new();
    };
    let overrides = entries
        .iter()
        .filter_map(parse_override_entry)
        .collect::<Vec<_>>();
    if overrides.len() != entries.len() {
        debug!(
            "event=overrides_parse module=planner status=ok accepted={} skipped={}",
            overrides.len(),
            entries.len() - overrides.len()
        );
    }
    overrides
}

fn parse_override_entry(value: &Value) -> Option<PeriodOverride> {
    let object = value.as_object()?;
    let id = object.get("id")?.as_str()?.to_string();
    Some(PeriodOverride {
        id,
        title: optional_text(object, "title")?,
        task: optional_text(object, "task")?,
        days: optional_whole_number(object, "days")?,
        description: optional_text(object, "description")?,
    })
}

/// Outer `None` marks a wrongly typed field.
fn optional_text(object: &Map<String, Value>, key: &str) -> Option<Option<String>> {
    match object.get(key) {
        None | Some(Value::Null) => Some(None),
        Some(Value::String(text)) => Some(Some(text.clone())),
        Some(_) => None,
    }
}

fn optional_whole_number(object: &Map<String, Value>, key: &str) -> Option<Option<i64>> {
    match object.get(key) {
        None | Some(Value::Null) => Some(None),
        Some(Value::Number(number)) => {
            if let Some(value) = number.as_i64() {
                return Some(Some(value));
            }
            let value = number.as_f64()?;
            if value.fract() == 0.0 && value.abs() <= i64::MAX as f64 {
                Some(Some(value as i64))
            } else {
                None
            }
        }
        Some(_) => None,
    }
}

/// Applies `overrides` to matching nodes in place.
///
/// Matching is by id, depth-first; when an id repeats, the last record wins.
pub fn apply_overrides(
    breakdown: &mut Breakdown,
    overrides: &[PeriodOverride],
) -> RehydrateSummary {
    let by_id = overrides
        .iter()
        .map(|item| (item.id.as_str(), item))
        .collect::<HashMap<_, _>>();

    let mut summary = RehydrateSummary::default();
    if !by_id.is_empty() {
        for node in &mut breakdown.nodes {
            apply_to_subtree(node, &by_id, &mut summary);
        }
    }

    debug!(
        "event=breakdown_rehydrate module=planner status=ok overrides={} matched={} titles={} tasks={} days={}",
        overrides.len(),
        summary.matched,
        summary.titles,
        summary.tasks,
        summary.days
    );
    summary
}

/// By-value form of [`apply_overrides`].
pub fn rehydrate(mut breakdown: Breakdown, overrides: &[PeriodOverride]) -> Breakdown {
    apply_overrides(&mut breakdown, overrides);
    breakdown
}

fn apply_to_subtree(
    node: &mut PeriodNode,
    by_id: &HashMap<&str, &PeriodOverride>,
    summary: &mut RehydrateSummary,
) {
    if let Some(update) = by_id.get(node.id.as_str()) {
        summary.matched += 1;
        apply_one(node, update, summary);
    }
    for child in &mut node.children {
        apply_to_subtree(child, by_id, summary);
    }
}

fn apply_one(node: &mut PeriodNode, update: &PeriodOverride, summary: &mut RehydrateSummary) {
    if let Some(title) = non_blank(update.title.as_deref()) {
        node.title = title.to_string();
        summary.titles += 1;
    }

    if let Some(task) = non_blank(update.task.as_deref()) {
        node.task = task.to_string();
        summary.tasks += 1;
    } else if let Some(description) = non_blank(update.description.as_deref()) {
        if node.task.is_empty() {
            node.task = description.to_string();
            summary.tasks += 1;
        }
    }

    if let Some(days) = update
        .days
        .and_then(|value| u32::try_from(value).ok())
        .filter(|value| *value > 0)
    {
        if days != node.days {
            node.days = days;
            summary.days += 1;
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|text| !text.is_empty())
}

//! Period breakdown tree model.
//!
//! # Responsibility
//! - Define the node shape shared by the builder, flattener and rehydrator.
//! - Provide read helpers (lookup, depth-first walk) and the user edit path.
//!
//! # Invariants
//! - Node ids are unique within one `Breakdown`.
//! - A freshly built tree has `days == sum(children.days)` on every inner node
//!   and exactly `total_days` leaves. Rehydrated trees may drift; use
//!   `Breakdown::validate()` when consistency is required.
//! - `children` order is chronological.

use crate::planner::duration::TotalDays;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Granularity tag of one period node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    /// Whole 365-day block.
    Year,
    /// Leftover remainder after the last whole year.
    Period,
    /// Up to 30 days.
    Month,
    /// Up to 7 days.
    Week,
    /// Single calendar day, always a leaf.
    Day,
}

impl PeriodKind {
    /// Stable lowercase tag used in ids and wire payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Period => "period",
            Self::Month => "month",
            Self::Week => "week",
            Self::Day => "day",
        }
    }
}

impl Display for PeriodKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node identifier, e.g. `month-0-2` or `day--0-3`.
///
/// Kept as the rendered string so ids round-trip unchanged through the
/// advice service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodId(String);

impl PeriodId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for PeriodId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeriodId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl PartialEq<str> for PeriodId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PeriodId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// One node of the breakdown tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodNode {
    pub id: PeriodId,
    /// Serialized as `type` to match the front end and advice service schema.
    #[serde(rename = "type")]
    pub kind: PeriodKind,
    pub title: String,
    #[serde(default)]
    pub task: String,
    /// Calendar days covered by this node.
    pub days: u32,
    #[serde(default)]
    pub children: Vec<PeriodNode>,
}

impl PeriodNode {
    /// Creates a node with an empty task.
    pub fn new(
        id: PeriodId,
        kind: PeriodKind,
        title: impl Into<String>,
        days: u32,
        children: Vec<PeriodNode>,
    ) -> Self {
        Self {
            id,
            kind,
            title: title.into(),
            task: String::new(),
            days,
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Sum of direct children `days`.
    pub fn children_days(&self) -> u64 {
        self.children.iter().map(|child| u64::from(child.days)).sum()
    }

    /// Number of leaves in this subtree, counting `self` when it is a leaf.
    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            return 1;
        }
        self.children.iter().map(PeriodNode::leaf_count).sum()
    }
}

/// Owned breakdown of one goal duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakdown {
    /// Requested duration the tree was built for. Deserializing rejects
    /// values outside `1..=MAX_TOTAL_DAYS`.
    pub total_days: TotalDays,
    /// Top-level nodes in chronological order.
    pub nodes: Vec<PeriodNode>,
}

impl Breakdown {
    pub fn new(total_days: TotalDays, nodes: Vec<PeriodNode>) -> Self {
        Self { total_days, nodes }
    }

    /// Walks every node depth-first, parents before children.
    pub fn iter(&self) -> DepthFirst<'_> {
        DepthFirst::new(&self.nodes)
    }

    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().map(PeriodNode::leaf_count).sum()
    }

    pub fn find(&self, id: &str) -> Option<&PeriodNode> {
        self.iter().find(|node| node.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut PeriodNode> {
        find_in_mut(&mut self.nodes, id)
    }

    /// Applies a manual title/task edit to one node.
    ///
    /// # Errors
    /// - `NodeEditError::BlankTitle` when `title` is blank after trim.
    /// - `NodeEditError::NodeNotFound` when no node has this id.
    pub fn edit_node(&mut self, id: &str, title: &str, task: &str) -> Result<(), NodeEditError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(NodeEditError::BlankTitle);
        }
        let node = self
            .find_mut(id)
            .ok_or_else(|| NodeEditError::NodeNotFound(PeriodId::new(id)))?;
        node.title = title.to_string();
        node.task = task.trim().to_string();
        Ok(())
    }

    /// Checks structural consistency of the whole tree.
    ///
    /// Reports the first problem found in depth-first order.
    pub fn validate(&self) -> Result<(), BreakdownError> {
        let mut seen = HashSet::new();
        for node in self.iter() {
            if node.days == 0 {
                return Err(BreakdownError::ZeroDays(node.id.clone()));
            }
            if !seen.insert(node.id.as_str()) {
                return Err(BreakdownError::DuplicateId(node.id.clone()));
            }
            if !node.is_leaf() && u64::from(node.days) != node.children_days() {
                return Err(BreakdownError::SumMismatch {
                    id: node.id.clone(),
                    days: node.days,
                    children_days: node.children_days(),
                });
            }
        }

        let leaves = self.leaf_count();
        if leaves != self.total_days.get() as usize {
            return Err(BreakdownError::LeafCountMismatch {
                expected: self.total_days.get(),
                actual: leaves,
            });
        }
        Ok(())
    }
}

fn find_in_mut<'a>(nodes: &'a mut [PeriodNode], id: &str) -> Option<&'a mut PeriodNode> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_in_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

/// Depth-first, left-to-right iterator over breakdown nodes.
pub struct DepthFirst<'a> {
    stack: Vec<&'a PeriodNode>,
}

impl<'a> DepthFirst<'a> {
    fn new(roots: &'a [PeriodNode]) -> Self {
        Self {
            stack: roots.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = &'a PeriodNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Manual node edit failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEditError {
    /// Title is blank after trim.
    BlankTitle,
    /// No node carries the requested id.
    NodeNotFound(PeriodId),
}

impl Display for NodeEditError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "period title must not be blank"),
            Self::NodeNotFound(id) => write!(f, "period node not found: {id}"),
        }
    }
}

impl Error for NodeEditError {}

/// Structural problems reported by `Breakdown::validate()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakdownError {
    /// Node spans zero days.
    ZeroDays(PeriodId),
    /// Same id appears twice.
    DuplicateId(PeriodId),
    /// Inner node `days` differs from the sum of its children.
    SumMismatch {
        id: PeriodId,
        days: u32,
        children_days: u64,
    },
    /// Leaf count differs from the requested duration.
    LeafCountMismatch { expected: u32, actual: usize },
}

impl Display for BreakdownError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroDays(id) => write!(f, "period `{id}` spans zero days"),
            Self::DuplicateId(id) => write!(f, "duplicate period id `{id}`"),
            Self::SumMismatch {
                id,
                days,
                children_days,
            } => write!(
                f,
                "period `{id}` spans {days} days but its children span {children_days}"
            ),
            Self::LeafCountMismatch { expected, actual } => write!(
                f,
                "breakdown has {actual} day leaves, expected {expected}"
            ),
        }
    }
}

impl Error for BreakdownError {}

#[cfg(test)]
mod tests {
    use super::{Breakdown, BreakdownError, NodeEditError, PeriodId, PeriodKind, PeriodNode};
    use crate::planner::duration::TotalDays;

    fn day(id: &str) -> PeriodNode {
        PeriodNode::new(PeriodId::new(id), PeriodKind::Day, "День", 1, Vec::new())
    }

    fn sample() -> Breakdown {
        let week = PeriodNode::new(
            PeriodId::new("week--0"),
            PeriodKind::Week,
            "Неделя 1",
            2,
            vec![day("day--0-0"), day("day--0-1")],
        );
        Breakdown::new(TotalDays::new(3).unwrap(), vec![week, day("day-x")])
    }

    #[test]
    fn iter_visits_parents_before_children_in_order() {
        let ids = sample()
            .iter()
            .map(|node| node.id.to_string())
            .collect::<Vec<_>>();
        assert_eq!(ids, ["week--0", "day--0-0", "day--0-1", "day-x"]);
    }

    #[test]
    fn edit_node_trims_and_rejects_blank_title() {
        let mut breakdown = sample();
        breakdown
            .edit_node("day--0-1", "  Пробежка ", "  5 км  ")
            .unwrap();
        let node = breakdown.find("day--0-1").unwrap();
        assert_eq!(node.title, "Пробежка");
        assert_eq!(node.task, "5 км");

        assert_eq!(
            breakdown.edit_node("day--0-1", "   ", "x"),
            Err(NodeEditError::BlankTitle)
        );
        assert_eq!(
            breakdown.edit_node("missing", "t", ""),
            Err(NodeEditError::NodeNotFound(PeriodId::new("missing")))
        );
    }

    #[test]
    fn validate_reports_sum_drift() {
        let mut breakdown = sample();
        breakdown.nodes[0].days = 5;
        assert_eq!(
            breakdown.validate(),
            Err(BreakdownError::SumMismatch {
                id: PeriodId::new("week--0"),
                days: 5,
                children_days: 2,
            })
        );
    }

    #[test]
    fn serializes_kind_under_type_key() {
        let json = serde_json::to_value(day("day--0")).unwrap();
        assert_eq!(json["type"], "day");
        assert_eq!(json["id"], "day--0");
        assert_eq!(json["children"], serde_json::json!([]));
    }

    #[test]
    fn deserialize_rejects_out_of_range_total_days() {
        for total in ["0", "-4", "36501", "4000000000"] {
            let json = format!(r#"{{"total_days":{total},"nodes":[]}}"#);
            assert!(
                serde_json::from_str::<Breakdown>(&json).is_err(),
                "total_days={total} should be rejected"
            );
        }

        let parsed: Breakdown = serde_json::from_str(r#"{"total_days":3,"nodes":[]}"#).unwrap();
        assert_eq!(parsed.total_days.get(), 3);
        assert_eq!(
            serde_json::to_value(&parsed).unwrap()["total_days"],
            serde_json::json!(3)
        );
    }
}

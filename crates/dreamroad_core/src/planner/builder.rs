//! Recursive breakdown builder.
//!
//! # Responsibility
//! - Turn a validated duration into a tree of year/period/month/week/day nodes.
//!
//! # Invariants
//! - Output is deterministic for a given `TotalDays`, ids included.
//! - Every inner node's `days` equals the sum of its children; the tree has
//!   exactly `total_days` day leaves.
//! - Trailing blocks are clamped with `min`; zero-day blocks are never emitted.

use crate::model::period::{Breakdown, PeriodId, PeriodKind, PeriodNode};
use crate::planner::classify::{classify, Granularity, MONTH_DAYS, WEEK_DAYS, YEAR_DAYS};
use crate::planner::duration::TotalDays;
use log::debug;

const REMAINDER_ID: &str = "remaining-period";
const REMAINDER_TITLE: &str = "Дополнительный период";

/// Accumulated parent path threaded through the recursive rules.
///
/// A node's own path is its parent path and local index joined by `-`, so a
/// week built at the top level renders as `-0` and its id as `week--0`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct NodePath(String);

impl NodePath {
    fn root() -> Self {
        Self(String::new())
    }

    /// Path of the year block at `index`; also the parent of its months.
    fn year(index: u32) -> Self {
        Self(index.to_string())
    }

    fn child(&self, index: u32) -> Self {
        Self(format!("{}-{index}", self.0))
    }

    fn id(&self, kind: PeriodKind) -> PeriodId {
        PeriodId::new(format!("{}-{}", kind.as_str(), self.0))
    }
}

/// Builds the full breakdown for `total`.
pub fn build_breakdown(total: TotalDays) -> Breakdown {
    let days = total.get();
    let nodes = match classify(total) {
        Granularity::Years {
            full_years,
            remainder,
        } => year_rule(full_years, remainder),
        Granularity::Months => month_rule(days, &NodePath::year(0)),
        Granularity::Weeks => week_rule(days, &NodePath::root()),
        Granularity::Days => day_rule(days, &NodePath::root()),
    };
    let breakdown = Breakdown::new(total, nodes);
    debug!(
        "event=breakdown_build module=planner status=ok total_days={} top_level={} nodes={} leaves={}",
        days,
        breakdown.nodes.len(),
        breakdown.node_count(),
        breakdown.leaf_count()
    );
    breakdown
}

fn year_rule(full_years: u32, remainder: u32) -> Vec<PeriodNode> {
    let mut nodes = (0..full_years)
        .map(|index| {
            let path = NodePath::year(index);
            PeriodNode::new(
                path.id(PeriodKind::Year),
                PeriodKind::Year,
                format!("Год {}", index + 1),
                YEAR_DAYS,
                month_rule(YEAR_DAYS, &path),
            )
        })
        .collect::<Vec<_>>();

    if remainder > 0 {
        nodes.push(PeriodNode::new(
            PeriodId::new(REMAINDER_ID),
            PeriodKind::Period,
            REMAINDER_TITLE,
            remainder,
            month_rule(remainder, &NodePath::year(full_years)),
        ));
    }
    nodes
}

fn month_rule(days: u32, year: &NodePath) -> Vec<PeriodNode> {
    blocks(days, MONTH_DAYS)
        .map(|(index, month_days)| {
            let path = year.child(index);
            let children = if month_days >= WEEK_DAYS {
                week_rule(month_days, &path)
            } else {
                day_rule(month_days, &path)
            };
            PeriodNode::new(
                path.id(PeriodKind::Month),
                PeriodKind::Month,
                format!("{}-й месяц", index + 1),
                month_days,
                children,
            )
        })
        .collect()
}

fn week_rule(days: u32, parent: &NodePath) -> Vec<PeriodNode> {
    blocks(days, WEEK_DAYS)
        .map(|(index, week_days)| {
            let path = parent.child(index);
            PeriodNode::new(
                path.id(PeriodKind::Week),
                PeriodKind::Week,
                format!("Неделя {}", index + 1),
                week_days,
                day_rule(week_days, &path),
            )
        })
        .collect()
}

fn day_rule(days: u32, parent: &NodePath) -> Vec<PeriodNode> {
    (0..days)
        .map(|index| {
            PeriodNode::new(
                parent.child(index).id(PeriodKind::Day),
                PeriodKind::Day,
                format!("День {}", index + 1),
                1,
                Vec::new(),
            )
        })
        .collect()
}

/// Splits `days` into `ceil(days / size)` blocks; the last one may be shorter.
fn blocks(days: u32, size: u32) -> impl Iterator<Item = (u32, u32)> {
    (0..days.div_ceil(size)).map(move |index| (index, size.min(days - index * size)))
}

#[cfg(test)]
mod tests {
    use super::{blocks, build_breakdown, NodePath};
    use crate::model::period::PeriodKind;
    use crate::planner::duration::TotalDays;

    #[test]
    fn blocks_clamp_the_last_block() {
        assert_eq!(blocks(45, 30).collect::<Vec<_>>(), [(0, 30), (1, 15)]);
        assert_eq!(blocks(14, 7).collect::<Vec<_>>(), [(0, 7), (1, 7)]);
        assert_eq!(blocks(3, 7).collect::<Vec<_>>(), [(0, 3)]);
    }

    #[test]
    fn node_path_renders_hyphen_joined_ids() {
        let month = NodePath::year(0).child(2);
        assert_eq!(month.id(PeriodKind::Month), "month-0-2");
        assert_eq!(month.child(1).id(PeriodKind::Week), "week-0-2-1");
        assert_eq!(
            month.child(1).child(3).id(PeriodKind::Day),
            "day-0-2-1-3"
        );
        assert_eq!(NodePath::root().child(0).id(PeriodKind::Week), "week--0");
    }

    #[test]
    fn short_month_uses_day_rule() {
        // 365 + 35 → remainder months of 30 and 5 days.
        let breakdown = build_breakdown(TotalDays::new(400).unwrap());
        let remainder = &breakdown.nodes[1];
        let short_month = &remainder.children[1];
        assert_eq!(short_month.days, 5);
        assert!(short_month
            .children
            .iter()
            .all(|child| child.kind == PeriodKind::Day));
        assert_eq!(short_month.id, "month-1-1");
        assert_eq!(short_month.children[0].id, "day-1-1-0");
    }
}

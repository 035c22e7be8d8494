//! Domain model for goal planning.
//!
//! # Responsibility
//! - Define the breakdown tree, the flattened step record and the goal map.
//!
//! # Invariants
//! - Breakdown node ids are stable for the same requested duration.
//! - Step completion is monotonic for the lifetime of a map.

pub mod goal_map;
pub mod period;
pub mod step;

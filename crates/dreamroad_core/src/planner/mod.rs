//! Goal duration planning.
//!
//! # Responsibility
//! - Turn a chosen duration into a hierarchical breakdown.
//! - Flatten breakdowns into ordered day steps.
//! - Merge externally suggested edits back into a breakdown.
//!
//! # Invariants
//! - Everything here is pure except logging; no storage, no network.
//!
//! # See also
//! - docs in `model::period` for the tree shape.

pub mod builder;
pub mod classify;
pub mod duration;
pub mod flatten;
pub mod rehydrate;
pub mod session;

//! Repository layer for persisted goal maps.
//!
//! # Invariants
//! - Repositories are built with `try_new` and refuse unmigrated connections.
//! - Repository APIs return semantic errors (`NotFound`) besides DB errors.

pub mod map_repo;

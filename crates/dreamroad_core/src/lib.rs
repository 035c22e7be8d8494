//! Core domain logic for Road to Your Dream.
//! Duration planning is pure and builds for every target; storage and file
//! logging require the `native` feature.

pub mod advice;
#[cfg(feature = "native")]
pub mod db;
#[cfg(feature = "native")]
pub mod logging;
pub mod model;
pub mod planner;
#[cfg(feature = "native")]
pub mod repo;
#[cfg(feature = "native")]
pub mod service;

pub use advice::{AdviceError, AdviceProvider, AdviceRequest, AdviceResponse};
pub use model::goal_map::{GoalMap, MapId, MapProgress, MapValidationError, NewMapRequest};
pub use model::period::{
    Breakdown, BreakdownError, NodeEditError, PeriodId, PeriodKind, PeriodNode,
};
pub use model::step::StepRecord;
pub use planner::builder::build_breakdown;
pub use planner::duration::{
    InvalidDurationError, PeriodChoice, PeriodPreset, TotalDays, MAX_TOTAL_DAYS,
};
pub use planner::flatten::{fallback_steps, flatten_periods, flatten_steps, FlatPeriod};
pub use planner::rehydrate::{
    apply_overrides, parse_overrides, rehydrate, PeriodOverride, RehydrateSummary,
};
pub use planner::session::{AdviceOutcome, AdvicePolicy, PlanningSession, SessionError};

#[cfg(feature = "native")]
pub use db::{open_db, open_db_in_memory, DbError};
#[cfg(feature = "native")]
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
#[cfg(feature = "native")]
pub use repo::map_repo::{MapRepoError, MapRepoResult, MapRepository, SqliteMapRepository};
#[cfg(feature = "native")]
pub use service::map_service::{MapService, MapServiceError, MapServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

//! Goal map use-case service.
//!
//! # Responsibility
//! - Create maps from finished planning sessions.
//! - Advance progress one step at a time.
//!
//! # Invariants
//! - Steps are completed strictly in order; skipping ahead is not exposed.
//! - Service layer stays storage-agnostic behind `MapRepository`.

use crate::model::goal_map::{GoalMap, MapId, MapProgress, MapValidationError, NewMapRequest};
use crate::planner::builder::build_breakdown;
use crate::planner::duration::InvalidDurationError;
use crate::planner::flatten::flatten_steps;
use crate::repo::map_repo::{MapRepoError, MapRepository};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type MapServiceResult<T> = Result<T, MapServiceError>;

#[derive(Debug)]
pub enum MapServiceError {
    InvalidDuration(InvalidDurationError),
    Validation(MapValidationError),
    /// Map does not exist or is soft-deleted.
    NotFound(MapId),
    /// Every step of the map is already completed.
    AllStepsCompleted(MapId),
    Repo(MapRepoError),
}

impl Display for MapServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDuration(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "goal map not found: {id}"),
            Self::AllStepsCompleted(id) => write!(f, "all steps of goal map {id} are completed"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MapServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidDuration(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NotFound(_) | Self::AllStepsCompleted(_) => None,
        }
    }
}

impl From<InvalidDurationError> for MapServiceError {
    fn from(value: InvalidDurationError) -> Self {
        Self::InvalidDuration(value)
    }
}

impl From<MapValidationError> for MapServiceError {
    fn from(value: MapValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<MapRepoError> for MapServiceError {
    fn from(value: MapRepoError) -> Self {
        match value {
            MapRepoError::NotFound(id) => Self::NotFound(id),
            MapRepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Use-case service for goal maps.
pub struct MapService<R: MapRepository> {
    repo: R,
}

impl<R: MapRepository> MapService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Persists a new map and returns it as stored.
    ///
    /// Steps come from the request's breakdown leaves; a request without a
    /// breakdown gets the default breakdown for its duration.
    pub fn create_map(&self, request: NewMapRequest) -> MapServiceResult<GoalMap> {
        let total_days = request.period.total_days()?;
        let steps = match &request.breakdown {
            Some(breakdown) => flatten_steps(breakdown),
            None => flatten_steps(&build_breakdown(total_days)),
        };

        let map = GoalMap::new(
            request.goal,
            request.description,
            request.period,
            total_days.get(),
            steps,
        )?;
        let id = self.repo.create_map(&map)?;
        info!(
            "event=map_create module=service status=ok map_id={} period_days={} steps={}",
            id,
            map.period_days,
            map.total_steps()
        );
        self.require_map(id)
    }

    /// Completes the current step and returns the new progress.
    ///
    /// # Errors
    /// - `NotFound` for unknown or deleted maps.
    /// - `AllStepsCompleted` once nothing is left to complete.
    pub fn complete_current_step(&self, id: MapId) -> MapServiceResult<MapProgress> {
        let map = self.require_map(id)?;
        let progress = map.progress();
        if progress.is_finished() {
            return Err(MapServiceError::AllStepsCompleted(id));
        }

        let day = progress.current_step + 1;
        let current_step = self.repo.mark_step_completed(id, day)?;
        info!(
            "event=step_complete module=service status=ok map_id={} day={} total_steps={}",
            id, day, progress.total_steps
        );

        let updated = GoalMap {
            current_step,
            ..map
        };
        Ok(updated.progress())
    }

    /// Replaces the task text of one step. Blank text clears it.
    pub fn update_step_task(&self, id: MapId, day: u32, task: &str) -> MapServiceResult<()> {
        self.repo.update_step_task(id, day, task.trim())?;
        info!(
            "event=step_task_update module=service status=ok map_id={} day={}",
            id, day
        );
        Ok(())
    }

    pub fn get_map(&self, id: MapId) -> MapServiceResult<Option<GoalMap>> {
        Ok(self.repo.get_map(id, false)?)
    }

    /// Active maps, newest first.
    pub fn list_maps(&self) -> MapServiceResult<Vec<GoalMap>> {
        Ok(self.repo.list_maps(false)?)
    }

    pub fn delete_map(&self, id: MapId) -> MapServiceResult<()> {
        self.repo.soft_delete_map(id)?;
        info!("event=map_delete module=service status=ok map_id={}", id);
        Ok(())
    }

    pub fn progress(&self, id: MapId) -> MapServiceResult<MapProgress> {
        Ok(self.require_map(id)?.progress())
    }

    fn require_map(&self, id: MapId) -> MapServiceResult<GoalMap> {
        self.repo
            .get_map(id, false)?
            .ok_or(MapServiceError::NotFound(id))
    }
}

//! Goal map repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist goal maps with their ordered steps.
//! - Keep SQL details inside the storage boundary.
//!
//! # Invariants
//! - Write paths call `GoalMap::validate()` before SQL mutations.
//! - Read paths reject persisted state that fails validation.
//! - Step completion only ever flips `0 -> 1`; `current_step` never decreases.
//! - Listing order is deterministic: newest first.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::goal_map::{GoalMap, MapId, MapValidationError};
use crate::model::step::StepRecord;
use crate::planner::duration::PeriodChoice;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const MAP_SELECT_SQL: &str = "SELECT
    uuid,
    goal,
    description,
    period_json,
    period_days,
    current_step,
    is_deleted,
    created_at,
    updated_at
FROM maps";

const MAP_COLUMNS: &[&str] = &[
    "uuid",
    "goal",
    "description",
    "period_json",
    "period_days",
    "current_step",
    "is_deleted",
    "created_at",
    "updated_at",
];

const STEP_COLUMNS: &[&str] = &["map_uuid", "day", "step_id", "title", "task", "completed"];

pub type MapRepoResult<T> = Result<T, MapRepoError>;

#[derive(Debug)]
pub enum MapRepoError {
    Validation(MapValidationError),
    Db(DbError),
    /// Map does not exist or is soft-deleted.
    NotFound(MapId),
    /// Map exists but has no step with this day.
    StepNotFound { map_id: MapId, day: u32 },
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    InvalidData(String),
}

impl Display for MapRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "goal map not found: {id}"),
            Self::StepNotFound { map_id, day } => {
                write!(f, "goal map {map_id} has no step for day {day}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "map repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "map repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "map repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted map data: {message}"),
        }
    }
}

impl Error for MapRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MapValidationError> for MapRepoError {
    fn from(value: MapValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for MapRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for MapRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for goal map persistence.
pub trait MapRepository {
    fn create_map(&self, map: &GoalMap) -> MapRepoResult<MapId>;
    fn get_map(&self, id: MapId, include_deleted: bool) -> MapRepoResult<Option<GoalMap>>;
    fn list_maps(&self, include_deleted: bool) -> MapRepoResult<Vec<GoalMap>>;
    /// Marks every step up to and including `day` completed and moves
    /// `current_step` to at least `day`. Returns the resulting `current_step`.
    fn mark_step_completed(&self, id: MapId, day: u32) -> MapRepoResult<u32>;
    fn update_step_task(&self, id: MapId, day: u32, task: &str) -> MapRepoResult<()>;
    fn soft_delete_map(&self, id: MapId) -> MapRepoResult<()>;
}

/// SQLite-backed goal map repository.
pub struct SqliteMapRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMapRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> MapRepoResult<Self> {
        ensure_map_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl MapRepository for SqliteMapRepository<'_> {
    fn create_map(&self, map: &GoalMap) -> MapRepoResult<MapId> {
        map.validate()?;
        let period_json = serde_json::to_string(&map.period)
            .map_err(|err| MapRepoError::InvalidData(format!("cannot encode period: {err}")))?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO maps (
                uuid,
                goal,
                description,
                period_json,
                period_days,
                current_step,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                map.uuid.to_string(),
                map.goal.as_str(),
                map.description.as_str(),
                period_json,
                map.period_days,
                map.current_step,
                bool_to_int(map.is_deleted),
            ],
        )?;

        {
            let mut insert_step = tx.prepare(
                "INSERT INTO map_steps (map_uuid, day, step_id, title, task, completed)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            )?;
            for step in &map.steps {
                insert_step.execute(params![
                    map.uuid.to_string(),
                    step.day,
                    step.id.as_str(),
                    step.title.as_str(),
                    step.task.as_str(),
                    bool_to_int(step.completed),
                ])?;
            }
        }

        tx.commit()?;
        Ok(map.uuid)
    }

    fn get_map(&self, id: MapId, include_deleted: bool) -> MapRepoResult<Option<GoalMap>> {
        let header = self
            .conn
            .query_row(
                &format!(
                    "{MAP_SELECT_SQL}
                     WHERE uuid = ?1
                       AND (?2 = 1 OR is_deleted = 0);"
                ),
                params![id.to_string(), bool_to_int(include_deleted)],
                MapHeader::from_row,
            )
            .optional()?;

        header.map(|header| load_map(self.conn, header)).transpose()
    }

    fn list_maps(&self, include_deleted: bool) -> MapRepoResult<Vec<GoalMap>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MAP_SELECT_SQL}
             WHERE (?1 = 1 OR is_deleted = 0)
             ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let headers = stmt
            .query_map([bool_to_int(include_deleted)], MapHeader::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        headers
            .into_iter()
            .map(|header| load_map(self.conn, header))
            .collect()
    }

    fn mark_step_completed(&self, id: MapId, day: u32) -> MapRepoResult<u32> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let current_step = active_current_step(&tx, id)?.ok_or(MapRepoError::NotFound(id))?;
        ensure_step_exists(&tx, id, day)?;

        tx.execute(
            "UPDATE map_steps
             SET completed = 1
             WHERE map_uuid = ?1
               AND day <= ?2
               AND completed = 0;",
            params![id.to_string(), day],
        )?;

        let next_step = current_step.max(day);
        tx.execute(
            "UPDATE maps
             SET current_step = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), next_step],
        )?;

        tx.commit()?;
        Ok(next_step)
    }

    fn update_step_task(&self, id: MapId, day: u32, task: &str) -> MapRepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if active_current_step(&tx, id)?.is_none() {
            return Err(MapRepoError::NotFound(id));
        }

        let changed = tx.execute(
            "UPDATE map_steps
             SET task = ?3
             WHERE map_uuid = ?1 AND day = ?2;",
            params![id.to_string(), day, task],
        )?;
        if changed == 0 {
            return Err(MapRepoError::StepNotFound { map_id: id, day });
        }

        tx.execute(
            "UPDATE maps
             SET updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn soft_delete_map(&self, id: MapId) -> MapRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE maps
             SET is_deleted = 1,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(MapRepoError::NotFound(id));
        }
        Ok(())
    }
}

/// Raw `maps` row before steps are attached.
struct MapHeader {
    uuid: String,
    goal: String,
    description: String,
    period_json: String,
    period_days: i64,
    current_step: i64,
    is_deleted: i64,
    created_at: i64,
    updated_at: i64,
}

impl MapHeader {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            uuid: row.get("uuid")?,
            goal: row.get("goal")?,
            description: row.get("description")?,
            period_json: row.get("period_json")?,
            period_days: row.get("period_days")?,
            current_step: row.get("current_step")?,
            is_deleted: row.get("is_deleted")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

fn load_map(conn: &Connection, header: MapHeader) -> MapRepoResult<GoalMap> {
    let uuid = Uuid::parse_str(&header.uuid).map_err(|_| {
        MapRepoError::InvalidData(format!("invalid uuid `{}` in maps.uuid", header.uuid))
    })?;
    let period: PeriodChoice = serde_json::from_str(&header.period_json)
        .map_err(|err| MapRepoError::InvalidData(format!("invalid maps.period_json: {err}")))?;

    let map = GoalMap {
        uuid,
        goal: header.goal,
        description: header.description,
        period,
        period_days: to_u32(header.period_days, "maps.period_days")?,
        current_step: to_u32(header.current_step, "maps.current_step")?,
        steps: load_steps(conn, &header.uuid)?,
        created_at: Some(header.created_at),
        updated_at: Some(header.updated_at),
        is_deleted: int_to_bool(header.is_deleted, "maps.is_deleted")?,
    };
    map.validate()?;
    Ok(map)
}

fn load_steps(conn: &Connection, map_uuid: &str) -> MapRepoResult<Vec<StepRecord>> {
    let mut stmt = conn.prepare(
        "SELECT step_id, day, title, task, completed
         FROM map_steps
         WHERE map_uuid = ?1
         ORDER BY day ASC;",
    )?;
    let mut rows = stmt.query([map_uuid])?;
    let mut steps = Vec::new();
    while let Some(row) = rows.next()? {
        steps.push(StepRecord {
            id: row.get("step_id")?,
            day: to_u32(row.get("day")?, "map_steps.day")?,
            title: row.get("title")?,
            task: row.get("task")?,
            completed: int_to_bool(row.get("completed")?, "map_steps.completed")?,
        });
    }
    Ok(steps)
}

fn active_current_step(conn: &Connection, id: MapId) -> MapRepoResult<Option<u32>> {
    conn.query_row(
        "SELECT current_step FROM maps WHERE uuid = ?1 AND is_deleted = 0;",
        [id.to_string()],
        |row| row.get::<_, i64>(0),
    )
    .optional()?
    .map(|value| to_u32(value, "maps.current_step"))
    .transpose()
}

fn ensure_step_exists(conn: &Connection, id: MapId, day: u32) -> MapRepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM map_steps WHERE map_uuid = ?1 AND day = ?2
        );",
        params![id.to_string(), day],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(MapRepoError::StepNotFound { map_id: id, day })
    }
}

fn ensure_map_connection_ready(conn: &Connection) -> MapRepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(MapRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for (table, columns) in [("maps", MAP_COLUMNS), ("map_steps", STEP_COLUMNS)] {
        if !table_exists(conn, table)? {
            return Err(MapRepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(MapRepoError::MissingRequiredColumn { table, column });
            }
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> MapRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> MapRepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

fn to_u32(value: i64, column: &str) -> MapRepoResult<u32> {
    u32::try_from(value)
        .map_err(|_| MapRepoError::InvalidData(format!("value `{value}` out of range in {column}")))
}

fn int_to_bool(value: i64, column: &str) -> MapRepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(MapRepoError::InvalidData(format!(
            "invalid flag `{other}` in {column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

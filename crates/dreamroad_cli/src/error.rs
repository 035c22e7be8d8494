//! CLI error type; every variant renders as one stderr line.

use dreamroad_core::{DbError, LoggingError, MapRepoError, MapServiceError, SessionError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

#[derive(Debug)]
pub enum CliError {
    Logging(LoggingError),
    Db(DbError),
    Repo(MapRepoError),
    Service(MapServiceError),
    Session(SessionError),
    ReadFile { path: PathBuf, source: std::io::Error },
    Json(serde_json::Error),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "cannot open map database: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Service(err) => write!(f, "{err}"),
            Self::Session(err) => write!(f, "{err}"),
            Self::ReadFile { path, source } => {
                write!(f, "cannot read `{}`: {source}", path.display())
            }
            Self::Json(err) => write!(f, "invalid JSON: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Service(err) => Some(err),
            Self::Session(err) => Some(err),
            Self::ReadFile { source, .. } => Some(source),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<LoggingError> for CliError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<MapRepoError> for CliError {
    fn from(value: MapRepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<MapServiceError> for CliError {
    fn from(value: MapServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<SessionError> for CliError {
    fn from(value: SessionError) -> Self {
        Self::Session(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

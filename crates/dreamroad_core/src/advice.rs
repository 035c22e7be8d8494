//! Advice service contract.
//!
//! # Responsibility
//! - Define the request/response schema of the remote period advice endpoint.
//! - Define the provider seam the planning session calls through.
//!
//! # Invariants
//! - The core never retries, times out or caches advice calls; providers own
//!   transport policy.
//! - Response periods are decoded best effort (see `planner::rehydrate`).

use crate::planner::flatten::FlatPeriod;
use crate::planner::rehydrate::{parse_overrides, PeriodOverride};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Endpoint path, relative to the API base URL.
pub const BREAK_GOAL_PERIODS_PATH: &str = "/ai/manager/break-goal-periods";

/// Body sent to the advice endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdviceRequest {
    pub title: String,
    pub description: String,
    pub total_days: u32,
    pub period_structure: Vec<FlatPeriod>,
}

/// Response of the advice endpoint. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdviceResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub is_serious: Option<bool>,
    #[serde(default)]
    pub feedback: Option<String>,
    /// Raw override records; decoded lazily so one bad entry cannot fail the
    /// whole response.
    #[serde(default)]
    pub periods: Value,
    #[serde(default)]
    pub advice: Option<String>,
}

impl AdviceResponse {
    pub fn overrides(&self) -> Vec<PeriodOverride> {
        parse_overrides(&self.periods)
    }

    /// Feedback text when the service doubts the goal is serious.
    pub fn unserious_feedback(&self) -> Option<&str> {
        if self.is_serious == Some(true) {
            return None;
        }
        self.feedback
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

/// Source of per-period suggestions.
pub trait AdviceProvider {
    /// Sends one request. Implementations decide transport and timeouts.
    fn break_goal_into_periods(&self, request: &AdviceRequest)
        -> Result<AdviceResponse, AdviceError>;
}

/// Advice provider failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdviceError {
    /// Connection, TLS or timeout failure.
    Transport(String),
    /// Non-success HTTP status.
    Status(u16),
    /// Body is not a valid advice response.
    Decode(String),
}

impl Display for AdviceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "advice request failed: {message}"),
            Self::Status(status) => write!(f, "advice service returned HTTP {status}"),
            Self::Decode(message) => write!(f, "invalid advice response: {message}"),
        }
    }
}

impl Error for AdviceError {}

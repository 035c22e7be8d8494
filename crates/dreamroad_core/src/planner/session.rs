//! One goal-creation flow from duration choice to a finalized map request.
//!
//! # Responsibility
//! - Own the breakdown while the user reviews and edits it.
//! - Call an advice provider on demand and merge its suggestions.
//!
//! # Invariants
//! - A session always holds a breakdown built for its validated duration.
//! - Advice is requested at most once per `request_advice` call.

use crate::advice::{AdviceError, AdviceProvider, AdviceRequest, AdviceResponse};
use crate::model::goal_map::NewMapRequest;
use crate::model::period::{Breakdown, NodeEditError};
use crate::planner::builder::build_breakdown;
use crate::planner::duration::{InvalidDurationError, PeriodChoice, TotalDays};
use crate::planner::flatten::flatten_periods;
use crate::planner::rehydrate::{apply_overrides, PeriodOverride, RehydrateSummary};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// How to treat advice for goals the service flags as not serious.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdvicePolicy {
    /// Apply suggestions regardless of the seriousness flag.
    AcceptAll,
    /// Skip suggestions and surface the feedback instead.
    #[default]
    RejectUnserious,
}

/// Result of merging one advice response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdviceOutcome {
    Applied {
        summary: RehydrateSummary,
        advice: Option<String>,
    },
    /// Service doubts the goal; nothing was applied.
    NotSerious { feedback: String },
    /// Response carried no usable period suggestions.
    NoPeriods,
    /// Service reported `success: false`.
    Unsuccessful,
}

#[derive(Debug)]
pub enum SessionError {
    BlankGoal,
    InvalidDuration(InvalidDurationError),
    NodeEdit(NodeEditError),
    Advice(AdviceError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankGoal => write!(f, "goal title must not be blank"),
            Self::InvalidDuration(err) => write!(f, "{err}"),
            Self::NodeEdit(err) => write!(f, "{err}"),
            Self::Advice(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::BlankGoal => None,
            Self::InvalidDuration(err) => Some(err),
            Self::NodeEdit(err) => Some(err),
            Self::Advice(err) => Some(err),
        }
    }
}

impl From<InvalidDurationError> for SessionError {
    fn from(value: InvalidDurationError) -> Self {
        Self::InvalidDuration(value)
    }
}

impl From<NodeEditError> for SessionError {
    fn from(value: NodeEditError) -> Self {
        Self::NodeEdit(value)
    }
}

impl From<AdviceError> for SessionError {
    fn from(value: AdviceError) -> Self {
        Self::Advice(value)
    }
}

/// Goal-creation session state.
#[derive(Debug, Clone)]
pub struct PlanningSession {
    goal: String,
    description: String,
    period: PeriodChoice,
    total_days: TotalDays,
    breakdown: Breakdown,
}

impl PlanningSession {
    /// Validates the goal and duration, then builds the default breakdown.
    pub fn new(
        goal: impl Into<String>,
        description: impl Into<String>,
        period: PeriodChoice,
    ) -> Result<Self, SessionError> {
        let goal = goal.into().trim().to_string();
        if goal.is_empty() {
            return Err(SessionError::BlankGoal);
        }
        let total_days = period.total_days()?;
        Ok(Self {
            goal,
            description: description.into().trim().to_string(),
            period,
            total_days,
            breakdown: build_breakdown(total_days),
        })
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn period(&self) -> PeriodChoice {
        self.period
    }

    pub fn total_days(&self) -> TotalDays {
        self.total_days
    }

    pub fn breakdown(&self) -> &Breakdown {
        &self.breakdown
    }

    /// Manual edit of one node's title and task.
    pub fn edit_node(&mut self, id: &str, title: &str, task: &str) -> Result<(), SessionError> {
        self.breakdown.edit_node(id, title, task)?;
        Ok(())
    }

    /// Applies overrides obtained outside the advice flow, e.g. from a file.
    pub fn apply_overrides(&mut self, overrides: &[PeriodOverride]) -> RehydrateSummary {
        apply_overrides(&mut self.breakdown, overrides)
    }

    /// Request body describing the current breakdown.
    pub fn advice_request(&self) -> AdviceRequest {
        AdviceRequest {
            title: self.goal.clone(),
            description: self.description.clone(),
            total_days: self.total_days.get(),
            period_structure: flatten_periods(&self.breakdown),
        }
    }

    /// Merges a response obtained elsewhere.
    pub fn apply_advice(&mut self, response: &AdviceResponse, policy: AdvicePolicy) -> AdviceOutcome {
        if !response.success {
            return AdviceOutcome::Unsuccessful;
        }
        if let Some(feedback) = response.unserious_feedback() {
            if policy == AdvicePolicy::RejectUnserious {
                return AdviceOutcome::NotSerious {
                    feedback: feedback.to_string(),
                };
            }
        }

        let overrides = response.overrides();
        if overrides.is_empty() {
            return AdviceOutcome::NoPeriods;
        }

        let summary = apply_overrides(&mut self.breakdown, &overrides);
        AdviceOutcome::Applied {
            summary,
            advice: response
                .advice
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string),
        }
    }

    /// Calls `provider` once and merges the response.
    ///
    /// # Errors
    /// Returns `SessionError::Advice` when the provider fails; the breakdown
    /// is left unchanged in that case.
    pub fn request_advice(
        &mut self,
        provider: &dyn AdviceProvider,
        policy: AdvicePolicy,
    ) -> Result<AdviceOutcome, SessionError> {
        let request = self.advice_request();
        let response = match provider.break_goal_into_periods(&request) {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    "event=advice_request module=planner status=error total_days={} error={}",
                    self.total_days, err
                );
                return Err(err.into());
            }
        };

        let outcome = self.apply_advice(&response, policy);
        info!(
            "event=advice_request module=planner status=ok total_days={} periods_sent={} outcome={}",
            self.total_days,
            request.period_structure.len(),
            outcome_label(&outcome)
        );
        Ok(outcome)
    }

    /// Ends the session and hands the breakdown to map creation.
    pub fn finalize(self) -> NewMapRequest {
        NewMapRequest {
            goal: self.goal,
            description: self.description,
            period: self.period,
            breakdown: Some(self.breakdown),
        }
    }
}

fn outcome_label(outcome: &AdviceOutcome) -> &'static str {
    match outcome {
        AdviceOutcome::Applied { .. } => "applied",
        AdviceOutcome::NotSerious { .. } => "not_serious",
        AdviceOutcome::NoPeriods => "no_periods",
        AdviceOutcome::Unsuccessful => "unsuccessful",
    }
}

#[cfg(test)]
mod tests {
    use super::{AdviceOutcome, AdvicePolicy, PlanningSession, SessionError};
    use crate::advice::{AdviceError, AdviceProvider, AdviceRequest, AdviceResponse};
    use crate::planner::duration::{PeriodChoice, PeriodPreset};
    use serde_json::json;
    use std::cell::Cell;

    struct StaticProvider {
        response: Result<AdviceResponse, AdviceError>,
        calls: Cell<usize>,
    }

    impl StaticProvider {
        fn new(response: Result<AdviceResponse, AdviceError>) -> Self {
            Self {
                response,
                calls: Cell::new(0),
            }
        }
    }

    impl AdviceProvider for StaticProvider {
        fn break_goal_into_periods(
            &self,
            request: &AdviceRequest,
        ) -> Result<AdviceResponse, AdviceError> {
            self.calls.set(self.calls.get() + 1);
            assert_eq!(request.total_days, 7);
            assert_eq!(request.period_structure.len(), 8);
            self.response.clone()
        }
    }

    fn week_session() -> PlanningSession {
        PlanningSession::new(
            "Бегать",
            "каждый день",
            PeriodChoice::Preset {
                preset: PeriodPreset::Week,
            },
        )
        .unwrap()
    }

    fn response(value: serde_json::Value) -> AdviceResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn new_rejects_blank_goal() {
        let err = PlanningSession::new(
            "  ",
            "",
            PeriodChoice::Preset {
                preset: PeriodPreset::Week,
            },
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::BlankGoal));
    }

    #[test]
    fn request_advice_applies_periods_once() {
        let mut session = week_session();
        let provider = StaticProvider::new(Ok(response(json!({
            "success": true,
            "is_serious": true,
            "periods": [{"id": "day--0-0", "task": "Пробежать 5 км"}],
            "advice": "Начните медленно"
        }))));

        let outcome = session
            .request_advice(&provider, AdvicePolicy::RejectUnserious)
            .unwrap();
        assert_eq!(provider.calls.get(), 1);
        assert!(matches!(
            outcome,
            AdviceOutcome::Applied { summary, advice: Some(ref text) }
                if summary.tasks == 1 && text == "Начните медленно"
        ));
        assert_eq!(
            session.breakdown().find("day--0-0").unwrap().task,
            "Пробежать 5 км"
        );
    }

    #[test]
    fn unserious_goal_is_not_applied_under_default_policy() {
        let mut session = week_session();
        let advice = response(json!({
            "success": true,
            "is_serious": false,
            "feedback": "Цель слишком размыта",
            "periods": [{"id": "day--0-0", "task": "x"}]
        }));

        let outcome = session.apply_advice(&advice, AdvicePolicy::default());
        assert_eq!(
            outcome,
            AdviceOutcome::NotSerious {
                feedback: "Цель слишком размыта".to_string()
            }
        );
        assert_eq!(session.breakdown().find("day--0-0").unwrap().task, "");

        let outcome = session.apply_advice(&advice, AdvicePolicy::AcceptAll);
        assert!(matches!(outcome, AdviceOutcome::Applied { .. }));
    }

    #[test]
    fn provider_failure_leaves_breakdown_untouched() {
        let mut session = week_session();
        let before = session.breakdown().clone();
        let provider = StaticProvider::new(Err(AdviceError::Status(503)));

        let err = session
            .request_advice(&provider, AdvicePolicy::AcceptAll)
            .unwrap_err();
        assert!(matches!(err, SessionError::Advice(AdviceError::Status(503))));
        assert_eq!(session.breakdown(), &before);
    }

    #[test]
    fn finalize_carries_breakdown() {
        let mut session = week_session();
        session.edit_node("week--0", "Разгон", "Втянуться").unwrap();
        let request = session.finalize();
        assert_eq!(request.goal, "Бегать");
        assert_eq!(request.description, "каждый день");
        let breakdown = request.breakdown.unwrap();
        assert_eq!(breakdown.nodes[0].title, "Разгон");
        assert_eq!(breakdown.leaf_count(), 7);
    }
}

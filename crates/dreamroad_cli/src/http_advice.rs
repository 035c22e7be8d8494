//! Blocking HTTP client for the period advice endpoint.

use dreamroad_core::advice::BREAK_GOAL_PERIODS_PATH;
use dreamroad_core::{AdviceError, AdviceProvider, AdviceRequest, AdviceResponse};
use std::time::Duration;

pub struct HttpAdviceProvider {
    agent: ureq::Agent,
    endpoint: String,
}

impl HttpAdviceProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            endpoint: endpoint_url(base_url),
        }
    }
}

impl AdviceProvider for HttpAdviceProvider {
    fn break_goal_into_periods(
        &self,
        request: &AdviceRequest,
    ) -> Result<AdviceResponse, AdviceError> {
        let response = self
            .agent
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .send_json(request)
            .map_err(classify_http_error)?;

        response
            .into_body()
            .read_json::<AdviceResponse>()
            .map_err(|err| AdviceError::Decode(err.to_string()))
    }
}

fn endpoint_url(base_url: &str) -> String {
    format!(
        "{}{}",
        base_url.trim().trim_end_matches('/'),
        BREAK_GOAL_PERIODS_PATH
    )
}

fn classify_http_error(err: ureq::Error) -> AdviceError {
    match err {
        ureq::Error::StatusCode(status) => AdviceError::Status(status),
        other => AdviceError::Transport(other.to_string()),
    }
}

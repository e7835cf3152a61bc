//! Client-side view of a remote job and its pure transition function

use serde::{Deserialize, Deserializer, Serialize};

/// Message used when the service reports `error` without saying why
pub const DEFAULT_FAILURE_MESSAGE: &str = "Download failed on server";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Complete,
    Error,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Error)
    }
}

/// Body of a progress poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollResponse {
    pub status: JobStatus,
    #[serde(default, deserialize_with = "percent")]
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Accept integer or fractional percentages, clamped to 0-100
fn percent<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = f64::deserialize(deserializer)?;
    Ok(if value.is_nan() {
        0
    } else {
        value.round().clamp(0.0, 100.0) as u8
    })
}

impl PollResponse {
    pub fn running(progress: u8) -> Self {
        Self {
            status: JobStatus::Running,
            progress,
            error: None,
        }
    }

    pub fn complete() -> Self {
        Self {
            status: JobStatus::Complete,
            progress: 100,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Error,
            progress: 0,
            error: Some(message.into()),
        }
    }
}

/// What a single poll produced
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Response(PollResponse),
    /// The request failed before the service could answer
    TransportFailure(String),
}

/// What the driver should do next
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Wait for the next tick and poll again
    Poll,
    /// Fetch the finished artifact once, then stop
    Retrieve,
    /// Stop polling
    Stop,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: JobState,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobState {
    pub job_id: String,
    pub status: JobStatus,
    /// 0-100, as last reported by the service
    pub progress: u8,
    pub error: Option<String>,
}

impl JobState {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Pending,
            progress: 0,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Fold one poll outcome into the state
    ///
    /// Reported status and progress are adopted verbatim. Transport failures
    /// leave the state untouched. Terminal states absorb every outcome.
    pub fn apply(&self, outcome: &PollOutcome) -> Transition {
        if self.is_terminal() {
            return Transition {
                state: self.clone(),
                action: Action::Stop,
            };
        }

        let response = match outcome {
            PollOutcome::TransportFailure(_) => {
                return Transition {
                    state: self.clone(),
                    action: Action::Poll,
                }
            }
            PollOutcome::Response(response) => response,
        };

        let mut state = JobState {
            job_id: self.job_id.clone(),
            status: response.status,
            progress: response.progress.min(100),
            error: None,
        };
        let action = match response.status {
            JobStatus::Pending | JobStatus::Running => Action::Poll,
            JobStatus::Complete => Action::Retrieve,
            JobStatus::Error => {
                state.error = Some(
                    response
                        .error
                        .clone()
                        .filter(|m| !m.trim().is_empty())
                        .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
                );
                Action::Stop
            }
        };
        Transition { state, action }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(outcomes: Vec<PollOutcome>) -> (JobState, Vec<Action>) {
        let mut state = JobState::new("job-1");
        let mut actions = Vec::new();
        for outcome in outcomes {
            let t = state.apply(&outcome);
            state = t.state;
            actions.push(t.action);
        }
        (state, actions)
    }

    #[test]
    fn test_running_then_complete_retrieves_once() {
        let (state, actions) = run(vec![
            PollOutcome::Response(PollResponse::running(10)),
            PollOutcome::Response(PollResponse::running(60)),
            PollOutcome::Response(PollResponse::complete()),
        ]);
        assert_eq!(state.status, JobStatus::Complete);
        assert_eq!(state.progress, 100);
        assert_eq!(actions, vec![Action::Poll, Action::Poll, Action::Retrieve]);
    }

    #[test]
    fn test_error_stops_with_message() {
        let (state, actions) = run(vec![
            PollOutcome::Response(PollResponse::running(10)),
            PollOutcome::Response(PollResponse::failed("quota exceeded")),
        ]);
        assert_eq!(state.status, JobStatus::Error);
        assert_eq!(state.error.as_deref(), Some("quota exceeded"));
        assert_eq!(actions.last(), Some(&Action::Stop));
    }

    #[test]
    fn test_error_without_message_uses_default() {
        let response = PollResponse {
            status: JobStatus::Error,
            progress: 40,
            error: None,
        };
        let t = JobState::new("j").apply(&PollOutcome::Response(response));
        assert_eq!(t.state.error.as_deref(), Some(DEFAULT_FAILURE_MESSAGE));
    }

    #[test]
    fn test_transport_failure_keeps_state() {
        let state = JobState::new("j")
            .apply(&PollOutcome::Response(PollResponse::running(30)))
            .state;
        let t = state.apply(&PollOutcome::TransportFailure("connection reset".into()));
        assert_eq!(t.state, state);
        assert_eq!(t.action, Action::Poll);
    }

    #[test]
    fn test_progress_is_adopted_verbatim() {
        let (state, _) = run(vec![
            PollOutcome::Response(PollResponse::running(60)),
            PollOutcome::Response(PollResponse::running(20)),
        ]);
        assert_eq!(state.progress, 20);
    }

    #[test]
    fn test_terminal_state_absorbs_everything() {
        let done = JobState::new("j")
            .apply(&PollOutcome::Response(PollResponse::complete()))
            .state;
        let t = done.apply(&PollOutcome::Response(PollResponse::running(5)));
        assert_eq!(t.state, done);
        assert_eq!(t.action, Action::Stop);
    }

    #[test]
    fn test_poll_response_wire_format() {
        let json = r#"{"progress":42,"status":"running"}"#;
        let response: PollResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response, PollResponse::running(42));

        let json = r#"{"progress":0,"status":"error","error":"quota exceeded"}"#;
        let response: PollResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response, PollResponse::failed("quota exceeded"));

        let json = r#"{"progress":57.6,"status":"running"}"#;
        let response: PollResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.progress, 58);
    }
}

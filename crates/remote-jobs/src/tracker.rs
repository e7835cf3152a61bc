//! Async driver that polls a remote job until it finishes

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::JobError;
use crate::job::{Action, JobState, PollOutcome, PollResponse};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Anything that can report job progress and hand over the finished artifact
#[async_trait]
pub trait JobStatusSource: Send + Sync {
    async fn poll(&self, job_id: &str) -> Result<PollResponse, JobError>;

    async fn retrieve(&self, job_id: &str) -> Result<Vec<u8>, JobError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackOptions {
    pub poll_interval: Duration,
    /// Stop polling after this long. `None` polls until the job ends.
    pub timeout: Option<Duration>,
    /// Surface a transport error after this many failed polls in a row.
    /// `None` retries forever.
    pub max_transport_failures: Option<u32>,
}

impl Default for TrackOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
            max_transport_failures: None,
        }
    }
}

/// Finished job and its artifact
#[derive(Debug, Clone)]
pub struct CompletedJob {
    pub state: JobState,
    pub artifact: Vec<u8>,
}

/// Poll `job_id` every `poll_interval` until it completes or fails
///
/// `on_update` sees the state after every poll. On completion the artifact
/// is retrieved exactly once. A reported failure ends tracking with
/// [`JobError::RemoteStatus`]; timeouts end it with [`JobError::Timeout`]
/// without implying the remote job failed.
pub async fn track_job<S, F>(
    source: &S,
    job_id: &str,
    options: &TrackOptions,
    mut on_update: F,
) -> Result<CompletedJob, JobError>
where
    S: JobStatusSource + ?Sized,
    F: FnMut(&JobState) + Send,
{
    let started = Instant::now();
    let polling = poll_until_terminal(source, job_id, options, &mut on_update);

    let state = match options.timeout {
        Some(limit) => tokio::time::timeout(limit, polling).await.map_err(|_| {
            warn!(job_id, "stopped polling after timeout");
            JobError::Timeout {
                elapsed_ms: started.elapsed().as_millis() as u64,
            }
        })??,
        None => polling.await?,
    };

    let artifact = source.retrieve(job_id).await?;
    info!(job_id, bytes = artifact.len(), "retrieved job artifact");
    Ok(CompletedJob { state, artifact })
}

/// Returns the completed state, or the reported failure as an error
async fn poll_until_terminal<S, F>(
    source: &S,
    job_id: &str,
    options: &TrackOptions,
    on_update: &mut F,
) -> Result<JobState, JobError>
where
    S: JobStatusSource + ?Sized,
    F: FnMut(&JobState) + Send,
{
    let period = options.poll_interval.max(Duration::from_millis(1));
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut state = JobState::new(job_id);
    let mut failures = 0u32;

    loop {
        ticker.tick().await;

        let outcome = match source.poll(job_id).await {
            Ok(response) => {
                failures = 0;
                PollOutcome::Response(response)
            }
            Err(err) => {
                failures += 1;
                warn!(job_id, failures, %err, "poll failed, retrying next interval");
                if options.max_transport_failures.is_some_and(|cap| failures >= cap) {
                    return Err(err);
                }
                PollOutcome::TransportFailure(err.to_string())
            }
        };

        let transition = state.apply(&outcome);
        state = transition.state;
        on_update(&state);
        debug!(job_id, status = ?state.status, progress = state.progress, "polled");

        match transition.action {
            Action::Poll => continue,
            Action::Retrieve => return Ok(state),
            Action::Stop => {
                let message = state.error.clone().unwrap_or_default();
                return Err(JobError::RemoteStatus(message));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobStatus;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays canned poll results; the last one repeats forever
    struct Scripted {
        polls: Mutex<VecDeque<Result<PollResponse, JobError>>>,
        poll_count: AtomicUsize,
        retrieve_count: AtomicUsize,
    }

    impl Scripted {
        fn new(script: Vec<Result<PollResponse, JobError>>) -> Self {
            Self {
                polls: Mutex::new(script.into()),
                poll_count: AtomicUsize::new(0),
                retrieve_count: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl JobStatusSource for Scripted {
        async fn poll(&self, _job_id: &str) -> Result<PollResponse, JobError> {
            self.poll_count.fetch_add(1, Ordering::SeqCst);
            let mut polls = self.polls.lock().unwrap();
            if polls.len() > 1 {
                polls.pop_front().unwrap()
            } else {
                polls.front().cloned().unwrap()
            }
        }

        async fn retrieve(&self, job_id: &str) -> Result<Vec<u8>, JobError> {
            self.retrieve_count.fetch_add(1, Ordering::SeqCst);
            Ok(format!("video:{}", job_id).into_bytes())
        }
    }

    fn fast() -> TrackOptions {
        TrackOptions {
            poll_interval: Duration::from_millis(1),
            ..TrackOptions::default()
        }
    }

    #[tokio::test]
    async fn test_complete_triggers_exactly_one_retrieval() {
        let source = Scripted::new(vec![
            Ok(PollResponse::running(10)),
            Ok(PollResponse::running(60)),
            Ok(PollResponse::complete()),
        ]);
        let mut seen = Vec::new();

        let done = track_job(&source, "abc", &fast(), |s| seen.push(s.progress))
            .await
            .unwrap();

        assert_eq!(done.state.status, JobStatus::Complete);
        assert_eq!(done.artifact, b"video:abc".to_vec());
        assert_eq!(seen, vec![10, 60, 100]);
        assert_eq!(source.poll_count.load(Ordering::SeqCst), 3);
        assert_eq!(source.retrieve_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_remote_error_stops_polling() {
        let source = Scripted::new(vec![
            Ok(PollResponse::running(10)),
            Ok(PollResponse::failed("quota exceeded")),
        ]);

        let err = track_job(&source, "abc", &fast(), |_| {}).await.unwrap_err();

        assert_eq!(err, JobError::RemoteStatus("quota exceeded".into()));
        assert_eq!(source.poll_count.load(Ordering::SeqCst), 2);
        assert_eq!(source.retrieve_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transport_failures_are_retried() {
        let source = Scripted::new(vec![
            Ok(PollResponse::running(10)),
            Err(JobError::Transport("connection reset".into())),
            Err(JobError::Transport("connection reset".into())),
            Ok(PollResponse::complete()),
        ]);
        let mut seen = Vec::new();

        let done = track_job(&source, "abc", &fast(), |s| seen.push(s.progress))
            .await
            .unwrap();

        assert_eq!(done.state.status, JobStatus::Complete);
        assert_eq!(seen, vec![10, 10, 10, 100]);
        assert_eq!(source.retrieve_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transport_cap_surfaces_error() {
        let source = Scripted::new(vec![Err(JobError::Transport("offline".into()))]);
        let options = TrackOptions {
            max_transport_failures: Some(3),
            ..fast()
        };

        let err = track_job(&source, "abc", &options, |_| {}).await.unwrap_err();

        assert_eq!(err, JobError::Transport("offline".into()));
        assert_eq!(source.poll_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_timeout_stops_without_retrieval() {
        let source = Scripted::new(vec![Ok(PollResponse::running(5))]);
        let options = TrackOptions {
            timeout: Some(Duration::from_millis(30)),
            ..fast()
        };

        let err = track_job(&source, "abc", &options, |_| {}).await.unwrap_err();

        assert!(matches!(err, JobError::Timeout { .. }));
        assert_eq!(source.retrieve_count.load(Ordering::SeqCst), 0);
    }
}

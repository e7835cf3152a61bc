use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum JobError {
    /// The remote job reported that it failed
    #[error("Remote job failed: {0}")]
    RemoteStatus(String),

    /// The request never produced a usable response
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Gave up waiting after {elapsed_ms} ms")]
    Timeout { elapsed_ms: u64 },

    #[error("{0}")]
    InvalidUrl(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for JobError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            JobError::Decode(err.to_string())
        } else {
            JobError::Transport(err.to_string())
        }
    }
}

//! Remote transform jobs
//!
//! A job is created on a remote service and then polled until it reports
//! `complete` (the artifact is fetched once) or `error`. [`JobState::apply`]
//! is the pure transition; [`track_job`] drives it on a timer against any
//! [`JobStatusSource`], such as [`VideoServiceClient`].

pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod job;
pub mod tracker;

pub use client::{VideoInfo, VideoQuality, VideoServiceClient};
pub use config::ServiceConfig;
pub use error::JobError;
pub use format::{format_duration, format_size, validate_video_url, Platform};
pub use job::{Action, JobState, JobStatus, PollOutcome, PollResponse, Transition};
pub use tracker::{track_job, CompletedJob, JobStatusSource, TrackOptions};

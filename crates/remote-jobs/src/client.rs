//! HTTP client for the video info/download service

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::error::JobError;
use crate::format::validate_video_url;
use crate::job::PollResponse;
use crate::tracker::JobStatusSource;

const DEFAULT_FORMAT_ID: &str = "best";
const DEFAULT_TITLE: &str = "Video";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoQuality {
    pub label: String,
    pub height: Option<u32>,
    pub url: Option<String>,
    pub format_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoInfo {
    pub title: String,
    /// Seconds
    pub duration: Option<f64>,
    pub thumbnail: Option<String>,
    /// Bytes
    pub size: Option<u64>,
    pub qualities: Vec<VideoQuality>,
}

#[derive(Debug, Deserialize)]
struct RawQuality {
    label: Option<String>,
    height: Option<u32>,
    url: Option<String>,
    format_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawVideoInfo {
    title: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
    size: Option<u64>,
    #[serde(default)]
    qualities: Vec<RawQuality>,
}

impl From<RawQuality> for VideoQuality {
    fn from(raw: RawQuality) -> Self {
        let label = raw.label.filter(|l| !l.is_empty()).unwrap_or_else(|| match raw.height {
            Some(h) => format!("{}p", h),
            None => "?p".to_string(),
        });
        Self {
            label,
            height: raw.height,
            url: raw.url,
            format_id: raw
                .format_id
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| DEFAULT_FORMAT_ID.to_string()),
        }
    }
}

impl From<RawVideoInfo> for VideoInfo {
    fn from(raw: RawVideoInfo) -> Self {
        Self {
            title: raw
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            duration: raw.duration,
            thumbnail: raw.thumbnail,
            size: raw.size,
            qualities: raw.qualities.into_iter().map(VideoQuality::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StartResponse {
    #[serde(rename = "progressId")]
    progress_id: String,
}

/// Client for `/video-info`, `/video-download-start`, `/video-progress` and
/// `/video-download-retrieve`
#[derive(Debug, Clone)]
pub struct VideoServiceClient {
    http: Client,
    base_url: String,
}

impl VideoServiceClient {
    pub fn new(config: &ServiceConfig) -> Result<Self, JobError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| JobError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Response, JobError> {
        let url = self.endpoint(path);
        debug!(%url, "GET");
        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let reason = if body.trim().is_empty() {
            status.to_string()
        } else {
            body.trim().to_string()
        };
        Err(JobError::Transport(format!("{} returned {}: {}", path, status.as_u16(), reason)))
    }

    /// Metadata and available qualities for a video URL
    pub async fn video_info(&self, video_url: &str) -> Result<VideoInfo, JobError> {
        let (url, platform) = validate_video_url(video_url)?;
        debug!(?platform, "fetching video info");
        let raw: RawVideoInfo = self
            .get("video-info", &[("url", url.to_string())])
            .await?
            .json()
            .await?;
        Ok(raw.into())
    }

    /// Ask the service to prepare a download; returns the job id to poll
    pub async fn start_download(
        &self,
        video_url: &str,
        height: Option<u32>,
    ) -> Result<String, JobError> {
        let (url, _) = validate_video_url(video_url)?;
        let mut query = vec![("url", url.to_string())];
        if let Some(h) = height {
            query.push(("height", h.to_string()));
        }
        let start: StartResponse = self.get("video-download-start", &query).await?.json().await?;
        info!(job_id = %start.progress_id, "download started");
        Ok(start.progress_id)
    }

    pub async fn progress(&self, job_id: &str) -> Result<PollResponse, JobError> {
        Ok(self
            .get("video-progress", &[("id", job_id.to_string())])
            .await?
            .json()
            .await?)
    }

    pub async fn retrieve_video(&self, job_id: &str) -> Result<Vec<u8>, JobError> {
        let bytes = self
            .get("video-download-retrieve", &[("id", job_id.to_string())])
            .await?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl JobStatusSource for VideoServiceClient {
    async fn poll(&self, job_id: &str) -> Result<PollResponse, JobError> {
        self.progress(job_id).await
    }

    async fn retrieve(&self, job_id: &str) -> Result<Vec<u8>, JobError> {
        self.retrieve_video(job_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_quality_defaults() {
        let raw: RawQuality = serde_json::from_str(r#"{"height":720}"#).unwrap();
        let quality = VideoQuality::from(raw);
        assert_eq!(quality.label, "720p");
        assert_eq!(quality.format_id, "best");
    }

    #[test]
    fn test_info_defaults() {
        let raw: RawVideoInfo = serde_json::from_str(r#"{"title":""}"#).unwrap();
        let info = VideoInfo::from(raw);
        assert_eq!(info.title, "Video");
        assert!(info.qualities.is_empty());
    }

    #[test]
    fn test_endpoint_joins_cleanly() {
        let config = ServiceConfig {
            base_url: "http://localhost:3001/".into(),
            ..ServiceConfig::default()
        };
        let client = VideoServiceClient::new(&config).unwrap();
        assert_eq!(client.endpoint("/video-info"), "http://localhost:3001/video-info");
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected_before_any_request() {
        let config = ServiceConfig {
            base_url: "http://127.0.0.1:9".into(),
            ..ServiceConfig::default()
        };
        let client = VideoServiceClient::new(&config).unwrap();
        let err = client.video_info("https://example.com/v").await.unwrap_err();
        assert!(matches!(err, JobError::InvalidUrl(_)));
    }
}

//! Video subcommands backed by the remote download service

use std::path::Path;

use anyhow::{Context, Result};
use remote_jobs::{format_duration, format_size, track_job, ServiceConfig, VideoServiceClient};
use shared_types::OutputFile;
use tracing::info;

use crate::files::deliver;

const VIDEO_MIME: &str = "video/mp4";

/// Config file settings, with `--base-url` taking precedence
pub fn load_config(path: Option<&Path>, base_url: Option<String>) -> Result<ServiceConfig> {
    let mut config = match path {
        Some(path) => ServiceConfig::from_file(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(url) = base_url {
        config.base_url = url;
    }
    Ok(config)
}

pub async fn info(config: &ServiceConfig, url: &str) -> Result<()> {
    let client = VideoServiceClient::new(config)?;
    let info = client
        .video_info(url)
        .await
        .context("Failed to fetch video info")?;

    println!("{}", info.title);
    println!("Duration: {}", format_duration(info.duration));
    println!("Size:     {}", format_size(info.size));
    for quality in &info.qualities {
        println!("  {:<8} format {}", quality.label, quality.format_id);
    }
    Ok(())
}

pub async fn download(
    config: &ServiceConfig,
    url: &str,
    height: Option<u32>,
    name: &str,
    out: &Path,
) -> Result<()> {
    let client = VideoServiceClient::new(config)?;
    let job_id = client
        .start_download(url, height)
        .await
        .context("Could not start download")?;

    let mut last = None;
    let done = track_job(&client, &job_id, &config.track_options(), |state| {
        if last != Some(state.progress) {
            last = Some(state.progress);
            info!("processing video: {}%", state.progress);
        }
    })
    .await
    .with_context(|| format!("Download {} did not finish", job_id))?;

    let output = OutputFile {
        filename: name.to_string(),
        mime_type: VIDEO_MIME.to_string(),
        bytes: done.artifact,
    };
    println!("{}", deliver(out, &output)?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_base_url_flag_wins() {
        let config = load_config(None, Some("http://svc:8080".into())).unwrap();
        assert_eq!(config.base_url, "http://svc:8080");
        assert_eq!(config.poll_interval_ms, 2000);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        assert!(load_config(Some(Path::new("/no/such/filekit.toml")), None).is_err());
    }
}

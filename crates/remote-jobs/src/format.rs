//! URL pre-validation and human-readable formatting for video metadata

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::JobError;

pub const EMPTY_URL_MESSAGE: &str = "Please enter a video URL.";
pub const UNSUPPORTED_URL_MESSAGE: &str =
    "Unsupported URL. Try YouTube, Instagram, TikTok, Twitter/X, or Facebook.";

/// Placeholder for values the service did not report
pub const MISSING: &str = "—";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    YouTube,
    Instagram,
    TikTok,
    Twitter,
    Facebook,
}

const PLATFORM_DOMAINS: [(Platform, &[&str]); 5] = [
    (Platform::YouTube, &["youtube.com", "youtu.be"]),
    (Platform::Instagram, &["instagram.com"]),
    (Platform::TikTok, &["tiktok.com"]),
    (Platform::Twitter, &["twitter.com", "x.com"]),
    (Platform::Facebook, &["facebook.com", "fb.watch", "fb.com"]),
];

/// Trim `input` and check that it points at a supported platform
///
/// Scheme-less input such as `youtu.be/abc` is accepted as https.
pub fn validate_video_url(input: &str) -> Result<(Url, Platform), JobError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(JobError::InvalidUrl(EMPTY_URL_MESSAGE.into()));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    let unsupported = || JobError::InvalidUrl(UNSUPPORTED_URL_MESSAGE.into());

    let url = Url::parse(&candidate).map_err(|_| unsupported())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(unsupported());
    }
    let host = url.host_str().ok_or_else(unsupported)?.to_ascii_lowercase();
    let platform = platform_for_host(&host).ok_or_else(unsupported)?;
    Ok((url, platform))
}

fn platform_for_host(host: &str) -> Option<Platform> {
    PLATFORM_DOMAINS.iter().find_map(|(platform, domains)| {
        domains
            .iter()
            .any(|d| host == *d || host.strip_suffix(d).is_some_and(|rest| rest.ends_with('.')))
            .then_some(*platform)
    })
}

/// `m:ss`, or a dash when unknown
pub fn format_duration(seconds: Option<f64>) -> String {
    match seconds {
        Some(s) if s.is_finite() && s >= 0.0 => {
            let total = s.floor() as u64;
            format!("{}:{:02}", total / 60, total % 60)
        }
        _ => MISSING.to_string(),
    }
}

/// Bytes as `B`, `KB` or `MB` with one decimal, or a dash when unknown
pub fn format_size(bytes: Option<u64>) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    match bytes {
        None => MISSING.to_string(),
        Some(b) if b < KB => format!("{} B", b),
        Some(b) if b < MB => format!("{:.1} KB", b as f64 / KB as f64),
        Some(b) => format!("{:.1} MB", b as f64 / MB as f64),
    }
}

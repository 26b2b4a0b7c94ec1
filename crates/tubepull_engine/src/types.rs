use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub type JobId = u64;

const STATUS_COMPLETE: &str = "complete";
const STATUS_ERROR: &str = "error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Single,
    Collection,
}

impl JobKind {
    pub fn endpoint_path(self) -> &'static str {
        match self {
            JobKind::Single => "/api/download",
            JobKind::Collection => "/api/download-playlist",
        }
    }
}

/// Body of a job-initiation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadRequest {
    pub url: String,
    pub quality: String,
    pub format: String,
}

/// One `data: ` frame of the progress stream.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRecord {
    #[serde(default, deserialize_with = "lenient_progress")]
    pub progress: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

impl StreamRecord {
    pub fn is_complete(&self) -> bool {
        self.status.as_deref() == Some(STATUS_COMPLETE)
    }

    pub fn is_error(&self) -> bool {
        self.status.as_deref() == Some(STATUS_ERROR)
    }

    pub fn is_terminal(&self) -> bool {
        self.is_complete() || self.is_error()
    }
}

/// Accepts a number or a numeric string; anything else reads as absent so the
/// rest of the frame still decodes.
fn lenient_progress<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let progress = match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    };
    Ok(progress)
}

/// Response of `POST /api/info`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct VideoDetails {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

impl VideoDetails {
    pub fn duration_seconds(&self) -> u64 {
        match self.duration {
            Some(seconds) if seconds.is_finite() && seconds > 0.0 => seconds as u64,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobEnd {
    /// A `complete` or `error` record was delivered.
    Terminal,
    /// The body ended before any terminal record.
    StreamClosed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Record {
        job_id: JobId,
        record: StreamRecord,
    },
    JobFinished {
        job_id: JobId,
        result: Result<JobEnd, BackendError>,
    },
    InfoFetched {
        url: String,
        info: Option<VideoDetails>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} ({message})")]
pub struct BackendError {
    pub kind: FailureKind,
    pub message: String,
}

impl BackendError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// The engine worker is gone; no further events will arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("engine worker stopped")]
pub struct EngineStopped;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "invalid response"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_fields_use_camel_case() {
        let record: StreamRecord = serde_json::from_str(
            r#"{"status":"complete","downloadUrl":"/files/a.mp4","filename":"a.mp4"}"#,
        )
        .unwrap();
        assert!(record.is_complete());
        assert_eq!(record.download_url.as_deref(), Some("/files/a.mp4"));
        assert_eq!(record.filename.as_deref(), Some("a.mp4"));
    }

    #[test]
    fn unknown_status_is_not_terminal() {
        let record: StreamRecord =
            serde_json::from_str(r#"{"status":"processing","progress":3.5}"#).unwrap();
        assert!(!record.is_terminal());
        assert_eq!(record.progress, Some(3.5));
    }

    #[test]
    fn odd_progress_values_do_not_drop_the_frame() {
        let record: StreamRecord = serde_json::from_str(
            r#"{"status":"complete","progress":"100","downloadUrl":"/files/a.mp4","filename":"a.mp4"}"#,
        )
        .unwrap();
        assert!(record.is_complete());
        assert_eq!(record.progress, Some(100.0));
        assert_eq!(record.download_url.as_deref(), Some("/files/a.mp4"));

        let record: StreamRecord =
            serde_json::from_str(r#"{"progress":"42.5%","message":"ok"}"#).unwrap();
        assert_eq!(record.progress, Some(42.5));

        for raw in [r#"{"progress":null}"#, r#"{"progress":"n/a"}"#, r#"{"progress":[1]}"#] {
            let record: StreamRecord = serde_json::from_str(raw).unwrap();
            assert_eq!(record.progress, None, "{raw}");
        }
    }

    #[test]
    fn error_display_embeds_status_code() {
        let err = BackendError::new(FailureKind::HttpStatus(502), "Bad Gateway");
        assert_eq!(err.to_string(), "http status 502 (Bad Gateway)");
    }

    #[test]
    fn duration_is_truncated_to_whole_seconds() {
        let details = VideoDetails {
            duration: Some(212.7),
            ..VideoDetails::default()
        };
        assert_eq!(details.duration_seconds(), 212);
        let negative = VideoDetails {
            duration: Some(-1.0),
            ..VideoDetails::default()
        };
        assert_eq!(negative.duration_seconds(), 0);
    }
}

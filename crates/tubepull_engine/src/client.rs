use std::pin::pin;
use std::time::Duration;

use futures_util::StreamExt;
use pull_logging::{pull_debug, pull_info, pull_warn};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use url::Url;

use crate::frame::{record_stream, FrameDecoder};
use crate::{BackendError, DownloadRequest, FailureKind, JobEnd, JobKind, StreamRecord, VideoDetails};

const INFO_PATH: &str = "/api/info";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Whole-request limit for the advisory info lookup.
    pub info_timeout: Duration,
    /// Longest gap between two chunks of a job stream.
    pub idle_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            connect_timeout: Duration::from_secs(10),
            info_timeout: Duration::from_secs(15),
            idle_timeout: Duration::from_secs(120),
        }
    }
}

pub trait RecordSink: Send + Sync {
    fn emit(&self, record: StreamRecord);
}

#[async_trait::async_trait]
pub trait JobBackend: Send + Sync {
    /// Best-effort metadata lookup; every failure resolves to `None`.
    async fn fetch_info(&self, url: &str) -> Option<VideoDetails>;

    /// Starts a job and forwards its records to `sink` in arrival order,
    /// stopping after the first terminal record.
    async fn run_job(
        &self,
        kind: JobKind,
        request: &DownloadRequest,
        sink: &dyn RecordSink,
    ) -> Result<JobEnd, BackendError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: ClientSettings,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: ClientSettings) -> Result<Self, BackendError> {
        Url::parse(&settings.base_url)
            .map_err(|err| BackendError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| BackendError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        let joined = format!("{}{}", self.settings.base_url.trim_end_matches('/'), path);
        Url::parse(&joined).map_err(|err| BackendError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        endpoint: Url,
        body: &T,
        timeout: Option<Duration>,
    ) -> Result<reqwest::Response, BackendError> {
        let body = serde_json::to_vec(body)
            .map_err(|err| BackendError::new(FailureKind::Decode, err.to_string()))?;
        let mut request = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.canonical_reason().unwrap_or("unexpected status"),
            ));
        }
        Ok(response)
    }

    async fn try_fetch_info(&self, url: &str) -> Result<VideoDetails, BackendError> {
        let endpoint = self.endpoint(INFO_PATH)?;
        let body = serde_json::json!({ "url": url });
        let response = self
            .post_json(endpoint, &body, Some(self.settings.info_timeout))
            .await?;
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&bytes)
            .map_err(|err| BackendError::new(FailureKind::Decode, err.to_string()))
    }
}

#[async_trait::async_trait]
impl JobBackend for ReqwestBackend {
    async fn fetch_info(&self, url: &str) -> Option<VideoDetails> {
        match self.try_fetch_info(url).await {
            Ok(details) => Some(details),
            Err(err) => {
                pull_debug!("Info lookup for {url} gave nothing: {err}");
                None
            }
        }
    }

    async fn run_job(
        &self,
        kind: JobKind,
        request: &DownloadRequest,
        sink: &dyn RecordSink,
    ) -> Result<JobEnd, BackendError> {
        let endpoint = self.endpoint(kind.endpoint_path())?;
        pull_info!(
            "Starting {:?} job at {} format={} quality={} url={}",
            kind,
            endpoint,
            request.format,
            request.quality,
            request.url
        );

        let response = self.post_json(endpoint, request, None).await.inspect_err(|err| {
            pull_warn!("Job initiation failed: {err}");
        })?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let decoder = FrameDecoder::for_content_type(content_type.as_deref());
        let mut records = pin!(record_stream(
            Box::pin(response.bytes_stream()),
            decoder,
            self.settings.idle_timeout,
        ));

        while let Some(record) = records.next().await {
            let record = record.inspect_err(|err| {
                pull_warn!("Job stream broke: {err}");
            })?;
            let terminal = record.is_terminal();
            sink.emit(record);
            if terminal {
                return Ok(JobEnd::Terminal);
            }
        }

        pull_warn!("Job stream closed without a terminal record");
        Ok(JobEnd::StreamClosed)
    }
}

/// Absolute form of an artifact reference; relative references are resolved
/// against the backend base URL.
pub fn resolve_artifact_url(base_url: &str, artifact_ref: &str) -> Option<String> {
    if let Ok(absolute) = Url::parse(artifact_ref) {
        return Some(absolute.to_string());
    }
    Url::parse(base_url)
        .and_then(|base| base.join(artifact_ref))
        .map(|resolved| resolved.to_string())
        .ok()
}

fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return BackendError::new(FailureKind::Decode, err.to_string());
    }
    BackendError::new(FailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_artifact_is_resolved_against_base() {
        assert_eq!(
            resolve_artifact_url("http://localhost:5000", "/downloads/a.mp4").as_deref(),
            Some("http://localhost:5000/downloads/a.mp4")
        );
    }

    #[test]
    fn absolute_artifact_passes_through() {
        assert_eq!(
            resolve_artifact_url("http://localhost:5000", "https://cdn.example.com/a.mp4")
                .as_deref(),
            Some("https://cdn.example.com/a.mp4")
        );
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let backend = ReqwestBackend::new(ClientSettings {
            base_url: "http://localhost:5000/".to_string(),
            ..ClientSettings::default()
        })
        .unwrap();
        assert_eq!(
            backend.endpoint(JobKind::Collection.endpoint_path()).unwrap().as_str(),
            "http://localhost:5000/api/download-playlist"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ReqwestBackend::new(ClientSettings {
            base_url: "not a url".to_string(),
            ..ClientSettings::default()
        })
        .unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidUrl);
    }
}

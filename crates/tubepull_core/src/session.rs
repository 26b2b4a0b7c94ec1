use crate::RequestMode;

pub type JobId = u64;

const STARTING_MESSAGE: &str = "Starting download...";
const JOB_FAILED_FALLBACK: &str = "Download failed";
const STREAM_ENDED_MESSAGE: &str = "Connection closed before the download finished";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Processing,
    Complete,
    Error,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Complete | Phase::Error)
    }
}

/// Final output of a completed job: where to fetch it and what to call it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub url: String,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInfo {
    pub title: String,
    pub author: String,
    pub duration_seconds: u64,
    pub thumbnail: Option<String>,
}

impl VideoInfo {
    /// `m:ss`, minutes unbounded.
    pub fn duration_label(&self) -> String {
        format!(
            "{}:{:02}",
            self.duration_seconds / 60,
            self.duration_seconds % 60
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Complete,
    Error,
    /// Any other status value; treated like an intermediate update.
    Other(String),
}

/// One decoded record from the progress stream.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventRecord {
    pub progress: Option<f64>,
    pub message: Option<String>,
    pub status: Option<JobStatus>,
    pub download_url: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobSession {
    phase: Phase,
    progress_percent: f64,
    status_text: String,
    artifact: Option<Artifact>,
}

impl JobSession {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn progress_percent(&self) -> f64 {
        self.progress_percent
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    pub(crate) fn begin(&mut self) {
        *self = Self {
            phase: Phase::Processing,
            status_text: STARTING_MESSAGE.to_string(),
            ..Self::default()
        };
    }

    pub(crate) fn fail(&mut self, text: impl Into<String>) {
        self.phase = Phase::Error;
        self.status_text = text.into();
    }

    pub(crate) fn fail_stream_ended(&mut self) {
        self.fail(STREAM_ENDED_MESSAGE);
    }

    /// Applies one record. Returns `true` when the record moved the session to
    /// a terminal phase; callers stop feeding records after that.
    pub(crate) fn apply_record(&mut self, mode: RequestMode, record: EventRecord) -> bool {
        if let Some(progress) = record.progress.filter(|value| value.is_finite()) {
            let clamped = progress.clamp(0.0, 100.0);
            if clamped > self.progress_percent {
                self.progress_percent = clamped;
            }
        }

        if let Some(message) = record.message.as_ref().filter(|message| !message.is_empty()) {
            self.status_text = message.clone();
        }

        match record.status {
            Some(JobStatus::Complete) => {
                self.phase = Phase::Complete;
                self.artifact = record.download_url.map(|url| Artifact {
                    url,
                    filename: record.filename,
                });
                self.status_text = success_message(mode).to_string();
                true
            }
            Some(JobStatus::Error) => {
                let text = record
                    .message
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| JOB_FAILED_FALLBACK.to_string());
                self.fail(text);
                true
            }
            Some(JobStatus::Other(_)) | None => false,
        }
    }
}

fn success_message(mode: RequestMode) -> &'static str {
    match mode {
        RequestMode::Single => "Video downloaded successfully!",
        RequestMode::Collection => "Playlist downloaded successfully!",
    }
}

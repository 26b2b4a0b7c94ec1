use std::time::Duration;

use pull_logging::{pull_debug, pull_info, pull_warn};
use tubepull_core::{Effect, EventRecord, JobStatus, Msg, RequestMode, VideoInfo};
use tubepull_engine::{
    DownloadRequest, EngineEvent, EngineHandle, EngineStopped, JobEnd, JobKind, StreamRecord,
    VideoDetails,
};

/// Executes core effects on the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartJob { job_id, request } => {
                    pull_info!(
                        "StartJob job_id={} mode={:?} url={}",
                        job_id,
                        request.mode,
                        request.url
                    );
                    self.engine.start_job(
                        job_id,
                        map_mode(request.mode),
                        DownloadRequest {
                            url: request.url,
                            quality: request.quality,
                            format: request.container.as_str().to_string(),
                        },
                    );
                }
                Effect::CancelJob { job_id } => {
                    pull_info!("CancelJob job_id={}", job_id);
                    self.engine.cancel_job(job_id);
                }
                Effect::FetchInfo { url } => {
                    pull_debug!("FetchInfo url={}", url);
                    self.engine.fetch_info(url);
                }
            }
        }
    }

    /// Waits up to `timeout` for the next engine event that matters to the core.
    pub fn next_msg(&self, timeout: Duration) -> Result<Option<Msg>, EngineStopped> {
        Ok(self.engine.recv_timeout(timeout)?.and_then(map_event))
    }
}

fn map_mode(mode: RequestMode) -> JobKind {
    match mode {
        RequestMode::Single => JobKind::Single,
        RequestMode::Collection => JobKind::Collection,
    }
}

fn map_event(event: EngineEvent) -> Option<Msg> {
    match event {
        EngineEvent::Record { job_id, record } => Some(Msg::JobRecord {
            job_id,
            record: map_record(record),
        }),
        EngineEvent::JobFinished { job_id, result } => match result {
            Ok(JobEnd::Terminal) => None,
            Ok(JobEnd::StreamClosed) => Some(Msg::JobStreamEnded { job_id }),
            Err(err) => {
                pull_warn!("Job {} failed: {}", job_id, err);
                Some(Msg::JobFailed {
                    job_id,
                    error: err.to_string(),
                })
            }
        },
        EngineEvent::InfoFetched { url, info } => Some(Msg::InfoFetched {
            url,
            info: info.map(map_info),
        }),
    }
}

fn map_record(record: StreamRecord) -> EventRecord {
    let status = match record.status.as_deref() {
        None => None,
        Some(_) if record.is_complete() => Some(JobStatus::Complete),
        Some(_) if record.is_error() => Some(JobStatus::Error),
        Some(other) => Some(JobStatus::Other(other.to_string())),
    };
    EventRecord {
        progress: record.progress,
        message: record.message,
        status,
        download_url: record.download_url,
        filename: record.filename,
    }
}

fn map_info(details: VideoDetails) -> VideoInfo {
    VideoInfo {
        duration_seconds: details.duration_seconds(),
        title: details.title,
        author: details.author,
        thumbnail: details.thumbnail,
    }
}

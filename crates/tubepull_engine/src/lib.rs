//! Tubepull engine: backend HTTP client, progress-stream decoding and job execution.
mod client;
mod engine;
mod frame;
mod types;

pub use client::{
    resolve_artifact_url, ClientSettings, JobBackend, RecordSink, ReqwestBackend,
};
pub use engine::EngineHandle;
pub use frame::{record_stream, FrameDecoder, DATA_PREFIX};
pub use types::{
    BackendError, DownloadRequest, EngineEvent, EngineStopped, FailureKind, JobEnd, JobId, JobKind,
    StreamRecord, VideoDetails,
};

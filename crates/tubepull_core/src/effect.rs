use crate::{Container, JobId, RequestMode};

/// Everything the backend needs to start one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub mode: RequestMode,
    pub url: String,
    pub container: Container,
    pub quality: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartJob { job_id: JobId, request: JobRequest },
    CancelJob { job_id: JobId },
    FetchInfo { url: String },
}

use crate::view_model::AppViewModel;
use crate::{
    classify, Container, EventRecord, JobId, JobRequest, JobSession, MediaPreference, Phase,
    RequestMode, UrlValidation, VideoInfo,
};

/// Everything the renderer observes. Only `update` mutates it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    mode: RequestMode,
    url: String,
    validation: UrlValidation,
    preference: MediaPreference,
    video_info: Option<VideoInfo>,
    session: JobSession,
    active_job: Option<JobId>,
    last_job_id: JobId,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> RequestMode {
        self.mode
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn validation(&self) -> UrlValidation {
        self.validation
    }

    pub fn preference(&self) -> &MediaPreference {
        &self.preference
    }

    pub fn video_info(&self) -> Option<&VideoInfo> {
        self.video_info.as_ref()
    }

    pub fn session(&self) -> &JobSession {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    /// Job whose stream is still attached, if any.
    pub fn active_job(&self) -> Option<JobId> {
        self.active_job
    }

    pub fn download_enabled(&self) -> bool {
        self.phase() != Phase::Processing && !self.url.trim().is_empty() && self.validation.valid
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            mode: self.mode,
            url: self.url.clone(),
            validation_message: self.validation.reason.map(|reason| reason.message().to_string()),
            container: self.preference.container(),
            quality: self.preference.quality().to_string(),
            quality_tiers: self.preference.quality_tiers().to_vec(),
            video_info: self.video_info.clone().filter(|_| self.validation.valid),
            phase: self.session.phase(),
            progress_percent: self.session.progress_percent(),
            status_text: self.session.status_text().to_string(),
            artifact: self.session.artifact().cloned(),
            download_enabled: self.download_enabled(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_mode(&mut self, mode: RequestMode) -> Option<JobId> {
        self.mode = mode;
        self.reset()
    }

    pub(crate) fn set_url(&mut self, url: String) {
        self.validation = classify(&url, self.mode);
        self.url = url;
        self.video_info = None;
        self.mark_dirty();
    }

    /// Compare-and-set against the URL that was queried.
    pub(crate) fn apply_info(&mut self, queried_url: &str, info: Option<VideoInfo>) -> bool {
        if queried_url != self.url || !self.validation.valid {
            return false;
        }
        let Some(info) = info else {
            return false;
        };
        self.video_info = Some(info);
        self.mark_dirty();
        true
    }

    pub(crate) fn info_query(&self) -> Option<String> {
        if self.url.trim().is_empty() || !self.validation.valid {
            None
        } else {
            Some(self.url.clone())
        }
    }

    pub(crate) fn set_container(&mut self, container: Container) {
        self.preference.set_container(container);
        self.mark_dirty();
    }

    pub(crate) fn set_quality(&mut self, tier: &str) -> bool {
        let accepted = self.preference.set_quality(tier);
        if accepted {
            self.mark_dirty();
        }
        accepted
    }

    /// Surfaces the validation failure without contacting the backend.
    pub(crate) fn reject_invalid_url(&mut self) {
        let reason = self
            .validation
            .reason
            .map(|reason| reason.message())
            .unwrap_or("invalid URL");
        self.session = JobSession::default();
        self.session.fail(reason);
        self.mark_dirty();
    }

    pub(crate) fn start_job(&mut self) -> (JobId, JobRequest) {
        self.last_job_id += 1;
        let job_id = self.last_job_id;
        self.active_job = Some(job_id);
        self.session.begin();
        self.mark_dirty();

        let request = JobRequest {
            mode: self.mode,
            url: self.url.trim().to_string(),
            container: self.preference.container(),
            quality: self.preference.quality().to_string(),
        };
        (job_id, request)
    }

    fn owns(&self, job_id: JobId) -> bool {
        self.active_job == Some(job_id) && self.session.phase() == Phase::Processing
    }

    pub(crate) fn apply_record(&mut self, job_id: JobId, record: EventRecord) {
        if !self.owns(job_id) {
            return;
        }
        if self.session.apply_record(self.mode, record) {
            self.active_job = None;
        }
        self.mark_dirty();
    }

    pub(crate) fn apply_failure(&mut self, job_id: JobId, error: &str) {
        if !self.owns(job_id) {
            return;
        }
        self.active_job = None;
        self.session.fail(format!("Download failed: {error}"));
        self.mark_dirty();
    }

    pub(crate) fn apply_stream_ended(&mut self, job_id: JobId) {
        if !self.owns(job_id) {
            return;
        }
        self.active_job = None;
        self.session.fail_stream_ended();
        self.mark_dirty();
    }

    /// Back to `Idle` with URL and session cleared. Returns the job that was
    /// still attached so the caller can cancel it.
    pub(crate) fn reset(&mut self) -> Option<JobId> {
        self.url.clear();
        self.validation = UrlValidation::ok();
        self.video_info = None;
        self.session = JobSession::default();
        self.mark_dirty();
        self.active_job.take()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User switched between single-item and collection mode.
    ModeSelected(crate::RequestMode),
    /// User edited the URL field.
    UrlChanged(String),
    /// URL field lost focus; the only trigger for an info lookup.
    UrlFocusLost,
    /// Info lookup resolved for `url`. `None` when nothing could be fetched.
    InfoFetched {
        url: String,
        info: Option<crate::VideoInfo>,
    },
    /// User picked a container.
    ContainerSelected(crate::Container),
    /// User picked a quality tier.
    QualitySelected(String),
    /// User pressed the download control.
    DownloadClicked,
    /// Decoded record from the job's progress stream.
    JobRecord {
        job_id: crate::JobId,
        record: crate::EventRecord,
    },
    /// The job could not be started or its stream broke.
    JobFailed { job_id: crate::JobId, error: String },
    /// The stream ended without a terminal record.
    JobStreamEnded { job_id: crate::JobId },
    /// User asked to start over.
    ResetClicked,
    /// Render tick.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}

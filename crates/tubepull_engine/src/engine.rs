use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use pull_logging::{pull_debug, pull_error, pull_info};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::client::{ClientSettings, JobBackend, RecordSink, ReqwestBackend};
use crate::{
    BackendError, DownloadRequest, EngineEvent, EngineStopped, JobId, JobKind, StreamRecord,
};

enum EngineCommand {
    StartJob {
        job_id: JobId,
        kind: JobKind,
        request: DownloadRequest,
    },
    CancelJob {
        job_id: JobId,
    },
    FetchInfo {
        url: String,
    },
    Shutdown,
}

struct RunningJob {
    token: CancellationToken,
    task: JoinHandle<()>,
}

/// Runs backend work on a private tokio runtime and reports back through
/// [`EngineEvent`]s. Dropping the handle cancels every running job.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    worker: Option<thread::JoinHandle<()>>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, BackendError> {
        let backend = ReqwestBackend::new(settings)?;
        Ok(Self::with_backend(Arc::new(backend)))
    }

    pub fn with_backend(backend: Arc<dyn JobBackend>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        let worker = thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    pull_error!("Engine runtime failed to start: {err}");
                    return;
                }
            };
            let mut jobs: HashMap<JobId, RunningJob> = HashMap::new();

            while let Ok(command) = cmd_rx.recv() {
                jobs.retain(|_, job| !job.task.is_finished());
                match command {
                    EngineCommand::StartJob {
                        job_id,
                        kind,
                        request,
                    } => {
                        let token = CancellationToken::new();
                        let task = runtime.spawn(run_job(
                            backend.clone(),
                            job_id,
                            kind,
                            request,
                            token.clone(),
                            event_tx.clone(),
                        ));
                        jobs.insert(job_id, RunningJob { token, task });
                    }
                    EngineCommand::CancelJob { job_id } => {
                        if let Some(job) = jobs.remove(&job_id) {
                            pull_debug!("Cancelling job {job_id}");
                            job.token.cancel();
                        }
                    }
                    EngineCommand::FetchInfo { url } => {
                        let backend = backend.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            let info = backend.fetch_info(&url).await;
                            let _ = event_tx.send(EngineEvent::InfoFetched { url, info });
                        });
                    }
                    EngineCommand::Shutdown => break,
                }
            }

            for (job_id, job) in jobs.drain() {
                pull_debug!("Cancelling job {job_id} on shutdown");
                job.token.cancel();
            }
            runtime.shutdown_timeout(Duration::from_secs(1));
        });

        Self {
            cmd_tx,
            event_rx,
            worker: Some(worker),
        }
    }

    pub fn start_job(&self, job_id: JobId, kind: JobKind, request: DownloadRequest) {
        let _ = self.cmd_tx.send(EngineCommand::StartJob {
            job_id,
            kind,
            request,
        });
    }

    /// Aborts the request behind `job_id`. No event is reported for it.
    pub fn cancel_job(&self, job_id: JobId) {
        let _ = self.cmd_tx.send(EngineCommand::CancelJob { job_id });
    }

    pub fn fetch_info(&self, url: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::FetchInfo { url: url.into() });
    }

    pub fn try_recv(&self) -> Result<Option<EngineEvent>, EngineStopped> {
        match self.event_rx.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::TryRecvError::Empty) => Ok(None),
            Err(mpsc::TryRecvError::Disconnected) => Err(EngineStopped),
        }
    }

    /// `Ok(None)` when nothing arrived in time, `Err` once the worker is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<EngineEvent>, EngineStopped> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(EngineStopped),
        }
    }

    /// Cancels all jobs and joins the worker. Later receives report
    /// [`EngineStopped`].
    pub fn shutdown(&mut self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct ChannelRecordSink {
    job_id: JobId,
    tx: mpsc::Sender<EngineEvent>,
}

impl RecordSink for ChannelRecordSink {
    fn emit(&self, record: StreamRecord) {
        let _ = self.tx.send(EngineEvent::Record {
            job_id: self.job_id,
            record,
        });
    }
}

async fn run_job(
    backend: Arc<dyn JobBackend>,
    job_id: JobId,
    kind: JobKind,
    request: DownloadRequest,
    token: CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let sink = ChannelRecordSink {
        job_id,
        tx: event_tx.clone(),
    };
    tokio::select! {
        _ = token.cancelled() => {
            pull_info!("Job {job_id} cancelled");
        }
        result = backend.run_job(kind, &request, &sink) => {
            let _ = event_tx.send(EngineEvent::JobFinished { job_id, result });
        }
    }
}

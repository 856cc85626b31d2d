//! FIFO masking job queue with a single worker task
//!
//! Jobs are served strictly in submission order by one worker; processor
//! invocations never overlap, which is what lets the rest of the core get
//! away without locks around the session map and status ring.

use crate::errors::{JobError, JobErrorCode};
use crate::models::{JobSuccess, MaskingJob, MaskingJobResult, MaskingJobState, MaskingStatusEvent};
use crate::workflow::status::{StatusListeners, StatusSubscription};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, watch, Notify};
use tokio::task::JoinHandle;

const CANCELLED_MESSAGE: &str = "Job was cancelled before execution.";

/// Per-job routine invoked by the queue worker, exactly one at a time.
/// Classified failures should be returned as a [`JobError`] (possibly via
/// `anyhow`); anything else is reported as `E_INTERNAL`.
#[async_trait]
pub trait JobProcessor: Send + Sync {
    async fn process(&self, job: &MaskingJob) -> anyhow::Result<JobSuccess>;
}

/// One-shot handle resolving with the job's terminal outcome.
pub type JobResultReceiver = oneshot::Receiver<MaskingJobResult>;

struct QueuedEntry {
    job: MaskingJob,
    tx: oneshot::Sender<MaskingJobResult>,
}

struct QueueState {
    pending: VecDeque<QueuedEntry>,
    running: bool,
}

struct QueueShared {
    state: Mutex<QueueState>,
    notify: Notify,
    locked_tx: watch::Sender<bool>,
    listeners: Arc<StatusListeners>,
    publish: Box<dyn Fn(MaskingStatusEvent) + Send + Sync>,
}

impl QueueShared {
    fn is_locked(&self) -> bool {
        let state = self.state.lock().expect("queue state poisoned");
        state.running || !state.pending.is_empty()
    }

    fn update_locked(&self) {
        self.locked_tx.send_replace(self.is_locked());
    }

    /// Publish upstream, then notify the queue's own listeners.
    fn emit_with_locked(&self, mut event: MaskingStatusEvent, locked: bool) {
        event.locked = locked;
        (self.publish)(event.clone());
        self.listeners.notify(&event);
    }

    /// Enrich with the current locked flag before emitting.
    fn emit(&self, event: MaskingStatusEvent) {
        let locked = self.is_locked();
        self.emit_with_locked(event, locked);
    }
}

/// Single-worker FIFO scheduler for masking jobs.
pub struct MaskingJobQueue {
    shared: Arc<QueueShared>,
    locked_rx: watch::Receiver<bool>,
    worker: JoinHandle<()>,
}

impl MaskingJobQueue {
    /// Spawn the worker task. `publish` receives every status event the
    /// queue emits, before the queue's own listeners run.
    pub fn new(
        processor: Arc<dyn JobProcessor>,
        publish: impl Fn(MaskingStatusEvent) + Send + Sync + 'static,
    ) -> Self {
        let (locked_tx, locked_rx) = watch::channel(false);
        let shared = Arc::new(QueueShared {
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                running: false,
            }),
            notify: Notify::new(),
            locked_tx,
            listeners: Arc::new(StatusListeners::default()),
            publish: Box::new(publish),
        });

        let worker = tokio::spawn(Self::drain(shared.clone(), processor));

        Self {
            shared,
            locked_rx,
            worker,
        }
    }

    /// Submit a job. Emits `queued` immediately and returns a handle that
    /// resolves once the processor finishes or the job is cancelled.
    pub fn enqueue(&self, job: MaskingJob) -> JobResultReceiver {
        let (tx, rx) = oneshot::channel();
        let job_id = job.id.clone();

        // `queued` goes out before the entry is visible to the worker, so no
        // later state for this job can ever precede it. The queue is locked
        // the instant the push lands, hence the flag is set by hand.
        self.shared.emit_with_locked(
            MaskingStatusEvent::new(job_id, MaskingJobState::Queued),
            true,
        );

        {
            let mut state = self.shared.state.lock().expect("queue state poisoned");
            state.pending.push_back(QueuedEntry { job, tx });
        }
        self.shared.update_locked();
        self.shared.notify.notify_one();
        rx
    }

    /// Remove a still-pending job. Resolves its handle with `E_CANCELLED`
    /// and emits one matching `failed` event. Running or finished jobs are
    /// not cancellable; those calls return false with no side effect.
    pub fn cancel(&self, job_id: &str) -> bool {
        let entry = {
            let mut state = self.shared.state.lock().expect("queue state poisoned");
            let position = state.pending.iter().position(|e| e.job.id == job_id);
            position.and_then(|idx| state.pending.remove(idx))
        };

        let Some(entry) = entry else {
            return false;
        };

        // The entry is out of the pending list, so the worker can never emit
        // for this job again; `failed` is necessarily its last event, and
        // `queued` preceded the caller learning the id.
        let _ = entry.tx.send(MaskingJobResult::Failed {
            error: JobError::cancelled(CANCELLED_MESSAGE),
        });
        self.shared.update_locked();

        let mut event = MaskingStatusEvent::new(job_id, MaskingJobState::Failed);
        event.error_code = Some(JobErrorCode::Cancelled.as_str().to_string());
        event.message = Some(CANCELLED_MESSAGE.to_string());
        self.shared.emit(event);

        tracing::info!(job_id, "masking job cancelled while pending");
        true
    }

    /// Whether any job is pending or running.
    pub fn is_locked(&self) -> bool {
        self.shared.is_locked()
    }

    /// Pending jobs plus the running one, if any.
    pub fn depth(&self) -> usize {
        let state = self.shared.state.lock().expect("queue state poisoned");
        state.pending.len() + usize::from(state.running)
    }

    /// Suspend until no job is pending or running.
    pub async fn wait_for_idle(&self) {
        let mut rx = self.locked_rx.clone();
        let _ = rx.wait_for(|locked| !locked).await;
    }

    /// Register a status listener on the queue's own feed.
    pub fn on_status(
        &self,
        listener: impl Fn(&MaskingStatusEvent) + Send + Sync + 'static,
    ) -> StatusSubscription {
        self.shared.listeners.add(Arc::new(listener))
    }

    /// Worker loop: pop, run, resolve, repeat. One bad job never halts the
    /// drain; its failure is classified and the next entry is served.
    async fn drain(shared: Arc<QueueShared>, processor: Arc<dyn JobProcessor>) {
        loop {
            let entry = {
                let mut state = shared.state.lock().expect("queue state poisoned");
                match state.pending.pop_front() {
                    Some(entry) => {
                        state.running = true;
                        Some(entry)
                    }
                    None => None,
                }
            };

            let Some(entry) = entry else {
                shared.update_locked();
                shared.notify.notified().await;
                continue;
            };

            shared.update_locked();
            shared.emit(MaskingStatusEvent::new(
                entry.job.id.clone(),
                MaskingJobState::Running,
            ));

            let result = match processor.process(&entry.job).await {
                Ok(success) => MaskingJobResult::Succeeded(success),
                Err(err) => {
                    let error = err
                        .downcast::<JobError>()
                        .unwrap_or_else(|other| JobError::internal(other.to_string()));
                    MaskingJobResult::Failed { error }
                }
            };

            {
                let mut state = shared.state.lock().expect("queue state poisoned");
                state.running = false;
            }
            shared.update_locked();

            match &result {
                MaskingJobResult::Succeeded(success) => {
                    let mut event =
                        MaskingStatusEvent::new(entry.job.id.clone(), MaskingJobState::Succeeded);
                    event.masked_text = Some(success.masked_text.clone());
                    event.model = Some(success.model.clone());
                    event.endpoint = Some(success.endpoint.clone());
                    shared.emit(event);
                }
                MaskingJobResult::Failed { error } => {
                    let mut event =
                        MaskingStatusEvent::new(entry.job.id.clone(), MaskingJobState::Failed);
                    event.error_code = Some(error.code.as_str().to_string());
                    event.message = Some(error.message.clone());
                    shared.emit(event);
                }
            }

            let _ = entry.tx.send(result);
        }
    }
}

impl Drop for MaskingJobQueue {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

//! End-to-end masking workflow orchestration
//!
//! Composes the job queue, the approval controller, and the external
//! masking/relay/audit collaborators into the per-job
//! mask → approve → relay loop. All per-job work runs on the queue's single
//! worker, so the loop never interleaves with another job's.

use crate::approval::{ApprovalController, ApprovalDecision};
use crate::audit::AuditSink;
use crate::client::{LlmClient, Masker};
use crate::errors::{JobError, JobErrorCode, WorkflowError};
use crate::models::{
    AuditDecision, AuditEntry, AuditStatus, JobSuccess, MaskingJob, MaskingJobResult,
    MaskingJobState, MaskingOptions, MaskingStatusEvent, MaskingWorkflowConfig,
};
use crate::relay::{ChatRelay, ChatRelayPayload};
use crate::workflow::job_queue::{JobProcessor, JobResultReceiver, MaskingJobQueue};
use crate::workflow::status::{StatusBroadcaster, StatusSubscription, DEFAULT_STATUS_CAPACITY};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// External collaborators and settings wired into the workflow.
pub struct MaskingWorkflowDeps {
    pub llm_client: Arc<dyn LlmClient>,
    pub masker: Arc<dyn Masker>,
    pub approval: Arc<ApprovalController>,
    pub chat_relay: Arc<dyn ChatRelay>,
    pub audit_sink: Arc<dyn AuditSink>,
    pub config: MaskingWorkflowConfig,
    /// Retained status events; defaults to [`DEFAULT_STATUS_CAPACITY`]
    pub status_capacity: Option<usize>,
}

/// Identifiers handed back as soon as a job is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedJob {
    pub job_id: String,
    pub approval_session_id: String,
}

/// Runs the per-job loop on the queue worker. Split from the public surface
/// so the queue can own a processor handle without a reference cycle.
struct JobRuntime {
    llm: Arc<dyn LlmClient>,
    masker: Arc<dyn Masker>,
    approval: Arc<ApprovalController>,
    chat_relay: Arc<dyn ChatRelay>,
    audit_sink: Arc<dyn AuditSink>,
    broadcaster: Arc<StatusBroadcaster>,
    config: MaskingWorkflowConfig,
}

impl JobRuntime {
    fn now(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    /// Events here are emitted from the worker's call stack while the job is
    /// in flight, so the queue is locked by construction.
    fn emit(&self, mut event: MaskingStatusEvent) {
        event.locked = true;
        self.broadcaster.publish(event);
    }

    async fn record_audit(&self, entry: AuditEntry) -> Result<(), WorkflowError> {
        self.audit_sink.record(entry).await
    }

    /// The mask → approve → relay loop. Returns `Ok` for both relayed and
    /// rejected outcomes (rejection is a legitimate terminal state, audited
    /// inside); `Err` means an internal failure the caller must audit.
    async fn run_job(
        &self,
        job: &MaskingJob,
        input_bytes: u64,
    ) -> Result<MaskingJobResult, WorkflowError> {
        let mut current_input = job.text.clone();

        loop {
            let preview = self
                .masker
                .mask(self.llm.clone(), &current_input, &job.options)
                .await?;

            let session_id = self
                .approval
                .create_session(
                    &job.id,
                    preview.clone(),
                    Some(job.approval_session_id.clone()),
                )
                .await?;

            let mut event = MaskingStatusEvent::new(job.id.clone(), MaskingJobState::WaitingApproval);
            event.masked_text = Some(preview.masked_text.clone());
            event.model = Some(self.config.model.clone());
            event.endpoint = Some(self.config.endpoint.clone());
            self.emit(event);

            match self.approval.await_decision(&session_id).await? {
                ApprovalDecision::Approve { edited_text } => {
                    let masked_text = match edited_text {
                        Some(text) if !text.trim().is_empty() => text,
                        _ => preview.masked_text,
                    };
                    let approved_at = self.now();

                    self.chat_relay
                        .send_approved_message(ChatRelayPayload {
                            job_id: job.id.clone(),
                            approval_session_id: session_id.clone(),
                            masked_text: masked_text.clone(),
                            chat_message_id: job.chat_message_id.clone(),
                            model: self.config.model.clone(),
                            endpoint: self.config.endpoint.clone(),
                            approved_at,
                        })
                        .await?;
                    let relayed_at = self.now();

                    self.record_audit(AuditEntry {
                        job_id: job.id.clone(),
                        status: AuditStatus::Approved,
                        decision: AuditDecision::Approve,
                        input_bytes,
                        masked_bytes: Some(masked_text.len() as u64),
                        approved_at: Some(approved_at),
                        relayed_at: Some(relayed_at),
                        error_code: None,
                        timestamp: relayed_at,
                    })
                    .await?;

                    tracing::info!(job_id = %job.id, "masked text approved and relayed");
                    return Ok(MaskingJobResult::Succeeded(JobSuccess {
                        masked_text,
                        model: self.config.model.clone(),
                        endpoint: self.config.endpoint.clone(),
                        finished_at: self.now(),
                    }));
                }
                ApprovalDecision::Reject { reason } => {
                    self.record_audit(AuditEntry {
                        job_id: job.id.clone(),
                        status: AuditStatus::Failed,
                        decision: AuditDecision::Reject,
                        input_bytes,
                        masked_bytes: None,
                        approved_at: None,
                        relayed_at: None,
                        error_code: Some(JobErrorCode::Usage),
                        timestamp: self.now(),
                    })
                    .await?;

                    tracing::info!(job_id = %job.id, "masking rejected by operator");
                    return Ok(MaskingJobResult::Failed {
                        error: JobError::usage(
                            reason.unwrap_or_else(|| {
                                "Masking was rejected by the user".to_string()
                            }),
                        ),
                    });
                }
                ApprovalDecision::Edit { revised_input } => {
                    current_input = revised_input;
                    self.emit(MaskingStatusEvent::new(
                        job.id.clone(),
                        MaskingJobState::Running,
                    ));
                    // Same session id, fresh preview on the next turn.
                }
            }
        }
    }
}

#[async_trait]
impl JobProcessor for JobRuntime {
    async fn process(&self, job: &MaskingJob) -> anyhow::Result<JobSuccess> {
        // Byte length of the original submission; edits never change it.
        let input_bytes = job.text.len() as u64;

        match self.run_job(job, input_bytes).await {
            Ok(MaskingJobResult::Succeeded(success)) => Ok(success),
            Ok(MaskingJobResult::Failed { error }) => Err(error.into()),
            Err(workflow_err) => {
                let error: JobError = workflow_err.into();
                let audit = AuditEntry {
                    job_id: job.id.clone(),
                    status: AuditStatus::Failed,
                    decision: AuditDecision::Error,
                    input_bytes,
                    masked_bytes: None,
                    approved_at: None,
                    relayed_at: None,
                    error_code: Some(error.code),
                    timestamp: self.now(),
                };
                if let Err(audit_err) = self.record_audit(audit).await {
                    tracing::error!(job_id = %job.id, error = %audit_err, "audit record failed");
                }
                tracing::warn!(job_id = %job.id, code = %error.code, "masking job failed");
                Err(error.into())
            }
        }
    }
}

/// The caller-facing masking workflow: submit text, wait for the outcome,
/// observe status, cancel pending work.
pub struct MaskingWorkflow {
    queue: MaskingJobQueue,
    broadcaster: Arc<StatusBroadcaster>,
    approval: Arc<ApprovalController>,
    /// Read-once result handles keyed by job id
    job_results: Mutex<HashMap<String, JobResultReceiver>>,
}

impl MaskingWorkflow {
    pub fn new(deps: MaskingWorkflowDeps) -> Self {
        let broadcaster = Arc::new(StatusBroadcaster::new(
            deps.status_capacity.unwrap_or(DEFAULT_STATUS_CAPACITY),
        ));

        let runtime = Arc::new(JobRuntime {
            llm: deps.llm_client,
            masker: deps.masker,
            approval: deps.approval.clone(),
            chat_relay: deps.chat_relay,
            audit_sink: deps.audit_sink,
            broadcaster: broadcaster.clone(),
            config: deps.config,
        });

        let queue = {
            let broadcaster = broadcaster.clone();
            MaskingJobQueue::new(runtime, move |event| broadcaster.publish(event))
        };

        Self {
            queue,
            broadcaster,
            approval: deps.approval,
            job_results: Mutex::new(HashMap::new()),
        }
    }

    /// Submit text for masking. Non-blocking: the job is queued and its
    /// identifiers returned immediately.
    pub fn start_masking(
        &self,
        input: impl Into<String>,
        options: MaskingOptions,
        chat_message_id: Option<String>,
    ) -> StartedJob {
        let job_id = format!("job-{}", Uuid::new_v4());
        let approval_session_id = format!("approval-{}", Uuid::new_v4());

        let job = MaskingJob {
            id: job_id.clone(),
            text: input.into(),
            options,
            chat_message_id,
            approval_session_id: approval_session_id.clone(),
            requested_at: Utc::now().timestamp_millis(),
        };

        let receiver = self.queue.enqueue(job);
        self.job_results
            .lock()
            .expect("job results poisoned")
            .insert(job_id.clone(), receiver);

        tracing::info!(job_id = %job_id, "masking job submitted");
        StartedJob {
            job_id,
            approval_session_id,
        }
    }

    /// Suspend until the job's handle resolves. Each result is retrievable
    /// exactly once; unknown or already-consumed ids fail.
    pub async fn wait_for_job(&self, job_id: &str) -> Result<MaskingJobResult> {
        let receiver = self
            .job_results
            .lock()
            .expect("job results poisoned")
            .remove(job_id)
            .ok_or_else(|| anyhow!("job {job_id} is not registered"))?;

        receiver
            .await
            .with_context(|| format!("worker dropped result for job {job_id}"))
    }

    /// Cancel a still-pending job. See [`MaskingJobQueue::cancel`].
    pub fn cancel(&self, job_id: &str) -> bool {
        self.queue.cancel(job_id)
    }

    pub fn is_locked(&self) -> bool {
        self.queue.is_locked()
    }

    pub fn queue_depth(&self) -> usize {
        self.queue.depth()
    }

    pub async fn wait_for_idle(&self) {
        self.queue.wait_for_idle().await;
    }

    /// Register a listener on the merged status feed (queue transitions plus
    /// the per-job loop's own events).
    pub fn on_status(
        &self,
        listener: impl Fn(&MaskingStatusEvent) + Send + Sync + 'static,
    ) -> StatusSubscription {
        self.broadcaster.on_status(listener)
    }

    /// Ordered copy of the recent status events, for health endpoints.
    pub fn status_snapshot(&self) -> Vec<MaskingStatusEvent> {
        self.broadcaster.snapshot()
    }

    /// Sessions retained by the approval controller.
    pub fn active_approval_sessions(&self) -> usize {
        self.approval.active_session_count()
    }
}

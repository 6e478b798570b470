//! Asynchronous report delivery queue.
//!
//! [`ReportDispatcher`] is the cheap, cloneable handle request handlers use
//! to enqueue jobs; [`DispatchWorker`] is the single background consumer.
//! Each job is computed from a fresh snapshot, rendered and handed to the
//! configured [`ReportSink`]. Failures are logged and the job is dropped.

use std::sync::Arc;

use annostat_core::records::Dataset;
use annostat_core::types::DbId;
use annostat_core::{compute_report, CoreError, ReportRequest};
use annostat_db::repositories::UserRepo;
use annostat_db::snapshot::SnapshotLoader;
use annostat_db::DbPool;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::email::EmailError;
use crate::render::render_html;
use crate::sink::{ReportEmail, ReportSink};

/// Default bound of the job queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Report queue is full, try again later")]
    QueueFull,

    #[error("Report queue is closed")]
    Closed,

    #[error("Recipient user {0} not found")]
    RecipientNotFound(DbId),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Report(#[from] CoreError),

    #[error(transparent)]
    Email(#[from] EmailError),
}

// ---------------------------------------------------------------------------
// ReportJob
// ---------------------------------------------------------------------------

/// One report to compute and email.
#[derive(Debug, Clone)]
pub struct ReportJob {
    pub id: Uuid,
    pub recipient_id: DbId,
    pub request: ReportRequest,
    pub subject: String,
}

impl ReportJob {
    /// A job with a time-ordered id and the request's default title.
    pub fn new(recipient_id: DbId, request: ReportRequest) -> Self {
        Self {
            id: Uuid::now_v7(),
            recipient_id,
            subject: request.title(),
            request,
        }
    }
}

// ---------------------------------------------------------------------------
// ReportDispatcher
// ---------------------------------------------------------------------------

/// Producer side of the report queue.
#[derive(Clone)]
pub struct ReportDispatcher {
    sender: mpsc::Sender<ReportJob>,
}

impl ReportDispatcher {
    /// Create the queue and its worker. The worker must be spawned with
    /// [`DispatchWorker::run`] for jobs to make progress.
    pub fn new(capacity: usize, pool: DbPool, sink: Arc<dyn ReportSink>) -> (Self, DispatchWorker) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let worker = DispatchWorker {
            receiver,
            pool,
            sink,
        };
        (Self { sender }, worker)
    }

    /// Queue a job without waiting. Returns the job id.
    pub fn enqueue(&self, job: ReportJob) -> Result<Uuid, DispatchError> {
        let id = job.id;
        let kind = job.request.kind();
        let recipient_id = job.recipient_id;
        self.sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DispatchError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DispatchError::Closed,
        })?;
        tracing::debug!(job_id = %id, kind, recipient_id, "Report job queued");
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// DispatchWorker
// ---------------------------------------------------------------------------

/// Consumer side of the report queue.
pub struct DispatchWorker {
    receiver: mpsc::Receiver<ReportJob>,
    pool: DbPool,
    sink: Arc<dyn ReportSink>,
}

impl DispatchWorker {
    /// Process jobs one at a time until cancelled or every dispatcher handle
    /// is dropped.
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!("Report dispatcher started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Report dispatcher cancelled");
                    break;
                }
                job = self.receiver.recv() => {
                    let Some(job) = job else {
                        tracing::info!("Report queue closed");
                        break;
                    };
                    self.process(job).await;
                }
            }
        }
    }

    async fn process(&self, job: ReportJob) {
        match self.deliver(&job).await {
            Ok(rows) => tracing::info!(
                job_id = %job.id,
                kind = job.request.kind(),
                recipient_id = job.recipient_id,
                rows,
                "Report delivered",
            ),
            Err(e) => tracing::error!(
                job_id = %job.id,
                kind = job.request.kind(),
                recipient_id = job.recipient_id,
                error = %e,
                "Report delivery failed",
            ),
        }
    }

    async fn deliver(&self, job: &ReportJob) -> Result<usize, DispatchError> {
        let recipient = {
            let mut conn = self.pool.acquire().await?;
            UserRepo::find_by_id(&mut *conn, job.recipient_id)
                .await?
                .ok_or(DispatchError::RecipientNotFound(job.recipient_id))?
        };
        let dataset = SnapshotLoader::load(&self.pool, job.request.scope()).await?;
        let (email, rows) = compose_email(&dataset, job, &recipient.email)?;
        self.sink.send(&email).await?;
        Ok(rows)
    }
}

/// Compute and render a job against a loaded snapshot.
///
/// Returns the email and the number of report rows it carries.
pub fn compose_email(
    dataset: &Dataset,
    job: &ReportJob,
    to: &str,
) -> Result<(ReportEmail, usize), CoreError> {
    let report = compute_report(dataset, &job.request)?;
    let email = ReportEmail {
        to: to.to_owned(),
        subject: job.subject.clone(),
        html: render_html(&job.subject, &report),
    };
    Ok((email, report.row_count()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

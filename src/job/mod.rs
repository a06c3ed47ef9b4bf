//! Per-operation job controller.
//!
//! A [`Job`] owns the lifecycle a caller observes for one submission:
//!
//! ```text
//! Idle -> Validating -> Uploading -> ServerProcessing -> Succeeded
//!                   \-> Failed                       \-> Failed
//! ```
//!
//! plus a `reset` transition from either terminal phase back to `Idle`.
//! `Validating` is synchronous and makes no network call on failure.
//! `ServerProcessing` exists because server-side PDF work is usually slower
//! than the upload: the user must see "still working", not a stall at 99%.
//!
//! One in-flight request per instance; a second submission while one is
//! active is rejected with a usage error, not queued. Independent `Job`
//! instances share no mutable state and may run fully in parallel.

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, instrument};

use crate::request::OperationRequest;
use crate::transport::error::{ClientError, FailureKind};
use crate::transport::{AbortHandle, ApiClient, OperationSuccess, ProgressObserver};

/// Observable phase of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    /// No active request. The selection may be non-empty.
    Idle,
    /// Pre-flight checks running; no network activity yet.
    Validating,
    /// Bytes are leaving the client.
    Uploading,
    /// Every byte is sent; the server has not answered yet.
    ServerProcessing,
    /// Terminal: the outcome carries the artifact.
    Succeeded,
    /// Terminal: the outcome carries the failure.
    Failed,
}

impl JobPhase {
    /// Whether a new submission may start from this phase.
    #[must_use]
    pub fn accepts_submission(self) -> bool {
        matches!(self, Self::Idle | Self::Succeeded | Self::Failed)
    }
}

/// Immutable terminal result of one request. Exactly one exists per
/// completed submission.
#[derive(Debug, Clone)]
pub enum OperationOutcome {
    Success(OperationSuccess),
    Failure {
        kind: FailureKind,
        /// User-displayable message.
        message: String,
    },
}

impl OperationOutcome {
    fn from_error(error: &ClientError) -> Self {
        Self::Failure {
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    #[must_use]
    pub fn success(&self) -> Option<&OperationSuccess> {
        match self {
            Self::Success(success) => Some(success),
            Self::Failure { .. } => None,
        }
    }

    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }
}

/// Snapshot of a job's mutable state.
#[derive(Debug, Clone)]
pub struct JobState {
    pub phase: JobPhase,
    /// Monotonically non-decreasing within one request; 100 only once the
    /// response has fully arrived.
    pub progress_percent: u8,
    /// Present exactly when `phase` is terminal.
    pub outcome: Option<OperationOutcome>,
}

impl JobState {
    fn idle() -> Self {
        Self {
            phase: JobPhase::Idle,
            progress_percent: 0,
            outcome: None,
        }
    }
}

/// Misuse of the controller, distinct from operation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// A request is already in flight on this job.
    #[error("an operation is already in flight; abort it or wait for it to finish")]
    AlreadyInFlight,
}

struct JobInner {
    state: JobState,
    abort: Option<AbortHandle>,
}

/// Controller composing validation, transport, and outcome resolution into
/// the observable lifecycle for one operation at a time.
#[derive(Clone)]
pub struct Job {
    client: ApiClient,
    inner: Arc<Mutex<JobInner>>,
}

impl Job {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            inner: Arc::new(Mutex::new(JobInner {
                state: JobState::idle(),
                abort: None,
            })),
        }
    }

    /// Snapshot of the current state, for polling observers.
    ///
    /// # Panics
    ///
    /// Panics if a thread holding the state lock panicked.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn state(&self) -> JobState {
        self.inner.lock().unwrap().state.clone()
    }

    /// Submits one request and drives it to a terminal outcome.
    ///
    /// Validation runs synchronously first; on failure the job lands in
    /// `Failed` with a `validationFailed` outcome and no network call is
    /// made. Otherwise the transport runs the exchange, progress feeds the
    /// observable state, and the terminal outcome is both recorded and
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::AlreadyInFlight`] when called while a request
    /// is active. Operation failures are not `Err`: they terminate in the
    /// returned [`OperationOutcome`].
    #[instrument(level = "debug", skip_all, fields(kind = ?request.kind()))]
    #[allow(clippy::unwrap_used)]
    pub async fn submit(&self, request: OperationRequest) -> Result<OperationOutcome, SubmitError> {
        // Phase check and transition under one lock: two racing submissions
        // cannot both pass the guard.
        {
            let mut inner = self.inner.lock().unwrap();
            if !inner.state.phase.accepts_submission() {
                return Err(SubmitError::AlreadyInFlight);
            }
            inner.state = JobState {
                phase: JobPhase::Validating,
                progress_percent: 0,
                outcome: None,
            };
        }

        if let Err(error) = request.validate() {
            debug!(%error, "rejected before transport");
            return Ok(self.finish(OperationOutcome::from_error(&error), 0));
        }

        let token = {
            let mut inner = self.inner.lock().unwrap();
            let (handle, token) = AbortHandle::new();
            inner.abort = Some(handle);
            inner.state.phase = JobPhase::Uploading;
            token
        };

        let observer = Arc::new(StateObserver {
            inner: Arc::clone(&self.inner),
        });
        let result = self.client.send(&request, observer, token).await;

        let outcome = match result {
            Ok(success) => OperationOutcome::Success(success),
            Err(error) => OperationOutcome::from_error(&error),
        };
        let final_percent = if outcome.is_success() {
            100
        } else {
            self.state().progress_percent
        };
        Ok(self.finish(outcome, final_percent))
    }

    /// Requests cancellation of the in-flight exchange, if any. The job
    /// then terminates in `Failed` with kind `aborted`.
    ///
    /// # Panics
    ///
    /// Panics if a thread holding the state lock panicked.
    #[allow(clippy::unwrap_used)]
    pub fn abort(&self) {
        let inner = self.inner.lock().unwrap();
        if let Some(handle) = &inner.abort {
            handle.abort();
        }
    }

    /// Returns a terminal (or idle) job to `Idle`, clearing progress and
    /// outcome.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::AlreadyInFlight`] while a request is active;
    /// abort it first.
    #[allow(clippy::unwrap_used)]
    pub fn reset(&self) -> Result<(), SubmitError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.state.phase.accepts_submission() {
            return Err(SubmitError::AlreadyInFlight);
        }
        inner.state = JobState::idle();
        inner.abort = None;
        Ok(())
    }

    #[allow(clippy::unwrap_used)]
    fn finish(&self, outcome: OperationOutcome, progress_percent: u8) -> OperationOutcome {
        let mut inner = self.inner.lock().unwrap();
        inner.abort = None;
        inner.state.phase = if outcome.is_success() {
            JobPhase::Succeeded
        } else {
            JobPhase::Failed
        };
        inner.state.progress_percent = inner.state.progress_percent.max(progress_percent);
        inner.state.outcome = Some(outcome.clone());
        outcome
    }
}

/// Feeds transport progress into the job's observable state.
struct StateObserver {
    inner: Arc<Mutex<JobInner>>,
}

#[allow(clippy::unwrap_used)]
impl ProgressObserver for StateObserver {
    fn on_upload_progress(&self, percent: u8) {
        let mut inner = self.inner.lock().unwrap();
        // Monotonic regardless of delivery quirks.
        inner.state.progress_percent = inner.state.progress_percent.max(percent);
    }

    fn on_upload_complete(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.state.phase == JobPhase::Uploading {
            inner.state.phase = JobPhase::ServerProcessing;
        }
    }
}

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::client::InpaintClient;
use crate::error::Result;
use crate::types::{Job, JobOutcome, ResultImage, StatusResponse};

/// Anything that can answer "what is the status of job X".
///
/// Implemented by [`InpaintClient`]; tests plug in scripted sources.
pub trait StatusSource: Send + Sync + 'static {
    fn fetch_status(&self, job_id: &str) -> impl Future<Output = Result<StatusResponse>> + Send;
}

impl StatusSource for InpaintClient {
    async fn fetch_status(&self, job_id: &str) -> Result<StatusResponse> {
        self.status(job_id).await
    }
}

/// Observable state of a polled job.
///
/// Lifecycle: `Idle -> Polling -> Completed | Failed | Cancelled`.
/// Terminal states are never replaced.
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    Idle,
    Polling { job_id: String, attempts: u32 },
    Completed { job_id: String, images: Vec<ResultImage> },
    Failed { job_id: String, error: String },
    Cancelled { job_id: String },
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PollState::Completed { .. } | PollState::Failed { .. } | PollState::Cancelled { .. }
        )
    }

    pub fn job_id(&self) -> Option<&str> {
        match self {
            PollState::Idle => None,
            PollState::Polling { job_id, .. }
            | PollState::Completed { job_id, .. }
            | PollState::Failed { job_id, .. }
            | PollState::Cancelled { job_id } => Some(job_id),
        }
    }

    /// The terminal outcome, or `None` while idle or polling.
    pub fn outcome(&self) -> Option<JobOutcome> {
        match self {
            PollState::Completed { images, .. } => Some(JobOutcome::Completed {
                images: images.clone(),
            }),
            PollState::Failed { error, .. } => Some(JobOutcome::Failed {
                error: error.clone(),
            }),
            PollState::Cancelled { .. } => Some(JobOutcome::Cancelled),
            PollState::Idle | PollState::Polling { .. } => None,
        }
    }
}

/// Replace the state unless it is already terminal. Returns whether it changed.
fn publish(tx: &watch::Sender<PollState>, next: PollState) -> bool {
    tx.send_if_modified(|state| {
        if state.is_terminal() {
            false
        } else {
            *state = next;
            true
        }
    })
}

/// Polls a job's status at a fixed interval until it completes or fails.
///
/// Each tick sleeps for the interval, issues one status query, and waits
/// for its answer before scheduling the next, so two answers for the same
/// job never race. Failed queries are logged and retried on the next tick.
/// There is no backoff, retry limit, or timeout.
pub struct JobPoller<S> {
    source: Arc<S>,
    interval: Duration,
}

impl<S: StatusSource> JobPoller<S> {
    pub fn new(source: Arc<S>, interval: Duration) -> Self {
        Self { source, interval }
    }

    /// Start polling `job_id` on the current tokio runtime.
    ///
    /// The first query is issued one interval after this call.
    pub fn spawn(&self, job_id: impl Into<String>) -> PollHandle {
        let job_id = job_id.into();
        let (tx, rx) = watch::channel(PollState::Polling {
            job_id: job_id.clone(),
            attempts: 0,
        });
        let tx = Arc::new(tx);

        let task = tokio::spawn(run(
            Arc::clone(&self.source),
            job_id.clone(),
            self.interval,
            Arc::clone(&tx),
        ));
        log::debug!("Polling job {} every {:?}", job_id, self.interval);

        PollHandle {
            job_id,
            state: rx,
            state_tx: tx,
            task: Some(task),
        }
    }
}

async fn run<S: StatusSource>(
    source: Arc<S>,
    job_id: String,
    interval: Duration,
    tx: Arc<watch::Sender<PollState>>,
) {
    let mut job = Job::new(job_id.clone());
    let mut attempts: u32 = 0;

    loop {
        tokio::time::sleep(interval).await;
        attempts += 1;

        match source.fetch_status(&job_id).await {
            Ok(response) => {
                log::debug!("Job {} poll #{}: {}", job_id, attempts, response.status);
                if job.apply(response) {
                    let next = match job.outcome() {
                        Some(JobOutcome::Completed { images }) => {
                            log::info!("Job {} completed with {} image(s)", job_id, images.len());
                            PollState::Completed {
                                job_id: job_id.clone(),
                                images,
                            }
                        }
                        Some(JobOutcome::Failed { error }) => {
                            log::warn!("Job {} failed: {}", job_id, error);
                            PollState::Failed {
                                job_id: job_id.clone(),
                                error,
                            }
                        }
                        Some(JobOutcome::Cancelled) | None => continue,
                    };
                    publish(&tx, next);
                    return;
                }
            }
            Err(e) => {
                log::warn!("Job {} poll #{} failed, retrying: {}", job_id, attempts, e);
            }
        }

        let still_polling = publish(
            &tx,
            PollState::Polling {
                job_id: job_id.clone(),
                attempts,
            },
        );
        if !still_polling {
            return;
        }
    }
}

/// Handle to a running poll.
///
/// Cancelling or dropping the handle stops the timer. Cancellation only
/// stops local polling; the job keeps running on the service.
pub struct PollHandle {
    job_id: String,
    state: watch::Receiver<PollState>,
    state_tx: Arc<watch::Sender<PollState>>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Current state snapshot.
    pub fn state(&self) -> PollState {
        self.state.borrow().clone()
    }

    /// A receiver that is notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.state.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.state.borrow().is_terminal()
    }

    /// Stop polling. Idempotent; a terminal state already reached is kept.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        let cancelled = publish(
            &self.state_tx,
            PollState::Cancelled {
                job_id: self.job_id.clone(),
            },
        );
        if cancelled {
            log::info!("Stopped polling job {}", self.job_id);
        }
    }

    /// Wait for a terminal state.
    pub async fn wait(&self) -> JobOutcome {
        let mut rx = self.state.clone();
        let outcome = match rx.wait_for(PollState::is_terminal).await {
            Ok(state) => state.outcome(),
            Err(_) => None,
        };
        outcome.unwrap_or(JobOutcome::Cancelled)
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

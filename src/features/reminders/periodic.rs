//! Periodic Task
//!
//! A cancellable unit of recurring work. The first tick fires one full period
//! after `start`, ticks never overlap, and cancellation interrupts the idle
//! wait between ticks immediately. A tick that is already running is allowed
//! to finish; cancellation only prevents the next one.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Bounded `stop` with abort fallback, self-join detection
//! - 1.0.0: Initial release

use log::{debug, warn};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

tokio::task_local! {
    /// Id of the periodic task whose tick is currently executing
    static CURRENT_TASK: TaskId;
}

/// Process-unique identifier of a periodic task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// What a tick wants the loop to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    /// Terminal: the loop exits without scheduling another tick
    Stop,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("{0} cannot join itself from inside its own tick")]
    SelfJoin(TaskId),
    #[error("{0} did not stop within {1:?} and was aborted")]
    JoinTimeout(TaskId, Duration),
}

/// Flips the stopped flag when the task's future is dropped, whether it
/// finished, panicked, or was aborted before its first poll.
struct StoppedGuard {
    id: TaskId,
    tx: watch::Sender<bool>,
}

impl Drop for StoppedGuard {
    fn drop(&mut self) {
        debug!("{} unwound", self.id);
        self.tx.send_replace(true);
    }
}

pub struct PeriodicTask {
    id: TaskId,
    period: Duration,
    token: CancellationToken,
    stopped: watch::Receiver<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PeriodicTask {
    /// Spawn a loop that awaits `work` once per `period`.
    ///
    /// `period` must be non-zero. Must be called from within a tokio runtime.
    pub fn start<F, Fut>(period: Duration, mut work: F) -> Self
    where
        F: FnMut(TaskId) -> Fut + Send + 'static,
        Fut: Future<Output = TickOutcome> + Send + 'static,
    {
        let id = TaskId::next();
        let token = CancellationToken::new();
        let (tx, stopped) = watch::channel(false);
        let guard = StoppedGuard { id, tx };

        let loop_token = token.clone();
        let body = async move {
            let _guard = guard;
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = loop_token.cancelled() => {
                        debug!("{id} cancelled while idle");
                        break;
                    }
                    _ = ticker.tick() => {}
                }

                if work(id).await == TickOutcome::Stop {
                    debug!("{id} stopped itself");
                    break;
                }
            }
        };

        let handle = tokio::spawn(CURRENT_TASK.scope(id, body));

        PeriodicTask {
            id,
            period,
            token,
            stopped,
            handle: Mutex::new(Some(handle)),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// True until the loop has fully unwound. Never blocks.
    pub fn is_running(&self) -> bool {
        !*self.stopped.borrow()
    }

    /// Request termination. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Wait until no further ticks can happen.
    ///
    /// Returns immediately for a task that already stopped. Calling this from
    /// inside the task's own tick would wait forever, so it is rejected.
    pub async fn join(&self) -> Result<(), TaskError> {
        if self.is_current() {
            return Err(TaskError::SelfJoin(self.id));
        }

        let mut stopped = self.stopped.clone();
        // A closed channel means the guard is gone, which also means stopped.
        let _ = stopped.wait_for(|stopped| *stopped).await;
        Ok(())
    }

    /// Cancel, then join with an upper bound. A tick that hangs past the bound
    /// is aborted so the task cannot outlive its registry entry.
    pub async fn stop(&self, limit: Duration) -> Result<(), TaskError> {
        self.cancel();
        match timeout(limit, self.join()).await {
            Ok(result) => result,
            Err(_) => {
                warn!("{} still busy after {:?}, aborting", self.id, limit);
                self.abort();
                Err(TaskError::JoinTimeout(self.id, limit))
            }
        }
    }

    fn abort(&self) {
        let handle = match self.handle.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            handle.abort();
        }
    }

    /// Whether the caller is running inside this task's tick
    pub fn is_current(&self) -> bool {
        CURRENT_TASK
            .try_with(|current| *current == self.id)
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for PeriodicTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeriodicTask")
            .field("id", &self.id)
            .field("period", &self.period)
            .field("running", &self.is_running())
            .finish()
    }
}

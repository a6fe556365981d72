//! Bounded-concurrency retrieval queue
//!
//! The queue hands a list of descriptors to a fixed number of worker loops. Workers
//! claim descriptors one at a time from a shared pending list, pass them to the
//! save collaborator and record the outcome. The run can be paused, resumed and
//! stopped from any task holding a clone of the queue.
//!
//! # Concurrency Model
//!
//! - All workers are futures joined on the task that awaits `start`
//! - The pending list and counters live behind one mutex that is never held across
//!   an `.await`; claiming is a single check-and-pop inside that mutex
//! - The run state lives in a watch channel so paused workers sleep until it changes

use crate::config::RetrievalConfig;
use crate::progress::{ProgressReporter, RetrievalProgress, RetrievalSummary};
use crate::resource::{ResourceDescriptor, RetrievalState};
use crate::retrieval::saver::ResourceSaver;
use futures::future::join_all;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::sync::watch;

/// Run state of a retrieval queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Workers claim and retrieve descriptors
    Running,

    /// Workers finish what they hold and then wait
    Paused,

    /// Workers exit; unclaimed descriptors were discarded
    Stopped,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        };
        write!(f, "{}", s)
    }
}

/// Point-in-time view of a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStatus {
    /// Descriptors not yet claimed
    pub pending_count: usize,

    /// Retrievals in flight
    pub active_count: usize,

    /// Descriptors saved
    pub completed_count: usize,

    /// Descriptors whose save failed
    pub failed_count: usize,

    /// Current run state
    pub run_state: RunState,
}

/// Outcome of a claim attempt
enum Claim {
    /// The worker now owns this descriptor
    Item(ResourceDescriptor),

    /// The queue is paused
    Wait,

    /// Nothing left to do, or the queue was stopped
    Done,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<ResourceDescriptor>,
    finished: Vec<ResourceDescriptor>,
    active: usize,
    completed: usize,
    failed: usize,
}

impl QueueState {
    /// Atomically checks the run state and takes the next pending descriptor
    ///
    /// An empty pending list ends the worker even while paused.
    fn claim(&mut self, run_state: RunState) -> Claim {
        match run_state {
            RunState::Stopped => Claim::Done,
            _ if self.pending.is_empty() => Claim::Done,
            RunState::Paused => Claim::Wait,
            RunState::Running => match self.pending.pop_front() {
                Some(item) => {
                    self.active += 1;
                    Claim::Item(item)
                }
                None => Claim::Done,
            },
        }
    }

    /// Records the outcome of a claimed descriptor
    fn finish(&mut self, mut item: ResourceDescriptor, saved: bool) -> ResourceDescriptor {
        self.active -= 1;
        if saved {
            item.state = RetrievalState::Downloaded;
            self.completed += 1;
        } else {
            item.state = RetrievalState::Failed;
            self.failed += 1;
        }
        self.finished.push(item.clone());
        item
    }

    fn progress(&self) -> RetrievalProgress {
        RetrievalProgress {
            completed: self.completed,
            failed: self.failed,
            remaining: self.pending.len(),
            active: self.active,
        }
    }
}

struct Inner {
    saver: Arc<dyn ResourceSaver>,
    config: RetrievalConfig,
    reporter: RwLock<Option<Arc<dyn ProgressReporter>>>,
    state: Mutex<QueueState>,
    run_state: watch::Sender<RunState>,
}

/// Retrieves descriptors with at most `max_concurrent` saves in flight
///
/// Cloning yields another handle to the same queue.
///
/// # Example
///
/// ```no_run
/// use lesson_harvest::config::RetrievalConfig;
/// use lesson_harvest::retrieval::{FileSaver, RetrievalQueue};
/// use lesson_harvest::ResourceDescriptor;
/// use std::sync::Arc;
///
/// # async fn example(items: Vec<ResourceDescriptor>) -> Result<(), Box<dyn std::error::Error>> {
/// let config = RetrievalConfig::default();
/// let saver = FileSaver::new(reqwest::Client::new(), config.output_dir.clone());
/// let queue = RetrievalQueue::new(Arc::new(saver), config);
///
/// let controls = queue.clone();
/// tokio::spawn(async move {
///     tokio::signal::ctrl_c().await.ok();
///     controls.stop();
/// });
///
/// let summary = queue.start(items).await;
/// println!("{} saved, {} failed", summary.completed, summary.failed);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RetrievalQueue {
    inner: Arc<Inner>,
}

impl RetrievalQueue {
    /// Creates an idle queue
    ///
    /// A `max_concurrent` of zero is treated as one worker.
    pub fn new(saver: Arc<dyn ResourceSaver>, config: RetrievalConfig) -> Self {
        let (run_state, _) = watch::channel(RunState::Running);

        Self {
            inner: Arc::new(Inner {
                saver,
                config,
                reporter: RwLock::new(None),
                state: Mutex::new(QueueState::default()),
                run_state,
            }),
        }
    }

    /// Installs a progress reporter and returns the queue
    pub fn with_reporter(self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.set_reporter(reporter);
        self
    }

    /// Installs or replaces the progress reporter
    pub fn set_reporter(&self, reporter: Arc<dyn ProgressReporter>) {
        let mut slot = self
            .inner
            .reporter
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(reporter);
    }

    /// Retrieves `items` and resolves once every worker has exited
    ///
    /// `items` should already be filtered to the wanted kinds. An empty list
    /// resolves immediately with zero counts. Only one run should be in progress
    /// per queue at a time.
    pub async fn start(&self, items: Vec<ResourceDescriptor>) -> RetrievalSummary {
        if items.is_empty() {
            tracing::warn!("Retrieval queue is empty");
            return RetrievalSummary::default();
        }

        let total = items.len();
        let workers = self.inner.config.max_concurrent.max(1);

        {
            let mut state = self.lock_state();
            state.completed = 0;
            state.failed = 0;
            state.pending.extend(items);
        }
        self.inner.run_state.send_replace(RunState::Running);

        tracing::info!(
            "Starting retrieval: {} items, max {} concurrent",
            total,
            workers
        );

        join_all((0..workers).map(|worker_id| self.run_worker(worker_id))).await;

        let summary = {
            let state = self.lock_state();
            RetrievalSummary {
                total,
                completed: state.completed,
                failed: state.failed,
            }
        };

        if let Some(reporter) = self.reporter() {
            reporter.on_complete(summary);
        }

        tracing::info!(
            "Retrieval complete: {} succeeded, {} failed",
            summary.completed,
            summary.failed
        );

        summary
    }

    /// Stops workers from claiming new descriptors until `resume`
    ///
    /// Saves already in flight run to completion. Has no effect on a stopped queue.
    pub fn pause(&self) {
        let changed = self.inner.run_state.send_if_modified(|state| {
            if *state == RunState::Running {
                *state = RunState::Paused;
                true
            } else {
                false
            }
        });

        if changed {
            tracing::info!("Retrieval paused");
        }
    }

    /// Lets paused workers continue
    pub fn resume(&self) {
        let changed = self.inner.run_state.send_if_modified(|state| {
            if *state == RunState::Paused {
                *state = RunState::Running;
                true
            } else {
                false
            }
        });

        if changed {
            tracing::info!("Retrieval resumed");
        }
    }

    /// Discards every unclaimed descriptor and makes all workers exit
    ///
    /// Saves already in flight finish and are counted; nothing else is attempted.
    pub fn stop(&self) {
        let discarded = {
            let mut state = self.lock_state();
            let discarded = state.pending.len();
            state.pending.clear();
            discarded
        };
        self.inner.run_state.send_replace(RunState::Stopped);

        tracing::info!("Retrieval stopped, {} items discarded", discarded);
    }

    /// Clears pending items, finished items and counters for reuse
    pub fn reset(&self) {
        *self.lock_state() = QueueState::default();
        self.inner.run_state.send_replace(RunState::Running);
        tracing::debug!("Retrieval queue reset");
    }

    /// Returns the current counts and run state
    pub fn status(&self) -> QueueStatus {
        let state = self.lock_state();
        QueueStatus {
            pending_count: state.pending.len(),
            active_count: state.active,
            completed_count: state.completed,
            failed_count: state.failed,
            run_state: *self.inner.run_state.borrow(),
        }
    }

    /// Returns copies of every descriptor that reached a final state, in completion order
    pub fn finished_items(&self) -> Vec<ResourceDescriptor> {
        self.lock_state().finished.clone()
    }

    /// One worker loop: claim, save, record, pace
    async fn run_worker(&self, worker_id: usize) {
        let mut run_state = self.inner.run_state.subscribe();

        loop {
            let claim = {
                let mut state = self.lock_state();
                let current = *self.inner.run_state.borrow();
                state.claim(current)
            };

            let item = match claim {
                Claim::Item(item) => item,
                Claim::Done => break,
                Claim::Wait => {
                    tracing::trace!("Worker {} waiting while paused", worker_id);
                    if !wait_until(&mut run_state, |s| *s != RunState::Paused).await {
                        break;
                    }
                    continue;
                }
            };

            let file_name = item.file_name();
            tracing::debug!("Worker {} retrieving {}", worker_id, file_name);
            let result = self.inner.saver.save(&item.source_url, &file_name).await;

            let (item, progress) = {
                let mut state = self.lock_state();
                let item = state.finish(item, result.is_ok());
                (item, state.progress())
            };

            match &result {
                Ok(()) => tracing::debug!("Downloaded: {}", file_name),
                Err(e) => tracing::error!("Failed to download {}: {}", file_name, e),
            }

            if let Some(reporter) = self.reporter() {
                reporter.on_item_complete(&item, result.as_ref().err());
                reporter.on_progress(progress);
            }

            if progress.remaining > 0 {
                self.pause_between_downloads(&mut run_state).await;
            }
        }

        tracing::trace!("Worker {} exiting", worker_id);
    }

    /// Sleeps the configured delay, returning early if the queue is stopped
    async fn pause_between_downloads(&self, run_state: &mut watch::Receiver<RunState>) {
        let delay = self.inner.config.download_delay();
        if delay.is_zero() {
            return;
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = wait_until(run_state, |s| *s == RunState::Stopped) => {}
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, QueueState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn reporter(&self) -> Option<Arc<dyn ProgressReporter>> {
        self.inner
            .reporter
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Waits until the run state satisfies `predicate`; false if the queue was dropped
async fn wait_until(
    run_state: &mut watch::Receiver<RunState>,
    predicate: impl FnMut(&RunState) -> bool,
) -> bool {
    run_state.wait_for(predicate).await.is_ok()
}

//! Job orchestrator
//!
//! Each submission gets a record in the store and one background task that
//! runs the analyzer. Per job id the status moves
//! `queued -> running -> {done | error | stopped}`.
//!
//! The registry and the record store are locked independently. A run
//! decides whether it may still write by reading its handle's cancel reason
//! while holding the store lock, so a superseded or removed run never
//! touches the record again.

use crate::config::HttpConfig;
use crate::crawler::{AnalyzeError, PageAnalyzer};
use crate::jobs::registry::{CancelReason, CancellationHandle, JobRegistry};
use crate::jobs::{JobError, JobResult};
use crate::model::{AnalysisRecord, JobStatus};
use crate::storage::RecordStore;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use uuid::Uuid;

const EVENT_CAPACITY: usize = 256;

/// Observable job lifecycle events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    /// A new status was persisted for the job
    StatusChanged { id: String, status: JobStatus },

    /// A background run has unwound and released its registration
    RunFinished { id: String },
}

impl JobEvent {
    pub fn id(&self) -> &str {
        match self {
            Self::StatusChanged { id, .. } | Self::RunFinished { id } => id,
        }
    }
}

/// Spawns analyses and owns their status transitions
///
/// `submit` and `resubmit` spawn onto the current Tokio runtime and must be
/// called from within one.
pub struct Orchestrator<S> {
    store: Arc<Mutex<S>>,
    registry: Arc<JobRegistry>,
    analyzer: Arc<PageAnalyzer>,
    events: broadcast::Sender<JobEvent>,
}

impl<S> Clone for Orchestrator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            registry: Arc::clone(&self.registry),
            analyzer: Arc::clone(&self.analyzer),
            events: self.events.clone(),
        }
    }
}

impl<S> Orchestrator<S>
where
    S: RecordStore + Send + 'static,
{
    pub fn new(store: S, analyzer: PageAnalyzer) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store: Arc::new(Mutex::new(store)),
            registry: Arc::new(JobRegistry::new()),
            analyzer: Arc::new(analyzer),
            events,
        }
    }

    /// Builds the analyzer's HTTP client from configuration
    pub fn from_config(store: S, config: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(store, PageAnalyzer::new(config)?))
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Receives every event emitted after this call
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }

    pub fn get(&self, id: &str) -> JobResult<Option<AnalysisRecord>> {
        Ok(self.store().get(id)?)
    }

    pub fn list(&self) -> JobResult<Vec<AnalysisRecord>> {
        Ok(self.store().get_all()?)
    }

    /// Accepts `url` for analysis and returns the queued record immediately
    ///
    /// Only an empty URL is rejected; anything else is accepted and a bad URL
    /// surfaces later as a record with status `error`.
    pub fn submit(&self, url: &str) -> JobResult<AnalysisRecord> {
        let url = url.trim();
        if url.is_empty() {
            return Err(JobError::InvalidUrl(url.to_string()));
        }

        let id = Uuid::new_v4().to_string();
        let record = AnalysisRecord::queued(id.as_str(), url);

        {
            let mut store = self.store();
            store.save(&record)?;
            self.emit_status(&id, JobStatus::Queued);
        }

        let handle = self.registry.register(&id)?;
        tracing::info!("Queued job {} for {}", id, url);

        self.spawn_run(id, url.to_string(), handle);
        Ok(record)
    }

    /// Starts a fresh run for an existing job, reusing its id and URL
    ///
    /// Any run still in flight is cancelled first and its result discarded.
    pub fn resubmit(&self, id: &str) -> JobResult<AnalysisRecord> {
        let existing = self
            .store()
            .get(id)?
            .ok_or_else(|| JobError::NotFound(id.to_string()))?;

        if self.registry.cancel(id, CancelReason::Superseded) {
            tracing::info!("Cancelled in-flight run of job {} before resubmitting", id);
        }
        self.registry.remove(id);

        let handle = self.registry.register(id)?;
        let record = AnalysisRecord::queued(id, existing.url.as_str());

        let updated = {
            let mut store = self.store();
            let updated = store.update(id, &record);
            if matches!(updated, Ok(true)) {
                self.emit_status(id, JobStatus::Queued);
            }
            updated
        };

        match updated {
            Ok(true) => {}
            Ok(false) => {
                // Deleted between the lookup and the write
                self.registry.release(id, &handle);
                return Err(JobError::NotFound(id.to_string()));
            }
            Err(e) => {
                self.registry.release(id, &handle);
                return Err(e.into());
            }
        }

        tracing::info!("Requeued job {} for {}", id, existing.url);
        self.spawn_run(id.to_string(), existing.url, handle);
        Ok(record)
    }

    /// Stops the in-flight run of `id` and marks its record `stopped`
    ///
    /// Returns without waiting for the analyzer to unwind; the run later
    /// writes whatever it had counted, still as `stopped`.
    ///
    /// # Errors
    ///
    /// * `JobError::NotRunning` - the job exists but has no run in flight
    /// * `JobError::NotFound` - no such job
    pub fn stop(&self, id: &str) -> JobResult<()> {
        let Some(handle) = self.registry.signal(id, CancelReason::Stopped) else {
            return match self.store().get(id)? {
                Some(_) => Err(JobError::NotRunning(id.to_string())),
                None => Err(JobError::NotFound(id.to_string())),
            };
        };

        let marked = self.mark_stopped(id);
        self.registry.release(id, &handle);
        tracing::info!("Stopped job {}", id);
        marked
    }

    /// Cancels any run of `id` and deletes its record
    ///
    /// Returns false if there was no record to delete.
    pub fn remove(&self, id: &str) -> JobResult<bool> {
        if self.registry.cancel(id, CancelReason::Removed) {
            tracing::info!("Cancelled in-flight run of job {} before removal", id);
        }
        self.registry.remove(id);

        let deleted = self.store().delete(id)?;
        if deleted {
            tracing::info!("Removed job {}", id);
        }
        Ok(deleted)
    }

    fn store(&self) -> MutexGuard<'_, S> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit_status(&self, id: &str, status: JobStatus) {
        // No subscribers is fine
        let _ = self.events.send(JobEvent::StatusChanged {
            id: id.to_string(),
            status,
        });
    }

    fn mark_stopped(&self, id: &str) -> JobResult<()> {
        let mut store = self.store();
        let Some(mut record) = store.get(id)? else {
            return Ok(());
        };

        if record.status.is_terminal() {
            return Ok(());
        }

        record.status = JobStatus::Stopped;
        if store.update(id, &record)? {
            self.emit_status(id, JobStatus::Stopped);
        }
        Ok(())
    }

    fn spawn_run(&self, id: String, url: String, handle: CancellationHandle) {
        let orchestrator = self.clone();
        tokio::spawn(async move {
            orchestrator.run(id, url, handle).await;
        });
    }

    async fn run(&self, id: String, url: String, handle: CancellationHandle) {
        if self.begin(&id, &handle) {
            let result = self.analyzer.analyze(&url, handle.token()).await;
            self.finish(&id, &url, &handle, result);
        }

        self.registry.release(&id, &handle);
        let _ = self.events.send(JobEvent::RunFinished { id });
    }

    /// queued -> running; false if the run was cancelled before starting
    fn begin(&self, id: &str, handle: &CancellationHandle) -> bool {
        let mut store = self.store();
        if handle.is_cancelled() {
            tracing::debug!("Job {} cancelled before it started", id);
            return false;
        }

        let mut record = match store.get(id) {
            Ok(Some(record)) => record,
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!("Could not load job {} to start it: {}", id, e);
                return false;
            }
        };

        record.status = JobStatus::Running;
        match store.update(id, &record) {
            Ok(true) => {
                self.emit_status(id, JobStatus::Running);
                tracing::info!("Job {} running", id);
                true
            }
            Ok(false) => false,
            Err(e) => {
                tracing::warn!("Could not mark job {} running: {}", id, e);
                false
            }
        }
    }

    /// Persists the run's terminal record, unless the run lost ownership
    fn finish(
        &self,
        id: &str,
        url: &str,
        handle: &CancellationHandle,
        result: Result<AnalysisRecord, AnalyzeError>,
    ) {
        let mut store = self.store();

        if let Some(reason @ (CancelReason::Superseded | CancelReason::Removed)) = handle.reason() {
            tracing::debug!("Discarding result for job {} ({:?})", id, reason);
            return;
        }

        // Stopped and released, then resubmitted
        if self.registry.held_by_other(id, handle) {
            tracing::debug!("Discarding result for job {}, a newer run owns it", id);
            return;
        }

        let record = settle(id, url, handle, result);

        let previous = match store.get(id) {
            Ok(Some(existing)) => existing.status,
            Ok(None) => {
                tracing::debug!("Job {} has no record left to update", id);
                return;
            }
            Err(e) => {
                tracing::warn!("Could not load job {} to finish it: {}", id, e);
                return;
            }
        };

        if previous.is_terminal() && previous != record.status {
            tracing::warn!(
                "Job {} already {}, not overwriting with {}",
                id,
                previous,
                record.status
            );
            return;
        }

        match store.update(id, &record) {
            Ok(true) => {
                if previous != record.status {
                    self.emit_status(id, record.status);
                }
                tracing::info!("Job {} finished: {}", id, record.status);
            }
            Ok(false) => tracing::debug!("Job {} was deleted before it finished", id),
            Err(e) => tracing::warn!("Failed to persist result for job {}: {}", id, e),
        }
    }
}

/// Final record for a run
///
/// Cancellation is checked first: a run whose handle fired ends `stopped`
/// whether the analyzer returned a partial result or an error. Any other
/// failure is `error`.
fn settle(
    id: &str,
    url: &str,
    handle: &CancellationHandle,
    result: Result<AnalysisRecord, AnalyzeError>,
) -> AnalysisRecord {
    let cancelled = handle.is_cancelled();

    match result {
        Ok(mut record) => {
            record.id = id.to_string();
            record.status = if cancelled {
                JobStatus::Stopped
            } else {
                JobStatus::Done
            };
            record
        }
        Err(e) => {
            let status = if cancelled || e.is_cancelled() {
                JobStatus::Stopped
            } else {
                JobStatus::Error
            };
            tracing::warn!("Job {} ended {}: {}", id, status, e);
            AnalysisRecord::new(id, url, status)
        }
    }
}

//! Job registry
//!
//! Maps a job id to the cancellation handle of its in-flight run. All
//! mutations happen under one lock, and each registration can be cancelled
//! at most once.

use crate::jobs::JobError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use tokio_util::sync::CancellationToken;

/// Why a run was asked to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelReason {
    /// An explicit stop request; the run keeps its partial result
    Stopped,
    /// A resubmission started a new run for the same id
    Superseded,
    /// The job and its record are being deleted
    Removed,
}

/// Cancellation signal for one registration of a job id
#[derive(Debug, Clone)]
pub struct CancellationHandle {
    registration: u64,
    token: CancellationToken,
    reason: Arc<OnceLock<CancelReason>>,
}

impl CancellationHandle {
    fn new(registration: u64) -> Self {
        Self {
            registration,
            token: CancellationToken::new(),
            reason: Arc::new(OnceLock::new()),
        }
    }

    /// Token observed by the fetch and the probe loop
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The reason given by whoever cancelled this registration first
    pub fn reason(&self) -> Option<CancelReason> {
        self.reason.get().copied()
    }

    /// Returns true if this call delivered the signal
    fn cancel(&self, reason: CancelReason) -> bool {
        if self.reason.set(reason).is_err() {
            return false;
        }
        self.token.cancel();
        true
    }

    fn same_registration(&self, other: &CancellationHandle) -> bool {
        self.registration == other.registration
    }
}

/// Lock-protected map of job id -> cancellation handle
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<String, CancellationHandle>>,
    next_registration: AtomicU64,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn jobs(&self) -> MutexGuard<'_, HashMap<String, CancellationHandle>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates and stores a fresh handle for `id`
    ///
    /// # Errors
    ///
    /// `JobError::AlreadyRegistered` if a handle for `id` already exists;
    /// callers must cancel and remove it first.
    pub fn register(&self, id: &str) -> Result<CancellationHandle, JobError> {
        let mut jobs = self.jobs();
        if jobs.contains_key(id) {
            return Err(JobError::AlreadyRegistered(id.to_string()));
        }

        let registration = self.next_registration.fetch_add(1, Ordering::Relaxed);
        let handle = CancellationHandle::new(registration);
        jobs.insert(id.to_string(), handle.clone());
        Ok(handle)
    }

    /// Signals cancellation for `id` if it is registered
    ///
    /// Returns whether a job was found, even if it had already been
    /// cancelled.
    pub fn cancel(&self, id: &str, reason: CancelReason) -> bool {
        let jobs = self.jobs();
        match jobs.get(id) {
            Some(handle) => {
                handle.cancel(reason);
                true
            }
            None => false,
        }
    }

    /// Signals cancellation and returns the handle, but only if this call
    /// was the one that delivered the signal
    pub fn signal(&self, id: &str, reason: CancelReason) -> Option<CancellationHandle> {
        let jobs = self.jobs();
        let handle = jobs.get(id)?;
        handle.cancel(reason).then(|| handle.clone())
    }

    /// Deletes the handle for `id`; removing an absent id is a no-op
    pub fn remove(&self, id: &str) {
        self.jobs().remove(id);
    }

    /// Deletes the handle for `id` only if it is still `handle`'s registration
    ///
    /// Returns true if the entry was removed.
    pub fn release(&self, id: &str, handle: &CancellationHandle) -> bool {
        let mut jobs = self.jobs();
        match jobs.get(id) {
            Some(current) if current.same_registration(handle) => {
                jobs.remove(id);
                true
            }
            _ => false,
        }
    }

    /// True if `id` is registered to a run other than `handle`'s
    pub fn held_by_other(&self, id: &str, handle: &CancellationHandle) -> bool {
        matches!(self.jobs().get(id), Some(current) if !current.same_registration(handle))
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.jobs().contains_key(id)
    }

    /// Number of runs currently in flight
    pub fn len(&self) -> usize {
        self.jobs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs().is_empty()
    }
}

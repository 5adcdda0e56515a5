//! The job table: a small, fixed-capacity registry of child processes.
//!
//! Job numbers are kept dense: deleting a job shifts every later job one
//! slot earlier and renumbers it, so live jobs are always numbered
//! `0..len` in slot order (shown to the user as `1..=len`).

use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;

use nsh_types::{JobInfo, JobNumber, JobState};

/// Default number of concurrent jobs.
pub const DEFAULT_MAX_JOBS: usize = 5;

/// The job table as shared between the main flow and the signal watcher.
pub type SharedJobTable = Arc<Mutex<JobTable>>;

/// Errors from job table operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobTableError {
    #[error("invalid pid {0}")]
    InvalidPid(i32),

    /// Another job already holds the foreground. The shell only runs one
    /// foreground job at a time, so this always points at a logic error.
    #[error("a foreground job already exists (pid {0})")]
    ForegroundOccupied(i32),

    #[error("job table full ({0} jobs max)")]
    Full(usize),

    #[error("no job with pid {0}")]
    NoSuchJob(i32),
}

/// Fixed-capacity job registry.
#[derive(Debug, Clone)]
pub struct JobTable {
    capacity: usize,
    slots: Vec<JobInfo>,
}

impl JobTable {
    /// Create a table holding at most [`DEFAULT_MAX_JOBS`] jobs.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_JOBS)
    }

    /// Create a table holding at most `capacity` jobs (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            slots: Vec::with_capacity(capacity),
        }
    }

    /// Wrap a new table for sharing with the signal watcher.
    pub fn shared(capacity: usize) -> SharedJobTable {
        Arc::new(Mutex::new(Self::with_capacity(capacity)))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live jobs.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    /// Register a job in the first free slot and return its number.
    ///
    /// Fails for a pid below 1, when `state` is `Foreground` and a foreground
    /// job already exists, or when no slot is free.
    pub fn insert(
        &mut self,
        pid: i32,
        state: JobState,
        command: impl Into<String>,
    ) -> Result<JobNumber, JobTableError> {
        if pid < 1 {
            return Err(JobTableError::InvalidPid(pid));
        }
        if state == JobState::Foreground {
            if let Some(fg) = self.foreground() {
                return Err(JobTableError::ForegroundOccupied(fg.pid));
            }
        }
        if self.is_full() {
            return Err(JobTableError::Full(self.capacity));
        }

        let number = JobNumber(self.slots.len());
        self.slots.push(JobInfo {
            number,
            pid,
            state,
            command: command.into(),
        });
        tracing::trace!(%number, pid, %state, "job registered");
        Ok(number)
    }

    /// Remove every job with this pid, then compact.
    ///
    /// Returns how many jobs were removed; a pid that is not present leaves
    /// the table untouched.
    pub fn delete(&mut self, pid: i32) -> usize {
        let before = self.slots.len();
        self.slots.retain(|job| job.pid != pid);
        let removed = before - self.slots.len();

        if removed > 0 {
            // Slots shifted down; bring every number back in line with its slot.
            for (slot, job) in self.slots.iter_mut().enumerate() {
                job.number = JobNumber(slot);
            }
            tracing::trace!(pid, removed, live = self.slots.len(), "job deleted");
        }
        removed
    }

    /// Look a job up by its internal (zero-based) number.
    pub fn find_by_number(&self, number: JobNumber) -> Option<&JobInfo> {
        self.slots.iter().find(|job| job.number == number)
    }

    pub fn find_by_pid(&self, pid: i32) -> Option<&JobInfo> {
        self.slots.iter().find(|job| job.pid == pid)
    }

    /// Live jobs in slot order, which is also job-number order.
    pub fn list(&self) -> &[JobInfo] {
        &self.slots
    }

    pub fn has_foreground(&self) -> bool {
        self.foreground().is_some()
    }

    /// The foreground job, if any.
    pub fn foreground(&self) -> Option<&JobInfo> {
        self.slots
            .iter()
            .find(|job| job.state == JobState::Foreground)
    }

    /// Change a job's state.
    ///
    /// Moving a job into the foreground fails if a different job is already
    /// there.
    pub fn set_state(&mut self, pid: i32, state: JobState) -> Result<(), JobTableError> {
        if state == JobState::Foreground {
            if let Some(fg) = self.foreground() {
                if fg.pid != pid {
                    return Err(JobTableError::ForegroundOccupied(fg.pid));
                }
            }
        }

        let job = self
            .slots
            .iter_mut()
            .find(|job| job.pid == pid)
            .ok_or(JobTableError::NoSuchJob(pid))?;
        job.state = state;
        Ok(())
    }
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Lock the shared table.
///
/// A poisoned lock is recovered: every table operation leaves the table
/// consistent before it can panic, so the data is still valid.
pub fn lock_table(table: &Mutex<JobTable>) -> MutexGuard<'_, JobTable> {
    table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

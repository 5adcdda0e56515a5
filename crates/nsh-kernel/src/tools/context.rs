//! Execution context handed to built-ins.

use std::sync::MutexGuard;

use nix::sys::signal::Signal;
use nix::unistd::Pid;

use nsh_types::{ExecResult, JobInfo, JobState};

use crate::scheduler::{
    lock_table, signal_job, ChildEvents, ChildStatus, JobTable, SharedJobTable,
};
use crate::terminal::TerminalState;

use super::traits::BuiltinSchema;

/// Session state shared by the shell's main flow and its built-ins.
#[derive(Debug)]
pub struct ExecContext {
    /// The job table, shared with the signal relay.
    pub jobs: SharedJobTable,
    /// This session's subscription to child state changes.
    pub events: ChildEvents,
    /// Terminal hand-off, when interactive.
    pub terminal: Option<TerminalState>,
    /// Schemas of the registered built-ins, for `help`.
    pub builtin_schemas: Vec<BuiltinSchema>,
    /// Apply child events for background jobs to the table.
    pub reap_background: bool,
    notices: Vec<String>,
}

impl ExecContext {
    pub fn new(jobs: SharedJobTable, events: ChildEvents) -> Self {
        Self {
            jobs,
            events,
            terminal: None,
            builtin_schemas: Vec::new(),
            reap_background: true,
            notices: Vec::new(),
        }
    }

    /// Lock the job table for one operation.
    pub fn lock_jobs(&self) -> MutexGuard<'_, JobTable> {
        lock_table(&self.jobs)
    }

    /// Apply child events that arrived since the last call.
    ///
    /// Exited background jobs are removed, and stopped ones marked
    /// `Stopped`, each with a notice. With `reap_background` off the events
    /// are discarded and the table keeps listing such jobs as they were.
    pub fn reconcile(&mut self) {
        let events = self.events.drain();
        if events.is_empty() {
            return;
        }
        if !self.reap_background {
            tracing::trace!(count = events.len(), "discarding child events");
            return;
        }

        let mut jobs = lock_table(&self.jobs);
        for event in events {
            let Some(job) = jobs.find_by_pid(event.pid).cloned() else {
                tracing::trace!(pid = event.pid, status = ?event.status, "event for untracked child");
                continue;
            };
            match event.status {
                status if status.has_ended() => {
                    tracing::debug!(pid = job.pid, ?status, "background job finished");
                    jobs.delete(job.pid);
                    self.notices.push(format!("{} Done {}", job.tag(), job.command));
                }
                _ if job.state.is_stopped() => {}
                _ => {
                    tracing::debug!(pid = job.pid, "background job stopped");
                    let _ = jobs.set_state(job.pid, JobState::Stopped);
                    self.notices.push(format!("{} Stopped {}", job.tag(), job.command));
                }
            }
        }
    }

    /// Notices queued for display before the next prompt.
    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    /// Wait on `job` as the foreground job until it exits or stops.
    ///
    /// The job must already be marked `Foreground`. With `resume`, it is
    /// sent SIGCONT first (after receiving the terminal, so it never runs in
    /// the background by mistake).
    pub async fn run_foreground(&mut self, job: &JobInfo, resume: bool) -> ExecResult {
        let pid = job.pid;

        if let Some(term) = &self.terminal {
            if let Err(e) = term.give_terminal_to(Pid::from_raw(pid)) {
                tracing::warn!(pid, error = %e, "failed to give terminal to job");
            }
        }
        if resume {
            self.events.discard_stops(pid);
            if let Err(e) = signal_job(pid, Signal::SIGCONT) {
                self.reclaim_terminal();
                return ExecResult::failure(1, format!("{}: failed to continue: {}", job.tag(), e));
            }
        }

        let status = self.events.wait_for(pid).await;
        self.reclaim_terminal();

        match status {
            Ok(status @ ChildStatus::Stopped(_)) => {
                let mut jobs = self.lock_jobs();
                // Absent if the relay interrupted it first.
                let _ = jobs.set_state(pid, JobState::Stopped);
                let notice = match jobs.find_by_pid(pid) {
                    Some(job) => format!("{} Stopped {}", job.tag(), job.command),
                    None => String::new(),
                };
                ExecResult::from_output(status.exit_code(), "", notice)
            }
            Ok(status) => {
                self.lock_jobs().delete(pid);
                tracing::debug!(pid, ?status, "foreground job finished");
                let err = match status {
                    ChildStatus::Unknown => format!("{} exit status lost", job.tag()),
                    _ => String::new(),
                };
                ExecResult::from_output(status.exit_code(), "", err)
            }
            Err(e) => {
                tracing::error!(pid, error = %e, "foreground wait failed");
                ExecResult::failure(1, format!("{}: {}", job.tag(), e))
            }
        }
    }

    /// Take the terminal back from whatever group holds it, if interactive.
    pub(crate) fn reclaim_terminal(&self) {
        if let Some(term) = &self.terminal {
            if let Err(e) = term.reclaim_terminal() {
                tracing::warn!(error = %e, "failed to reclaim terminal");
            }
        }
    }
}

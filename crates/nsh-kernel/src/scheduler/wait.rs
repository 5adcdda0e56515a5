//! Waiting on child state changes.
//!
//! The signal watcher owns all reaping, so the shell never calls `waitpid`
//! itself. Instead it waits on the watcher's event stream for the one pid
//! it cares about, setting aside events for other children until the
//! shell gets around to reconciling them.

use std::collections::VecDeque;

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use super::relay::{ChildEvent, ChildStatus};

/// Errors from waiting on a child.
#[derive(Debug, Error)]
pub enum WaitError {
    #[error("child event stream closed")]
    Closed,
}

/// One shell's subscription to child events.
#[derive(Debug)]
pub struct ChildEvents {
    rx: broadcast::Receiver<ChildEvent>,
    pending: VecDeque<ChildEvent>,
}

impl ChildEvents {
    pub(crate) fn new(rx: broadcast::Receiver<ChildEvent>) -> Self {
        Self {
            rx,
            pending: VecDeque::new(),
        }
    }

    /// Block until `pid` exits, is killed, or stops.
    ///
    /// This is the shell's only blocking operation. It has no timeout: a
    /// foreground job that never changes state holds the shell until the
    /// user interrupts it.
    pub async fn wait_for(&mut self, pid: i32) -> Result<ChildStatus, WaitError> {
        if let Some(status) = self.take_pending(pid) {
            return Ok(status);
        }

        loop {
            match self.rx.recv().await {
                Ok(event) if event.pid == pid => return Ok(event.status),
                Ok(event) => self.pending.push_back(event),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, pid, "child event stream lagged");
                    if let Some(status) = self.recover_after_lag(pid) {
                        return Ok(status);
                    }
                }
                Err(RecvError::Closed) => return Err(WaitError::Closed),
            }
        }
    }

    /// Take every event received so far, without waiting.
    pub fn drain(&mut self) -> Vec<ChildEvent> {
        self.fill_pending();
        self.pending.drain(..).collect()
    }

    /// Forget stop events for `pid` that have not been consumed yet.
    ///
    /// Called before continuing a stopped job: any stop still queued for it
    /// predates the resume and must not end the next wait.
    pub fn discard_stops(&mut self, pid: i32) {
        self.fill_pending();
        self.pending
            .retain(|event| event.pid != pid || event.status.has_ended());
    }

    fn take_pending(&mut self, pid: i32) -> Option<ChildStatus> {
        let pos = self.pending.iter().position(|e| e.pid == pid)?;
        self.pending.remove(pos).map(|event| event.status)
    }

    fn fill_pending(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.pending.push_back(event),
                Err(TryRecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "child event stream lagged");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }

    /// The event for `pid` may have been among the dropped ones. Check what
    /// is still buffered, then the process itself. `None` means it is still
    /// running and the wait goes on.
    fn recover_after_lag(&mut self, pid: i32) -> Option<ChildStatus> {
        self.fill_pending();
        if let Some(status) = self.take_pending(pid) {
            return Some(status);
        }
        observed_status(pid)
    }
}

/// True while `pid` names a process (zombies included).
pub fn process_exists(pid: i32) -> bool {
    kill(Pid::from_raw(pid), None).is_ok()
}

/// What can still be learned about `pid` without its wait status.
fn observed_status(pid: i32) -> Option<ChildStatus> {
    if !process_exists(pid) {
        return Some(ChildStatus::Unknown);
    }
    // /proc does not record which signal stopped the process; SIGSTOP is
    // what the relay sends.
    is_stopped(pid).then_some(ChildStatus::Stopped(Signal::SIGSTOP))
}

#[cfg(target_os = "linux")]
fn is_stopped(pid: i32) -> bool {
    match procfs::process::Process::new(pid).and_then(|p| p.stat()) {
        Ok(stat) => matches!(stat.state, 'T' | 't'),
        Err(e) => {
            tracing::debug!(pid, error = %e, "could not read process state");
            false
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn is_stopped(_pid: i32) -> bool {
    false
}

//! Signal relay: turns terminal and child-state signals into job table
//! updates and signals to job process groups.
//!
//! Signals are not handled in async-signal context. A single watcher thread
//! per process (the "hub") receives SIGINT, SIGTSTP and SIGCHLD through
//! `signal-hook` and acts on them from ordinary code:
//!
//! - **SIGINT**: every foreground job in every registered table gets SIGINT
//!   and is removed from its table.
//! - **SIGTSTP**: every foreground job gets SIGSTOP and is marked `Stopped`.
//! - **SIGCHLD**: children are reaped without blocking, and each state
//!   change is broadcast as a [`ChildEvent`]. The table itself is not
//!   touched here; the shell applies events on its own flow.
//!
//! Table access from the hub goes through the same mutex as the main flow,
//! so each relay action is one critical section against shell commands.

use std::sync::{Arc, Mutex, Weak};
use std::thread;

use nix::errno::Errno;
use nix::sys::signal::{kill, killpg, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use signal_hook::consts::signal::{SIGCHLD, SIGINT, SIGTSTP};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tokio::sync::broadcast;

use nsh_types::JobState;

use super::launcher::spawn_guard;
use super::table::{lock_table, JobTable, SharedJobTable};
use super::wait::ChildEvents;

/// Buffered child events per subscriber before it starts lagging.
const EVENT_CAPACITY: usize = 256;

/// Errors from starting the signal relay.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to register signal handlers: {0}")]
    Register(#[source] std::io::Error),

    #[error("failed to start signal watcher thread: {0}")]
    Thread(#[source] std::io::Error),
}

/// How a child changed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildStatus {
    /// Exited normally with this code.
    Exited(i32),
    /// Killed by a signal.
    Signaled(Signal),
    /// Stopped by a signal.
    Stopped(Signal),
    /// Gone, but its exit status was dropped before anyone saw it.
    Unknown,
}

impl ChildStatus {
    /// Shell exit code for this status: the exit code itself, or 128 plus
    /// the signal number. An unknown status never reads as success.
    pub fn exit_code(self) -> i64 {
        match self {
            ChildStatus::Exited(code) => i64::from(code),
            ChildStatus::Signaled(sig) | ChildStatus::Stopped(sig) => 128 + sig as i64,
            ChildStatus::Unknown => 1,
        }
    }

    /// True once the process is gone (exited or killed).
    pub fn has_ended(self) -> bool {
        !matches!(self, ChildStatus::Stopped(_))
    }
}

/// A state change of one child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildEvent {
    pub pid: i32,
    pub status: ChildStatus,
}

impl ChildEvent {
    fn from_wait_status(status: WaitStatus) -> Option<Self> {
        let (pid, status) = match status {
            WaitStatus::Exited(pid, code) => (pid, ChildStatus::Exited(code)),
            WaitStatus::Signaled(pid, sig, _) => (pid, ChildStatus::Signaled(sig)),
            WaitStatus::Stopped(pid, sig) => (pid, ChildStatus::Stopped(sig)),
            _ => return None,
        };
        Some(Self {
            pid: pid.as_raw(),
            status,
        })
    }
}

/// Per-shell handle on the relay.
///
/// Cloning is cheap. It carries only the shell's own job table, so the
/// keystroke actions can also be triggered directly (for example, from
/// tests) with exactly the effect a delivered signal has.
#[derive(Debug, Clone)]
pub struct SignalRelay {
    table: SharedJobTable,
}

impl SignalRelay {
    /// Register `table` with the process-wide watcher, starting it on first
    /// use, and subscribe to child events.
    ///
    /// The subscription starts now, so call this before launching anything
    /// tracked by `table`.
    pub fn install(table: &SharedJobTable) -> Result<(Self, ChildEvents), RelayError> {
        let hub = hub()?;
        let events = ChildEvents::new(hub.events.subscribe());
        hub.register(table);
        Ok((
            Self {
                table: table.clone(),
            },
            events,
        ))
    }

    /// Act as if the interrupt key was pressed. Returns the pids signaled.
    pub fn interrupt(&self) -> Vec<i32> {
        interrupt_foreground(&mut lock_table(&self.table))
    }

    /// Act as if the suspend key was pressed. Returns the pids signaled.
    pub fn suspend(&self) -> Vec<i32> {
        suspend_foreground(&mut lock_table(&self.table))
    }
}

/// Send SIGINT to every foreground job and drop it from the table.
pub fn interrupt_foreground(table: &mut JobTable) -> Vec<i32> {
    let pids = foreground_pids(table);
    for &pid in &pids {
        tracing::debug!(pid, "relaying interrupt to foreground job");
        let _ = signal_job(pid, Signal::SIGINT);
        table.delete(pid);
    }
    pids
}

/// Send SIGSTOP to every foreground job and mark it stopped.
pub fn suspend_foreground(table: &mut JobTable) -> Vec<i32> {
    let pids = foreground_pids(table);
    for &pid in &pids {
        tracing::debug!(pid, "relaying suspend to foreground job");
        let _ = signal_job(pid, Signal::SIGSTOP);
        // The pid came from this table under the same lock, so it is present.
        let _ = table.set_state(pid, JobState::Stopped);
    }
    pids
}

fn foreground_pids(table: &JobTable) -> Vec<i32> {
    table
        .list()
        .iter()
        .filter(|job| job.state == JobState::Foreground)
        .map(|job| job.pid)
        .collect()
}

/// Signal a job's whole process group, falling back to the leader alone
/// if the group is gone.
pub fn signal_job(pid: i32, signal: Signal) -> nix::Result<()> {
    let target = Pid::from_raw(pid);
    let result = killpg(target, signal).or_else(|_| kill(target, signal));
    if let Err(e) = result {
        tracing::warn!(pid, ?signal, error = %e, "signal delivery failed");
    }
    result
}

/// Reap every child that has changed state, without blocking.
fn reap_children(events: &broadcast::Sender<ChildEvent>) {
    // Keep out of the way of a spawn in progress; see `spawn_guard`.
    let _guard = spawn_guard();
    let flags = WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED;

    loop {
        match waitpid(Pid::from_raw(-1), Some(flags)) {
            Ok(WaitStatus::StillAlive) => break,
            Ok(status) => {
                if let Some(event) = ChildEvent::from_wait_status(status) {
                    tracing::debug!(pid = event.pid, status = ?event.status, "reaped child");
                    // No subscribers just means no shell is listening.
                    let _ = events.send(event);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) => break,
            Err(e) => {
                tracing::warn!(error = %e, "waitpid failed");
                break;
            }
        }
    }
}

/// The process-wide watcher state.
struct RelayHub {
    events: broadcast::Sender<ChildEvent>,
    tables: Mutex<Vec<Weak<Mutex<JobTable>>>>,
}

impl RelayHub {
    fn register(&self, table: &SharedJobTable) {
        let mut tables = self.tables.lock().unwrap_or_else(|p| p.into_inner());
        tables.retain(|t| t.strong_count() > 0);
        tables.push(Arc::downgrade(table));
    }

    fn live_tables(&self) -> Vec<SharedJobTable> {
        let mut tables = self.tables.lock().unwrap_or_else(|p| p.into_inner());
        tables.retain(|t| t.strong_count() > 0);
        tables.iter().filter_map(Weak::upgrade).collect()
    }

    fn dispatch(&self, signal: i32) {
        match signal {
            SIGINT => {
                for table in self.live_tables() {
                    interrupt_foreground(&mut lock_table(&table));
                }
            }
            SIGTSTP => {
                for table in self.live_tables() {
                    suspend_foreground(&mut lock_table(&table));
                }
            }
            SIGCHLD => reap_children(&self.events),
            other => tracing::trace!(signal = other, "ignoring unexpected signal"),
        }
    }
}

static HUB: Mutex<Option<Arc<RelayHub>>> = Mutex::new(None);

/// Get the hub, starting the watcher thread on first use.
fn hub() -> Result<Arc<RelayHub>, RelayError> {
    let mut slot = HUB.lock().unwrap_or_else(|p| p.into_inner());
    if let Some(hub) = slot.as_ref() {
        return Ok(hub.clone());
    }

    let mut signals = Signals::new([SIGINT, SIGTSTP, SIGCHLD]).map_err(RelayError::Register)?;
    let (events, _) = broadcast::channel(EVENT_CAPACITY);
    let hub = Arc::new(RelayHub {
        events,
        tables: Mutex::new(Vec::new()),
    });

    let watcher = hub.clone();
    thread::Builder::new()
        .name("nsh-signals".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                watcher.dispatch(signal);
            }
        })
        .map_err(RelayError::Thread)?;

    tracing::debug!("signal watcher started");
    *slot = Some(hub.clone());
    Ok(hub)
}

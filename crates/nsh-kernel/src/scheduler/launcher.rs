//! Process launcher: starts an external program as a new job.
//!
//! Everything that can fail without a process is checked first: capacity,
//! redirection files and program lookup. Only then is the child spawned, in
//! its own process group, and registered, all under the job table lock. A
//! relayed interrupt therefore never sees a child that is running but not
//! yet in the table.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::BorrowedFd;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Mutex, MutexGuard};

use nix::sys::signal::{SigSet, SigmaskHow, Signal};
use nix::unistd::{getpgrp, setpgid, tcsetpgrp, Pid};
use thiserror::Error;

use nsh_types::{JobInfo, JobState};

use super::relay::signal_job;
use super::table::{lock_table, JobTableError, SharedJobTable};
use crate::parser::CommandLine;

/// Held while spawning, and by the reaper while reaping.
///
/// When `exec` fails, the spawn machinery collects the dead child itself.
/// The reaper must not get there first.
static SPAWN_LOCK: Mutex<()> = Mutex::new(());

pub(crate) fn spawn_guard() -> MutexGuard<'static, ()> {
    SPAWN_LOCK.lock().unwrap_or_else(|p| p.into_inner())
}

/// Errors from launching a command.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("job table full ({0} jobs max); kill or wait for a job to free a slot")]
    Capacity(usize),

    #[error("{0}: command not found")]
    NotFound(String),

    #[error("{}: {source}", path.display())]
    Redirect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("internal error: {0}")]
    Table(#[from] JobTableError),
}

impl LaunchError {
    /// Exit code reported for this failure.
    pub fn exit_code(&self) -> i64 {
        match self {
            LaunchError::NotFound(_) => 127,
            LaunchError::Spawn { .. } => 126,
            LaunchError::Capacity(_) | LaunchError::Redirect { .. } | LaunchError::Table(_) => 1,
        }
    }
}

/// Starts commands and registers them in a job table.
#[derive(Debug, Clone)]
pub struct Launcher {
    table: SharedJobTable,
    hand_off_terminal: bool,
}

impl Launcher {
    pub fn new(table: SharedJobTable) -> Self {
        Self {
            table,
            hand_off_terminal: false,
        }
    }

    /// Have foreground children take the controlling terminal themselves
    /// before `exec`.
    pub fn with_terminal_hand_off(mut self, enabled: bool) -> Self {
        self.hand_off_terminal = enabled;
        self
    }

    /// Spawn `cmd` and register it as a foreground or background job.
    ///
    /// Does not wait; the caller decides whether to block on the job.
    pub fn launch(&self, cmd: &CommandLine) -> Result<JobInfo, LaunchError> {
        let mut jobs = lock_table(&self.table);

        if jobs.is_full() {
            return Err(LaunchError::Capacity(jobs.capacity()));
        }

        let state = if cmd.background {
            JobState::Running
        } else {
            JobState::Foreground
        };
        if state == JobState::Foreground {
            if let Some(fg) = jobs.foreground() {
                tracing::error!(pid = fg.pid, "launching while a foreground job is registered");
                return Err(JobTableError::ForegroundOccupied(fg.pid).into());
            }
        }

        let stdin = cmd.stdin_path.as_deref().map(open_input).transpose()?;
        let stdout = cmd.stdout_path.as_deref().map(open_output).transpose()?;

        let path_var = std::env::var("PATH").unwrap_or_default();
        let program = resolve_program(cmd.program(), &path_var)
            .ok_or_else(|| LaunchError::NotFound(cmd.program().to_string()))?;
        tracing::debug!(program = %program.display(), "resolved command");

        let mut command = Command::new(&program);
        command
            .arg0(cmd.program())
            .args(cmd.args())
            .process_group(0);
        if let Some(file) = stdin {
            command.stdin(Stdio::from(file));
        }
        if let Some(file) = stdout {
            command.stdout(Stdio::from(file));
        }
        if self.hand_off_terminal && state == JobState::Foreground {
            // SAFETY: the hook only calls async-signal-safe functions
            // (sigprocmask, getpgrp, tcsetpgrp) and does not allocate.
            unsafe {
                command.pre_exec(|| {
                    take_terminal_in_child();
                    Ok(())
                });
            }
        }

        let spawned = {
            let _guard = spawn_guard();
            command.spawn()
        };
        let child = spawned.map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => LaunchError::NotFound(cmd.program().to_string()),
            _ => LaunchError::Spawn {
                program: cmd.program().to_string(),
                source,
            },
        })?;

        // The child is never waited on through `Child`; the reaper owns that.
        let pid = child.id() as i32;
        drop(child);

        // Also set the group from the parent, so it exists before anyone
        // signals it or hands it the terminal. Fails harmlessly once the
        // child has already exec'd.
        let group = Pid::from_raw(pid);
        if let Err(e) = setpgid(group, group) {
            tracing::trace!(pid, error = %e, "parent-side setpgid");
        }

        let number = match jobs.insert(pid, state, cmd.text.clone()) {
            Ok(number) => number,
            Err(e) => {
                // Checked above, so unreachable in practice; never leave an
                // untracked child behind.
                tracing::error!(pid, error = %e, "failed to register launched job");
                let _ = signal_job(pid, Signal::SIGKILL);
                return Err(e.into());
            }
        };

        tracing::debug!(%number, pid, %state, command = %cmd.text, "launched job");
        Ok(JobInfo {
            number,
            pid,
            state,
            command: cmd.text.clone(),
        })
    }
}

fn open_input(path: &Path) -> Result<File, LaunchError> {
    File::open(path).map_err(|source| LaunchError::Redirect {
        path: path.to_path_buf(),
        source,
    })
}

fn open_output(path: &Path) -> Result<File, LaunchError> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|source| LaunchError::Redirect {
            path: path.to_path_buf(),
            source,
        })
}

/// Find the executable for `name`.
///
/// The name is tried as a path first (relative names resolve against the
/// working directory), then looked up on `path_var` if it has no slash.
pub fn resolve_program(name: &str, path_var: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    let direct = Path::new(name);
    if is_executable(direct) {
        // A bare name would be searched on PATH by exec; anchor it.
        return Some(if name.contains('/') {
            direct.to_path_buf()
        } else {
            Path::new(".").join(name)
        });
    }
    if name.contains('/') {
        return None;
    }

    resolve_in_path(name, path_var)
}

/// Search a colon-separated PATH value for an executable `name`.
pub fn resolve_in_path(name: &str, path_var: &str) -> Option<PathBuf> {
    path_var
        .split(':')
        .filter(|dir| !dir.is_empty())
        .map(|dir| Path::new(dir).join(name))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    match path.metadata() {
        Ok(metadata) => metadata.is_file() && metadata.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

/// Runs in the forked child: make its new process group the terminal's
/// foreground group. Errors are ignored (stdin may be a file).
fn take_terminal_in_child() {
    let mut ttou = SigSet::empty();
    ttou.add(Signal::SIGTTOU);
    let Ok(previous) = ttou.thread_swap_mask(SigmaskHow::SIG_BLOCK) else {
        return;
    };
    // SAFETY: fd 0 stays open for the duration of this call.
    let stdin = unsafe { BorrowedFd::borrow_raw(0) };
    let _ = tcsetpgrp(stdin, getpgrp());
    let _ = previous.thread_set_mask();
}

//! Controlling-terminal hand-off for foreground jobs.
//!
//! Only the process group the terminal considers "foreground" receives
//! keyboard signals and may read from it. While the shell waits on a job it
//! lends the terminal to the job's group, and takes it back afterwards.

use std::io::{self, IsTerminal};

use nix::sys::signal::{SigSet, SigmaskHow, Signal};
use nix::unistd::{getpgrp, tcgetpgrp, tcsetpgrp, Pid};

/// The shell's claim on its controlling terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalState {
    shell_pgid: Pid,
}

impl TerminalState {
    /// Returns `Some` only if stdin is a terminal whose foreground group is
    /// the shell's own. A shell started in the background, or with stdin
    /// redirected, does no hand-off.
    pub fn acquire() -> Option<Self> {
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            return None;
        }
        let shell_pgid = getpgrp();
        match tcgetpgrp(&stdin) {
            Ok(fg) if fg == shell_pgid => Some(Self { shell_pgid }),
            Ok(fg) => {
                tracing::debug!(shell = %shell_pgid, foreground = %fg, "not the terminal's foreground group");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "tcgetpgrp failed");
                None
            }
        }
    }

    /// The shell's own process group.
    pub fn shell_pgid(&self) -> Pid {
        self.shell_pgid
    }

    /// Make `pgid` the terminal's foreground group.
    pub fn give_terminal_to(&self, pgid: Pid) -> nix::Result<()> {
        set_foreground_group(pgid)
    }

    /// Take the terminal back for the shell.
    pub fn reclaim_terminal(&self) -> nix::Result<()> {
        set_foreground_group(self.shell_pgid)
    }
}

/// `tcsetpgrp` on stdin with SIGTTOU blocked, since a caller outside the
/// foreground group would otherwise be stopped by it.
fn set_foreground_group(pgid: Pid) -> nix::Result<()> {
    let mut ttou = SigSet::empty();
    ttou.add(Signal::SIGTTOU);
    let previous = ttou.thread_swap_mask(SigmaskHow::SIG_BLOCK)?;
    let result = tcsetpgrp(io::stdin(), pgid);
    previous.thread_set_mask()?;
    result
}

//! Scheduler module for nsh: the job table and everything that changes it.
//!
//! This module provides:
//! - **Job table**: bounded registry of live jobs with dense job numbers.
//! - **Launcher**: spawns a command in its own process group and registers it.
//! - **Signal relay**: forwards interrupt and suspend keystrokes to the
//!   foreground job and reaps children as they change state.
//! - **Child events**: lets the shell wait on one child while the relay owns
//!   all reaping.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  launch   ┌───────────────────────────┐
//! │   Launcher   │──────────▶│  JobTable (Arc<Mutex<_>>)  │
//! └──────────────┘           │  [1] Running   sleep 9 &   │
//!                            │  [2] Foreground  vi        │
//!        SIGINT / SIGTSTP    └─────────────▲─────────────┘
//! ┌──────────────┐  delete / mark stopped  │
//! │ nsh-signals  │─────────────────────────┘
//! │   thread     │  SIGCHLD: waitpid(-1, WNOHANG|WUNTRACED)
//! └──────┬───────┘
//!        │ broadcast<ChildEvent>
//!        ▼
//! ┌──────────────┐  wait_for(pid) / drain()
//! │ ChildEvents  │──────────────────────────▶ shell main flow
//! └──────────────┘
//! ```

mod launcher;
mod relay;
mod table;
mod wait;

pub use launcher::{resolve_in_path, resolve_program, LaunchError, Launcher};
pub use relay::{
    interrupt_foreground, signal_job, suspend_foreground, ChildEvent, ChildStatus, RelayError,
    SignalRelay,
};
pub use table::{lock_table, JobTable, JobTableError, SharedJobTable, DEFAULT_MAX_JOBS};
pub use wait::{process_exists, ChildEvents, WaitError};

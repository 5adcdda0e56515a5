//! nsh-kernel: the job-control core of nsh.
//!
//! This crate provides:
//!
//! - **Parser**: splits a command line into words, redirections and `&`
//! - **Scheduler**: the job table, process launcher and signal relay
//! - **Terminal**: controlling-terminal hand-off for foreground jobs
//! - **Tools**: the built-in trait, registry, and job-control built-ins
//! - **Shell**: the session object tying them together

pub mod config;
pub mod kernel;
pub mod parser;
pub mod scheduler;
pub mod terminal;
pub mod tools;

pub use config::{ShellConfig, DEFAULT_PROMPT};
pub use kernel::{Shell, ShellError};
pub use parser::{parse, CommandLine, ParseError};
pub use scheduler::{
    ChildEvent, ChildStatus, JobTable, JobTableError, LaunchError, Launcher, SharedJobTable,
    SignalRelay, DEFAULT_MAX_JOBS,
};
pub use terminal::TerminalState;

// Types shared with the REPL
pub use nsh_types::{ExecResult, JobInfo, JobNumber, JobState};

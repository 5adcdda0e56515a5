//! Built-in commands for nsh.
//!
//! A built-in runs inside the shell process with access to the job table,
//! instead of being launched as a job. Every built-in implements the same
//! [`Builtin`] trait and is looked up by name before the launcher is tried.
//!
//! # Architecture
//!
//! ```text
//! BuiltinRegistry
//! ├── jobs   list live jobs
//! ├── fg     continue in the foreground and wait
//! ├── bg     continue in the background
//! ├── kill   remove, SIGCONT, SIGINT
//! └── help
//! ```

mod builtin;
mod context;
mod registry;
mod target;
mod traits;

pub use builtin::{register_builtins, Bg, Fg, Help, Jobs, Kill};
pub use context::ExecContext;
pub use registry::BuiltinRegistry;
pub use target::{resolve_target, JobTarget, TargetError};
pub use traits::{Builtin, BuiltinSchema};

/// A context over a fresh table whose event stream never delivers anything.
#[cfg(test)]
pub(crate) fn test_context() -> ExecContext {
    let (_tx, rx) = tokio::sync::broadcast::channel(16);
    ExecContext::new(
        crate::scheduler::JobTable::shared(crate::scheduler::DEFAULT_MAX_JOBS),
        crate::scheduler::ChildEvents::new(rx),
    )
}

//! bg: Continue a stopped job in the background.

use async_trait::async_trait;
use nix::sys::signal::Signal;

use nsh_types::{ExecResult, JobState};

use crate::scheduler::signal_job;
use crate::tools::{resolve_target, Builtin, BuiltinSchema, ExecContext};

/// Bg built-in: continue a stopped job without waiting on it.
pub struct Bg;

#[async_trait]
impl Builtin for Bg {
    fn name(&self) -> &str {
        "bg"
    }

    fn schema(&self) -> BuiltinSchema {
        BuiltinSchema::new("bg", "Continue a stopped job in the background", "bg <%N|pid>")
            .example("Resume job 1", "bg %1")
    }

    async fn execute(&self, args: &[String], ctx: &mut ExecContext) -> ExecResult {
        let mut jobs = ctx.lock_jobs();
        let job = match resolve_target("bg", args, &jobs) {
            Ok(job) => job,
            Err(e) => return ExecResult::failure(e.exit_code(), format!("bg: {}", e)),
        };

        if !job.state.is_stopped() {
            return ExecResult::from_output(0, "", format!("bg: job {} already running", job.number));
        }

        // Mark first so a concurrent relay action sees the new state.
        if let Err(e) = jobs.set_state(job.pid, JobState::Running) {
            return ExecResult::failure(1, format!("bg: internal error: {}", e));
        }
        if let Err(e) = signal_job(job.pid, Signal::SIGCONT) {
            return ExecResult::failure(1, format!("bg: {}: {}", job.tag(), e));
        }

        tracing::debug!(pid = job.pid, number = %job.number, "resumed job in background");
        ExecResult::success(format!("{} {}\n", job.tag(), job.command))
    }
}

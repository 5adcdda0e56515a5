//! kill: Remove a job and terminate it.

use async_trait::async_trait;
use nix::sys::signal::Signal;

use nsh_types::ExecResult;

use crate::scheduler::signal_job;
use crate::tools::{resolve_target, Builtin, BuiltinSchema, ExecContext};

/// Kill built-in: delete the job, then send SIGCONT followed by SIGINT.
///
/// Continuing first means a stopped job is awake when the interrupt
/// arrives, instead of having it queued until someone resumes it.
pub struct Kill;

#[async_trait]
impl Builtin for Kill {
    fn name(&self) -> &str {
        "kill"
    }

    fn schema(&self) -> BuiltinSchema {
        BuiltinSchema::new("kill", "Remove a job and interrupt it", "kill <%N|pid>")
            .example("Terminate job 2", "kill %2")
            .example("Terminate by process id", "kill 4242")
    }

    async fn execute(&self, args: &[String], ctx: &mut ExecContext) -> ExecResult {
        let job = {
            let mut jobs = ctx.lock_jobs();
            let job = match resolve_target("kill", args, &jobs) {
                Ok(job) => job,
                Err(e) => return ExecResult::failure(e.exit_code(), format!("kill: {}", e)),
            };
            jobs.delete(job.pid);
            job
        };
        tracing::debug!(pid = job.pid, number = %job.number, "killing job");

        let _ = signal_job(job.pid, Signal::SIGCONT);
        match signal_job(job.pid, Signal::SIGINT) {
            Ok(()) => ExecResult::success(""),
            Err(e) => ExecResult::failure(1, format!("kill: {}: {}", job.tag(), e)),
        }
    }
}

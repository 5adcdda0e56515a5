//! fg: Continue a job in the foreground.

use async_trait::async_trait;

use nsh_types::{ExecResult, JobState};

use crate::scheduler::process_exists;
use crate::tools::{resolve_target, Builtin, BuiltinSchema, ExecContext};

/// Fg built-in: make a job the foreground job, continue it, and wait until
/// it exits or stops again.
pub struct Fg;

#[async_trait]
impl Builtin for Fg {
    fn name(&self) -> &str {
        "fg"
    }

    fn schema(&self) -> BuiltinSchema {
        BuiltinSchema::new("fg", "Continue a job in the foreground", "fg <%N|pid>")
            .example("Resume job 1", "fg %1")
            .example("Resume by process id", "fg 4242")
    }

    async fn execute(&self, args: &[String], ctx: &mut ExecContext) -> ExecResult {
        let job = {
            let jobs = ctx.lock_jobs();
            match resolve_target("fg", args, &jobs) {
                Ok(job) => job,
                Err(e) => return ExecResult::failure(e.exit_code(), format!("fg: {}", e)),
            }
        };

        // Waiting on a process that is already gone would never return.
        if !process_exists(job.pid) {
            ctx.lock_jobs().delete(job.pid);
            return ExecResult::failure(1, format!("fg: {} has already exited", job.tag()));
        }

        if let Err(e) = ctx.lock_jobs().set_state(job.pid, JobState::Foreground) {
            tracing::error!(pid = job.pid, error = %e, "fg could not claim the foreground");
            return ExecResult::failure(1, format!("fg: internal error: {}", e));
        }
        tracing::debug!(pid = job.pid, number = %job.number, "resuming job in foreground");

        let mut result = ctx.run_foreground(&job, true).await;
        if !result.err.is_empty() && result.code == 1 {
            result.err = format!("fg: {}", result.err);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_context;

    #[tokio::test]
    async fn unknown_job() {
        let mut ctx = test_context();
        let result = Fg.execute(&["%1".to_string()], &mut ctx).await;
        assert_eq!(result.code, 1);
        assert_eq!(result.err, "fg: %1: no such job");
    }

    #[tokio::test]
    async fn missing_argument() {
        let mut ctx = test_context();
        let result = Fg.execute(&[], &mut ctx).await;
        assert_eq!(result.code, 2);
        assert_eq!(result.err, "fg: usage: fg <%N|pid>");
    }

    #[tokio::test]
    async fn vanished_process_is_removed() {
        let mut ctx = test_context();
        // Far above any real pid_max, so no such process exists.
        ctx.lock_jobs()
            .insert(i32::MAX - 20, JobState::Stopped, "gone")
            .unwrap();

        let result = Fg.execute(&["%1".to_string()], &mut ctx).await;
        assert_eq!(result.code, 1);
        assert!(result.err.contains("has already exited"), "{}", result.err);
        assert!(ctx.lock_jobs().is_empty());
    }
}

//! jobs: List live jobs.

use async_trait::async_trait;

use nsh_types::ExecResult;

use crate::tools::{Builtin, BuiltinSchema, ExecContext};

/// Jobs built-in: one `[N] (pid) State command` line per live job.
pub struct Jobs;

#[async_trait]
impl Builtin for Jobs {
    fn name(&self) -> &str {
        "jobs"
    }

    fn schema(&self) -> BuiltinSchema {
        BuiltinSchema::new("jobs", "List live jobs", "jobs")
            .example("List jobs", "jobs")
            .example("Save the listing", "jobs > jobs.txt")
    }

    async fn execute(&self, _args: &[String], ctx: &mut ExecContext) -> ExecResult {
        let jobs = ctx.lock_jobs();
        let mut out = String::new();
        for job in jobs.list() {
            out.push_str(&job.to_string());
            out.push('\n');
        }
        ExecResult::success(out)
    }
}

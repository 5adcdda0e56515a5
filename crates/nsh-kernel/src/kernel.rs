//! The Shell: one interactive session.
//!
//! The Shell owns and coordinates the job-control components:
//! - Job table (shared with the signal relay)
//! - Launcher (external programs)
//! - Built-in registry (jobs, fg, bg, kill, help)
//! - Child event subscription and pending notices
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                          Shell                            │
//! │  execute(line)                                            │
//! │    ├─ reconcile child events                              │
//! │    ├─ parse                                               │
//! │    ├─ BuiltinRegistry ──▶ Builtin::execute(ctx)           │
//! │    └─ Launcher::launch ──▶ background: "[N] (pid)"        │
//! │                         └▶ foreground: wait via ctx       │
//! │  ┌─────────────┐ ┌──────────────┐ ┌────────────────────┐  │
//! │  │ ExecContext │ │ SignalRelay  │ │ ShellConfig        │  │
//! │  │ (jobs, evts)│ │ (this table) │ │                    │  │
//! │  └─────────────┘ └──────────────┘ └────────────────────┘  │
//! └───────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use thiserror::Error;

use nsh_types::{ExecResult, JobInfo};

use crate::config::ShellConfig;
use crate::parser::{parse, CommandLine};
use crate::scheduler::{lock_table, JobTable, Launcher, RelayError, SharedJobTable, SignalRelay};
use crate::terminal::TerminalState;
use crate::tools::{register_builtins, Builtin, BuiltinRegistry, ExecContext};

/// Errors from creating a shell.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("signal relay: {0}")]
    Relay(#[from] RelayError),
}

/// An interactive shell session.
#[derive(Debug)]
pub struct Shell {
    config: ShellConfig,
    builtins: BuiltinRegistry,
    launcher: Launcher,
    relay: SignalRelay,
    ctx: ExecContext,
}

impl Shell {
    /// Create a session and hook its job table up to the signal relay.
    pub fn new(config: ShellConfig) -> Result<Self, ShellError> {
        let jobs = JobTable::shared(config.max_jobs);
        let (relay, events) = SignalRelay::install(&jobs)?;

        let terminal = if config.interactive {
            TerminalState::acquire()
        } else {
            None
        };
        let launcher = Launcher::new(jobs.clone()).with_terminal_hand_off(terminal.is_some());

        let mut builtins = BuiltinRegistry::new();
        register_builtins(&mut builtins);

        let mut ctx = ExecContext::new(jobs, events);
        ctx.terminal = terminal;
        ctx.builtin_schemas = builtins.schemas();
        ctx.reap_background = config.reap_background;

        tracing::debug!(
            name = %config.name,
            max_jobs = config.max_jobs,
            terminal = terminal.is_some(),
            "shell created"
        );

        Ok(Self {
            config,
            builtins,
            launcher,
            relay,
            ctx,
        })
    }

    /// Evaluate one command line.
    ///
    /// Never fails: every problem is reported through the result's exit
    /// code and `err` text. Blocks while a foreground job runs.
    #[tracing::instrument(level = "debug", skip(self), fields(shell = %self.config.name))]
    pub async fn execute(&mut self, line: &str) -> ExecResult {
        self.ctx.reconcile();

        let cmd = match parse(line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => return ExecResult::default(),
            Err(e) => return ExecResult::failure(2, format!("nsh: syntax error: {}", e)),
        };

        match self.builtins.get(cmd.program()) {
            Some(builtin) => self.run_builtin(builtin, &cmd).await,
            None => self.run_external(&cmd).await,
        }
    }

    async fn run_builtin(&mut self, builtin: Arc<dyn Builtin>, cmd: &CommandLine) -> ExecResult {
        if cmd.background {
            tracing::debug!(builtin = builtin.name(), "built-ins run in the foreground; ignoring &");
        }

        let mut result = builtin.execute(cmd.args(), &mut self.ctx).await;

        if let Some(path) = &cmd.stdout_path {
            if let Err(e) = std::fs::write(path, &result.out) {
                return ExecResult::failure(1, format!("nsh: {}: {}", path.display(), e));
            }
            result.out.clear();
        }
        result
    }

    async fn run_external(&mut self, cmd: &CommandLine) -> ExecResult {
        let job = match self.launcher.launch(cmd) {
            Ok(job) => job,
            Err(e) => {
                // A child that failed to exec may already have taken the
                // terminal in its pre-exec hook.
                self.ctx.reclaim_terminal();
                return ExecResult::failure(e.exit_code(), format!("nsh: {}", e));
            }
        };

        if cmd.background {
            return ExecResult::from_output(0, "", job.tag());
        }
        self.ctx.run_foreground(&job, false).await
    }

    /// Notices (finished or stopped background jobs) to show before the
    /// next prompt.
    pub fn take_notices(&mut self) -> Vec<String> {
        self.ctx.reconcile();
        self.ctx.take_notices()
    }

    /// Snapshot of the live jobs, in job-number order.
    pub fn jobs(&self) -> Vec<JobInfo> {
        lock_table(&self.ctx.jobs).list().to_vec()
    }

    /// The job table shared with the relay.
    pub fn job_table(&self) -> &SharedJobTable {
        &self.ctx.jobs
    }

    /// This session's relay handle, for delivering keystroke actions
    /// directly.
    pub fn relay(&self) -> &SignalRelay {
        &self.relay
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn prompt(&self) -> &str {
        &self.config.prompt
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.contains(name)
    }
}

//! Shell configuration.

use std::io::IsTerminal;

use crate::scheduler::DEFAULT_MAX_JOBS;

/// Default prompt string.
pub const DEFAULT_PROMPT: &str = "prompt> ";

/// Configuration for a shell session.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Name of this session (shows up in logs).
    pub name: String,

    /// Maximum number of concurrent jobs.
    pub max_jobs: usize,

    /// Prompt printed before each line.
    pub prompt: String,

    /// When true, foreground jobs are given the controlling terminal while
    /// the shell waits on them.
    pub interactive: bool,

    /// When true, background jobs are removed from the table once the
    /// shell learns they exited. When false they stay listed as `Running`
    /// until killed.
    pub reap_background: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            max_jobs: DEFAULT_MAX_JOBS,
            prompt: DEFAULT_PROMPT.to_string(),
            interactive: false,
            reap_background: true,
        }
    }
}

impl ShellConfig {
    /// Config for a human at a terminal.
    ///
    /// Terminal hand-off is enabled only when stdin really is a terminal.
    pub fn repl() -> Self {
        Self {
            name: "repl".to_string(),
            interactive: std::io::stdin().is_terminal(),
            ..Self::default()
        }
    }

    /// Non-interactive config for one-shot commands and tests.
    pub fn transient() -> Self {
        Self {
            name: "transient".to_string(),
            ..Self::default()
        }
    }

    /// Set the job capacity (at least one).
    pub fn with_max_jobs(mut self, max_jobs: usize) -> Self {
        self.max_jobs = max_jobs.max(1);
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Enable or disable terminal hand-off.
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Choose whether exited background jobs leave the table.
    pub fn with_reap_background(mut self, reap: bool) -> Self {
        self.reap_background = reap;
        self
    }

    /// Apply `NSH_MAX_JOBS` and `NSH_PROMPT` from the environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, get: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = get("NSH_MAX_JOBS") {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.max_jobs = n,
                _ => tracing::warn!(value = %raw, "ignoring invalid NSH_MAX_JOBS"),
            }
        }
        if let Some(prompt) = get("NSH_PROMPT") {
            self.prompt = prompt;
        }
        self
    }
}

//! nsh REPL: line-at-a-time front end for the nsh shell.
//!
//! This REPL reads one command line at a time and hands it to the kernel's
//! [`Shell`]. It handles:
//! - `quit` / `exit`
//! - Printing each result's output and error text
//! - Job notices (finished or stopped background jobs) before each prompt

use std::io::Write;

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::runtime::Runtime;

use nsh_kernel::{ExecResult, Shell, ShellConfig};

/// What the loop should do after a line.
#[derive(Debug, PartialEq, Eq)]
pub enum LineResult {
    /// Keep going; show this result.
    Continue(ExecResult),
    /// The user asked to leave.
    Exit,
}

/// REPL state: a shell session plus the runtime it runs on.
pub struct Repl {
    shell: Shell,
    runtime: Runtime,
}

impl Repl {
    /// Create a REPL for a human at a terminal.
    pub fn new() -> Result<Self> {
        Self::with_config(ShellConfig::repl().with_env_overrides())
    }

    /// Create a REPL with a custom shell configuration.
    pub fn with_config(config: ShellConfig) -> Result<Self> {
        let runtime = Runtime::new().context("Failed to create tokio runtime")?;
        let shell = Shell::new(config).context("Failed to create shell")?;
        Ok(Self { shell, runtime })
    }

    /// Process a single line of input.
    pub fn process_line(&mut self, line: &str) -> LineResult {
        let trimmed = line.trim();
        let first = trimmed.split_whitespace().next();
        if matches!(first, Some("quit" | "exit")) {
            tracing::debug!("exit requested");
            return LineResult::Exit;
        }
        LineResult::Continue(self.runtime.block_on(self.shell.execute(trimmed)))
    }

    /// Notices to print before the next prompt.
    pub fn take_notices(&mut self) -> Vec<String> {
        self.shell.take_notices()
    }

    pub fn prompt(&self) -> &str {
        self.shell.prompt()
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }
}

/// Write a result's text to stdout and stderr.
pub fn print_result(result: &ExecResult) {
    if !result.out.is_empty() {
        print!("{}", result.out);
        let _ = std::io::stdout().flush();
    }
    if !result.err.is_empty() {
        eprintln!("{}", result.err.trim_end_matches('\n'));
    }
}

/// Run the REPL until `quit` or end of input.
pub fn run() -> Result<()> {
    let mut rl = DefaultEditor::new().context("Failed to create editor")?;
    let mut repl = Repl::new()?;

    loop {
        for notice in repl.take_notices() {
            eprintln!("{}", notice);
        }

        let prompt = repl.prompt().to_string();
        match rl.readline(&prompt) {
            Ok(line) => match repl.process_line(&line) {
                LineResult::Continue(result) => print_result(&result),
                LineResult::Exit => break,
            },
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    Ok(())
}

/// Run one command line non-interactively and return its exit code.
pub fn run_command(line: &str) -> Result<i64> {
    let mut repl = Repl::with_config(ShellConfig::transient().with_env_overrides())?;
    let code = match repl.process_line(line) {
        LineResult::Continue(result) => {
            print_result(&result);
            result.code
        }
        LineResult::Exit => 0,
    };
    for notice in repl.take_notices() {
        eprintln!("{}", notice);
    }
    Ok(code)
}

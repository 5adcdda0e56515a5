//! nsh CLI entry point.
//!
//! Usage:
//!   nsh                      # Interactive shell
//!   nsh -c <command>         # Execute one command line and exit

use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    // Initialize tracing on stderr (respects RUST_LOG env var)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        None => {
            nsh_repl::run()?;
            Ok(ExitCode::SUCCESS)
        }

        Some("--help" | "-h") => {
            print_help();
            Ok(ExitCode::SUCCESS)
        }

        Some("--version" | "-V") => {
            println!(
                "nsh {} ({} {})",
                env!("CARGO_PKG_VERSION"),
                env!("NSH_GIT_HASH"),
                env!("NSH_BUILD_DATE")
            );
            Ok(ExitCode::SUCCESS)
        }

        Some("-c") => {
            let cmd = args.get(2).context("-c requires a command argument")?;
            let code = nsh_repl::run_command(cmd)?;
            Ok(ExitCode::from(code.clamp(0, 255) as u8))
        }

        Some(unknown) => {
            eprintln!("Unknown option: {unknown}");
            eprintln!("Run 'nsh --help' for usage.");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_help() {
    println!(
        r#"nsh v{}: a small shell with job control

Usage:
  nsh                          Interactive shell
  nsh -c <command>             Execute one command line and exit

Options:
  -c <command>                 Execute command line and exit
  -h, --help                   Show this help
  -V, --version                Show version

Built-ins:
  jobs                         List jobs as [N] (pid) State command
  fg <%N|pid>                  Continue a job in the foreground
  bg <%N|pid>                  Continue a stopped job in the background
  kill <%N|pid>                Remove a job and interrupt it
  help [builtin]               Describe built-ins
  quit                         Leave the shell

Environment:
  NSH_MAX_JOBS                 Job table capacity (default 5)
  NSH_PROMPT                   Prompt string (default "prompt> ")
  RUST_LOG                     Log filter, e.g. nsh_kernel=debug
"#,
        env!("CARGO_PKG_VERSION")
    );
}

//! Command-line tokenizer.
//!
//! The grammar is deliberately flat: whitespace-separated words, a bare `<`
//! or `>` followed by a path, and a bare `&` that ends the line and sends
//! the command to the background. There is no quoting, expansion or piping.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from tokenizing a command line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected a file name after '{0}'")]
    MissingRedirectTarget(char),

    #[error("missing command before redirection")]
    MissingCommand,
}

/// One parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// Program name followed by its arguments.
    pub argv: Vec<String>,
    /// Started with a trailing `&`.
    pub background: bool,
    /// Path given after `<`.
    pub stdin_path: Option<PathBuf>,
    /// Path given after `>`.
    pub stdout_path: Option<PathBuf>,
    /// The line as typed (trimmed), kept for job listings.
    pub text: String,
}

impl CommandLine {
    /// The command name (first word).
    pub fn program(&self) -> &str {
        // parse() never produces an empty argv
        self.argv.first().map(String::as_str).unwrap_or_default()
    }

    /// Arguments after the command name.
    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or_default()
    }
}

/// Tokenize one line.
///
/// Returns `Ok(None)` for a blank line. Tokens after `&` are ignored. When a
/// redirection is given twice, the last one wins.
pub fn parse(line: &str) -> Result<Option<CommandLine>, ParseError> {
    let text = line.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let mut argv = Vec::new();
    let mut background = false;
    let mut stdin_path = None;
    let mut stdout_path = None;

    let mut words = text.split_whitespace();
    while let Some(word) = words.next() {
        match word {
            "&" => {
                background = true;
                break;
            }
            "<" => {
                let target = words.next().ok_or(ParseError::MissingRedirectTarget('<'))?;
                stdin_path = Some(PathBuf::from(target));
            }
            ">" => {
                let target = words.next().ok_or(ParseError::MissingRedirectTarget('>'))?;
                stdout_path = Some(PathBuf::from(target));
            }
            _ => argv.push(word.to_string()),
        }
    }

    if argv.is_empty() {
        // A bare "&" is as good as a blank line.
        if stdin_path.is_none() && stdout_path.is_none() {
            return Ok(None);
        }
        return Err(ParseError::MissingCommand);
    }

    Ok(Some(CommandLine {
        argv,
        background,
        stdin_path,
        stdout_path,
        text: text.to_string(),
    }))
}

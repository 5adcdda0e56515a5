//! Core built-in traits and types.

use async_trait::async_trait;

use nsh_types::ExecResult;

use super::context::ExecContext;

/// Schema describing a built-in's interface, for `help`.
#[derive(Debug, Clone)]
pub struct BuiltinSchema {
    /// Built-in name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Usage line, e.g. `fg <%N|pid>`.
    pub usage: String,
    /// Usage examples: (description, command).
    pub examples: Vec<(String, String)>,
}

impl BuiltinSchema {
    /// Create a new schema.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        usage: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            usage: usage.into(),
            examples: Vec::new(),
        }
    }

    /// Add a usage example.
    pub fn example(mut self, description: impl Into<String>, command: impl Into<String>) -> Self {
        self.examples.push((description.into(), command.into()));
        self
    }
}

/// A command the shell runs itself instead of launching a process.
#[async_trait]
pub trait Builtin: Send + Sync {
    /// The built-in's name (used for lookup).
    fn name(&self) -> &str;

    /// Get the built-in's schema.
    fn schema(&self) -> BuiltinSchema;

    /// Execute with the words after the command name.
    async fn execute(&self, args: &[String], ctx: &mut ExecContext) -> ExecResult;
}

//! help: Describe the built-in commands.

use async_trait::async_trait;

use nsh_types::ExecResult;

use crate::tools::{Builtin, BuiltinSchema, ExecContext};

/// Help built-in.
pub struct Help;

#[async_trait]
impl Builtin for Help {
    fn name(&self) -> &str {
        "help"
    }

    fn schema(&self) -> BuiltinSchema {
        BuiltinSchema::new("help", "Describe the built-in commands", "help [builtin]")
            .example("List built-ins", "help")
            .example("Describe fg", "help fg")
    }

    async fn execute(&self, args: &[String], ctx: &mut ExecContext) -> ExecResult {
        match args.first() {
            None => ExecResult::success(overview(&ctx.builtin_schemas)),
            Some(name) => match ctx.builtin_schemas.iter().find(|s| &s.name == name) {
                Some(schema) => ExecResult::success(detail(schema)),
                None => ExecResult::failure(1, format!("help: no help for '{}'", name)),
            },
        }
    }
}

fn overview(schemas: &[BuiltinSchema]) -> String {
    let width = schemas.iter().map(|s| s.usage.len()).max().unwrap_or(0);
    let mut out = String::from("Built-in commands:\n");
    for schema in schemas {
        out.push_str(&format!("  {:width$}  {}\n", schema.usage, schema.description));
    }
    out.push_str(&format!("  {:width$}  Leave the shell\n", "quit"));
    out.push_str("\nAnything else runs as a program. End a line with & to run it in the background.\n");
    out
}

fn detail(schema: &BuiltinSchema) -> String {
    let mut out = format!("{}\n\n  {}\n", schema.usage, schema.description);
    if !schema.examples.is_empty() {
        out.push_str("\nExamples:\n");
        for (description, command) in &schema.examples {
            out.push_str(&format!("  {:<16} # {}\n", command, description));
        }
    }
    out
}

//! Built-in commands.

mod bg;
mod fg;
mod help;
mod jobs;
mod kill;

pub use bg::Bg;
pub use fg::Fg;
pub use help::Help;
pub use jobs::Jobs;
pub use kill::Kill;

use super::BuiltinRegistry;

/// Register the job-control built-ins and `help`.
pub fn register_builtins(registry: &mut BuiltinRegistry) {
    registry.register(bg::Bg);
    registry.register(fg::Fg);
    registry.register(help::Help);
    registry.register(jobs::Jobs);
    registry.register(kill::Kill);
}

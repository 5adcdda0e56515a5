//! Built-in lookup by name.

use std::collections::HashMap;
use std::sync::Arc;

use super::traits::{Builtin, BuiltinSchema};

/// Registry of built-in commands.
#[derive(Default)]
pub struct BuiltinRegistry {
    builtins: HashMap<String, Arc<dyn Builtin>>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a built-in, replacing any with the same name.
    pub fn register(&mut self, builtin: impl Builtin + 'static) {
        self.builtins
            .insert(builtin.name().to_string(), Arc::new(builtin));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Builtin>> {
        self.builtins.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }

    /// Schemas of every registered built-in, sorted by name.
    pub fn schemas(&self) -> Vec<BuiltinSchema> {
        let mut schemas: Vec<_> = self.builtins.values().map(|b| b.schema()).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }
}

impl std::fmt::Debug for BuiltinRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.builtins.keys().collect();
        names.sort();
        f.debug_struct("BuiltinRegistry")
            .field("builtins", &names)
            .finish()
    }
}

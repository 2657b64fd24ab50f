//! `%except` handler storage.
//!
//! Exception handlers have nothing to do with typemaps except that they
//! follow the same scoping rules, so they ride on the scope stack: one
//! optional handler per scope, innermost wins.

use crate::store::Typemaps;

impl Typemaps {
    /// Install the exception handler for the current scope, replacing any
    /// previous one.
    pub fn except_register(&mut self, code: impl Into<String>) {
        self.top_mut().except = Some(code.into());
    }

    /// The innermost handler visible from the current scope, freshly owned.
    pub fn except_lookup(&self) -> Option<String> {
        self.scopes.iter().rev().find_map(|s| s.except.clone())
    }

    /// Remove the handler from the current scope only.
    pub fn except_clear(&mut self) {
        self.top_mut().except = None;
    }
}

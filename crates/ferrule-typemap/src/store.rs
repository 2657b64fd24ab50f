//! The scoped typemap store.
//!
//! Rules live in a stack of scopes. Each scope maps a type encoding to a
//! node holding the type's own method entries plus nested per-name nodes:
//!
//! ```text
//! scope
//!   [ type ] ── methods: tmap:in, tmap:out, ...
//!      └──── [ name ] ── methods: tmap:in, ...
//! ```
//!
//! The store owns every node and entry; lookups hand out borrowed views.

use crate::error::{Result, TypemapError};
use crate::keys::MethodKeys;
use crate::parm::Param;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::io;

/// Upper bound on scope nesting.
pub const MAX_SCOPE: usize = 32;

/// Per-method rule entries stored on one `(type)` or `(type, name)` node.
pub type MethodMap = FxHashMap<SmolStr, RuleEntry>;

/// One registered rewriting rule, or the shell left behind by intermediate
/// multi-argument registration and by the clear operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleEntry {
    /// The code template. Shells and cleared entries have none.
    pub code: Option<String>,
    /// Type the rule was registered under.
    pub ty: Option<String>,
    /// Parameter name the rule was registered under, if any.
    pub pname: Option<String>,
    /// Human-readable description, substituted for `$typemap`.
    pub typemap: Option<String>,
    /// Local-variable declarations injected when the rule fires.
    pub locals: Vec<Param>,
    /// Keyword arguments attached alongside the generated code.
    pub kwargs: Vec<Param>,
}

impl RuleEntry {
    pub fn has_code(&self) -> bool {
        self.code.is_some()
    }

    /// Reduce the entry to an empty shell.
    pub(crate) fn clear_all(&mut self) {
        *self = Self::default();
    }
}

/// Rules filed under one type.
#[derive(Debug, Clone, Default)]
pub struct TypeNode {
    pub(crate) methods: MethodMap,
    pub(crate) named: FxHashMap<String, MethodMap>,
}

/// One frame of the lookup stack.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub(crate) types: FxHashMap<String, TypeNode>,
    /// Handler installed by the `%except` directive, which shares the
    /// typemap scoping rules but nothing else.
    pub(crate) except: Option<String>,
}

impl Scope {
    /// Method entries for `(ty, name)`: the name node when `name` is
    /// present and non-empty, the type node itself otherwise.
    pub fn node(&self, ty: &str, name: Option<&str>) -> Option<&MethodMap> {
        let node = self.types.get(ty)?;
        match name {
            Some(n) if !n.is_empty() => node.named.get(n),
            _ => Some(&node.methods),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.except.is_none()
    }
}

/// The scoped typemap store: a stack of scopes with the global scope at the
/// bottom, plus the method-key cache shared by every operation.
#[derive(Debug)]
pub struct Typemaps {
    pub(crate) scopes: Vec<Scope>,
    pub(crate) keys: MethodKeys,
}

impl Default for Typemaps {
    fn default() -> Self {
        Self::new()
    }
}

impl Typemaps {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            keys: MethodKeys::new(),
        }
    }

    /// Drop every scope and rule, leaving one empty global scope.
    pub fn init(&mut self) {
        self.scopes.clear();
        self.scopes.push(Scope::default());
    }

    /// Number of live scopes (always at least 1).
    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    /// Open a fresh scope on top of the stack.
    pub fn push_scope(&mut self) -> Result<()> {
        if self.scopes.len() >= MAX_SCOPE {
            return Err(TypemapError::ScopeOverflow { limit: MAX_SCOPE });
        }
        self.scopes.push(Scope::default());
        Ok(())
    }

    /// Close and return the top scope. The bottom scope is sticky: at depth
    /// one this returns `None` and the stack is unchanged.
    pub fn pop_scope(&mut self) -> Option<Scope> {
        if self.scopes.len() > 1 {
            self.scopes.pop()
        } else {
            None
        }
    }

    /// Borrow the method entries for `(ty, name)` in the scope at `index`
    /// (0 is the global scope).
    pub fn node(&self, index: usize, ty: &str, name: Option<&str>) -> Option<&MethodMap> {
        self.scopes.get(index)?.node(ty, name)
    }

    pub(crate) fn top_mut(&mut self) -> &mut Scope {
        self.scopes.last_mut().expect("scope stack is never empty")
    }

    /// Method entries for `(ty, name)` in the top scope, created on demand.
    pub(crate) fn node_mut(&mut self, ty: &str, name: Option<&str>) -> &mut MethodMap {
        let node = self
            .top_mut()
            .types
            .entry(ty.to_string())
            .or_default();
        match name {
            Some(n) if !n.is_empty() => node.named.entry(n.to_string()).or_default(),
            _ => &mut node.methods,
        }
    }

    /// Method entries for `(ty, name)` in the top scope, without creating
    /// anything.
    pub(crate) fn existing_node_mut(
        &mut self,
        ty: &str,
        name: Option<&str>,
    ) -> Option<&mut MethodMap> {
        let node = self.top_mut().types.get_mut(ty)?;
        match name {
            Some(n) if !n.is_empty() => node.named.get_mut(n),
            _ => Some(&mut node.methods),
        }
    }

    /// Dump every scope, top first, to `w`. Keys are sorted so the output
    /// is stable.
    pub fn dump(&self, w: &mut impl io::Write) -> io::Result<()> {
        writeln!(
            w,
            "---[ typemaps ]--------------------------------------------------------------"
        )?;
        for (index, scope) in self.scopes.iter().enumerate().rev() {
            writeln!(w, "::: scope {index}")?;
            let mut tys: Vec<&String> = scope.types.keys().collect();
            tys.sort();
            for ty in tys {
                let node = &scope.types[ty];
                dump_methods(w, ty, None, &node.methods)?;
                let mut names: Vec<&String> = node.named.keys().collect();
                names.sort();
                for n in names {
                    dump_methods(w, ty, Some(n), &node.named[n])?;
                }
            }
            if let Some(except) = &scope.except {
                writeln!(w, "    *except* = {{{except}}}")?;
            }
        }
        writeln!(
            w,
            "-----------------------------------------------------------------------------"
        )
    }
}

fn dump_methods(
    w: &mut impl io::Write,
    ty: &str,
    name: Option<&str>,
    methods: &MethodMap,
) -> io::Result<()> {
    let mut keys: Vec<&SmolStr> = methods.keys().collect();
    keys.sort();
    for key in keys {
        let entry = &methods[key];
        match name {
            Some(n) => write!(w, "    ({ty}, {n}) {key}")?,
            None => write!(w, "    ({ty}) {key}")?,
        }
        match &entry.code {
            Some(code) => writeln!(w, " = {{{}}}", code.trim())?,
            None => writeln!(w, " = <shell>")?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_has_single_empty_scope() {
        let tm = Typemaps::new();
        assert_eq!(tm.scope_depth(), 1);
        assert!(tm.node(0, "int", None).is_none());
    }

    #[test]
    fn test_push_and_pop() {
        let mut tm = Typemaps::new();
        tm.push_scope().unwrap();
        tm.push_scope().unwrap();
        assert_eq!(tm.scope_depth(), 3);

        assert!(tm.pop_scope().is_some());
        assert!(tm.pop_scope().is_some());
        assert_eq!(tm.scope_depth(), 1);

        // the bottom scope is sticky
        assert!(tm.pop_scope().is_none());
        assert_eq!(tm.scope_depth(), 1);
    }

    #[test]
    fn test_push_overflow() {
        let mut tm = Typemaps::new();
        for _ in 1..MAX_SCOPE {
            tm.push_scope().unwrap();
        }
        assert_eq!(tm.scope_depth(), MAX_SCOPE);
        assert_eq!(
            tm.push_scope(),
            Err(TypemapError::ScopeOverflow { limit: MAX_SCOPE })
        );
    }

    #[test]
    fn test_init_resets() {
        let mut tm = Typemaps::new();
        tm.push_scope().unwrap();
        tm.node_mut("int", Some("x"));
        tm.init();
        assert_eq!(tm.scope_depth(), 1);
        assert!(tm.node(0, "int", Some("x")).is_none());
    }

    #[test]
    fn test_node_indexing() {
        let mut tm = Typemaps::new();
        tm.node_mut("int", Some("x"))
            .insert("tmap:in".into(), RuleEntry::default());

        assert!(tm.node(0, "int", Some("x")).is_some());
        // the type node exists but has no entries of its own
        assert!(tm.node(0, "int", None).is_some());
        assert!(tm.node(0, "int", Some("y")).is_none());
        assert!(tm.node(0, "double", None).is_none());
        // out-of-range scope
        assert!(tm.node(7, "int", Some("x")).is_none());
        // an empty name means the type node
        assert!(tm.node(0, "int", Some("")).is_some());
    }
}

//! Specificity-ordered rule lookup.

use crate::keys;
use crate::parm::Param;
use crate::store::{RuleEntry, Scope, Typemaps};
use ferrule_ctype as ctype;
use ferrule_ctype::TypeSystem;

/// Replace every array dimension with the `ANY` wildcard.
fn strip_arrays(ty: &str) -> String {
    let mut t = ty.to_string();
    for i in 0..ctype::array_ndim(ty) {
        t = ctype::array_setdim(&t, i, "ANY");
    }
    t
}

/// Probe one `(type, name)` pair in a scope. An entry with code ends the
/// search; a codeless entry is recorded as the fallback and the probe goes
/// on.
fn probe<'a>(
    scope: &'a Scope,
    ty: &str,
    name: Option<&str>,
    tmop: &str,
    backup: &mut Option<&'a RuleEntry>,
) -> Option<&'a RuleEntry> {
    let node = scope.types.get(ty)?;
    if let Some(n) = name {
        if let Some(map) = node.named.get(n) {
            if let Some(entry) = map.get(tmop) {
                if entry.has_code() {
                    return Some(entry);
                }
                *backup = Some(entry);
            }
        }
    }
    if let Some(entry) = node.methods.get(tmop) {
        if entry.has_code() {
            return Some(entry);
        }
        *backup = Some(entry);
    }
    None
}

impl Typemaps {
    /// Find the most specific rule for `(op, ty, name)`.
    ///
    /// Scopes are tried top-down. Within a scope the candidates are, in
    /// order: the `(type, name)` node, the type node alone, both again with
    /// array dimensions wildcarded to `ANY`, then the same ladder after
    /// qualifier stripping and after each one-level typedef resolution
    /// (resolution re-enables stripping), and finally the type's generic
    /// default. A candidate with code wins immediately; the last codeless
    /// candidate seen is kept as a cross-scope fallback. At the default
    /// step a codeless entry wins outright.
    pub fn search(
        &self,
        op: &str,
        ty: &str,
        name: Option<&str>,
        types: &TypeSystem,
    ) -> Option<&RuleEntry> {
        let tmop = self.keys.method(op);
        let cname = name.filter(|n| !n.is_empty());
        let is_arr = ctype::is_array(ty);
        let mut backup: Option<&RuleEntry> = None;
        let mut noarrays: Option<String> = None;
        let mut primitive: Option<String> = None;

        for index in (0..self.scopes.len()).rev() {
            let scope = &self.scopes[index];
            let mut cur = ty.to_string();
            let mut stripped = false;
            loop {
                if let Some(e) = probe(scope, &cur, cname, &tmop, &mut backup) {
                    return Some(e);
                }
                if is_arr {
                    let na = noarrays.get_or_insert_with(|| strip_arrays(&cur));
                    if let Some(e) = probe(scope, na, cname, &tmop, &mut backup) {
                        return Some(e);
                    }
                }
                if !stripped {
                    stripped = true;
                    let s = ctype::strip_qualifiers(&cur);
                    if s != cur {
                        cur = s;
                        continue;
                    }
                }
                match types.typedef_resolve(&cur) {
                    Some(r) => {
                        cur = r;
                        stripped = false;
                    }
                    None => break,
                }
            }

            // no match yet: try the generic default, computed once from the
            // original type
            let prim = primitive.get_or_insert_with(|| ctype::default_for(ty));
            if let Some(node) = scope.types.get(prim.as_str()) {
                if let Some(n) = cname {
                    if let Some(map) = node.named.get(n) {
                        if let Some(entry) = map.get(tmop.as_str()) {
                            return Some(entry);
                        }
                    }
                }
                if let Some(entry) = node.methods.get(tmop.as_str()) {
                    return Some(entry);
                }
            }
        }
        backup
    }

    /// Find a rule spanning one or more leading parameters of `parms`.
    /// Returns the winning entry together with the number of parameters it
    /// consumes; `None` when no code-bearing rule covers the head.
    pub fn search_multi(
        &self,
        op: &str,
        parms: &[Param],
        types: &TypeSystem,
    ) -> Option<(&RuleEntry, usize)> {
        let (first, rest) = parms.split_first()?;
        let found = self.search(op, &first.ty, first.name.as_deref(), types)?;
        let newop = keys::suffix_step(op, &first.ty, first.name.as_deref());
        let (winner, consumed) = match self.search_multi(&newop, rest, types) {
            Some((inner, n)) => (inner, n),
            None => (found, 0),
        };
        if winner.has_code() {
            Some((winner, consumed + 1))
        } else {
            None
        }
    }
}

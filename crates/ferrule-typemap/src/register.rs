//! Rule registration: `%typemap`, `%apply` and `%clear`.

use crate::error::{Result, TypemapError};
use crate::keys::{self, count_args, signature_suffix, METHOD_PREFIX};
use crate::parm::Param;
use crate::store::{RuleEntry, Typemaps};

impl Typemaps {
    /// Register a rule for `op` over `parms` in the top scope, replacing any
    /// previous rule with the same signature. Everything stored is deep-
    /// copied from the caller's data. An empty `parms` is a no-op.
    ///
    /// A multi-parameter rule is stored on the last parameter's node under a
    /// method key that encodes every earlier `(type, name)` step; each node
    /// visited on the way keeps an empty shell entry for its partial key so
    /// that copying and multi-argument search can follow the chain.
    pub fn register(
        &mut self,
        op: &str,
        parms: &[Param],
        code: &str,
        locals: &[Param],
        kwargs: &[Param],
    ) {
        let Some((first, rest)) = parms.split_first() else {
            return;
        };
        let tmop = self.keys.method(op);
        let node = self.node_mut(&first.ty, first.name.as_deref());
        let entry = node.entry(tmop).or_default();

        if rest.is_empty() {
            tracing::trace!(op, ty = %first.ty, "registering typemap");
            entry.code = Some(code.to_string());
            entry.ty = Some(first.ty.clone());
            entry.pname = first.name.clone();
            entry.typemap = Some(format!(
                "typemap({op}) {}",
                ferrule_ctype::to_c(&first.ty, first.name.as_deref())
            ));
            entry.locals = locals.to_vec();
            entry.kwargs = kwargs.to_vec();
        } else {
            let newop = keys::suffix_step(op, &first.ty, first.name.as_deref());
            self.register(&newop, rest, code, locals, kwargs);
        }
    }

    /// Copy the rule registered for `op` over `src` onto `dst` (single-rule
    /// `%apply`). Scopes are searched top-down; the first full signature
    /// match wins and is re-registered over `dst` in the top scope.
    pub fn copy(&mut self, op: &str, src: &[Param], dst: &[Param]) -> Result<()> {
        if src.len() != dst.len() {
            return Err(TypemapError::ArityMismatch {
                src: src.len(),
                dst: dst.len(),
            });
        }
        let tmop = self.keys.method(op);
        for index in (0..self.scopes.len()).rev() {
            let mut key = tmop.to_string();
            let mut matched: Option<&RuleEntry> = None;
            for p in src {
                let Some(node) = self.node(index, &p.ty, p.name.as_deref()) else {
                    matched = None;
                    break;
                };
                let Some(entry) = node.get(key.as_str()) else {
                    matched = None;
                    break;
                };
                matched = Some(entry);
                key = keys::suffix_step(&key, &p.ty, p.name.as_deref());
            }
            if let Some(entry) = matched {
                let code = entry.code.clone().unwrap_or_default();
                let locals = entry.locals.clone();
                let kwargs = entry.kwargs.clone();
                self.register(op, dst, &code, &locals, &kwargs);
                return Ok(());
            }
        }
        Err(TypemapError::NotFound { op: op.to_string() })
    }

    /// Remove the code, locals and kwargs of the rule for `op` over `parms`
    /// in the top scope, leaving the shell behind. Silent when nothing
    /// matches.
    pub fn clear(&mut self, op: &str, parms: &[Param]) {
        let Some((last, init)) = parms.split_last() else {
            return;
        };
        let top = self.scopes.len() - 1;
        let mut key = op.to_string();
        for p in init {
            if self.node(top, &p.ty, p.name.as_deref()).is_none() {
                return;
            }
            key = keys::suffix_step(&key, &p.ty, p.name.as_deref());
        }
        if self.node(top, &last.ty, last.name.as_deref()).is_none() {
            return;
        }
        let tmop = self.keys.method(&key);
        if let Some(node) = self.existing_node_mut(&last.ty, last.name.as_deref()) {
            if let Some(entry) = node.get_mut(tmop.as_str()) {
                entry.code = None;
                entry.locals.clear();
                entry.kwargs.clear();
            }
        }
    }

    /// Multi-argument `%apply`: copy every method registered for `src` onto
    /// `dst`, rewriting the encoded signature. All scopes are scanned, and
    /// keys already present on the destination are never overwritten.
    ///
    /// With single-parameter lists the signature is empty, so this copies
    /// every method the source `(type, name)` carries.
    pub fn apply(&mut self, src: &[Param], dst: &[Param]) {
        let (Some((slast, sinit)), Some((dlast, dinit))) = (src.split_last(), dst.split_last())
        else {
            return;
        };
        debug_assert_eq!(sinit.len(), dinit.len());
        let narg = sinit.len();
        let ssig = signature_suffix(sinit);
        let dsig = signature_suffix(dinit);

        // the destination node is materialized up front
        self.node_mut(&dlast.ty, dlast.name.as_deref());

        let top = self.scopes.len() - 1;
        for index in (0..self.scopes.len()).rev() {
            // collect this scope's matches first: the registrations below
            // mutate the top scope, which may be the node being read
            let mut found: Vec<(String, String, Vec<Param>, Vec<Param>)> = Vec::new();
            if let Some(sm) = self.node(index, &slast.ty, slast.name.as_deref()) {
                for (key, entry) in sm {
                    if count_args(key.as_str()) != narg || !key.contains(ssig.as_str()) {
                        continue;
                    }
                    let Some(code) = &entry.code else { continue };
                    let nkey = if narg > 0 {
                        key.replace(ssig.as_str(), dsig.as_str())
                    } else {
                        key.to_string()
                    };
                    found.push((nkey, code.clone(), entry.locals.clone(), entry.kwargs.clone()));
                }
            }
            found.sort_by(|a, b| a.0.cmp(&b.0));
            for (nkey, code, locals, kwargs) in found {
                let exists = self
                    .node(top, &dlast.ty, dlast.name.as_deref())
                    .is_some_and(|n| n.contains_key(nkey.as_str()));
                if exists {
                    continue;
                }
                let mut bare = nkey;
                if narg > 0 {
                    bare = bare.replace(dsig.as_str(), "");
                }
                let bare = bare.strip_prefix(METHOD_PREFIX).unwrap_or(&bare);
                self.register(bare, dst, &code, &locals, &kwargs);
            }
        }
    }

    /// Multi-argument `%clear`: reset to a shell every method on the last
    /// parameter's node, in the top scope, whose key encodes the same
    /// parameter count and contains the signature of `parms`.
    pub fn clear_apply(&mut self, parms: &[Param]) {
        let Some((last, init)) = parms.split_last() else {
            return;
        };
        let narg = init.len();
        let tsig = signature_suffix(init);
        let Some(node) = self.existing_node_mut(&last.ty, last.name.as_deref()) else {
            return;
        };
        for (key, entry) in node.iter_mut() {
            if count_args(key.as_str()) == narg && key.contains(tsig.as_str()) {
                entry.clear_all();
            }
        }
    }
}

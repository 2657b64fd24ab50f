//! The lookup/attach facade used during wrapper emission.
//!
//! [`Typemaps::lookup`] is the single-parameter convenience: find a rule,
//! instantiate its code and hand it back. [`Typemaps::attach`] walks a whole
//! parameter list, consumes multi-argument groups, and attaches the rendered
//! code, group links and keyword arguments onto the first parameter of each
//! group.

use crate::parm::{Attached, Param};
use crate::store::Typemaps;
use crate::subst;
use ferrule_ctype as ctype;
use ferrule_ctype::TypeSystem;
use ferrule_wrap::{replace_id, Wrapper};

/// Inject each named local into the wrapper and rewrite the code to the
/// names actually allocated.
///
/// With `argnum` present (attach) the proposed name is `<name><argnum>`;
/// without it (lookup) the name is proposed as-is. The wrapper resolves
/// collisions, and the returned name replaces the original throughout the
/// code at identifier boundaries.
fn declare_locals(
    code: &mut String,
    locals: &[Param],
    wrapper: &mut Wrapper,
    argnum: Option<usize>,
) {
    for p in locals {
        let Some(pn) = p.name.as_deref() else { continue };
        if pn.is_empty() {
            continue;
        }
        let candidate = match argnum {
            Some(n) => format!("{pn}{n}"),
            None => pn.to_string(),
        };
        let decl = ctype::to_c(&p.ty, Some(&candidate));
        let actual = wrapper.new_local(&candidate, &decl);
        *code = replace_id(code, pn, &actual);
    }
}

impl Typemaps {
    /// Instantiate the rule for `(op, ty, pname)`: clone its code and
    /// locals, substitute for position 1, declare locals into `wrapper` if
    /// one is given, then expand `$source`, `$target`, `$typemap` and
    /// `$parmname`. Returns the freshly owned code, or `None` when no
    /// code-bearing rule matches.
    #[allow(clippy::too_many_arguments)]
    pub fn lookup(
        &self,
        op: &str,
        ty: &str,
        pname: Option<&str>,
        lname: &str,
        source: &str,
        target: &str,
        wrapper: Option<&mut Wrapper>,
        types: &TypeSystem,
    ) -> Option<String> {
        let entry = self.search(op, ty, pname, types)?;
        let mut code = entry.code.clone()?;
        let mut locals = entry.locals.clone();
        let typemap = entry.typemap.clone();

        subst::substitute(&mut code, &mut locals, ty, pname, lname, 1, types);

        if let Some(w) = wrapper {
            if !locals.is_empty() {
                declare_locals(&mut code, &locals, w, None);
            }
        }

        code = code.replace("$source", source);
        code = code.replace("$target", target);
        if let Some(tm) = &typemap {
            code = code.replace("$typemap", tm);
        }
        if let Some(p) = pname {
            code = code.replace("$parmname", p);
        }
        Some(code)
    }

    /// Attach the rendered `op` typemaps to a parameter list.
    ///
    /// At each position the longest matching rule is instantiated over the
    /// parameters it consumes; the first parameter of the group receives
    /// `tmap:<op>` (the code), `tmap:<op>:next` (a link to the parameter
    /// after the group) and one `tmap:<op>:<name>` per keyword argument.
    /// `$argnum` expands to the 1-based position of the group's first
    /// parameter. Positions with no match are skipped.
    pub fn attach(
        &self,
        op: &str,
        parms: &mut [Param],
        mut wrapper: Option<&mut Wrapper>,
        types: &TypeSystem,
    ) {
        let mut i = 0;
        while i < parms.len() {
            let Some((entry, nmatch)) = self.search_multi(op, &parms[i..], types) else {
                i += 1;
                continue;
            };
            let Some(mut code) = entry.code.clone() else {
                i += 1;
                continue;
            };
            let mut locals = entry.locals.clone();
            let kwargs = entry.kwargs.clone();
            let first = i;

            for k in 0..nmatch {
                let p = &parms[first + k];
                subst::substitute(
                    &mut code,
                    &mut locals,
                    &p.ty,
                    p.name.as_deref(),
                    p.lname.as_deref().unwrap_or(""),
                    k + 1,
                    types,
                );
            }

            if let Some(w) = wrapper.as_deref_mut() {
                if !locals.is_empty() {
                    declare_locals(&mut code, &locals, w, Some(first + 1));
                }
            }

            code = code.replace("$argnum", &(first + 1).to_string());

            let next = first + nmatch;
            let link = if next < parms.len() { Some(next) } else { None };
            let p0 = &mut parms[first];
            p0.attrs.insert(self.keys.method(op), Attached::Text(code));
            p0.attrs.insert(
                self.keys.method(&format!("{op}:next")),
                Attached::Link(link),
            );
            for kw in &kwargs {
                let Some(kname) = kw.name.as_deref() else { continue };
                p0.attrs.insert(
                    self.keys.method(&format!("{op}:{kname}")),
                    Attached::Text(kw.value.clone().unwrap_or_default()),
                );
            }
            i = next;
        }
    }
}

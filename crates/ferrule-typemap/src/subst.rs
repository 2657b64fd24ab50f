//! Template-variable substitution.
//!
//! Rule code is a template over `$`-variables. Each variable exists in an
//! indexed form (`$1_type`, `$*2_ltype`, ...) expanded for the parameter at
//! that position, and a bare form (`$type`, `$*ltype`, ...) that is shorthand
//! for position 1. Multi-argument rules call [`substitute`] once per consumed
//! parameter with increasing `index`.
//!
//! Local-variable declarations ride along: whenever a substitution fires on
//! the code, the same variable is replaced inside every local's declared
//! type. The code side receives C declaration text, the locals side the raw
//! type encoding, since local types are rendered later when the wrapper
//! declares them. Substitution into locals is a single pass: a replacement
//! that drags new `$` text into a local's type is not revisited.

use crate::parm::Param;
use ferrule_ctype as ctype;
use ferrule_ctype::TypeSystem;

/// Prefix of generated runtime type descriptors.
const DESCRIPTOR_PREFIX: &str = "SWIGTYPE";

/// Replace every occurrence of `from` in `s`, reporting whether anything
/// changed.
fn replace_all(s: &mut String, from: &str, to: &str) -> bool {
    if s.contains(from) {
        *s = s.replace(from, to);
        true
    } else {
        false
    }
}

/// Apply one substitution to every local's declared type.
fn replace_local_types(locals: &mut [Param], from: &str, to: &str) {
    for p in locals {
        if p.ty.contains(from) {
            p.ty = p.ty.replace(from, to);
        }
    }
}

/// Expand the pointer-shifted variable family (`$*...` or `$&...`) for
/// `derived`, the type with one pointer level removed or added.
fn pointer_group(
    code: &mut String,
    locals: &mut [Param],
    derived: &str,
    sigil: char,
    index: usize,
    types: &TypeSystem,
) {
    let printed = ctype::to_c(derived, None);
    if index == 1 {
        replace_all(code, &format!("${sigil}type"), &printed);
        replace_local_types(locals, &format!("${sigil}type"), derived);
    }
    let var = format!("${sigil}{index}_type");
    replace_all(code, &var, &printed);
    replace_local_types(locals, &var, derived);

    let lt = ctype::ltype(derived);
    let lprinted = ctype::to_c(&lt, None);
    if index == 1 {
        replace_all(code, &format!("${sigil}ltype"), &lprinted);
        replace_local_types(locals, &format!("${sigil}ltype"), &lt);
    }
    let var = format!("${sigil}{index}_ltype");
    replace_all(code, &var, &lprinted);
    replace_local_types(locals, &var, &lt);

    let mangled = ctype::mangle(derived);
    if index == 1 {
        replace_all(code, &format!("${sigil}mangle"), &mangled);
    }
    replace_all(code, &format!("${sigil}{index}_mangle"), &mangled);

    let descriptor = format!("{DESCRIPTOR_PREFIX}{mangled}");
    if index == 1 && replace_all(code, &format!("${sigil}descriptor"), &descriptor) {
        types.remember(derived);
    }
    if replace_all(code, &format!("${sigil}{index}_descriptor"), &descriptor) {
        types.remember(derived);
    }
}

/// Expand the `$`-variables for the parameter at 1-based `index` into `code`
/// and into the declared types of `locals`.
///
/// `lname` is the synthetic wrapper-local name; when `pname` is absent it
/// stands in for the parameter name as well. `types` provides typedef
/// resolution context and receives `remember` calls for every descriptor
/// that is actually expanded.
pub fn substitute(
    code: &mut String,
    locals: &mut [Param],
    ty: &str,
    pname: Option<&str>,
    lname: &str,
    index: usize,
    types: &TypeSystem,
) {
    let pname = pname.unwrap_or(lname);

    // locals participate only while some declared type still carries a
    // variable
    let locals: &mut [Param] = if locals.iter().any(|p| p.ty.contains('$')) {
        locals
    } else {
        &mut []
    };

    // array dimensions
    if ctype::is_array(ty) {
        for i in 0..ctype::array_ndim(ty) {
            let Some(dim) = ctype::array_getdim(ty, i) else {
                break;
            };
            if index == 1 {
                let bare = format!("$dim{i}");
                replace_all(code, &bare, dim);
                replace_local_types(locals, &bare, dim);
            }
            let indexed = format!("${index}_dim{i}");
            replace_all(code, &indexed, dim);
            replace_local_types(locals, &indexed, dim);
        }
    }

    // parameter name
    if index == 1 {
        replace_all(code, "$parmname", pname);
    }
    replace_all(code, &format!("${index}_name"), pname);

    // each type-derived group runs only when the code mentions it; the
    // locals follow whatever the code does
    if code.contains("type") {
        let printed = ctype::to_c(ty, None);
        if index == 1 {
            replace_all(code, "$type", &printed);
            replace_local_types(locals, "$type", ty);
        }
        let var = format!("${index}_type");
        replace_all(code, &var, &printed);
        replace_local_types(locals, &var, ty);
    }
    if code.contains("ltype") {
        let lt = ctype::ltype(ty);
        let printed = ctype::to_c(&lt, None);
        if index == 1 {
            replace_all(code, "$ltype", &printed);
            replace_local_types(locals, "$ltype", &lt);
        }
        let var = format!("${index}_ltype");
        replace_all(code, &var, &printed);
        replace_local_types(locals, &var, &lt);
    }
    if code.contains("mangle") || code.contains("descriptor") {
        let mangled = ctype::mangle(ty);
        if index == 1 {
            replace_all(code, "$mangle", &mangled);
        }
        replace_all(code, &format!("${index}_mangle"), &mangled);

        let descriptor = format!("{DESCRIPTOR_PREFIX}{mangled}");
        if index == 1 && replace_all(code, "$descriptor", &descriptor) {
            types.remember(ty);
        }
        if replace_all(code, &format!("${index}_descriptor"), &descriptor) {
            types.remember(ty);
        }
    }

    // one pointer level removed
    if let Some(stripped) = ctype::del_pointer(ty) {
        pointer_group(code, locals, &stripped, '*', index, types);
    } else if code.contains("$*") {
        tracing::warn!(ty, "ignoring pointer substitution on a non-pointer type");
    }

    // one pointer level added
    let added = ctype::add_pointer(ty);
    pointer_group(code, locals, &added, '&', index, types);

    // base type; locals receive the raw base like the code does
    let bt = ctype::base(ty);
    if index == 1 {
        replace_all(code, "$basetype", bt);
        replace_local_types(locals, "$basetype", bt);
    }
    let var = format!("${index}_basetype");
    replace_all(code, &var, bt);
    replace_local_types(locals, &var, bt);

    let bmangle = ctype::mangle(bt);
    if index == 1 {
        replace_all(code, "$basemangle", &bmangle);
    }
    replace_all(code, &format!("${index}_basemangle"), &bmangle);

    // the bare positional variable goes last so `$1` cannot clobber
    // `$1_type` and friends
    replace_all(code, &format!("${index}"), lname);
}

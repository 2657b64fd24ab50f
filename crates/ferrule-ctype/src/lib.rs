//! C type-string encoding for the ferrule wrapper generator.
//!
//! Types are stored as plain strings: a sequence of dot-terminated *prefix
//! elements* followed by a textual *base type*. The leftmost element is the
//! outermost constructor:
//!
//! ```text
//! p.int           int *
//! a(10).int       int [10]
//! p.a(10).int     int (*)[10]
//! q(const).p.char char *const
//! p.q(const).char char const *
//! ```
//!
//! Prefix elements are `p.` (pointer), `a(D).` (array of extent `D`, which
//! may be a number, an identifier, the wildcard `ANY`, or empty), and
//! `q(Q).` (qualifier). Everything after the last prefix element is the base
//! type (`int`, `unsigned int`, `struct Foo`, ...). Equality of types is
//! textual equality of their encodings.

mod system;

pub use system::TypeSystem;

/// One prefix element of a type encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element<'a> {
    Pointer,
    Array(&'a str),
    Qualifier(&'a str),
}

/// Find the closing parenthesis of an element payload, respecting nesting.
fn find_close(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return Some(i),
            ')' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Split off the leading prefix element, if any.
fn parse_element(t: &str) -> Option<(Element<'_>, &str)> {
    if let Some(rest) = t.strip_prefix("p.") {
        return Some((Element::Pointer, rest));
    }
    if let Some(body) = t.strip_prefix("a(") {
        let close = find_close(body)?;
        let rest = body[close + 1..].strip_prefix('.')?;
        return Some((Element::Array(&body[..close]), rest));
    }
    if let Some(body) = t.strip_prefix("q(") {
        let close = find_close(body)?;
        let rest = body[close + 1..].strip_prefix('.')?;
        return Some((Element::Qualifier(&body[..close]), rest));
    }
    None
}

/// Decompose an encoding into its prefix elements and base type.
fn elements(t: &str) -> (Vec<Element<'_>>, &str) {
    let mut prefix = Vec::new();
    let mut rest = t;
    while let Some((el, r)) = parse_element(rest) {
        prefix.push(el);
        rest = r;
    }
    (prefix, rest)
}

/// Rebuild an encoding from prefix elements and a base type.
fn render(prefix: &[Element<'_>], base: &str) -> String {
    let mut out = String::new();
    for el in prefix {
        match el {
            Element::Pointer => out.push_str("p."),
            Element::Array(d) => {
                out.push_str("a(");
                out.push_str(d);
                out.push_str(").");
            }
            Element::Qualifier(q) => {
                out.push_str("q(");
                out.push_str(q);
                out.push_str(").");
            }
        }
    }
    out.push_str(base);
    out
}

/// Construct a pointer to `t`.
pub fn pointer(t: &str) -> String {
    format!("p.{t}")
}

/// Construct an array of extent `dim` of `t`.
pub fn array(dim: &str, t: &str) -> String {
    format!("a({dim}).{t}")
}

/// Construct a `q`-qualified `t` (e.g. `const`).
pub fn qualified(q: &str, t: &str) -> String {
    format!("q({q}).{t}")
}

/// Add one pointer level.
pub fn add_pointer(t: &str) -> String {
    pointer(t)
}

/// Remove one pointer level, tolerating leading qualifiers.
/// Returns `None` if `t` is not a pointer.
pub fn del_pointer(t: &str) -> Option<String> {
    let mut rest = t;
    loop {
        match parse_element(rest) {
            Some((Element::Qualifier(_), r)) => rest = r,
            Some((Element::Pointer, r)) => return Some(r.to_string()),
            _ => return None,
        }
    }
}

/// True if `t` is a pointer, looking through leading qualifiers.
pub fn is_pointer(t: &str) -> bool {
    let mut rest = t;
    loop {
        match parse_element(rest) {
            Some((Element::Qualifier(_), r)) => rest = r,
            Some((Element::Pointer, _)) => return true,
            _ => return false,
        }
    }
}

/// True if `t` is an array.
pub fn is_array(t: &str) -> bool {
    matches!(parse_element(t), Some((Element::Array(_), _)))
}

/// Number of leading array dimensions.
pub fn array_ndim(t: &str) -> usize {
    let mut n = 0;
    let mut rest = t;
    while let Some((Element::Array(_), r)) = parse_element(rest) {
        n += 1;
        rest = r;
    }
    n
}

/// The `i`-th array dimension text, outermost first.
pub fn array_getdim(t: &str, i: usize) -> Option<&str> {
    let mut k = 0;
    let mut rest = t;
    while let Some((Element::Array(d), r)) = parse_element(rest) {
        if k == i {
            return Some(d);
        }
        k += 1;
        rest = r;
    }
    None
}

/// Replace the `i`-th array dimension. Out-of-range indices leave the
/// encoding unchanged.
pub fn array_setdim(t: &str, i: usize, dim: &str) -> String {
    let (mut prefix, base) = elements(t);
    let mut k = 0;
    for el in prefix.iter_mut() {
        if let Element::Array(_) = el {
            if k == i {
                *el = Element::Array(dim);
                break;
            }
            k += 1;
        }
    }
    render(&prefix, base)
}

/// Remove every qualifier element from the encoding.
pub fn strip_qualifiers(t: &str) -> String {
    let (prefix, base) = elements(t);
    let kept: Vec<Element<'_>> = prefix
        .into_iter()
        .filter(|e| !matches!(e, Element::Qualifier(_)))
        .collect();
    render(&kept, base)
}

/// The base type: everything after the last prefix element.
pub fn base(t: &str) -> &str {
    elements(t).1
}

/// Flatten non-identifier characters for use in mangled names.
fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Identifier-safe flattening of an encoding: `p.Foo` becomes `_p_Foo`.
/// Runtime type descriptors are named by prepending `SWIGTYPE` to this.
pub fn mangle(t: &str) -> String {
    let (prefix, base) = elements(t);
    let mut out = String::new();
    for el in &prefix {
        match el {
            Element::Pointer => out.push_str("_p"),
            Element::Array(d) => {
                out.push_str("_a");
                if !d.is_empty() {
                    out.push('_');
                    out.push_str(&sanitize(d));
                }
            }
            Element::Qualifier(q) => {
                out.push_str("_q_");
                out.push_str(&sanitize(q));
            }
        }
    }
    out.push('_');
    out.push_str(&sanitize(base));
    out
}

/// The generalization of `t` used as the last lookup resort: all pointers
/// collapse to `p.SWIGTYPE`, arrays to `a(ANY).SWIGTYPE`, enums to
/// `enum SWIGTYPE`, and anything else to the fully generic `SWIGTYPE`.
pub fn default_for(t: &str) -> String {
    let stripped = strip_qualifiers(t);
    if is_pointer(&stripped) {
        "p.SWIGTYPE".to_string()
    } else if is_array(&stripped) {
        "a(ANY).SWIGTYPE".to_string()
    } else if base(&stripped).starts_with("enum ") {
        "enum SWIGTYPE".to_string()
    } else {
        "SWIGTYPE".to_string()
    }
}

/// The local-variable variant of a type: qualifiers are dropped and an
/// outermost array decays to a pointer, so the result is always something a
/// wrapper can declare and assign to.
pub fn ltype(t: &str) -> String {
    let (prefix, base) = elements(t);
    let mut kept: Vec<Element<'_>> = Vec::new();
    for el in prefix {
        match el {
            Element::Qualifier(_) => {}
            Element::Array(_) if kept.is_empty() => kept.push(Element::Pointer),
            other => kept.push(other),
        }
    }
    render(&kept, base)
}

/// Render an encoding as C declaration text, optionally declaring `name`.
///
/// Elements are applied outermost-first, prepending `*` and qualifiers and
/// appending `[D]`, parenthesizing whenever an array binds tighter than a
/// pointer that was already emitted:
///
/// ```
/// assert_eq!(ferrule_ctype::to_c("p.a(10).int", Some("x")), "int (*x)[10]");
/// ```
pub fn to_c(t: &str, name: Option<&str>) -> String {
    let (prefix, base) = elements(t);
    let mut decl = name.unwrap_or("").to_string();
    for el in &prefix {
        match el {
            Element::Pointer => decl = format!("*{decl}"),
            Element::Qualifier(q) => decl = format!("{q} {decl}"),
            Element::Array(d) => {
                if decl.starts_with('*') {
                    decl = format!("({decl})");
                }
                decl = format!("{decl}[{d}]");
            }
        }
    }
    let decl = decl.trim_end();
    if decl.is_empty() {
        base.to_string()
    } else {
        format!("{base} {decl}")
    }
}

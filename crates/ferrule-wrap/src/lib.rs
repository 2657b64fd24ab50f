//! Wrapper-function assembly for the ferrule wrapper generator.
//!
//! A [`Wrapper`] accumulates the pieces of one generated wrapper function:
//! a set of named local-variable declarations and the function body. Typemap
//! rules inject locals through [`Wrapper::new_local`], which resolves name
//! collisions and reports the name that was actually used so the caller can
//! patch its code fragment.

use rustc_hash::FxHashMap;
use std::io;

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Replace `ident` with `replacement` in `text`, but only where the match is
/// a whole identifier (not surrounded by `[A-Za-z0-9_]`).
pub fn replace_id(text: &str, ident: &str, replacement: &str) -> String {
    if ident.is_empty() {
        return text.to_string();
    }
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while let Some(pos) = text[i..].find(ident) {
        let start = i + pos;
        let end = start + ident.len();
        let before_ok = start == 0 || !is_ident_char(bytes[start - 1]);
        let after_ok = end == text.len() || !is_ident_char(bytes[end]);
        out.push_str(&text[i..start]);
        if before_ok && after_ok {
            out.push_str(replacement);
        } else {
            out.push_str(&text[start..end]);
        }
        i = end;
    }
    out.push_str(&text[i..]);
    out
}

/// One wrapper function under construction.
#[derive(Debug, Default)]
pub struct Wrapper {
    /// Declaration text keyed by the actual local name.
    locals: FxHashMap<String, String>,
    /// Declaration order, for stable emission.
    order: Vec<String>,
    /// The function body.
    pub code: String,
}

impl Wrapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a local variable declared by `decl` under `proposed`.
    ///
    /// If `proposed` is already taken, the smallest free integer suffix >= 2
    /// is appended and the declaration text is rewritten to the new name.
    /// Returns the name that was actually registered.
    pub fn new_local(&mut self, proposed: &str, decl: &str) -> String {
        if !self.locals.contains_key(proposed) {
            self.locals.insert(proposed.to_string(), decl.to_string());
            self.order.push(proposed.to_string());
            return proposed.to_string();
        }
        let mut n = 2usize;
        loop {
            let candidate = format!("{proposed}{n}");
            if !self.locals.contains_key(&candidate) {
                let fixed = replace_id(decl, proposed, &candidate);
                self.locals.insert(candidate.clone(), fixed);
                self.order.push(candidate.clone());
                return candidate;
            }
            n += 1;
        }
    }

    /// True if a local with this exact name has been registered.
    pub fn has_local(&self, name: &str) -> bool {
        self.locals.contains_key(name)
    }

    /// The declaration text of a registered local.
    pub fn local_decl(&self, name: &str) -> Option<&str> {
        self.locals.get(name).map(String::as_str)
    }

    /// Number of registered locals.
    pub fn local_count(&self) -> usize {
        self.order.len()
    }

    /// Write the declaration block followed by the function body.
    pub fn emit(&self, w: &mut impl io::Write) -> io::Result<()> {
        for name in &self.order {
            writeln!(w, "    {};", self.locals[name])?;
        }
        w.write_all(self.code.as_bytes())
    }
}

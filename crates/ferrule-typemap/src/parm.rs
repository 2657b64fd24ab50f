//! The parameter attribute bag.
//!
//! One `Param` shape serves three roles: C parameter lists handed in by the
//! front-end, local-variable declarations carried by rules, and keyword
//! arguments. A parameter list is a `Vec<Param>`; list tails are subslices.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// A value attached to a parameter during wrapper emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attached {
    /// Rendered code or a keyword-argument value.
    Text(String),
    /// Index of another parameter in the same list; `None` marks the end
    /// of the list.
    Link(Option<usize>),
}

/// A parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Param {
    /// Type encoding (see `ferrule_ctype`). For rule locals this may
    /// contain `$`-variables until substitution runs.
    pub ty: String,
    /// Declared parameter name.
    pub name: Option<String>,
    /// Synthetic local name used inside the generated wrapper.
    pub lname: Option<String>,
    /// Value, for keyword arguments.
    pub value: Option<String>,
    /// Attributes attached by `Typemaps::attach`.
    pub attrs: FxHashMap<SmolStr, Attached>,
}

impl Param {
    pub fn new(ty: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            ..Self::default()
        }
    }

    pub fn named(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_lname(mut self, lname: impl Into<String>) -> Self {
        self.lname = Some(lname.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Text attribute attached under `key`, if any.
    pub fn attached_text(&self, key: &str) -> Option<&str> {
        match self.attrs.get(key) {
            Some(Attached::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Link attribute attached under `key`, if any.
    pub fn attached_link(&self, key: &str) -> Option<Option<usize>> {
        match self.attrs.get(key) {
            Some(Attached::Link(l)) => Some(*l),
            _ => None,
        }
    }
}

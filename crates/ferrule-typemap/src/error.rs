//! Error types for the typemap engine.

use miette::Diagnostic;
use thiserror::Error;

/// Result type for typemap operations.
pub type Result<T> = std::result::Result<T, TypemapError>;

/// Errors the typemap store can produce. Lookups never fail; a missing rule
/// is an `Option::None`, not an error.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum TypemapError {
    /// The scope stack is bounded. Running into the bound means the
    /// front-end is pushing scopes without popping them; the run must stop.
    #[error("typemap scope depth exceeds the limit of {limit}")]
    #[diagnostic(code(ferrule::typemap::scope_overflow))]
    ScopeOverflow { limit: usize },

    /// `%apply` requires source and destination lists of equal length.
    #[error("cannot copy typemap: source has {src} parameter(s), destination has {dst}")]
    #[diagnostic(code(ferrule::typemap::arity_mismatch))]
    ArityMismatch { src: usize, dst: usize },

    /// No rule matched the requested signature in any scope.
    #[error("no typemap found for method '{op}'")]
    #[diagnostic(code(ferrule::typemap::not_found))]
    NotFound { op: String },
}

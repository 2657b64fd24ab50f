//! Typemap engine for the ferrule C/C++ wrapper generator.
//!
//! A *typemap* is a named rewriting rule mapping a C/C++ type (and
//! optionally a parameter name) to a fragment of target-language code plus
//! auxiliary local variables and keyword arguments. The front-end registers
//! rules while it parses; wrapper emission queries the engine with concrete
//! parameter lists and gets back instantiated code with all `$`-variables
//! expanded.
//!
//! # Architecture
//!
//! ```text
//! register/apply/clear ──> scoped store ──> search ──> substitute ──> attach
//!                          (Typemaps)                 ($-variables)  (Param attrs)
//! ```
//!
//! The store is a stack of scopes mirroring the lexical structure of the
//! input; each scope maps type encodings (see [`ferrule_ctype`]) to nodes
//! holding per-method rule entries. Multi-argument rules encode their
//! leading `(type, name)` steps into the method key itself, so every rule
//! lives in one flat per-node map.

mod attach;
mod error;
mod except;
mod keys;
mod parm;
mod register;
mod search;
mod store;
mod subst;

pub use error::{Result, TypemapError};
pub use keys::{count_args, signature_suffix};
pub use parm::{Attached, Param};
pub use store::{MethodMap, RuleEntry, Scope, TypeNode, Typemaps, MAX_SCOPE};
pub use subst::substitute;

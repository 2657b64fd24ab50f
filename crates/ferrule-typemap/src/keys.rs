//! Method keys and the multi-argument signature codec.
//!
//! Every rule is stored under a key of the form `tmap:<method>`. A rule over
//! several parameters lives on the *last* parameter's node, with the earlier
//! `(type, name)` steps encoded into the method itself:
//!
//! ```text
//! method          stored at
//! ---------------------------------------------
//! in              int argc
//! in-int+argc:    p.p.char argv
//! ```
//!
//! so that an arbitrary number of rules can share one flat per-node map.

use crate::parm::Param;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::sync::RwLock;

/// Prefix carried by every stored method key.
pub(crate) const METHOD_PREFIX: &str = "tmap:";

/// Memoizing cache of method keys: `op` -> `tmap:<op>`.
///
/// The same handful of method names is looked up for every parameter of
/// every wrapped function, so the prefixed keys are built once and shared.
#[derive(Debug, Default)]
pub(crate) struct MethodKeys {
    map: RwLock<FxHashMap<SmolStr, SmolStr>>,
}

impl MethodKeys {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The storage key for a method name.
    pub(crate) fn method(&self, op: &str) -> SmolStr {
        {
            let map = self.map.read().unwrap();
            if let Some(k) = map.get(op) {
                return k.clone();
            }
        }
        let mut map = self.map.write().unwrap();
        if let Some(k) = map.get(op) {
            return k.clone();
        }
        let key = SmolStr::new(format!("{METHOD_PREFIX}{op}"));
        map.insert(SmolStr::new(op), key.clone());
        key
    }
}

/// Append one `(type, name)` step to a method name: `op` becomes
/// `op-<type>+<name>:`. A missing name is rendered empty.
pub(crate) fn suffix_step(op: &str, ty: &str, name: Option<&str>) -> String {
    format!("{op}-{ty}+{}:", name.unwrap_or(""))
}

/// The signature suffix encoding `parms` (all but the last parameter of a
/// multi-argument rule): `-T1+n1:-T2+n2:...`. Empty for an empty slice.
pub fn signature_suffix(parms: &[Param]) -> String {
    let mut sig = String::new();
    for p in parms {
        sig.push('-');
        sig.push_str(&p.ty);
        sig.push('+');
        if let Some(n) = &p.name {
            sig.push_str(n);
        }
        sig.push(':');
    }
    sig
}

/// Number of parameters a signature-suffixed key encodes beyond its head:
/// one `+` per step.
pub fn count_args(key: &str) -> usize {
    key.bytes().filter(|&b| b == b'+').count()
}

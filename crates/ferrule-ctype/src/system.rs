use rustc_hash::FxHashMap;
use std::sync::RwLock;

/// Stateful type context shared across a wrapper-generation run: the typedef
/// table and the registry of types whose runtime descriptors were actually
/// emitted.
///
/// All methods take `&self`; the tables are interior-mutable so the context
/// can be threaded through lookups that are otherwise read-only.
#[derive(Debug, Default)]
pub struct TypeSystem {
    typedefs: RwLock<FxHashMap<String, String>>,
    remembered: RwLock<Vec<String>>,
}

impl TypeSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `typedef <ty> <name>`.
    pub fn register_typedef(&self, name: impl Into<String>, ty: impl Into<String>) {
        self.typedefs.write().unwrap().insert(name.into(), ty.into());
    }

    /// Resolve one typedef level: the base type is replaced by its
    /// definition, prefix elements are preserved. Returns `None` when the
    /// base is not a registered typedef.
    pub fn typedef_resolve(&self, t: &str) -> Option<String> {
        let base = crate::base(t);
        let defs = self.typedefs.read().unwrap();
        let def = defs.get(base)?;
        let prefix = &t[..t.len() - base.len()];
        Some(format!("{prefix}{def}"))
    }

    /// Record that a descriptor for `t` was expanded into emitted code. The
    /// emitter later walks this registry to generate the runtime type table,
    /// so every call is logged; duplicates are collapsed at consumption.
    pub fn remember(&self, t: &str) {
        self.remembered.write().unwrap().push(t.to_string());
    }

    /// Snapshot of every `remember` call, in call order.
    pub fn remembered(&self) -> Vec<String> {
        self.remembered.read().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typedef_resolve_one_level() {
        let ts = TypeSystem::new();
        ts.register_typedef("Integer", "int");
        ts.register_typedef("IntPtr", "p.int");

        assert_eq!(ts.typedef_resolve("Integer"), Some("int".to_string()));
        // prefix elements survive resolution
        assert_eq!(ts.typedef_resolve("p.Integer"), Some("p.int".to_string()));
        assert_eq!(
            ts.typedef_resolve("q(const).IntPtr"),
            Some("q(const).p.int".to_string())
        );
        assert_eq!(ts.typedef_resolve("int"), None);
    }

    #[test]
    fn test_typedef_chain_resolves_stepwise() {
        let ts = TypeSystem::new();
        ts.register_typedef("A", "B");
        ts.register_typedef("B", "int");

        // one level at a time
        let once = ts.typedef_resolve("A").unwrap();
        assert_eq!(once, "B");
        assert_eq!(ts.typedef_resolve(&once), Some("int".to_string()));
    }

    #[test]
    fn test_remember_logs_calls() {
        let ts = TypeSystem::new();
        ts.remember("p.Foo");
        ts.remember("p.Foo");
        ts.remember("p.Bar");

        let log = ts.remembered();
        assert_eq!(log, vec!["p.Foo", "p.Foo", "p.Bar"]);
    }
}

//! Type registration and lookup.

use autobind_core::{NativeValue, TypeId};
use tracing::debug;

use crate::error::Result;
use crate::registry::Registry;

/// A registered native type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEntry {
    name: String,
    size: usize,
}

impl TypeEntry {
    pub(crate) fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }

    /// The unique name within its registry.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes, fixed at registration.
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Registry {
    /// Register a type, or return the id it already has.
    ///
    /// Registration is idempotent by name: a repeat call returns the existing
    /// id and ignores `size`.
    pub fn register_type(&mut self, name: &str, size: usize) -> TypeId {
        if let Some(&id) = self.type_names.get(name) {
            return id;
        }

        let mut probe = 0;
        let mut id = TypeId::from_name(self.session(), name);
        while self.types.contains_key(&id) {
            id = TypeId::probe(self.session(), name, probe);
            probe += 1;
        }

        self.types.insert(id, TypeEntry::new(name, size));
        self.type_names.insert(name.to_string(), id);
        debug!(type_name = name, size, type_id = %id, probes = probe, "registered type");
        id
    }

    /// Look up a type by name without registering it.
    ///
    /// Returns [`TypeId::INVALID`] when the name is unknown.
    pub fn find_type(&self, name: &str) -> TypeId {
        self.type_names
            .get(name)
            .copied()
            .unwrap_or(TypeId::INVALID)
    }

    /// Name of a registered type.
    pub fn type_name(&self, id: TypeId) -> Result<&str> {
        Ok(self.type_entry(id)?.name())
    }

    /// Size of a registered type.
    pub fn type_size(&self, id: TypeId) -> Result<usize> {
        Ok(self.type_entry(id)?.size())
    }

    /// Check whether this registry issued `id`.
    pub fn is_registered(&self, id: TypeId) -> bool {
        self.type_entry(id).is_ok()
    }

    /// Number of registered types, built-ins included.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Register `T` under its [`NativeValue::TYPE_NAME`].
    pub fn register_native<T: NativeValue>(&mut self) -> TypeId {
        self.register_type(T::TYPE_NAME, T::SIZE)
    }

    /// Id of `T` in this registry, or [`TypeId::INVALID`].
    pub fn type_of<T: NativeValue>(&self) -> TypeId {
        self.find_type(T::TYPE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::c_void;

    use super::*;
    use crate::error::BridgeError;

    #[test]
    fn register_is_idempotent() {
        let mut registry = Registry::open();
        let first = registry.register_type("Foo", 12);
        let second = registry.register_type("Foo", 99);

        assert_eq!(first, second);
        assert_eq!(registry.type_size(first).unwrap(), 12);
        assert_eq!(registry.type_name(first).unwrap(), "Foo");
    }

    #[test]
    fn find_never_registers() {
        let registry = Registry::open();
        let count = registry.type_count();

        assert_eq!(registry.find_type("DoesNotExist"), TypeId::INVALID);
        assert_eq!(registry.type_count(), count);
    }

    #[test]
    fn invalid_id_is_unknown() {
        let registry = Registry::open();
        assert!(matches!(
            registry.type_size(TypeId::INVALID),
            Err(BridgeError::UnknownType { .. })
        ));
        assert!(!registry.is_registered(TypeId::INVALID));
    }

    #[test]
    fn builtins_are_registered() {
        let registry = Registry::open();
        for name in [
            "void", "bool", "char", "i32", "u64", "f64", "ptr", "cstr", "cstring",
        ] {
            assert!(registry.find_type(name).is_valid(), "{name} missing");
        }
        assert_eq!(registry.type_size(registry.find_type("void")).unwrap(), 1);
        assert_eq!(registry.type_size(registry.type_of::<i16>()).unwrap(), 2);
        assert_eq!(
            registry
                .type_size(registry.type_of::<*mut c_void>())
                .unwrap(),
            std::mem::size_of::<usize>()
        );
    }

    #[test]
    fn register_native_matches_type_of() {
        let mut registry = Registry::open();
        let id = registry.register_native::<u32>();
        assert_eq!(id, registry.type_of::<u32>());
        assert_eq!(id, registry.find_type("u32"));
    }

    #[test]
    fn distinct_names_get_distinct_ids() {
        let mut registry = Registry::open();
        let ids: Vec<_> = (0..256)
            .map(|i| registry.register_type(&format!("T{i}"), i))
            .collect();

        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), ids.len());
        assert!(ids.iter().all(|id| id.is_valid()));
    }
}

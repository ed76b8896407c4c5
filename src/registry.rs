//! The per-session registry.
//!
//! [`Registry`] is the central store for one bridging session. It owns:
//!
//! - **Types**: name and size of every registered native type, keyed by [`TypeId`]
//! - **Conversions**: push/read routines per type
//! - **Structs and enums**: reflection descriptors used for generic marshaling
//! - **Functions**: call descriptors keyed by address, with a name index
//!
//! # Phases
//!
//! Registration takes `&mut self`. Conversions and calls take `&self`, so a
//! native function holding an `Arc<Registry>` can call back into the bridge
//! while an outer call is still running.
//!
//! # Example
//!
//! ```
//! use autobind::Registry;
//!
//! let mut registry = Registry::open();
//! let id = registry.register_type("Vec2", 8);
//! assert_eq!(registry.find_type("Vec2"), id);
//! assert_eq!(registry.type_size(id).unwrap(), 8);
//! ```

use std::fmt;

use autobind_core::{SessionId, TypeId};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::config::BridgeConfig;
use crate::conversion::{self, ConversionEntry};
use crate::error::{BridgeError, Result};
use crate::function::{FnAddr, FunctionDescriptor, ScratchPool};
use crate::reflect::{EnumDescriptor, StructDescriptor};
use crate::types::TypeEntry;

/// Type, conversion, reflection and function tables for one session.
pub struct Registry {
    session: SessionId,
    config: BridgeConfig,

    /// Every registered type by id.
    pub(crate) types: FxHashMap<TypeId, TypeEntry>,
    /// Name index into `types`.
    pub(crate) type_names: FxHashMap<String, TypeId>,
    /// Id of the pre-registered `void` type.
    pub(crate) void_type: TypeId,

    pub(crate) conversions: FxHashMap<TypeId, ConversionEntry>,
    pub(crate) structs: FxHashMap<TypeId, StructDescriptor>,
    pub(crate) enums: FxHashMap<TypeId, EnumDescriptor>,

    pub(crate) functions: FxHashMap<FnAddr, FunctionDescriptor>,
    pub(crate) function_names: FxHashMap<String, FnAddr>,

    /// Per-call argument and return arenas.
    pub(crate) scratch: ScratchPool,
}

impl Registry {
    /// Open a session with the default configuration.
    pub fn open() -> Self {
        Self::open_with(BridgeConfig::default())
    }

    /// Open a session.
    ///
    /// Built-in scalar types and their conversions are registered before
    /// this returns.
    pub fn open_with(config: BridgeConfig) -> Self {
        let session = SessionId::next();
        let mut registry = Self {
            session,
            config,
            types: FxHashMap::default(),
            type_names: FxHashMap::default(),
            void_type: TypeId::INVALID,
            conversions: FxHashMap::default(),
            structs: FxHashMap::default(),
            enums: FxHashMap::default(),
            functions: FxHashMap::default(),
            function_names: FxHashMap::default(),
            scratch: ScratchPool::new(),
        };
        conversion::register_builtins(&mut registry);
        debug!(
            session = session.as_u32(),
            types = registry.types.len(),
            argument_capacity = config.argument_capacity,
            return_capacity = config.return_capacity,
            "registry opened"
        );
        registry
    }

    /// Close the session, releasing everything it owns.
    ///
    /// Dropping the registry does the same; this only adds a log line.
    pub fn close(self) {
        debug!(
            session = self.session.as_u32(),
            types = self.types.len(),
            functions = self.functions.len(),
            "registry closed"
        );
    }

    /// The session this registry issues ids for.
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// The active configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    // ==========================================================================
    // Internal lookups
    // ==========================================================================

    pub(crate) fn type_entry(&self, id: TypeId) -> Result<&TypeEntry> {
        if id.session() != self.session {
            return Err(BridgeError::UnknownType { id });
        }
        self.types.get(&id).ok_or(BridgeError::UnknownType { id })
    }

    /// Name for error messages; falls back to the id itself.
    pub(crate) fn describe(&self, id: TypeId) -> String {
        match self.type_entry(id) {
            Ok(entry) => entry.name().to_string(),
            Err(_) => id.to_string(),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::open()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("session", &self.session)
            .field("config", &self.config)
            .field("types", &self.types.len())
            .field("conversions", &self.conversions.len())
            .field("structs", &self.structs.len())
            .field("enums", &self.enums.len())
            .field("functions", &self.functions.len())
            .finish_non_exhaustive()
    }
}

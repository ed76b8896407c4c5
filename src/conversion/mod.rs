//! Conversion dispatch between native bytes and the host stack.
//!
//! Each registered type may carry a push routine (native bytes onto the host
//! stack) and a read routine (host stack slot into native bytes). Dispatch
//! tries, in order:
//!
//! 1. the routine registered for the type
//! 2. generic struct marshaling, if the type is a declared struct
//! 3. generic enum marshaling, if the type is a declared enum
//!
//! and fails with [`BridgeError::NoConversion`] otherwise.

mod builtin;

use std::fmt;
use std::sync::Arc;

use autobind_core::{Host, NativeValue, StackIndex, TypeId};
use bitflags::bitflags;
use tracing::{debug, trace};

use crate::error::{BridgeError, Result};
use crate::registry::Registry;

pub(crate) use builtin::register_builtins;

/// Pushes the value in `src` onto the host stack, returning the number of
/// slots written.
pub type PushFn =
    Arc<dyn Fn(&Registry, &mut dyn Host, TypeId, &[u8]) -> Result<usize> + Send + Sync>;

/// Reads the host value at the given index into `dst`.
pub type ReadFn = Arc<
    dyn Fn(&Registry, &mut dyn Host, TypeId, &mut [u8], StackIndex) -> Result<()> + Send + Sync,
>;

bitflags! {
    /// Which directions a type can be converted in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ConversionSupport: u8 {
        /// Native to host.
        const PUSH = 1 << 0;
        /// Host to native.
        const READ = 1 << 1;
    }
}

/// The push/read pair registered for one type. Either half may be missing.
#[derive(Clone, Default)]
pub struct ConversionEntry {
    pub(crate) push: Option<PushFn>,
    pub(crate) read: Option<ReadFn>,
}

impl ConversionEntry {
    pub fn has_push(&self) -> bool {
        self.push.is_some()
    }

    pub fn has_read(&self) -> bool {
        self.read.is_some()
    }
}

impl fmt::Debug for ConversionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionEntry")
            .field("push", &self.has_push())
            .field("read", &self.has_read())
            .finish()
    }
}

impl Registry {
    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Set both conversion routines for `id`, replacing any previous pair.
    pub fn set_conversion<P, R>(&mut self, id: TypeId, push: P, read: R) -> Result<()>
    where
        P: Fn(&Registry, &mut dyn Host, TypeId, &[u8]) -> Result<usize> + Send + Sync + 'static,
        R: Fn(&Registry, &mut dyn Host, TypeId, &mut [u8], StackIndex) -> Result<()>
            + Send
            + Sync
            + 'static,
    {
        self.type_entry(id)?;
        let entry = ConversionEntry {
            push: Some(Arc::new(push)),
            read: Some(Arc::new(read)),
        };
        debug!(type_name = %self.describe(id), type_id = %id, "registered conversion");
        self.conversions.insert(id, entry);
        Ok(())
    }

    /// Set the push routine for `id`. The read routine is left as is.
    pub fn set_push<P>(&mut self, id: TypeId, push: P) -> Result<()>
    where
        P: Fn(&Registry, &mut dyn Host, TypeId, &[u8]) -> Result<usize> + Send + Sync + 'static,
    {
        self.type_entry(id)?;
        debug!(type_name = %self.describe(id), type_id = %id, "registered push conversion");
        self.conversions.entry(id).or_default().push = Some(Arc::new(push));
        Ok(())
    }

    /// Set the read routine for `id`. The push routine is left as is.
    pub fn set_read<R>(&mut self, id: TypeId, read: R) -> Result<()>
    where
        R: Fn(&Registry, &mut dyn Host, TypeId, &mut [u8], StackIndex) -> Result<()>
            + Send
            + Sync
            + 'static,
    {
        self.type_entry(id)?;
        debug!(type_name = %self.describe(id), type_id = %id, "registered read conversion");
        self.conversions.entry(id).or_default().read = Some(Arc::new(read));
        Ok(())
    }

    // ==========================================================================
    // Introspection
    // ==========================================================================

    /// Directions with an explicitly registered routine.
    ///
    /// Struct and enum marshaling is not counted here.
    pub fn has_conversion(&self, id: TypeId) -> ConversionSupport {
        let mut support = ConversionSupport::empty();
        if let Some(entry) = self.conversions.get(&id) {
            support.set(ConversionSupport::PUSH, entry.has_push());
            support.set(ConversionSupport::READ, entry.has_read());
        }
        support
    }

    pub fn has_push(&self, id: TypeId) -> bool {
        self.has_conversion(id).contains(ConversionSupport::PUSH)
    }

    pub fn has_read(&self, id: TypeId) -> bool {
        self.has_conversion(id).contains(ConversionSupport::READ)
    }

    // ==========================================================================
    // Dispatch
    // ==========================================================================

    /// Push the native value in `src` onto the host stack.
    ///
    /// `src` must hold at least `type_size(id)` bytes. Returns the number of
    /// stack slots written.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn push(&self, host: &mut dyn Host, id: TypeId, src: &[u8]) -> Result<usize> {
        self.check_buffer(id, src.len())?;
        trace!(type_name = %self.describe(id), "push");

        if let Some(push) = self.conversions.get(&id).and_then(|c| c.push.as_ref()) {
            return push(self, host, id, src);
        }
        if self.structs.contains_key(&id) {
            return self.struct_push(host, id, src);
        }
        if self.enums.contains_key(&id) {
            return self.enum_push(host, id, src);
        }
        Err(BridgeError::NoConversion {
            type_name: self.describe(id),
            direction: "push",
        })
    }

    /// Read the host value at `index` into `dst`.
    ///
    /// `dst` must hold at least `type_size(id)` bytes.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn read(
        &self,
        host: &mut dyn Host,
        id: TypeId,
        dst: &mut [u8],
        index: StackIndex,
    ) -> Result<()> {
        self.check_buffer(id, dst.len())?;
        trace!(type_name = %self.describe(id), index, "read");

        if let Some(read) = self.conversions.get(&id).and_then(|c| c.read.as_ref()) {
            return read(self, host, id, dst, index);
        }
        if self.structs.contains_key(&id) {
            return self.struct_read(host, id, dst, index);
        }
        if self.enums.contains_key(&id) {
            return self.enum_read(host, id, dst, index);
        }
        Err(BridgeError::NoConversion {
            type_name: self.describe(id),
            direction: "read",
        })
    }

    /// Push a typed value through the type registered as `T::TYPE_NAME`.
    pub fn push_value<T: NativeValue>(&self, host: &mut dyn Host, value: T) -> Result<usize> {
        let id = self.type_of::<T>();
        let mut buf = vec![0u8; T::SIZE.max(self.type_size(id)?)];
        value.write_bytes(&mut buf);
        self.push(host, id, &buf)
    }

    /// Read a typed value through the type registered as `T::TYPE_NAME`.
    pub fn read_value<T: NativeValue>(&self, host: &mut dyn Host, index: StackIndex) -> Result<T> {
        let id = self.type_of::<T>();
        let mut buf = vec![0u8; T::SIZE.max(self.type_size(id)?)];
        self.read(host, id, &mut buf, index)?;
        Ok(T::read_bytes(&buf))
    }

    fn check_buffer(&self, id: TypeId, available: usize) -> Result<()> {
        let entry = self.type_entry(id)?;
        if available < entry.size() {
            return Err(BridgeError::BufferTooSmall {
                type_name: entry.name().to_string(),
                required: entry.size(),
                available,
            });
        }
        Ok(())
    }
}

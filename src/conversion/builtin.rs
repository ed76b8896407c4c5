//! Conversions registered with every new session.

use std::ffi::{CStr, CString, c_void};
use std::os::raw::c_char;
use std::sync::Arc;

use autobind_core::{
    ConversionError, Dynamic, FromDynamic, Host, IntoDynamic, NativeValue, StackIndex, TypeId,
};
use tracing::debug;

use super::{ConversionEntry, PushFn, ReadFn};
use crate::error::Result;
use crate::registry::Registry;

pub(crate) fn register_builtins(registry: &mut Registry) {
    let void = registry.register_native::<()>();
    registry.void_type = void;
    install(
        registry,
        void,
        Some(Arc::new(push_void)),
        Arc::new(read_void),
    );

    scalar::<bool>(registry);
    scalar::<char>(registry);
    scalar::<i8>(registry);
    scalar::<i16>(registry);
    scalar::<i32>(registry);
    scalar::<i64>(registry);
    scalar::<isize>(registry);
    scalar::<u8>(registry);
    scalar::<u16>(registry);
    scalar::<u32>(registry);
    scalar::<u64>(registry);
    scalar::<usize>(registry);
    scalar::<f32>(registry);
    scalar::<f64>(registry);
    scalar::<*mut c_void>(registry);

    // Pushing dereferences the pointer, so it waits for `enable_c_string_push`.
    let cstr = registry.register_native::<*const c_char>();
    install(registry, cstr, None, Arc::new(read_cstr));
    let cstring = registry.register_native::<*mut c_char>();
    install(registry, cstring, None, Arc::new(read_cstring));
}

fn scalar<T: NativeValue + FromDynamic + IntoDynamic>(registry: &mut Registry) {
    let id = registry.register_native::<T>();
    install(
        registry,
        id,
        Some(Arc::new(push_scalar::<T>)),
        Arc::new(read_scalar::<T>),
    );
}

fn install(registry: &mut Registry, id: TypeId, push: Option<PushFn>, read: ReadFn) {
    registry.conversions.insert(
        id,
        ConversionEntry {
            push,
            read: Some(read),
        },
    );
}

impl Registry {
    /// Let the built-in `cstr` and `cstring` types push.
    ///
    /// A string push dereferences the pointer held in the source bytes, so
    /// the string types are read-only until this is called. Pushing them
    /// before that fails with [`BridgeError::NoConversion`]. Use
    /// [`Registry::push_c_str`] to push a borrowed string without opting in.
    ///
    /// # Safety
    ///
    /// From this call on, every buffer pushed as `cstr` or `cstring` must hold
    /// either a null pointer or a pointer to a NUL-terminated string that is
    /// live for the duration of the push. That covers buffers passed to
    /// [`Registry::push`] and [`Registry::push_value`], struct members pushed
    /// by [`Registry::struct_push`], and results written by the thunk of any
    /// function returning one of these types.
    ///
    /// [`BridgeError::NoConversion`]: crate::BridgeError::NoConversion
    pub unsafe fn enable_c_string_push(&mut self) {
        let cstr = self.type_of::<*const c_char>();
        let cstring = self.type_of::<*mut c_char>();
        for id in [cstr, cstring] {
            self.conversions.entry(id).or_default().push = Some(Arc::new(push_c_string));
        }
        debug!("enabled C string push");
    }

    /// Push a borrowed C string as a host string.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn push_c_str(&self, host: &mut dyn Host, text: &CStr) -> usize {
        host.push(Dynamic::String(text.to_string_lossy().into_owned()))
    }
}

fn push_void(_: &Registry, _: &mut dyn Host, _: TypeId, _: &[u8]) -> Result<usize> {
    Ok(0)
}

fn read_void(_: &Registry, _: &mut dyn Host, _: TypeId, _: &mut [u8], _: StackIndex) -> Result<()> {
    Ok(())
}

fn push_scalar<T: NativeValue + IntoDynamic>(
    _: &Registry,
    host: &mut dyn Host,
    _: TypeId,
    src: &[u8],
) -> Result<usize> {
    Ok(host.push(T::read_bytes(src).into_dynamic()))
}

fn read_scalar<T: NativeValue + FromDynamic>(
    _: &Registry,
    host: &mut dyn Host,
    _: TypeId,
    dst: &mut [u8],
    index: StackIndex,
) -> Result<()> {
    T::from_dynamic(host.value(index)?)?.write_bytes(dst);
    Ok(())
}

/// Pushes the NUL-terminated string a `cstr` or `cstring` points at.
///
/// Only installed by [`Registry::enable_c_string_push`].
fn push_c_string(registry: &Registry, host: &mut dyn Host, _: TypeId, src: &[u8]) -> Result<usize> {
    let ptr = usize::read_bytes(src) as *const c_char;
    if ptr.is_null() {
        return Ok(host.push(Dynamic::Nil));
    }
    // SAFETY: `enable_c_string_push` obliges its caller to only push null or
    // live NUL-terminated pointers through these types.
    let text = unsafe { CStr::from_ptr(ptr) };
    Ok(registry.push_c_str(host, text))
}

/// Borrows the host's copy; valid while the slot stays on the stack.
fn read_cstr(
    _: &Registry,
    host: &mut dyn Host,
    _: TypeId,
    dst: &mut [u8],
    index: StackIndex,
) -> Result<()> {
    NativeValue::write_bytes(host.cstr(index)?, dst);
    Ok(())
}

/// Allocates a copy the caller owns and must release with `CString::from_raw`.
fn read_cstring(
    _: &Registry,
    host: &mut dyn Host,
    _: TypeId,
    dst: &mut [u8],
    index: StackIndex,
) -> Result<()> {
    let ptr: *mut c_char = match host.value(index)? {
        Dynamic::Nil => std::ptr::null_mut(),
        Dynamic::String(s) => CString::new(s.as_str())
            .map_err(|_| ConversionError::InvalidCString)?
            .into_raw(),
        other => {
            return Err(ConversionError::TypeMismatch {
                expected: "string",
                actual: other.type_name(),
            }
            .into());
        }
    };
    NativeValue::write_bytes(ptr, dst);
    Ok(())
}

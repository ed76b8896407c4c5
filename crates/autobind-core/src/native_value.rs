//! Fixed-layout byte codec for native scalar types.
//!
//! Native values travel through the bridge as plain byte buffers. A
//! [`NativeValue`] knows the registry name of its type, how many bytes it
//! occupies, and how to move itself in and out of such a buffer using the
//! platform's native byte order.
//!
//! ## Built-in names
//!
//! | Rust type        | Name      |
//! |------------------|-----------|
//! | `()`             | `void`    |
//! | `bool`           | `bool`    |
//! | `char`           | `char`    |
//! | `i8`..`i64`      | `i8`..`i64` |
//! | `u8`..`u64`      | `u8`..`u64` |
//! | `isize`/`usize`  | `isize`/`usize` |
//! | `f32`/`f64`      | `f32`/`f64` |
//! | `*mut c_void`    | `ptr`     |
//! | `*const c_char`  | `cstr`    |
//! | `*mut c_char`    | `cstring` |

use std::ffi::c_void;
use std::os::raw::c_char;

/// Registry names of the built-in types.
pub mod names {
    pub const VOID: &str = "void";
    pub const BOOL: &str = "bool";
    pub const CHAR: &str = "char";
    pub const I8: &str = "i8";
    pub const I16: &str = "i16";
    pub const I32: &str = "i32";
    pub const I64: &str = "i64";
    pub const ISIZE: &str = "isize";
    pub const U8: &str = "u8";
    pub const U16: &str = "u16";
    pub const U32: &str = "u32";
    pub const U64: &str = "u64";
    pub const USIZE: &str = "usize";
    pub const F32: &str = "f32";
    pub const F64: &str = "f64";
    pub const PTR: &str = "ptr";
    pub const CSTR: &str = "cstr";
    pub const CSTRING: &str = "cstring";
}

/// A `Copy` type with a fixed byte layout and a registry name.
///
/// `write_bytes` and `read_bytes` require buffers of at least `SIZE` bytes and
/// panic on shorter ones, like slice indexing does. The bridge checks buffer
/// lengths before calling them.
pub trait NativeValue: Copy + 'static {
    /// The name this type is registered under.
    const TYPE_NAME: &'static str;

    /// Bytes occupied in a buffer.
    const SIZE: usize;

    /// Encode into the first `SIZE` bytes of `out`.
    fn write_bytes(self, out: &mut [u8]);

    /// Decode from the first `SIZE` bytes of `bytes`.
    fn read_bytes(bytes: &[u8]) -> Self;
}

macro_rules! impl_native_value_num {
    ($($ty:ty => $name:expr),* $(,)?) => {
        $(
            impl NativeValue for $ty {
                const TYPE_NAME: &'static str = $name;
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn write_bytes(self, out: &mut [u8]) {
                    out[..Self::SIZE].copy_from_slice(&self.to_ne_bytes());
                }

                #[inline]
                fn read_bytes(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$ty>()];
                    buf.copy_from_slice(&bytes[..Self::SIZE]);
                    <$ty>::from_ne_bytes(buf)
                }
            }
        )*
    };
}

impl_native_value_num!(
    i8 => names::I8,
    i16 => names::I16,
    i32 => names::I32,
    i64 => names::I64,
    isize => names::ISIZE,
    u8 => names::U8,
    u16 => names::U16,
    u32 => names::U32,
    u64 => names::U64,
    usize => names::USIZE,
    f32 => names::F32,
    f64 => names::F64,
);

/// `void` has no value; it occupies one nominal byte that is never touched.
impl NativeValue for () {
    const TYPE_NAME: &'static str = names::VOID;
    const SIZE: usize = 1;

    #[inline]
    fn write_bytes(self, _out: &mut [u8]) {}

    #[inline]
    fn read_bytes(_bytes: &[u8]) -> Self {}
}

impl NativeValue for bool {
    const TYPE_NAME: &'static str = names::BOOL;
    const SIZE: usize = 1;

    #[inline]
    fn write_bytes(self, out: &mut [u8]) {
        out[0] = self as u8;
    }

    #[inline]
    fn read_bytes(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

impl NativeValue for char {
    const TYPE_NAME: &'static str = names::CHAR;
    const SIZE: usize = 4;

    #[inline]
    fn write_bytes(self, out: &mut [u8]) {
        (self as u32).write_bytes(out);
    }

    /// Invalid scalar values decode as U+FFFD.
    #[inline]
    fn read_bytes(bytes: &[u8]) -> Self {
        char::from_u32(u32::read_bytes(bytes))
            .unwrap_or(char::REPLACEMENT_CHARACTER)
    }
}

macro_rules! impl_native_value_ptr {
    ($($ty:ty => $name:expr),* $(,)?) => {
        $(
            impl NativeValue for $ty {
                const TYPE_NAME: &'static str = $name;
                const SIZE: usize = std::mem::size_of::<usize>();

                #[inline]
                fn write_bytes(self, out: &mut [u8]) {
                    (self as usize).write_bytes(out);
                }

                #[inline]
                fn read_bytes(bytes: &[u8]) -> Self {
                    usize::read_bytes(bytes) as $ty
                }
            }
        )*
    };
}

impl_native_value_ptr!(
    *mut c_void => names::PTR,
    *const c_char => names::CSTR,
    *mut c_char => names::CSTRING,
);

//! Thunks: the adapters between packed argument buffers and native calls.
//!
//! The bridge never calls a native function directly. It reads every argument
//! into one contiguous buffer, hands that buffer to the function's [`Thunk`]
//! inside a [`ThunkFrame`], and pushes whatever the thunk wrote into the
//! return buffer.
//!
//! Plain Rust `fn` pointers whose parameters and result are all
//! [`NativeValue`]s get a thunk for free through [`NativeFunction`]:
//!
//! ```ignore
//! fn add(a: i32, b: i32) -> i32 { a + b }
//! registry.register_fn(add as fn(i32, i32) -> i32, Some("add"))?;
//! ```

use std::fmt;

use autobind_core::{NativeError, NativeValue};

/// Address identifying a registered function.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FnAddr(usize);

impl FnAddr {
    pub const fn new(address: usize) -> Self {
        FnAddr(address)
    }

    /// Address of a typed native function pointer.
    pub fn of<F: NativeFunction>(f: F) -> Self {
        f.address()
    }

    pub const fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Debug for FnAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FnAddr({:#x})", self.0)
    }
}

impl fmt::Display for FnAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Argument and return buffers for one call.
///
/// Arguments are packed back to back in declaration order, each occupying
/// the size its type was registered with.
pub struct ThunkFrame<'a> {
    args: &'a [u8],
    arg_sizes: &'a [usize],
    ret: &'a mut [u8],
    address: FnAddr,
}

impl<'a> ThunkFrame<'a> {
    pub fn new(args: &'a [u8], arg_sizes: &'a [usize], ret: &'a mut [u8], address: FnAddr) -> Self {
        Self {
            args,
            arg_sizes,
            ret,
            address,
        }
    }

    /// Address of the function being called.
    pub fn address(&self) -> FnAddr {
        self.address
    }

    pub fn arg_count(&self) -> usize {
        self.arg_sizes.len()
    }

    /// The whole packed argument buffer.
    pub fn args(&self) -> &[u8] {
        self.args
    }

    /// Bytes of one argument.
    pub fn arg_bytes(&self, index: usize) -> Result<&[u8], NativeError> {
        let size = *self
            .arg_sizes
            .get(index)
            .ok_or(NativeError::ArgumentIndexOutOfBounds {
                index,
                count: self.arg_count(),
            })?;
        let offset: usize = self.arg_sizes[..index].iter().sum();
        self.args
            .get(offset..offset + size)
            .ok_or_else(|| NativeError::SlotTooSmall {
                what: format!("argument buffer at {index}"),
                required: offset + size,
                available: self.args.len(),
            })
    }

    /// Decode one argument.
    ///
    /// ```ignore
    /// let x: i32 = frame.arg(0)?;
    /// let y: f64 = frame.arg(1)?;
    /// ```
    pub fn arg<T: NativeValue>(&self, index: usize) -> Result<T, NativeError> {
        let bytes = self.arg_bytes(index)?;
        if bytes.len() < T::SIZE {
            return Err(NativeError::SlotTooSmall {
                what: format!("argument {index}"),
                required: T::SIZE,
                available: bytes.len(),
            });
        }
        Ok(T::read_bytes(bytes))
    }

    /// The raw return buffer, sized for the registered return type.
    pub fn return_bytes(&mut self) -> &mut [u8] {
        &mut *self.ret
    }

    /// Encode the return value.
    pub fn set_return<T: NativeValue>(&mut self, value: T) -> Result<(), NativeError> {
        if self.ret.len() < T::SIZE {
            return Err(NativeError::SlotTooSmall {
                what: "return".to_string(),
                required: T::SIZE,
                available: self.ret.len(),
            });
        }
        value.write_bytes(self.ret);
        Ok(())
    }
}

impl fmt::Debug for ThunkFrame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThunkFrame")
            .field("address", &self.address)
            .field("arg_sizes", &self.arg_sizes)
            .field("return_size", &self.ret.len())
            .finish()
    }
}

/// Unpacks a frame, performs the native call and packs its result.
pub trait Thunk {
    fn call(&self, frame: &mut ThunkFrame<'_>) -> Result<(), NativeError>;
}

impl<F> Thunk for F
where
    F: Fn(&mut ThunkFrame<'_>) -> Result<(), NativeError>,
{
    fn call(&self, frame: &mut ThunkFrame<'_>) -> Result<(), NativeError> {
        (self)(frame)
    }
}

/// A `fn` pointer callable through the bridge without a hand-written thunk.
///
/// Implemented for `fn(A1, .., An) -> R` with up to eight parameters, where
/// every parameter and the result implement [`NativeValue`]. Use `()` as the
/// result for functions returning nothing.
pub trait NativeFunction: Copy + Send + Sync + 'static {
    fn address(self) -> FnAddr;

    /// Registry name of the result type.
    fn return_type_name() -> &'static str;

    /// Registry names of the parameter types, in order.
    fn arg_type_names() -> Vec<&'static str>;

    /// Decode the arguments, call, and encode the result.
    fn invoke(self, frame: &mut ThunkFrame<'_>) -> Result<(), NativeError>;
}

macro_rules! impl_native_function {
    ($($arg:ident $var:ident),*) => {
        impl<Ret: NativeValue, $($arg: NativeValue),*> NativeFunction for fn($($arg),*) -> Ret {
            fn address(self) -> FnAddr {
                FnAddr(self as usize)
            }

            fn return_type_name() -> &'static str {
                Ret::TYPE_NAME
            }

            fn arg_type_names() -> Vec<&'static str> {
                vec![$($arg::TYPE_NAME),*]
            }

            #[allow(unused_mut, unused_variables, unused_assignments)]
            fn invoke(self, frame: &mut ThunkFrame<'_>) -> Result<(), NativeError> {
                let mut index = 0usize;
                $(
                    let $var: $arg = frame.arg(index)?;
                    index += 1;
                )*
                frame.set_return((self)($($var),*))
            }
        }
    };
}

impl_native_function!();
impl_native_function!(A1 a1);
impl_native_function!(A1 a1, A2 a2);
impl_native_function!(A1 a1, A2 a2, A3 a3);
impl_native_function!(A1 a1, A2 a2, A3 a3, A4 a4);
impl_native_function!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
impl_native_function!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6);
impl_native_function!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7);
impl_native_function!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8);

/// Thunk over a typed `fn` pointer.
pub(crate) struct TypedThunk<F>(pub(crate) F);

impl<F: NativeFunction> Thunk for TypedThunk<F> {
    fn call(&self, frame: &mut ThunkFrame<'_>) -> Result<(), NativeError> {
        self.0.invoke(frame)
    }
}

//! Conversion traits between native scalars and host values.
//!
//! - [`FromDynamic`]: extract a Rust value from a [`Dynamic`]
//! - [`IntoDynamic`]: convert a Rust value into a [`Dynamic`]
//!
//! ## Numeric rules
//!
//! - Integers are range-checked on the way in and never wrap.
//! - A float with an integral value is accepted for integer targets when it
//!   fits; anything else is [`ConversionError::NotIntegral`].
//! - `u64` and `usize` reinterpret the bits of the host's `i64`, so its full range
//!   survives a round trip.
//! - `bool` only accepts booleans.
//!
//! ```ignore
//! let value: i32 = i32::from_dynamic(&Dynamic::Int(42))?;
//! let back: Dynamic = value.into_dynamic();
//! ```

use std::ffi::c_void;

use crate::error::ConversionError;
use crate::runtime::Dynamic;

/// Extract a value from a host value.
pub trait FromDynamic: Sized {
    /// Returns a `ConversionError` if the value has an incompatible kind or
    /// is out of range.
    fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError>;
}

/// Convert a value into a host value.
pub trait IntoDynamic {
    fn into_dynamic(self) -> Dynamic;
}

fn integral_float(value: f64) -> Option<i128> {
    let integral = value.is_finite() && value.fract() == 0.0;
    integral.then_some(value as i128)
}

// ============================================================================
// Integer implementations
// ============================================================================

macro_rules! impl_dynamic_int {
    ($($ty:ty),*) => {
        $(
            impl FromDynamic for $ty {
                fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError> {
                    match value {
                        Dynamic::Int(v) => <$ty>::try_from(*v).map_err(|_| {
                            ConversionError::IntegerOverflow {
                                value: *v,
                                target_type: stringify!($ty),
                            }
                        }),
                        Dynamic::Float(v) => integral_float(*v)
                            .and_then(|wide| <$ty>::try_from(wide).ok())
                            .ok_or(ConversionError::NotIntegral {
                                value: *v,
                                target_type: stringify!($ty),
                            }),
                        _ => Err(ConversionError::TypeMismatch {
                            expected: "int",
                            actual: value.type_name(),
                        }),
                    }
                }
            }

            impl IntoDynamic for $ty {
                fn into_dynamic(self) -> Dynamic {
                    Dynamic::Int(self as i64)
                }
            }
        )*
    };
}

impl_dynamic_int!(i8, i16, i32, i64, isize, u8, u16, u32);

// Reinterprets the host's i64 bits so values above i64::MAX round-trip.
macro_rules! impl_dynamic_wide_unsigned {
    ($($ty:ty),*) => {
        $(
            impl FromDynamic for $ty {
                fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError> {
                    match value {
                        Dynamic::Int(v) => <$ty>::try_from(*v as u64).map_err(|_| {
                            ConversionError::IntegerOverflow {
                                value: *v,
                                target_type: stringify!($ty),
                            }
                        }),
                        Dynamic::Float(v) => integral_float(*v)
                            .and_then(|wide| <$ty>::try_from(wide).ok())
                            .ok_or(ConversionError::NotIntegral {
                                value: *v,
                                target_type: stringify!($ty),
                            }),
                        _ => Err(ConversionError::TypeMismatch {
                            expected: "int",
                            actual: value.type_name(),
                        }),
                    }
                }
            }

            impl IntoDynamic for $ty {
                fn into_dynamic(self) -> Dynamic {
                    Dynamic::Int(self as i64)
                }
            }
        )*
    };
}

impl_dynamic_wide_unsigned!(u64, usize);

// ============================================================================
// Float implementations
// ============================================================================

impl FromDynamic for f32 {
    fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError> {
        match value {
            Dynamic::Float(v) => Ok(*v as f32),
            Dynamic::Int(v) => Ok(*v as f32),
            _ => Err(ConversionError::TypeMismatch {
                expected: "float",
                actual: value.type_name(),
            }),
        }
    }
}

impl IntoDynamic for f32 {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::Float(self as f64)
    }
}

impl FromDynamic for f64 {
    fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError> {
        match value {
            Dynamic::Float(v) => Ok(*v),
            Dynamic::Int(v) => Ok(*v as f64),
            _ => Err(ConversionError::TypeMismatch {
                expected: "float",
                actual: value.type_name(),
            }),
        }
    }
}

impl IntoDynamic for f64 {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::Float(self)
    }
}

// ============================================================================
// Bool, char and pointer implementations
// ============================================================================

impl FromDynamic for bool {
    fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError> {
        match value {
            Dynamic::Bool(v) => Ok(*v),
            _ => Err(ConversionError::TypeMismatch {
                expected: "bool",
                actual: value.type_name(),
            }),
        }
    }
}

impl IntoDynamic for bool {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::Bool(self)
    }
}

/// A one-character string, or an integer code point.
impl FromDynamic for char {
    fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError> {
        let mismatch = || ConversionError::TypeMismatch {
            expected: "char",
            actual: value.type_name(),
        };
        match value {
            Dynamic::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(mismatch()),
                }
            }
            Dynamic::Int(v) => u32::try_from(*v)
                .ok()
                .and_then(char::from_u32)
                .ok_or(ConversionError::IntegerOverflow {
                    value: *v,
                    target_type: "char",
                }),
            _ => Err(mismatch()),
        }
    }
}

impl IntoDynamic for char {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::String(self.to_string())
    }
}

/// `Nil` reads as a null pointer.
impl FromDynamic for *mut c_void {
    fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError> {
        match value {
            Dynamic::Pointer(addr) => Ok(*addr as *mut c_void),
            Dynamic::Nil => Ok(std::ptr::null_mut()),
            _ => Err(ConversionError::TypeMismatch {
                expected: "pointer",
                actual: value.type_name(),
            }),
        }
    }
}

/// A null pointer becomes `Nil`.
impl IntoDynamic for *mut c_void {
    fn into_dynamic(self) -> Dynamic {
        if self.is_null() {
            Dynamic::Nil
        } else {
            Dynamic::Pointer(self as usize)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // FromDynamic tests
    // ========================================================================

    #[test]
    fn int_narrowing_in_range() {
        assert_eq!(i8::from_dynamic(&Dynamic::Int(-128)).unwrap(), -128);
        assert_eq!(u8::from_dynamic(&Dynamic::Int(255)).unwrap(), 255);
        assert_eq!(i32::from_dynamic(&Dynamic::Int(42)).unwrap(), 42);
    }

    #[test]
    fn int_narrowing_overflow() {
        assert!(matches!(
            u8::from_dynamic(&Dynamic::Int(256)),
            Err(ConversionError::IntegerOverflow {
                value: 256,
                target_type: "u8"
            })
        ));
        assert!(matches!(
            u16::from_dynamic(&Dynamic::Int(-1)),
            Err(ConversionError::IntegerOverflow { .. })
        ));
    }

    #[test]
    fn integral_float_accepted_for_ints() {
        assert_eq!(i32::from_dynamic(&Dynamic::Float(7.0)).unwrap(), 7);
        assert_eq!(u64::from_dynamic(&Dynamic::Float(3.0)).unwrap(), 3);
    }

    #[test]
    fn fractional_float_rejected_for_ints() {
        assert!(matches!(
            i32::from_dynamic(&Dynamic::Float(2.5)),
            Err(ConversionError::NotIntegral { .. })
        ));
        assert!(matches!(
            u8::from_dynamic(&Dynamic::Float(300.0)),
            Err(ConversionError::NotIntegral { .. })
        ));
        assert!(i64::from_dynamic(&Dynamic::Float(f64::NAN)).is_err());
        assert!(i64::from_dynamic(&Dynamic::Float(9.3e18)).is_err());
    }

    #[test]
    fn u64_full_range() {
        let max = u64::MAX.into_dynamic();
        assert_eq!(max, Dynamic::Int(-1));
        assert_eq!(u64::from_dynamic(&max).unwrap(), u64::MAX);
    }

    #[test]
    fn usize_full_range() {
        let max = usize::MAX.into_dynamic();
        assert_eq!(usize::from_dynamic(&max).unwrap(), usize::MAX);
        assert!(usize::from_dynamic(&Dynamic::Float(-1.0)).is_err());
    }

    #[test]
    fn floats() {
        assert_eq!(f64::from_dynamic(&Dynamic::Float(2.5)).unwrap(), 2.5);
        assert_eq!(f64::from_dynamic(&Dynamic::Int(3)).unwrap(), 3.0);
        assert_eq!(f32::from_dynamic(&Dynamic::Float(0.1)).unwrap(), 0.1f32);
    }

    #[test]
    fn bool_is_strict() {
        assert!(bool::from_dynamic(&Dynamic::Bool(true)).unwrap());
        assert!(matches!(
            bool::from_dynamic(&Dynamic::Int(1)),
            Err(ConversionError::TypeMismatch {
                expected: "bool",
                actual: "int"
            })
        ));
    }

    #[test]
    fn char_from_string_or_code_point() {
        assert_eq!(char::from_dynamic(&Dynamic::from("x")).unwrap(), 'x');
        assert_eq!(char::from_dynamic(&Dynamic::Int(65)).unwrap(), 'A');
        assert!(char::from_dynamic(&Dynamic::from("xy")).is_err());
        assert!(char::from_dynamic(&Dynamic::from("")).is_err());
        assert!(char::from_dynamic(&Dynamic::Int(0xD800)).is_err());
    }

    #[test]
    fn pointer_nil_is_null() {
        let null: *mut c_void = std::ptr::null_mut();
        assert_eq!(null.into_dynamic(), Dynamic::Nil);
        let nil = <*mut c_void>::from_dynamic(&Dynamic::Nil).unwrap();
        assert!(nil.is_null());
        let raw = Dynamic::Pointer(0x1000);
        let ptr = <*mut c_void>::from_dynamic(&raw).unwrap();
        assert_eq!(ptr as usize, 0x1000);
    }

    #[test]
    fn type_mismatch() {
        assert!(matches!(
            i32::from_dynamic(&Dynamic::from("5")),
            Err(ConversionError::TypeMismatch {
                expected: "int",
                actual: "string"
            })
        ));
        assert!(f32::from_dynamic(&Dynamic::Nil).is_err());
    }

    // ========================================================================
    // IntoDynamic tests
    // ========================================================================

    #[test]
    fn into_dynamic() {
        assert_eq!((-5i8).into_dynamic(), Dynamic::Int(-5));
        assert_eq!(1.5f32.into_dynamic(), Dynamic::Float(1.5));
        assert_eq!(true.into_dynamic(), Dynamic::Bool(true));
        assert_eq!('z'.into_dynamic(), Dynamic::from("z"));
    }
}

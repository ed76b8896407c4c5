//! Error types shared by the host model and the scalar codecs.
//!
//! ```text
//! HostError          - stack access failures reported by a Host
//! └── ConversionError  - a host value can't become the requested native value
//! NativeError        - failures reported from inside a thunk
//! ```

use thiserror::Error;

/// A host value could not be converted to the requested native type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// The host value has the wrong kind.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The native type that was requested.
        expected: &'static str,
        /// The kind of host value found.
        actual: &'static str,
    },

    /// An integer does not fit in the target type.
    #[error("integer overflow: value {value} does not fit in {target_type}")]
    IntegerOverflow {
        /// The value that overflowed.
        value: i64,
        /// The target type.
        target_type: &'static str,
    },

    /// A float with a fractional part (or out of range) was read as an integer.
    #[error("float {value} cannot be represented as {target_type}")]
    NotIntegral {
        /// The offending float.
        value: f64,
        /// The target type.
        target_type: &'static str,
    },

    /// A string containing an interior NUL byte was read as a C string.
    #[error("string contains an interior NUL byte")]
    InvalidCString,
}

/// Failures reported by a [`Host`](crate::Host) while accessing its stack.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    /// A stack index does not refer to a live slot.
    #[error("stack index {index} out of range (stack has {size} values)")]
    IndexOutOfRange {
        /// The index as given by the caller.
        index: i32,
        /// The stack size at the time.
        size: usize,
    },

    /// Field access was attempted on a value that is not a table.
    #[error("value at stack index {index} is {actual}, not a table")]
    NotATable {
        /// The index of the value.
        index: i32,
        /// The kind of value found.
        actual: &'static str,
    },

    /// The slot exists but its value can't be viewed as requested.
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// Errors a thunk can report while running a native function.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NativeError {
    /// The thunk asked for an argument the frame does not carry.
    #[error("argument index {index} out of bounds (function has {count} arguments)")]
    ArgumentIndexOutOfBounds { index: usize, count: usize },

    /// An argument or return slot is smaller than the value written to it.
    #[error("{what} holds {available} bytes, {required} needed")]
    SlotTooSmall {
        /// Which slot ("argument 0", "return").
        what: String,
        /// Bytes needed.
        required: usize,
        /// Bytes available.
        available: usize,
    },

    /// Argument or return conversion failed.
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Generic native error.
    #[error("native error: {message}")]
    Other { message: String },
}

impl NativeError {
    /// Create a generic native error.
    pub fn other(message: impl Into<String>) -> Self {
        NativeError::Other {
            message: message.into(),
        }
    }
}

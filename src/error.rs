//! Error type for registry, conversion and call operations.
//!
//! ## Error Hierarchy
//!
//! ```text
//! BridgeError
//! ├── lookups      - UnknownType, UnknownMember, UnknownValue, UnknownFunction
//! ├── conversion   - NoConversion, BufferTooSmall, Conversion(ConversionError)
//! ├── aggregates   - NotAStruct, NotAnEnum, InvalidEnumSize, EnumValueSize, DuplicateEnumValue
//! ├── calls        - CapacityExceeded, ArgumentCount
//! └── wrapped      - Host(HostError), Native(NativeError)
//! ```
//!
//! [`BridgeError::kind`] folds these into a flat [`ErrorKind`] for callers
//! that only care about the category.

use autobind_core::{ConversionError, HostError, NativeError, TypeId};
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors reported by a [`Registry`](crate::Registry).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    // ========================================================================
    // Lookups
    // ========================================================================
    /// The id was not issued by this registry.
    #[error("unknown type {id}")]
    UnknownType { id: TypeId },

    /// The struct has no member with that offset or name.
    #[error("struct '{type_name}' has no member {member}")]
    UnknownMember { type_name: String, member: String },

    /// The enum has no value with that name.
    #[error("enum '{type_name}' has no value named '{name}'")]
    UnknownValue { type_name: String, name: String },

    /// No function is registered under that address or name.
    #[error("unknown function {function}")]
    UnknownFunction { function: String },

    // ========================================================================
    // Conversion
    // ========================================================================
    /// Neither a conversion routine nor a struct or enum descriptor exists.
    #[error("no {direction} conversion registered for type '{type_name}'")]
    NoConversion {
        type_name: String,
        /// "push" or "read".
        direction: &'static str,
    },

    /// A native buffer is shorter than the type it should hold.
    #[error("buffer for '{type_name}' holds {available} bytes, {required} needed")]
    BufferTooSmall {
        type_name: String,
        required: usize,
        available: usize,
    },

    /// A host value could not become the requested native value.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    // ========================================================================
    // Aggregates
    // ========================================================================
    #[error("type '{type_name}' is not a declared struct")]
    NotAStruct { type_name: String },

    #[error("type '{type_name}' is not a declared enum")]
    NotAnEnum { type_name: String },

    /// Enum underlying sizes must be 1, 2, 4 or 8 bytes.
    #[error("invalid enum size {size} for '{type_name}'")]
    InvalidEnumSize { type_name: String, size: usize },

    /// A raw enum value does not match the declared underlying size.
    #[error("enum '{type_name}' values are {expected} bytes, got {actual}")]
    EnumValueSize {
        type_name: String,
        expected: usize,
        actual: usize,
    },

    #[error("enum '{type_name}' already has a value named '{name}'")]
    DuplicateEnumValue { type_name: String, name: String },

    // ========================================================================
    // Calls
    // ========================================================================
    /// A signature does not fit the configured argument or return buffer.
    #[error("'{function}' needs {required} bytes for its {what}, capacity is {capacity}")]
    CapacityExceeded {
        function: String,
        /// "arguments" or "return value".
        what: &'static str,
        required: usize,
        capacity: usize,
    },

    /// The host stack holds fewer values than the function takes.
    #[error("'{function}' takes {expected} arguments, stack has {actual}")]
    ArgumentCount {
        function: String,
        expected: usize,
        actual: usize,
    },

    // ========================================================================
    // Wrapped
    // ========================================================================
    #[error("host error: {0}")]
    Host(#[from] HostError),

    #[error("native function failed: {0}")]
    Native(#[from] NativeError),
}

/// Category of a [`BridgeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnknownType,
    UnknownMember,
    UnknownValue,
    UnknownFunction,
    NoConversion,
    TypeMismatch,
    BufferTooSmall,
    NotAStruct,
    NotAnEnum,
    InvalidEnumSize,
    EnumValueSize,
    DuplicateEnumValue,
    CapacityExceeded,
    ArgumentCount,
    Host,
    Native,
}

impl BridgeError {
    /// Get the category of this error.
    ///
    /// Conversion failures are reported as [`ErrorKind::TypeMismatch`] no
    /// matter which layer wrapped them.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::UnknownType { .. } => ErrorKind::UnknownType,
            BridgeError::UnknownMember { .. } => ErrorKind::UnknownMember,
            BridgeError::UnknownValue { .. } => ErrorKind::UnknownValue,
            BridgeError::UnknownFunction { .. } => ErrorKind::UnknownFunction,
            BridgeError::NoConversion { .. } => ErrorKind::NoConversion,
            BridgeError::BufferTooSmall { .. } => ErrorKind::BufferTooSmall,
            BridgeError::Conversion(_) => ErrorKind::TypeMismatch,
            BridgeError::NotAStruct { .. } => ErrorKind::NotAStruct,
            BridgeError::NotAnEnum { .. } => ErrorKind::NotAnEnum,
            BridgeError::InvalidEnumSize { .. } => ErrorKind::InvalidEnumSize,
            BridgeError::EnumValueSize { .. } => ErrorKind::EnumValueSize,
            BridgeError::DuplicateEnumValue { .. } => ErrorKind::DuplicateEnumValue,
            BridgeError::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            BridgeError::ArgumentCount { .. } => ErrorKind::ArgumentCount,
            BridgeError::Host(HostError::Conversion(_)) => ErrorKind::TypeMismatch,
            BridgeError::Host(_) => ErrorKind::Host,
            BridgeError::Native(NativeError::Conversion(_)) => ErrorKind::TypeMismatch,
            BridgeError::Native(_) => ErrorKind::Native,
        }
    }

    /// Check if this error is of the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }
}

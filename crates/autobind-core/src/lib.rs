//! Shared vocabulary for the `autobind` native/script bridge.
//!
//! This crate holds the leaf types every other part of the bridge builds on:
//! session-scoped type identities, the host value model and stack trait, and
//! the byte and value codecs for native scalars.

pub mod convert;
pub mod error;
pub mod native_value;
pub mod runtime;
pub mod type_id;

pub use convert::{FromDynamic, IntoDynamic};
pub use error::{ConversionError, HostError, NativeError};
pub use native_value::{NativeValue, names};
pub use runtime::{Dynamic, Host, StackIndex, Table, ValueStack};
pub use type_id::{SessionId, TypeId};

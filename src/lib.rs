//! Bridge between native Rust values and a dynamically typed script host.
//!
//! A [`Registry`] records native types by name and size, how each one moves
//! to and from the host stack, the layout of structs and enums, and the
//! signatures of native functions. With that information in place the bridge
//! can convert values and call functions generically:
//!
//! ```
//! use autobind::prelude::*;
//!
//! fn add(a: i32, b: i32) -> i32 {
//!     a + b
//! }
//!
//! let mut registry = Registry::open();
//! registry.register_fn(add as fn(i32, i32) -> i32, Some("add")).unwrap();
//!
//! let mut stack = ValueStack::new();
//! stack.push_all([Dynamic::Int(2), Dynamic::Int(3)]);
//! assert_eq!(registry.call_by_name(&mut stack, "add").unwrap(), 1);
//! assert_eq!(stack.top(), Some(&Dynamic::Int(5)));
//! ```
//!
//! Structs are marshaled member by member into host tables:
//!
//! ```
//! use autobind::prelude::*;
//!
//! let mut registry = Registry::open();
//! let point = registry.register_type("Point", 8);
//! let i32_id = registry.type_of::<i32>();
//! registry.declare_struct(point).unwrap();
//! registry.add_member(point, Some("x"), i32_id, 0).unwrap();
//! registry.add_member(point, Some("y"), i32_id, 4).unwrap();
//!
//! let mut bytes = [0u8; 8];
//! bytes[..4].copy_from_slice(&1i32.to_ne_bytes());
//! bytes[4..].copy_from_slice(&2i32.to_ne_bytes());
//!
//! let mut stack = ValueStack::new();
//! registry.push(&mut stack, point, &bytes).unwrap();
//! let table = stack.top().and_then(Dynamic::as_table).unwrap();
//! assert_eq!(table.get("y"), Some(&Dynamic::Int(2)));
//! ```

pub mod config;
pub mod conversion;
pub mod error;
pub mod function;
pub mod logging;
pub mod reflect;
pub mod registry;
pub mod types;

pub use config::BridgeConfig;
pub use conversion::{ConversionEntry, ConversionSupport, PushFn, ReadFn};
pub use error::{BridgeError, ErrorKind, Result};
pub use function::{FnAddr, FunctionDescriptor, NativeFunction, Thunk, ThunkFrame};
pub use reflect::{ENUM_SIZES, EnumDescriptor, EnumValue, MemberDescriptor, StructDescriptor};
pub use registry::Registry;
pub use types::TypeEntry;

pub use autobind_core::{
    ConversionError, Dynamic, FromDynamic, Host, HostError, IntoDynamic, NativeError, NativeValue,
    SessionId, StackIndex, Table, TypeId, ValueStack, names,
};

/// Everything needed to register and call through the bridge.
pub mod prelude {
    pub use crate::config::BridgeConfig;
    pub use crate::error::{BridgeError, ErrorKind, Result};
    pub use crate::function::{FnAddr, NativeFunction, Thunk, ThunkFrame};
    pub use crate::registry::Registry;
    pub use autobind_core::{
        Dynamic, FromDynamic, Host, IntoDynamic, NativeValue, StackIndex, Table, TypeId,
        ValueStack,
    };
}

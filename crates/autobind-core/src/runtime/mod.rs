//! Host-side runtime model.
//!
//! ## Key Types
//!
//! - [`Dynamic`]: a value as the host stores it (primitives, pointers, tables)
//! - [`Table`]: string-keyed container used to marshal structs
//! - [`Host`]: the stack primitives the bridge needs from a scripting host
//! - [`ValueStack`]: an in-memory reference host

mod dynamic;
mod host;
mod value_stack;

pub use dynamic::{Dynamic, Table};
pub use host::{Host, StackIndex};
pub use value_stack::ValueStack;

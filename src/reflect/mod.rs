//! Struct and enum reflection stores.
//!
//! Descriptors registered here let the conversion dispatch marshal aggregate
//! types member by member, without a hand-written routine per type.

mod enums;
mod structs;

pub use enums::{ENUM_SIZES, EnumDescriptor, EnumValue};
pub use structs::{MemberDescriptor, StructDescriptor};

//! Enum reflection: named raw values and symmetric name/integer marshaling.

use autobind_core::{
    ConversionError, Dynamic, FromDynamic, Host, NativeValue, StackIndex, TypeId,
};
use tracing::debug;

use crate::error::{BridgeError, Result};
use crate::registry::Registry;

/// Underlying sizes an enum may declare.
pub const ENUM_SIZES: [usize; 4] = [1, 2, 4, 8];

/// One named value. Several names may share the same raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    raw: Vec<u8>,
    name: String,
}

impl EnumValue {
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw bytes as a sign-extended integer.
    pub fn as_i64(&self) -> i64 {
        signed_value(&self.raw)
    }
}

/// A declared enum, values in registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    type_id: TypeId,
    underlying_size: usize,
    values: Vec<EnumValue>,
}

impl EnumDescriptor {
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn underlying_size(&self) -> usize {
        self.underlying_size
    }

    pub fn values(&self) -> &[EnumValue] {
        &self.values
    }

    fn by_raw(&self, raw: &[u8]) -> Option<&EnumValue> {
        let raw = raw.get(..self.underlying_size)?;
        self.values.iter().find(|v| v.raw == raw)
    }

    fn by_name(&self, name: &str) -> Option<&EnumValue> {
        self.values.iter().find(|v| v.name == name)
    }
}

impl Registry {
    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Mark `id` as an enum whose values are `underlying_size` bytes wide.
    ///
    /// Declaring again keeps the existing values and size.
    pub fn declare_enum(&mut self, id: TypeId, underlying_size: usize) -> Result<()> {
        self.type_entry(id)?;
        if !ENUM_SIZES.contains(&underlying_size) {
            return Err(BridgeError::InvalidEnumSize {
                type_name: self.describe(id),
                size: underlying_size,
            });
        }
        if !self.enums.contains_key(&id) {
            debug!(type_name = %self.describe(id), type_id = %id, underlying_size, "declared enum");
            self.enums.insert(
                id,
                EnumDescriptor {
                    type_id: id,
                    underlying_size,
                    values: Vec::new(),
                },
            );
        }
        Ok(())
    }

    /// Add a named value given as raw native bytes.
    ///
    /// Names must be unique within the enum; raw values may repeat.
    pub fn add_enum_value(&mut self, id: TypeId, raw: &[u8], name: &str) -> Result<()> {
        self.type_entry(id)?;
        let type_name = self.describe(id);
        let descriptor = self
            .enums
            .get_mut(&id)
            .ok_or_else(|| BridgeError::NotAnEnum {
                type_name: type_name.clone(),
            })?;

        if raw.len() != descriptor.underlying_size {
            return Err(BridgeError::EnumValueSize {
                type_name,
                expected: descriptor.underlying_size,
                actual: raw.len(),
            });
        }
        if descriptor.by_name(name).is_some() {
            return Err(BridgeError::DuplicateEnumValue {
                type_name,
                name: name.to_string(),
            });
        }

        descriptor.values.push(EnumValue {
            raw: raw.to_vec(),
            name: name.to_string(),
        });
        debug!(type_name = %type_name, value = name, raw = signed_value(raw), "added enum value");
        Ok(())
    }

    /// Add a named value from a typed native value.
    pub fn add_enum_value_of<T: NativeValue>(
        &mut self,
        id: TypeId,
        value: T,
        name: &str,
    ) -> Result<()> {
        let mut raw = vec![0u8; T::SIZE];
        value.write_bytes(&mut raw);
        self.add_enum_value(id, &raw, name)
    }

    // ==========================================================================
    // Introspection
    // ==========================================================================

    pub fn is_enum(&self, id: TypeId) -> bool {
        self.enums.contains_key(&id)
    }

    /// Descriptor of a declared enum.
    pub fn enum_descriptor(&self, id: TypeId) -> Option<&EnumDescriptor> {
        self.enums.get(&id)
    }

    /// Check whether some value has these raw bytes.
    pub fn has_enum_value(&self, id: TypeId, raw: &[u8]) -> bool {
        self.enums.get(&id).is_some_and(|e| e.by_raw(raw).is_some())
    }

    pub fn has_enum_name(&self, id: TypeId, name: &str) -> bool {
        self.enums
            .get(&id)
            .is_some_and(|e| e.by_name(name).is_some())
    }

    /// Iterate value names in registration order; see
    /// [`Registry::next_member_name`] for the protocol.
    pub fn next_enum_value_name(&self, id: TypeId, current: Option<&str>) -> Option<&str> {
        let values = &self.enums.get(&id)?.values;
        let next = match current {
            None => 0,
            Some(current) => values.iter().position(|v| v.name == current)? + 1,
        };
        values.get(next).map(EnumValue::name)
    }

    // ==========================================================================
    // Marshaling
    // ==========================================================================

    /// Push the name of the value in `src`, or its integer if unnamed.
    pub fn enum_push(&self, host: &mut dyn Host, id: TypeId, src: &[u8]) -> Result<usize> {
        let descriptor = self.enum_of(id)?;
        let raw = src
            .get(..descriptor.underlying_size)
            .ok_or_else(|| BridgeError::BufferTooSmall {
                type_name: self.describe(id),
                required: descriptor.underlying_size,
                available: src.len(),
            })?;

        let value = match descriptor.by_raw(raw) {
            Some(named) => Dynamic::String(named.name.clone()),
            None => Dynamic::Int(signed_value(raw)),
        };
        Ok(host.push(value))
    }

    /// Read a value name or an in-range integer into `dst`.
    pub fn enum_read(
        &self,
        host: &mut dyn Host,
        id: TypeId,
        dst: &mut [u8],
        index: StackIndex,
    ) -> Result<()> {
        let descriptor = self.enum_of(id)?;
        let size = descriptor.underlying_size;
        let available = dst.len();
        let dst = dst
            .get_mut(..size)
            .ok_or_else(|| BridgeError::BufferTooSmall {
                type_name: self.describe(id),
                required: size,
                available,
            })?;

        match host.value(index)? {
            Dynamic::String(name) => {
                let named = descriptor
                    .by_name(name)
                    .ok_or_else(|| BridgeError::UnknownValue {
                        type_name: self.describe(id),
                        name: name.clone(),
                    })?;
                dst.copy_from_slice(&named.raw);
            }
            other => {
                let value = i64::from_dynamic(other)?;
                write_integer(value, dst).ok_or(ConversionError::IntegerOverflow {
                    value,
                    target_type: "enum",
                })?;
            }
        }
        Ok(())
    }

    fn enum_of(&self, id: TypeId) -> Result<&EnumDescriptor> {
        self.type_entry(id)?;
        self.enums.get(&id).ok_or_else(|| BridgeError::NotAnEnum {
            type_name: self.describe(id),
        })
    }
}

/// Sign-extend 1, 2, 4 or 8 native-endian bytes.
fn signed_value(raw: &[u8]) -> i64 {
    match raw.len() {
        1 => i8::read_bytes(raw) as i64,
        2 => i16::read_bytes(raw) as i64,
        4 => i32::read_bytes(raw) as i64,
        _ => i64::read_bytes(raw),
    }
}

/// Store `value` in `dst.len()` bytes if it fits the signed or unsigned range.
fn write_integer(value: i64, dst: &mut [u8]) -> Option<()> {
    match dst.len() {
        1 => i8::try_from(value)
            .map(|v| v.write_bytes(dst))
            .or_else(|_| u8::try_from(value).map(|v| v.write_bytes(dst)))
            .ok(),
        2 => i16::try_from(value)
            .map(|v| v.write_bytes(dst))
            .or_else(|_| u16::try_from(value).map(|v| v.write_bytes(dst)))
            .ok(),
        4 => i32::try_from(value)
            .map(|v| v.write_bytes(dst))
            .or_else(|_| u32::try_from(value).map(|v| v.write_bytes(dst)))
            .ok(),
        _ => {
            value.write_bytes(dst);
            Some(())
        }
    }
}

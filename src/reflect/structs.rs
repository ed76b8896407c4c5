//! Struct reflection: member layout and generic table marshaling.
//!
//! A declared struct is pushed as a host [`Table`] with one field per named
//! member, and read back from any table carrying some of those fields. Each
//! member converts through the ordinary dispatch, so nested structs and enums
//! work without extra registration.
//!
//! Duplicate offsets or names are accepted; lookups resolve to the member
//! registered first.

use autobind_core::{ConversionError, Dynamic, Host, StackIndex, Table, TypeId};
use tracing::debug;

use crate::error::{BridgeError, Result};
use crate::registry::Registry;

/// One member of a declared struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDescriptor {
    name: Option<String>,
    offset: usize,
    member_type: TypeId,
}

impl MemberDescriptor {
    /// Field name, or `None` for an anonymous member.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Byte offset from the start of the struct.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn member_type(&self) -> TypeId {
        self.member_type
    }
}

/// Layout of a declared struct, members in registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDescriptor {
    type_id: TypeId,
    members: Vec<MemberDescriptor>,
}

impl StructDescriptor {
    fn new(type_id: TypeId) -> Self {
        Self {
            type_id,
            members: Vec::new(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    fn by_offset(&self, offset: usize) -> Option<&MemberDescriptor> {
        self.members.iter().find(|m| m.offset == offset)
    }

    fn by_name(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.iter().find(|m| m.name() == Some(name))
    }

    /// Named members, skipping names already seen earlier in the list.
    fn named(&self) -> impl Iterator<Item = (&str, &MemberDescriptor)> {
        self.members.iter().enumerate().filter_map(move |(i, m)| {
            let name = m.name()?;
            let first = self.members[..i]
                .iter()
                .all(|prev| prev.name() != Some(name));
            first.then_some((name, m))
        })
    }
}

impl Registry {
    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Mark `id` as a struct. Declaring twice keeps the existing members.
    pub fn declare_struct(&mut self, id: TypeId) -> Result<()> {
        self.type_entry(id)?;
        if !self.structs.contains_key(&id) {
            debug!(type_name = %self.describe(id), type_id = %id, "declared struct");
            self.structs.insert(id, StructDescriptor::new(id));
        }
        Ok(())
    }

    /// Append a member to a declared struct.
    ///
    /// Pass `None` as the name for a member that is only reachable by offset.
    pub fn add_member(
        &mut self,
        struct_type: TypeId,
        name: Option<&str>,
        member_type: TypeId,
        offset: usize,
    ) -> Result<()> {
        self.type_entry(struct_type)?;
        self.type_entry(member_type)?;
        let type_name = self.describe(struct_type);
        let member_type_name = self.describe(member_type);

        let descriptor = self
            .structs
            .get_mut(&struct_type)
            .ok_or_else(|| BridgeError::NotAStruct {
                type_name: type_name.clone(),
            })?;
        descriptor.members.push(MemberDescriptor {
            name: name.map(str::to_string),
            offset,
            member_type,
        });
        debug!(
            type_name = %type_name,
            member = name.unwrap_or("<anonymous>"),
            member_type = %member_type_name,
            offset,
            "added struct member"
        );
        Ok(())
    }

    // ==========================================================================
    // Introspection
    // ==========================================================================

    pub fn is_struct(&self, id: TypeId) -> bool {
        self.structs.contains_key(&id)
    }

    /// Members of a declared struct in registration order.
    pub fn struct_members(&self, id: TypeId) -> Option<&[MemberDescriptor]> {
        self.structs.get(&id).map(StructDescriptor::members)
    }

    pub fn has_member_offset(&self, id: TypeId, offset: usize) -> bool {
        self.structs
            .get(&id)
            .is_some_and(|s| s.by_offset(offset).is_some())
    }

    pub fn has_member_name(&self, id: TypeId, name: &str) -> bool {
        self.structs
            .get(&id)
            .is_some_and(|s| s.by_name(name).is_some())
    }

    /// Type of the member at `offset`, or [`TypeId::INVALID`].
    pub fn member_type_by_offset(&self, id: TypeId, offset: usize) -> TypeId {
        self.structs
            .get(&id)
            .and_then(|s| s.by_offset(offset))
            .map_or(TypeId::INVALID, MemberDescriptor::member_type)
    }

    /// Type of the member called `name`, or [`TypeId::INVALID`].
    pub fn member_type_by_name(&self, id: TypeId, name: &str) -> TypeId {
        self.structs
            .get(&id)
            .and_then(|s| s.by_name(name))
            .map_or(TypeId::INVALID, MemberDescriptor::member_type)
    }

    /// Iterate member names in registration order.
    ///
    /// Start with `None`; the name after the last one is `None`. Anonymous
    /// members are skipped. An unknown struct or an unknown `current` name
    /// also yields `None`.
    ///
    /// ```
    /// # use autobind::Registry;
    /// let mut registry = Registry::open();
    /// let point = registry.register_type("Point", 8);
    /// let i32_id = registry.find_type("i32");
    /// registry.declare_struct(point).unwrap();
    /// registry.add_member(point, Some("x"), i32_id, 0).unwrap();
    /// registry.add_member(point, Some("y"), i32_id, 4).unwrap();
    ///
    /// let mut names = Vec::new();
    /// let mut current = None;
    /// while let Some(name) = registry.next_member_name(point, current) {
    ///     names.push(name);
    ///     current = Some(name);
    /// }
    /// assert_eq!(names, ["x", "y"]);
    /// ```
    pub fn next_member_name(&self, id: TypeId, current: Option<&str>) -> Option<&str> {
        let descriptor = self.structs.get(&id)?;
        let mut names = descriptor.named().map(|(name, _)| name);
        match current {
            None => names.next(),
            Some(current) => {
                names.find(|name| *name == current)?;
                names.next()
            }
        }
    }

    // ==========================================================================
    // Marshaling
    // ==========================================================================

    /// Push a whole struct as a table of its named members.
    pub fn struct_push(&self, host: &mut dyn Host, id: TypeId, src: &[u8]) -> Result<usize> {
        let descriptor = self.struct_descriptor(id)?;
        host.push(Dynamic::Table(Table::new()));

        for (name, member) in descriptor.named() {
            if let Err(err) = self.push_field(host, id, member, name, src) {
                host.pop(1);
                return Err(err);
            }
        }
        Ok(1)
    }

    /// Push one member and store it into the table just below it.
    fn push_field(
        &self,
        host: &mut dyn Host,
        id: TypeId,
        member: &MemberDescriptor,
        name: &str,
        src: &[u8],
    ) -> Result<()> {
        let bytes = self.member_bytes(id, member, src)?;
        if self.push(host, member.member_type, bytes)? == 0 {
            host.push(Dynamic::Nil);
        }
        host.set_field(-2, name).inspect_err(|_| host.pop(1))?;
        Ok(())
    }

    /// Read a table at `index` into a struct buffer.
    ///
    /// Members missing from the table leave their bytes in `dst` untouched.
    /// Keys without a matching member are ignored. A `cstr` member points
    /// into storage the host keeps with the table at `index`.
    pub fn struct_read(
        &self,
        host: &mut dyn Host,
        id: TypeId,
        dst: &mut [u8],
        index: StackIndex,
    ) -> Result<()> {
        let descriptor = self.struct_descriptor(id)?;
        let index = host.absolute_index(index)?;
        let value = host.value(index)?;
        if value.as_table().is_none() {
            return Err(ConversionError::TypeMismatch {
                expected: "table",
                actual: value.type_name(),
            }
            .into());
        }

        for (name, member) in descriptor.named() {
            host.get_field(index, name)?;
            if host.value(-1)?.is_nil() {
                host.pop(1);
                continue;
            }
            let slot = self.member_bytes_mut(id, member, dst);
            let result = slot.and_then(|slot| self.read(host, member.member_type, slot, -1));
            host.pop(1);
            result?;
        }
        Ok(())
    }

    /// Push the member at `offset` of the struct held in `src`.
    pub fn push_member_by_offset(
        &self,
        host: &mut dyn Host,
        id: TypeId,
        offset: usize,
        src: &[u8],
    ) -> Result<usize> {
        let member = self.member_at(id, offset)?;
        let bytes = self.member_bytes(id, member, src)?;
        self.push(host, member.member_type, bytes)
    }

    /// Push the member called `name` of the struct held in `src`.
    pub fn push_member_by_name(
        &self,
        host: &mut dyn Host,
        id: TypeId,
        name: &str,
        src: &[u8],
    ) -> Result<usize> {
        let member = self.member_named(id, name)?;
        let bytes = self.member_bytes(id, member, src)?;
        self.push(host, member.member_type, bytes)
    }

    /// Read the host value at `index` into the member at `offset` of `dst`.
    pub fn read_member_by_offset(
        &self,
        host: &mut dyn Host,
        id: TypeId,
        offset: usize,
        dst: &mut [u8],
        index: StackIndex,
    ) -> Result<()> {
        let member = self.member_at(id, offset)?;
        let slot = self.member_bytes_mut(id, member, dst)?;
        self.read(host, member.member_type, slot, index)
    }

    /// Read the host value at `index` into the member called `name` of `dst`.
    pub fn read_member_by_name(
        &self,
        host: &mut dyn Host,
        id: TypeId,
        name: &str,
        dst: &mut [u8],
        index: StackIndex,
    ) -> Result<()> {
        let member = self.member_named(id, name)?;
        let slot = self.member_bytes_mut(id, member, dst)?;
        self.read(host, member.member_type, slot, index)
    }

    // ==========================================================================
    // Helpers
    // ==========================================================================

    fn struct_descriptor(&self, id: TypeId) -> Result<&StructDescriptor> {
        self.type_entry(id)?;
        self.structs.get(&id).ok_or_else(|| BridgeError::NotAStruct {
            type_name: self.describe(id),
        })
    }

    fn member_at(&self, id: TypeId, offset: usize) -> Result<&MemberDescriptor> {
        self.struct_descriptor(id)?
            .by_offset(offset)
            .ok_or_else(|| BridgeError::UnknownMember {
                type_name: self.describe(id),
                member: format!("at offset {offset}"),
            })
    }

    fn member_named(&self, id: TypeId, name: &str) -> Result<&MemberDescriptor> {
        self.struct_descriptor(id)?
            .by_name(name)
            .ok_or_else(|| BridgeError::UnknownMember {
                type_name: self.describe(id),
                member: format!("'{name}'"),
            })
    }

    fn member_bytes<'a>(
        &self,
        id: TypeId,
        member: &MemberDescriptor,
        src: &'a [u8],
    ) -> Result<&'a [u8]> {
        src.get(member.offset..)
            .ok_or_else(|| self.member_overflow(id, member, src.len()))
    }

    fn member_bytes_mut<'a>(
        &self,
        id: TypeId,
        member: &MemberDescriptor,
        dst: &'a mut [u8],
    ) -> Result<&'a mut [u8]> {
        let available = dst.len();
        dst.get_mut(member.offset..)
            .ok_or_else(|| self.member_overflow(id, member, available))
    }

    fn member_overflow(
        &self,
        id: TypeId,
        member: &MemberDescriptor,
        available: usize,
    ) -> BridgeError {
        BridgeError::BufferTooSmall {
            type_name: self.describe(id),
            required: member.offset + self.type_size(member.member_type).unwrap_or(0),
            available,
        }
    }
}

#[cfg(test)]
mod tests {
    use autobind_core::{NativeValue, ValueStack};

    use super::*;
    use crate::error::ErrorKind;

    /// `{x: i32 @0, y: f32 @4}`
    fn point(registry: &mut Registry) -> TypeId {
        let id = registry.register_type("Point", 8);
        let i32_id = registry.type_of::<i32>();
        let f32_id = registry.type_of::<f32>();
        registry.declare_struct(id).unwrap();
        registry.add_member(id, Some("x"), i32_id, 0).unwrap();
        registry.add_member(id, Some("y"), f32_id, 4).unwrap();
        id
    }

    fn point_bytes(x: i32, y: f32) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        x.write_bytes(&mut bytes[0..]);
        y.write_bytes(&mut bytes[4..]);
        bytes
    }

    #[test]
    fn push_builds_table() {
        let mut registry = Registry::open();
        let id = point(&mut registry);
        let mut stack = ValueStack::new();

        assert_eq!(
            registry
                .push(&mut stack, id, &point_bytes(5, 2.5))
                .unwrap(),
            1
        );
        let expected = Table::new().with("x", 5i64).with("y", 2.5f64);
        assert_eq!(stack.top(), Some(&Dynamic::Table(expected)));
    }

    #[test]
    fn round_trip_preserves_bits() {
        let mut registry = Registry::open();
        let id = point(&mut registry);
        let mut stack = ValueStack::new();
        let original = point_bytes(5, 2.5);

        registry.push(&mut stack, id, &original).unwrap();
        let mut out = [0u8; 8];
        registry.read(&mut stack, id, &mut out, -1).unwrap();
        assert_eq!(out, original);
    }

    #[test]
    fn read_leaves_missing_members_untouched() {
        let mut registry = Registry::open();
        let id = point(&mut registry);
        let mut stack = ValueStack::new();
        let partial = Table::new().with("y", 1.0f64).with("z", 9i64);
        stack.push(Dynamic::Table(partial));

        let mut out = point_bytes(77, 0.0);
        registry.read(&mut stack, id, &mut out, -1).unwrap();
        assert_eq!(out, point_bytes(77, 1.0));
        assert_eq!(stack.stack_size(), 1);
    }

    #[test]
    fn read_requires_table() {
        let mut registry = Registry::open();
        let id = point(&mut registry);
        let mut stack = ValueStack::new();
        stack.push(Dynamic::Int(3));

        let err = registry.read(&mut stack, id, &mut [0; 8], -1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn anonymous_members_are_skipped() {
        let mut registry = Registry::open();
        let id = point(&mut registry);
        let u8_id = registry.type_of::<u8>();
        registry.add_member(id, None, u8_id, 7).unwrap();

        let mut stack = ValueStack::new();
        registry.push(&mut stack, id, &point_bytes(1, 1.0)).unwrap();
        assert_eq!(
            stack.top().and_then(Dynamic::as_table).map(Table::len),
            Some(2)
        );

        assert!(registry.has_member_offset(id, 7));
        assert_eq!(registry.member_type_by_offset(id, 7), u8_id);
        assert_eq!(registry.next_member_name(id, Some("y")), None);
    }

    #[test]
    fn duplicates_resolve_to_first() {
        let mut registry = Registry::open();
        let id = point(&mut registry);
        let u8_id = registry.type_of::<u8>();
        registry.add_member(id, Some("x"), u8_id, 4).unwrap();

        let (i32_id, f32_id) = (registry.type_of::<i32>(), registry.type_of::<f32>());
        assert_eq!(registry.member_type_by_name(id, "x"), i32_id);
        assert_eq!(registry.member_type_by_offset(id, 4), f32_id);

        let mut stack = ValueStack::new();
        registry
            .push(&mut stack, id, &point_bytes(300, 0.0))
            .unwrap();
        let table = stack.top().and_then(Dynamic::as_table).unwrap();
        assert_eq!(table.get("x"), Some(&Dynamic::Int(300)));
    }

    #[test]
    fn member_access() {
        let mut registry = Registry::open();
        let id = point(&mut registry);
        let mut stack = ValueStack::new();
        let mut bytes = point_bytes(5, 2.5);

        registry
            .push_member_by_name(&mut stack, id, "y", &bytes)
            .unwrap();
        assert_eq!(stack.top(), Some(&Dynamic::Float(2.5)));
        registry
            .push_member_by_offset(&mut stack, id, 0, &bytes)
            .unwrap();
        assert_eq!(stack.top(), Some(&Dynamic::Int(5)));

        stack.push(Dynamic::Int(-8));
        registry
            .read_member_by_offset(&mut stack, id, 0, &mut bytes, -1)
            .unwrap();
        stack.push(Dynamic::Float(0.25));
        registry
            .read_member_by_name(&mut stack, id, "y", &mut bytes, -1)
            .unwrap();
        assert_eq!(bytes, point_bytes(-8, 0.25));

        let err = registry
            .push_member_by_name(&mut stack, id, "z", &bytes)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownMember);
        let err = registry
            .push_member_by_offset(&mut stack, id, 2, &bytes)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownMember);
    }

    #[test]
    fn nested_structs() {
        let mut registry = Registry::open();
        let point_id = point(&mut registry);
        let line = registry.register_type("Line", 16);
        registry.declare_struct(line).unwrap();
        registry
            .add_member(line, Some("from"), point_id, 0)
            .unwrap();
        registry.add_member(line, Some("to"), point_id, 8).unwrap();

        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&point_bytes(1, 2.0));
        bytes[8..].copy_from_slice(&point_bytes(3, 4.0));

        let mut stack = ValueStack::new();
        registry.push(&mut stack, line, &bytes).unwrap();
        let mut out = [0u8; 16];
        registry.read(&mut stack, line, &mut out, -1).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn failed_member_push_cleans_stack() {
        let mut registry = Registry::open();
        let id = point(&mut registry);
        let opaque = registry.register_type("Opaque", 4);
        registry.add_member(id, Some("o"), opaque, 0).unwrap();

        let mut stack = ValueStack::new();
        let err = registry.push(&mut stack, id, &[0; 8]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoConversion);
        assert_eq!(stack.stack_size(), 0);
    }

    #[test]
    fn registration_errors() {
        let mut registry = Registry::open();
        let plain = registry.register_type("Plain", 4);
        let i32_id = registry.type_of::<i32>();

        assert_eq!(
            registry
                .add_member(plain, Some("x"), i32_id, 0)
                .unwrap_err()
                .kind(),
            ErrorKind::NotAStruct
        );
        assert_eq!(
            registry.declare_struct(TypeId::INVALID).unwrap_err().kind(),
            ErrorKind::UnknownType
        );
        registry.declare_struct(plain).unwrap();
        assert_eq!(
            registry
                .add_member(plain, Some("x"), TypeId::INVALID, 0)
                .unwrap_err()
                .kind(),
            ErrorKind::UnknownType
        );
    }

    #[test]
    fn redeclare_keeps_members() {
        let mut registry = Registry::open();
        let id = point(&mut registry);
        registry.declare_struct(id).unwrap();
        assert_eq!(registry.struct_members(id).map(<[_]>::len), Some(2));
        assert!(registry.is_struct(id));
        assert!(!registry.is_struct(registry.type_of::<i32>()));
    }
}

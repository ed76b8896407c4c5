//! Reference in-memory host.

use std::ffi::CString;
use std::fmt;
use std::os::raw::c_char;
use std::ptr;

use crate::error::{ConversionError, HostError};

use super::{Dynamic, Host, StackIndex, Table};

/// One stack slot: the value plus a C string view built on first request.
struct Slot {
    value: Dynamic,
    cstr: Option<CString>,
    /// Slot of the table this value was copied out of by `get_field`.
    origin: Option<usize>,
    /// Views handed out for values that were copied out of this table.
    retained: Vec<CString>,
}

impl Slot {
    fn new(value: Dynamic) -> Self {
        Self {
            value,
            cstr: None,
            origin: None,
            retained: Vec::new(),
        }
    }
}

/// A plain `Vec`-backed [`Host`].
///
/// C string views of a value copied out of a table with `get_field` are
/// handed to that table's slot when the copy is popped, so they stay valid
/// while the table is on the stack. A value stored with `set_field` hands its
/// view to the table the same way.
///
/// Raised errors are recorded rather than unwinding, so embedders and tests
/// can inspect them with [`ValueStack::errors`].
#[derive(Default)]
pub struct ValueStack {
    slots: Vec<Slot>,
    errors: Vec<String>,
}

impl ValueStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push several values in order.
    pub fn push_all(&mut self, values: impl IntoIterator<Item = Dynamic>) {
        for value in values {
            self.push(value);
        }
    }

    /// Borrow the top value.
    pub fn top(&self) -> Option<&Dynamic> {
        self.slots.last().map(|slot| &slot.value)
    }

    /// Remove and return the top value.
    pub fn take_top(&mut self) -> Option<Dynamic> {
        self.remove_top(None)
    }

    /// Iterate over the values from bottom to top.
    pub fn values(&self) -> impl Iterator<Item = &Dynamic> {
        self.slots.iter().map(|slot| &slot.value)
    }

    /// Errors raised so far, oldest first.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Take the recorded errors, leaving none behind.
    pub fn take_errors(&mut self) -> Vec<String> {
        std::mem::take(&mut self.errors)
    }

    /// Drop every value and recorded error.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.errors.clear();
    }

    /// Pop the top slot, moving its views to `owner` or to the table it came from.
    fn remove_top(&mut self, owner: Option<usize>) -> Option<Dynamic> {
        let Slot {
            value,
            cstr,
            origin,
            mut retained,
        } = self.slots.pop()?;
        if let Some(owner) = owner.or(origin).and_then(|i| self.slots.get_mut(i)) {
            owner.retained.extend(cstr);
            owner.retained.append(&mut retained);
        }
        Some(value)
    }

    fn slot_mut(&mut self, index: StackIndex) -> Result<&mut Slot, HostError> {
        let absolute = self.absolute_index(index)?;
        Ok(&mut self.slots[absolute as usize - 1])
    }

    fn table_mut(&mut self, index: StackIndex) -> Result<&mut Table, HostError> {
        let slot = self.slot_mut(index)?;
        // Any cached view is stale once the table changes.
        slot.cstr = None;
        let actual = slot.value.type_name();
        slot.value
            .as_table_mut()
            .ok_or(HostError::NotATable { index, actual })
    }
}

impl Host for ValueStack {
    fn push(&mut self, value: Dynamic) -> usize {
        self.slots.push(Slot::new(value));
        1
    }

    fn value(&self, index: StackIndex) -> Result<&Dynamic, HostError> {
        let absolute = self.absolute_index(index)?;
        Ok(&self.slots[absolute as usize - 1].value)
    }

    fn cstr(&mut self, index: StackIndex) -> Result<*const c_char, HostError> {
        let slot = self.slot_mut(index)?;
        match &slot.value {
            Dynamic::Nil => Ok(ptr::null()),
            Dynamic::String(s) => {
                if slot.cstr.is_none() {
                    let owned = CString::new(s.as_str())
                        .map_err(|_| ConversionError::InvalidCString)?;
                    slot.cstr = Some(owned);
                }
                Ok(slot.cstr.as_ref().map_or(ptr::null(), |c| c.as_ptr()))
            }
            other => Err(ConversionError::TypeMismatch {
                expected: "string",
                actual: other.type_name(),
            }
            .into()),
        }
    }

    fn pop(&mut self, count: usize) {
        let keep = self.slots.len().saturating_sub(count);
        while self.slots.len() > keep {
            self.remove_top(None);
        }
    }

    fn stack_size(&self) -> usize {
        self.slots.len()
    }

    fn set_field(&mut self, table: StackIndex, key: &str) -> Result<(), HostError> {
        // Resolve before popping so relative indices keep their meaning.
        let table = self.absolute_index(table)?;
        if table as usize == self.slots.len() {
            return Err(HostError::NotATable {
                index: table,
                actual: "the value being stored",
            });
        }
        self.table_mut(table)?;
        let value = self
            .remove_top(Some(table as usize - 1))
            .ok_or(HostError::IndexOutOfRange { index: -1, size: 0 })?;
        self.table_mut(table)?.set(key, value);
        Ok(())
    }

    fn get_field(&mut self, table: StackIndex, key: &str) -> Result<(), HostError> {
        let origin = self.absolute_index(table)? as usize - 1;
        let actual = self.value(table)?;
        let field = match actual.as_table() {
            Some(t) => t.get(key).cloned().unwrap_or(Dynamic::Nil),
            None => {
                return Err(HostError::NotATable {
                    index: table,
                    actual: actual.type_name(),
                });
            }
        };
        self.slots.push(Slot {
            origin: Some(origin),
            ..Slot::new(field)
        });
        Ok(())
    }

    fn raise_error(&mut self, message: String) {
        self.errors.push(message);
    }
}

impl fmt::Debug for ValueStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueStack")
            .field("values", &self.values().collect::<Vec<_>>())
            .field("errors", &self.errors)
            .finish()
    }
}

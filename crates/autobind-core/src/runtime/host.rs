//! The boundary with the scripting host.

use std::os::raw::c_char;

use crate::error::HostError;

use super::Dynamic;

/// Index of a host stack slot.
///
/// Positive indices count from the bottom starting at 1. Negative indices
/// count from the top, so `-1` is the most recently pushed value.
pub type StackIndex = i32;

/// A dynamically-typed, stack-based execution environment.
///
/// The bridge never inspects host internals; every value crosses through
/// these primitives. Implementations are single-threaded per session.
pub trait Host {
    /// Push one value, returning the number of stack slots written.
    fn push(&mut self, value: Dynamic) -> usize;

    /// Borrow the value at `index`.
    fn value(&self, index: StackIndex) -> Result<&Dynamic, HostError>;

    /// Borrow the string at `index` as a NUL-terminated C string.
    ///
    /// `Nil` yields a null pointer. The pointer stays valid until the slot is
    /// popped. For a value pushed by [`Host::get_field`] it stays valid until
    /// the table it was read from is popped, so struct members and call
    /// arguments read through a table outlive their temporary slot.
    fn cstr(&mut self, index: StackIndex) -> Result<*const c_char, HostError>;

    /// Remove `count` values from the top of the stack.
    fn pop(&mut self, count: usize);

    /// Number of values currently on the stack.
    fn stack_size(&self) -> usize;

    /// Pop the top value and store it as field `key` of the table at `table`.
    fn set_field(&mut self, table: StackIndex, key: &str) -> Result<(), HostError>;

    /// Push field `key` of the table at `table`, or `Nil` when absent.
    fn get_field(&mut self, table: StackIndex, key: &str) -> Result<(), HostError>;

    /// Report an unrecoverable failure of the current call to the host.
    fn raise_error(&mut self, message: String);

    /// Convert a relative index into an absolute (positive) one.
    fn absolute_index(&self, index: StackIndex) -> Result<StackIndex, HostError> {
        let size = self.stack_size();
        let absolute = if index < 0 {
            size as i64 + index as i64 + 1
        } else {
            index as i64
        };
        if absolute < 1 || absolute > size as i64 {
            return Err(HostError::IndexOutOfRange { index, size });
        }
        Ok(absolute as StackIndex)
    }
}

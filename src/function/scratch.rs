//! Pool of per-call scratch arenas.

use std::ops::Deref;
use std::sync::{Mutex, MutexGuard, PoisonError};

use bumpalo::Bump;

/// Arenas kept for reuse; extra ones returned beyond this are dropped.
const MAX_POOLED: usize = 8;

/// Arenas holding argument and return buffers.
///
/// Each call takes its own arena, so a call made from inside a thunk never
/// shares buffers with the call that is running it. The lock is held only
/// while an arena is taken or returned.
#[derive(Default)]
pub(crate) struct ScratchPool {
    arenas: Mutex<Vec<Bump>>,
}

impl ScratchPool {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Take an arena; it goes back to the pool when the guard drops.
    pub(crate) fn take(&self) -> ScratchArena<'_> {
        let arena = self.lock().pop().unwrap_or_default();
        ScratchArena { pool: self, arena }
    }

    /// Number of idle arenas.
    #[cfg(test)]
    pub(crate) fn idle(&self) -> usize {
        self.lock().len()
    }

    fn give_back(&self, mut arena: Bump) {
        arena.reset();
        let mut arenas = self.lock();
        if arenas.len() < MAX_POOLED {
            arenas.push(arena);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Bump>> {
        // A panicking thunk can't leave the list itself inconsistent.
        self.arenas.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An arena on loan from a [`ScratchPool`].
pub(crate) struct ScratchArena<'p> {
    pool: &'p ScratchPool,
    arena: Bump,
}

impl Deref for ScratchArena<'_> {
    type Target = Bump;

    fn deref(&self) -> &Bump {
        &self.arena
    }
}

impl Drop for ScratchArena<'_> {
    fn drop(&mut self) {
        // An empty Bump owns no chunks.
        self.pool.give_back(std::mem::take(&mut self.arena));
    }
}

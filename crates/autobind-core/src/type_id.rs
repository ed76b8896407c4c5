//! Session-scoped type identity.
//!
//! This module provides [`TypeId`], the handle a registry issues for every
//! native type it knows about, and [`SessionId`], the tag that ties a handle
//! to the registry that issued it.
//!
//! # Hash Computation
//!
//! A type's hash is XXHash64 of its name, seeded with the owning session and
//! mixed with a domain constant. Because the seed differs per session, the
//! same name produces unrelated hashes in two registries. The session tag is
//! stored alongside the hash, so a handle from a closed session can never be
//! mistaken for one issued by a live registry.
//!
//! When two names collide inside one session, the registry asks for the next
//! [`probe`](TypeId::probe) until it finds a free slot.
//!
//! # Examples
//!
//! ```
//! use autobind_core::{SessionId, TypeId};
//!
//! let session = SessionId::next();
//! let a = TypeId::from_name(session, "Vec2");
//! let b = TypeId::from_name(session, "Vec2");
//! assert_eq!(a, b);
//!
//! let other = SessionId::next();
//! assert_ne!(a, TypeId::from_name(other, "Vec2"));
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
pub mod hash_constants {
    /// Domain marker for type hashes.
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Separator mixed in for every collision probe.
    pub const PROBE: u64 = 0x9e3779b97f4a7c15;
}

static NEXT_SESSION: AtomicU32 = AtomicU32::new(1);

/// Identifies one registry session.
///
/// Every call to [`SessionId::next`] returns a process-unique, non-zero value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SessionId(u32);

impl SessionId {
    /// The session tag carried by [`TypeId::INVALID`].
    pub const NONE: SessionId = SessionId(0);

    /// Allocate a fresh session tag.
    pub fn next() -> Self {
        // Skip zero if the counter ever wraps.
        loop {
            let id = NEXT_SESSION.fetch_add(1, Ordering::Relaxed);
            if id != 0 {
                return SessionId(id);
            }
        }
    }

    /// Get the underlying u32 value.
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

/// Opaque identity of a registered native type.
///
/// Carries no ownership. It is only meaningful to the registry whose session
/// issued it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId {
    session: SessionId,
    hash: u64,
}

impl TypeId {
    /// Lookup-failure sentinel. Never issued by a registry.
    pub const INVALID: TypeId = TypeId {
        session: SessionId::NONE,
        hash: 0,
    };

    /// Compute the identity a session assigns to `name` on its first probe.
    #[inline]
    pub fn from_name(session: SessionId, name: &str) -> Self {
        Self::with_probe(session, name, 0)
    }

    /// Compute the identity for `name` at the given collision probe.
    ///
    /// Probe 0 is the same as [`TypeId::from_name`]. Never returns a zero hash,
    /// so the result can't equal [`TypeId::INVALID`].
    pub fn with_probe(session: SessionId, name: &str, probe: u32) -> Self {
        let seed = (session.0 as u64) ^ (probe as u64).wrapping_mul(hash_constants::PROBE);
        let mut hash = hash_constants::TYPE ^ xxh64(name.as_bytes(), seed);
        if hash == 0 {
            hash = hash_constants::PROBE;
        }
        TypeId { session, hash }
    }

    /// Next identity to try after a collision at `probe`.
    #[inline]
    pub fn probe(session: SessionId, name: &str, probe: u32) -> Self {
        Self::with_probe(session, name, probe.wrapping_add(1))
    }

    /// Check whether this is the invalid sentinel.
    #[inline]
    pub const fn is_invalid(self) -> bool {
        self.hash == 0 && self.session.0 == 0
    }

    /// Check whether this id could have been issued by a registry.
    #[inline]
    pub const fn is_valid(self) -> bool {
        !self.is_invalid()
    }

    /// The session that issued this id.
    #[inline]
    pub const fn session(self) -> SessionId {
        self.session
    }

    /// The name hash, without the session tag.
    #[inline]
    pub const fn hash(self) -> u64 {
        self.hash
    }
}

impl Default for TypeId {
    fn default() -> Self {
        TypeId::INVALID
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({}:{:#018x})", self.session.0, self.hash)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:016x}", self.session.0, self.hash)
    }
}

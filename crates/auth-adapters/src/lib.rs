//! # auth-adapters
//!
//! `IdentityProvider` implementations: the hosted auth API and an
//! in-memory account table.

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "remote")]
pub mod supabase;

#[cfg(feature = "memory")]
pub use memory::MemoryIdentity;
#[cfg(feature = "remote")]
pub use supabase::SupabaseAuth;

/// Capacity of the session-change broadcast. Slow listeners that fall
/// behind re-check the session anyway.
pub const EVENT_CAPACITY: usize = 16;

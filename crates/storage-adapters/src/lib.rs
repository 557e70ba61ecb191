//! # storage-adapters
//!
//! `RecordStore` and `ObjectStore` implementations:
//!
//! - `supabase`: the hosted platform over HTTP (record API + object storage)
//! - `memory`: process-local maps, for tests and offline runs

#[cfg(feature = "memory")]
pub mod memory;
pub mod object_path;
#[cfg(feature = "remote")]
pub mod supabase;

#[cfg(feature = "memory")]
pub use memory::{MemoryObjectStore, MemoryRecordStore, Op};
#[cfg(feature = "remote")]
pub use supabase::{BucketStore, Connection, RestRecordStore};

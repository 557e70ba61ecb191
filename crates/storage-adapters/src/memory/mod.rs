//! # memory
//!
//! Process-local stores backed by `dashmap`. They honour the same filter,
//! order and limit semantics as the remote record API and can be told to
//! fail a given operation, which is how the error paths get exercised.

mod objects;
mod records;

pub use objects::{MemoryObjectStore, StoredObject};
pub use records::MemoryRecordStore;

use std::fmt;

/// Store operation targeted by failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Select,
    Insert,
    Update,
    Delete,
    Upload,
    Remove,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Op::Select => "select",
            Op::Insert => "insert",
            Op::Update => "update",
            Op::Delete => "delete",
            Op::Upload => "upload",
            Op::Remove => "remove",
        };
        f.write_str(name)
    }
}

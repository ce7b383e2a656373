//! Fragment Store
//!
//! Read contract the injection engine consumes, plus two backends: an
//! in-memory map and a sled database. Writes belong to the concrete backends;
//! the engine itself only ever reads.

pub mod memory;
pub mod persistence;

pub use memory::MemoryFragmentStore;
pub use persistence::{SledFragmentStore, StoredFragment};

use crate::error::StorageError;
use crate::types::{CodeFragment, FragmentKind, ResourceId};

/// Fragment Store read interface.
///
/// Unset slots come back as empty content, never as an error. Errors are
/// reserved for backend failures.
pub trait FragmentStore {
    /// Site-wide fragment of the given kind.
    fn global_fragment(&self, kind: FragmentKind) -> Result<CodeFragment, StorageError>;

    /// Per-resource server script. Other kinds have no per-resource variant.
    fn resource_fragment(&self, resource_id: ResourceId) -> Result<CodeFragment, StorageError>;

    /// Comma-separated condition rule text gating global fragments.
    fn condition_rules(&self) -> Result<String, StorageError>;
}

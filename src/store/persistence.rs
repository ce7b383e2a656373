//! Persistence layer for the Fragment Store

use crate::error::StorageError;
use crate::store::FragmentStore;
use crate::types::{CodeFragment, FragmentKind, ResourceId, Scope};
use serde::{Deserialize, Serialize};
use std::path::Path;

const RULES_KEY: &str = "rules";
const GLOBAL_PREFIX: &str = "global:";
const RESOURCE_PREFIX: &str = "resource:";

/// On-disk record for one fragment slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFragment {
    pub fragment: CodeFragment,
    /// Milliseconds since the Unix epoch of the last write
    pub updated_at_ms: i64,
}

fn fragment_key(scope: Scope, kind: FragmentKind) -> String {
    match scope {
        Scope::Global => format!("{}{}", GLOBAL_PREFIX, kind.as_str()),
        Scope::Resource(id) => format!("{}{}:{}", RESOURCE_PREFIX, id, kind.as_str()),
    }
}

/// Sled-based implementation of FragmentStore
///
/// Keys: `global:<kind>`, `resource:<id>:server_script`, and `rules`.
/// Writing empty content removes the key.
pub struct SledFragmentStore {
    db: sled::Db,
}

impl SledFragmentStore {
    /// Open (or create) a store at the given directory.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    pub fn set_global(&self, kind: FragmentKind, content: &str) -> Result<(), StorageError> {
        self.put(CodeFragment::new(kind, Scope::Global, content))
    }

    pub fn set_resource(&self, resource_id: ResourceId, content: &str) -> Result<(), StorageError> {
        self.put(CodeFragment::new(
            FragmentKind::ServerScript,
            Scope::Resource(resource_id),
            content,
        ))
    }

    pub fn set_rules(&self, rules: &str) -> Result<(), StorageError> {
        if rules.is_empty() {
            self.db.remove(RULES_KEY)?;
        } else {
            self.db.insert(RULES_KEY, bincode::serialize(rules)?)?;
        }
        Ok(())
    }

    /// Remove a global fragment. Returns whether anything was stored.
    pub fn clear_global(&self, kind: FragmentKind) -> Result<bool, StorageError> {
        let removed = self.db.remove(fragment_key(Scope::Global, kind))?;
        Ok(removed.is_some())
    }

    /// Remove a resource's server script. Returns whether anything was stored.
    pub fn clear_resource(&self, resource_id: ResourceId) -> Result<bool, StorageError> {
        let key = fragment_key(Scope::Resource(resource_id), FragmentKind::ServerScript);
        let removed = self.db.remove(key)?;
        Ok(removed.is_some())
    }

    /// Fetch the stored record for a slot, if set.
    pub fn get_record(
        &self,
        scope: Scope,
        kind: FragmentKind,
    ) -> Result<Option<StoredFragment>, StorageError> {
        match self.db.get(fragment_key(scope, kind))? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// All stored fragments, globals first, then resources in key order.
    pub fn list(&self) -> Result<Vec<StoredFragment>, StorageError> {
        let mut records = Vec::new();
        for prefix in [GLOBAL_PREFIX, RESOURCE_PREFIX] {
            for item in self.db.scan_prefix(prefix) {
                let (_, value) = item?;
                records.push(bincode::deserialize(&value)?);
            }
        }
        Ok(records)
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    fn put(&self, fragment: CodeFragment) -> Result<(), StorageError> {
        let key = fragment_key(fragment.scope, fragment.kind);
        if fragment.is_empty() {
            self.db.remove(key)?;
            return Ok(());
        }
        let record = StoredFragment {
            fragment,
            updated_at_ms: chrono::Utc::now().timestamp_millis(),
        };
        self.db.insert(key, bincode::serialize(&record)?)?;
        Ok(())
    }

    fn read(&self, scope: Scope, kind: FragmentKind) -> Result<CodeFragment, StorageError> {
        Ok(self
            .get_record(scope, kind)?
            .map(|record| record.fragment)
            .unwrap_or_else(|| CodeFragment::empty(kind, scope)))
    }
}

impl FragmentStore for SledFragmentStore {
    fn global_fragment(&self, kind: FragmentKind) -> Result<CodeFragment, StorageError> {
        self.read(Scope::Global, kind)
    }

    fn resource_fragment(&self, resource_id: ResourceId) -> Result<CodeFragment, StorageError> {
        self.read(Scope::Resource(resource_id), FragmentKind::ServerScript)
    }

    fn condition_rules(&self) -> Result<String, StorageError> {
        match self.db.get(RULES_KEY)? {
            Some(value) => Ok(bincode::deserialize(&value)?),
            None => Ok(String::new()),
        }
    }
}

//! In-process fragment store.

use crate::error::StorageError;
use crate::store::FragmentStore;
use crate::types::{CodeFragment, FragmentKind, ResourceId, Scope};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Map-backed store for hosts that already hold their settings in memory.
#[derive(Debug, Default)]
pub struct MemoryFragmentStore {
    fragments: RwLock<HashMap<(Scope, FragmentKind), String>>,
    rules: RwLock<String>,
}

impl MemoryFragmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(self, rules: impl Into<String>) -> Self {
        self.set_rules(rules);
        self
    }

    pub fn with_global(self, kind: FragmentKind, content: impl Into<String>) -> Self {
        self.set_global(kind, content);
        self
    }

    pub fn with_resource(self, resource_id: ResourceId, content: impl Into<String>) -> Self {
        self.set_resource(resource_id, content);
        self
    }

    pub fn set_rules(&self, rules: impl Into<String>) {
        *self.rules.write() = rules.into();
    }

    pub fn set_global(&self, kind: FragmentKind, content: impl Into<String>) {
        self.put(Scope::Global, kind, content.into());
    }

    pub fn set_resource(&self, resource_id: ResourceId, content: impl Into<String>) {
        self.put(
            Scope::Resource(resource_id),
            FragmentKind::ServerScript,
            content.into(),
        );
    }

    fn put(&self, scope: Scope, kind: FragmentKind, content: String) {
        let mut fragments = self.fragments.write();
        if content.is_empty() {
            fragments.remove(&(scope, kind));
        } else {
            fragments.insert((scope, kind), content);
        }
    }

    fn get(&self, scope: Scope, kind: FragmentKind) -> CodeFragment {
        let content = self
            .fragments
            .read()
            .get(&(scope, kind))
            .cloned()
            .unwrap_or_default();
        CodeFragment::new(kind, scope, content)
    }
}

impl FragmentStore for MemoryFragmentStore {
    fn global_fragment(&self, kind: FragmentKind) -> Result<CodeFragment, StorageError> {
        Ok(self.get(Scope::Global, kind))
    }

    fn resource_fragment(&self, resource_id: ResourceId) -> Result<CodeFragment, StorageError> {
        Ok(self.get(Scope::Resource(resource_id), FragmentKind::ServerScript))
    }

    fn condition_rules(&self) -> Result<String, StorageError> {
        Ok(self.rules.read().clone())
    }
}

//! Integration tests for the sled-backed Fragment Store

use codeweave::store::{FragmentStore, SledFragmentStore};
use codeweave::types::{FragmentKind, Scope};
use tempfile::TempDir;

/// Fragments survive closing and reopening the database
#[test]
fn test_fragments_persist_across_reopen() {
    let store_dir = TempDir::new().unwrap();

    {
        let store = SledFragmentStore::new(store_dir.path()).unwrap();
        store.set_global(FragmentKind::Style, "body{color:red}").unwrap();
        store.set_global(FragmentKind::ClientScript, "init();").unwrap();
        store.set_resource(12, "echo(\"twelve\");").unwrap();
        store.set_rules("post-12, about").unwrap();
        store.flush().unwrap();
    }

    let store = SledFragmentStore::new(store_dir.path()).unwrap();
    assert_eq!(
        store.global_fragment(FragmentKind::Style).unwrap().content,
        "body{color:red}"
    );
    assert_eq!(
        store.global_fragment(FragmentKind::ClientScript).unwrap().content,
        "init();"
    );
    assert!(store
        .global_fragment(FragmentKind::ServerScript)
        .unwrap()
        .is_empty());
    assert_eq!(store.resource_fragment(12).unwrap().content, "echo(\"twelve\");");
    assert_eq!(store.condition_rules().unwrap(), "post-12, about");
}

/// Records carry a write timestamp and the list covers every stored slot
#[test]
fn test_list_reports_every_slot() {
    let store_dir = TempDir::new().unwrap();
    let store = SledFragmentStore::new(store_dir.path()).unwrap();

    store.set_global(FragmentKind::Style, "a{}").unwrap();
    store.set_resource(1, "echo(1);").unwrap();
    store.set_resource(2, "echo(2);").unwrap();

    let records = store.list().unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|record| record.updated_at_ms > 0));
    assert_eq!(records[0].fragment.scope, Scope::Global);

    let record = store
        .get_record(Scope::Resource(2), FragmentKind::ServerScript)
        .unwrap()
        .unwrap();
    assert_eq!(record.fragment.content, "echo(2);");
}

/// Resource slots are independent of one another
#[test]
fn test_resource_slots_are_independent() {
    let store_dir = TempDir::new().unwrap();
    let store = SledFragmentStore::new(store_dir.path()).unwrap();

    store.set_resource(1, "echo(1);").unwrap();
    store.set_resource(10, "echo(10);").unwrap();
    assert!(store.clear_resource(1).unwrap());

    assert!(store.resource_fragment(1).unwrap().is_empty());
    assert_eq!(store.resource_fragment(10).unwrap().content, "echo(10);");
}

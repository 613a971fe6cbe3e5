#![forbid(unsafe_code)]

use kt_core::model::CriterionStatus;
use kt_storage::{KeyStore, StoreError};
use std::path::PathBuf;

fn temp_db(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let dir = base.join(format!("kt_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir.join("keytrack.db")
}

#[test]
fn open_is_idempotent_and_preserves_rows() {
    let db = temp_db("open_idempotent");
    let mut store = KeyStore::open(&db).expect("open store");
    let id = store.insert_key("FEATURE123", "2024-01-01T00:00:00").expect("insert key");
    drop(store);

    let store = KeyStore::open(&db).expect("reopen store");
    assert_eq!(
        store.find_key_by_name("FEATURE123").expect("lookup"),
        Some(id),
        "reopening must not touch existing rows"
    );
}

#[test]
fn insert_key_accepts_empty_names() {
    // Names are free text with no uniqueness or shape constraints; an empty
    // string is stored and resolvable like any other name.
    let db = temp_db("empty_name");
    let mut store = KeyStore::open(&db).expect("open store");
    let id = store.insert_key("", "2024-01-01T00:00:00").expect("insert empty name");
    assert_eq!(store.find_key_by_name("").expect("lookup"), Some(id));
    let keys = store.list_keys().expect("keys");
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].key_name, "");
}

#[test]
fn failed_scope_rolls_back_every_write() {
    let db = temp_db("scope_rollback");
    let mut store = KeyStore::open(&db).expect("open store");
    let kept = store.insert_key("kept", "2024-01-01T00:00:00").expect("insert key");

    let err = store
        .scope(|txn| {
            let key_id = txn.insert_key("doomed", "2024-01-02T00:00:00")?;
            txn.insert_criterion(key_id, "c", CriterionStatus::Proposed, "2024-01-02T00:00:00")?;
            txn.insert_undo_log(key_id, "checkpoint", "abc1234", "2024-01-02T00:00:00")?;
            txn.update_key_timestamp(kept, "2024-01-02T00:00:00")?;
            Err::<(), _>(StoreError::Io(std::io::Error::other("disk full")))
        })
        .expect_err("scope must propagate the failure");
    assert!(matches!(err, StoreError::Io(_)));

    let keys = store.list_keys().expect("keys");
    assert_eq!(keys.len(), 1, "the doomed key must not survive");
    assert_eq!(keys[0].key_name, "kept");
    assert_eq!(keys[0].updated_at, "2024-01-01T00:00:00");
    assert!(store.list_criteria().expect("criteria").is_empty());
    assert!(store.list_undo_logs().expect("undo logs").is_empty());
}

#[test]
fn scope_commits_every_write_together() {
    let db = temp_db("scope_commit");
    let mut store = KeyStore::open(&db).expect("open store");
    let key_id = store
        .scope(|txn| {
            let key_id = txn.insert_key("k", "2024-01-01T00:00:00")?;
            txn.insert_criterion(key_id, "c", CriterionStatus::Proposed, "2024-01-01T00:00:00")?;
            txn.insert_undo_log(key_id, "checkpoint", "abc1234", "2024-01-01T00:00:00")?;
            Ok(key_id)
        })
        .expect("scope commits");

    assert_eq!(store.find_key_by_name("k").expect("lookup"), Some(key_id));
    assert_eq!(store.criteria_for_key(key_id).expect("criteria").len(), 1);
    assert_eq!(store.list_undo_logs().expect("undo logs").len(), 1);
}

#[test]
fn find_key_by_name_returns_first_match_for_duplicates() {
    let db = temp_db("duplicate_names");
    let mut store = KeyStore::open(&db).expect("open store");
    let first = store.insert_key("dup", "2024-01-01T00:00:00").expect("insert first");
    let second = store.insert_key("dup", "2024-01-01T00:00:01").expect("insert second");
    assert!(second > first, "ids are monotone per table");
    assert_eq!(store.find_key_by_name("dup").expect("lookup"), Some(first));
}

#[test]
fn find_key_by_name_signals_not_found() {
    let db = temp_db("not_found");
    let store = KeyStore::open(&db).expect("open store");
    assert_eq!(store.find_key_by_name("missing").expect("lookup"), None);
}

#[test]
fn set_criteria_status_updates_every_criterion_of_the_key() {
    let db = temp_db("bulk_status");
    let mut store = KeyStore::open(&db).expect("open store");
    let key_id = store.insert_key("k", "2024-01-01T00:00:00").expect("insert key");
    let other_id = store.insert_key("other", "2024-01-01T00:00:00").expect("insert other");
    for desc in ["one", "two"] {
        store
            .insert_criterion(key_id, desc, CriterionStatus::Proposed, "2024-01-01T00:00:00")
            .expect("insert criterion");
    }
    store
        .insert_criterion(other_id, "untouched", CriterionStatus::Proposed, "2024-01-01T00:00:00")
        .expect("insert criterion");

    let updated = store
        .set_criteria_status_for_key(key_id, CriterionStatus::Final, "2024-01-02T00:00:00")
        .expect("bulk update");
    assert_eq!(updated, 2);

    for row in store.criteria_for_key(key_id).expect("list key criteria") {
        assert_eq!(row.status, "Final");
        assert_eq!(row.updated_at, "2024-01-02T00:00:00");
        assert_eq!(row.created_at, "2024-01-01T00:00:00");
    }
    let other = store.criteria_for_key(other_id).expect("list other criteria");
    assert_eq!(other.len(), 1);
    assert_eq!(other[0].status, "Proposed");
}

#[test]
fn lists_are_ordered_by_ascending_id() {
    let db = temp_db("list_order");
    let mut store = KeyStore::open(&db).expect("open store");
    let a = store.insert_key("a", "2024-01-01T00:00:00").expect("insert a");
    let b = store.insert_key("b", "2024-01-01T00:00:00").expect("insert b");
    store
        .insert_undo_log(b, "checkpoint", "0000000", "2024-01-01T00:00:00")
        .expect("undo b");
    store
        .insert_undo_log(a, "keylock", "abc1234", "2024-01-01T00:00:01")
        .expect("undo a");

    let keys = store.list_keys().expect("list keys");
    assert_eq!(
        keys.iter().map(|row| row.id).collect::<Vec<_>>(),
        vec![a, b]
    );

    let logs = store.list_undo_logs().expect("list undo logs");
    assert_eq!(logs.len(), 2);
    assert!(logs[0].id < logs[1].id);
    assert_eq!(logs[0].action, "checkpoint");
    assert_eq!(logs[0].commit_hash.as_deref(), Some("0000000"));
    assert_eq!(logs[1].action, "keylock");
}

#[test]
fn reset_drops_all_tables_and_open_recreates_them_empty() {
    let db = temp_db("reset");
    let mut store = KeyStore::open(&db).expect("open store");
    let key_id = store.insert_key("x", "2024-01-01T00:00:00").expect("insert key");
    store
        .insert_criterion(key_id, "c", CriterionStatus::Proposed, "2024-01-01T00:00:00")
        .expect("insert criterion");
    store
        .insert_undo_log(key_id, "checkpoint", "0000000", "2024-01-01T00:00:00")
        .expect("insert undo");
    drop(store);

    KeyStore::reset(&db).expect("reset store");
    let store = KeyStore::open(&db).expect("reopen store");
    assert!(store.list_keys().expect("keys").is_empty());
    assert!(store.list_criteria().expect("criteria").is_empty());
    assert!(store.list_undo_logs().expect("undo logs").is_empty());
}

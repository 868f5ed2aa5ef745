//! Commit/rollback sequences on real files.

use gcu_core::detect::Fingerprint;
use gcu_core::store::{backup_path, RollbackOutcome, TransactionalConfigStore};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

fn read(path: &std::path::Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_commit_commit_rollback_restores_first() {
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("config.js");
    let store = TransactionalConfigStore::new();

    store.commit(&dest, &json!({"generation": 1}), true).unwrap();
    store.commit(&dest, &json!({"generation": 2}), true).unwrap();
    assert_eq!(read(&dest)["generation"], 2);

    let outcome = store.rollback(&dest).unwrap();
    assert!(matches!(outcome, RollbackOutcome::Restored { .. }));
    assert_eq!(read(&dest)["generation"], 1);
    assert!(!backup_path(&dest).exists());

    // One generation only: a second rollback does nothing.
    assert_eq!(store.rollback(&dest).unwrap(), RollbackOutcome::NoBackup);
    assert_eq!(read(&dest)["generation"], 1);
}

#[test]
fn test_many_commits_keep_exactly_one_backup() {
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("gui.json");
    let store = TransactionalConfigStore::new();

    for generation in 1..=5 {
        store.commit(&dest, &json!({ "generation": generation }), true).unwrap();
    }

    let backups: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".backup"))
        .collect();
    assert_eq!(backups.len(), 1);
    assert_eq!(read(&backup_path(&dest))["generation"], 4);
}

#[test]
fn test_rollback_without_commit_is_noop() {
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("config.js");
    fs::write(&dest, "untouched").unwrap();

    let outcome = TransactionalConfigStore::new().rollback(&dest).unwrap();
    assert_eq!(outcome, RollbackOutcome::NoBackup);
    assert_eq!(fs::read_to_string(&dest).unwrap(), "untouched");
}

#[test]
fn test_commit_without_backup_leaves_previous_backup() {
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("config.js");
    let store = TransactionalConfigStore::new();

    store.commit(&dest, &json!({"generation": 1}), true).unwrap();
    store.commit(&dest, &json!({"generation": 2}), true).unwrap();
    store.commit(&dest, &json!({"generation": 3}), false).unwrap();

    assert_eq!(read(&backup_path(&dest))["generation"], 1);
    store.rollback(&dest).unwrap();
    assert_eq!(read(&dest)["generation"], 1);
}

#[test]
fn test_written_file_reads_back_with_key_order() {
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("config.js");
    let store = TransactionalConfigStore::new();

    let content: Value =
        serde_json::from_str(r#"{"zeta": 1, "alpha": {"name": "Ünïcode"}, "mid": [1, 2]}"#)
            .unwrap();
    store.commit(&dest, &content, true).unwrap();

    let text = fs::read_to_string(&dest).unwrap();
    let zeta = text.find("zeta").unwrap();
    let alpha = text.find("alpha").unwrap();
    assert!(zeta < alpha);
    assert!(text.contains("Ünïcode"));

    let back: Value = store.read(&dest).unwrap();
    assert_eq!(back, content);
}

proptest! {
    #[test]
    fn prop_single_byte_change_changes_digest(
        body in proptest::collection::vec(any::<u8>(), 1..512),
        index in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let mut changed = body.clone();
        let i = index.index(changed.len());
        changed[i] ^= flip;
        prop_assert_ne!(Fingerprint::of_content(&body), Fingerprint::of_content(&changed));
    }

    #[test]
    fn prop_digest_is_deterministic(body in proptest::collection::vec(any::<u8>(), 0..512)) {
        let a = Fingerprint::of_content(&body).to_record();
        prop_assert_eq!(a.len(), 64);
        prop_assert_eq!(a, Fingerprint::of_content(&body).to_record());
    }
}

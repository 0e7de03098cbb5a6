// tests/store_commit.rs
//
// Persistence writer against a file-backed database shared by two handles,
// the way two overlapping runs would see it.

mod common;

use common::item;
use daily_digest::ingest::types::ItemKey;
use daily_digest::ranking::ScoredItem;
use daily_digest::store::{Store, StoreError};

fn scored(key: &str) -> ScoredItem {
    ScoredItem {
        item: item("openai", key, &format!("title {key}"), 5),
        relevance_score: 1.0,
        matched_interests: vec![],
        reasons: vec![],
    }
}

async fn shared_stores() -> (tempfile::TempDir, Store, Store) {
    let tmp = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}/digest.db", tmp.path().display());
    let a = Store::connect(&url).await.expect("connect a");
    a.migrate().await.expect("migrate");
    let b = Store::connect(&url).await.expect("connect b");
    (tmp, a, b)
}

#[tokio::test]
async fn racing_writer_conflict_rolls_back_everything() {
    let (_tmp, a, b) = shared_stores().await;

    // Both runs read an empty store...
    assert!(a.existing_keys().await.unwrap().is_empty());
    assert!(b.existing_keys().await.unwrap().is_empty());

    // ...then B commits first.
    assert_eq!(b.insert_all(&[scored("x"), scored("y")], "run-b").await.unwrap(), 2);

    let err = a
        .insert_all(&[scored("new-1"), scored("y"), scored("new-2"), scored("x")], "run-a")
        .await
        .unwrap_err();
    match &err {
        StoreError::Conflict(keys) => {
            assert_eq!(keys, &vec![ItemKey::new("openai", "y"), ItemKey::new("openai", "x")]);
        }
        other => panic!("expected conflict, got {other}"),
    }

    let keys = a.existing_keys().await.unwrap();
    assert_eq!(keys.len(), 2, "no partial write from the losing run");
    assert!(!keys.contains(&ItemKey::new("openai", "new-1")));
}

#[tokio::test]
async fn repeated_key_inside_one_batch_is_a_conflict() {
    let (_tmp, a, _b) = shared_stores().await;
    let err = a.insert_all(&[scored("dup"), scored("dup")], "run").await.unwrap_err();
    assert_eq!(err.conflicts(), &[ItemKey::new("openai", "dup")]);
    assert_eq!(a.item_count().await.unwrap(), 0);
}

#[tokio::test]
async fn migrate_on_existing_data_keeps_rows() {
    let (_tmp, a, b) = shared_stores().await;
    a.insert_all(&[scored("keep")], "run").await.unwrap();
    b.migrate().await.unwrap();
    assert_eq!(b.item_count().await.unwrap(), 1);
}

// tests/dedup_properties.rs

mod common;

use common::item;
use daily_digest::ingest::dedupe;
use daily_digest::ingest::types::ItemKey;
use std::collections::HashSet;

fn pool() -> Vec<daily_digest::ingest::types::Item> {
    vec![
        item("openai", "a", "first a", 1),
        item("openai", "b", "b", 2),
        item("openai", "a", "second a", 3),
        item("youtube", "a", "video a", 4),
        item("anthropic", "c", "c", 5),
        item("anthropic", "c", "c again", 6),
    ]
}

#[test]
fn dedupe_is_idempotent() {
    let persisted: HashSet<ItemKey> = [ItemKey::new("openai", "b")].into_iter().collect();
    let (once, _, _) = dedupe(pool(), &persisted);
    let (twice, seen, dups) = dedupe(once.clone(), &persisted);
    assert_eq!(once, twice);
    assert_eq!((seen, dups), (0, 0));
}

#[test]
fn output_is_unique_and_disjoint_from_persisted() {
    let persisted: HashSet<ItemKey> = [ItemKey::new("anthropic", "c")].into_iter().collect();
    let (kept, seen, dups) = dedupe(pool(), &persisted);

    let keys: Vec<ItemKey> = kept.iter().map(|i| i.key()).collect();
    let unique: HashSet<&ItemKey> = keys.iter().collect();
    assert_eq!(unique.len(), keys.len());
    assert!(keys.iter().all(|k| !persisted.contains(k)));
    assert_eq!(seen, 2);
    assert_eq!(dups, 1);
    assert_eq!(kept.len() + seen + dups, pool().len());
}

#[test]
fn first_occurrence_order_is_stable() {
    let (kept, _, _) = dedupe(pool(), &HashSet::new());
    let titles: Vec<&str> = kept.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["first a", "b", "video a", "c"]);
}

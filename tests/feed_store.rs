mod common;

use common::{articles, ids};
use proto_news::article::EntityId;
use proto_news::feed_store::FeedStore;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn test_batches_partition_the_articles() {
    let mut store = FeedStore::new(5, 9);
    store.load(articles(12));

    let mut seen = Vec::new();
    let mut sizes = Vec::new();
    while !store.is_exhausted() {
        let batch = store.next_batch();
        sizes.push(batch.len());
        seen.extend(ids(&batch));
    }

    assert_eq!(sizes, vec![5, 5, 2], "Unexpected batch sizes");
    assert_eq!(seen, ids(&articles(12)), "Batches must cover every article once, in order");
    assert!(store.next_batch().is_empty(), "Exhausted store must yield nothing");
    assert_eq!(store.cursor(), 12);
}

#[test]
fn test_twelve_article_scroll_with_reshuffle() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut store = FeedStore::new(5, 9);
    store.load(articles(12));

    let mut sizes = Vec::new();
    let mut cursors = Vec::new();
    for _ in 0..4 {
        if store.is_exhausted() {
            store.reshuffle_with(&mut rng);
            cursors.push(store.cursor());
        }
        sizes.push(store.next_batch().len());
        cursors.push(store.cursor());
    }

    assert_eq!(sizes, vec![5, 5, 2, 5]);
    assert_eq!(cursors, vec![5, 10, 12, 0, 5]);
    assert!(store.has_looped(), "Reshuffle must mark the store as looped");
}

#[test]
fn test_reshuffle_is_a_permutation() {
    let mut store = FeedStore::default();
    store.load(articles(20));

    for seed in 0..10 {
        let mut rng = StdRng::seed_from_u64(seed);
        store.reshuffle_with(&mut rng);

        let mut shuffled: Vec<i64> = store
            .articles()
            .iter()
            .map(|a| match a.id {
                EntityId::Number(n) => n,
                EntityId::Text(_) => panic!("unexpected text id"),
            })
            .collect();
        shuffled.sort();
        assert_eq!(shuffled, (1..=20).collect::<Vec<_>>(), "Seed {} lost or duplicated articles", seed);
        assert_eq!(store.cursor(), 0);
    }
}

#[test]
fn test_reshuffle_is_reproducible_with_a_seed() {
    let mut a = FeedStore::default();
    let mut b = FeedStore::default();
    a.load(articles(15));
    b.load(articles(15));

    a.reshuffle_with(&mut StdRng::seed_from_u64(42));
    b.reshuffle_with(&mut StdRng::seed_from_u64(42));

    assert_eq!(ids(a.articles()), ids(b.articles()));
}

#[test]
fn test_reshuffle_of_tiny_collections() {
    let mut store = FeedStore::default();
    store.reshuffle();
    assert!(store.is_empty());
    assert!(store.has_looped());

    store.load(articles(1));
    store.reshuffle();
    assert_eq!(ids(store.articles()), ids(&articles(1)));
}

#[test]
fn test_first_n_leaves_cursor_alone() {
    let mut store = FeedStore::new(5, 9);
    store.load(articles(12));
    store.next_batch();

    assert_eq!(ids(store.first_n(3)), ids(&articles(3)));
    assert_eq!(store.first_n(50).len(), 12, "first_n must cap at the article count");
    assert_eq!(store.desktop_articles().len(), 9);
    assert_eq!(store.cursor(), 5, "first_n must not move the cursor");
}

#[test]
fn test_load_resets_cursor() {
    let mut store = FeedStore::new(4, 9);
    store.load(articles(10));
    store.next_batch();
    store.reshuffle();

    store.load(articles(3));
    assert_eq!(store.cursor(), 0);
    assert!(!store.has_looped());
    assert_eq!(store.next_batch().len(), 3);
    assert!(store.is_exhausted());
}

#[test]
fn test_empty_store() {
    let mut store = FeedStore::default();
    assert!(store.is_exhausted(), "An empty store is exhausted from the start");
    assert!(store.next_batch().is_empty());
    assert!(store.first_n(5).is_empty());
}

#[test]
fn test_zero_page_size_is_raised() {
    let store = FeedStore::new(0, 9);
    assert_eq!(store.page_size(), 1);
}

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use recall_core::{Rating, Repository, ReviewService};
use recall_json::JsonStore;
use std::sync::Arc;

async fn open_store(dir: &std::path::Path) -> JsonStore {
    JsonStore::open_with(dir.join("recall.json"), dir.join("backups"), 3)
        .await
        .unwrap()
}

#[tokio::test]
async fn review_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    let deck_id;
    let card_id;
    let saved;
    {
        let store = Arc::new(open_store(dir.path()).await);
        let deck = store.create_deck("Spanish", Some("basics")).await.unwrap();
        let card = store.add_card(deck.id, "hola", "hello").await.unwrap();
        deck_id = deck.id;
        card_id = card.id;

        let service = ReviewService::new(store.clone());
        let now = Utc::now();
        let mut rng = StdRng::seed_from_u64(11);
        saved = service
            .process_review_at(card.id, Rating::Good, 1500, now, &mut rng)
            .await
            .unwrap();
    }

    let store = open_store(dir.path()).await;
    let deck = store.get_deck(deck_id).await.unwrap();
    assert_eq!(deck.title, "Spanish");
    assert_eq!(deck.card_count, 1);

    let state = store.get_review_state(card_id).await.unwrap();
    assert_eq!(state.interval, saved.interval);
    assert_eq!(state.repetitions, saved.repetitions);
    assert!((state.ease_factor - saved.ease_factor).abs() < 1e-4);
    // ISO-8601 timestamps round-trip exactly
    assert_eq!(state.next_review, saved.next_review);
    assert_eq!(state.last_reviewed, saved.last_reviewed);

    let logs = store.list_review_logs(Some(deck_id)).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].response_time_ms, 1500);
    assert!(logs[0].was_correct);

    let progress = store.get_progress().await.unwrap();
    assert_eq!(progress.total_cards_reviewed, 1);
    assert_eq!(progress.current_streak, 1);

    let daily = store.list_daily_stats().await.unwrap();
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0].cards_reviewed, 1);
}

#[tokio::test]
async fn duplicate_deck_title_is_a_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path()).await;
    store.create_deck("Dup", None).await.unwrap();
    assert!(store.create_deck("dup", None).await.is_err());
}

#[tokio::test]
async fn backups_rotate() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path()).await;
    let deck = store.create_deck("Backups", None).await.unwrap();
    for i in 0..6 {
        store
            .add_card(deck.id, &format!("q{i}"), &format!("a{i}"))
            .await
            .unwrap();
    }
    let backups: Vec<_> = std::fs::read_dir(dir.path().join("backups"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    assert!(backups.len() <= 3);
    assert!(!backups.is_empty());
}

use crate::{
    CardId, CoreError, DailyStats, Deck, DeckId, Flashcard, ReviewLog, ReviewState, UserProgress,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

pub mod memory;

pub use memory::MemoryRepo;

/// Number of days of per-day stats a repository keeps around.
pub const DAILY_STATS_RETENTION_DAYS: i64 = 30;

#[async_trait]
pub trait Repository: Send + Sync {
    // Decks
    async fn create_deck(&self, title: &str, description: Option<&str>)
        -> Result<Deck, CoreError>;
    async fn get_deck(&self, id: DeckId) -> Result<Deck, CoreError>;
    async fn list_decks(&self) -> Result<Vec<Deck>, CoreError>;
    async fn delete_deck(&self, id: DeckId) -> Result<(), CoreError>;
    /// Recompute the deck's denormalized card/due counts.
    async fn refresh_deck_counts(&self, id: DeckId) -> Result<(), CoreError>;

    // Cards. Adding a card also creates its ReviewState (exactly one per card).
    async fn add_card(
        &self,
        deck_id: DeckId,
        question: &str,
        answer: &str,
    ) -> Result<Flashcard, CoreError>;
    async fn get_card(&self, id: CardId) -> Result<Flashcard, CoreError>;
    async fn list_cards(&self, deck_id: Option<DeckId>) -> Result<Vec<Flashcard>, CoreError>;
    async fn delete_card(&self, id: CardId) -> Result<(), CoreError>;

    // Review state
    async fn get_review_state(&self, card_id: CardId) -> Result<ReviewState, CoreError>;
    async fn save_review_state(&self, state: &ReviewState) -> Result<(), CoreError>;
    async fn list_review_states(
        &self,
        deck_id: Option<DeckId>,
    ) -> Result<Vec<ReviewState>, CoreError>;
    async fn list_due_cards(
        &self,
        deck_id: Option<DeckId>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Flashcard>, CoreError>;

    // Review logs (append-only)
    async fn append_review_log(&self, log: &ReviewLog) -> Result<(), CoreError>;
    async fn list_review_logs(&self, deck_id: Option<DeckId>)
        -> Result<Vec<ReviewLog>, CoreError>;

    // Progress and daily stats
    async fn get_progress(&self) -> Result<UserProgress, CoreError>;
    async fn save_progress(&self, progress: &UserProgress) -> Result<(), CoreError>;
    async fn get_daily_stats(&self, date: NaiveDate) -> Result<Option<DailyStats>, CoreError>;
    async fn upsert_daily_stats(&self, stats: &DailyStats) -> Result<(), CoreError>;
    async fn list_daily_stats(&self) -> Result<Vec<DailyStats>, CoreError>;
}

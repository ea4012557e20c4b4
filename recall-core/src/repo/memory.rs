use crate::repo::DAILY_STATS_RETENTION_DAYS;
use crate::{
    CardId, CoreError, DailyStats, Deck, DeckId, Flashcard, ReviewLog, ReviewState, UserProgress,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

#[derive(Default)]
pub struct MemoryRepo {
    decks: RwLock<HashMap<DeckId, Deck>>,
    cards: RwLock<HashMap<CardId, Flashcard>>,
    states: RwLock<HashMap<CardId, ReviewState>>,
    logs: RwLock<Vec<ReviewLog>>,
    progress: RwLock<UserProgress>,
    daily: RwLock<BTreeMap<NaiveDate, DailyStats>>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    fn recount(&self, deck_id: DeckId) {
        let cards = self.cards.read();
        let states = self.states.read();
        let now = Utc::now();
        let deck_cards: Vec<CardId> = cards
            .values()
            .filter(|c| c.deck_id == deck_id)
            .map(|c| c.id)
            .collect();
        let due = deck_cards
            .iter()
            .filter(|id| states.get(id).map(|s| s.is_due(now)).unwrap_or(false))
            .count();
        let mut decks = self.decks.write();
        if let Some(deck) = decks.get_mut(&deck_id) {
            deck.card_count = deck_cards.len() as u32;
            deck.due_count = due as u32;
            deck.updated_at = now;
        }
    }
}

#[async_trait]
impl crate::repo::Repository for MemoryRepo {
    async fn create_deck(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> Result<Deck, CoreError> {
        let deck = Deck::new(title, description.map(|s| s.to_string()));
        let mut m = self.decks.write();
        if m.values().any(|d| d.title.eq_ignore_ascii_case(title)) {
            return Err(CoreError::Conflict("deck title already exists"));
        }
        m.insert(deck.id, deck.clone());
        Ok(deck)
    }

    async fn get_deck(&self, id: DeckId) -> Result<Deck, CoreError> {
        self.decks
            .read()
            .get(&id)
            .cloned()
            .ok_or(CoreError::NotFound("deck"))
    }

    async fn list_decks(&self) -> Result<Vec<Deck>, CoreError> {
        Ok(self.decks.read().values().cloned().collect())
    }

    async fn delete_deck(&self, id: DeckId) -> Result<(), CoreError> {
        self.decks
            .write()
            .remove(&id)
            .ok_or(CoreError::NotFound("deck"))?;
        let mut cards = self.cards.write();
        let ids: Vec<CardId> = cards
            .values()
            .filter(|c| c.deck_id == id)
            .map(|c| c.id)
            .collect();
        for cid in ids {
            cards.remove(&cid);
            self.states.write().remove(&cid);
        }
        self.logs.write().retain(|l| l.deck_id != id);
        Ok(())
    }

    async fn refresh_deck_counts(&self, id: DeckId) -> Result<(), CoreError> {
        if !self.decks.read().contains_key(&id) {
            return Err(CoreError::NotFound("deck"));
        }
        self.recount(id);
        Ok(())
    }

    async fn add_card(
        &self,
        deck_id: DeckId,
        question: &str,
        answer: &str,
    ) -> Result<Flashcard, CoreError> {
        if !self.decks.read().contains_key(&deck_id) {
            return Err(CoreError::NotFound("deck"));
        }
        let card = Flashcard::new(deck_id, question, answer);
        self.states
            .write()
            .insert(card.id, ReviewState::new(card.id));
        self.cards.write().insert(card.id, card.clone());
        self.recount(deck_id);
        Ok(card)
    }

    async fn get_card(&self, id: CardId) -> Result<Flashcard, CoreError> {
        self.cards
            .read()
            .get(&id)
            .cloned()
            .ok_or(CoreError::NotFound("card"))
    }

    async fn list_cards(&self, deck_id: Option<DeckId>) -> Result<Vec<Flashcard>, CoreError> {
        let cards = self.cards.read();
        let mut v: Vec<Flashcard> = cards.values().cloned().collect();
        if let Some(did) = deck_id {
            v.retain(|c| c.deck_id == did);
        }
        Ok(v)
    }

    async fn delete_card(&self, id: CardId) -> Result<(), CoreError> {
        let card = self
            .cards
            .write()
            .remove(&id)
            .ok_or(CoreError::NotFound("card"))?;
        self.states.write().remove(&id);
        self.recount(card.deck_id);
        Ok(())
    }

    async fn get_review_state(&self, card_id: CardId) -> Result<ReviewState, CoreError> {
        self.states
            .read()
            .get(&card_id)
            .cloned()
            .ok_or(CoreError::NotFound("review state"))
    }

    async fn save_review_state(&self, state: &ReviewState) -> Result<(), CoreError> {
        let mut m = self.states.write();
        if !m.contains_key(&state.card_id) {
            return Err(CoreError::NotFound("review state"));
        }
        m.insert(state.card_id, state.clone());
        Ok(())
    }

    async fn list_review_states(
        &self,
        deck_id: Option<DeckId>,
    ) -> Result<Vec<ReviewState>, CoreError> {
        let states = self.states.read();
        match deck_id {
            None => Ok(states.values().cloned().collect()),
            Some(did) => {
                let cards = self.cards.read();
                Ok(states
                    .values()
                    .filter(|s| {
                        cards
                            .get(&s.card_id)
                            .map(|c| c.deck_id == did)
                            .unwrap_or(false)
                    })
                    .cloned()
                    .collect())
            }
        }
    }

    async fn list_due_cards(
        &self,
        deck_id: Option<DeckId>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Flashcard>, CoreError> {
        let cards = self.cards.read();
        let states = self.states.read();
        let mut due: Vec<Flashcard> = cards
            .values()
            .filter(|c| deck_id.map(|did| c.deck_id == did).unwrap_or(true))
            .filter(|c| states.get(&c.id).map(|s| s.is_due(now)).unwrap_or(true))
            .cloned()
            .collect();
        due.sort_by_key(|c| {
            (
                states.get(&c.id).map(|s| s.next_review).unwrap_or(now),
                c.created_at,
            )
        });
        Ok(due)
    }

    async fn append_review_log(&self, log: &ReviewLog) -> Result<(), CoreError> {
        self.logs.write().push(log.clone());
        Ok(())
    }

    async fn list_review_logs(
        &self,
        deck_id: Option<DeckId>,
    ) -> Result<Vec<ReviewLog>, CoreError> {
        let logs = self.logs.read();
        Ok(logs
            .iter()
            .filter(|l| deck_id.map(|did| l.deck_id == did).unwrap_or(true))
            .cloned()
            .collect())
    }

    async fn get_progress(&self) -> Result<UserProgress, CoreError> {
        Ok(self.progress.read().clone())
    }

    async fn save_progress(&self, progress: &UserProgress) -> Result<(), CoreError> {
        *self.progress.write() = progress.clone();
        Ok(())
    }

    async fn get_daily_stats(&self, date: NaiveDate) -> Result<Option<DailyStats>, CoreError> {
        Ok(self.daily.read().get(&date).cloned())
    }

    async fn upsert_daily_stats(&self, stats: &DailyStats) -> Result<(), CoreError> {
        let mut daily = self.daily.write();
        daily.insert(stats.date, stats.clone());
        let cutoff = stats.date - Duration::days(DAILY_STATS_RETENTION_DAYS);
        daily.retain(|d, _| *d >= cutoff);
        Ok(())
    }

    async fn list_daily_stats(&self) -> Result<Vec<DailyStats>, CoreError> {
        Ok(self.daily.read().values().cloned().collect())
    }
}

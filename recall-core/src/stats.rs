use crate::{Deck, DeckId, Flashcard, Rating, ReviewLog, ReviewState};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

/// Interval at which a card counts as mastered for deck analytics.
pub const MASTERED_INTERVAL_DAYS: u32 = 21;

#[derive(Clone, Debug, Default)]
pub struct Totals {
    pub total: u32,
    pub again: u32,
    pub hard: u32,
    pub good: u32,
    pub easy: u32,
}

impl Totals {
    pub fn record(&mut self, rating: Rating) {
        self.total += 1;
        match rating {
            Rating::Again => self.again += 1,
            Rating::Hard => self.hard += 1,
            Rating::Good => self.good += 1,
            Rating::Easy => self.easy += 1,
        }
    }

    pub fn accuracy(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            (self.total - self.again) as f32 / self.total as f32
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct StatsSummary {
    pub totals: Totals,
    pub per_day: BTreeMap<NaiveDate, Totals>,
}

pub fn summarize(logs: &[ReviewLog]) -> StatsSummary {
    let mut summary = StatsSummary::default();
    for log in logs {
        summary.totals.record(log.rating);
        let day = log.timestamp.date_naive();
        summary.per_day.entry(day).or_default().record(log.rating);
    }
    summary
}

/// Consecutive days ending at `today` with at least one review.
pub fn daily_streak(logs: &[ReviewLog], today: NaiveDate) -> u32 {
    let per_day = summarize(logs).per_day;
    let mut streak = 0u32;
    let mut day = today;
    loop {
        if per_day.get(&day).map(|t| t.total > 0).unwrap_or(false) {
            streak += 1;
            day -= Duration::days(1);
        } else {
            break;
        }
    }
    streak
}

#[derive(Clone, Debug)]
pub struct DeckAnalytics {
    pub deck_id: DeckId,
    pub deck_title: String,
    pub total_cards: u32,
    pub mastered_cards: u32,
    pub learning_cards: u32,
    pub new_cards: u32,
    /// Percentage of logged reviews that were correct, 0-100.
    pub retention_rate: u32,
    pub average_ease_factor: f32,
}

/// Aggregate a deck's cards, scheduling states, and review logs into the
/// analytics view. `states` and `logs` may contain rows for other decks; they
/// are filtered by card membership and deck id respectively.
pub fn deck_analytics(
    deck: &Deck,
    cards: &[Flashcard],
    states: &[ReviewState],
    logs: &[ReviewLog],
) -> DeckAnalytics {
    let deck_cards: Vec<&Flashcard> = cards.iter().filter(|c| c.deck_id == deck.id).collect();
    let deck_states: Vec<&ReviewState> = states
        .iter()
        .filter(|s| deck_cards.iter().any(|c| c.id == s.card_id))
        .collect();
    let deck_logs: Vec<&ReviewLog> = logs.iter().filter(|l| l.deck_id == deck.id).collect();

    let mastered = deck_states
        .iter()
        .filter(|s| s.interval >= MASTERED_INTERVAL_DAYS)
        .count() as u32;
    let learning = deck_states
        .iter()
        .filter(|s| s.interval > 0 && s.interval < MASTERED_INTERVAL_DAYS)
        .count() as u32;
    let total = deck_cards.len() as u32;

    let retention_rate = if deck_logs.is_empty() {
        0
    } else {
        let correct = deck_logs.iter().filter(|l| l.was_correct).count();
        ((correct as f32 / deck_logs.len() as f32) * 100.0).round() as u32
    };

    let average_ease_factor = if deck_states.is_empty() {
        crate::EASE_DEFAULT
    } else {
        let sum: f32 = deck_states.iter().map(|s| s.ease_factor).sum();
        (sum / deck_states.len() as f32 * 100.0).round() / 100.0
    };

    DeckAnalytics {
        deck_id: deck.id,
        deck_title: deck.title.clone(),
        total_cards: total,
        mastered_cards: mastered,
        learning_cards: learning,
        new_cards: total.saturating_sub(mastered + learning),
        retention_rate,
        average_ease_factor,
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type DeckId = Uuid;
pub type CardId = Uuid;
pub type StateId = Uuid;
pub type LogId = Uuid;

pub const EASE_MIN: f32 = 1.3;
pub const EASE_DEFAULT: f32 = 2.5;

/// Learner self-rating for a single review, on the classic SM-2 0-5 scale.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    pub fn quality(self) -> u8 {
        match self {
            Rating::Again => 0,
            Rating::Hard => 3,
            Rating::Good => 4,
            Rating::Easy => 5,
        }
    }

    /// Everything except `Again` counts as a successful recall.
    pub fn is_success(self) -> bool {
        !matches!(self, Rating::Again)
    }

    pub fn label(self) -> &'static str {
        match self {
            Rating::Again => "again",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Deck {
    pub id: DeckId,
    pub title: String,
    pub description: Option<String>,
    pub card_count: u32,
    pub due_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deck {
    pub fn new(title: impl Into<String>, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description,
            card_count: 0,
            due_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flashcard {
    pub id: CardId,
    pub deck_id: DeckId,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Flashcard {
    pub fn new(deck_id: DeckId, question: impl Into<String>, answer: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            deck_id,
            question: question.into(),
            answer: answer.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Per-card scheduling state, created alongside the card and rewritten by the
/// scheduler on every review. Invariants: `ease_factor >= 1.3` always;
/// `interval == 0` only before the first review.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReviewState {
    pub id: StateId,
    pub card_id: CardId,
    pub interval: u32,
    pub ease_factor: f32,
    pub repetitions: u32,
    pub next_review: DateTime<Utc>,
    pub last_reviewed: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReviewState {
    pub fn new(card_id: CardId) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            card_id,
            interval: 0,
            ease_factor: EASE_DEFAULT,
            repetitions: 0,
            next_review: now,
            last_reviewed: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_new(&self) -> bool {
        self.last_reviewed.is_none()
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review <= now
    }
}

/// Append-only analytics record, one per review event. Never read back by the
/// scheduler.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReviewLog {
    pub id: LogId,
    pub card_id: CardId,
    pub deck_id: DeckId,
    pub rating: Rating,
    pub response_time_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub was_correct: bool,
}

impl ReviewLog {
    pub fn new(
        card_id: CardId,
        deck_id: DeckId,
        rating: Rating,
        response_time_ms: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            card_id,
            deck_id,
            rating,
            response_time_ms,
            timestamp,
            was_correct: rating.is_success(),
        }
    }
}

/// Singleton aggregate counters: streaks and XP.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserProgress {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_cards_reviewed: u64,
    pub last_study_date: Option<NaiveDate>,
    pub xp: u32,
    pub level: u32,
    pub next_level_xp: u32,
    pub updated_at: DateTime<Utc>,
}

impl Default for UserProgress {
    fn default() -> Self {
        Self {
            current_streak: 0,
            longest_streak: 0,
            total_cards_reviewed: 0,
            last_study_date: None,
            xp: 0,
            level: 1,
            next_level_xp: 100,
            updated_at: Utc::now(),
        }
    }
}

impl UserProgress {
    /// Streak rule: a second study on `last_study_date` is a no-op, the day
    /// after extends the streak, any other gap restarts it at 1.
    pub fn record_study_day(&mut self, today: NaiveDate) {
        if self.last_study_date == Some(today) {
            return;
        }
        let yesterday = today.pred_opt();
        if self.last_study_date.is_some() && self.last_study_date == yesterday {
            self.current_streak += 1;
        } else {
            self.current_streak = 1;
        }
        if self.current_streak > self.longest_streak {
            self.longest_streak = self.current_streak;
        }
        self.last_study_date = Some(today);
        self.updated_at = Utc::now();
    }

    /// Level-up curve: each level costs `level * 100` XP.
    pub fn add_xp(&mut self, amount: u32) {
        self.xp += amount;
        while self.xp >= self.next_level_xp {
            self.xp -= self.next_level_xp;
            self.level += 1;
            self.next_level_xp = self.level * 100;
        }
        self.updated_at = Utc::now();
    }
}

/// One row per calendar day; the repository keeps the last 30 days.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub cards_reviewed: u32,
    pub cards_learned: u32,
    pub updated_at: DateTime<Utc>,
}

impl DailyStats {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            cards_reviewed: 0,
            cards_learned: 0,
            updated_at: Utc::now(),
        }
    }
}

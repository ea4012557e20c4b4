use crate::{
    compute_next_state, CardId, CoreError, DailyStats, Rating, Repository, ReviewLog, ReviewState,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Side-effect hook fired after each processed review, carrying the appended
/// log row. Keeps analytics and gamification out of the scheduler itself.
#[async_trait]
pub trait ReviewObserver: Send + Sync {
    async fn on_review_processed(&self, log: &ReviewLog);
}

/// Orchestration around the pure scheduler: load state, schedule, persist,
/// log, bump aggregate counters. The service is the only writer of
/// ReviewState; callers wanting concurrent reviews of the same card must
/// serialize externally.
pub struct ReviewService<R> {
    repo: Arc<R>,
    observers: Vec<Arc<dyn ReviewObserver>>,
}

impl<R: Repository> ReviewService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Arc<dyn ReviewObserver>) {
        self.observers.push(observer);
    }

    pub fn repo(&self) -> &Arc<R> {
        &self.repo
    }

    pub async fn process_review(
        &self,
        card_id: CardId,
        rating: Rating,
        response_time_ms: u64,
    ) -> Result<ReviewState, CoreError> {
        // StdRng keeps the future Send, unlike thread_rng's handle.
        let mut rng = rand::rngs::StdRng::from_entropy();
        self.process_review_at(card_id, rating, response_time_ms, Utc::now(), &mut rng)
            .await
    }

    /// Same as `process_review` with the clock and random source supplied by
    /// the caller.
    pub async fn process_review_at<G: Rng>(
        &self,
        card_id: CardId,
        rating: Rating,
        response_time_ms: u64,
        now: DateTime<Utc>,
        rng: &mut G,
    ) -> Result<ReviewState, CoreError> {
        let card = self.repo.get_card(card_id).await?;
        let state = self.repo.get_review_state(card_id).await?;
        let first_exposure = state.repetitions == 0;

        let new_state = compute_next_state(&state, rating, now, rng);
        self.repo.save_review_state(&new_state).await?;

        let log = ReviewLog::new(card_id, card.deck_id, rating, response_time_ms, now);
        self.repo.append_review_log(&log).await?;

        let mut progress = self.repo.get_progress().await?;
        progress.total_cards_reviewed += 1;
        progress.record_study_day(now.date_naive());
        self.repo.save_progress(&progress).await?;

        let today = now.date_naive();
        let mut stats = self
            .repo
            .get_daily_stats(today)
            .await?
            .unwrap_or_else(|| DailyStats::new(today));
        stats.cards_reviewed += 1;
        if first_exposure {
            stats.cards_learned += 1;
        }
        stats.updated_at = now;
        self.repo.upsert_daily_stats(&stats).await?;

        self.repo.refresh_deck_counts(card.deck_id).await?;

        tracing::debug!(
            card = %card_id,
            rating = rating.label(),
            interval = new_state.interval,
            repetitions = new_state.repetitions,
            "review processed"
        );

        for observer in &self.observers {
            observer.on_review_processed(&log).await;
        }

        Ok(new_state)
    }
}

use crate::{Rating, ReviewState, EASE_MIN};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// Intervals at or below this many days are never fuzzed.
pub const FUZZ_MIN_INTERVAL: u32 = 3;

pub const HARD_MULTIPLIER: f32 = 0.8;
pub const EASY_MULTIPLIER: f32 = 1.3;

/// Deterministic part of a scheduling decision: the state after the SM-2
/// update and the rating multiplier, before fuzz and due-date assignment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchedulePreview {
    pub interval: u32,
    pub ease_factor: f32,
    pub repetitions: u32,
}

/// SM-2 variant. A failing rating resets repetitions and collapses the
/// interval to one day without touching the ease factor. A successful rating
/// walks the bootstrap intervals (1 day, then 6) before switching to
/// ease-driven growth, then updates the ease factor from the quality score.
/// The hard/easy multiplier applies after the SM-2 step on every branch,
/// including the bootstrap ones.
pub fn project(state: &ReviewState, rating: Rating) -> SchedulePreview {
    let q = rating.quality();
    let mut interval = state.interval;
    let mut ease = state.ease_factor;
    let mut reps = state.repetitions;

    if q < 3 {
        reps = 0;
        interval = 1;
    } else {
        // Growth uses the ease factor from before this review's update.
        interval = match reps {
            0 => 1,
            1 => 6,
            _ => (interval as f32 * ease).round() as u32,
        };
        reps += 1;

        let miss = f32::from(5 - q);
        ease = (ease + (0.1 - miss * (0.08 + miss * 0.02))).max(EASE_MIN);
    }

    match rating {
        Rating::Hard => interval = ((interval as f32 * HARD_MULTIPLIER).round() as u32).max(1),
        Rating::Easy => interval = (interval as f32 * EASY_MULTIPLIER).round() as u32,
        Rating::Again | Rating::Good => {}
    }

    SchedulePreview {
        interval,
        ease_factor: ease,
        repetitions: reps,
    }
}

/// Anti-clustering fuzz: perturb the interval by 5-10% of its value in a
/// random direction so cohorts reviewed together do not converge on one due
/// date. Intervals of `FUZZ_MIN_INTERVAL` days or less pass through unchanged.
pub fn fuzz_interval<R: Rng + ?Sized>(interval: u32, rng: &mut R) -> u32 {
    if interval <= FUZZ_MIN_INTERVAL {
        return interval;
    }
    let spread = (f64::from(interval) * rng.gen_range(0.05..0.10)).floor() as u32;
    if rng.gen_bool(0.5) {
        interval + spread
    } else {
        interval - spread
    }
}

/// Full scheduling step: projection, fuzz, and due-date assignment. Pure given
/// `now` and the supplied random source; persistence is the caller's job.
///
/// Precondition: `state` satisfies the documented invariants (`ease_factor >=
/// 1.3`, `interval >= 1` whenever `repetitions > 0`). Loading layers must not
/// hand corrupted records to the scheduler.
pub fn compute_next_state<R: Rng + ?Sized>(
    state: &ReviewState,
    rating: Rating,
    now: DateTime<Utc>,
    rng: &mut R,
) -> ReviewState {
    let projected = project(state, rating);
    let interval = fuzz_interval(projected.interval, rng);

    ReviewState {
        interval,
        ease_factor: projected.ease_factor,
        repetitions: projected.repetitions,
        next_review: now + Duration::days(i64::from(interval)),
        last_reviewed: Some(now),
        updated_at: now,
        ..state.clone()
    }
}

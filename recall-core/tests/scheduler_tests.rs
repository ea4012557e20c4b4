use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use recall_core::{
    compute_next_state, describe_interval, fuzz_interval, preview_rating, project, Rating,
    ReviewState, EASE_MIN,
};
use uuid::Uuid;

fn fresh() -> ReviewState {
    ReviewState::new(Uuid::new_v4())
}

fn seasoned(interval: u32, ease: f32, repetitions: u32) -> ReviewState {
    let mut s = fresh();
    s.interval = interval;
    s.ease_factor = ease;
    s.repetitions = repetitions;
    s
}

#[test]
fn good_from_new_bootstraps_one_day() {
    let p = project(&fresh(), Rating::Good);
    assert_eq!(p.interval, 1);
    assert_eq!(p.repetitions, 1);
    // quality 4 leaves the ease factor unchanged
    assert!((p.ease_factor - 2.5).abs() < 1e-3);
}

#[test]
fn second_good_bootstraps_six_days() {
    let p = project(&seasoned(1, 2.5, 1), Rating::Good);
    assert_eq!(p.interval, 6);
    assert_eq!(p.repetitions, 2);
}

#[test]
fn easy_from_new_keeps_one_day_and_raises_ease() {
    // easy multiplier on the 1-day bootstrap: round(1 * 1.3) = 1
    let p = project(&fresh(), Rating::Easy);
    assert_eq!(p.interval, 1);
    assert_eq!(p.repetitions, 1);
    assert!((p.ease_factor - 2.6).abs() < 1e-3);
}

#[test]
fn again_resets_without_touching_ease() {
    let p = project(&seasoned(40, 2.2, 5), Rating::Again);
    assert_eq!(p.interval, 1);
    assert_eq!(p.repetitions, 0);
    assert!((p.ease_factor - 2.2).abs() < 1e-6);
}

#[test]
fn again_from_new_card() {
    let p = project(&fresh(), Rating::Again);
    assert_eq!(p.interval, 1);
    assert_eq!(p.repetitions, 0);
    assert!((p.ease_factor - 2.5).abs() < 1e-6);
}

#[test]
fn hard_on_mature_card_shrinks_grown_interval() {
    // round(10 * 2.5) = 25, then round(25 * 0.8) = 20; ease drops by 0.14
    let p = project(&seasoned(10, 2.5, 3), Rating::Hard);
    assert_eq!(p.interval, 20);
    assert_eq!(p.repetitions, 4);
    assert!((p.ease_factor - 2.36).abs() < 1e-3);
}

#[test]
fn hard_never_drops_below_one_day() {
    let p = project(&fresh(), Rating::Hard);
    assert_eq!(p.interval, 1);
    assert_eq!(p.repetitions, 1);
}

#[test]
fn ease_floor_holds_under_repeated_hard() {
    let mut state = seasoned(10, 1.35, 4);
    for _ in 0..5 {
        let p = project(&state, Rating::Hard);
        assert!(p.ease_factor >= EASE_MIN);
        state.interval = p.interval;
        state.ease_factor = p.ease_factor;
        state.repetitions = p.repetitions;
    }
    assert!((state.ease_factor - EASE_MIN).abs() < 1e-6);
}

#[test]
fn good_chain_intervals_never_shrink() {
    let mut state = fresh();
    let mut last = 0u32;
    for _ in 0..8 {
        let p = project(&state, Rating::Good);
        assert!(p.interval >= last);
        last = p.interval;
        state.interval = p.interval;
        state.ease_factor = p.ease_factor;
        state.repetitions = p.repetitions;
    }
}

#[test]
fn fuzz_skips_short_intervals() {
    let mut rng = StdRng::seed_from_u64(1);
    for interval in 0..=3 {
        assert_eq!(fuzz_interval(interval, &mut rng), interval);
    }
}

#[test]
fn fuzz_stays_within_ten_percent() {
    for seed in 0..200 {
        let mut rng = StdRng::seed_from_u64(seed);
        for &interval in &[4u32, 10, 20, 50, 365] {
            let fuzzed = fuzz_interval(interval, &mut rng);
            let bound = (f64::from(interval) * 0.10).floor() as i64;
            assert!(
                (i64::from(fuzzed) - i64::from(interval)).abs() <= bound,
                "interval {interval} fuzzed to {fuzzed}"
            );
            assert!(fuzzed >= 1);
        }
    }
}

#[test]
fn short_intervals_are_deterministic() {
    let state = fresh();
    let now = Utc::now();
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let next = compute_next_state(&state, Rating::Good, now, &mut rng);
        assert_eq!(next.interval, 1);
        assert_eq!(next.next_review, now + Duration::days(1));
    }
}

#[test]
fn hard_scenario_full_step() {
    let state = seasoned(10, 2.5, 3);
    let now = Utc::now();
    let mut rng = StdRng::seed_from_u64(42);
    let next = compute_next_state(&state, Rating::Hard, now, &mut rng);

    // pre-fuzz interval is 20; fuzz keeps it within +-10%
    assert!((18..=22).contains(&next.interval));
    assert!((next.ease_factor - 2.36).abs() < 1e-3);
    assert_eq!(next.repetitions, 4);
    assert_eq!(next.last_reviewed, Some(now));
    assert_eq!(
        next.next_review,
        now + Duration::days(i64::from(next.interval))
    );
}

#[test]
fn state_round_trips_through_json() {
    let mut state = seasoned(20, 2.36, 4);
    let now = Utc::now();
    state.last_reviewed = Some(now);
    state.next_review = now + Duration::days(20);

    let json = serde_json::to_string(&state).unwrap();
    // timestamps serialize as ISO-8601 strings
    assert!(json.contains("next_review"));
    let back: ReviewState = serde_json::from_str(&json).unwrap();
    assert_eq!(back.interval, 20);
    assert_eq!(back.repetitions, 4);
    assert!((back.ease_factor - 2.36).abs() < 1e-4);
    assert_eq!(back.next_review, state.next_review);
    assert_eq!(back.last_reviewed, state.last_reviewed);
}

#[test]
fn interval_text_buckets() {
    assert_eq!(describe_interval(0), "New");
    assert_eq!(describe_interval(1), "1 day");
    assert_eq!(describe_interval(3), "3 days");
    assert_eq!(describe_interval(6), "6 days");
    assert_eq!(describe_interval(7), "1 weeks");
    assert_eq!(describe_interval(13), "2 weeks");
    assert_eq!(describe_interval(29), "4 weeks");
    assert_eq!(describe_interval(30), "1 months");
    assert_eq!(describe_interval(45), "2 months");
    assert_eq!(describe_interval(364), "12 months");
    assert_eq!(describe_interval(365), "1 years");
    assert_eq!(describe_interval(800), "2 years");
}

#[test]
fn rating_previews_from_mature_card() {
    assert_eq!(preview_rating(Rating::Again, 10), "1 day");
    // round(10 * 2.5) = 25 -> "4 weeks"
    assert_eq!(preview_rating(Rating::Good, 10), "4 weeks");
    // 25 shrunk by 0.8 -> 20 -> "3 weeks"
    assert_eq!(preview_rating(Rating::Hard, 10), "3 weeks");
}

#[test]
fn rating_previews_from_new_card() {
    assert_eq!(preview_rating(Rating::Good, 0), "1 day");
    assert_eq!(preview_rating(Rating::Easy, 0), "1 day");
    assert_eq!(preview_rating(Rating::Again, 0), "1 day");
}

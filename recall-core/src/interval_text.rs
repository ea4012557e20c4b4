use crate::{project, Rating, ReviewState, EASE_DEFAULT};

/// Human-readable form of an interval in days, bucketed the way the review UI
/// shows it: exact days up to a week, then rounded weeks, months, years.
pub fn describe_interval(days: u32) -> String {
    match days {
        0 => "New".to_string(),
        1 => "1 day".to_string(),
        2..=6 => format!("{days} days"),
        7..=29 => format!("{} weeks", (days as f32 / 7.0).round() as u32),
        30..=364 => format!("{} months", (days as f32 / 30.0).round() as u32),
        _ => format!("{} years", (days as f32 / 365.0).round() as u32),
    }
}

/// What choosing `rating` would do to a card currently at `current_interval`
/// days, computed against a throwaway state and formatted for display. Uses
/// the pre-fuzz projection so the preview is stable.
pub fn preview_rating(rating: Rating, current_interval: u32) -> String {
    let mut mock = ReviewState::new(uuid::Uuid::nil());
    mock.interval = current_interval;
    mock.ease_factor = EASE_DEFAULT;
    mock.repetitions = if current_interval > 0 { 2 } else { 0 };

    describe_interval(project(&mock, rating).interval)
}

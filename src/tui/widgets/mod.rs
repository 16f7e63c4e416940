pub mod home;
pub mod planner;
pub mod progress;
pub mod setup;

use ratatui::style::Color;

use crate::models::SessionType;

pub fn session_type_color(session_type: SessionType) -> Color {
    match session_type {
        SessionType::Intense => Color::Red,
        SessionType::Focused => Color::Yellow,
        SessionType::PassiveReview => Color::Green,
    }
}

pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn score_text(score: Option<i32>) -> String {
    score.map_or_else(|| "-".to_string(), |s| s.to_string())
}

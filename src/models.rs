use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::engine;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: i64,
    pub xp: i64,
    pub daily_study_hours: i32,
    pub deadline_date: Option<NaiveDate>,
    pub last_visited_screen: Option<Screen>,
}

// Top-level screens, remembered per user between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    Home,
    Setup,
    Planner,
    Progress,
}

impl Screen {
    pub const ALL: [Screen; 4] = [Screen::Home, Screen::Setup, Screen::Planner, Screen::Progress];

    pub fn as_str(&self) -> &'static str {
        match self {
            Screen::Home => "home",
            Screen::Setup => "setup",
            Screen::Planner => "planner",
            Screen::Progress => "progress",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "home" => Some(Screen::Home),
            "setup" => Some(Screen::Setup),
            "planner" | "plan" => Some(Screen::Planner),
            "progress" => Some(Screen::Progress),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Screen::Home => "Home",
            Screen::Setup => "Setup",
            Screen::Planner => "Planner",
            Screen::Progress => "Progress",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectWithTopics {
    pub subject: Subject,
    pub topics: Vec<Topic>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    pub subject_id: i64,
    pub name: String,
    pub performance_score: Option<i32>,
    pub confidence_level: Option<i32>,
    // Cached by the last plan generation; recompute with `priority()` for live values
    pub priority_score: Option<f64>,
    pub last_studied: Option<String>,
    pub created_at: String,
}

impl Topic {
    pub fn priority(&self) -> f64 {
        engine::priority(self.performance_score, self.confidence_level)
    }

    pub fn session_type(&self) -> SessionType {
        engine::classify(self.performance_score, self.confidence_level)
    }

    pub fn is_assessed(&self) -> bool {
        self.performance_score.is_some() || self.confidence_level.is_some()
    }
}

// Partial update for a topic row; `None` leaves the column as is
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicUpdate {
    pub performance_score: Option<i32>,
    pub confidence_level: Option<i32>,
    pub priority_score: Option<f64>,
    pub last_studied: Option<String>,
}

// Session intensity, stored with its display label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionType {
    Intense,
    Focused,
    PassiveReview,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Intense => "Intense",
            SessionType::Focused => "Focused",
            SessionType::PassiveReview => "Passive Review",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "intense" => Some(SessionType::Intense),
            "focused" => Some(SessionType::Focused),
            "passive review" | "passive_review" | "passive" => Some(SessionType::PassiveReview),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SessionType::Intense => "Weak or miscalibrated topic: work problems from scratch",
            SessionType::Focused => "Solid but not secure: targeted practice on gaps",
            SessionType::PassiveReview => "Strong topic: light review to keep it fresh",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedSession {
    pub topic_id: i64,
    pub session_type: SessionType,
    pub scheduled_date: NaiveDate,
    pub priority: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudySession {
    pub id: i64,
    pub topic_id: i64,
    pub session_type: SessionType,
    pub scheduled_date: NaiveDate,
    pub completed: bool,
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionWithTopic {
    pub session: StudySession,
    pub topic_name: String,
    pub subject_name: String,
}

// Immutable once written; xp_earned is frozen at creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub id: i64,
    pub topic_id: i64,
    pub user_id: i64,
    pub score: i32,
    pub confidence_level: i32,
    pub xp_earned: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum XpSource {
    TaskCompletion,
    Assessment,
}

impl XpSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            XpSource::TaskCompletion => "Task Completion",
            XpSource::Assessment => "Assessment",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpLogEntry {
    pub id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub source: String,
    pub created_at: String,
}

// Returned by the completion and assessment handlers so callers can refresh their view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpAward {
    pub amount: i64,
    pub source: XpSource,
    pub new_total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentOutcome {
    pub assessment: Assessment,
    pub award: XpAward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyXp {
    pub date: NaiveDate,
    pub xp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub total_sessions: i64,
    pub completed_sessions: i64,
    pub daily_xp: Vec<DailyXp>,
}

impl ProgressSummary {
    pub fn completion_rate(&self) -> u32 {
        if self.total_sessions == 0 {
            0
        } else {
            ((self.completed_sessions as f64 / self.total_sessions as f64) * 100.0).round() as u32
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerCheck {
    pub profile_xp: i64,
    pub ledger_total: i64,
}

impl LedgerCheck {
    pub fn is_consistent(&self) -> bool {
        self.profile_xp == self.ledger_total
    }
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod session_type_tests {
        use super::*;

        #[test]
        fn as_str_uses_display_labels() {
            assert_eq!(SessionType::Intense.as_str(), "Intense");
            assert_eq!(SessionType::Focused.as_str(), "Focused");
            assert_eq!(SessionType::PassiveReview.as_str(), "Passive Review");
        }

        #[test]
        fn from_str_accepts_stored_labels() {
            for t in [
                SessionType::Intense,
                SessionType::Focused,
                SessionType::PassiveReview,
            ] {
                assert_eq!(SessionType::from_str(t.as_str()), Some(t));
            }
        }

        #[test]
        fn from_str_aliases_and_case() {
            assert_eq!(
                SessionType::from_str("passive_review"),
                Some(SessionType::PassiveReview)
            );
            assert_eq!(SessionType::from_str("INTENSE"), Some(SessionType::Intense));
            assert_eq!(SessionType::from_str("relaxed"), None);
        }
    }

    mod screen_tests {
        use super::*;

        #[test]
        fn from_str_valid_inputs() {
            assert_eq!(Screen::from_str("home"), Some(Screen::Home));
            assert_eq!(Screen::from_str("Planner"), Some(Screen::Planner));
            assert_eq!(Screen::from_str("plan"), Some(Screen::Planner));
            assert_eq!(Screen::from_str("chat"), None);
        }

        #[test]
        fn all_screens_have_distinct_keys() {
            let keys: Vec<&str> = Screen::ALL.iter().map(|s| s.as_str()).collect();
            assert_eq!(keys, vec!["home", "setup", "planner", "progress"]);
        }
    }

    mod topic_tests {
        use super::*;

        fn make_topic(performance: Option<i32>, confidence: Option<i32>) -> Topic {
            Topic {
                id: 1,
                subject_id: 1,
                name: "Calculus".to_string(),
                performance_score: performance,
                confidence_level: confidence,
                priority_score: None,
                last_studied: None,
                created_at: String::new(),
            }
        }

        #[test]
        fn unassessed_topic() {
            let t = make_topic(None, None);
            assert!(!t.is_assessed());
            assert_eq!(t.priority(), 100.0);
            assert_eq!(t.session_type(), SessionType::Intense);
        }

        #[test]
        fn assessed_topic() {
            let t = make_topic(Some(80), Some(85));
            assert!(t.is_assessed());
            assert_eq!(t.priority(), 25.0);
            assert_eq!(t.session_type(), SessionType::PassiveReview);
        }
    }

    mod progress_summary_tests {
        use super::*;

        fn summary(total: i64, completed: i64) -> ProgressSummary {
            ProgressSummary {
                total_sessions: total,
                completed_sessions: completed,
                daily_xp: vec![],
            }
        }

        #[test]
        fn completion_rate_no_sessions() {
            assert_eq!(summary(0, 0).completion_rate(), 0);
        }

        #[test]
        fn completion_rate_rounds() {
            assert_eq!(summary(3, 1).completion_rate(), 33);
            assert_eq!(summary(3, 2).completion_rate(), 67);
            assert_eq!(summary(10, 10).completion_rate(), 100);
        }
    }

    mod xp_tests {
        use super::*;

        #[test]
        fn source_labels() {
            assert_eq!(XpSource::TaskCompletion.as_str(), "Task Completion");
            assert_eq!(XpSource::Assessment.as_str(), "Assessment");
        }

        #[test]
        fn ledger_check() {
            let ok = LedgerCheck {
                profile_xp: 190,
                ledger_total: 190,
            };
            assert!(ok.is_consistent());
            let drift = LedgerCheck {
                profile_xp: 200,
                ledger_total: 190,
            };
            assert!(!drift.is_consistent());
        }
    }

    mod json_output_tests {
        use super::*;

        #[test]
        fn ok_with_unit() {
            let output = JsonOutput::<()>::ok(());
            assert!(output.success);
            assert_eq!(output.data, Some(()));
            assert!(output.error.is_none());
        }

        #[test]
        fn err_with_string() {
            let output = JsonOutput::<()>::err("something went wrong");
            assert!(!output.success);
            assert!(output.data.is_none());
            assert_eq!(output.error, Some("something went wrong".to_string()));
        }

        #[test]
        fn serializes_award() {
            let award = XpAward {
                amount: 100,
                source: XpSource::TaskCompletion,
                new_total: 300,
            };
            let json = serde_json::to_string(&JsonOutput::ok(award)).unwrap();
            assert!(json.contains("\"success\":true"));
            assert!(json.contains("\"amount\":100"));
            assert!(json.contains("\"new_total\":300"));
        }

        #[test]
        fn serializes_dates_as_iso() {
            let d = DailyXp {
                date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
                xp: 90,
            };
            let json = serde_json::to_string(&d).unwrap();
            assert!(json.contains("\"2025-01-31\""));
        }
    }
}

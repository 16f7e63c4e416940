//! Adaptive scheduling core.
//!
//! Everything here is pure: the database layer feeds topics in and persists
//! whatever comes out, inside its own transactions.

use chrono::{Duration, NaiveDate};

use crate::error::{Error, Result};
use crate::models::{PlannedSession, SessionType, Topic};

/// Upper bound on sessions produced by a single plan.
pub const MAX_PLAN_SESSIONS: usize = 10;

/// Performance strictly below this is always Intense.
pub const INTENSE_PERFORMANCE_BELOW: i32 = 40;
/// Confidence/performance gap strictly above this is always Intense.
pub const INTENSE_MISMATCH_ABOVE: i32 = 30;
/// Performance strictly above this (and not Intense) is Passive Review.
pub const PASSIVE_PERFORMANCE_ABOVE: i32 = 70;

pub const COMPLETION_XP: i64 = 100;
pub const ASSESSMENT_BASE_XP: i64 = 50;

/// Unset scores count as 0, anything out of range is pulled back into [0, 100].
pub fn clamp_score(value: Option<i32>) -> i32 {
    value.unwrap_or(0).clamp(0, 100)
}

pub fn mismatch(performance: Option<i32>, confidence: Option<i32>) -> i32 {
    (clamp_score(confidence) - clamp_score(performance)).abs()
}

/// `(100 - performance) + |confidence - performance|`, in [0, 200].
pub fn priority(performance: Option<i32>, confidence: Option<i32>) -> f64 {
    let gap = mismatch(performance, confidence);
    f64::from(100 - clamp_score(performance) + gap)
}

// Rule order matters: a high performer with a large gap is still Intense.
pub fn classify(performance: Option<i32>, confidence: Option<i32>) -> SessionType {
    let perf = clamp_score(performance);
    let gap = mismatch(performance, confidence);

    if perf < INTENSE_PERFORMANCE_BELOW || gap > INTENSE_MISMATCH_ABOVE {
        SessionType::Intense
    } else if perf > PASSIVE_PERFORMANCE_ABOVE {
        SessionType::PassiveReview
    } else {
        SessionType::Focused
    }
}

/// Rank topics by priority (stable on ties), keep the top ten and give each
/// its own consecutive day starting at `today`.
pub fn build_plan(topics: &[Topic], today: NaiveDate) -> Vec<PlannedSession> {
    let mut ranked: Vec<(&Topic, f64)> = topics.iter().map(|t| (t, t.priority())).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    ranked
        .into_iter()
        .take(MAX_PLAN_SESSIONS)
        .enumerate()
        .map(|(i, (topic, priority))| PlannedSession {
            topic_id: topic.id,
            session_type: classify(topic.performance_score, topic.confidence_level),
            scheduled_date: today + Duration::days(i as i64),
            priority,
        })
        .collect()
}

/// Experience for an assessment: `50 + floor(score / 2)`.
pub fn assessment_xp(score: i32) -> i64 {
    ASSESSMENT_BASE_XP + i64::from(score.clamp(0, 100)) / 2
}

pub fn validate_score(field: &'static str, value: i64) -> Result<i32> {
    if (0..=100).contains(&value) {
        Ok(value as i32)
    } else {
        Err(Error::InvalidScore { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(id: i64, performance: Option<i32>, confidence: Option<i32>) -> Topic {
        Topic {
            id,
            subject_id: 1,
            name: format!("Topic {}", id),
            performance_score: performance,
            confidence_level: confidence,
            priority_score: None,
            last_studied: None,
            created_at: String::new(),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    mod priority_tests {
        use super::*;

        #[test]
        fn cold_start_is_maximally_urgent_without_gap() {
            assert_eq!(priority(None, None), 100.0);
            assert_eq!(priority(Some(0), Some(0)), 100.0);
        }

        #[test]
        fn mismatch_adds_to_priority() {
            // 100 - 35 + 55
            assert_eq!(priority(Some(35), Some(90)), 120.0);
            // under-confidence counts the same as over-confidence
            assert_eq!(priority(Some(80), Some(40)), 60.0);
        }

        #[test]
        fn extremes() {
            assert_eq!(priority(Some(0), Some(100)), 200.0);
            assert_eq!(priority(Some(100), Some(100)), 0.0);
        }

        #[test]
        fn out_of_range_inputs_are_clamped() {
            assert_eq!(priority(Some(-20), Some(150)), priority(Some(0), Some(100)));
        }

        #[test]
        fn stays_within_bounds_over_whole_domain() {
            for p in 0..=100 {
                for c in 0..=100 {
                    let value = priority(Some(p), Some(c));
                    assert!((0.0..=200.0).contains(&value), "p={} c={}", p, c);
                }
            }
        }

        #[test]
        fn non_increasing_in_performance_for_fixed_gap() {
            for gap in [0, 10, 45] {
                let mut last = f64::MAX;
                for p in 0..=(100 - gap) {
                    let value = priority(Some(p), Some(p + gap));
                    assert!(value <= last);
                    last = value;
                }
            }
        }
    }

    mod classify_tests {
        use super::*;

        #[test]
        fn low_performance_with_large_gap_is_intense() {
            assert_eq!(classify(Some(35), Some(90)), SessionType::Intense);
        }

        #[test]
        fn high_performance_small_gap_is_passive_review() {
            assert_eq!(classify(Some(80), Some(85)), SessionType::PassiveReview);
        }

        #[test]
        fn middle_band_is_focused() {
            assert_eq!(classify(Some(60), Some(65)), SessionType::Focused);
        }

        #[test]
        fn gap_rule_wins_over_passive_review() {
            assert_eq!(classify(Some(80), Some(40)), SessionType::Intense);
        }

        #[test]
        fn boundaries_are_strict() {
            assert_eq!(classify(Some(40), Some(40)), SessionType::Focused);
            assert_eq!(classify(Some(39), Some(39)), SessionType::Intense);
            assert_eq!(classify(Some(70), Some(70)), SessionType::Focused);
            assert_eq!(classify(Some(71), Some(71)), SessionType::PassiveReview);
            assert_eq!(classify(Some(50), Some(80)), SessionType::Focused);
            assert_eq!(classify(Some(50), Some(81)), SessionType::Intense);
        }

        #[test]
        fn unassessed_topic_is_intense() {
            assert_eq!(classify(None, None), SessionType::Intense);
        }
    }

    mod plan_tests {
        use super::*;

        #[test]
        fn caps_at_ten_consecutive_days() {
            let topics: Vec<Topic> = (1..=15)
                .map(|i| topic(i, Some((i * 6) as i32), Some((i * 6) as i32)))
                .collect();
            let today = day(2024, 2, 25);

            let plan = build_plan(&topics, today);
            assert_eq!(plan.len(), 10);
            for (i, session) in plan.iter().enumerate() {
                assert_eq!(session.scheduled_date, today + Duration::days(i as i64));
            }
            // crosses the leap day without gaps
            assert_eq!(plan[4].scheduled_date, day(2024, 2, 29));
            assert_eq!(plan[5].scheduled_date, day(2024, 3, 1));
        }

        #[test]
        fn ordered_by_descending_priority() {
            let topics: Vec<Topic> = (1..=15)
                .map(|i| topic(i, Some((i * 6) as i32), Some(50)))
                .collect();
            let plan = build_plan(&topics, day(2025, 1, 1));

            for pair in plan.windows(2) {
                assert!(pair[0].priority >= pair[1].priority);
            }
            let lowest_selected = plan.last().unwrap().priority;
            let selected: Vec<i64> = plan.iter().map(|s| s.topic_id).collect();
            for t in topics.iter().filter(|t| !selected.contains(&t.id)) {
                assert!(t.priority() <= lowest_selected);
            }
        }

        #[test]
        fn ties_keep_source_order() {
            let topics = vec![
                topic(3, Some(50), Some(50)),
                topic(1, Some(50), Some(50)),
                topic(2, Some(50), Some(50)),
            ];
            let plan = build_plan(&topics, day(2025, 1, 1));
            let ids: Vec<i64> = plan.iter().map(|s| s.topic_id).collect();
            assert_eq!(ids, vec![3, 1, 2]);
        }

        #[test]
        fn fewer_topics_than_cap() {
            let topics = vec![topic(1, Some(90), Some(90)), topic(2, None, None)];
            let plan = build_plan(&topics, day(2025, 6, 1));
            assert_eq!(plan.len(), 2);
            assert_eq!(plan[0].topic_id, 2);
            assert_eq!(plan[0].session_type, SessionType::Intense);
            assert_eq!(plan[1].session_type, SessionType::PassiveReview);
        }

        #[test]
        fn empty_input_gives_empty_plan() {
            assert!(build_plan(&[], day(2025, 1, 1)).is_empty());
        }

        #[test]
        fn deterministic_for_same_input() {
            let topics: Vec<Topic> = (1..=12)
                .map(|i| topic(i, Some((i * 7 % 100) as i32), Some(60)))
                .collect();
            let today = day(2025, 3, 3);
            assert_eq!(build_plan(&topics, today), build_plan(&topics, today));
        }
    }

    mod reward_tests {
        use super::*;

        #[test]
        fn assessment_xp_floors_half_score() {
            assert_eq!(assessment_xp(80), 90);
            assert_eq!(assessment_xp(81), 90);
            assert_eq!(assessment_xp(0), 50);
            assert_eq!(assessment_xp(100), 100);
        }

        #[test]
        fn validate_score_accepts_range() {
            assert_eq!(validate_score("score", 0).unwrap(), 0);
            assert_eq!(validate_score("score", 100).unwrap(), 100);
        }

        #[test]
        fn validate_score_rejects_out_of_range() {
            assert!(matches!(
                validate_score("confidence", 101),
                Err(Error::InvalidScore {
                    field: "confidence",
                    value: 101
                })
            ));
            assert!(matches!(
                validate_score("score", -1),
                Err(Error::InvalidScore { .. })
            ));
        }
    }
}

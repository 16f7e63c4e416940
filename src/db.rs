use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use rand::seq::SliceRandom;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::engine;
use crate::error::{Error, Result};
use crate::models::{
    Assessment, AssessmentOutcome, DailyXp, LedgerCheck, PlannedSession, ProgressSummary, Screen,
    SessionType, SessionWithTopic, StudySession, Subject, SubjectWithTopics, Topic, TopicUpdate,
    User, UserProfile, XpAward, XpLogEntry, XpSource,
};

const DATE_FORMAT: &str = "%Y-%m-%d";
const BUSY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

pub const PLANNER_LIST_LIMIT: usize = 20;
pub const UPCOMING_LIMIT: usize = 5;
pub const DAILY_XP_DAYS: usize = 5;
pub const MIN_DAILY_HOURS: i32 = 1;
pub const MAX_DAILY_HOURS: i32 = 16;

pub const MOTIVATIONAL_QUOTES: [&str; 6] = [
    "Success is the sum of small efforts repeated day in and day out.",
    "The expert in anything was once a beginner.",
    "Don't watch the clock; do what it does. Keep going.",
    "Your limitation is only your imagination.",
    "The secret of getting ahead is getting started.",
    "Study while others are sleeping; work while others are loafing.",
];

const TOPIC_COLUMNS: &str = "t.id, t.subject_id, t.name, t.performance_score, t.confidence_level, \
                             t.priority_score, t.last_studied, t.created_at";
const SESSION_COLUMNS: &str =
    "ss.id, ss.topic_id, ss.session_type, ss.scheduled_date, ss.completed, ss.completed_at";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS user_profiles (
                user_id INTEGER PRIMARY KEY,
                xp INTEGER NOT NULL DEFAULT 0,
                daily_study_hours INTEGER NOT NULL DEFAULT 2 CHECK(daily_study_hours BETWEEN 1 AND 16),
                deadline_date TEXT,
                last_visited_screen TEXT,
                daily_quote TEXT,
                quote_date TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS subjects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE (user_id, name),
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS topics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                subject_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                performance_score INTEGER CHECK(performance_score BETWEEN 0 AND 100),
                confidence_level INTEGER CHECK(confidence_level BETWEEN 0 AND 100),
                priority_score REAL,
                last_studied TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                FOREIGN KEY (subject_id) REFERENCES subjects(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS study_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                topic_id INTEGER NOT NULL,
                session_type TEXT NOT NULL CHECK(session_type IN ('Intense', 'Focused', 'Passive Review')),
                scheduled_date TEXT NOT NULL,
                completed INTEGER NOT NULL DEFAULT 0,
                completed_at TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                FOREIGN KEY (topic_id) REFERENCES topics(id) ON DELETE CASCADE
            );

            -- Self-assessments are immutable; xp_earned is frozen at insert
            CREATE TABLE IF NOT EXISTS assessments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                topic_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                score INTEGER NOT NULL CHECK(score BETWEEN 0 AND 100),
                confidence_level INTEGER NOT NULL CHECK(confidence_level BETWEEN 0 AND 100),
                xp_earned INTEGER NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                FOREIGN KEY (topic_id) REFERENCES topics(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            -- Experience ledger (append-only)
            CREATE TABLE IF NOT EXISTS xp_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                amount INTEGER NOT NULL,
                source TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_subjects_user ON subjects(user_id);
            CREATE INDEX IF NOT EXISTS idx_topics_subject ON topics(subject_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_topic ON study_sessions(topic_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_pending ON study_sessions(completed, scheduled_date);
            CREATE INDEX IF NOT EXISTS idx_assessments_topic ON assessments(topic_id);
            CREATE INDEX IF NOT EXISTS idx_xp_logs_user ON xp_logs(user_id, created_at);
            "#,
        )?;

        debug!("schema ready");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    // Single-writer transaction: takes the write lock up front so concurrent
    // handlers on the same database file run one after the other.
    fn write_tx(&self) -> Result<Transaction<'_>> {
        Ok(Transaction::new_unchecked(
            &self.conn,
            TransactionBehavior::Immediate,
        )?)
    }

    // User operations
    pub fn login(&self, name: &str) -> Result<User> {
        let name = normalize_name("user", name)?;
        if let Some(user) = self.find_user(&name)? {
            return Ok(user);
        }

        let now = Utc::now().to_rfc3339();
        let tx = self.write_tx()?;
        tx.execute(
            "INSERT INTO users (name, created_at) VALUES (?1, ?2)",
            params![name, now],
        )?;
        let user_id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO user_profiles (user_id, created_at, updated_at) VALUES (?1, ?2, ?2)",
            params![user_id, now],
        )?;
        tx.commit()?;
        info!(user_id, name = %name, "created user");

        self.find_user(&name)?
            .ok_or_else(|| Error::not_found("user", &name))
    }

    pub fn find_user(&self, name: &str) -> Result<Option<User>> {
        let user = self.conn.query_row(
            "SELECT id, name, created_at FROM users WHERE name = ?1",
            params![name.trim()],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: row.get(2)?,
                })
            },
        );

        match user {
            Ok(u) => Ok(Some(u)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve the active user. No name, or a name nobody logged in with,
    /// fails closed before anything is written.
    pub fn resolve_user(&self, name: Option<&str>) -> Result<User> {
        let name = name.ok_or(Error::NotAuthenticated)?;
        self.find_user(name)?.ok_or(Error::NotAuthenticated)
    }

    // Profile operations
    pub fn get_profile(&self, user_id: i64) -> Result<UserProfile> {
        let profile = self.conn.query_row(
            r#"
            SELECT user_id, xp, daily_study_hours, deadline_date, last_visited_screen
            FROM user_profiles
            WHERE user_id = ?1
            "#,
            params![user_id],
            |row| {
                let deadline: Option<String> = row.get(3)?;
                let screen: Option<String> = row.get(4)?;
                Ok(UserProfile {
                    user_id: row.get(0)?,
                    xp: row.get(1)?,
                    daily_study_hours: row.get(2)?,
                    deadline_date: deadline.map(|d| parse_date(3, d)).transpose()?,
                    last_visited_screen: screen.and_then(|s| Screen::from_str(&s)),
                })
            },
        );

        match profile {
            Ok(p) => Ok(p),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(Error::not_found("profile", user_id)),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set_daily_study_hours(&self, user_id: i64, hours: i32) -> Result<()> {
        if !(MIN_DAILY_HOURS..=MAX_DAILY_HOURS).contains(&hours) {
            return Err(Error::InvalidInput(format!(
                "daily study hours must be between {} and {}, got {}",
                MIN_DAILY_HOURS, MAX_DAILY_HOURS, hours
            )));
        }
        self.update_profile_column(user_id, "daily_study_hours", &hours)
    }

    pub fn set_deadline(&self, user_id: i64, deadline: Option<NaiveDate>) -> Result<()> {
        let value = deadline.map(|d| d.format(DATE_FORMAT).to_string());
        self.update_profile_column(user_id, "deadline_date", &value)
    }

    pub fn set_last_visited_screen(&self, user_id: i64, screen: Screen) -> Result<()> {
        self.update_profile_column(user_id, "last_visited_screen", &screen.as_str())
    }

    fn update_profile_column(
        &self,
        user_id: i64,
        column: &'static str,
        value: &dyn rusqlite::ToSql,
    ) -> Result<()> {
        let sql = format!(
            "UPDATE user_profiles SET {} = ?1, updated_at = ?2 WHERE user_id = ?3",
            column
        );
        let rows = self
            .conn
            .execute(&sql, params![value, Utc::now().to_rfc3339(), user_id])?;
        if rows == 0 {
            return Err(Error::not_found("profile", user_id));
        }
        Ok(())
    }

    /// One quote per user per day, picked at random the first time it is asked for.
    pub fn daily_quote(&self, user_id: i64, today: NaiveDate) -> Result<String> {
        let today_str = today.format(DATE_FORMAT).to_string();
        let stored = self.conn.query_row(
            "SELECT daily_quote, quote_date FROM user_profiles WHERE user_id = ?1",
            params![user_id],
            |row| Ok((row.get::<_, Option<String>>(0)?, row.get::<_, Option<String>>(1)?)),
        );

        let (quote, date) = match stored {
            Ok(pair) => pair,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(Error::not_found("profile", user_id))
            }
            Err(e) => return Err(e.into()),
        };

        if let (Some(quote), Some(date)) = (quote, date) {
            if date == today_str {
                return Ok(quote);
            }
        }

        let quote = MOTIVATIONAL_QUOTES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(MOTIVATIONAL_QUOTES[0]);
        self.conn.execute(
            "UPDATE user_profiles SET daily_quote = ?1, quote_date = ?2 WHERE user_id = ?3",
            params![quote, today_str, user_id],
        )?;
        Ok(quote.to_string())
    }

    // Subject operations
    pub fn add_subject(&self, user_id: i64, name: &str) -> Result<i64> {
        let name = normalize_name("subject", name)?;
        self.conn.execute(
            "INSERT INTO subjects (user_id, name, created_at) VALUES (?1, ?2, ?3)",
            params![user_id, name, Utc::now().to_rfc3339()],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(user_id, subject_id = id, "added subject");
        Ok(id)
    }

    pub fn list_subjects(&self, user_id: i64) -> Result<Vec<Subject>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, created_at FROM subjects WHERE user_id = ?1 ORDER BY id",
        )?;

        let rows = stmt.query_map(params![user_id], |row| {
            Ok(Subject {
                id: row.get(0)?,
                user_id: row.get(1)?,
                name: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn list_subjects_with_topics(&self, user_id: i64) -> Result<Vec<SubjectWithTopics>> {
        let subjects = self.list_subjects(user_id)?;
        let mut topics = list_topics_for_user(&self.conn, user_id)?;

        Ok(subjects
            .into_iter()
            .map(|subject| {
                let (mine, rest): (Vec<Topic>, Vec<Topic>) =
                    topics.drain(..).partition(|t| t.subject_id == subject.id);
                topics = rest;
                SubjectWithTopics {
                    subject,
                    topics: mine,
                }
            })
            .collect())
    }

    /// Deleting a subject takes its topics with it, along with their sessions and assessments.
    pub fn delete_subject(&self, user_id: i64, subject_id: i64) -> Result<()> {
        let rows = self.conn.execute(
            "DELETE FROM subjects WHERE id = ?1 AND user_id = ?2",
            params![subject_id, user_id],
        )?;
        if rows == 0 {
            return Err(Error::not_found("subject", subject_id));
        }
        info!(user_id, subject_id, "deleted subject");
        Ok(())
    }

    // Topic operations
    pub fn add_topic(&self, user_id: i64, subject_id: i64, name: &str) -> Result<i64> {
        let name = normalize_name("topic", name)?;
        let owned: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM subjects WHERE id = ?1 AND user_id = ?2)",
            params![subject_id, user_id],
            |row| row.get(0),
        )?;
        if !owned {
            return Err(Error::not_found("subject", subject_id));
        }

        self.conn.execute(
            "INSERT INTO topics (subject_id, name, created_at) VALUES (?1, ?2, ?3)",
            params![subject_id, name, Utc::now().to_rfc3339()],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(user_id, subject_id, topic_id = id, "added topic");
        Ok(id)
    }

    pub fn get_topic(&self, user_id: i64, topic_id: i64) -> Result<Option<Topic>> {
        get_topic_for_user(&self.conn, user_id, topic_id)
    }

    pub fn list_topics(&self, user_id: i64) -> Result<Vec<Topic>> {
        list_topics_for_user(&self.conn, user_id)
    }

    pub fn delete_topic(&self, user_id: i64, topic_id: i64) -> Result<()> {
        let rows = self.conn.execute(
            r#"
            DELETE FROM topics
            WHERE id = ?1
              AND subject_id IN (SELECT id FROM subjects WHERE user_id = ?2)
            "#,
            params![topic_id, user_id],
        )?;
        if rows == 0 {
            return Err(Error::not_found("topic", topic_id));
        }
        info!(user_id, topic_id, "deleted topic");
        Ok(())
    }

    // Plan generation: replace every pending session with a fresh plan
    pub fn generate_plan(&self, user_id: i64, today: NaiveDate) -> Result<Vec<StudySession>> {
        let tx = self.write_tx()?;

        let topics = list_topics_for_user(&tx, user_id)?;
        if topics.is_empty() {
            warn!(user_id, "plan generation requested with no topics");
            return Err(Error::NoTopicsConfigured);
        }

        let plan = engine::build_plan(&topics, today);

        let removed = delete_pending_sessions(&tx, user_id)?;
        for topic in &topics {
            update_topic(
                &tx,
                topic.id,
                &TopicUpdate {
                    priority_score: Some(topic.priority()),
                    ..Default::default()
                },
            )?;
        }
        let sessions = insert_sessions(&tx, &plan)?;

        tx.commit()?;
        info!(
            user_id,
            topics = topics.len(),
            removed,
            created = sessions.len(),
            "generated study plan"
        );
        Ok(sessions)
    }

    // Completion: mark done, stamp the topic and award the fixed reward together
    pub fn complete_session(&self, user_id: i64, session_id: i64) -> Result<XpAward> {
        let tx = self.write_tx()?;

        let session = get_session_for_user(&tx, user_id, session_id)?
            .ok_or_else(|| Error::not_found("session", session_id))?;
        if session.completed {
            return Err(Error::AlreadyCompleted(session_id));
        }

        let now = Utc::now().to_rfc3339();
        mark_session_completed(&tx, session_id, &now)?;
        update_topic(
            &tx,
            session.topic_id,
            &TopicUpdate {
                last_studied: Some(now.clone()),
                ..Default::default()
            },
        )?;
        let award = award_xp(&tx, user_id, engine::COMPLETION_XP, XpSource::TaskCompletion, &now)?;

        tx.commit()?;
        info!(
            user_id,
            session_id,
            xp = award.amount,
            total = award.new_total,
            "completed session"
        );
        Ok(award)
    }

    // Assessment: the submitted scores replace the topic's state outright
    pub fn submit_assessment(
        &self,
        user_id: i64,
        topic_id: i64,
        score: i64,
        confidence_level: i64,
    ) -> Result<AssessmentOutcome> {
        let score = engine::validate_score("score", score)?;
        let confidence_level = engine::validate_score("confidence", confidence_level)?;

        let tx = self.write_tx()?;

        if get_topic_for_user(&tx, user_id, topic_id)?.is_none() {
            return Err(Error::not_found("topic", topic_id));
        }

        let now = Utc::now().to_rfc3339();
        let xp_earned = engine::assessment_xp(score);
        let assessment = insert_assessment(
            &tx,
            topic_id,
            user_id,
            score,
            confidence_level,
            xp_earned,
            &now,
        )?;
        let award = award_xp(&tx, user_id, xp_earned, XpSource::Assessment, &now)?;
        update_topic(
            &tx,
            topic_id,
            &TopicUpdate {
                performance_score: Some(score),
                confidence_level: Some(confidence_level),
                ..Default::default()
            },
        )?;

        tx.commit()?;
        info!(
            user_id,
            topic_id,
            score,
            confidence_level,
            xp = xp_earned,
            total = award.new_total,
            "recorded assessment"
        );
        Ok(AssessmentOutcome { assessment, award })
    }

    // Session queries
    pub fn get_session(&self, user_id: i64, session_id: i64) -> Result<Option<StudySession>> {
        get_session_for_user(&self.conn, user_id, session_id)
    }

    /// Planner listing: pending and completed sessions in date order.
    pub fn list_sessions(&self, user_id: i64, limit: usize) -> Result<Vec<SessionWithTopic>> {
        let sql = format!(
            r#"
            SELECT {}, t.name, s.name
            FROM study_sessions ss
            JOIN topics t ON t.id = ss.topic_id
            JOIN subjects s ON s.id = t.subject_id
            WHERE s.user_id = ?1
            ORDER BY ss.scheduled_date ASC, ss.id ASC
            LIMIT ?2
            "#,
            SESSION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id, limit as i64], session_with_topic_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn upcoming_sessions(
        &self,
        user_id: i64,
        today: NaiveDate,
        limit: usize,
    ) -> Result<Vec<SessionWithTopic>> {
        let sql = format!(
            r#"
            SELECT {}, t.name, s.name
            FROM study_sessions ss
            JOIN topics t ON t.id = ss.topic_id
            JOIN subjects s ON s.id = t.subject_id
            WHERE s.user_id = ?1 AND ss.completed = 0 AND ss.scheduled_date >= ?2
            ORDER BY ss.scheduled_date ASC, ss.id ASC
            LIMIT ?3
            "#,
            SESSION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![user_id, today.format(DATE_FORMAT).to_string(), limit as i64],
            session_with_topic_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn pending_sessions(&self, user_id: i64) -> Result<Vec<StudySession>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM study_sessions ss
            JOIN topics t ON t.id = ss.topic_id
            JOIN subjects s ON s.id = t.subject_id
            WHERE s.user_id = ?1 AND ss.completed = 0
            ORDER BY ss.scheduled_date ASC, ss.id ASC
            "#,
            SESSION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], |row| session_from_row(row, 0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // Assessment and ledger queries
    pub fn list_assessments(&self, user_id: i64, topic_id: Option<i64>) -> Result<Vec<Assessment>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, topic_id, user_id, score, confidence_level, xp_earned, created_at
            FROM assessments
            WHERE user_id = ?1 AND (?2 IS NULL OR topic_id = ?2)
            ORDER BY id DESC
            "#,
        )?;
        let rows = stmt.query_map(params![user_id, topic_id], assessment_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn xp_history(&self, user_id: i64, limit: usize) -> Result<Vec<XpLogEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, user_id, amount, source, created_at
            FROM xp_logs
            WHERE user_id = ?1
            ORDER BY id DESC
            LIMIT ?2
            "#,
        )?;
        let rows = stmt.query_map(params![user_id, limit as i64], |row| {
            Ok(XpLogEntry {
                id: row.get(0)?,
                user_id: row.get(1)?,
                amount: row.get(2)?,
                source: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Compare the profile's running total against the ledger it is derived from.
    pub fn ledger_check(&self, user_id: i64) -> Result<LedgerCheck> {
        let profile_xp = profile_xp(&self.conn, user_id)?;
        let ledger_total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM xp_logs WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(LedgerCheck {
            profile_xp,
            ledger_total,
        })
    }

    // XP per local calendar day for the `days` days ending today, oldest first
    pub fn daily_xp(&self, user_id: i64, today: NaiveDate, days: usize) -> Result<Vec<DailyXp>> {
        if days == 0 {
            return Ok(Vec::new());
        }

        let first = today - Duration::days(days as i64 - 1);
        let mut buckets: Vec<DailyXp> = (0..days)
            .map(|i| DailyXp {
                date: first + Duration::days(i as i64),
                xp: 0,
            })
            .collect();

        // Timestamps are UTC; a one-day margin covers any local offset.
        let cutoff = (first - Duration::days(1)).format(DATE_FORMAT).to_string();
        let mut stmt = self.conn.prepare(
            "SELECT amount, created_at FROM xp_logs WHERE user_id = ?1 AND created_at >= ?2",
        )?;
        let rows = stmt.query_map(params![user_id, cutoff], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (amount, created_at) = row?;
            let Ok(ts) = DateTime::parse_from_rfc3339(&created_at) else {
                continue;
            };
            let date = ts.with_timezone(&Local).date_naive();
            if let Some(bucket) = buckets.iter_mut().find(|b| b.date == date) {
                bucket.xp += amount;
            }
        }

        Ok(buckets)
    }

    pub fn progress_summary(&self, user_id: i64, today: NaiveDate) -> Result<ProgressSummary> {
        let (total_sessions, completed_sessions): (i64, i64) = self.conn.query_row(
            r#"
            SELECT COUNT(*), COALESCE(SUM(ss.completed), 0)
            FROM study_sessions ss
            JOIN topics t ON t.id = ss.topic_id
            JOIN subjects s ON s.id = t.subject_id
            WHERE s.user_id = ?1
            "#,
            params![user_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(ProgressSummary {
            total_sessions,
            completed_sessions,
            daily_xp: self.daily_xp(user_id, today, DAILY_XP_DAYS)?,
        })
    }
}

// Store primitives. Each takes a plain connection so it can run on its own or
// inside a handler's transaction.

pub(crate) fn list_topics_for_user(conn: &Connection, user_id: i64) -> Result<Vec<Topic>> {
    let sql = format!(
        r#"
        SELECT {}
        FROM topics t
        JOIN subjects s ON s.id = t.subject_id
        WHERE s.user_id = ?1
        ORDER BY s.id ASC, t.id ASC
        "#,
        TOPIC_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id], topic_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn get_topic_for_user(conn: &Connection, user_id: i64, topic_id: i64) -> Result<Option<Topic>> {
    let sql = format!(
        r#"
        SELECT {}
        FROM topics t
        JOIN subjects s ON s.id = t.subject_id
        WHERE t.id = ?1 AND s.user_id = ?2
        "#,
        TOPIC_COLUMNS
    );
    match conn.query_row(&sql, params![topic_id, user_id], topic_from_row) {
        Ok(t) => Ok(Some(t)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn get_session_for_user(
    conn: &Connection,
    user_id: i64,
    session_id: i64,
) -> Result<Option<StudySession>> {
    let sql = format!(
        r#"
        SELECT {}
        FROM study_sessions ss
        JOIN topics t ON t.id = ss.topic_id
        JOIN subjects s ON s.id = t.subject_id
        WHERE ss.id = ?1 AND s.user_id = ?2
        "#,
        SESSION_COLUMNS
    );
    match conn.query_row(&sql, params![session_id, user_id], |row| {
        session_from_row(row, 0)
    }) {
        Ok(s) => Ok(Some(s)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Removes the user's pending sessions only; completed history and other users are untouched.
pub(crate) fn delete_pending_sessions(conn: &Connection, user_id: i64) -> Result<usize> {
    Ok(conn.execute(
        r#"
        DELETE FROM study_sessions
        WHERE completed = 0
          AND topic_id IN (
              SELECT t.id FROM topics t
              JOIN subjects s ON s.id = t.subject_id
              WHERE s.user_id = ?1
          )
        "#,
        params![user_id],
    )?)
}

pub(crate) fn insert_sessions(
    conn: &Connection,
    planned: &[PlannedSession],
) -> Result<Vec<StudySession>> {
    let mut stmt = conn.prepare(
        "INSERT INTO study_sessions (topic_id, session_type, scheduled_date) VALUES (?1, ?2, ?3)",
    )?;

    let mut sessions = Vec::with_capacity(planned.len());
    for p in planned {
        stmt.execute(params![
            p.topic_id,
            p.session_type.as_str(),
            p.scheduled_date.format(DATE_FORMAT).to_string()
        ])?;
        sessions.push(StudySession {
            id: conn.last_insert_rowid(),
            topic_id: p.topic_id,
            session_type: p.session_type,
            scheduled_date: p.scheduled_date,
            completed: false,
            completed_at: None,
        });
    }
    Ok(sessions)
}

pub(crate) fn update_topic(conn: &Connection, topic_id: i64, update: &TopicUpdate) -> Result<()> {
    let rows = conn.execute(
        r#"
        UPDATE topics
        SET performance_score = COALESCE(?1, performance_score),
            confidence_level = COALESCE(?2, confidence_level),
            priority_score = COALESCE(?3, priority_score),
            last_studied = COALESCE(?4, last_studied)
        WHERE id = ?5
        "#,
        params![
            update.performance_score,
            update.confidence_level,
            update.priority_score,
            update.last_studied,
            topic_id
        ],
    )?;
    if rows == 0 {
        return Err(Error::not_found("topic", topic_id));
    }
    Ok(())
}

pub(crate) fn insert_assessment(
    conn: &Connection,
    topic_id: i64,
    user_id: i64,
    score: i32,
    confidence_level: i32,
    xp_earned: i64,
    now: &str,
) -> Result<Assessment> {
    conn.execute(
        r#"
        INSERT INTO assessments (topic_id, user_id, score, confidence_level, xp_earned, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![topic_id, user_id, score, confidence_level, xp_earned, now],
    )?;
    Ok(Assessment {
        id: conn.last_insert_rowid(),
        topic_id,
        user_id,
        score,
        confidence_level,
        xp_earned,
        created_at: now.to_string(),
    })
}

pub(crate) fn append_xp_log(
    conn: &Connection,
    user_id: i64,
    amount: i64,
    source: XpSource,
    now: &str,
) -> Result<XpLogEntry> {
    conn.execute(
        "INSERT INTO xp_logs (user_id, amount, source, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![user_id, amount, source.as_str(), now],
    )?;
    Ok(XpLogEntry {
        id: conn.last_insert_rowid(),
        user_id,
        amount,
        source: source.as_str().to_string(),
        created_at: now.to_string(),
    })
}

pub(crate) fn update_profile_xp(conn: &Connection, user_id: i64, new_total: i64) -> Result<()> {
    let rows = conn.execute(
        "UPDATE user_profiles SET xp = ?1, updated_at = ?2 WHERE user_id = ?3",
        params![new_total, Utc::now().to_rfc3339(), user_id],
    )?;
    if rows == 0 {
        return Err(Error::not_found("profile", user_id));
    }
    Ok(())
}

pub(crate) fn mark_session_completed(conn: &Connection, session_id: i64, now: &str) -> Result<()> {
    let rows = conn.execute(
        "UPDATE study_sessions SET completed = 1, completed_at = ?1 WHERE id = ?2 AND completed = 0",
        params![now, session_id],
    )?;
    if rows == 0 {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM study_sessions WHERE id = ?1)",
            params![session_id],
            |row| row.get(0),
        )?;
        return Err(if exists {
            Error::AlreadyCompleted(session_id)
        } else {
            Error::not_found("session", session_id)
        });
    }
    Ok(())
}

fn profile_xp(conn: &Connection, user_id: i64) -> Result<i64> {
    match conn.query_row(
        "SELECT xp FROM user_profiles WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    ) {
        Ok(xp) => Ok(xp),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(Error::not_found("profile", user_id)),
        Err(e) => Err(e.into()),
    }
}

// Ledger append and running total move together; callers hold the transaction.
fn award_xp(
    conn: &Connection,
    user_id: i64,
    amount: i64,
    source: XpSource,
    now: &str,
) -> Result<XpAward> {
    let new_total = profile_xp(conn, user_id)? + amount;
    append_xp_log(conn, user_id, amount, source, now)?;
    update_profile_xp(conn, user_id, new_total)?;
    Ok(XpAward {
        amount,
        source,
        new_total,
    })
}

fn normalize_name(kind: &str, name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(format!("{} name cannot be empty", kind)));
    }
    Ok(trimmed.to_string())
}

fn parse_date(idx: usize, value: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&value, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn topic_from_row(row: &Row<'_>) -> rusqlite::Result<Topic> {
    Ok(Topic {
        id: row.get(0)?,
        subject_id: row.get(1)?,
        name: row.get(2)?,
        performance_score: row.get(3)?,
        confidence_level: row.get(4)?,
        priority_score: row.get(5)?,
        last_studied: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn session_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<StudySession> {
    let type_str: String = row.get(offset + 2)?;
    let session_type = SessionType::from_str(&type_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            offset + 2,
            Type::Text,
            format!("unknown session type '{}'", type_str).into(),
        )
    })?;
    Ok(StudySession {
        id: row.get(offset)?,
        topic_id: row.get(offset + 1)?,
        session_type,
        scheduled_date: parse_date(offset + 3, row.get(offset + 3)?)?,
        completed: row.get(offset + 4)?,
        completed_at: row.get(offset + 5)?,
    })
}

fn session_with_topic_from_row(row: &Row<'_>) -> rusqlite::Result<SessionWithTopic> {
    Ok(SessionWithTopic {
        session: session_from_row(row, 0)?,
        topic_name: row.get(6)?,
        subject_name: row.get(7)?,
    })
}

fn assessment_from_row(row: &Row<'_>) -> rusqlite::Result<Assessment> {
    Ok(Assessment {
        id: row.get(0)?,
        topic_id: row.get(1)?,
        user_id: row.get(2)?,
        score: row.get(3)?,
        confidence_level: row.get(4)?,
        xp_earned: row.get(5)?,
        created_at: row.get(6)?,
    })
}

mod ui;
mod widgets;

use std::io;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::db::{self, Database};
use crate::error::Result as DbResult;
use crate::models::{
    LedgerCheck, ProgressSummary, Screen, SessionWithTopic, Subject, Topic, User, UserProfile,
    XpLogEntry,
};

const RECENT_XP_ENTRIES: usize = 8;

impl Screen {
    fn next(&self) -> Self {
        match self {
            Screen::Home => Screen::Setup,
            Screen::Setup => Screen::Planner,
            Screen::Planner => Screen::Progress,
            Screen::Progress => Screen::Home,
        }
    }

    fn prev(&self) -> Self {
        match self {
            Screen::Home => Screen::Progress,
            Screen::Setup => Screen::Home,
            Screen::Planner => Screen::Setup,
            Screen::Progress => Screen::Planner,
        }
    }
}

pub struct StatefulList<T> {
    pub items: Vec<T>,
    pub selected: Option<usize>,
}

impl<T> StatefulList<T> {
    fn with_items(items: Vec<T>) -> Self {
        let selected = if items.is_empty() { None } else { Some(0) };
        Self { items, selected }
    }

    // Replace items but stay near the previous cursor
    fn replace(&mut self, items: Vec<T>) {
        let selected = match (self.selected, items.len()) {
            (_, 0) => None,
            (Some(i), len) => Some(i.min(len - 1)),
            (None, _) => Some(0),
        };
        self.items = items;
        self.selected = selected;
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) => {
                if i >= self.items.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.selected = Some(i);
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) => {
                if i == 0 {
                    self.items.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.selected = Some(i);
    }

    fn first(&mut self) {
        if !self.items.is_empty() {
            self.selected = Some(0);
        }
    }

    fn last(&mut self) {
        if !self.items.is_empty() {
            self.selected = Some(self.items.len() - 1);
        }
    }

    fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|i| self.items.get(i))
    }
}

/// One line of the Setup screen: a subject header or one of its topics.
#[derive(Debug, Clone)]
pub enum SetupRow {
    Subject { subject: Subject, topic_count: usize },
    Topic { topic: Topic, subject_name: String },
}

impl SetupRow {
    fn subject_id(&self) -> i64 {
        match self {
            SetupRow::Subject { subject, .. } => subject.id,
            SetupRow::Topic { topic, .. } => topic.subject_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    NewSubject,
    NewTopic { subject_id: i64 },
    Assess { topic_id: i64, topic_name: String },
}

impl InputMode {
    pub fn prompt(&self) -> String {
        match self {
            InputMode::NewSubject => "New subject: ".to_string(),
            InputMode::NewTopic { .. } => "New topic: ".to_string(),
            InputMode::Assess { topic_name, .. } => {
                format!("Assess '{}' (score confidence): ", topic_name)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

pub struct App {
    db: Database,
    pub user: User,
    pub view: Screen,
    pub today: NaiveDate,
    clock: fn() -> NaiveDate,
    pub profile: UserProfile,
    pub quote: String,
    pub upcoming: Vec<SessionWithTopic>,
    pub setup_rows: StatefulList<SetupRow>,
    pub sessions: StatefulList<SessionWithTopic>,
    pub progress: ProgressSummary,
    pub recent_xp: Vec<XpLogEntry>,
    pub ledger: LedgerCheck,
    pub input_mode: Option<InputMode>,
    pub input: String,
    pub status: Option<StatusMessage>,
    pub should_quit: bool,
}

impl App {
    pub fn new(db: Database, user: User) -> DbResult<Self> {
        Self::with_clock(db, user, local_today)
    }

    fn with_clock(db: Database, user: User, clock: fn() -> NaiveDate) -> DbResult<Self> {
        let today = clock();
        let profile = db.get_profile(user.id)?;
        let quote = db.daily_quote(user.id, today)?;
        let view = profile.last_visited_screen.unwrap_or(Screen::Home);

        let mut app = Self {
            upcoming: Vec::new(),
            setup_rows: StatefulList::with_items(Vec::new()),
            sessions: StatefulList::with_items(Vec::new()),
            progress: db.progress_summary(user.id, today)?,
            recent_xp: Vec::new(),
            ledger: db.ledger_check(user.id)?,
            db,
            user,
            view,
            today,
            clock,
            profile,
            quote,
            input_mode: None,
            input: String::new(),
            status: None,
            should_quit: false,
        };
        app.refresh_data()?;
        Ok(app)
    }

    pub fn refresh_data(&mut self) -> DbResult<()> {
        let user_id = self.user.id;
        self.today = (self.clock)();
        self.profile = self.db.get_profile(user_id)?;
        self.upcoming = self
            .db
            .upcoming_sessions(user_id, self.today, db::UPCOMING_LIMIT)?;

        let mut rows = Vec::new();
        for entry in self.db.list_subjects_with_topics(user_id)? {
            let subject_name = entry.subject.name.clone();
            rows.push(SetupRow::Subject {
                topic_count: entry.topics.len(),
                subject: entry.subject,
            });
            rows.extend(entry.topics.into_iter().map(|topic| SetupRow::Topic {
                topic,
                subject_name: subject_name.clone(),
            }));
        }
        self.setup_rows.replace(rows);

        self.sessions
            .replace(self.db.list_sessions(user_id, db::PLANNER_LIST_LIMIT)?);
        self.progress = self.db.progress_summary(user_id, self.today)?;
        self.recent_xp = self.db.xp_history(user_id, RECENT_XP_ENTRIES)?;
        self.ledger = self.db.ledger_check(user_id)?;
        Ok(())
    }

    fn switch_to(&mut self, screen: Screen) {
        if self.view == screen {
            return;
        }
        self.view = screen;
        let result = self.db.set_last_visited_screen(self.user.id, screen);
        if let Err(e) = result {
            self.set_error(e.to_string());
        }
    }

    fn set_info(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
        });
    }

    fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: true,
        });
    }

    // Domain failures are shown in the status bar; the UI keeps running.
    fn report(&mut self, result: DbResult<String>) {
        match result {
            Ok(msg) => match self.refresh_data() {
                Ok(()) => self.set_info(msg),
                Err(e) => self.set_error(e.to_string()),
            },
            Err(e) => self.set_error(e.to_string()),
        }
    }

    fn generate_plan(&mut self) {
        self.today = (self.clock)();
        let result = self
            .db
            .generate_plan(self.user.id, self.today)
            .map(|sessions| format!("Generated {} sessions starting {}", sessions.len(), self.today));
        self.report(result);
        self.sessions.first();
    }

    fn complete_selected_session(&mut self) {
        let Some(selected) = self.sessions.selected_item() else {
            return;
        };
        let session_id = selected.session.id;
        let result = self.db.complete_session(self.user.id, session_id);
        let result = result.map(|award| {
            self.profile.xp = award.new_total;
            format!("Session completed: +{} XP", award.amount)
        });
        self.report(result);
    }

    fn selected_topic(&self) -> Option<(i64, String)> {
        match self.view {
            Screen::Setup => match self.setup_rows.selected_item() {
                Some(SetupRow::Topic { topic, .. }) => Some((topic.id, topic.name.clone())),
                _ => None,
            },
            Screen::Planner => self
                .sessions
                .selected_item()
                .map(|s| (s.session.topic_id, s.topic_name.clone())),
            _ => None,
        }
    }

    fn begin_input(&mut self, mode: InputMode) {
        self.input_mode = Some(mode);
        self.input.clear();
        self.status = None;
    }

    fn submit_input(&mut self) {
        let Some(mode) = self.input_mode.take() else {
            return;
        };
        let text = std::mem::take(&mut self.input);
        let user_id = self.user.id;

        let result = match mode {
            InputMode::NewSubject => self
                .db
                .add_subject(user_id, &text)
                .map(|_| format!("Added subject '{}'", text.trim())),
            InputMode::NewTopic { subject_id } => self
                .db
                .add_topic(user_id, subject_id, &text)
                .map(|_| format!("Added topic '{}'", text.trim())),
            InputMode::Assess { topic_id, .. } => match parse_assessment_input(&text) {
                Ok((score, confidence)) => self
                    .db
                    .submit_assessment(user_id, topic_id, score, confidence)
                    .map(|outcome| {
                        self.profile.xp = outcome.award.new_total;
                        format!("Assessment saved: +{} XP", outcome.award.amount)
                    }),
                Err(msg) => {
                    self.set_error(msg);
                    return;
                }
            },
        };
        self.report(result);
    }

    fn delete_selected_row(&mut self) {
        let user_id = self.user.id;
        let result = match self.setup_rows.selected_item() {
            Some(SetupRow::Subject { subject, .. }) => {
                let name = subject.name.clone();
                self.db
                    .delete_subject(user_id, subject.id)
                    .map(|_| format!("Deleted subject '{}'", name))
            }
            Some(SetupRow::Topic { topic, .. }) => {
                let name = topic.name.clone();
                self.db
                    .delete_topic(user_id, topic.id)
                    .map(|_| format!("Deleted topic '{}'", name))
            }
            None => return,
        };
        self.report(result);
    }

    fn adjust_daily_hours(&mut self, delta: i32) {
        let hours = self.profile.daily_study_hours + delta;
        let result = self
            .db
            .set_daily_study_hours(self.user.id, hours)
            .map(|_| format!("Daily study hours: {}", hours));
        self.report(result);
    }

    fn handle_input_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.input_mode = None;
                self.input.clear();
            }
            KeyCode::Enter => self.submit_input(),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        if self.input_mode.is_some() {
            self.handle_input_key(key);
            return;
        }

        match key {
            KeyCode::Char('q') => self.should_quit = true,

            KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => {
                match self.refresh_data() {
                    Ok(()) => self.set_info("Refreshed"),
                    Err(e) => self.set_error(e.to_string()),
                }
            }

            // Views: h/l or Tab, or jump with 1-4
            KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab => {
                self.switch_to(self.view.prev())
            }
            KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => {
                self.switch_to(self.view.next())
            }
            KeyCode::Char(c @ '1'..='4') => {
                let index = c as usize - '1' as usize;
                self.switch_to(Screen::ALL[index]);
            }

            KeyCode::Char('j') | KeyCode::Down => match self.view {
                Screen::Setup => self.setup_rows.next(),
                Screen::Planner => self.sessions.next(),
                _ => {}
            },
            KeyCode::Char('k') | KeyCode::Up => match self.view {
                Screen::Setup => self.setup_rows.previous(),
                Screen::Planner => self.sessions.previous(),
                _ => {}
            },
            KeyCode::Char('g') => match self.view {
                Screen::Setup => self.setup_rows.first(),
                Screen::Planner => self.sessions.first(),
                _ => {}
            },
            KeyCode::Char('G') => match self.view {
                Screen::Setup => self.setup_rows.last(),
                Screen::Planner => self.sessions.last(),
                _ => {}
            },

            KeyCode::Char('p') if matches!(self.view, Screen::Planner | Screen::Home) => {
                self.generate_plan();
                self.switch_to(Screen::Planner);
            }
            KeyCode::Enter | KeyCode::Char('d') if self.view == Screen::Planner => {
                self.complete_selected_session();
            }
            KeyCode::Char('a') => {
                if let Some((topic_id, topic_name)) = self.selected_topic() {
                    self.begin_input(InputMode::Assess {
                        topic_id,
                        topic_name,
                    });
                }
            }

            KeyCode::Char('s') if self.view == Screen::Setup => {
                self.begin_input(InputMode::NewSubject);
            }
            KeyCode::Char('t') if self.view == Screen::Setup => {
                match self.setup_rows.selected_item().map(SetupRow::subject_id) {
                    Some(subject_id) => self.begin_input(InputMode::NewTopic { subject_id }),
                    None => self.set_error("Add a subject first (s)"),
                }
            }
            KeyCode::Char('x') if self.view == Screen::Setup => self.delete_selected_row(),
            KeyCode::Char('+') | KeyCode::Char('=') if self.view == Screen::Setup => {
                self.adjust_daily_hours(1)
            }
            KeyCode::Char('-') if self.view == Screen::Setup => self.adjust_daily_hours(-1),

            KeyCode::Esc => self.status = None,

            _ => {}
        }
    }
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parses "score confidence" (space or comma separated). Range checks are left
/// to the assessment handler so the error names the offending field.
pub fn parse_assessment_input(input: &str) -> Result<(i64, i64), String> {
    let parts: Vec<&str> = input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();

    match parts.as_slice() {
        [score, confidence] => {
            let score = score
                .parse::<i64>()
                .map_err(|_| format!("score '{}' is not a number", score))?;
            let confidence = confidence
                .parse::<i64>()
                .map_err(|_| format!("confidence '{}' is not a number", confidence))?;
            Ok((score, confidence))
        }
        _ => Err("enter two numbers: score confidence".to_string()),
    }
}

pub fn run(db: Database, user: User) -> Result<(), Box<dyn std::error::Error>> {
    // Load state before touching the terminal so failures print normally
    let mut app = App::new(db, user)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key.code, key.modifiers);
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionType;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn setup_app() -> App {
        let db = Database::open(":memory:").expect("Failed to create in-memory database");
        db.init().expect("Failed to initialize database");
        let user = db.login("ada").unwrap();
        App::with_clock(db, user, today).unwrap()
    }

    fn press(app: &mut App, key: KeyCode) {
        app.handle_key(key, KeyModifiers::NONE);
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
        press(app, KeyCode::Enter);
    }

    fn seed(app: &mut App) {
        app.switch_to(Screen::Setup);
        press(app, KeyCode::Char('s'));
        type_text(app, "Physics");
        press(app, KeyCode::Char('t'));
        type_text(app, "Optics");
        press(app, KeyCode::Char('t'));
        type_text(app, "Mechanics");
    }

    mod stateful_list_tests {
        use super::*;

        #[test]
        fn wraps_around() {
            let mut list = StatefulList::with_items(vec![1, 2, 3]);
            list.previous();
            assert_eq!(list.selected, Some(2));
            list.next();
            assert_eq!(list.selected, Some(0));
        }

        #[test]
        fn empty_list_has_no_selection() {
            let mut list: StatefulList<i32> = StatefulList::with_items(vec![]);
            list.next();
            list.last();
            assert_eq!(list.selected, None);
            assert!(list.selected_item().is_none());
        }

        #[test]
        fn replace_clamps_selection() {
            let mut list = StatefulList::with_items(vec![1, 2, 3, 4]);
            list.last();
            list.replace(vec![1, 2]);
            assert_eq!(list.selected, Some(1));
            list.replace(vec![]);
            assert_eq!(list.selected, None);
            list.replace(vec![9]);
            assert_eq!(list.selected, Some(0));
        }
    }

    mod screen_tests {
        use super::*;

        #[test]
        fn next_and_prev_cycle_all_screens() {
            let mut screen = Screen::Home;
            for expected in [Screen::Setup, Screen::Planner, Screen::Progress, Screen::Home] {
                screen = screen.next();
                assert_eq!(screen, expected);
            }
            for s in Screen::ALL {
                assert_eq!(s.next().prev(), s);
            }
        }
    }

    mod input_tests {
        use super::*;

        #[test]
        fn parses_space_or_comma() {
            assert_eq!(parse_assessment_input("80 65"), Ok((80, 65)));
            assert_eq!(parse_assessment_input(" 80,65 "), Ok((80, 65)));
            assert_eq!(parse_assessment_input("80, 65"), Ok((80, 65)));
        }

        #[test]
        fn keeps_out_of_range_values() {
            assert_eq!(parse_assessment_input("120 -3"), Ok((120, -3)));
        }

        #[test]
        fn rejects_wrong_shape() {
            assert!(parse_assessment_input("80").is_err());
            assert!(parse_assessment_input("80 65 10").is_err());
            assert!(parse_assessment_input("high low").is_err());
            assert!(parse_assessment_input("").is_err());
        }
    }

    mod app_tests {
        use super::*;

        #[test]
        fn starts_on_home_for_new_user() {
            let app = setup_app();
            assert_eq!(app.view, Screen::Home);
            assert_eq!(app.profile.xp, 0);
            assert!(!app.quote.is_empty());
        }

        #[test]
        fn remembers_last_visited_screen() {
            let mut app = setup_app();
            press(&mut app, KeyCode::Char('3'));
            assert_eq!(app.view, Screen::Planner);

            let App { db, user, .. } = app;
            let reopened = App::with_clock(db, user, today).unwrap();
            assert_eq!(reopened.view, Screen::Planner);
        }

        #[test]
        fn setup_keys_add_subject_and_topics() {
            let mut app = setup_app();
            seed(&mut app);

            assert_eq!(app.setup_rows.items.len(), 3);
            assert!(matches!(
                &app.setup_rows.items[0],
                SetupRow::Subject { topic_count: 2, .. }
            ));
            assert_eq!(app.status.as_ref().map(|s| s.is_error), Some(false));
        }

        #[test]
        fn escape_cancels_input() {
            let mut app = setup_app();
            app.switch_to(Screen::Setup);
            press(&mut app, KeyCode::Char('s'));
            press(&mut app, KeyCode::Char('x'));
            press(&mut app, KeyCode::Esc);
            assert!(app.input_mode.is_none());
            assert!(app.setup_rows.items.is_empty());
        }

        #[test]
        fn generate_without_topics_shows_error() {
            let mut app = setup_app();
            app.switch_to(Screen::Planner);
            press(&mut app, KeyCode::Char('p'));

            let status = app.status.clone().unwrap();
            assert!(status.is_error);
            assert!(status.text.contains("no topics"));
            assert!(app.sessions.items.is_empty());
        }

        #[test]
        fn generate_then_complete_updates_xp() {
            let mut app = setup_app();
            seed(&mut app);
            app.switch_to(Screen::Planner);
            press(&mut app, KeyCode::Char('p'));
            assert_eq!(app.sessions.items.len(), 2);
            assert!(app
                .sessions
                .items
                .iter()
                .all(|s| s.session.session_type == SessionType::Intense));

            press(&mut app, KeyCode::Enter);
            assert_eq!(app.profile.xp, 100);
            assert!(app.sessions.items[0].session.completed);

            // second attempt is reported, not awarded
            press(&mut app, KeyCode::Char('d'));
            assert_eq!(app.profile.xp, 100);
            assert!(app.status.as_ref().unwrap().is_error);
        }

        #[test]
        fn assess_from_planner() {
            let mut app = setup_app();
            seed(&mut app);
            app.switch_to(Screen::Planner);
            press(&mut app, KeyCode::Char('p'));

            press(&mut app, KeyCode::Char('a'));
            assert!(matches!(app.input_mode, Some(InputMode::Assess { .. })));
            type_text(&mut app, "80 60");

            assert_eq!(app.profile.xp, 90);
            assert!(app.ledger.is_consistent());
            assert_eq!(app.recent_xp.len(), 1);
        }

        #[test]
        fn invalid_assessment_is_reported() {
            let mut app = setup_app();
            seed(&mut app);
            app.setup_rows.last();
            press(&mut app, KeyCode::Char('a'));
            type_text(&mut app, "150 20");

            let status = app.status.clone().unwrap();
            assert!(status.is_error);
            assert!(status.text.contains("score"));
            assert_eq!(app.profile.xp, 0);
        }

        #[test]
        fn daily_hours_adjust_within_bounds() {
            let mut app = setup_app();
            app.switch_to(Screen::Setup);
            press(&mut app, KeyCode::Char('+'));
            assert_eq!(app.profile.daily_study_hours, 3);
            for _ in 0..5 {
                press(&mut app, KeyCode::Char('-'));
            }
            assert_eq!(app.profile.daily_study_hours, 1);
            assert!(app.status.as_ref().unwrap().is_error);
        }

        #[test]
        fn delete_subject_row() {
            let mut app = setup_app();
            seed(&mut app);
            app.setup_rows.first();
            press(&mut app, KeyCode::Char('x'));
            assert!(app.setup_rows.items.is_empty());
        }

        #[test]
        fn refresh_failure_keeps_running() {
            let mut app = setup_app();
            app.db
                .connection()
                .execute("DELETE FROM user_profiles", [])
                .unwrap();

            app.handle_key(KeyCode::Char('r'), KeyModifiers::CONTROL);

            let status = app.status.clone().unwrap();
            assert!(status.is_error);
            assert!(status.text.contains("profile"));
            assert!(!app.should_quit);
        }

        #[test]
        fn refresh_succeeds() {
            let mut app = setup_app();
            app.handle_key(KeyCode::Char('r'), KeyModifiers::CONTROL);
            assert_eq!(
                app.status.clone().map(|s| (s.text, s.is_error)),
                Some(("Refreshed".to_string(), false))
            );
        }

        #[test]
        fn plan_starts_on_current_date() {
            fn next_day() -> NaiveDate {
                NaiveDate::from_ymd_opt(2025, 3, 11).unwrap()
            }

            let mut app = setup_app();
            seed(&mut app);
            assert_eq!(app.today, today());

            // the UI stays open past midnight
            app.clock = next_day;
            app.switch_to(Screen::Planner);
            press(&mut app, KeyCode::Char('p'));

            assert_eq!(app.today, next_day());
            assert_eq!(app.sessions.items[0].session.scheduled_date, next_day());
            assert_eq!(app.progress.daily_xp.last().map(|d| d.date), Some(next_day()));
        }
    }
}

mod config;
mod db;
mod engine;
mod error;
mod models;
mod tui;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use db::Database;
use models::{JsonOutput, User};

const XP_HISTORY_DEFAULT: usize = 20;
const RECENT_ASSESSMENTS: usize = 5;

#[derive(Parser)]
#[command(name = "studyplan")]
#[command(about = "An adaptive study planner that schedules your weakest topics first")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Act as this user instead of the logged-in one
    #[arg(long, short, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Log in as a user, creating them on first use
    Login {
        /// User name
        name: String,
    },

    /// Forget the logged-in user
    Logout,

    /// Manage subjects
    #[command(subcommand)]
    Subject(SubjectCommands),

    /// Manage topics
    #[command(subcommand)]
    Topic(TopicCommands),

    /// Study settings
    #[command(subcommand)]
    Profile(ProfileCommands),

    /// Generate or show the study plan
    #[command(subcommand)]
    Plan(PlanCommands),

    /// Mark a study session as completed
    Done {
        /// Session ID
        id: i64,
    },

    /// Record a self-assessment for a topic
    Assess {
        /// Topic ID
        topic_id: i64,

        /// Assessment score (0-100)
        #[arg(long, short, allow_negative_numbers = true)]
        score: i64,

        /// Confidence level (0-100)
        #[arg(long, short, allow_negative_numbers = true)]
        confidence: i64,
    },

    /// Show completion rate and recent experience
    Progress,

    /// Experience ledger
    #[command(subcommand)]
    Xp(XpCommands),

    /// Today's overview: quote and upcoming sessions
    Home,

    /// Launch interactive terminal UI
    Tui,
}

#[derive(Subcommand)]
enum SubjectCommands {
    /// List subjects with their topics
    List,

    /// Add a new subject
    Add {
        /// Subject name
        name: String,
    },

    /// Delete a subject and everything under it
    Delete {
        /// Subject ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum TopicCommands {
    /// List topics with their current priority
    List {
        /// Only topics of this subject
        #[arg(long, short)]
        subject: Option<i64>,
    },

    /// Add a topic to a subject
    Add {
        /// Subject ID
        subject_id: i64,

        /// Topic name
        name: String,
    },

    /// Delete a topic
    Delete {
        /// Topic ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show profile and settings
    Show,

    /// Update study settings
    Set {
        /// Hours available per day (1-16)
        #[arg(long)]
        daily_hours: Option<i32>,

        /// Exam or goal date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_deadline")]
        deadline: Option<NaiveDate>,

        /// Remove the deadline
        #[arg(long)]
        clear_deadline: bool,
    },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// Replace pending sessions with a fresh plan starting today
    Generate,

    /// Show scheduled sessions
    Show {
        /// Maximum sessions to show
        #[arg(long, short, default_value_t = db::PLANNER_LIST_LIMIT)]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum XpCommands {
    /// Recent ledger entries
    History {
        /// Maximum entries to show
        #[arg(long, short, default_value_t = XP_HISTORY_DEFAULT)]
        limit: usize,
    },

    /// Verify the profile total against the ledger
    Check,
}

fn main() {
    let cli = Cli::parse();

    // The TUI owns the terminal; logging there would corrupt the screen
    if !matches!(cli.command, Commands::Tui) {
        init_tracing(cli.verbose);
    }

    let json = cli.json;
    if let Err(e) = run(cli) {
        if json {
            match serde_json::to_string(&JsonOutput::<()>::err(e.to_string())) {
                Ok(out) => println!("{}", out),
                Err(_) => eprintln!("Error: {}", e),
            }
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "studyplan=debug"
    } else {
        "studyplan=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn current_user(db: &Database, config: &Config, flag: Option<&str>) -> error::Result<User> {
    db.resolve_user(config.active_user(flag).as_deref())
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    let db_path = config.db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = Database::open(&db_path)?;
    db.init()?;
    let today = Local::now().date_naive();

    match cli.command {
        Commands::Init => {
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Database initialized at: {}", db_path.display());
            }
        }

        Commands::Login { name } => {
            let user = db.login(&name)?;
            config.user = Some(user.name.clone());
            config.save()?;
            info!(user = %user.name, "logged in");

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&user))?);
            } else {
                println!("Logged in as '{}'.", user.name);
            }
        }

        Commands::Logout => {
            let previous = config.user.take();
            config.save()?;

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else if let Some(name) = previous {
                println!("Logged out '{}'.", name);
            } else {
                println!("Nobody was logged in.");
            }
        }

        Commands::Subject(subject_cmd) => {
            let user = current_user(&db, &config, cli.user.as_deref())?;
            match subject_cmd {
                SubjectCommands::List => {
                    let subjects = db.list_subjects_with_topics(user.id)?;
                    if cli.json {
                        println!("{}", serde_json::to_string(&JsonOutput::ok(&subjects))?);
                    } else if subjects.is_empty() {
                        println!("No subjects yet. Add one with `studyplan subject add <name>`.");
                    } else {
                        for entry in subjects {
                            println!(
                                "[{}] {} ({} topics)",
                                entry.subject.id,
                                entry.subject.name,
                                entry.topics.len()
                            );
                            for topic in entry.topics {
                                println!("    {:<5} {}", topic.id, truncate(&topic.name, 50));
                            }
                        }
                    }
                }

                SubjectCommands::Add { name } => {
                    let id = db.add_subject(user.id, &name)?;
                    if cli.json {
                        println!(
                            "{}",
                            serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                                "id": id,
                                "name": name.trim()
                            })))?
                        );
                    } else {
                        println!("Added subject '{}' with ID: {}", name.trim(), id);
                    }
                }

                SubjectCommands::Delete { id } => {
                    db.delete_subject(user.id, id)?;
                    if cli.json {
                        println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
                    } else {
                        println!("Subject {} deleted.", id);
                    }
                }
            }
        }

        Commands::Topic(topic_cmd) => {
            let user = current_user(&db, &config, cli.user.as_deref())?;
            match topic_cmd {
                TopicCommands::List { subject } => {
                    let topics: Vec<_> = db
                        .list_topics(user.id)?
                        .into_iter()
                        .filter(|t| subject.map_or(true, |id| t.subject_id == id))
                        .collect();

                    if cli.json {
                        println!("{}", serde_json::to_string(&JsonOutput::ok(&topics))?);
                    } else if topics.is_empty() {
                        println!("No topics found.");
                    } else {
                        println!(
                            "{:<5} {:<30} {:>5} {:>5} {:>8}  NEXT SESSION",
                            "ID", "NAME", "PERF", "CONF", "PRIORITY"
                        );
                        println!("{}", "-".repeat(75));
                        for topic in topics {
                            println!(
                                "{:<5} {:<30} {:>5} {:>5} {:>8.0}  {}",
                                topic.id,
                                truncate(&topic.name, 28),
                                score_cell(topic.performance_score),
                                score_cell(topic.confidence_level),
                                topic.priority(),
                                topic.session_type().as_str()
                            );
                        }
                    }
                }

                TopicCommands::Add { subject_id, name } => {
                    let id = db.add_topic(user.id, subject_id, &name)?;
                    if cli.json {
                        println!(
                            "{}",
                            serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                                "id": id,
                                "subject_id": subject_id,
                                "name": name.trim()
                            })))?
                        );
                    } else {
                        println!("Added topic '{}' with ID: {}", name.trim(), id);
                    }
                }

                TopicCommands::Delete { id } => {
                    db.delete_topic(user.id, id)?;
                    if cli.json {
                        println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
                    } else {
                        println!("Topic {} deleted.", id);
                    }
                }
            }
        }

        Commands::Profile(profile_cmd) => {
            let user = current_user(&db, &config, cli.user.as_deref())?;
            match profile_cmd {
                ProfileCommands::Show => {}

                ProfileCommands::Set {
                    daily_hours,
                    deadline,
                    clear_deadline,
                } => {
                    if let Some(hours) = daily_hours {
                        db.set_daily_study_hours(user.id, hours)?;
                    }
                    if clear_deadline {
                        db.set_deadline(user.id, None)?;
                    } else if deadline.is_some() {
                        db.set_deadline(user.id, deadline)?;
                    }
                }
            }

            let profile = db.get_profile(user.id)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&profile))?);
            } else {
                println!("User: {}", user.name);
                println!("XP: {}", profile.xp);
                println!("Daily study hours: {}", profile.daily_study_hours);
                match profile.deadline_date {
                    Some(deadline) => {
                        let days_left = (deadline - today).num_days();
                        println!("Deadline: {} ({} days left)", deadline, days_left);
                    }
                    None => println!("Deadline: -"),
                }
                println!(
                    "Last screen: {}",
                    profile.last_visited_screen.map_or("-", |s| s.label())
                );
            }
        }

        Commands::Plan(plan_cmd) => {
            let user = current_user(&db, &config, cli.user.as_deref())?;
            match plan_cmd {
                PlanCommands::Generate => {
                    let sessions = db.generate_plan(user.id, today)?;
                    if cli.json {
                        println!("{}", serde_json::to_string(&JsonOutput::ok(&sessions))?);
                    } else {
                        println!("Generated {} sessions starting {}.", sessions.len(), today);
                        print_sessions(&db.list_sessions(user.id, db::PLANNER_LIST_LIMIT)?);
                    }
                }

                PlanCommands::Show { limit } => {
                    let sessions = db.list_sessions(user.id, limit)?;
                    if cli.json {
                        println!("{}", serde_json::to_string(&JsonOutput::ok(&sessions))?);
                    } else if sessions.is_empty() {
                        println!("No sessions scheduled. Run `studyplan plan generate`.");
                    } else {
                        print_sessions(&sessions);
                    }
                }
            }
        }

        Commands::Done { id } => {
            let user = current_user(&db, &config, cli.user.as_deref())?;
            let award = db.complete_session(user.id, id)?;

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&award))?);
            } else {
                if let Some(session) = db.get_session(user.id, id)? {
                    println!(
                        "{} session from {} completed.",
                        session.session_type.as_str(),
                        session.scheduled_date
                    );
                }
                println!("+{} XP (total {}).", award.amount, award.new_total);
                println!("{} sessions still pending.", db.pending_sessions(user.id)?.len());
            }
        }

        Commands::Assess {
            topic_id,
            score,
            confidence,
        } => {
            let user = current_user(&db, &config, cli.user.as_deref())?;
            let outcome = db.submit_assessment(user.id, topic_id, score, confidence)?;

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&outcome))?);
            } else {
                println!(
                    "Assessment recorded for topic {}: score {}, confidence {}.",
                    topic_id, outcome.assessment.score, outcome.assessment.confidence_level
                );
                println!(
                    "+{} XP (total {}).",
                    outcome.award.amount, outcome.award.new_total
                );
                if let Some(topic) = db.get_topic(user.id, topic_id)? {
                    println!(
                        "'{}' now has priority {:.0}; next session will be {}.",
                        topic.name,
                        topic.priority(),
                        topic.session_type().as_str()
                    );
                }
            }
        }

        Commands::Progress => {
            let user = current_user(&db, &config, cli.user.as_deref())?;
            let profile = db.get_profile(user.id)?;
            let summary = db.progress_summary(user.id, today)?;
            let assessments: Vec<_> = db
                .list_assessments(user.id, None)?
                .into_iter()
                .take(RECENT_ASSESSMENTS)
                .collect();

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "xp": profile.xp,
                        "completion_rate": summary.completion_rate(),
                        "summary": summary,
                        "recent_assessments": assessments
                    })))?
                );
            } else {
                println!("=== Progress ===");
                println!();
                println!("Total XP:        {}", profile.xp);
                println!(
                    "Completion rate: {}% ({} of {} sessions)",
                    summary.completion_rate(),
                    summary.completed_sessions,
                    summary.total_sessions
                );
                println!();
                println!("XP over the last {} days:", summary.daily_xp.len());
                let peak = summary.daily_xp.iter().map(|d| d.xp).max().unwrap_or(0);
                for day in &summary.daily_xp {
                    println!(
                        "  {}  {:>5}  {}",
                        day.date.format("%a %d %b"),
                        day.xp,
                        bar(day.xp, peak, 30)
                    );
                }
                if !assessments.is_empty() {
                    println!();
                    println!("Recent assessments:");
                    for a in &assessments {
                        println!(
                            "  topic {:<5} score {:>3}  confidence {:>3}  +{} XP",
                            a.topic_id, a.score, a.confidence_level, a.xp_earned
                        );
                    }
                }
            }
        }

        Commands::Xp(xp_cmd) => {
            let user = current_user(&db, &config, cli.user.as_deref())?;
            match xp_cmd {
                XpCommands::History { limit } => {
                    let entries = db.xp_history(user.id, limit)?;
                    if cli.json {
                        println!("{}", serde_json::to_string(&JsonOutput::ok(&entries))?);
                    } else if entries.is_empty() {
                        println!("No experience earned yet.");
                    } else {
                        println!("{:<6} {:<18} {:>6}  WHEN", "ID", "SOURCE", "XP");
                        println!("{}", "-".repeat(60));
                        for entry in entries {
                            println!(
                                "{:<6} {:<18} {:>6}  {}",
                                entry.id,
                                entry.source,
                                format!("+{}", entry.amount),
                                truncate(&entry.created_at, 19)
                            );
                        }
                    }
                }

                XpCommands::Check => {
                    let check = db.ledger_check(user.id)?;
                    if cli.json {
                        println!(
                            "{}",
                            serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                                "profile_xp": check.profile_xp,
                                "ledger_total": check.ledger_total,
                                "consistent": check.is_consistent()
                            })))?
                        );
                    } else if check.is_consistent() {
                        println!("Ledger consistent: {} XP.", check.profile_xp);
                    } else {
                        println!(
                            "Ledger mismatch: profile has {} XP, ledger sums to {}.",
                            check.profile_xp, check.ledger_total
                        );
                    }
                }
            }
        }

        Commands::Home => {
            let user = current_user(&db, &config, cli.user.as_deref())?;
            let profile = db.get_profile(user.id)?;
            let quote = db.daily_quote(user.id, today)?;
            let upcoming = db.upcoming_sessions(user.id, today, db::UPCOMING_LIMIT)?;

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "user": user.name,
                        "xp": profile.xp,
                        "quote": quote,
                        "upcoming": upcoming
                    })))?
                );
            } else {
                println!("Welcome back, {}! ({} XP)", user.name, profile.xp);
                println!();
                println!("  \"{}\"", quote);
                println!();
                if upcoming.is_empty() {
                    println!("Nothing scheduled. Run `studyplan plan generate`.");
                } else {
                    println!("Up next:");
                    print_sessions(&upcoming);
                }
            }
        }

        Commands::Tui => {
            let user = current_user(&db, &config, cli.user.as_deref())?;
            tui::run(db, user)?;
        }
    }

    Ok(())
}

fn print_sessions(sessions: &[models::SessionWithTopic]) {
    println!(
        "{:<5} {:<11} {:<15} {:<40} STATUS",
        "ID", "DATE", "TYPE", "TOPIC"
    );
    println!("{}", "-".repeat(82));
    for s in sessions {
        let topic = format!("{} / {}", s.subject_name, s.topic_name);
        println!(
            "{:<5} {:<11} {:<15} {:<40} {}",
            s.session.id,
            s.session.scheduled_date,
            s.session.session_type.as_str(),
            truncate(&topic, 38),
            if s.session.completed { "done" } else { "pending" }
        );
    }
}

fn score_cell(score: Option<i32>) -> String {
    score.map_or_else(|| "-".to_string(), |s| s.to_string())
}

fn bar(value: i64, peak: i64, width: usize) -> String {
    if peak <= 0 || value <= 0 {
        return String::new();
    }
    let filled = ((value as f64 / peak as f64) * width as f64).round() as usize;
    "#".repeat(filled.max(1))
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    mod truncate_tests {
        use super::*;

        #[test]
        fn truncate_short_string() {
            assert_eq!(truncate("hello", 10), "hello");
        }

        #[test]
        fn truncate_exact_length() {
            assert_eq!(truncate("hello", 5), "hello");
        }

        #[test]
        fn truncate_long_string() {
            assert_eq!(truncate("hello world", 8), "hello...");
        }

        #[test]
        fn truncate_empty_string() {
            assert_eq!(truncate("", 10), "");
        }

        #[test]
        fn truncate_multibyte() {
            assert_eq!(truncate("Thermodynamik \u{00fc}ber alles", 10), "Thermod...");
        }
    }

    mod format_tests {
        use super::*;

        #[test]
        fn score_cell_unset() {
            assert_eq!(score_cell(None), "-");
            assert_eq!(score_cell(Some(42)), "42");
        }

        #[test]
        fn bar_scales_to_peak() {
            assert_eq!(bar(100, 100, 10), "#".repeat(10));
            assert_eq!(bar(50, 100, 10), "#".repeat(5));
            assert_eq!(bar(1, 1000, 10), "#");
            assert_eq!(bar(0, 100, 10), "");
            assert_eq!(bar(10, 0, 10), "");
        }
    }

    mod cli_parsing_tests {
        use super::*;

        #[test]
        fn parse_init_command() {
            let cli = Cli::try_parse_from(["studyplan", "init"]).unwrap();
            assert!(!cli.json);
            assert!(!cli.verbose);
            assert!(cli.user.is_none());
            assert!(matches!(cli.command, Commands::Init));
        }

        #[test]
        fn parse_global_flags_after_subcommand() {
            let cli =
                Cli::try_parse_from(["studyplan", "progress", "--json", "-v", "--user", "ada"])
                    .unwrap();
            assert!(cli.json);
            assert!(cli.verbose);
            assert_eq!(cli.user.as_deref(), Some("ada"));
            assert!(matches!(cli.command, Commands::Progress));
        }

        #[test]
        fn parse_login() {
            let cli = Cli::try_parse_from(["studyplan", "login", "ada"]).unwrap();
            match cli.command {
                Commands::Login { name } => assert_eq!(name, "ada"),
                _ => panic!("Expected Login command"),
            }
        }

        #[test]
        fn parse_subject_add() {
            let cli = Cli::try_parse_from(["studyplan", "subject", "add", "Organic Chemistry"])
                .unwrap();
            match cli.command {
                Commands::Subject(SubjectCommands::Add { name }) => {
                    assert_eq!(name, "Organic Chemistry");
                }
                _ => panic!("Expected Subject Add command"),
            }
        }

        #[test]
        fn parse_topic_add() {
            let cli = Cli::try_parse_from(["studyplan", "topic", "add", "3", "Alkenes"]).unwrap();
            match cli.command {
                Commands::Topic(TopicCommands::Add { subject_id, name }) => {
                    assert_eq!(subject_id, 3);
                    assert_eq!(name, "Alkenes");
                }
                _ => panic!("Expected Topic Add command"),
            }
        }

        #[test]
        fn parse_topic_list_with_subject() {
            let cli = Cli::try_parse_from(["studyplan", "topic", "list", "-s", "2"]).unwrap();
            match cli.command {
                Commands::Topic(TopicCommands::List { subject }) => {
                    assert_eq!(subject, Some(2));
                }
                _ => panic!("Expected Topic List command"),
            }
        }

        #[test]
        fn parse_profile_set() {
            let cli = Cli::try_parse_from([
                "studyplan",
                "profile",
                "set",
                "--daily-hours",
                "4",
                "--deadline",
                "2025-06-01",
            ])
            .unwrap();
            match cli.command {
                Commands::Profile(ProfileCommands::Set {
                    daily_hours,
                    deadline,
                    clear_deadline,
                }) => {
                    assert_eq!(daily_hours, Some(4));
                    assert_eq!(deadline, NaiveDate::from_ymd_opt(2025, 6, 1));
                    assert!(!clear_deadline);
                }
                _ => panic!("Expected Profile Set command"),
            }
        }

        #[test]
        fn parse_profile_set_rejects_bad_date() {
            let result =
                Cli::try_parse_from(["studyplan", "profile", "set", "--deadline", "next week"]);
            assert!(result.is_err());
        }

        #[test]
        fn parse_deadline_conflicts_with_clear() {
            let result = Cli::try_parse_from([
                "studyplan",
                "profile",
                "set",
                "--deadline",
                "2025-06-01",
                "--clear-deadline",
            ]);
            assert!(result.is_err());
        }

        #[test]
        fn parse_plan_generate() {
            let cli = Cli::try_parse_from(["studyplan", "plan", "generate"]).unwrap();
            assert!(matches!(cli.command, Commands::Plan(PlanCommands::Generate)));
        }

        #[test]
        fn parse_plan_show_default_limit() {
            let cli = Cli::try_parse_from(["studyplan", "plan", "show"]).unwrap();
            match cli.command {
                Commands::Plan(PlanCommands::Show { limit }) => {
                    assert_eq!(limit, db::PLANNER_LIST_LIMIT);
                }
                _ => panic!("Expected Plan Show command"),
            }
        }

        #[test]
        fn parse_done() {
            let cli = Cli::try_parse_from(["studyplan", "done", "17"]).unwrap();
            assert!(matches!(cli.command, Commands::Done { id: 17 }));
        }

        #[test]
        fn parse_assess() {
            let cli =
                Cli::try_parse_from(["studyplan", "assess", "5", "--score", "80", "-c", "65"])
                    .unwrap();
            match cli.command {
                Commands::Assess {
                    topic_id,
                    score,
                    confidence,
                } => {
                    assert_eq!(topic_id, 5);
                    assert_eq!(score, 80);
                    assert_eq!(confidence, 65);
                }
                _ => panic!("Expected Assess command"),
            }
        }

        #[test]
        fn parse_assess_keeps_out_of_range_for_validation() {
            let cli =
                Cli::try_parse_from(["studyplan", "assess", "5", "-s", "-10", "-c", "150"])
                    .unwrap();
            match cli.command {
                Commands::Assess {
                    score, confidence, ..
                } => {
                    assert_eq!(score, -10);
                    assert_eq!(confidence, 150);
                }
                _ => panic!("Expected Assess command"),
            }
        }

        #[test]
        fn parse_assess_requires_both_scores() {
            let result = Cli::try_parse_from(["studyplan", "assess", "5", "--score", "80"]);
            assert!(result.is_err());
        }

        #[test]
        fn parse_xp_history_limit() {
            let cli = Cli::try_parse_from(["studyplan", "xp", "history", "-l", "5"]).unwrap();
            match cli.command {
                Commands::Xp(XpCommands::History { limit }) => assert_eq!(limit, 5),
                _ => panic!("Expected Xp History command"),
            }
        }

        #[test]
        fn parse_xp_check() {
            let cli = Cli::try_parse_from(["studyplan", "xp", "check"]).unwrap();
            assert!(matches!(cli.command, Commands::Xp(XpCommands::Check)));
        }

        #[test]
        fn parse_home_and_tui() {
            let cli = Cli::try_parse_from(["studyplan", "home"]).unwrap();
            assert!(matches!(cli.command, Commands::Home));
            let cli = Cli::try_parse_from(["studyplan", "tui"]).unwrap();
            assert!(matches!(cli.command, Commands::Tui));
        }

        #[test]
        fn parse_invalid_command_fails() {
            assert!(Cli::try_parse_from(["studyplan", "invalid"]).is_err());
        }

        #[test]
        fn parse_done_non_numeric_fails() {
            assert!(Cli::try_parse_from(["studyplan", "done", "abc"]).is_err());
        }
    }
}

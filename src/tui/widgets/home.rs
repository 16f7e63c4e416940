use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use super::{session_type_color, truncate};
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Welcome + quote row
            Constraint::Min(0),    // Upcoming sessions
        ])
        .split(area);

    let top_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[0]);

    draw_welcome(f, app, top_chunks[0]);
    draw_quote(f, app, top_chunks[1]);
    draw_upcoming(f, app, chunks[1]);
}

fn draw_welcome(f: &mut Frame, app: &App, area: Rect) {
    let deadline = match app.profile.deadline_date {
        Some(date) => {
            let days = (date - app.today).num_days();
            let color = if days <= 7 { Color::Red } else { Color::White };
            Span::styled(format!("{} ({} days)", date, days), Style::default().fg(color))
        }
        None => Span::styled("not set", Style::default().fg(Color::DarkGray)),
    };

    let text = vec![
        Line::from(Span::styled(
            format!("Welcome back, {}!", app.user.name),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("XP: ", Style::default().fg(Color::Gray)),
            Span::styled(
                app.profile.xp.to_string(),
                Style::default().fg(Color::Yellow),
            ),
        ]),
        Line::from(vec![
            Span::styled("Daily hours: ", Style::default().fg(Color::Gray)),
            Span::raw(app.profile.daily_study_hours.to_string()),
        ]),
        Line::from(vec![
            Span::styled("Deadline: ", Style::default().fg(Color::Gray)),
            deadline,
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Today ")
        .title_style(Style::default().fg(Color::Cyan));

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_quote(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Quote of the Day ")
        .title_style(Style::default().fg(Color::Magenta));

    let quote = Paragraph::new(Line::from(Span::styled(
        format!("\"{}\"", app.quote),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::ITALIC),
    )))
    .wrap(Wrap { trim: true })
    .block(block);

    f.render_widget(quote, area);
}

fn draw_upcoming(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = if app.upcoming.is_empty() {
        vec![ListItem::new(Span::styled(
            "Nothing scheduled. Press p to generate a plan.",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        app.upcoming
            .iter()
            .map(|s| {
                let when = if s.session.scheduled_date == app.today {
                    "Today".to_string()
                } else {
                    s.session.scheduled_date.format("%a %b %d").to_string()
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:<12}", when), Style::default().fg(Color::DarkGray)),
                    Span::styled(
                        format!("{:<16}", s.session.session_type.as_str()),
                        Style::default().fg(session_type_color(s.session.session_type)),
                    ),
                    Span::styled(
                        truncate(&format!("{} / {}", s.subject_name, s.topic_name), 50),
                        Style::default().fg(Color::White),
                    ),
                ]))
            })
            .collect()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Upcoming Sessions ")
        .title_style(Style::default().fg(Color::Yellow));

    f.render_widget(List::new(items).block(block), area);
}

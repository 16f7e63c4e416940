use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::{score_text, session_type_color, truncate};
use crate::tui::{App, SetupRow};

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0)])
        .split(chunks[1]);

    draw_tree(f, app, chunks[0]);
    draw_settings(f, app, side[0]);
    draw_selection(f, app, side[1]);
}

fn draw_tree(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .setup_rows
        .items
        .iter()
        .map(|row| match row {
            SetupRow::Subject {
                subject,
                topic_count,
            } => ListItem::new(Line::from(vec![
                Span::styled(
                    truncate(&subject.name, 30),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  ({} topics)", topic_count),
                    Style::default().fg(Color::DarkGray),
                ),
            ])),
            SetupRow::Topic { topic, .. } => ListItem::new(Line::from(vec![
                Span::raw("  "),
                Span::styled(
                    format!("{:<28}", truncate(&topic.name, 26)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!(
                        "P {:>3}  C {:>3}",
                        score_text(topic.performance_score),
                        score_text(topic.confidence_level)
                    ),
                    Style::default().fg(if topic.is_assessed() {
                        Color::Gray
                    } else {
                        Color::DarkGray
                    }),
                ),
            ])),
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Subjects & Topics ")
        .title_style(Style::default().fg(Color::Cyan));

    if items.is_empty() {
        let hint = Paragraph::new("No subjects yet. Press s to add one.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(hint, area);
        return;
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.setup_rows.selected);

    f.render_stateful_widget(list, area, &mut state);
}

fn draw_settings(f: &mut Frame, app: &App, area: Rect) {
    let deadline = app
        .profile
        .deadline_date
        .map_or_else(|| "not set".to_string(), |d| d.to_string());

    let text = vec![
        Line::from(vec![
            Span::styled("Daily study hours: ", Style::default().fg(Color::Gray)),
            Span::styled(
                app.profile.daily_study_hours.to_string(),
                Style::default().fg(Color::Yellow),
            ),
        ]),
        Line::from(vec![
            Span::styled("Deadline: ", Style::default().fg(Color::Gray)),
            Span::raw(deadline),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Settings ")
        .title_style(Style::default().fg(Color::Magenta));

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_selection(f: &mut Frame, app: &App, area: Rect) {
    let text = match app.setup_rows.selected_item() {
        Some(SetupRow::Topic {
            topic,
            subject_name,
        }) => {
            let session_type = topic.session_type();
            let mut lines = vec![
                Line::from(Span::styled(
                    topic.name.clone(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    subject_name.clone(),
                    Style::default().fg(Color::DarkGray),
                )),
                Line::from(""),
                Line::from(vec![
                    Span::styled("Performance: ", Style::default().fg(Color::Gray)),
                    Span::raw(score_text(topic.performance_score)),
                ]),
                Line::from(vec![
                    Span::styled("Confidence:  ", Style::default().fg(Color::Gray)),
                    Span::raw(score_text(topic.confidence_level)),
                ]),
                Line::from(vec![
                    Span::styled("Priority:    ", Style::default().fg(Color::Gray)),
                    Span::raw(format!("{:.0}", topic.priority())),
                ]),
                Line::from(vec![
                    Span::styled("Next session: ", Style::default().fg(Color::Gray)),
                    Span::styled(
                        session_type.as_str(),
                        Style::default().fg(session_type_color(session_type)),
                    ),
                ]),
                Line::from(Span::styled(
                    session_type.description(),
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            if let Some(last) = &topic.last_studied {
                lines.push(Line::from(vec![
                    Span::styled("Last studied: ", Style::default().fg(Color::Gray)),
                    Span::raw(last.chars().take(10).collect::<String>()),
                ]));
            }
            lines
        }
        Some(SetupRow::Subject { subject, .. }) => vec![
            Line::from(Span::styled(
                subject.name.clone(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "t adds a topic, x deletes the subject and its topics",
                Style::default().fg(Color::DarkGray),
            )),
        ],
        None => vec![Line::from("")],
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Details ")
        .title_style(Style::default().fg(Color::Yellow));

    f.render_widget(Paragraph::new(text).block(block), area);
}

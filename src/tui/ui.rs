use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use super::widgets::{home, planner, progress, setup};
use super::App;
use crate::models::Screen;

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status line
            Constraint::Length(1), // Help bar
        ])
        .split(f.area());

    draw_tabs(f, app, chunks[0]);
    draw_content(f, app, chunks[1]);
    draw_status(f, app, chunks[2]);
    draw_help_bar(f, app, chunks[3]);
}

fn draw_tabs(f: &mut Frame, app: &App, area: Rect) {
    let tab_titles: Vec<String> = Screen::ALL
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{} {}", i + 1, s.label()))
        .collect();
    let selected = Screen::ALL
        .iter()
        .position(|s| *s == app.view)
        .unwrap_or(0);

    let title = format!(" Study Planner | {} | {} XP ", app.user.name, app.profile.xp);
    let tabs = Tabs::new(tab_titles)
        .block(Block::default().borders(Borders::ALL).title(title))
        .select(selected)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(tabs, area);
}

fn draw_content(f: &mut Frame, app: &App, area: Rect) {
    match app.view {
        Screen::Home => home::draw(f, app, area),
        Screen::Setup => setup::draw(f, app, area),
        Screen::Planner => planner::draw(f, app, area),
        Screen::Progress => progress::draw(f, app, area),
    }
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let line = match (&app.input_mode, &app.status) {
        (Some(mode), _) => Line::from(vec![
            Span::styled(mode.prompt(), Style::default().fg(Color::Yellow)),
            Span::raw(app.input.as_str()),
            Span::styled("█", Style::default().fg(Color::Yellow)),
        ]),
        (None, Some(status)) => {
            let color = if status.is_error {
                Color::Red
            } else {
                Color::Green
            };
            Line::from(Span::styled(status.text.as_str(), Style::default().fg(color)))
        }
        (None, None) => Line::default(),
    };

    f.render_widget(Paragraph::new(line), area);
}

fn key(k: &'static str) -> Span<'static> {
    Span::styled(k, Style::default().fg(Color::Cyan))
}

fn draw_help_bar(f: &mut Frame, app: &App, area: Rect) {
    let help_text = if app.input_mode.is_some() {
        vec![
            key("<CR>"),
            Span::raw(" Submit  "),
            key("<Esc>"),
            Span::raw(" Cancel"),
        ]
    } else {
        let mut spans = vec![key("h/l"), Span::raw(" Views  ")];

        match app.view {
            Screen::Home => {
                spans.extend(vec![
                    key("p"),
                    Span::raw(" Generate plan  "),
                    key("^r"),
                    Span::raw(" Refresh  "),
                ]);
            }
            Screen::Setup => {
                spans.extend(vec![
                    key("j/k"),
                    Span::raw(" Nav  "),
                    key("s"),
                    Span::raw(" Subject  "),
                    key("t"),
                    Span::raw(" Topic  "),
                    key("a"),
                    Span::raw(" Assess  "),
                    key("x"),
                    Span::raw(" Delete  "),
                    key("+/-"),
                    Span::raw(" Hours  "),
                ]);
            }
            Screen::Planner => {
                spans.extend(vec![
                    key("j/k"),
                    Span::raw(" Nav  "),
                    key("p"),
                    Span::raw(" Generate  "),
                    key("d/<CR>"),
                    Span::raw(" Done  "),
                    key("a"),
                    Span::raw(" Assess  "),
                ]);
            }
            Screen::Progress => {
                spans.extend(vec![key("^r"), Span::raw(" Refresh  ")]);
            }
        }

        spans.extend(vec![key("q"), Span::raw(" Quit")]);
        spans
    };

    let help = Paragraph::new(Line::from(help_text)).style(Style::default().bg(Color::DarkGray));

    f.render_widget(help, area);
}

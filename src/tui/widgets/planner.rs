use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::{session_type_color, truncate};
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Study Plan ")
        .title_style(Style::default().fg(Color::Cyan));

    if app.sessions.items.is_empty() {
        let hint = Paragraph::new("No sessions yet. Press p to generate a plan.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(hint, area);
        return;
    }

    let items: Vec<ListItem> = app
        .sessions
        .items
        .iter()
        .map(|s| {
            let (status, status_color) = if s.session.completed {
                ("done", Color::Green)
            } else if s.session.scheduled_date < app.today {
                ("overdue", Color::Red)
            } else {
                ("pending", Color::White)
            };
            let name_style = if s.session.completed {
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default().fg(Color::White)
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<12}", s.session.scheduled_date.format("%a %b %d")),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{:<16}", s.session.session_type.as_str()),
                    Style::default().fg(session_type_color(s.session.session_type)),
                ),
                Span::styled(
                    format!(
                        "{:<42}",
                        truncate(&format!("{} / {}", s.subject_name, s.topic_name), 40)
                    ),
                    name_style,
                ),
                Span::styled(status, Style::default().fg(status_color)),
            ]))
        })
        .collect();

    // Header
    let header = Line::from(vec![Span::styled(
        format!("{:<12}{:<16}{:<42}{}", "Date", "Type", "Topic", "Status"),
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )]);

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.sessions.selected);

    let header_area = Rect {
        x: area.x + 3,
        y: area.y + 1,
        width: area.width.saturating_sub(4),
        height: 1,
    };
    f.render_widget(Paragraph::new(header), header_area);

    let list_area = Rect {
        x: area.x,
        y: area.y + 1,
        width: area.width,
        height: area.height.saturating_sub(1),
    };

    f.render_stateful_widget(list, list_area, &mut state);
}

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Gauge, List, ListItem},
    Frame,
};

use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Completion gauge
            Constraint::Min(8),    // Daily XP chart + ledger
        ])
        .split(area);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    draw_completion(f, app, chunks[0]);
    draw_daily_xp(f, app, bottom[0]);
    draw_ledger(f, app, bottom[1]);
}

fn draw_completion(f: &mut Frame, app: &App, area: Rect) {
    let summary = &app.progress;
    let rate = summary.completion_rate();

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Completion ")
                .title_style(Style::default().fg(Color::Cyan)),
        )
        .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
        .percent(rate.min(100) as u16)
        .label(format!(
            "{}% ({} of {} sessions)",
            rate, summary.completed_sessions, summary.total_sessions
        ));

    f.render_widget(gauge, area);
}

fn draw_daily_xp(f: &mut Frame, app: &App, area: Rect) {
    let labels: Vec<String> = app
        .progress
        .daily_xp
        .iter()
        .map(|d| d.date.format("%a").to_string())
        .collect();
    let data: Vec<(&str, u64)> = labels
        .iter()
        .zip(&app.progress.daily_xp)
        .map(|(label, d)| (label.as_str(), d.xp.max(0) as u64))
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" XP, last {} days ", data.len()))
                .title_style(Style::default().fg(Color::Yellow)),
        )
        .data(data.as_slice())
        .bar_width(7)
        .bar_gap(2)
        .bar_style(Style::default().fg(Color::Yellow))
        .value_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(chart, area);
}

fn draw_ledger(f: &mut Frame, app: &App, area: Rect) {
    let mut items: Vec<ListItem> = app
        .recent_xp
        .iter()
        .map(|entry| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:>5} ", format!("+{}", entry.amount)),
                    Style::default().fg(Color::Green),
                ),
                Span::styled(
                    format!("{:<16}", entry.source),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    entry.created_at.chars().take(10).collect::<String>(),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    if items.is_empty() {
        items.push(ListItem::new(Span::styled(
            "No experience yet",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let (title, color) = if app.ledger.is_consistent() {
        (format!(" Ledger: {} XP ", app.ledger.profile_xp), Color::Magenta)
    } else {
        (
            format!(
                " Ledger mismatch: {} vs {} ",
                app.ledger.profile_xp, app.ledger.ledger_total
            ),
            Color::Red,
        )
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(color));

    f.render_widget(List::new(items).block(block), area);
}

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;

pub fn render_new_module(app: &App, f: &mut Frame, area: Rect) {
    let draft = &app.new_module;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // form
            Constraint::Length(1), // key help
        ])
        .split(area);

    let focus_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let label_style = Style::default().add_modifier(Modifier::DIM);

    let lines: Vec<Line> = draft
        .fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let focused = i == draft.focus;
            let cursor = if focused { "▏" } else { "" };
            let marker = if field.required { "*" } else { " " };
            Line::from(vec![
                Span::styled(
                    format!("{:<26}", format!("{}{}", field.label, marker)),
                    if focused { focus_style } else { label_style },
                ),
                Span::raw(field.value.clone()),
                Span::styled(cursor, focus_style),
            ])
        })
        .collect();

    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" New module "),
        ),
        chunks[0],
    );

    f.render_widget(
        Paragraph::new(Span::styled(
            "tab/↓ next  shift+tab/↑ previous  enter create  esc cancel",
            label_style,
        )),
        chunks[1],
    );
}

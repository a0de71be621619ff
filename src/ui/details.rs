use itertools::Itertools;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table},
    Frame,
};

use crate::{app::App, details::ModuleDetails, time_format::format_seconds};

pub fn render_details(app: &App, f: &mut Frame, area: Rect) {
    let Some(details) = app.details.as_ref() else {
        return;
    };
    let module = &details.module;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // fields
            Constraint::Length(3), // add time input
            Constraint::Length(1), // key help
        ])
        .split(area);

    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let warn_style = Style::default().fg(Color::Yellow);

    let learned = app
        .list
        .find_module(&module.id)
        .map(|m| app.list.displayed_seconds(m))
        .unwrap_or(module.seconds_learned);
    let remaining = module.remaining_self_study_seconds();
    let days = module.study_days.iter().map(|d| d.to_string()).join(", ");

    let learned_cell = if module.exceeds_total_workload() {
        Span::styled(format_seconds(learned as i64), warn_style)
    } else {
        Span::raw(format_seconds(learned as i64))
    };

    let rows = vec![
        Row::new(vec![
            Line::from("Learned"),
            Line::from(learned_cell),
        ]),
        field("Credit points", module.credits.to_string()),
        field("Contact hours", module.contact_hours.to_string()),
        field("Self-study hours", module.self_study_hours.to_string()),
        field("Total workload", format!("{} h", module.total_workload_hours())),
        field(
            "Self-study left",
            if remaining < 0 {
                format!("over by {}", format_seconds(-remaining))
            } else {
                format_seconds(remaining)
            },
        ),
        field(
            "Semester",
            format!(
                "{} {}",
                module.semester_level,
                details.semester_year(app.current_year())
            ),
        ),
        field("Active", if module.active { "yes" } else { "no" }.to_string()),
        field("Study days", days),
    ];

    let table = Table::new(rows, [Constraint::Length(18), Constraint::Min(10)]).block(
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(format!(" {} ", module.name), bold_style)),
    );
    f.render_widget(table, chunks[0]);

    let input = Paragraph::new(details.add_time.time.value.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Add time (HH:MM) "),
    );
    f.render_widget(input, chunks[1]);

    f.render_widget(key_help(details), chunks[2]);
}

fn field(label: &'static str, value: String) -> Row<'static> {
    Row::new(vec![label.to_string(), value])
}

fn key_help(details: &ModuleDetails) -> Paragraph<'static> {
    if details.confirm_delete {
        Paragraph::new(Span::styled(
            "Press D again to delete this module, any other key to cancel",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ))
    } else {
        Paragraph::new(Span::styled(
            "enter add time  t start/stop  R reset  A (de)activate  D delete  esc back",
            Style::default().add_modifier(Modifier::DIM),
        ))
    }
}

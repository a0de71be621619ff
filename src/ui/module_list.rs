use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::{
    app::App,
    module::Module,
    time_format::format_seconds,
    ui::fit,
    view_model::{ListRow, ModuleListViewModel},
};

const TIME_WIDTH: usize = 10;
const MARKER_WIDTH: usize = 4;

pub fn render_module_list(app: &App, f: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // list
            Constraint::Length(1), // key help
        ])
        .split(area);

    let title = if app.list.show_inactive() {
        " Modules (incl. inactive) "
    } else {
        " Modules "
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner_width = block.inner(chunks[0]).width as usize;

    if app.list.is_loading() {
        f.render_widget(placeholder("Loading modules…", block), chunks[0]);
    } else if app.has_modules == Some(false) || app.list.buckets().is_empty() {
        f.render_widget(
            placeholder("No modules yet. Press n to create one.", block),
            chunks[0],
        );
    } else {
        let items: Vec<ListItem> = app
            .list
            .visible_rows()
            .into_iter()
            .map(|row| list_item(&app.list, row, inner_width))
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        let mut state = ListState::default();
        state.select(Some(app.selected));
        f.render_stateful_widget(list, chunks[0], &mut state);
    }

    let help = Paragraph::new(Span::styled(
        "↑/↓ move  space start/stop  enter open  i inactive  n new  r reload  o web  x dismiss  q quit",
        Style::default().add_modifier(Modifier::DIM),
    ));
    f.render_widget(help, chunks[1]);
}

fn placeholder<'a>(text: &'a str, block: Block<'a>) -> Paragraph<'a> {
    Paragraph::new(Span::styled(
        text,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .block(block)
}

fn list_item(list: &ModuleListViewModel, row: ListRow, width: usize) -> ListItem<'static> {
    match row {
        ListRow::Bucket(i) => {
            let (level, modules) = &list.buckets()[i];
            let arrow = if list.is_open(i) { "▼" } else { "▶" };
            ListItem::new(Line::from(Span::styled(
                format!("{arrow} Semester {level} ({})", modules.len()),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )))
        }
        ListRow::Module(i, j) => match list.module_at(i, j) {
            Some(module) => module_line(list, module, width),
            None => ListItem::new(""),
        },
    }
}

fn module_line(list: &ModuleListViewModel, module: &Module, width: usize) -> ListItem<'static> {
    let running = list.is_running(&module.id);
    let enabled = list.is_enabled(&module.id);

    let marker = if running { "  ● " } else { "    " };
    let mut name = module.name.clone();
    if !module.active {
        name.push_str(" (inactive)");
    }
    let name_width = width.saturating_sub(MARKER_WIDTH + TIME_WIDTH);
    let time = format!("{:>TIME_WIDTH$}", format_seconds(list.displayed_seconds(module) as i64));

    let mut style = Style::default();
    if running {
        style = style.fg(Color::Green).add_modifier(Modifier::BOLD);
    } else if !enabled || !module.active {
        style = style.add_modifier(Modifier::DIM);
    }
    let time_style = if module.exceeds_self_study_workload() {
        style.fg(Color::Yellow)
    } else {
        style
    };

    ListItem::new(Line::from(vec![
        Span::styled(marker, style),
        Span::styled(fit(&name, name_width), style),
        Span::styled(time, time_style),
    ]))
}

pub mod details;
pub mod module_list;
pub mod new_module;
pub mod screen;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::Paragraph,
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::{
    app::App,
    notify::NotificationKind,
    ui::screen::current_screen,
};

const HORIZONTAL_MARGIN: u16 = 2;

pub fn draw(app: &App, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // screen
            Constraint::Length(1), // notification
        ])
        .split(f.area());

    current_screen(&app.state).render(app, f, chunks[0]);
    render_notification(app, f, chunks[1]);
}

fn render_notification(app: &App, f: &mut Frame, area: Rect) {
    let Some(notification) = app.notifier.current() else {
        return;
    };

    let style = match notification.kind {
        NotificationKind::Success => Style::default().fg(Color::Green),
        NotificationKind::Error => Style::default().fg(Color::Red),
    }
    .add_modifier(Modifier::BOLD);

    f.render_widget(
        Paragraph::new(Span::styled(notification.message.clone(), style)),
        area,
    );
}

/// Cut `text` to `width` display columns and pad it so columns line up.
pub(crate) fn fit(text: &str, width: usize) -> String {
    if text.width() <= width {
        return format!("{}{}", text, " ".repeat(width - text.width()));
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

use ratatui::{layout::Rect, Frame};

use crate::{
    app::{App, AppState},
    ui::{
        details::render_details, module_list::render_module_list, new_module::render_new_module,
    },
};

/// A UI Screen boundary: responsible for rendering one application state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame, area: Rect);
}

/// Semester buckets with their modules and timers
pub struct ModuleListScreen;

impl Screen for ModuleListScreen {
    fn render(&self, app: &App, f: &mut Frame, area: Rect) {
        render_module_list(app, f, area);
    }
}

pub struct DetailsScreen;

impl Screen for DetailsScreen {
    fn render(&self, app: &App, f: &mut Frame, area: Rect) {
        render_details(app, f, area);
    }
}

pub struct NewModuleScreen;

impl Screen for NewModuleScreen {
    fn render(&self, app: &App, f: &mut Frame, area: Rect) {
        render_new_module(app, f, area);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::ModuleList => Box::new(ModuleListScreen),
        AppState::Details => Box::new(DetailsScreen),
        AppState::NewModule => Box::new(NewModuleScreen),
    }
}

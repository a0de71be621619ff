use std::sync::Arc;

use chrono::Datelike;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::clock::Clock;
use crate::details::ModuleDetails;
use crate::forms::NewModuleDraft;
use crate::local_store::LocalStore;
use crate::notify::Notifier;
use crate::runtime::AppEvent;
use crate::view_model::{ListRow, ModuleListViewModel};
use crate::worker::{ApiCommand, ApiOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    ModuleList,
    Details,
    NewModule,
}

pub struct App {
    pub list: ModuleListViewModel,
    pub state: AppState,
    /// Index into the list's visible rows.
    pub selected: usize,
    pub details: Option<ModuleDetails>,
    pub new_module: NewModuleDraft,
    pub notifier: Notifier,
    /// None until the backend answered the has-module check.
    pub has_modules: Option<bool>,
    pub web_url: Option<String>,
    pub should_quit: bool,
    clock: Arc<dyn Clock>,
}

impl App {
    pub fn new(store: Arc<dyn LocalStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            list: ModuleListViewModel::new(store, clock.clone()),
            state: AppState::ModuleList,
            selected: 0,
            details: None,
            new_module: NewModuleDraft::default(),
            notifier: Notifier::new(clock.clone()),
            has_modules: None,
            web_url: None,
            should_quit: false,
            clock,
        }
    }

    /// Backend calls to issue when the app starts.
    pub fn startup_commands(&self) -> Vec<ApiCommand> {
        vec![ApiCommand::CheckHasModule, ApiCommand::LoadModules]
    }

    pub fn current_year(&self) -> i32 {
        self.clock.now().year()
    }

    pub fn selected_row(&self) -> Option<ListRow> {
        self.list.visible_rows().get(self.selected).copied()
    }

    pub fn on_tick(&mut self) {
        self.list.on_tick();
        self.notifier.expire();
    }

    /// Route one event from the runner; returns backend calls for the worker.
    pub fn on_event(&mut self, event: AppEvent) -> Vec<ApiCommand> {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Tick => {
                self.on_tick();
                vec![]
            }
            AppEvent::Resize => vec![],
            AppEvent::Api(outcome) => self.handle_api(outcome),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<ApiCommand> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return vec![];
        }

        match self.state {
            AppState::ModuleList => self.handle_list_key(key),
            AppState::Details => self.handle_details_key(key),
            AppState::NewModule => self.handle_new_module_key(key),
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> Vec<ApiCommand> {
        let row_count = self.list.visible_rows().len();

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < row_count {
                    self.selected += 1;
                }
            }
            KeyCode::Home => self.selected = 0,
            KeyCode::Char(' ') | KeyCode::Char('t') => match self.selected_row() {
                Some(ListRow::Bucket(i)) => self.toggle_panel(i),
                Some(ListRow::Module(i, j)) => return self.list.toggle_timer_at(i, j),
                None => {}
            },
            KeyCode::Enter => match self.selected_row() {
                Some(ListRow::Bucket(i)) => self.toggle_panel(i),
                Some(ListRow::Module(i, j)) => {
                    if let Some(module) = self.list.module_at(i, j) {
                        self.details = Some(ModuleDetails::new(module.clone()));
                        self.state = AppState::Details;
                    }
                }
                None => {}
            },
            KeyCode::Char('i') => {
                self.list.toggle_show_inactive();
                self.clamp_selection();
            }
            KeyCode::Char('n') => {
                self.new_module = NewModuleDraft::default();
                self.state = AppState::NewModule;
            }
            KeyCode::Char('r') => return vec![ApiCommand::LoadModules],
            KeyCode::Char('o') => self.open_web(),
            KeyCode::Char('x') => self.notifier.dismiss(),
            _ => {}
        }
        vec![]
    }

    fn toggle_panel(&mut self, bucket: usize) {
        self.list.toggle_panel(bucket);
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let rows = self.list.visible_rows().len();
        self.selected = self.selected.min(rows.saturating_sub(1));
    }

    fn handle_details_key(&mut self, key: KeyEvent) -> Vec<ApiCommand> {
        let Some(details) = self.details.as_mut() else {
            self.state = AppState::ModuleList;
            return vec![];
        };

        if key.code != KeyCode::Char('D') {
            details.confirm_delete = false;
        }

        match key.code {
            KeyCode::Esc => {
                self.state = AppState::ModuleList;
                self.details = None;
            }
            KeyCode::Char(c) if c.is_ascii_digit() || c == ':' => details.add_time.time.push(c),
            KeyCode::Backspace => details.add_time.time.backspace(),
            KeyCode::Enter => match details.submit_add_time() {
                Ok(command) => return vec![command],
                Err(e) => self.notifier.error(e.to_string()),
            },
            KeyCode::Char('R') => return vec![details.reset_timer()],
            KeyCode::Char('A') => return vec![details.toggle_active()],
            KeyCode::Char('D') => {
                if self.list.is_running(details.module_id()) {
                    details.confirm_delete = false;
                    self.notifier
                        .error("Stop the running timer before deleting this module");
                } else if let Some(command) = details.delete_module() {
                    return vec![command];
                }
            }
            KeyCode::Char('t') => {
                let id = details.module_id().to_string();
                return self.list.toggle_timer(&id);
            }
            _ => {}
        }
        vec![]
    }

    fn handle_new_module_key(&mut self, key: KeyEvent) -> Vec<ApiCommand> {
        match key.code {
            KeyCode::Esc => self.state = AppState::ModuleList,
            KeyCode::Tab | KeyCode::Down => self.new_module.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.new_module.prev_field(),
            KeyCode::Backspace => self.new_module.focused_mut().backspace(),
            KeyCode::Char(c) => self.new_module.focused_mut().push(c),
            KeyCode::Enter => match self.new_module.validate() {
                Ok(form) => return vec![ApiCommand::CreateModule(form)],
                Err(e) => self.notifier.error(e.to_string()),
            },
            _ => {}
        }
        vec![]
    }

    fn open_web(&mut self) {
        match self.web_url.clone() {
            Some(url) if webbrowser::Browser::is_available() => {
                if let Err(e) = webbrowser::open(&url) {
                    self.notifier.error(format!("Could not open browser: {e}"));
                }
            }
            Some(_) => self.notifier.error("No browser available"),
            None => self.notifier.error("No web url configured"),
        }
    }

    /// Fold a backend answer into the state; may ask for follow-up calls.
    pub fn handle_api(&mut self, outcome: ApiOutcome) -> Vec<ApiCommand> {
        match outcome {
            ApiOutcome::ModulesLoaded(Ok(buckets)) => {
                let commands = self.list.apply_modules(buckets);
                self.clamp_selection();
                if let Some(details) = self.details.as_mut() {
                    if let Some(module) = self.list.find_module(details.module_id()) {
                        details.refresh(module.clone());
                    }
                }
                commands
            }
            ApiOutcome::ModulesLoaded(Err(e)) => {
                self.notifier.error(format!("Modules could not be loaded: {e}"));
                vec![]
            }
            ApiOutcome::HasModule(Ok(has)) => {
                self.has_modules = Some(has);
                vec![]
            }
            ApiOutcome::HasModule(Err(e)) => {
                log::warn!("has-module check failed: {e}");
                vec![]
            }
            ApiOutcome::SecondsLoaded {
                module_id,
                result: Ok(seconds),
            } => {
                self.list.on_seconds_loaded(&module_id, seconds);
                vec![]
            }
            ApiOutcome::SecondsLoaded {
                result: Err(e), ..
            } => {
                self.notifier
                    .error(format!("Learned time could not be loaded: {e}"));
                vec![]
            }
            ApiOutcome::TimerSubmitted(Ok(())) => {
                self.notifier.success("Study time saved");
                vec![ApiCommand::LoadModules]
            }
            ApiOutcome::TimerSubmitted(Err(e)) => {
                self.notifier
                    .error(format!("Study time could not be saved: {e}"));
                vec![]
            }
            ApiOutcome::TimeAdded(Ok(())) => {
                if let Some(details) = self.details.as_mut() {
                    details.add_time.reset();
                }
                self.notifier.success("Time added");
                vec![ApiCommand::LoadModules]
            }
            ApiOutcome::TimeAdded(Err(e)) => {
                self.notifier.error(format!("Time could not be added: {e}"));
                vec![]
            }
            ApiOutcome::TimerReset {
                module_id,
                result: Ok(()),
            } => {
                self.notifier.success("Timer reset");
                let mut commands = vec![ApiCommand::LoadModules];
                if self.list.is_running(&module_id) {
                    commands.push(ApiCommand::FetchSeconds(module_id));
                }
                commands
            }
            ApiOutcome::TimerReset { result: Err(e), .. } => {
                self.notifier.error(format!("Timer could not be reset: {e}"));
                vec![]
            }
            ApiOutcome::ActiveToggled(Ok(())) => {
                self.notifier.success("Module activity changed");
                vec![ApiCommand::LoadModules]
            }
            ApiOutcome::ActiveToggled(Err(e)) => {
                self.notifier
                    .error(format!("Module activity could not be changed: {e}"));
                vec![]
            }
            ApiOutcome::ModuleDeleted(Ok(())) => {
                self.notifier.success("Module deleted");
                self.details = None;
                self.state = AppState::ModuleList;
                vec![ApiCommand::LoadModules]
            }
            ApiOutcome::ModuleDeleted(Err(e)) => {
                self.notifier
                    .error(format!("Module could not be deleted: {e}"));
                vec![]
            }
            ApiOutcome::ModuleCreated(Ok(())) => {
                self.notifier.success("Module created");
                self.new_module = NewModuleDraft::default();
                self.state = AppState::ModuleList;
                self.has_modules = Some(true);
                vec![ApiCommand::LoadModules]
            }
            ApiOutcome::ModuleCreated(Err(e)) => {
                self.notifier
                    .error(format!("Module could not be created: {e}"));
                vec![]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, SemesterBuckets};
    use crate::clock::ManualClock;
    use crate::local_store::MemoryLocalStore;
    use crate::module::fixtures::module;
    use crate::notify::NotificationKind;
    use assert_matches::assert_matches;
    use std::collections::BTreeMap;

    fn app() -> (App, ManualClock) {
        let clock = ManualClock::default();
        let app = App::new(Arc::new(MemoryLocalStore::new()), Arc::new(clock.clone()));
        (app, clock)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn loaded() -> (App, ManualClock) {
        let (mut app, clock) = app();
        let mut buckets: SemesterBuckets = BTreeMap::new();
        buckets.insert(2, vec![module("x", 2, true), module("y", 2, true)]);
        app.handle_api(ApiOutcome::ModulesLoaded(Ok(buckets)));
        (app, clock)
    }

    fn failure() -> ApiError {
        ApiError::Status {
            status: 500,
            path: "/add-seconds".into(),
        }
    }

    #[test]
    fn startup_asks_for_modules() {
        let (app, _) = app();
        assert!(app.startup_commands().contains(&ApiCommand::LoadModules));
    }

    #[test]
    fn space_on_module_starts_and_stops_timer() {
        let (mut app, clock) = loaded();
        app.handle_key(key(KeyCode::Down));

        let commands = app.handle_key(key(KeyCode::Char(' ')));
        assert_eq!(commands, vec![ApiCommand::FetchSeconds("x".into())]);

        clock.advance_secs(4);
        app.on_tick();
        let commands = app.handle_key(key(KeyCode::Char(' ')));
        assert_matches!(
            commands.as_slice(),
            [ApiCommand::SubmitTimer(req)] if req.elapsed_seconds == 4
        );
    }

    #[test]
    fn other_module_cannot_start_while_running() {
        let (mut app, _) = loaded();
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Char(' ')));
        app.handle_key(key(KeyCode::Down));
        assert!(app.handle_key(key(KeyCode::Char(' '))).is_empty());
        assert_eq!(app.list.active().unwrap().module_id, "x");
    }

    #[test]
    fn enter_opens_details_and_esc_returns() {
        let (mut app, _) = loaded();
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.state, AppState::Details);
        assert_eq!(app.details.as_ref().unwrap().module_id(), "x");

        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.state, AppState::ModuleList);
        assert!(app.details.is_none());
    }

    #[test]
    fn details_add_time_validation_is_reported() {
        let (mut app, _) = loaded();
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Enter));

        assert!(app.handle_key(key(KeyCode::Enter)).is_empty());
        assert_eq!(
            app.notifier.current().unwrap().kind,
            NotificationKind::Error
        );

        for c in "00:45".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        let commands = app.handle_key(key(KeyCode::Enter));
        assert_matches!(
            commands.as_slice(),
            [ApiCommand::AddTime(req)] if req.module_id == "x" && req.time == "00:45"
        );

        let follow_up = app.handle_api(ApiOutcome::TimeAdded(Ok(())));
        assert_eq!(follow_up, vec![ApiCommand::LoadModules]);
        assert!(app.details.as_ref().unwrap().add_time.time.value.is_empty());
    }

    #[test]
    fn delete_requires_two_presses() {
        let (mut app, _) = loaded();
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Enter));

        assert!(app.handle_key(key(KeyCode::Char('D'))).is_empty());
        assert_eq!(
            app.handle_key(key(KeyCode::Char('D'))),
            vec![ApiCommand::DeleteModule("x".into())]
        );

        app.handle_api(ApiOutcome::ModuleDeleted(Ok(())));
        assert_eq!(app.state, AppState::ModuleList);
    }

    #[test]
    fn running_module_cannot_be_deleted() {
        let (mut app, _) = loaded();
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Char(' ')));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.state, AppState::Details);

        assert!(app.handle_key(key(KeyCode::Char('D'))).is_empty());
        assert!(app.handle_key(key(KeyCode::Char('D'))).is_empty());
        assert!(!app.details.as_ref().unwrap().confirm_delete);
        assert_eq!(
            app.notifier.current().unwrap().kind,
            NotificationKind::Error
        );

        // once stopped, the two-press delete works again
        app.handle_key(key(KeyCode::Char('t')));
        app.handle_key(key(KeyCode::Char('D')));
        assert_eq!(
            app.handle_key(key(KeyCode::Char('D'))),
            vec![ApiCommand::DeleteModule("x".into())]
        );
    }

    #[test]
    fn module_deleted_elsewhere_frees_other_timers() {
        let (mut app, _) = loaded();
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Char(' ')));

        let mut buckets: SemesterBuckets = BTreeMap::new();
        buckets.insert(2, vec![module("y", 2, true)]);
        app.handle_api(ApiOutcome::ModulesLoaded(Ok(buckets)));

        assert!(app.list.active().is_none());
        assert_eq!(
            app.list.toggle_timer("y"),
            vec![ApiCommand::FetchSeconds("y".into())]
        );
    }

    #[test]
    fn reset_of_running_module_refetches_baseline() {
        let (mut app, clock) = loaded();
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Char(' ')));
        app.handle_api(ApiOutcome::SecondsLoaded {
            module_id: "x".into(),
            result: Ok(500),
        });
        clock.advance_secs(7);
        app.on_tick();

        let follow_up = app.handle_api(ApiOutcome::TimerReset {
            module_id: "x".into(),
            result: Ok(()),
        });
        assert_eq!(
            follow_up,
            vec![ApiCommand::LoadModules, ApiCommand::FetchSeconds("x".into())]
        );

        app.handle_api(ApiOutcome::SecondsLoaded {
            module_id: "x".into(),
            result: Ok(0),
        });
        let x = app.list.find_module("x").unwrap().clone();
        assert_eq!(app.list.displayed_seconds(&x), 7);

        // resetting an idle module only reloads
        assert_eq!(
            app.handle_api(ApiOutcome::TimerReset {
                module_id: "y".into(),
                result: Ok(()),
            }),
            vec![ApiCommand::LoadModules]
        );
    }

    #[test]
    fn new_module_form_flow() {
        let (mut app, _) = loaded();
        app.handle_key(key(KeyCode::Char('n')));
        assert_eq!(app.state, AppState::NewModule);

        for (i, value) in ["Logik", "5", "30", "120"].iter().enumerate() {
            if i > 0 {
                app.handle_key(key(KeyCode::Tab));
            }
            for c in value.chars() {
                app.handle_key(key(KeyCode::Char(c)));
            }
        }

        let commands = app.handle_key(key(KeyCode::Enter));
        assert_matches!(
            commands.as_slice(),
            [ApiCommand::CreateModule(form)] if form.name == "Logik" && form.self_study_hours == 120
        );

        app.handle_api(ApiOutcome::ModuleCreated(Ok(())));
        assert_eq!(app.state, AppState::ModuleList);
        assert_eq!(app.has_modules, Some(true));
    }

    #[test]
    fn failed_submission_notifies_without_retry() {
        let (mut app, _) = loaded();
        let follow_up = app.handle_api(ApiOutcome::TimerSubmitted(Err(failure())));
        assert!(follow_up.is_empty());
        assert_eq!(
            app.notifier.current().unwrap().kind,
            NotificationKind::Error
        );
    }

    #[test]
    fn collapsing_bucket_clamps_selection() {
        let (mut app, _) = loaded();
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.selected, 2);

        app.selected = 0;
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.list.visible_rows().len(), 1);
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn notifications_expire_on_tick() {
        let (mut app, clock) = loaded();
        app.handle_api(ApiOutcome::TimerReset {
            module_id: "x".into(),
            result: Ok(()),
        });
        assert!(app.notifier.current().is_some());
        clock.advance_secs(Notifier::DEFAULT_TTL_SECS);
        app.on_tick();
        assert!(app.notifier.current().is_none());
    }

    #[test]
    fn events_are_routed() {
        let (mut app, clock) = loaded();
        app.on_event(AppEvent::Key(key(KeyCode::Down)));
        let commands = app.on_event(AppEvent::Key(key(KeyCode::Char(' '))));
        assert_eq!(commands, vec![ApiCommand::FetchSeconds("x".into())]);

        clock.advance_secs(3);
        app.on_event(AppEvent::Tick);
        assert_eq!(app.list.active().unwrap().delta, 3);
    }

    #[test]
    fn ctrl_c_quits_from_any_screen() {
        let (mut app, _) = loaded();
        app.handle_key(key(KeyCode::Char('n')));
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }
}

use std::collections::{BTreeMap, BTreeSet};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use studytrack::api::{ApiError, ModuleApi, SemesterBuckets};
use studytrack::app::App;
use studytrack::clock::ManualClock;
use studytrack::local_store::{FileLocalStore, LocalStore};
use studytrack::module::{AddTimeRequest, Module, ModuleSelectEntry, NewModuleForm, SemesterType};
use studytrack::notify::NotificationKind;
use studytrack::runtime::{AppEvent, FixedTicker, Runner, TestEventSource};
use studytrack::tracker::TimerRequest;
use studytrack::worker::{spawn_worker, ApiCommand};

// In-memory backend shared between the worker thread and the assertions.
#[derive(Default)]
struct RecordingApi {
    modules: Mutex<Vec<Module>>,
    added: Mutex<Vec<TimerRequest>>,
}

impl RecordingApi {
    fn with_modules(modules: Vec<Module>) -> Self {
        Self {
            modules: Mutex::new(modules),
            added: Mutex::new(Vec::new()),
        }
    }
}

impl ModuleApi for RecordingApi {
    fn modules_by_semester(&self) -> Result<SemesterBuckets, ApiError> {
        let mut buckets: SemesterBuckets = BTreeMap::new();
        for m in self.modules.lock().unwrap().iter().filter(|m| m.active) {
            buckets.entry(m.semester_level).or_default().push(m.clone());
        }
        Ok(buckets)
    }

    fn all_modules(&self) -> Result<Vec<Module>, ApiError> {
        Ok(self.modules.lock().unwrap().clone())
    }

    fn seconds_for_module(&self, module_id: &str) -> Result<u64, ApiError> {
        Ok(self
            .modules
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == module_id)
            .map(|m| m.seconds_learned)
            .unwrap_or_default())
    }

    fn add_seconds(&self, request: &TimerRequest) -> Result<(), ApiError> {
        if let Some(m) = self
            .modules
            .lock()
            .unwrap()
            .iter_mut()
            .find(|m| m.id == request.module_id)
        {
            m.seconds_learned += request.elapsed_seconds;
        }
        self.added.lock().unwrap().push(request.clone());
        Ok(())
    }

    fn add_time(&self, _request: &AddTimeRequest) -> Result<(), ApiError> {
        Ok(())
    }

    fn create_module(&self, _form: &NewModuleForm) -> Result<(), ApiError> {
        Ok(())
    }

    fn reset_timer(&self, _module_id: &str) -> Result<(), ApiError> {
        Ok(())
    }

    fn toggle_active(&self, _module_id: &str) -> Result<(), ApiError> {
        Ok(())
    }

    fn delete_module(&self, _module_id: &str) -> Result<(), ApiError> {
        Ok(())
    }

    fn module_select_data(&self) -> Result<Vec<ModuleSelectEntry>, ApiError> {
        Ok(vec![])
    }

    fn has_module(&self) -> Result<bool, ApiError> {
        Ok(!self.modules.lock().unwrap().is_empty())
    }
}

fn module(id: &str, level: u32, seconds: u64) -> Module {
    Module {
        id: id.to_string(),
        name: format!("Module {id}"),
        seconds_learned: seconds,
        credits: 5,
        contact_hours: 60,
        self_study_hours: 90,
        semester_level: level,
        semester_type: Some(SemesterType::Summer),
        active: true,
        study_days: BTreeSet::new(),
    }
}

fn key(code: KeyCode) -> AppEvent {
    AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

struct Harness {
    app: App,
    runner: Runner<TestEventSource, FixedTicker>,
    events: Sender<AppEvent>,
    worker: Sender<ApiCommand>,
}

impl Harness {
    fn new(api: Arc<RecordingApi>, store: Arc<dyn LocalStore>, clock: ManualClock) -> Self {
        let (tx, rx) = mpsc::channel();
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(5)),
        );
        let worker = spawn_worker(api, tx.clone());
        let app = App::new(store, Arc::new(clock));
        let mut harness = Self {
            app,
            runner,
            events: tx,
            worker,
        };
        let startup = harness.app.startup_commands();
        harness.dispatch(startup);
        harness
    }

    fn dispatch(&self, commands: Vec<ApiCommand>) {
        for command in commands {
            self.worker.send(command).unwrap();
        }
    }

    fn send(&self, event: AppEvent) {
        self.events.send(event).unwrap();
    }

    /// Drive the loop until `done` holds, bounded so a broken flow fails instead of hanging.
    fn run_until(&mut self, done: impl Fn(&App) -> bool) -> bool {
        for _ in 0..1_000u32 {
            let event = self.runner.step();
            let commands = self.app.on_event(event);
            self.dispatch(commands);
            if done(&self.app) {
                return true;
            }
        }
        false
    }
}

#[test]
fn headless_timer_session_is_submitted_and_reloaded() {
    let api = Arc::new(RecordingApi::with_modules(vec![
        module("alg", 2, 600),
        module("ana", 1, 0),
    ]));
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn LocalStore> = Arc::new(FileLocalStore::open(dir.path().join("local.json")));
    let clock = ManualClock::default();
    let mut h = Harness::new(api.clone(), store, clock.clone());

    assert!(h.run_until(|app| !app.list.is_loading() && app.has_modules == Some(true)));

    // row 0 is the semester 2 header, row 1 its only module
    h.send(key(KeyCode::Down));
    h.send(key(KeyCode::Char(' ')));
    assert!(h.run_until(|app| app.list.active().is_some_and(|a| a.baseline == 600)));

    clock.advance_secs(90);
    assert!(h.run_until(|app| app.list.active().is_some_and(|a| a.delta == 90)));

    h.send(key(KeyCode::Char(' ')));
    assert!(h.run_until(|app| {
        app.notifier
            .current()
            .is_some_and(|n| n.kind == NotificationKind::Success)
    }));
    assert!(h.run_until(|app| {
        app.list
            .find_module("alg")
            .is_some_and(|m| m.seconds_learned == 690)
    }));

    assert!(h.app.list.active().is_none());
    assert_eq!(
        api.added.lock().unwrap().as_slice(),
        &[TimerRequest {
            module_id: "alg".into(),
            elapsed_seconds: 90,
        }]
    );
}

#[test]
fn headless_session_survives_restart() {
    let api = Arc::new(RecordingApi::with_modules(vec![module("os", 3, 120)]));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("local.json");
    let clock = ManualClock::default();

    {
        let store: Arc<dyn LocalStore> = Arc::new(FileLocalStore::open(&path));
        let mut h = Harness::new(api.clone(), store, clock.clone());
        assert!(h.run_until(|app| !app.list.is_loading()));
        h.send(key(KeyCode::Down));
        h.send(key(KeyCode::Char(' ')));
        assert!(h.run_until(|app| app.list.is_running("os")));
    }

    clock.advance_secs(300);

    let store: Arc<dyn LocalStore> = Arc::new(FileLocalStore::open(&path));
    let mut h = Harness::new(api.clone(), store, clock.clone());
    assert!(h.run_until(|app| {
        app.list
            .active()
            .is_some_and(|a| a.module_id == "os" && a.delta == 300)
    }));

    let displayed = h
        .app
        .list
        .find_module("os")
        .map(|m| h.app.list.displayed_seconds(m));
    assert_eq!(displayed, Some(420));
}

#[test]
fn headless_empty_backend_reports_no_modules() {
    let api = Arc::new(RecordingApi::default());
    let store: Arc<dyn LocalStore> = Arc::new(studytrack::local_store::MemoryLocalStore::new());
    let mut h = Harness::new(api, store, ManualClock::default());

    assert!(h.run_until(|app| app.has_modules == Some(false) && !app.list.is_loading()));
    assert!(h.app.list.buckets().is_empty());
}

use std::collections::BTreeMap;
use std::sync::Arc;

use itertools::Itertools;

use crate::api::SemesterBuckets;
use crate::clock::Clock;
use crate::local_store::{LocalStore, DEACTIVATED_VISIBLE_KEY};
use crate::module::Module;
use crate::tracker::SessionTracker;
use crate::worker::ApiCommand;

/// The one study session allowed at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub module_id: String,
    /// Seconds learned before this session, as reported by the backend.
    pub baseline: u64,
    /// Seconds since the session started, refreshed on every tick.
    pub delta: u64,
}

/// A line of the module list: a semester header or a module below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListRow {
    Bucket(usize),
    Module(usize, usize),
}

pub struct ModuleListViewModel {
    store: Arc<dyn LocalStore>,
    tracker: SessionTracker,
    all: SemesterBuckets,
    /// Visible modules per bucket, highest semester level first.
    displayed: Vec<(u32, Vec<Module>)>,
    open_panels: Vec<bool>,
    show_inactive: bool,
    loading: bool,
    active: Option<ActiveSession>,
}

impl ModuleListViewModel {
    pub fn new(store: Arc<dyn LocalStore>, clock: Arc<dyn Clock>) -> Self {
        let show_inactive = match store.get(DEACTIVATED_VISIBLE_KEY) {
            Some(v) => v == "true",
            None => {
                if let Err(e) = store.set(DEACTIVATED_VISIBLE_KEY, "false") {
                    log::warn!("could not persist visibility flag: {e}");
                }
                false
            }
        };

        Self {
            tracker: SessionTracker::new(store.clone(), clock),
            store,
            all: BTreeMap::new(),
            displayed: Vec::new(),
            open_panels: Vec::new(),
            show_inactive,
            loading: true,
            active: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn show_inactive(&self) -> bool {
        self.show_inactive
    }

    pub fn active(&self) -> Option<&ActiveSession> {
        self.active.as_ref()
    }

    /// Replace the module data with a fresh backend answer.
    pub fn apply_modules(&mut self, buckets: SemesterBuckets) -> Vec<ApiCommand> {
        self.all = buckets;
        self.loading = false;

        let bucket_count = self.all.len();
        if self.open_panels.len() != bucket_count {
            self.open_panels = (0..bucket_count).map(|i| i == 0).collect();
        }
        self.drop_vanished_session();
        self.recompute_displayed();

        if self.active.is_none() {
            return self.resume_persisted();
        }
        vec![]
    }

    /// A running module missing from fresh data was deleted elsewhere; its
    /// timer is discarded so the other cells become usable again.
    fn drop_vanished_session(&mut self) {
        let vanished = self
            .active
            .as_ref()
            .is_some_and(|a| self.find_module(&a.module_id).is_none());
        if !vanished {
            return;
        }
        if let Some(session) = self.active.take() {
            log::warn!(
                "module {} no longer exists, discarding its running timer",
                session.module_id
            );
            self.tracker.stop();
        }
    }

    fn resume_persisted(&mut self) -> Vec<ApiCommand> {
        let resumed = self
            .all
            .values()
            .flatten()
            .find(|m| self.tracker.resume(&m.id))
            .map(|m| (m.id.clone(), m.seconds_learned));

        match resumed {
            Some((module_id, baseline)) => {
                self.active = Some(ActiveSession {
                    module_id: module_id.clone(),
                    baseline,
                    delta: self.tracker.tick(),
                });
                vec![ApiCommand::FetchSeconds(module_id)]
            }
            None => vec![],
        }
    }

    fn recompute_displayed(&mut self) {
        let show_inactive = self.show_inactive;
        let running = self.active.as_ref().map(|a| a.module_id.as_str());
        self.displayed = self
            .all
            .iter()
            .rev()
            .map(|(level, modules)| {
                // the running module stays listed so it can always be stopped
                let visible = modules
                    .iter()
                    .filter(|m| show_inactive || m.active || running == Some(m.id.as_str()))
                    .cloned()
                    .collect_vec();
                (*level, visible)
            })
            .collect();
    }

    /// Buckets in display order with their visible modules.
    pub fn buckets(&self) -> &[(u32, Vec<Module>)] {
        &self.displayed
    }

    pub fn modules_for_bucket(&self, level: u32) -> &[Module] {
        self.displayed
            .iter()
            .find(|(l, _)| *l == level)
            .map(|(_, modules)| modules.as_slice())
            .unwrap_or_default()
    }

    pub fn module_at(&self, row: usize, col: usize) -> Option<&Module> {
        self.displayed.get(row).and_then(|(_, m)| m.get(col))
    }

    pub fn find_module(&self, module_id: &str) -> Option<&Module> {
        self.all.values().flatten().find(|m| m.id == module_id)
    }

    pub fn is_open(&self, bucket: usize) -> bool {
        self.open_panels.get(bucket).copied().unwrap_or(false)
    }

    pub fn toggle_panel(&mut self, bucket: usize) {
        if let Some(open) = self.open_panels.get_mut(bucket) {
            *open = !*open;
        }
    }

    pub fn toggle_show_inactive(&mut self) {
        self.show_inactive = !self.show_inactive;
        if let Err(e) = self
            .store
            .set(DEACTIVATED_VISIBLE_KEY, &self.show_inactive.to_string())
        {
            log::warn!("could not persist visibility flag: {e}");
        }
        self.recompute_displayed();
    }

    /// Whether the timer of `module_id` can be toggled right now.
    pub fn is_enabled(&self, module_id: &str) -> bool {
        self.active
            .as_ref()
            .map_or(true, |a| a.module_id == module_id)
    }

    pub fn is_cell_enabled(&self, row: usize, col: usize) -> bool {
        self.module_at(row, col)
            .is_some_and(|m| self.is_enabled(&m.id))
    }

    pub fn is_running(&self, module_id: &str) -> bool {
        self.active.as_ref().is_some_and(|a| a.module_id == module_id)
    }

    pub fn toggle_timer_at(&mut self, row: usize, col: usize) -> Vec<ApiCommand> {
        match self.module_at(row, col) {
            Some(module) => {
                let id = module.id.clone();
                self.toggle_timer(&id)
            }
            None => vec![],
        }
    }

    /// Start the timer of `module_id` or stop it when it is the running one.
    /// Returns the backend calls to issue; does nothing while another timer runs.
    pub fn toggle_timer(&mut self, module_id: &str) -> Vec<ApiCommand> {
        if !self.is_enabled(module_id) {
            return vec![];
        }

        if self.active.is_none() {
            if let Err(e) = self.tracker.start(module_id) {
                log::warn!("{e}");
                return vec![];
            }
            let baseline = self
                .find_module(module_id)
                .map(|m| m.seconds_learned)
                .unwrap_or_default();
            self.active = Some(ActiveSession {
                module_id: module_id.to_string(),
                baseline,
                delta: 0,
            });
            return vec![ApiCommand::FetchSeconds(module_id.to_string())];
        }

        let Some(session) = self.active.take() else {
            return vec![];
        };
        match self.tracker.stop() {
            Some(request) => {
                let total = session.baseline + request.elapsed_seconds;
                if let Some(module) = self
                    .all
                    .values_mut()
                    .flatten()
                    .find(|m| m.id == session.module_id)
                {
                    module.seconds_learned = total;
                }
                self.recompute_displayed();
                vec![ApiCommand::SubmitTimer(request)]
            }
            None => vec![],
        }
    }

    /// Authoritative seconds for the running module arrived.
    pub fn on_seconds_loaded(&mut self, module_id: &str, seconds: u64) {
        if let Some(active) = self.active.as_mut().filter(|a| a.module_id == module_id) {
            active.baseline = seconds;
        }
    }

    pub fn on_tick(&mut self) {
        let delta = self.tracker.tick();
        if let Some(active) = self.active.as_mut() {
            active.delta = delta;
        }
    }

    /// The value rendered for a module's learned time.
    pub fn displayed_seconds(&self, module: &Module) -> u64 {
        match &self.active {
            Some(a) if a.module_id == module.id => a.baseline + a.delta,
            _ => module.seconds_learned,
        }
    }

    /// Rows currently visible, honouring collapsed buckets.
    pub fn visible_rows(&self) -> Vec<ListRow> {
        self.displayed
            .iter()
            .enumerate()
            .flat_map(|(i, (_, modules))| {
                let open = self.is_open(i);
                std::iter::once(ListRow::Bucket(i)).chain(
                    (0..modules.len())
                        .filter(move |_| open)
                        .map(move |j| ListRow::Module(i, j)),
                )
            })
            .collect()
    }
}

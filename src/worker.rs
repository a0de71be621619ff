//! Executes backend calls off the event loop.
//!
//! The event loop sends [`ApiCommand`]s; one worker thread runs them in order against
//! a [`ModuleApi`] and posts an [`ApiOutcome`] back through the event channel.

use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;

use crate::api::{ApiError, ModuleApi, SemesterBuckets};
use crate::module::{AddTimeRequest, NewModuleForm};
use crate::runtime::AppEvent;
use crate::tracker::TimerRequest;

#[derive(Debug, Clone, PartialEq)]
pub enum ApiCommand {
    LoadModules,
    CheckHasModule,
    FetchSeconds(String),
    /// Result of a stopped timer.
    SubmitTimer(TimerRequest),
    /// Time entered by hand on the details screen.
    AddTime(AddTimeRequest),
    ResetTimer(String),
    ToggleActive(String),
    DeleteModule(String),
    CreateModule(NewModuleForm),
}

#[derive(Debug)]
pub enum ApiOutcome {
    ModulesLoaded(Result<SemesterBuckets, ApiError>),
    HasModule(Result<bool, ApiError>),
    SecondsLoaded {
        module_id: String,
        result: Result<u64, ApiError>,
    },
    TimerSubmitted(Result<(), ApiError>),
    TimeAdded(Result<(), ApiError>),
    TimerReset {
        module_id: String,
        result: Result<(), ApiError>,
    },
    ActiveToggled(Result<(), ApiError>),
    ModuleDeleted(Result<(), ApiError>),
    ModuleCreated(Result<(), ApiError>),
}

/// Run one command to completion.
pub fn execute(api: &dyn ModuleApi, command: ApiCommand) -> ApiOutcome {
    match command {
        ApiCommand::LoadModules => ApiOutcome::ModulesLoaded(api.modules_by_semester()),
        ApiCommand::CheckHasModule => ApiOutcome::HasModule(api.has_module()),
        ApiCommand::FetchSeconds(module_id) => {
            let result = api.seconds_for_module(&module_id);
            ApiOutcome::SecondsLoaded { module_id, result }
        }
        ApiCommand::SubmitTimer(request) => ApiOutcome::TimerSubmitted(api.add_seconds(&request)),
        ApiCommand::AddTime(request) => ApiOutcome::TimeAdded(api.add_time(&request)),
        ApiCommand::ResetTimer(module_id) => {
            let result = api.reset_timer(&module_id);
            ApiOutcome::TimerReset { module_id, result }
        }
        ApiCommand::ToggleActive(module_id) => {
            ApiOutcome::ActiveToggled(api.toggle_active(&module_id))
        }
        ApiCommand::DeleteModule(module_id) => {
            ApiOutcome::ModuleDeleted(api.delete_module(&module_id))
        }
        ApiCommand::CreateModule(form) => ApiOutcome::ModuleCreated(api.create_module(&form)),
    }
}

/// Start the worker thread. It exits once either channel is closed.
pub fn spawn_worker(api: Arc<dyn ModuleApi>, events: Sender<AppEvent>) -> Sender<ApiCommand> {
    let (tx, rx) = mpsc::channel::<ApiCommand>();

    thread::spawn(move || {
        for command in rx {
            log::debug!("api command {:?}", command);
            let outcome = execute(api.as_ref(), command);
            if events.send(AppEvent::Api(outcome)).is_err() {
                break;
            }
        }
    });

    tx
}

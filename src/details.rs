use crate::forms::{AddTimeForm, FormError};
use crate::module::{AddTimeRequest, Module};
use crate::worker::ApiCommand;

/// State behind the module details screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDetails {
    pub module: Module,
    pub add_time: AddTimeForm,
    /// Set after the first delete key press; a second press sends the request.
    pub confirm_delete: bool,
}

impl ModuleDetails {
    pub fn new(module: Module) -> Self {
        Self {
            module,
            add_time: AddTimeForm::default(),
            confirm_delete: false,
        }
    }

    pub fn module_id(&self) -> &str {
        &self.module.id
    }

    pub fn semester_year(&self, year: i32) -> String {
        self.module.semester_year(year)
    }

    pub fn reset_timer(&self) -> ApiCommand {
        ApiCommand::ResetTimer(self.module.id.clone())
    }

    pub fn toggle_active(&self) -> ApiCommand {
        ApiCommand::ToggleActive(self.module.id.clone())
    }

    /// First call arms the confirmation, the second one yields the request.
    pub fn delete_module(&mut self) -> Option<ApiCommand> {
        if self.confirm_delete {
            self.confirm_delete = false;
            Some(ApiCommand::DeleteModule(self.module.id.clone()))
        } else {
            self.confirm_delete = true;
            None
        }
    }

    /// Validated locally; the backend receives the entered `HH:MM` text.
    pub fn submit_add_time(&self) -> Result<ApiCommand, FormError> {
        self.add_time.validate()?;
        Ok(ApiCommand::AddTime(AddTimeRequest {
            module_id: self.module.id.clone(),
            time: self.add_time.time.trimmed().to_string(),
        }))
    }

    /// Pick up fresh data for the same module after a reload.
    pub fn refresh(&mut self, module: Module) {
        if module.id == self.module.id {
            self.module = module;
        }
    }
}

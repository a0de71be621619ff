use chrono::NaiveDate;
use thiserror::Error;

use crate::module::NewModuleForm;
use crate::time_format::parse_hh_mm;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("{field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Single line text input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextField {
    pub label: &'static str,
    pub value: String,
    pub required: bool,
}

impl TextField {
    pub fn new(label: &'static str, required: bool) -> Self {
        Self {
            label,
            value: String::new(),
            required,
        }
    }

    pub fn push(&mut self, c: char) {
        if !c.is_control() {
            self.value.push(c);
        }
    }

    pub fn backspace(&mut self) {
        self.value.pop();
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }

    pub fn trimmed(&self) -> &str {
        self.value.trim()
    }

    /// The trimmed value, or an error when a required field is left blank.
    pub fn require(&self) -> Result<Option<&str>, FormError> {
        match (self.trimmed(), self.required) {
            ("", true) => Err(FormError::Required(self.label)),
            ("", false) => Ok(None),
            (v, _) => Ok(Some(v)),
        }
    }
}

/// Manual "add time" input on the details screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddTimeForm {
    pub time: TextField,
}

impl Default for AddTimeForm {
    fn default() -> Self {
        Self {
            time: TextField::new("time", true),
        }
    }
}

impl AddTimeForm {
    /// Seconds entered as `HH:MM`.
    pub fn validate(&self) -> Result<u64, FormError> {
        let raw = self.time.require()?.unwrap_or_default();
        parse_hh_mm(raw).ok_or(FormError::Invalid {
            field: self.time.label,
            reason: "expected HH:MM",
        })
    }

    pub fn reset(&mut self) {
        self.time.clear();
    }
}

pub const NEW_MODULE_FIELDS: usize = 5;

/// Draft of the new-module form, edited one field at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewModuleDraft {
    pub fields: [TextField; NEW_MODULE_FIELDS],
    pub focus: usize,
}

impl Default for NewModuleDraft {
    fn default() -> Self {
        Self {
            fields: [
                TextField::new("name", true),
                TextField::new("credit points", true),
                TextField::new("contact hours", true),
                TextField::new("self-study hours", true),
                TextField::new("exam date (YYYY-MM-DD)", false),
            ],
            focus: 0,
        }
    }
}

impl NewModuleDraft {
    pub fn focused_mut(&mut self) -> &mut TextField {
        &mut self.fields[self.focus]
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % NEW_MODULE_FIELDS;
    }

    pub fn prev_field(&mut self) {
        self.focus = (self.focus + NEW_MODULE_FIELDS - 1) % NEW_MODULE_FIELDS;
    }

    pub fn validate(&self) -> Result<NewModuleForm, FormError> {
        let [name, credits, contact, self_study, exam] = &self.fields;

        let name = name.require()?.unwrap_or_default().to_string();
        let credit_points = number(credits)?;
        let contact_hours = number(contact)?;
        let self_study_hours = number(self_study)?;
        let exam_date = match exam.require()? {
            Some(raw) => Some(NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                FormError::Invalid {
                    field: exam.label,
                    reason: "expected YYYY-MM-DD",
                }
            })?),
            None => None,
        };

        Ok(NewModuleForm {
            name,
            credit_points,
            contact_hours,
            self_study_hours,
            exam_date,
        })
    }
}

fn number(field: &TextField) -> Result<u32, FormError> {
    field
        .require()?
        .unwrap_or_default()
        .parse()
        .map_err(|_| FormError::Invalid {
            field: field.label,
            reason: "expected a whole number",
        })
}

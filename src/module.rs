use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum SemesterType {
    #[serde(rename = "SOMMERSEMESTER")]
    #[strum(serialize = "summer")]
    Summer,
    #[serde(rename = "WINTERSEMESTER")]
    #[strum(serialize = "winter")]
    Winter,
}

impl SemesterType {
    /// Academic year label: `2026` for a summer term, `2026 / 2027` for a winter term.
    pub fn year_label(&self, year: i32) -> String {
        match self {
            SemesterType::Summer => year.to_string(),
            SemesterType::Winter => format!("{} / {}", year, year + 1),
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum StudyDay {
    #[strum(serialize = "Mon")]
    Monday,
    #[strum(serialize = "Tue")]
    Tuesday,
    #[strum(serialize = "Wed")]
    Wednesday,
    #[strum(serialize = "Thu")]
    Thursday,
    #[strum(serialize = "Fri")]
    Friday,
    #[strum(serialize = "Sat")]
    Saturday,
    #[strum(serialize = "Sun")]
    Sunday,
}

/// A university module the student tracks study time for, as sent by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    #[serde(rename = "fachId")]
    pub id: String,
    pub name: String,
    #[serde(rename = "secondsLearned", default)]
    pub seconds_learned: u64,
    #[serde(rename = "kreditpunkte", default)]
    pub credits: u32,
    #[serde(rename = "kontaktzeitStunden", default)]
    pub contact_hours: u32,
    #[serde(rename = "selbststudiumStunden", default)]
    pub self_study_hours: u32,
    #[serde(rename = "semesterstufe", default)]
    pub semester_level: u32,
    #[serde(rename = "semesterTyp", default)]
    pub semester_type: Option<SemesterType>,
    #[serde(default)]
    pub active: bool,
    #[serde(rename = "lerntage", default)]
    pub study_days: BTreeSet<StudyDay>,
}

impl Module {
    pub fn total_workload_hours(&self) -> u32 {
        self.contact_hours.saturating_add(self.self_study_hours)
    }

    pub fn exceeds_total_workload(&self) -> bool {
        self.seconds_learned >= self.total_workload_hours() as u64 * 3600
    }

    pub fn exceeds_self_study_workload(&self) -> bool {
        self.seconds_learned >= self.self_study_hours as u64 * 3600
    }

    /// Self-study seconds still planned; negative once the plan is overrun.
    pub fn remaining_self_study_seconds(&self) -> i64 {
        self.self_study_hours as i64 * 3600 - self.seconds_learned as i64
    }

    pub fn semester_year(&self, year: i32) -> String {
        self.semester_type
            .map(|t| t.year_label(year))
            .unwrap_or_default()
    }
}

/// Payload for creating a new module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewModuleForm {
    pub name: String,
    #[serde(rename = "creditPoints")]
    pub credit_points: u32,
    #[serde(rename = "kontaktzeitStunden")]
    pub contact_hours: u32,
    #[serde(rename = "selbststudiumStunden")]
    pub self_study_hours: u32,
    #[serde(rename = "klausurDatum", skip_serializing_if = "Option::is_none")]
    pub exam_date: Option<NaiveDate>,
}

/// Manually entered study time; the backend reads `time` as a local time `HH:MM`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddTimeRequest {
    #[serde(rename = "modulId")]
    pub module_id: String,
    pub time: String,
}

/// Id/name pair used by selection widgets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModuleSelectEntry {
    #[serde(rename = "modulId", alias = "fachId", alias = "id")]
    pub id: String,
    pub name: String,
}


#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn deserializes_backend_module() {
        let json = r#"{
            "fachId": "6f1c2a8e-0000-4000-8000-000000000001",
            "name": "Algorithmen",
            "secondsLearned": 7200,
            "kreditpunkte": 10,
            "kontaktzeitStunden": 90,
            "selbststudiumStunden": 210,
            "semesterstufe": 3,
            "semesterTyp": "SOMMERSEMESTER",
            "active": true,
            "lerntage": ["MONDAY", "THURSDAY"]
        }"#;

        let module: Module = serde_json::from_str(json).unwrap();

        assert_eq!(module.name, "Algorithmen");
        assert_eq!(module.seconds_learned, 7200);
        assert_eq!(module.semester_level, 3);
        assert_matches!(module.semester_type, Some(SemesterType::Summer));
        assert!(module.study_days.contains(&StudyDay::Monday));
        assert!(module.study_days.contains(&StudyDay::Thursday));
        assert_eq!(module.study_days.len(), 2);
    }

    #[test]
    fn missing_optional_fields_default() {
        let module: Module = serde_json::from_str(r#"{"fachId":"x","name":"Mathe"}"#).unwrap();
        assert_eq!(module.seconds_learned, 0);
        assert_eq!(module.semester_type, None);
        assert!(!module.active);
        assert!(module.study_days.is_empty());
    }

    #[test]
    fn workload_queries() {
        let mut module = fixtures::module("m", 1, true);
        assert_eq!(module.total_workload_hours(), 150);
        assert!(!module.exceeds_self_study_workload());
        assert_eq!(module.remaining_self_study_seconds(), 90 * 3600);

        module.seconds_learned = 90 * 3600;
        assert!(module.exceeds_self_study_workload());
        assert!(!module.exceeds_total_workload());
        assert_eq!(module.remaining_self_study_seconds(), 0);

        module.seconds_learned = 151 * 3600;
        assert!(module.exceeds_total_workload());
        assert_eq!(module.remaining_self_study_seconds(), -61 * 3600);
    }

    #[test]
    fn workload_sum_saturates() {
        let mut module = fixtures::module("m", 1, true);
        module.contact_hours = u32::MAX;
        module.self_study_hours = 10;
        assert_eq!(module.total_workload_hours(), u32::MAX);
        assert!(!module.exceeds_total_workload());
    }

    #[test]
    fn semester_year_labels() {
        let mut module = fixtures::module("m", 1, true);
        assert_eq!(module.semester_year(2026), "2026 / 2027");
        module.semester_type = Some(SemesterType::Summer);
        assert_eq!(module.semester_year(2026), "2026");
        module.semester_type = None;
        assert_eq!(module.semester_year(2026), "");
    }

    #[test]
    fn new_module_form_wire_names() {
        let form = NewModuleForm {
            name: "Datenbanken".into(),
            credit_points: 5,
            contact_hours: 60,
            self_study_hours: 90,
            exam_date: NaiveDate::from_ymd_opt(2026, 2, 14),
        };
        let value = serde_json::to_value(&form).unwrap();
        assert_eq!(value["creditPoints"], 5);
        assert_eq!(value["kontaktzeitStunden"], 60);
        assert_eq!(value["selbststudiumStunden"], 90);
        assert_eq!(value["klausurDatum"], "2026-02-14");

        let without_date = NewModuleForm {
            exam_date: None,
            ..form
        };
        let value = serde_json::to_value(&without_date).unwrap();
        assert!(value.get("klausurDatum").is_none());
    }

    #[test]
    fn select_entry_accepts_either_id_name() {
        let a: ModuleSelectEntry =
            serde_json::from_str(r#"{"modulId":"1","name":"A"}"#).unwrap();
        let b: ModuleSelectEntry = serde_json::from_str(r#"{"fachId":"2","name":"B"}"#).unwrap();
        assert_eq!(a.id, "1");
        assert_eq!(b.id, "2");
    }
}

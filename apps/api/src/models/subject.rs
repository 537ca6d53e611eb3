//! Subject as stored and exchanged with the dashboard.

use serde::{Deserialize, Serialize};

/// A subject offered by a department. `code` is the store key.
///
/// `available` tracks whether the primary faculty can currently teach; an
/// unavailable subject schedules under `alternate_faculty` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub department: String,
    pub faculty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_faculty: Option<String>,
    pub hours_per_week: i32,
    #[serde(default)]
    pub lab_required: bool,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl Subject {
    /// The faculty member this subject actually schedules under:
    /// the primary when available, the alternate otherwise.
    pub fn scheduling_faculty(&self) -> Option<&str> {
        if self.available {
            Some(self.faculty.as_str())
        } else {
            self.alternate_faculty.as_deref()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_subject() -> Subject {
        Subject {
            code: "CS101".to_string(),
            name: "Data Structures".to_string(),
            department: "CSE".to_string(),
            faculty: "Dr. Rao".to_string(),
            alternate_faculty: None,
            hours_per_week: 3,
            lab_required: false,
            available: true,
        }
    }

    #[test]
    fn test_available_defaults_to_true() {
        let subject: Subject = serde_json::from_str(
            r#"{"code":"CS101","name":"Data Structures","faculty":"Dr. Rao","hoursPerWeek":3}"#,
        )
        .unwrap();
        assert!(subject.available);
        assert!(!subject.lab_required);
        assert_eq!(subject.scheduling_faculty(), Some("Dr. Rao"));
    }

    #[test]
    fn test_unavailable_subject_uses_alternate() {
        let mut subject = make_subject();
        subject.available = false;
        assert_eq!(subject.scheduling_faculty(), None);

        subject.alternate_faculty = Some("Dr. Iyer".to_string());
        assert_eq!(subject.scheduling_faculty(), Some("Dr. Iyer"));
    }

    #[test]
    fn test_wire_field_names_are_camel_case() {
        let json = serde_json::to_value(make_subject()).unwrap();
        assert!(json.get("hoursPerWeek").is_some());
        assert!(json.get("labRequired").is_some());
        assert!(json.get("hours_per_week").is_none());
    }
}

//! Faculty scheduling preferences.

use serde::{Deserialize, Serialize};

use crate::models::grid::{Period, Weekday};

/// A faculty member's preferred days and period slots.
///
/// Preferences are soft: the engine ranks candidate slots by how many
/// preference hits they score, but never fails a generation over them.
/// The store keeps one record per faculty, last write wins; the constraint
/// model unions the day and time lists into preferred slot sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyPreference {
    pub faculty: String,
    #[serde(default)]
    pub preferred_days: Vec<Weekday>,
    #[serde(default)]
    pub preferred_time: Vec<Period>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_front_end_payload() {
        let pref: FacultyPreference = serde_json::from_str(
            r#"{
                "faculty": "Dr. Rao",
                "preferredDays": ["Monday", "Thursday"],
                "preferredTime": ["8:45am - 9:30am", "9:30am - 10:15am"]
            }"#,
        )
        .unwrap();
        assert_eq!(pref.faculty, "Dr. Rao");
        assert_eq!(pref.preferred_days, vec![Weekday::Monday, Weekday::Thursday]);
        assert_eq!(pref.preferred_time, vec![Period::First, Period::Second]);
    }

    #[test]
    fn test_missing_lists_default_to_empty() {
        let pref: FacultyPreference =
            serde_json::from_str(r#"{"faculty": "Dr. Rao"}"#).unwrap();
        assert!(pref.preferred_days.is_empty());
        assert!(pref.preferred_time.is_empty());
    }
}

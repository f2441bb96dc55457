//! Team member model used by the assignment engine.

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize};

/// Daily working window. A window whose end is before its start wraps midnight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkingHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl WorkingHours {
    pub fn contains(&self, at: NaiveTime) -> bool {
        if self.start <= self.end {
            at >= self.start && at < self.end
        } else {
            at >= self.start || at < self.end
        }
    }
}

/// A team member who can be assigned leads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub active: bool,
    pub available: bool,
    #[serde(default)]
    pub territories: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_hours: Option<WorkingHours>,
    /// Maximum number of active leads; unlimited when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_active_leads: Option<u32>,
    /// Current number of active leads assigned
    pub workload: u32,
    pub updated_at: String,
    /// Internal version for optimistic concurrency control
    #[serde(default)]
    pub version: i64,
}

impl TeamMember {
    pub fn has_capacity(&self) -> bool {
        self.max_active_leads
            .map_or(true, |max| self.workload < max)
    }

    pub fn in_hours(&self, at: NaiveTime) -> bool {
        self.working_hours.map_or(true, |hours| hours.contains(at))
    }
}

/// Request body for creating a new team member.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberRequest {
    pub display_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub territories: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub working_hours: Option<WorkingHours>,
    #[serde(default)]
    pub max_active_leads: Option<u32>,
}

fn default_true() -> bool {
    true
}

/// Request body for updating an existing team member. Workload is not editable here.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemberRequest {
    #[serde(default)]
    pub display_name: Option<String>,
    /// `null` clears the email
    #[serde(default, deserialize_with = "clearable")]
    pub email: Option<Option<String>>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub available: Option<bool>,
    #[serde(default)]
    pub territories: Option<Vec<String>>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    /// `null` clears the window, so the member is always in hours
    #[serde(default, deserialize_with = "clearable")]
    pub working_hours: Option<Option<WorkingHours>>,
    /// `null` removes the cap
    #[serde(default, deserialize_with = "clearable")]
    pub max_active_leads: Option<Option<u32>>,
    /// Expected version for optimistic concurrency control
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// An absent field stays `None`; a present one, `null` included, becomes `Some`.
fn clearable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_working_hours_same_day() {
        let hours = WorkingHours {
            start: at(9, 0),
            end: at(17, 0),
        };
        assert!(hours.contains(at(9, 0)));
        assert!(hours.contains(at(16, 59)));
        assert!(!hours.contains(at(17, 0)));
        assert!(!hours.contains(at(8, 30)));
    }

    #[test]
    fn test_working_hours_wrapping_midnight() {
        let hours = WorkingHours {
            start: at(22, 0),
            end: at(6, 0),
        };
        assert!(hours.contains(at(23, 15)));
        assert!(hours.contains(at(2, 0)));
        assert!(!hours.contains(at(12, 0)));
    }

    #[test]
    fn test_update_request_distinguishes_null_from_absent() {
        let request: UpdateMemberRequest =
            serde_json::from_str(r#"{"workingHours": null, "maxActiveLeads": 3}"#).unwrap();
        assert_eq!(request.working_hours, Some(None));
        assert_eq!(request.max_active_leads, Some(Some(3)));
        assert_eq!(request.email, None);
    }
}

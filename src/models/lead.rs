//! Lead model and its pipeline enums.

use serde::{Deserialize, Serialize};

use super::TransitionRecord;

/// Pipeline status of a lead.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    AppointmentScheduled,
    InspectionCompleted,
    QuoteSent,
    Negotiation,
    Won,
    Lost,
    Nurture,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 10] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Qualified,
        LeadStatus::AppointmentScheduled,
        LeadStatus::InspectionCompleted,
        LeadStatus::QuoteSent,
        LeadStatus::Negotiation,
        LeadStatus::Won,
        LeadStatus::Lost,
        LeadStatus::Nurture,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::AppointmentScheduled => "appointment_scheduled",
            LeadStatus::InspectionCompleted => "inspection_completed",
            LeadStatus::QuoteSent => "quote_sent",
            LeadStatus::Negotiation => "negotiation",
            LeadStatus::Won => "won",
            LeadStatus::Lost => "lost",
            LeadStatus::Nurture => "nurture",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// Closed outcomes for reporting.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LeadStatus::Won | LeadStatus::Lost)
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quality band derived from the score. Ordered from coldest to hottest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Temperature {
    Cold,
    Cool,
    Warm,
    Hot,
}

impl Temperature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Temperature::Cold => "cold",
            Temperature::Cool => "cool",
            Temperature::Warm => "warm",
            Temperature::Hot => "hot",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "cold" => Some(Temperature::Cold),
            "cool" => Some(Temperature::Cool),
            "warm" => Some(Temperature::Warm),
            "hot" => Some(Temperature::Hot),
            _ => None,
        }
    }
}

/// How soon the prospect wants the work done.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Immediate,
    #[serde(rename = "within_1_week")]
    WithinOneWeek,
    #[serde(rename = "within_1_month")]
    WithinOneMonth,
    #[default]
    Planning,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Immediate => "immediate",
            Urgency::WithinOneWeek => "within_1_week",
            Urgency::WithinOneMonth => "within_1_month",
            Urgency::Planning => "planning",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "immediate" => Some(Urgency::Immediate),
            "within_1_week" => Some(Urgency::WithinOneWeek),
            "within_1_month" => Some(Urgency::WithinOneMonth),
            "planning" => Some(Urgency::Planning),
            _ => None,
        }
    }
}

/// BANT qualification flags.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BantFlags {
    #[serde(default)]
    pub budget_confirmed: bool,
    #[serde(default)]
    pub decision_maker: bool,
    #[serde(default)]
    pub need_identified: bool,
    #[serde(default)]
    pub timeline_defined: bool,
}

/// The attributes the scoring engine reads.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LeadProfile {
    pub property_value: Option<f64>,
    pub zip: String,
    pub source: Option<String>,
    pub urgency: Urgency,
    pub bant: BantFlags,
}

/// A sales lead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub address: String,
    pub zip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roof_age: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roof_type: Option<String>,
    pub project_type: String,
    pub urgency: Urgency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_max: Option<f64>,
    pub bant: BantFlags,
    pub score: u8,
    pub temperature: Temperature,
    pub status: LeadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Internal version for optimistic concurrency control
    #[serde(default)]
    pub version: i64,
}

impl Lead {
    pub fn profile(&self) -> LeadProfile {
        LeadProfile {
            property_value: self.property_value,
            zip: self.zip.clone(),
            source: self.source.clone(),
            urgency: self.urgency,
            bant: self.bant,
        }
    }
}

/// Parsed attributes of a lead that passed intake validation, before it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLead {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: String,
    pub zip: String,
    pub property_value: Option<f64>,
    pub roof_age: Option<f64>,
    pub roof_type: Option<String>,
    pub project_type: String,
    pub urgency: Urgency,
    pub source: Option<String>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub bant: BantFlags,
    pub notes: Option<String>,
}

impl NewLead {
    pub fn profile(&self) -> LeadProfile {
        LeadProfile {
            property_value: self.property_value,
            zip: self.zip.clone(),
            source: self.source.clone(),
            urgency: self.urgency,
            bant: self.bant,
        }
    }
}

/// Lead as handed to rendering, kanban boards and exports.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRecord {
    #[serde(flatten)]
    pub lead: Lead,
    pub transition_log: Vec<TransitionRecord>,
}

/// Request body for a status change.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: LeadStatus,
    #[serde(default)]
    pub actor: Option<String>,
    /// Expected version for optimistic concurrency control
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Request body for a manual (re)assignment. `memberId: null` unassigns.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssignmentRequest {
    #[serde(default)]
    pub member_id: Option<String>,
    #[serde(default)]
    pub actor: Option<String>,
    /// Expected version for optimistic concurrency control
    #[serde(default)]
    pub expected_version: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in LeadStatus::ALL {
            assert_eq!(LeadStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(LeadStatus::from_str("archived"), None);
    }

    #[test]
    fn test_status_serde_matches_as_str() {
        let json = serde_json::to_string(&LeadStatus::AppointmentScheduled).unwrap();
        assert_eq!(json, "\"appointment_scheduled\"");
        let urgency: Urgency = serde_json::from_str("\"within_1_week\"").unwrap();
        assert_eq!(urgency, Urgency::WithinOneWeek);
    }

    #[test]
    fn test_temperature_ordering() {
        assert!(Temperature::Hot > Temperature::Warm);
        assert!(Temperature::Warm > Temperature::Cool);
        assert!(Temperature::Cool > Temperature::Cold);
    }
}

//! Intake wizard input, one struct per step.
//!
//! Values are kept as entered so each step can be validated before anything is parsed.

use serde::{Deserialize, Deserializer, Serialize};

use super::{BantFlags, Urgency};

/// Logical step of the intake wizard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntakeStep {
    Contact,
    Property,
    Project,
    Qualification,
}

impl IntakeStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntakeStep::Contact => "contact",
            IntakeStep::Property => "property",
            IntakeStep::Project => "project",
            IntakeStep::Qualification => "qualification",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "contact" => Some(IntakeStep::Contact),
            "property" => Some(IntakeStep::Property),
            "project" => Some(IntakeStep::Project),
            "qualification" => Some(IntakeStep::Qualification),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDetails {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub property_value: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub roof_age: Option<String>,
    #[serde(default)]
    pub roof_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    #[serde(default)]
    pub project_type: String,
    #[serde(default)]
    pub urgency: Option<Urgency>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Qualification {
    #[serde(default, deserialize_with = "lenient_text")]
    pub budget_min: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub budget_max: Option<String>,
    #[serde(flatten)]
    pub bant: BantFlags,
}

/// Full intake submission: all four steps.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LeadSubmission {
    #[serde(default)]
    pub contact: ContactInfo,
    #[serde(default)]
    pub property: PropertyDetails,
    #[serde(default)]
    pub project: ProjectInfo,
    #[serde(default)]
    pub qualification: Qualification,
    /// Attempt auto-assignment after creation; falls back to the settings flag when absent.
    #[serde(default)]
    pub auto_assign: Option<bool>,
    #[serde(default)]
    pub actor: Option<String>,
}

/// Numeric wizard fields arrive either as typed text or as JSON numbers.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_accepts_numbers_and_text() {
        let submission: LeadSubmission = serde_json::from_value(serde_json::json!({
            "contact": { "firstName": "Ana", "lastName": "Ruiz", "phone": "555-010-2000" },
            "property": { "address": "1 Elm St", "zip": "30301", "propertyValue": 550000, "roofAge": "12" },
            "project": { "projectType": "roof_replacement", "urgency": "immediate" },
            "qualification": { "budgetMin": "$10,000", "budgetConfirmed": true }
        }))
        .unwrap();

        assert_eq!(submission.property.property_value.as_deref(), Some("550000"));
        assert_eq!(submission.property.roof_age.as_deref(), Some("12"));
        assert_eq!(submission.qualification.budget_min.as_deref(), Some("$10,000"));
        assert!(submission.qualification.bant.budget_confirmed);
        assert!(!submission.qualification.bant.decision_maker);
        assert_eq!(submission.project.urgency, Some(Urgency::Immediate));
        assert_eq!(IntakeStep::from_str("qualification"), Some(IntakeStep::Qualification));
    }
}

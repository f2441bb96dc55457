//! Intake validation, one validator per wizard step.
//!
//! Every function here is a pure predicate over the entered values. A lead is composed
//! only once every step passes.

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{AppError, FieldErrors};
use crate::models::{
    ContactInfo, IntakeStep, LeadSubmission, NewLead, ProjectInfo, PropertyDetails,
    Qualification,
};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

const PHONE_MIN_DIGITS: usize = 10;
const PHONE_MAX_DIGITS: usize = 15;

/// Field-level validation for one wizard step.
pub trait StepValidator {
    /// Returns every failing field; empty when the step is valid.
    fn errors(&self) -> FieldErrors;

    fn validate(&self) -> Result<(), FieldErrors> {
        let errors = self.errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl StepValidator for ContactInfo {
    fn errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require(&mut errors, "firstName", "First name", &self.first_name);
        require(&mut errors, "lastName", "Last name", &self.last_name);

        if require(&mut errors, "phone", "Phone", &self.phone) {
            let digits = normalize_phone(&self.phone).len();
            if !(PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits) {
                errors.insert(
                    "phone".to_string(),
                    format!(
                        "Phone must contain {} to {} digits",
                        PHONE_MIN_DIGITS, PHONE_MAX_DIGITS
                    ),
                );
            }
        }

        if let Some(email) = non_blank(&self.email) {
            if !EMAIL_RE.is_match(email) {
                errors.insert("email".to_string(), "Email address is not valid".to_string());
            }
        }
        errors
    }
}

impl StepValidator for PropertyDetails {
    fn errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require(&mut errors, "address", "Address", &self.address);
        require(&mut errors, "zip", "Zip code", &self.zip);
        check_amount(&mut errors, "propertyValue", "Property value", &self.property_value);
        check_amount(&mut errors, "roofAge", "Roof age", &self.roof_age);
        errors
    }
}

impl StepValidator for ProjectInfo {
    fn errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require(&mut errors, "projectType", "Project type", &self.project_type);
        errors
    }
}

impl StepValidator for Qualification {
    fn errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        let min = check_amount(&mut errors, "budgetMin", "Minimum budget", &self.budget_min);
        let max = check_amount(&mut errors, "budgetMax", "Maximum budget", &self.budget_max);
        if let (Some(min), Some(max)) = (min, max) {
            if min >= max {
                errors.insert(
                    "budgetMax".to_string(),
                    "Maximum budget must be greater than minimum budget".to_string(),
                );
            }
        }
        errors
    }
}

/// Validate a single step of a submission without touching the other steps.
pub fn validate_step(step: IntakeStep, submission: &LeadSubmission) -> Result<(), FieldErrors> {
    match step {
        IntakeStep::Contact => submission.contact.validate(),
        IntakeStep::Property => submission.property.validate(),
        IntakeStep::Project => submission.project.validate(),
        IntakeStep::Qualification => submission.qualification.validate(),
    }
}

/// Validate every step and compose the parsed lead attributes.
pub fn validate_submission(submission: &LeadSubmission) -> Result<NewLead, AppError> {
    let mut errors = submission.contact.errors();
    errors.extend(submission.property.errors());
    errors.extend(submission.project.errors());
    errors.extend(submission.qualification.errors());
    if !errors.is_empty() {
        return Err(AppError::fields(errors));
    }

    let contact = &submission.contact;
    let property = &submission.property;
    let project = &submission.project;
    let qualification = &submission.qualification;

    Ok(NewLead {
        first_name: contact.first_name.trim().to_string(),
        last_name: contact.last_name.trim().to_string(),
        phone: contact.phone.trim().to_string(),
        email: non_blank(&contact.email).map(|e| e.to_string()),
        address: property.address.trim().to_string(),
        zip: property.zip.trim().to_string(),
        property_value: parsed(&property.property_value),
        roof_age: parsed(&property.roof_age),
        roof_type: non_blank(&property.roof_type).map(|s| s.to_string()),
        project_type: project.project_type.trim().to_string(),
        urgency: project.urgency.unwrap_or_default(),
        source: non_blank(&project.source).map(|s| s.to_string()),
        budget_min: parsed(&qualification.budget_min),
        budget_max: parsed(&qualification.budget_max),
        bant: qualification.bant,
        notes: non_blank(&project.notes).map(|s| s.to_string()),
    })
}

/// Reduce a phone number to its digits.
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Parse a non-negative amount, tolerating a leading `$` and thousands separators.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let cleaned: String = trimmed
        .strip_prefix('$')
        .unwrap_or(trimmed)
        .chars()
        .filter(|c| *c != ',')
        .collect();
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Some(value),
        _ => None,
    }
}

fn require(errors: &mut FieldErrors, field: &str, label: &str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.insert(field.to_string(), format!("{} is required", label));
        false
    } else {
        true
    }
}

fn check_amount(
    errors: &mut FieldErrors,
    field: &str,
    label: &str,
    value: &Option<String>,
) -> Option<f64> {
    let raw = non_blank(value)?;
    let amount = parse_amount(raw);
    if amount.is_none() {
        errors.insert(
            field.to_string(),
            format!("{} must be a non-negative number", label),
        );
    }
    amount
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parsed(value: &Option<String>) -> Option<f64> {
    non_blank(value).and_then(parse_amount)
}

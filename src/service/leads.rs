//! Lead lifecycle operations.
//!
//! Each call takes the engine settings snapshot it should run under, loads what it needs
//! through the storage traits, runs the pure engine and writes the result back.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::db::{LeadRepository, TeamRepository};
use crate::engine::assignment::{select_member, AssignmentDecision};
use crate::engine::duplicates::find_duplicate;
use crate::engine::intake::validate_submission;
use crate::engine::pipeline::{check_transition, TransitionCheck};
use crate::engine::{evaluate, validate_settings};
use crate::errors::AppError;
use crate::events::{EventBus, LeadEvent};
use crate::models::{
    EngineSettings, Lead, LeadRecord, LeadStatus, LeadSubmission, PipelineMode, TransitionRecord,
};

/// Actor recorded when a caller does not name one.
pub const SYSTEM_ACTOR: &str = "system";

/// Result of a successful intake.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeOutcome {
    pub lead: Lead,
    pub duplicate_warning: Option<String>,
    /// Present when auto-assignment ran
    pub assignment: Option<AssignmentDecision>,
}

/// Lead with the decision an auto-assignment call produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoAssignOutcome {
    pub lead: Lead,
    pub decision: AssignmentDecision,
}

pub struct LeadService {
    leads: Arc<dyn LeadRepository>,
    team: Arc<dyn TeamRepository>,
    events: EventBus,
}

impl LeadService {
    pub fn new(
        leads: Arc<dyn LeadRepository>,
        team: Arc<dyn TeamRepository>,
        events: EventBus,
    ) -> Self {
        Self {
            leads,
            team,
            events,
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub async fn list(&self) -> Result<Vec<Lead>, AppError> {
        self.leads.list_leads().await
    }

    async fn load(&self, id: &str) -> Result<Lead, AppError> {
        self.leads
            .get_lead(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lead {} not found", id)))
    }

    /// Lead attributes together with its transition log.
    pub async fn get_record(&self, id: &str) -> Result<LeadRecord, AppError> {
        let lead = self.load(id).await?;
        let transition_log = self.leads.list_transitions(id).await?;
        Ok(LeadRecord {
            lead,
            transition_log,
        })
    }

    /// Warning text when `phone` or `email` already belongs to a lead or customer.
    pub async fn check_duplicate(
        &self,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<String>, AppError> {
        let known = self.leads.known_contacts().await?;
        Ok(find_duplicate(phone, email, &known))
    }

    /// Validate, score and store a wizard submission.
    ///
    /// A duplicate contact only produces a warning. When auto-assignment runs and finds
    /// nobody, the lead stays unassigned and the decision carries the reason.
    pub async fn intake(
        &self,
        submission: &LeadSubmission,
        settings: &EngineSettings,
    ) -> Result<IntakeOutcome, AppError> {
        validate_settings(settings)?;
        let new_lead = validate_submission(submission)?;
        let duplicate_warning = self
            .check_duplicate(Some(&new_lead.phone), new_lead.email.as_deref())
            .await?;
        let (score, temperature) = evaluate(&new_lead.profile(), settings)?;

        let now = Utc::now().to_rfc3339();
        let lead = Lead {
            id: uuid::Uuid::new_v4().to_string(),
            first_name: new_lead.first_name,
            last_name: new_lead.last_name,
            phone: new_lead.phone,
            email: new_lead.email,
            address: new_lead.address,
            zip: new_lead.zip,
            property_value: new_lead.property_value,
            roof_age: new_lead.roof_age,
            roof_type: new_lead.roof_type,
            project_type: new_lead.project_type,
            urgency: new_lead.urgency,
            source: new_lead.source,
            budget_min: new_lead.budget_min,
            budget_max: new_lead.budget_max,
            bant: new_lead.bant,
            score,
            temperature,
            status: LeadStatus::New,
            assigned_to: None,
            notes: new_lead.notes,
            created_at: now.clone(),
            updated_at: now,
            version: 1,
        };

        self.leads.insert_lead(&lead).await?;
        self.events.publish(LeadEvent::LeadCreated {
            lead_id: lead.id.clone(),
            score,
        });
        if let Some(warning) = &duplicate_warning {
            tracing::info!(lead_id = %lead.id, "{}", warning);
        }

        let auto_assign = submission
            .auto_assign
            .unwrap_or(settings.assignment.auto_assign_on_intake);
        if !auto_assign {
            return Ok(IntakeOutcome {
                lead,
                duplicate_warning,
                assignment: None,
            });
        }

        let outcome = self.auto_assign_lead(lead, settings).await?;
        Ok(IntakeOutcome {
            lead: outcome.lead,
            duplicate_warning,
            assignment: Some(outcome.decision),
        })
    }

    /// Run the configured strategy for an existing lead.
    pub async fn auto_assign(
        &self,
        id: &str,
        settings: &EngineSettings,
    ) -> Result<AutoAssignOutcome, AppError> {
        let lead = self.load(id).await?;
        self.auto_assign_lead(lead, settings).await
    }

    async fn auto_assign_lead(
        &self,
        lead: Lead,
        settings: &EngineSettings,
    ) -> Result<AutoAssignOutcome, AppError> {
        let roster = self.team.list_members().await?;
        let cursor = self.team.next_rotation_cursor().await?;
        let now = chrono::Local::now().time();
        let decision = select_member(&lead, &roster, &settings.assignment, cursor, now);
        tracing::debug!(
            lead_id = %lead.id,
            strategy = settings.assignment.strategy.as_str(),
            cursor,
            ?decision,
            "Auto-assignment decision"
        );

        let lead = match &decision {
            AssignmentDecision::Assigned { member_id, reason }
                if lead.assigned_to.as_deref() != Some(member_id.as_str()) =>
            {
                let updated = self
                    .leads
                    .apply_assignment(&lead.id, lead.version, Some(member_id.as_str()))
                    .await?;
                self.events.publish(LeadEvent::LeadAssigned {
                    lead_id: updated.id.clone(),
                    member_id: member_id.clone(),
                    reason: reason.clone(),
                });
                updated
            }
            _ => lead,
        };

        Ok(AutoAssignOutcome { lead, decision })
    }

    /// Manually set or clear the owner of a lead.
    pub async fn assign(
        &self,
        id: &str,
        member_id: Option<&str>,
        expected_version: Option<i64>,
    ) -> Result<Lead, AppError> {
        let lead = self.load(id).await?;
        check_version(&lead, expected_version)?;
        if lead.assigned_to.as_deref() == member_id {
            return Ok(lead);
        }

        let updated = self
            .leads
            .apply_assignment(id, expected_version.unwrap_or(lead.version), member_id)
            .await?;

        match (member_id, lead.assigned_to) {
            (Some(member_id), _) => self.events.publish(LeadEvent::LeadAssigned {
                lead_id: id.to_string(),
                member_id: member_id.to_string(),
                reason: "manual".to_string(),
            }),
            (None, Some(previous)) => self.events.publish(LeadEvent::LeadUnassigned {
                lead_id: id.to_string(),
                previous_member_id: previous,
            }),
            (None, None) => {}
        }

        Ok(updated)
    }

    /// Move a lead to `to`. Re-entering the current status changes nothing.
    pub async fn change_status(
        &self,
        id: &str,
        to: LeadStatus,
        actor: Option<&str>,
        expected_version: Option<i64>,
        mode: PipelineMode,
    ) -> Result<Lead, AppError> {
        let lead = self.load(id).await?;
        check_version(&lead, expected_version)?;

        if check_transition(lead.status, to, mode)? == TransitionCheck::NoOp {
            tracing::debug!(lead_id = %id, status = %to, "Status unchanged");
            return Ok(lead);
        }

        let record = TransitionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            lead_id: id.to_string(),
            from_status: lead.status,
            to_status: to,
            actor: actor
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .unwrap_or(SYSTEM_ACTOR)
                .to_string(),
            at: Utc::now().to_rfc3339(),
        };

        let updated = self
            .leads
            .apply_transition(expected_version.unwrap_or(lead.version), &record)
            .await?;
        self.events.publish(LeadEvent::StatusChanged {
            lead_id: record.lead_id,
            from: record.from_status,
            to: record.to_status,
            actor: record.actor,
        });
        Ok(updated)
    }

    /// Recompute score and temperature under the given settings.
    pub async fn rescore(&self, id: &str, settings: &EngineSettings) -> Result<Lead, AppError> {
        let lead = self.load(id).await?;
        let (score, temperature) = evaluate(&lead.profile(), settings)?;
        let updated = self
            .leads
            .update_scoring(id, lead.version, score, temperature)
            .await?;
        tracing::info!(
            lead_id = %id,
            previous = lead.score,
            score,
            temperature = temperature.as_str(),
            "Lead rescored"
        );
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.leads.delete_lead(id).await?;
        tracing::info!(lead_id = %id, "Lead deleted");
        Ok(())
    }
}

fn check_version(lead: &Lead, expected_version: Option<i64>) -> Result<(), AppError> {
    match expected_version {
        Some(expected) if expected != lead.version => Err(AppError::Conflict {
            message: format!(
                "Version mismatch: expected {}, current {}",
                expected, lead.version
            ),
            current_version: lead.version,
        }),
        _ => Ok(()),
    }
}

//! Bulk operations over a set of lead ids.
//!
//! Best-effort: every id is attempted and reported on its own, nothing is rolled back.
//! At most `concurrency` ids are in flight at once and the manifest keeps request order.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;

use super::leads::LeadService;
use crate::engine::assignment::AssignmentDecision;
use crate::errors::AppError;
use crate::models::{
    BulkAction, BulkItemResult, BulkManifest, BulkRequest, EngineSettings, ItemOutcome, LeadRecord,
};

/// Flat CSV row for an exported lead.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    id: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    phone: &'a str,
    email: Option<&'a str>,
    address: &'a str,
    zip: &'a str,
    project_type: &'a str,
    urgency: &'a str,
    source: Option<&'a str>,
    score: u8,
    temperature: &'a str,
    status: &'a str,
    closed: bool,
    assigned_to: Option<&'a str>,
    transitions: usize,
    created_at: &'a str,
    updated_at: &'a str,
}

impl<'a> From<&'a LeadRecord> for ExportRow<'a> {
    fn from(record: &'a LeadRecord) -> Self {
        let lead = &record.lead;
        ExportRow {
            id: &lead.id,
            first_name: &lead.first_name,
            last_name: &lead.last_name,
            phone: &lead.phone,
            email: lead.email.as_deref(),
            address: &lead.address,
            zip: &lead.zip,
            project_type: &lead.project_type,
            urgency: lead.urgency.as_str(),
            source: lead.source.as_deref(),
            score: lead.score,
            temperature: lead.temperature.as_str(),
            status: lead.status.as_str(),
            closed: lead.status.is_terminal(),
            assigned_to: lead.assigned_to.as_deref(),
            transitions: record.transition_log.len(),
            created_at: &lead.created_at,
            updated_at: &lead.updated_at,
        }
    }
}

pub struct BulkCoordinator {
    service: Arc<LeadService>,
    concurrency: usize,
}

impl BulkCoordinator {
    pub fn new(service: Arc<LeadService>, concurrency: usize) -> Self {
        Self {
            service,
            concurrency: concurrency.max(1),
        }
    }

    /// Apply `request.action` to every id. Only a failed export rendering fails the call.
    pub async fn apply(
        &self,
        request: &BulkRequest,
        settings: &EngineSettings,
    ) -> Result<BulkManifest, AppError> {
        let action = &request.action;
        let actor = request.actor.as_deref();

        let results: Vec<(String, Result<Option<LeadRecord>, String>)> =
            stream::iter(request.lead_ids.iter().cloned())
                .map(|id| async move {
                    let result = self.apply_one(&id, action, actor, settings).await;
                    (id, result)
                })
                .buffered(self.concurrency)
                .collect()
                .await;

        let mut items = Vec::with_capacity(results.len());
        let mut exported = Vec::new();
        for (lead_id, result) in results {
            let outcome = match result {
                Ok(record) => {
                    exported.extend(record);
                    ItemOutcome::Ok
                }
                Err(reason) => {
                    tracing::debug!(lead_id = %lead_id, reason = %reason, "Bulk item failed");
                    ItemOutcome::Failed { reason }
                }
            };
            items.push(BulkItemResult { lead_id, outcome });
        }

        let failed = items
            .iter()
            .filter(|item| matches!(item.outcome, ItemOutcome::Failed { .. }))
            .count();
        let succeeded = items.len() - failed;

        let export = match action {
            BulkAction::Export => Some(render_csv(&exported)?),
            _ => None,
        };

        tracing::info!(
            action = action.name(),
            requested = items.len(),
            succeeded,
            failed,
            "Bulk operation finished"
        );

        Ok(BulkManifest {
            action: action.name().to_string(),
            items,
            succeeded,
            failed,
            export,
        })
    }

    /// Returns the record to export for `Export`, `None` for every other action.
    async fn apply_one(
        &self,
        id: &str,
        action: &BulkAction,
        actor: Option<&str>,
        settings: &EngineSettings,
    ) -> Result<Option<LeadRecord>, String> {
        let result = match action {
            BulkAction::UpdateStatus { status } => self
                .service
                .change_status(id, *status, actor, None, settings.pipeline_mode)
                .await
                .map(|_| None),
            BulkAction::Assign { member_id } => self
                .service
                .assign(id, member_id.as_deref(), None)
                .await
                .map(|_| None),
            BulkAction::AutoAssign => match self.service.auto_assign(id, settings).await {
                Ok(outcome) => match outcome.decision {
                    AssignmentDecision::Assigned { .. } => Ok(None),
                    AssignmentDecision::Unassigned { reason } => {
                        return Err(reason.as_str().to_string())
                    }
                },
                Err(e) => Err(e),
            },
            BulkAction::Delete => self.service.delete(id).await.map(|_| None),
            BulkAction::Export => self.service.get_record(id).await.map(Some),
        };
        result.map_err(|e| e.reason().to_string())
    }
}

fn render_csv(records: &[LeadRecord]) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(ExportRow::from(record))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to flush export: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("Export is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_database, Repository, TeamRepository};
    use crate::events::EventBus;
    use crate::models::{
        BantFlags, ContactInfo, CreateMemberRequest, LeadStatus, LeadSubmission, ProjectInfo,
        PropertyDetails, Qualification,
    };
    use tempfile::TempDir;

    async fn setup() -> (TempDir, Arc<LeadService>) {
        let (dir, _repo, service) = setup_with_repo().await;
        (dir, service)
    }

    async fn setup_with_repo() -> (TempDir, Arc<Repository>, Arc<LeadService>) {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("bulk.sqlite")).await.unwrap();
        let repo = Arc::new(Repository::new(pool));
        let service = Arc::new(LeadService::new(repo.clone(), repo.clone(), EventBus::new()));
        (dir, repo, service)
    }

    fn assert_all_ok(manifest: &BulkManifest) {
        let failures: Vec<&BulkItemResult> = manifest
            .items
            .iter()
            .filter(|item| item.outcome != ItemOutcome::Ok)
            .collect();
        assert!(failures.is_empty(), "failed items: {:?}", failures);
    }

    async fn create_leads(service: &LeadService, count: usize) -> Vec<String> {
        let mut ids = Vec::new();
        for n in 0..count {
            let submission = LeadSubmission {
                contact: ContactInfo {
                    first_name: format!("Lead{}", n),
                    last_name: "Bulk".to_string(),
                    phone: format!("55501000{:02}", n),
                    email: None,
                },
                property: PropertyDetails {
                    address: format!("{} Oak Ave", n + 1),
                    zip: "30301".to_string(),
                    ..PropertyDetails::default()
                },
                project: ProjectInfo {
                    project_type: "repair".to_string(),
                    ..ProjectInfo::default()
                },
                qualification: Qualification {
                    budget_min: None,
                    budget_max: None,
                    bant: BantFlags::default(),
                },
                auto_assign: None,
                actor: None,
            };
            let outcome = service
                .intake(&submission, &EngineSettings::default())
                .await
                .unwrap();
            ids.push(outcome.lead.id);
        }
        ids
    }

    #[tokio::test]
    async fn test_bulk_status_reports_missing_id() {
        let (_dir, service) = setup().await;
        let mut ids = create_leads(&service, 4).await;
        ids.insert(2, "missing-lead".to_string());

        let coordinator = BulkCoordinator::new(service.clone(), 2);
        let request = BulkRequest {
            lead_ids: ids.clone(),
            action: BulkAction::UpdateStatus {
                status: LeadStatus::Contacted,
            },
            actor: Some("ops".to_string()),
        };
        let manifest = coordinator
            .apply(&request, &EngineSettings::default())
            .await
            .unwrap();

        assert_eq!(manifest.succeeded, 4);
        assert_eq!(manifest.failed, 1);
        let order: Vec<&str> = manifest.items.iter().map(|i| i.lead_id.as_str()).collect();
        let expected: Vec<&str> = ids.iter().map(String::as_str).collect();
        assert_eq!(order, expected);
        assert_eq!(
            manifest.items[2].outcome,
            ItemOutcome::Failed {
                reason: "not_found".to_string()
            }
        );

        for id in ids.iter().filter(|id| *id != "missing-lead") {
            let record = service.get_record(id).await.unwrap();
            assert_eq!(record.lead.status, LeadStatus::Contacted);
        }
    }

    #[tokio::test]
    async fn test_bulk_export_renders_ok_records() {
        let (_dir, service) = setup().await;
        let mut ids = create_leads(&service, 2).await;
        ids.push("nope".to_string());

        let coordinator = BulkCoordinator::new(service, 4);
        let request = BulkRequest {
            lead_ids: ids,
            action: BulkAction::Export,
            actor: None,
        };
        let manifest = coordinator
            .apply(&request, &EngineSettings::default())
            .await
            .unwrap();

        let csv = manifest.export.unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,first_name,last_name"));
        assert_eq!(manifest.failed, 1);
    }

    #[tokio::test]
    async fn test_bulk_auto_assign_without_roster() {
        let (_dir, service) = setup().await;
        let ids = create_leads(&service, 2).await;

        let coordinator = BulkCoordinator::new(service, 4);
        let request = BulkRequest {
            lead_ids: ids,
            action: BulkAction::AutoAssign,
            actor: None,
        };
        let manifest = coordinator
            .apply(&request, &EngineSettings::default())
            .await
            .unwrap();
        assert_eq!(manifest.failed, 2);
        assert!(manifest.items.iter().all(|item| item.outcome
            == ItemOutcome::Failed {
                reason: "no_capacity".to_string()
            }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_bulk_assign_then_delete_in_parallel() {
        let (_dir, repo, service) = setup_with_repo().await;
        let member = repo
            .create_member(&CreateMemberRequest {
                display_name: "Casey".to_string(),
                email: None,
                active: true,
                available: true,
                territories: vec![],
                skills: vec![],
                working_hours: None,
                max_active_leads: None,
            })
            .await
            .unwrap();
        let ids = create_leads(&service, 20).await;
        let coordinator = BulkCoordinator::new(service.clone(), 4);
        let settings = EngineSettings::default();

        let assigned = coordinator
            .apply(
                &BulkRequest {
                    lead_ids: ids.clone(),
                    action: BulkAction::Assign {
                        member_id: Some(member.id.clone()),
                    },
                    actor: None,
                },
                &settings,
            )
            .await
            .unwrap();
        assert_all_ok(&assigned);
        assert_eq!(assigned.succeeded, 20);
        let owner = repo.get_member(&member.id).await.unwrap().unwrap();
        assert_eq!(owner.workload, 20);

        let deleted = coordinator
            .apply(
                &BulkRequest {
                    lead_ids: ids,
                    action: BulkAction::Delete,
                    actor: None,
                },
                &settings,
            )
            .await
            .unwrap();
        assert_all_ok(&deleted);
        assert_eq!(deleted.succeeded, 20);
        let owner = repo.get_member(&member.id).await.unwrap().unwrap();
        assert_eq!(owner.workload, 0);
        assert!(service.list().await.unwrap().is_empty());
    }
}

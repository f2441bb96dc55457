//! Bulk operation requests and manifests.

use serde::{Deserialize, Serialize};

use super::LeadStatus;

/// One action applied to every lead in a bulk request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BulkAction {
    UpdateStatus {
        status: LeadStatus,
    },
    /// Manual reassignment; `memberId: null` unassigns
    Assign {
        #[serde(default, rename = "memberId")]
        member_id: Option<String>,
    },
    AutoAssign,
    Delete,
    Export,
}

impl BulkAction {
    pub fn name(&self) -> &'static str {
        match self {
            BulkAction::UpdateStatus { .. } => "update_status",
            BulkAction::Assign { .. } => "assign",
            BulkAction::AutoAssign => "auto_assign",
            BulkAction::Delete => "delete",
            BulkAction::Export => "export",
        }
    }
}

/// Request body for a bulk operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRequest {
    pub lead_ids: Vec<String>,
    pub action: BulkAction,
    #[serde(default)]
    pub actor: Option<String>,
}

/// Outcome for a single id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    Ok,
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BulkItemResult {
    pub lead_id: String,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

/// Per-id results in request order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BulkManifest {
    pub action: String,
    pub items: Vec<BulkItemResult>,
    pub succeeded: usize,
    pub failed: usize,
    /// CSV rendering of the exported leads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<String>,
}

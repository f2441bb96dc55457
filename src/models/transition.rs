//! Append-only audit record of a status change.

use serde::{Deserialize, Serialize};

use super::LeadStatus;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRecord {
    pub id: String,
    pub lead_id: String,
    pub from_status: LeadStatus,
    pub to_status: LeadStatus,
    pub actor: String,
    pub at: String,
}

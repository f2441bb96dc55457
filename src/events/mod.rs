//! In-process lead events.
//!
//! Every assignment and status change is published on a broadcast channel and logged.
//! Publishing never fails; events sent while nobody is subscribed are dropped.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::LeadStatus;

/// Lead lifecycle event
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LeadEvent {
    /// A lead passed intake and was stored
    LeadCreated {
        #[serde(rename = "leadId")]
        lead_id: String,
        score: u8,
    },
    /// A lead got a new owner
    LeadAssigned {
        #[serde(rename = "leadId")]
        lead_id: String,
        #[serde(rename = "memberId")]
        member_id: String,
        reason: String,
    },
    /// A lead lost its owner
    LeadUnassigned {
        #[serde(rename = "leadId")]
        lead_id: String,
        #[serde(rename = "previousMemberId")]
        previous_member_id: String,
    },
    StatusChanged {
        #[serde(rename = "leadId")]
        lead_id: String,
        from: LeadStatus,
        to: LeadStatus,
        actor: String,
    },
}

/// Broadcast bus for [`LeadEvent`]s.
#[derive(Clone)]
pub struct EventBus {
    event_tx: broadcast::Sender<LeadEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self { event_tx }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<LeadEvent> {
        self.event_tx.subscribe()
    }

    pub fn publish(&self, event: LeadEvent) {
        match &event {
            LeadEvent::LeadCreated { lead_id, score } => {
                tracing::info!(lead_id = %lead_id, score, "Lead created");
            }
            LeadEvent::LeadAssigned {
                lead_id,
                member_id,
                reason,
            } => {
                tracing::info!(lead_id = %lead_id, member_id = %member_id, reason = %reason, "Lead assigned");
            }
            LeadEvent::LeadUnassigned {
                lead_id,
                previous_member_id,
            } => {
                tracing::info!(lead_id = %lead_id, previous_member_id = %previous_member_id, "Lead unassigned");
            }
            LeadEvent::StatusChanged {
                lead_id,
                from,
                to,
                actor,
            } => {
                tracing::info!(lead_id = %lead_id, from = %from, to = %to, actor = %actor, "Lead status changed");
            }
        }
        let _ = self.event_tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

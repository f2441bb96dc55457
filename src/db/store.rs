//! Storage interfaces the engine services depend on.

use async_trait::async_trait;

use crate::engine::duplicates::KnownContact;
use crate::errors::AppError;
use crate::models::{Lead, Temperature, TeamMember, TransitionRecord};

/// Lead storage. Writes that change status or ownership are version-checked.
#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn list_leads(&self) -> Result<Vec<Lead>, AppError>;

    async fn get_lead(&self, id: &str) -> Result<Option<Lead>, AppError>;

    async fn insert_lead(&self, lead: &Lead) -> Result<(), AppError>;

    /// Store a recomputed score and temperature.
    async fn update_scoring(
        &self,
        id: &str,
        expected_version: i64,
        score: u8,
        temperature: Temperature,
    ) -> Result<Lead, AppError>;

    /// Write `record.to_status` and append `record` in one transaction.
    async fn apply_transition(
        &self,
        expected_version: i64,
        record: &TransitionRecord,
    ) -> Result<Lead, AppError>;

    /// Set or clear the owner, moving workload from the prior owner to the new one in
    /// the same transaction.
    async fn apply_assignment(
        &self,
        id: &str,
        expected_version: i64,
        member_id: Option<&str>,
    ) -> Result<Lead, AppError>;

    /// Remove a lead, releasing its owner's workload.
    async fn delete_lead(&self, id: &str) -> Result<(), AppError>;

    async fn list_transitions(&self, lead_id: &str) -> Result<Vec<TransitionRecord>, AppError>;

    /// Contact details of every lead and customer, leads first.
    async fn known_contacts(&self) -> Result<Vec<KnownContact>, AppError>;
}

/// Roster reads for assignment.
#[async_trait]
pub trait TeamRepository: Send + Sync {
    async fn list_members(&self) -> Result<Vec<TeamMember>, AppError>;

    async fn get_member(&self, id: &str) -> Result<Option<TeamMember>, AppError>;

    /// Atomically advance the round-robin cursor, returning the position to use.
    async fn next_rotation_cursor(&self) -> Result<u64, AppError>;
}

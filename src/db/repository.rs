//! Database repository for CRUD operations.
//!
//! Uses prepared statements and transactions for data integrity. Status and ownership
//! writes use `WHERE id = ? AND version = ?` so a lost race surfaces as a conflict.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqliteConnection, SqlitePool};

use super::store::{LeadRepository, TeamRepository};
use crate::engine::duplicates::{ContactKind, KnownContact};
use crate::errors::AppError;
use crate::models::{
    BantFlags, CreateCustomerRequest, CreateMemberRequest, Customer, EngineSettings, Lead,
    LeadStatus, RevisionInfo, TeamMember, Temperature, TransitionRecord, UpdateMemberRequest,
    Urgency, WorkingHours,
};

const LEAD_COLUMNS: &str = "id, first_name, last_name, phone, email, address, zip, \
    property_value, roof_age, roof_type, project_type, urgency, source, budget_min, budget_max, \
    bant_budget_confirmed, bant_decision_maker, bant_need_identified, bant_timeline_defined, \
    score, temperature, status, assigned_to, notes, created_at, updated_at, version";

const MEMBER_COLUMNS: &str = "id, display_name, email, active, available, territories, skills, \
    working_hours, max_active_leads, workload, updated_at, version";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a transaction that already holds the write lock.
    ///
    /// The revision bump is the first statement, so SQLite waits for the lock (honouring
    /// `busy_timeout`) before any read. Reads inside the transaction then see the latest
    /// commit, and a later write cannot fail on a stale snapshot. A rollback undoes the bump.
    async fn write_tx(&self) -> Result<sqlx::Transaction<'static, sqlx::Sqlite>, AppError> {
        let mut tx = self.pool.begin().await?;
        bump_revision(&mut tx).await?;
        Ok(tx)
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Get revision info.
    pub async fn get_revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }

    /// Increment the revision ID and return the new value.
    pub async fn increment_revision(&self) -> Result<i64, AppError> {
        let mut conn = self.pool.acquire().await?;
        bump_revision(&mut conn).await?;
        self.get_revision_id().await
    }

    // ==================== MEMBER OPERATIONS ====================

    /// Create a new member.
    pub async fn create_member(
        &self,
        request: &CreateMemberRequest,
    ) -> Result<TeamMember, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let territories_json = serde_json::to_string(&request.territories)?;
        let skills_json = serde_json::to_string(&request.skills)?;
        let hours_json = request
            .working_hours
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            "INSERT INTO members (id, display_name, email, active, available, territories, skills, working_hours, max_active_leads, workload, updated_at, version) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, 1)"
        )
        .bind(&id)
        .bind(&request.display_name)
        .bind(&request.email)
        .bind(request.active as i32)
        .bind(request.available as i32)
        .bind(&territories_json)
        .bind(&skills_json)
        .bind(&hours_json)
        .bind(request.max_active_leads.map(i64::from))
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(TeamMember {
            id,
            display_name: request.display_name.clone(),
            email: request.email.clone(),
            active: request.active,
            available: request.available,
            territories: request.territories.clone(),
            skills: request.skills.clone(),
            working_hours: request.working_hours,
            max_active_leads: request.max_active_leads,
            workload: 0,
            updated_at: now,
            version: 1,
        })
    }

    /// Update a member with optimistic concurrency control.
    ///
    /// A member who still owns leads cannot be deactivated.
    pub async fn update_member(
        &self,
        id: &str,
        request: &UpdateMemberRequest,
    ) -> Result<TeamMember, AppError> {
        let existing = self
            .get_member(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member {} not found", id)))?;

        // Check version for optimistic concurrency
        if let Some(expected) = request.expected_version {
            if existing.version != expected {
                return Err(AppError::Conflict {
                    message: format!(
                        "Version mismatch: expected {}, current {}",
                        expected, existing.version
                    ),
                    current_version: existing.version,
                });
            }
        }

        let active = request.active.unwrap_or(existing.active);
        if !active && existing.workload > 0 {
            return Err(deactivate_with_leads(&existing));
        }

        let now = Utc::now().to_rfc3339();
        let new_version = existing.version + 1;

        let display_name = request
            .display_name
            .as_ref()
            .unwrap_or(&existing.display_name);
        let email = request.email.clone().unwrap_or(existing.email.clone());
        let available = request.available.unwrap_or(existing.available);
        let territories = request
            .territories
            .clone()
            .unwrap_or(existing.territories.clone());
        let skills = request.skills.clone().unwrap_or(existing.skills.clone());
        let working_hours = request.working_hours.unwrap_or(existing.working_hours);
        let max_active_leads = request
            .max_active_leads
            .unwrap_or(existing.max_active_leads);

        let territories_json = serde_json::to_string(&territories)?;
        let skills_json = serde_json::to_string(&skills)?;
        let hours_json = working_hours
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        // Conditional UPDATE: version check, and no deactivation while leads are owned
        let result = sqlx::query(
            "UPDATE members SET display_name = ?, email = ?, active = ?, available = ?, territories = ?, skills = ?, working_hours = ?, max_active_leads = ?, updated_at = ?, version = ? WHERE id = ? AND version = ? AND (? = 1 OR workload = 0)"
        )
        .bind(display_name)
        .bind(&email)
        .bind(active as i32)
        .bind(available as i32)
        .bind(&territories_json)
        .bind(&skills_json)
        .bind(&hours_json)
        .bind(max_active_leads.map(i64::from))
        .bind(&now)
        .bind(new_version)
        .bind(id)
        .bind(existing.version)
        .bind(active as i32)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Race condition - version or workload changed between read and write
            let current = self.get_member(id).await?;
            return Err(match current {
                Some(member) if member.version == existing.version => {
                    deactivate_with_leads(&member)
                }
                current => AppError::Conflict {
                    message: "Concurrent modification detected".to_string(),
                    current_version: current.map(|m| m.version).unwrap_or(0),
                },
            });
        }

        self.increment_revision().await?;

        Ok(TeamMember {
            id: id.to_string(),
            display_name: display_name.clone(),
            email,
            active,
            available,
            territories,
            skills,
            working_hours,
            max_active_leads,
            workload: existing.workload,
            updated_at: now,
            version: new_version,
        })
    }

    /// Delete a member. Members who still own leads are kept.
    pub async fn delete_member(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM members WHERE id = ? AND workload = 0")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(match self.get_member(id).await? {
                Some(member) => AppError::field(
                    "workload",
                    format!(
                        "Member {} still owns {} lead(s); reassign them first",
                        id, member.workload
                    ),
                ),
                None => AppError::NotFound(format!("Member {} not found", id)),
            });
        }

        self.increment_revision().await?;
        Ok(())
    }

    // ==================== CUSTOMER OPERATIONS ====================

    pub async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        let rows = sqlx::query(
            "SELECT id, name, phone, email, created_at FROM customers ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(customer_from_row).collect())
    }

    pub async fn create_customer(
        &self,
        request: &CreateCustomerRequest,
    ) -> Result<Customer, AppError> {
        let customer = Customer {
            id: uuid::Uuid::new_v4().to_string(),
            name: request.name.trim().to_string(),
            phone: request.phone.clone(),
            email: request.email.clone(),
            created_at: Utc::now().to_rfc3339(),
        };

        sqlx::query("INSERT INTO customers (id, name, phone, email, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(&customer.id)
            .bind(&customer.name)
            .bind(&customer.phone)
            .bind(&customer.email)
            .bind(&customer.created_at)
            .execute(&self.pool)
            .await?;

        self.increment_revision().await?;
        Ok(customer)
    }

    // ==================== SETTINGS ====================

    /// Current engine settings, or the defaults when none were saved.
    pub async fn load_settings(&self) -> Result<EngineSettings, AppError> {
        let row = sqlx::query("SELECT body FROM settings WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let body: String = row.get("body");
                serde_json::from_str(&body).map_err(|e| {
                    AppError::Configuration(format!("Stored settings are unreadable: {}", e))
                })
            }
            None => Ok(EngineSettings::default()),
        }
    }

    /// Persist settings. Callers validate before saving.
    pub async fn save_settings(&self, settings: &EngineSettings) -> Result<(), AppError> {
        let body = serde_json::to_string(settings)?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO settings (id, body, updated_at) VALUES (1, ?, ?) ON CONFLICT(id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
        )
        .bind(&body)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;
        Ok(())
    }
}

#[async_trait]
impl LeadRepository for Repository {
    async fn list_leads(&self) -> Result<Vec<Lead>, AppError> {
        let sql = format!(
            "SELECT {} FROM leads ORDER BY created_at DESC, id",
            LEAD_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(lead_from_row).collect()
    }

    async fn get_lead(&self, id: &str) -> Result<Option<Lead>, AppError> {
        let mut conn = self.pool.acquire().await?;
        fetch_lead(&mut conn, id).await
    }

    async fn insert_lead(&self, lead: &Lead) -> Result<(), AppError> {
        let sql = format!(
            "INSERT INTO leads ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?, ?, ?)",
            LEAD_COLUMNS
        );

        sqlx::query(&sql)
            .bind(&lead.id)
            .bind(&lead.first_name)
            .bind(&lead.last_name)
            .bind(&lead.phone)
            .bind(&lead.email)
            .bind(&lead.address)
            .bind(&lead.zip)
            .bind(lead.property_value)
            .bind(lead.roof_age)
            .bind(&lead.roof_type)
            .bind(&lead.project_type)
            .bind(lead.urgency.as_str())
            .bind(&lead.source)
            .bind(lead.budget_min)
            .bind(lead.budget_max)
            .bind(lead.bant.budget_confirmed as i32)
            .bind(lead.bant.decision_maker as i32)
            .bind(lead.bant.need_identified as i32)
            .bind(lead.bant.timeline_defined as i32)
            .bind(i64::from(lead.score))
            .bind(lead.temperature.as_str())
            .bind(lead.status.as_str())
            .bind(&lead.notes)
            .bind(&lead.created_at)
            .bind(&lead.updated_at)
            .bind(lead.version)
            .execute(&self.pool)
            .await?;

        self.increment_revision().await?;
        Ok(())
    }

    async fn update_scoring(
        &self,
        id: &str,
        expected_version: i64,
        score: u8,
        temperature: Temperature,
    ) -> Result<Lead, AppError> {
        let mut tx = self.write_tx().await?;
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "UPDATE leads SET score = ?, temperature = ?, updated_at = ?, version = version + 1 WHERE id = ? AND version = ?",
        )
        .bind(i64::from(score))
        .bind(temperature.as_str())
        .bind(&now)
        .bind(id)
        .bind(expected_version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(stale_write(&mut tx, id).await?);
        }

        let lead = fetch_lead(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lead {} not found", id)))?;
        tx.commit().await?;
        Ok(lead)
    }

    async fn apply_transition(
        &self,
        expected_version: i64,
        record: &TransitionRecord,
    ) -> Result<Lead, AppError> {
        let mut tx = self.write_tx().await?;

        let result = sqlx::query(
            "UPDATE leads SET status = ?, updated_at = ?, version = version + 1 WHERE id = ? AND version = ? AND status = ?",
        )
        .bind(record.to_status.as_str())
        .bind(&record.at)
        .bind(&record.lead_id)
        .bind(expected_version)
        .bind(record.from_status.as_str())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(stale_write(&mut tx, &record.lead_id).await?);
        }

        sqlx::query(
            "INSERT INTO lead_transitions (id, lead_id, from_status, to_status, actor, at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.lead_id)
        .bind(record.from_status.as_str())
        .bind(record.to_status.as_str())
        .bind(&record.actor)
        .bind(&record.at)
        .execute(&mut *tx)
        .await?;

        let lead = fetch_lead(&mut tx, &record.lead_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lead {} not found", record.lead_id)))?;
        tx.commit().await?;
        Ok(lead)
    }

    async fn apply_assignment(
        &self,
        id: &str,
        expected_version: i64,
        member_id: Option<&str>,
    ) -> Result<Lead, AppError> {
        let mut tx = self.write_tx().await?;

        let row = sqlx::query("SELECT assigned_to, version FROM leads WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lead {} not found", id)))?;
        let prior: Option<String> = row.get("assigned_to");
        let version: i64 = row.get("version");

        if version != expected_version {
            return Err(AppError::Conflict {
                message: format!(
                    "Version mismatch for lead {}: expected {}, current {}",
                    id, expected_version, version
                ),
                current_version: version,
            });
        }

        if let Some(next) = member_id {
            let claimed =
                sqlx::query("UPDATE members SET workload = workload + 1 WHERE id = ? AND active = 1")
                    .bind(next)
                    .execute(&mut *tx)
                    .await?;
            if claimed.rows_affected() == 0 {
                return Err(AppError::field(
                    "memberId",
                    format!("Team member {} does not exist or is inactive", next),
                ));
            }
        }

        if let Some(previous) = prior.as_deref() {
            sqlx::query("UPDATE members SET workload = workload - 1 WHERE id = ? AND workload > 0")
                .bind(previous)
                .execute(&mut *tx)
                .await?;
        }

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE leads SET assigned_to = ?, updated_at = ?, version = version + 1 WHERE id = ? AND version = ?",
        )
        .bind(member_id)
        .bind(&now)
        .bind(id)
        .bind(expected_version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(stale_write(&mut tx, id).await?);
        }

        let lead = fetch_lead(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lead {} not found", id)))?;
        tx.commit().await?;
        Ok(lead)
    }

    async fn delete_lead(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.write_tx().await?;

        let row = sqlx::query("SELECT assigned_to FROM leads WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lead {} not found", id)))?;
        let owner: Option<String> = row.get("assigned_to");

        sqlx::query("DELETE FROM leads WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if let Some(owner) = owner {
            sqlx::query("UPDATE members SET workload = workload - 1 WHERE id = ? AND workload > 0")
                .bind(&owner)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_transitions(&self, lead_id: &str) -> Result<Vec<TransitionRecord>, AppError> {
        let rows = sqlx::query(
            "SELECT id, lead_id, from_status, to_status, actor, at FROM lead_transitions WHERE lead_id = ? ORDER BY at, rowid",
        )
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(transition_from_row).collect()
    }

    async fn known_contacts(&self) -> Result<Vec<KnownContact>, AppError> {
        let lead_rows = sqlx::query(
            "SELECT id, first_name, last_name, phone, email FROM leads ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;
        let customer_rows =
            sqlx::query("SELECT id, name, phone, email FROM customers ORDER BY created_at, id")
                .fetch_all(&self.pool)
                .await?;

        let leads = lead_rows.iter().map(|row| {
            let first: String = row.get("first_name");
            let last: String = row.get("last_name");
            KnownContact {
                kind: ContactKind::Lead,
                id: row.get("id"),
                name: format!("{} {}", first, last),
                phone: row.get("phone"),
                email: row.get("email"),
            }
        });
        let customers = customer_rows.iter().map(|row| KnownContact {
            kind: ContactKind::Customer,
            id: row.get("id"),
            name: row.get("name"),
            phone: row.get("phone"),
            email: row.get("email"),
        });

        Ok(leads.chain(customers).collect())
    }
}

#[async_trait]
impl TeamRepository for Repository {
    async fn list_members(&self) -> Result<Vec<TeamMember>, AppError> {
        let sql = format!("SELECT {} FROM members ORDER BY display_name", MEMBER_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(member_from_row).collect())
    }

    async fn get_member(&self, id: &str) -> Result<Option<TeamMember>, AppError> {
        let sql = format!("SELECT {} FROM members WHERE id = ?", MEMBER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(member_from_row))
    }

    async fn next_rotation_cursor(&self) -> Result<u64, AppError> {
        let row = sqlx::query(
            "UPDATE meta SET rotation_cursor = rotation_cursor + 1 WHERE id = 1 RETURNING rotation_cursor",
        )
        .fetch_one(&self.pool)
        .await?;
        let advanced: i64 = row.get("rotation_cursor");
        Ok(advanced.saturating_sub(1).max(0) as u64)
    }
}

// Helper functions shared by transactional writes

async fn bump_revision(conn: &mut SqliteConnection) -> Result<(), AppError> {
    let now = Utc::now().to_rfc3339();
    sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
        .bind(&now)
        .execute(conn)
        .await?;
    Ok(())
}

async fn fetch_lead(conn: &mut SqliteConnection, id: &str) -> Result<Option<Lead>, AppError> {
    let sql = format!("SELECT {} FROM leads WHERE id = ?", LEAD_COLUMNS);
    let row = sqlx::query(&sql).bind(id).fetch_optional(conn).await?;
    row.as_ref().map(lead_from_row).transpose()
}

/// Explain why a version-checked write touched no rows.
async fn stale_write(conn: &mut SqliteConnection, id: &str) -> Result<AppError, AppError> {
    let row = sqlx::query("SELECT version FROM leads WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(match row {
        Some(row) => AppError::Conflict {
            message: format!("Concurrent modification detected for lead {}", id),
            current_version: row.get("version"),
        },
        None => AppError::NotFound(format!("Lead {} not found", id)),
    })
}

fn deactivate_with_leads(member: &TeamMember) -> AppError {
    AppError::field(
        "active",
        format!(
            "Member {} still owns {} lead(s); reassign them before deactivating",
            member.id, member.workload
        ),
    )
}

// Helper functions for row conversion

fn decode<T>(value: Option<T>, column: &str, raw: &str) -> Result<T, AppError> {
    value.ok_or_else(|| {
        AppError::Internal(format!("Unrecognized value {:?} in column {}", raw, column))
    })
}

fn lead_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Lead, AppError> {
    let urgency: String = row.get("urgency");
    let temperature: String = row.get("temperature");
    let status: String = row.get("status");
    let score: i64 = row.get("score");
    let flag = |column: &str| row.get::<i32, _>(column) != 0;

    Ok(Lead {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        phone: row.get("phone"),
        email: row.get("email"),
        address: row.get("address"),
        zip: row.get("zip"),
        property_value: row.get("property_value"),
        roof_age: row.get("roof_age"),
        roof_type: row.get("roof_type"),
        project_type: row.get("project_type"),
        urgency: decode(Urgency::from_str(&urgency), "urgency", &urgency)?,
        source: row.get("source"),
        budget_min: row.get("budget_min"),
        budget_max: row.get("budget_max"),
        bant: BantFlags {
            budget_confirmed: flag("bant_budget_confirmed"),
            decision_maker: flag("bant_decision_maker"),
            need_identified: flag("bant_need_identified"),
            timeline_defined: flag("bant_timeline_defined"),
        },
        score: decode(u8::try_from(score).ok(), "score", &score.to_string())?,
        temperature: decode(Temperature::from_str(&temperature), "temperature", &temperature)?,
        status: decode(LeadStatus::from_str(&status), "status", &status)?,
        assigned_to: row.get("assigned_to"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    })
}

fn member_from_row(row: &sqlx::sqlite::SqliteRow) -> TeamMember {
    let active: i32 = row.get("active");
    let available: i32 = row.get("available");
    let territories: Option<String> = row.get("territories");
    let skills: Option<String> = row.get("skills");
    let hours: Option<String> = row.get("working_hours");
    let max_active_leads: Option<i64> = row.get("max_active_leads");
    let workload: i64 = row.get("workload");

    TeamMember {
        id: row.get("id"),
        display_name: row.get("display_name"),
        email: row.get("email"),
        active: active != 0,
        available: available != 0,
        territories: territories.map(|s| parse_json_array(&s)).unwrap_or_default(),
        skills: skills.map(|s| parse_json_array(&s)).unwrap_or_default(),
        working_hours: hours.and_then(|s| serde_json::from_str::<WorkingHours>(&s).ok()),
        max_active_leads: max_active_leads.and_then(|n| u32::try_from(n).ok()),
        workload: u32::try_from(workload).unwrap_or(0),
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    }
}

fn transition_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<TransitionRecord, AppError> {
    let from: String = row.get("from_status");
    let to: String = row.get("to_status");
    Ok(TransitionRecord {
        id: row.get("id"),
        lead_id: row.get("lead_id"),
        from_status: decode(LeadStatus::from_str(&from), "from_status", &from)?,
        to_status: decode(LeadStatus::from_str(&to), "to_status", &to)?,
        actor: row.get("actor"),
        at: row.get("at"),
    })
}

fn customer_from_row(row: &sqlx::sqlite::SqliteRow) -> Customer {
    Customer {
        id: row.get("id"),
        name: row.get("name"),
        phone: row.get("phone"),
        email: row.get("email"),
        created_at: row.get("created_at"),
    }
}

fn parse_json_array(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("repo.sqlite")).await.unwrap();
        (dir, Repository::new(pool))
    }

    fn member_request(name: &str) -> CreateMemberRequest {
        CreateMemberRequest {
            display_name: name.to_string(),
            email: None,
            active: true,
            available: true,
            territories: vec!["303*".to_string()],
            skills: vec!["siding".to_string()],
            working_hours: None,
            max_active_leads: Some(3),
        }
    }

    fn lead(id: &str) -> Lead {
        let now = Utc::now().to_rfc3339();
        Lead {
            id: id.to_string(),
            first_name: "Kim".to_string(),
            last_name: "Ode".to_string(),
            phone: "5550100000".to_string(),
            email: Some("kim@example.com".to_string()),
            address: "3 Pine Ct".to_string(),
            zip: "30303".to_string(),
            property_value: Some(250_000.0),
            roof_age: None,
            roof_type: None,
            project_type: "siding".to_string(),
            urgency: Urgency::WithinOneWeek,
            source: Some("google_ads".to_string()),
            budget_min: None,
            budget_max: None,
            bant: BantFlags {
                decision_maker: true,
                ..BantFlags::default()
            },
            score: 31,
            temperature: Temperature::Cold,
            status: LeadStatus::New,
            assigned_to: None,
            notes: None,
            created_at: now.clone(),
            updated_at: now,
            version: 1,
        }
    }

    #[tokio::test]
    async fn test_lead_round_trips_through_storage() {
        let (_dir, repo) = setup().await;
        let stored = lead("lead-1");
        repo.insert_lead(&stored).await.unwrap();

        let loaded = repo.get_lead("lead-1").await.unwrap().unwrap();
        assert_eq!(loaded, stored);
        assert!(repo.get_lead("lead-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transition_is_version_checked() {
        let (_dir, repo) = setup().await;
        repo.insert_lead(&lead("lead-1")).await.unwrap();
        let revision = repo.get_revision_id().await.unwrap();

        let record = TransitionRecord {
            id: "t-1".to_string(),
            lead_id: "lead-1".to_string(),
            from_status: LeadStatus::New,
            to_status: LeadStatus::Contacted,
            actor: "tester".to_string(),
            at: Utc::now().to_rfc3339(),
        };
        let updated = repo.apply_transition(1, &record).await.unwrap();
        assert_eq!(updated.status, LeadStatus::Contacted);
        assert_eq!(updated.version, 2);
        assert!(repo.get_revision_id().await.unwrap() > revision);

        let stale = TransitionRecord {
            id: "t-2".to_string(),
            from_status: LeadStatus::Contacted,
            to_status: LeadStatus::Qualified,
            ..record.clone()
        };
        let err = repo.apply_transition(1, &stale).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { current_version: 2, .. }));
        assert_eq!(repo.list_transitions("lead-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_assignment_tracks_workload() {
        let (_dir, repo) = setup().await;
        let member = repo.create_member(&member_request("Ola")).await.unwrap();
        repo.insert_lead(&lead("lead-1")).await.unwrap();

        let assigned = repo
            .apply_assignment("lead-1", 1, Some(&member.id))
            .await
            .unwrap();
        assert_eq!(assigned.assigned_to.as_deref(), Some(member.id.as_str()));
        assert_eq!(repo.get_member(&member.id).await.unwrap().unwrap().workload, 1);

        let err = repo.delete_member(&member.id).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        repo.delete_lead("lead-1").await.unwrap();
        assert_eq!(repo.get_member(&member.id).await.unwrap().unwrap().workload, 0);
        repo.delete_member(&member.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_rotation_cursor_advances() {
        let (_dir, repo) = setup().await;
        assert_eq!(repo.next_rotation_cursor().await.unwrap(), 0);
        assert_eq!(repo.next_rotation_cursor().await.unwrap(), 1);
        assert_eq!(repo.next_rotation_cursor().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_settings_default_then_saved() {
        let (_dir, repo) = setup().await;
        assert_eq!(repo.load_settings().await.unwrap(), EngineSettings::default());

        let mut settings = EngineSettings::default();
        settings.zip_tiers.target.insert("30303".to_string());
        repo.save_settings(&settings).await.unwrap();
        assert_eq!(repo.load_settings().await.unwrap(), settings);
    }

    #[tokio::test]
    async fn test_known_contacts_lists_leads_before_customers() {
        let (_dir, repo) = setup().await;
        repo.create_customer(&CreateCustomerRequest {
            name: "Rae Fox".to_string(),
            phone: Some("5550100000".to_string()),
            email: None,
        })
        .await
        .unwrap();
        repo.insert_lead(&lead("lead-1")).await.unwrap();

        let contacts = repo.known_contacts().await.unwrap();
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].kind, ContactKind::Lead);
        assert_eq!(contacts[0].name, "Kim Ode");
        assert_eq!(contacts[1].kind, ContactKind::Customer);
    }
}

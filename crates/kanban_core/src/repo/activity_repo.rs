//! Project activity history.
//!
//! # Responsibility
//! - Append one history row per successful board mutation.
//! - List project history newest first.
//!
//! # Invariants
//! - Rows are append-only.
//! - Writes share the caller's transaction, so a rolled-back mutation leaves
//!   no history behind.

use super::{ensure_schema_ready, parse_uuid, RepoResult};
use crate::model::board::{Activity, ProjectId, UserId};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const DEFAULT_ACTIVITY_LIMIT: u32 = 50;
const ACTIVITY_LIMIT_MAX: u32 = 500;

/// Action verb stored in `activities.action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityAction {
    Created,
    Updated,
    Moved,
    Assigned,
    Deleted,
}

impl ActivityAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Updated => "UPDATED",
            Self::Moved => "MOVED",
            Self::Assigned => "ASSIGNED",
            Self::Deleted => "DELETED",
        }
    }
}

/// Entity kind stored in `activities.entity_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityEntity {
    Column,
    Card,
}

impl ActivityEntity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Column => "COLUMN",
            Self::Card => "CARD",
        }
    }
}

/// Repository interface for activity history.
pub trait ActivityRepository {
    /// Appends one history row.
    fn record(
        &self,
        project_uuid: ProjectId,
        user_uuid: UserId,
        action: ActivityAction,
        entity: ActivityEntity,
        entity_uuid: Uuid,
        details: &str,
    ) -> RepoResult<()>;
    /// Lists newest-first history for one project.
    fn list_for_project(
        &self,
        project_uuid: ProjectId,
        limit: Option<u32>,
    ) -> RepoResult<Vec<Activity>>;
}

/// SQLite-backed activity repository.
pub struct SqliteActivityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteActivityRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(
            conn,
            "activities",
            &[
                "activity_uuid",
                "project_uuid",
                "user_uuid",
                "action",
                "entity_type",
                "entity_uuid",
                "details",
            ],
        )?;
        Ok(Self::new(conn))
    }

    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ActivityRepository for SqliteActivityRepository<'_> {
    fn record(
        &self,
        project_uuid: ProjectId,
        user_uuid: UserId,
        action: ActivityAction,
        entity: ActivityEntity,
        entity_uuid: Uuid,
        details: &str,
    ) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO activities (
                activity_uuid,
                project_uuid,
                user_uuid,
                action,
                entity_type,
                entity_uuid,
                details
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                Uuid::new_v4().to_string(),
                project_uuid.to_string(),
                user_uuid.to_string(),
                action.as_str(),
                entity.as_str(),
                entity_uuid.to_string(),
                details,
            ],
        )?;
        Ok(())
    }

    fn list_for_project(
        &self,
        project_uuid: ProjectId,
        limit: Option<u32>,
    ) -> RepoResult<Vec<Activity>> {
        let applied_limit = limit
            .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
            .clamp(1, ACTIVITY_LIMIT_MAX);
        let mut stmt = self.conn.prepare(
            "SELECT
                activity_uuid,
                project_uuid,
                user_uuid,
                action,
                entity_type,
                entity_uuid,
                details,
                created_at
             FROM activities
             WHERE project_uuid = ?1
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2;",
        )?;
        let mut rows = stmt.query(params![
            project_uuid.to_string(),
            i64::from(applied_limit)
        ])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_activity_row(row)?);
        }
        Ok(items)
    }
}

fn parse_activity_row(row: &Row<'_>) -> RepoResult<Activity> {
    let activity_uuid_text: String = row.get("activity_uuid")?;
    let project_uuid_text: String = row.get("project_uuid")?;
    let user_uuid_text: String = row.get("user_uuid")?;
    let entity_uuid_text: String = row.get("entity_uuid")?;
    Ok(Activity {
        activity_uuid: parse_uuid(&activity_uuid_text, "activities.activity_uuid")?,
        project_uuid: parse_uuid(&project_uuid_text, "activities.project_uuid")?,
        user_uuid: parse_uuid(&user_uuid_text, "activities.user_uuid")?,
        action: row.get("action")?,
        entity_type: row.get("entity_type")?,
        entity_uuid: parse_uuid(&entity_uuid_text, "activities.entity_uuid")?,
        details: row.get("details")?,
        created_at: row.get("created_at")?,
    })
}

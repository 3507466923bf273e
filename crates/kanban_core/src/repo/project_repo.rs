//! Project and membership repository.
//!
//! # Responsibility
//! - Persist projects and their member roles.
//! - Answer role lookups for the edit-permission policy.
//!
//! # Invariants
//! - The project owner is always recorded as an `admin` member.
//! - Only live projects are returned by `get_project`.

use super::{ensure_schema_ready, parse_flag, parse_uuid, RepoError, RepoResult};
use crate::model::board::{Project, ProjectId, ProjectRole, UserId, DEFAULT_PROJECT_COLOR};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

/// Repository interface for projects and members.
pub trait ProjectRepository {
    /// Creates one project and registers `owner` as admin.
    fn create_project(
        &self,
        owner: UserId,
        name: &str,
        description: Option<&str>,
        color: Option<&str>,
    ) -> RepoResult<Project>;
    /// Loads one live project.
    fn get_project(&self, project_uuid: ProjectId) -> RepoResult<Option<Project>>;
    /// Inserts or replaces one member role.
    fn add_member(
        &self,
        project_uuid: ProjectId,
        user_uuid: UserId,
        role: ProjectRole,
    ) -> RepoResult<()>;
    /// Loads the role of one member, if any.
    fn member_role(
        &self,
        project_uuid: ProjectId,
        user_uuid: UserId,
    ) -> RepoResult<Option<ProjectRole>>;
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(
            conn,
            "projects",
            &["project_uuid", "name", "owner_uuid", "is_deleted"],
        )?;
        ensure_schema_ready(conn, "project_members", &["project_uuid", "user_uuid", "role"])?;
        Ok(Self::new(conn))
    }

    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create_project(
        &self,
        owner: UserId,
        name: &str,
        description: Option<&str>,
        color: Option<&str>,
    ) -> RepoResult<Project> {
        let project_uuid = Uuid::new_v4();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO projects (project_uuid, name, description, color, owner_uuid)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                project_uuid.to_string(),
                name,
                description,
                color.unwrap_or(DEFAULT_PROJECT_COLOR),
                owner.to_string(),
            ],
        )?;
        upsert_member(&tx, project_uuid, owner, ProjectRole::Admin)?;
        tx.commit()?;

        self.get_project(project_uuid)?.ok_or_else(|| {
            RepoError::InvalidData(format!("created project {project_uuid} not found"))
        })
    }

    fn get_project(&self, project_uuid: ProjectId) -> RepoResult<Option<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                project_uuid,
                name,
                description,
                color,
                owner_uuid,
                is_deleted,
                created_at,
                updated_at
             FROM projects
             WHERE project_uuid = ?1
               AND is_deleted = 0;",
        )?;
        let mut rows = stmt.query([project_uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_project_row(row)?));
        }
        Ok(None)
    }

    fn add_member(
        &self,
        project_uuid: ProjectId,
        user_uuid: UserId,
        role: ProjectRole,
    ) -> RepoResult<()> {
        upsert_member(self.conn, project_uuid, user_uuid, role)
    }

    fn member_role(
        &self,
        project_uuid: ProjectId,
        user_uuid: UserId,
    ) -> RepoResult<Option<ProjectRole>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT m.role
                 FROM project_members m
                 INNER JOIN projects p ON p.project_uuid = m.project_uuid
                 WHERE m.project_uuid = ?1
                   AND m.user_uuid = ?2
                   AND p.is_deleted = 0;",
                params![project_uuid.to_string(), user_uuid.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        value
            .map(|role| {
                ProjectRole::parse(&role).ok_or_else(|| {
                    RepoError::InvalidData(format!(
                        "invalid role `{role}` in project_members.role"
                    ))
                })
            })
            .transpose()
    }
}

fn upsert_member(
    conn: &Connection,
    project_uuid: ProjectId,
    user_uuid: UserId,
    role: ProjectRole,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO project_members (project_uuid, user_uuid, role)
         VALUES (?1, ?2, ?3)
         ON CONFLICT (project_uuid, user_uuid) DO UPDATE SET role = excluded.role;",
        params![project_uuid.to_string(), user_uuid.to_string(), role.as_str()],
    )?;
    Ok(())
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let project_uuid_text: String = row.get("project_uuid")?;
    let owner_uuid_text: String = row.get("owner_uuid")?;
    Ok(Project {
        project_uuid: parse_uuid(&project_uuid_text, "projects.project_uuid")?,
        name: row.get("name")?,
        description: row.get("description")?,
        color: row.get("color")?,
        owner_uuid: parse_uuid(&owner_uuid_text, "projects.owner_uuid")?,
        is_deleted: parse_flag(row.get("is_deleted")?, "projects.is_deleted")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

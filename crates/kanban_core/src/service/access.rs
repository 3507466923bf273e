//! Caller identity and edit-permission seams.
//!
//! # Responsibility
//! - Resolve the acting user for a service call.
//! - Decide whether that user may mutate a project's board.
//!
//! # Invariants
//! - Permission checks run on the caller's connection, so inside a write
//!   transaction they see the same snapshot as the mutation.

use super::error::{BoardError, BoardResult};
use crate::model::board::{ProjectId, UserId};
use crate::repo::project_repo::{ProjectRepository, SqliteProjectRepository};
use crate::repo::RepoResult;
use rusqlite::Connection;

/// Source of the acting user's identity.
pub trait Identity {
    /// Returns `None` when no valid session is attached.
    fn current_user(&self) -> Option<UserId>;
}

/// Edit-permission oracle.
pub trait EditPolicy {
    fn can_edit(&self, conn: &Connection, project: ProjectId, user: UserId) -> RepoResult<bool>;
}

/// Identity resolved once per request by the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    user: Option<UserId>,
}

impl Session {
    pub fn authenticated(user: UserId) -> Self {
        Self { user: Some(user) }
    }

    pub fn anonymous() -> Self {
        Self { user: None }
    }
}

impl Identity for Session {
    fn current_user(&self) -> Option<UserId> {
        self.user
    }
}

/// Grants edit rights to project members holding `admin` or `editor`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemberRolePolicy;

impl EditPolicy for MemberRolePolicy {
    fn can_edit(&self, conn: &Connection, project: ProjectId, user: UserId) -> RepoResult<bool> {
        let role = SqliteProjectRepository::new(conn).member_role(project, user)?;
        Ok(role.is_some_and(|role| role.can_edit()))
    }
}

/// Resolves the caller and checks edit rights on `project`.
pub(crate) fn require_editor<I: Identity, P: EditPolicy>(
    identity: &I,
    policy: &P,
    conn: &Connection,
    project: ProjectId,
) -> BoardResult<UserId> {
    let user = identity
        .current_user()
        .ok_or(BoardError::Unauthenticated)?;
    if !policy.can_edit(conn, project, user)? {
        return Err(BoardError::Forbidden(project));
    }
    Ok(user)
}

//! Column ordering use-case service.
//!
//! # Responsibility
//! - Create, move, rename, and delete columns of one project.
//! - Keep column positions contiguous per project through the ordering engine.
//!
//! # Invariants
//! - Live column names are unique per project, compared case-insensitively.
//! - A rejected create never consumes a position.
//! - Every mutation and its activity row commit together or not at all.

use super::access::{require_editor, EditPolicy, Identity, MemberRolePolicy, Session};
use super::error::{BoardError, BoardResult};
use super::transaction::run_serialized;
use super::{log_failure, normalize_name, verify_scopes};
use crate::config::OrderingConfig;
use crate::model::board::{Column, ColumnId, ColumnUpdate, NewColumn, ProjectId};
use crate::ordering::{Scope, Sequenced, SequencedCollection};
use crate::repo::activity_repo::{
    ActivityAction, ActivityEntity, ActivityRepository, SqliteActivityRepository,
};
use crate::repo::board_repo::SqliteBoardRepository;
use crate::repo::position_repo::SqlitePositionGateway;
use crate::repo::project_repo::{ProjectRepository, SqliteProjectRepository};
use log::info;
use rusqlite::Connection;

/// Column service facade bound to one connection and caller.
pub struct ColumnService<'conn, I: Identity = Session, P: EditPolicy = MemberRolePolicy> {
    conn: &'conn Connection,
    identity: I,
    policy: P,
    config: OrderingConfig,
}

impl<'conn, I: Identity, P: EditPolicy> ColumnService<'conn, I, P> {
    /// Creates service after checking the board schema is ready.
    pub fn new(conn: &'conn Connection, identity: I, policy: P) -> BoardResult<Self> {
        SqliteProjectRepository::try_new(conn)?;
        SqliteBoardRepository::try_new(conn)?;
        SqliteActivityRepository::try_new(conn)?;
        Ok(Self {
            conn,
            identity,
            policy,
            config: OrderingConfig::default(),
        })
    }

    /// Replaces retry and verification tunables.
    pub fn with_config(mut self, config: OrderingConfig) -> Self {
        self.config = config;
        self
    }

    /// Appends one column at the end of the project's board.
    pub fn create_column(&self, project_uuid: ProjectId, column: NewColumn) -> BoardResult<Column> {
        let result = normalize_name(&column.name).and_then(|name| {
            let column = NewColumn { name, ..column };
            run_serialized(self.conn, &self.config, "column_create", |tx| {
                if SqliteProjectRepository::new(tx)
                    .get_project(project_uuid)?
                    .is_none()
                {
                    return Err(BoardError::ProjectNotFound(project_uuid));
                }
                let user = require_editor(&self.identity, &self.policy, tx, project_uuid)?;

                let board = SqliteBoardRepository::new(tx);
                if board.column_name_taken(project_uuid, &column.name, None)? {
                    return Err(BoardError::Conflict(column.name.clone()));
                }

                let gateway = SqlitePositionGateway::new(tx);
                let sequence = SequencedCollection::new(&gateway);
                let scope = Scope::project_columns(project_uuid);
                let position = sequence.append(scope)?;
                let created = board.insert_column(project_uuid, &column, position)?;
                verify_scopes(&self.config, &sequence, &[scope])?;

                SqliteActivityRepository::new(tx).record(
                    project_uuid,
                    user,
                    ActivityAction::Created,
                    ActivityEntity::Column,
                    created.column_uuid,
                    &format!("created column '{}'", created.name),
                )?;
                Ok(created)
            })
        });

        match &result {
            Ok(created) => info!(
                "event=column_create module=service status=ok project={} column={} position={}",
                project_uuid, created.column_uuid, created.position
            ),
            Err(err) => log_failure("column_create", err),
        }
        result
    }

    /// Moves one column to `new_position` inside its project.
    ///
    /// `new_position` must lie in `[0, n-1]`. Moving to the current slot is a
    /// no-op and records no activity.
    pub fn move_column(&self, column_uuid: ColumnId, new_position: i64) -> BoardResult<Column> {
        let result = run_serialized(self.conn, &self.config, "column_move", |tx| {
            let board = SqliteBoardRepository::new(tx);
            let column = board
                .find_column(column_uuid)?
                .ok_or(BoardError::ColumnNotFound(column_uuid))?;
            let user = require_editor(&self.identity, &self.policy, tx, column.project_uuid)?;

            let gateway = SqlitePositionGateway::new(tx);
            let sequence = SequencedCollection::new(&gateway);
            let scope = column.scope();
            let shifted =
                sequence.move_within_scope(scope, column_uuid, column.position, new_position)?;
            if new_position == column.position {
                return Ok((column, 0));
            }
            verify_scopes(&self.config, &sequence, &[scope])?;

            SqliteActivityRepository::new(tx).record(
                column.project_uuid,
                user,
                ActivityAction::Moved,
                ActivityEntity::Column,
                column_uuid,
                &format!(
                    "moved column '{}' from {} to {}",
                    column.name, column.position, new_position
                ),
            )?;
            Ok((board.require_column(column_uuid)?, shifted))
        });

        match result {
            Ok((moved, shifted)) => {
                info!(
                    "event=column_move module=service status=ok column={} position={} shifted={}",
                    column_uuid, moved.position, shifted
                );
                Ok(moved)
            }
            Err(err) => {
                log_failure("column_move", &err);
                Err(err)
            }
        }
    }

    /// Soft-deletes one column and closes its slot.
    ///
    /// Cards of the deleted column are left in place with their positions.
    pub fn delete_column(&self, column_uuid: ColumnId) -> BoardResult<()> {
        let result = run_serialized(self.conn, &self.config, "column_delete", |tx| {
            let board = SqliteBoardRepository::new(tx);
            let column = board
                .find_column(column_uuid)?
                .ok_or(BoardError::ColumnNotFound(column_uuid))?;
            let user = require_editor(&self.identity, &self.policy, tx, column.project_uuid)?;

            if !board.soft_delete_column(column_uuid)? {
                return Err(BoardError::ColumnNotFound(column_uuid));
            }
            let gateway = SqlitePositionGateway::new(tx);
            let sequence = SequencedCollection::new(&gateway);
            let scope = column.scope();
            sequence.remove(scope, column_uuid, column.position)?;
            verify_scopes(&self.config, &sequence, &[scope])?;

            SqliteActivityRepository::new(tx).record(
                column.project_uuid,
                user,
                ActivityAction::Deleted,
                ActivityEntity::Column,
                column_uuid,
                &format!("deleted column '{}'", column.name),
            )?;
            Ok(column)
        });

        match result {
            Ok(column) => {
                info!(
                    "event=column_delete module=service status=ok column={} position={}",
                    column_uuid, column.position
                );
                Ok(())
            }
            Err(err) => {
                log_failure("column_delete", &err);
                Err(err)
            }
        }
    }

    /// Replaces name, color, and card limit of one column.
    ///
    /// Position is untouched. Lowering `card_limit` below the current live
    /// count is allowed; it only blocks further inserts.
    pub fn update_column(&self, column_uuid: ColumnId, update: ColumnUpdate) -> BoardResult<Column> {
        let name = normalize_name(&update.name)?;
        let update = ColumnUpdate { name, ..update };
        run_serialized(self.conn, &self.config, "column_update", |tx| {
            let board = SqliteBoardRepository::new(tx);
            let column = board
                .find_column(column_uuid)?
                .ok_or(BoardError::ColumnNotFound(column_uuid))?;
            let user = require_editor(&self.identity, &self.policy, tx, column.project_uuid)?;

            if board.column_name_taken(column.project_uuid, &update.name, Some(column_uuid))? {
                return Err(BoardError::Conflict(update.name.clone()));
            }
            if !board.update_column_fields(column_uuid, &update)? {
                return Err(BoardError::ColumnNotFound(column_uuid));
            }

            SqliteActivityRepository::new(tx).record(
                column.project_uuid,
                user,
                ActivityAction::Updated,
                ActivityEntity::Column,
                column_uuid,
                &format!("updated column '{}'", update.name),
            )?;
            Ok(board.require_column(column_uuid)?)
        })
    }

    /// Lists live columns of one live project ordered by position.
    pub fn list_columns(&self, project_uuid: ProjectId) -> BoardResult<Vec<Column>> {
        if SqliteProjectRepository::new(self.conn)
            .get_project(project_uuid)?
            .is_none()
        {
            return Err(BoardError::ProjectNotFound(project_uuid));
        }
        Ok(SqliteBoardRepository::new(self.conn).list_columns(project_uuid)?)
    }
}

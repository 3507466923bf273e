//! Card ordering use-case service.
//!
//! # Responsibility
//! - Create, move (within or across columns), edit, assign, and delete cards.
//! - Enforce column capacity before any position is touched.
//!
//! # Invariants
//! - A column with `card_limit > 0` never gains a card while it holds
//!   `card_limit` live cards.
//! - A cross-column move shifts both columns in one transaction.

use super::access::{require_editor, EditPolicy, Identity, MemberRolePolicy, Session};
use super::error::{BoardError, BoardResult};
use super::transaction::run_serialized;
use super::{log_failure, normalize_name, verify_scopes};
use crate::config::OrderingConfig;
use crate::model::board::{Card, CardId, CardUpdate, Column, ColumnId, NewCard, UserId};
use crate::ordering::{Sequenced, SequencedCollection};
use crate::repo::activity_repo::{
    ActivityAction, ActivityEntity, ActivityRepository, SqliteActivityRepository,
};
use crate::repo::board_repo::SqliteBoardRepository;
use crate::repo::position_repo::SqlitePositionGateway;
use crate::repo::project_repo::SqliteProjectRepository;
use log::info;
use rusqlite::Connection;

/// Card service facade bound to one connection and caller.
pub struct CardService<'conn, I: Identity = Session, P: EditPolicy = MemberRolePolicy> {
    conn: &'conn Connection,
    identity: I,
    policy: P,
    config: OrderingConfig,
}

impl<'conn, I: Identity, P: EditPolicy> CardService<'conn, I, P> {
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

    /// Appends one card at the bottom of `column_uuid`.
    pub fn create_card(&self, column_uuid: ColumnId, card: NewCard) -> BoardResult<Card> {
        let result = normalize_name(&card.title).and_then(|title| {
            let card = NewCard { title, ..card };
            run_serialized(self.conn, &self.config, "card_create", |tx| {
                let board = SqliteBoardRepository::new(tx);
                let column = board
                    .find_column(column_uuid)?
                    .ok_or(BoardError::ColumnNotFound(column_uuid))?;
                let user = require_editor(&self.identity, &self.policy, tx, column.project_uuid)?;
                ensure_capacity(&board, &column)?;

                let gateway = SqlitePositionGateway::new(tx);
                let sequence = SequencedCollection::new(&gateway);
                let scope = column.card_scope();
                let position = sequence.append(scope)?;
                let created = board.insert_card(column_uuid, &card, user, position)?;
                verify_scopes(&self.config, &sequence, &[scope])?;

                SqliteActivityRepository::new(tx).record(
                    column.project_uuid,
                    user,
                    ActivityAction::Created,
                    ActivityEntity::Card,
                    created.card_uuid,
                    &format!("created card '{}' in column '{}'", created.title, column.name),
                )?;
                Ok(created)
            })
        });

        match &result {
            Ok(created) => info!(
                "event=card_create module=service status=ok column={} card={} position={}",
                column_uuid, created.card_uuid, created.position
            ),
            Err(err) => log_failure("card_create", err),
        }
        result
    }

    /// Moves one card to `new_position` in `target_column_uuid`.
    ///
    /// Inside the same column `new_position` must lie in `[0, n-1]`; into
    /// another column it may also equal that column's live count (append).
    /// A full target column is rejected before any position changes.
    pub fn move_card(
        &self,
        card_uuid: CardId,
        target_column_uuid: ColumnId,
        new_position: i64,
    ) -> BoardResult<Card> {
        let result = run_serialized(self.conn, &self.config, "card_move", |tx| {
            let board = SqliteBoardRepository::new(tx);
            let card = board
                .find_card(card_uuid)?
                .ok_or(BoardError::CardNotFound(card_uuid))?;
            let source = board
                .find_column(card.column_uuid)?
                .ok_or(BoardError::CardNotFound(card_uuid))?;
            let target = board
                .find_column(target_column_uuid)?
                .ok_or(BoardError::ColumnNotFound(target_column_uuid))?;
            let user = require_editor(&self.identity, &self.policy, tx, source.project_uuid)?;
            if target.project_uuid != source.project_uuid {
                require_editor(&self.identity, &self.policy, tx, target.project_uuid)?;
            }

            let same_column = source.column_uuid == target.column_uuid;
            if !same_column {
                ensure_capacity(&board, &target)?;
            }

            let gateway = SqlitePositionGateway::new(tx);
            let sequence = SequencedCollection::new(&gateway);
            let shifted = if same_column {
                sequence.move_within_scope(card.scope(), card_uuid, card.position, new_position)?
            } else {
                sequence.move_across_scopes(
                    card.scope(),
                    target.card_scope(),
                    card_uuid,
                    card.position,
                    new_position,
                )?
            };
            if same_column && new_position == card.position {
                return Ok((card, 0));
            }
            verify_scopes(&self.config, &sequence, &[card.scope(), target.card_scope()])?;

            let details = if same_column {
                format!(
                    "moved card '{}' from {} to {} in column '{}'",
                    card.title, card.position, new_position, target.name
                )
            } else {
                format!(
                    "moved card '{}' from column '{}' to column '{}' at {}",
                    card.title, source.name, target.name, new_position
                )
            };
            SqliteActivityRepository::new(tx).record(
                target.project_uuid,
                user,
                ActivityAction::Moved,
                ActivityEntity::Card,
                card_uuid,
                &details,
            )?;
            Ok((board.require_card(card_uuid)?, shifted))
        });

        match result {
            Ok((moved, shifted)) => {
                info!(
                    "event=card_move module=service status=ok card={} column={} position={} shifted={}",
                    card_uuid, moved.column_uuid, moved.position, shifted
                );
                Ok(moved)
            }
            Err(err) => {
                log_failure("card_move", &err);
                Err(err)
            }
        }
    }

    /// Soft-deletes one card and closes its slot in the column.
    pub fn delete_card(&self, card_uuid: CardId) -> BoardResult<()> {
        let result = run_serialized(self.conn, &self.config, "card_delete", |tx| {
            let board = SqliteBoardRepository::new(tx);
            let (card, column) = load_card(&board, card_uuid)?;
            let user = require_editor(&self.identity, &self.policy, tx, column.project_uuid)?;

            if !board.soft_delete_card(card_uuid)? {
                return Err(BoardError::CardNotFound(card_uuid));
            }
            let gateway = SqlitePositionGateway::new(tx);
            let sequence = SequencedCollection::new(&gateway);
            sequence.remove(card.scope(), card_uuid, card.position)?;
            verify_scopes(&self.config, &sequence, &[card.scope()])?;

            SqliteActivityRepository::new(tx).record(
                column.project_uuid,
                user,
                ActivityAction::Deleted,
                ActivityEntity::Card,
                card_uuid,
                &format!("deleted card '{}'", card.title),
            )?;
            Ok(card)
        });

        match result {
            Ok(card) => {
                info!(
                    "event=card_delete module=service status=ok card={} column={} position={}",
                    card_uuid, card.column_uuid, card.position
                );
                Ok(())
            }
            Err(err) => {
                log_failure("card_delete", &err);
                Err(err)
            }
        }
    }

    /// Sets or clears the assignee. Position is untouched.
    pub fn assign_card(&self, card_uuid: CardId, assignee: Option<UserId>) -> BoardResult<Card> {
        run_serialized(self.conn, &self.config, "card_assign", |tx| {
            let board = SqliteBoardRepository::new(tx);
            let (card, column) = load_card(&board, card_uuid)?;
            let user = require_editor(&self.identity, &self.policy, tx, column.project_uuid)?;

            if !board.set_card_assignee(card_uuid, assignee)? {
                return Err(BoardError::CardNotFound(card_uuid));
            }
            let details = match assignee {
                Some(assignee) => format!("assigned card '{}' to {}", card.title, assignee),
                None => format!("unassigned card '{}'", card.title),
            };
            SqliteActivityRepository::new(tx).record(
                column.project_uuid,
                user,
                ActivityAction::Assigned,
                ActivityEntity::Card,
                card_uuid,
                &details,
            )?;
            Ok(board.require_card(card_uuid)?)
        })
    }

    /// Replaces business fields of one card. Position is untouched.
    pub fn update_card(&self, card_uuid: CardId, update: CardUpdate) -> BoardResult<Card> {
        let title = normalize_name(&update.title)?;
        let update = CardUpdate { title, ..update };
        run_serialized(self.conn, &self.config, "card_update", |tx| {
            let board = SqliteBoardRepository::new(tx);
            let (_, column) = load_card(&board, card_uuid)?;
            let user = require_editor(&self.identity, &self.policy, tx, column.project_uuid)?;

            if !board.update_card_fields(card_uuid, &update)? {
                return Err(BoardError::CardNotFound(card_uuid));
            }
            SqliteActivityRepository::new(tx).record(
                column.project_uuid,
                user,
                ActivityAction::Updated,
                ActivityEntity::Card,
                card_uuid,
                &format!("updated card '{}'", update.title),
            )?;
            Ok(board.require_card(card_uuid)?)
        })
    }

    /// Lists live cards of one live column ordered by position.
    pub fn list_cards(&self, column_uuid: ColumnId) -> BoardResult<Vec<Card>> {
        let board = SqliteBoardRepository::new(self.conn);
        if board.find_column(column_uuid)?.is_none() {
            return Err(BoardError::ColumnNotFound(column_uuid));
        }
        Ok(board.list_cards(column_uuid)?)
    }
}

fn load_card(board: &SqliteBoardRepository<'_>, card_uuid: CardId) -> BoardResult<(Card, Column)> {
    let card = board
        .find_card(card_uuid)?
        .ok_or(BoardError::CardNotFound(card_uuid))?;
    let column = board
        .find_column(card.column_uuid)?
        .ok_or(BoardError::CardNotFound(card_uuid))?;
    Ok((card, column))
}

/// Fails with `Capacity` when `column` cannot take one more live card.
fn ensure_capacity(board: &SqliteBoardRepository<'_>, column: &Column) -> BoardResult<()> {
    let live = board.count_live_cards(column.column_uuid)?;
    if column.has_capacity_for(live) {
        return Ok(());
    }
    Err(BoardError::Capacity {
        column_uuid: column.column_uuid,
        limit: column.card_limit,
        live,
    })
}

//! Column and card repository.
//!
//! # Responsibility
//! - Persist column/card business fields and soft-delete tombstones.
//! - Insert new rows at a position computed by the ordering engine.
//!
//! # Invariants
//! - Nothing here shifts or rewrites `position` of existing rows; that is
//!   owned by `repo::position_repo`.
//! - A card is visible only while both the card and its column are live.
//! - Listing is deterministic: `position ASC, uuid ASC`.

use super::{bool_to_int, ensure_schema_ready, parse_flag, parse_uuid, RepoError, RepoResult};
use crate::model::board::{
    Card, CardId, CardUpdate, Column, ColumnId, ColumnUpdate, NewCard, NewColumn, Priority,
    ProjectId, UserId,
};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const COLUMN_SELECT_SQL: &str = "SELECT
    column_uuid,
    project_uuid,
    name,
    color,
    card_limit,
    position,
    is_deleted,
    created_at,
    updated_at
FROM board_columns";

const CARD_SELECT_SQL: &str = "SELECT
    c.card_uuid AS card_uuid,
    c.column_uuid AS column_uuid,
    c.title AS title,
    c.description AS description,
    c.priority AS priority,
    c.due_date AS due_date,
    c.cover_color AS cover_color,
    c.is_completed AS is_completed,
    c.assignee_uuid AS assignee_uuid,
    c.created_by AS created_by,
    c.position AS position,
    c.is_deleted AS is_deleted,
    c.created_at AS created_at,
    c.updated_at AS updated_at
FROM cards c
INNER JOIN board_columns bc ON bc.column_uuid = c.column_uuid";

/// SQLite-backed column/card repository.
pub struct SqliteBoardRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBoardRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(
            conn,
            "board_columns",
            &[
                "column_uuid",
                "project_uuid",
                "name",
                "card_limit",
                "position",
                "is_deleted",
            ],
        )?;
        ensure_schema_ready(
            conn,
            "cards",
            &[
                "card_uuid",
                "column_uuid",
                "title",
                "priority",
                "position",
                "is_deleted",
            ],
        )?;
        Ok(Self::new(conn))
    }

    /// Wraps a connection already verified by `try_new`, e.g. an open
    /// transaction on the same database.
    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Loads one live column.
    pub fn find_column(&self, column_uuid: ColumnId) -> RepoResult<Option<Column>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COLUMN_SELECT_SQL}
             WHERE column_uuid = ?1
               AND is_deleted = 0;"
        ))?;
        let mut rows = stmt.query([column_uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_column_row(row)?));
        }
        Ok(None)
    }

    /// Lists live columns of one project by position.
    pub fn list_columns(&self, project_uuid: ProjectId) -> RepoResult<Vec<Column>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COLUMN_SELECT_SQL}
             WHERE project_uuid = ?1
               AND is_deleted = 0
             ORDER BY position ASC, column_uuid ASC;"
        ))?;
        let mut rows = stmt.query([project_uuid.to_string()])?;
        let mut columns = Vec::new();
        while let Some(row) = rows.next()? {
            columns.push(parse_column_row(row)?);
        }
        Ok(columns)
    }

    /// Returns whether a live column in the project already uses `name`,
    /// compared case-insensitively. `except` is ignored in the comparison.
    pub fn column_name_taken(
        &self,
        project_uuid: ProjectId,
        name: &str,
        except: Option<ColumnId>,
    ) -> RepoResult<bool> {
        let wanted = name.to_lowercase();
        Ok(self
            .list_columns(project_uuid)?
            .iter()
            .filter(|column| Some(column.column_uuid) != except)
            .any(|column| column.name.to_lowercase() == wanted))
    }

    /// Inserts one live column at `position`.
    pub fn insert_column(
        &self,
        project_uuid: ProjectId,
        column: &NewColumn,
        position: i64,
    ) -> RepoResult<Column> {
        let column_uuid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO board_columns (
                column_uuid,
                project_uuid,
                name,
                color,
                card_limit,
                position,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0);",
            params![
                column_uuid.to_string(),
                project_uuid.to_string(),
                column.name.as_str(),
                column.color.as_deref(),
                i64::from(column.card_limit),
                position,
            ],
        )?;
        self.require_column(column_uuid)
    }

    /// Replaces name, color, and card limit of one live column.
    pub fn update_column_fields(
        &self,
        column_uuid: ColumnId,
        update: &ColumnUpdate,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE board_columns
             SET name = ?2,
                 color = ?3,
                 card_limit = ?4,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE column_uuid = ?1
               AND is_deleted = 0;",
            params![
                column_uuid.to_string(),
                update.name.as_str(),
                update.color.as_deref(),
                i64::from(update.card_limit),
            ],
        )?;
        Ok(changed > 0)
    }

    /// Tombstones one live column. Returns `false` when nothing changed.
    pub fn soft_delete_column(&self, column_uuid: ColumnId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE board_columns
             SET is_deleted = 1,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE column_uuid = ?1
               AND is_deleted = 0;",
            [column_uuid.to_string()],
        )?;
        Ok(changed > 0)
    }

    /// Loads one live card whose column is also live.
    pub fn find_card(&self, card_uuid: CardId) -> RepoResult<Option<Card>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CARD_SELECT_SQL}
             WHERE c.card_uuid = ?1
               AND c.is_deleted = 0
               AND bc.is_deleted = 0;"
        ))?;
        let mut rows = stmt.query([card_uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_card_row(row)?));
        }
        Ok(None)
    }

    /// Lists live cards of one live column by position.
    pub fn list_cards(&self, column_uuid: ColumnId) -> RepoResult<Vec<Card>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CARD_SELECT_SQL}
             WHERE c.column_uuid = ?1
               AND c.is_deleted = 0
               AND bc.is_deleted = 0
             ORDER BY c.position ASC, c.card_uuid ASC;"
        ))?;
        let mut rows = stmt.query([column_uuid.to_string()])?;
        let mut cards = Vec::new();
        while let Some(row) = rows.next()? {
            cards.push(parse_card_row(row)?);
        }
        Ok(cards)
    }

    /// Counts live cards in one column.
    pub fn count_live_cards(&self, column_uuid: ColumnId) -> RepoResult<u32> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*)
             FROM cards
             WHERE column_uuid = ?1
               AND is_deleted = 0;",
            [column_uuid.to_string()],
            |row| row.get(0),
        )?;
        u32::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("card count {count} out of range")))
    }

    /// Inserts one live card at `position`.
    pub fn insert_card(
        &self,
        column_uuid: ColumnId,
        card: &NewCard,
        created_by: UserId,
        position: i64,
    ) -> RepoResult<Card> {
        let card_uuid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO cards (
                card_uuid,
                column_uuid,
                title,
                description,
                priority,
                due_date,
                cover_color,
                is_completed,
                created_by,
                position,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?9, 0);",
            params![
                card_uuid.to_string(),
                column_uuid.to_string(),
                card.title.as_str(),
                card.description.as_deref(),
                card.priority.as_str(),
                card.due_date,
                card.cover_color.as_deref(),
                created_by.to_string(),
                position,
            ],
        )?;
        self.require_card(card_uuid)
    }

    /// Replaces business fields of one live card.
    pub fn update_card_fields(&self, card_uuid: CardId, update: &CardUpdate) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE cards
             SET title = ?2,
                 description = ?3,
                 priority = ?4,
                 due_date = ?5,
                 cover_color = ?6,
                 is_completed = COALESCE(?7, is_completed),
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE card_uuid = ?1
               AND is_deleted = 0;",
            params![
                card_uuid.to_string(),
                update.title.as_str(),
                update.description.as_deref(),
                update.priority.as_str(),
                update.due_date,
                update.cover_color.as_deref(),
                update.completed.map(bool_to_int),
            ],
        )?;
        Ok(changed > 0)
    }

    /// Sets or clears the assignee of one live card.
    pub fn set_card_assignee(
        &self,
        card_uuid: CardId,
        assignee: Option<UserId>,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE cards
             SET assignee_uuid = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE card_uuid = ?1
               AND is_deleted = 0;",
            params![
                card_uuid.to_string(),
                assignee.map(|value| value.to_string())
            ],
        )?;
        Ok(changed > 0)
    }

    /// Tombstones one live card. Returns `false` when nothing changed.
    pub fn soft_delete_card(&self, card_uuid: CardId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE cards
             SET is_deleted = 1,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE card_uuid = ?1
               AND is_deleted = 0;",
            [card_uuid.to_string()],
        )?;
        Ok(changed > 0)
    }

    pub(crate) fn require_column(&self, column_uuid: ColumnId) -> RepoResult<Column> {
        self.find_column(column_uuid)?.ok_or_else(|| {
            RepoError::InvalidData(format!("column {column_uuid} missing after write"))
        })
    }

    pub(crate) fn require_card(&self, card_uuid: CardId) -> RepoResult<Card> {
        self.find_card(card_uuid)?
            .ok_or_else(|| RepoError::InvalidData(format!("card {card_uuid} missing after write")))
    }
}

fn parse_column_row(row: &Row<'_>) -> RepoResult<Column> {
    let column_uuid_text: String = row.get("column_uuid")?;
    let project_uuid_text: String = row.get("project_uuid")?;
    let card_limit: i64 = row.get("card_limit")?;

    Ok(Column {
        column_uuid: parse_uuid(&column_uuid_text, "board_columns.column_uuid")?,
        project_uuid: parse_uuid(&project_uuid_text, "board_columns.project_uuid")?,
        name: row.get("name")?,
        color: row.get("color")?,
        card_limit: u32::try_from(card_limit).map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid card_limit `{card_limit}` in board_columns.card_limit"
            ))
        })?,
        position: row.get("position")?,
        is_deleted: parse_flag(row.get("is_deleted")?, "board_columns.is_deleted")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_card_row(row: &Row<'_>) -> RepoResult<Card> {
    let card_uuid_text: String = row.get("card_uuid")?;
    let column_uuid_text: String = row.get("column_uuid")?;
    let created_by_text: String = row.get("created_by")?;
    let assignee_uuid = row
        .get::<_, Option<String>>("assignee_uuid")?
        .map(|value| parse_uuid(&value, "cards.assignee_uuid"))
        .transpose()?;

    let priority_text: String = row.get("priority")?;
    let priority = Priority::parse(&priority_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid priority `{priority_text}` in cards.priority"))
    })?;

    Ok(Card {
        card_uuid: parse_uuid(&card_uuid_text, "cards.card_uuid")?,
        column_uuid: parse_uuid(&column_uuid_text, "cards.column_uuid")?,
        title: row.get("title")?,
        description: row.get("description")?,
        priority,
        due_date: row.get("due_date")?,
        cover_color: row.get("cover_color")?,
        completed: parse_flag(row.get("is_completed")?, "cards.is_completed")?,
        assignee_uuid,
        created_by: parse_uuid(&created_by_text, "cards.created_by")?,
        position: row.get("position")?,
        is_deleted: parse_flag(row.get("is_deleted")?, "cards.is_deleted")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

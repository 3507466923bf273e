//! SQLite implementation of the ordering engine's position gateway.
//!
//! # Responsibility
//! - Translate scope-level position reads and range shifts into SQL.
//! - Be the only code path that rewrites `position` or re-parents a
//!   sequenced row.
//!
//! # Invariants
//! - Every statement filters `is_deleted = 0`; tombstones never move.
//! - Statements run on the caller's connection and never commit on their own.

use crate::ordering::{
    OrderingError, OrderingResult, PositionGateway, Scope, ScopeKind, ShiftRange,
};
use rusqlite::{params, Connection};
use uuid::Uuid;

struct ScopeTable {
    table: &'static str,
    id_column: &'static str,
    parent_column: &'static str,
}

fn scope_table(kind: ScopeKind) -> ScopeTable {
    match kind {
        ScopeKind::ProjectColumns => ScopeTable {
            table: "board_columns",
            id_column: "column_uuid",
            parent_column: "project_uuid",
        },
        ScopeKind::ColumnCards => ScopeTable {
            table: "cards",
            id_column: "card_uuid",
            parent_column: "column_uuid",
        },
    }
}

/// Position gateway bound to one connection or open transaction.
pub struct SqlitePositionGateway<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePositionGateway<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PositionGateway for SqlitePositionGateway<'_> {
    fn live_count(&self, scope: Scope) -> OrderingResult<i64> {
        let ScopeTable {
            table,
            parent_column,
            ..
        } = scope_table(scope.kind);
        let count = self.conn.query_row(
            &format!(
                "SELECT COUNT(*)
                 FROM {table}
                 WHERE {parent_column} = ?1
                   AND is_deleted = 0;"
            ),
            [scope.id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn max_position(&self, scope: Scope) -> OrderingResult<Option<i64>> {
        let ScopeTable {
            table,
            parent_column,
            ..
        } = scope_table(scope.kind);
        let max = self.conn.query_row(
            &format!(
                "SELECT MAX(position)
                 FROM {table}
                 WHERE {parent_column} = ?1
                   AND is_deleted = 0;"
            ),
            [scope.id.to_string()],
            |row| row.get::<_, Option<i64>>(0),
        )?;
        Ok(max)
    }

    fn live_positions(&self, scope: Scope) -> OrderingResult<Vec<(Uuid, i64)>> {
        let ScopeTable {
            table,
            id_column,
            parent_column,
        } = scope_table(scope.kind);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {id_column}, position
             FROM {table}
             WHERE {parent_column} = ?1
               AND is_deleted = 0
             ORDER BY position ASC, {id_column} ASC;"
        ))?;
        let mut rows = stmt.query([scope.id.to_string()])?;
        let mut positions = Vec::new();
        while let Some(row) = rows.next()? {
            let id_text: String = row.get(0)?;
            let id = Uuid::parse_str(&id_text).map_err(|_| {
                OrderingError::InvalidData(format!("invalid uuid `{id_text}` in {table}.{id_column}"))
            })?;
            positions.push((id, row.get(1)?));
        }
        Ok(positions)
    }

    fn shift_range(&self, scope: Scope, range: ShiftRange, delta: i64) -> OrderingResult<usize> {
        let ScopeTable {
            table,
            parent_column,
            ..
        } = scope_table(scope.kind);
        let touched = self.conn.execute(
            &format!(
                "UPDATE {table}
                 SET position = position + ?2,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE {parent_column} = ?1
                   AND is_deleted = 0
                   AND position >= ?3
                   AND (?4 IS NULL OR position <= ?4);"
            ),
            params![scope.id.to_string(), delta, range.from, range.to],
        )?;
        Ok(touched)
    }

    fn set_position(&self, item: Uuid, scope: Scope, position: i64) -> OrderingResult<()> {
        let ScopeTable {
            table,
            id_column,
            parent_column,
        } = scope_table(scope.kind);
        let changed = self.conn.execute(
            &format!(
                "UPDATE {table}
                 SET {parent_column} = ?2,
                     position = ?3,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE {id_column} = ?1
                   AND is_deleted = 0;"
            ),
            params![item.to_string(), scope.id.to_string(), position],
        )?;
        if changed == 0 {
            return Err(OrderingError::ItemNotLive(item));
        }
        Ok(())
    }
}

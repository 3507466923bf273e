//! Positional ordering engine.
//!
//! # Responsibility
//! - Assign, shift, and close zero-based positions of sequenced items
//!   (columns inside a project, cards inside a column).
//! - Keep store access behind [`PositionGateway`] so the algorithm is
//!   independent of SQL.
//!
//! # Invariants
//! - For every scope the live positions are exactly `{0, 1, ..., n-1}`.
//! - Soft-deleted items never take part in position computations.
//! - Out-of-range targets are reported, never clamped.

use crate::db::DbError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod gateway;
pub mod memory;
pub mod sequence;

pub use gateway::{PositionGateway, ShiftRange};
pub use memory::MemoryGateway;
pub use sequence::SequencedCollection;

/// Kind of ordering domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    /// Columns of one project.
    ProjectColumns,
    /// Cards of one column.
    ColumnCards,
}

/// One ordering domain: `(kind, parent id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Scope {
    pub kind: ScopeKind,
    pub id: Uuid,
}

impl Scope {
    pub fn project_columns(project_uuid: Uuid) -> Self {
        Self {
            kind: ScopeKind::ProjectColumns,
            id: project_uuid,
        }
    }

    pub fn column_cards(column_uuid: Uuid) -> Self {
        Self {
            kind: ScopeKind::ColumnCards,
            id: column_uuid,
        }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            ScopeKind::ProjectColumns => "project_columns",
            ScopeKind::ColumnCards => "column_cards",
        };
        write!(f, "{kind}:{}", self.id)
    }
}

/// An item that owns one slot in a scope's position sequence.
pub trait Sequenced {
    fn item_id(&self) -> Uuid;
    fn scope(&self) -> Scope;
    fn position(&self) -> i64;
    /// Live items are the only ones counted toward position invariants.
    fn is_live(&self) -> bool;
}

pub type OrderingResult<T> = Result<T, OrderingError>;

/// Errors raised by the ordering engine.
#[derive(Debug)]
pub enum OrderingError {
    /// Requested index is outside `[0, max_allowed]` for the scope.
    InvalidPosition {
        scope: Scope,
        requested: i64,
        max_allowed: i64,
    },
    /// Item is absent from the scope's live set.
    ItemNotLive(Uuid),
    /// Slot close requested for an item that is still live.
    StillLive(Uuid),
    /// Source and target scopes order different item kinds.
    ScopeKindMismatch { source: Scope, target: Scope },
    /// Live positions of a scope are not exactly `0..n`.
    Corrupted { scope: Scope, positions: Vec<i64> },
    /// Persisted row cannot be read back as a sequenced item.
    InvalidData(String),
    /// Underlying store failure.
    Store(DbError),
}

impl Display for OrderingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPosition {
                scope,
                requested,
                max_allowed,
            } => {
                if *max_allowed < 0 {
                    write!(f, "position {requested} is invalid for empty scope {scope}")
                } else {
                    write!(
                        f,
                        "position {requested} is outside 0..={max_allowed} for scope {scope}"
                    )
                }
            }
            Self::ItemNotLive(id) => write!(f, "sequenced item is not live: {id}"),
            Self::StillLive(id) => write!(f, "sequenced item must be deleted first: {id}"),
            Self::ScopeKindMismatch { source, target } => {
                write!(f, "cannot move between scopes {source} and {target}")
            }
            Self::Corrupted { scope, positions } => {
                write!(f, "scope {scope} has non-contiguous positions {positions:?}")
            }
            Self::InvalidData(message) => write!(f, "invalid sequenced data: {message}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for OrderingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for OrderingError {
    fn from(value: DbError) -> Self {
        Self::Store(value)
    }
}

impl From<rusqlite::Error> for OrderingError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Store(DbError::Sqlite(value))
    }
}

/// Returns whether `positions` is a permutation of `0..positions.len()`.
pub fn is_contiguous(positions: &[i64]) -> bool {
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();
    sorted
        .iter()
        .enumerate()
        .all(|(index, position)| *position == index as i64)
}

/// Returns live items of one scope ordered by position.
pub fn live_in_scope<T: Sequenced>(items: &[T], scope: Scope) -> Vec<&T> {
    let mut live: Vec<&T> = items
        .iter()
        .filter(|item| item.is_live() && item.scope() == scope)
        .collect();
    live.sort_by_key(|item| (item.position(), item.item_id()));
    live
}

#[cfg(test)]
mod tests {
    use super::{is_contiguous, Scope};
    use uuid::Uuid;

    #[test]
    fn contiguous_accepts_any_permutation_of_range() {
        assert!(is_contiguous(&[]));
        assert!(is_contiguous(&[2, 0, 1]));
    }

    #[test]
    fn contiguous_rejects_gaps_and_duplicates() {
        assert!(!is_contiguous(&[0, 2]));
        assert!(!is_contiguous(&[0, 1, 1]));
        assert!(!is_contiguous(&[1]));
    }

    #[test]
    fn scope_display_names_kind_and_id() {
        let id = Uuid::nil();
        assert_eq!(
            Scope::column_cards(id).to_string(),
            format!("column_cards:{id}")
        );
    }
}

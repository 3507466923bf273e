//! Caller-facing error taxonomy for board services.

use crate::model::board::{CardId, ColumnId, ProjectId};
use crate::ordering::OrderingError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type BoardResult<T> = Result<T, BoardError>;

/// Errors from column and card service operations.
///
/// Every variant is returned after the operation's transaction has been
/// rolled back; no partial write survives an error.
#[derive(Debug)]
pub enum BoardError {
    /// No caller identity is attached to the session.
    Unauthenticated,
    /// Caller lacks edit rights on the owning project.
    Forbidden(ProjectId),
    /// Project is absent or soft-deleted.
    ProjectNotFound(ProjectId),
    /// Column is absent or soft-deleted.
    ColumnNotFound(ColumnId),
    /// Card (or its column) is absent or soft-deleted.
    CardNotFound(CardId),
    /// A live column in the same project already uses this name.
    Conflict(String),
    /// Target column has reached its card limit.
    Capacity {
        column_uuid: ColumnId,
        limit: u32,
        live: u32,
    },
    /// Requested index is outside `[0, max_allowed]`.
    InvalidPosition { requested: i64, max_allowed: i64 },
    /// Name or title is blank after trim.
    InvalidName,
    /// Store stayed locked for every allowed attempt.
    Concurrency { attempts: u32 },
    /// Ordering engine failure other than an out-of-range index.
    Ordering(OrderingError),
    /// Repository-level failure.
    Repo(RepoError),
}

impl BoardError {
    /// Returns whether the failure is a transient lock conflict.
    pub fn is_busy(&self) -> bool {
        match self {
            Self::Repo(err) => err.is_busy(),
            _ => false,
        }
    }

    /// Stable machine-readable code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden(_) => "forbidden",
            Self::ProjectNotFound(_) | Self::ColumnNotFound(_) | Self::CardNotFound(_) => {
                "not_found"
            }
            Self::Conflict(_) => "conflict",
            Self::Capacity { .. } => "capacity",
            Self::InvalidPosition { .. } => "invalid_position",
            Self::InvalidName => "invalid_name",
            Self::Concurrency { .. } => "concurrency",
            Self::Ordering(_) => "ordering",
            Self::Repo(_) => "repo",
        }
    }
}

impl Display for BoardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "no authenticated user"),
            Self::Forbidden(id) => write!(f, "not allowed to edit project {id}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::ColumnNotFound(id) => write!(f, "column not found: {id}"),
            Self::CardNotFound(id) => write!(f, "card not found: {id}"),
            Self::Conflict(name) => write!(f, "column '{name}' already exists"),
            Self::Capacity {
                column_uuid,
                limit,
                live,
            } => write!(
                f,
                "column {column_uuid} has reached its card limit ({live}/{limit})"
            ),
            Self::InvalidPosition {
                requested,
                max_allowed,
            } => {
                if *max_allowed < 0 {
                    write!(f, "position {requested} is invalid for an empty scope")
                } else {
                    write!(f, "position {requested} is outside 0..={max_allowed}")
                }
            }
            Self::InvalidName => write!(f, "name must not be blank"),
            Self::Concurrency { attempts } => {
                write!(f, "store stayed locked after {attempts} attempts")
            }
            Self::Ordering(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BoardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Ordering(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for BoardError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for BoardError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

impl From<OrderingError> for BoardError {
    fn from(value: OrderingError) -> Self {
        match value {
            OrderingError::InvalidPosition {
                requested,
                max_allowed,
                ..
            } => Self::InvalidPosition {
                requested,
                max_allowed,
            },
            OrderingError::Store(err) => Self::Repo(RepoError::Db(err)),
            other => Self::Ordering(other),
        }
    }
}

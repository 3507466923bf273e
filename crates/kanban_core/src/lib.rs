//! Core domain logic for the kanban board.
//! Owns positional ordering of columns and cards and every write that
//! touches it.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod ordering;
pub mod repo;
pub mod service;

pub use config::OrderingConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::board::{
    Card, CardId, CardUpdate, Column, ColumnId, ColumnUpdate, NewCard, NewColumn, Priority,
    Project, ProjectId, ProjectRole, UserId,
};
pub use ordering::{OrderingError, PositionGateway, Scope, Sequenced, SequencedCollection};
pub use repo::{RepoError, RepoResult};
pub use service::access::{EditPolicy, Identity, MemberRolePolicy, Session};
pub use service::card_service::CardService;
pub use service::column_service::ColumnService;
pub use service::error::{BoardError, BoardResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

//! Board domain model.
//!
//! # Responsibility
//! - Define project/column/card records shared by repositories and services.
//! - Keep ownership one-directional: children reference their parent by id.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID.
//! - Deletion is represented by soft-delete tombstones, not hard delete.

pub mod board;

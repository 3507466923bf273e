//! Store contract used by the ordering engine.
//!
//! Implementations execute inside the caller's transaction; they never open
//! or commit one themselves.

use super::{OrderingResult, Scope};
use uuid::Uuid;

/// Inclusive position range for a shift. `to == None` means unbounded above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftRange {
    pub from: i64,
    pub to: Option<i64>,
}

impl ShiftRange {
    /// `from <= position <= to`.
    pub fn between(from: i64, to: i64) -> Self {
        Self { from, to: Some(to) }
    }

    /// `position >= from`.
    pub fn starting_at(from: i64) -> Self {
        Self { from, to: None }
    }

    /// `position > position`.
    pub fn after(position: i64) -> Self {
        Self::starting_at(position + 1)
    }

    pub fn contains(&self, position: i64) -> bool {
        position >= self.from && self.to.map_or(true, |to| position <= to)
    }
}

/// Position reads and writes over live items of one scope.
pub trait PositionGateway {
    /// Number of live items in the scope.
    fn live_count(&self, scope: Scope) -> OrderingResult<i64>;
    /// Highest live position, or `None` for an empty scope.
    fn max_position(&self, scope: Scope) -> OrderingResult<Option<i64>>;
    /// Live `(item, position)` pairs ordered by position.
    fn live_positions(&self, scope: Scope) -> OrderingResult<Vec<(Uuid, i64)>>;
    /// Adds `delta` to every live position inside `range`; returns rows touched.
    fn shift_range(&self, scope: Scope, range: ShiftRange, delta: i64) -> OrderingResult<usize>;
    /// Places one live item into `scope` at `position`.
    ///
    /// Fails with `OrderingError::ItemNotLive` when the item is absent or
    /// soft-deleted.
    fn set_position(&self, item: Uuid, scope: Scope, position: i64) -> OrderingResult<()>;
}

//! Sequenced collection operations over a [`PositionGateway`].
//!
//! # Responsibility
//! - Compute the range shift for append, move, cross-scope move, and remove.
//! - Reject out-of-range targets before any write is issued.
//!
//! # Invariants
//! - Only items strictly between the old and new slot are shifted.
//! - Every operation leaves each touched scope at `{0..n-1}` when the scope
//!   satisfied it before.

use super::gateway::{PositionGateway, ShiftRange};
use super::{is_contiguous, OrderingError, OrderingResult, Scope};
use uuid::Uuid;

/// Ordering operations bound to one gateway (usually one open transaction).
pub struct SequencedCollection<'g, G: PositionGateway + ?Sized> {
    gateway: &'g G,
}

impl<'g, G: PositionGateway + ?Sized> SequencedCollection<'g, G> {
    pub fn new(gateway: &'g G) -> Self {
        Self { gateway }
    }

    /// Returns the slot for a new item at the end of `scope`.
    pub fn append(&self, scope: Scope) -> OrderingResult<i64> {
        Ok(self.gateway.max_position(scope)?.map_or(0, |max| max + 1))
    }

    /// Moves `item` from `old_position` to `new_position` inside one scope.
    ///
    /// Returns the number of neighbours shifted. `new_position` must lie in
    /// `[0, n-1]`.
    pub fn move_within_scope(
        &self,
        scope: Scope,
        item: Uuid,
        old_position: i64,
        new_position: i64,
    ) -> OrderingResult<usize> {
        let count = self.gateway.live_count(scope)?;
        ensure_in_range(scope, old_position, count - 1)?;
        ensure_in_range(scope, new_position, count - 1)?;

        if new_position == old_position {
            return Ok(0);
        }

        let shifted = if new_position > old_position {
            self.gateway.shift_range(
                scope,
                ShiftRange::between(old_position + 1, new_position),
                -1,
            )?
        } else {
            self.gateway.shift_range(
                scope,
                ShiftRange::between(new_position, old_position - 1),
                1,
            )?
        };
        self.gateway.set_position(item, scope, new_position)?;
        Ok(shifted)
    }

    /// Moves `item` out of `source` into `target` at `new_position`.
    ///
    /// `new_position` may equal the target's live count (append). Scopes are
    /// shifted in ascending id order. Returns the number of neighbours shifted.
    pub fn move_across_scopes(
        &self,
        source: Scope,
        target: Scope,
        item: Uuid,
        old_position: i64,
        new_position: i64,
    ) -> OrderingResult<usize> {
        if source.kind != target.kind {
            return Err(OrderingError::ScopeKindMismatch { source, target });
        }
        if source == target {
            return self.move_within_scope(source, item, old_position, new_position);
        }

        let source_count = self.gateway.live_count(source)?;
        ensure_in_range(source, old_position, source_count - 1)?;
        let target_count = self.gateway.live_count(target)?;
        ensure_in_range(target, new_position, target_count)?;

        let mut shifts = [
            (source, ShiftRange::after(old_position), -1),
            (target, ShiftRange::starting_at(new_position), 1),
        ];
        shifts.sort_by_key(|(scope, _, _)| scope.id);

        let mut shifted = 0;
        for (scope, range, delta) in shifts {
            shifted += self.gateway.shift_range(scope, range, delta)?;
        }
        self.gateway.set_position(item, target, new_position)?;
        Ok(shifted)
    }

    /// Closes the slot `item` held at `position` before it was soft-deleted.
    ///
    /// Must run in the same transaction as the soft delete.
    pub fn remove(&self, scope: Scope, item: Uuid, position: i64) -> OrderingResult<usize> {
        if self
            .gateway
            .live_positions(scope)?
            .iter()
            .any(|(live, _)| *live == item)
        {
            return Err(OrderingError::StillLive(item));
        }
        self.gateway.shift_range(scope, ShiftRange::after(position), -1)
    }

    /// Fails with `Corrupted` unless the scope's live positions are `0..n`.
    pub fn verify(&self, scope: Scope) -> OrderingResult<()> {
        let positions: Vec<i64> = self
            .gateway
            .live_positions(scope)?
            .into_iter()
            .map(|(_, position)| position)
            .collect();
        if is_contiguous(&positions) {
            Ok(())
        } else {
            Err(OrderingError::Corrupted { scope, positions })
        }
    }
}

fn ensure_in_range(scope: Scope, requested: i64, max_allowed: i64) -> OrderingResult<()> {
    if requested < 0 || requested > max_allowed {
        return Err(OrderingError::InvalidPosition {
            scope,
            requested,
            max_allowed,
        });
    }
    Ok(())
}

//! In-memory [`PositionGateway`] for exercising the ordering engine without
//! SQLite.

use super::gateway::{PositionGateway, ShiftRange};
use super::{live_in_scope, OrderingError, OrderingResult, Scope, Sequenced};
use std::cell::RefCell;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
struct MemoryItem {
    id: Uuid,
    scope: Scope,
    position: i64,
    live: bool,
}

impl Sequenced for MemoryItem {
    fn item_id(&self) -> Uuid {
        self.id
    }

    fn scope(&self) -> Scope {
        self.scope
    }

    fn position(&self) -> i64 {
        self.position
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

/// Vector-backed gateway. Tombstoned items stay in storage but are ignored.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    items: RefCell<Vec<MemoryItem>>,
}

impl MemoryGateway {
    /// Stores a new live item at `position` without shifting neighbours.
    pub fn insert(&self, scope: Scope, position: i64) -> Uuid {
        let id = Uuid::new_v4();
        self.items.borrow_mut().push(MemoryItem {
            id,
            scope,
            position,
            live: true,
        });
        id
    }

    /// Marks an item deleted. Its stored position is left untouched.
    pub fn tombstone(&self, id: Uuid) {
        if let Some(item) = self.items.borrow_mut().iter_mut().find(|item| item.id == id) {
            item.live = false;
        }
    }
}

impl PositionGateway for MemoryGateway {
    fn live_count(&self, scope: Scope) -> OrderingResult<i64> {
        Ok(live_in_scope(&self.items.borrow(), scope).len() as i64)
    }

    fn max_position(&self, scope: Scope) -> OrderingResult<Option<i64>> {
        Ok(live_in_scope(&self.items.borrow(), scope)
            .iter()
            .map(|item| item.position)
            .max())
    }

    fn live_positions(&self, scope: Scope) -> OrderingResult<Vec<(Uuid, i64)>> {
        Ok(live_in_scope(&self.items.borrow(), scope)
            .iter()
            .map(|item| (item.id, item.position))
            .collect())
    }

    fn shift_range(&self, scope: Scope, range: ShiftRange, delta: i64) -> OrderingResult<usize> {
        let mut touched = 0;
        for item in self.items.borrow_mut().iter_mut() {
            if item.is_live() && item.scope == scope && range.contains(item.position) {
                item.position += delta;
                touched += 1;
            }
        }
        Ok(touched)
    }

    fn set_position(&self, id: Uuid, scope: Scope, position: i64) -> OrderingResult<()> {
        let mut items = self.items.borrow_mut();
        let item = items
            .iter_mut()
            .find(|item| item.id == id && item.is_live())
            .ok_or(OrderingError::ItemNotLive(id))?;
        item.scope = scope;
        item.position = position;
        Ok(())
    }
}

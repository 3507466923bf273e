//! Project, column, and card records.
//!
//! # Responsibility
//! - Define the canonical read models returned by board services.
//! - Expose the live-item predicate used by position computations.
//!
//! # Invariants
//! - `position` is meaningful only while `is_deleted == false`.
//! - `Column::card_limit == 0` means the column accepts any number of cards.

use crate::ordering::{Scope, Sequenced};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable project identifier.
pub type ProjectId = Uuid;
/// Stable column identifier.
pub type ColumnId = Uuid;
/// Stable card identifier.
pub type CardId = Uuid;
/// Caller identity resolved by the session layer.
pub type UserId = Uuid;

/// Default project accent color.
pub const DEFAULT_PROJECT_COLOR: &str = "#3B82F6";

/// Membership role inside one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectRole {
    Admin,
    Editor,
    Viewer,
}

impl ProjectRole {
    /// Returns whether this role may mutate board content.
    pub fn can_edit(self) -> bool {
        matches!(self, Self::Admin | Self::Editor)
    }

    /// Stable storage value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }

    /// Parses a storage value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Self::Admin),
            "editor" => Some(Self::Editor),
            "viewer" => Some(Self::Viewer),
            _ => None,
        }
    }
}

/// Card priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }
}

/// Project read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub project_uuid: ProjectId,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub owner_uuid: UserId,
    pub is_deleted: bool,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

/// Board column read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub column_uuid: ColumnId,
    /// Owning project. Lookup only; the project owns the column.
    pub project_uuid: ProjectId,
    pub name: String,
    pub color: Option<String>,
    /// Maximum live cards. `0` means unlimited.
    pub card_limit: u32,
    /// Zero-based rank among live columns of the project.
    pub position: i64,
    pub is_deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Column {
    /// Returns whether one more card fits given the current live count.
    ///
    /// `card_limit == 0` is unlimited; otherwise a column holding
    /// `live_cards >= card_limit` is full.
    pub fn has_capacity_for(&self, live_cards: u32) -> bool {
        self.card_limit == 0 || live_cards < self.card_limit
    }

    /// Scope holding this column's cards.
    pub fn card_scope(&self) -> Scope {
        Scope::column_cards(self.column_uuid)
    }
}

impl Sequenced for Column {
    fn item_id(&self) -> Uuid {
        self.column_uuid
    }

    fn scope(&self) -> Scope {
        Scope::project_columns(self.project_uuid)
    }

    fn position(&self) -> i64 {
        self.position
    }

    fn is_live(&self) -> bool {
        !self.is_deleted
    }
}

/// Card read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub card_uuid: CardId,
    /// Owning column. Lookup only; the column owns the card.
    pub column_uuid: ColumnId,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    /// Epoch ms due date.
    pub due_date: Option<i64>,
    pub cover_color: Option<String>,
    pub completed: bool,
    pub assignee_uuid: Option<UserId>,
    pub created_by: UserId,
    /// Zero-based rank among live cards of the column.
    pub position: i64,
    pub is_deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Sequenced for Card {
    fn item_id(&self) -> Uuid {
        self.card_uuid
    }

    fn scope(&self) -> Scope {
        Scope::column_cards(self.column_uuid)
    }

    fn position(&self) -> i64 {
        self.position
    }

    fn is_live(&self) -> bool {
        !self.is_deleted
    }
}

/// Input for column creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewColumn {
    pub name: String,
    pub color: Option<String>,
    pub card_limit: u32,
}

impl NewColumn {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_card_limit(mut self, card_limit: u32) -> Self {
        self.card_limit = card_limit;
        self
    }
}

/// Full replacement of a column's business fields. Position is not editable.
pub type ColumnUpdate = NewColumn;

/// Input for card creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCard {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<i64>,
    pub cover_color: Option<String>,
}

impl NewCard {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Full replacement of a card's business fields. Position is not editable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardUpdate {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<i64>,
    pub cover_color: Option<String>,
    /// `None` keeps the current completion flag.
    pub completed: Option<bool>,
}

/// Activity history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub activity_uuid: Uuid,
    pub project_uuid: ProjectId,
    pub user_uuid: UserId,
    pub action: String,
    pub entity_type: String,
    pub entity_uuid: Uuid,
    pub details: String,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::{Column, Priority, ProjectRole};
    use uuid::Uuid;

    fn column_with_limit(card_limit: u32) -> Column {
        Column {
            column_uuid: Uuid::new_v4(),
            project_uuid: Uuid::new_v4(),
            name: "Doing".to_string(),
            color: None,
            card_limit,
            position: 0,
            is_deleted: false,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn zero_card_limit_is_unlimited() {
        let column = column_with_limit(0);
        assert!(column.has_capacity_for(0));
        assert!(column.has_capacity_for(10_000));
    }

    #[test]
    fn non_zero_card_limit_rejects_at_or_above_limit() {
        let column = column_with_limit(2);
        assert!(column.has_capacity_for(1));
        assert!(!column.has_capacity_for(2));
        assert!(!column.has_capacity_for(3));
    }

    #[test]
    fn only_admin_and_editor_can_edit() {
        assert!(ProjectRole::Admin.can_edit());
        assert!(ProjectRole::Editor.can_edit());
        assert!(!ProjectRole::Viewer.can_edit());
    }

    #[test]
    fn storage_values_parse_back() {
        for role in [ProjectRole::Admin, ProjectRole::Editor, ProjectRole::Viewer] {
            assert_eq!(ProjectRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(Priority::parse("urgent"), Some(Priority::Urgent));
        assert_eq!(Priority::parse("URGENT"), None);
    }
}

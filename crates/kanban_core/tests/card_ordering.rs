use kanban_core::db::open_db_in_memory;
use kanban_core::repo::activity_repo::{ActivityRepository, SqliteActivityRepository};
use kanban_core::repo::project_repo::{ProjectRepository, SqliteProjectRepository};
use kanban_core::{
    BoardError, CardService, ColumnId, ColumnService, MemberRolePolicy, NewCard, NewColumn,
    ProjectId, ProjectRole, Session, UserId,
};
use rusqlite::Connection;
use uuid::Uuid;

struct Board {
    conn: Connection,
    owner: UserId,
    project: ProjectId,
}

impl Board {
    fn new() -> Self {
        let conn = open_db_in_memory().unwrap();
        let owner = Uuid::new_v4();
        let project = SqliteProjectRepository::try_new(&conn)
            .unwrap()
            .create_project(owner, "Sprint", None, Some("#10B981"))
            .unwrap()
            .project_uuid;
        Self {
            conn,
            owner,
            project,
        }
    }

    fn column(&self, name: &str, card_limit: u32) -> ColumnId {
        ColumnService::new(&self.conn, Session::authenticated(self.owner), MemberRolePolicy)
            .unwrap()
            .create_column(self.project, NewColumn::named(name).with_card_limit(card_limit))
            .unwrap()
            .column_uuid
    }

    fn cards(&self) -> CardService<'_> {
        self.cards_as(self.owner)
    }

    fn cards_as(&self, user: UserId) -> CardService<'_> {
        CardService::new(&self.conn, Session::authenticated(user), MemberRolePolicy).unwrap()
    }

    fn fill(&self, column: ColumnId, titles: &[&str]) -> Vec<Uuid> {
        let service = self.cards();
        titles
            .iter()
            .map(|title| {
                service
                    .create_card(column, NewCard::titled(*title))
                    .unwrap()
                    .card_uuid
            })
            .collect()
    }

    /// Card ids of one column in position order, asserting positions are `0..n`.
    fn order(&self, column: ColumnId) -> Vec<Uuid> {
        let cards = self.cards().list_cards(column).unwrap();
        for (index, card) in cards.iter().enumerate() {
            assert_eq!(card.position, index as i64, "positions must be 0..n");
            assert_eq!(card.column_uuid, column);
        }
        cards.into_iter().map(|card| card.card_uuid).collect()
    }
}

#[test]
fn create_appends_and_records_creator() {
    let board = Board::new();
    let todo = board.column("Todo", 0);

    let ids = board.fill(todo, &["one", "two", "three"]);

    assert_eq!(board.order(todo), ids);
    let cards = board.cards().list_cards(todo).unwrap();
    assert!(cards.iter().all(|card| card.created_by == board.owner));
}

#[test]
fn zero_card_limit_accepts_any_number_of_cards() {
    let board = Board::new();
    let backlog = board.column("Backlog", 0);

    let ids = board.fill(backlog, &["a", "b", "c", "d", "e", "f"]);

    assert_eq!(board.order(backlog).len(), ids.len());
}

#[test]
fn full_column_rejects_create_at_card_limit() {
    let board = Board::new();
    let doing = board.column("Doing", 2);
    board.fill(doing, &["a", "b"]);

    let err = board
        .cards()
        .create_card(doing, NewCard::titled("c"))
        .unwrap_err();

    assert!(matches!(
        err,
        BoardError::Capacity {
            column_uuid,
            limit: 2,
            live: 2
        } if column_uuid == doing
    ));
    assert_eq!(board.order(doing).len(), 2);
}

#[test]
fn full_column_rejects_move_in_without_touching_either_column() {
    let board = Board::new();
    let todo = board.column("Todo", 0);
    let doing = board.column("Doing", 2);
    let todo_ids = board.fill(todo, &["x", "y"]);
    let doing_ids = board.fill(doing, &["a", "b"]);

    let err = board.cards().move_card(todo_ids[0], doing, 0).unwrap_err();

    assert!(matches!(err, BoardError::Capacity { limit: 2, live: 2, .. }));
    assert_eq!(board.order(todo), todo_ids);
    assert_eq!(board.order(doing), doing_ids);
}

#[test]
fn full_column_still_allows_reordering_inside_it() {
    let board = Board::new();
    let doing = board.column("Doing", 2);
    let ids = board.fill(doing, &["a", "b"]);

    board.cards().move_card(ids[0], doing, 1).unwrap();

    assert_eq!(board.order(doing), vec![ids[1], ids[0]]);
}

#[test]
fn delete_frees_capacity() {
    let board = Board::new();
    let doing = board.column("Doing", 1);
    let ids = board.fill(doing, &["a"]);

    board.cards().delete_card(ids[0]).unwrap();

    let card = board
        .cards()
        .create_card(doing, NewCard::titled("b"))
        .unwrap();
    assert_eq!(card.position, 0);
}

#[test]
fn cross_column_move_closes_source_and_opens_target() {
    let board = Board::new();
    let a = board.column("A", 0);
    let b = board.column("B", 0);
    let ids = board.fill(a, &["X", "Y", "Z"]);

    let moved = board.cards().move_card(ids[1], b, 0).unwrap();

    assert_eq!(moved.column_uuid, b);
    assert_eq!(moved.position, 0);
    assert_eq!(board.order(a), vec![ids[0], ids[2]]);
    assert_eq!(board.order(b), vec![ids[1]]);
}

#[test]
fn cross_column_move_inserts_between_target_cards() {
    let board = Board::new();
    let a = board.column("A", 0);
    let b = board.column("B", 0);
    let a_ids = board.fill(a, &["X"]);
    let b_ids = board.fill(b, &["P", "Q", "R"]);

    board.cards().move_card(a_ids[0], b, 2).unwrap();

    assert!(board.order(a).is_empty());
    assert_eq!(board.order(b), vec![b_ids[0], b_ids[1], a_ids[0], b_ids[2]]);
}

#[test]
fn cross_column_move_accepts_append_slot_and_rejects_beyond() {
    let board = Board::new();
    let a = board.column("A", 0);
    let b = board.column("B", 0);
    let a_ids = board.fill(a, &["X", "Y"]);
    let b_ids = board.fill(b, &["P"]);

    let err = board.cards().move_card(a_ids[0], b, 2).unwrap_err();
    assert!(matches!(
        err,
        BoardError::InvalidPosition {
            requested: 2,
            max_allowed: 1
        }
    ));
    assert_eq!(board.order(a), a_ids);

    board.cards().move_card(a_ids[0], b, 1).unwrap();
    assert_eq!(board.order(b), vec![b_ids[0], a_ids[0]]);
    assert_eq!(board.order(a), vec![a_ids[1]]);
}

#[test]
fn same_column_move_rejects_count_as_position() {
    let board = Board::new();
    let a = board.column("A", 0);
    let ids = board.fill(a, &["X", "Y", "Z"]);

    let err = board.cards().move_card(ids[0], a, 3).unwrap_err();

    assert!(matches!(
        err,
        BoardError::InvalidPosition {
            requested: 3,
            max_allowed: 2
        }
    ));
    assert_eq!(board.order(a), ids);
}

#[test]
fn round_trip_across_columns_restores_assignment() {
    let board = Board::new();
    let a = board.column("A", 0);
    let b = board.column("B", 0);
    let a_ids = board.fill(a, &["X", "Y", "Z"]);
    let b_ids = board.fill(b, &["P", "Q"]);

    board.cards().move_card(a_ids[1], b, 1).unwrap();
    board.cards().move_card(a_ids[1], a, 1).unwrap();

    assert_eq!(board.order(a), a_ids);
    assert_eq!(board.order(b), b_ids);
}

#[test]
fn move_to_current_slot_is_a_noop() {
    let board = Board::new();
    let a = board.column("A", 0);
    let ids = board.fill(a, &["X", "Y"]);
    let before = board.cards().list_cards(a).unwrap();

    let card = board.cards().move_card(ids[1], a, 1).unwrap();

    assert_eq!(card.position, 1);
    assert_eq!(board.cards().list_cards(a).unwrap(), before);
}

#[test]
fn delete_closes_gap_preserving_relative_order() {
    let board = Board::new();
    let a = board.column("A", 0);
    let ids = board.fill(a, &["0", "1", "2", "3"]);

    board.cards().delete_card(ids[1]).unwrap();

    assert_eq!(board.order(a), vec![ids[0], ids[2], ids[3]]);
    assert!(matches!(
        board.cards().delete_card(ids[1]),
        Err(BoardError::CardNotFound(id)) if id == ids[1]
    ));
}

#[test]
fn cards_of_deleted_column_are_not_found() {
    let board = Board::new();
    let a = board.column("A", 0);
    let b = board.column("B", 0);
    let ids = board.fill(a, &["X"]);
    ColumnService::new(&board.conn, Session::authenticated(board.owner), MemberRolePolicy)
        .unwrap()
        .delete_column(a)
        .unwrap();

    assert!(matches!(
        board.cards().move_card(ids[0], b, 0),
        Err(BoardError::CardNotFound(_))
    ));
    assert!(matches!(
        board.cards().list_cards(a),
        Err(BoardError::ColumnNotFound(_))
    ));
}

#[test]
fn move_into_missing_column_is_not_found() {
    let board = Board::new();
    let a = board.column("A", 0);
    let ids = board.fill(a, &["X"]);
    let missing = Uuid::new_v4();

    assert!(matches!(
        board.cards().move_card(ids[0], missing, 0),
        Err(BoardError::ColumnNotFound(id)) if id == missing
    ));
    assert!(matches!(
        board.cards().move_card(Uuid::new_v4(), a, 0),
        Err(BoardError::CardNotFound(_))
    ));
}

#[test]
fn viewer_cannot_touch_cards_and_anonymous_is_unauthenticated() {
    let board = Board::new();
    let a = board.column("A", 0);
    let ids = board.fill(a, &["X", "Y"]);
    let viewer = Uuid::new_v4();
    SqliteProjectRepository::try_new(&board.conn)
        .unwrap()
        .add_member(board.project, viewer, ProjectRole::Viewer)
        .unwrap();

    let as_viewer = board.cards_as(viewer);
    assert!(matches!(
        as_viewer.create_card(a, NewCard::titled("Z")),
        Err(BoardError::Forbidden(_))
    ));
    assert!(matches!(
        as_viewer.move_card(ids[0], a, 1),
        Err(BoardError::Forbidden(_))
    ));
    assert!(matches!(
        as_viewer.delete_card(ids[0]),
        Err(BoardError::Forbidden(_))
    ));
    assert!(matches!(
        as_viewer.assign_card(ids[0], Some(viewer)),
        Err(BoardError::Forbidden(_))
    ));

    let anonymous = CardService::new(&board.conn, Session::anonymous(), MemberRolePolicy).unwrap();
    assert!(matches!(
        anonymous.move_card(ids[0], a, 1),
        Err(BoardError::Unauthenticated)
    ));
    assert_eq!(board.order(a), ids);
}

#[test]
fn move_into_other_project_requires_edit_rights_there() {
    let board = Board::new();
    let a = board.column("A", 0);
    let ids = board.fill(a, &["X"]);
    let stranger = Uuid::new_v4();
    let other_project = SqliteProjectRepository::try_new(&board.conn)
        .unwrap()
        .create_project(stranger, "Elsewhere", None, None)
        .unwrap()
        .project_uuid;
    let foreign = ColumnService::new(&board.conn, Session::authenticated(stranger), MemberRolePolicy)
        .unwrap()
        .create_column(other_project, NewColumn::named("Inbox"))
        .unwrap()
        .column_uuid;

    assert!(matches!(
        board.cards().move_card(ids[0], foreign, 0),
        Err(BoardError::Forbidden(id)) if id == other_project
    ));
    assert_eq!(board.order(a), ids);
}

#[test]
fn card_history_follows_mutations() {
    let board = Board::new();
    let a = board.column("A", 0);
    let b = board.column("B", 0);
    let ids = board.fill(a, &["X"]);
    board.cards().move_card(ids[0], b, 0).unwrap();
    board.cards().assign_card(ids[0], None).unwrap();
    board.cards().delete_card(ids[0]).unwrap();

    let history = SqliteActivityRepository::try_new(&board.conn)
        .unwrap()
        .list_for_project(board.project, Some(4))
        .unwrap();
    let actions: Vec<&str> = history
        .iter()
        .map(|activity| activity.action.as_str())
        .collect();
    assert_eq!(actions, vec!["DELETED", "ASSIGNED", "MOVED", "CREATED"]);
    assert!(history
        .iter()
        .all(|activity| activity.entity_type == "CARD" && activity.entity_uuid == ids[0]));
}

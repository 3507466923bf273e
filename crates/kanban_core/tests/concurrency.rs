use kanban_core::db::{open_db, open_db_with_config};
use kanban_core::repo::project_repo::{ProjectRepository, SqliteProjectRepository};
use kanban_core::{
    BoardError, CardService, ColumnService, MemberRolePolicy, NewCard, NewColumn, OrderingConfig,
    Session,
};
use std::sync::{Arc, Barrier};
use std::thread;
use uuid::Uuid;

#[test]
fn concurrent_column_creates_receive_distinct_positions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.db");
    let owner = Uuid::new_v4();
    let project = {
        let conn = open_db(&path).unwrap();
        SqliteProjectRepository::try_new(&conn)
            .unwrap()
            .create_project(owner, "Shared", None, None)
            .unwrap()
            .project_uuid
    };

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|index| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let service =
                    ColumnService::new(&conn, Session::authenticated(owner), MemberRolePolicy)
                        .unwrap();
                barrier.wait();
                service
                    .create_column(project, NewColumn::named(format!("Column {index}")))
                    .unwrap()
                    .position
            })
        })
        .collect();

    let mut positions: Vec<i64> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    positions.sort_unstable();
    assert_eq!(positions, vec![0, 1]);
}

#[test]
fn concurrent_card_creates_keep_column_contiguous() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.db");
    let owner = Uuid::new_v4();
    let column = {
        let conn = open_db(&path).unwrap();
        let project = SqliteProjectRepository::try_new(&conn)
            .unwrap()
            .create_project(owner, "Shared", None, None)
            .unwrap()
            .project_uuid;
        ColumnService::new(&conn, Session::authenticated(owner), MemberRolePolicy)
            .unwrap()
            .create_column(project, NewColumn::named("Inbox"))
            .unwrap()
            .column_uuid
    };

    let workers = 4;
    let per_worker = 5;
    let barrier = Arc::new(Barrier::new(workers));
    let handles: Vec<_> = (0..workers)
        .map(|worker| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let service =
                    CardService::new(&conn, Session::authenticated(owner), MemberRolePolicy)
                        .unwrap();
                barrier.wait();
                for item in 0..per_worker {
                    service
                        .create_card(column, NewCard::titled(format!("{worker}-{item}")))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let conn = open_db(&path).unwrap();
    let cards = CardService::new(&conn, Session::authenticated(owner), MemberRolePolicy)
        .unwrap()
        .list_cards(column)
        .unwrap();
    let positions: Vec<i64> = cards.iter().map(|card| card.position).collect();
    let expected: Vec<i64> = (0..(workers * per_worker) as i64).collect();
    assert_eq!(positions, expected);
}

#[test]
fn held_write_lock_surfaces_concurrency_after_bounded_attempts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.db");
    let owner = Uuid::new_v4();
    let config = OrderingConfig {
        max_attempts: 2,
        retry_backoff_ms: 1,
        busy_timeout_ms: 0,
        verify_after_write: true,
    };
    let holder = open_db(&path).unwrap();
    let project = SqliteProjectRepository::try_new(&holder)
        .unwrap()
        .create_project(owner, "Locked", None, None)
        .unwrap()
        .project_uuid;

    let conn = open_db_with_config(&path, &config).unwrap();
    let service = ColumnService::new(&conn, Session::authenticated(owner), MemberRolePolicy)
        .unwrap()
        .with_config(config);

    holder.execute_batch("BEGIN IMMEDIATE;").unwrap();
    let err = service
        .create_column(project, NewColumn::named("Todo"))
        .unwrap_err();
    holder.execute_batch("ROLLBACK;").unwrap();

    assert!(matches!(err, BoardError::Concurrency { attempts: 2 }));
    let created = service
        .create_column(project, NewColumn::named("Todo"))
        .unwrap();
    assert_eq!(created.position, 0);
}

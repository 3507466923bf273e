use kanban_core::db::migrations::latest_version;
use kanban_core::db::{open_db, open_db_in_memory, open_db_with_config, DbError};
use kanban_core::OrderingConfig;
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "projects");
    assert_table_exists(&conn, "project_members");
    assert_table_exists(&conn, "board_columns");
    assert_table_exists(&conn, "cards");
    assert_table_exists(&conn, "activities");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kanban.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "cards");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn open_with_config_applies_busy_timeout_and_foreign_keys() {
    let dir = tempfile::tempdir().unwrap();
    let config = OrderingConfig {
        busy_timeout_ms: 1_234,
        ..OrderingConfig::default()
    };
    let conn = open_db_with_config(dir.path().join("tuned.db"), &config).unwrap();

    let timeout: i64 = conn
        .query_row("PRAGMA busy_timeout;", [], |row| row.get(0))
        .unwrap();
    let foreign_keys: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(timeout, 1_234);
    assert_eq!(foreign_keys, 1);
}

#[test]
fn position_columns_reject_negative_values() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO projects (project_uuid, name, owner_uuid) VALUES ('p', 'Board', 'u');",
        [],
    )
    .unwrap();

    let result = conn.execute(
        "INSERT INTO board_columns (column_uuid, project_uuid, name, position)
         VALUES ('c', 'p', 'Todo', -1);",
        [],
    );
    assert!(result.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}

//! Serialized write transactions with bounded retry.
//!
//! # Responsibility
//! - Run one board mutation inside a single `IMMEDIATE` transaction.
//! - Retry the whole mutation when the store reports a lock conflict.
//!
//! # Invariants
//! - The body either commits fully or leaves no trace.
//! - At most `OrderingConfig::attempts()` attempts are made.

use super::error::{BoardError, BoardResult};
use crate::config::OrderingConfig;
use log::{error, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::thread;
use std::time::Duration;

/// Runs `body` in an `IMMEDIATE` transaction and commits on success.
///
/// `IMMEDIATE` takes the database write lock up front, so two mutations of
/// the same scope never interleave. On `SQLITE_BUSY`/`SQLITE_LOCKED` the
/// transaction is rolled back and the body re-run after a linear backoff.
pub(crate) fn run_serialized<T, F>(
    conn: &Connection,
    config: &OrderingConfig,
    operation: &'static str,
    mut body: F,
) -> BoardResult<T>
where
    F: FnMut(&Transaction<'_>) -> BoardResult<T>,
{
    let attempts = config.attempts();
    let mut attempt = 1;
    loop {
        let outcome = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
            .map_err(BoardError::from)
            .and_then(|tx| {
                let value = body(&tx)?;
                tx.commit()?;
                Ok(value)
            });

        match outcome {
            Err(err) if err.is_busy() && attempt < attempts => {
                warn!(
                    "event=tx_retry module=service status=retry operation={} attempt={} max_attempts={} error={}",
                    operation, attempt, attempts, err
                );
                thread::sleep(Duration::from_millis(
                    config.retry_backoff_ms.saturating_mul(u64::from(attempt)),
                ));
                attempt += 1;
            }
            Err(err) if err.is_busy() => {
                error!(
                    "event=tx_exhausted module=service status=error operation={} attempts={} error_code=concurrency error={}",
                    operation, attempts, err
                );
                return Err(BoardError::Concurrency { attempts });
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::run_serialized;
    use crate::config::OrderingConfig;
    use crate::db::open_db_in_memory;
    use crate::service::error::BoardError;
    use rusqlite::ffi;

    fn busy() -> BoardError {
        rusqlite::Error::SqliteFailure(ffi::Error::new(ffi::SQLITE_BUSY), None).into()
    }

    fn fast_config(max_attempts: u32) -> OrderingConfig {
        OrderingConfig {
            max_attempts,
            retry_backoff_ms: 0,
            ..OrderingConfig::default()
        }
    }

    #[test]
    fn busy_body_is_retried_until_success() {
        let conn = open_db_in_memory().unwrap();
        let mut calls = 0;
        let value = run_serialized(&conn, &fast_config(3), "test", |_| {
            calls += 1;
            if calls < 3 {
                Err(busy())
            } else {
                Ok(calls)
            }
        })
        .unwrap();
        assert_eq!(value, 3);
    }

    #[test]
    fn exhausted_retries_surface_concurrency() {
        let conn = open_db_in_memory().unwrap();
        let mut calls = 0;
        let err = run_serialized::<(), _>(&conn, &fast_config(2), "test", |_| {
            calls += 1;
            Err(busy())
        })
        .unwrap_err();
        assert!(matches!(err, BoardError::Concurrency { attempts: 2 }));
        assert_eq!(calls, 2);
    }

    #[test]
    fn non_busy_error_is_not_retried_and_rolls_back() {
        let conn = open_db_in_memory().unwrap();
        let mut calls = 0;
        let err = run_serialized::<(), _>(&conn, &fast_config(3), "test", |tx| {
            calls += 1;
            tx.execute(
                "INSERT INTO projects (project_uuid, name, color, owner_uuid)
                 VALUES ('p', 'n', '#000000', 'o');",
                [],
            )?;
            Err(BoardError::InvalidName)
        })
        .unwrap_err();
        assert!(matches!(err, BoardError::InvalidName));
        assert_eq!(calls, 1);

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM projects;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}

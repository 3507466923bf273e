//! Board use-case services.
//!
//! # Responsibility
//! - Authorize, validate, and sequence column and card mutations.
//! - Run every mutation as one serialized transaction.

pub mod access;
pub mod card_service;
pub mod column_service;
pub mod error;
mod transaction;

use crate::config::OrderingConfig;
use crate::ordering::{PositionGateway, Scope, SequencedCollection};
use error::{BoardError, BoardResult};
use log::warn;

fn normalize_name(value: &str) -> BoardResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BoardError::InvalidName);
    }
    Ok(trimmed.to_string())
}

fn verify_scopes<G: PositionGateway + ?Sized>(
    config: &OrderingConfig,
    sequence: &SequencedCollection<'_, G>,
    scopes: &[Scope],
) -> BoardResult<()> {
    if config.verify_after_write {
        for scope in scopes {
            sequence.verify(*scope)?;
        }
    }
    Ok(())
}

fn log_failure(event: &'static str, err: &BoardError) {
    warn!(
        "event={} module=service status=error error_code={} error={}",
        event,
        err.code(),
        err
    );
}

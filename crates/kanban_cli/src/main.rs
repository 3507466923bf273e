//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `kanban_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use std::process::ExitCode;

fn main() -> ExitCode {
    println!("kanban_core version={}", kanban_core::core_version());
    let conn = match kanban_core::db::open_db_in_memory() {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("kanban_core db_open error={err}");
            return ExitCode::FAILURE;
        }
    };
    match conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0)) {
        Ok(version) => {
            println!(
                "kanban_core schema_version={} latest={}",
                version,
                kanban_core::db::migrations::latest_version()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("kanban_core schema_version error={err}");
            ExitCode::FAILURE
        }
    }
}

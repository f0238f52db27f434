//! Versioned schema for the assessment history database.
//!
//! The applied version is mirrored to `PRAGMA user_version`; versions must
//! stay strictly increasing.

use rusqlite::Connection;

use crate::core::component::ComponentError;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        sql: include_str!("0002_batch_ref.sql"),
    },
];

/// Latest schema version known by this binary
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Apply all pending migrations in one transaction
pub fn apply_migrations(conn: &mut Connection) -> Result<(), ComponentError> {
    let current = current_version(conn)?;
    let latest = latest_version();

    if current > latest {
        return Err(ComponentError::PersistenceError(format!(
            "Database schema version {} is newer than supported version {}",
            current, latest
        )));
    }
    if current == latest {
        return Ok(());
    }

    let tx = conn.transaction().map_err(db_error)?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tx.execute_batch(migration.sql).map_err(db_error)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))
            .map_err(db_error)?;
    }
    tx.commit().map_err(db_error)?;

    Ok(())
}

/// Schema version recorded in the database
pub fn current_version(conn: &Connection) -> Result<u32, ComponentError> {
    conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))
        .map_err(db_error)
}

pub(crate) fn db_error(e: rusqlite::Error) -> ComponentError {
    ComponentError::PersistenceError(e.to_string())
}

//! Ordered schema steps for the `hash_fields` store.
//!
//! Pending steps run in one transaction, so a failed step leaves the file at
//! the version it had before the upgrade started.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    name: "hash_fields",
    sql: include_str!("0001_hash_fields.sql"),
}];

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    newest(SCHEMA_STEPS)
}

/// Version recorded in `PRAGMA user_version`; 0 for a fresh file.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

/// Brings the database up to [`latest_version`] and returns that version.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<u32> {
    apply_steps(conn, SCHEMA_STEPS)
}

fn newest(steps: &[SchemaStep]) -> u32 {
    steps.last().map_or(0, |step| step.version)
}

fn apply_steps(conn: &mut Connection, steps: &[SchemaStep]) -> DbResult<u32> {
    let from_version = schema_version(conn)?;
    let latest = newest(steps);
    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }

    let mut pending = steps
        .iter()
        .filter(|step| step.version > from_version)
        .peekable();
    if pending.peek().is_none() {
        return Ok(from_version);
    }

    let tx = conn.transaction()?;
    for step in pending {
        tx.execute_batch(step.sql)
            .and_then(|()| tx.pragma_update(None, "user_version", step.version))
            .map_err(|source| DbError::Migration {
                version: step.version,
                source,
            })?;
        debug!(
            "event=db_migrate_step module=db status=ok version={} name={}",
            step.version, step.name
        );
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={}",
        from_version, latest
    );
    Ok(latest)
}

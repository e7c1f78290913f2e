use rusqlite::Connection;

use crate::error::Result;

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

/// Applied in order; the highest applied version is kept in
/// `PRAGMA user_version` so the store holds no bookkeeping tables.
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial",
    sql: include_str!("migrations/001_initial.sql"),
}];

pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current = schema_version(conn)?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        apply_migration(conn, migration)?;
    }

    Ok(())
}

fn schema_version(conn: &Connection) -> Result<u32> {
    let version = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}

fn apply_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    tracing::info!(
        "Applying migration {:03}: {}",
        migration.version,
        migration.name
    );

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(migration.sql)?;
    tx.pragma_update(None, "user_version", migration.version)?;
    tx.commit()?;

    tracing::info!("Migration {:03} applied successfully", migration.version);
    Ok(())
}

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub const SCHEMA_VERSION: i64 = 1;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("compass.sqlite3");
    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}

#[cfg(test)]
pub fn open_in_memory() -> anyhow::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS collections(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS meta(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    // Existing workspaces may predate the updated_at column. Add it and leave
    // historical rows NULL; writes stamp it going forward.
    ensure_collections_updated_at(conn)?;
    ensure_schema_version(conn)?;

    Ok(())
}

/// Raw read of a collection value. `None` when the key has never been
/// written. Callers wanting the fallback contract go through
/// `store::read_collection`.
pub fn kv_get(conn: &Connection, key: &str) -> anyhow::Result<Option<String>> {
    let v = conn
        .query_row("SELECT value FROM collections WHERE key = ?", [key], |r| {
            r.get::<_, String>(0)
        })
        .optional()?;
    Ok(v)
}

/// Raw write of a collection value, replacing any prior content for the key.
pub fn kv_put(conn: &Connection, key: &str, value: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO collections(key, value, updated_at) VALUES(?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        (key, value, Utc::now().to_rfc3339()),
    )?;
    Ok(())
}

fn ensure_collections_updated_at(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "collections", "updated_at")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE collections ADD COLUMN updated_at TEXT", [])?;
    Ok(())
}

fn ensure_schema_version(conn: &Connection) -> anyhow::Result<()> {
    let current: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    if current.is_none() {
        conn.execute(
            "INSERT INTO meta(key, value) VALUES('schema_version', ?)",
            [SCHEMA_VERSION.to_string()],
        )?;
    }
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

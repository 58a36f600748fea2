//! SQLite store: thoughts and connections as two relational tables.
//!
//! ```text
//! thoughts(id INTEGER PRIMARY KEY, name TEXT)
//! connections(seq INTEGER PRIMARY KEY, from_id, to_id, kind)
//! ```
//!
//! | Notebook concept   | SQLite representation                       |
//! |--------------------|---------------------------------------------|
//! | ThoughtId (u64)    | `thoughts.id`, bit-cast to i64              |
//! | ConnectionType     | `connections.kind` (`ConnectionType::code`) |
//! | enumeration order  | `thoughts.id` / `connections.seq` ascending |
//!
//! Transactions map to `BEGIN IMMEDIATE` / `COMMIT` / `ROLLBACK`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::model::*;
use crate::tx::TxId;
use crate::{Error, Result};
use super::Store;

const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS thoughts (
        id   INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS connections (
        seq     INTEGER PRIMARY KEY AUTOINCREMENT,
        from_id INTEGER NOT NULL,
        to_id   INTEGER NOT NULL,
        kind    INTEGER NOT NULL,
        CHECK (from_id <> to_id)
    );
    CREATE INDEX IF NOT EXISTS idx_connections_from ON connections (from_id, kind);
    CREATE INDEX IF NOT EXISTS idx_connections_to ON connections (to_id, kind);
";

// SQLite INTEGER is i64; ids are reinterpreted bit-for-bit.
#[allow(clippy::cast_possible_wrap)]
fn to_sql_id(id: ThoughtId) -> i64 {
    id.0 as i64
}

#[allow(clippy::cast_sign_loss)]
fn from_sql_id(raw: i64) -> ThoughtId {
    ThoughtId(raw as u64)
}

/// SQLite-backed implementation of `Store`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
    open_tx: Mutex<Option<TxId>>,
    next_tx_id: AtomicU64,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        // WAL is unavailable on some filesystems; the default journal still works.
        if let Err(e) = conn.pragma_update(None, "journal_mode", "WAL") {
            tracing::warn!(path = %path.display(), error = %e, "could not enable WAL journal");
        }
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Create a private in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
            open_tx: Mutex::new(None),
            next_tx_id: AtomicU64::new(1),
        })
    }

    /// Database file, or `None` for an in-memory store.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn thought_exists(conn: &Connection, id: ThoughtId) -> Result<bool> {
        let found = conn
            .query_row(
                "SELECT 1 FROM thoughts WHERE id = ?1",
                params![to_sql_id(id)],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn collect_connections<P: rusqlite::Params>(
        conn: &Connection,
        sql: &str,
        params: P,
    ) -> Result<Vec<ConnectionRecord>> {
        let mut stmt = conn.prepare_cached(sql)?;
        let rows = stmt
            .query_map(params, |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(from, to, code)| {
                let kind = ConnectionType::from_code(code).ok_or_else(|| {
                    Error::StorageError(format!("unknown connection kind {code}"))
                })?;
                Ok(ConnectionRecord::new(from_sql_id(from), from_sql_id(to), kind))
            })
            .collect()
    }

    fn end_tx(&self, tx: TxId, sql: &str) -> Result<()> {
        let mut open = self.open_tx.lock();
        if *open != Some(tx) {
            return Err(Error::TxError(format!("{tx} is not the open transaction")));
        }
        self.conn.lock().execute_batch(sql)?;
        *open = None;
        Ok(())
    }
}

impl Store for SqliteStore {
    fn begin_tx(&self) -> Result<TxId> {
        let mut open = self.open_tx.lock();
        if let Some(id) = *open {
            return Err(Error::TxError(format!("{id} is still open")));
        }
        self.conn.lock().execute_batch("BEGIN IMMEDIATE")?;
        let id = TxId(self.next_tx_id.fetch_add(1, Ordering::Relaxed));
        *open = Some(id);
        Ok(id)
    }

    fn commit_tx(&self, tx: TxId) -> Result<()> {
        self.end_tx(tx, "COMMIT")
    }

    fn rollback_tx(&self, tx: TxId) -> Result<()> {
        self.end_tx(tx, "ROLLBACK")
    }

    // ── Thought operations ─────────────────────────────────────────

    fn get_thought(&self, id: ThoughtId) -> Result<Option<ThoughtRecord>> {
        let conn = self.conn.lock();
        let name: Option<String> = conn
            .query_row(
                "SELECT name FROM thoughts WHERE id = ?1",
                params![to_sql_id(id)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name.map(|name| ThoughtRecord::new(id, name)))
    }

    fn insert_thought(&self, id: ThoughtId, name: &str) -> Result<()> {
        if !id.is_valid() {
            return Err(Error::InvalidArgument("cannot store the invalid thought id".into()));
        }
        let conn = self.conn.lock();
        if Self::thought_exists(&conn, id)? {
            return Err(Error::StorageError(format!("Thought {id} already exists")));
        }
        conn.execute(
            "INSERT INTO thoughts (id, name) VALUES (?1, ?2)",
            params![to_sql_id(id), name],
        )?;
        Ok(())
    }

    fn rename_thought(&self, id: ThoughtId, name: &str) -> Result<()> {
        let changed = self.conn.lock().execute(
            "UPDATE thoughts SET name = ?2 WHERE id = ?1",
            params![to_sql_id(id), name],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("Thought {id}")));
        }
        Ok(())
    }

    fn delete_thought(&self, id: ThoughtId) -> Result<bool> {
        let changed = self
            .conn
            .lock()
            .execute("DELETE FROM thoughts WHERE id = ?1", params![to_sql_id(id)])?;
        Ok(changed > 0)
    }

    fn list_thoughts(&self) -> Result<Vec<ThoughtRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached("SELECT id, name FROM thoughts ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ThoughtRecord::new(from_sql_id(row.get(0)?), row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // ── Connection operations ──────────────────────────────────────

    fn get_connections(&self, filter: ConnectionFilter) -> Result<Vec<ConnectionRecord>> {
        let conn = self.conn.lock();
        match filter {
            ConnectionFilter::From(id, kind) => Self::collect_connections(
                &conn,
                "SELECT from_id, to_id, kind FROM connections
                 WHERE from_id = ?1 AND kind = ?2 ORDER BY seq",
                params![to_sql_id(id), kind.code()],
            ),
            ConnectionFilter::To(id, kind) => Self::collect_connections(
                &conn,
                "SELECT from_id, to_id, kind FROM connections
                 WHERE to_id = ?1 AND kind = ?2 ORDER BY seq",
                params![to_sql_id(id), kind.code()],
            ),
            ConnectionFilter::Links(id) => Self::collect_connections(
                &conn,
                "SELECT from_id, to_id, kind FROM connections
                 WHERE (from_id = ?1 OR to_id = ?1) AND kind = ?2 ORDER BY seq",
                params![to_sql_id(id), ConnectionType::Link.code()],
            ),
            ConnectionFilter::Touching(id) => Self::collect_connections(
                &conn,
                "SELECT from_id, to_id, kind FROM connections
                 WHERE from_id = ?1 OR to_id = ?1 ORDER BY seq",
                params![to_sql_id(id)],
            ),
        }
    }

    fn insert_connection(&self, from: ThoughtId, to: ThoughtId, kind: ConnectionType) -> Result<()> {
        if from == to {
            return Err(Error::InvalidArgument(format!("Thought {from} cannot connect to itself")));
        }
        let conn = self.conn.lock();
        if !Self::thought_exists(&conn, from)? {
            return Err(Error::NotFound(format!("Source thought {from}")));
        }
        if !Self::thought_exists(&conn, to)? {
            return Err(Error::NotFound(format!("Target thought {to}")));
        }
        conn.execute(
            "INSERT INTO connections (from_id, to_id, kind) VALUES (?1, ?2, ?3)",
            params![to_sql_id(from), to_sql_id(to), kind.code()],
        )?;
        Ok(())
    }

    fn delete_connection(&self, a: ThoughtId, b: ThoughtId) -> Result<bool> {
        let changed = self.conn.lock().execute(
            "DELETE FROM connections
             WHERE (from_id = ?1 AND to_id = ?2) OR (from_id = ?2 AND to_id = ?1)",
            params![to_sql_id(a), to_sql_id(b)],
        )?;
        Ok(changed > 0)
    }

    fn detach_delete_thought(&self, id: ThoughtId) -> Result<bool> {
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM connections WHERE from_id = ?1 OR to_id = ?1",
            params![to_sql_id(id)],
        )?;
        let changed = conn.execute("DELETE FROM thoughts WHERE id = ?1", params![to_sql_id(id)])?;
        Ok(changed > 0)
    }

    fn thought_count(&self) -> Result<u64> {
        let n: i64 = self.conn.lock().query_row("SELECT COUNT(*) FROM thoughts", [], |r| r.get(0))?;
        Ok(n.unsigned_abs())
    }

    fn connection_count(&self) -> Result<u64> {
        let n: i64 = self.conn.lock().query_row("SELECT COUNT(*) FROM connections", [], |r| r.get(0))?;
        Ok(n.unsigned_abs())
    }
}

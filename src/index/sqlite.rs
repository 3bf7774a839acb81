//! SQLite index backend

use crate::aggregate::IndexRecord;
use crate::index::schema::initialize_schema;
use crate::index::{IndexError, IndexResult, IndexSink};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Local, durable index in a SQLite database
pub struct SqliteIndex {
    conn: Mutex<Connection>,
}

impl SqliteIndex {
    /// Opens or creates the index database at `path`
    pub fn new(path: &Path) -> IndexResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;
        initialize_schema(&conn)?;

        tracing::info!("Opened SQLite index at '{}'", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory index
    pub fn new_in_memory() -> IndexResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> IndexResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| IndexError::Poisoned)
    }

    /// Reads back the record stored for `url`
    pub fn get(&self, url: &str) -> IndexResult<Option<IndexRecord>> {
        let conn = self.lock()?;

        let record = conn
            .query_row(
                "SELECT url, ntriple, title, description, category, location, price_lower, price_upper
                 FROM documents WHERE url = ?1",
                params![url],
                |row| {
                    Ok(IndexRecord {
                        url: row.get(0)?,
                        ntriple: row.get(1)?,
                        title: row.get(2)?,
                        description: row.get(3)?,
                        category: row.get(4)?,
                        location: row.get(5)?,
                        price_lower: row.get(6)?,
                        price_upper: row.get(7)?,
                        tag: Vec::new(),
                    })
                },
            )
            .optional()?;

        let Some(mut record) = record else {
            return Ok(None);
        };

        let mut stmt =
            conn.prepare("SELECT tag FROM document_tags WHERE url = ?1 ORDER BY position")?;
        let tags = stmt.query_map(params![url], |row| row.get::<_, String>(0))?;
        for tag in tags {
            record.tag.push(tag?);
        }

        Ok(Some(record))
    }

    /// Number of indexed documents
    pub fn count(&self) -> IndexResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl IndexSink for SqliteIndex {
    fn write(&self, record: &IndexRecord) -> IndexResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM document_tags WHERE url = ?1", params![record.url])?;
        tx.execute(
            "INSERT OR REPLACE INTO documents
             (url, ntriple, title, description, category, location, price_lower, price_upper, indexed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.url,
                record.ntriple,
                record.title,
                record.description,
                record.category,
                record.location,
                record.price_lower,
                record.price_upper,
                Utc::now().to_rfc3339(),
            ],
        )?;
        for (position, tag) in record.tag.iter().enumerate() {
            tx.execute(
                "INSERT INTO document_tags (url, position, tag) VALUES (?1, ?2, ?3)",
                params![record.url, position as i64, tag],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

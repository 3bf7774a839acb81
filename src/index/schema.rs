//! SQLite index schema

/// SQL schema for the index database
pub const SCHEMA_SQL: &str = r#"
-- One row per indexed document
CREATE TABLE IF NOT EXISTS documents (
    url TEXT PRIMARY KEY,
    ntriple TEXT NOT NULL,
    title TEXT,
    description TEXT,
    category TEXT,
    location TEXT,
    price_lower REAL,
    price_upper REAL,
    indexed_at TEXT NOT NULL
);

-- Multi-valued tag field, in arrival order
CREATE TABLE IF NOT EXISTS document_tags (
    url TEXT NOT NULL REFERENCES documents(url) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    tag TEXT NOT NULL,
    PRIMARY KEY (url, position)
);

CREATE INDEX IF NOT EXISTS idx_document_tags_tag ON document_tags(tag);
CREATE INDEX IF NOT EXISTS idx_documents_category ON documents(category);
"#;

/// Initializes the index schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

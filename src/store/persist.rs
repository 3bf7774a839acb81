//! Persisted revisit state format
//!
//! The state file is plain text:
//!
//! ```text
//! # linkspider revisit-state v1
//! http://example.com/a	2024-05-01T12:00:00Z
//! http://example.com/b	never
//! http://example.com/c	unspecified
//! ```
//!
//! Writes go to a temporary file in the same directory which is then renamed
//! over the previous state.

use crate::store::{Expiry, StoreError, StoreResult};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use url::Url;

/// First line of every state file
pub const FORMAT_HEADER: &str = "# linkspider revisit-state v1";

/// Creates the data directory if needed and checks it is a writable directory
pub fn prepare_dir(dir: &Path) -> StoreResult<()> {
    if !dir.exists() {
        tracing::info!("Creating revisit state folder '{}'", dir.display());
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
    }

    let metadata = fs::metadata(dir).map_err(|e| StoreError::io(dir, e))?;
    if !metadata.is_dir() {
        return Err(StoreError::InvalidDataDir(format!(
            "Not a folder: '{}'",
            dir.display()
        )));
    }
    if metadata.permissions().readonly() {
        return Err(StoreError::InvalidDataDir(format!(
            "Cannot write to folder '{}'",
            dir.display()
        )));
    }
    Ok(())
}

/// Reads the state file at `path`
pub fn load(path: &Path) -> StoreResult<BTreeMap<Url, Expiry>> {
    tracing::info!("Reading expiry dates from '{}'", path.display());
    let content = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    let entries = parse_state(&content)?;
    tracing::info!("Finished reading {} expiry dates", entries.len());
    Ok(entries)
}

/// Atomically replaces the state file at `path`
pub fn save(path: &Path, entries: &BTreeMap<Url, Expiry>) -> StoreResult<()> {
    tracing::info!(
        "Writing {} expiry dates to '{}'",
        entries.len(),
        path.display()
    );
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let temp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;

    {
        let mut writer = BufWriter::new(temp.as_file());
        writer
            .write_all(render_state(entries).as_bytes())
            .and_then(|_| writer.flush())
            .map_err(|e| StoreError::io(temp.path(), e))?;
    }
    temp.as_file()
        .sync_all()
        .map_err(|e| StoreError::io(temp.path(), e))?;
    temp.persist(path)
        .map_err(|e| StoreError::io(path, e.error))?;

    tracing::info!("Done writing expiry dates");
    Ok(())
}

/// Parses state file content
pub fn parse_state(content: &str) -> StoreResult<BTreeMap<Url, Expiry>> {
    let mut lines = content.lines().enumerate();

    match lines.next() {
        Some((_, header)) if header.trim_end() == FORMAT_HEADER => {}
        Some((_, header)) => {
            return Err(StoreError::Format {
                line: 1,
                message: format!("unsupported state file header '{}'", header),
            })
        }
        None => {
            return Err(StoreError::Format {
                line: 1,
                message: "empty state file".to_string(),
            })
        }
    }

    let mut entries = BTreeMap::new();
    for (index, line) in lines {
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        let (uri, value) = line.split_once('\t').ok_or_else(|| StoreError::Format {
            line: line_no,
            message: "expected URI<TAB>expiry".to_string(),
        })?;
        let uri = Url::parse(uri).map_err(|e| StoreError::Format {
            line: line_no,
            message: format!("invalid URI '{}': {}", uri, e),
        })?;
        let expiry = Expiry::from_record_value(value.trim()).ok_or_else(|| StoreError::Format {
            line: line_no,
            message: format!("invalid expiry '{}'", value),
        })?;
        entries.insert(uri, expiry);
    }

    Ok(entries)
}

/// Renders state file content in key order
pub fn render_state(entries: &BTreeMap<Url, Expiry>) -> String {
    let mut out = String::from(FORMAT_HEADER);
    out.push('\n');
    for (uri, expiry) in entries {
        out.push_str(uri.as_str());
        out.push('\t');
        out.push_str(&expiry.to_record_value());
        out.push('\n');
    }
    out
}

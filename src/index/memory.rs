//! In-memory index backend

use crate::aggregate::IndexRecord;
use crate::index::{IndexError, IndexResult, IndexSink};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Keeps written records in memory; can be told to reject every write
#[derive(Debug, Default)]
pub struct MemoryIndex {
    records: Mutex<Vec<IndexRecord>>,
    fail_writes: bool,
    write_attempts: AtomicUsize,
    commits: AtomicUsize,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every write fails
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    /// Snapshot of the stored records in write order
    pub fn records(&self) -> Vec<IndexRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

impl IndexSink for MemoryIndex {
    fn write(&self, record: &IndexRecord) -> IndexResult<()> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(IndexError::WriteFailed(format!(
                "memory index rejects {}",
                record.url
            )));
        }

        let mut records = self.records.lock().map_err(|_| IndexError::Poisoned)?;
        records.retain(|existing| existing.url != record.url);
        records.push(record.clone());
        Ok(())
    }

    fn commit(&self) -> IndexResult<()> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

//! Solr index backend
//!
//! Documents are sent to the JSON update handler of a Solr core, one request
//! per document. The commit is sent once, when the crawl ends.

use crate::aggregate::IndexRecord;
use crate::index::{IndexError, IndexResult, IndexSink};
use reqwest::blocking::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use url::Url;

/// Index backed by a remote Solr core
pub struct SolrIndex {
    client: Client,
    update_url: Url,
    committed: AtomicBool,
}

impl SolrIndex {
    /// Creates a sink for the core at `core_url` (e.g. `http://localhost:8983/solr/needs`)
    pub fn new(core_url: &Url) -> IndexResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self::with_client(client, core_url))
    }

    /// Creates a sink using an existing blocking client
    pub fn with_client(client: Client, core_url: &Url) -> Self {
        let base = core_url.as_str().trim_end_matches('/');
        let update_url = Url::parse(&format!("{}/update", base)).unwrap_or_else(|_| core_url.clone());
        Self {
            client,
            update_url,
            committed: AtomicBool::new(false),
        }
    }

    /// The update endpoint requests are posted to
    pub fn update_url(&self) -> &Url {
        &self.update_url
    }

    fn post(&self, body: &serde_json::Value) -> IndexResult<()> {
        let response = self
            .client
            .post(self.update_url.clone())
            .json(body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(IndexError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

impl IndexSink for SolrIndex {
    fn write(&self, record: &IndexRecord) -> IndexResult<()> {
        let documents = serde_json::to_value(vec![record])
            .map_err(|e| IndexError::WriteFailed(e.to_string()))?;
        self.post(&documents)?;
        tracing::debug!("Sent {} to Solr", record.url);
        Ok(())
    }

    fn commit(&self) -> IndexResult<()> {
        if self.committed.load(Ordering::SeqCst) {
            tracing::debug!("Solr index already committed");
            return Ok(());
        }
        self.post(&serde_json::json!({ "commit": {} }))?;
        self.committed.store(true, Ordering::SeqCst);
        tracing::info!("Committed Solr index at {}", self.update_url);
        Ok(())
    }

    fn name(&self) -> &str {
        "solr"
    }
}

//! Crawl driver
//!
//! Drives a list of URIs through the fetch filter, the fetcher and the
//! ingestion pipeline, and records the next expiry of every fetched URI in the
//! revisit store. Fetches run concurrently up to the configured limit; the
//! blocking ingestion work runs on the blocking thread pool.

use crate::aggregate::AggregateOutcome;
use crate::config::Config;
use crate::crawler::{build_http_client, fetch_document, IngestPipeline, IngestReport};
use crate::filter::{AllowOnlyNewOrExpired, FetchFilter};
use crate::store::RevisitStore;
use crate::{Result, SpiderError};
use reqwest::Client;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use url::Url;

/// Counters of one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Rejected by the fetch filter
    pub skipped: usize,

    /// Transport failures; these URIs stay due
    pub failed: usize,

    /// Of the transport failures, hosts that timed out or refused the connection
    pub unreachable: usize,

    /// Written to the index
    pub flushed: usize,

    /// Rejected by the index
    pub write_failed: usize,

    /// Fetched but not indexed
    pub discarded: usize,
}

impl CrawlSummary {
    fn record(&mut self, report: &IngestReport) {
        match report.outcome {
            AggregateOutcome::Flushed { .. } => self.flushed += 1,
            AggregateOutcome::WriteFailed { .. } => self.write_failed += 1,
            AggregateOutcome::Discarded(_) => self.discarded += 1,
        }
    }

    /// Number of URIs that were fetched
    pub fn fetched(&self) -> usize {
        self.flushed + self.write_failed + self.discarded
    }
}

/// Concurrent fetch driver
pub struct Crawler {
    client: Client,
    store: Arc<RevisitStore>,
    filter: Arc<dyn FetchFilter>,
    pipeline: Arc<IngestPipeline>,
    semaphore: Arc<Semaphore>,
}

impl Crawler {
    /// Creates a crawler filtering with [`AllowOnlyNewOrExpired`]
    ///
    /// # Arguments
    ///
    /// * `config` - The configuration (user agent and concurrency limit)
    /// * `store` - An initialized revisit store
    /// * `pipeline` - The ingestion pipeline for fetched responses
    pub fn new(
        config: &Config,
        store: Arc<RevisitStore>,
        pipeline: Arc<IngestPipeline>,
    ) -> Result<Self> {
        let client = build_http_client(&config.user_agent)?;
        let filter: Arc<dyn FetchFilter> = Arc::new(AllowOnlyNewOrExpired::new(Arc::clone(&store)));
        Ok(Self {
            client,
            store,
            filter,
            pipeline,
            semaphore: Arc::new(Semaphore::new(config.crawler.max_concurrent_fetches as usize)),
        })
    }

    /// Replaces the fetch filter
    pub fn with_filter(mut self, filter: Arc<dyn FetchFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Crawls the given URIs once each
    ///
    /// Transport failures are logged and counted; the URI is not registered
    /// and stays due. Contract violations from the pipeline or a store error
    /// fail the run after all started fetches have completed.
    pub async fn run(&self, uris: Vec<Url>) -> Result<CrawlSummary> {
        let mut summary = CrawlSummary::default();
        let mut seen = HashSet::new();
        let mut handles = Vec::new();

        for uri in uris {
            if !seen.insert(uri.clone()) {
                continue;
            }
            if !self.filter.fetch_ok(&uri, None, None)? {
                tracing::debug!("Skipping {}: not expired", uri);
                summary.skipped += 1;
                continue;
            }

            let client = self.client.clone();
            let store = Arc::clone(&self.store);
            let pipeline = Arc::clone(&self.pipeline);
            let semaphore = Arc::clone(&self.semaphore);
            handles.push(tokio::spawn(async move {
                crawl_one(client, store, pipeline, semaphore, uri).await
            }));
        }

        tracing::info!(
            "Fetching {} URIs ({} skipped)",
            handles.len(),
            summary.skipped
        );

        let mut first_error = None;
        for handle in handles {
            match handle.await {
                Ok(Ok(Fetched::Ingested(report))) => summary.record(&report),
                Ok(Ok(Fetched::Failed { unreachable })) => {
                    summary.failed += 1;
                    if unreachable {
                        summary.unreachable += 1;
                    }
                }
                Ok(Err(e)) => {
                    tracing::error!("Crawl task failed: {}", e);
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    tracing::error!("Crawl task panicked: {}", e);
                    first_error.get_or_insert(SpiderError::Task(e.to_string()));
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        tracing::info!(
            "Crawl finished: {} fetched, {} indexed, {} discarded, {} index failures, {} fetch failures ({} unreachable), {} skipped",
            summary.fetched(),
            summary.flushed,
            summary.discarded,
            summary.write_failed,
            summary.failed,
            summary.unreachable,
            summary.skipped
        );
        Ok(summary)
    }
}

enum Fetched {
    Ingested(IngestReport),
    Failed { unreachable: bool },
}

/// Fetches, ingests and registers one URI
async fn crawl_one(
    client: Client,
    store: Arc<RevisitStore>,
    pipeline: Arc<IngestPipeline>,
    semaphore: Arc<Semaphore>,
    uri: Url,
) -> Result<Fetched> {
    let _permit = semaphore
        .acquire_owned()
        .await
        .map_err(|e| SpiderError::Task(e.to_string()))?;

    let response = match fetch_document(&client, &uri).await {
        Ok(response) => response,
        Err(e) if e.is_unreachable() => {
            tracing::warn!("Host unreachable: {}", e);
            return Ok(Fetched::Failed { unreachable: true });
        }
        Err(e) => {
            tracing::warn!("{}", e);
            return Ok(Fetched::Failed { unreachable: false });
        }
    };

    let report = tokio::task::spawn_blocking(move || pipeline.ingest(&response))
        .await
        .map_err(|e| SpiderError::Task(e.to_string()))??;

    store.register(&uri, report.expiry)?;
    Ok(Fetched::Ingested(report))
}

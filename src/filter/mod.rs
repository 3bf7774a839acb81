//! Fetch filters
//!
//! A fetch filter is consulted by the scheduler before a fetch is issued.

use crate::store::RevisitStore;
use crate::Result;
use std::sync::Arc;
use url::Url;

/// What is known about a response body at decision time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseEntity {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

/// Decides whether a URI should be fetched
pub trait FetchFilter: Send + Sync {
    /// Returns true if the fetch should go ahead
    ///
    /// # Arguments
    ///
    /// * `uri` - The candidate URI
    /// * `status` - Status code known for the URI, if any
    /// * `entity` - Response entity known for the URI, if any
    fn fetch_ok(&self, uri: &Url, status: Option<u16>, entity: Option<&ResponseEntity>)
        -> Result<bool>;
}

/// Lets through URIs that were never fetched or whose expiry has passed
pub struct AllowOnlyNewOrExpired {
    store: Arc<RevisitStore>,
}

impl AllowOnlyNewOrExpired {
    pub fn new(store: Arc<RevisitStore>) -> Self {
        Self { store }
    }
}

impl FetchFilter for AllowOnlyNewOrExpired {
    fn fetch_ok(
        &self,
        uri: &Url,
        _status: Option<u16>,
        _entity: Option<&ResponseEntity>,
    ) -> Result<bool> {
        Ok(self.store.is_download_required(uri)?)
    }
}

//! Revisit store implementation
//!
//! Keeps the expiry date of every known resource and decides whether a
//! resource must be downloaded (again).

use crate::store::persist;
use crate::store::{Expiry, StoreError, StoreResult};
use chrono::{DateTime, Duration, Utc};
use std::collections::{btree_map, BTreeMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use url::Url;

/// Name of the state file inside the data directory
pub const STATE_FILE: &str = "revisit-state.tsv";

/// How far in the future the "never expires" sentinel lies
pub const NEVER_EXPIRES_YEARS: i64 = 1000;

/// Mutable state guarded by the store's single lock
#[derive(Debug, Default)]
struct StoreState {
    initialized: bool,
    entries: BTreeMap<Url, Expiry>,
}

/// Persisted mapping from resource URI to expiry
///
/// Every operation except [`initialize`](Self::initialize) fails with
/// [`StoreError::NotInitialized`] until the store has been initialized.
/// One mutex guards the whole state, so registrations are mutually exclusive
/// and `shutdown` acts as a barrier.
///
/// # Example
///
/// ```no_run
/// use linkspider::store::RevisitStore;
/// use url::Url;
///
/// let store = RevisitStore::new("./crawl-state");
/// store.initialize().unwrap();
///
/// let uri = Url::parse("https://example.com/need/1").unwrap();
/// if store.is_download_required(&uri).unwrap() {
///     // fetch, then register the new expiry
///     store.register_uri_never_expires(&uri).unwrap();
/// }
///
/// store.shutdown().unwrap();
/// ```
#[derive(Debug)]
pub struct RevisitStore {
    data_dir: PathBuf,
    never_expires: DateTime<Utc>,
    state: Mutex<StoreState>,
}

impl RevisitStore {
    /// Creates a store persisting into `data_dir`
    ///
    /// Nothing is read or created until [`initialize`](Self::initialize).
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            never_expires: Utc::now() + Duration::days(365 * NEVER_EXPIRES_YEARS),
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Directory holding the state file
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Full path of the state file
    pub fn state_file(&self) -> PathBuf {
        self.data_dir.join(STATE_FILE)
    }

    /// Instant used for resources registered as never expiring
    pub fn never_expires_at(&self) -> DateTime<Utc> {
        self.never_expires
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, StoreState>> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }

    fn lock_initialized(&self) -> StoreResult<MutexGuard<'_, StoreState>> {
        let state = self.lock()?;
        if !state.initialized {
            return Err(StoreError::NotInitialized);
        }
        Ok(state)
    }

    /// Returns true if the store has been initialized and not shut down
    pub fn is_initialized(&self) -> bool {
        self.lock().map(|state| state.initialized).unwrap_or(false)
    }

    // ===== Lifecycle =====

    /// Loads the persisted state, or starts empty if there is none
    ///
    /// # Errors
    ///
    /// * `StoreError::AlreadyInitialized` - called twice without `shutdown`
    /// * `StoreError::InvalidDataDir` / `Io` / `Format` - state could not be loaded
    pub fn initialize(&self) -> StoreResult<()> {
        let mut state = self.lock()?;
        tracing::info!("Initializing revisit store in '{}'", self.data_dir.display());
        if state.initialized {
            return Err(StoreError::AlreadyInitialized);
        }

        persist::prepare_dir(&self.data_dir)?;
        let path = self.state_file();
        state.entries = if path.exists() {
            persist::load(&path)?
        } else {
            tracing::info!("No revisit state at '{}', starting empty", path.display());
            BTreeMap::new()
        };
        state.initialized = true;

        tracing::info!(
            "Revisit store initialized with {} known URIs",
            state.entries.len()
        );
        Ok(())
    }

    /// Persists the full state and returns the store to the uninitialized state
    ///
    /// Must complete before the process exits; registrations made since the
    /// last successful shutdown are lost otherwise.
    pub fn shutdown(&self) -> StoreResult<()> {
        let mut state = self.lock_initialized()?;
        tracing::info!("Saving revisit state to '{}'", self.data_dir.display());
        persist::prepare_dir(&self.data_dir)?;
        persist::save(&self.state_file(), &state.entries)?;
        state.entries.clear();
        state.initialized = false;
        tracing::info!("Revisit store shut down");
        Ok(())
    }

    // ===== Registration =====

    /// Records the expiry of a resource, replacing any earlier record
    pub fn register(&self, uri: &Url, expiry: Expiry) -> StoreResult<()> {
        let mut state = self.lock_initialized()?;
        tracing::debug!("Registering expiry '{}' for URI '{}'", expiry, uri);
        state.entries.insert(uri.clone(), expiry);
        Ok(())
    }

    /// Records an expiry date; `None` means no expiry was provided
    ///
    /// A resource registered without expiry is always due for download.
    pub fn register_expiry_date(
        &self,
        uri: &Url,
        expires: Option<DateTime<Utc>>,
    ) -> StoreResult<()> {
        self.register(uri, Expiry::from_option(expires))
    }

    /// Records that a resource never expires
    pub fn register_uri_never_expires(&self, uri: &Url) -> StoreResult<()> {
        self.register(uri, Expiry::Never)
    }

    // ===== Queries =====

    /// Returns the recorded expiry of a resource
    pub fn expiry_of(&self, uri: &Url) -> StoreResult<Option<Expiry>> {
        let state = self.lock_initialized()?;
        Ok(state.entries.get(uri).copied())
    }

    /// Returns true if the resource is unknown or its expiry has passed
    pub fn is_download_required(&self, uri: &Url) -> StoreResult<bool> {
        self.is_download_required_at(uri, Utc::now())
    }

    /// Like [`is_download_required`](Self::is_download_required) with an explicit "now"
    pub fn is_download_required_at(&self, uri: &Url, now: DateTime<Utc>) -> StoreResult<bool> {
        let expiry = self.expiry_of(uri)?;
        tracing::debug!(
            "Checking expiry '{}' for URI '{}'",
            expiry.map(|e| e.to_string()).unwrap_or_else(|| "[none]".to_string()),
            uri
        );
        Ok(match expiry {
            None => true,
            Some(expiry) => expiry.is_due(now, self.never_expires),
        })
    }

    /// Returns every URI whose expiry lies before the moment of this call
    ///
    /// The iterator works on a snapshot: later registrations do not affect it.
    pub fn expired_uris(&self) -> StoreResult<ExpiredUris> {
        self.expired_uris_at(Utc::now())
    }

    /// Like [`expired_uris`](Self::expired_uris) with an explicit horizon
    pub fn expired_uris_at(&self, horizon: DateTime<Utc>) -> StoreResult<ExpiredUris> {
        let state = self.lock_initialized()?;
        Ok(ExpiredUris {
            entries: state.entries.clone().into_iter(),
            horizon,
            never_expires: self.never_expires,
        })
    }

    /// Number of known URIs
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.lock_initialized()?.entries.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Logs every record with its expiry status
    pub fn log_state(&self) -> StoreResult<()> {
        let state = self.lock_initialized()?;
        let now = Utc::now();
        tracing::info!(
            "Revisit state: folder '{}', never-expires sentinel {}, {} URIs",
            self.data_dir.display(),
            self.never_expires,
            state.entries.len()
        );
        for (uri, expiry) in &state.entries {
            let status = if expiry.is_due(now, self.never_expires) {
                "expired"
            } else {
                "not expired"
            };
            tracing::debug!("{}: {} ({})", status, uri, expiry);
        }
        Ok(())
    }
}

/// Iterator over expired URIs in ascending URI order
///
/// Produced by [`RevisitStore::expired_uris`]; finite and not restartable.
#[derive(Debug)]
pub struct ExpiredUris {
    entries: btree_map::IntoIter<Url, Expiry>,
    horizon: DateTime<Utc>,
    never_expires: DateTime<Utc>,
}

impl ExpiredUris {
    /// The instant expiries are compared against
    pub fn horizon(&self) -> DateTime<Utc> {
        self.horizon
    }
}

impl Iterator for ExpiredUris {
    type Item = Url;

    fn next(&mut self) -> Option<Url> {
        let (horizon, never_expires) = (self.horizon, self.never_expires);
        self.entries
            .by_ref()
            .find(|(_, expiry)| expiry.is_due(horizon, never_expires))
            .map(|(uri, _)| uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn initialized_store() -> (TempDir, RevisitStore) {
        let dir = TempDir::new().unwrap();
        let store = RevisitStore::new(dir.path().join("state"));
        store.initialize().unwrap();
        (dir, store)
    }

    #[test]
    fn test_operations_require_initialize() {
        let store = RevisitStore::new("/nonexistent/never-created");
        let uri = url("http://example.com/");

        assert!(!store.is_initialized());
        assert!(matches!(
            store.is_download_required(&uri),
            Err(StoreError::NotInitialized)
        ));
        assert!(matches!(
            store.register_uri_never_expires(&uri),
            Err(StoreError::NotInitialized)
        ));
        assert!(matches!(
            store.expired_uris(),
            Err(StoreError::NotInitialized)
        ));
        assert!(matches!(store.shutdown(), Err(StoreError::NotInitialized)));
    }

    #[test]
    fn test_double_initialize_fails() {
        let (_dir, store) = initialized_store();
        assert!(matches!(
            store.initialize(),
            Err(StoreError::AlreadyInitialized)
        ));
        assert!(store.is_initialized());
    }

    #[test]
    fn test_unknown_uri_requires_download() {
        let (_dir, store) = initialized_store();
        assert!(store
            .is_download_required(&url("http://example.com/unknown"))
            .unwrap());
    }

    #[test]
    fn test_unspecified_expiry_is_always_due() {
        let (_dir, store) = initialized_store();
        let uri = url("http://example.com/a");
        store.register_expiry_date(&uri, None).unwrap();
        assert_eq!(store.expiry_of(&uri).unwrap(), Some(Expiry::Unspecified));
        assert!(store.is_download_required(&uri).unwrap());
    }

    #[test]
    fn test_expiry_date_boundaries() {
        let (_dir, store) = initialized_store();
        let uri = url("http://example.com/a");
        let t = Utc::now() + Duration::hours(1);
        store.register_expiry_date(&uri, Some(t)).unwrap();

        assert!(!store.is_download_required_at(&uri, t - Duration::seconds(1)).unwrap());
        assert!(!store.is_download_required_at(&uri, t).unwrap());
        assert!(store.is_download_required_at(&uri, t + Duration::seconds(1)).unwrap());
        assert!(!store.is_download_required(&uri).unwrap());
    }

    #[test]
    fn test_never_expires_within_horizon() {
        let (_dir, store) = initialized_store();
        let uri = url("http://example.com/forever");
        store.register_uri_never_expires(&uri).unwrap();

        let in_500_years = Utc::now() + Duration::days(365 * 500);
        assert!(!store.is_download_required_at(&uri, in_500_years).unwrap());
        assert!(store.never_expires_at() > in_500_years);
    }

    #[test]
    fn test_register_replaces_earlier_record() {
        let (_dir, store) = initialized_store();
        let uri = url("http://example.com/a");
        store.register_uri_never_expires(&uri).unwrap();
        store
            .register_expiry_date(&uri, Some(Utc::now() - Duration::hours(1)))
            .unwrap();
        assert!(store.is_download_required(&uri).unwrap());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_expired_uris_in_key_order() {
        let (_dir, store) = initialized_store();
        let now = Utc::now();
        store
            .register_expiry_date(&url("http://example.com/c"), Some(now - Duration::hours(1)))
            .unwrap();
        store
            .register_expiry_date(&url("http://example.com/a"), Some(now - Duration::hours(2)))
            .unwrap();
        store
            .register_expiry_date(&url("http://example.com/b"), Some(now + Duration::hours(1)))
            .unwrap();
        store
            .register_uri_never_expires(&url("http://example.com/d"))
            .unwrap();
        store
            .register_expiry_date(&url("http://example.com/e"), None)
            .unwrap();

        let expired: Vec<Url> = store.expired_uris_at(now).unwrap().collect();
        assert_eq!(
            expired,
            vec![
                url("http://example.com/a"),
                url("http://example.com/c"),
                url("http://example.com/e"),
            ]
        );
    }

    #[test]
    fn test_expired_uris_ignore_later_mutations() {
        let (_dir, store) = initialized_store();
        let past = Utc::now() - Duration::hours(1);
        store
            .register_expiry_date(&url("http://example.com/a"), Some(past))
            .unwrap();

        let mut iter = store.expired_uris().unwrap();
        store
            .register_expiry_date(&url("http://example.com/b"), Some(past))
            .unwrap();
        store
            .register_uri_never_expires(&url("http://example.com/a"))
            .unwrap();

        assert_eq!(iter.next(), Some(url("http://example.com/a")));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_shutdown_then_initialize_roundtrip() {
        let (_dir, store) = initialized_store();
        let at = Utc::now() + Duration::days(3);
        store
            .register_expiry_date(&url("http://example.com/a"), Some(at))
            .unwrap();
        store
            .register_uri_never_expires(&url("http://example.com/b"))
            .unwrap();
        store
            .register_expiry_date(&url("http://example.com/c"), None)
            .unwrap();
        store.shutdown().unwrap();
        assert!(!store.is_initialized());
        assert!(store.state_file().exists());

        store.initialize().unwrap();
        assert_eq!(store.len().unwrap(), 3);
        assert_eq!(
            store.expiry_of(&url("http://example.com/a")).unwrap(),
            Some(Expiry::At(at))
        );
        assert_eq!(
            store.expiry_of(&url("http://example.com/b")).unwrap(),
            Some(Expiry::Never)
        );
        assert_eq!(
            store.expiry_of(&url("http://example.com/c")).unwrap(),
            Some(Expiry::Unspecified)
        );
    }

    #[test]
    fn test_corrupt_state_fails_initialize() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(STATE_FILE), "garbage\n").unwrap();
        let store = RevisitStore::new(dir.path());
        assert!(matches!(
            store.initialize(),
            Err(StoreError::Format { .. })
        ));
        assert!(!store.is_initialized());
    }

    #[test]
    fn test_log_state() {
        let (_dir, store) = initialized_store();
        store
            .register_uri_never_expires(&url("http://example.com/a"))
            .unwrap();
        assert!(store.log_state().is_ok());
    }
}

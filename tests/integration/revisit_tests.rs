//! Integration tests for the revisit store
//!
//! These tests exercise the store through its public API only, including
//! persistence across store instances and concurrent registration.

use chrono::{Duration, Utc};
use linkspider::store::{persist, Expiry, RevisitStore, StoreError, STATE_FILE};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;
use url::Url;

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

fn open_store(dir: &TempDir) -> RevisitStore {
    let store = RevisitStore::new(dir.path().join("revisit"));
    store.initialize().unwrap();
    store
}

#[test]
fn test_never_registered_uris_require_download() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    store
        .register_uri_never_expires(&url("http://example.com/known"))
        .unwrap();

    for uri in [
        "http://example.com/",
        "http://example.com/known/child",
        "https://example.com/known",
        "urn:isbn:0451450523",
    ] {
        assert!(store.is_download_required(&url(uri)).unwrap(), "{}", uri);
    }
}

#[test]
fn test_never_expires_holds_for_500_years() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let uri = url("http://example.com/static");
    store.register_uri_never_expires(&uri).unwrap();

    let now = Utc::now();
    for years in [0, 1, 50, 100, 500] {
        let at = now + Duration::days(365 * years);
        assert!(!store.is_download_required_at(&uri, at).unwrap(), "{} years", years);
    }
}

#[test]
fn test_registered_expiry_date() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let uri = url("http://example.com/doc");
    let t = Utc::now() + Duration::days(2);
    store.register_expiry_date(&uri, Some(t)).unwrap();

    assert!(!store.is_download_required_at(&uri, t - Duration::days(1)).unwrap());
    assert!(store.is_download_required_at(&uri, t + Duration::milliseconds(1)).unwrap());
}

#[test]
fn test_expired_iterator_order_and_horizon() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let now = Utc::now();

    let entries = [
        ("http://example.org/z", Some(now - Duration::minutes(5))),
        ("http://example.com/b", Some(now + Duration::minutes(5))),
        ("http://example.com/a", Some(now - Duration::days(3))),
        ("http://example.net/m", None),
    ];
    for (uri, expiry) in entries {
        store.register_expiry_date(&url(uri), expiry).unwrap();
    }

    let iter = store.expired_uris_at(now).unwrap();
    assert_eq!(iter.horizon(), now);

    // later registrations do not leak into an existing iterator
    store
        .register_expiry_date(&url("http://example.com/c"), Some(now - Duration::days(1)))
        .unwrap();

    let expired: Vec<String> = iter.map(|u| u.to_string()).collect();
    assert_eq!(
        expired,
        vec![
            "http://example.com/a",
            "http://example.net/m",
            "http://example.org/z",
        ]
    );
}

#[test]
fn test_state_survives_restart() {
    let dir = TempDir::new().unwrap();
    let t = Utc::now() + Duration::hours(6);
    {
        let store = open_store(&dir);
        store
            .register_expiry_date(&url("http://example.com/a"), Some(t))
            .unwrap();
        store
            .register_uri_never_expires(&url("http://example.com/b"))
            .unwrap();
        store
            .register_expiry_date(&url("http://example.com/c"), None)
            .unwrap();
        store.shutdown().unwrap();
    }

    let state_file = dir.path().join("revisit").join(STATE_FILE);
    let content = std::fs::read_to_string(&state_file).unwrap();
    assert!(content.starts_with(persist::FORMAT_HEADER));
    assert!(content.contains("http://example.com/b\tnever\n"));
    assert!(content.contains("http://example.com/c\tunspecified\n"));

    let store = open_store(&dir);
    assert_eq!(store.len().unwrap(), 3);
    assert_eq!(
        store.expiry_of(&url("http://example.com/a")).unwrap(),
        Some(Expiry::At(t))
    );
    assert!(!store
        .is_download_required(&url("http://example.com/b"))
        .unwrap());
    assert!(store
        .is_download_required(&url("http://example.com/c"))
        .unwrap());
}

#[test]
fn test_unsaved_registrations_are_lost() {
    let dir = TempDir::new().unwrap();
    {
        let store = open_store(&dir);
        store.shutdown().unwrap();
        store.initialize().unwrap();
        store
            .register_uri_never_expires(&url("http://example.com/a"))
            .unwrap();
        // dropped without shutdown
    }

    let store = open_store(&dir);
    assert!(store.is_empty().unwrap());
}

#[test]
fn test_lifecycle_preconditions() {
    let dir = TempDir::new().unwrap();
    let store = RevisitStore::new(dir.path());
    assert!(matches!(
        store.len(),
        Err(StoreError::NotInitialized)
    ));

    store.initialize().unwrap();
    assert!(matches!(
        store.initialize(),
        Err(StoreError::AlreadyInitialized)
    ));

    store.shutdown().unwrap();
    assert!(matches!(
        store.register_uri_never_expires(&url("http://example.com/")),
        Err(StoreError::NotInitialized)
    ));
}

#[test]
fn test_data_dir_must_be_a_folder() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("not-a-folder");
    std::fs::write(&file, "").unwrap();

    let store = RevisitStore::new(&file);
    assert!(matches!(
        store.initialize(),
        Err(StoreError::InvalidDataDir(_))
    ));
}

#[test]
fn test_concurrent_registration() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(open_store(&dir));
    let past = Utc::now() - Duration::minutes(1);

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..50 {
                    let uri = url(&format!("http://example.com/{}/{}", worker, i));
                    if i % 2 == 0 {
                        store.register_expiry_date(&uri, Some(past)).unwrap();
                    } else {
                        store.register_uri_never_expires(&uri).unwrap();
                    }
                    store.is_download_required(&uri).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len().unwrap(), 400);
    assert_eq!(store.expired_uris().unwrap().count(), 200);

    store.shutdown().unwrap();
    store.initialize().unwrap();
    assert_eq!(store.len().unwrap(), 400);
}

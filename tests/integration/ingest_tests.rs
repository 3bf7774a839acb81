//! Integration tests for document ingestion
//!
//! These tests drive whole responses through the pipeline into the index
//! backends, using wiremock for the Solr core and in-memory SQLite otherwise.

use linkspider::aggregate::{AggregateOutcome, DiscardReason, IndexRecord, Vocabulary};
use linkspider::content::{build_dispatcher, DispatchOutcome};
use linkspider::crawler::{FetchedResponse, IngestPipeline};
use linkspider::headers::{HeaderReifier, HeaderTable, HEADER_INFO, RESPONSE_CODE};
use linkspider::index::{IndexSink, MemoryIndex, SolrIndex, SqliteIndex};
use linkspider::statement::Node;
use linkspider::store::{Expiry, RevisitStore};
use linkspider::{DocumentAggregator, Statement};
use std::sync::Arc;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROVENANCE: &str = "http://needs.example.com/fetched/42";

fn pipeline(sink: Arc<dyn IndexSink>) -> IngestPipeline {
    IngestPipeline::new(
        HeaderReifier::new(HeaderTable::standard()),
        build_dispatcher(&Default::default()),
        Arc::new(Vocabulary::default()),
        sink,
        chrono::Duration::hours(24),
    )
}

fn response(body: &str, headers: &[(&str, &str)]) -> FetchedResponse {
    FetchedResponse {
        uri: Url::parse(PROVENANCE).unwrap(),
        status: 200,
        headers: headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        content_type: Some("application/n-triples".to_string()),
        body: body.as_bytes().to_vec(),
    }
}

fn full_need() -> String {
    let s = "<http://needs.example.com/need/7>";
    [
        format!("{} <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://purl.org/webofneeds/model#Need> .", s),
        format!("{} <http://purl.org/dc/elements/1.1/title> \"Looking for a flat #vienna\"@en .", s),
        format!("{} <http://purl.org/webofneeds/model#textDescription> \"Two rooms, quiet street. #quiet #flat\" .", s),
        format!("{} <http://purl.org/webofneeds/model#hasBasicNeedType> <http://purl.org/webofneeds/model#Demand> .", s),
        format!("{} <http://purl.org/webofneeds/model#hasTag> \"housing\" .", s),
        format!("{} <http://purl.org/webofneeds/model#hasLowerPriceLimit> \"400\"^^<http://www.w3.org/2001/XMLSchema#double> .", s),
        format!("{} <http://purl.org/webofneeds/model#hasUpperPriceLimit> \"800.5\" .", s),
        format!("{} <http://www.w3.org/2003/01/geo/wgs84_pos#latitude> \"48.2082\" .", s),
        format!("{} <http://www.w3.org/2003/01/geo/wgs84_pos#longitude> \"16.3738\" .", s),
        format!("{} <http://purl.org/webofneeds/model#hasConnections> <http://needs.example.com/need/7/connections> .", s),
        "# comment lines are skipped".to_string(),
        String::new(),
    ]
    .join("\n")
}

#[test]
fn test_header_scenario() {
    let reifier = HeaderReifier::default();
    let headers = vec![
        ("Content-Type".to_string(), "text/turtle".to_string()),
        ("X-Custom".to_string(), "ignored".to_string()),
    ];
    let statements = reifier.reify(PROVENANCE, 200, &headers);

    let link: Vec<&Statement> = statements
        .iter()
        .filter(|s| s.predicate == Node::iri(HEADER_INFO))
        .collect();
    assert_eq!(link.len(), 1);
    assert_eq!(link[0].subject, Node::iri(PROVENANCE));

    let record = &link[0].object;
    let on_record: Vec<&Statement> = statements.iter().filter(|s| &s.subject == record).collect();
    assert_eq!(on_record.len(), 2);
    assert_eq!(on_record[0].predicate, Node::iri(RESPONSE_CODE));
    assert_eq!(on_record[1].object, Node::literal("text/turtle"));
    assert!(!statements.iter().any(|s| s.object.lexical() == "ignored"));
}

#[test]
fn test_hashtag_scenario_with_fallback_url() {
    let sink = MemoryIndex::new();
    let vocabulary = Arc::new(Vocabulary::default());
    let s = Node::iri("http://needs.example.com/need/1");

    let mut aggregator = DocumentAggregator::new(Url::parse(PROVENANCE).unwrap(), Arc::clone(&vocabulary));
    aggregator.start().unwrap();
    aggregator
        .process(&Statement::new(
            s.clone(),
            Node::iri(&vocabulary.type_predicate),
            Node::iri(&vocabulary.need_class),
        ))
        .unwrap();
    aggregator
        .process(&Statement::new(
            s,
            Node::iri(&vocabulary.title),
            Node::literal("Room needed #urgent #student"),
        ))
        .unwrap();

    let outcome = aggregator.end(&sink).unwrap();
    assert_eq!(
        outcome,
        AggregateOutcome::Flushed {
            url: PROVENANCE.to_string()
        }
    );
    let record = &sink.records()[0];
    assert_eq!(record.title.as_deref(), Some("Room needed #urgent #student"));
    assert_eq!(record.tag, vec!["#urgent", "#student"]);
}

#[test]
fn test_unclassified_document_is_not_written() {
    let sink = Arc::new(MemoryIndex::new());
    let body = "<http://needs.example.com/need/1> <http://purl.org/dc/elements/1.1/title> \"Room needed #urgent #student\" .\n";
    let report = pipeline(sink.clone()).ingest(&response(body, &[])).unwrap();

    assert_eq!(
        report.outcome,
        AggregateOutcome::Discarded(DiscardReason::NotClassified)
    );
    assert_eq!(sink.write_attempts(), 0);
}

#[test]
fn test_full_document_into_sqlite() {
    let index = Arc::new(SqliteIndex::new_in_memory().unwrap());
    let report = pipeline(index.clone())
        .ingest(&response(
            &full_need(),
            &[
                ("Content-Type", "application/n-triples"),
                ("Server", "needs/1.0"),
                ("Expires", "Thu, 01 Jan 2099 00:00:00 GMT"),
            ],
        ))
        .unwrap();

    assert_eq!(report.dispatch, Some(DispatchOutcome::Parsed(10)));
    assert_eq!(report.header_statements, 5);
    assert_eq!(
        report.outcome,
        AggregateOutcome::Flushed {
            url: "http://needs.example.com/need/7".to_string()
        }
    );
    assert!(matches!(report.expiry, Expiry::At(at) if at.format("%Y").to_string() == "2099"));

    let stored = index.get("http://needs.example.com/need/7").unwrap().unwrap();
    assert_eq!(stored.title.as_deref(), Some("Looking for a flat #vienna"));
    assert_eq!(
        stored.description.as_deref(),
        Some("Two rooms, quiet street. #quiet #flat")
    );
    assert_eq!(
        stored.category.as_deref(),
        Some("http://purl.org/webofneeds/model#Demand")
    );
    assert_eq!(stored.price_lower, Some(400.0));
    assert_eq!(stored.price_upper, Some(800.5));
    assert_eq!(stored.location.as_deref(), Some("48.2082,16.3738"));
    assert_eq!(stored.tag, vec!["#vienna", "#quiet", "#flat", "housing"]);
    assert_eq!(stored.ntriple.lines().count(), 15);
    assert!(stored
        .ntriple
        .contains("\"Looking for a flat #vienna\"@en ."));
}

#[test]
fn test_zero_latitude_has_no_location() {
    let sink = Arc::new(MemoryIndex::new());
    let s = "<http://needs.example.com/need/9>";
    let body = format!(
        "{s} <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://purl.org/webofneeds/model#Need> .\n\
         {s} <http://www.w3.org/2003/01/geo/wgs84_pos#latitude> \"0\" .\n\
         {s} <http://www.w3.org/2003/01/geo/wgs84_pos#longitude> \"52.5\" .\n",
        s = s
    );
    pipeline(sink.clone()).ingest(&response(&body, &[])).unwrap();
    assert_eq!(sink.records()[0].location, None);
}

#[test]
fn test_broken_body_aborts_document() {
    let sink = Arc::new(MemoryIndex::new());
    let body = format!("{}<http://needs.example.com/need/7> \"unterminated\n", full_need());
    let report = pipeline(sink.clone()).ingest(&response(&body, &[])).unwrap();

    assert_eq!(report.dispatch, Some(DispatchOutcome::Failed));
    assert_eq!(
        report.outcome,
        AggregateOutcome::Discarded(DiscardReason::Aborted)
    );
    assert!(sink.records().is_empty());
}

#[test]
fn test_index_failure_is_reported_not_raised() {
    let sink = Arc::new(MemoryIndex::failing());
    let report = pipeline(sink.clone())
        .ingest(&response(&full_need(), &[]))
        .unwrap();
    assert_eq!(
        report.outcome,
        AggregateOutcome::WriteFailed {
            url: "http://needs.example.com/need/7".to_string()
        }
    );
    assert_eq!(sink.write_attempts(), 1);
}

#[test]
fn test_ingest_then_register_expiry() {
    let dir = TempDir::new().unwrap();
    let store = RevisitStore::new(dir.path());
    store.initialize().unwrap();

    let report = pipeline(Arc::new(MemoryIndex::new()))
        .ingest(&response(&full_need(), &[("Cache-Control", "no-cache")]))
        .unwrap();
    let uri = Url::parse(PROVENANCE).unwrap();
    store.register(&uri, report.expiry).unwrap();

    // no-cache: due again right away
    assert!(store
        .is_download_required_at(&uri, chrono::Utc::now() + chrono::Duration::seconds(1))
        .unwrap());
    store.shutdown().unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_solr_index_writes_and_commits_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/solr/needs/update"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"responseHeader\":{\"status\":0}}"))
        .mount(&server)
        .await;

    let core = Url::parse(&format!("{}/solr/needs", server.uri())).unwrap();
    tokio::task::spawn_blocking(move || {
        let index = SolrIndex::new(&core).unwrap();
        let mut record = IndexRecord::new("http://needs.example.com/need/7", "<a> <b> <c> .\n");
        record.tag = vec!["#flat".to_string()];
        index.write(&record).unwrap();
        index.commit().unwrap();
        index.commit().unwrap();
    })
    .await
    .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    let documents: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        documents,
        serde_json::json!([{
            "url": "http://needs.example.com/need/7",
            "ntriple": "<a> <b> <c> .\n",
            "tag": ["#flat"],
        }])
    );

    let commit: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert_eq!(commit, serde_json::json!({ "commit": {} }));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_solr_rejection_surfaces_as_write_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad document"))
        .mount(&server)
        .await;

    let core = Url::parse(&format!("{}/solr/needs", server.uri())).unwrap();
    let outcome = tokio::task::spawn_blocking(move || {
        let index: Arc<dyn IndexSink> = Arc::new(SolrIndex::new(&core).unwrap());
        pipeline(index).ingest(&response(&full_need(), &[])).unwrap().outcome
    })
    .await
    .unwrap();

    assert_eq!(
        outcome,
        AggregateOutcome::WriteFailed {
            url: "http://needs.example.com/need/7".to_string()
        }
    );
}

#[test]
fn test_out_of_range_max_age_registers_never_expiring() {
    let dir = TempDir::new().unwrap();
    let store = RevisitStore::new(dir.path());
    store.initialize().unwrap();

    let report = pipeline(Arc::new(MemoryIndex::new()))
        .ingest(&response(&full_need(), &[("Cache-Control", "public, max-age=99999999999999")]))
        .unwrap();
    assert_eq!(report.expiry, Expiry::Never);

    let uri = Url::parse(PROVENANCE).unwrap();
    store.register(&uri, report.expiry).unwrap();
    assert!(!store
        .is_download_required_at(&uri, chrono::Utc::now() + chrono::Duration::days(365 * 500))
        .unwrap());
    store.shutdown().unwrap();
}

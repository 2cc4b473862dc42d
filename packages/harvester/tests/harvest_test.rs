//! End-to-end harvest from a mocked OAI-PMH endpoint into an in-memory catalog.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kielipankki_harvester::config::{parse_timestamp, DEFAULT_CATALOG_ID};
use kielipankki_harvester::harvester::{run_harvest, HarvestOptions};
use kielipankki_harvester::mapper::map_record;
use kielipankki_harvester::oai::{OaiClient, RecordSource};
use kielipankki_harvester::reconcile::{InMemoryCatalog, TargetCatalog};
use kielipankki_harvester::source::SourceRecord;
use kielipankki_harvester::validation::ValidationRule;

fn load_fixture(dir: &str, name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(dir)
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

/// Serve the two fixture pages at `/oai`.
async fn mock_oai() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oai"))
        .and(query_param("resumptionToken", "cmdi-page-2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(load_fixture("oai", "list_records_page2.xml")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/oai"))
        .and(query_param("metadataPrefix", "cmdi"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(load_fixture("oai", "list_records_page1.xml")),
        )
        .mount(&server)
        .await;
    server
}

fn stale_catalog() -> InMemoryCatalog {
    let stale = SourceRecord::parse(&load_fixture("cmdi", "corpus_restricted.xml"))
        .map(|mut record| {
            record.self_link = Some("urn:nbn:fi:lb-2010010101".to_string());
            record
        })
        .unwrap();
    let mut catalog = InMemoryCatalog::new();
    catalog
        .upsert(&map_record(&stale, DEFAULT_CATALOG_ID).unwrap().record)
        .unwrap();
    catalog
}

#[tokio::test(flavor = "multi_thread")]
async fn test_harvest_syncs_catalog_with_source() {
    let server = mock_oai().await;
    let oai_url = format!("{}/oai", server.uri());

    let (report, catalog) = tokio::task::spawn_blocking(move || {
        let source = OaiClient::new(oai_url).unwrap();
        let mut catalog = stale_catalog();
        let options = HarvestOptions {
            catalog_id: DEFAULT_CATALOG_ID.to_string(),
            from: None,
            dry_run: false,
        };
        let report = run_harvest(&source, &mut catalog, &options).unwrap();
        (report, catalog)
    })
    .await
    .unwrap();

    assert_eq!(report.fetched, 3);
    assert_eq!(report.skipped_non_corpus, 1);
    assert_eq!(report.accepted, vec!["urn:nbn:fi:lb-2016101210".to_string()]);
    assert_eq!(report.created, 1);

    assert_eq!(report.rejections.rejected.len(), 1);
    assert_eq!(report.rejections.rejected[0].pid, "urn:nbn:fi:lb-2022001");
    assert_eq!(
        report.rejections.rejected[0].rules,
        vec![ValidationRule::MissingCreator]
    );

    assert_eq!(report.deleted, vec!["urn:nbn:fi:lb-2010010101".to_string()]);
    assert!(report.is_complete());
    assert_eq!(
        catalog.record_pids().unwrap(),
        BTreeSet::from(["urn:nbn:fi:lb-2016101210".to_string()])
    );

    let pushed = catalog.get("urn:nbn:fi:lb-2016101210").unwrap();
    assert_eq!(pushed.modified.as_deref(), Some("2024-04-30T09:15:00Z"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_corpus_pids_include_rejected_records() {
    let server = mock_oai().await;
    let oai_url = format!("{}/oai", server.uri());

    let pids = tokio::task::spawn_blocking(move || OaiClient::new(oai_url).unwrap().corpus_pids())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        pids,
        BTreeSet::from([
            "urn:nbn:fi:lb-2016101210".to_string(),
            "urn:nbn:fi:lb-2022001".to_string()
        ])
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_incremental_harvest_sends_from() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oai"))
        .and(query_param("from", "2024-05-01T00:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/">
                 <error code="noRecordsMatch">No records match</error>
               </OAI-PMH>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/oai"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/"><ListRecords/></OAI-PMH>"#,
        ))
        .mount(&server)
        .await;
    let oai_url = format!("{}/oai", server.uri());

    let report = tokio::task::spawn_blocking(move || {
        let source = OaiClient::new(oai_url).unwrap();
        let mut catalog = InMemoryCatalog::new();
        let options = HarvestOptions {
            catalog_id: DEFAULT_CATALOG_ID.to_string(),
            from: Some(parse_timestamp("2024-05-01").unwrap()),
            dry_run: false,
        };
        run_harvest(&source, &mut catalog, &options).unwrap()
    })
    .await
    .unwrap();

    assert_eq!(report.fetched, 0);
    assert!(report.is_complete());
    assert!(report.sync_plan.unwrap().is_noop());
}

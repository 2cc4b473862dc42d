//! OAI-PMH client for the Kielipankki metadata repository.
//!
//! Records are fetched with `ListRecords` (metadata prefix `cmdi`, set
//! `FIN-CLARIN`) and continuation pages are followed through resumption
//! tokens until the server returns an empty one.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use roxmltree::Document;

use crate::config::{list_records_url, resume_records_url, validate_pid};
use crate::error::{HarvesterError, Result};
use crate::http::{bytes_to_string, create_client, download_bytes};
use crate::source::SourceRecord;
use crate::xml::{find_child, get_tag_name, has_tag, non_empty_text};

/// OAI-PMH error code meaning "the result set is empty".
const NO_RECORDS_MATCH: &str = "noRecordsMatch";

/// Where source records come from.
pub trait RecordSource {
    /// Fetch all records changed since `from`, or every record when `None`.
    fn fetch_records(&self, from: Option<&DateTime<Utc>>) -> Result<Vec<SourceRecord>>;

    /// PIDs of every corpus currently at the source.
    ///
    /// Records without a valid PID have no identity and are left out.
    fn corpus_pids(&self) -> Result<BTreeSet<String>> {
        Ok(self
            .fetch_records(None)?
            .iter()
            .filter(|record| record.is_corpus())
            .filter_map(|record| record.self_link.as_deref())
            .filter_map(|link| validate_pid(link).ok())
            .collect())
    }
}

/// One page of a `ListRecords` response.
#[derive(Debug, Default)]
pub struct ListRecordsPage {
    pub records: Vec<SourceRecord>,
    /// Token for the next page; `None` on the last page.
    pub resumption_token: Option<String>,
}

/// Parse a `ListRecords` response body.
///
/// Records whose header has `status="deleted"` are skipped. A
/// `noRecordsMatch` error is an empty page, any other OAI-PMH error is
/// returned as [`HarvesterError::OaiPmh`].
pub fn parse_list_records(xml: &str) -> Result<ListRecordsPage> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();

    if let Some(error) = find_child(root, "error") {
        let code = error.attribute("code").unwrap_or("unknown").to_string();
        if code == NO_RECORDS_MATCH {
            return Ok(ListRecordsPage::default());
        }
        return Err(HarvesterError::OaiPmh {
            code,
            message: non_empty_text(error).unwrap_or_default(),
        });
    }

    let list = find_child(root, "ListRecords").ok_or_else(|| HarvesterError::MissingElement {
        element: "ListRecords".to_string(),
        context: get_tag_name(root).to_string(),
    })?;

    let mut records = Vec::new();
    for record in list.children().filter(|n| has_tag(*n, "record")) {
        let deleted = find_child(record, "header")
            .and_then(|header| header.attribute("status"))
            == Some("deleted");
        if deleted {
            tracing::debug!("skipping deleted record");
            continue;
        }
        records.push(SourceRecord::from_node(record));
    }

    let resumption_token = find_child(list, "resumptionToken").and_then(non_empty_text);

    Ok(ListRecordsPage {
        records,
        resumption_token,
    })
}

/// Client for an OAI-PMH endpoint.
pub struct OaiClient {
    client: Client,
    base_url: String,
}

impl OaiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            base_url: base_url.into(),
        })
    }

    fn fetch_page(&self, url: &str) -> Result<ListRecordsPage> {
        tracing::debug!(url, "fetching ListRecords page");
        let bytes = download_bytes(&self.client, url)?;
        parse_list_records(&bytes_to_string(&bytes, "OAI-PMH ListRecords"))
    }
}

impl RecordSource for OaiClient {
    fn fetch_records(&self, from: Option<&DateTime<Utc>>) -> Result<Vec<SourceRecord>> {
        let mut url = list_records_url(&self.base_url, from)?;
        let mut records = Vec::new();
        let mut pages = 0u32;

        loop {
            let page = self.fetch_page(url.as_str())?;
            pages += 1;
            records.extend(page.records);

            match page.resumption_token {
                Some(token) => url = resume_records_url(&self.base_url, &token)?,
                None => break,
            }
        }

        tracing::info!(records = records.len(), pages, "fetched records from OAI-PMH");
        Ok(records)
    }
}

//! Metax V3 REST client.
//!
//! Datasets are addressed by their Metax id, which the harvester never
//! stores: every operation on a PID starts with a lookup in the configured
//! data catalog.

use std::collections::BTreeSet;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;

use crate::config::{
    dataset_listing_url, dataset_lookup_url, dataset_url, datasets_url, HarvesterConfig,
};
use crate::error::{HarvesterError, Result};
use crate::http::{bytes_to_string, create_client, send_with_retry};
use crate::reconcile::{PushOutcome, TargetCatalog};
use crate::target::TargetRecord;

/// One page of a dataset listing.
#[derive(Debug, Deserialize)]
struct DatasetPage {
    count: u64,
    #[serde(default)]
    next: Option<String>,
    #[serde(default)]
    results: Vec<DatasetSummary>,
}

#[derive(Debug, Deserialize)]
struct DatasetSummary {
    id: String,
    #[serde(default)]
    persistent_identifier: Option<String>,
}

/// Client for one Metax data catalog.
pub struct MetaxClient {
    client: Client,
    base_url: String,
    catalog_id: String,
    token: String,
}

impl MetaxClient {
    pub fn new(
        base_url: impl Into<String>,
        catalog_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            catalog_id: catalog_id.into(),
            token: token.into(),
        })
    }

    pub fn from_config(config: &HarvesterConfig) -> Result<Self> {
        Self::new(
            &config.metax_base_url,
            &config.metax_catalog_id,
            &config.metax_api_token,
        )
    }

    pub fn catalog_id(&self) -> &str {
        &self.catalog_id
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(AUTHORIZATION, format!("Token {}", self.token))
    }

    /// Metax id of the dataset with the given PID, if it exists.
    pub fn record_id(&self, pid: &str) -> Result<Option<String>> {
        let url = dataset_lookup_url(&self.base_url, &self.catalog_id, pid)?;
        let response = send_with_retry(|| self.authorized(self.client.get(url.clone())))?;
        let page: DatasetPage = read_json("GET", check_status("GET", response)?)?;

        match page.count {
            0 => Ok(None),
            1 => page
                .results
                .into_iter()
                .next()
                .map(|dataset| Some(dataset.id))
                .ok_or_else(|| {
                    HarvesterError::UnexpectedResponse(format!(
                        "lookup of {pid} reported one match but returned none"
                    ))
                }),
            count => Err(HarvesterError::UnexpectedResponse(format!(
                "{count} datasets share the PID {pid} in catalog {}",
                self.catalog_id
            ))),
        }
    }

    /// Create a dataset and return its Metax id.
    ///
    /// Not retried: a create that timed out may still have succeeded.
    pub fn create(&self, record: &TargetRecord) -> Result<String> {
        let url = datasets_url(&self.base_url)?;
        let response = self.authorized(self.client.post(url)).json(record).send()?;
        let created: DatasetSummary = read_json("POST", check_status("POST", response)?)?;
        tracing::info!(pid = %record.persistent_identifier, metax_id = %created.id, "created dataset");
        Ok(created.id)
    }

    /// Replace the dataset with the given Metax id.
    pub fn update(&self, metax_id: &str, record: &TargetRecord) -> Result<String> {
        let url = dataset_url(&self.base_url, metax_id)?;
        let response =
            send_with_retry(|| self.authorized(self.client.put(url.clone())).json(record))?;
        let updated: DatasetSummary = read_json("PUT", check_status("PUT", response)?)?;
        tracing::info!(pid = %record.persistent_identifier, metax_id = %updated.id, "updated dataset");
        Ok(updated.id)
    }

    /// Delete the dataset with the given Metax id.
    pub fn delete_dataset(&self, metax_id: &str) -> Result<()> {
        let url = dataset_url(&self.base_url, metax_id)?;
        let response = send_with_retry(|| self.authorized(self.client.delete(url.clone())))?;
        check_status("DELETE", response)?;
        tracing::info!(metax_id, "deleted dataset");
        Ok(())
    }

    /// PIDs of every dataset in the catalog, following pagination.
    pub fn list_pids(&self) -> Result<BTreeSet<String>> {
        let mut next = Some(dataset_listing_url(&self.base_url, &self.catalog_id)?.to_string());
        let mut pids = BTreeSet::new();

        while let Some(url) = next {
            let response = send_with_retry(|| self.authorized(self.client.get(url.as_str())))?;
            let page: DatasetPage = read_json("GET", check_status("GET", response)?)?;
            for dataset in page.results {
                match dataset.persistent_identifier {
                    Some(pid) => {
                        pids.insert(pid);
                    }
                    None => tracing::warn!(metax_id = %dataset.id, "dataset without a PID in catalog"),
                }
            }
            next = page.next;
        }

        tracing::debug!(count = pids.len(), catalog = %self.catalog_id, "listed catalog PIDs");
        Ok(pids)
    }
}

impl TargetCatalog for MetaxClient {
    fn record_pids(&self) -> Result<BTreeSet<String>> {
        self.list_pids()
    }

    fn upsert(&mut self, record: &TargetRecord) -> Result<PushOutcome> {
        match self.record_id(&record.persistent_identifier)? {
            Some(metax_id) => {
                self.update(&metax_id, record)?;
                Ok(PushOutcome::Updated)
            }
            None => {
                self.create(record)?;
                Ok(PushOutcome::Created)
            }
        }
    }

    fn delete(&mut self, pid: &str) -> Result<bool> {
        match self.record_id(pid)? {
            Some(metax_id) => {
                self.delete_dataset(&metax_id)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Turn a non-success status into [`HarvesterError::MetaxApi`] carrying the
/// response body.
fn check_status(method: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.bytes().map(|b| b.to_vec()).unwrap_or_default();
    let message = bytes_to_string(&body, "Metax error response");
    tracing::error!(method, url = %url, status = status.as_u16(), "Metax request failed");
    Err(HarvesterError::MetaxApi {
        method: method.to_string(),
        url,
        status: status.as_u16(),
        message,
    })
}

fn read_json<T: serde::de::DeserializeOwned>(method: &str, response: Response) -> Result<T> {
    let body = response.bytes()?;
    serde_json::from_slice(&body).map_err(|e| {
        HarvesterError::UnexpectedResponse(format!("{method} response is not the expected JSON: {e}"))
    })
}

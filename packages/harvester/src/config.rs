//! Configuration constants, input validation and the run configuration file.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use url::Url;

use crate::error::{HarvesterError, Result};

/// Default OAI-PMH endpoint of the Kielipankki metadata repository.
pub const DEFAULT_OAI_PMH_URL: &str = "https://kielipankki.fi/md_api/que";

/// OAI-PMH metadata prefix for CMDI records.
pub const OAI_METADATA_PREFIX: &str = "cmdi";

/// OAI-PMH set containing the FIN-CLARIN resources.
pub const OAI_SET: &str = "FIN-CLARIN";

/// HTTP timeout in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Page size used when listing datasets from Metax.
pub const METAX_PAGE_SIZE: u32 = 100;

/// Environment variable overriding the Metax API token from the config file.
pub const METAX_TOKEN_ENV: &str = "METAX_API_TOKEN";

/// Namespace prefix every Kielipankki PID starts with.
pub const PID_PREFIX: &str = "urn:nbn:fi:lb-";

/// Timestamp format used for Metax dates and OAI-PMH `from` arguments.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Lexvo URI base for ISO 639-3 languages.
pub const LEXVO_ISO639_3_BASE: &str = "http://lexvo.org/id/iso639-3/";

/// Lexvo URI base for ISO 639-5 language families.
pub const LEXVO_ISO639_5_BASE: &str = "http://lexvo.org/id/iso639-5/";

/// Field of science every harvested corpus is filed under (linguistics).
pub const FIELD_OF_SCIENCE_URI: &str = "http://www.yso.fi/onto/okm-tieteenala/ta6121";

/// Availability value that makes a resource openly accessible.
pub const UNRESTRICTED_AVAILABILITY: &str = "available-unrestrictedUse";

/// Access type URI for open resources.
pub const ACCESS_TYPE_OPEN_URI: &str = "http://uri.suomi.fi/codelist/fairdata/access_type/code/open";

/// Access type URI for restricted resources.
pub const ACCESS_TYPE_RESTRICTED_URI: &str =
    "http://uri.suomi.fi/codelist/fairdata/access_type/code/restricted";

/// Restriction grounds for resources limited to research use.
pub const RESTRICTION_GROUNDS_RESEARCH_URI: &str =
    "http://uri.suomi.fi/codelist/fairdata/restriction_grounds/code/research";

/// Restriction grounds when the reason cannot be derived from the metadata.
pub const RESTRICTION_GROUNDS_OTHER_URI: &str =
    "http://uri.suomi.fi/codelist/fairdata/restriction_grounds/code/other";

/// Label of the placeholder publisher used when a record has several.
pub const MULTIPLE_PUBLISHERS_LABEL: &str = "Multiple publishers, check distribution rights \
     holders in original metadata by following its persistent identifier";

/// Publication state of every pushed dataset.
pub const DATASET_STATE: &str = "published";

/// Metax data catalog of Kielipankki datasets.
pub const DEFAULT_CATALOG_ID: &str = "urn:nbn:fi:att:data-catalog-kielipankki";

/// PID pattern: namespace prefix followed by digits.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^urn:nbn:fi:lb-\d+$").expect("valid regex"));

/// Resolver prefixes a self-link may carry in front of the bare URN.
const RESOLVER_PREFIXES: [&str; 3] = ["http://urn.fi/", "https://urn.fi/", "urn.fi/"];

/// Validate a PID and return it in canonical form.
///
/// Surrounding whitespace and an `urn.fi` resolver prefix are removed before
/// the namespace check.
///
/// # Examples
/// ```
/// use kielipankki_harvester::config::validate_pid;
///
/// assert_eq!(validate_pid("urn:nbn:fi:lb-2016101210").unwrap(), "urn:nbn:fi:lb-2016101210");
/// assert_eq!(validate_pid(" http://urn.fi/urn:nbn:fi:lb-2016101210 ").unwrap(), "urn:nbn:fi:lb-2016101210");
/// assert!(validate_pid("urn:nbn:fi:att:1234").is_err());
/// ```
pub fn validate_pid(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let bare = RESOLVER_PREFIXES
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed);

    if PID_PATTERN.is_match(bare) {
        Ok(bare.to_string())
    } else {
        Err(HarvesterError::InvalidPid(raw.to_string()))
    }
}

/// Check whether a string is a canonical PID.
pub fn is_valid_pid(pid: &str) -> bool {
    PID_PATTERN.is_match(pid)
}

/// Parse a source timestamp into UTC.
///
/// Accepts `YYYY-MM-DDTHH:MM:SSZ`, RFC 3339 with an offset, and plain dates
/// (interpreted as midnight UTC).
///
/// # Examples
/// ```
/// use kielipankki_harvester::config::{format_timestamp, parse_timestamp};
///
/// let ts = parse_timestamp("2017-02-15").unwrap();
/// assert_eq!(format_timestamp(&ts), "2017-02-15T00:00:00Z");
/// assert!(parse_timestamp("15.2.2017").is_err());
/// ```
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(naive) = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT) {
        return Ok(naive.and_utc());
    }
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(value) {
        return Ok(with_offset.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| HarvesterError::InvalidTimestamp(value.to_string()))
}

/// Format a timestamp the way Metax and OAI-PMH expect it.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Build the first `ListRecords` request URL.
pub fn list_records_url(base_url: &str, from: Option<&DateTime<Utc>>) -> Result<Url> {
    let mut params = vec![
        ("verb", "ListRecords".to_string()),
        ("metadataPrefix", OAI_METADATA_PREFIX.to_string()),
        ("set", OAI_SET.to_string()),
    ];
    if let Some(from) = from {
        params.push(("from", format_timestamp(from)));
    }
    Ok(Url::parse_with_params(base_url, &params)?)
}

/// Build a `ListRecords` continuation URL from a resumption token.
pub fn resume_records_url(base_url: &str, resumption_token: &str) -> Result<Url> {
    Ok(Url::parse_with_params(
        base_url,
        &[("verb", "ListRecords"), ("resumptionToken", resumption_token)],
    )?)
}

/// Build the Metax URL for looking up datasets of a catalog by PID.
pub fn dataset_lookup_url(base_url: &str, catalog_id: &str, pid: &str) -> Result<Url> {
    Ok(Url::parse_with_params(
        &format!("{}/datasets", base_url.trim_end_matches('/')),
        &[("data_catalog__id", catalog_id), ("persistent_identifier", pid)],
    )?)
}

/// Build the first page URL for listing all datasets of a catalog.
pub fn dataset_listing_url(base_url: &str, catalog_id: &str) -> Result<Url> {
    Ok(Url::parse_with_params(
        &format!("{}/datasets", base_url.trim_end_matches('/')),
        &[
            ("data_catalog__id", catalog_id.to_string()),
            ("limit", METAX_PAGE_SIZE.to_string()),
        ],
    )?)
}

/// Build the Metax collection URL datasets are created in.
pub fn datasets_url(base_url: &str) -> Result<Url> {
    Ok(Url::parse(&format!(
        "{}/datasets",
        base_url.trim_end_matches('/')
    ))?)
}

/// Build the Metax URL of a single dataset.
pub fn dataset_url(base_url: &str, metax_id: &str) -> Result<Url> {
    Ok(Url::parse(&format!(
        "{}/datasets/{metax_id}",
        base_url.trim_end_matches('/')
    ))?)
}

/// Raw configuration file contents before validation.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    metax_api_token: Option<String>,
    metax_base_url: Option<String>,
    metax_catalog_id: Option<String>,
    state_file: Option<PathBuf>,
    oai_pmh_url: Option<String>,
    rejection_report_file: Option<PathBuf>,
}

/// Validated run configuration.
///
/// NOTE: Do NOT derive `Debug` on this struct, `metax_api_token` would leak
/// into logs.
#[derive(Clone)]
pub struct HarvesterConfig {
    pub metax_api_token: String,
    pub metax_base_url: String,
    pub metax_catalog_id: String,
    pub state_file: PathBuf,
    pub oai_pmh_url: String,
    pub rejection_report_file: Option<PathBuf>,
}

impl HarvesterConfig {
    /// Read and validate a YAML configuration file.
    ///
    /// The `METAX_API_TOKEN` environment variable, when set, replaces the
    /// token from the file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            HarvesterError::Config(format!(
                "Could not read configuration file {}: {e}",
                path.display()
            ))
        })?;
        let token_override = std::env::var(METAX_TOKEN_ENV).ok();
        Self::from_yaml(&contents, token_override)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(contents: &str, token_override: Option<String>) -> Result<Self> {
        let raw: RawConfig = serde_yaml_ng::from_str(contents).map_err(|e| {
            HarvesterError::Config(format!(
                "Given configuration file does not seem to be valid YAML: {e}"
            ))
        })?;

        let metax_api_token = token_override
            .filter(|token| !token.is_empty())
            .or(raw.metax_api_token)
            .ok_or_else(|| missing("metax_api_token"))?;
        let metax_base_url = raw.metax_base_url.ok_or_else(|| missing("metax_base_url"))?;
        let metax_catalog_id = raw
            .metax_catalog_id
            .ok_or_else(|| missing("metax_catalog_id"))?;
        let state_file = raw.state_file.ok_or_else(|| missing("state_file"))?;

        Ok(Self {
            metax_api_token,
            metax_base_url: metax_base_url.trim_end_matches('/').to_string(),
            metax_catalog_id,
            state_file,
            oai_pmh_url: raw
                .oai_pmh_url
                .unwrap_or_else(|| DEFAULT_OAI_PMH_URL.to_string()),
            rejection_report_file: raw.rejection_report_file,
        })
    }
}

fn missing(key: &str) -> HarvesterError {
    HarvesterError::Config(format!("Value for \"{key}\" not found in configuration file"))
}

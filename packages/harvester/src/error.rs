//! Error types for the harvester.
//!
//! Uses the dual-error pattern: `HarvesterError` for run-level failures
//! (network, protocol, IO, configuration) and `MappingError` for a single
//! record that cannot be mapped. Mapping errors never abort a run.

use thiserror::Error;

/// Main error type for the harvester library.
#[derive(Debug, Error)]
pub enum HarvesterError {
    /// Invalid PID format.
    #[error("Invalid PID format: '{0}'. Expected urn:nbn:fi:lb-XXXXXXXX (e.g., urn:nbn:fi:lb-2016101210)")]
    InvalidPid(String),

    /// Invalid harvest timestamp.
    #[error("Invalid timestamp: '{0}'. Expected YYYY-MM-DDTHH:MM:SSZ or YYYY-MM-DD")]
    InvalidTimestamp(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// All retry attempts for a request failed.
    #[error("Request failed after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    /// The OAI-PMH endpoint answered with a protocol error.
    #[error("OAI-PMH error '{code}': {message}")]
    OaiPmh { code: String, message: String },

    /// The Metax API answered with an error status.
    #[error("Metax API error (status {status}) for {method} {url}: {message}")]
    MetaxApi {
        method: String,
        url: String,
        status: u16,
        message: String,
    },

    /// Metax returned a response that does not match the expected shape.
    #[error("Unexpected Metax response: {0}")]
    UnexpectedResponse(String),

    /// URL construction failed.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// Missing required XML element.
    #[error("Missing required XML element: {element} in {context}")]
    MissingElement { element: String, context: String },

    /// JSON (de)serialization failed.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML (de)serialization failed.
    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// Configuration file is malformed or incomplete.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A single record could not be mapped.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// Some records could not be pushed, so the run did not complete.
    #[error("{failed} record(s) could not be synced; deletions and state update were skipped")]
    IncompleteHarvest { failed: usize },
}

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, HarvesterError>;

/// A source record that cannot be turned into a target record at all.
///
/// Carries the OAI identifier (when known) so the record can still be
/// reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// The record has no `MdSelfLink`.
    #[error("Could not determine PID for record {}", .identifier.as_deref().unwrap_or("<unknown>"))]
    MissingPid { identifier: Option<String> },

    /// The self-link does not carry the PID namespace prefix.
    #[error("Self-link '{self_link}' of record {} is not a valid PID", .identifier.as_deref().unwrap_or("<unknown>"))]
    InvalidPid {
        self_link: String,
        identifier: Option<String>,
    },
}

impl MappingError {
    /// OAI identifier of the record that failed, if it had one.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Self::MissingPid { identifier } | Self::InvalidPid { identifier, .. } => {
                identifier.as_deref()
            }
        }
    }
}

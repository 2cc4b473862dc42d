//! Kielipankki Harvester - Sync CMDI metadata from OAI-PMH to the Metax catalog.
//!
//! This crate harvests CMDI (META-SHARE profile) records from the Kielipankki
//! OAI-PMH endpoint, maps them to the Metax V3 dataset schema, validates
//! them and keeps the Metax data catalog in sync with the source.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeSet;
//! use kielipankki_harvester::{config, reconcile};
//!
//! // Validate a PID
//! assert!(config::validate_pid("urn:nbn:fi:lb-2016101210").is_ok());
//!
//! // Plan a sync
//! let source: BTreeSet<String> = ["A", "B"].map(String::from).into();
//! let target: BTreeSet<String> = ["B", "C"].map(String::from).into();
//! assert_eq!(reconcile::plan(&source, &target).to_delete.len(), 1);
//! ```
//!
//! # Architecture
//!
//! The harvester is organized into several modules:
//!
//! - [`config`]: Configuration constants, validation and the config file
//! - [`error`]: Error types and Result alias
//! - [`xml`]: XML utilities
//! - [`source`]: CMDI record model
//! - [`tables`]: License, organization and language lookup tables
//! - [`target`]: Metax dataset model
//! - [`actor`]: Actor resolution and merging
//! - [`mapper`]: Source to target field mapping
//! - [`validation`]: Mandatory field rules and rejection report
//! - [`reconcile`]: Sync planning and the target catalog seam
//! - [`http`]: HTTP client with retries
//! - [`oai`]: OAI-PMH client
//! - [`metax`]: Metax REST client
//! - [`state`]: Persisted harvest state
//! - [`harvester`]: Harvest orchestrator
//! - [`cli`]: Command-line interface

pub mod actor;
pub mod cli;
pub mod config;
pub mod error;
pub mod harvester;
pub mod http;
pub mod mapper;
pub mod metax;
pub mod oai;
pub mod reconcile;
pub mod source;
pub mod state;
pub mod tables;
pub mod target;
pub mod validation;
pub mod xml;

// Re-export main functions
pub use harvester::{run_harvest, HarvestOptions, HarvestReport};
pub use mapper::{map_record, MappedRecord, MappingIssue};
pub use reconcile::{plan, SyncPlan, TargetCatalog};
pub use validation::{validate, ValidationRule};

// Re-export commonly used items
pub use config::{validate_pid, HarvesterConfig};
pub use error::{HarvesterError, MappingError, Result};
pub use source::SourceRecord;
pub use target::TargetRecord;

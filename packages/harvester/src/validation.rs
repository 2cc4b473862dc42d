//! Record validator and rejection report.
//!
//! A mapped record is accepted iff it violates no [`ValidationRule`].
//! Rejected and unmappable records are collected in a [`RejectionReport`]
//! that can be written to disk for the curators; the report never touches
//! the target catalog.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::is_valid_pid;
use crate::error::{MappingError, Result};
use crate::target::{Role, TargetRecord};

/// A mandatory-field rule of the target catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationRule {
    MissingPid,
    MissingTitle,
    MissingCreator,
    MissingPublisher,
    MultiplePublishers,
    MissingLicense,
}

impl ValidationRule {
    /// Every rule, in evaluation order.
    pub const ALL: [ValidationRule; 6] = [
        ValidationRule::MissingPid,
        ValidationRule::MissingTitle,
        ValidationRule::MissingCreator,
        ValidationRule::MissingPublisher,
        ValidationRule::MultiplePublishers,
        ValidationRule::MissingLicense,
    ];

    /// Stable identifier used in logs and reports.
    pub fn id(&self) -> &'static str {
        match self {
            ValidationRule::MissingPid => "missing-pid",
            ValidationRule::MissingTitle => "missing-title",
            ValidationRule::MissingCreator => "missing-creator",
            ValidationRule::MissingPublisher => "missing-publisher",
            ValidationRule::MultiplePublishers => "multiple-publishers",
            ValidationRule::MissingLicense => "missing-license",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ValidationRule::MissingPid => "record has no valid persistent identifier",
            ValidationRule::MissingTitle => "record has no title in a supported language",
            ValidationRule::MissingCreator => "record has no creator",
            ValidationRule::MissingPublisher => "record has no publisher",
            ValidationRule::MultiplePublishers => "record has more than one publisher",
            ValidationRule::MissingLicense => "record has no license",
        }
    }

    fn is_violated_by(&self, record: &TargetRecord) -> bool {
        match self {
            ValidationRule::MissingPid => !is_valid_pid(&record.persistent_identifier),
            ValidationRule::MissingTitle => record.title.values().all(|t| t.trim().is_empty()),
            ValidationRule::MissingCreator => record.actors_with_role(Role::Creator).next().is_none(),
            ValidationRule::MissingPublisher => {
                record.actors_with_role(Role::Publisher).next().is_none()
            }
            ValidationRule::MultiplePublishers => record.actors_with_role(Role::Publisher).count() > 1,
            ValidationRule::MissingLicense => record.access_rights.license.is_empty(),
        }
    }
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Outcome of validating one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub pid: String,
    pub violations: Vec<ValidationRule>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Comma separated rule identifiers.
    pub fn rule_ids(&self) -> String {
        self.violations
            .iter()
            .map(ValidationRule::id)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Check a mapped record against every rule.
///
/// # Examples
/// ```
/// use std::collections::BTreeMap;
/// use kielipankki_harvester::target::{AccessRights, TargetRecord, UrlRef};
/// use kielipankki_harvester::validation::{validate, ValidationRule};
///
/// let record = TargetRecord {
///     data_catalog: "catalog".to_string(),
///     persistent_identifier: "urn:nbn:fi:lb-2022001".to_string(),
///     title: BTreeMap::from([("en".to_string(), "Corpus X".to_string())]),
///     description: BTreeMap::new(),
///     language: vec![],
///     field_of_science: vec![],
///     modified: None,
///     created: None,
///     access_rights: AccessRights {
///         license: vec![],
///         access_type: UrlRef::new("open"),
///         restriction_grounds: vec![],
///     },
///     actors: vec![],
///     state: "published".to_string(),
/// };
///
/// let report = validate(&record);
/// assert!(!report.is_valid());
/// assert!(report.violations.contains(&ValidationRule::MissingCreator));
/// ```
pub fn validate(record: &TargetRecord) -> ValidationReport {
    ValidationReport {
        pid: record.persistent_identifier.clone(),
        violations: ValidationRule::ALL
            .into_iter()
            .filter(|rule| rule.is_violated_by(record))
            .collect(),
    }
}

/// A mapped record that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRecord {
    pub pid: String,
    pub rules: Vec<ValidationRule>,
}

/// A source record that could not be mapped at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedRecord {
    pub identifier: Option<String>,
    pub reason: String,
}

/// Records left out of a harvest run, with the reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionReport {
    #[serde(default)]
    pub rejected: Vec<RejectedRecord>,
    #[serde(default)]
    pub dropped: Vec<DroppedRecord>,
}

impl RejectionReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed validation. Valid reports are ignored.
    pub fn add_rejection(&mut self, report: &ValidationReport) {
        if report.is_valid() {
            return;
        }
        self.rejected.push(RejectedRecord {
            pid: report.pid.clone(),
            rules: report.violations.clone(),
        });
    }

    pub fn add_dropped(&mut self, error: &MappingError) {
        self.dropped.push(DroppedRecord {
            identifier: error.identifier().map(str::to_string),
            reason: error.to_string(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.rejected.is_empty() && self.dropped.is_empty()
    }

    /// Total number of records left out.
    pub fn len(&self) -> usize {
        self.rejected.len() + self.dropped.len()
    }

    /// Write the report as YAML.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml_ng::to_string(self)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yaml_ng::from_str(&contents)?)
    }
}

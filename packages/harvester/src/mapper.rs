//! Field mapper: [`SourceRecord`] → [`TargetRecord`].
//!
//! Mapping is a pure function of the source record and the catalog id. It
//! fails only when the record has no usable PID; every other gap in the
//! source metadata is recovered locally and reported as a [`MappingIssue`].
//! Whether the result is acceptable for the catalog is decided afterwards by
//! [`crate::validation`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use unicode_normalization::UnicodeNormalization;

use crate::actor::collect_actors;
use crate::config::{
    format_timestamp, parse_timestamp, validate_pid, ACCESS_TYPE_OPEN_URI,
    ACCESS_TYPE_RESTRICTED_URI, DATASET_STATE, FIELD_OF_SCIENCE_URI, LEXVO_ISO639_3_BASE,
    LEXVO_ISO639_5_BASE, MULTIPLE_PUBLISHERS_LABEL, RESTRICTION_GROUNDS_OTHER_URI,
    RESTRICTION_GROUNDS_RESEARCH_URI, UNRESTRICTED_AVAILABILITY,
};
use crate::error::MappingError;
use crate::source::{LangString, LanguageInfo, SourceRecord};
use crate::tables::{
    is_aca_license_uri, is_iso639_3, is_iso639_5_collective, iso639_3_from_alpha2,
    iso639_3_from_bibliographic, license_uri, LICENSE_OTHER_URI,
};
use crate::target::{
    AccessRights, License, Role, TargetActor, TargetOrganization, TargetRecord, UrlRef,
};

/// Language tags kept in title and description maps, in priority order.
pub const KEPT_LANGUAGE_TAGS: [&str; 3] = ["en", "fi", "und"];

/// A non-fatal problem found while mapping a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingIssue {
    /// Licence name missing from the license table; the entry was dropped.
    UnknownLicense { licence: String },
    /// Organization name missing from the organization table; kept as a label.
    UnknownOrganization { name: String },
    /// Language id that cannot be turned into an ISO 639-3 code; omitted.
    UnknownLanguage { code: String },
    /// Person without an affiliation; the person was dropped.
    MissingAffiliation { person: String },
    /// Date field that could not be parsed; omitted.
    UnparsableDate { field: &'static str, value: String },
    /// Date field absent from the source; omitted.
    MissingDate { field: &'static str },
    /// Several publishers collapsed into one placeholder.
    MultiplePublishers { count: usize },
}

impl MappingIssue {
    /// Whether the issue is an expected policy substitution rather than a
    /// data problem.
    pub fn is_informational(&self) -> bool {
        matches!(self, MappingIssue::MultiplePublishers { .. })
    }

    fn log(&self, pid: &str) {
        if self.is_informational() {
            tracing::info!(pid, "{self}");
        } else {
            tracing::warn!(pid, "{self}");
        }
    }
}

impl fmt::Display for MappingIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingIssue::UnknownLicense { licence } => {
                write!(f, "Unknown licence '{licence}', entry skipped")
            }
            MappingIssue::UnknownOrganization { name } => {
                write!(f, "Could not determine URI for organization '{name}'")
            }
            MappingIssue::UnknownLanguage { code } => {
                write!(f, "Could not determine ISO 639 language code for '{code}'")
            }
            MappingIssue::MissingAffiliation { person } => {
                write!(f, "Could not find affiliation for {person}, actor skipped")
            }
            MappingIssue::UnparsableDate { field, value } => {
                write!(f, "Could not parse {field} date '{value}', field omitted")
            }
            MappingIssue::MissingDate { field } => write!(f, "No {field} date, field omitted"),
            MappingIssue::MultiplePublishers { count } => {
                write!(f, "{count} publishers found, replaced with a placeholder")
            }
        }
    }
}

/// A successfully mapped record with the issues recovered along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedRecord {
    pub record: TargetRecord,
    pub issues: Vec<MappingIssue>,
}

/// Map one source record into the target schema.
///
/// # Errors
/// [`MappingError::MissingPid`] when the record has no self-link and
/// [`MappingError::InvalidPid`] when the self-link is not a PID of the
/// expected namespace.
pub fn map_record(source: &SourceRecord, catalog_id: &str) -> Result<MappedRecord, MappingError> {
    let pid = record_pid(source)?;
    let mut issues = Vec::new();

    let license = map_licenses(source, &mut issues);
    let access_rights = map_access_rights(source, license);

    let mut actors = collect_actors(&source.actors, &mut issues);
    if has_multiple_publishers(&actors) {
        issues.push(MappingIssue::MultiplePublishers {
            count: actors.iter().filter(|a| a.has_role(Role::Publisher)).count(),
        });
        actors = collapse_publishers(actors);
    }

    let record = TargetRecord {
        data_catalog: catalog_id.to_string(),
        persistent_identifier: pid.clone(),
        title: language_map(&source.titles),
        description: language_map(&source.descriptions),
        language: map_languages(&source.languages, &mut issues),
        field_of_science: vec![UrlRef::new(FIELD_OF_SCIENCE_URI)],
        modified: map_date("modified", source.datestamp.as_deref(), &mut issues),
        created: map_date("created", source.creation_date.as_deref(), &mut issues),
        access_rights,
        actors,
        state: DATASET_STATE.to_string(),
    };

    for issue in &issues {
        issue.log(&pid);
    }

    Ok(MappedRecord { record, issues })
}

/// Validated PID of a source record.
pub fn record_pid(source: &SourceRecord) -> Result<String, MappingError> {
    let identifier = source.oai_identifier.clone();
    let self_link = source
        .self_link
        .as_deref()
        .ok_or(MappingError::MissingPid {
            identifier: identifier.clone(),
        })?;

    validate_pid(self_link).map_err(|_| MappingError::InvalidPid {
        self_link: self_link.to_string(),
        identifier,
    })
}

/// Whether the record is available without restrictions.
pub fn is_open_access(source: &SourceRecord) -> bool {
    source.availability.as_deref() == Some(UNRESTRICTED_AVAILABILITY)
}

/// Whether a license is in the CLARIN ACA (academic use) family.
pub fn is_aca_license(license: &License) -> bool {
    is_aca_license_uri(&license.url)
}

/// Whether more than one distinct actor carries the publisher role.
pub fn has_multiple_publishers(actors: &[TargetActor]) -> bool {
    actors.iter().filter(|a| a.has_role(Role::Publisher)).count() > 1
}

/// Take the first variant of each kept language tag.
///
/// A variant without `xml:lang` counts as `und`.
fn language_map(variants: &[LangString]) -> BTreeMap<String, String> {
    KEPT_LANGUAGE_TAGS
        .iter()
        .filter_map(|tag| {
            variants
                .iter()
                .find(|v| v.lang.as_deref().unwrap_or("und") == *tag)
                .map(|v| v.text.trim().nfc().collect::<String>())
                .filter(|text| !text.is_empty())
                .map(|text| (tag.to_string(), text))
        })
        .collect()
}

fn map_languages(languages: &[LanguageInfo], issues: &mut Vec<MappingIssue>) -> Vec<UrlRef> {
    let uris: BTreeSet<String> = languages
        .iter()
        .filter_map(|info| {
            let uri = language_uri(&info.id);
            if uri.is_none() {
                issues.push(MappingIssue::UnknownLanguage {
                    code: info.id.clone(),
                });
            }
            uri
        })
        .collect();
    uris.into_iter().map(UrlRef::new).collect()
}

/// Lexvo URI of a language id such as `fi`, `fin`, `se-FI` or `smi`.
pub fn language_uri(language_id: &str) -> Option<String> {
    let primary = language_id
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase();

    if !primary.chars().all(|c| c.is_ascii_lowercase()) {
        return None;
    }

    match primary.len() {
        2 => iso639_3_from_alpha2(&primary).map(|code| format!("{LEXVO_ISO639_3_BASE}{code}")),
        3 if is_iso639_5_collective(&primary) => Some(format!("{LEXVO_ISO639_5_BASE}{primary}")),
        3 => {
            let code = iso639_3_from_bibliographic(&primary).unwrap_or(primary.as_str());
            is_iso639_3(code).then(|| format!("{LEXVO_ISO639_3_BASE}{code}"))
        }
        _ => None,
    }
}

fn map_licenses(source: &SourceRecord, issues: &mut Vec<MappingIssue>) -> Vec<License> {
    let custom_url = source.license_document_url.clone();
    let mut licenses: Vec<License> = Vec::new();

    for name in &source.licences {
        match license_uri(name) {
            Some(url) if licenses.iter().all(|l| l.url != url) => licenses.push(License {
                url,
                custom_url: custom_url.clone(),
            }),
            Some(_) => {}
            None => issues.push(MappingIssue::UnknownLicense {
                licence: name.clone(),
            }),
        }
    }

    if licenses.is_empty() {
        licenses.push(License {
            url: LICENSE_OTHER_URI.to_string(),
            custom_url: None,
        });
    }
    licenses
}

fn map_access_rights(source: &SourceRecord, license: Vec<License>) -> AccessRights {
    if is_open_access(source) {
        return AccessRights {
            license,
            access_type: UrlRef::new(ACCESS_TYPE_OPEN_URI),
            restriction_grounds: Vec::new(),
        };
    }

    let grounds = if license.iter().any(is_aca_license) {
        RESTRICTION_GROUNDS_RESEARCH_URI
    } else {
        RESTRICTION_GROUNDS_OTHER_URI
    };
    AccessRights {
        license,
        access_type: UrlRef::new(ACCESS_TYPE_RESTRICTED_URI),
        restriction_grounds: vec![UrlRef::new(grounds)],
    }
}

/// Remove the publisher role from every actor and append one placeholder
/// publisher. Actors left without roles are dropped.
fn collapse_publishers(actors: Vec<TargetActor>) -> Vec<TargetActor> {
    let mut collapsed: Vec<TargetActor> = actors
        .into_iter()
        .filter_map(|mut actor| {
            actor.roles.remove(&Role::Publisher);
            (!actor.roles.is_empty()).then_some(actor)
        })
        .collect();

    collapsed.push(TargetActor {
        roles: BTreeSet::from([Role::Publisher]),
        person: None,
        organization: Some(TargetOrganization::english_label(MULTIPLE_PUBLISHERS_LABEL)),
    });
    collapsed
}

fn map_date(
    field: &'static str,
    value: Option<&str>,
    issues: &mut Vec<MappingIssue>,
) -> Option<String> {
    let Some(value) = value else {
        issues.push(MappingIssue::MissingDate { field });
        return None;
    };
    match parse_timestamp(value) {
        Ok(timestamp) => Some(format_timestamp(&timestamp)),
        Err(_) => {
            issues.push(MappingIssue::UnparsableDate {
                field,
                value: value.to_string(),
            });
            None
        }
    }
}

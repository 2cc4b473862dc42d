//! Target-side dataset model, shaped like a Metax V3 dataset payload.
//!
//! Every map and set here is ordered (`BTreeMap`, `BTreeSet`, sorted
//! vectors) so that serializing the same record twice yields byte-identical
//! JSON.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Actor role in the target catalog.
///
/// Variant order is the alphabetical order of the serialized names, so a
/// `BTreeSet<Role>` serializes as a sorted role list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Creator,
    Curator,
    Publisher,
    RightsHolder,
}

impl Role {
    /// Serialized name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Creator => "creator",
            Role::Curator => "curator",
            Role::Publisher => "publisher",
            Role::RightsHolder => "rights_holder",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference to a vocabulary concept by URI.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UrlRef {
    pub url: String,
}

impl UrlRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// One license entry of the access rights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub url: String,
    /// Link to the license terms document of this particular dataset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRights {
    pub license: Vec<License>,
    pub access_type: UrlRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub restriction_grounds: Vec<UrlRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetPerson {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Organization of an actor: a resolved reference code, or a free label when
/// the name could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetOrganization {
    Reference { url: String },
    Label { pref_label: BTreeMap<String, String> },
}

impl TargetOrganization {
    /// An unresolved organization labelled in English.
    pub fn english_label(name: impl Into<String>) -> Self {
        TargetOrganization::Label {
            pref_label: BTreeMap::from([("en".to_string(), name.into())]),
        }
    }
}

/// A role-tagged person and/or organization.
///
/// A person always comes with its affiliation as `organization`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetActor {
    pub roles: BTreeSet<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person: Option<TargetPerson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<TargetOrganization>,
}

impl TargetActor {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// A dataset ready to be pushed to the target catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRecord {
    pub data_catalog: String,
    pub persistent_identifier: String,
    /// Language tag → title.
    pub title: BTreeMap<String, String>,
    /// Language tag → description.
    #[serde(default)]
    pub description: BTreeMap<String, String>,
    /// Lexvo language URIs, sorted and unique.
    #[serde(default)]
    pub language: Vec<UrlRef>,
    #[serde(default)]
    pub field_of_science: Vec<UrlRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    pub access_rights: AccessRights,
    pub actors: Vec<TargetActor>,
    pub state: String,
}

impl TargetRecord {
    /// Actors carrying the given role.
    pub fn actors_with_role(&self, role: Role) -> impl Iterator<Item = &TargetActor> {
        self.actors.iter().filter(move |actor| actor.has_role(role))
    }

    /// Serialize to the JSON payload sent to the catalog.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to indented JSON for display.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

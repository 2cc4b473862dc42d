//! Source-side record model parsed from CMDI (META-SHARE profile) XML.
//!
//! A [`SourceRecord`] is a plain, owned snapshot of the fields the mapper
//! needs. It is built either from a bare `<CMD>` document or from an OAI-PMH
//! `<record>` element wrapping one, and holds no interpretation beyond text
//! extraction: deciding what a value *means* is the mapper's job.

use roxmltree::{Document, Node};

use crate::error::Result;
use crate::xml::{
    find_all_by_path, find_by_path, find_child, find_children, find_descendant,
    find_descendants, get_tag_name, get_text, has_tag, non_empty_text, xml_lang,
};

/// A text value with its `xml:lang` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangString {
    pub lang: Option<String>,
    pub text: String,
}

/// One `languageInfo` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageInfo {
    /// Language code as written in the source (`fi`, `fin`, `se-FI`...).
    pub id: String,
    /// Human readable name, not used in the target record.
    pub name: Option<String>,
}

/// Reference to an organization, either an actor itself or an affiliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationRef {
    pub name: String,
    pub department: Option<String>,
}

/// A person or organization referenced by the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceActor {
    Person {
        given_name: Option<String>,
        surname: Option<String>,
        email: Option<String>,
        affiliation: Option<OrganizationRef>,
    },
    Organization(OrganizationRef),
}

/// The element an actor reference was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRole {
    /// `resourceCreationInfo/resourceCreator*`
    ResourceCreator,
    /// `licenceInfo/distributionRightsHolder*`
    DistributionRightsHolder,
    /// `resourceInfo/contactPerson`
    ContactPerson,
    /// `distributionInfo/iprHolder*`
    IprHolder,
}

/// An actor together with the role it was referenced in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorReference {
    pub role: SourceRole,
    pub actor: SourceActor,
}

/// One harvested CMDI record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRecord {
    /// OAI-PMH identifier from the record header.
    pub oai_identifier: Option<String>,
    /// OAI-PMH datestamp (last modification).
    pub datestamp: Option<String>,
    /// `Header/MdSelfLink`, the candidate PID.
    pub self_link: Option<String>,
    /// `Header/MdCreationDate`.
    pub creation_date: Option<String>,
    pub resource_type: Option<String>,
    pub titles: Vec<LangString>,
    pub descriptions: Vec<LangString>,
    pub languages: Vec<LanguageInfo>,
    /// Licence names in document order.
    pub licences: Vec<String>,
    pub availability: Option<String>,
    /// URL of the license document found in the resource documentation.
    pub license_document_url: Option<String>,
    pub actors: Vec<ActorReference>,
}

impl SourceRecord {
    /// Parse a record from an XML string.
    pub fn parse(xml: &str) -> Result<Self> {
        let doc = Document::parse(xml)?;
        Ok(Self::from_node(doc.root_element()))
    }

    /// Extract a record from an OAI-PMH `<record>` or a bare `<CMD>` element.
    pub fn from_node(node: Node<'_, '_>) -> Self {
        let oai_header = if get_tag_name(node) == "header" {
            Some(node)
        } else {
            find_descendant(node, "header")
        };
        let cmd_header = find_descendant(node, "Header");

        let identification = find_descendant(node, "identificationInfo").unwrap_or(node);
        let distribution: Vec<Node<'_, '_>> = find_descendants(node, "distributionInfo").collect();

        Self {
            oai_identifier: oai_header
                .and_then(|h| find_child(h, "identifier"))
                .and_then(non_empty_text),
            datestamp: oai_header
                .and_then(|h| find_child(h, "datestamp"))
                .and_then(non_empty_text),
            self_link: cmd_header
                .and_then(|h| find_child(h, "MdSelfLink"))
                .and_then(non_empty_text),
            creation_date: cmd_header
                .and_then(|h| find_child(h, "MdCreationDate"))
                .and_then(non_empty_text),
            resource_type: find_descendant(node, "resourceType").and_then(non_empty_text),
            titles: lang_strings(identification, "resourceName"),
            descriptions: lang_strings(identification, "description"),
            languages: parse_languages(node),
            licences: distribution
                .iter()
                .flat_map(|d| find_all_by_path(*d, "licenceInfo/licence"))
                .filter_map(non_empty_text)
                .collect(),
            availability: distribution
                .iter()
                .find_map(|d| find_child(*d, "availability"))
                .and_then(non_empty_text),
            license_document_url: license_document_url(node),
            actors: parse_actors(node, &distribution),
        }
    }

    /// Whether the record describes a corpus (tools and lexica are not synced).
    #[must_use]
    pub fn is_corpus(&self) -> bool {
        self.resource_type.as_deref() == Some("corpus")
    }

    /// Best identifier for log messages: self-link, else OAI identifier.
    #[must_use]
    pub fn display_id(&self) -> &str {
        self.self_link
            .as_deref()
            .or(self.oai_identifier.as_deref())
            .unwrap_or("<unidentified record>")
    }
}

fn lang_strings(scope: Node<'_, '_>, tag: &str) -> Vec<LangString> {
    scope
        .children()
        .filter(|child| has_tag(*child, tag))
        .filter_map(|n| {
            non_empty_text(n).map(|text| LangString {
                lang: xml_lang(n).map(str::to_string),
                text,
            })
        })
        .collect()
}

fn parse_languages(node: Node<'_, '_>) -> Vec<LanguageInfo> {
    find_descendants(node, "languageInfo")
        .filter_map(|info| {
            let id = find_child(info, "languageId").and_then(non_empty_text)?;
            Some(LanguageInfo {
                id,
                name: find_child(info, "languageName").and_then(non_empty_text),
            })
        })
        .collect()
}

/// Locate the license document URL in the resource documentation.
///
/// Structured documentation wins: a `documentInfo` whose English title
/// mentions a license points to it with its `url`. Otherwise the first
/// unstructured note mentioning a license and containing a `urn.fi` link is
/// used.
fn license_document_url(node: Node<'_, '_>) -> Option<String> {
    let documentation: Vec<Node<'_, '_>> =
        find_descendants(node, "resourceDocumentationInfo").collect();

    let structured = documentation
        .iter()
        .flat_map(|d| find_all_by_path(*d, "documentationStructured/documentInfo"))
        .find_map(|doc_info| {
            let mentions_license = find_children(doc_info, "title")
                .filter(|title| xml_lang(*title) == Some("en"))
                .any(|title| get_text(title).to_lowercase().contains("license"));
            if mentions_license {
                find_child(doc_info, "url").and_then(non_empty_text)
            } else {
                None
            }
        });
    if structured.is_some() {
        return structured;
    }

    documentation
        .iter()
        .flat_map(|d| find_all_by_path(*d, "documentationUnstructured/documentUnstructured"))
        .find_map(|note| {
            let text = get_text(note);
            if !text.to_lowercase().contains("license") {
                return None;
            }
            text.split_whitespace()
                .find(|word| word.to_lowercase().contains("://urn.fi/urn:nbn:fi"))
                .map(|word| {
                    word.trim_matches(|c| matches!(c, '(' | ')' | ',' | '.' | ';' | '"' | '<' | '>'))
                        .to_string()
                })
        })
}

fn parse_actors(node: Node<'_, '_>, distribution: &[Node<'_, '_>]) -> Vec<ActorReference> {
    let mut actors = Vec::new();
    let mut push = |role: SourceRole, actor: Option<SourceActor>| {
        if let Some(actor) = actor {
            actors.push(ActorReference { role, actor });
        }
    };

    for creation in find_descendants(node, "resourceCreationInfo") {
        for person in find_children(creation, "resourceCreatorPerson") {
            push(SourceRole::ResourceCreator, parse_person(person));
        }
        for organization in find_children(creation, "resourceCreatorOrganization") {
            push(SourceRole::ResourceCreator, parse_organization_actor(organization));
        }
    }

    for dist in distribution {
        for licence_info in find_children(*dist, "licenceInfo") {
            for person in find_children(licence_info, "distributionRightsHolderPerson") {
                push(SourceRole::DistributionRightsHolder, parse_person(person));
            }
            for organization in find_children(licence_info, "distributionRightsHolderOrganization") {
                push(
                    SourceRole::DistributionRightsHolder,
                    parse_organization_actor(organization),
                );
            }
        }
    }

    for contact in find_descendants(node, "contactPerson")
        .filter(|c| c.parent_element().map(get_tag_name) == Some("resourceInfo"))
    {
        push(SourceRole::ContactPerson, parse_person(contact));
    }

    for dist in distribution {
        for person in find_children(*dist, "iprHolderPerson") {
            push(SourceRole::IprHolder, parse_person(person));
        }
        for organization in find_children(*dist, "iprHolderOrganization") {
            push(SourceRole::IprHolder, parse_organization_actor(organization));
        }
    }

    actors
}

/// Text of the English variant of a child element, else of the first one.
fn preferred_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    let candidates: Vec<Node<'_, '_>> =
        node.children().filter(|child| has_tag(*child, tag)).collect();
    candidates
        .iter()
        .find(|c| xml_lang(**c) == Some("en"))
        .or_else(|| candidates.first())
        .and_then(|c| non_empty_text(*c))
}

fn parse_person(node: Node<'_, '_>) -> Option<SourceActor> {
    let given_name = preferred_text(node, "givenName");
    let surname = preferred_text(node, "surname");
    if given_name.is_none() && surname.is_none() {
        tracing::debug!(element = get_tag_name(node), "skipping person without a name");
        return None;
    }

    Some(SourceActor::Person {
        given_name,
        surname,
        email: find_by_path(node, "communicationInfo/email").and_then(non_empty_text),
        affiliation: find_child(node, "affiliation").and_then(parse_organization_ref),
    })
}

fn parse_organization_ref(node: Node<'_, '_>) -> Option<OrganizationRef> {
    Some(OrganizationRef {
        name: preferred_text(node, "organizationName")?,
        department: preferred_text(node, "departmentName"),
    })
}

fn parse_organization_actor(node: Node<'_, '_>) -> Option<SourceActor> {
    let organization = parse_organization_ref(node);
    if organization.is_none() {
        tracing::debug!(
            element = get_tag_name(node),
            "skipping organization without a name"
        );
    }
    organization.map(SourceActor::Organization)
}

//! Actor resolution: from source actor references to merged target actors.
//!
//! The same person (same name and email) or organization (same resolved
//! name) may be referenced in several places of a record. Such references collapse into
//! one [`TargetActor`] carrying the union of their roles.

use std::collections::BTreeSet;

use crate::mapper::MappingIssue;
use crate::source::{ActorReference, OrganizationRef, SourceActor, SourceRole};
use crate::tables::{organization_uri, UMBRELLA_ORGANIZATION};
use crate::target::{Role, TargetActor, TargetOrganization, TargetPerson};

/// Merge key of an actor.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ActorKey {
    Person { name: String, email: Option<String> },
    Organization { name: String },
}

/// Target role for a source role.
pub fn target_role(role: SourceRole) -> Role {
    match role {
        SourceRole::ResourceCreator => Role::Creator,
        SourceRole::DistributionRightsHolder => Role::Publisher,
        SourceRole::ContactPerson => Role::Curator,
        SourceRole::IprHolder => Role::RightsHolder,
    }
}

/// Display name of a person: "Given Surname", or whichever part exists.
pub fn person_name(given_name: Option<&str>, surname: Option<&str>) -> Option<String> {
    match (given_name, surname) {
        (Some(given), Some(surname)) => Some(format!("{given} {surname}")),
        (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
        (None, None) => None,
    }
}

/// Name used to look up an organization's reference code.
///
/// Members of the umbrella organization are identified by their department.
fn lookup_name(organization: &OrganizationRef) -> &str {
    match (&organization.department, organization.name.as_str()) {
        (Some(department), UMBRELLA_ORGANIZATION) => department.as_str(),
        (_, name) => name,
    }
}

/// Resolve an organization to its reference code, or fall back to a label.
pub fn resolve_organization(
    organization: &OrganizationRef,
    issues: &mut Vec<MappingIssue>,
) -> TargetOrganization {
    let name = lookup_name(organization);
    match organization_uri(name) {
        Some(url) => TargetOrganization::Reference { url },
        None => {
            issues.push(MappingIssue::UnknownOrganization {
                name: name.to_string(),
            });
            TargetOrganization::english_label(name)
        }
    }
}

/// Build the merged, role-tagged actor list of a record.
///
/// Persons without an affiliation are dropped and reported.
pub fn collect_actors(references: &[ActorReference], issues: &mut Vec<MappingIssue>) -> Vec<TargetActor> {
    let mut merged: Vec<(ActorKey, TargetActor)> = Vec::new();

    for reference in references {
        let role = target_role(reference.role);

        let Some((key, actor)) = build_actor(&reference.actor, role, issues) else {
            continue;
        };

        match merged.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, existing)) => {
                existing.roles.insert(role);
            }
            None => merged.push((key, actor)),
        }
    }

    merged.into_iter().map(|(_, actor)| actor).collect()
}

fn build_actor(
    source: &SourceActor,
    role: Role,
    issues: &mut Vec<MappingIssue>,
) -> Option<(ActorKey, TargetActor)> {
    match source {
        SourceActor::Person {
            given_name,
            surname,
            email,
            affiliation,
        } => {
            let name = person_name(given_name.as_deref(), surname.as_deref())?;
            let Some(affiliation) = affiliation else {
                issues.push(MappingIssue::MissingAffiliation { person: name });
                return None;
            };
            let key = ActorKey::Person {
                name: name.clone(),
                email: email.clone(),
            };
            let actor = TargetActor {
                roles: BTreeSet::from([role]),
                person: Some(TargetPerson {
                    name,
                    email: email.clone(),
                }),
                organization: Some(resolve_organization(affiliation, issues)),
            };
            Some((key, actor))
        }
        SourceActor::Organization(organization) => {
            let key = ActorKey::Organization {
                name: lookup_name(organization).to_string(),
            };
            let actor = TargetActor {
                roles: BTreeSet::from([role]),
                person: None,
                organization: Some(resolve_organization(organization, issues)),
            };
            Some((key, actor))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn org(name: &str, department: Option<&str>) -> OrganizationRef {
        OrganizationRef {
            name: name.to_string(),
            department: department.map(str::to_string),
        }
    }

    fn person(given: &str, surname: &str, email: Option<&str>, affiliation: Option<OrganizationRef>) -> SourceActor {
        SourceActor::Person {
            given_name: Some(given.to_string()),
            surname: Some(surname.to_string()),
            email: email.map(str::to_string),
            affiliation,
        }
    }

    fn reference(role: SourceRole, actor: SourceActor) -> ActorReference {
        ActorReference { role, actor }
    }

    #[test]
    fn test_same_person_merges_roles() {
        let jane = person("Jane", "Doe", Some("jane@example.org"), Some(org("University of Helsinki", None)));
        let refs = vec![
            reference(SourceRole::IprHolder, jane.clone()),
            reference(SourceRole::ResourceCreator, jane),
        ];
        let mut issues = Vec::new();
        let actors = collect_actors(&refs, &mut issues);

        assert_eq!(actors.len(), 1);
        assert_eq!(
            actors[0].roles,
            BTreeSet::from([Role::Creator, Role::RightsHolder])
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn test_different_email_is_different_person() {
        let affiliation = Some(org("University of Helsinki", None));
        let refs = vec![
            reference(SourceRole::ResourceCreator, person("Jane", "Doe", Some("a@x.org"), affiliation.clone())),
            reference(SourceRole::ContactPerson, person("Jane", "Doe", Some("b@x.org"), affiliation)),
        ];
        assert_eq!(collect_actors(&refs, &mut Vec::new()).len(), 2);
    }

    #[test]
    fn test_umbrella_resolves_through_department() {
        let mut issues = Vec::new();
        let resolved = resolve_organization(
            &org("FIN-CLARIN", Some("University of Turku")),
            &mut issues,
        );
        assert_eq!(
            resolved,
            TargetOrganization::Reference {
                url: "http://uri.suomi.fi/codelist/fairdata/organization/code/10089".to_string()
            }
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn test_unknown_organization_passes_through() {
        let mut issues = Vec::new();
        let resolved = resolve_organization(&org("Acme Linguistics", None), &mut issues);
        assert_eq!(resolved, TargetOrganization::english_label("Acme Linguistics"));
        assert_eq!(
            issues,
            vec![MappingIssue::UnknownOrganization {
                name: "Acme Linguistics".to_string()
            }]
        );
    }

    #[test]
    fn test_person_without_affiliation_dropped() {
        let refs = vec![reference(SourceRole::ContactPerson, person("John", "Smith", None, None))];
        let mut issues = Vec::new();
        assert!(collect_actors(&refs, &mut issues).is_empty());
        assert_eq!(
            issues,
            vec![MappingIssue::MissingAffiliation {
                person: "John Smith".to_string()
            }]
        );
    }

    #[test]
    fn test_umbrella_members_stay_distinct() {
        let refs = vec![
            reference(
                SourceRole::DistributionRightsHolder,
                SourceActor::Organization(org("FIN-CLARIN", Some("University of Helsinki"))),
            ),
            reference(
                SourceRole::DistributionRightsHolder,
                SourceActor::Organization(org("FIN-CLARIN", Some("University of Turku"))),
            ),
            reference(
                SourceRole::IprHolder,
                SourceActor::Organization(org("FIN-CLARIN", Some("University of Turku"))),
            ),
        ];
        let actors = collect_actors(&refs, &mut Vec::new());

        assert_eq!(actors.len(), 2);
        assert_eq!(actors[0].roles, BTreeSet::from([Role::Publisher]));
        assert_eq!(
            actors[1].roles,
            BTreeSet::from([Role::Publisher, Role::RightsHolder])
        );
        assert_eq!(
            actors[1].organization,
            Some(TargetOrganization::Reference {
                url: "http://uri.suomi.fi/codelist/fairdata/organization/code/10089".to_string()
            })
        );
    }

    #[test]
    fn test_umbrella_member_merges_with_direct_name() {
        let refs = vec![
            reference(
                SourceRole::ResourceCreator,
                SourceActor::Organization(org("University of Turku", None)),
            ),
            reference(
                SourceRole::DistributionRightsHolder,
                SourceActor::Organization(org("FIN-CLARIN", Some("University of Turku"))),
            ),
        ];
        let actors = collect_actors(&refs, &mut Vec::new());
        assert_eq!(actors.len(), 1);
        assert_eq!(actors[0].roles, BTreeSet::from([Role::Creator, Role::Publisher]));
    }

    #[test]
    fn test_person_name_variants() {
        assert_eq!(person_name(Some("A"), Some("B")).as_deref(), Some("A B"));
        assert_eq!(person_name(None, Some("B")).as_deref(), Some("B"));
        assert_eq!(person_name(None, None), None);
    }
}

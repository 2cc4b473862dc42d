//! Mapping and validation of real-shaped CMDI records.

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use serde_json::json;

use kielipankki_harvester::config::{DEFAULT_CATALOG_ID, MULTIPLE_PUBLISHERS_LABEL};
use kielipankki_harvester::mapper::{map_record, MappingIssue};
use kielipankki_harvester::source::SourceRecord;
use kielipankki_harvester::target::{Role, TargetOrganization};
use kielipankki_harvester::validation::{validate, RejectionReport, ValidationRule};

/// Load fixture file content.
fn load_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("cmdi")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

fn parse_fixture(name: &str) -> SourceRecord {
    SourceRecord::parse(&load_fixture(name)).unwrap()
}

#[test]
fn test_restricted_corpus_maps_to_expected_dataset() {
    let mapped = map_record(&parse_fixture("corpus_restricted.xml"), DEFAULT_CATALOG_ID).unwrap();
    let value = serde_json::to_value(&mapped.record).unwrap();

    assert_eq!(
        value,
        json!({
            "data_catalog": "urn:nbn:fi:att:data-catalog-kielipankki",
            "persistent_identifier": "urn:nbn:fi:lb-2016101210",
            "title": {
                "en": "Silva Kiuru's Time Expressions Corpus",
                "fi": "Silva Kiurun ajanilmausaineisto"
            },
            "description": {
                "en": "A corpus of Finnish time expressions collected by Silva Kiuru.",
                "fi": "Silva Kiurun keräämä suomen ajanilmausten aineisto."
            },
            "language": [{"url": "http://lexvo.org/id/iso639-3/fin"}],
            "field_of_science": [{"url": "http://www.yso.fi/onto/okm-tieteenala/ta6121"}],
            "created": "2016-10-12T00:00:00Z",
            "access_rights": {
                "license": [{
                    "url": "http://uri.suomi.fi/codelist/fairdata/license/code/ClarinACA+NC-1.0",
                    "custom_url": "http://urn.fi/urn:nbn:fi:lb-2016112304"
                }],
                "access_type": {"url": "http://uri.suomi.fi/codelist/fairdata/access_type/code/restricted"},
                "restriction_grounds": [
                    {"url": "http://uri.suomi.fi/codelist/fairdata/restriction_grounds/code/research"}
                ]
            },
            "actors": [
                {
                    "roles": ["creator", "publisher", "rights_holder"],
                    "person": {"name": "Silva Kiuru", "email": "silva.kiuru@example.org"},
                    "organization": {"url": "http://uri.suomi.fi/codelist/fairdata/organization/code/01901"}
                },
                {
                    "roles": ["curator"],
                    "person": {"name": "Jane Doe", "email": "jane.doe@example.org"},
                    "organization": {"url": "http://uri.suomi.fi/codelist/fairdata/organization/code/01901"}
                }
            ],
            "state": "published"
        })
    );

    // A bare CMD document has no OAI datestamp.
    assert_eq!(mapped.issues, vec![MappingIssue::MissingDate { field: "modified" }]);
    assert!(validate(&mapped.record).is_valid());
}

#[test]
fn test_missing_creator_is_rejected() {
    let mapped = map_record(&parse_fixture("corpus_missing_creator.xml"), DEFAULT_CATALOG_ID).unwrap();
    assert_eq!(mapped.record.persistent_identifier, "urn:nbn:fi:lb-2022001");
    assert_eq!(mapped.record.title["en"], "Corpus X");

    let report = validate(&mapped.record);
    assert_eq!(report.violations, vec![ValidationRule::MissingCreator]);

    let mut rejections = RejectionReport::new();
    rejections.add_rejection(&report);
    assert_eq!(rejections.rejected[0].pid, "urn:nbn:fi:lb-2022001");
    assert_eq!(rejections.rejected[0].rules[0].id(), "missing-creator");
}

#[test]
fn test_metadata_creator_is_not_a_creator() {
    let mapped = map_record(&parse_fixture("corpus_metadata_creator_only.xml"), DEFAULT_CATALOG_ID).unwrap();
    assert!(mapped.record.actors.iter().all(|actor| actor.person.is_none()));
    assert_eq!(
        validate(&mapped.record).violations,
        vec![ValidationRule::MissingCreator]
    );
}

#[test]
fn test_umbrella_publishers_from_different_departments_collapse() {
    let mapped = map_record(&parse_fixture("corpus_umbrella_publishers.xml"), DEFAULT_CATALOG_ID).unwrap();

    let publishers: Vec<_> = mapped.record.actors_with_role(Role::Publisher).collect();
    assert_eq!(publishers.len(), 1);
    assert_eq!(
        publishers[0].organization,
        Some(TargetOrganization::english_label(MULTIPLE_PUBLISHERS_LABEL))
    );
    assert!(mapped.issues.contains(&MappingIssue::MultiplePublishers { count: 2 }));
}

#[test]
fn test_mapping_fixture_is_deterministic() {
    let source = parse_fixture("corpus_restricted.xml");
    let outputs: Vec<String> = (0..3)
        .map(|_| {
            map_record(&source, DEFAULT_CATALOG_ID)
                .unwrap()
                .record
                .to_json()
                .unwrap()
        })
        .collect();
    assert!(outputs.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn test_validation_passes_iff_no_rule_violated() {
    for name in ["corpus_restricted.xml", "corpus_missing_creator.xml"] {
        let mapped = map_record(&parse_fixture(name), DEFAULT_CATALOG_ID).unwrap();
        let report = validate(&mapped.record);
        assert_eq!(report.is_valid(), report.violations.is_empty(), "{name}");
    }
}

//! Static lookup tables used by the field mapper.
//!
//! All tables are plain `(key, value)` slices indexed once into hash maps on
//! first use. Lookups are exact and case-sensitive unless stated otherwise;
//! a missing key is never an error here, callers decide how to recover.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use isolang::Language;

/// Base of the Fairdata license code list.
pub const LICENSE_URI_BASE: &str = "http://uri.suomi.fi/codelist/fairdata/license/code";

/// License used when none of a record's licences can be mapped.
pub const LICENSE_OTHER_URI: &str = "http://uri.suomi.fi/codelist/fairdata/license/code/other";

/// Base of the Fairdata organization code list.
pub const ORGANIZATION_URI_BASE: &str = "http://uri.suomi.fi/codelist/fairdata/organization/code";

/// Umbrella organization whose members are identified by department name.
pub const UMBRELLA_ORGANIZATION: &str = "FIN-CLARIN";

/// Licence name in the source metadata → Fairdata license code.
const LICENSES: &[(&str, &str)] = &[
    ("CLARIN_PUB", "ClarinPUB-1.0"),
    ("CLARIN_ACA", "ClarinACA-1.0"),
    ("CLARIN_ACA-NC", "ClarinACA+NC-1.0"),
    ("CLARIN_RES", "ClarinRES-1.0"),
    ("other", "other"),
    ("underNegotiation", "undernegotiation"),
    ("proprietary", "other-closed"),
    ("CC-BY", "CC-BY-1.0"),
    ("CC-BY-ND", "CC-BY-ND-4.0"),
    ("CC-BY-NC", "CC-BY-NC-2.0"),
    ("CC-BY-SA", "CC-BY-SA-3.0"),
    ("CC-BY-NC-ND", "CC-BY-NC-ND-4.0"),
    ("CC-BY-NC-SA", "CC-BY-NC-SA-4.0"),
    ("CC-ZERO", "CC0-1.0"),
    ("ApacheLicence_2.0", "Apache-2.0"),
];

/// License codes belonging to the CLARIN ACA (academic use) family.
const ACA_LICENSE_CODES: &[&str] = &["ClarinACA-1.0", "ClarinACA+NC-1.0"];

/// Organization name → Fairdata organization code.
const ORGANIZATIONS: &[(&str, &str)] = &[
    ("Aalto University", "10076"),
    ("CSC — IT Center for Science Ltd", "09206320"),
    ("Centre for Applied Language Studies", "01906-213060"),
    ("National Library of Finland", "01901-H981"),
    ("South Eastern Finland University of Applied Sciences", "10118"),
    ("University of Eastern Finland", "10088"),
    ("University of Helsinki", "01901"),
    ("University of Jyväskylä", "01906"),
    ("University of Oulu", "01904"),
    ("University of Tampere", "10122"),
    ("University of Turku", "10089"),
];

/// ISO 639-2/B codes that differ from their ISO 639-3 counterpart.
const ISO639_2B_TO_3: &[(&str, &str)] = &[
    ("alb", "sqi"), ("arm", "hye"), ("baq", "eus"), ("bur", "mya"), ("chi", "zho"),
    ("cze", "ces"), ("dut", "nld"), ("fre", "fra"), ("geo", "kat"), ("ger", "deu"),
    ("gre", "ell"), ("ice", "isl"), ("mac", "mkd"), ("may", "msa"), ("per", "fas"),
    ("rum", "ron"), ("slo", "slk"), ("tib", "bod"), ("wel", "cym"),
];

/// ISO 639-5 collective codes that have no ISO 639-3 counterpart.
const ISO639_5_COLLECTIVE: &[&str] = &[
    "bat", "cel", "fiu", "gem", "gmq", "gmw", "iir", "inc", "ine", "ira", "roa", "sla",
    "smi", "syd", "trk", "urj", "zle", "zls", "zlw",
];

static LICENSE_INDEX: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| LICENSES.iter().copied().collect());

static ORGANIZATION_INDEX: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| ORGANIZATIONS.iter().copied().collect());

static ISO639_2B_INDEX: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| ISO639_2B_TO_3.iter().copied().collect());

static ISO639_5_INDEX: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| ISO639_5_COLLECTIVE.iter().copied().collect());

/// Map a licence name to its license URI (exact, case-sensitive).
///
/// # Examples
/// ```
/// use kielipankki_harvester::tables::license_uri;
///
/// assert_eq!(
///     license_uri("CC-BY").as_deref(),
///     Some("http://uri.suomi.fi/codelist/fairdata/license/code/CC-BY-1.0")
/// );
/// assert!(license_uri("cc-by").is_none());
/// ```
pub fn license_uri(licence_name: &str) -> Option<String> {
    LICENSE_INDEX
        .get(licence_name)
        .map(|code| format!("{LICENSE_URI_BASE}/{code}"))
}

/// Whether a license URI belongs to the CLARIN ACA family.
pub fn is_aca_license_uri(uri: &str) -> bool {
    uri.strip_prefix(LICENSE_URI_BASE)
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some_and(|code| ACA_LICENSE_CODES.contains(&code))
}

/// Map an organization name to its organization URI (exact, case-sensitive).
pub fn organization_uri(name: &str) -> Option<String> {
    ORGANIZATION_INDEX
        .get(name)
        .map(|code| format!("{ORGANIZATION_URI_BASE}/{code}"))
}

/// Translate a two-letter ISO 639-1 code to ISO 639-3.
pub fn iso639_3_from_alpha2(code: &str) -> Option<&'static str> {
    Language::from_639_1(code).map(|language| language.to_639_3())
}

/// Whether a three-letter code is a registered ISO 639-3 code.
pub fn is_iso639_3(code: &str) -> bool {
    Language::from_639_3(code).is_some()
}

/// Translate a bibliographic ISO 639-2/B code to ISO 639-3.
pub fn iso639_3_from_bibliographic(code: &str) -> Option<&'static str> {
    ISO639_2B_INDEX.get(code).copied()
}

/// Whether a three-letter code is an ISO 639-5 collective (family) code.
pub fn is_iso639_5_collective(code: &str) -> bool {
    ISO639_5_INDEX.contains(code)
}

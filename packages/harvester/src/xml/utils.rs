//! XML utility functions for navigating CMDI trees.
//!
//! CMDI records are namespaced, and the namespace differs between profile
//! versions, so every lookup here compares local names only.

use roxmltree::Node;

/// Namespace of the `xml:` prefix.
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Get the tag name without namespace prefix.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use kielipankki_harvester::xml::get_tag_name;
///
/// let xml = r#"<cmd:CMD xmlns:cmd="http://www.clarin.eu/cmd/"><cmd:Header/></cmd:CMD>"#;
/// let doc = Document::parse(xml).unwrap();
/// assert_eq!(get_tag_name(doc.root_element()), "CMD");
/// ```
pub fn get_tag_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Check if a node is an element with the given local name.
pub fn has_tag(node: Node<'_, '_>, tag: &str) -> bool {
    node.is_element() && get_tag_name(node) == tag
}

/// Find the first child element with the given tag name.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use kielipankki_harvester::xml::find_child;
///
/// let xml = r#"<root><child1/><child2/></root>"#;
/// let doc = Document::parse(xml).unwrap();
/// let root = doc.root_element();
///
/// assert!(find_child(root, "child1").is_some());
/// assert!(find_child(root, "missing").is_none());
/// ```
pub fn find_child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| has_tag(*child, tag))
}

/// Find all child elements with the given tag name.
pub fn find_children<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |child| has_tag(*child, tag))
}

/// Find a descendant element matching a path of tag names.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use kielipankki_harvester::xml::find_by_path;
///
/// let xml = r#"<CMD><Header><MdSelfLink>urn:nbn:fi:lb-1</MdSelfLink></Header></CMD>"#;
/// let doc = Document::parse(xml).unwrap();
///
/// let link = find_by_path(doc.root_element(), "Header/MdSelfLink");
/// assert_eq!(link.unwrap().text(), Some("urn:nbn:fi:lb-1"));
/// ```
pub fn find_by_path<'a, 'input>(node: Node<'a, 'input>, path: &str) -> Option<Node<'a, 'input>> {
    let mut current = node;
    for part in path.split('/') {
        current = find_child(current, part)?;
    }
    Some(current)
}

/// Find all elements reachable through a path of tag names.
///
/// Unlike [`find_by_path`], every matching child is followed at every step,
/// so `distributionInfo/licenceInfo/licence` yields the licence of every
/// licence info block.
pub fn find_all_by_path<'a, 'input>(node: Node<'a, 'input>, path: &str) -> Vec<Node<'a, 'input>> {
    let mut current = vec![node];
    for part in path.split('/') {
        current = current
            .into_iter()
            .flat_map(move |n| n.children().filter(move |child| has_tag(*child, part)))
            .collect();
    }
    current
}

/// Find the first descendant element (excluding `node` itself) with the given tag.
pub fn find_descendant<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
) -> Option<Node<'a, 'input>> {
    node.descendants()
        .skip(1)
        .find(|descendant| has_tag(*descendant, tag))
}

/// Find all descendant elements (excluding `node` itself) with the given tag.
pub fn find_descendants<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.descendants()
        .skip(1)
        .filter(move |descendant| has_tag(*descendant, tag))
}

/// Get the text content of a node, trimmed.
///
/// Returns an empty string if the node has no text.
pub fn get_text(node: Node<'_, '_>) -> String {
    node.text()
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Get the trimmed text of a node, or `None` when it is empty.
pub fn non_empty_text(node: Node<'_, '_>) -> Option<String> {
    Some(get_text(node)).filter(|text| !text.is_empty())
}

/// Get the `xml:lang` attribute of an element.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use kielipankki_harvester::xml::xml_lang;
///
/// let doc = Document::parse(r#"<resourceName xml:lang="fi">Aineisto</resourceName>"#).unwrap();
/// assert_eq!(xml_lang(doc.root_element()), Some("fi"));
/// ```
pub fn xml_lang<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    node.attribute((XML_NAMESPACE, "lang"))
}

use arbor::constants::XML_MAX_DEPTH;
use arbor::xml::{self, XmlError, XmlOptions};
use arbor::{Error, Key, Node, NodeKind, ops, path};

use crate::helpers::sample_tree;

const SAMPLE: &str = "<cfg><db><host>localhost</host><port>5432</port></db><debug>false</debug>\
<hosts>a</hosts><hosts>b</hosts><hosts>c</hosts></cfg>";

#[test]
fn built_tree_exports_and_reads_back() {
    let options = XmlOptions::default();
    assert_eq!(xml::to_xml(&sample_tree().view(), &options).unwrap(), SAMPLE);

    let imported = xml::from_xml(SAMPLE, 0, None, &options).unwrap();
    assert!(imported.is_name("cfg"));
    // Text stays text.
    assert!(ops::at(&imported, &path!["db", "port"]) == "5432");
    assert!(ops::at(&imported, &path!["hosts", 2usize]) == "c");
    assert_eq!(xml::to_xml(&imported.view(), &options).unwrap(), SAMPLE);
}

#[test]
fn imported_children_know_their_parents() {
    let root = xml::from_xml(SAMPLE, 0, None, &XmlOptions::default()).unwrap();
    let hosts = ops::node_get(&root, &path!["hosts"], None, false).unwrap();
    assert_eq!(hosts.kind(), NodeKind::Array);
    assert_eq!(hosts.len(), 3);
    assert_eq!(ops::path_of(&hosts).unwrap(), path!["hosts"]);
    assert!(ops::parents_check(&root, false).is_empty());
}

#[test]
fn explicit_uid_and_name_are_kept() {
    let root = xml::from_xml("<a/>", 987_654_321, Some("renamed"), &XmlOptions::default()).unwrap();
    assert_eq!(root.uid(), 987_654_321);
    assert!(root.is_name("renamed"));
    assert!(root.is_empty());
}

#[test]
fn pretty_output_reads_back() {
    let pretty = xml::to_xml(&sample_tree().view(), &XmlOptions::pretty()).unwrap();
    assert!(pretty.contains('\n'));
    let back = xml::from_xml(&pretty, 0, None, &XmlOptions::default()).unwrap();
    assert_eq!(xml::to_xml(&back.view(), &XmlOptions::default()).unwrap(), SAMPLE);
}

#[test]
fn mixed_content_joins_text() {
    let root = xml::from_xml("<p>one<b>x</b>two</p>", 0, None, &XmlOptions::default()).unwrap();
    assert!(root.get("#text") == "onetwo");
    assert!(root.get("b") == "x");
    assert_eq!(
        xml::to_xml(&root.view(), &XmlOptions::default()).unwrap(),
        "<p>onetwo<b>x</b></p>"
    );
}

#[test]
fn entities_and_cdata_are_decoded() {
    let text = "<m><c><![CDATA[<raw>]]></c><t>a &amp; b</t></m>";
    let root = xml::from_xml(text, 0, None, &XmlOptions::default()).unwrap();
    assert!(root.get("t") == "a & b");
    assert!(root.get("c") == "<raw>");
    assert_eq!(
        xml::to_xml(&root.view(), &XmlOptions::default()).unwrap(),
        "<m><c>&lt;raw&gt;</c><t>a &amp; b</t></m>"
    );
}

#[test]
fn aliases_and_nested_arrays_are_written_inline() {
    let root = Node::named(NodeKind::Map, "r");
    let shared = Node::new(NodeKind::Array);
    shared.insert(Key::end(), 7i64);
    root.set("link", shared.view());

    let outer = Node::new(NodeKind::Array);
    let inner = Node::new(NodeKind::Array);
    inner.insert(Key::end(), 1i64);
    inner.insert(Key::end(), 2i64);
    outer.insert(Key::end(), &inner);
    outer.insert(Key::end(), 3i64);
    root.set("m", &outer);

    assert_eq!(
        xml::to_xml(&root.view(), &XmlOptions::default()).unwrap(),
        "<r><link>7</link><m><item>1</item><item>2</item></m><m>3</m></r>"
    );
}

#[test]
fn tombstones_are_not_exported() {
    let root = sample_tree();
    root.erase("debug");
    let text = xml::to_xml(&root.view(), &XmlOptions::default()).unwrap();
    assert!(!text.contains("debug"));
}

#[test]
fn error_classification() {
    let options = XmlOptions::default();
    let err = xml::from_xml("<a><b></a>", 0, None, &options).unwrap_err();
    assert!(err.is_parse_error());
    assert_eq!(err.module(), "xml");

    let deep = "<a>".repeat(XML_MAX_DEPTH + 1) + &"</a>".repeat(XML_MAX_DEPTH + 1);
    let err = xml::from_xml(&deep, 0, None, &options).unwrap_err();
    assert!(matches!(err, Error::Xml(XmlError::DepthExceeded { .. })));
    assert!(!err.is_parse_error());
}

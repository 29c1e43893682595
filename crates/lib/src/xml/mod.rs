//! XML import and export of whole trees.
//!
//! Every element becomes a map node named by its tag. Attributes are stored
//! as strings under their name with [`XmlOptions::attribute_prefix`] in
//! front, inner text under [`XmlOptions::text_name`]. An element holding only
//! text collapses into a string under its tag, and sibling elements sharing a
//! tag are gathered into an array under that tag, in document order. An empty
//! element becomes an empty map.
//!
//! Export reverses the mapping. Arrays under a map key are written as one
//! element per item, all with that key as tag; an array reached any other way
//! (a root array, or an array inside an array) gets [`ITEM_TAG`] children.
//! Scalars are written as text, `Empty` and `Null` as empty elements.
//!
//! Import keeps text as strings. Maps are ordered by key, so interleaved
//! siblings with different tags come back grouped by tag.
//!
//! ```
//! use arbor::xml::{XmlOptions, from_xml, to_xml};
//!
//! let options = XmlOptions::default();
//! let text = r#"<cfg env="prod"><port>5432</port></cfg>"#;
//! let root = from_xml(text, 0, None, &options).unwrap();
//! assert!(root.is_name("cfg"));
//! assert!(root.get("-env") == "prod");
//! assert!(root.get("port") == "5432");
//! assert_eq!(to_xml(&root.view(), &options).unwrap(), text);
//! ```

mod errors;

pub use errors::XmlError;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use tracing::{debug, trace};

use crate::constants::{XML_ATTRIBUTE_PREFIX, XML_MAX_DEPTH, XML_TEXT_NAME};
use crate::container::CopyAction;
use crate::key::Key;
use crate::node::{Node, NodeKind, NodeRef, NodeView};
use crate::value::Value;
use crate::Result;

/// Tag for an unnamed root.
pub const UNNAMED_TAG: &str = "noname";

/// Tag for the items of an array that has no key of its own.
pub const ITEM_TAG: &str = "item";

/// Output layout for [`to_xml`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum XmlFormat {
    #[default]
    Compact,
    Pretty,
}

/// How tree keys map onto XML attributes and text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlOptions {
    pub format: XmlFormat,
    /// Map keys starting with this are attributes. Empty disables attributes.
    pub attribute_prefix: String,
    pub text_name: String,
}

impl Default for XmlOptions {
    fn default() -> Self {
        Self {
            format: XmlFormat::Compact,
            attribute_prefix: XML_ATTRIBUTE_PREFIX.to_string(),
            text_name: XML_TEXT_NAME.to_string(),
        }
    }
}

impl XmlOptions {
    pub fn pretty() -> Self {
        Self {
            format: XmlFormat::Pretty,
            ..Self::default()
        }
    }

    fn attribute<'a>(&self, name: &'a str) -> Option<&'a str> {
        if self.attribute_prefix.is_empty() {
            return None;
        }
        name.strip_prefix(self.attribute_prefix.as_str())
            .filter(|stripped| !stripped.is_empty())
    }
}

// ==========================
// EXPORT
// ==========================

type XmlWriter = Writer<Vec<u8>>;

/// Serialize the tree under `view`. The root element is named after the node,
/// or [`UNNAMED_TAG`].
pub fn to_xml(view: &NodeView, options: &XmlOptions) -> Result<String> {
    let mut writer = match options.format {
        XmlFormat::Compact => Writer::new(Vec::new()),
        XmlFormat::Pretty => Writer::new_with_indent(Vec::new(), b' ', 2),
    };
    let tag = view
        .name()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNNAMED_TAG.to_string());
    write_node(&mut writer, options, &tag, view, 0)?;
    String::from_utf8(writer.into_inner()).map_err(|err| {
        XmlError::Write {
            reason: err.to_string(),
        }
        .into()
    })
}

fn emit(writer: &mut XmlWriter, event: Event<'_>) -> Result<()> {
    writer.write_event(event).map_err(|err| {
        XmlError::Write {
            reason: err.to_string(),
        }
        .into()
    })
}

fn write_node(writer: &mut XmlWriter, options: &XmlOptions, tag: &str, view: &NodeView, depth: usize) -> Result<()> {
    if depth > XML_MAX_DEPTH {
        return Err(XmlError::DepthExceeded { depth: XML_MAX_DEPTH }.into());
    }
    let entries = view.bulk_get_all(&Key::Empty, |_, _| CopyAction::Take);

    let mut start = BytesStart::new(tag);
    let mut text = String::new();
    let mut children: Vec<(String, Value)> = Vec::new();
    match view.kind() {
        NodeKind::Map => {
            for (key, value) in entries {
                let Some(name) = key.as_name() else {
                    continue;
                };
                if value.is_node() {
                    children.push((name.to_string(), value.into_value()));
                } else if let Some(attribute) = options.attribute(name) {
                    start.push_attribute((attribute, scalar_text(&value).as_str()));
                } else if name == options.text_name {
                    text.push_str(&scalar_text(&value));
                } else {
                    children.push((name.to_string(), value.into_value()));
                }
            }
        }
        NodeKind::Array => {
            children.extend(entries.into_iter().map(|(_, value)| (ITEM_TAG.to_string(), value.into_value())));
        }
    }

    if text.is_empty() && children.is_empty() {
        return emit(writer, Event::Empty(start));
    }
    emit(writer, Event::Start(start))?;
    if !text.is_empty() {
        emit(writer, Event::Text(BytesText::new(&text)))?;
    }
    for (child_tag, value) in &children {
        write_value(writer, options, child_tag, value, depth + 1)?;
    }
    emit(writer, Event::End(BytesEnd::new(tag)))
}

fn write_value(writer: &mut XmlWriter, options: &XmlOptions, tag: &str, value: &Value, depth: usize) -> Result<()> {
    match value.as_node_view() {
        Some(view) if view.kind() == NodeKind::Array => {
            for (_, item) in view.bulk_get_all(&Key::Empty, |_, _| CopyAction::Take) {
                match item.as_node_view() {
                    Some(inner) => write_node(writer, options, tag, &inner, depth + 1)?,
                    None => write_text_element(writer, tag, &scalar_text(&item))?,
                }
            }
            Ok(())
        }
        Some(view) => write_node(writer, options, tag, &view, depth),
        None => write_text_element(writer, tag, &scalar_text(value)),
    }
}

fn write_text_element(writer: &mut XmlWriter, tag: &str, text: &str) -> Result<()> {
    if text.is_empty() {
        return emit(writer, Event::Empty(BytesStart::new(tag)));
    }
    emit(writer, Event::Start(BytesStart::new(tag)))?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    emit(writer, Event::End(BytesEnd::new(tag)))
}

/// Text form of a scalar. Doubles keep full precision.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::Double(d) => d.to_string(),
        other => other.to_string_or(""),
    }
}

// ==========================
// IMPORT
// ==========================

#[derive(Debug, Default)]
struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

/// Build a tree from XML text. The root element becomes the returned map,
/// named `name` (or its tag), with id `uid` (0 for the next process-wide id).
pub fn from_xml(text: &str, uid: u64, name: Option<&str>, options: &XmlOptions) -> Result<NodeRef> {
    let element = parse(text)?;
    let root_name = name.map_or_else(|| element.tag.clone(), str::to_string);
    let root = Node::create(NodeKind::Map, Some(&root_name), uid);
    fill(&root, element, options);
    trace!(node = root.uid(), "imported XML document");
    Ok(root)
}

fn parse_error(position: u64, err: impl std::fmt::Display) -> crate::Error {
    XmlError::Parse {
        position,
        reason: err.to_string(),
    }
    .into()
}

fn structure_error(reason: &str) -> crate::Error {
    XmlError::Structure {
        reason: reason.to_string(),
    }
    .into()
}

fn parse(text: &str) -> Result<Element> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    loop {
        let position = reader.buffer_position() as u64;
        let event = reader.read_event().map_err(|err| parse_error(position, err))?;
        match event {
            Event::Start(start) | Event::Empty(start) if root.is_some() => {
                debug!(tag = %String::from_utf8_lossy(start.local_name().as_ref()), "second root element");
                return Err(structure_error("more than one root element"));
            }
            Event::Start(start) => {
                if stack.len() >= XML_MAX_DEPTH {
                    return Err(XmlError::DepthExceeded { depth: XML_MAX_DEPTH }.into());
                }
                stack.push(open(&start, position)?);
            }
            Event::Empty(start) => {
                let element = open(&start, position)?;
                close(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| structure_error("unbalanced end tag"))?;
                close(&mut stack, &mut root, element);
            }
            Event::Text(content) => {
                let content = content.unescape().map_err(|err| parse_error(position, err))?;
                append_text(&mut stack, &content)?;
            }
            Event::CData(content) => {
                append_text(&mut stack, &String::from_utf8_lossy(&content))?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(structure_error("unclosed element at end of input"));
    }
    root.ok_or_else(|| structure_error("no root element"))
}

fn open(start: &BytesStart<'_>, position: u64) -> Result<Element> {
    let mut element = Element {
        tag: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        ..Element::default()
    };
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|err| parse_error(position, err))?;
        if attribute.key.as_namespace_binding().is_some() {
            continue;
        }
        let name = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
        let value = attribute.unescape_value().map_err(|err| parse_error(position, err))?;
        element.attributes.push((name, value.into_owned()));
    }
    Ok(element)
}

fn close(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

fn append_text(stack: &mut [Element], content: &str) -> Result<()> {
    match stack.last_mut() {
        Some(element) => {
            element.text.push_str(content);
            Ok(())
        }
        None => Err(structure_error("text outside the root element")),
    }
}

fn element_value(element: Element, options: &XmlOptions) -> Value {
    if element.attributes.is_empty() && element.children.is_empty() && !element.text.is_empty() {
        return Value::from(element.text);
    }
    let node = Node::new(NodeKind::Map);
    fill(&node, element, options);
    Value::Node(node)
}

fn fill(node: &NodeRef, element: Element, options: &XmlOptions) {
    for (name, value) in element.attributes {
        let key = format!("{}{}", options.attribute_prefix, name);
        store(node, Key::from(key), Value::from(value));
    }
    if !element.text.is_empty() {
        store(node, Key::from(options.text_name.as_str()), Value::from(element.text));
    }

    let mut groups: Vec<(String, Vec<Element>)> = Vec::new();
    for child in element.children {
        match groups.iter_mut().find(|(tag, _)| *tag == child.tag) {
            Some((_, members)) => members.push(child),
            None => groups.push((child.tag.clone(), vec![child])),
        }
    }
    for (tag, mut members) in groups {
        let value = if members.len() == 1 {
            element_value(members.remove(0), options)
        } else {
            let array = Node::new(NodeKind::Array);
            for member in members {
                store(&array, Key::end(), element_value(member, options));
            }
            Value::Node(array)
        };
        store(node, Key::from(tag), value);
    }
}

fn store(node: &NodeRef, key: Key, value: Value) {
    if !node.insert(key.clone(), value).succeeded {
        debug!(node = node.uid(), %key, "import insert refused");
    }
}

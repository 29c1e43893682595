//! JSON import and export of whole trees.
//!
//! Maps become objects, arrays become arrays, `Empty` and `Null` become
//! `null`, and aliased nodes are written inline. Only finite doubles can be
//! exported.
//!
//! ```
//! use arbor::json::{JsonFormat, from_json, to_json};
//!
//! let root = from_json(r#"{"db":{"port":5432},"tags":["a","b"]}"#, 0, Some("cfg")).unwrap();
//! assert!(root.is_name("cfg"));
//! assert_eq!(
//!     to_json(&root.view(), JsonFormat::Compact).unwrap(),
//!     r#"{"db":{"port":5432},"tags":["a","b"]}"#
//! );
//! ```

mod errors;

pub use errors::JsonError;

use serde_json::{Map, Number};
use tracing::{debug, trace};

use crate::constants::JSON_MAX_DEPTH;
use crate::container::CopyAction;
use crate::key::Key;
use crate::node::{Node, NodeKind, NodeRef, NodeView};
use crate::value::Value;
use crate::Result;

/// Output layout for [`to_json`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonFormat {
    #[default]
    Compact,
    Pretty,
}

/// Serialize the tree under `view`.
pub fn to_json(view: &NodeView, format: JsonFormat) -> Result<String> {
    let document = export_node(view, 0)?;
    let text = match format {
        JsonFormat::Compact => serde_json::to_string(&document)?,
        JsonFormat::Pretty => serde_json::to_string_pretty(&document)?,
    };
    Ok(text)
}

/// Convert a single value, descending into nodes.
pub fn value_to_json(value: &Value) -> Result<serde_json::Value> {
    export_value(value, 0)
}

fn export_node(view: &NodeView, depth: usize) -> Result<serde_json::Value> {
    if depth > JSON_MAX_DEPTH {
        return Err(JsonError::DepthExceeded { depth: JSON_MAX_DEPTH }.into());
    }
    let entries = view.bulk_get_all(&Key::Empty, |_, _| CopyAction::Take);
    match view.kind() {
        NodeKind::Map => {
            let mut object = Map::new();
            for (key, value) in entries {
                let Some(name) = key.as_name() else {
                    continue;
                };
                object.insert(name.to_string(), export_value(&value, depth + 1)?);
            }
            Ok(serde_json::Value::Object(object))
        }
        NodeKind::Array => {
            let items = entries
                .iter()
                .map(|(_, value)| export_value(value, depth + 1))
                .collect::<Result<Vec<_>>>()?;
            Ok(serde_json::Value::Array(items))
        }
    }
}

fn export_value(value: &Value, depth: usize) -> Result<serde_json::Value> {
    Ok(match value {
        Value::Empty | Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(n) => serde_json::Value::from(*n),
        Value::UInt(n) => serde_json::Value::from(*n),
        Value::Double(d) => match Number::from_f64(*d) {
            Some(number) => serde_json::Value::Number(number),
            None => {
                return Err(JsonError::UnsupportedValue {
                    reason: format!("non-finite number {d}"),
                }
                .into());
            }
        },
        Value::Str(s) => serde_json::Value::String(s.to_string()),
        Value::Alias(view) => export_node(view, depth)?,
        Value::Node(node) => export_node(&node.view(), depth)?,
    })
}

/// Build a tree from JSON text. The top level must be an object or an array;
/// it becomes the returned root, named `name`, with id `uid` (0 for the next
/// process-wide id).
pub fn from_json(text: &str, uid: u64, name: Option<&str>) -> Result<NodeRef> {
    let document: serde_json::Value =
        serde_json::from_str(text).map_err(|err| JsonError::Parse { reason: err.to_string() })?;
    from_json_value(&document, uid, name)
}

/// [`from_json`] for an already parsed document.
pub fn from_json_value(document: &serde_json::Value, uid: u64, name: Option<&str>) -> Result<NodeRef> {
    let kind = match document {
        serde_json::Value::Object(_) => NodeKind::Map,
        serde_json::Value::Array(_) => NodeKind::Array,
        other => {
            return Err(JsonError::NotAContainer {
                found: json_type_name(other).to_string(),
            }
            .into());
        }
    };
    let root = Node::create(kind, name, uid);
    import_into(&root, document, 0)?;
    trace!(node = root.uid(), "imported JSON document");
    Ok(root)
}

/// Convert a JSON scalar; containers become new nodes.
pub fn value_from_json(value: &serde_json::Value) -> Result<Value> {
    import_value(value, 0)
}

fn import_into(node: &NodeRef, document: &serde_json::Value, depth: usize) -> Result<()> {
    if depth > JSON_MAX_DEPTH {
        return Err(JsonError::DepthExceeded { depth: JSON_MAX_DEPTH }.into());
    }
    match document {
        serde_json::Value::Object(object) => {
            for (name, item) in object {
                if name.is_empty() {
                    return Err(JsonError::UnsupportedValue {
                        reason: "empty object key".to_string(),
                    }
                    .into());
                }
                let value = import_value(item, depth + 1)?;
                if !node.insert(Key::from(name.as_str()), value).succeeded {
                    debug!(node = node.uid(), key = name.as_str(), "import insert refused");
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                let value = import_value(item, depth + 1)?;
                if !node.insert(Key::end(), value).succeeded {
                    debug!(node = node.uid(), "import append refused");
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn import_value(value: &serde_json::Value, depth: usize) -> Result<Value> {
    Ok(match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(number) => {
            if let Some(n) = number.as_i64() {
                Value::Int(n)
            } else if let Some(n) = number.as_u64() {
                Value::UInt(n)
            } else {
                Value::Double(number.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => Value::from(s.as_str()),
        serde_json::Value::Object(_) => {
            let child = Node::new(NodeKind::Map);
            import_into(&child, value, depth)?;
            Value::Node(child)
        }
        serde_json::Value::Array(_) => {
            let child = Node::new(NodeKind::Array);
            import_into(&child, value, depth)?;
            Value::Node(child)
        }
    })
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

//! Set one value and write the document back.

use std::fs;

use arbor::json::{self, JsonFormat};
use arbor::{Value, ops};

use super::{CommandResult, load, parse_path};
use crate::cli::{Format, SetArgs};

/// JSON scalars keep their type; anything else is stored as text.
fn parse_value(text: &str) -> Value {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(parsed) if !parsed.is_object() && !parsed.is_array() => {
            json::value_from_json(&parsed).unwrap_or_else(|_| Value::from(text))
        }
        _ => Value::from(text),
    }
}

/// Run the set command
pub fn run(args: &SetArgs, format: Format) -> CommandResult {
    let root = load(&args.file)?;
    let path = parse_path(&args.path)?;
    let value = parse_value(&args.value);

    let (changed, previous) = ops::set_at(&root, &path, value);
    if !changed && !previous.is_set() {
        eprintln!("Cannot set '{path}'");
        return Ok(1);
    }

    let target = args.output.as_ref().unwrap_or(&args.file);
    fs::write(target, json::to_json(&root.view(), JsonFormat::Pretty)? + "\n")?;
    tracing::info!(path = %path, changed, file = %target.display(), "value written");

    match format {
        Format::Human => {
            if changed {
                println!("Set {path}");
            } else {
                println!("Unchanged {path}");
            }
        }
        Format::Json => {
            let output = serde_json::json!({
                "path": path.to_string(),
                "changed": changed,
                "previous": json::value_to_json(previous.value())?,
            });
            println!("{}", serde_json::to_string(&output)?);
        }
    }
    Ok(0)
}

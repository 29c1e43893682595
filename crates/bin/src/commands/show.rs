//! Show a document or one of its subtrees.

use arbor::json::{self, JsonFormat};
use arbor::ops;

use super::{CommandResult, load, parse_path};
use crate::cli::{Format, ShowArgs};
use crate::output::{describe, key_label, print_table};

/// Run the show command
pub fn run(args: &ShowArgs, format: Format) -> CommandResult {
    let root = load(&args.file)?;
    let path = match &args.path {
        Some(text) => parse_path(text)?,
        None => arbor::Path::new(),
    };

    let Some(view) = ops::node_view_get(&root.view(), &path) else {
        // A scalar (or nothing) at the path.
        let value = ops::view_at(&root.view(), &path);
        if !value.is_set() {
            eprintln!("Nothing at '{path}'");
            return Ok(1);
        }
        println!("{}", json::value_to_json(value.value())?);
        return Ok(0);
    };

    match format {
        Format::Json => {
            let layout = if args.pretty {
                JsonFormat::Pretty
            } else {
                JsonFormat::Compact
            };
            println!("{}", json::to_json(&view, layout)?);
        }
        Format::Human => {
            let rows: Vec<Vec<String>> = view
                .entries()
                .iter()
                .map(|(key, value)| vec![key_label(key), value.type_name().to_string(), describe(value)])
                .collect();
            if rows.is_empty() {
                println!("(empty {})", view.kind());
            }
            print_table(&["KEY", "TYPE", "VALUE"], &rows);
        }
    }
    Ok(0)
}

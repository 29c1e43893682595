//! Print one value.

use arbor::json;
use arbor::ops;

use super::{CommandResult, load, parse_path};
use crate::cli::{Format, GetArgs};
use crate::output::describe;

/// Run the get command
pub fn run(args: &GetArgs, format: Format) -> CommandResult {
    let root = load(&args.file)?;
    let path = parse_path(&args.path)?;
    let value = ops::view_at(&root.view(), &path);
    if !value.is_set() {
        eprintln!("Nothing at '{path}'");
        return Ok(1);
    }

    match format {
        Format::Human => println!("{}", describe(value.value())),
        Format::Json => {
            let output = serde_json::json!({
                "path": path.to_string(),
                "type": value.type_name(),
                "value": json::value_to_json(value.value())?,
            });
            println!("{}", serde_json::to_string(&output)?);
        }
    }
    Ok(0)
}

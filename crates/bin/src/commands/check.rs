//! Parent-pointer consistency check.

use arbor::ops;

use super::{CommandResult, load};
use crate::cli::{CheckArgs, Format};
use crate::output::{key_label, print_table};

/// Run the check command. Exits with 1 when a problem was found.
pub fn run(args: &CheckArgs, format: Format) -> CommandResult {
    let root = load(&args.file)?;
    let problems = ops::parents_check(&root, true);

    match format {
        Format::Human => {
            if problems.is_empty() {
                println!("OK: every node is held by its parent.");
            }
            let rows: Vec<Vec<String>> = problems
                .iter()
                .map(|p| vec![p.holder.uid().to_string(), key_label(&p.key), p.child.uid().to_string()])
                .collect();
            print_table(&["HOLDER", "KEY", "CHILD"], &rows);
        }
        Format::Json => {
            let entries: Vec<_> = problems
                .iter()
                .map(|p| {
                    serde_json::json!({
                        "holder": p.holder.uid(),
                        "key": p.key.to_string(),
                        "child": p.child.uid(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string(&entries)?);
        }
    }

    Ok(if problems.is_empty() { 0 } else { 1 })
}

//! Compare two documents.

use std::cmp::Ordering;

use arbor::json;
use arbor::ops;

use super::{CommandResult, load};
use crate::cli::{DiffArgs, Format};
use crate::output::{describe, print_table};

struct Difference {
    path: String,
    left: arbor::Value,
    right: arbor::Value,
}

/// Run the diff command. Exits with 1 when the documents differ.
pub fn run(args: &DiffArgs, format: Format) -> CommandResult {
    let left = load(&args.left)?;
    let right = load(&args.right)?;

    let mut differences = Vec::new();
    let ord = ops::compare(&left.view(), &right.view(), true, &mut |node, key, l, r| {
        let path = node.path().unwrap_or_default().join(key.clone()).to_string();
        differences.push(Difference {
            path,
            left: l.clone(),
            right: r.clone(),
        });
        false
    });

    // Different root kinds never reach the callback.
    if differences.is_empty() && ord != Ordering::Equal {
        differences.push(Difference {
            path: String::new(),
            left: arbor::Value::from(left.view()),
            right: arbor::Value::from(right.view()),
        });
    }

    match format {
        Format::Human => {
            if differences.is_empty() {
                println!("No differences.");
            }
            let rows: Vec<Vec<String>> = differences
                .iter()
                .map(|d| vec![d.path.clone(), describe(&d.left), describe(&d.right)])
                .collect();
            print_table(&["PATH", "LEFT", "RIGHT"], &rows);
        }
        Format::Json => {
            let mut entries = Vec::with_capacity(differences.len());
            for d in &differences {
                entries.push(serde_json::json!({
                    "path": d.path,
                    "left": json::value_to_json(&d.left)?,
                    "right": json::value_to_json(&d.right)?,
                }));
            }
            println!("{}", serde_json::to_string(&entries)?);
        }
    }

    Ok(if differences.is_empty() { 0 } else { 1 })
}

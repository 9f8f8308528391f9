use std::io::BufRead;

use log::debug;

use super::error::Result;
use super::lines::{is_record_delimiter, LineSource};

/// One `> <NAME>` data item of an SD record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataItem {
    pub name: String,
    /// Value lines joined with `\n`.
    pub value: String,
}

/// Field name of a data header line such as `>  <MW>  (1)`. A header
/// without angle brackets uses the rest of the line.
fn header_name(line: &str) -> String {
    let rest = &line[1..];
    match (rest.find('<'), rest.rfind('>')) {
        (Some(open), Some(close)) if close > open => rest[open + 1..close].to_string(),
        _ => rest.trim().to_string(),
    }
}

/// Reads data items up to and including the record delimiter.
pub(crate) fn read_data_items<R: BufRead>(src: &mut LineSource<R>) -> Result<Vec<DataItem>> {
    let mut items = Vec::new();
    let mut current: Option<(String, Vec<String>)> = None;

    while let Some(line) = src.next_line()? {
        if is_record_delimiter(&line) {
            break;
        }
        match current.take() {
            Some((name, values)) if line.is_empty() => items.push(DataItem {
                name,
                value: values.join("\n"),
            }),
            Some((name, mut values)) => {
                values.push(line);
                current = Some((name, values));
            }
            None if line.starts_with('>') => current = Some((header_name(&line), Vec::new())),
            None => {
                if !line.trim().is_empty() {
                    debug!("line {}: text outside a data item ignored", src.line_number());
                }
            }
        }
    }
    if let Some((name, values)) = current {
        items.push(DataItem {
            name,
            value: values.join("\n"),
        });
    }
    Ok(items)
}

//! Identifier list loading

use std::collections::HashSet;
use std::path::Path;

use crate::error::InputError;
use crate::record::AppId;

/// Read identifiers from the `field` column of a tab- or semicolon-delimited
/// file with a header row.
///
/// A single-column file whose header is not `field` is read as bare ids
/// (header line included, if numeric). Unparseable cells are skipped and
/// duplicates dropped, keeping first-occurrence order.
pub fn read_identifiers(path: &Path, field: &str) -> Result<Vec<AppId>, InputError> {
    if !path.is_file() {
        return Err(InputError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let ids = parse_identifiers(&content, field)?;
    if ids.is_empty() {
        return Err(InputError::Empty(path.to_path_buf()));
    }
    log::info!("{}: {} identifiers", path.display(), ids.len());
    Ok(ids)
}

/// Parse file content; see [`read_identifiers`]
pub fn parse_identifiers(content: &str, field: &str) -> Result<Vec<AppId>, InputError> {
    let mut lines = content.lines().filter(|l| !l.trim().is_empty());
    let Some(header) = lines.next() else {
        return Ok(Vec::new());
    };
    let delimiter = detect_delimiter(header);
    let columns: Vec<&str> = header.split(delimiter).map(clean_cell).collect();

    let (column, header_is_data) = match columns.iter().position(|c| *c == field) {
        Some(idx) => (idx, false),
        None if columns.len() == 1 => (0, true),
        None => {
            return Err(InputError::MissingField {
                field: field.to_string(),
                header: header.to_string(),
            });
        }
    };
    log::debug!("Reading column {column} (delimiter {delimiter:?})");

    let data_lines = header_is_data.then_some(header).into_iter().chain(lines);
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for (lineno, line) in data_lines.enumerate() {
        let cell = line.split(delimiter).nth(column).map(clean_cell).unwrap_or("");
        match cell.parse::<AppId>() {
            Ok(0) | Err(_) => {
                if !(header_is_data && lineno == 0) {
                    log::warn!("Skipping invalid identifier '{cell}'");
                }
            }
            Ok(id) => {
                if seen.insert(id) {
                    ids.push(id);
                } else {
                    log::debug!("Dropping duplicate identifier {id}");
                }
            }
        }
    }
    Ok(ids)
}

fn detect_delimiter(header: &str) -> char {
    if header.contains('\t') {
        '\t'
    } else if header.contains(';') {
        ';'
    } else {
        '\t'
    }
}

fn clean_cell(cell: &str) -> &str {
    cell.trim().trim_matches('"')
}

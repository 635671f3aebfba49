use crate::engine::error::CelloError;
use std::collections::BTreeMap;
use std::path::Path;

/// Per-node rows of a Cello result table, keyed by the node's netlist label.
///
/// Cello writes its logic and activity tables as header-less CSV files where
/// the first column is the node label and the remaining columns hold one value
/// per input state of the truth table.
pub type NodeTable<T> = BTreeMap<String, Vec<T>>;

/// Reads a node table and converts each value cell with `parse_cell`.
///
/// # Arguments
///
/// * `path` - Path to the CSV file.
/// * `parse_cell` - Converts one trimmed cell; returns `None` for invalid input.
///
/// # Errors
///
/// Returns [`CelloError::Parse`] if the CSV is malformed or a cell cannot be
/// converted, naming the offending node and column.
pub fn read_node_table<T>(
    path: &Path,
    parse_cell: impl Fn(&str) -> Option<T>,
) -> Result<NodeTable<T>, CelloError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    let mut table = NodeTable::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, e))?;
        let Some(label) = record.get(0).filter(|l| !l.is_empty()) else {
            continue;
        };

        let values = record
            .iter()
            .enumerate()
            .skip(1)
            .map(|(column, cell)| {
                parse_cell(cell).ok_or_else(|| {
                    CelloError::parse(
                        path,
                        format!("invalid value '{cell}' for node '{label}' in column {column}"),
                    )
                })
            })
            .collect::<Result<Vec<T>, _>>()?;

        table.insert(label.to_string(), values);
    }

    if table.is_empty() {
        return Err(CelloError::parse(path, "table contains no nodes"));
    }
    Ok(table)
}

pub fn parse_logic_cell(cell: &str) -> Option<bool> {
    match cell {
        "1" => Some(true),
        "0" => Some(false),
        _ if cell.eq_ignore_ascii_case("true") => Some(true),
        _ if cell.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

pub fn parse_activity_cell(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn csv_error(path: &Path, err: csv::Error) -> CelloError {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => CelloError::io(path, source),
        _ => CelloError::parse(path, message),
    }
}

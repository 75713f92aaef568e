// CSV loaders for per-run inputs: raw-material availability and demand.
//
// Headers are matched case-insensitively after trimming. Availability takes
// `size`/`calibre` and `units`/`salmones`. Demand is either simple
// (`size`, `pieces`) or detailed (`product`, `format`, `size`, `boxes`).

use crate::domain::{
    Availability, DemandRow, DemandTable, ParameterStore, PlanningError, SizeRef,
};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use std::path::Path;
use tracing::info;

type Result<T> = std::result::Result<T, PlanningError>;

const SIZE_COLUMNS: [&str; 2] = ["size", "calibre"];
const UNIT_COLUMNS: [&str; 2] = ["units", "salmones"];

pub fn load_availability(params: &ParameterStore, path: impl AsRef<Path>) -> Result<Availability> {
    let path = path.as_ref();
    let availability = read_availability(params, open(path)?)?;
    info!(path = %path.display(), total_units = availability.total(), "availability loaded");
    Ok(availability)
}

pub fn read_availability(params: &ParameterStore, input: impl Read) -> Result<Availability> {
    let (headers, records) = read_table(input)?;
    let size_col = column(&headers, &SIZE_COLUMNS).ok_or_else(|| missing_column("size"))?;
    let units_col = column(&headers, &UNIT_COLUMNS).ok_or_else(|| missing_column("units"))?;

    let mut rows = Vec::with_capacity(records.len());
    for (line, record) in numbered(&records) {
        let label = field(record, size_col);
        let raw = field(record, units_col);
        let units = raw.parse::<i64>().map_err(|_| {
            PlanningError::InputValidation(format!(
                "Row {}: raw-unit count '{}' is not an integer",
                line, raw
            ))
        })?;
        rows.push((label.to_string(), units));
    }
    Availability::from_rows(params, rows)
}

pub fn load_demand(params: &ParameterStore, path: impl AsRef<Path>) -> Result<DemandTable> {
    let path = path.as_ref();
    let demand = read_demand(params, open(path)?)?;
    info!(
        path = %path.display(),
        detailed = demand.has_item_limits(),
        "demand loaded"
    );
    Ok(demand)
}

pub fn read_demand(params: &ParameterStore, input: impl Read) -> Result<DemandTable> {
    let (headers, records) = read_table(input)?;

    let detailed = ["product", "format", "size", "boxes"].map(|name| column(&headers, &[name]));
    if let [Some(product), Some(format), Some(size), Some(boxes)] = detailed {
        let mut rows = Vec::with_capacity(records.len());
        for (line, record) in numbered(&records) {
            rows.push(DemandRow::Detailed {
                product: field(record, product).to_string(),
                format: field(record, format).to_string(),
                size: SizeRef::parse(field(record, size)),
                boxes: number(record, boxes, line, "boxes")?,
            });
        }
        return DemandTable::from_rows(params, rows);
    }

    if let (Some(size), Some(pieces)) =
        (column(&headers, &["size"]), column(&headers, &["pieces"]))
    {
        let mut rows = Vec::with_capacity(records.len());
        for (line, record) in numbered(&records) {
            rows.push(DemandRow::Simple {
                size: field(record, size).to_string(),
                pieces: number(record, pieces, line, "pieces")?,
            });
        }
        return DemandTable::from_rows(params, rows);
    }

    Err(PlanningError::InputValidation(format!(
        "Unrecognized demand schema: columns [{}]; expected (size, pieces) or \
         (product, format, size, boxes)",
        headers.join(", ")
    )))
}

fn open(path: &Path) -> Result<std::fs::File> {
    std::fs::File::open(path).map_err(|e| {
        PlanningError::InputValidation(format!("Cannot open '{}': {}", path.display(), e))
    })
}

/// Lower-cased headers and all records. A file without data rows is an error.
fn read_table(input: impl Read) -> Result<(Vec<String>, Vec<StringRecord>)> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    let records = reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(csv_error)?;
    if records.is_empty() {
        return Err(PlanningError::InputValidation(
            "Input file has no data rows".to_string(),
        ));
    }
    Ok((headers, records))
}

/// Records paired with their 1-based line number in the file (header is line 1).
fn numbered(records: &[StringRecord]) -> impl Iterator<Item = (usize, &StringRecord)> + '_ {
    records.iter().enumerate().map(|(i, r)| (i + 2, r))
}

fn column(headers: &[String], names: &[&str]) -> Option<usize> {
    headers.iter().position(|h| names.contains(&h.as_str()))
}

fn field(record: &StringRecord, index: usize) -> &str {
    record.get(index).unwrap_or("").trim()
}

fn number(record: &StringRecord, index: usize, line: usize, what: &str) -> Result<f64> {
    let raw = field(record, index);
    raw.parse::<f64>().map_err(|_| {
        PlanningError::InputValidation(format!("Row {}: {} '{}' is not a number", line, what, raw))
    })
}

fn missing_column(name: &str) -> PlanningError {
    PlanningError::InputValidation(format!("Missing column '{}'", name))
}

fn csv_error(e: csv::Error) -> PlanningError {
    PlanningError::InputValidation(format!("Malformed CSV: {}", e))
}

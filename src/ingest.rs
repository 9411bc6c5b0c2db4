use std::collections::{BTreeMap, HashSet};

use csv::{ReaderBuilder, StringRecord};
use tracing::{info, warn};

use crate::error::{IngestError, IngestResult};
use crate::models::{parse_decimal, Dataset, Record, SkippedRow, Value};
use crate::schema::{FieldKind, Schema};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    pub delimiter: u8,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

pub fn parse_csv(text: &str, schema: &Schema) -> IngestResult<Dataset> {
    parse_csv_with(text, schema, IngestOptions::default())
}

pub fn parse_csv_with(
    text: &str,
    schema: &Schema,
    options: IngestOptions,
) -> IngestResult<Dataset> {
    let text = text.trim();
    if text.is_empty() {
        return Err(IngestError::Empty);
    }
    if text.lines().take(2).count() < 2 {
        return Err(IngestError::MissingDataRows);
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .delimiter(options.delimiter)
        .from_reader(text.as_bytes());
    let mut rows = reader.records();

    let header = match rows.next() {
        Some(Ok(header)) => header,
        Some(Err(err)) => return Err(IngestError::MalformedHeader(err.to_string())),
        None => return Err(IngestError::MissingDataRows),
    };
    let columns = parse_header(&header)?;

    let mut records = Vec::new();
    let mut skipped = Vec::new();

    for (index, row) in rows.enumerate() {
        let fallback_line = index as u64 + 2;
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                let line = err.position().map_or(fallback_line, |pos| pos.line());
                warn!(line, error = %err, "skipping unreadable row");
                skipped.push(SkippedRow {
                    line,
                    reason: err.to_string(),
                });
                continue;
            }
        };
        let line = row.position().map_or(fallback_line, |pos| pos.line());

        if is_blank(&row) {
            continue;
        }

        if row.len() != columns.len() {
            warn!(
                line,
                values = row.len(),
                expected = columns.len(),
                "skipping row with wrong value count"
            );
            skipped.push(SkippedRow {
                line,
                reason: format!("{} values but expected {}", row.len(), columns.len()),
            });
            continue;
        }

        let pairs = columns.iter().map(String::as_str).zip(row.iter());
        records.push(typed_record(schema, pairs));
    }

    info!(
        records = records.len(),
        skipped = skipped.len(),
        "loaded customer records"
    );

    Ok(Dataset {
        columns,
        records,
        skipped,
    })
}

fn parse_header(header: &StringRecord) -> IngestResult<Vec<String>> {
    let columns: Vec<String> = header.iter().map(clean_field).collect();

    if let Some(position) = columns.iter().position(|c| c.is_empty()) {
        return Err(IngestError::MalformedHeader(format!(
            "column {} has no name",
            position + 1
        )));
    }

    let mut seen = HashSet::new();
    for column in &columns {
        if !seen.insert(column.as_str()) {
            return Err(IngestError::MalformedHeader(format!(
                "duplicate column {column}"
            )));
        }
    }

    Ok(columns)
}

pub fn typed_record<'a>(
    schema: &Schema,
    pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Record {
    let mut fields = BTreeMap::new();

    for (column, raw) in pairs {
        fields.insert(column.to_string(), coerce(schema, column, &clean_field(raw)));
    }

    for declared in schema.declared_fields() {
        if !fields.contains_key(declared) {
            fields.insert(declared.to_string(), coerce(schema, declared, ""));
        }
    }

    Record::new(fields)
}

pub fn coerce(schema: &Schema, field: &str, raw: &str) -> Value {
    match schema.kind_of(field) {
        FieldKind::Numeric => Value::Number(parse_decimal(raw).unwrap_or(0.0)),
        FieldKind::Text => Value::Text(raw.to_string()),
    }
}

// Quotes are dropped wherever they appear; they never group delimiters.
fn clean_field(raw: &str) -> String {
    raw.trim().replace('"', "").trim().to_string()
}

fn is_blank(row: &StringRecord) -> bool {
    row.len() <= 1 && row.iter().all(|value| value.trim().is_empty())
}

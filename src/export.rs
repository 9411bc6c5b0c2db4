use std::borrow::Borrow;
use std::io;

use serde_json::{Map, Value as Json};

use crate::models::{Record, Value};

pub fn to_json_row(record: &Record, columns: &[String]) -> Json {
    let mut row = Map::new();
    for column in columns {
        let value = match record.get(column) {
            Some(Value::Number(n)) => {
                serde_json::Number::from_f64(*n).map_or(Json::Null, Json::Number)
            }
            Some(Value::Text(s)) => Json::String(s.clone()),
            None => Json::Null,
        };
        row.insert(column.clone(), value);
    }
    Json::Object(row)
}

pub fn to_json_rows<R: Borrow<Record>>(records: &[R], columns: &[String]) -> Json {
    Json::Array(
        records
            .iter()
            .map(|record| {
                let record: &Record = record.borrow();
                to_json_row(record, columns)
            })
            .collect(),
    )
}

pub fn write_csv<W, R>(writer: W, records: &[R], columns: &[String]) -> csv::Result<()>
where
    W: io::Write,
    R: Borrow<Record>,
{
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(columns)?;
    for record in records {
        let record: &Record = record.borrow();
        out.write_record(
            columns
                .iter()
                .map(|column| record.get(column).map(|v| v.to_string()).unwrap_or_default()),
        )?;
    }
    out.flush()?;
    Ok(())
}

pub fn render_table<R: Borrow<Record>>(records: &[R], columns: &[String]) -> String {
    let cells: Vec<Vec<String>> = records
        .iter()
        .map(|record| {
            let record: &Record = record.borrow();
            columns
                .iter()
                .map(|column| record.get(column).map(|v| v.to_string()).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(column.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(cells.len() + 2);
    lines.push(pad_row(columns.iter().map(String::as_str), &widths));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in &cells {
        lines.push(pad_row(row.iter().map(String::as_str), &widths));
    }
    lines.join("\n")
}

fn pad_row<'a>(values: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    values
        .zip(widths)
        .map(|(value, &width)| format!("{value:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::parse_csv;
    use crate::schema::Schema;

    fn records() -> (Vec<Record>, Vec<String>) {
        let schema = Schema::new("company_id", "health_score").with_numeric(&["health_score"]);
        let dataset = parse_csv(
            "company_id,company_name,health_score\nCOMP-001,Acme Corp,85\nCOMP-002,TechStart,45.5\n",
            &schema,
        )
        .unwrap();
        (dataset.records, dataset.columns)
    }

    #[test]
    fn json_rows_project_columns_with_types() {
        let (records, columns) = records();
        let json = to_json_rows(&records, &columns);
        assert_eq!(
            json,
            serde_json::json!([
                {"company_id": "COMP-001", "company_name": "Acme Corp", "health_score": 85.0},
                {"company_id": "COMP-002", "company_name": "TechStart", "health_score": 45.5}
            ])
        );
    }

    #[test]
    fn csv_export_writes_header_and_rows() {
        let (records, columns) = records();
        let mut buf = Vec::new();
        write_csv(&mut buf, &records, &columns).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "company_id,company_name,health_score\nCOMP-001,Acme Corp,85\nCOMP-002,TechStart,45.5\n"
        );
    }

    #[test]
    fn table_pads_columns() {
        let (records, columns) = records();
        let table = render_table(&records, &columns);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "company_id  company_name  health_score");
        assert_eq!(lines[1], "----------  ------------  ------------");
        assert_eq!(lines[2], "COMP-001    Acme Corp     85");
        assert_eq!(lines[3], "COMP-002    TechStart     45.5");
    }
}

use std::collections::HashMap;

use tracing::{info, warn};

use crate::models::{Dataset, Record, Value};

pub fn left_join(base: &Dataset, other: &Dataset, key: &str, columns: &[String]) -> Dataset {
    let columns: Vec<&String> = columns
        .iter()
        .filter(|column| {
            let present = other.columns.contains(*column);
            if !present {
                warn!(column = %column, "join column missing from second file, skipping");
            }
            present
        })
        .collect();

    let mut lookup: HashMap<String, &Record> = HashMap::new();
    let mut duplicates = 0usize;
    for record in &other.records {
        let Some(id) = record.get(key).map(|v| v.to_string()) else {
            continue;
        };
        if lookup.contains_key(&id) {
            duplicates += 1;
            continue;
        }
        lookup.insert(id, record);
    }
    if duplicates > 0 {
        warn!(duplicates, key, "join source repeats keys, keeping first match");
    }

    let mut matched = 0usize;
    let records = base
        .records
        .iter()
        .map(|record| {
            let found = record
                .get(key)
                .and_then(|id| lookup.get(&id.to_string()).copied());
            if found.is_some() {
                matched += 1;
            }
            record.extended(columns.iter().map(|&column| {
                let value = found
                    .and_then(|other| other.get(column).cloned())
                    .unwrap_or_else(|| Value::Text(String::new()));
                (column.clone(), value)
            }))
        })
        .collect::<Vec<_>>();

    info!(
        records = records.len(),
        matched,
        columns = columns.len(),
        "joined additional columns"
    );

    let mut joined_columns = base.columns.clone();
    for column in columns {
        if !joined_columns.contains(column) {
            joined_columns.push(column.clone());
        }
    }

    Dataset {
        columns: joined_columns,
        records,
        skipped: base.skipped.clone(),
    }
}

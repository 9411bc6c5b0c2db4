use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{IngestError, IngestResult};
use crate::ingest::{parse_csv_with, typed_record, IngestOptions};
use crate::models::Dataset;
use crate::schema::Schema;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Csv {
        path: PathBuf,
        options: IngestOptions,
    },
    Sample,
}

impl DataSource {
    pub fn csv(path: impl Into<PathBuf>) -> Self {
        DataSource::Csv {
            path: path.into(),
            options: IngestOptions::default(),
        }
    }

    pub async fn load(&self, schema: &Schema) -> IngestResult<Dataset> {
        match self {
            DataSource::Csv { path, options } => load_csv_file(path, schema, *options).await,
            DataSource::Sample => Ok(sample_dataset(schema)),
        }
    }

    pub async fn load_state(&self, schema: &Schema) -> DataState {
        match self.load(schema).await {
            Ok(dataset) => DataState::Loaded(dataset),
            Err(err) => {
                warn!(error = %err, "no customer data available");
                DataState::Unavailable(err)
            }
        }
    }
}

pub async fn load_csv_file(
    path: &Path,
    schema: &Schema,
    options: IngestOptions,
) -> IngestResult<Dataset> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    info!(path = %path.display(), bytes = text.len(), "read customer CSV");
    parse_csv_with(&text, schema, options)
}

#[derive(Debug)]
pub enum DataState {
    Loaded(Dataset),
    Unavailable(IngestError),
}

impl DataState {
    pub fn is_available(&self) -> bool {
        matches!(self, DataState::Loaded(_))
    }

    pub fn error(&self) -> Option<&IngestError> {
        match self {
            DataState::Loaded(_) => None,
            DataState::Unavailable(err) => Some(err),
        }
    }

    pub fn into_dataset(self) -> Dataset {
        match self {
            DataState::Loaded(dataset) => dataset,
            DataState::Unavailable(_) => Dataset::empty(),
        }
    }
}

const SAMPLE_COLUMNS: &[&str] = &[
    "company_id",
    "company_name",
    "health_score",
    "recent_usage",
    "usage_trend",
    "peak_usage",
    "support_tickets",
    "last_login_days",
    "feature_adoption",
    "contract_value",
];

type SampleRow = (&'static str, &'static str, [f64; 8]);

const SAMPLE_ROWS: &[SampleRow] = &[
    ("COMP-001", "Acme Corp", [85.0, 92.0, 78.0, 95.0, 2.0, 1.0, 88.0, 50000.0]),
    ("COMP-002", "TechStart Inc", [45.0, 35.0, 42.0, 68.0, 8.0, 14.0, 52.0, 25000.0]),
    ("COMP-003", "Global Solutions", [72.0, 68.0, 75.0, 82.0, 3.0, 2.0, 71.0, 75000.0]),
    ("COMP-004", "Innovation Labs", [28.0, 15.0, 22.0, 45.0, 12.0, 28.0, 31.0, 15000.0]),
    ("COMP-005", "Enterprise Systems", [91.0, 89.0, 94.0, 97.0, 1.0, 0.0, 93.0, 120000.0]),
    ("COMP-006", "Digital Dynamics", [58.0, 52.0, 61.0, 73.0, 5.0, 7.0, 64.0, 35000.0]),
];

pub fn sample_dataset(schema: &Schema) -> Dataset {
    let records = SAMPLE_ROWS
        .iter()
        .map(|(id, name, metrics)| {
            let raw: Vec<String> = [id.to_string(), name.to_string()]
                .into_iter()
                .chain(metrics.iter().map(|m| m.to_string()))
                .collect();
            let pairs = SAMPLE_COLUMNS
                .iter()
                .copied()
                .zip(raw.iter().map(String::as_str));
            typed_record(schema, pairs)
        })
        .collect();

    Dataset {
        columns: SAMPLE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        records,
        skipped: Vec::new(),
    }
}

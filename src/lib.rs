pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod filter;
pub mod ingest;
pub mod join;
pub mod models;
pub mod report;
pub mod risk;
pub mod schema;
pub mod search;
pub mod sort;
pub mod source;

pub use dashboard::{run_query, Dashboard, View};
pub use error::{DashboardError, IngestError};
pub use filter::{ClauseField, FilterClause, FilterSet, Operator};
pub use models::{Dataset, Record, Value};
pub use risk::{BucketCounts, HealthBucket};
pub use schema::Schema;
pub use sort::{SortDirection, SortSpec};
pub use source::{DataSource, DataState};

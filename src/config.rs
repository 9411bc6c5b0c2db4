//! Command line arguments, with environment fallbacks for the data source.

use std::path::PathBuf;

use anyhow::bail;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::dashboard::Dashboard;
use crate::filter::FilterClause;
use crate::ingest::IngestOptions;
use crate::source::DataSource;

#[derive(Parser, Debug, Clone)]
#[command(name = "customer-health")]
#[command(about = "Search, filter and bucket customer health scores", long_about = None)]
pub struct Cli {
    /// CSV file with one customer per row; the built-in sample table when unset
    #[arg(long, env = "CHD_DATA", global = true)]
    pub data: Option<PathBuf>,

    /// JSON schema declaring numeric columns; the customer health layout when unset
    #[arg(long, env = "CHD_SCHEMA", global = true)]
    pub schema: Option<PathBuf>,

    /// Field delimiter of the data file
    #[arg(long, default_value_t = ',', global = true)]
    pub delimiter: char,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn data_source(&self) -> anyhow::Result<DataSource> {
        Ok(match &self.data {
            Some(path) => DataSource::Csv {
                path: path.clone(),
                options: IngestOptions {
                    delimiter: delimiter_byte(self.delimiter)?,
                },
            },
            None => DataSource::Sample,
        })
    }
}

pub fn delimiter_byte(delimiter: char) -> anyhow::Result<u8> {
    if !delimiter.is_ascii() || delimiter == '"' || delimiter == '\n' {
        bail!("unsupported delimiter {delimiter:?}");
    }
    Ok(delimiter as u8)
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Count visible customers per health bucket
    Summary {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Print the visible customers
    Query {
        #[command(flatten)]
        query: QueryArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        query: QueryArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        /// Number of lowest-scoring customers to list
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// List every customer identifier
    Ids,
    /// Join columns from a second CSV by customer identifier
    Merge {
        #[arg(long = "with")]
        with: PathBuf,
        #[arg(long, default_value_t = '#')]
        with_delimiter: char,
        #[arg(long, value_delimiter = ',', required = true)]
        columns: Vec<String>,
        /// Output path; standard output when unset
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Case-insensitive match on identifier and name
    #[arg(long, default_value = "")]
    pub search: String,

    /// Numeric condition such as `support_tickets>5`; repeat to AND them
    #[arg(long = "filter", value_parser = parse_filter)]
    pub filters: Vec<FilterClause>,

    /// Column to sort by; the health score when unset
    #[arg(long)]
    pub sort: Option<String>,

    #[arg(long)]
    pub desc: bool,
}

impl QueryArgs {
    pub fn apply(&self, dashboard: &mut Dashboard) {
        dashboard.set_search_term(&self.search);
        for clause in &self.filters {
            dashboard.push_filter_clause(clause.clone());
        }
        if let Some(field) = &self.sort {
            if dashboard.sort().field != *field {
                dashboard.set_sort_field(field);
            }
        }
        if self.desc {
            dashboard.toggle_sort_direction();
        }
    }
}

fn parse_filter(raw: &str) -> Result<FilterClause, String> {
    FilterClause::parse(raw).map_err(|err| err.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

use std::io::Write;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use customer_health::config::{delimiter_byte, Cli, Commands, OutputFormat};
use customer_health::export::{render_table, to_json_rows, write_csv};
use customer_health::ingest::IngestOptions;
use customer_health::join::left_join;
use customer_health::report::build_report;
use customer_health::{Dashboard, DataSource, Schema};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("customer_health={}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let schema = match &cli.schema {
        Some(path) => Schema::load(path)
            .await
            .with_context(|| format!("failed to load schema from {}", path.display()))?,
        None => Schema::customer_health(),
    };

    let state = cli.data_source()?.load_state(&schema).await;
    if let Some(err) = state.error() {
        eprintln!("No data available: {err}");
        if err.is_retryable() {
            eprintln!("Check the data path and run the command again.");
        }
    }
    let dataset = state.into_dataset();
    let mut dashboard = Dashboard::new(schema, dataset);

    match cli.command {
        Commands::Summary { query } => {
            query.apply(&mut dashboard);
            let counts = dashboard.counts();
            println!(
                "Customers: {} of {}",
                counts.total(),
                dashboard.dataset().len()
            );
            println!("- Critical: {}", counts.critical);
            println!("- At Risk: {}", counts.at_risk);
            println!("- Healthy: {}", counts.healthy);
            let skipped = dashboard.dataset().skipped_count();
            if skipped > 0 {
                println!("Skipped {skipped} malformed rows.");
            }
        }
        Commands::Query {
            query,
            format,
            limit,
        } => {
            query.apply(&mut dashboard);
            let view = dashboard.visible();
            if view.is_empty() {
                println!("No customers match the current view.");
                return Ok(());
            }
            let shown = &view.records[..limit.unwrap_or(view.len()).min(view.len())];
            let columns = &dashboard.dataset().columns;
            match format {
                OutputFormat::Table => {
                    println!("{}", render_table(shown, columns));
                    println!(
                        "{} shown, {} critical, {} at risk, {} healthy",
                        shown.len(),
                        view.counts.critical,
                        view.counts.at_risk,
                        view.counts.healthy
                    );
                }
                OutputFormat::Json => {
                    let body = serde_json::json!({
                        "counts": view.counts,
                        "records": to_json_rows(shown, columns),
                    });
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                OutputFormat::Csv => {
                    write_csv(std::io::stdout().lock(), shown, columns)?;
                }
            }
        }
        Commands::Report { query, out, top } => {
            query.apply(&mut dashboard);
            let report = build_report(&dashboard, Utc::now(), top);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Ids => {
            let schema = dashboard.schema();
            let ids: Vec<&str> = dashboard.dataset().identifiers(&schema.id_field).collect();
            println!("Total company IDs extracted: {}", ids.len());
            println!(
                "First 10 IDs: {}",
                ids.iter().take(10).copied().collect::<Vec<_>>().join(", ")
            );
            println!("Full list as array: [{}]", ids.join(", "));
        }
        Commands::Merge {
            with,
            with_delimiter,
            columns,
            out,
        } => {
            let other_source = DataSource::Csv {
                path: with.clone(),
                options: IngestOptions {
                    delimiter: delimiter_byte(with_delimiter)?,
                },
            };
            let other = other_source
                .load(dashboard.schema())
                .await
                .with_context(|| format!("failed to load {}", with.display()))?;
            let merged = left_join(
                dashboard.dataset(),
                &other,
                &dashboard.schema().id_field,
                &columns,
            );
            match out {
                Some(path) => {
                    let file = std::fs::File::create(&path)
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    write_csv(file, &merged.records, &merged.columns)?;
                    println!("Merged {} records into {}.", merged.len(), path.display());
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    write_csv(&mut stdout, &merged.records, &merged.columns)?;
                    stdout.flush()?;
                }
            }
        }
    }

    Ok(())
}

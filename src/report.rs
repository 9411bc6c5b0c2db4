use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::dashboard::Dashboard;
use crate::models::Record;
use crate::risk::{score_of, HealthBucket, CRITICAL_BELOW, HEALTHY_FROM};
use crate::schema::Schema;
use crate::sort::{sort_records, SortSpec};

const CONTRACT_VALUE_FIELD: &str = "contract_value";

/// Whole US dollars with thousands separators, e.g. `$120,000`.
pub fn format_currency(value: f64) -> String {
    let rounded = value.abs().round() as u64;
    let digits = rounded.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0.0 && rounded > 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

pub fn display_name<'a>(record: &'a Record, schema: &Schema) -> Option<&'a str> {
    schema
        .search_fields
        .iter()
        .filter(|field| **field != schema.id_field)
        .filter_map(|field| record.text(field))
        .find(|name| !name.is_empty())
}

pub fn build_report(dashboard: &Dashboard, generated_at: DateTime<Utc>, top: usize) -> String {
    let schema = dashboard.schema();
    let view = dashboard.visible();
    let counts = view.counts;

    let mut output = String::new();

    let _ = writeln!(output, "# Customer Health Report");
    let _ = writeln!(
        output,
        "Generated {} over {} of {} customers",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        view.len(),
        dashboard.dataset().len()
    );

    let term = dashboard.search_term().trim();
    if !term.is_empty() {
        let _ = writeln!(output, "Search: \"{term}\"");
    }
    let active: Vec<String> = dashboard
        .filters()
        .clauses()
        .iter()
        .filter(|clause| clause.is_complete())
        .map(|clause| clause.to_string())
        .collect();
    if !active.is_empty() {
        let _ = writeln!(output, "Filters: {}", active.join(" AND "));
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Health Mix");
    let _ = writeln!(output, "- Total customers: {}", counts.total());
    let _ = writeln!(
        output,
        "- {} (score < {}): {}",
        HealthBucket::Critical,
        CRITICAL_BELOW,
        counts.critical
    );
    let _ = writeln!(
        output,
        "- {} ({} to {}): {}",
        HealthBucket::AtRisk,
        CRITICAL_BELOW,
        HEALTHY_FROM,
        counts.at_risk
    );
    let _ = writeln!(
        output,
        "- {} (score >= {}): {}",
        HealthBucket::Healthy,
        HEALTHY_FROM,
        counts.healthy
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Lowest Health Scores");

    if view.is_empty() {
        let _ = writeln!(output, "No customers match the current view.");
    } else {
        let lowest = sort_records(&view.records, &SortSpec::ascending(&schema.score_field));
        for record in lowest.iter().take(top) {
            let score = score_of(record, &schema.score_field);
            let id = record.text(&schema.id_field).unwrap_or("?");
            let mut line = match display_name(record, schema) {
                Some(name) => format!("- {id} {name}: score {score} ({})", HealthBucket::from_score(score)),
                None => format!("- {id}: score {score} ({})", HealthBucket::from_score(score)),
            };
            if let Some(value) = record.number(CONTRACT_VALUE_FIELD).filter(|v| *v > 0.0) {
                let _ = write!(line, ", contract {}", format_currency(value));
            }
            let _ = writeln!(output, "{line}");
        }
    }

    let skipped = &dashboard.dataset().skipped;
    if !skipped.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Skipped Rows");
        for row in skipped {
            let _ = writeln!(output, "- line {}: {}", row.line, row.reason);
        }
    }

    output
}

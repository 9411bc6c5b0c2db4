use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IngestError, IngestResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Numeric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub id_field: String,
    pub score_field: String,
    #[serde(default)]
    pub search_fields: Vec<String>,
    #[serde(default)]
    pub numeric_fields: BTreeSet<String>,
    #[serde(default)]
    pub text_fields: BTreeSet<String>,
}

const CUSTOMER_HEALTH_NUMERIC: &[&str] = &[
    "tenure_days",
    "is_new_customer",
    "is_mature_customer",
    "days_to_contract_end",
    "contract_expiring_soon",
    "baseline_weekly_avg",
    "max_weekly_activity",
    "activities_w_1",
    "activities_w_2",
    "activities_w_3",
    "activities_w_4",
    "total_4weeks",
    "avg_weekly_4weeks",
    "week_1_vs_2_change",
    "week_2_vs_3_change",
    "week_3_vs_4_change",
    "activity_correlation",
    "current_vs_baseline_ratio",
    "current_vs_max_ratio",
    "weeks_with_activity",
    "weeks_with_zero_activity",
    "consecutive_zero_weeks",
    "activity_consistency",
    "total_activities",
    "activities_last_30d",
    "activities_last_7d",
    "activities_last_3d",
    "unique_tasks_30d",
    "unique_days_active_30d",
    "unique_days_active_7d",
    "days_since_last_activity",
    "activities_per_day_30d",
    "activities_per_active_day_30d",
    "strong_decline",
    "moderate_decline",
    "stable_trend",
    "growing_trend",
    "no_recent_activity",
    "sporadic_user",
    "inactive_user",
    "dormant_user",
    "below_baseline",
    "well_below_max",
    "highly_inconsistent",
    "zero_activity_period",
    "churn_probability",
    "health_score",
    "num_contacts",
    // usage overview columns
    "recent_usage",
    "usage_trend",
    "peak_usage",
    "support_tickets",
    "last_login_days",
    "feature_adoption",
    "contract_value",
];

const CUSTOMER_HEALTH_TEXT: &[&str] = &["company", "company_name", "baseline_type", "risk_level"];

impl Default for Schema {
    fn default() -> Self {
        Self::customer_health()
    }
}

impl Schema {
    pub fn new(id_field: &str, score_field: &str) -> Self {
        Self {
            id_field: id_field.to_string(),
            score_field: score_field.to_string(),
            search_fields: vec![id_field.to_string()],
            numeric_fields: BTreeSet::new(),
            text_fields: BTreeSet::new(),
        }
    }

    pub fn customer_health() -> Self {
        Self::new("company_id", "health_score")
            .with_search_fields(&["company_id", "company_name", "company"])
            .with_numeric(CUSTOMER_HEALTH_NUMERIC)
            .with_text(CUSTOMER_HEALTH_TEXT)
    }

    pub fn with_numeric(mut self, fields: &[&str]) -> Self {
        self.numeric_fields
            .extend(fields.iter().map(|f| f.to_string()));
        self
    }

    pub fn with_text(mut self, fields: &[&str]) -> Self {
        self.text_fields.extend(fields.iter().map(|f| f.to_string()));
        self
    }

    pub fn with_search_fields(mut self, fields: &[&str]) -> Self {
        self.search_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn kind_of(&self, field: &str) -> FieldKind {
        if field != self.id_field && self.numeric_fields.contains(field) {
            FieldKind::Numeric
        } else {
            FieldKind::Text
        }
    }

    pub fn is_numeric(&self, field: &str) -> bool {
        self.kind_of(field) == FieldKind::Numeric
    }

    pub fn declared_fields(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.id_field.as_str())
            .chain(self.numeric_fields.iter().map(String::as_str))
            .chain(self.text_fields.iter().map(String::as_str))
    }

    pub fn validate(&self) -> IngestResult<()> {
        if self.id_field.trim().is_empty() {
            return Err(IngestError::Schema("id_field must not be empty".into()));
        }
        if self.score_field.trim().is_empty() {
            return Err(IngestError::Schema("score_field must not be empty".into()));
        }
        if let Some(field) = self.numeric_fields.intersection(&self.text_fields).next() {
            return Err(IngestError::Schema(format!(
                "{field} is declared both numeric and text"
            )));
        }
        Ok(())
    }

    pub fn from_json(raw: &str) -> IngestResult<Self> {
        let schema: Schema =
            serde_json::from_str(raw).map_err(|err| IngestError::Schema(err.to_string()))?;
        schema.validate()?;
        Ok(schema)
    }

    pub async fn load(path: &Path) -> IngestResult<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| IngestError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json(&raw)
    }
}

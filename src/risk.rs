use std::borrow::Borrow;
use std::fmt;

use serde::Serialize;

use crate::models::Record;

pub const CRITICAL_BELOW: f64 = 40.0;
pub const HEALTHY_FROM: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthBucket {
    Critical,
    AtRisk,
    Healthy,
}

impl HealthBucket {
    pub fn from_score(score: f64) -> Self {
        if score >= HEALTHY_FROM {
            HealthBucket::Healthy
        } else if score >= CRITICAL_BELOW {
            HealthBucket::AtRisk
        } else {
            HealthBucket::Critical
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HealthBucket::Critical => "Critical",
            HealthBucket::AtRisk => "At Risk",
            HealthBucket::Healthy => "Healthy",
        }
    }
}

impl fmt::Display for HealthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn score_of(record: &Record, score_field: &str) -> f64 {
    record
        .get(score_field)
        .and_then(|value| value.to_decimal())
        .unwrap_or(0.0)
}

pub fn bucket_of(record: &Record, score_field: &str) -> HealthBucket {
    HealthBucket::from_score(score_of(record, score_field))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketCounts {
    pub critical: usize,
    pub at_risk: usize,
    pub healthy: usize,
}

impl BucketCounts {
    pub fn total(&self) -> usize {
        self.critical + self.at_risk + self.healthy
    }

    pub fn get(&self, bucket: HealthBucket) -> usize {
        match bucket {
            HealthBucket::Critical => self.critical,
            HealthBucket::AtRisk => self.at_risk,
            HealthBucket::Healthy => self.healthy,
        }
    }

    fn record(&mut self, bucket: HealthBucket) {
        match bucket {
            HealthBucket::Critical => self.critical += 1,
            HealthBucket::AtRisk => self.at_risk += 1,
            HealthBucket::Healthy => self.healthy += 1,
        }
    }
}

pub fn aggregate<R: Borrow<Record>>(records: &[R], score_field: &str) -> BucketCounts {
    let mut counts = BucketCounts::default();
    for record in records {
        counts.record(bucket_of(record.borrow(), score_field));
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::parse_csv;
    use crate::schema::Schema;

    fn scored(scores: &[&str]) -> Vec<Record> {
        let mut csv = String::from("company_id,health_score\n");
        for (i, score) in scores.iter().enumerate() {
            csv.push_str(&format!("COMP-{i:03},{score}\n"));
        }
        let schema = Schema::new("company_id", "health_score").with_numeric(&["health_score"]);
        parse_csv(&csv, &schema).unwrap().records
    }

    #[test]
    fn buckets_follow_thresholds() {
        assert_eq!(HealthBucket::from_score(0.0), HealthBucket::Critical);
        assert_eq!(HealthBucket::from_score(39.99), HealthBucket::Critical);
        assert_eq!(HealthBucket::from_score(40.0), HealthBucket::AtRisk);
        assert_eq!(HealthBucket::from_score(69.9), HealthBucket::AtRisk);
        assert_eq!(HealthBucket::from_score(70.0), HealthBucket::Healthy);
        assert_eq!(HealthBucket::from_score(100.0), HealthBucket::Healthy);
    }

    #[test]
    fn labels_match_dashboard_wording() {
        assert_eq!(HealthBucket::AtRisk.label(), "At Risk");
        assert_eq!(HealthBucket::Critical.to_string(), "Critical");
    }

    #[test]
    fn one_of_each_bucket() {
        let records = scored(&["85", "45", "28"]);
        let counts = aggregate(&records, "health_score");
        assert_eq!(
            counts,
            BucketCounts {
                critical: 1,
                at_risk: 1,
                healthy: 1
            }
        );
    }

    #[test]
    fn counts_sum_to_record_count() {
        let records = scored(&["85", "45", "28", "garbage", "70", "40", "39.5"]);
        let counts = aggregate(&records, "health_score");
        assert_eq!(counts.total(), records.len());
        assert_eq!(counts.get(HealthBucket::Critical), 3);
    }

    #[test]
    fn missing_score_field_counts_as_critical() {
        let records = scored(&["85"]);
        let counts = aggregate(&records, "not_there");
        assert_eq!(counts.critical, 1);
    }

    #[test]
    fn empty_input_has_zero_counts() {
        let records: Vec<&Record> = Vec::new();
        assert_eq!(aggregate(&records, "health_score").total(), 0);
    }

    #[test]
    fn serializes_with_dashboard_keys() {
        let counts = BucketCounts {
            critical: 1,
            at_risk: 2,
            healthy: 3,
        };
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{"critical":1,"atRisk":2,"healthy":3}"#);
    }
}

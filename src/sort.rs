use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;

use icu_collator::{Collator, CollatorOptions, Strength};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{Record, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("asc"),
            SortDirection::Desc => f.write_str("desc"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: SortDirection::Asc,
        }
    }

    pub fn select(&mut self, field: &str) {
        if self.field == field {
            self.toggle();
        } else {
            *self = Self::ascending(field);
        }
    }

    pub fn toggle(&mut self) {
        self.direction = self.direction.toggled();
    }
}

pub struct TextOrder {
    collator: Option<Collator>,
}

impl TextOrder {
    pub fn new() -> Self {
        let mut options = CollatorOptions::new();
        options.strength = Some(Strength::Tertiary);
        let collator = match Collator::try_new(&Default::default(), options) {
            Ok(collator) => Some(collator),
            Err(err) => {
                warn!(error = %err, "text collation unavailable, sorting by code point");
                None
            }
        };
        Self { collator }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => a.cmp(b),
        }
    }
}

impl Default for TextOrder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn compare_values(text: &TextOrder, a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Text(a)), Some(Value::Text(b))) => text.compare(a, b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            a.partial_cmp(b).unwrap_or(Ordering::Equal)
        }
        _ => Ordering::Equal,
    }
}

pub fn sort_records<R>(records: &[R], spec: &SortSpec) -> Vec<R>
where
    R: Borrow<Record> + Clone,
{
    let text = TextOrder::new();
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| {
        let a: &Record = a.borrow();
        let b: &Record = b.borrow();
        spec.direction
            .apply(compare_values(&text, a.get(&spec.field), b.get(&spec.field)))
    });
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::parse_csv;
    use crate::schema::Schema;

    fn records() -> Vec<Record> {
        let schema = Schema::new("company_id", "health_score")
            .with_numeric(&["health_score", "support_tickets"]);
        parse_csv(
            "company_id,company_name,health_score,support_tickets\n\
             COMP-001,Acme,85,2\n\
             COMP-002,TechStart,45,8\n\
             COMP-004,Innovation,28,2\n\
             COMP-005,acme labs,91,8\n",
            &schema,
        )
        .unwrap()
        .records
    }

    fn column(records: &[Record], field: &str) -> Vec<String> {
        records
            .iter()
            .map(|r| r.get(field).map(|v| v.to_string()).unwrap_or_default())
            .collect()
    }

    #[test]
    fn sorts_numbers_numerically() {
        let records: Vec<Record> = records().into_iter().take(3).collect();
        let sorted = sort_records(&records, &SortSpec::ascending("health_score"));
        assert_eq!(column(&sorted, "health_score"), vec!["28", "45", "85"]);
    }

    #[test]
    fn sorts_text_case_insensitively() {
        let records = records();
        let sorted = sort_records(&records, &SortSpec::ascending("company_name"));
        assert_eq!(
            column(&sorted, "company_name"),
            vec!["Acme", "acme labs", "Innovation", "TechStart"]
        );
    }

    #[test]
    fn accented_names_sort_with_their_base_letter() {
        let schema = Schema::new("company_id", "health_score");
        let records = parse_csv(
            "company_id,company_name\nC1,Zeta AG\nC2,Ärzte GmbH\nC3,Bosch\nC4,Öko Strom\n",
            &schema,
        )
        .unwrap()
        .records;
        let sorted = sort_records(&records, &SortSpec::ascending("company_name"));
        assert_eq!(
            column(&sorted, "company_name"),
            vec!["Ärzte GmbH", "Bosch", "Öko Strom", "Zeta AG"]
        );
    }

    #[test]
    fn lowercase_sorts_before_uppercase_on_ties() {
        let text = TextOrder::new();
        assert_eq!(text.compare("a", "A"), Ordering::Less);
        assert_eq!(text.compare("acme", "Acme"), Ordering::Less);
        assert_eq!(text.compare("Bosch", "bosch ag"), Ordering::Less);
    }

    #[test]
    fn equal_keys_keep_input_order_in_both_directions() {
        let records = records();
        let mut spec = SortSpec::ascending("support_tickets");
        let asc = sort_records(&records, &spec);
        assert_eq!(
            column(&asc, "company_id"),
            vec!["COMP-001", "COMP-004", "COMP-002", "COMP-005"]
        );

        spec.toggle();
        let desc = sort_records(&records, &spec);
        assert_eq!(
            column(&desc, "company_id"),
            vec!["COMP-002", "COMP-005", "COMP-001", "COMP-004"]
        );
    }

    #[test]
    fn mixed_or_missing_values_do_not_reorder() {
        let records = records();
        let sorted = sort_records(&records, &SortSpec::ascending("not_a_column"));
        assert_eq!(sorted, records);
        assert_eq!(
            compare_values(
                &TextOrder::new(),
                Some(&Value::Number(1.0)),
                Some(&Value::Text("a".into()))
            ),
            Ordering::Equal
        );
    }

    #[test]
    fn selecting_fields_resets_or_toggles_direction() {
        let mut spec = SortSpec::ascending("health_score");
        spec.select("health_score");
        assert_eq!(spec.direction, SortDirection::Desc);
        spec.select("company_name");
        assert_eq!(spec, SortSpec::ascending("company_name"));
    }

    #[test]
    fn toggling_twice_restores_ascending_order() {
        let records = records();
        let mut spec = SortSpec::ascending("health_score");
        let initial = sort_records(&records, &spec);
        spec.select("health_score");
        spec.select("health_score");
        assert_eq!(spec.direction, SortDirection::Asc);
        assert_eq!(sort_records(&records, &spec), initial);
    }

    #[test]
    fn sorts_borrowed_records() {
        let records = records();
        let refs: Vec<&Record> = records.iter().collect();
        let mut spec = SortSpec::ascending("health_score");
        spec.toggle();
        let sorted = sort_records(&refs, &spec);
        assert_eq!(sorted[0].number("health_score"), Some(91.0));
    }
}

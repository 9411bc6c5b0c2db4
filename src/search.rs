use std::borrow::Borrow;

use crate::models::Record;

fn matches_lowercase(record: &Record, needle: &str, fields: &[String]) -> bool {
    fields.iter().any(|field| {
        record
            .get(field)
            .is_some_and(|value| value.to_string().to_lowercase().contains(needle))
    })
}

pub fn search<R>(records: &[R], term: &str, fields: &[String]) -> Vec<R>
where
    R: Borrow<Record> + Clone,
{
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|record| {
            let record: &Record = (*record).borrow();
            matches_lowercase(record, &needle, fields)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::parse_csv;
    use crate::schema::Schema;

    fn records() -> Vec<Record> {
        let schema = Schema::new("company_id", "health_score")
            .with_search_fields(&["company_id", "company_name"])
            .with_numeric(&["health_score"]);
        parse_csv(
            "company_id,company_name,health_score\n\
             COMP-001,Acme Corp,85\n\
             COMP-002,TechStart Inc,45\n",
            &schema,
        )
        .unwrap()
        .records
    }

    fn fields() -> Vec<String> {
        vec!["company_id".to_string(), "company_name".to_string()]
    }

    #[test]
    fn matches_name_case_insensitively() {
        let records = records();
        let found = search(&records, "acme", &fields());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text("company_name"), Some("Acme Corp"));
    }

    #[test]
    fn matches_identifier_substring() {
        let records = records();
        let found = search(&records, "comp-00", &fields());
        assert_eq!(found.len(), 2);
        let found = search(&records, "002", &fields());
        assert_eq!(found[0].text("company_id"), Some("COMP-002"));
    }

    #[test]
    fn empty_term_matches_all() {
        let records = records();
        assert_eq!(search(&records, "", &fields()).len(), 2);
        assert_eq!(search(&records, "   ", &fields()).len(), 2);
    }

    #[test]
    fn surrounding_whitespace_in_the_term_is_ignored() {
        let records = records();
        let found = search(&records, "  acme ", &fields());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text("company_id"), Some("COMP-001"));
        assert_eq!(search(&records, "Inc ", &fields()).len(), 1);
    }

    #[test]
    fn only_configured_fields_are_searched() {
        let records = records();
        assert!(search(&records, "85", &fields()).is_empty());
        assert!(search(&records, "zzz", &fields()).is_empty());
    }
}

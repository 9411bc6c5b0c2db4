use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Number(f64),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Number(_) => None,
        }
    }

    pub fn to_decimal(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Number(_) => None,
            Value::Text(s) => parse_decimal(s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Reads the longest leading decimal, so `85%` and `72 pts` yield their
/// numbers. Input without leading digits and non-finite results are `None`.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let text = raw.trim_start();
    let bytes = text.as_bytes();

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_digits = leading_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = leading_digits(&bytes[end + 1..]);
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent = end + 1;
        if matches!(bytes.get(exponent), Some(b'+' | b'-')) {
            exponent += 1;
        }
        let exp_digits = leading_digits(&bytes[exponent..]);
        if exp_digits > 0 {
            end = exponent + exp_digits;
        }
    }

    text[..end]
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn leading_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_text)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_number)
    }

    pub fn extended(&self, extra: impl IntoIterator<Item = (String, Value)>) -> Record {
        let mut fields = self.fields.clone();
        fields.extend(extra);
        Record { fields }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
    pub skipped: Vec<SkippedRow>,
}

impl Dataset {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn identifiers<'a>(&'a self, id_field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.records
            .iter()
            .filter_map(move |record| record.text(id_field))
            .filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_parsing_rejects_garbage_and_non_finite() {
        assert_eq!(parse_decimal(" 12.5 "), Some(12.5));
        assert_eq!(parse_decimal("-3"), Some(-3.0));
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("NaN"), None);
        assert_eq!(parse_decimal("inf"), None);
        assert_eq!(parse_decimal("1e400"), None);
    }

    #[test]
    fn decimal_parsing_reads_the_leading_number() {
        assert_eq!(parse_decimal("85%"), Some(85.0));
        assert_eq!(parse_decimal("72 pts"), Some(72.0));
        assert_eq!(parse_decimal("  -4.5kg"), Some(-4.5));
        assert_eq!(parse_decimal(".5"), Some(0.5));
        assert_eq!(parse_decimal("5."), Some(5.0));
        assert_eq!(parse_decimal("2e3x"), Some(2000.0));
        assert_eq!(parse_decimal("7e"), Some(7.0));
        assert_eq!(parse_decimal("1,5"), Some(1.0));
        assert_eq!(parse_decimal("-"), None);
        assert_eq!(parse_decimal("."), None);
        assert_eq!(parse_decimal("pts 72"), None);
    }

    #[test]
    fn text_values_convert_to_decimal_when_possible() {
        assert_eq!(Value::Text("8".to_string()).to_decimal(), Some(8.0));
        assert_eq!(Value::Text("eight".to_string()).to_decimal(), None);
        assert_eq!(Value::Number(f64::NAN).to_decimal(), None);
    }

    #[test]
    fn extended_records_leave_the_source_untouched() {
        let mut fields = BTreeMap::new();
        fields.insert("company_id".to_string(), Value::Text("COMP-001".to_string()));
        let record = Record::new(fields);
        let wider = record.extended([("quantity".to_string(), Value::Number(5.0))]);
        assert_eq!(wider.number("quantity"), Some(5.0));
        assert_eq!(record.get("quantity"), None);
        assert_eq!(wider.len(), 2);
    }

    #[test]
    fn identifiers_skip_blank_ids() {
        let record = |id: &str| {
            let mut fields = BTreeMap::new();
            fields.insert("company_id".to_string(), Value::Text(id.to_string()));
            Record::new(fields)
        };
        let dataset = Dataset {
            columns: vec!["company_id".to_string()],
            records: vec![record("COMP-001"), record(""), record("COMP-003")],
            skipped: Vec::new(),
        };
        let ids: Vec<&str> = dataset.identifiers("company_id").collect();
        assert_eq!(ids, vec!["COMP-001", "COMP-003"]);
    }

    #[test]
    fn records_serialize_as_flat_objects() {
        let mut fields = BTreeMap::new();
        fields.insert("company_id".to_string(), Value::Text("COMP-001".to_string()));
        fields.insert("health_score".to_string(), Value::Number(85.0));
        let json = serde_json::to_string(&Record::new(fields)).unwrap();
        assert_eq!(json, r#"{"company_id":"COMP-001","health_score":85.0}"#);
    }
}

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::error::DashboardError;
use crate::models::{parse_decimal, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operator {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
}

impl Operator {
    // Two-character tokens first so prefix matching picks `>=` over `>`.
    pub const ALL: [Operator; 6] = [
        Operator::Ge,
        Operator::Le,
        Operator::Ne,
        Operator::Gt,
        Operator::Lt,
        Operator::Eq,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Ge => ">=",
            Operator::Le => "<=",
        }
    }

    /// `=` and `!=` are exact floating point equality: `0.1 + 0.2 = 0.3`
    /// does not hold.
    pub fn apply(self, left: f64, right: f64) -> bool {
        match self {
            Operator::Gt => left > right,
            Operator::Lt => left < right,
            Operator::Eq => left == right,
            Operator::Ne => left != right,
            Operator::Ge => left >= right,
            Operator::Le => left <= right,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operator in {0:?}")]
pub struct UnknownOperator(pub String);

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Operator::ALL
            .into_iter()
            .find(|op| op.symbol() == s)
            .or(match s {
                "≠" => Some(Operator::Ne),
                "≥" => Some(Operator::Ge),
                "≤" => Some(Operator::Le),
                _ => None,
            })
            .ok_or_else(|| UnknownOperator(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterClause {
    pub id: Uuid,
    pub column: Option<String>,
    pub operator: Option<Operator>,
    pub value: Option<String>,
}

impl FilterClause {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            column: None,
            operator: Some(Operator::Gt),
            value: None,
        }
    }

    pub fn complete(column: &str, operator: Operator, value: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            column: Some(column.to_string()),
            operator: Some(operator),
            value: Some(value.to_string()),
        }
    }

    pub fn parse(expr: &str) -> Result<Self, UnknownOperator> {
        let (start, op) = Operator::ALL
            .iter()
            .filter_map(|op| expr.find(op.symbol()).map(|at| (at, *op)))
            .min_by_key(|(at, op)| (*at, std::cmp::Reverse(op.symbol().len())))
            .ok_or_else(|| UnknownOperator(expr.to_string()))?;
        let column = expr[..start].trim();
        let value = expr[start + op.symbol().len()..].trim();
        Ok(Self::complete(column, op, value))
    }

    pub fn is_complete(&self) -> bool {
        self.parts().is_some()
    }

    fn parts(&self) -> Option<(&str, Operator, &str)> {
        let column = self.column.as_deref().filter(|c| !c.trim().is_empty())?;
        let operator = self.operator?;
        let value = self.value.as_deref().filter(|v| !v.trim().is_empty())?;
        Some((column, operator, value))
    }

    pub fn matches(&self, record: &Record) -> bool {
        let Some((column, operator, value)) = self.parts() else {
            return true;
        };
        let Some(operand) = parse_decimal(value) else {
            return false;
        };
        match record.get(column).and_then(|v| v.to_decimal()) {
            Some(actual) => operator.apply(actual, operand),
            None => false,
        }
    }
}

impl Default for FilterClause {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FilterClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.column.as_deref().unwrap_or("?"),
            self.operator.map_or("?", Operator::symbol),
            self.value.as_deref().unwrap_or("?")
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseField {
    Column,
    Operator,
    Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    clauses: Vec<FilterClause>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn add(&mut self) -> Uuid {
        self.push(FilterClause::new())
    }

    pub fn push(&mut self, clause: FilterClause) -> Uuid {
        let id = clause.id;
        self.clauses.push(clause);
        id
    }

    pub fn remove(&mut self, id: Uuid) -> Result<FilterClause, DashboardError> {
        let index = self
            .clauses
            .iter()
            .position(|c| c.id == id)
            .ok_or(DashboardError::UnknownClause(id))?;
        Ok(self.clauses.remove(index))
    }

    pub fn update(
        &mut self,
        id: Uuid,
        field: ClauseField,
        value: &str,
    ) -> Result<(), DashboardError> {
        let clause = self
            .clauses
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(DashboardError::UnknownClause(id))?;
        let value = value.trim();
        let set = (!value.is_empty()).then(|| value.to_string());
        match field {
            ClauseField::Column => clause.column = set,
            ClauseField::Operator => clause.operator = value.parse().ok(),
            ClauseField::Value => clause.value = set,
        }
        Ok(())
    }
}

pub fn evaluate<R>(records: &[R], clauses: &[FilterClause]) -> Vec<R>
where
    R: Borrow<Record> + Clone,
{
    records
        .iter()
        .filter(|record| {
            let record: &Record = (*record).borrow();
            clauses.iter().all(|c| c.matches(record))
        })
        .cloned()
        .collect()
}

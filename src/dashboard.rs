use std::borrow::Borrow;
use std::cell::RefCell;

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::DashboardError;
use crate::filter::{evaluate, ClauseField, FilterClause, FilterSet};
use crate::models::{Dataset, Record};
use crate::risk::{aggregate, BucketCounts};
use crate::schema::Schema;
use crate::search::search;
use crate::sort::{sort_records, SortSpec};

#[derive(Debug, Clone, Copy)]
struct Row<'a> {
    index: usize,
    record: &'a Record,
}

impl Borrow<Record> for Row<'_> {
    fn borrow(&self) -> &Record {
        self.record
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View<'a> {
    pub records: Vec<&'a Record>,
    pub counts: BucketCounts,
}

impl View<'_> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn run_query<'a>(
    records: &'a [Record],
    schema: &Schema,
    search_term: &str,
    clauses: &[FilterClause],
    sort: &SortSpec,
) -> View<'a> {
    let refs: Vec<&Record> = records.iter().collect();
    let visible = evaluate(&search(&refs, search_term, &schema.search_fields), clauses);
    let counts = aggregate(&visible, &schema.score_field);
    View {
        records: sort_records(&visible, sort),
        counts,
    }
}

#[derive(Debug, Clone, PartialEq)]
struct MembershipKey {
    generation: u64,
    search_term: String,
    clauses: Vec<FilterClause>,
}

#[derive(Debug, Clone)]
struct Membership {
    key: MembershipKey,
    rows: Vec<usize>,
    counts: BucketCounts,
}

#[derive(Debug)]
pub struct Dashboard {
    schema: Schema,
    dataset: Dataset,
    generation: u64,
    search_term: String,
    filters: FilterSet,
    sort: SortSpec,
    membership: RefCell<Option<Membership>>,
}

impl Dashboard {
    pub fn new(schema: Schema, dataset: Dataset) -> Self {
        let sort = SortSpec::ascending(&schema.score_field);
        Self {
            schema,
            dataset,
            generation: 0,
            search_term: String::new(),
            filters: FilterSet::new(),
            sort,
            membership: RefCell::new(None),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub fn filterable_columns(&self) -> Vec<&str> {
        self.dataset
            .columns
            .iter()
            .map(String::as_str)
            .filter(|column| self.schema.is_numeric(column))
            .collect()
    }

    pub fn replace_data(&mut self, dataset: Dataset) {
        self.dataset = dataset;
        self.generation += 1;
    }

    pub fn set_search_term(&mut self, term: &str) {
        self.search_term = term.to_string();
    }

    pub fn set_sort_field(&mut self, field: &str) {
        self.sort.select(field);
    }

    pub fn toggle_sort_direction(&mut self) {
        self.sort.toggle();
    }

    pub fn add_filter_clause(&mut self) -> Uuid {
        self.filters.add()
    }

    pub fn push_filter_clause(&mut self, clause: FilterClause) -> Uuid {
        self.filters.push(clause)
    }

    pub fn remove_filter_clause(&mut self, id: Uuid) -> Result<(), DashboardError> {
        self.filters.remove(id).map(|_| ())
    }

    pub fn update_filter_clause(
        &mut self,
        id: Uuid,
        field: ClauseField,
        value: &str,
    ) -> Result<(), DashboardError> {
        self.filters.update(id, field, value)
    }

    pub fn counts(&self) -> BucketCounts {
        self.with_membership(|membership| membership.counts)
    }

    pub fn visible(&self) -> View<'_> {
        let (rows, counts) = self.with_membership(|membership| {
            let rows: Vec<Row<'_>> = membership
                .rows
                .iter()
                .map(|&index| Row {
                    index,
                    record: &self.dataset.records[index],
                })
                .collect();
            (rows, membership.counts)
        });
        View {
            records: sort_records(&rows, &self.sort)
                .into_iter()
                .map(|row| row.record)
                .collect(),
            counts,
        }
    }

    fn membership_key(&self) -> MembershipKey {
        MembershipKey {
            generation: self.generation,
            search_term: self.search_term.clone(),
            clauses: self.filters.clauses().to_vec(),
        }
    }

    fn with_membership<T>(&self, f: impl FnOnce(&Membership) -> T) -> T {
        let key = self.membership_key();
        let mut cache = self.membership.borrow_mut();
        let membership = match cache.take() {
            Some(cached) if cached.key == key => {
                debug!("reusing visible set");
                cached
            }
            _ => self.compute_membership(key),
        };
        let result = f(&membership);
        *cache = Some(membership);
        result
    }

    fn compute_membership(&self, key: MembershipKey) -> Membership {
        let rows: Vec<Row<'_>> = self
            .dataset
            .records
            .iter()
            .enumerate()
            .map(|(index, record)| Row { index, record })
            .collect();
        let searched = search(&rows, &key.search_term, &self.schema.search_fields);
        let visible = evaluate(&searched, &key.clauses);
        let counts = aggregate(&visible, &self.schema.score_field);
        debug!(
            source = rows.len(),
            visible = visible.len(),
            clauses = key.clauses.len(),
            "recomputed visible set"
        );
        Membership {
            key,
            rows: visible.iter().map(|row| row.index).collect(),
            counts,
        }
    }
}

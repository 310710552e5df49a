//! Read query: equality / set-membership filters, single-column ordering, paging.
//!
//! The same `Query` is translated to remote query parameters by the REST client
//! and evaluated in memory against the local cache.

use crate::domain::model::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// `field -> value`; an array value means "field is one of these".
    #[serde(default, rename = "where", skip_serializing_if = "BTreeMap::is_empty")]
    pub r#where: BTreeMap<String, JsonValue>,
    #[serde(default, rename = "orderBy", alias = "order_by")]
    pub order_by: Option<String>,
    #[serde(default = "default_ascending")]
    pub ascending: bool,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

fn default_ascending() -> bool {
    true
}

impl Default for Query {
    fn default() -> Self {
        Self {
            r#where: BTreeMap::new(),
            order_by: None,
            ascending: true,
            limit: None,
            offset: None,
        }
    }
}

/// One filter condition, as interpreted from a `where` entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter<'a> {
    Eq(&'a JsonValue),
    In(&'a [JsonValue]),
}

impl<'a> Filter<'a> {
    pub fn from_value(value: &'a JsonValue) -> Self {
        match value {
            JsonValue::Array(values) => Filter::In(values),
            other => Filter::Eq(other),
        }
    }

    pub fn matches(&self, actual: Option<&JsonValue>) -> bool {
        let actual = actual.unwrap_or(&JsonValue::Null);
        match self {
            Filter::Eq(expected) => values_match(actual, expected),
            Filter::In(set) => set.iter().any(|expected| values_match(actual, expected)),
        }
    }
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query matching a single id.
    pub fn by_id(id: &str) -> Self {
        Self::new().filter("id", JsonValue::String(id.to_string())).limit(1)
    }

    pub fn filter(mut self, field: impl Into<String>, value: JsonValue) -> Self {
        self.r#where.insert(field.into(), value);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, ascending: bool) -> Self {
        self.order_by = Some(field.into());
        self.ascending = ascending;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn filters(&self) -> impl Iterator<Item = (&str, Filter<'_>)> {
        self.r#where
            .iter()
            .map(|(field, value)| (field.as_str(), Filter::from_value(value)))
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.filters()
            .all(|(field, filter)| filter.matches(record.get(field)))
    }

    /// Evaluates the query against an in-memory table. Returns owned copies;
    /// input order is preserved unless `order_by` is set (the sort is stable).
    pub fn apply(&self, records: &[Record]) -> Vec<Record> {
        let mut out: Vec<Record> = records
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect();

        if let Some(field) = self.order_by.as_deref() {
            out.sort_by(|a, b| {
                let ord = compare_values(a.get(field), b.get(field));
                if self.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }

        let offset = self.offset.unwrap_or(0);
        let iter = out.into_iter().skip(offset);
        match self.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}

/// Equality that tolerates numbers stored as strings (and vice versa).
pub fn values_match(actual: &JsonValue, expected: &JsonValue) -> bool {
    if actual == expected {
        return true;
    }
    match (actual, expected) {
        (JsonValue::Number(n), JsonValue::String(s)) | (JsonValue::String(s), JsonValue::Number(n)) => {
            match (n.as_f64(), s.trim().parse::<f64>()) {
                (Some(a), Ok(b)) => a == b,
                _ => false,
            }
        }
        _ => false,
    }
}

/// Total order used for local sorting. Missing/null sorts first.
pub fn compare_values(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    let a = a.unwrap_or(&JsonValue::Null);
    let b = b.unwrap_or(&JsonValue::Null);
    match (a, b) {
        (JsonValue::Null, JsonValue::Null) => Ordering::Equal,
        (JsonValue::Null, _) => Ordering::Less,
        (_, JsonValue::Null) => Ordering::Greater,
        (JsonValue::Number(x), JsonValue::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (JsonValue::String(x), JsonValue::String(y)) => x.cmp(y),
        (JsonValue::Bool(x), JsonValue::Bool(y)) => x.cmp(y),
        (x, y) => x.to_string().cmp(&y.to_string()),
    }
}

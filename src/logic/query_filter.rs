use std::cmp::Ordering;
use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::model::{
    lookup_key, Condition, Document, KeyKind, Operator, Query, QueryKey, Sort, StatQuery,
    StatResult, StatRow,
};

/// Evaluates queries against serialized documents in memory
pub struct QueryEvaluator {
    schema: &'static [QueryKey],
}

impl QueryEvaluator {
    pub fn new(schema: &'static [QueryKey]) -> Self {
        Self { schema }
    }

    /// Filter, sort and page `items`; returns the page and the filtered total
    pub fn run<T: Serialize>(
        &self,
        items: Vec<T>,
        query: &Query,
        default_sort: &Sort,
    ) -> Result<(Vec<T>, usize)> {
        let mut matched = Vec::new();
        for item in items {
            let doc = serde_json::to_value(&item)?;
            if self.matches(&doc, query)? {
                matched.push((doc, item));
            }
        }
        let total = matched.len();

        let sort = query.sort.as_ref().unwrap_or(default_sort);
        let kind = lookup_key(self.schema, &sort.key).map_err(|e| anyhow!(e))?.kind;
        matched.sort_by(|(a, _), (b, _)| {
            let ordering = compare_field(kind, a.get(&sort.key), b.get(&sort.key));
            if sort.desc {
                ordering.reverse()
            } else {
                ordering
            }
        });

        let page = match query.page {
            Some(page) => matched
                .into_iter()
                .skip(page.offset())
                .take(page.limit)
                .map(|(_, item)| item)
                .collect(),
            None => matched.into_iter().map(|(_, item)| item).collect(),
        };

        Ok((page, total))
    }

    /// Count matching items per distinct combination of `group_by` values
    pub fn stat<T: Serialize>(&self, items: &[T], query: &StatQuery) -> Result<StatResult> {
        let filter = query.as_query();
        let mut groups: BTreeMap<String, (Document, u64)> = BTreeMap::new();

        for item in items {
            let doc = serde_json::to_value(item)?;
            if !self.matches(&doc, &filter)? {
                continue;
            }
            let mut group = Document::new();
            for key in &query.group_by {
                group.insert(key.clone(), doc.get(key).cloned().unwrap_or(Value::Null));
            }
            let group_key = serde_json::to_string(&group)?;
            groups.entry(group_key).or_insert((group, 0)).1 += 1;
        }

        let mut results: Vec<StatRow> = groups
            .into_values()
            .map(|(group, count)| StatRow { group, count })
            .collect();
        results.sort_by(|a, b| b.count.cmp(&a.count));

        Ok(StatResult { results })
    }

    /// Evaluate `filter` (AND), then `filter_or` and `keyword_or` (each an OR
    /// group) against one document
    pub fn matches(&self, doc: &Value, query: &Query) -> Result<bool> {
        for condition in &query.filter {
            if !self.evaluate(doc, condition)? {
                return Ok(false);
            }
        }
        Ok(self.any(doc, &query.filter_or)? && self.any(doc, &query.keyword_or)?)
    }

    /// An empty group holds
    fn any(&self, doc: &Value, group: &[Condition]) -> Result<bool> {
        if group.is_empty() {
            return Ok(true);
        }
        for condition in group {
            if self.evaluate(doc, condition)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn evaluate(&self, doc: &Value, condition: &Condition) -> Result<bool> {
        let kind = lookup_key(self.schema, &condition.key)
            .map_err(|e| anyhow!(e))?
            .kind;
        let field = doc.get(&condition.key).filter(|value| !value.is_null());

        if kind == KeyKind::TextList {
            let items = field.and_then(Value::as_array).cloned().unwrap_or_default();
            return Ok(match condition.operator {
                Operator::Eq => items.contains(&condition.value),
                Operator::In => values_of(&condition.value)?
                    .iter()
                    .any(|value| items.contains(value)),
                other => return Err(anyhow!("operator {:?} unsupported on list", other)),
            });
        }

        let result = match condition.operator {
            Operator::Eq => equals(kind, field, &condition.value),
            Operator::Not => !equals(kind, field, &condition.value),
            Operator::In => values_of(&condition.value)?
                .iter()
                .any(|value| equals(kind, field, value)),
            Operator::NotIn => !values_of(&condition.value)?
                .iter()
                .any(|value| equals(kind, field, value)),
            Operator::Contain => match (field, condition.value.as_str()) {
                (Some(Value::String(text)), Some(needle)) => {
                    text.to_lowercase().contains(&needle.to_lowercase())
                }
                _ => false,
            },
            Operator::Gt => ordered(kind, field, &condition.value, |o| o == Ordering::Greater),
            Operator::Gte => ordered(kind, field, &condition.value, |o| o != Ordering::Less),
            Operator::Lt => ordered(kind, field, &condition.value, |o| o == Ordering::Less),
            Operator::Lte => ordered(kind, field, &condition.value, |o| o != Ordering::Greater),
            Operator::Exists => {
                let wanted = condition.value.as_bool().unwrap_or(true);
                field.is_some() == wanted
            }
        };
        Ok(result)
    }
}

fn values_of(value: &Value) -> Result<&Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| anyhow!("expected a list of values, got {}", value))
}

fn equals(kind: KeyKind, field: Option<&Value>, expected: &Value) -> bool {
    match (field, expected) {
        (None, Value::Null) => true,
        (None, _) | (Some(_), Value::Null) => false,
        (Some(actual), expected) => compare_values(kind, actual, expected) == Some(Ordering::Equal),
    }
}

fn ordered(
    kind: KeyKind,
    field: Option<&Value>,
    bound: &Value,
    accept: impl Fn(Ordering) -> bool,
) -> bool {
    field
        .and_then(|actual| compare_values(kind, actual, bound))
        .map(accept)
        .unwrap_or(false)
}

fn compare_values(kind: KeyKind, left: &Value, right: &Value) -> Option<Ordering> {
    match kind {
        KeyKind::Integer => {
            let l = as_i64(left)?;
            let r = as_i64(right)?;
            Some(l.cmp(&r))
        }
        KeyKind::Timestamp => {
            let l = as_timestamp(left)?;
            let r = as_timestamp(right)?;
            Some(l.cmp(&r))
        }
        KeyKind::Text | KeyKind::TextList => Some(left.as_str()?.cmp(right.as_str()?)),
    }
}

fn compare_field(kind: KeyKind, left: Option<&Value>, right: Option<&Value>) -> Ordering {
    // Missing values sort first
    match (left.filter(|v| !v.is_null()), right.filter(|v| !v.is_null())) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(l), Some(r)) => compare_values(kind, l, r).unwrap_or(Ordering::Equal),
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn as_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::Document;

/// Comparison operator of a filter condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Not,
    In,
    NotIn,
    Contain,
    Gt,
    Gte,
    Lt,
    Lte,
    Exists,
}

/// A single `key <operator> value` predicate.
///
/// Serialized in the short `{"k": .., "v": .., "o": ..}` form; the long
/// `key`/`value`/`operator` names are accepted as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "k", alias = "key")]
    pub key: String,
    #[serde(rename = "v", alias = "value", default)]
    pub value: Value,
    #[serde(rename = "o", alias = "operator", default = "default_operator")]
    pub operator: Operator,
}

fn default_operator() -> Operator {
    Operator::Eq
}

impl Condition {
    pub fn new(key: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            operator,
        }
    }

    pub fn eq(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(key, Operator::Eq, value)
    }

    pub fn contain(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(key, Operator::Contain, value)
    }

    /// Rows owned by `user_id` or by nobody
    pub fn owned_by_or_unowned(user_id: &str) -> Self {
        Self::new(
            "user_id",
            Operator::In,
            Value::Array(vec![Value::String(user_id.to_string()), Value::Null]),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sort {
    pub key: String,
    #[serde(default)]
    pub desc: bool,
}

impl Sort {
    pub fn desc(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            desc: true,
        }
    }
}

/// One-based page window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default = "default_page_start")]
    pub start: usize,
    pub limit: usize,
}

fn default_page_start() -> usize {
    1
}

impl Page {
    pub fn offset(&self) -> usize {
        self.start.saturating_sub(1)
    }
}

/// List query: `filter` conditions are ANDed, `filter_or` is a single OR group
/// ANDed with the rest.
///
/// `keyword_or` is the expanded keyword. It is its own OR group, ANDed with
/// `filter_or`, and is never read from callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter_or: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip)]
    pub keyword_or: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<Page>,
}

impl Query {
    pub fn and(mut self, condition: Condition) -> Self {
        self.filter.push(condition);
        self
    }

    /// Turn `keyword` into `contain` conditions over `fields` in the keyword group
    pub fn expand_keyword(&mut self, fields: &[&str]) {
        if let Some(keyword) = self.keyword.take() {
            let keyword = keyword.trim().to_string();
            if keyword.is_empty() {
                return;
            }
            self.keyword_or.extend(
                fields
                    .iter()
                    .map(|field| Condition::contain(*field, keyword.clone())),
            );
        }
    }

    /// Check every referenced key, operator and operand against a collection schema
    pub fn validate(&self, schema: &[QueryKey]) -> Result<(), String> {
        let conditions = self
            .filter
            .iter()
            .chain(self.filter_or.iter())
            .chain(self.keyword_or.iter());
        for condition in conditions {
            let key = lookup_key(schema, &condition.key)?;
            if !key.kind.supports(condition.operator) {
                return Err(format!(
                    "operator '{:?}' is not supported on '{}'",
                    condition.operator, condition.key
                ));
            }
            key.kind.check_operand(condition)?;
        }
        if let Some(sort) = &self.sort {
            let key = lookup_key(schema, &sort.key)?;
            if key.kind == KeyKind::TextList {
                return Err(format!("cannot sort by '{}'", sort.key));
            }
        }
        if let Some(page) = &self.page {
            if page.start == 0 {
                return Err("page.start is one-based".to_string());
            }
            if i64::try_from(page.limit).is_err() || i64::try_from(page.offset()).is_err() {
                return Err("page is out of range".to_string());
            }
        }
        Ok(())
    }
}

/// Grouped count over a collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatQuery {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter_or: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip)]
    pub keyword_or: Vec<Condition>,
    #[serde(default)]
    pub group_by: Vec<String>,
}

impl StatQuery {
    /// Filtering part of the stat query
    pub fn as_query(&self) -> Query {
        Query {
            filter: self.filter.clone(),
            filter_or: self.filter_or.clone(),
            keyword: self.keyword.clone(),
            keyword_or: self.keyword_or.clone(),
            sort: None,
            page: None,
        }
    }

    pub fn expand_keyword(&mut self, fields: &[&str]) {
        let mut query = Query {
            keyword: self.keyword.take(),
            ..Default::default()
        };
        query.expand_keyword(fields);
        self.keyword_or.extend(query.keyword_or);
    }

    pub fn validate(&self, schema: &[QueryKey]) -> Result<(), String> {
        self.as_query().validate(schema)?;
        for key in &self.group_by {
            if lookup_key(schema, key)?.kind == KeyKind::TextList {
                return Err(format!("cannot group by '{}'", key));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRow {
    pub group: Document,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatResult {
    pub results: Vec<StatRow>,
}

/// Value type of a queryable key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Text,
    Integer,
    Timestamp,
    TextList,
}

impl KeyKind {
    pub fn supports(&self, operator: Operator) -> bool {
        match self {
            KeyKind::Text => true,
            KeyKind::Integer => operator != Operator::Contain,
            KeyKind::Timestamp => !matches!(
                operator,
                Operator::Contain | Operator::In | Operator::NotIn
            ),
            KeyKind::TextList => matches!(operator, Operator::Eq | Operator::In),
        }
    }

    /// Whether a single value can be compared against a key of this kind
    fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (KeyKind::Text | KeyKind::TextList, Value::String(_)) => true,
            (KeyKind::Integer, Value::Number(n)) => n.as_i64().is_some(),
            (KeyKind::Integer, Value::String(s)) => s.parse::<i64>().is_ok(),
            (KeyKind::Timestamp, Value::String(s)) => DateTime::parse_from_rfc3339(s).is_ok(),
            _ => false,
        }
    }

    fn check_operand(&self, condition: &Condition) -> Result<(), String> {
        let value = &condition.value;
        // Labels hold strings only, so null is never a member
        let nullable = *self != KeyKind::TextList;
        let valid = match condition.operator {
            Operator::Exists => matches!(value, Value::Bool(_) | Value::Null),
            Operator::In | Operator::NotIn => match value {
                Value::Array(items) => items
                    .iter()
                    .all(|item| (nullable && item.is_null()) || self.accepts(item)),
                _ => false,
            },
            Operator::Eq | Operator::Not => (nullable && value.is_null()) || self.accepts(value),
            Operator::Contain => value.is_string(),
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => self.accepts(value),
        };
        if valid {
            Ok(())
        } else {
            Err(format!(
                "invalid value {} for '{}' with operator '{:?}'",
                value, condition.key, condition.operator
            ))
        }
    }
}

/// A key that may appear in filters, sorts and groupings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryKey {
    pub name: &'static str,
    pub kind: KeyKind,
}

const fn key(name: &'static str, kind: KeyKind) -> QueryKey {
    QueryKey { name, kind }
}

pub const DASHBOARD_QUERY_KEYS: &[QueryKey] = &[
    key("dashboard_id", KeyKind::Text),
    key("name", KeyKind::Text),
    key("dashboard_type", KeyKind::Text),
    key("version", KeyKind::Integer),
    key("viewers", KeyKind::Text),
    key("resource_group", KeyKind::Text),
    key("labels", KeyKind::TextList),
    key("user_id", KeyKind::Text),
    key("project_id", KeyKind::Text),
    key("workspace_id", KeyKind::Text),
    key("domain_id", KeyKind::Text),
    key("created_at", KeyKind::Timestamp),
];

pub const VERSION_QUERY_KEYS: &[QueryKey] = &[
    key("dashboard_id", KeyKind::Text),
    key("version", KeyKind::Integer),
    key("domain_id", KeyKind::Text),
    key("created_at", KeyKind::Timestamp),
];

pub fn lookup_key(schema: &[QueryKey], name: &str) -> Result<QueryKey, String> {
    schema
        .iter()
        .find(|key| key.name == name)
        .copied()
        .ok_or_else(|| format!("unknown query key '{}'", name))
}

/// Field projection ("only") applied to serialized responses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    fields: Vec<String>,
}

impl Projection {
    /// Parse a comma separated field list, rejecting names not in `allowed`
    pub fn parse(only: &str, allowed: &[&str]) -> Result<Self, String> {
        let fields: Vec<String> = only
            .split(',')
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .map(str::to_string)
            .collect();
        if fields.is_empty() {
            return Err("projection is empty".to_string());
        }
        if let Some(unknown) = fields.iter().find(|field| !allowed.contains(&field.as_str())) {
            return Err(format!("unknown projection field '{}'", unknown));
        }
        Ok(Self { fields })
    }

    pub fn apply<T: Serialize>(&self, item: &T) -> serde_json::Result<Value> {
        let value = serde_json::to_value(item)?;
        let Value::Object(map) = value else {
            return Ok(value);
        };
        let projected: Map<String, Value> = map
            .into_iter()
            .filter(|(key, _)| self.fields.iter().any(|field| field == key))
            .collect();
        Ok(Value::Object(projected))
    }
}

pub const DASHBOARD_FIELDS: &[&str] = &[
    "dashboard_id",
    "name",
    "dashboard_type",
    "version",
    "layouts",
    "variables",
    "settings",
    "variables_schema",
    "labels",
    "tags",
    "viewers",
    "resource_group",
    "user_id",
    "project_id",
    "workspace_id",
    "domain_id",
    "created_at",
];

pub const VERSION_FIELDS: &[&str] = &[
    "dashboard_id",
    "version",
    "layouts",
    "variables",
    "settings",
    "variables_schema",
    "domain_id",
    "created_at",
    "latest",
];

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use crate::model::{
    lookup_key, Condition, DashboardPatch, DashboardRecord, Document, KeyKind, Operator, Query,
    QueryKey, ResourceGroup, Sort, StatQuery, StatResult, StatRow, Version, VersionSnapshot,
    Viewers, DASHBOARD_QUERY_KEYS, VERSION_QUERY_KEYS,
};
use crate::store::traits::{DashboardStore, DashboardVersionStore, Store};

const DASHBOARD_COLUMNS: &str = "dashboard_id, name, dashboard_type, version, layouts, variables, \
     settings, variables_schema, labels, tags, viewers, resource_group, user_id, project_id, \
     workspace_id, domain_id, created_at";

const VERSION_COLUMNS: &str =
    "dashboard_id, version, layouts, variables, settings, variables_schema, domain_id, created_at";

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS dashboards (
        dashboard_id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        dashboard_type TEXT NOT NULL,
        version BIGINT NOT NULL,
        layouts JSONB NOT NULL DEFAULT '[]',
        variables JSONB NOT NULL DEFAULT '{}',
        settings JSONB NOT NULL DEFAULT '{}',
        variables_schema JSONB NOT NULL DEFAULT '{}',
        labels JSONB NOT NULL DEFAULT '[]',
        tags JSONB NOT NULL DEFAULT '{}',
        viewers TEXT NOT NULL,
        resource_group TEXT NOT NULL,
        user_id TEXT,
        project_id TEXT,
        workspace_id TEXT,
        domain_id TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS dashboards_domain_id_idx ON dashboards (domain_id)",
    r#"
    CREATE TABLE IF NOT EXISTS dashboard_versions (
        dashboard_id TEXT NOT NULL,
        version BIGINT NOT NULL,
        layouts JSONB NOT NULL DEFAULT '[]',
        variables JSONB NOT NULL DEFAULT '{}',
        settings JSONB NOT NULL DEFAULT '{}',
        variables_schema JSONB NOT NULL DEFAULT '{}',
        domain_id TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (dashboard_id, version, domain_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS dashboard_versions_domain_id_idx ON dashboard_versions (domain_id)",
    "CREATE INDEX IF NOT EXISTS dashboard_versions_dashboard_id_idx ON dashboard_versions (dashboard_id)",
];

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Create both collections and their indexes if they are missing
    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to run schema migration")?;
        }
        Ok(())
    }

    /// Get a reference to the connection pool
    async fn select_dashboard(
        &self,
        builder: &mut QueryBuilder<'_, Postgres>,
    ) -> Result<Option<DashboardRecord>> {
        let row = builder
            .build()
            .fetch_optional(&self.pool)
            .await
            .context("Failed to write dashboard")?;
        row.as_ref().map(dashboard_from_row).transpose()
    }
}

fn document(row: &PgRow, column: &str) -> Result<Document> {
    let Json(value) = row.try_get::<Json<Document>, _>(column)?;
    Ok(value)
}

fn dashboard_from_row(row: &PgRow) -> Result<DashboardRecord> {
    let viewers: String = row.try_get("viewers")?;
    let resource_group: String = row.try_get("resource_group")?;
    let Json(layouts) = row.try_get::<Json<Vec<Value>>, _>("layouts")?;
    let Json(labels) = row.try_get::<Json<Vec<String>>, _>("labels")?;

    Ok(DashboardRecord {
        dashboard_id: row.try_get("dashboard_id")?,
        name: row.try_get("name")?,
        dashboard_type: row.try_get("dashboard_type")?,
        version: row.try_get("version")?,
        layouts,
        variables: document(row, "variables")?,
        settings: document(row, "settings")?,
        variables_schema: document(row, "variables_schema")?,
        labels,
        tags: document(row, "tags")?,
        viewers: Viewers::parse(&viewers)
            .ok_or_else(|| anyhow!("invalid viewers value '{}'", viewers))?,
        resource_group: ResourceGroup::parse(&resource_group)
            .ok_or_else(|| anyhow!("invalid resource_group value '{}'", resource_group))?,
        user_id: row.try_get("user_id")?,
        project_id: row.try_get("project_id")?,
        workspace_id: row.try_get("workspace_id")?,
        domain_id: row.try_get("domain_id")?,
        created_at: row.try_get("created_at")?,
    })
}

fn version_from_row(row: &PgRow) -> Result<VersionSnapshot> {
    let Json(layouts) = row.try_get::<Json<Vec<Value>>, _>("layouts")?;
    Ok(VersionSnapshot {
        dashboard_id: row.try_get("dashboard_id")?,
        version: row.try_get("version")?,
        layouts,
        variables: document(row, "variables")?,
        settings: document(row, "settings")?,
        variables_schema: document(row, "variables_schema")?,
        domain_id: row.try_get("domain_id")?,
        created_at: row.try_get("created_at")?,
    })
}

fn text_of(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => bail!("expected a text value, got {}", other),
    }
}

fn integer_of(value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) => n.as_i64().ok_or_else(|| anyhow!("expected an integer, got {}", n)),
        Value::String(s) => s.parse().with_context(|| format!("expected an integer, got '{}'", s)),
        other => bail!("expected an integer, got {}", other),
    }
}

fn timestamp_of(value: &Value) -> Result<DateTime<Utc>> {
    let text = value
        .as_str()
        .ok_or_else(|| anyhow!("expected an RFC 3339 timestamp, got {}", value))?;
    Ok(DateTime::parse_from_rfc3339(text)
        .with_context(|| format!("invalid timestamp '{}'", text))?
        .with_timezone(&Utc))
}

fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn push_scalar(builder: &mut QueryBuilder<'_, Postgres>, kind: KeyKind, value: &Value) -> Result<()> {
    match kind {
        KeyKind::Text | KeyKind::TextList => {
            builder.push_bind(text_of(value)?);
        }
        KeyKind::Integer => {
            builder.push_bind(integer_of(value)?);
        }
        KeyKind::Timestamp => {
            builder.push_bind(timestamp_of(value)?);
        }
    }
    Ok(())
}

fn push_condition(
    builder: &mut QueryBuilder<'_, Postgres>,
    schema: &[QueryKey],
    condition: &Condition,
) -> Result<()> {
    let key = lookup_key(schema, &condition.key).map_err(|e| anyhow!(e))?;
    // Column names come from the static whitelist, never from input
    let column = key.name;
    let value = &condition.value;

    if key.kind == KeyKind::TextList {
        match condition.operator {
            Operator::Eq => {
                builder.push(format!("{} @> jsonb_build_array(", column));
                builder.push_bind(text_of(value)?);
                builder.push("::text)");
            }
            Operator::In => {
                let values = value
                    .as_array()
                    .ok_or_else(|| anyhow!("expected a list for '{}'", column))?
                    .iter()
                    .map(text_of)
                    .collect::<Result<Vec<_>>>()?;
                builder.push(format!("{} ?| ", column));
                builder.push_bind(values);
            }
            other => bail!("operator {:?} unsupported on '{}'", other, column),
        }
        return Ok(());
    }

    match condition.operator {
        Operator::Eq if value.is_null() => {
            builder.push(format!("{} IS NULL", column));
        }
        Operator::Not if value.is_null() => {
            builder.push(format!("{} IS NOT NULL", column));
        }
        Operator::Eq => {
            builder.push(format!("{} = ", column));
            push_scalar(builder, key.kind, value)?;
        }
        Operator::Not => {
            builder.push(format!("{} IS DISTINCT FROM ", column));
            push_scalar(builder, key.kind, value)?;
        }
        Operator::In | Operator::NotIn => {
            let items = value
                .as_array()
                .ok_or_else(|| anyhow!("expected a list for '{}'", column))?;
            let has_null = items.iter().any(Value::is_null);
            let present: Vec<&Value> = items.iter().filter(|v| !v.is_null()).collect();

            if condition.operator == Operator::NotIn {
                builder.push("NOT ");
            }
            builder.push(format!("(COALESCE({} = ANY(", column));
            match key.kind {
                KeyKind::Integer => {
                    let values = present
                        .into_iter()
                        .map(integer_of)
                        .collect::<Result<Vec<_>>>()?;
                    builder.push_bind(values);
                }
                _ => {
                    let values = present
                        .into_iter()
                        .map(text_of)
                        .collect::<Result<Vec<_>>>()?;
                    builder.push_bind(values);
                }
            }
            builder.push("), FALSE)");
            if has_null {
                builder.push(format!(" OR {} IS NULL", column));
            }
            builder.push(")");
        }
        Operator::Contain => {
            builder.push(format!("{} ILIKE ", column));
            builder.push_bind(format!("%{}%", escape_like(&text_of(value)?)));
        }
        Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
            let op = match condition.operator {
                Operator::Gt => ">",
                Operator::Gte => ">=",
                Operator::Lt => "<",
                _ => "<=",
            };
            builder.push(format!("{} {} ", column, op));
            push_scalar(builder, key.kind, value)?;
        }
        Operator::Exists => {
            if value.as_bool().unwrap_or(true) {
                builder.push(format!("{} IS NOT NULL", column));
            } else {
                builder.push(format!("{} IS NULL", column));
            }
        }
    }
    Ok(())
}

fn push_where(
    builder: &mut QueryBuilder<'_, Postgres>,
    schema: &[QueryKey],
    query: &Query,
) -> Result<()> {
    builder.push(" WHERE TRUE");
    for condition in &query.filter {
        builder.push(" AND ");
        push_condition(builder, schema, condition)?;
    }
    push_or_group(builder, schema, &query.filter_or)?;
    push_or_group(builder, schema, &query.keyword_or)?;
    Ok(())
}

fn push_or_group(
    builder: &mut QueryBuilder<'_, Postgres>,
    schema: &[QueryKey],
    group: &[Condition],
) -> Result<()> {
    if group.is_empty() {
        return Ok(());
    }
    builder.push(" AND (");
    for (index, condition) in group.iter().enumerate() {
        if index > 0 {
            builder.push(" OR ");
        }
        push_condition(builder, schema, condition)?;
    }
    builder.push(")");
    Ok(())
}

fn push_order_and_page(
    builder: &mut QueryBuilder<'_, Postgres>,
    schema: &[QueryKey],
    query: &Query,
    default_sort: &Sort,
) -> Result<()> {
    let sort = query.sort.as_ref().unwrap_or(default_sort);
    let column = lookup_key(schema, &sort.key).map_err(|e| anyhow!(e))?.name;
    if sort.desc {
        builder.push(format!(" ORDER BY {} DESC NULLS LAST", column));
    } else {
        builder.push(format!(" ORDER BY {} ASC NULLS FIRST", column));
    }
    if let Some(page) = query.page {
        let limit = i64::try_from(page.limit).context("page limit out of range")?;
        let offset = i64::try_from(page.offset()).context("page offset out of range")?;
        builder.push(" LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);
    }
    Ok(())
}

impl PostgresStore {
    async fn run_query(
        &self,
        table: &str,
        columns: &str,
        schema: &[QueryKey],
        query: &Query,
        default_sort: &Sort,
    ) -> Result<(Vec<PgRow>, usize)> {
        let mut count = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {}", table));
        push_where(&mut count, schema, query)?;
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to count {}", table))?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM {}", columns, table));
        push_where(&mut select, schema, query)?;
        push_order_and_page(&mut select, schema, query, default_sort)?;
        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to query {}", table))?;

        Ok((rows, total as usize))
    }
}

#[async_trait::async_trait]
impl DashboardStore for PostgresStore {
    async fn insert_dashboard(&self, record: DashboardRecord) -> Result<DashboardRecord> {
        let row = sqlx::query(&format!(
            "INSERT INTO dashboards ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) RETURNING {}",
            DASHBOARD_COLUMNS, DASHBOARD_COLUMNS
        ))
        .bind(&record.dashboard_id)
        .bind(&record.name)
        .bind(&record.dashboard_type)
        .bind(record.version)
        .bind(Json(&record.layouts))
        .bind(Json(&record.variables))
        .bind(Json(&record.settings))
        .bind(Json(&record.variables_schema))
        .bind(Json(&record.labels))
        .bind(Json(&record.tags))
        .bind(record.viewers.as_str())
        .bind(record.resource_group.as_str())
        .bind(&record.user_id)
        .bind(&record.project_id)
        .bind(&record.workspace_id)
        .bind(&record.domain_id)
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert dashboard")?;

        dashboard_from_row(&row)
    }

    async fn get_dashboard(
        &self,
        dashboard_id: &str,
        domain_id: &str,
    ) -> Result<Option<DashboardRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM dashboards WHERE dashboard_id = $1 AND domain_id = $2",
            DASHBOARD_COLUMNS
        ))
        .bind(dashboard_id)
        .bind(domain_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch dashboard")?;

        row.as_ref().map(dashboard_from_row).transpose()
    }

    async fn update_dashboard(
        &self,
        dashboard_id: &str,
        domain_id: &str,
        patch: &DashboardPatch,
    ) -> Result<Option<DashboardRecord>> {
        if patch.is_empty() {
            return self.get_dashboard(dashboard_id, domain_id).await;
        }

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE dashboards SET ");
        {
            let mut set = builder.separated(", ");
            if let Some(name) = &patch.name {
                set.push("name = ").push_bind_unseparated(name.clone());
            }
            if let Some(layouts) = &patch.layouts {
                set.push("layouts = ").push_bind_unseparated(Json(layouts.clone()));
            }
            if let Some(variables) = &patch.variables {
                set.push("variables = ").push_bind_unseparated(Json(variables.clone()));
            }
            if let Some(settings) = &patch.settings {
                set.push("settings = ").push_bind_unseparated(Json(settings.clone()));
            }
            if let Some(schema) = &patch.variables_schema {
                set.push("variables_schema = ").push_bind_unseparated(Json(schema.clone()));
            }
            if let Some(labels) = &patch.labels {
                let labels = crate::model::normalize_labels(labels.clone());
                set.push("labels = ").push_bind_unseparated(Json(labels));
            }
            if let Some(tags) = &patch.tags {
                set.push("tags = ").push_bind_unseparated(Json(tags.clone()));
            }
        }
        builder.push(" WHERE dashboard_id = ");
        builder.push_bind(dashboard_id.to_string());
        builder.push(" AND domain_id = ");
        builder.push_bind(domain_id.to_string());
        builder.push(format!(" RETURNING {}", DASHBOARD_COLUMNS));

        self.select_dashboard(&mut builder).await
    }

    async fn replace_dashboard(&self, record: DashboardRecord) -> Result<Option<DashboardRecord>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE dashboards SET
                name = $3, dashboard_type = $4, version = $5, layouts = $6, variables = $7,
                settings = $8, variables_schema = $9, labels = $10, tags = $11, viewers = $12,
                resource_group = $13, user_id = $14, project_id = $15, workspace_id = $16,
                created_at = $17
            WHERE dashboard_id = $1 AND domain_id = $2
            RETURNING {}
            "#,
            DASHBOARD_COLUMNS
        ))
        .bind(&record.dashboard_id)
        .bind(&record.domain_id)
        .bind(&record.name)
        .bind(&record.dashboard_type)
        .bind(record.version)
        .bind(Json(&record.layouts))
        .bind(Json(&record.variables))
        .bind(Json(&record.settings))
        .bind(Json(&record.variables_schema))
        .bind(Json(&record.labels))
        .bind(Json(&record.tags))
        .bind(record.viewers.as_str())
        .bind(record.resource_group.as_str())
        .bind(&record.user_id)
        .bind(&record.project_id)
        .bind(&record.workspace_id)
        .bind(record.created_at)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to replace dashboard")?;

        row.as_ref().map(dashboard_from_row).transpose()
    }

    async fn increment_dashboard_version(
        &self,
        dashboard_id: &str,
        domain_id: &str,
    ) -> Result<Option<DashboardRecord>> {
        let row = sqlx::query(&format!(
            "UPDATE dashboards SET version = version + 1 WHERE dashboard_id = $1 AND domain_id = $2 RETURNING {}",
            DASHBOARD_COLUMNS
        ))
        .bind(dashboard_id)
        .bind(domain_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to increment dashboard version")?;

        row.as_ref().map(dashboard_from_row).transpose()
    }

    async fn reset_dashboard_version(
        &self,
        dashboard_id: &str,
        domain_id: &str,
        expected: Version,
        restored: Version,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE dashboards SET version = $3 WHERE dashboard_id = $1 AND domain_id = $2 AND version = $4",
        )
        .bind(dashboard_id)
        .bind(domain_id)
        .bind(restored)
        .bind(expected)
        .execute(&self.pool)
        .await
        .context("Failed to reset dashboard version")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_dashboard(&self, dashboard_id: &str, domain_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM dashboards WHERE dashboard_id = $1 AND domain_id = $2")
            .bind(dashboard_id)
            .bind(domain_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete dashboard")?;

        Ok(result.rows_affected() > 0)
    }

    async fn query_dashboards(&self, query: &Query) -> Result<(Vec<DashboardRecord>, usize)> {
        let default_sort = Sort {
            key: "created_at".to_string(),
            desc: false,
        };
        let (rows, total) = self
            .run_query(
                "dashboards",
                DASHBOARD_COLUMNS,
                DASHBOARD_QUERY_KEYS,
                query,
                &default_sort,
            )
            .await?;
        let records = rows
            .iter()
            .map(dashboard_from_row)
            .collect::<Result<Vec<_>>>()?;
        Ok((records, total))
    }

    async fn stat_dashboards(&self, query: &StatQuery) -> Result<StatResult> {
        let mut keys = Vec::with_capacity(query.group_by.len());
        for name in &query.group_by {
            keys.push(lookup_key(DASHBOARD_QUERY_KEYS, name).map_err(|e| anyhow!(e))?);
        }

        let mut builder = QueryBuilder::<Postgres>::new("SELECT ");
        for key in &keys {
            builder.push(format!("{}, ", key.name));
        }
        builder.push("COUNT(*) AS count FROM dashboards");
        push_where(&mut builder, DASHBOARD_QUERY_KEYS, &query.as_query())?;
        if !keys.is_empty() {
            let columns: Vec<&str> = keys.iter().map(|key| key.name).collect();
            builder.push(format!(" GROUP BY {}", columns.join(", ")));
        }
        builder.push(" ORDER BY count DESC");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to aggregate dashboards")?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let count: i64 = row.try_get("count")?;
            if count == 0 {
                continue;
            }
            let mut group = Document::new();
            for key in &keys {
                let value = match key.kind {
                    KeyKind::Integer => row
                        .try_get::<Option<i64>, _>(key.name)?
                        .map(Value::from)
                        .unwrap_or(Value::Null),
                    KeyKind::Timestamp => row
                        .try_get::<Option<DateTime<Utc>>, _>(key.name)?
                        .map(|ts| Value::String(ts.to_rfc3339()))
                        .unwrap_or(Value::Null),
                    _ => row
                        .try_get::<Option<String>, _>(key.name)?
                        .map(Value::String)
                        .unwrap_or(Value::Null),
                };
                group.insert(key.name.to_string(), value);
            }
            results.push(StatRow {
                group,
                count: count as u64,
            });
        }

        Ok(StatResult { results })
    }
}

#[async_trait::async_trait]
impl DashboardVersionStore for PostgresStore {
    async fn insert_version(&self, snapshot: VersionSnapshot) -> Result<VersionSnapshot> {
        let row = sqlx::query(&format!(
            "INSERT INTO dashboard_versions ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            VERSION_COLUMNS, VERSION_COLUMNS
        ))
        .bind(&snapshot.dashboard_id)
        .bind(snapshot.version)
        .bind(Json(&snapshot.layouts))
        .bind(Json(&snapshot.variables))
        .bind(Json(&snapshot.settings))
        .bind(Json(&snapshot.variables_schema))
        .bind(&snapshot.domain_id)
        .bind(snapshot.created_at)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert dashboard version")?;

        version_from_row(&row)
    }

    async fn get_version(
        &self,
        dashboard_id: &str,
        version: Version,
        domain_id: &str,
    ) -> Result<Option<VersionSnapshot>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM dashboard_versions WHERE dashboard_id = $1 AND version = $2 AND domain_id = $3",
            VERSION_COLUMNS
        ))
        .bind(dashboard_id)
        .bind(version)
        .bind(domain_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch dashboard version")?;

        row.as_ref().map(version_from_row).transpose()
    }

    async fn query_versions(&self, query: &Query) -> Result<(Vec<VersionSnapshot>, usize)> {
        let (rows, total) = self
            .run_query(
                "dashboard_versions",
                VERSION_COLUMNS,
                VERSION_QUERY_KEYS,
                query,
                &Sort::desc("version"),
            )
            .await?;
        let snapshots = rows
            .iter()
            .map(version_from_row)
            .collect::<Result<Vec<_>>>()?;
        Ok((snapshots, total))
    }

    async fn delete_version(
        &self,
        dashboard_id: &str,
        version: Version,
        domain_id: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM dashboard_versions WHERE dashboard_id = $1 AND version = $2 AND domain_id = $3",
        )
        .bind(dashboard_id)
        .bind(version)
        .bind(domain_id)
        .execute(&self.pool)
        .await
        .context("Failed to delete dashboard version")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_versions(&self, dashboard_id: &str, domain_id: &str) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM dashboard_versions WHERE dashboard_id = $1 AND domain_id = $2")
                .bind(dashboard_id)
                .bind(domain_id)
                .execute(&self.pool)
                .await
                .context("Failed to delete dashboard versions")?;

        Ok(result.rows_affected())
    }
}

impl Store for PostgresStore {}

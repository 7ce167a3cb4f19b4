use crate::application::ports::local_store::{ListOptions, LocalStore, OrderBy, RecordFilter};
use crate::domain::entities::Record;
use crate::domain::value_objects::{RecordId, Table};
use crate::infrastructure::database::connection::DbPool;
use crate::infrastructure::database::rows::RecordRow;
use crate::shared::error::{Result, SyncError};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::query::QueryAs;
use sqlx::sqlite::SqliteArguments;
use sqlx::Sqlite;
use tokio::sync::Mutex;

/// SQLite-backed local store over the fixed table set. Mutations serialize
/// against one internal write gate; reads go straight to the pool.
pub struct SqliteLocalStore {
    pool: DbPool,
    write_gate: Mutex<()>,
}

impl SqliteLocalStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            write_gate: Mutex::new(()),
        }
    }
}

#[async_trait]
impl LocalStore for SqliteLocalStore {
    async fn upsert(&self, record: &Record) -> Result<()> {
        let payload = serde_json::to_string(record.payload.as_json())?;
        // The clamp runs inside the statement, so updated_at stays
        // non-decreasing even when a writer that sampled the row earlier
        // lands after a newer concurrent write.
        let sql = format!(
            r#"
            INSERT INTO {} (id, payload, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                payload = excluded.payload,
                updated_at = max(excluded.updated_at, updated_at)
            "#,
            record.table.as_str()
        );

        let _guard = self.write_gate.lock().await;
        sqlx::query(&sql)
            .bind(record.id.as_str())
            .bind(&payload)
            .bind(record.created_at.timestamp_millis())
            .bind(record.updated_at.timestamp_millis())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_by_id(&self, table: Table, id: &RecordId) -> Result<Option<Record>> {
        let sql = format!("SELECT * FROM {} WHERE id = ?1", table.as_str());
        let row = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| row.into_record(table)).transpose()
    }

    async fn list(
        &self,
        table: Table,
        filter: &RecordFilter,
        options: &ListOptions,
    ) -> Result<Vec<Record>> {
        let mut sql = format!("SELECT * FROM {} WHERE 1 = 1", table.as_str());
        for (name, _) in &filter.fields {
            validate_field_name(name)?;
            sql.push_str(&format!(" AND json_extract(payload, '$.{name}') = ?"));
        }

        let order_column = match options.order_by {
            OrderBy::CreatedAt => "created_at",
            OrderBy::UpdatedAt => "updated_at",
        };
        let direction = if options.descending { "DESC" } else { "ASC" };
        sql.push_str(&format!(" ORDER BY {order_column} {direction}"));

        if let Some(limit) = options.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
            if let Some(offset) = options.offset {
                sql.push_str(&format!(" OFFSET {offset}"));
            }
        }

        let mut query = sqlx::query_as::<_, RecordRow>(&sql);
        for (_, value) in &filter.fields {
            query = bind_filter_value(query, value)?;
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(|row| row.into_record(table)).collect()
    }

    async fn delete(&self, table: Table, id: &RecordId) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", table.as_str());

        let _guard = self.write_gate.lock().await;
        let result = sqlx::query(&sql)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self, table: Table) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.as_str());
        let (count,): (i64,) = sqlx::query_as(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }
}

fn validate_field_name(name: &str) -> Result<()> {
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(SyncError::Validation(format!(
            "Invalid filter field name: {name}"
        )));
    }
    Ok(())
}

fn bind_filter_value<'q>(
    query: QueryAs<'q, Sqlite, RecordRow, SqliteArguments<'q>>,
    value: &'q Value,
) -> Result<QueryAs<'q, Sqlite, RecordRow, SqliteArguments<'q>>> {
    // json_extract yields TEXT for strings, INTEGER/REAL for numbers and
    // 0/1 for booleans, so bind the matching scalar.
    match value {
        Value::String(s) => Ok(query.bind(s.as_str())),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(query.bind(i))
            } else if let Some(f) = n.as_f64() {
                Ok(query.bind(f))
            } else {
                Err(SyncError::Validation("Unsupported filter number".to_string()))
            }
        }
        Value::Bool(b) => Ok(query.bind(i64::from(*b))),
        other => Err(SyncError::Validation(format!(
            "Unsupported filter value: {other}"
        ))),
    }
}

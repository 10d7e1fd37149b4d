use anyhow::{Context, Result};
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use std::sync::Arc;

use crate::model::{CoreKind, CoreObject, Id, RecordKind};
use crate::store::traits::{CoreStore, RecordStore, WriteGate, WriteOp};

const CREATE_RECORDS: &str = r#"
CREATE TABLE IF NOT EXISTS bgp_records (
    kind TEXT NOT NULL,
    id UUID NOT NULL,
    data JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (kind, id)
)
"#;

const CREATE_CORE_OBJECTS: &str = r#"
CREATE TABLE IF NOT EXISTS bgp_core_objects (
    kind TEXT NOT NULL,
    id UUID NOT NULL,
    name TEXT NOT NULL,
    slug TEXT,
    PRIMARY KEY (kind, id)
)
"#;

/// The write gate is per process, so one API process should own a database.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    gate: Arc<WriteGate>,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self {
            pool,
            gate: Arc::new(WriteGate::default()),
        })
    }

    /// Create the tables if they do not exist yet
    pub async fn migrate(&self) -> Result<()> {
        for statement in [CREATE_RECORDS, CREATE_CORE_OBJECTS] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to run schema migration")?;
        }
        log::info!("Database schema is up to date");
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn core_kind_from_str(kind: &str) -> Result<CoreKind> {
    serde_json::from_value(Value::String(kind.to_string()))
        .with_context(|| format!("Unknown core object kind '{}'", kind))
}

fn core_object_from_row(row: &sqlx::postgres::PgRow) -> Result<CoreObject> {
    let kind: String = row.try_get("kind")?;
    Ok(CoreObject {
        kind: core_kind_from_str(&kind)?,
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
    })
}

#[async_trait::async_trait]
impl RecordStore for PostgresStore {
    async fn fetch(&self, kind: RecordKind, id: &Id) -> Result<Option<Value>> {
        let row = sqlx::query("SELECT data FROM bgp_records WHERE kind = $1 AND id = $2")
            .bind(kind.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to fetch {} {}", kind, id))?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(row.try_get("data")?))
    }

    async fn fetch_all(&self, kind: RecordKind) -> Result<Vec<Value>> {
        let rows = sqlx::query("SELECT data FROM bgp_records WHERE kind = $1 ORDER BY created_at, id")
            .bind(kind.as_str())
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to list {} records", kind))?;

        rows.iter()
            .map(|row| row.try_get("data").map_err(anyhow::Error::from))
            .collect()
    }

    async fn commit(&self, ops: Vec<WriteOp>) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to start transaction")?;

        for op in ops {
            match op {
                WriteOp::Put { kind, id, data } => {
                    sqlx::query(
                        r#"
                        INSERT INTO bgp_records (kind, id, data)
                        VALUES ($1, $2, $3)
                        ON CONFLICT (kind, id) DO UPDATE SET
                            data = EXCLUDED.data,
                            updated_at = NOW()
                        "#,
                    )
                    .bind(kind.as_str())
                    .bind(id)
                    .bind(data)
                    .execute(&mut *tx)
                    .await
                    .with_context(|| format!("Failed to write {} {}", kind, id))?;
                }
                WriteOp::Delete { kind, id } => {
                    sqlx::query("DELETE FROM bgp_records WHERE kind = $1 AND id = $2")
                        .bind(kind.as_str())
                        .bind(id)
                        .execute(&mut *tx)
                        .await
                        .with_context(|| format!("Failed to delete {} {}", kind, id))?;
                }
            }
        }

        tx.commit().await.context("Failed to commit transaction")?;
        Ok(())
    }

    fn write_gate(&self) -> &WriteGate {
        &self.gate
    }
}

#[async_trait::async_trait]
impl CoreStore for PostgresStore {
    async fn get_core_object(&self, kind: CoreKind, id: &Id) -> Result<Option<CoreObject>> {
        let row = sqlx::query("SELECT kind, id, name, slug FROM bgp_core_objects WHERE kind = $1 AND id = $2")
            .bind(kind.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to fetch {} {}", kind, id))?;

        row.as_ref().map(core_object_from_row).transpose()
    }

    async fn find_status(&self, slug: &str) -> Result<Option<CoreObject>> {
        let row = sqlx::query("SELECT kind, id, name, slug FROM bgp_core_objects WHERE kind = $1 AND slug = $2")
            .bind(CoreKind::Status.as_str())
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch status")?;

        row.as_ref().map(core_object_from_row).transpose()
    }

    async fn upsert_core_object(&self, object: CoreObject) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO bgp_core_objects (kind, id, name, slug)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (kind, id) DO UPDATE SET
                name = EXCLUDED.name,
                slug = EXCLUDED.slug
            "#,
        )
        .bind(object.kind.as_str())
        .bind(object.id)
        .bind(&object.name)
        .bind(&object.slug)
        .execute(&self.pool)
        .await
        .context("Failed to upsert core object")?;

        Ok(())
    }
}

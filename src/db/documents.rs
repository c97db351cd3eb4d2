use serde_json::{Map, Value};
use sqlx::PgPool;
use sqlx::types::Json;
use xxhash_rust::xxh3::xxh3_128;

use crate::error::Result;
use crate::model::Collection;

/// Documents stored as JSONB rows in the shared `documents` table.
#[derive(Debug, Clone)]
pub struct PgCollection {
    pool: PgPool,
}

impl PgCollection {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl Collection for PgCollection {
    async fn ensure_unique(&self, model: &str, field: &str) -> Result<()> {
        // Partial index predicates must be literals, so this DDL cannot take bind params.
        let statement = format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {} ON documents ((body -> {})) WHERE model = {}",
            quote_ident(&unique_index_name(model, field)),
            quote_literal(field),
            quote_literal(model),
        );
        sqlx::raw_sql(&statement).execute(&self.pool).await?;
        tracing::info!("unique index ensured on {}.{}", model, field);
        Ok(())
    }

    async fn insert(&self, model: &str, fields: &Map<String, Value>) -> Result<()> {
        sqlx::query("INSERT INTO documents (model, body) VALUES ($1, $2)")
            .bind(model)
            .bind(Json(fields))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn replace(
        &self,
        model: &str,
        key_field: &str,
        fields: &Map<String, Value>,
    ) -> Result<u64> {
        let Some(key) = fields.get(key_field) else {
            return Ok(0);
        };
        let result = sqlx::query(
            "UPDATE documents SET body = $3 WHERE model = $1 AND body -> $2::text = $4",
        )
        .bind(model)
        .bind(key_field)
        .bind(Json(fields))
        .bind(Json(key))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn find_all(&self, model: &str) -> Result<Vec<Map<String, Value>>> {
        let rows: Vec<Json<Map<String, Value>>> =
            sqlx::query_scalar("SELECT body FROM documents WHERE model = $1 ORDER BY row_id")
                .bind(model)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|Json(fields)| fields).collect())
    }
}

/// Index name for one (model, field) pair.
///
/// Hashing a length-prefixed key keeps distinct pairs apart (`A_b`/`c` vs `A`/`b_c`)
/// and stays under the 63-byte identifier limit however long the names are.
fn unique_index_name(model: &str, field: &str) -> String {
    let key = format!("{}:{}{}", model.len(), model, field);
    format!("documents_unique_{:032x}", xxh3_128(key.as_bytes()))
}

/// Quote an identifier for DDL. Embedded double quotes are doubled.
fn quote_ident(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Quote a string literal for DDL. Embedded single quotes are doubled.
fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

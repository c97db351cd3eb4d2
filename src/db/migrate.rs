use sqlx::PgPool;

/// Execute the schema DDL (`identity_counters` and `documents`, all IF NOT EXISTS).
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(include_str!("../../sql/schema.sql"))
        .execute(pool)
        .await?;
    tracing::info!("identity counter schema migrated");
    Ok(())
}

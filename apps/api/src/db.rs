use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::candidate::CandidateRow;
use crate::models::job::JobRow;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

pub async fn fetch_job(pool: &PgPool, job_id: Uuid) -> Result<Option<JobRow>, sqlx::Error> {
    sqlx::query_as::<_, JobRow>(
        "SELECT id, organization_id, title, description, embedding, created_at FROM jobs WHERE id = $1",
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await
}

/// Loads the organisation's candidate pool in a stable order so that score
/// ties resolve the same way on every request.
pub async fn fetch_candidate_pool(
    pool: &PgPool,
    organization_id: Uuid,
    max_candidates: u32,
) -> Result<Vec<CandidateRow>, sqlx::Error> {
    sqlx::query_as::<_, CandidateRow>(
        r#"
        SELECT id, organization_id, first_name, last_name, current_title, current_company,
               skills, total_experience_months, city, country, embedding, created_at
        FROM candidates
        WHERE organization_id = $1
        ORDER BY created_at, id
        LIMIT $2
        "#,
    )
    .bind(organization_id)
    .bind(i64::from(max_candidates))
    .fetch_all(pool)
    .await
}

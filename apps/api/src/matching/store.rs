//! Read-only corpus queries for the online matching path.

use anyhow::Result;
use sqlx::PgPool;

use crate::models::case::{CanonicalCase, CaseRow, DegreeLevel};

/// Loads the corpus snapshot for one degree level, ordered by original id so
/// the scan order is stable across rebuilds.
pub async fn load_corpus(pool: &PgPool, degree: DegreeLevel) -> Result<Vec<CanonicalCase>> {
    let rows = sqlx::query_as::<_, CaseRow>(
        "SELECT * FROM cases WHERE degree_level = $1 ORDER BY original_id",
    )
    .bind(degree.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(CanonicalCase::from).collect())
}

/// Total number of canonical cases.
pub async fn count_cases(pool: &PgPool) -> Result<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM cases")
        .fetch_one(pool)
        .await?)
}

/// A small sample of canonical cases, for inspection endpoints.
pub async fn sample_cases(pool: &PgPool, limit: i64) -> Result<Vec<CanonicalCase>> {
    let rows = sqlx::query_as::<_, CaseRow>("SELECT * FROM cases ORDER BY original_id LIMIT $1")
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(CanonicalCase::from).collect())
}

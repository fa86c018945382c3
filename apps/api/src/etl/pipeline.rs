//! Batched corpus rebuild from the raw source store into the canonical
//! `cases` table.
//!
//! The rebuild truncates the target, then walks the source with keyset
//! pagination and inserts each batch inside one transaction. A failed batch
//! is rolled back and retried record by record, so one poison record costs
//! itself, not its batch. Infrastructure failures (connectivity, truncate)
//! abort the run; per-record failures are counted and logged.

use anyhow::{Context, Result};
use sqlx::{PgConnection, PgPool};
use tracing::{error, info, warn};

use crate::etl::extract::{extract_case, RawRecord};
use crate::matching::classifier::ClassifierTables;
use crate::models::case::CanonicalCase;

/// Outcome counters for one rebuild run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EtlReport {
    /// Records extracted and inserted.
    pub processed: u64,
    /// Records excluded by extraction (no institution, no degree level).
    pub rejected: u64,
    /// Records that failed to insert even on individual retry.
    pub failed: u64,
}

const INSERT_CASE_SQL: &str = "\
    INSERT INTO cases ( \
        original_id, institution, program, degree_level, \
        undergrad_school, undergrad_school_tier, undergrad_major, \
        gpa_original, gpa_scale_4, gpa_scale_100, \
        language_type, language_score, gre_score, \
        work_experience, graduation_year, original_url, original_title \
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)";

/// Rebuilds the canonical corpus from scratch.
pub async fn run_rebuild(
    source: &PgPool,
    target: &PgPool,
    tables: &ClassifierTables,
    batch_size: i64,
) -> Result<EtlReport> {
    info!(batch_size, "starting corpus rebuild");

    sqlx::query("TRUNCATE TABLE cases RESTART IDENTITY")
        .execute(target)
        .await
        .context("failed to truncate cases table")?;

    let mut report = EtlReport::default();
    let mut last_id: i64 = 0;

    loop {
        let batch = fetch_source_batch(source, last_id, batch_size)
            .await
            .context("failed to fetch source batch")?;
        if batch.is_empty() {
            break;
        }
        last_id = batch[batch.len() - 1].id;

        let cases = extract_batch(&batch, tables, &mut report);

        match insert_batch(target, &cases).await {
            Ok(()) => report.processed += cases.len() as u64,
            Err(err) => {
                warn!(
                    last_id,
                    error = %err,
                    "batch insert failed, retrying records individually"
                );
                retry_individually(target, &cases, &mut report).await?;
            }
        }
    }

    info!(
        processed = report.processed,
        rejected = report.rejected,
        failed = report.failed,
        "corpus rebuild finished"
    );
    Ok(report)
}

/// Extracts one fetched batch, counting each rejected record into the report.
/// Pure with respect to the stores — rejection counting needs no pool.
fn extract_batch(
    batch: &[RawRecord],
    tables: &ClassifierTables,
    report: &mut EtlReport,
) -> Vec<CanonicalCase> {
    let mut cases = Vec::with_capacity(batch.len());
    for record in batch {
        match extract_case(record, tables) {
            Ok(case) => cases.push(case),
            Err(reason) => {
                warn!(record_id = record.id, %reason, "record rejected");
                report.rejected += 1;
            }
        }
    }
    cases
}

async fn fetch_source_batch(
    source: &PgPool,
    last_id: i64,
    batch_size: i64,
) -> sqlx::Result<Vec<RawRecord>> {
    sqlx::query_as::<_, RawRecord>(
        "SELECT id, title, url, institution, program, background, \
                gpa, language_score, graduation_year \
         FROM raw_cases WHERE id > $1 ORDER BY id LIMIT $2",
    )
    .bind(last_id)
    .bind(batch_size)
    .fetch_all(source)
    .await
}

/// Inserts a whole batch inside one transaction; any failure rolls the
/// batch back.
async fn insert_batch(target: &PgPool, cases: &[CanonicalCase]) -> sqlx::Result<()> {
    let mut tx = target.begin().await?;
    for case in cases {
        insert_case(&mut *tx, case).await?;
    }
    tx.commit().await
}

/// Fallback after a failed batch: each record gets its own transaction so
/// the failure is isolated to the record that caused it.
async fn retry_individually(
    target: &PgPool,
    cases: &[CanonicalCase],
    report: &mut EtlReport,
) -> Result<()> {
    for case in cases {
        let mut tx = target.begin().await.context("failed to begin transaction")?;
        match insert_case(&mut *tx, case).await {
            Ok(()) => {
                tx.commit().await.context("failed to commit transaction")?;
                report.processed += 1;
            }
            Err(err) => {
                error!(original_id = case.original_id, error = %err, "record insert failed");
                report.failed += 1;
            }
        }
    }
    Ok(())
}

async fn insert_case(conn: &mut PgConnection, case: &CanonicalCase) -> sqlx::Result<()> {
    sqlx::query(INSERT_CASE_SQL)
        .bind(case.original_id)
        .bind(&case.institution)
        .bind(&case.program)
        .bind(case.degree_level.as_str())
        .bind(&case.undergrad_school)
        .bind(case.undergrad_school_tier.as_str())
        .bind(&case.undergrad_major)
        .bind(&case.gpa_original)
        .bind(case.gpa_scale_4)
        .bind(case.gpa_scale_100)
        .bind(case.language_type.map(|t| t.as_str()))
        .bind(case.language_score)
        .bind(case.gre_score)
        .bind(case.work_experience.as_str())
        .bind(case.graduation_year)
        .bind(&case.original_url)
        .bind(&case.original_title)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, title: &str, background: &str) -> RawRecord {
        RawRecord {
            id,
            title: Some(title.to_string()),
            background: Some(background.to_string()),
            ..RawRecord::default()
        }
    }

    #[test]
    fn test_extract_batch_counts_one_rejection_per_bad_record() {
        let tables = ClassifierTables::default();
        let batch = vec![
            record(1, "香港大学计算机科学硕士offer", "本科南京大学"),
            RawRecord {
                id: 2,
                ..RawRecord::default()
            },
            record(3, "新加坡国立大学数据科学硕士录取", ""),
        ];

        let mut report = EtlReport::default();
        let cases = extract_batch(&batch, &tables, &mut report);

        assert_eq!(cases.len(), 2);
        assert_eq!(report.rejected, 1);
        // processed/failed are insert-side counters; extraction leaves them alone
        assert_eq!(report.processed, 0);
        assert_eq!(report.failed, 0);
        assert_eq!(cases[0].original_id, 1);
        assert_eq!(cases[1].original_id, 3);
    }

    #[test]
    fn test_extract_batch_all_valid_rejects_nothing() {
        let tables = ClassifierTables::default();
        let batch = vec![
            record(1, "香港大学金融硕士offer", ""),
            record(2, "帝国理工学院机械工程博士录取", ""),
        ];

        let mut report = EtlReport::default();
        let cases = extract_batch(&batch, &tables, &mut report);

        assert_eq!(cases.len(), 2);
        assert_eq!(report, EtlReport::default());
    }
}

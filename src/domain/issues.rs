//! Issue domain - DB queries for issue reports
//!
//! All functions use the generic Executor pattern, allowing them to work with
//! both `&PgPool` (for standalone queries) and `&mut PgConnection` (for transactions).

use sqlx::{Executor, Postgres};

use crate::models::NewIssueReport;

#[derive(Debug, sqlx::FromRow)]
pub struct InsertedIssue {
    pub id: i64,
}

/// Insert a new issue report. `created_at` is assigned by the database.
pub async fn insert_issue<'e, E>(executor: E, report: &NewIssueReport) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result: InsertedIssue = sqlx::query_as(
        r#"
        INSERT INTO issues (issue_type, confidence, latitude, longitude, status, source, device_time, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
        RETURNING id
        "#,
    )
    .bind(&report.issue_type)
    .bind(report.confidence)
    .bind(report.latitude)
    .bind(report.longitude)
    .bind(report.status.as_str())
    .bind(report.source)
    .bind(&report.device_time)
    .fetch_one(executor)
    .await?;

    Ok(result.id)
}

/// Set the image URL of an issue. Returns the number of rows touched (0 when the id is unknown).
pub async fn set_image_url<'e, E>(executor: E, issue_id: i64, image_url: &str) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("UPDATE issues SET image_url = $1 WHERE id = $2")
        .bind(image_url)
        .bind(issue_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::{JobRow, ScoreWeights};

/// Parameters for inserting a new job posting.
pub struct NewJob<'a> {
    pub user_id: Uuid,
    pub title: &'a str,
    pub description: &'a str,
    pub required_skills: &'a [String],
    pub preferred_skills: &'a [String],
    pub min_experience: i32,
    pub score_weights: &'a ScoreWeights,
}

pub async fn insert_job(pool: &PgPool, job: NewJob<'_>) -> Result<JobRow, sqlx::Error> {
    let row = sqlx::query_as::<_, JobRow>(
        r#"
        INSERT INTO job_postings
            (user_id, title, description, required_skills, preferred_skills,
             min_experience, score_weights)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(job.user_id)
    .bind(job.title)
    .bind(job.description)
    .bind(job.required_skills)
    .bind(job.preferred_skills)
    .bind(job.min_experience)
    .bind(Json(job.score_weights))
    .fetch_one(pool)
    .await?;

    info!("Created job {} for user {}", row.id, row.user_id);
    Ok(row)
}

pub async fn list_jobs(pool: &PgPool, user_id: Uuid) -> Result<Vec<JobRow>, sqlx::Error> {
    sqlx::query_as::<_, JobRow>(
        "SELECT * FROM job_postings WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Loads a job and checks that `user_id` owns it.
pub async fn get_owned_job(pool: &PgPool, job_id: Uuid, user_id: Uuid) -> Result<JobRow, AppError> {
    let job = sqlx::query_as::<_, JobRow>("SELECT * FROM job_postings WHERE id = $1")
        .bind(job_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    if job.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    Ok(job)
}

/// Deletes a job; candidates go with it via `ON DELETE CASCADE`.
/// Returns the stored file paths of the deleted candidates so the caller can clean them up.
pub async fn delete_job(pool: &PgPool, job_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let file_paths: Vec<String> =
        sqlx::query_scalar("SELECT file_path FROM candidates WHERE job_id = $1")
            .bind(job_id)
            .fetch_all(&mut *tx)
            .await?;

    sqlx::query("DELETE FROM job_postings WHERE id = $1")
        .bind(job_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!("Deleted job {job_id} and {} candidate(s)", file_paths.len());
    Ok(file_paths)
}

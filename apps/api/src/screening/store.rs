use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::candidate::{CandidateRow, CandidateStatus};
use crate::screening::processor::ProcessOutcome;
use crate::storage::StoredFile;

/// Creates the candidate record for a freshly stored upload, with status `uploaded`
/// and no score.
pub async fn insert_uploaded(
    conn: &mut PgConnection,
    job_id: Uuid,
    user_id: Uuid,
    stored: &StoredFile,
) -> Result<Uuid, sqlx::Error> {
    let file_path = stored.path.to_string_lossy().into_owned();
    sqlx::query_scalar(
        r#"
        INSERT INTO candidates
            (job_id, user_id, original_filename, filename, file_path, status)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(job_id)
    .bind(user_id)
    .bind(&stored.original_filename)
    .bind(&stored.filename)
    .bind(file_path)
    .bind(CandidateStatus::Uploaded.as_str())
    .fetch_one(conn)
    .await
}

/// Applies the processor's outcome: the one and only update a candidate receives.
///
/// Failures store `match_score = 0.0` and keep any partial text.
pub async fn record_outcome(
    conn: &mut PgConnection,
    candidate_id: Uuid,
    outcome: &ProcessOutcome,
) -> Result<CandidateRow, sqlx::Error> {
    let query = sqlx::query_as::<_, CandidateRow>(
        r#"
        UPDATE candidates SET
            status = $2,
            name = $3,
            email = $4,
            phone = $5,
            experience_years = $6,
            matched_skills = $7,
            resume_text = $8,
            match_score = $9,
            score_breakdown = $10,
            error_message = $11,
            updated_at = NOW()
        WHERE id = $1 AND status = 'uploaded'
        RETURNING *
        "#,
    )
    .bind(candidate_id);

    let query = match outcome {
        ProcessOutcome::Processed(r) => query
            .bind(CandidateStatus::Processed.as_str())
            .bind(Some(&r.name))
            .bind(r.email.as_deref())
            .bind(r.phone.as_deref())
            .bind(r.experience_years.map(|y| y as i32))
            .bind(&r.matched_skills)
            .bind(Some(&r.resume_text))
            .bind(r.match_score)
            .bind(
                r.score_breakdown
                    .as_ref()
                    .and_then(|b| serde_json::to_value(b).ok()),
            )
            .bind(None::<String>),
        ProcessOutcome::Failed(f) => query
            .bind(CandidateStatus::Error.as_str())
            .bind(None::<String>)
            .bind(None::<String>)
            .bind(None::<String>)
            .bind(None::<i32>)
            .bind(Vec::<String>::new())
            .bind(Some(&f.resume_text))
            .bind(0.0_f64)
            .bind(None::<serde_json::Value>)
            .bind(Some(&f.error)),
    };

    query.fetch_one(conn).await
}

/// All candidates of a job, best score first; unscored rows last.
pub async fn list_for_job(pool: &PgPool, job_id: Uuid) -> Result<Vec<CandidateRow>, sqlx::Error> {
    sqlx::query_as::<_, CandidateRow>(
        "SELECT * FROM candidates WHERE job_id = $1 ORDER BY match_score DESC NULLS LAST, created_at",
    )
    .bind(job_id)
    .fetch_all(pool)
    .await
}

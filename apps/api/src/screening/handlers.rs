//! Axum route handlers for resume upload and candidate listing.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::handlers::UserIdQuery;
use crate::jobs::store::get_owned_job;
use crate::models::candidate::{CandidateRow, CandidateStatus};
use crate::models::job::JobRow;
use crate::screening::criteria::ScoreBand;
use crate::screening::processor::{process_resume, ProcessOutcome};
use crate::screening::store::{insert_uploaded, list_for_job, record_outcome};
use crate::state::AppState;
use crate::storage::{
    allowed_extension, store_upload, StoredFile, UploadGuard, ALLOWED_EXTENSIONS,
};

const UPLOAD_FIELD: &str = "file";

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

/// Candidate as returned to clients. Omits the full resume text.
#[derive(Debug, Serialize)]
pub struct CandidateSummary {
    pub id: Uuid,
    pub job_id: Uuid,
    pub status: String,
    pub original_filename: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub experience_years: Option<i32>,
    pub matched_skills: Vec<String>,
    pub match_score: Option<f64>,
    pub score_band: Option<ScoreBand>,
    pub score_breakdown: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<CandidateRow> for CandidateSummary {
    fn from(row: CandidateRow) -> Self {
        Self {
            score_band: row.match_score.map(ScoreBand::from_score),
            id: row.id,
            job_id: row.job_id,
            status: row.status,
            original_filename: row.original_filename,
            name: row.name,
            email: row.email,
            phone: row.phone,
            experience_years: row.experience_years,
            matched_skills: row.matched_skills,
            match_score: row.match_score,
            score_breakdown: row.score_breakdown,
            error_message: row.error_message,
            created_at: row.created_at,
        }
    }
}

struct Upload {
    filename: String,
    data: Vec<u8>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/jobs/:id/upload
///
/// Stores the resume, scores it against the job, and persists the candidate.
/// A resume that cannot be processed is still recorded (status `error`) and the
/// request answers 500 with the reason.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CandidateSummary>), AppError> {
    let job = get_owned_job(&state.db, job_id, params.user_id).await?;
    let upload = read_upload(multipart).await?;

    let stored = store_upload(&state.config.upload_dir, &upload.filename, &upload.data)
        .await
        .map_err(|e| AppError::Storage(format!("{e:#}")))?;

    let guard = UploadGuard::new(stored.path.clone());

    let candidate = screen_and_persist(&state, &job, params.user_id, &stored).await?;
    guard.keep();

    if candidate.status != CandidateStatus::Processed.as_str() {
        let message = candidate
            .error_message
            .clone()
            .unwrap_or_else(|| "Resume could not be processed".to_string());
        return Err(AppError::Processing {
            candidate_id: candidate.id,
            message,
        });
    }

    Ok((StatusCode::CREATED, Json(candidate.into())))
}

/// GET /api/v1/jobs/:id/candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<CandidateSummary>>, AppError> {
    get_owned_job(&state.db, job_id, params.user_id).await?;
    let candidates = list_for_job(&state.db, job_id).await?;
    Ok(Json(candidates.into_iter().map(Into::into).collect()))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Runs the processor, then creates the candidate and records its outcome in one
/// short transaction. No pool connection is held while the resume is parsed or scored.
async fn screen_and_persist(
    state: &AppState,
    job: &JobRow,
    user_id: Uuid,
    stored: &StoredFile,
) -> Result<CandidateRow, AppError> {
    let outcome = process_resume(&stored.path, job, state.scorer.as_ref()).await;

    let mut tx = state.db.begin().await?;
    let candidate_id = insert_uploaded(&mut *tx, job.id, user_id, stored).await?;
    let candidate = record_outcome(&mut *tx, candidate_id, &outcome).await?;
    tx.commit().await?;

    match &outcome {
        ProcessOutcome::Processed(r) => info!(
            "Candidate {candidate_id} for job {} scored {}",
            job.id, r.match_score
        ),
        ProcessOutcome::Failed(f) => error!(
            "Candidate {candidate_id} for job {} failed processing: {}",
            job.id, f.error
        ),
    }

    Ok(candidate)
}

/// Pulls the `file` field out of the multipart body and validates name and content.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| AppError::Validation("No selected file".to_string()))?;

        if allowed_extension(&filename).is_none() {
            return Err(AppError::Validation(format!(
                "File type not allowed; expected one of: {}",
                ALLOWED_EXTENSIONS.join(", ")
            )));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;
        if data.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }

        return Ok(Upload {
            filename,
            data: data.to_vec(),
        });
    }

    Err(AppError::Validation(format!(
        "No '{UPLOAD_FIELD}' part in the request"
    )))
}

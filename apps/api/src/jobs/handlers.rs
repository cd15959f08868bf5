//! Axum route handlers for the Jobs API.

use std::path::Path as FsPath;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::store::{delete_job, get_owned_job, insert_job, list_jobs, NewJob};
use crate::models::job::{JobRow, ScoreWeights};
use crate::state::AppState;
use crate::storage::remove_stored;

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    #[serde(default)]
    pub min_experience: i32,
    pub score_weights: Option<ScoreWeights>,
}

impl CreateJobRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("title cannot be empty".to_string()));
        }
        if self.description.trim().is_empty() {
            return Err(AppError::Validation("description cannot be empty".to_string()));
        }
        if self.min_experience < 0 {
            return Err(AppError::Validation(
                "min_experience cannot be negative".to_string(),
            ));
        }
        if let Some(w) = &self.score_weights {
            let all = [w.skills, w.experience, w.semantic];
            if all.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(AppError::Validation(
                    "score_weights must be finite and non-negative".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Trims entries and drops blanks and case-insensitive duplicates, keeping first spelling.
fn normalize_skills(skills: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for skill in skills.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        if !out.iter().any(|s| s.eq_ignore_ascii_case(skill)) {
            out.push(skill.to_string());
        }
    }
    out
}

/// Preferred skills that are already required carry no extra weight; drop them.
fn preferred_not_required(preferred: Vec<String>, required: &[String]) -> Vec<String> {
    preferred
        .into_iter()
        .filter(|p| !required.iter().any(|r| r.eq_ignore_ascii_case(p)))
        .collect()
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    req.validate()?;

    let required_skills = normalize_skills(&req.required_skills);
    let preferred_skills = preferred_not_required(
        normalize_skills(&req.preferred_skills),
        &required_skills,
    );
    let score_weights = req.score_weights.clone().unwrap_or_default();

    let job = insert_job(
        &state.db,
        NewJob {
            user_id: params.user_id,
            title: req.title.trim(),
            description: &req.description,
            required_skills: &required_skills,
            preferred_skills: &preferred_skills,
            min_experience: req.min_experience,
            score_weights: &score_weights,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<JobRow>>, AppError> {
    Ok(Json(list_jobs(&state.db, params.user_id).await?))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<JobRow>, AppError> {
    Ok(Json(get_owned_job(&state.db, job_id, params.user_id).await?))
}

/// DELETE /api/v1/jobs/:id
///
/// Cascades to the job's candidates and removes their stored resumes.
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    get_owned_job(&state.db, job_id, params.user_id).await?;

    let file_paths = delete_job(&state.db, job_id).await?;
    for path in &file_paths {
        remove_stored(FsPath::new(path)).await;
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str, description: &str) -> CreateJobRequest {
        CreateJobRequest {
            title: title.to_string(),
            description: description.to_string(),
            required_skills: vec![],
            preferred_skills: vec![],
            min_experience: 0,
            score_weights: None,
        }
    }

    #[test]
    fn test_blank_title_rejected() {
        assert!(matches!(
            request("  ", "Build services").validate(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_blank_description_rejected() {
        assert!(request("Engineer", "\n").validate().is_err());
    }

    #[test]
    fn test_negative_weights_rejected() {
        let mut req = request("Engineer", "Build services");
        req.score_weights = Some(ScoreWeights {
            skills: -0.1,
            experience: 0.5,
            semantic: 0.5,
        });
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_negative_experience_rejected() {
        let mut req = request("Engineer", "Build services");
        req.min_experience = -1;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(request("Engineer", "Build services").validate().is_ok());
    }

    #[test]
    fn test_request_defaults_from_json() {
        let req: CreateJobRequest =
            serde_json::from_str(r#"{"title": "Engineer", "description": "Rust"}"#).unwrap();
        assert!(req.required_skills.is_empty());
        assert_eq!(req.min_experience, 0);
        assert!(req.score_weights.is_none());
    }

    #[test]
    fn test_normalize_skills_dedups_case_insensitively() {
        let skills = vec![
            " Rust ".to_string(),
            "rust".to_string(),
            "".to_string(),
            "Go".to_string(),
        ];
        assert_eq!(normalize_skills(&skills), vec!["Rust", "Go"]);
    }

    #[test]
    fn test_required_skill_removed_from_preferred() {
        let required = vec!["Python".to_string()];
        let preferred = vec!["python".to_string(), "Go".to_string()];
        assert_eq!(preferred_not_required(preferred, &required), vec!["Go"]);
    }
}

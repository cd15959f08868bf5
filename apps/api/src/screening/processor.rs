//! Resume Processor: runs extraction, scoring and info extraction for one uploaded resume.
//!
//! `started → text_extracted → scored → done`, or `started → extraction_failed → done`.
//! This is the failure-containment boundary: every error becomes a `ProcessOutcome::Failed`.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::models::job::JobRow;
use crate::screening::criteria::{compute_breakdown, ScoreBreakdown};
use crate::screening::extractor::{extract_text_blocking, ExtractionError};
use crate::screening::info::{
    extract_email, extract_experience_years, extract_name, extract_phone,
};
use crate::screening::similarity::SimilarityScorer;

/// Decimal places kept in `match_score` (0–1 scale).
const SCORE_PRECISION: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Started,
    TextExtracted,
    Scored,
    ExtractionFailed,
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedResume {
    pub resume_text: String,
    pub match_score: f64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub experience_years: Option<u32>,
    pub matched_skills: Vec<String>,
    pub score_breakdown: Option<ScoreBreakdown>,
    pub scorer_backend: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingFailure {
    pub error: String,
    /// Whatever text was extracted before the failure (often empty).
    #[serde(skip)]
    pub resume_text: String,
    #[serde(skip)]
    pub failed_at: Stage,
}

/// Serializes as `{resume_text, match_score, name, ...}` or `{error}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProcessOutcome {
    Processed(ProcessedResume),
    Failed(ProcessingFailure),
}

/// Processes a stored resume against a job. Never returns an error: failures are values.
pub async fn process_resume(
    path: &Path,
    job: &JobRow,
    scorer: &dyn SimilarityScorer,
) -> ProcessOutcome {
    let mut stage = Stage::Started;
    debug!(path = %path.display(), job_id = %job.id, ?stage, "Processing resume");

    let resume_text = match extract_text_blocking(path.to_path_buf()).await {
        Ok(text) if text.trim().is_empty() => {
            return extraction_failed(path, ExtractionError::Empty, text);
        }
        Ok(text) => text,
        Err(e) => return extraction_failed(path, e, String::new()),
    };
    stage = Stage::TextExtracted;
    debug!(?stage, chars = resume_text.len(), "Resume text extracted");

    let similarity = scorer.score(&resume_text, &job.description).await;
    let experience_years = extract_experience_years(&resume_text);

    let breakdown = job
        .has_criteria()
        .then(|| compute_breakdown(&resume_text, job, round_score(similarity), experience_years))
        .map(round_breakdown);
    let raw_score = breakdown.as_ref().map(|b| b.overall).unwrap_or(similarity);
    let match_score = round_score(raw_score);
    stage = Stage::Scored;
    debug!(?stage, match_score, backend = scorer.backend(), "Resume scored");

    let processed = ProcessedResume {
        name: extract_name(&resume_text),
        email: extract_email(&resume_text),
        phone: extract_phone(&resume_text),
        experience_years,
        matched_skills: breakdown
            .as_ref()
            .map(|b| b.matched_skills.clone())
            .unwrap_or_default(),
        score_breakdown: breakdown,
        match_score,
        scorer_backend: scorer.backend().to_string(),
        resume_text,
    };

    stage = Stage::Done;
    info!(
        job_id = %job.id,
        match_score = processed.match_score,
        name = %processed.name,
        ?stage,
        "Resume processed"
    );
    ProcessOutcome::Processed(processed)
}

fn extraction_failed(path: &Path, err: ExtractionError, partial_text: String) -> ProcessOutcome {
    match &err {
        ExtractionError::Aborted(_) | ExtractionError::Io(_) => {
            error!(path = %path.display(), "Error processing resume: {err}")
        }
        _ => warn!(path = %path.display(), "Error processing resume: {err}"),
    }
    ProcessOutcome::Failed(ProcessingFailure {
        error: err.to_string(),
        resume_text: partial_text,
        failed_at: Stage::ExtractionFailed,
    })
}

pub fn round_score(score: f64) -> f64 {
    let factor = 10_f64.powi(SCORE_PRECISION);
    (score * factor).round() / factor
}

fn round_breakdown(mut b: ScoreBreakdown) -> ScoreBreakdown {
    b.skills = round_score(b.skills);
    b.experience = round_score(b.experience);
    b.overall = round_score(b.overall);
    b
}

//! Similarity Scoring: pluggable, trait-based relevance score between a resume and a job description.
//!
//! Default: `LexicalScorer` (pure-Rust, deterministic, always available).
//! Optional: `SemanticScorer` (embedding cosine similarity), chosen once at startup by
//! `select_scorer` when an embedding endpoint is configured and reachable.
//!
//! `AppState` holds an `Arc<dyn SimilarityScorer>`; call sites never branch on the backend.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::embedding_client::{EmbeddingClient, EmbeddingError};

const SEQUENCE_WEIGHT: f64 = 0.3;
const KEYWORD_WEIGHT: f64 = 0.7;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").expect("valid word regex"));

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "the", "and", "or", "for", "with", "from", "that", "this", "of", "in", "on",
        "at", "to", "by", "as", "is", "are", "was", "were", "be", "been", "being", "has", "have",
        "had", "will", "would", "could", "should", "can", "not", "but", "its", "our", "their",
        "your", "you", "we", "they", "it", "into", "over", "about", "such", "than", "very",
    ]
    .into_iter()
    .collect()
});

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Relevance of a resume to a job description, in `[0, 1]`.
///
/// Implementations never fail: a backend that cannot answer degrades to the
/// lexical score internally.
#[async_trait]
pub trait SimilarityScorer: Send + Sync {
    async fn score(&self, resume_text: &str, job_description: &str) -> f64;

    /// Short label recorded with each score ("lexical" | "semantic").
    fn backend(&self) -> &'static str;
}

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("embedding request failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("embedding dimensions differ ({0} vs {1})")]
    DimensionMismatch(usize, usize),

    #[error("embedding has zero magnitude")]
    ZeroVector,
}

// ────────────────────────────────────────────────────────────────────────────
// LexicalScorer: always-available fallback
// ────────────────────────────────────────────────────────────────────────────

/// Combines character-level sequence similarity with keyword-set overlap.
///
/// Algorithm:
/// 1. sequence = normalized Levenshtein ratio of the lowercased texts
/// 2. overlap = |resume_words ∩ job_words| / |job_words| (0 if no job words)
/// 3. score = min(0.3 × sequence + 0.7 × overlap, 1.0)
pub struct LexicalScorer;

#[async_trait]
impl SimilarityScorer for LexicalScorer {
    async fn score(&self, resume_text: &str, job_description: &str) -> f64 {
        lexical_similarity_blocking(resume_text, job_description).await
    }

    fn backend(&self) -> &'static str {
        "lexical"
    }
}

/// Runs [`lexical_similarity`] on the blocking pool.
///
/// The edit-distance term is quadratic in text length, so long resumes must not
/// run on an async worker. A panicked task scores 0.
pub async fn lexical_similarity_blocking(resume_text: &str, job_description: &str) -> f64 {
    let (resume_text, job_description) = (resume_text.to_owned(), job_description.to_owned());
    tokio::task::spawn_blocking(move || lexical_similarity(&resume_text, &job_description))
        .await
        .unwrap_or_else(|e| {
            warn!("Lexical scoring task failed: {e}");
            0.0
        })
}

pub fn lexical_similarity(resume_text: &str, job_description: &str) -> f64 {
    let sequence = sequence_similarity(resume_text, job_description);
    let overlap = keyword_overlap(resume_text, job_description);
    (SEQUENCE_WEIGHT * sequence + KEYWORD_WEIGHT * overlap).min(1.0)
}

/// Normalized edit-distance similarity of the lowercased texts, in `[0, 1]`.
pub fn sequence_similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// Share of the job's vocabulary that also appears in the resume.
///
/// Not symmetric: the denominator is always the job's word set.
pub fn keyword_overlap(resume_text: &str, job_description: &str) -> f64 {
    let mut resume_words = word_set(resume_text);
    let mut job_words = word_set(job_description);

    // Stop words only count when the job has nothing else.
    if job_words.iter().any(|w| !STOP_WORDS.contains(w.as_str())) {
        job_words.retain(|w| !STOP_WORDS.contains(w.as_str()));
        resume_words.retain(|w| !STOP_WORDS.contains(w.as_str()));
    }

    if job_words.is_empty() {
        return 0.0;
    }

    let shared = resume_words.intersection(&job_words).count();
    shared as f64 / job_words.len() as f64
}

/// Lowercased word tokens of `text`.
pub fn word_set(text: &str) -> HashSet<String> {
    let lower = text.to_lowercase();
    WORD_RE
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// SemanticScorer: embedding cosine similarity
// ────────────────────────────────────────────────────────────────────────────

pub struct SemanticScorer {
    client: EmbeddingClient,
}

impl SemanticScorer {
    pub fn new(client: EmbeddingClient) -> Self {
        Self { client }
    }

    pub async fn try_score(
        &self,
        resume_text: &str,
        job_description: &str,
    ) -> Result<f64, ScoringError> {
        let vectors = self.client.embed(&[resume_text, job_description]).await?;
        let similarity = cosine_similarity(&vectors[0], &vectors[1])?;
        Ok(similarity.clamp(0.0, 1.0))
    }
}

#[async_trait]
impl SimilarityScorer for SemanticScorer {
    async fn score(&self, resume_text: &str, job_description: &str) -> f64 {
        match self.try_score(resume_text, job_description).await {
            Ok(score) => score,
            Err(e) => {
                warn!("Semantic scoring failed, falling back to lexical: {e}");
                lexical_similarity_blocking(resume_text, job_description).await
            }
        }
    }

    fn backend(&self) -> &'static str {
        "semantic"
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, ScoringError> {
    if a.len() != b.len() {
        return Err(ScoringError::DimensionMismatch(a.len(), b.len()));
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(ScoringError::ZeroVector);
    }
    Ok(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

// ────────────────────────────────────────────────────────────────────────────
// Startup selection
// ────────────────────────────────────────────────────────────────────────────

/// Picks the process-wide scorer.
///
/// Semantic scoring is used only when `EMBEDDING_API_URL` is set and the
/// endpoint answers a one-off probe; otherwise the lexical scorer is returned.
pub async fn select_scorer(config: &Config) -> Arc<dyn SimilarityScorer> {
    let Some(url) = config.embedding_api_url.as_deref() else {
        info!("No embedding endpoint configured; using lexical similarity");
        return Arc::new(LexicalScorer);
    };

    let client = match EmbeddingClient::new(
        url,
        config.embedding_api_key.clone(),
        config.embedding_model.clone(),
    ) {
        Ok(client) => client,
        Err(e) => {
            warn!("Could not build embedding client ({e}); using lexical similarity");
            return Arc::new(LexicalScorer);
        }
    };

    match client.embed(&["resume screener startup probe"]).await {
        Ok(_) => {
            info!("Semantic similarity enabled (model: {})", client.model());
            Arc::new(SemanticScorer::new(client))
        }
        Err(e) => {
            warn!("Embedding endpoint unavailable ({e}); using lexical similarity");
            Arc::new(LexicalScorer)
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

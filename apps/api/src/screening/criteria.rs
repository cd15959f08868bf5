//! Criteria scoring: weighted blend of skills, experience and text similarity for jobs
//! that declare structured requirements.

use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::job::{JobRow, ScoreWeights};

const REQUIRED_SKILL_WEIGHT: f64 = 1.0;
const PREFERRED_SKILL_WEIGHT: f64 = 0.5;

/// Coarse label for a match score: high (≥ 0.7), medium (≥ 0.5), low otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

impl ScoreBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.7 {
            ScoreBand::High
        } else if score >= 0.5 {
            ScoreBand::Medium
        } else {
            ScoreBand::Low
        }
    }
}

/// Per-criterion scores behind a candidate's overall match score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreBreakdown {
    pub skills: f64,      // 0.0 – 1.0
    pub experience: f64,  // 0.0 – 1.0
    pub semantic: f64,    // similarity score
    pub overall: f64,     // weighted, 0.0 – 1.0
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub weights: ScoreWeights,
}

/// Scores a resume against a job's structured criteria.
///
/// `overall = Σ(weight × score) / Σ(weight)`; all-zero weights yield the similarity score.
pub fn compute_breakdown(
    resume_text: &str,
    job: &JobRow,
    similarity: f64,
    experience_years: Option<u32>,
) -> ScoreBreakdown {
    let weights = job.score_weights.0.clone();

    let (skills, matched_skills, missing_skills) =
        skills_score(resume_text, &job.required_skills, &job.preferred_skills);
    let experience = experience_score(experience_years, job.min_experience);

    let total_weight = weights.total();
    let overall = if total_weight > 0.0 {
        ((weights.skills * skills + weights.experience * experience + weights.semantic * similarity)
            / total_weight)
            .clamp(0.0, 1.0)
    } else {
        similarity
    };

    ScoreBreakdown {
        skills,
        experience,
        semantic: similarity,
        overall,
        matched_skills,
        missing_skills,
        weights,
    }
}

/// Weighted share of listed skills found in the resume: required count fully,
/// preferred count half. Returns 1.0 when the job lists no skills.
fn skills_score(
    resume_text: &str,
    required: &[String],
    preferred: &[String],
) -> (f64, Vec<String>, Vec<String>) {
    let mut matched = Vec::new();
    let mut missing = Vec::new();
    let mut total_weight = 0.0_f64;
    let mut matched_weight = 0.0_f64;

    let listed = required
        .iter()
        .map(|s| (s, REQUIRED_SKILL_WEIGHT))
        .chain(preferred.iter().map(|s| (s, PREFERRED_SKILL_WEIGHT)));

    let mut seen: HashSet<String> = HashSet::new();
    for (skill, weight) in listed {
        let skill = skill.trim();
        // A skill listed twice counts once, at its first (highest) weight.
        if skill.is_empty() || !seen.insert(skill.to_lowercase()) {
            continue;
        }
        total_weight += weight;
        if mentions_skill(resume_text, skill) {
            matched_weight += weight;
            matched.push(skill.to_string());
        } else {
            missing.push(skill.to_string());
        }
    }

    let score = if total_weight > 0.0 {
        matched_weight / total_weight
    } else {
        1.0
    };
    (score, matched, missing)
}

/// Case-insensitive whole-term match that also works for terms like "C++" or "node.js".
fn mentions_skill(resume_text: &str, skill: &str) -> bool {
    let pattern = format!(r"(?i)(?:^|[^\w]){}(?:[^\w]|$)", regex::escape(skill));
    Regex::new(&pattern)
        .map(|re| re.is_match(resume_text))
        .unwrap_or(false)
}

fn experience_score(years: Option<u32>, min_experience: i32) -> f64 {
    if min_experience <= 0 {
        return 1.0;
    }
    match years {
        Some(y) => (f64::from(y) / f64::from(min_experience)).min(1.0),
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    fn make_job(required: &[&str], preferred: &[&str], min_experience: i32) -> JobRow {
        JobRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Backend Engineer".to_string(),
            description: "Python backend engineer with AWS experience".to_string(),
            required_skills: required.iter().map(|s| s.to_string()).collect(),
            preferred_skills: preferred.iter().map(|s| s.to_string()).collect(),
            min_experience,
            score_weights: Json(ScoreWeights::default()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_all_skills_matched() {
        let job = make_job(&["Python", "AWS"], &[], 0);
        let b = compute_breakdown("Python and aws daily", &job, 0.5, None);
        assert_eq!(b.skills, 1.0);
        assert_eq!(b.matched_skills, vec!["Python", "AWS"]);
        assert!(b.missing_skills.is_empty());
    }

    #[test]
    fn test_preferred_skills_count_half() {
        // required python matched (1.0), preferred go missing (0.5) → 1.0 / 1.5
        let job = make_job(&["python"], &["go"], 0);
        let b = compute_breakdown("python developer", &job, 0.0, None);
        assert!((b.skills - 1.0 / 1.5).abs() < 1e-9, "skills was {}", b.skills);
        assert_eq!(b.missing_skills, vec!["go"]);
    }

    #[test]
    fn test_skill_in_both_lists_counts_once() {
        let job = make_job(&["Python", "Kafka"], &["python", "Go"], 0);
        let b = compute_breakdown("python developer", &job, 0.0, None);
        // python 1.0 matched; kafka 1.0 and go 0.5 missing → 1.0 / 2.5
        assert!((b.skills - 0.4).abs() < 1e-9, "skills was {}", b.skills);
        assert_eq!(b.matched_skills, vec!["Python"]);
        assert_eq!(b.missing_skills, vec!["Kafka", "Go"]);
    }

    #[test]
    fn test_skill_match_is_whole_term() {
        assert!(mentions_skill("Worked with C++ and Rust", "c++"));
        assert!(mentions_skill("node.js services", "Node.js"));
        assert!(!mentions_skill("javascript", "java"));
    }

    #[test]
    fn test_experience_ratio_capped() {
        assert_eq!(experience_score(Some(10), 5), 1.0);
        assert_eq!(experience_score(Some(2), 4), 0.5);
        assert_eq!(experience_score(None, 3), 0.0);
        assert_eq!(experience_score(None, 0), 1.0);
    }

    #[test]
    fn test_overall_weighted_average() {
        // skills 1.0 × 0.5 + experience 0.5 × 0.3 + semantic 0.4 × 0.2 = 0.73
        let job = make_job(&["rust"], &[], 4);
        let b = compute_breakdown("rust", &job, 0.4, Some(2));
        assert!((b.overall - 0.73).abs() < 1e-9, "overall was {}", b.overall);
    }

    #[test]
    fn test_score_bands() {
        assert_eq!(ScoreBand::from_score(0.7), ScoreBand::High);
        assert_eq!(ScoreBand::from_score(0.69), ScoreBand::Medium);
        assert_eq!(ScoreBand::from_score(0.5), ScoreBand::Medium);
        assert_eq!(ScoreBand::from_score(0.1), ScoreBand::Low);
    }

    #[test]
    fn test_zero_weights_fall_back_to_similarity() {
        let mut job = make_job(&["rust"], &[], 0);
        job.score_weights = Json(ScoreWeights {
            skills: 0.0,
            experience: 0.0,
            semantic: 0.0,
        });
        let b = compute_breakdown("rust", &job, 0.42, None);
        assert_eq!(b.overall, 0.42);
    }
}

//! Intelligence Provider: extraction, question generation, answer scoring and
//! interview summaries.
//!
//! The session controller only sees the `IntelligenceProvider` trait and holds it
//! as `Arc<dyn IntelligenceProvider>`; `LlmIntelligence` is the production backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::models::candidate::{Answer, Candidate, InterviewProfile, Question};

pub mod fallback;
pub mod llm;
pub mod prompts;

pub use llm::LlmIntelligence;

#[derive(Debug, Error)]
pub enum IntelligenceError {
    #[error("model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("model returned unusable data: {0}")]
    Malformed(String),
}

/// Structured fields pulled out of a resume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidateFields {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub skills: Vec<String>,
    pub experience: Vec<String>,
    pub education: Vec<String>,
    /// Field names the extractor considered missing or incomplete.
    pub missing_info: Vec<String>,
}

impl CandidateFields {
    pub fn from_candidate(candidate: &Candidate) -> Self {
        Self {
            name: candidate.name.clone(),
            email: candidate.email.clone(),
            phone: candidate.phone.clone(),
            skills: candidate.skills.clone(),
            experience: candidate.experience.clone(),
            education: candidate.education.clone(),
            missing_info: candidate.missing_info.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEvaluation {
    /// Nominally 0 – 10; the controller clamps and rounds.
    pub score: f64,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Recommendation {
    Hire,
    Maybe,
    NoHire,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewSummary {
    /// 0 – 100. Authoritative over the locally computed estimate when present.
    #[serde(default)]
    pub overall_score: Option<f64>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub recommendation: Option<Recommendation>,
}

#[async_trait]
pub trait IntelligenceProvider: Send + Sync {
    async fn extract_candidate_fields(
        &self,
        resume_text: &str,
    ) -> Result<CandidateFields, IntelligenceError>;

    /// Six questions: two easy, two medium, two hard, with growing time limits.
    async fn generate_questions(
        &self,
        fields: &CandidateFields,
        profile: InterviewProfile,
    ) -> Result<Vec<Question>, IntelligenceError>;

    async fn score_answer(
        &self,
        question: &Question,
        answer: &str,
        seconds_spent: u32,
        previous_answers: &[Answer],
    ) -> Result<AnswerEvaluation, IntelligenceError>;

    async fn summarize_interview(
        &self,
        fields: &CandidateFields,
        questions: &[Question],
        answers: &[Answer],
    ) -> Result<InterviewSummary, IntelligenceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_fields_tolerates_partial_json() {
        let json = r#"{"name": "Ada Lovelace", "missingInfo": ["phone"]}"#;
        let fields: CandidateFields = serde_json::from_str(json).unwrap();
        assert_eq!(fields.name, "Ada Lovelace");
        assert!(fields.email.is_empty());
        assert_eq!(fields.missing_info, vec!["phone".to_string()]);
    }

    #[test]
    fn test_summary_parses_recommendation() {
        let json = r#"{"overallScore": 80, "summary": "Solid.", "recommendation": "no-hire"}"#;
        let summary: InterviewSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.overall_score, Some(80.0));
        assert_eq!(summary.recommendation, Some(Recommendation::NoHire));
    }

    #[test]
    fn test_summary_without_score() {
        let summary: InterviewSummary = serde_json::from_str(r#"{"summary": "x"}"#).unwrap();
        assert!(summary.overall_score.is_none());
        assert!(summary.recommendation.is_none());
    }
}

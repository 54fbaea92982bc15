use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of questions in every interview run.
pub const QUESTIONS_PER_INTERVIEW: usize = 6;

/// Record layout version written by this binary.
pub const CANDIDATE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateStatus {
    Uploading,
    InfoCollection,
    Interviewing,
    Paused,
    Completed,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Uploading => "uploading",
            CandidateStatus::InfoCollection => "info-collection",
            CandidateStatus::Interviewing => "interviewing",
            CandidateStatus::Paused => "paused",
            CandidateStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "uploading" => Some(CandidateStatus::Uploading),
            "info-collection" => Some(CandidateStatus::InfoCollection),
            "interviewing" => Some(CandidateStatus::Interviewing),
            "paused" => Some(CandidateStatus::Paused),
            "completed" => Some(CandidateStatus::Completed),
            _ => None,
        }
    }
}

/// Question-focus track chosen before questions are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterviewProfile {
    FullstackNode,
    React,
}

impl InterviewProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewProfile::FullstackNode => "fullstack-node",
            InterviewProfile::React => "react",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "fullstack-node" => Some(InterviewProfile::FullstackNode),
            "react" => Some(InterviewProfile::React),
            _ => None,
        }
    }

    /// Role description handed to question generation.
    pub fn focus(&self) -> &'static str {
        match self {
            InterviewProfile::FullstackNode => {
                "Full-stack development with Node.js, Express, MongoDB/PostgreSQL, and React frontend"
            }
            InterviewProfile::React => {
                "React frontend development with modern libraries, state management, and UI/UX"
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default)]
    pub id: String,
    pub question: String,
    pub difficulty: Difficulty,
    /// Seconds allowed to answer.
    pub time_limit: u32,
    #[serde(default)]
    pub category: String,
    /// Advisory only; consumed by the scoring model, never checked locally.
    #[serde(default)]
    pub expected_keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: String,
    pub answer: String,
    pub time_spent: u32,
    /// 0 – 10
    pub score: u8,
    pub feedback: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionOutcome {
    Completed,
    Incomplete,
}

/// Frozen copy of one finished or abandoned question/answer run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewSession {
    pub id: Uuid,
    pub questions: Vec<Question>,
    pub answers: Vec<Answer>,
    pub score: u8,
    pub summary: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: SessionOutcome,
    pub profile: Option<InterviewProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub resume_text: String,
    pub skills: Vec<String>,
    pub experience: Vec<String>,
    pub education: Vec<String>,
    pub missing_info: Vec<String>,
    pub status: CandidateStatus,
    pub profile: Option<InterviewProfile>,
    pub current_question: usize,
    pub questions: Vec<Question>,
    pub answers: Vec<Answer>,
    /// 0 – 100, meaningful only once completed.
    pub score: u8,
    pub summary: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub time_remaining: Option<u32>,
    pub last_active_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub interview_history: Vec<InterviewSession>,
    pub total_interviews: u32,
    pub best_score: u8,
    pub average_score: u8,
    pub schema_version: u32,
}

impl Candidate {
    /// Fresh record in `uploading` with no interview data.
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            session_id: Uuid::new_v4(),
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            resume_text: String::new(),
            skills: Vec::new(),
            experience: Vec::new(),
            education: Vec::new(),
            missing_info: Vec::new(),
            status: CandidateStatus::Uploading,
            profile: None,
            current_question: 0,
            questions: Vec::new(),
            answers: Vec::new(),
            score: 0,
            summary: String::new(),
            start_time: None,
            end_time: None,
            time_remaining: None,
            last_active_at: now,
            created_at: now,
            interview_history: Vec::new(),
            total_interviews: 0,
            best_score: 0,
            average_score: 0,
            schema_version: CANDIDATE_SCHEMA_VERSION,
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_question)
    }

    pub fn has_contact_info(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.email.trim().is_empty()
            && !self.phone.trim().is_empty()
    }

    /// Whether a paused or running interview has made progress worth resuming.
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self.status,
            CandidateStatus::Interviewing | CandidateStatus::Paused
        ) && (!self.answers.is_empty() || self.current_question > 0 || self.start_time.is_some())
    }

    pub fn touch(&mut self) {
        self.last_active_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&CandidateStatus::InfoCollection).unwrap();
        assert_eq!(json, "\"info-collection\"");
        assert_eq!(
            CandidateStatus::parse("info-collection"),
            Some(CandidateStatus::InfoCollection)
        );
        assert_eq!(CandidateStatus::parse("archived"), None);
    }

    #[test]
    fn test_question_defaults_missing_optional_fields() {
        let json = r#"{"question": "What is a closure?", "difficulty": "easy", "timeLimit": 90}"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.id, "");
        assert_eq!(q.time_limit, 90);
        assert!(q.expected_keywords.is_empty());
    }

    #[test]
    fn test_new_candidate_starts_uploading() {
        let c = Candidate::new(Uuid::new_v4());
        assert_eq!(c.status, CandidateStatus::Uploading);
        assert!(c.questions.is_empty());
        assert_eq!(c.schema_version, CANDIDATE_SCHEMA_VERSION);
        assert!(!c.is_in_progress());
    }

    #[test]
    fn test_in_progress_requires_activity() {
        let mut c = Candidate::new(Uuid::new_v4());
        c.status = CandidateStatus::Interviewing;
        assert!(!c.is_in_progress());

        c.current_question = 2;
        assert!(c.is_in_progress());

        c.current_question = 0;
        c.status = CandidateStatus::Paused;
        c.start_time = Some(Utc::now());
        assert!(c.is_in_progress());

        c.status = CandidateStatus::Completed;
        assert!(!c.is_in_progress());
    }
}

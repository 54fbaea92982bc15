//! In-memory providers for exercising the controller and the router without
//! a model or a database.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::intelligence::{
    AnswerEvaluation, CandidateFields, IntelligenceError, IntelligenceProvider, InterviewSummary,
    Recommendation,
};
use crate::models::candidate::{Answer, Candidate, Difficulty, InterviewProfile, Question};
use crate::persistence::{CandidateStore, StoreError};
use crate::session::SessionController;

#[derive(Default)]
pub struct FakeIntelligence {
    pub fields: Mutex<CandidateFields>,
    pub questions: Mutex<Option<Vec<Question>>>,
    pub scores: Mutex<VecDeque<f64>>,
    pub overall_score: Mutex<Option<f64>>,
    pub generation_delay: Mutex<Duration>,
    pub scoring_delay: Mutex<Duration>,
    pub fail_generation: AtomicBool,
    pub fail_scoring: AtomicBool,
    pub fail_summary: AtomicBool,
    pub generate_calls: AtomicUsize,
    pub score_calls: AtomicUsize,
    pub scored: Mutex<Vec<(String, u32)>>,
}

impl FakeIntelligence {
    pub fn new(fields: CandidateFields) -> Arc<Self> {
        let fake = Self::default();
        *fake.fields.lock().unwrap() = fields;
        Arc::new(fake)
    }
}

#[async_trait]
impl IntelligenceProvider for FakeIntelligence {
    async fn extract_candidate_fields(
        &self,
        _resume_text: &str,
    ) -> Result<CandidateFields, IntelligenceError> {
        Ok(self.fields.lock().unwrap().clone())
    }

    async fn generate_questions(
        &self,
        _fields: &CandidateFields,
        _profile: InterviewProfile,
    ) -> Result<Vec<Question>, IntelligenceError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.generation_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_generation.load(Ordering::SeqCst) {
            return Err(IntelligenceError::Malformed("model timed out".into()));
        }
        Ok(self
            .questions
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(six_questions))
    }

    async fn score_answer(
        &self,
        _question: &Question,
        answer: &str,
        seconds_spent: u32,
        _previous_answers: &[Answer],
    ) -> Result<AnswerEvaluation, IntelligenceError> {
        self.score_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.scoring_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_scoring.load(Ordering::SeqCst) {
            return Err(IntelligenceError::Malformed("unparseable score".into()));
        }
        self.scored
            .lock()
            .unwrap()
            .push((answer.to_string(), seconds_spent));
        let score = self.scores.lock().unwrap().pop_front().unwrap_or(5.0);
        Ok(AnswerEvaluation {
            score,
            feedback: "Reasonable answer.".into(),
            strengths: vec![],
            improvements: vec![],
        })
    }

    async fn summarize_interview(
        &self,
        _fields: &CandidateFields,
        _questions: &[Question],
        _answers: &[Answer],
    ) -> Result<InterviewSummary, IntelligenceError> {
        if self.fail_summary.load(Ordering::SeqCst) {
            return Err(IntelligenceError::Malformed("summary missing".into()));
        }
        Ok(InterviewSummary {
            overall_score: *self.overall_score.lock().unwrap(),
            summary: "Strong fundamentals.".into(),
            strengths: vec![],
            weaknesses: vec![],
            recommendation: Some(Recommendation::Hire),
        })
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub records: Mutex<HashMap<Uuid, Candidate>>,
    pub current: Mutex<HashMap<Uuid, Uuid>>,
    pub fail_upserts: AtomicBool,
}

#[async_trait]
impl CandidateStore for MemoryStore {
    async fn upsert(&self, candidate: &Candidate) -> Result<(), StoreError> {
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        self.records
            .lock()
            .unwrap()
            .insert(candidate.id, candidate.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Candidate>, StoreError> {
        Ok(self.records.lock().unwrap().get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Candidate>, StoreError> {
        let mut all: Vec<_> = self.records.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Candidate>, StoreError> {
        let mut all = self.list_all().await?;
        all.retain(|c| c.user_id == user_id);
        Ok(all)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        self.current.lock().unwrap().retain(|_, c| *c != id);
        Ok(self.records.lock().unwrap().remove(&id).is_some())
    }

    async fn current_candidate(&self, user_id: Uuid) -> Result<Option<Uuid>, StoreError> {
        Ok(self.current.lock().unwrap().get(&user_id).copied())
    }

    async fn set_current_candidate(
        &self,
        user_id: Uuid,
        candidate_id: Option<Uuid>,
    ) -> Result<(), StoreError> {
        let mut current = self.current.lock().unwrap();
        match candidate_id {
            Some(id) => current.insert(user_id, id),
            None => current.remove(&user_id),
        };
        Ok(())
    }
}

pub const LIMITS: [u32; 6] = [90, 120, 180, 240, 300, 360];

pub fn six_questions() -> Vec<Question> {
    let difficulties = [
        Difficulty::Easy,
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Hard,
    ];
    (0..6)
        .map(|i| Question {
            // Two ids left blank to exercise id filling.
            id: if i == 1 || i == 4 {
                String::new()
            } else {
                format!("q{}", i + 1)
            },
            question: format!("Question {}", i + 1),
            difficulty: difficulties[i],
            time_limit: LIMITS[i],
            category: "General".into(),
            expected_keywords: vec![],
        })
        .collect()
}

pub fn ada() -> CandidateFields {
    CandidateFields {
        name: "Ada".into(),
        email: "a@x.com".into(),
        phone: "555".into(),
        skills: vec!["Rust".into()],
        ..CandidateFields::default()
    }
}

pub fn controller(ai: Arc<FakeIntelligence>, store: Arc<MemoryStore>) -> Arc<SessionController> {
    let (controller, expired_rx) = SessionController::new(ai, store);
    let controller = Arc::new(controller);
    controller.spawn_expiry_listener(expired_rx);
    controller
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::candidate::{
    Answer, Candidate, CandidateStatus, InterviewProfile, InterviewSession, Question,
};
use crate::persistence::versioning::upgrade_record;
use crate::persistence::{CandidateStore, StoreError};

/// Idempotent schema bootstrap, one statement per entry.
pub const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS candidates (
        id                UUID PRIMARY KEY,
        user_id           UUID NOT NULL,
        session_id        UUID,
        name              TEXT NOT NULL DEFAULT '',
        email             TEXT NOT NULL DEFAULT '',
        phone             TEXT NOT NULL DEFAULT '',
        resume_text       TEXT NOT NULL DEFAULT '',
        skills            TEXT[] NOT NULL DEFAULT '{}',
        experience        TEXT[] NOT NULL DEFAULT '{}',
        education         TEXT[] NOT NULL DEFAULT '{}',
        missing_info      TEXT[] NOT NULL DEFAULT '{}',
        status            TEXT NOT NULL,
        profile           TEXT,
        current_question  INTEGER NOT NULL DEFAULT 0,
        questions         JSONB NOT NULL DEFAULT '[]',
        answers           JSONB NOT NULL DEFAULT '[]',
        score             SMALLINT NOT NULL DEFAULT 0,
        summary           TEXT NOT NULL DEFAULT '',
        start_time        TIMESTAMPTZ,
        end_time          TIMESTAMPTZ,
        time_remaining    INTEGER,
        last_active_at    TIMESTAMPTZ,
        interview_history JSONB NOT NULL DEFAULT '[]',
        total_interviews  INTEGER NOT NULL DEFAULT 0,
        best_score        SMALLINT NOT NULL DEFAULT 0,
        average_score     SMALLINT NOT NULL DEFAULT 0,
        schema_version    INTEGER NOT NULL DEFAULT 0,
        created_at        TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS candidates_user_id_idx ON candidates (user_id)",
    "CREATE INDEX IF NOT EXISTS candidates_created_at_idx ON candidates (created_at DESC)",
    r#"
    CREATE TABLE IF NOT EXISTS candidate_sessions (
        user_id              UUID PRIMARY KEY,
        current_candidate_id UUID,
        updated_at           TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
];

#[derive(Debug, Clone, FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub resume_text: String,
    pub skills: Vec<String>,
    pub experience: Vec<String>,
    pub education: Vec<String>,
    pub missing_info: Vec<String>,
    pub status: String,
    pub profile: Option<String>,
    pub current_question: i32,
    pub questions: Json<Vec<Question>>,
    pub answers: Json<Vec<Answer>>,
    pub score: i16,
    pub summary: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub time_remaining: Option<i32>,
    pub last_active_at: Option<DateTime<Utc>>,
    pub interview_history: Json<Vec<InterviewSession>>,
    pub total_interviews: i32,
    pub best_score: i16,
    pub average_score: i16,
    pub schema_version: i32,
    pub created_at: DateTime<Utc>,
}

impl CandidateRow {
    pub fn into_candidate(self) -> Result<Candidate, StoreError> {
        let id = self.id;
        let corrupt = |reason: String| StoreError::Corrupt { id, reason };

        let status = CandidateStatus::parse(&self.status)
            .ok_or_else(|| corrupt(format!("unknown status '{}'", self.status)))?;
        let profile = match self.profile.as_deref() {
            None => None,
            Some(p) => Some(
                InterviewProfile::parse(p).ok_or_else(|| corrupt(format!("unknown profile '{p}'")))?,
            ),
        };
        let score_u8 = |v: i16, field: &str| {
            u8::try_from(v).map_err(|_| corrupt(format!("{field} out of range: {v}")))
        };

        let mut candidate = Candidate {
            id,
            user_id: self.user_id,
            session_id: self.session_id.unwrap_or_else(Uuid::new_v4),
            name: self.name,
            email: self.email,
            phone: self.phone,
            resume_text: self.resume_text,
            skills: self.skills,
            experience: self.experience,
            education: self.education,
            missing_info: self.missing_info,
            status,
            profile,
            current_question: usize::try_from(self.current_question)
                .map_err(|_| corrupt(format!("negative question index {}", self.current_question)))?,
            questions: self.questions.0,
            answers: self.answers.0,
            score: score_u8(self.score, "score")?,
            summary: self.summary,
            start_time: self.start_time,
            end_time: self.end_time,
            time_remaining: self.time_remaining.and_then(|v| u32::try_from(v).ok()),
            last_active_at: self.last_active_at.unwrap_or_else(Utc::now),
            created_at: self.created_at,
            interview_history: self.interview_history.0,
            total_interviews: u32::try_from(self.total_interviews).unwrap_or(0),
            best_score: score_u8(self.best_score, "best_score")?,
            average_score: score_u8(self.average_score, "average_score")?,
            schema_version: 0,
        };
        upgrade_record(&mut candidate, self.schema_version)?;
        Ok(candidate)
    }
}

/// `CandidateStore` backed by PostgreSQL.
#[derive(Clone)]
pub struct PgCandidateStore {
    pool: PgPool,
}

impl PgCandidateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_rows(&self, owner: Option<Uuid>) -> Result<Vec<Candidate>, StoreError> {
        let rows = sqlx::query_as::<_, CandidateRow>(
            r#"
            SELECT * FROM candidates
            WHERE ($1::uuid IS NULL OR user_id = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match row.into_candidate() {
                Ok(candidate) => Some(candidate),
                Err(e) => {
                    warn!("Skipping unloadable candidate record: {e}");
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl CandidateStore for PgCandidateStore {
    async fn upsert(&self, c: &Candidate) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO candidates
                (id, user_id, session_id, name, email, phone, resume_text,
                 skills, experience, education, missing_info, status, profile,
                 current_question, questions, answers, score, summary,
                 start_time, end_time, time_remaining, last_active_at,
                 interview_history, total_interviews, best_score, average_score,
                 schema_version, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28)
            ON CONFLICT (id) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                session_id = EXCLUDED.session_id,
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                phone = EXCLUDED.phone,
                resume_text = EXCLUDED.resume_text,
                skills = EXCLUDED.skills,
                experience = EXCLUDED.experience,
                education = EXCLUDED.education,
                missing_info = EXCLUDED.missing_info,
                status = EXCLUDED.status,
                profile = EXCLUDED.profile,
                current_question = EXCLUDED.current_question,
                questions = EXCLUDED.questions,
                answers = EXCLUDED.answers,
                score = EXCLUDED.score,
                summary = EXCLUDED.summary,
                start_time = EXCLUDED.start_time,
                end_time = EXCLUDED.end_time,
                time_remaining = EXCLUDED.time_remaining,
                last_active_at = EXCLUDED.last_active_at,
                interview_history = EXCLUDED.interview_history,
                total_interviews = EXCLUDED.total_interviews,
                best_score = EXCLUDED.best_score,
                average_score = EXCLUDED.average_score,
                schema_version = EXCLUDED.schema_version
            "#,
        )
        .bind(c.id)
        .bind(c.user_id)
        .bind(c.session_id)
        .bind(&c.name)
        .bind(&c.email)
        .bind(&c.phone)
        .bind(&c.resume_text)
        .bind(&c.skills)
        .bind(&c.experience)
        .bind(&c.education)
        .bind(&c.missing_info)
        .bind(c.status.as_str())
        .bind(c.profile.map(|p| p.as_str()))
        .bind(c.current_question as i32)
        .bind(Json(&c.questions))
        .bind(Json(&c.answers))
        .bind(i16::from(c.score))
        .bind(&c.summary)
        .bind(c.start_time)
        .bind(c.end_time)
        .bind(c.time_remaining.map(|v| v as i32))
        .bind(c.last_active_at)
        .bind(Json(&c.interview_history))
        .bind(c.total_interviews as i32)
        .bind(i16::from(c.best_score))
        .bind(i16::from(c.average_score))
        .bind(c.schema_version as i32)
        .bind(c.created_at)
        .execute(&self.pool)
        .await?;

        info!("Upserted candidate {} (status {})", c.id, c.status.as_str());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Candidate>, StoreError> {
        sqlx::query_as::<_, CandidateRow>("SELECT * FROM candidates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(CandidateRow::into_candidate)
            .transpose()
    }

    async fn list_all(&self) -> Result<Vec<Candidate>, StoreError> {
        self.fetch_rows(None).await
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Candidate>, StoreError> {
        self.fetch_rows(Some(user_id)).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM candidates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "UPDATE candidate_sessions SET current_candidate_id = NULL, updated_at = now() \
             WHERE current_candidate_id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn current_candidate(&self, user_id: Uuid) -> Result<Option<Uuid>, StoreError> {
        let current: Option<Option<Uuid>> = sqlx::query_scalar(
            "SELECT current_candidate_id FROM candidate_sessions WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(current.flatten())
    }

    async fn set_current_candidate(
        &self,
        user_id: Uuid,
        candidate_id: Option<Uuid>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO candidate_sessions (user_id, current_candidate_id, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (user_id) DO UPDATE SET
                current_candidate_id = EXCLUDED.current_candidate_id,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user_id)
        .bind(candidate_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

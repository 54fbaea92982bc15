use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::candidate::{Candidate, InterviewProfile};
use crate::models::user::Actor;
use crate::session::{CompleteInfo, GenerationOutcome, SubmitOutcome};
use crate::state::AppState;

/// Multipart field carrying the resume file.
const RESUME_FIELD: &str = "resume";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeTextRequest {
    pub resume_text: String,
}

#[derive(Deserialize)]
pub struct ProfileRequest {
    pub profile: InterviewProfile,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswer {
    pub question_index: usize,
    pub answer: String,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum GenerationResponse {
    Generated { candidate: Candidate },
    Skipped,
}

impl From<GenerationOutcome> for GenerationResponse {
    fn from(outcome: GenerationOutcome) -> Self {
        match outcome {
            GenerationOutcome::Generated(candidate) => GenerationResponse::Generated { candidate },
            GenerationOutcome::Skipped => GenerationResponse::Skipped,
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SubmitResponse {
    Advanced { candidate: Candidate },
    Completed { candidate: Candidate },
    Ignored,
}

impl From<SubmitOutcome> for SubmitResponse {
    fn from(outcome: SubmitOutcome) -> Self {
        match outcome {
            SubmitOutcome::Advanced(candidate) => SubmitResponse::Advanced { candidate },
            SubmitOutcome::Completed(candidate) => SubmitResponse::Completed { candidate },
            SubmitOutcome::Ignored => SubmitResponse::Ignored,
        }
    }
}

/// POST /api/v1/candidates/resume
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    actor: Actor,
    mut multipart: Multipart,
) -> Result<Json<Candidate>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some(RESUME_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("resume").to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read resume upload: {e}")))?;
        upload = Some((file_name, content_type, data));
        break;
    }

    let Some((file_name, content_type, data)) = upload else {
        return Err(AppError::Validation(format!(
            "Missing multipart field '{RESUME_FIELD}'"
        )));
    };
    if data.len() > state.config.max_resume_bytes {
        return Err(AppError::Validation(format!(
            "Resume exceeds the {} byte limit",
            state.config.max_resume_bytes
        )));
    }

    info!("Received resume '{file_name}' ({} bytes)", data.len());
    let text = if is_pdf(&file_name, content_type.as_deref(), &data) {
        extract_pdf_text(data).await?
    } else {
        decode_text(&data)?
    };

    let candidate = state.controller.intake_resume(&actor, &text).await?;
    Ok(Json(candidate))
}

/// POST /api/v1/candidates/resume/text
pub async fn handle_resume_text(
    State(state): State<AppState>,
    actor: Actor,
    Json(req): Json<ResumeTextRequest>,
) -> Result<Json<Candidate>, AppError> {
    let candidate = state
        .controller
        .intake_resume(&actor, &req.resume_text)
        .await?;
    Ok(Json(candidate))
}

/// GET /api/v1/candidates/current
pub async fn handle_current(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Option<Candidate>>, AppError> {
    Ok(Json(state.controller.current(&actor).await?))
}

/// GET /api/v1/candidates/resumable
pub async fn handle_resumable(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Option<Candidate>>, AppError> {
    Ok(Json(state.controller.resumable(&actor).await?))
}

/// GET /api/v1/candidates/:id
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Candidate>, AppError> {
    Ok(Json(state.controller.get(&actor, id).await?))
}

/// DELETE /api/v1/candidates/:id
pub async fn handle_delete_candidate(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.controller.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/candidates/:id/info
pub async fn handle_complete_info(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(info): Json<CompleteInfo>,
) -> Result<Json<Candidate>, AppError> {
    Ok(Json(state.controller.complete_info(&actor, id, info).await?))
}

/// POST /api/v1/candidates/:id/profile
pub async fn handle_select_profile(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<ProfileRequest>,
) -> Result<Json<GenerationResponse>, AppError> {
    let outcome = state
        .controller
        .select_profile(&actor, id, req.profile)
        .await?;
    Ok(Json(outcome.into()))
}

/// POST /api/v1/candidates/:id/questions
pub async fn handle_generate_questions(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<GenerationResponse>, AppError> {
    let outcome = state.controller.generate_questions(&actor, id).await?;
    Ok(Json(outcome.into()))
}

/// POST /api/v1/candidates/:id/pause
pub async fn handle_toggle_pause(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Candidate>, AppError> {
    Ok(Json(state.controller.toggle_pause(&actor, id).await?))
}

/// POST /api/v1/candidates/:id/answers
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitAnswer>,
) -> Result<Json<SubmitResponse>, AppError> {
    let outcome = state
        .controller
        .submit_answer(&actor, id, req.question_index, &req.answer)
        .await?;
    Ok(Json(outcome.into()))
}

/// POST /api/v1/candidates/:id/start-new
pub async fn handle_start_new(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Candidate>, AppError> {
    Ok(Json(state.controller.start_new(&actor, id).await?))
}

/// POST /api/v1/candidates/:id/resume
pub async fn handle_resume_session(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Candidate>, AppError> {
    Ok(Json(state.controller.resume_session(&actor, id).await?))
}

fn is_pdf(file_name: &str, content_type: Option<&str>, data: &[u8]) -> bool {
    content_type == Some("application/pdf")
        || file_name.to_ascii_lowercase().ends_with(".pdf")
        || data.starts_with(b"%PDF")
}

async fn extract_pdf_text(data: Bytes) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF extraction task failed: {e}")))?
        .map_err(|e| AppError::Validation(format!("Could not read PDF resume: {e}")))
}

fn decode_text(data: &[u8]) -> Result<String, AppError> {
    std::str::from_utf8(data)
        .map(str::to_string)
        .map_err(|_| AppError::Validation("Resume must be a PDF or UTF-8 text file".to_string()))
}

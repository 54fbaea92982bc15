use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interviewer::{dashboard, filter_and_sort, CandidateListItem, DashboardStats, SortKey};
use crate::models::candidate::Candidate;
use crate::models::user::{Actor, Role};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RosterQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub sort: SortKey,
}

fn require_interviewer(actor: &Actor) -> Result<(), AppError> {
    match actor.role {
        Role::Interviewer => Ok(()),
        Role::Interviewee => Err(AppError::Forbidden),
    }
}

/// GET /api/v1/interviewer/candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    actor: Actor,
    Query(params): Query<RosterQuery>,
) -> Result<Json<Vec<CandidateListItem>>, AppError> {
    require_interviewer(&actor)?;
    let candidates = state.controller.list(&actor).await?;
    Ok(Json(filter_and_sort(
        &candidates,
        params.search.as_deref(),
        params.sort,
    )))
}

/// GET /api/v1/interviewer/dashboard
pub async fn handle_dashboard(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<DashboardStats>, AppError> {
    require_interviewer(&actor)?;
    let candidates = state.controller.list(&actor).await?;
    Ok(Json(dashboard(&candidates)))
}

/// GET /api/v1/interviewer/candidates/:id
pub async fn handle_candidate_detail(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Candidate>, AppError> {
    require_interviewer(&actor)?;
    Ok(Json(state.controller.get(&actor, id).await?))
}

/// DELETE /api/v1/interviewer/candidates/:id
pub async fn handle_delete_candidate(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    require_interviewer(&actor)?;
    state.controller.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

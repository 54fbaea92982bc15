use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Interviewee,
    Interviewer,
}

/// The authenticated caller, as asserted by the identity layer in front of this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn interviewee(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::Interviewee,
        }
    }

    pub fn interviewer(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::Interviewer,
        }
    }

    /// Owners see their own candidates; interviewers see everyone.
    pub fn can_access(&self, owner: Uuid) -> bool {
        self.role == Role::Interviewer || self.user_id == owner
    }

    fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let user_id = headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .ok_or(AppError::Unauthorized)?;

        let role = match headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_ascii_lowercase())
            .as_deref()
        {
            Some("interviewer") => Role::Interviewer,
            Some("interviewee") | None => Role::Interviewee,
            Some(_) => return Err(AppError::Unauthorized),
        };

        Ok(Self { user_id, role })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Actor::from_headers(&parts.headers)
    }
}

pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::interviewer::handlers as interviewer;
use crate::session::handlers as session;
use crate::state::AppState;

/// Room for multipart framing on top of the resume itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_resume_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        // Interviewee flow
        .route(
            "/api/v1/candidates/resume",
            post(session::handle_upload_resume),
        )
        .route(
            "/api/v1/candidates/resume/text",
            post(session::handle_resume_text),
        )
        .route("/api/v1/candidates/current", get(session::handle_current))
        .route(
            "/api/v1/candidates/resumable",
            get(session::handle_resumable),
        )
        .route(
            "/api/v1/candidates/:id",
            get(session::handle_get_candidate).delete(session::handle_delete_candidate),
        )
        .route(
            "/api/v1/candidates/:id/info",
            post(session::handle_complete_info),
        )
        .route(
            "/api/v1/candidates/:id/profile",
            post(session::handle_select_profile),
        )
        .route(
            "/api/v1/candidates/:id/questions",
            post(session::handle_generate_questions),
        )
        .route(
            "/api/v1/candidates/:id/pause",
            post(session::handle_toggle_pause),
        )
        .route(
            "/api/v1/candidates/:id/answers",
            post(session::handle_submit_answer),
        )
        .route(
            "/api/v1/candidates/:id/start-new",
            post(session::handle_start_new),
        )
        .route(
            "/api/v1/candidates/:id/resume",
            post(session::handle_resume_session),
        )
        // Interviewer views
        .route(
            "/api/v1/interviewer/candidates",
            get(interviewer::handle_list_candidates),
        )
        .route(
            "/api/v1/interviewer/dashboard",
            get(interviewer::handle_dashboard),
        )
        .route(
            "/api/v1/interviewer/candidates/:id",
            get(interviewer::handle_candidate_detail).delete(interviewer::handle_delete_candidate),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::config::Config;
    use crate::models::user::{USER_ID_HEADER, USER_ROLE_HEADER};
    use crate::session::testing::{ada, controller, FakeIntelligence};

    fn app() -> Router {
        build_router(AppState {
            controller: controller(FakeIntelligence::new(ada()), Default::default()),
            config: Config {
                database_url: "postgres://unused".into(),
                anthropic_api_key: "unused".into(),
                port: 0,
                rust_log: "info".into(),
                max_resume_bytes: 1024,
            },
        })
    }

    fn request(method: Method, uri: &str, user: Option<(Uuid, &str)>, body: Body) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((id, role)) = user {
            builder = builder
                .header(USER_ID_HEADER, id.to_string())
                .header(USER_ROLE_HEADER, role);
        }
        builder.body(body).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(request(Method::GET, "/health", None, Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() {
        let response = app()
            .oneshot(request(Method::GET, "/api/v1/candidates/current", None, Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_text_intake_then_interviewer_dashboard() {
        let app = app();
        let user = Uuid::new_v4();

        let mut intake = request(
            Method::POST,
            "/api/v1/candidates/resume/text",
            Some((user, "interviewee")),
            Body::from(json!({ "resumeText": "Ada\na@x.com\n555" }).to_string()),
        );
        intake
            .headers_mut()
            .insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        let response = app.clone().oneshot(intake).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let candidate = json_body(response).await;
        assert_eq!(candidate["status"], "interviewing");

        let forbidden = app
            .clone()
            .oneshot(request(
                Method::GET,
                "/api/v1/interviewer/dashboard",
                Some((user, "interviewee")),
                Body::empty(),
            ))
            .await
            .unwrap();
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(request(
                Method::GET,
                "/api/v1/interviewer/dashboard",
                Some((Uuid::new_v4(), "interviewer")),
                Body::empty(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["totalCandidates"], 1);
    }

    #[tokio::test]
    async fn test_multipart_upload_and_pause_conflict() {
        let app = app();
        let user = Some((Uuid::new_v4(), "interviewee"));
        let body = "--X\r\n\
            Content-Disposition: form-data; name=\"resume\"; filename=\"cv.txt\"\r\n\
            Content-Type: text/plain\r\n\r\n\
            Ada\na@x.com\n555\r\n\
            --X--\r\n";
        let mut upload = request(
            Method::POST,
            "/api/v1/candidates/resume",
            user,
            Body::from(body),
        );
        upload.headers_mut().insert(
            header::CONTENT_TYPE,
            "multipart/form-data; boundary=X".parse().unwrap(),
        );
        let response = app.clone().oneshot(upload).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let id = json_body(response).await["id"]
            .as_str()
            .unwrap()
            .to_string();

        // No questions yet, so pausing is an invalid transition.
        let response = app
            .oneshot(request(
                Method::POST,
                &format!("/api/v1/candidates/{id}/pause"),
                user,
                Body::empty(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(response).await["error"]["code"], "INVALID_TRANSITION");
    }
}

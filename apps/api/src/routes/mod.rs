pub mod auth;
pub mod classify;
pub mod health;
pub mod profile;
pub mod reports;
pub mod session;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/content", get(health::content_handler))
        // Accounts
        .route("/api/v1/auth/register", post(auth::handle_register))
        .route("/api/v1/auth/login", post(auth::handle_login))
        .route("/api/v1/auth/logout", post(auth::handle_logout))
        // Session flow
        .route("/api/v1/session", get(session::handle_get_session))
        .route(
            "/api/v1/session/disclaimer",
            post(session::handle_accept_disclaimer),
        )
        .route(
            "/api/v1/profile",
            get(profile::handle_get_profile).put(profile::handle_put_profile),
        )
        .route(
            "/api/v1/classify",
            post(classify::handle_classify)
                .layer(DefaultBodyLimit::max(classify::MAX_UPLOAD_BYTES)),
        )
        // Reports
        .route("/api/v1/reports", post(reports::handle_create_report))
        .route("/api/v1/reports/latest", get(reports::handle_latest_report))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body, Bytes},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::classifier::tests::{png_bytes, FixedClassifier};
    use crate::layout::LayoutConfig;
    use crate::narrative::tests::CannedNarrator;
    use crate::session::MemorySessionStore;
    use crate::storage::LocalArtifactStore;
    use crate::users::tests::MemoryUserStore;

    const BOUNDARY: &str = "lesion-boundary";
    const MELANOMA: [f32; 7] = [0.01, 0.02, 0.03, 0.04, 0.8734, 0.0166, 0.01];

    struct TestApp {
        router: Router,
        _artifacts: TempDir,
    }

    fn test_app(narrative: Option<&str>) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState {
            users: Arc::new(MemoryUserStore::default()),
            sessions: Arc::new(MemorySessionStore::new(3600)),
            artifacts: Arc::new(LocalArtifactStore::new(dir.path())),
            classifier: Arc::new(FixedClassifier(MELANOMA.to_vec())),
            narrator: Arc::new(CannedNarrator(narrative.map(str::to_string))),
            layout: LayoutConfig::us_letter(),
        };
        TestApp {
            router: build_router(state),
            _artifacts: dir,
        }
    }

    impl TestApp {
        async fn send(&self, req: Request<Body>) -> (StatusCode, Bytes) {
            let resp = self.router.clone().oneshot(req).await.unwrap();
            let status = resp.status();
            (status, to_bytes(resp.into_body(), usize::MAX).await.unwrap())
        }

        async fn json(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut req = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let req = match body {
                Some(body) => req
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string())),
                None => req.body(Body::empty()),
            }
            .unwrap();
            let (status, bytes) = self.send(req).await;
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        async fn register(&self, username: &str) -> String {
            let (status, body) = self
                .json(
                    Method::POST,
                    "/api/v1/auth/register",
                    None,
                    Some(json!({
                        "username": username,
                        "password": "s3cret",
                        "confirm_password": "s3cret"
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            body["token"].as_str().unwrap().to_string()
        }

        async fn submit_profile(&self, token: &str) -> (StatusCode, Value) {
            self.json(
                Method::PUT,
                "/api/v1/profile",
                Some(token),
                Some(json!({
                    "full_name": "Asha Rao",
                    "age": 47,
                    "gender": "Female",
                    "family_history": "Mother had melanoma",
                    "smoking_habits": "Non-smoker",
                    "alcohol_consumption": "Occasional",
                    "contact_email": "asha@example.com"
                })),
            )
            .await
        }

        async fn upload(&self, token: &str) -> (StatusCode, Value) {
            let mut body = Vec::new();
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; \
                     filename=\"lesion.png\"\r\nContent-Type: image/png\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(&png_bytes(40, 30));
            body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

            let req = Request::builder()
                .method(Method::POST)
                .uri("/api/v1/classify")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap();
            let (status, bytes) = self.send(req).await;
            (status, serde_json::from_slice(&bytes).unwrap())
        }

        /// Registers and walks the flow up to the upload step.
        async fn ready_for_upload(&self, username: &str) -> String {
            let token = self.register(username).await;
            let (status, _) = self
                .json(Method::POST, "/api/v1/session/disclaimer", Some(&token), None)
                .await;
            assert_eq!(status, StatusCode::OK);
            let (status, body) = self.submit_profile(&token).await;
            assert_eq!(status, StatusCode::OK, "{body}");
            token
        }
    }

    #[tokio::test]
    async fn test_health_and_content_are_public() {
        let app = test_app(None);
        let (status, body) = app.json(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = app.json(Method::GET, "/api/v1/content", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["abcde"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_full_flow_produces_downloadable_pdf() {
        let app = test_app(Some("A melanoma is a tumour of pigment cells."));
        let token = app.ready_for_upload("asha").await;

        let (status, body) = app.upload(&token).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["classification"]["code"], "mel");
        assert_eq!(body["width"], 40);

        let (status, body) = app
            .json(Method::POST, "/api/v1/reports", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert!(body["report_key"].as_str().unwrap().starts_with("reports/"));
        assert_eq!(body["narrative"], "A melanoma is a tumour of pigment cells.");

        let (_, session) = app
            .json(Method::GET, "/api/v1/session", Some(&token), None)
            .await;
        assert_eq!(session["flow"]["state"], "report_ready");
        assert_eq!(session["report_generated"], true);

        let req = Request::builder()
            .uri("/api/v1/reports/latest")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let (status, pdf) = app.send(req).await;
        assert_eq!(status, StatusCode::OK);
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_report_without_classification_is_rejected() {
        let app = test_app(Some("text"));
        let token = app.ready_for_upload("bo").await;

        let (status, body) = app
            .json(Method::POST, "/api/v1/reports", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "INVALID_TRANSITION");

        let (status, _) = app
            .json(Method::GET, "/api/v1/reports/latest", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_before_profile_is_rejected() {
        let app = test_app(None);
        let token = app.register("cy").await;
        let (status, body) = app.upload(&token).await;
        assert_eq!(status, StatusCode::CONFLICT, "{body}");
    }

    #[tokio::test]
    async fn test_narrative_failure_produces_no_report() {
        let app = test_app(None);
        let token = app.ready_for_upload("dee").await;
        let (status, _) = app.upload(&token).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app
            .json(Method::POST, "/api/v1/reports", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "LLM_ERROR");

        let (_, session) = app
            .json(Method::GET, "/api/v1/session", Some(&token), None)
            .await;
        assert_eq!(session["flow"]["state"], "classified");
    }

    #[tokio::test]
    async fn test_requests_without_session_are_unauthorized() {
        let app = test_app(None);
        let (status, _) = app.json(Method::GET, "/api/v1/session", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let stale = uuid::Uuid::new_v4().to_string();
        let (status, _) = app
            .json(Method::GET, "/api/v1/profile", Some(&stale), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_rules() {
        let app = test_app(None);
        app.register("eli").await;

        let (status, _) = app
            .json(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(json!({"username": "eli", "password": "x", "confirm_password": "x"})),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = app
            .json(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({"username": "eli", "password": "wrong"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = app
            .json(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({"username": "eli", "password": "s3cret"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["flow"]["state"], "awaiting_disclaimer");
    }

    #[tokio::test]
    async fn test_returning_user_skips_profile_form() {
        let app = test_app(None);
        let token = app.ready_for_upload("fay").await;

        let (status, _) = app
            .json(Method::POST, "/api/v1/auth/logout", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = app
            .json(Method::GET, "/api/v1/session", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (_, body) = app
            .json(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({"username": "fay", "password": "s3cret"})),
            )
            .await;
        let token = body["token"].as_str().unwrap().to_string();

        let (_, session) = app
            .json(Method::POST, "/api/v1/session/disclaimer", Some(&token), None)
            .await;
        assert_eq!(session["flow"]["state"], "awaiting_image");

        let (status, profile) = app
            .json(Method::GET, "/api/v1/profile", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["smoking_habits"], "Non-smoker");
    }

    #[tokio::test]
    async fn test_invalid_profile_is_rejected() {
        let app = test_app(None);
        let token = app.register("gus").await;
        app.json(Method::POST, "/api/v1/session/disclaimer", Some(&token), None)
            .await;

        let (status, body) = app
            .json(
                Method::PUT,
                "/api/v1/profile",
                Some(&token),
                Some(json!({
                    "full_name": "Gus",
                    "age": 130,
                    "gender": "Male",
                    "smoking_habits": "Regular",
                    "alcohol_consumption": "Never",
                    "contact_email": "gus@example.com"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}

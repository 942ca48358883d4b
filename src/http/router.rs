//! Route table and middleware.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::dashboard))
        .route("/report", post(handlers::export_report))
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Settings;
    use crate::loader::{DatasetCache, LabelLocale};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn state_for(path: std::path::PathBuf) -> AppState {
        AppState::new(
            DatasetCache::new(path, LabelLocale::En),
            Settings {
                title: "Test Dashboard".to_string(),
                sample_rows: 5,
            },
        )
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = create_router(state_for("missing.csv".into()));
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn missing_dataset_renders_error_page() {
        let app = create_router(state_for("/nonexistent/missions.csv".into()));
        let resp = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("dataset not found"));
        assert!(!html.contains("<svg"));
    }

    #[tokio::test]
    async fn report_failure_returns_json_error() {
        let app = create_router(state_for("/nonexistent/missions.csv".into()));
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/report")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "DATASET_UNAVAILABLE");
        assert!(json["message"].as_str().unwrap().contains("missions.csv"));
    }

    #[tokio::test]
    async fn report_is_not_routed_for_get() {
        let app = create_router(state_for("missing.csv".into()));
        let resp = app
            .oneshot(Request::builder().uri("/report").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}

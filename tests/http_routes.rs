mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{scenario_rows, write_dataset};
use http_body_util::BodyExt;
use space_dashboard::http::{create_router, AppState, Settings};
use space_dashboard::loader::{DatasetCache, LabelLocale};
use tower::ServiceExt;

fn app(path: std::path::PathBuf) -> axum::Router {
    create_router(AppState::new(
        DatasetCache::new(path, LabelLocale::En),
        Settings {
            title: "Missions".to_string(),
            sample_rows: 4,
        },
    ))
}

#[tokio::test]
async fn dashboard_renders_charts() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dataset(&dir, "missions.csv", &scenario_rows());
    let resp = app(path)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert_eq!(html.matches("<svg").count(), 10);
    assert!(html.contains("first 4 of 29 records"));
    assert!(html.contains("Generate PDF report"));
}

#[tokio::test]
async fn report_download_is_a_pdf_attachment() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dataset(&dir, "missions.csv", &scenario_rows());
    let resp = app(path)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/report")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/pdf");
    let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment; filename=\"space_missions_report_"));
    assert!(disposition.ends_with(".pdf\""));

    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert!(body.starts_with(b"%PDF-"));
}

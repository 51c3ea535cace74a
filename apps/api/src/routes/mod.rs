pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::workflow::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Workflow API
        .route(
            "/api/v1/applications",
            post(handlers::handle_process_application),
        )
        .route("/api/v1/workflow/status", get(handlers::handle_workflow_status))
        .route("/api/v1/match", post(handlers::handle_match))
        // ATS rules API
        .route(
            "/api/v1/ats/structure",
            post(handlers::handle_validate_structure),
        )
        .route("/api/v1/ats/guidelines", get(handlers::handle_guidelines))
        // Quality API
        .route(
            "/api/v1/quality/metrics",
            post(handlers::handle_quality_metrics),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::agents::fixtures::{self, CV_TEXT, JOB_TEXT};
    use crate::config::Config;
    use crate::llm_client::testing::gateway_with;
    use crate::quality::QualityMetrics;
    use crate::rules::AtsRules;
    use crate::workflow::{DocumentProcessor, WorkflowOrchestrator};

    fn app() -> Router {
        let rules = Arc::new(AtsRules::new());
        let orchestrator = WorkflowOrchestrator::new(
            gateway_with(fixtures::canned_reply),
            rules.clone(),
            Arc::new(DocumentProcessor),
        );
        build_router(AppState {
            orchestrator: Arc::new(orchestrator),
            metrics: Arc::new(QualityMetrics::new()),
            rules,
            config: Config::default(),
        })
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn docx_bytes(text: &str) -> Vec<u8> {
        let body: String = text
            .lines()
            .map(|line| format!(r#"<w:p><w:r><w:t xml:space="preserve">{line}</w:t></w:r></w:p>"#))
            .collect();
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut cursor);
            zip.start_file("word/document.xml", zip::write::FileOptions::default())
                .unwrap();
            zip.write_all(format!("<w:document><w:body>{body}</w:body></w:document>").as_bytes())
                .unwrap();
            zip.finish().unwrap();
        }
        cursor.into_inner()
    }

    fn multipart_request(file_name: &str, file: &[u8], fields: &[(&str, &str)]) -> Request<Body> {
        const BOUNDARY: &str = "application-test-boundary";
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"cv\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(file);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::post("/api/v1/applications")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(
            app(),
            Request::get("/health").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["providers"]["openai"], false);
    }

    #[tokio::test]
    async fn test_structure_endpoint() {
        let (status, body) = send(
            app(),
            post_json(
                "/api/v1/ats/structure",
                json!({"sections": ["Contact Information", "Education"]}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], false);
        assert_eq!(body["issues"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_guidelines_endpoint() {
        let (status, body) = send(
            app(),
            Request::get("/api/v1/ats/guidelines").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(!body["format_guidelines"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_match_endpoint() {
        let (status, body) = send(
            app(),
            post_json(
                "/api/v1/match",
                json!({"cv_text": CV_TEXT, "job_description": JOB_TEXT}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["overall_match"]["score"], 90.0);
    }

    #[tokio::test]
    async fn test_match_rejects_empty_cv() {
        let (status, body) = send(
            app(),
            post_json("/api/v1/match", json!({"cv_text": " ", "job_description": JOB_TEXT})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_quality_metrics_endpoint() {
        let (status, body) = send(
            app(),
            post_json(
                "/api/v1/quality/metrics",
                json!({
                    "cv_metrics": {"content_relevance": 90, "skills_match": 80,
                                   "experience_quality": 80, "format_compliance": 90},
                    "ats_metrics": {"keyword_optimization": 90, "format_compliance": 90,
                                    "section_structure": 90, "content_clarity": 90}
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["assessment"]["meets_all_thresholds"], false);
        assert_eq!(body["priorities"][0], "Improve letter customization");
    }

    #[tokio::test]
    async fn test_quality_metrics_rejects_out_of_range() {
        let (status, body) = send(
            app(),
            post_json(
                "/api/v1/quality/metrics",
                json!({"cv_metrics": {"content_relevance": 250}}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "SCORING_ERROR");
    }

    #[tokio::test]
    async fn test_application_upload_runs_workflow() {
        let request = multipart_request(
            "jane.docx",
            &docx_bytes(CV_TEXT),
            &[
                ("job_description", JOB_TEXT),
                ("company_name", "Globex"),
                ("letter_style", "modern"),
            ],
        );

        let (status, body) = send(app(), request).await;

        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["results"]["workflow_status"]["completed_steps"], 5);
        assert_eq!(
            body["results"]["optimized_application"]["letter_details"]["structure"]["format_used"],
            "modern"
        );
        assert!(body["summary"]
            .as_str()
            .unwrap()
            .starts_with("Application Processing Summary:"));
    }

    #[tokio::test]
    async fn test_application_rejects_unsupported_upload() {
        let request = multipart_request(
            "cv.txt",
            CV_TEXT.as_bytes(),
            &[("job_description", JOB_TEXT), ("company_name", "Globex")],
        );

        let (status, body) = send(app(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["stage"], "document_processing");
        assert_eq!(body["error"]["workflow_status"]["completed_steps"], 0);
    }
}

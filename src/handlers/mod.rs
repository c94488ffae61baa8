pub mod analyze;
pub mod pages;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::index_handler).post(pages::upload_handler))
        .route("/api/analyze", post(analyze::analyze_handler))
        .route("/theme/toggle", get(pages::toggle_theme_handler))
        .route("/static/app.js", get(pages::app_script_handler))
        .route("/health", get(pages::health_handler))
        .layer(DefaultBodyLimit::max(state.body_limit()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use base64::{engine::general_purpose, Engine as _};
    use reqwest::multipart::{Form, Part};
    use serde_json::{json, Value};

    use crate::acquisition::EncodedImage;
    use crate::analysis::AnalysisResult;
    use crate::client::AnalysisClient;
    use crate::test_support::{spawn_router, StubGemini, JPEG_BYTES, SAMPLE_RESULT};

    const IPHONE_UA: &str =
        "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148";

    async fn start_app(stub: &StubGemini) -> String {
        let gemini = stub.start().await;
        spawn_router(build_router(AppState::new(gemini, 1024 * 1024))).await
    }

    fn no_redirect_client() -> reqwest::Client {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn api_returns_result_object_once() {
        let stub = StubGemini::replying_text(SAMPLE_RESULT);
        let base = start_app(&stub).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/api/analyze"))
            .json(&json!({ "image": general_purpose::STANDARD.encode(JPEG_BYTES) }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert!(body.is_object());
        let result: AnalysisResult = serde_json::from_value(body).unwrap();
        assert_eq!(result.face_shape, "Oval");
    }

    #[tokio::test]
    async fn empty_model_output_reaches_client_as_error() {
        let stub = StubGemini::replying(StatusCode::OK, json!({ "candidates": [] }));
        let base = start_app(&stub).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/api/analyze"))
            .json(&json!({ "image": general_purpose::STANDARD.encode(JPEG_BYTES) }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "No response from Gemini AI");

        let client = AnalysisClient::new(reqwest::Client::new(), &base);
        let image = EncodedImage::from_data_uri(&general_purpose::STANDARD.encode(JPEG_BYTES));
        let err = client.analyze(&image).await.unwrap_err();
        assert_eq!(err.to_string(), "No response from Gemini AI");
    }

    #[tokio::test]
    async fn malformed_request_is_server_error_with_message() {
        let stub = StubGemini::replying_text(SAMPLE_RESULT);
        let base = start_app(&stub).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/api/analyze"))
            .header("content-type", "application/json")
            .body(r#"{"picture":"abc"}"#)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json().await.unwrap();
        assert!(!body["error"].as_str().unwrap_or_default().is_empty());
        assert!(stub.recorded().is_empty());
    }

    #[tokio::test]
    async fn upload_renders_result_page() {
        let stub = StubGemini::replying_text(SAMPLE_RESULT);
        let base = start_app(&stub).await;

        let part = Part::bytes(JPEG_BYTES.to_vec())
            .file_name("face.jpg")
            .mime_str("image/jpeg")
            .unwrap();
        let response = reqwest::Client::new()
            .post(format!("{base}/"))
            .multipart(Form::new().part("image", part))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = response.text().await.unwrap();
        assert_eq!(html.matches("class=\"face-shape-heading\"").count(), 1);
        assert_eq!(html.matches("class=\"celebrity-chip\"").count(), 2);
        assert!(html.contains("href=\"https://example.com\""));
        assert_eq!(stub.recorded().len(), 1);
    }

    #[tokio::test]
    async fn non_image_upload_is_ignored() {
        let stub = StubGemini::replying_text(SAMPLE_RESULT);
        let base = start_app(&stub).await;

        let part = Part::bytes(b"just some notes".to_vec())
            .file_name("notes.txt")
            .mime_str("text/plain")
            .unwrap();
        let response = reqwest::Client::new()
            .post(format!("{base}/"))
            .multipart(Form::new().part("image", part))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = response.text().await.unwrap();
        assert!(!html.contains("role=\"alert\""));
        assert!(!html.contains("face-shape-heading"));
        assert!(stub.recorded().is_empty());
    }

    #[tokio::test]
    async fn page_uses_native_picker_for_mobile() {
        let stub = StubGemini::replying_text(SAMPLE_RESULT);
        let base = start_app(&stub).await;

        let html = reqwest::Client::new()
            .get(format!("{base}/"))
            .header("user-agent", IPHONE_UA)
            .header("cookie", "theme=dark")
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(html.contains("capture=\"user\""));
        assert!(html.contains("data-theme=\"dark\""));
    }

    #[tokio::test]
    async fn theme_toggle_flips_cookie() {
        let stub = StubGemini::replying_text(SAMPLE_RESULT);
        let base = start_app(&stub).await;

        let response = no_redirect_client()
            .get(format!("{base}/theme/toggle"))
            .header("cookie", "theme=dark")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookie = response
            .headers()
            .get("set-cookie")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(cookie.starts_with("theme=light"));
        assert_eq!(
            response.headers().get("location").unwrap().to_str().unwrap(),
            "/"
        );
    }

    #[tokio::test]
    async fn serves_capture_script_and_health() {
        let stub = StubGemini::replying_text(SAMPLE_RESULT);
        let base = start_app(&stub).await;
        let client = reqwest::Client::new();

        let script = client
            .get(format!("{base}/static/app.js"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(script.contains("track.stop()"));

        let health = client
            .get(format!("{base}/health"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(health, "ok");
    }
}

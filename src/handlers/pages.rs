use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use tracing::{error, info, warn};

use crate::acquisition::camera::{capture_mode_for, CaptureMode};
use crate::acquisition::ImagePayload;
use crate::analysis::AnalysisResult;
use crate::analyzer::analyze_encoded_image;
use crate::render::{index_page, PageView};
use crate::state::AppState;
use crate::theme::Theme;
use crate::utils::timing::RequestTimer;

const APP_SCRIPT: &str = include_str!("../../assets/app.js");
const COLOR_SCHEME_HINT: &str = "sec-ch-prefers-color-scheme";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn theme_from_headers(headers: &HeaderMap) -> Theme {
    Theme::resolve(
        header_str(headers, header::COOKIE.as_str()),
        header_str(headers, COLOR_SCHEME_HINT),
    )
}

fn capture_mode_from_headers(headers: &HeaderMap) -> CaptureMode {
    capture_mode_for(header_str(headers, header::USER_AGENT.as_str()).unwrap_or_default())
}

fn render_page(
    status: StatusCode,
    state: &AppState,
    headers: &HeaderMap,
    notice: Option<&str>,
    result: Option<&AnalysisResult>,
) -> Response {
    let html = index_page(&PageView {
        theme: theme_from_headers(headers),
        capture_mode: capture_mode_from_headers(headers),
        notice,
        result,
        max_upload_bytes: state.max_upload_bytes,
    });
    (
        status,
        [
            (HeaderName::from_static("accept-ch"), "Sec-CH-Prefers-Color-Scheme"),
            (header::VARY, "Sec-CH-Prefers-Color-Scheme, User-Agent, Cookie"),
        ],
        Html(html),
    )
        .into_response()
}

pub async fn index_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    render_page(StatusCode::OK, &state, &headers, None, None)
}

/// First non-empty `image` part of the upload form.
async fn read_upload(mut multipart: Multipart) -> Result<Option<ImagePayload>, (StatusCode, String)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| (err.status(), err.body_text()))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| (err.status(), err.body_text()))?;
        if bytes.is_empty() {
            continue;
        }
        return Ok(Some(ImagePayload::new(bytes.to_vec(), content_type)));
    }
    Ok(None)
}

/// `POST /`: upload form submission, rendered server-side.
pub async fn upload_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let mut timer = RequestTimer::start("upload");

    let upload = match multipart {
        Ok(multipart) => read_upload(multipart).await,
        Err(rejection) => Err((rejection.status(), rejection.body_text())),
    };

    let payload = match upload {
        Ok(Some(payload)) => payload,
        Ok(None) => {
            timer.complete("empty", None);
            return render_page(
                StatusCode::OK,
                &state,
                &headers,
                Some("Please choose a photo to analyze."),
                None,
            );
        }
        Err((status, message)) => {
            warn!("Upload rejected: {}", message);
            timer.complete("error", Some(message.clone()));
            return render_page(status, &state, &headers, Some(message.as_str()), None);
        }
    };

    let content_type = payload.content_type.clone();
    let Some(encoded) = payload.accept() else {
        info!("Ignoring non-image upload ({})", content_type);
        timer.complete("ignored", Some(content_type));
        return render_page(StatusCode::OK, &state, &headers, None, None);
    };

    match analyze_encoded_image(&state.gemini, encoded.as_str()).await {
        Ok(result) => {
            timer.complete("success", Some(result.face_shape.clone()));
            render_page(StatusCode::OK, &state, &headers, None, Some(&result))
        }
        Err(failure) => {
            let message = failure.to_string();
            error!("Analysis failed: {}", message);
            timer.complete("error", Some(message.clone()));
            render_page(
                StatusCode::INTERNAL_SERVER_ERROR,
                &state,
                &headers,
                Some(message.as_str()),
                None,
            )
        }
    }
}

pub async fn toggle_theme_handler(headers: HeaderMap) -> Response {
    let theme = theme_from_headers(&headers).toggle();
    (
        StatusCode::SEE_OTHER,
        [
            (header::SET_COOKIE, theme.set_cookie_value()),
            (header::LOCATION, "/".to_string()),
        ],
    )
        .into_response()
}

pub async fn app_script_handler() -> Response {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        APP_SCRIPT,
    )
        .into_response()
}

pub async fn health_handler() -> &'static str {
    "ok"
}

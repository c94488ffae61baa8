use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, info};

use crate::acquisition::EncodedImage;
use crate::analysis::{AnalyzeRequest, ErrorBody};
use crate::analyzer::analyze_encoded_image;
use crate::state::AppState;
use crate::utils::timing::RequestTimer;

fn error_response(message: String) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::new(message))).into_response()
}

/// `POST /api/analyze`: `{image}` in, the result object or `{error}` with a
/// 500 out.
pub async fn analyze_handler(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Response {
    let mut timer = RequestTimer::start("api_analyze");

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let message = rejection.body_text();
            error!("Rejected analyze request: {}", message);
            timer.complete("error", Some(message.clone()));
            return error_response(message);
        }
    };

    let image = EncodedImage::from_data_uri(&request.image);
    info!("Analyze request received ({} base64 chars)", image.len());

    match analyze_encoded_image(&state.gemini, image.as_str()).await {
        Ok(result) => {
            timer.complete("success", Some(result.face_shape.clone()));
            (StatusCode::OK, Json(result)).into_response()
        }
        Err(failure) => {
            let message = failure.to_string();
            error!("Analysis failed: {}", message);
            timer.complete("error", Some(message.clone()));
            error_response(message)
        }
    }
}

use base64::{engine::general_purpose, Engine as _};
use tracing::{info, warn};

use crate::analysis::{analysis_response_schema, AnalysisResult};
use crate::config::FACE_SHAPE_PROMPT;
use crate::llm::gemini::DECLARED_IMAGE_MIME;
use crate::llm::media::{detect_mime_type, normalize_mime_type};
use crate::llm::GeminiClient;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisFailure {
    #[error("No response from Gemini AI")]
    NoResponse,
    #[error("Invalid image data: {0}")]
    InvalidImage(String),
    #[error("{0}")]
    Upstream(String),
    #[error("Gemini returned an unexpected result: {0}")]
    MalformedOutput(String),
}

/// Classifies one prefix-free base64 image. Single attempt; every failure is
/// terminal for the request.
pub async fn analyze_encoded_image(
    gemini: &GeminiClient,
    image_base64: &str,
) -> Result<AnalysisResult, AnalysisFailure> {
    let bytes = general_purpose::STANDARD
        .decode(image_base64.trim())
        .map_err(|err| AnalysisFailure::InvalidImage(err.to_string()))?;

    match detect_mime_type(&bytes).map(|mime| normalize_mime_type(&mime)) {
        Some(actual) if actual != DECLARED_IMAGE_MIME => {
            warn!(
                "Image is {} but is declared as {} to Gemini",
                actual, DECLARED_IMAGE_MIME
            );
        }
        None => warn!(
            "Could not identify image format ({} bytes); declaring {}",
            bytes.len(),
            DECLARED_IMAGE_MIME
        ),
        _ => {}
    }

    let schema = analysis_response_schema();
    let text = gemini
        .generate_structured(image_base64.trim(), FACE_SHAPE_PROMPT, &schema)
        .await
        .map_err(|err| AnalysisFailure::Upstream(err.to_string()))?;

    if text.trim().is_empty() {
        warn!("No text response from Gemini AI");
        return Err(AnalysisFailure::NoResponse);
    }

    let result = serde_json::from_str::<AnalysisResult>(text.trim())
        .map_err(|err| AnalysisFailure::MalformedOutput(err.to_string()))?;
    info!(
        "Classified face shape '{}' with {} style(s) and {} celebrity match(es)",
        result.face_shape,
        result.recommended_styles.len(),
        result.celebrities.len()
    );
    Ok(result)
}
